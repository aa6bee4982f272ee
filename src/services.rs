//! Wiring of the registry, worker and dispatcher from configuration.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use taskbeat_config::Config;
use taskbeat_core::TaskRegistry;
use taskbeat_execute::{Dispatcher, DispatcherConfig};
use taskbeat_workqueue::{LocalWorker, PoolConnector, QueueConfig};

use crate::jobs::register_jobs;

/// The in-process job stack shared by the subcommands.
pub(crate) struct Services {
    pub registry: Arc<TaskRegistry>,
    pub worker: Arc<LocalWorker>,
    pub dispatcher: Arc<Dispatcher>,
}

impl Services {
    /// Register configured jobs and start the worker pool.
    pub(crate) fn build(config: &Config) -> anyhow::Result<Self> {
        let registry = Arc::new(TaskRegistry::new());
        let count = register_jobs(&registry, &config.jobs).context("Failed to register jobs")?;
        info!("Registered {} job(s)", count);

        let queue_config = QueueConfig {
            concurrency: config.pool.concurrency,
            limit: config.pool.limit,
            process_timeout_ms: config.pool.process_timeout_ms,
            done_msg: config.pool.done_msg.clone(),
        };
        let worker = Arc::new(LocalWorker::new(registry.clone(), queue_config));
        worker.start();

        let connector = Arc::new(PoolConnector::new(worker.clone()));
        let dispatcher = Dispatcher::new(registry.clone(), connector).with_config(DispatcherConfig {
            always_eager: config.dispatch.always_eager,
            logfile: config.log.file_path().map(|p| p.display().to_string()),
            loglevel: Some(config.log.level.clone()),
        });

        Ok(Self {
            registry,
            worker,
            dispatcher: Arc::new(dispatcher),
        })
    }

    /// Stop the pool and collect every outstanding result.
    pub(crate) async fn shutdown(&self) {
        self.worker.shutdown().await;
        info!("Worker pool drained");
    }
}
