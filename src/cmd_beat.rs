//! `taskbeat beat`: host the clock service.

use std::sync::Arc;

use tracing::info;

use taskbeat_beat::{ClockService, FileStoreOpener};
use taskbeat_config::Config;
use taskbeat_daemon::{BeatDaemon, DaemonOptions};

use crate::services::Services;

/// Run the clock service until a shutdown signal, then drain the pool.
pub(crate) async fn run_beat(config: &Config) -> anyhow::Result<()> {
    let services = Services::build(config)?;

    let schedule_path = config.beat.schedule_path();
    info!("Schedule file: {}", schedule_path.display());

    let mut service = ClockService::new(
        services.registry.clone(),
        services.dispatcher.clone(),
        Arc::new(FileStoreOpener::new(schedule_path)),
    );
    if let Some(interval) = config.beat.interval() {
        service = service.with_interval(interval);
    }

    let options = DaemonOptions {
        pid_file: Some(config.daemon.pid_path()),
        detach: config.daemon.detach,
        loglevel: config.log.level.clone(),
        logfile: config.log.file_path(),
    };
    let result = BeatDaemon::new(service, options).run().await;

    services.shutdown().await;
    result?;
    Ok(())
}
