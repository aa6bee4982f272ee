//! `taskbeat apply`: submit one job.

use std::time::Duration;

use anyhow::{Context, bail};
use serde_json::{Map, Value};
use tracing::info;

use taskbeat_config::Config;
use taskbeat_protocols::registry::JobRegistry;
use taskbeat_protocols::submit::{ApplyRequest, TaskSubmitter};

use crate::services::Services;

/// Parse `--args` into positional arguments.
pub(crate) fn parse_args(raw: &str) -> anyhow::Result<Vec<Value>> {
    match serde_json::from_str::<Value>(raw).context("--args is not valid JSON")? {
        Value::Array(args) => Ok(args),
        other => bail!("--args must be a JSON array, got {}", other),
    }
}

/// Submit `name` once. Eager runs print the result; published runs wait
/// for the pool to collect it.
pub(crate) async fn run_apply(
    config: &Config,
    name: &str,
    raw_args: &str,
    countdown: Option<u64>,
    eager: bool,
) -> anyhow::Result<()> {
    let args = parse_args(raw_args)?;
    let services = Services::build(config)?;
    let job = services.registry.lookup(name)?;

    if eager {
        let result = services.dispatcher.apply(job, args, Map::new(), 0).await;
        services.shutdown().await;
        return match result.value() {
            Ok(value) => {
                println!("{}", serde_json::to_string_pretty(&value)?);
                Ok(())
            }
            Err(e) => Err(e.into()),
        };
    }

    let mut request = ApplyRequest::new().with_args(args);
    if let Some(secs) = countdown {
        request = request.with_countdown(Duration::from_secs(secs));
    }

    let submitted = services.dispatcher.apply_async(job, request).await;
    if let Ok(result) = &submitted {
        info!("Submitted {}[{}]", name, result.task_id());
        println!("{}", result.task_id());
    }

    services.shutdown().await;
    submitted?;
    Ok(())
}
