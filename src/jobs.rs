//! Shell-command jobs declared under `[[jobs]]`.

use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::process::Command;
use tokio::time::timeout;
use tracing::debug;

use taskbeat_config::JobConfig;
use taskbeat_core::TaskRegistry;
use taskbeat_protocols::error::{JobError, RegistryError};
use taskbeat_protocols::job::{Job, TaskArgs, TaskKwargs};
use taskbeat_protocols::options::ExecOptions;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Runs a configured command through the platform shell.
///
/// Positional arguments become the shell's `$1..$n`; keyword arguments
/// are exported as `TASKBEAT_<KEY>` environment variables.
pub(crate) struct ShellJob {
    name: String,
    command: String,
    run_every: Option<Duration>,
    timeout: Duration,
    options: ExecOptions,
}

impl ShellJob {
    pub(crate) fn from_config(config: &JobConfig) -> Self {
        let options = ExecOptions {
            routing_key: config.routing_key.clone(),
            exchange: config.exchange.clone(),
            priority: config.priority,
            serializer: config.serializer.clone(),
            ..Default::default()
        };
        Self {
            name: config.name.clone(),
            command: config.command.clone(),
            run_every: config.run_every(),
            timeout: config.timeout().unwrap_or(DEFAULT_TIMEOUT),
            options,
        }
    }

    fn build_command(&self, args: &TaskArgs, kwargs: &TaskKwargs) -> Command {
        let (shell, flag) = if cfg!(target_os = "windows") {
            ("cmd", "/C")
        } else {
            ("sh", "-c")
        };

        let mut cmd = Command::new(shell);
        cmd.arg(flag).arg(&self.command);
        if !cfg!(target_os = "windows") {
            // $0 for `sh -c`
            cmd.arg(&self.name);
        }
        cmd.args(args.iter().map(shell_arg));
        for (key, value) in kwargs {
            cmd.env(format!("TASKBEAT_{}", key.to_uppercase()), shell_arg(value));
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        cmd
    }
}

fn shell_arg(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Job for ShellJob {
    fn name(&self) -> &str {
        &self.name
    }

    fn run_every(&self) -> Option<Duration> {
        self.run_every
    }

    fn exec_options(&self) -> ExecOptions {
        self.options.clone()
    }

    fn accepted_context(&self) -> &[&'static str] {
        &["task_id", "task_name", "task_retries", "task_is_eager"]
    }

    async fn run(&self, args: TaskArgs, kwargs: TaskKwargs) -> Result<Value, JobError> {
        debug!("Running {}: {}", self.name, self.command);
        let mut cmd = self.build_command(&args, &kwargs);

        let output = timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| JobError::Timeout(self.timeout.as_secs()))??;

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if output.status.success() {
            Ok(json!({
                "exit_code": 0,
                "stdout": stdout,
                "stderr": stderr,
            }))
        } else {
            let code = output.status.code().unwrap_or(-1);
            let mut message = format!("Command exited with code {}", code);
            if !stderr.is_empty() {
                message.push_str(": ");
                message.push_str(&stderr);
            }
            Err(JobError::Failed(message))
        }
    }
}

/// Register every configured job, returning how many were added.
pub(crate) fn register_jobs(
    registry: &TaskRegistry,
    jobs: &[JobConfig],
) -> Result<usize, RegistryError> {
    for config in jobs {
        registry.register(Arc::new(ShellJob::from_config(config)))?;
    }
    Ok(jobs.len())
}

#[cfg(test)]
#[path = "jobs_tests.rs"]
mod tests;
