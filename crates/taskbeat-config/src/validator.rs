//! Configuration validation.

use std::collections::HashSet;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const MAX_PRIORITY: u8 = 9;

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_dispatch(config, &mut result);
        Self::validate_beat(config, &mut result);
        Self::validate_pool(config, &mut result);
        Self::validate_log(config, &mut result);
        Self::validate_jobs(config, &mut result);

        Ok(result)
    }

    fn validate_dispatch(config: &Config, result: &mut ValidationResult) {
        if config.dispatch.always_eager {
            result.add_warning(ValidationWarning::new(
                "dispatch.always_eager",
                "always_eager is set, every dispatch runs inline in the calling process",
            ));
        }
    }

    fn validate_beat(config: &Config, result: &mut ValidationResult) {
        if config.beat.schedule_filename.trim().is_empty() {
            result.add_error(ValidationError::new(
                "beat.schedule_filename",
                "schedule_filename cannot be empty",
            ));
        }

        if config.beat.interval_ms == Some(0) {
            result.add_error(ValidationError::new(
                "beat.interval_ms",
                "interval_ms must be greater than 0",
            ));
        }
    }

    fn validate_pool(config: &Config, result: &mut ValidationResult) {
        if config.pool.concurrency == 0 {
            result.add_error(ValidationError::new(
                "pool.concurrency",
                "concurrency must be greater than 0",
            ));
        }

        if config.pool.limit == 0 {
            result.add_error(ValidationError::new(
                "pool.limit",
                "limit must be greater than 0",
            ));
        }

        if config.pool.limit < config.pool.concurrency {
            result.add_warning(ValidationWarning::new(
                "pool.limit",
                "limit is lower than concurrency, workers will sit idle while results drain",
            ));
        }

        if let Some(ref msg) = config.pool.done_msg {
            if !msg.contains('{') {
                result.add_warning(ValidationWarning::new(
                    "pool.done_msg",
                    "done_msg has no placeholders, results will not be identifiable in logs",
                ));
            }
        }
    }

    fn validate_log(config: &Config, result: &mut ValidationResult) {
        let level = config.log.level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            result.add_warning(ValidationWarning::new(
                "log.level",
                format!(
                    "Unknown log level '{}', valid values: {:?}",
                    config.log.level, LOG_LEVELS
                ),
            ));
        }
    }

    fn validate_jobs(config: &Config, result: &mut ValidationResult) {
        let mut seen = HashSet::new();

        for (index, job) in config.jobs.iter().enumerate() {
            let path = format!("jobs[{}]", index);

            if job.name.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.name", path),
                    "Job name cannot be empty",
                ));
            } else if !seen.insert(job.name.as_str()) {
                result.add_error(ValidationError::new(
                    format!("{}.name", path),
                    format!("Job '{}' is declared more than once", job.name),
                ));
            }

            if job.command.trim().is_empty() {
                result.add_error(ValidationError::new(
                    format!("{}.command", path),
                    "Job command cannot be empty",
                ));
            }

            if job.run_every_secs == Some(0) {
                result.add_error(ValidationError::new(
                    format!("{}.run_every_secs", path),
                    "run_every_secs must be greater than 0",
                ));
            }

            if job.timeout_secs == Some(0) {
                result.add_error(ValidationError::new(
                    format!("{}.timeout_secs", path),
                    "timeout_secs must be greater than 0",
                ));
            }

            if let Some(priority) = job.priority {
                if priority > MAX_PRIORITY {
                    result.add_error(ValidationError::new(
                        format!("{}.priority", path),
                        format!("priority must be between 0 and {}", MAX_PRIORITY),
                    ));
                }
            }
        }

        if !config.jobs.is_empty() && config.jobs.iter().all(|j| j.run_every_secs.is_none()) {
            result.add_warning(ValidationWarning::new(
                "jobs",
                "No job declares run_every_secs, the clock service has nothing to schedule",
            ));
        }
    }
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
