//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::Config;

pub const ENV_ALWAYS_EAGER: &str = "TASKBEAT_ALWAYS_EAGER";
pub const ENV_SCHEDULE_FILENAME: &str = "TASKBEAT_SCHEDULE_FILENAME";
pub const ENV_BEAT_INTERVAL_MS: &str = "TASKBEAT_BEAT_INTERVAL_MS";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        let mut config = Self::load_str(&content)?;
        Self::apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Load from `path` when given, otherwise start from defaults.
    /// Environment overrides apply in both cases.
    pub fn load_or_default(path: Option<&Path>) -> Result<Config, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let mut config = Config::default();
                Self::apply_env_overrides(&mut config)?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Apply `TASKBEAT_*` overrides from the process environment.
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_with(config, |key| std::env::var(key).ok())
    }

    /// Apply overrides using `lookup` as the variable source.
    pub fn apply_overrides_with<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_ALWAYS_EAGER) {
            config.dispatch.always_eager = parse_bool(ENV_ALWAYS_EAGER, &value)?;
        }
        if let Some(value) = lookup(ENV_SCHEDULE_FILENAME) {
            config.beat.schedule_filename = value;
        }
        if let Some(value) = lookup(ENV_BEAT_INTERVAL_MS) {
            let ms = value
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::InvalidValue {
                    field: ENV_BEAT_INTERVAL_MS.to_string(),
                    message: e.to_string(),
                })?;
            config.beat.interval_ms = Some(ms);
        }
        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").map_err(|e| ConfigError::InvalidValue {
            field: "pattern".to_string(),
            message: e.to_string(),
        })?;

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.taskbeat`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

fn parse_bool(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(ConfigError::InvalidValue {
            field: field.to_string(),
            message: format!("expected a boolean, got '{}'", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.pool.concurrency, 4);
        assert!(!config.dispatch.always_eager);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [dispatch]
            always_eager = true

            [beat]
            schedule_filename = "/var/lib/taskbeat/schedule.json"
            interval_ms = 500

            [pool]
            concurrency = 2
            limit = 8
            process_timeout_ms = 1000
            done_msg = "Task {name}[{id}] processed: {return_value}"

            [log]
            level = "debug"
            file = "/tmp/taskbeat.log"

            [daemon]
            pid_file = "/tmp/taskbeat.pid"
            detach = true

            [[jobs]]
            name = "cleanup"
            command = "echo clean"
            run_every_secs = 30

            [[jobs]]
            name = "report"
            command = "echo report"
            routing_key = "reports"
            priority = 3
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert!(config.dispatch.always_eager);
        assert_eq!(config.beat.interval_ms, Some(500));
        assert_eq!(config.pool.limit, 8);
        assert_eq!(config.log.level, "debug");
        assert!(config.daemon.detach);
        assert_eq!(config.jobs.len(), 2);
        assert_eq!(config.jobs[0].run_every_secs, Some(30));
        assert_eq!(config.jobs[1].routing_key.as_deref(), Some("reports"));
        assert!(config.jobs[1].run_every_secs.is_none());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[pool]").unwrap();
        writeln!(file, "concurrency = 7").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.pool.concurrency, 7);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/taskbeat.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let result = ConfigLoader::load_str("invalid = [unclosed");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_overrides_applied() {
        let vars = env(&[
            (ENV_ALWAYS_EAGER, "yes"),
            (ENV_SCHEDULE_FILENAME, "/tmp/other.json"),
            (ENV_BEAT_INTERVAL_MS, "250"),
        ]);
        let mut config = Config::default();
        ConfigLoader::apply_overrides_with(&mut config, |k| vars.get(k).cloned()).unwrap();

        assert!(config.dispatch.always_eager);
        assert_eq!(config.beat.schedule_filename, "/tmp/other.json");
        assert_eq!(config.beat.interval_ms, Some(250));
    }

    #[test]
    fn test_overrides_absent_keep_file_values() {
        let mut config = ConfigLoader::load_str("[dispatch]\nalways_eager = true").unwrap();
        ConfigLoader::apply_overrides_with(&mut config, |_| None).unwrap();
        assert!(config.dispatch.always_eager);
    }

    #[test]
    fn test_override_false_disables_eager() {
        let vars = env(&[(ENV_ALWAYS_EAGER, "0")]);
        let mut config = ConfigLoader::load_str("[dispatch]\nalways_eager = true").unwrap();
        ConfigLoader::apply_overrides_with(&mut config, |k| vars.get(k).cloned()).unwrap();
        assert!(!config.dispatch.always_eager);
    }

    #[test]
    fn test_invalid_bool_override() {
        let vars = env(&[(ENV_ALWAYS_EAGER, "maybe")]);
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides_with(&mut config, |k| vars.get(k).cloned())
            .unwrap_err();
        assert!(err.to_string().contains(ENV_ALWAYS_EAGER));
    }

    #[test]
    fn test_invalid_interval_override() {
        let vars = env(&[(ENV_BEAT_INTERVAL_MS, "soon")]);
        let mut config = Config::default();
        let result = ConfigLoader::apply_overrides_with(&mut config, |k| vars.get(k).cloned());
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: unique test-only variable
        unsafe {
            std::env::set_var("TASKBEAT_TEST_CONFIG_VAR", "from_env");
        }
        let content = "value = \"${TASKBEAT_TEST_CONFIG_VAR}\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert!(expanded.contains("from_env"));
        unsafe {
            std::env::remove_var("TASKBEAT_TEST_CONFIG_VAR");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "value = \"${NONEXISTENT_TASKBEAT_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/test");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/test"));
    }

    #[test]
    fn test_expand_path_no_tilde() {
        assert_eq!(ConfigLoader::expand_path("/usr/local/bin"), "/usr/local/bin");
    }
}
