use super::*;
use crate::schema::JobConfig;

fn job(name: &str, every: Option<u64>) -> JobConfig {
    JobConfig {
        name: name.to_string(),
        command: "true".to_string(),
        run_every_secs: every,
        timeout_secs: None,
        routing_key: None,
        exchange: None,
        priority: None,
        serializer: None,
    }
}

#[test]
fn test_validate_default_config() {
    let config = Config::default();
    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.is_empty());
}

#[test]
fn test_validate_zero_interval() {
    let mut config = Config::default();
    config.beat.interval_ms = Some(0);

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "beat.interval_ms"));
}

#[test]
fn test_validate_empty_schedule_filename() {
    let mut config = Config::default();
    config.beat.schedule_filename = "  ".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "beat.schedule_filename"));
}

#[test]
fn test_validate_zero_pool_sizes() {
    let mut config = Config::default();
    config.pool.concurrency = 0;
    config.pool.limit = 0;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.errors.iter().any(|e| e.path == "pool.concurrency"));
    assert!(result.errors.iter().any(|e| e.path == "pool.limit"));
}

#[test]
fn test_validate_limit_below_concurrency_warns() {
    let mut config = Config::default();
    config.pool.concurrency = 8;
    config.pool.limit = 2;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "pool.limit"));
}

#[test]
fn test_validate_always_eager_warns() {
    let mut config = Config::default();
    config.dispatch.always_eager = true;

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "dispatch.always_eager"));
}

#[test]
fn test_validate_unknown_log_level_warns() {
    let mut config = Config::default();
    config.log.level = "loud".to_string();

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "log.level"));
}

#[test]
fn test_validate_duplicate_job_names() {
    let mut config = Config::default();
    config.jobs = vec![job("cleanup", Some(10)), job("cleanup", Some(20))];

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(!result.is_valid());
    assert!(result.errors.iter().any(|e| e.path == "jobs[1].name"));
}

#[test]
fn test_validate_job_fields() {
    let mut config = Config::default();
    let mut bad = job("", Some(0));
    bad.command = String::new();
    bad.priority = Some(12);
    bad.timeout_secs = Some(0);
    config.jobs = vec![bad];

    let result = ConfigValidator::validate(&config).unwrap();
    let paths: Vec<_> = result.errors.iter().map(|e| e.path.as_str()).collect();
    assert!(paths.contains(&"jobs[0].name"));
    assert!(paths.contains(&"jobs[0].command"));
    assert!(paths.contains(&"jobs[0].run_every_secs"));
    assert!(paths.contains(&"jobs[0].timeout_secs"));
    assert!(paths.contains(&"jobs[0].priority"));
}

#[test]
fn test_validate_no_periodic_jobs_warns() {
    let mut config = Config::default();
    config.jobs = vec![job("adhoc", None)];

    let result = ConfigValidator::validate(&config).unwrap();
    assert!(result.is_valid());
    assert!(result.warnings.iter().any(|w| w.path == "jobs"));
}
