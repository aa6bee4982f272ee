use super::*;

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use taskbeat_protocols::error::JobError;
use taskbeat_protocols::job::{TaskArgs, TaskKwargs};

struct TestJob {
    name: &'static str,
    run_every: Option<Duration>,
}

#[async_trait]
impl Job for TestJob {
    fn name(&self) -> &str {
        self.name
    }

    fn run_every(&self) -> Option<Duration> {
        self.run_every
    }

    async fn run(&self, _args: TaskArgs, _kwargs: TaskKwargs) -> Result<Value, JobError> {
        Ok(Value::Null)
    }
}

fn regular(name: &'static str) -> Arc<dyn Job> {
    Arc::new(TestJob { name, run_every: None })
}

fn periodic(name: &'static str, secs: u64) -> Arc<dyn Job> {
    Arc::new(TestJob {
        name,
        run_every: Some(Duration::from_secs(secs)),
    })
}

#[test]
fn test_registry_new() {
    let registry = TaskRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
}

#[test]
fn test_register_and_lookup() {
    let registry = TaskRegistry::new();
    registry.register(regular("tasks.add")).unwrap();

    let job = registry.lookup("tasks.add").unwrap();
    assert_eq!(job.name(), "tasks.add");
    assert!(registry.contains("tasks.add"));
}

#[test]
fn test_register_duplicate() {
    let registry = TaskRegistry::new();
    registry.register(regular("tasks.add")).unwrap();

    let err = registry.register(regular("tasks.add")).unwrap_err();
    assert_eq!(err, RegistryError::AlreadyRegistered("tasks.add".to_string()));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_lookup_unknown() {
    let registry = TaskRegistry::new();
    let err = registry.lookup("missing").err().unwrap();
    assert_eq!(err, RegistryError::NotRegistered("missing".to_string()));
}

#[test]
fn test_unregister() {
    let registry = TaskRegistry::new();
    registry.register(regular("tasks.add")).unwrap();
    registry.unregister("tasks.add").unwrap();
    assert!(registry.is_empty());
    assert!(registry.unregister("tasks.add").is_err());
}

#[test]
fn test_periodic_split() {
    let registry = TaskRegistry::new();
    registry.register(regular("tasks.add")).unwrap();
    registry.register(periodic("tasks.cleanup", 60)).unwrap();
    registry.register(periodic("tasks.report", 3600)).unwrap();

    let periodic = registry.get_all_periodic();
    assert_eq!(periodic.len(), 2);
    assert!(periodic.contains_key("tasks.cleanup"));
    assert!(periodic.contains_key("tasks.report"));

    let regular = registry.get_all_regular();
    assert_eq!(regular.len(), 1);
    assert!(regular.contains_key("tasks.add"));
}

#[test]
fn test_names_sorted() {
    let registry = TaskRegistry::new();
    registry.register(regular("b")).unwrap();
    registry.register(regular("a")).unwrap();
    assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
}
