//! Execution context injected into eagerly run jobs.

use serde_json::Value;

use taskbeat_protocols::job::TaskKwargs;

/// Keys an eagerly executed job may ask for.
pub const CONTEXT_KEYS: [&str; 6] = [
    "task_name",
    "task_id",
    "task_retries",
    "task_is_eager",
    "logfile",
    "loglevel",
];

/// Context of one eager execution.
#[derive(Debug, Clone, Default)]
pub struct EagerContext {
    pub task_name: String,
    pub task_id: String,
    pub task_retries: u32,
    pub logfile: Option<String>,
    pub loglevel: Option<String>,
}

impl EagerContext {
    pub fn new(task_name: impl Into<String>, task_id: impl Into<String>) -> Self {
        Self {
            task_name: task_name.into(),
            task_id: task_id.into(),
            ..Default::default()
        }
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.task_retries = retries;
        self
    }

    pub fn with_logging(mut self, logfile: Option<String>, loglevel: Option<String>) -> Self {
        self.logfile = logfile;
        self.loglevel = loglevel;
        self
    }

    fn value_of(&self, key: &str) -> Option<Value> {
        match key {
            "task_name" => Some(Value::from(self.task_name.clone())),
            "task_id" => Some(Value::from(self.task_id.clone())),
            "task_retries" => Some(Value::from(self.task_retries)),
            "task_is_eager" => Some(Value::Bool(true)),
            "logfile" => Some(self.logfile.clone().map_or(Value::Null, Value::from)),
            "loglevel" => Some(self.loglevel.clone().map_or(Value::Null, Value::from)),
            _ => None,
        }
    }

    /// Merge the keys listed in `accepted` into `kwargs`. Context values
    /// replace caller supplied values of the same key.
    pub fn extend_kwargs(&self, mut kwargs: TaskKwargs, accepted: &[&str]) -> TaskKwargs {
        for key in accepted {
            if let Some(value) = self.value_of(key) {
                kwargs.insert((*key).to_string(), value);
            }
        }
        kwargs
    }
}
