//! Submission options.

use serde::{Deserialize, Serialize};

/// Routing and delivery options attached to a submitted task.
///
/// Every field is optional; unset fields fall back to the job's defaults
/// and then to whatever the publisher assumes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exchange: Option<String>,

    /// Request immediate delivery.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub immediate: Option<bool>,

    /// Fail when no worker can take the task.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mandatory: Option<bool>,

    /// 0 (lowest) to 9 (highest).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serializer: Option<String>,
}

impl ExecOptions {
    pub fn with_routing_key(mut self, routing_key: impl Into<String>) -> Self {
        self.routing_key = Some(routing_key.into());
        self
    }

    pub fn with_exchange(mut self, exchange: impl Into<String>) -> Self {
        self.exchange = Some(exchange.into());
        self
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_serializer(mut self, serializer: impl Into<String>) -> Self {
        self.serializer = Some(serializer.into());
        self
    }

    pub fn with_immediate(mut self, immediate: bool) -> Self {
        self.immediate = Some(immediate);
        self
    }

    pub fn with_mandatory(mut self, mandatory: bool) -> Self {
        self.mandatory = Some(mandatory);
        self
    }

    /// Layer `overrides` on top of `self`. Fields set in `overrides` win.
    pub fn merged_with(&self, overrides: &ExecOptions) -> ExecOptions {
        ExecOptions {
            routing_key: overrides.routing_key.clone().or_else(|| self.routing_key.clone()),
            exchange: overrides.exchange.clone().or_else(|| self.exchange.clone()),
            immediate: overrides.immediate.or(self.immediate),
            mandatory: overrides.mandatory.or(self.mandatory),
            priority: overrides.priority.or(self.priority),
            serializer: overrides.serializer.clone().or_else(|| self.serializer.clone()),
        }
    }
}
