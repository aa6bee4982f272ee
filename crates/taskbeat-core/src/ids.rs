//! Task id generation.

use uuid::Uuid;

/// Generate a fresh, globally unique task id.
pub fn gen_unique_id() -> String {
    Uuid::new_v4().to_string()
}
