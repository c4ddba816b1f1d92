//! Sample context handed to approvers.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The task/sample a tool call was issued from.
///
/// Approvers receive it read-only; the engine uses `sample_id` to scope
/// cancellation and to tag log records and decision events.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskState {
    /// Task name.
    pub task: String,
    /// Sample identifier, unique within the task.
    pub sample_id: String,
    /// Epoch the sample belongs to (1-based).
    pub epoch: u32,
    /// Free-form sample metadata.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub metadata: Map<String, Value>,
}

impl TaskState {
    /// Create the state for one sample of a task (epoch 1).
    #[must_use]
    pub fn new(task: impl Into<String>, sample_id: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            sample_id: sample_id.into(),
            epoch: 1,
            metadata: Map::new(),
        }
    }

    /// Set the epoch.
    #[must_use]
    pub fn with_epoch(mut self, epoch: u32) -> Self {
        self.epoch = epoch;
        self
    }

    /// Attach a metadata entry.
    #[must_use]
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    /// `task/sample_id/epoch`, used as a log and event key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.task, self.sample_id, self.epoch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key() {
        let state = TaskState::new("ctf", "7").with_epoch(2);
        assert_eq!(state.key(), "ctf/7/2");
    }

    #[test]
    fn test_metadata_skipped_when_empty() {
        let json = serde_json::to_value(TaskState::new("t", "1")).unwrap();
        assert!(json.get("metadata").is_none());

        let json = serde_json::to_value(TaskState::new("t", "1").with_metadata("k", "v")).unwrap();
        assert_eq!(json["metadata"]["k"], "v");
    }
}
