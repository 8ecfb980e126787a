//! Lifecycle action types and batch results

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// State transition requested for an instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleAction {
    Start,
    Stop,
    /// Always a soft reboot
    Reboot,
    Delete,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 4] = [
        LifecycleAction::Start,
        LifecycleAction::Stop,
        LifecycleAction::Reboot,
        LifecycleAction::Delete,
    ];
}

impl std::fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LifecycleAction::Start => write!(f, "start"),
            LifecycleAction::Stop => write!(f, "stop"),
            LifecycleAction::Reboot => write!(f, "reboot"),
            LifecycleAction::Delete => write!(f, "delete"),
        }
    }
}

impl FromStr for LifecycleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "reboot" => Ok(Self::Reboot),
            "delete" => Ok(Self::Delete),
            other => Err(format!("unknown lifecycle action: {}", other)),
        }
    }
}

/// Result of applying one action to many instances
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchReport {
    pub action: Option<LifecycleAction>,

    /// Instances the request was issued for
    pub succeeded: Vec<ActionResult>,

    /// Instances that did not resolve
    pub skipped: Vec<ActionResult>,

    /// Instances whose request failed upstream
    pub failed: Vec<ActionResult>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl BatchReport {
    pub fn new(action: LifecycleAction) -> Self {
        Self {
            action: Some(action),
            ..Self::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn total(&self) -> usize {
        self.succeeded.len() + self.skipped.len() + self.failed.len()
    }

    pub fn add_success(&mut self, instance_id: String, message: String) {
        self.succeeded.push(ActionResult {
            instance_id,
            message,
            error: None,
        });
    }

    pub fn add_skipped(&mut self, instance_id: String, message: String) {
        self.skipped.push(ActionResult {
            instance_id,
            message,
            error: None,
        });
    }

    pub fn add_failure(&mut self, instance_id: String, error: String) {
        self.failed.push(ActionResult {
            instance_id,
            message: String::new(),
            error: Some(error),
        });
    }
}

/// Result for a single instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionResult {
    pub instance_id: String,

    pub message: String,

    /// Error message if failed
    pub error: Option<String>,
}

/// Summary line for a batch
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl BatchReport {
    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            succeeded: self.succeeded.len(),
            skipped: self.skipped.len(),
            failed: self.failed.len(),
        }
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} requested, {} not found, {} failed",
            self.succeeded, self.skipped, self.failed
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_parse_roundtrip() {
        for action in LifecycleAction::ALL {
            assert_eq!(action.to_string().parse::<LifecycleAction>(), Ok(action));
        }
        assert_eq!("REBOOT".parse::<LifecycleAction>(), Ok(LifecycleAction::Reboot));
        assert!("hard-reboot".parse::<LifecycleAction>().is_err());
    }

    #[test]
    fn test_batch_summary() {
        let mut report = BatchReport::new(LifecycleAction::Stop);
        report.add_success("i-1".to_string(), "stop requested".to_string());
        report.add_skipped("i-2".to_string(), "not found".to_string());

        assert!(report.is_success());
        assert_eq!(report.total(), 2);
        assert_eq!(
            report.summary().to_string(),
            "1 requested, 1 not found, 0 failed"
        );

        report.add_failure("i-3".to_string(), "HTTP 500".to_string());
        assert!(!report.is_success());
    }
}
