//! Trace events as delivered by the event source
//!
//! One JSON object per line, tagged by `event`:
//!
//! ```text
//! {"event":"invocation","name":"Gen","duration_ticks":1200,"timestamp":"2024-05-01T10:00:00Z"}
//! {"event":"compilation_stop","name":"App","timestamp":"2024-05-01T10:00:01.5Z"}
//! {"event":"block_completed","id":12,"duration_ms":40}
//! {"event":"function_definitions","definitions":"12 Solution_Open Open\n"}
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::session::MonitorKind;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A source generator finished a run
    Invocation {
        name: String,
        duration_ticks: i64,
        timestamp: DateTime<Utc>,
    },
    /// A source generator threw
    Exception {
        name: String,
        timestamp: DateTime<Utc>,
    },
    CompilationStart {
        name: String,
        timestamp: DateTime<Utc>,
    },
    CompilationStop {
        name: String,
        timestamp: DateTime<Utc>,
    },
    BlockCompleted {
        id: i32,
        duration_ms: i64,
    },
    BlockCanceled {
        id: i32,
        duration_ms: i64,
    },
    /// Id to name definitions for workspace blocks
    FunctionDefinitions {
        definitions: String,
    },
}

impl TraceEvent {
    /// Parse one JSON line
    pub fn parse_line(line: &str) -> Result<Self> {
        Ok(serde_json::from_str(line)?)
    }

    /// The monitor kind whose aggregator consumes this event
    pub fn kind(&self) -> MonitorKind {
        match self {
            TraceEvent::Invocation { .. } | TraceEvent::Exception { .. } => MonitorKind::Generator,
            TraceEvent::CompilationStart { .. } | TraceEvent::CompilationStop { .. } => {
                MonitorKind::Compilation
            }
            TraceEvent::BlockCompleted { .. }
            | TraceEvent::BlockCanceled { .. }
            | TraceEvent::FunctionDefinitions { .. } => MonitorKind::Workspace,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TraceEvent::Invocation { .. } => "invocation",
            TraceEvent::Exception { .. } => "exception",
            TraceEvent::CompilationStart { .. } => "compilation_start",
            TraceEvent::CompilationStop { .. } => "compilation_stop",
            TraceEvent::BlockCompleted { .. } => "block_completed",
            TraceEvent::BlockCanceled { .. } => "block_canceled",
            TraceEvent::FunctionDefinitions { .. } => "function_definitions",
        }
    }

    /// Payload field by name, as text (`name` or `id`)
    pub fn payload(&self, field: &str) -> Option<String> {
        match (self, field) {
            (
                TraceEvent::Invocation { name, .. }
                | TraceEvent::Exception { name, .. }
                | TraceEvent::CompilationStart { name, .. }
                | TraceEvent::CompilationStop { name, .. },
                "name",
            ) => Some(name.clone()),
            (
                TraceEvent::BlockCompleted { id, .. } | TraceEvent::BlockCanceled { id, .. },
                "id",
            ) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Definition blobs are side-channel metadata rather than keyed observations
    pub fn is_keyed(&self) -> bool {
        !matches!(self, TraceEvent::FunctionDefinitions { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_invocation_line() {
        let event = TraceEvent::parse_line(
            r#"{"event":"invocation","name":"Gen","duration_ticks":1200,"timestamp":"2024-05-01T10:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(event.kind(), MonitorKind::Generator);
        assert_eq!(event.payload("name").as_deref(), Some("Gen"));
        assert_eq!(event.payload("id"), None);
    }

    #[test]
    fn test_parse_block_line() {
        let event =
            TraceEvent::parse_line(r#"{"event":"block_canceled","id":12,"duration_ms":40}"#).unwrap();
        assert_eq!(
            event,
            TraceEvent::BlockCanceled {
                id: 12,
                duration_ms: 40
            }
        );
        assert_eq!(event.payload("id").as_deref(), Some("12"));
        assert!(event.is_keyed());
    }

    #[test]
    fn test_parse_fractional_timestamp() {
        let event = TraceEvent::parse_line(
            r#"{"event":"compilation_stop","name":"App","timestamp":"2024-05-01T10:00:01.5Z"}"#,
        )
        .unwrap();
        match event {
            TraceEvent::CompilationStop { timestamp, .. } => {
                assert_eq!(timestamp.timestamp_subsec_millis(), 500);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_definitions_are_workspace_and_unkeyed() {
        let event = TraceEvent::FunctionDefinitions {
            definitions: "1 A\n".to_string(),
        };
        assert_eq!(event.kind(), MonitorKind::Workspace);
        assert!(!event.is_keyed());
        assert_eq!(event.label(), "function_definitions");
    }

    #[test]
    fn test_parse_rejects_unknown_event() {
        assert!(TraceEvent::parse_line(r#"{"event":"mystery"}"#).is_err());
        assert!(TraceEvent::parse_line("not json").is_err());
    }
}
