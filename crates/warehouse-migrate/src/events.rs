//! Progress events emitted by the coordinator.
//!
//! Events are serializable so consumers can forward them as JSON lines.
//! Emission is best-effort: a dropped receiver never fails a migration.

use serde::Serialize;
use tokio::sync::mpsc;

use crate::resolver::Confidence;

/// One progress event in a migration run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MigrationEvent {
    TaskStarted {
        logical_name: String,
    },
    TaskResolved {
        logical_name: String,
        resolved_name: String,
        confidence: Confidence,
    },
    BatchLoaded {
        landing_table: String,
        rows_loaded: u64,
        rows_skipped: u64,
    },
    TaskCompleted {
        logical_name: String,
        landing_table: String,
        rows_loaded: u64,
        rows_skipped: u64,
    },
    TaskFailed {
        logical_name: String,
        error: String,
    },
    RunCompleted {
        successful: usize,
        failed: usize,
        total_rows_loaded: u64,
    },
}

/// Sender half for progress events.
pub type EventSender = mpsc::UnboundedSender<MigrationEvent>;

/// Receiver half for progress events.
pub type EventReceiver = mpsc::UnboundedReceiver<MigrationEvent>;

/// Create an unbounded progress channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Send an event, ignoring a closed receiver.
pub fn emit(sender: Option<&EventSender>, event: MigrationEvent) {
    if let Some(tx) = sender {
        let _ = tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_with_tag() {
        let event = MigrationEvent::TaskResolved {
            logical_name: "Patient".into(),
            resolved_name: "dbo.Patient".into(),
            confidence: Confidence::High,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"event\":\"task_resolved\""));
        assert!(json.contains("\"confidence\":\"high\""));
    }

    #[test]
    fn test_emit_tolerates_closed_receiver() {
        let (tx, rx) = channel();
        drop(rx);
        emit(
            Some(&tx),
            MigrationEvent::TaskStarted {
                logical_name: "Patient".into(),
            },
        );
        emit(None, MigrationEvent::RunCompleted {
            successful: 0,
            failed: 0,
            total_rows_loaded: 0,
        });
    }
}
