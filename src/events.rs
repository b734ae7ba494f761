//! Content-change notifications.
//!
//! The sync poller (and, outside this crate, the write surface) publishes one
//! event per affected path. Consumers — index builders, resource registries —
//! drain the receiving end; the core never blocks on a slow consumer because
//! the channel is unbounded and sends are fire-and-forget.

use crossbeam::channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};

/// One observed change to the content tree, keyed by relative path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentEvent {
    Created { path: String },
    Updated { path: String },
    Deleted { path: String },
    Moved { from: String, to: String },
}

impl ContentEvent {
    /// The path a consumer should re-inspect after this event.
    pub fn path(&self) -> &str {
        match self {
            ContentEvent::Created { path }
            | ContentEvent::Updated { path }
            | ContentEvent::Deleted { path } => path,
            ContentEvent::Moved { to, .. } => to,
        }
    }
}

pub type EventSink = Sender<ContentEvent>;

pub fn channel() -> (Sender<ContentEvent>, Receiver<ContentEvent>) {
    crossbeam::channel::unbounded()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_kind_tag() {
        let event = ContentEvent::Moved {
            from: "a.md".into(),
            to: "b.md".into(),
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["kind"], "moved");
        assert_eq!(json["from"], "a.md");
        assert_eq!(json["to"], "b.md");
        assert_eq!(event.path(), "b.md");
    }
}
