#![forbid(unsafe_code)]

//! JSONL transcripts of dispatched events.
//!
//! One line per `slip:*` dispatch, in order, so a failing scenario can be
//! diffed against a known-good run.
//!
//! # JSONL Schema
//!
//! ```json
//! {"seq":0,"event":"slip:beforewait","node":6,"allowed":true,"detail":null}
//! {"seq":2,"event":"slip:swipe","node":6,"allowed":true,"detail":{"direction":"right","originalIndex":1}}
//! ```

use serde_json::{Value, json};

use crate::dom::DispatchedEvent;

/// JSON record for one dispatch.
#[must_use]
pub fn event_record(seq: usize, event: &DispatchedEvent) -> Value {
    json!({
        "seq": seq,
        "event": event.kind.event_type(),
        "node": event.node.get(),
        "allowed": event.allowed,
        "detail": serde_json::to_value(event.detail).unwrap_or(Value::Null),
    })
}

/// Render `events` as JSONL, one record per line.
#[must_use]
pub fn to_jsonl(events: &[DispatchedEvent]) -> String {
    events
        .iter()
        .enumerate()
        .map(|(seq, event)| format!("{}\n", event_record(seq, event)))
        .collect()
}

#[cfg(test)]
mod tests {
    use slip_core::{NodeId, SlipEventDetail, SlipEventKind, SwipeDirection};

    use super::*;

    #[test]
    fn swipe_detail_uses_camel_case() {
        let event = DispatchedEvent {
            node: NodeId::new(4),
            kind: SlipEventKind::Swipe,
            detail: SlipEventDetail::Swipe {
                direction: SwipeDirection::Right,
                original_index: 1,
            },
            allowed: true,
        };
        let record = event_record(3, &event);
        assert_eq!(record["event"], "slip:swipe");
        assert_eq!(record["detail"]["direction"], "right");
        assert_eq!(record["detail"]["originalIndex"], 1);
    }

    #[test]
    fn reorder_to_end_has_null_insert_before() {
        let event = DispatchedEvent {
            node: NodeId::new(2),
            kind: SlipEventKind::Reorder,
            detail: SlipEventDetail::Reorder {
                splice_index: 3,
                insert_before: None,
                original_index: 0,
            },
            allowed: true,
        };
        let jsonl = to_jsonl(&[event]);
        assert_eq!(jsonl.lines().count(), 1);
        let parsed: Value = serde_json::from_str(jsonl.trim_end()).unwrap();
        assert_eq!(parsed["detail"]["spliceIndex"], 3);
        assert!(parsed["detail"]["insertBefore"].is_null());
        assert_eq!(parsed["seq"], 0);
    }

    #[test]
    fn plain_events_have_null_detail() {
        let event = DispatchedEvent {
            node: NodeId::new(2),
            kind: SlipEventKind::Tap,
            detail: SlipEventDetail::None,
            allowed: false,
        };
        let record = event_record(0, &event);
        assert!(record["detail"].is_null());
        assert_eq!(record["allowed"], false);
    }
}
