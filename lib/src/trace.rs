//! Structured trace events emitted while solving containment.
//!
//! The orchestrator reports every binding it computes and every verdict change
//! through a `TraceSink`, so callers can audit why a star pattern ended up
//! contained, aligned or rejected without parsing log output.

use crate::containment::ContainmentVerdict;
use crate::types::{ShapeName, StarPatternName};
use std::sync::Mutex;

/// Structured trace events emitted during containment solving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainmentEvent {
    BindingComputed {
        shape: ShapeName,
        star_pattern: StarPatternName,
        bound: usize,
        unbound: usize,
        fully_bounded: bool,
    },
    VerdictUpdated {
        star_pattern: StarPatternName,
        shape: ShapeName,
        verdict: ContainmentVerdict,
    },
    ConditionalLink {
        link: String,
        star_pattern: StarPatternName,
    },
}

/// Receives the containment events of one solve, in the order they happen.
pub trait TraceSink: Send + Sync {
    fn record(&self, event: ContainmentEvent);
}

/// Discards every event. Used when no sink is given to the solver.
pub struct NullTraceSink;

impl TraceSink for NullTraceSink {
    fn record(&self, _event: ContainmentEvent) {}
}

/// Sink keeping every event in memory.
#[derive(Default)]
pub struct MemoryTraceSink {
    events: Mutex<Vec<ContainmentEvent>>,
}

impl MemoryTraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ContainmentEvent> {
        match self.events.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl TraceSink for MemoryTraceSink {
    fn record(&self, event: ContainmentEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_sink_keeps_events_in_order() {
        let sink = MemoryTraceSink::new();
        sink.record(ContainmentEvent::ConditionalLink {
            link: "http://example.com/a".to_string(),
            star_pattern: "x".to_string(),
        });
        sink.record(ContainmentEvent::VerdictUpdated {
            star_pattern: "x".to_string(),
            shape: "Foo".to_string(),
            verdict: ContainmentVerdict::Aligned,
        });
        let events = sink.events();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], ContainmentEvent::ConditionalLink { .. }));
    }
}
