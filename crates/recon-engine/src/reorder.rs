//! Death reorderer (§4.3): merges the original event stream with the
//! engine's discovery-order death list into one deterministic stream,
//! placing each death just after the first event whose clock is at
//! least as large as the death's clock.

use recon_model::{DeathRecord, ObjectId};

use crate::engine::TimedEvent;
use crate::error::ReconError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamItem {
    Event(TimedEvent),
    Death(DeathRecord),
}

impl StreamItem {
    pub fn clock(&self) -> u64 {
        match self {
            StreamItem::Event(e) => e.clock,
            StreamItem::Death(d) => d.clock,
        }
    }
}

/// Merge `events` (assumed already clock-monotonic, as the engine always
/// produces) with `deaths`, sorted by `(clock, object id)` ascending to
/// make the merge deterministic and break ties for same-clock deaths.
///
/// Idempotent (P7): re-running this over its own output with an empty
/// death list returns the input unchanged, since the merge only ever
/// inserts, never reorders, existing items.
pub fn reorder(events: &[TimedEvent], mut deaths: Vec<DeathRecord>) -> Result<Vec<StreamItem>, ReconError> {
    deaths.sort_by_key(|d| (d.clock, d.object.raw()));

    let mut last_clock = 0u64;
    for event in events {
        if event.clock < last_clock {
            return Err(ReconError::temporal_conflict(
                ObjectId::NULL,
                event.clock,
                format!("event stream clock regressed from {last_clock} to {}", event.clock),
            ));
        }
        last_clock = event.clock;
    }

    let mut out = Vec::with_capacity(events.len() + deaths.len());
    let mut death_idx = 0;

    for &event in events {
        while death_idx < deaths.len() && deaths[death_idx].clock < event.clock {
            out.push(StreamItem::Death(deaths[death_idx]));
            death_idx += 1;
        }
        out.push(StreamItem::Event(event));
    }
    while death_idx < deaths.len() {
        out.push(StreamItem::Death(deaths[death_idx]));
        death_idx += 1;
    }

    Ok(out)
}
