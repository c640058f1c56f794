//! Reachability engine (§4.2): the two-pass witness-then-replay
//! algorithm that turns a raw trace into a set of reconstructed deaths.

mod graph;

pub use graph::{Heap, MethodFrame, ObjectInfo, ThreadState};

use std::collections::HashMap;
use std::path::Path;

use recon_model::{DeathRecord, ExitKind, ObjectId, Record};

use crate::error::{Advisory, ReconError};
use crate::lexer::Lexer;

/// One event from the original trace, stamped with the logical clock
/// value in force when it was read (§3: "all other records carry the
/// current clock value").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimedEvent {
    pub clock: u64,
    pub record: Record,
}

#[derive(Debug, Default, Clone)]
pub struct EngineStats {
    pub events_processed: u64,
    pub deaths_emitted: u64,
    pub advisories: u64,
    pub unknown_tags_skipped: u64,
}

pub struct EngineOutput {
    pub events: Vec<TimedEvent>,
    /// Deaths in discovery order, i.e. the order the reachability
    /// analysis found them in, not sorted by clock (§4.3 sorts them).
    pub deaths: Vec<DeathRecord>,
    pub stats: EngineStats,
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    pub strict: bool,
    pub verbose: bool,
}

/// Run both passes of §4.2 over the trace at `path`.
pub fn run(path: impl AsRef<Path>, config: EngineConfig) -> Result<EngineOutput, ReconError> {
    let path = path.as_ref();
    let witness_index = build_witness_index(path, config.strict)?;
    replay(path, config, &witness_index)
}

/// Pass 1 (§4.2.2): replay the trace tracking only the logical clock and
/// the last clock at which each object was witnessed. No graph is built.
fn build_witness_index(path: &Path, strict: bool) -> Result<HashMap<ObjectId, u64>, ReconError> {
    let mut lexer = Lexer::open(path, strict)?;
    let mut clock: u64 = 0;
    let mut witness_index = HashMap::new();

    while let Some(record) = lexer.next_record()? {
        match record {
            Record::MethodEntry(_) | Record::MethodExit(_) => clock += 1,
            Record::Witness(w) => {
                // Witnessing never ticks the clock (§9 decision).
                witness_index.insert(w.object, clock);
            }
            _ => {}
        }
    }
    Ok(witness_index)
}

/// Pass 2 (§4.2.3): replay the trace again, this time maintaining the
/// live heap and running reachability at every method exit and at
/// end-of-stream.
fn replay(
    path: &Path,
    config: EngineConfig,
    witness_index: &HashMap<ObjectId, u64>,
) -> Result<EngineOutput, ReconError> {
    let mut lexer = Lexer::open(path, config.strict)?;
    let mut heap = Heap::default();
    let mut clock: u64 = 0;
    let mut events = Vec::new();
    let mut deaths = Vec::new();
    let mut stats = EngineStats::default();

    while let Some(record) = lexer.next_record()? {
        stats.events_processed += 1;
        match &record {
            Record::Alloc(a) => {
                if heap.live.contains_key(&a.object) {
                    stats.advisories += 1;
                    crate::error::log_advisory(&Advisory::IdCollisionOnAlloc {
                        object: a.object,
                        line_no: stats.events_processed,
                    });
                }
                heap.live.insert(
                    a.object,
                    ObjectInfo {
                        size: a.size,
                        type_id: a.type_id,
                        site: a.site,
                        alloc_thread: a.thread,
                        class: None,
                        alloc_clock: clock,
                        edges: Default::default(),
                    },
                );
                if let Some(frame) = heap.thread_mut(a.thread).top_mut() {
                    frame.locals.insert(a.object);
                }
                events.push(TimedEvent { clock, record });
            }
            Record::Update(u) => {
                if u.receiver.is_null() {
                    if !u.target.is_null() {
                        heap.static_roots.insert(u.target);
                    }
                } else if let Some(info) = heap.live.get_mut(&u.receiver) {
                    if !u.target.is_null() {
                        info.edges.insert(u.target);
                    }
                } else {
                    stats.advisories += 1;
                    if config.verbose {
                        crate::error::log_advisory(&Advisory::UnknownObjectReferenced {
                            line_no: stats.events_processed,
                            object: u.receiver,
                        });
                    }
                }
                events.push(TimedEvent { clock, record });
            }
            Record::Witness(w) => {
                if let Some(info) = heap.live.get_mut(&w.object) {
                    info.class = Some(w.class);
                } else {
                    stats.advisories += 1;
                    if config.verbose {
                        crate::error::log_advisory(&Advisory::WitnessForUnallocated { object: w.object });
                    }
                }
                if let Some(frame) = heap.thread_mut(w.thread).top_mut() {
                    frame.locals.insert(w.object);
                }
                events.push(TimedEvent { clock, record });
            }
            Record::MethodEntry(m) => {
                clock += 1;
                heap.thread_mut(m.thread).push(m.method, m.receiver);
                events.push(TimedEvent { clock, record });
            }
            Record::MethodExit(e) => {
                clock += 1;
                let thread = e.thread;
                if heap.thread_mut(thread).pop().is_none() {
                    stats.advisories += 1;
                    crate::error::log_advisory(&Advisory::PopOnEmptyStack { thread });
                }
                events.push(TimedEvent { clock, record });
                collect_deaths(&mut heap, clock, witness_index, &mut deaths, &mut stats)?;
            }
            Record::Death(_) => {
                // Deaths are derived, never trusted from the input; a
                // `D` record in a re-read augmented trace is inert.
            }
        }
    }

    collect_deaths(&mut heap, clock, witness_index, &mut deaths, &mut stats)?;
    stats.deaths_emitted = deaths.len() as u64;
    stats.unknown_tags_skipped = lexer.unknown_tags_skipped;
    stats.advisories += lexer.unknown_tags_skipped + lexer.malformed_skipped;

    Ok(EngineOutput {
        events,
        deaths,
        stats,
    })
}

/// §4.2.3 steps 1-4: compute reachability at the given clock, defer any
/// object whose witness guard has not yet expired, and kill the rest.
fn collect_deaths(
    heap: &mut Heap,
    clock: u64,
    witness_index: &HashMap<ObjectId, u64>,
    deaths: &mut Vec<DeathRecord>,
    stats: &mut EngineStats,
) -> Result<(), ReconError> {
    let roots = heap.roots();
    let reachable = heap.reachable_from(&roots);

    let mut dead: Vec<ObjectId> = heap
        .live
        .keys()
        .copied()
        .filter(|id| !reachable.contains(id))
        .collect();
    // Deterministic order; the reorderer re-sorts by (clock, id) anyway,
    // but a stable discovery order makes the engine's own output
    // reproducible run to run.
    dead.sort();

    for object in dead {
        if let Some(&witness_clock) = witness_index.get(&object) {
            if witness_clock > clock {
                continue;
            }
        }
        let info = match heap.kill(object) {
            Some(info) => info,
            None => {
                return Err(ReconError::inconsistent(format!(
                    "object {object} selected as dead but absent from live set"
                )))
            }
        };
        deaths.push(DeathRecord::new(object, info.alloc_thread, clock));
    }

    let _ = stats;
    Ok(())
}

/// Map an exit's tag to whether it represents a normal or an
/// exceptional return; kept for callers that only care about stack
/// accounting, not the distinction (§4.1 decision: identical handling).
pub fn is_exceptional(kind: ExitKind) -> bool {
    !matches!(kind, ExitKind::Normal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn trace_file(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    fn cfg() -> EngineConfig {
        EngineConfig {
            strict: true,
            verbose: true,
        }
    }

    #[test]
    fn object_allocated_and_never_referenced_dies_at_method_exit() {
        let file = trace_file("M 10 0 1\nN 1 16 7 3 0 1\nE 10 1\n");
        let output = run(file.path(), cfg()).unwrap();
        assert_eq!(output.deaths.len(), 1);
        assert_eq!(output.deaths[0].object, ObjectId::new(1));
        assert_eq!(output.deaths[0].clock, 2);
    }

    #[test]
    fn static_root_keeps_object_alive_past_method_exit() {
        let file = trace_file(
            "M 10 0 1\nN 1 16 7 3 0 1\nU 0 1 5 1\nE 10 1\n",
        );
        let output = run(file.path(), cfg()).unwrap();
        assert!(output.deaths.is_empty());
    }

    #[test]
    fn chain_of_three_one_unreachable() {
        // 1 -> 2 via a field write, but 3 is allocated and immediately
        // orphaned; only 3 should die.
        let file = trace_file(
            "M 10 0 1\n\
             N 1 16 7 3 0 1\n\
             N 2 16 7 3 0 1\n\
             N 3 16 7 3 0 1\n\
             U 1 2 5 1\n\
             U 0 1 6 1\n\
             E 10 1\n",
        );
        let output = run(file.path(), cfg()).unwrap();
        assert_eq!(output.deaths.len(), 1);
        assert_eq!(output.deaths[0].object, ObjectId::new(3));
    }

    #[test]
    fn witness_after_apparent_death_defers_the_kill() {
        let file = trace_file(
            "M 10 0 1\n\
             N 1 16 7 3 0 1\n\
             E 10 1\n\
             M 11 0 1\n\
             W 1 9 1\n\
             E 11 1\n",
        );
        let output = run(file.path(), cfg()).unwrap();
        // Witnessed again at the later frame, so it survives that exit
        // and only dies once the later frame closes without re-rooting it.
        assert_eq!(output.deaths.len(), 1);
        assert_eq!(output.deaths[0].object, ObjectId::new(1));
        assert_eq!(output.deaths[0].clock, 4);
    }

    #[test]
    fn reference_to_never_allocated_object_is_tolerated() {
        let file = trace_file("M 10 0 1\nU 1 2 5 1\nE 10 1\n");
        let output = run(file.path(), cfg()).unwrap();
        assert!(output.deaths.is_empty());
        assert!(output.stats.advisories > 0);
    }

    #[test]
    fn reused_object_id_displaces_the_prior_instance() {
        // Two allocations of id 1 with no intervening method exit, so no
        // reachability pass ever sees the first instance: it is
        // silently displaced rather than dying in its own right.
        let file = trace_file(
            "M 10 0 1\n\
             N 1 16 7 3 0 1\n\
             N 1 32 8 4 0 1\n\
             E 10 1\n",
        );
        let output = run(file.path(), cfg()).unwrap();
        assert_eq!(output.deaths.len(), 1);
        assert_eq!(output.deaths[0].object, ObjectId::new(1));
        assert_eq!(output.deaths[0].clock, 2);
        assert!(output.stats.advisories > 0);
    }
}
