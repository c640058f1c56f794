//! The typed error taxonomy of §7: four fatal kinds a caller can match
//! on, plus advisories that are logged and never returned.

use recon_model::ObjectId;
use thiserror::Error;

/// A fatal error from any pipeline stage.
///
/// Every variant maps to one of the four fatal kinds §7 names. Advisory
/// conditions (unknown id referenced, pop on empty stack, ...) are never
/// represented here — they go to [`log`] instead, see [`Advisory`].
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed record at line {line_no}: {reason}")]
    MalformedRecord { line_no: u64, reason: String },

    #[error("temporal conflict for death of object {object} at clock {death_clock}: {reason}")]
    TemporalConflict {
        object: ObjectId,
        death_clock: u64,
        reason: String,
    },

    #[error("inconsistent graph: {reason}")]
    InconsistentGraph { reason: String },
}

impl ReconError {
    pub fn malformed(line_no: u64, reason: impl Into<String>) -> Self {
        ReconError::MalformedRecord {
            line_no,
            reason: reason.into(),
        }
    }

    pub fn temporal_conflict(object: ObjectId, death_clock: u64, reason: impl Into<String>) -> Self {
        ReconError::TemporalConflict {
            object,
            death_clock,
            reason: reason.into(),
        }
    }

    pub fn inconsistent(reason: impl Into<String>) -> Self {
        ReconError::InconsistentGraph {
            reason: reason.into(),
        }
    }
}

/// Non-fatal conditions logged in place (§4.2.5, §7). These never abort a
/// run; a caller who wants them surfaced enables `verbose` diagnostics
/// (§12) and reads them off the log facade the way this codebase's other
/// synchronous modules do.
#[derive(Debug, Clone)]
pub enum Advisory {
    UnknownTagSkipped { line_no: u64, tag: String },
    UnknownObjectReferenced { line_no: u64, object: ObjectId },
    WitnessForUnallocated { object: ObjectId },
    PopOnEmptyStack { thread: recon_model::ThreadId },
    IdCollisionOnAlloc { object: ObjectId, line_no: u64 },
    MalformedRecordSkipped { line_no: u64, reason: String },
}

impl std::fmt::Display for Advisory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Advisory::UnknownTagSkipped { line_no, tag } => {
                write!(f, "line {line_no}: unknown record tag '{tag}', skipping")
            }
            Advisory::UnknownObjectReferenced { line_no, object } => write!(
                f,
                "line {line_no}: reference to never-allocated object {object}"
            ),
            Advisory::WitnessForUnallocated { object } => {
                write!(f, "witness for never-allocated object {object}")
            }
            Advisory::PopOnEmptyStack { thread } => {
                write!(f, "method exit on empty stack for thread {thread}")
            }
            Advisory::IdCollisionOnAlloc { object, line_no } => write!(
                f,
                "line {line_no}: allocation of already-live object {object}, displacing prior instance"
            ),
            Advisory::MalformedRecordSkipped { line_no, reason } => {
                write!(f, "line {line_no}: malformed record skipped: {reason}")
            }
        }
    }
}

/// Emit an advisory through the `log` facade at the severity §7 implies
/// (warnings; these are recoverable by definition).
pub fn log_advisory(advisory: &Advisory) {
    log::warn!("{advisory}");
}
