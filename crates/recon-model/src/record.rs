//! Trace record types — the typed form the lexer produces, one variant
//! per tag documented in the wire format (§6).

use crate::id::{ClassId, FieldId, MethodId, ObjectId, SiteId, ThreadId, TypeId};

/// How a method activation was exited.
///
/// `X`/`T`/`H` are legacy exceptional-exit tags some tracer versions emit;
/// they carry the same fields as `E` and are handled identically for
/// stack accounting (§4.1). The variant is kept only so the augmented
/// trace can echo back the tag the input used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitKind {
    Normal,
    Exceptional(ExceptionalTag),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExceptionalTag {
    X,
    T,
    H,
}

impl ExitKind {
    pub fn tag(self) -> &'static str {
        match self {
            ExitKind::Normal => "E",
            ExitKind::Exceptional(ExceptionalTag::X) => "X",
            ExitKind::Exceptional(ExceptionalTag::T) => "T",
            ExitKind::Exceptional(ExceptionalTag::H) => "H",
        }
    }
}

/// A non-array or array allocation (`N` / `A`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocRecord {
    pub object: ObjectId,
    pub size: u64,
    pub type_id: TypeId,
    pub site: SiteId,
    /// Element count for array allocations; always 0 for `N`.
    pub length: u64,
    pub thread: ThreadId,
    pub is_array: bool,
}

/// A field write (`U`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UpdateRecord {
    /// Zero means the write is to a static field.
    pub receiver: ObjectId,
    /// Zero means the assigned value is null.
    pub target: ObjectId,
    pub field: FieldId,
    pub thread: ThreadId,
}

/// A field read / witness (`W`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WitnessRecord {
    pub object: ObjectId,
    pub class: ClassId,
    pub thread: ThreadId,
}

/// A method entry (`M`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodEntryRecord {
    pub method: MethodId,
    /// Zero for static methods.
    pub receiver: ObjectId,
    pub thread: ThreadId,
}

/// A method exit, normal or exceptional (`E` / `X` / `T` / `H`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MethodExitRecord {
    pub method: MethodId,
    pub thread: ThreadId,
    pub kind: ExitKind,
}

/// A reconstructed death (`D`), produced by the engine and optionally
/// re-read from an augmented trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeathRecord {
    pub object: ObjectId,
    pub thread: ThreadId,
    pub clock: u64,
}

impl DeathRecord {
    pub fn new(object: ObjectId, thread: ThreadId, clock: u64) -> Self {
        Self {
            object,
            thread,
            clock,
        }
    }
}

/// One well-formed line of the trace, already typed and with the
/// current logical clock value attached where the format defines one.
///
/// `Alloc`/`Update`/`Witness` carry no clock field on the wire — the
/// reader is expected to track the ambient clock alongside them (the
/// lexer does not compute the clock; the engine does, since only it
/// knows the tick policy of §4.2.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Record {
    Alloc(AllocRecord),
    Update(UpdateRecord),
    Witness(WitnessRecord),
    MethodEntry(MethodEntryRecord),
    MethodExit(MethodExitRecord),
    Death(DeathRecord),
}

impl Record {
    /// The single-character tag this record would be written back out as.
    pub fn tag(&self) -> &'static str {
        match self {
            Record::Alloc(a) if a.is_array => "A",
            Record::Alloc(_) => "N",
            Record::Update(_) => "U",
            Record::Witness(_) => "W",
            Record::MethodEntry(_) => "M",
            Record::MethodExit(e) => e.kind.tag(),
            Record::Death(_) => "D",
        }
    }
}
