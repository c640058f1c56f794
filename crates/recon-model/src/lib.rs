//! Shared wire types for the offline object-death reconstruction pipeline.
//!
//! This crate holds nothing but data: the id newtypes (§3, §11) and the
//! per-tag record types (§6) that the lexer, engine, reorderer and oracle
//! builder crate all agree on. Keeping them here instead of duplicating
//! them in the engine crate is what lets a later consumer (e.g. a
//! downstream allocator-simulator driver) depend on the wire shapes
//! without pulling in the reachability algorithm itself.

pub mod id;
pub mod record;

pub use id::{ClassId, FieldId, MethodId, ObjectId, SiteId, ThreadId, TypeId};
pub use record::{
    AllocRecord, DeathRecord, ExceptionalTag, ExitKind, MethodEntryRecord, MethodExitRecord,
    Record, UpdateRecord, WitnessRecord,
};
