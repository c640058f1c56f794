//! Opaque integer id namespaces.
//!
//! The trace format draws every id (object, method, field, class, type,
//! site, thread) from the same decimal-integer vocabulary, but the spec
//! treats them as distinct namespaces: a field id must never be usable
//! where a thread id is expected, even though both are `u64` on the wire.
//! [`define_id`] generates one newtype per namespace so the compiler
//! enforces that separation instead of a convention.

/// Define a `u64`-backed id newtype with the common trait set (`Copy`,
/// `Ord`, `Hash`, `Display`, `From<u64>`).
///
/// ```ignore
/// define_id!(ObjectId);
/// ```
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[cfg_attr(feature = "serde", serde(transparent))]
        pub struct $name(pub u64);

        impl $name {
            /// The distinguished null / static-root placeholder id.
            pub const NULL: Self = Self(0);

            #[inline]
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            #[inline]
            pub const fn raw(self) -> u64 {
                self.0
            }

            #[inline]
            pub const fn is_null(self) -> bool {
                self.0 == 0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl From<$name> for u64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(
    /// Identifies a traced object instance. Id 0 is the static-root placeholder.
    ObjectId
);
define_id!(
    /// Identifies a thread in the traced mutator.
    ThreadId
);
define_id!(
    /// Identifies a method body (entry/exit pair share this id).
    MethodId
);
define_id!(
    /// Identifies a field slot used on a `U` (update) record.
    FieldId
);
define_id!(
    /// Identifies a runtime class, used only on `W` (witness) records.
    ClassId
);
define_id!(
    /// Identifies the declared type of an allocated object.
    TypeId
);
define_id!(
    /// Identifies the allocation call site that issued an object.
    SiteId
);
