//! Strongly typed, zero-cost identifier wrappers.
//!
//! All IDs are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! collection elements without ceremony.  `AgentId` is the agent's *short
//! id*: a dense integer usable as a direct array index, distinct from the
//! agent's stable `uid` string.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A `u32` id newtype that prints as `<prefix><n>` in logs.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident, $prefix:literal;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
        $vis struct $name(pub u32);

        impl $name {
            /// Never handed out; marks an unset slot.
            pub const INVALID: $name = $name(u32::MAX);

            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }

            #[inline(always)]
            pub fn is_valid(self) -> bool {
                self != Self::INVALID
            }
        }

        impl Default for $name {
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                if self.is_valid() {
                    write!(f, concat!($prefix, "{}"), self.0)
                } else {
                    f.write_str(concat!($prefix, "-"))
                }
            }
        }
    };
}

typed_id! {
    /// Short id of an agent.  Dense, assigned sequentially at spawn.
    pub struct AgentId, "a";
}

typed_id! {
    /// Identity of a placed structure.  Never reused after removal.
    pub struct StructureId, "s";
}

typed_id! {
    /// Identity of a placed prop (tree, rock, fence…).
    pub struct PropId, "p";
}

typed_id! {
    /// Identity of an ephemeral social field.
    pub struct FieldId, "f";
}
