use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::sync::LazyLock;

/// Global string interner shared by node, edge, and handle ids.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Declares an interned identifier type. Each is a 4-byte `Spur`: Copy, Eq,
/// Hash in O(1), ordered and serialized by its string form.
macro_rules! interned_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(Spur);

        impl $name {
            /// Intern a string, or return the existing id if already interned.
            pub fn intern(s: &str) -> Self {
                Self(INTERNER.get_or_intern(s))
            }

            /// Resolve back to a string slice.
            pub fn as_str(&self) -> &'static str {
                INTERNER.resolve(&self.0)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.as_str())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl PartialOrd for $name {
            fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
                Some(self.cmp(other))
            }
        }

        impl Ord for $name {
            fn cmp(&self, other: &Self) -> Ordering {
                self.as_str().cmp(other.as_str())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                Ok(Self::intern(&s))
            }
        }
    };
}

interned_id! {
    /// Identifier of a node, stable across sessions.
    NodeId
}

interned_id! {
    /// Identifier of an edge.
    EdgeId
}

interned_id! {
    /// Named connection anchor on a node (e.g. `top`, `bottom`).
    HandleId
}

impl NodeId {
    /// The node id that represents a domain entity: `entity-{id}`.
    pub fn for_entity(entity: EntityId) -> Self {
        Self::intern(&format!("entity-{}", entity.0))
    }
}

impl EdgeId {
    /// Derive an edge id from its endpoint tuple plus a disambiguator.
    ///
    /// The same tuple may be connected, removed, and connected again; the
    /// sequence number keeps those edges distinct.
    pub fn derive(
        source: NodeId,
        source_handle: Option<HandleId>,
        target: NodeId,
        target_handle: Option<HandleId>,
        seq: u64,
    ) -> Self {
        let mut s = format!("edge-{source}");
        if let Some(h) = source_handle {
            s.push(':');
            s.push_str(h.as_str());
        }
        s.push('-');
        s.push_str(target.as_str());
        if let Some(h) = target_handle {
            s.push(':');
            s.push_str(h.as_str());
        }
        s.push_str(&format!("-{seq}"));
        Self::intern(&s)
    }
}

/// Identifier of a backing domain entity (a task record).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of a persisted diagram resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiagramId(pub i64);

impl fmt::Display for DiagramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "diagram#{}", self.0)
    }
}
