//! Plain data types for gander snapshots.
//!
//! Identifier newtypes plus the read-only statistics view emitted by the
//! registry. Everything here derives [`facet::Facet`] so hosts can ship
//! snapshots over their existing facet-json paths.

use std::fmt;

use facet::Facet;

macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        #[derive(Facet, Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[facet(transparent)]
        $(#[$meta])*
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

define_string_id!(
    /// Diagnostic identifier of a connection pool.
    PoolId
);

define_string_id!(
    /// Diagnostic identifier of a connection.
    ConnId
);

/// A currently-live pool as seen by the registry.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct PoolSnapshot {
    /// Diagnostic identifier of the pool.
    pub id: PoolId,
    /// Unix timestamp (nanoseconds) captured at registration.
    pub created_at_ns: i64,
    /// Time the pool has been live, computed at snapshot time.
    pub live_ns: u64,
}

/// A currently-live connection as seen by the registry.
#[derive(Facet, Debug, Clone, PartialEq)]
pub struct ConnectionSnapshot {
    /// Diagnostic identifier of the connection.
    pub id: ConnId,
    /// Owning pool, present only for pooled connections.
    pub pool: Option<PoolId>,
    /// Unix timestamp (nanoseconds) captured at registration.
    pub created_at_ns: i64,
    /// Time the connection has been live, computed at snapshot time.
    pub live_ns: u64,
    /// Last SQL statement the connection reported, read through to the
    /// live object at snapshot time. Never cached by the registry.
    pub last_sql: Option<String>,
}

/// Point-in-time statistics view over everything the registry tracks.
///
/// Entry order is unspecified.
#[derive(Facet, Debug, Clone, Default, PartialEq)]
pub struct StatsSnapshot {
    /// Live pools under observation.
    pub pools: Vec<PoolSnapshot>,
    /// Live connections under observation.
    pub connections: Vec<ConnectionSnapshot>,
}

impl StatsSnapshot {
    /// Connection identifiers currently attributed to `pool`.
    pub fn connections_of(&self, pool: &PoolId) -> Vec<&ConnId> {
        self.connections
            .iter()
            .filter(|conn| conn.pool.as_ref() == Some(pool))
            .map(|conn| &conn.id)
            .collect()
    }
}
