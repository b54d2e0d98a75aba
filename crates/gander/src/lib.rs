//! Live diagnostics for database connection pools and connections.
//!
//! Gander subscribes to the lifecycle notifications of a host data-access
//! library and keeps a record for every pool and connection that is
//! currently alive: when it was created, how long it has been live, and
//! (for connections) the last SQL statement it reported. Derived values are
//! computed at read time; nothing is cached.
//!
//! Recording is gated by a runtime flag that starts **off**. Switching it
//! off again clears every record; switching it on tracks only objects
//! created afterwards. Tracking is fail-open: objects without a diagnostic
//! identifier, double releases, and releases after a clear are all silent
//! no-ops — diagnostics never fail the host's data path.
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use gander::{Registry, source::LibrarySource};
//! # fn demo(library: Arc<dyn LibrarySource>) {
//! let registry = Registry::new(library);
//! registry.set_enabled(true);
//! // ... pools and connections come and go ...
//! for conn in registry.snapshot().connections {
//!     println!("{} live for {}ns, last: {:?}", conn.id, conn.live_ns, conn.last_sql);
//! }
//! # }
//! ```
//!
//! # Cargo features
//!
//! | Feature | Effect |
//! |---------|--------|
//! | `diagnostics` *(default)* | Full tracking registry. |
//! | *(none)* | [`Registry`] compiles to a no-op shell with the same API; snapshots are empty. |

pub mod hub;
mod registry;
pub mod source;

pub use gander_types::{ConnId, ConnectionSnapshot, PoolId, PoolSnapshot, StatsSnapshot};
pub use registry::Registry;
