//! The event-subscription capability gander consumes from the host.
//!
//! The host data-access library implements [`LibrarySource`]; its pool and
//! connection objects implement [`PoolSource`] / [`ConnectionSource`]. The
//! registry never owns a tracked object: it keeps `Weak` back-references
//! and treats the `released` notification, not the reference count, as the
//! authoritative signal to drop a record.

use std::sync::Arc;

use gander_types::{ConnId, PoolId};

use crate::hub::Hub;

/// Library-level lifecycle notifications.
pub trait LibrarySource: Send + Sync {
    /// Fired when the library creates a new pool.
    fn pool_created(&self) -> &Hub<Arc<dyn PoolSource>>;

    /// Fired when the library creates a connection outside any pool.
    fn connection_created(&self) -> &Hub<Arc<dyn ConnectionSource>>;
}

/// A connection pool under potential observation.
pub trait PoolSource: Send + Sync {
    /// Diagnostic identifier. Objects without one are not tracked.
    fn diag_id(&self) -> Option<PoolId>;

    /// Fired for each connection this pool hands out.
    fn connection_created(&self) -> &Hub<Arc<dyn ConnectionSource>>;

    /// Fired once when the pool is released.
    fn released(&self) -> &Hub<()>;
}

/// A connection under potential observation.
pub trait ConnectionSource: Send + Sync {
    /// Diagnostic identifier. Objects without one are not tracked.
    fn diag_id(&self) -> Option<ConnId>;

    /// Last SQL statement this connection executed, if any. Read by the
    /// registry at snapshot time only.
    fn last_sql(&self) -> Option<String>;

    /// Fired once when the connection is released.
    fn released(&self) -> &Hub<()>;
}
