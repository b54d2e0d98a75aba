use std::collections::HashMap;
use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use gander_types::{ConnId, ConnectionSnapshot, PoolId, PoolSnapshot, StatsSnapshot};
use parking_lot::Mutex;

use crate::hub::SubscriberId;
use crate::source::{ConnectionSource, LibrarySource, PoolSource};

fn unix_now_ns() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as i64
}

// ── Records ──────────────────────────────────────────────

struct PoolRecord {
    pool: Weak<dyn PoolSource>,
    created_at: Instant,
    created_at_ns: i64,
    /// Subscription forwarding this pool's new connections into tracking.
    forward_sub: SubscriberId,
    release_sub: SubscriberId,
}

impl PoolRecord {
    /// Removes every subscription this record placed on the pool. A dead
    /// weak ref means the pool and its hubs are already gone; nothing to do.
    fn teardown(&self) {
        if let Some(pool) = self.pool.upgrade() {
            pool.connection_created().unsubscribe(self.forward_sub);
            pool.released().unsubscribe(self.release_sub);
        }
    }
}

struct ConnRecord {
    conn: Weak<dyn ConnectionSource>,
    /// Owning pool, present only when the connection was forwarded by one.
    pool_id: Option<PoolId>,
    created_at: Instant,
    created_at_ns: i64,
    release_sub: SubscriberId,
}

impl ConnRecord {
    fn teardown(&self) {
        if let Some(conn) = self.conn.upgrade() {
            conn.released().unsubscribe(self.release_sub);
        }
    }

    /// Snapshot minus `last_sql`. Reading `last_sql` runs foreign
    /// connection code, so the caller fills it in after dropping the state
    /// lock.
    fn snapshot_sans_sql(&self, id: &ConnId, now: Instant) -> ConnectionSnapshot {
        ConnectionSnapshot {
            id: id.clone(),
            pool: self.pool_id.clone(),
            created_at_ns: self.created_at_ns,
            live_ns: now.duration_since(self.created_at).as_nanos() as u64,
            last_sql: None,
        }
    }
}

#[derive(Default)]
struct State {
    pools: HashMap<PoolId, PoolRecord>,
    connections: HashMap<ConnId, ConnRecord>,
}

struct Inner {
    enabled: AtomicBool,
    state: Mutex<State>,
}

// ── Tracking handlers ────────────────────────────────────
//
// Invoked from hub emission. Fail-open: a missing diagnostic id or a
// disabled flag is a silent no-op, never an error surfaced to the host's
// data-access path.

fn track_pool(inner: &Arc<Inner>, pool: &Arc<dyn PoolSource>) {
    if !inner.enabled.load(Ordering::Acquire) {
        return;
    }
    let Some(id) = pool.diag_id() else {
        return;
    };

    let weak_pool = Arc::downgrade(pool);

    let forward_inner = Arc::downgrade(inner);
    let owner_id = id.clone();
    let forward_sub = pool.connection_created().subscribe(move |conn| {
        if let Some(inner) = forward_inner.upgrade() {
            track_connection(&inner, conn, Some(owner_id.clone()));
        }
    });

    let release_inner = Arc::downgrade(inner);
    let release_id = id.clone();
    let release_pool = weak_pool.clone();
    let release_sub = pool.released().subscribe_once(move |_| {
        if let Some(inner) = release_inner.upgrade() {
            untrack_pool(&inner, &release_id, &release_pool);
        }
    });

    let record = PoolRecord {
        pool: weak_pool,
        created_at: Instant::now(),
        created_at_ns: unix_now_ns(),
        forward_sub,
        release_sub,
    };

    let stale = {
        let mut state = inner.state.lock();
        // Re-check the gate under the lock: a disable that ran since the
        // check above already cleared the maps, and its clear must not be
        // followed by a stray insert.
        if !inner.enabled.load(Ordering::Acquire) {
            drop(state);
            record.teardown();
            return;
        }
        state.pools.insert(id.clone(), record)
    };
    tracing::trace!(pool = %id, "tracking pool");
    if let Some(stale) = stale {
        // Identifier recycled before the prior release was observed: the
        // new registration wins, the stale record's subscriptions go away.
        stale.teardown();
    }
}

fn untrack_pool(inner: &Inner, id: &PoolId, pool: &Weak<dyn PoolSource>) {
    let record = {
        let mut state = inner.state.lock();
        match state.pools.get(id) {
            // Only the record's own release may evict it; a successor
            // registered under a recycled id stays untouched.
            Some(record) if Weak::ptr_eq(&record.pool, pool) => state.pools.remove(id),
            _ => None,
        }
    };
    if let Some(record) = record {
        tracing::trace!(pool = %id, "pool released, dropping record");
        // The release already consumed its once-subscription; only the
        // connection-forwarding subscription is left to tear down.
        if let Some(pool) = record.pool.upgrade() {
            pool.connection_created().unsubscribe(record.forward_sub);
        }
    }
}

fn track_connection(
    inner: &Arc<Inner>,
    conn: &Arc<dyn ConnectionSource>,
    pool_id: Option<PoolId>,
) {
    if !inner.enabled.load(Ordering::Acquire) {
        return;
    }
    let Some(id) = conn.diag_id() else {
        return;
    };

    let weak_conn = Arc::downgrade(conn);

    let release_inner = Arc::downgrade(inner);
    let release_id = id.clone();
    let release_conn = weak_conn.clone();
    let release_sub = conn.released().subscribe_once(move |_| {
        if let Some(inner) = release_inner.upgrade() {
            untrack_connection(&inner, &release_id, &release_conn);
        }
    });

    let record = ConnRecord {
        conn: weak_conn,
        pool_id,
        created_at: Instant::now(),
        created_at_ns: unix_now_ns(),
        release_sub,
    };

    let stale = {
        let mut state = inner.state.lock();
        if !inner.enabled.load(Ordering::Acquire) {
            drop(state);
            record.teardown();
            return;
        }
        state.connections.insert(id.clone(), record)
    };
    tracing::trace!(connection = %id, "tracking connection");
    if let Some(stale) = stale {
        stale.teardown();
    }
}

fn untrack_connection(inner: &Inner, id: &ConnId, conn: &Weak<dyn ConnectionSource>) {
    let removed = {
        let mut state = inner.state.lock();
        match state.connections.get(id) {
            Some(record) if Weak::ptr_eq(&record.conn, conn) => state.connections.remove(id),
            _ => None,
        }
    };
    if removed.is_some() {
        tracing::trace!(connection = %id, "connection released, dropping record");
    }
}

// ── Registry ─────────────────────────────────────────────

/// Tracks the live set of pools and connections of one host library.
///
/// Construction subscribes durably to the library's `pool_created` and
/// `connection_created` hubs; those subscriptions stay active for the
/// registry's lifetime regardless of the runtime flag, which gates
/// *recording*, not *listening*. The flag starts off.
pub struct Registry {
    inner: Arc<Inner>,
    library: Arc<dyn LibrarySource>,
    pool_created_sub: SubscriberId,
    connection_created_sub: SubscriberId,
}

impl Registry {
    pub fn new(library: Arc<dyn LibrarySource>) -> Self {
        let inner = Arc::new(Inner {
            enabled: AtomicBool::new(false),
            state: Mutex::new(State::default()),
        });

        let pool_inner = Arc::downgrade(&inner);
        let pool_created_sub = library.pool_created().subscribe(move |pool| {
            if let Some(inner) = pool_inner.upgrade() {
                track_pool(&inner, pool);
            }
        });

        let conn_inner = Arc::downgrade(&inner);
        let connection_created_sub = library.connection_created().subscribe(move |conn| {
            if let Some(inner) = conn_inner.upgrade() {
                track_connection(&inner, conn, None);
            }
        });

        Self {
            inner,
            library,
            pool_created_sub,
            connection_created_sub,
        }
    }

    /// Current value of the runtime recording flag.
    pub fn enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::Acquire)
    }

    /// Flips the runtime recording flag.
    ///
    /// Switching off clears both record maps and tears down every
    /// per-object subscription; switching on affects only objects created
    /// afterwards. Setting the current value again is a no-op.
    pub fn set_enabled(&self, value: bool) {
        if value {
            self.inner.enabled.store(true, Ordering::Release);
            tracing::debug!("pool/connection tracking enabled");
            return;
        }

        // Flag store and map swap happen under the same lock, so a tracking
        // handler can never observe the stale flag and insert into the
        // cleared maps. Subscription teardown still runs outside the lock:
        // unsubscribing takes each object's hub lock and must not nest
        // inside ours.
        let state = {
            let mut state = self.inner.state.lock();
            self.inner.enabled.store(false, Ordering::Release);
            mem::take(&mut *state)
        };
        if state.pools.is_empty() && state.connections.is_empty() {
            return;
        }
        tracing::debug!(
            pools = state.pools.len(),
            connections = state.connections.len(),
            "pool/connection tracking disabled, clearing records"
        );
        for record in state.pools.values() {
            record.teardown();
        }
        for record in state.connections.values() {
            record.teardown();
        }
    }

    /// Point-in-time view over everything tracked. Elapsed times and
    /// last-SQL are computed here, at read time, never stored.
    pub fn snapshot(&self) -> StatsSnapshot {
        let now = Instant::now();
        // `last_sql` runs foreign connection code; read it only after the
        // state lock is dropped.
        let (pools, connections) = {
            let state = self.inner.state.lock();
            let pools: Vec<PoolSnapshot> = state
                .pools
                .iter()
                .map(|(id, record)| PoolSnapshot {
                    id: id.clone(),
                    created_at_ns: record.created_at_ns,
                    live_ns: now.duration_since(record.created_at).as_nanos() as u64,
                })
                .collect();
            let connections: Vec<(ConnectionSnapshot, Weak<dyn ConnectionSource>)> = state
                .connections
                .iter()
                .map(|(id, record)| (record.snapshot_sans_sql(id, now), record.conn.clone()))
                .collect();
            (pools, connections)
        };
        StatsSnapshot {
            pools,
            connections: connections
                .into_iter()
                .map(|(mut snapshot, conn)| {
                    // Read through to the live connection; never cached.
                    snapshot.last_sql = conn.upgrade().and_then(|conn| conn.last_sql());
                    snapshot
                })
                .collect(),
        }
    }

    /// Snapshot of a single pool, if tracked.
    pub fn pool(&self, id: &PoolId) -> Option<PoolSnapshot> {
        let now = Instant::now();
        let state = self.inner.state.lock();
        state.pools.get(id).map(|record| PoolSnapshot {
            id: id.clone(),
            created_at_ns: record.created_at_ns,
            live_ns: now.duration_since(record.created_at).as_nanos() as u64,
        })
    }

    /// Snapshot of a single connection, if tracked.
    pub fn connection(&self, id: &ConnId) -> Option<ConnectionSnapshot> {
        let now = Instant::now();
        let (mut snapshot, conn) = {
            let state = self.inner.state.lock();
            let record = state.connections.get(id)?;
            (record.snapshot_sans_sql(id, now), record.conn.clone())
        };
        snapshot.last_sql = conn.upgrade().and_then(|conn| conn.last_sql());
        Some(snapshot)
    }

    pub fn pool_count(&self) -> usize {
        self.inner.state.lock().pools.len()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.state.lock().connections.len()
    }
}

impl Drop for Registry {
    fn drop(&mut self) {
        self.library.pool_created().unsubscribe(self.pool_created_sub);
        self.library
            .connection_created()
            .unsubscribe(self.connection_created_sub);
    }
}
