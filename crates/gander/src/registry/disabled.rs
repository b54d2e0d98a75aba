use std::sync::Arc;

use gander_types::{ConnId, ConnectionSnapshot, PoolId, PoolSnapshot, StatsSnapshot};

use crate::source::LibrarySource;

/// No-op registry used when the `diagnostics` feature is off.
pub struct Registry;

impl Registry {
    #[inline(always)]
    pub fn new(_library: Arc<dyn LibrarySource>) -> Self {
        Self
    }

    #[inline(always)]
    pub fn enabled(&self) -> bool {
        false
    }

    #[inline(always)]
    pub fn set_enabled(&self, _value: bool) {}

    #[inline(always)]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot::default()
    }

    #[inline(always)]
    pub fn pool(&self, _id: &PoolId) -> Option<PoolSnapshot> {
        None
    }

    #[inline(always)]
    pub fn connection(&self, _id: &ConnId) -> Option<ConnectionSnapshot> {
        None
    }

    #[inline(always)]
    pub fn pool_count(&self) -> usize {
        0
    }

    #[inline(always)]
    pub fn connection_count(&self) -> usize {
        0
    }
}
