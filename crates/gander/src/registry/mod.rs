//! Live pool/connection diagnostics registry.
//!
//! Central storage for every pool and connection currently under
//! observation. Recording is gated by a runtime flag that starts off and
//! clears all records when switched off.
//!
//! When the `diagnostics` cargo feature is disabled, the registry compiles
//! down to a no-op shell with the identical API and `snapshot()` returns an
//! empty view.

#[cfg(not(feature = "diagnostics"))]
mod disabled;
#[cfg(feature = "diagnostics")]
mod enabled;

#[cfg(not(feature = "diagnostics"))]
pub use disabled::*;
#[cfg(feature = "diagnostics")]
pub use enabled::*;
