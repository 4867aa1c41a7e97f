//! Core environment context trait for Lockstep replay drivers.

use async_trait::async_trait;
use std::time::Duration;

/// The central interface for time.
///
/// This trait abstracts the clock so that the same playback driver can run
/// against real time (a viewer ticking at a fixed rate) or against a virtual
/// clock (tests, batch export).
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `tokio::time`
/// - **Simulation**: `SimContext` (in `lockstep_sim`) - manually advanced clock
///
/// # Determinism
///
/// A replay driven through a virtual clock commits exactly the same ticks on
/// every run, since nothing in the core reads the wall clock.
#[async_trait]
pub trait ReplayContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances virtual clock
    async fn sleep(&self, duration: Duration);

    /// True if `sleep` returns without waiting for wall time.
    fn is_virtual(&self) -> bool {
        false
    }
}
