//! Lockstep Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" clock abstraction allowing a replay to
//! run against **Production** time (tokio) or a **Simulated** virtual clock.
//!
//! # Core Concept: The Reactor Pattern
//!
//! The playback core never reads a clock. A driver owns a context, sleeps one
//! fixed step at a time, and feeds the elapsed step into the session:
//!
//! ```ignore
//! use lockstep_env::ReplayContext;
//!
//! async fn drive<Ctx: ReplayContext>(ctx: &Ctx, session: &mut ReplaySession) {
//!     loop {
//!         ctx.sleep(Duration::from_millis(20)).await;
//!         for event in session.update(Duration::from_millis(20)) {
//!             render(event);
//!         }
//!     }
//! }
//! ```

mod context;
mod tokio_impl;

pub use context::ReplayContext;
pub use tokio_impl::TokioContext;
