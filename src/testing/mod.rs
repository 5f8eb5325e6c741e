//! Test doubles for the collaborator traits.
//!
//! - [`MemoryHub`] / [`MemoryRouter`]: in-process signaling router
//! - [`LoopbackNetwork`]: negotiation capability pairing two connections
//! - [`RecordingConnection`] / [`RecordingFactory`]: capture writes and
//!   inject events by hand

mod loopback;
mod memory;
mod recording;

pub use loopback::*;
pub use memory::*;
pub use recording::*;

/// Install a `tracing` subscriber for tests, honoring `RUST_LOG`.
///
/// Safe to call more than once.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
