//! Tracing subscriber configuration and setup
//!
//! Library code only emits events through the `tracing` macros; binaries
//! decide where those events go by calling [`init::init_tracing`].

pub mod config;
#[cfg(all(feature = "subscriber", not(target_arch = "wasm32")))]
pub mod init;

pub use config::{InstrumentationConfig, LogFormat};
#[cfg(all(feature = "subscriber", not(target_arch = "wasm32")))]
pub use init::init_tracing;
