//! # rowmap testkit
//!
//! Test utilities for rowmap.
//!
//! This crate provides:
//! - Sample entities ([`User`], [`Membership`], [`Setting`]) and their metadata
//! - [`TestManager`], a manager over a fresh in-memory store
//! - Property-based test generators using proptest
//! - An integration harness that checks the store against an expected model
//!
//! ## Usage
//!
//! ```rust
//! use rowmap_testkit::prelude::*;
//!
//! let mut test = TestManager::new();
//! let before = test.writes();
//! test.flush().unwrap();
//! assert_eq!(test.writes(), before);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod integration;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::init_tracing;
    pub use crate::integration::*;
}

pub use fixtures::*;
pub use generators::*;
pub use integration::*;

use tracing_subscriber::EnvFilter;

/// Installs a test-friendly `tracing` subscriber.
///
/// The filter comes from `ROWMAP_LOG` (same syntax as `RUST_LOG`) and
/// defaults to `warn`. Calling it more than once is harmless.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("ROWMAP_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
