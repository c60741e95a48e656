//! Behavioral specifications for the flamenco-worker daemon.
//!
//! These are black-box: they spawn the built `flamenco-worker` binary
//! against a mocked Manager and observe its filesystem/process behavior.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

#[path = "specs/registration.rs"]
mod registration;

#[path = "specs/shutdown.rs"]
mod shutdown;
