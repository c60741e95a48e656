// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! fw-daemon: process entry point — configuration, registration, logging,
//! and signal-driven shutdown around the [`fw_worker::Worker`] state machine.

mod config;
mod registration;

pub use config::{rotate_log_if_needed, setup_logging, Config, ConfigError};
pub use registration::{register_worker, sign_off, sign_on, RegistrationError};
