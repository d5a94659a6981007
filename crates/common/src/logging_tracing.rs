// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! # Tracing configuration setup.
//!
//! The engine and the command line are instrumented with Rust's `tracing` framework.
//!
//! Calling the `init` function will initialize a global tracing subscriber based on the value of
//! the `SWAG_LOG` environment variable which follows the same conventions as `RUST_LOG`. Only
//! warnings and errors are shown when it is not set.
//!
//! ```shell
//! $ SWAG_LOG=form_engine=debug swag tree users/getById
//! ```

use thiserror::Error;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, prelude::*, util::TryInitError};

use crate::env_const::SWAG_LOG;

/// Initialize the tracing subscriber with a compact `tracing_subscriber::fmt` layer writing to
/// stderr, so that command output on stdout stays machine readable.
pub fn init() -> Result<(), LoggingError> {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter())
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

fn filter() -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .with_env_var(SWAG_LOG)
        .from_env_lossy()
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Tracing is already initialized: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}
