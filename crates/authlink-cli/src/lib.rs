//! authlink command line interface
//!
//! The binary lives in `main.rs`; everything else is a library so commands
//! can be exercised from tests.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod settings;
