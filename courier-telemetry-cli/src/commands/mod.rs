//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`probe`] - Backend discovery check
//! - [`replay`] - Drive a tracking session from a recorded trace
//! - [`session`] - Inspect or clear the resumable session record

pub mod config;
pub mod probe;
pub mod replay;
pub mod session;
