//! # kook-cli
//!
//! Command-line listener for the KOOK bot gateway.
//!
//! `kook-listen listen` connects with a bot token, subscribes to the chosen
//! event categories and prints each notification as text or JSON until
//! interrupted.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod listen;
pub mod output;

pub use cli::{Cli, Commands, Format, ListenArgs};
pub use listen::{Exit, print_until_stopped};
