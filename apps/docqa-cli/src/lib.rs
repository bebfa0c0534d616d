//! The `docqa` web UI and command line: wires configuration, credentials and
//! the answering chain to an HTTP form and a few subcommands.

pub mod factory;
pub mod render;
pub mod web;
