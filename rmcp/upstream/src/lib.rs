//! Launch configured MCP servers over stdio and call their tools.
//!
//! A [`ServerRegistry`] maps logical server names to launch commands. Each
//! [`Upstream::invoke`] starts a fresh child-process session, issues a single
//! `tools/call`, and tears the session down before returning.

pub mod client;
pub mod cmd;
pub mod error;
pub mod registry;

pub use client::Upstream;
pub use error::Error;
pub use registry::{ServerDescriptor, ServerRegistry};
