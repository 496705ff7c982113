//! Entry manager use-case layer.
//!
//! # Responsibility
//! - Compose storage, codec and cache into `read`/`update`/`list`.
//! - Keep HTTP/template collaborators decoupled from storage details.
//!
//! # See also
//! - `cache` for the refresh protocol.

pub mod config;
pub mod entry_manager;
