//! Adapters that live inside the domain crate for convenience.
//!
//! The session store keeps its data in a caller-owned `Session`; durable
//! adapters (SQLite) live in separate crates.

pub mod session_store;
