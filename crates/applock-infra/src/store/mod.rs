//! Lock-screen store adapters: a durable file-backed implementation and an
//! in-memory one for tests and ephemeral sessions.

pub mod file_store;
pub mod memory;
