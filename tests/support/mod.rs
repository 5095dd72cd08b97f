//! Shared helpers for integration tests.

pub mod raw_server;
pub mod socket_guard;
