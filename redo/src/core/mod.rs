//! Deterministic, pure logic shared by the redo core.
//!
//! Core modules must be free of I/O side effects. They operate on names, sizes
//! and in-memory environment snapshots and return deterministic outputs
//! suitable for tests.

pub mod commit;
pub mod env;
pub mod names;
