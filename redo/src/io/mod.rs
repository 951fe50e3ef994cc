//! Side-effecting steps of a build: config, do-file probes, output sinks,
//! shell execution and commit.

pub mod commit;
pub mod config;
pub mod dofile;
pub mod output;
pub mod shell;
