//! tsk-drv - Command dispatch and the write-side modifier.
//!
//! Wires the pipeline together: bootstraps configuration and entities,
//! runs the argument passes, compiles the filter, selects a command
//! from the command table, enforces the safety gates, applies
//! modifications, and maps errors to process exit codes.

pub mod commands;
pub mod confirm;
pub mod dispatcher;
pub mod engine;
pub mod filter;
pub mod modify;
pub mod resolver;

pub use engine::Engine;

use tsk_util::Result;

/// Run one command line. Returns the process exit code.
pub fn run(argv: Vec<String>, stdin_words: Vec<String>) -> Result<i32> {
    let mut engine = Engine::bootstrap(argv, stdin_words)?;
    engine.execute()
}
