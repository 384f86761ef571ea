//! tsk - a personal task manager.
//!
//! Entry point: collects argv, captures standard-input tokens when
//! stdin is not a terminal, initializes logging, runs the pipeline and
//! maps the outcome to a process exit code: 0 success, 1 application
//! error, 2 caught expected error, 3 unexpected error.

use std::io::{IsTerminal, Read};

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() {
    init_logging();

    let argv: Vec<String> = std::env::args().collect();
    let stdin_words = capture_stdin();

    match tsk_drv::run(argv, stdin_words) {
        Ok(code) => std::process::exit(code),
        Err(error) => {
            eprintln!("{}", error);
            std::process::exit(error.exit_code());
        }
    }
}

/// Whitespace-delimited tokens from stdin, up to the first `--`, read
/// only when stdin is not a TTY.
fn capture_stdin() -> Vec<String> {
    let mut words = Vec::new();
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return words;
    }

    let mut buffer = String::new();
    if stdin.lock().read_to_string(&mut buffer).is_ok() {
        for word in buffer.split_whitespace() {
            if word == "--" {
                break;
            }
            words.push(word.to_string());
        }
    }
    words
}

/// Logging goes to stderr; `TSK_LOG` raises the filter.
fn init_logging() {
    let filter = EnvFilter::try_from_env("TSK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();
}
