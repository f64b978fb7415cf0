//! Jobsh - a job control shell
//!
//! Runs parsed command lines as processes: single commands with file
//! redirection, pipelines, and background jobs that are reaped
//! asynchronously when they terminate.

#![recursion_limit = "1024"]
#![deny(missing_debug_implementations, unused_import_braces)]

/// Logs the error of `result` without propagating it.
macro_rules! log_if_err {
    ($result:expr, $fmt:expr) => {{
        if let Err(e) = $result {
            log::error!("{}: {}", $fmt, e);
        }
    }};
    ($result:expr, $fmt:expr, $($arg:tt)*) => {{
        if let Err(e) = $result {
            log::error!("{}: {}", format_args!($fmt, $($arg)*), e);
        }
    }};
}

pub mod core;
pub mod editor;
pub mod errors;
pub mod shell;

pub use crate::core::job::{Job, JobBuilder, ProcessStep};
pub use crate::shell::{parse_max_background_jobs, Shell, ShellConfig};
