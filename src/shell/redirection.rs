//! Redirection resolver for single-step jobs.

use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::process::Stdio;

use log::debug;

use crate::core::job::{Job, ProcessStep};
use crate::errors::{Error, ErrorKind, Result};

/// Output and error files are created readable and writable by the owner only.
const CREATE_MODE: u32 = 0o600;

/// Opened redirection targets, ready to become a child's standard streams.
#[derive(Debug, Default)]
pub struct Redirections {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
    pub stderr: Option<File>,
}

impl Redirections {
    /// Validates and opens the redirections of `job`'s first step.
    ///
    /// Every target is opened before anything is spawned, so a missing input
    /// file or an unwritable output file aborts the job with no process created.
    pub fn resolve(job: &Job) -> Result<Redirections> {
        let step = &job.steps[0];
        check_conflicts(job, step)?;

        let stdin = match job.stdin_file {
            Some(ref path) => Some(open_input(path)?),
            None => None,
        };
        let stdout = match job.stdout_file {
            Some(ref path) => Some(open_output(path)?),
            None => None,
        };
        let stderr = match step.stderr_file {
            Some(ref path) => Some(open_output(path)?),
            None => None,
        };

        debug!(
            "resolved redirections for '{}': stdin={:?} stdout={:?} stderr={:?}",
            job.input, job.stdin_file, job.stdout_file, step.stderr_file
        );
        Ok(Redirections {
            stdin,
            stdout,
            stderr,
        })
    }

    pub fn take_stdin(&mut self) -> Stdio {
        self.stdin.take().map_or_else(Stdio::inherit, Stdio::from)
    }

    pub fn take_stdout(&mut self) -> Stdio {
        self.stdout.take().map_or_else(Stdio::inherit, Stdio::from)
    }

    pub fn take_stderr(&mut self) -> Stdio {
        self.stderr.take().map_or_else(Stdio::inherit, Stdio::from)
    }
}

/// Any two of the input, output and error paths naming the same file is a conflict.
fn check_conflicts(job: &Job, step: &ProcessStep) -> Result<()> {
    let paths: Vec<&str> = vec![
        job.stdin_file.as_deref(),
        job.stdout_file.as_deref(),
        step.stderr_file.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect();

    for (i, path) in paths.iter().enumerate() {
        if paths[i + 1..].contains(path) {
            return Err(ErrorKind::RedirectionConflict.into());
        }
    }

    Ok(())
}

fn open_input(path: &str) -> Result<File> {
    File::open(path).map_err(|e| -> Error {
        match e.kind() {
            io::ErrorKind::NotFound => ErrorKind::FileNotFound(path.to_string()).into(),
            _ => e.into(),
        }
    })
}

/// Opens `path` for appending, creating it if absent.
fn open_output(path: &str) -> Result<File> {
    OpenOptions::new()
        .append(true)
        .create(true)
        .mode(CREATE_MODE)
        .open(path)
        .map_err(|_| Error::from(ErrorKind::Redirect(path.to_string())))
}
