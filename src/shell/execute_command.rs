use std::fs::File;
use std::io;
use std::process::Command;

use log::{debug, warn};
use nix::errno::Errno;
use nix::fcntl::OFlag;
use nix::sys::wait::{self, WaitStatus};
use nix::unistd::{self, Pid};

use crate::core::job::{Job, ProcessStep};
use crate::errors::{Error, ErrorKind, Result, ResultExt};
use crate::shell::redirection::Redirections;

const COMMAND_NOT_FOUND_EXIT_STATUS: i32 = 127;
const COMMAND_NOT_EXECUTABLE_EXIT_STATUS: i32 = 126;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProcessStatus {
    Running,
    Completed,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Process {
    argv: String,
    /// `id` is None when the program could not be executed
    id: Option<Pid>,
    status: ProcessStatus,
    status_code: Option<i32>,
}

impl Process {
    fn new_external(argv: String, id: Pid) -> Self {
        Self {
            argv,
            id: Some(id),
            status: ProcessStatus::Running,
            status_code: None,
        }
    }

    fn new_failed(argv: String, status_code: i32) -> Self {
        Self {
            argv,
            id: None,
            status: ProcessStatus::Completed,
            status_code: Some(status_code),
        }
    }

    pub fn id(&self) -> Option<Pid> {
        self.id
    }

    pub fn status(&self) -> ProcessStatus {
        self.status
    }

    pub fn status_code(&self) -> Option<i32> {
        self.status_code
    }

    /// Blocks until the process exits.
    pub fn wait(&mut self) -> Result<i32> {
        match (self.status, self.status_code, self.id) {
            (ProcessStatus::Completed, Some(status_code), _) => Ok(status_code),
            (_, _, Some(pid)) => {
                let status_code = wait_for_process(pid)?;
                debug!("'{}' completed with {}", self.argv, status_code);
                self.status = ProcessStatus::Completed;
                self.status_code = Some(status_code);
                Ok(status_code)
            }
            _ => unreachable!("running process without a pid"),
        }
    }
}

/// Spawns one process per step of `job`.
///
/// Single-step jobs use `redirections` for their standard streams. For
/// pipelines, each step reads from the previous step's pipe and writes to the
/// next one; the parent's copies of every pipe end are closed as soon as the
/// step owning them has been spawned.
pub fn spawn_processes(job: &Job, redirections: Option<Redirections>) -> Result<Vec<Process>> {
    if job.is_pipeline() {
        spawn_pipeline(&job.steps)
    } else {
        let mut redirections = redirections.unwrap_or_default();
        let step = &job.steps[0];
        let mut command = new_command(step);
        command
            .stdin(redirections.take_stdin())
            .stdout(redirections.take_stdout())
            .stderr(redirections.take_stderr());
        Ok(vec![spawn_step(command, step)])
    }
}

fn spawn_pipeline(steps: &[ProcessStep]) -> Result<Vec<Process>> {
    spawn_pipeline_with(steps, create_pipe)
}

/// If a pipe cannot be created, the steps already spawned are waited for
/// before the error is returned.
fn spawn_pipeline_with<F>(steps: &[ProcessStep], mut make_pipe: F) -> Result<Vec<Process>>
where
    F: FnMut() -> Result<(File, File)>,
{
    let mut processes = Vec::with_capacity(steps.len());
    let mut previous_read_end: Option<File> = None;

    for (i, step) in steps.iter().enumerate() {
        let mut command = new_command(step);
        if let Some(read_end) = previous_read_end.take() {
            command.stdin(read_end);
        }
        if i + 1 < steps.len() {
            let (read_end, write_end) = match make_pipe() {
                Ok(pipe) => pipe,
                Err(e) => {
                    // closes the read end of the previous step's pipe
                    drop(command);
                    warn!("failed to create pipe for '{}': {}", step.argv(), e);
                    wait_for_processes(&mut processes)?;
                    return Err(e);
                }
            };
            command.stdout(write_end);
            previous_read_end = Some(read_end);
        }

        processes.push(spawn_step(command, step));
        // `command` is dropped here along with the pipe ends it was given
    }

    Ok(processes)
}

fn new_command(step: &ProcessStep) -> Command {
    let mut command = Command::new(&step.program);
    command.args(&step.args);
    command
}

/// Spawns `command`, reporting exec failures instead of propagating them: a
/// step that cannot run completes immediately with a non-zero status and the
/// rest of the job carries on.
fn spawn_step(mut command: Command, step: &ProcessStep) -> Process {
    match command.spawn() {
        Ok(child) => {
            let pid = Pid::from_raw(child.id() as i32);
            debug!("spawned {} for '{}'", pid, step.argv());
            Process::new_external(step.argv(), pid)
        }
        Err(e) => {
            let (error, status_code): (Error, i32) = match e.kind() {
                io::ErrorKind::NotFound => (
                    ErrorKind::CommandNotFound(step.program.clone()).into(),
                    COMMAND_NOT_FOUND_EXIT_STATUS,
                ),
                io::ErrorKind::PermissionDenied => (
                    ErrorKind::CommandNotExecutable(step.program.clone()).into(),
                    COMMAND_NOT_EXECUTABLE_EXIT_STATUS,
                ),
                _ => (
                    Error::with_chain(e, ErrorKind::CommandNotExecutable(step.program.clone())),
                    COMMAND_NOT_EXECUTABLE_EXIT_STATUS,
                ),
            };
            warn!("failed to spawn '{}': {}", step.argv(), error);
            eprintln!("jobsh: {}", error);
            Process::new_failed(step.argv(), status_code)
        }
    }
}

/// Waits for every process in step order and returns the last step's status.
pub fn wait_for_processes(processes: &mut [Process]) -> Result<Option<i32>> {
    let mut last_status_code = None;
    for process in processes.iter_mut() {
        last_status_code = Some(process.wait()?);
    }

    Ok(last_status_code)
}

/// Blocks until `pid` exits, returning its exit code, or 128 plus the signal
/// number if it was killed.
///
/// Any failure of `waitpid` itself is fatal to the shell.
pub fn wait_for_process(pid: Pid) -> Result<i32> {
    loop {
        let wait_status = match wait::waitpid(pid, None) {
            Err(Errno::EINTR) => continue,
            result => result.chain_err(|| ErrorKind::WaitFailed(pid.as_raw()))?,
        };

        match wait_status {
            WaitStatus::Exited(_, status) => {
                debug!("{} exited with {}", pid, status);
                return Ok(status);
            }
            WaitStatus::Signaled(_, signal, _) => {
                debug!("{} terminated by signal {:?}", pid, signal);
                return Ok(128 + signal as i32);
            }
            // stop and continue notifications are not requested
            _ => continue,
        }
    }
}

/// Creates a pipe as (`read_end`, `write_end`).
///
/// Both ends are close-on-exec so later children in the pipeline do not
/// inherit them; `Command` clears the flag on the descriptors it installs as
/// a child's standard streams.
fn create_pipe() -> Result<(File, File)> {
    let (read_end, write_end) = unistd::pipe2(OFlag::O_CLOEXEC)?;
    Ok((File::from(read_end), File::from(write_end)))
}
