//! Jobsh - Shell Module
//!
//! The Shell owns the background job registry and dispatches each parsed job
//! to a builtin, the redirection resolver, or the pipeline executor.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Local;
use log::{debug, error, info, warn};
use nix::unistd::Pid;

use crate::core::job::Job;
use crate::core::parser::parse_job;
use crate::editor::Editor;
use crate::errors::{ErrorKind, Result};
use crate::shell::builtins;
use crate::shell::execute_command::{spawn_processes, wait_for_processes};
use crate::shell::job_control;
use crate::shell::redirection::Redirections;
use crate::shell::registry::{BackgroundEntry, BackgroundRegistry};
use crate::shell::signals::{self, SHUTDOWN_SIGNAL};
use crate::shell::ShellConfig;

const PROMPT: &str = "jobsh> ";

/// Jobsh Shell
#[derive(Debug)]
pub struct Shell {
    config: ShellConfig,
    background_jobs: BackgroundRegistry,
    /// Exit status of the last foreground job.
    last_exit_status: Option<i32>,
    /// Working directory before the last successful `cd`.
    previous_dir: Option<PathBuf>,
    exit_requested: bool,
}

impl Shell {
    /// Constructs a new Shell and installs its signal handlers.
    pub fn new(config: ShellConfig) -> Result<Shell> {
        signals::install_handlers()?;

        let shell = Shell {
            config,
            background_jobs: BackgroundRegistry::with_capacity(config.max_background_jobs),
            last_exit_status: None,
            previous_dir: None,
            exit_requested: false,
        };

        info!(
            "jobsh started up, background job limit: {:?}",
            config.max_background_jobs
        );
        Ok(shell)
    }

    /// Runs each line of `input` in order, stopping after `exit`. Reaching the
    /// end of `input` behaves like `exit`.
    pub fn execute_command_string(&mut self, input: &str) -> Result<()> {
        for line in input.lines() {
            if self.exit_requested {
                break;
            }
            let temp_result = self.process_signals();
            self.report(temp_result)?;
            self.execute_line(line)?;
        }

        self.finish()
    }

    /// Runs jobs from stdin until `exit` or end of input.
    pub fn execute_from_stdin(&mut self) -> Result<()> {
        let mut editor = Editor::with_capacity(self.config.command_history_capacity)?;

        while !self.exit_requested {
            let temp_result = self.process_signals();
            self.report(temp_result)?;

            let line = match editor.readline(PROMPT)? {
                Some(line) => line,
                None => {
                    if self.config.display_messages {
                        println!("exit");
                    }
                    break;
                }
            };

            if !line.trim().is_empty() {
                editor.add_history_entry(&line);
            }
            self.execute_line(&line)?;
        }

        self.finish()
    }

    /// Parses and dispatches one line. Errors that only abort the job are
    /// printed; fatal errors are returned.
    pub fn execute_line(&mut self, line: &str) -> Result<()> {
        let result = match parse_job(line) {
            Ok(Some(job)) => self.execute_job(job),
            Ok(None) => Ok(()),
            Err(e) => Err(e),
        };
        self.report(result)
    }

    /// Runs a parsed job.
    ///
    /// Builtins run in the shell process. Anything else is checked against the
    /// background limit before a single process exists, then spawned and
    /// either registered as a background job or waited for.
    pub fn execute_job(&mut self, job: Job) -> Result<()> {
        if builtins::is_builtin(job.program()) {
            if job.background || job.is_pipeline() || job.has_redirects() {
                debug!("running builtin '{}' in the shell process", job);
            }
            let mut stdout = io::stdout();
            return builtins::run(self, job.program(), &job.steps[0].args, &mut stdout);
        }

        if job.background && self.background_jobs.is_full() {
            let max = self.background_jobs.capacity().unwrap_or(0);
            return Err(ErrorKind::BackgroundCapacityExceeded(max).into());
        }

        let redirections = if job.is_pipeline() {
            if job.has_redirects() {
                warn!("ignoring redirection in pipeline '{}'", job);
            }
            None
        } else {
            Some(Redirections::resolve(&job)?)
        };

        let mut processes = spawn_processes(&job, redirections)?;

        if job.background {
            let pids: Vec<Pid> = processes.iter().filter_map(|p| p.id()).collect();
            if pids.is_empty() {
                debug!("no process of '{}' started, not registering it", job);
                return Ok(());
            }

            let mut entry = BackgroundEntry::new(job, pids.clone());
            let failed_last_step = processes
                .last()
                .filter(|p| p.id().is_none())
                .and_then(|p| p.status_code());
            if let Some(status_code) = failed_last_step {
                entry = entry.with_failed_last_step(status_code);
            }

            let pid = entry.pid();
            let input = entry.job().to_string();
            debug!("putting job {} in background", pid);
            if let Err(e) = self.background_jobs.insert(entry) {
                warn!("could not register job {}, stopping it: {}", pid, e);
                job_control::stop_processes(&pids)?;
                return Err(e);
            }

            if self.config.display_messages {
                println!("[{}] {}", pid, input);
            }
            Ok(())
        } else {
            if let Some(status_code) = wait_for_processes(&mut processes)? {
                self.last_exit_status = Some(status_code);
            }
            Ok(())
        }
    }

    /// Acts on the signal flags set since the last call: reaps terminated
    /// children, and reports a received shutdown broadcast.
    pub fn process_signals(&mut self) -> Result<()> {
        if signals::take_reap_request() {
            for entry in job_control::reap_children(&mut self.background_jobs) {
                println!("[{}] Done\t{}", entry.pid(), entry.job());
            }
        }

        if signals::take_terminate_request() {
            let now = Local::now();
            info!("received {:?} at {}", SHUTDOWN_SIGNAL, now.to_rfc3339());
            eprintln!(
                "jobsh: received {:?} at {}",
                SHUTDOWN_SIGNAL,
                now.format("%a %b %e %T %Y")
            );
        }

        Ok(())
    }

    /// Removes a background job and blocks until it exits, recording its
    /// status. Without `pid` the oldest background job is used.
    pub fn put_job_in_foreground(&mut self, pid: Option<Pid>, stdout: &mut dyn Write) -> Result<()> {
        let entry = match pid {
            Some(pid) => self.background_jobs.remove_by_pid(pid)?,
            None => self.background_jobs.remove_oldest()?,
        };
        writeln!(stdout, "{}", entry.job())?;

        if let Some(status_code) = job_control::wait_for_job(&entry)? {
            self.last_exit_status = Some(status_code);
        }
        Ok(())
    }

    /// Signals every background job and marks the shell as exiting. The
    /// signaled processes are not waited for.
    pub fn exit(&mut self, stdout: &mut dyn Write) -> Result<()> {
        for entry in job_control::terminate_background_jobs(&mut self.background_jobs) {
            writeln!(stdout, "[{}] Terminated\t{}", entry.pid(), entry.job())?;
        }

        self.exit_requested = true;
        info!("jobsh has shut down");
        Ok(())
    }

    pub fn exit_requested(&self) -> bool {
        self.exit_requested
    }

    pub fn background_jobs(&self) -> &BackgroundRegistry {
        &self.background_jobs
    }

    pub fn last_exit_status(&self) -> Option<i32> {
        self.last_exit_status
    }

    pub fn previous_dir(&self) -> Option<&Path> {
        self.previous_dir.as_deref()
    }

    pub(crate) fn set_previous_dir(&mut self, dir: PathBuf) {
        self.previous_dir = Some(dir);
    }

    fn finish(&mut self) -> Result<()> {
        if !self.exit_requested {
            self.exit(&mut io::stdout())?;
        }
        Ok(())
    }

    fn report(&self, result: Result<()>) -> Result<()> {
        match result {
            Err(e) if e.is_fatal() => {
                error!("fatal: {}", e);
                Err(e)
            }
            Err(e) => {
                debug!("job failed: {:?}", e);
                eprintln!("jobsh: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }
}
