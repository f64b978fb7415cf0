use std::iter;

use log::{debug, error, info};
use nix::errno::Errno;
use nix::sys::signal;
use nix::sys::wait::{self, WaitPidFlag, WaitStatus};
use nix::unistd::Pid;

use crate::errors::Result;
use crate::shell::execute_command::wait_for_process;
use crate::shell::registry::{BackgroundEntry, BackgroundRegistry};
use crate::shell::signals::SHUTDOWN_SIGNAL;

/// Collects every terminated child without blocking.
///
/// Returns the background entries all of whose processes have now been
/// reaped, in the order they finished. Children that belong to no entry are
/// collected and ignored. Calling this with nothing to collect is a no-op.
pub fn reap_children(registry: &mut BackgroundRegistry) -> Vec<BackgroundEntry> {
    collect_reaped(registry, iter::from_fn(poll_child))
}

/// Next terminated child, or `None` once nothing is left to collect.
fn poll_child() -> Option<nix::Result<WaitStatus>> {
    loop {
        match wait::waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) | Err(Errno::ECHILD) => return None,
            Err(Errno::EINTR) => continue,
            result => return Some(result),
        }
    }
}

/// Applies each reaped status to `registry`. A failed wait stops collection;
/// entries completed before it are still returned.
fn collect_reaped<I>(registry: &mut BackgroundRegistry, statuses: I) -> Vec<BackgroundEntry>
where
    I: IntoIterator<Item = nix::Result<WaitStatus>>,
{
    let mut completed = Vec::new();
    for wait_status in statuses {
        let (pid, status_code) = match wait_status {
            Ok(WaitStatus::Exited(pid, status_code)) => {
                debug!("reaped {}, exited with {}", pid, status_code);
                (pid, status_code)
            }
            Ok(WaitStatus::Signaled(pid, signal, _)) => {
                debug!("reaped {}, terminated by signal {:?}", pid, signal);
                (pid, 128 + signal as i32)
            }
            Ok(_) => continue,
            Err(e) => {
                error!("failed to reap children: {}", e);
                break;
            }
        };

        if let Some(entry) = registry.mark_reaped(pid, status_code) {
            info!("background job {} completed", entry.pid());
            completed.push(entry);
        }
    }

    completed
}

/// Waits for every process of `entry` that has not been reaped yet, in step
/// order, and returns the status of the job's last step.
pub fn wait_for_job(entry: &BackgroundEntry) -> Result<Option<i32>> {
    debug!("putting job {} in foreground", entry.pid());
    let mut last_status_code = entry.last_status();
    for &pid in entry.processes() {
        let status_code = wait_for_process(pid)?;
        if entry.last_step() == Some(pid) {
            last_status_code = Some(status_code);
        }
    }

    Ok(last_status_code)
}

/// Removes every background job, sending each of its processes the shutdown
/// signal. Delivery failures are logged; the entry is removed regardless.
pub fn terminate_background_jobs(registry: &mut BackgroundRegistry) -> Vec<BackgroundEntry> {
    let entries = registry.drain();
    for entry in &entries {
        for &pid in entry.processes() {
            debug!("sending {:?} to {}", SHUTDOWN_SIGNAL, pid);
            let temp_result = signal::kill(pid, SHUTDOWN_SIGNAL);
            log_if_err!(temp_result, "failed to signal {}", pid);
        }
    }

    entries
}

/// Sends the shutdown signal to each of `pids` and waits for all of them.
pub fn stop_processes(pids: &[Pid]) -> Result<()> {
    for &pid in pids {
        debug!("sending {:?} to {}", SHUTDOWN_SIGNAL, pid);
        let temp_result = signal::kill(pid, SHUTDOWN_SIGNAL);
        log_if_err!(temp_result, "failed to signal {}", pid);
    }
    for &pid in pids {
        wait_for_process(pid)?;
    }

    Ok(())
}
