//! Background job registry.
//!
//! Entries are kept in registration order. The registry is only mutated from
//! the shell's control loop, never from a signal handler.

use std::fmt;
use std::slice;

use chrono::{DateTime, Local};
use nix::unistd::Pid;

use crate::core::job::Job;
use crate::errors::{ErrorKind, Result};

/// A running background job and the processes it is made of.
pub struct BackgroundEntry {
    /// Identifies the job. Always one of `processes`, the last step's pid
    /// until that step is reaped.
    pid: Pid,
    /// Processes of the job that have not been reaped yet, in step order.
    processes: Vec<Pid>,
    /// Pid of the last step, `None` if it could not be started.
    last_step: Option<Pid>,
    /// Status of the last step once it is known.
    last_status: Option<i32>,
    job: Job,
    started: DateTime<Local>,
}

impl BackgroundEntry {
    /// `processes` are the started steps in step order; the last of them is
    /// taken as the job's last step.
    ///
    /// # Panics
    /// Panics if `processes` is empty.
    pub fn new(job: Job, processes: Vec<Pid>) -> Self {
        let pid = *processes.last().expect("background job without processes");
        Self {
            pid,
            processes,
            last_step: Some(pid),
            last_status: None,
            job,
            started: Local::now(),
        }
    }

    /// Records that the job's last step never ran and finished with
    /// `status_code`.
    pub fn with_failed_last_step(self, status_code: i32) -> Self {
        Self {
            last_step: None,
            last_status: Some(status_code),
            ..self
        }
    }

    pub fn pid(&self) -> Pid {
        self.pid
    }

    pub fn processes(&self) -> &[Pid] {
        &self.processes
    }

    pub fn last_step(&self) -> Option<Pid> {
        self.last_step
    }

    /// Status of the last step if it has already finished.
    pub fn last_status(&self) -> Option<i32> {
        self.last_status
    }

    pub fn job(&self) -> &Job {
        &self.job
    }

    fn has_process(&self, pid: Pid) -> bool {
        self.processes.contains(&pid)
    }

    /// Returns whether every process has now been reaped.
    fn mark_reaped(&mut self, pid: Pid, status_code: i32) -> bool {
        self.processes.retain(|&p| p != pid);
        if self.last_step == Some(pid) {
            self.last_status = Some(status_code);
        }
        // a reaped pid may be reused by the OS
        if let Some(&live) = self.processes.last() {
            self.pid = live;
        }
        self.processes.is_empty()
    }
}

impl fmt::Display for BackgroundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}",
            self.pid,
            self.started.format("%a %b %e %T %Y"),
            self.job
        )
    }
}

impl fmt::Debug for BackgroundEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pid: {}\tprocesses: {:?}\tlast status: {:?}\tinput: {}",
            self.pid, self.processes, self.last_status, self.job.input
        )
    }
}

#[derive(Default)]
pub struct BackgroundRegistry {
    entries: Vec<BackgroundEntry>,
    /// `None` means unbounded.
    capacity: Option<usize>,
}

impl BackgroundRegistry {
    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.capacity.map_or(false, |max| self.entries.len() >= max)
    }

    /// Appends `entry`, rejecting it when the registry is full or its pid is
    /// already registered.
    pub fn insert(&mut self, entry: BackgroundEntry) -> Result<()> {
        if let Some(max) = self.capacity {
            if self.entries.len() >= max {
                return Err(ErrorKind::BackgroundCapacityExceeded(max).into());
            }
        }
        if self.lookup_by_pid(entry.pid).is_some() {
            return Err(ErrorKind::DuplicateJob(entry.pid.as_raw()).into());
        }

        self.entries.push(entry);
        Ok(())
    }

    pub fn remove_by_pid(&mut self, pid: Pid) -> Result<BackgroundEntry> {
        let index = self
            .find_entry(pid)
            .ok_or_else(|| ErrorKind::JobNotFound(pid.to_string()))?;
        Ok(self.entries.remove(index))
    }

    /// Removes the entry registered first.
    pub fn remove_oldest(&mut self) -> Result<BackgroundEntry> {
        if self.entries.is_empty() {
            return Err(ErrorKind::NoBackgroundJobs.into());
        }
        Ok(self.entries.remove(0))
    }

    pub fn lookup_by_pid(&self, pid: Pid) -> Option<&BackgroundEntry> {
        self.find_entry(pid).map(|index| &self.entries[index])
    }

    /// Entries in registration order.
    pub fn iter(&self) -> slice::Iter<'_, BackgroundEntry> {
        self.entries.iter()
    }

    /// Records that `pid` was reaped with `status_code`.
    ///
    /// Returns the owning entry once every one of its processes has been
    /// reaped; the entry is no longer registered at that point.
    pub fn mark_reaped(&mut self, pid: Pid, status_code: i32) -> Option<BackgroundEntry> {
        let index = self.entries.iter().position(|e| e.has_process(pid))?;
        if self.entries[index].mark_reaped(pid, status_code) {
            Some(self.entries.remove(index))
        } else {
            None
        }
    }

    /// Removes every entry, oldest first.
    pub fn drain(&mut self) -> Vec<BackgroundEntry> {
        self.entries.drain(..).collect()
    }

    fn find_entry(&self, pid: Pid) -> Option<usize> {
        self.entries.iter().position(|entry| entry.pid == pid)
    }
}

impl<'a> IntoIterator for &'a BackgroundRegistry {
    type Item = &'a BackgroundEntry;
    type IntoIter = slice::Iter<'a, BackgroundEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for BackgroundRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} jobs\tcapacity: {:?}", self.entries.len(), self.capacity)?;
        for entry in &self.entries {
            writeln!(f, "{:?}", entry)?;
        }

        Ok(())
    }
}
