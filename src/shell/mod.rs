use crate::errors::{ErrorKind, Result};

pub use self::shell::Shell;

mod builtins;
pub mod execute_command;
pub mod job_control;
pub mod redirection;
pub mod registry;
#[allow(clippy::module_inception)]
mod shell;
pub mod signals;

/// Policy object to control a Shell's behavior
#[derive(Debug, Copy, Clone)]
pub struct ShellConfig {
    /// Number of entries to store in the line editor's history
    command_history_capacity: usize,

    /// Determines if some messages (e.g. "exit") should be displayed.
    display_messages: bool,

    /// Maximum number of concurrent background jobs, unbounded if `None`.
    max_background_jobs: Option<usize>,
}

impl ShellConfig {
    /// Creates an interactive shell, e.g. command history, prompt messages
    ///
    /// # Complete List
    /// - Command History is enabled
    /// - Some additional messages are displayed
    /// - Background jobs are unbounded
    pub fn interactive(command_history_capacity: usize) -> Self {
        Self {
            command_history_capacity,
            display_messages: true,
            max_background_jobs: None,
        }
    }

    /// Creates a noninteractive shell, e.g. no command history
    ///
    /// # Complete List
    /// - Command History is disabled.
    /// - Fewer messages are displayed
    /// - Background jobs are unbounded
    pub fn noninteractive() -> Self {
        Default::default()
    }

    /// Limits how many background jobs may run at once.
    pub fn with_max_background_jobs(self, max_background_jobs: Option<usize>) -> Self {
        Self {
            max_background_jobs,
            ..self
        }
    }

    pub fn max_background_jobs(&self) -> Option<usize> {
        self.max_background_jobs
    }
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            command_history_capacity: 0,
            display_messages: false,
            max_background_jobs: None,
        }
    }
}

/// Parses the background job limit given on the command line.
///
/// # Examples
/// ```rust
/// use jobsh::parse_max_background_jobs;
/// assert_eq!(parse_max_background_jobs("3").unwrap(), 3);
/// assert!(parse_max_background_jobs("0").is_err());
/// assert!(parse_max_background_jobs("three").is_err());
/// ```
pub fn parse_max_background_jobs(value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(max) if max > 0 => Ok(max),
        _ => Err(ErrorKind::InvalidArgument(value.to_string()).into()),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    lazy_static::lazy_static! {
        /// Held by every test that spawns or reaps children, since reaping
        /// collects any child of the test process.
        pub static ref PROCESS_LOCK: Mutex<()> = Mutex::new(());
    }

    #[test]
    fn test_parse_max_background_jobs() {
        assert_eq!(parse_max_background_jobs("1").unwrap(), 1);
        assert_eq!(parse_max_background_jobs("25").unwrap(), 25);
        for invalid in &["0", "-1", "abc", "", "2x"] {
            let err = parse_max_background_jobs(invalid).unwrap_err();
            assert!(matches!(*err.kind(), ErrorKind::InvalidArgument(ref v) if v == invalid));
        }
    }

    #[test]
    fn test_config_defaults() {
        let config = ShellConfig::noninteractive();
        assert_eq!(config.max_background_jobs(), None);
        assert!(!config.display_messages);

        let config = ShellConfig::interactive(10).with_max_background_jobs(Some(2));
        assert_eq!(config.max_background_jobs(), Some(2));
        assert_eq!(config.command_history_capacity, 10);
        assert!(config.display_messages);
    }
}
