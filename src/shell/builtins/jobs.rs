use log::debug;
use nix::unistd::Pid;
use serde_derive::Deserialize;

use crate::shell::builtins::{self, prelude::*};

pub struct Fg;

#[derive(Debug, Deserialize)]
struct FgArgs {
    arg_pid: Option<String>,
}

impl builtins::BuiltinCommand for Fg {
    const NAME: &'static str = builtins::FG_NAME;

    const HELP: &'static str = "\
fg: move a background job to the foreground.

Usage:
    fg [<pid>]

Waits for the job identified by PID, or the oldest background job if PID is
not present, and records its exit status.

Exit Status:
Status of command placed in foreground or failure if an error occurs.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let args: FgArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(|arg| arg.as_ref()))?;
        debug!("{:?}", args);

        let pid = args.arg_pid.as_deref().map(parse_pid).transpose()?;
        shell.put_job_in_foreground(pid, stdout)
    }
}

/// Only positive pids can name a background job.
fn parse_pid(pid: &str) -> Result<Pid> {
    match pid.parse::<i32>() {
        Ok(raw) if raw > 0 => Ok(Pid::from_raw(raw)),
        _ => Err(ErrorKind::JobNotFound(pid.to_string()).into()),
    }
}

pub struct BgList;

#[derive(Debug, Deserialize)]
struct NoArgs {}

impl builtins::BuiltinCommand for BgList {
    const NAME: &'static str = builtins::BGLIST_NAME;

    const HELP: &'static str = "\
bglist: list background jobs.

Usage:
    bglist

Prints one line per background job, oldest first: its pid, start time and
command line.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let _: NoArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(|arg| arg.as_ref()))?;

        for entry in shell.background_jobs() {
            writeln!(stdout, "{}", entry)?;
        }

        Ok(())
    }
}

pub struct Estatus;

impl builtins::BuiltinCommand for Estatus {
    const NAME: &'static str = builtins::ESTATUS_NAME;

    const HELP: &'static str = "\
estatus: print the exit status of the last foreground job.

Usage:
    estatus

Prints 0 when no foreground job has completed yet.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let _: NoArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(|arg| arg.as_ref()))?;
        writeln!(stdout, "{}", shell.last_exit_status().unwrap_or(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtins::BuiltinCommand;
    use crate::shell::tests::PROCESS_LOCK;
    use crate::shell::ShellConfig;

    fn run<C: BuiltinCommand>(shell: &mut Shell, args: &[&str]) -> Result<String> {
        let mut stdout: Vec<u8> = Vec::new();
        C::run(shell, args, &mut stdout)?;
        Ok(String::from_utf8(stdout).unwrap())
    }

    #[test]
    fn test_parse_pid() {
        assert_eq!(parse_pid("42").unwrap(), Pid::from_raw(42));
        for invalid in &["0", "-3", "abc", "%1"] {
            let err = parse_pid(invalid).unwrap_err();
            assert!(matches!(*err.kind(), ErrorKind::JobNotFound(ref job) if job == invalid));
        }
    }

    #[test]
    fn test_fg_unknown_pid() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let err = run::<Fg>(&mut shell, &["9999"]).unwrap_err();
        assert!(matches!(*err.kind(), ErrorKind::JobNotFound(ref job) if job == "9999"));
    }

    #[test]
    fn test_fg_without_jobs() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let err = run::<Fg>(&mut shell, &[]).unwrap_err();
        assert!(matches!(*err.kind(), ErrorKind::NoBackgroundJobs));
    }

    #[test]
    fn test_fg_rejects_extra_arguments() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let err = run::<Fg>(&mut shell, &["1", "2"]).unwrap_err();
        assert!(matches!(*err.kind(), ErrorKind::Docopt(_)));
    }

    #[test]
    fn test_estatus_defaults_to_zero() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert_eq!(run::<Estatus>(&mut shell, &[]).unwrap(), "0\n");
    }

    #[test]
    fn test_bglist_empty() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        assert_eq!(run::<BgList>(&mut shell, &[]).unwrap(), "");
    }
}
