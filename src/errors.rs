//! Error module. See the [error-chain](https://crates.io/crates/error-chain) crate for details.

use error_chain::error_chain;

error_chain! {
    foreign_links {
        Io(::std::io::Error);
        Nix(::nix::Error);
        Readline(::rustyline::error::ReadlineError);
        Docopt(::docopt::Error);
    }

    errors {
        /// Generic syntax error containing offending line
        Syntax(line: String) {
            description("syntax error")
            display("syntax error near: '{}'", line)
        }
        BuiltinCommand(message: String, code: i32) {
            description("builtin command failed")
            display("{}", message)
        }
        CommandNotFound(command: String) {
            description("command not found")
            display("{}: command not found", command)
        }
        CommandNotExecutable(command: String) {
            description("command not executable")
            display("{}: cannot execute", command)
        }
        FileNotFound(path: String) {
            description("file not found")
            display("{}: no such file", path)
        }
        Redirect(path: String) {
            description("cannot open redirection target")
            display("{}: cannot open for writing", path)
        }
        RedirectionConflict {
            description("redirection conflict")
            display("invalid redirection: input, output and error files must differ")
        }
        BackgroundCapacityExceeded(max: usize) {
            description("too many background jobs")
            display("background job limit reached ({})", max)
        }
        DuplicateJob(pid: i32) {
            description("duplicate background job")
            display("{}: already a background job", pid)
        }
        JobNotFound(job: String) {
            description("no such job")
            display("{}: no such job", job)
        }
        NoBackgroundJobs {
            description("no background jobs")
            display("no background jobs")
        }
        DirectoryChange(dir: String) {
            description("cannot change directory")
            display("cd: {}: no such directory", dir)
        }
        InvalidArgument(value: String) {
            description("invalid command line argument")
            display("invalid command line argument value: '{}'", value)
        }
        /// A `wait` call failed; the shell cannot trust its process table anymore.
        WaitFailed(pid: i32) {
            description("wait failed")
            display("wait error on process {}", pid)
        }
    }
}

impl Error {
    /// Errors that must terminate the shell instead of aborting one job.
    pub fn is_fatal(&self) -> bool {
        matches!(*self.kind(), ErrorKind::WaitFailed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_wait_failures_are_fatal() {
        assert!(Error::from(ErrorKind::WaitFailed(42)).is_fatal());
        assert!(!Error::from(ErrorKind::RedirectionConflict).is_fatal());
        assert!(!Error::from(ErrorKind::JobNotFound("9999".into())).is_fatal());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Error::from(ErrorKind::JobNotFound("9999".into())).to_string(),
            "9999: no such job"
        );
        assert_eq!(
            Error::from(ErrorKind::CommandNotFound("nope".into())).to_string(),
            "nope: command not found"
        );
    }
}
