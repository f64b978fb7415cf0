use std::path::PathBuf;
use std::process;

use docopt::Docopt;
use jobsh::errors::*;
use jobsh::{parse_max_background_jobs, Shell, ShellConfig};
use log::{debug, error};
use nix::unistd::Pid;
use serde_derive::Deserialize;

const COMMAND_HISTORY_CAPACITY: usize = 10;
const LOG_FILE_NAME: &str = ".jobsh_log";
const FAILURE_EXIT_STATUS: i32 = 1;

const USAGE: &str = "
jobsh.

Usage:
    jobsh [options] [<max-bg-jobs>]
    jobsh (-h | --help)
    jobsh --version

Options:
    -h --help       Show this screen.
    --version       Show version.
    -c <command>    Execute the newline-separated lines of <command>, then exit.
    --log=<path>    File to write log to, defaults to ~/.jobsh_log
";

/// Docopts input arguments.
#[derive(Debug, Deserialize)]
struct Args {
    arg_max_bg_jobs: Option<String>,
    flag_version: bool,
    flag_c: Option<String>,
    flag_log: Option<String>,
}

fn main() {
    let args: Args = Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    init_logger(&args.flag_log);
    debug!("{:?}", args);

    if args.flag_version {
        println!("jobsh version {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let max_background_jobs = match args.arg_max_bg_jobs {
        Some(ref value) => {
            Some(parse_max_background_jobs(value).unwrap_or_else(|e| display_error_and_exit(&e)))
        }
        None => None,
    };

    let result = if let Some(ref command) = args.flag_c {
        let config = ShellConfig::noninteractive().with_max_background_jobs(max_background_jobs);
        Shell::new(config).and_then(|mut shell| shell.execute_command_string(command))
    } else {
        let config = ShellConfig::interactive(COMMAND_HISTORY_CAPACITY)
            .with_max_background_jobs(max_background_jobs);
        Shell::new(config).and_then(|mut shell| shell.execute_from_stdin())
    };

    if let Err(e) = result {
        display_error_and_exit(&e);
    }
}

/// Logs to `path`, or `~/.jobsh_log`. The shell runs without a logger if the
/// file cannot be opened.
fn init_logger(path: &Option<String>) {
    let log_path = match path.clone().map(PathBuf::from).or_else(default_log_path) {
        Some(log_path) => log_path,
        None => return,
    };
    let log_file = match fern::log_file(&log_path) {
        Ok(log_file) => log_file,
        Err(e) => {
            eprintln!("jobsh: unable to open {}: {}", log_path.display(), e);
            return;
        }
    };

    let pid = Pid::this();
    let temp_result = fern::Dispatch::new()
        .format(move |out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                pid,
                record.level(),
                record.target(),
                message
            ))
        })
        .level(log::LevelFilter::Trace)
        .chain(log_file)
        .apply();
    if let Err(e) = temp_result {
        eprintln!("jobsh: unable to initialize logger: {}", e);
    }
}

fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(LOG_FILE_NAME))
}

fn display_error_and_exit(error: &Error) -> ! {
    error!("exiting: {}", error);
    eprintln!("jobsh: {}", error);
    process::exit(FAILURE_EXIT_STATUS);
}
