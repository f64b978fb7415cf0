//! Jobsh builtins
//!
//! Commands that act on the shell itself rather than running a program. A job
//! is a builtin when its first program names one; builtins always run in the
//! shell process, even when followed by `&`.

use std::iter;

use docopt::Docopt;
use log::debug;
use serde::de::DeserializeOwned;

use self::prelude::*;

use self::cd::Cd;
use self::exit::Exit;
use self::jobs::{BgList, Estatus, Fg};

pub mod prelude {
    pub use std::io::Write;

    pub use crate::errors::{Error, ErrorKind, Result};
    pub use crate::shell::Shell;

    pub use super::parse_args;
}

mod cd;
mod exit;
mod jobs;

const BGLIST_NAME: &str = "bglist";
const CD_NAME: &str = "cd";
const ESTATUS_NAME: &str = "estatus";
const EXIT_NAME: &str = "exit";
const FG_NAME: &str = "fg";

/// Represents a Jobsh builtin command such as fg or exit.
pub trait BuiltinCommand {
    /// The NAME of the command.
    const NAME: &'static str;
    /// The help string to display to the user, in docopt format.
    const HELP: &'static str;
    /// Runs the command with the given arguments in the `shell` environment.
    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()>;
}

pub fn is_builtin<T: AsRef<str>>(program: T) -> bool {
    [BGLIST_NAME, CD_NAME, ESTATUS_NAME, EXIT_NAME, FG_NAME].contains(&program.as_ref())
}

/// precondition: program is a builtin.
pub fn run<S1, S2>(shell: &mut Shell, program: S1, args: &[S2], stdout: &mut dyn Write) -> Result<()>
where
    S1: AsRef<str>,
    S2: AsRef<str>,
{
    debug_assert!(is_builtin(&program));
    debug!("running builtin {}", program.as_ref());

    match program.as_ref() {
        BGLIST_NAME => BgList::run(shell, args, stdout),
        CD_NAME => Cd::run(shell, args, stdout),
        ESTATUS_NAME => Estatus::run(shell, args, stdout),
        EXIT_NAME => Exit::run(shell, args, stdout),
        FG_NAME => Fg::run(shell, args, stdout),
        _ => unreachable!(),
    }
}

pub fn parse_args<D, S, I>(usage: &str, program: S, args: I) -> Result<D>
where
    D: DeserializeOwned,
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let docopt = Docopt::new(usage)?
        .help(false)
        .argv(iter::once(program).chain(args));
    Ok(docopt.deserialize()?)
}
