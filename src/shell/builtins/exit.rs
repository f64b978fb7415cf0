use serde_derive::Deserialize;

use crate::shell::builtins::{self, prelude::*};

pub struct Exit;

#[derive(Debug, Deserialize)]
struct ExitArgs {}

impl builtins::BuiltinCommand for Exit {
    const NAME: &'static str = builtins::EXIT_NAME;

    const HELP: &'static str = "\
exit: exit the shell.

Usage:
    exit

Sends SIGUSR2 to every background job, reports each one as terminated and
exits with a status of 0.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let _: ExitArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(|arg| arg.as_ref()))?;
        shell.exit(stdout)
    }
}
