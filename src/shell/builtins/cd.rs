use std::env;
use std::path::PathBuf;

use serde_derive::Deserialize;

use crate::shell::builtins::{self, prelude::*};

pub struct Cd;

#[derive(Debug, Deserialize)]
struct CdArgs {
    arg_dir: Option<String>,
}

impl builtins::BuiltinCommand for Cd {
    const NAME: &'static str = builtins::CD_NAME;

    const HELP: &'static str = "\
cd: change the shell working directory.

Usage:
    cd [<dir>]

Change the current directory to DIR. The default DIR is the user's home
directory. If DIR is '-', the previous working directory is used. The new
working directory is printed on success.";

    fn run<T: AsRef<str>>(shell: &mut Shell, args: &[T], stdout: &mut dyn Write) -> Result<()> {
        let args: CdArgs = parse_args(Self::HELP, Self::NAME, args.iter().map(|arg| arg.as_ref()))?;

        let dir = match args.arg_dir.as_deref() {
            Some("~") | None => ::dirs::home_dir().ok_or_else(|| {
                Error::from(ErrorKind::BuiltinCommand("cd: HOME not set".to_string(), 1))
            })?,
            Some("-") => shell.previous_dir().map(PathBuf::from).ok_or_else(|| {
                Error::from(ErrorKind::BuiltinCommand("cd: OLDPWD not set".to_string(), 1))
            })?,
            Some(dir) => PathBuf::from(dir),
        };

        let current_dir = env::current_dir()?;
        env::set_current_dir(&dir)
            .map_err(|_| Error::from(ErrorKind::DirectoryChange(dir.display().to_string())))?;
        shell.set_previous_dir(current_dir);

        writeln!(stdout, "{}", env::current_dir()?.display())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shell::builtins::BuiltinCommand;
    use crate::shell::tests::PROCESS_LOCK;
    use crate::shell::ShellConfig;
    use tempdir::TempDir;

    #[test]
    fn test_cd_and_back() {
        // the working directory is process wide
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = env::current_dir().unwrap();
        let dir = TempDir::new("cd").unwrap();
        let target = dir.path().canonicalize().unwrap();
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();

        let mut stdout: Vec<u8> = Vec::new();
        Cd::run(&mut shell, &[target.to_str().unwrap()], &mut stdout).unwrap();
        assert_eq!(env::current_dir().unwrap(), target);
        assert_eq!(
            String::from_utf8(stdout).unwrap(),
            format!("{}\n", target.display())
        );

        let mut stdout: Vec<u8> = Vec::new();
        Cd::run(&mut shell, &["-"], &mut stdout).unwrap();
        assert_eq!(env::current_dir().unwrap(), original);
    }

    #[test]
    fn test_cd_missing_dir() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let original = env::current_dir().unwrap();
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();

        let mut stdout: Vec<u8> = Vec::new();
        let err = Cd::run(&mut shell, &["/no/such/jobsh/dir"], &mut stdout).unwrap_err();
        assert!(matches!(*err.kind(), ErrorKind::DirectoryChange(_)));
        assert_eq!(env::current_dir().unwrap(), original);
        assert!(shell.previous_dir().is_none());
    }

    #[test]
    fn test_cd_dash_without_previous_dir() {
        let _guard = PROCESS_LOCK.lock().unwrap_or_else(|e| e.into_inner());
        let mut shell = Shell::new(ShellConfig::noninteractive()).unwrap();
        let mut stdout: Vec<u8> = Vec::new();
        let err = Cd::run(&mut shell, &["-"], &mut stdout).unwrap_err();
        assert!(matches!(*err.kind(), ErrorKind::BuiltinCommand(_, 1)));
    }
}
