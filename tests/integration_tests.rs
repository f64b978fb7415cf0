//! Integration Tests


use crate::workdir::WorkDir;

fn stderr(output: &std::process::Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Extracts the pids of `[<pid>] Terminated` lines.
fn terminated_pids(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .filter(|line| line.contains("] Terminated\t"))
        .map(|line| line[1..line.find(']').unwrap()].to_string())
        .collect()
}

#[test]
fn test_simple_echo() {
    let wd = WorkDir::new("echo");
    assert_eq!(wd.stdout(&mut wd.script("echo test")), "test\n");
}

#[test]
fn test_simple_pipeline() {
    let wd = WorkDir::new("pipeline");
    let stdout = wd.stdout(&mut wd.script("echo needle | cat | cat"));
    assert_eq!(stdout, "needle\n");
}

#[test]
fn test_simple_redirects() {
    let wd = WorkDir::new("redirects");
    wd.create("data.txt", "pear\napple\n");
    let stdout = wd.stdout(&mut wd.script("sort < data.txt > out.txt\nestatus"));
    assert_eq!(stdout, "0\n");
    assert_eq!(wd.read("out.txt"), "apple\npear\n");
}

#[test]
fn test_output_redirect_appends() {
    let wd = WorkDir::new("append");
    wd.stdout(&mut wd.script("echo one > out.txt\necho two > out.txt"));
    assert_eq!(wd.read("out.txt"), "one\ntwo\n");
}

#[test]
fn test_stderr_redirect() {
    let wd = WorkDir::new("stderr");
    let output = wd.output(&mut wd.script("ls /no/such/jobsh/dir 2> err.txt"));
    assert!(stderr(&output).is_empty());
    assert!(!wd.read("err.txt").is_empty());
}

#[test]
fn test_estatus() {
    let wd = WorkDir::new("estatus");
    let stdout = wd.stdout(&mut wd.script("estatus\nfalse\nestatus\ntrue\nestatus"));
    assert_eq!(stdout, "0\n1\n0\n");
}

#[test]
fn test_command_not_found() {
    let wd = WorkDir::new("not_found");
    let output = wd.output(&mut wd.script("no_such_command_jobsh\nestatus"));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "127\n");
    assert!(stderr(&output).contains("jobsh: no_such_command_jobsh: command not found"));
}

#[test]
fn test_redirection_conflict() {
    let wd = WorkDir::new("conflict");
    wd.create("a.txt", "a\n");
    let output = wd.output(&mut wd.script("cat < a.txt > a.txt\necho next"));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "next\n");
    assert!(stderr(&output).contains("invalid redirection"));
    assert_eq!(wd.read("a.txt"), "a\n");
}

#[test]
fn test_missing_input_file() {
    let wd = WorkDir::new("missing_input");
    let output = wd.output(&mut wd.script("cat < missing.txt"));
    assert!(stderr(&output).contains("jobsh: missing.txt: no such file"));
}

#[test]
fn test_syntax_error() {
    let wd = WorkDir::new("syntax");
    let output = wd.output(&mut wd.script("| cat\necho ok"));
    assert_eq!(String::from_utf8_lossy(&output.stdout), "ok\n");
    assert!(stderr(&output).contains("syntax error"));
}

#[test]
fn test_exit_terminates_background_jobs() {
    let wd = WorkDir::new("exit");
    let output = wd.output(&mut wd.script("sleep 30 &\nsleep 31 &\nexit\necho unreachable"));
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(terminated_pids(&stdout).len(), 2);
    assert!(stdout.contains("] Terminated\tsleep 30 &\n"));
    assert!(stdout.contains("] Terminated\tsleep 31 &\n"));
    assert!(!stdout.contains("unreachable"));
}

#[test]
fn test_end_of_input_behaves_like_exit() {
    let wd = WorkDir::new("eof");
    let stdout = wd.stdout(&mut wd.script("sleep 30 &"));
    assert_eq!(terminated_pids(&stdout).len(), 1);
}

#[test]
fn test_background_capacity() {
    let wd = WorkDir::new("capacity");
    let output = wd.output(&mut wd.command(&["-c", "sleep 30 &\nsleep 30 &\nexit", "1"]));
    assert!(stderr(&output).contains("jobsh: background job limit reached (1)"));
    assert_eq!(terminated_pids(&String::from_utf8_lossy(&output.stdout)).len(), 1);
}

#[test]
fn test_invalid_max_background_jobs() {
    let wd = WorkDir::new("invalid_max");
    for value in &["0", "abc"] {
        let output = wd.output_allow_failure(&mut wd.command(&["-c", "echo unreachable", *value]));
        assert_eq!(output.status.code(), Some(1));
        assert!(output.stdout.is_empty());
        assert!(stderr(&output).contains("invalid command line argument"));
    }
}

#[test]
fn test_fg_unknown_pid() {
    let wd = WorkDir::new("fg_unknown");
    let output = wd.output(&mut wd.script("fg 9999"));
    assert!(stderr(&output).contains("jobsh: 9999: no such job"));
}

#[test]
fn test_fg_without_background_jobs() {
    let wd = WorkDir::new("fg_empty");
    let output = wd.output(&mut wd.script("fg"));
    assert!(stderr(&output).contains("jobsh: no background jobs"));
}

#[test]
fn test_fg_waits_for_oldest_job() {
    let wd = WorkDir::new("fg");
    let stdout = wd.stdout(&mut wd.script("sleep 1 &\nfg\nestatus"));
    assert_eq!(stdout, "sleep 1 &\n0\n");
}

#[test]
fn test_bglist() {
    let wd = WorkDir::new("bglist");
    let stdout = wd.stdout(&mut wd.script("sleep 30 &\nbglist\nexit"));
    let pids = terminated_pids(&stdout);
    assert_eq!(pids.len(), 1);

    let listing = stdout.lines().next().unwrap();
    let fields: Vec<&str> = listing.split('\t').collect();
    assert_eq!(fields.len(), 3);
    assert_eq!(fields[0], pids[0]);
    assert_eq!(fields[2], "sleep 30 &");
}

#[test]
fn test_done_notice() {
    let wd = WorkDir::new("done");
    let stdout = wd.stdout(&mut wd.script("true &\nsleep 1\nestatus"));
    assert!(stdout.contains("] Done\ttrue &\n"));
    assert!(stdout.ends_with("0\n"));
}

#[test]
fn test_cd() {
    let wd = WorkDir::new("cd");
    let stdout = wd.stdout(&mut wd.script("cd /\npwd"));
    assert_eq!(stdout, "/\n/\n");
}

#[test]
fn test_version() {
    let wd = WorkDir::new("version");
    let stdout = wd.stdout(&mut wd.command(&["--version"]));
    assert!(stdout.starts_with("jobsh version "));
}
