use std::fmt;

/// One executable invocation within a job's pipeline.
#[derive(Clone, Debug, PartialEq)]
pub struct ProcessStep {
    /// The program to execute.
    pub program: String,
    /// The arguments to the program.
    pub args: Vec<String>,
    /// The file to write stderr to, if one is specified.
    pub stderr_file: Option<String>,
}

impl ProcessStep {
    pub fn new<S1, S2>(program: S1, args: &[S2]) -> Self
    where
        S1: AsRef<str>,
        S2: AsRef<str>,
    {
        Self {
            program: program.as_ref().to_string(),
            args: args.iter().map(|arg| arg.as_ref().to_string()).collect(),
            stderr_file: None,
        }
    }

    pub fn with_stderr_file<S: AsRef<str>>(self, filename: S) -> Self {
        Self {
            stderr_file: Some(filename.as_ref().to_string()),
            ..self
        }
    }

    pub fn argv(&self) -> String {
        let mut argv = self.program.clone();
        for arg in &self.args {
            argv.push(' ');
            argv.push_str(arg);
        }
        argv
    }
}

/// Represents all information associated with one input line.
#[derive(Clone, Debug, PartialEq)]
pub struct Job {
    /// Command line, used for messages
    pub input: String,
    /// The processes to run, connected by pipes when there is more than one
    pub steps: Vec<ProcessStep>,
    /// The name of the input file, if one is specified
    pub stdin_file: Option<String>,
    /// The file to write stdout to, if one is specified
    pub stdout_file: Option<String>,
    /// Run the command in the background, defaults to false
    pub background: bool,
}

impl Job {
    /// Name of the first program, which decides whether the job is a builtin.
    pub fn program(&self) -> &str {
        &self.steps[0].program
    }

    pub fn is_pipeline(&self) -> bool {
        self.steps.len() > 1
    }

    pub fn has_redirects(&self) -> bool {
        self.stdin_file.is_some()
            || self.stdout_file.is_some()
            || self.steps.iter().any(|step| step.stderr_file.is_some())
    }
}

impl fmt::Display for Job {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.input)
    }
}

/// Builds Jobs.
#[derive(Debug)]
pub struct JobBuilder {
    input: String,
    steps: Vec<ProcessStep>,
    stdin_file: Option<String>,
    stdout_file: Option<String>,
    background: bool,
}

impl JobBuilder {
    /// Construct a new `JobBuilder` for `input`, with the following default
    /// configuration:
    ///
    /// * No input/output redirection
    /// * Runs in foreground
    /// * No steps
    ///
    /// Builder methods are provided to change these defaults and otherwise configure the job.
    pub fn new<S: AsRef<str>>(input: S) -> Self {
        Self {
            input: input.as_ref().to_string(),
            steps: Vec::new(),
            stdin_file: None,
            stdout_file: None,
            background: false,
        }
    }

    /// Add input redirection from the specified filename.
    pub fn stdin_file<S: AsRef<str>>(&mut self, filename: S) -> &mut Self {
        self.stdin_file = Some(filename.as_ref().to_string());
        self
    }

    /// Add output redirection to the specified filename.
    pub fn stdout_file<S: AsRef<str>>(&mut self, filename: S) -> &mut Self {
        self.stdout_file = Some(filename.as_ref().to_string());
        self
    }

    /// Configure job to run in the background.
    pub fn background(&mut self, background: bool) -> &mut Self {
        self.background = background;
        self
    }

    /// Append a step to the pipeline.
    pub fn step(&mut self, step: ProcessStep) -> &mut Self {
        self.steps.push(step);
        self
    }

    /// # Panics
    /// Panics if no step was added.
    pub fn build(self) -> Job {
        assert!(!self.steps.is_empty(), "a job needs at least one step");
        Job {
            input: self.input,
            steps: self.steps,
            stdin_file: self.stdin_file,
            stdout_file: self.stdout_file,
            background: self.background,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_step_job() {
        let mut builder = JobBuilder::new("sort < data.txt > out.txt");
        builder
            .step(ProcessStep::new("sort", &[] as &[&str]))
            .stdin_file("data.txt")
            .stdout_file("out.txt");
        let job = builder.build();

        assert_eq!(job.program(), "sort");
        assert!(!job.is_pipeline());
        assert!(job.has_redirects());
        assert!(!job.background);
        assert_eq!(job.to_string(), "sort < data.txt > out.txt");
    }

    #[test]
    fn test_pipeline_job() {
        let mut builder = JobBuilder::new("ls | wc -l &");
        builder
            .step(ProcessStep::new("ls", &[] as &[&str]))
            .step(ProcessStep::new("wc", &["-l"]))
            .background(true);
        let job = builder.build();

        assert_eq!(job.program(), "ls");
        assert!(job.is_pipeline());
        assert!(!job.has_redirects());
        assert_eq!(job.steps[1].argv(), "wc -l");
    }

    #[test]
    fn test_step_stderr_counts_as_redirect() {
        let mut builder = JobBuilder::new("cmd 2> err");
        builder.step(ProcessStep::new("cmd", &[] as &[&str]).with_stderr_file("err"));
        assert!(builder.build().has_redirects());
    }

    #[test]
    #[should_panic]
    fn test_job_without_steps() {
        JobBuilder::new("").build();
    }
}
