use std::fmt;

use rustyline::{error::ReadlineError, Config, DefaultEditor};

use crate::errors::Result;

/// Line editor with a bounded, in-memory command history.
pub struct Editor {
    internal: DefaultEditor,
    history_capacity: usize,
}

impl Editor {
    pub fn with_capacity(history_capacity: usize) -> Result<Editor> {
        let config = Config::builder()
            .max_history_size(history_capacity)?
            .history_ignore_space(true)
            .auto_add_history(false)
            .build();

        Ok(Editor {
            internal: DefaultEditor::with_config(config)?,
            history_capacity,
        })
    }

    /// Reads one line. Returns `None` when end of file is reached.
    pub fn readline(&mut self, prompt: &str) -> Result<Option<String>> {
        match self.internal.readline(prompt) {
            Ok(line) => Ok(Some(line)),
            Err(ReadlineError::Eof) => Ok(None),
            // ^C abandons the current line
            Err(ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(e) => Err(e.into()),
        }
    }

    pub fn add_history_entry(&mut self, line: &str) {
        if self.history_capacity == 0 {
            return;
        }
        log_if_err!(self.internal.add_history_entry(line), "add_history_entry");
    }
}

impl fmt::Debug for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Editor {{ history_capacity: {} }}", self.history_capacity)
    }
}
