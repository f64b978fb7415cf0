//! Jobsh Parser
//!
//! Turns one input line into a [`Job`]: words separated by whitespace, `|`
//! between pipeline steps, `<`/`>` for the job's input and output files, `2>`
//! for a step's error file, and a trailing `&` to run in the background.

use std::iter::Peekable;
use std::str::Chars;

use log::debug;

use crate::core::job::{Job, JobBuilder, ProcessStep};
use crate::errors::{ErrorKind, Result};

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Pipe,
    Input,
    Output,
    ErrorOutput,
    Background,
}

/// Parses `input` into a job.
///
/// Returns `None` for blank lines.
///
/// # Examples
///
/// ```
/// use jobsh::core::parser::parse_job;
///
/// let job = parse_job("echo test").unwrap().unwrap();
/// assert_eq!(job.input, "echo test");
/// assert!(job.stdin_file.is_none());
/// assert!(job.stdout_file.is_none());
/// assert!(!job.background);
/// assert_eq!(job.steps[0].argv(), "echo test");
/// ```
pub fn parse_job(input: &str) -> Result<Option<Job>> {
    let input = input.trim();
    let tokens = tokenize(input);
    if tokens.is_empty() {
        return Ok(None);
    }

    let syntax_error = || ErrorKind::Syntax(input.to_string());
    let mut job = JobBuilder::new(input);
    let mut words: Vec<String> = Vec::new();
    let mut stderr_file: Option<String> = None;

    let mut tokens = tokens.into_iter().peekable();
    while let Some(token) = tokens.next() {
        match token {
            Token::Word(word) => words.push(word),
            Token::Pipe => {
                job.step(finish_step(&mut words, &mut stderr_file).ok_or_else(syntax_error)?);
            }
            Token::Input => {
                job.stdin_file(next_word(&mut tokens).ok_or_else(syntax_error)?);
            }
            Token::Output => {
                job.stdout_file(next_word(&mut tokens).ok_or_else(syntax_error)?);
            }
            Token::ErrorOutput => {
                stderr_file = Some(next_word(&mut tokens).ok_or_else(syntax_error)?);
            }
            Token::Background => {
                if tokens.peek().is_some() {
                    return Err(syntax_error().into());
                }
                job.background(true);
            }
        }
    }

    job.step(finish_step(&mut words, &mut stderr_file).ok_or_else(syntax_error)?);
    let job = job.build();
    debug!("parsed Job: {:?}", job);
    Ok(Some(job))
}

fn finish_step(words: &mut Vec<String>, stderr_file: &mut Option<String>) -> Option<ProcessStep> {
    if words.is_empty() {
        return None;
    }

    let (program, args) = words.split_first()?;
    let mut step = ProcessStep::new(program, args);
    step.stderr_file = stderr_file.take();
    words.clear();
    Some(step)
}

fn next_word<I: Iterator<Item = Token>>(tokens: &mut Peekable<I>) -> Option<String> {
    match tokens.next() {
        Some(Token::Word(word)) => Some(word),
        _ => None,
    }
}

fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut chars: Peekable<Chars<'_>> = input.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '|' | '&' | '<' => {
                flush_word(&mut word, &mut tokens);
                tokens.push(match c {
                    '|' => Token::Pipe,
                    '&' => Token::Background,
                    _ => Token::Input,
                });
            }
            '>' => {
                // `2>` only when the 2 starts the word, as in `cmd 2>err`
                if word == "2" {
                    word.clear();
                    tokens.push(Token::ErrorOutput);
                } else {
                    flush_word(&mut word, &mut tokens);
                    tokens.push(Token::Output);
                }
            }
            c if c.is_whitespace() => flush_word(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush_word(&mut word, &mut tokens);

    tokens
}

fn flush_word(word: &mut String, tokens: &mut Vec<Token>) {
    if !word.is_empty() {
        tokens.push(Token::Word(word.split_off(0)));
    }
}
