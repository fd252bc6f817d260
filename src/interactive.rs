//! Question-and-answer front end, used when the grammar is not given on the
//! command line. Every answer is validated on the spot and the question is
//! repeated until it is acceptable.

use std::io::{self, BufRead, Write};

use log::{debug, warn};

use crate::grammar::{Grammar, parse_symbol_list};
use crate::utils::{GrammarError, Result, parse_max_length};

pub struct Session<R, W> {
    input: R,
    output: W,
    /// Bound fixed up front; the length question is skipped when set
    max_length: Option<usize>,
}

impl<R: BufRead, W: Write> Session<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Session {
            input,
            output,
            max_length: None,
        }
    }

    pub fn with_max_length(mut self, max_length: Option<usize>) -> Self {
        self.max_length = max_length;
        self
    }

    /// Read one trimmed line after printing `prompt`. A closed input is an
    /// error since no further answers can arrive.
    fn read_line(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(GrammarError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "input closed before the grammar was complete",
            )));
        }
        Ok(line.trim().to_string())
    }

    fn ask<T>(&mut self, prompt: &str, mut parse: impl FnMut(&str) -> Result<T>) -> Result<T> {
        loop {
            let answer = self.read_line(prompt)?;
            match parse(&answer) {
                Ok(value) => return Ok(value),
                Err(err) => {
                    debug!("rejected {:?}: {}", answer, err);
                    writeln!(self.output, "error: {}", err)?;
                }
            }
        }
    }

    /// Ask for VT, VN, S, the productions and, unless preset, the maximum
    /// length
    pub fn prompt_grammar(&mut self) -> Result<(Grammar, usize)> {
        let terminals = self.ask("Terminal symbols (VT): ", parse_symbol_list)?;

        let non_terminals = self.ask("Non-terminal symbols (VN): ", |text| {
            let non_terminals = parse_symbol_list(text)?;
            let shared: Vec<String> = non_terminals
                .iter()
                .filter(|s| terminals.contains(s))
                .map(|s| s.to_string())
                .collect();
            if !shared.is_empty() {
                return Err(GrammarError::OverlappingSymbols(shared.join(", ")));
            }
            Ok(non_terminals)
        })?;

        let mut grammar = self.ask("Start symbol (S): ", |text| {
            Grammar::new(terminals.iter().cloned(), non_terminals.iter().cloned(), text)
        })?;

        writeln!(
            self.output,
            "Productions, one per line (e.g. `X -> 1 | 1X`, `ε` for empty); blank line to finish:"
        )?;
        loop {
            let line = self.read_line("> ")?;
            if line.is_empty() {
                break;
            }
            if let Err(err) = grammar.add_production_str(&line) {
                writeln!(self.output, "error: {}", err)?;
            }
        }

        for non_terminal in grammar.non_terminals() {
            if grammar.productions_for(non_terminal).is_empty() {
                warn!("non-terminal {} has no productions", non_terminal);
            }
        }

        let max_length = match self.max_length {
            Some(max_length) => max_length,
            None => self.ask("Maximum length: ", parse_max_length)?,
        };
        Ok((grammar, max_length))
    }
}
