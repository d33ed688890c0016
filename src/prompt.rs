use std::io::{self, BufRead, Write};

use crate::error::{Error, Result};

/// Line-based operator input. Menus and questions are written to `output`,
/// answers read from `input`.
pub struct Prompter<R, W> {
    input: R,
    output: W,
}

impl Prompter<io::StdinLock<'static>, io::Stdout> {
    pub fn stdio() -> Self {
        Self::new(io::stdin().lock(), io::stdout())
    }
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn ask(&mut self, query: &str) -> Result<String> {
        write!(self.output, "{}", query).map_err(write_failed)?;
        self.output.flush().map_err(write_failed)?;

        let mut line = String::new();
        let read = self
            .input
            .read_line(&mut line)
            .map_err(|e| Error::input(format!("Failed to read answer: {}", e)))?;
        if read == 0 {
            return Err(Error::input("input ended before an answer was given"));
        }

        Ok(line.trim().to_string())
    }

    /// Prints a 1-indexed menu and returns the chosen items, asking again
    /// until the answer is a valid selection.
    pub fn choose<'a>(
        &mut self,
        heading: &str,
        items: &'a [String],
        query: &str,
    ) -> Result<Vec<&'a String>> {
        writeln!(self.output, "{}", heading).map_err(write_failed)?;
        for (i, item) in items.iter().enumerate() {
            writeln!(self.output, "{}. {}", i + 1, item).map_err(write_failed)?;
        }

        loop {
            let answer = self.ask(query)?;
            match parse_selection(&answer, items.len()) {
                Ok(indices) => return Ok(indices.into_iter().map(|i| &items[i]).collect()),
                Err(e) => {
                    writeln!(self.output, "{}", e).map_err(write_failed)?;
                }
            }
        }
    }

    #[cfg(test)]
    pub fn into_output(self) -> W {
        self.output
    }
}

fn write_failed(e: io::Error) -> Error {
    Error::input(format!("Failed to write prompt: {}", e))
}

/// Parses a comma-separated list of 1-based menu numbers into 0-based
/// indices. Blank entries are skipped and repeats collapse to their first
/// occurrence.
pub fn parse_selection(answer: &str, len: usize) -> Result<Vec<usize>> {
    let mut indices = Vec::new();

    for entry in answer.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        if len == 0 {
            return Err(Error::input("nothing to choose, press Enter"));
        }

        let number: usize = entry
            .parse()
            .map_err(|_| Error::input(format!("'{}' is not a number", entry)))?;

        if number == 0 || number > len {
            return Err(Error::input(format!(
                "{} is out of range, choose between 1 and {}",
                number, len
            )));
        }

        let index = number - 1;
        if !indices.contains(&index) {
            indices.push(index);
        }
    }

    Ok(indices)
}
