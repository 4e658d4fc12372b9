use std::io::{self, BufRead, Write};

use crate::timers::input::InputProvider;

/// Asks questions in the terminal.
pub struct StdinInput;

impl InputProvider for StdinInput {
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>> {
        let mut stdout = io::stdout().lock();
        write!(stdout, "{message}")?;
        stdout.flush()?;

        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line)? {
            0 => Ok(None),
            _ => Ok(Some(line)),
        }
    }
}
