use std::io;

#[cfg(test)]
use mockall::automock;

/// Source of interactive answers, e.g. a terminal.
#[cfg_attr(test, automock)]
pub trait InputProvider {
    /// Shows `message` and waits for a single line. [None] means there is nothing left to read.
    fn prompt(&mut self, message: &str) -> io::Result<Option<String>>;
}
