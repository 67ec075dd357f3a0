//! Human-facing output.
//!
//! Progress and results go to stdout, diagnostics to stderr. Both streams are
//! injectable so runs can be captured in tests. Structured logs are separate
//! and go through `tracing`.

use std::fmt::Display;
use std::io::{self, Write};

pub struct Console {
    out: Box<dyn Write>,
    err: Box<dyn Write>,
}

impl Console {
    /// Console bound to the process's stdout and stderr.
    pub fn stdio() -> Self {
        Self::new(io::stdout(), io::stderr())
    }

    pub fn new(out: impl Write + 'static, err: impl Write + 'static) -> Self {
        Self {
            out: Box::new(out),
            err: Box::new(err),
        }
    }

    /// Print a line to stdout.
    pub fn say(&mut self, line: impl Display) {
        if let Err(e) = writeln!(self.out, "{line}") {
            tracing::debug!(error = %e, "stdout write failed");
        }
    }

    /// Print a diagnostic line to stderr.
    pub fn warn(&mut self, line: impl Display) {
        if let Err(e) = writeln!(self.err, "{line}") {
            tracing::debug!(error = %e, "stderr write failed");
        }
    }
}

/// In-memory sink for capturing console output in tests.
#[cfg(test)]
#[derive(Clone, Default)]
pub struct Captured(std::rc::Rc<std::cell::RefCell<Vec<u8>>>);

#[cfg(test)]
impl Captured {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.0.borrow()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.text().lines().map(str::to_string).collect()
    }
}

#[cfg(test)]
impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Console writing into fresh capture buffers: `(console, stdout, stderr)`.
#[cfg(test)]
pub fn captured() -> (Console, Captured, Captured) {
    let out = Captured::default();
    let err = Captured::default();
    (Console::new(out.clone(), err.clone()), out, err)
}
