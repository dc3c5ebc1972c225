use std::io::{self, Write as _};

/// Trait for handling output from the `print` builtin.
///
/// Implement this to capture or redirect interpreter output. The default
/// implementation [`StdPrint`] writes to stdout; tests use
/// [`CollectStringPrint`] to assert on what a program printed.
pub trait PrintWriter {
    /// Called with the printed form of a value, without a trailing newline.
    fn write_str(&mut self, output: &str);

    /// Called for separators and terminators, most commonly the newline
    /// `print` emits after each value.
    fn write_char(&mut self, ch: char);
}

/// Default `PrintWriter` that writes straight to stdout.
///
/// Write errors on stdout are deliberately ignored; a broken pipe should not
/// turn into an interpreter error inside user code.
#[derive(Debug, Default)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn write_str(&mut self, output: &str) {
        let mut stdout = io::stdout().lock();
        let _ = stdout.write_all(output.as_bytes());
        let _ = stdout.flush();
    }

    fn write_char(&mut self, ch: char) {
        let mut buf = [0u8; 4];
        self.write_str(ch.encode_utf8(&mut buf));
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing print output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected output so far.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.0
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn write_str(&mut self, output: &str) {
        self.0.push_str(output);
    }

    fn write_char(&mut self, ch: char) {
        self.0.push(ch);
    }
}

/// `PrintWriter` that ignores all output.
///
/// Useful for suppressing print output during testing or benchmarking.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn write_str(&mut self, _output: &str) {}

    fn write_char(&mut self, _ch: char) {}
}
