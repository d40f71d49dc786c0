//! Output targets and the buffered, optionally colored line writer
//!
//! A logger formats a whole line into [`LogWriter`]'s buffer and then
//! flushes it to its [`Output`] in one write, wrapping the line in ANSI
//! color codes when coloring is on. A [`LeveledWriter`] output routes each
//! line by level.

use super::log_level::LogLevel;
use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;

/// When to wrap lines in ANSI color codes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorOption {
    /// Never color (default)
    #[default]
    Off,

    /// Color when writing to the process console and the environment allows it
    Auto,

    /// Always color
    Force,
}

/// Something that can be flushed through a shared reference.
///
/// Passed to [`Logger::reset_output_with_flush`](crate::Logger::reset_output_with_flush)
/// so buffered data reaches its destination before the output is swapped.
pub trait Flushable {
    fn flush(&self) -> io::Result<()>;
}

/// A writer that can be cloned and handed to a logger while the caller
/// keeps access to it.
///
/// # Example
///
/// ```
/// use rust_structured_logger::core::SharedBuffer;
/// use rust_structured_logger::Logger;
///
/// let buffer = SharedBuffer::default();
/// let logger = Logger::builder().output(buffer.clone()).disable_time(true).build();
///
/// logger.info("ready", &[]);
/// assert_eq!(buffer.contents(), "[INFO]  ready\n");
/// ```
#[derive(Debug, Default)]
pub struct SharedWriter<W>(Arc<Mutex<W>>);

/// In-memory output, mostly useful for capturing lines in tests.
pub type SharedBuffer = SharedWriter<Vec<u8>>;

impl<W> SharedWriter<W> {
    pub fn new(inner: W) -> Self {
        Self(Arc::new(Mutex::new(inner)))
    }

    pub fn lock(&self) -> MutexGuard<'_, W> {
        self.0.lock()
    }
}

impl<W> Clone for SharedWriter<W> {
    fn clone(&self) -> Self {
        Self(Arc::clone(&self.0))
    }
}

impl SharedWriter<Vec<u8>> {
    /// Everything written so far, lossily decoded as UTF-8
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    pub fn clear(&self) {
        self.0.lock().clear();
    }
}

impl<W: Write> Write for SharedWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Write::flush(&mut *self.0.lock())
    }
}

impl<W: Write> Flushable for SharedWriter<W> {
    fn flush(&self) -> io::Result<()> {
        Write::flush(&mut *self.0.lock())
    }
}

/// Routes lines to a per-level writer, falling back to a standard one.
///
/// ```
/// use rust_structured_logger::core::{LeveledWriter, SharedBuffer};
/// use rust_structured_logger::LogLevel;
///
/// let errors = SharedBuffer::default();
/// let writer = LeveledWriter::new(std::io::sink())
///     .with_override(LogLevel::Error, errors.clone());
/// ```
pub struct LeveledWriter {
    standard: Box<dyn Write + Send>,
    overrides: HashMap<LogLevel, Box<dyn Write + Send>>,
}

impl LeveledWriter {
    pub fn new<W: Write + Send + 'static>(standard: W) -> Self {
        Self {
            standard: Box::new(standard),
            overrides: HashMap::new(),
        }
    }

    /// Send lines at `level` to `writer` instead of the standard writer
    #[must_use = "builder methods return a new value"]
    pub fn with_override<W: Write + Send + 'static>(mut self, level: LogLevel, writer: W) -> Self {
        self.overrides.insert(level, Box::new(writer));
        self
    }

    /// Write `buf` to the writer registered for `level`
    pub fn write_level(&mut self, level: LogLevel, buf: &[u8]) -> io::Result<()> {
        match self.overrides.get_mut(&level) {
            Some(writer) => writer.write_all(buf),
            None => self.standard.write_all(buf),
        }
    }
}

impl Write for LeveledWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.standard.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.standard.flush()?;
        for writer in self.overrides.values_mut() {
            writer.flush()?;
        }
        Ok(())
    }
}

impl fmt::Debug for LeveledWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut levels: Vec<_> = self.overrides.keys().collect();
        levels.sort();
        f.debug_struct("LeveledWriter")
            .field("overrides", &levels)
            .finish_non_exhaustive()
    }
}

enum Target {
    Plain(Box<dyn Write + Send>),
    Leveled(LeveledWriter),
}

/// Destination stream of a logger
pub struct Output {
    target: Target,
    console: bool,
}

impl Output {
    pub fn new<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            target: Target::Plain(Box::new(writer)),
            console: false,
        }
    }

    pub fn stdout() -> Self {
        Self {
            target: Target::Plain(Box::new(io::stdout())),
            console: true,
        }
    }

    pub fn stderr() -> Self {
        Self {
            target: Target::Plain(Box::new(io::stderr())),
            console: true,
        }
    }

    /// Discards everything
    pub fn sink() -> Self {
        Self::new(io::sink())
    }

    pub fn leveled(writer: LeveledWriter) -> Self {
        Self {
            target: Target::Leveled(writer),
            console: false,
        }
    }

    /// Whether this is one of the process's standard streams
    pub fn is_console(&self) -> bool {
        self.console
    }

    fn write_level(&mut self, level: LogLevel, buf: &[u8]) -> io::Result<()> {
        match &mut self.target {
            Target::Plain(writer) => writer.write_all(buf),
            Target::Leveled(writer) => writer.write_level(level, buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match &mut self.target {
            Target::Plain(writer) => writer.flush(),
            Target::Leveled(writer) => writer.flush(),
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::stderr()
    }
}

impl From<LeveledWriter> for Output {
    fn from(writer: LeveledWriter) -> Self {
        Self::leveled(writer)
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.target {
            Target::Plain(_) => "plain",
            Target::Leveled(_) => "leveled",
        };
        f.debug_struct("Output")
            .field("kind", &kind)
            .field("console", &self.console)
            .finish()
    }
}

/// New output settings for an existing logger
#[derive(Debug, Default)]
pub struct OutputOptions {
    pub output: Option<Output>,
    pub color: ColorOption,
}

impl OutputOptions {
    pub fn new(output: Output) -> Self {
        Self {
            output: Some(output),
            color: ColorOption::Off,
        }
    }

    #[must_use = "builder methods return a new value"]
    pub fn color(mut self, color: ColorOption) -> Self {
        self.color = color;
        self
    }
}

/// Line buffer in front of an [`Output`]
#[derive(Debug)]
pub struct LogWriter {
    buf: Vec<u8>,
    output: Output,
    color: bool,
}

impl LogWriter {
    pub fn new(output: Output, color: ColorOption) -> Self {
        let color = resolve_color(color, &output);
        Self {
            buf: Vec::with_capacity(256),
            output,
            color,
        }
    }

    pub fn is_colored(&self) -> bool {
        self.color
    }

    /// Append formatted bytes to the pending line
    pub fn write(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Hand the pending line to the output and clear the buffer
    pub fn flush(&mut self, level: LogLevel) -> io::Result<()> {
        if self.buf.is_empty() {
            return Ok(());
        }

        let result = match level.color_code().filter(|_| self.color) {
            Some(color) => {
                let mut line = Vec::with_capacity(self.buf.len() + 12);
                line.extend_from_slice(format!("\x1b[{}m", color.to_fg_str()).as_bytes());
                line.extend_from_slice(&self.buf);
                line.extend_from_slice(b"\x1b[0m");
                self.output.write_level(level, &line)
            }
            None => self.output.write_level(level, &self.buf),
        }
        .and_then(|()| self.output.flush());

        self.buf.clear();
        result
    }

    /// Swap in a new output, returning the previous one
    pub fn replace_output(&mut self, output: Output, color: ColorOption) -> Output {
        self.color = resolve_color(color, &output);
        self.buf.clear();
        std::mem::replace(&mut self.output, output)
    }
}

fn resolve_color(option: ColorOption, output: &Output) -> bool {
    match option {
        ColorOption::Off => false,
        ColorOption::Force => true,
        ColorOption::Auto => {
            output.is_console() && colored::control::SHOULD_COLORIZE.should_colorize()
        }
    }
}
