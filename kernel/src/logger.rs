//! Kernel logger
//!
//! `log` facade backend that formats records without allocating and hands the
//! bytes to a console sink registered once at boot (serial port, VGA, ...).

use log::{Level, LevelFilter, Metadata, Record};
use spin::Once;

/// Maximum formatted length of one log line, prefix included.
pub const LINE_CAPACITY: usize = 256;

/// Byte sink the logger writes finished lines into.
pub type ConsoleSink = fn(&[u8]);

static SINK: Once<ConsoleSink> = Once::new();

/// Logger that writes `[LEVEL] message` lines to the console sink
struct KernelLogger;

impl log::Log for KernelLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(sink) = SINK.get() else {
            return;
        };

        let mut buf = [0u8; LINE_CAPACITY];
        let len = format_line(&mut buf, record.level(), record.args());
        sink(&buf[..len]);
    }

    fn flush(&self) {}
}

/// Fixed-buffer writer for formatting without alloc.
///
/// Output that does not fit is silently truncated.
pub struct BufferWriter<'a> {
    pub buffer: &'a mut [u8],
    pub pos: usize,
}

impl<'a> BufferWriter<'a> {
    pub fn new(buffer: &'a mut [u8]) -> Self {
        Self { buffer, pos: 0 }
    }

    /// Bytes written so far
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer[..self.pos]
    }
}

impl<'a> core::fmt::Write for BufferWriter<'a> {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let bytes = s.as_bytes();
        let remaining = self.buffer.len() - self.pos;
        let to_write = bytes.len().min(remaining);

        if to_write > 0 {
            self.buffer[self.pos..self.pos + to_write].copy_from_slice(&bytes[..to_write]);
            self.pos += to_write;
        }

        Ok(())
    }
}

fn level_tag(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARN ",
        Level::Info => "INFO ",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

/// Format one record into `buf`, returning the line length.
///
/// The line always ends with `\n`, even when the message was truncated.
pub fn format_line(buf: &mut [u8], level: Level, args: &core::fmt::Arguments<'_>) -> usize {
    use core::fmt::Write;

    if buf.is_empty() {
        return 0;
    }
    let last = buf.len() - 1;
    let mut writer = BufferWriter::new(&mut buf[..last]);
    let _ = write!(writer, "[{}] {}", level_tag(level), args);
    let pos = writer.pos;
    buf[pos] = b'\n';
    pos + 1
}

static LOGGER: KernelLogger = KernelLogger;

/// Install the kernel logger with the given console sink.
///
/// The sink is fixed by the first call; later calls only adjust the level.
pub fn init(sink: ConsoleSink, level: LevelFilter) {
    SINK.call_once(|| sink);
    if log::set_logger(&LOGGER).is_ok() {
        log::info!("logger initialized (max level {})", level);
    }
    log::set_max_level(level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_line_prefix() {
        let mut buf = [0u8; 64];
        let len = format_line(&mut buf, Level::Warn, &format_args!("queue {} full", 2));
        assert_eq!(&buf[..len], b"[WARN ] queue 2 full\n");
    }

    #[test]
    fn test_format_line_truncates() {
        let mut buf = [0u8; 12];
        let len = format_line(&mut buf, Level::Info, &format_args!("a very long message"));
        assert_eq!(len, 12);
        assert_eq!(&buf[..len], b"[INFO ] a v\n");
    }

    #[test]
    fn test_buffer_writer_stops_at_capacity() {
        use core::fmt::Write;

        let mut raw = [0u8; 4];
        let mut writer = BufferWriter::new(&mut raw);
        write!(writer, "abcdef").unwrap();
        assert_eq!(writer.as_bytes(), b"abcd");
    }
}
