//! `tracing` output for the browser console. Each event becomes one console
//! call on the channel matching its level, so devtools filtering works.

use std::io;

use tracing::{Level, Metadata};
use tracing_subscriber::fmt::MakeWriter;
use wasm_bindgen::JsValue;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Channel {
    Error,
    Warn,
    Log,
    Debug,
}

impl Channel {
    fn for_level(level: &Level) -> Self {
        match *level {
            Level::ERROR => Channel::Error,
            Level::WARN => Channel::Warn,
            Level::INFO => Channel::Log,
            _ => Channel::Debug,
        }
    }
}

/// Buffers one formatted event and hands it to the console when dropped.
pub struct ConsoleWriter {
    channel: Channel,
    buf: Vec<u8>,
}

impl ConsoleWriter {
    fn new(channel: Channel) -> Self {
        Self { channel, buf: Vec::new() }
    }
}

impl io::Write for ConsoleWriter {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(bytes);
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Drop for ConsoleWriter {
    fn drop(&mut self) {
        let line = event_line(&self.buf);
        if line.is_empty() {
            return;
        }
        let msg = JsValue::from_str(&line);
        match self.channel {
            Channel::Error => web_sys::console::error_1(&msg),
            Channel::Warn => web_sys::console::warn_1(&msg),
            Channel::Log => web_sys::console::log_1(&msg),
            Channel::Debug => web_sys::console::debug_1(&msg),
        }
    }
}

fn event_line(buf: &[u8]) -> String {
    String::from_utf8_lossy(buf).trim_end().to_string()
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ConsoleMakeWriter;

impl<'a> MakeWriter<'a> for ConsoleMakeWriter {
    type Writer = ConsoleWriter;

    fn make_writer(&'a self) -> ConsoleWriter {
        ConsoleWriter::new(Channel::Log)
    }

    fn make_writer_for(&'a self, meta: &Metadata<'_>) -> ConsoleWriter {
        ConsoleWriter::new(Channel::for_level(meta.level()))
    }
}

/// Install the console subscriber as the global default. A second call keeps
/// the first subscriber.
pub fn init_console_logging(max_level: Level) {
    let subscriber = tracing_subscriber::fmt()
        .with_writer(ConsoleMakeWriter)
        .with_target(false)
        .without_time()
        .with_max_level(max_level)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("console logging already installed");
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn levels_map_to_console_channels() {
        assert_eq!(Channel::for_level(&Level::ERROR), Channel::Error);
        assert_eq!(Channel::for_level(&Level::WARN), Channel::Warn);
        assert_eq!(Channel::for_level(&Level::INFO), Channel::Log);
        assert_eq!(Channel::for_level(&Level::DEBUG), Channel::Debug);
        assert_eq!(Channel::for_level(&Level::TRACE), Channel::Debug);
    }

    #[test]
    fn event_line_drops_trailing_newline() {
        assert_eq!(event_line(b" WARN host side effect failed what=\"track\"\n"), " WARN host side effect failed what=\"track\"");
        assert_eq!(event_line(b"\n"), "");
    }

    #[test]
    fn writer_buffers_partial_writes() {
        let mut writer = ConsoleWriter::new(Channel::Warn);
        writer.write_all(b"boss ").unwrap();
        writer.write_all(b"arrived\n").unwrap();
        writer.flush().unwrap();
        assert_eq!(event_line(&writer.buf), "boss arrived");
        // nothing left to emit on drop outside a browser
        writer.buf.clear();
    }
}
