use std::{
    borrow::Cow,
    fs::File,
    io::{self, BufRead, BufReader},
    path::Path,
};

use tracing::{debug, warn};

use crate::{config::PipelineConfig, envelope::attribute_line, line::AttributedLine};

/// Synchronous counterpart of [`crate::start_parsing`] for logs that are
/// already on disk.
///
/// Yields the same items in the same order as the streaming pipeline. Read
/// errors end iteration.
pub struct LogLineReader<R: BufRead> {
    reader: R,
    config: PipelineConfig,
    buffer: Vec<u8>,
    pending: Option<AttributedLine>,
    line_number: usize,
    done: bool,
}

impl<R: BufRead> LogLineReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, PipelineConfig::default())
    }

    pub fn with_config(reader: R, config: PipelineConfig) -> Self {
        Self {
            reader,
            config,
            buffer: Vec::new(),
            pending: None,
            line_number: 0,
            done: false,
        }
    }

    /// Number of input lines read so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: BufRead> Iterator for LogLineReader<R> {
    type Item = AttributedLine;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(line) = self.pending.take() {
            return Some(line);
        }
        if self.done {
            return None;
        }

        self.buffer.clear();
        match self.reader.read_until(b'\n', &mut self.buffer) {
            Ok(0) => {
                self.done = true;
                return None;
            }
            Ok(_) => {}
            Err(err) => {
                let line_number = self.line_number + 1;
                warn!(error = %err, line_number, "failed to read serial log");
                self.done = true;
                return None;
            }
        }
        self.line_number += 1;

        let text = decode_line(
            &self.buffer,
            self.config.strip_carriage_return,
            self.line_number,
        );
        let attribution = attribute_line(&text);
        match attribution.preamble {
            Some(preamble) => {
                self.pending = Some(attribution.line);
                Some(preamble)
            }
            None => Some(attribution.line),
        }
    }
}

/// Opens `path` and reads it line by line.
pub fn log_line_file(path: impl AsRef<Path>) -> io::Result<LogLineReader<BufReader<File>>> {
    let file = File::open(path.as_ref())?;
    Ok(LogLineReader::new(BufReader::new(file)))
}

/// Strips the line terminator and decodes the bytes, replacing invalid UTF-8.
pub(crate) fn decode_line(
    bytes: &[u8],
    strip_carriage_return: bool,
    line_number: usize,
) -> Cow<'_, str> {
    let mut bytes = bytes.strip_suffix(b"\n").unwrap_or(bytes);
    if strip_carriage_return {
        bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    }
    let text = String::from_utf8_lossy(bytes);
    if let Cow::Owned(_) = text {
        debug!(line_number, "replaced invalid UTF-8 in serial log line");
    }
    text
}
