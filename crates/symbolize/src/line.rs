use serde::Serialize;

/// Fields recovered from a `[time] pid.tid>` envelope.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct LineHeader {
    pub process_id: u64,
    pub thread_id: u64,
    /// Seconds since boot, as printed by the kernel.
    pub timestamp: f64,
}

/// Who a line is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "pid", rename_all = "snake_case")]
pub enum LineSource {
    Process(u64),
    /// Preamble noise or a line whose envelope did not parse.
    Dummy,
}

/// One unit emitted by the streaming pipeline.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct AttributedLine {
    pub source: LineSource,
    pub header: Option<LineHeader>,
    pub message: String,
}

impl AttributedLine {
    pub fn dummy(message: impl Into<String>) -> Self {
        Self {
            source: LineSource::Dummy,
            header: None,
            message: message.into(),
        }
    }

    pub fn from_process(header: LineHeader, message: impl Into<String>) -> Self {
        Self {
            source: LineSource::Process(header.process_id),
            header: Some(header),
            message: message.into(),
        }
    }

    pub fn is_dummy(&self) -> bool {
        matches!(self.source, LineSource::Dummy)
    }
}

/// Everything one input line produced, in emission order.
#[derive(Clone, Debug, PartialEq)]
pub struct LineAttribution {
    /// Text in front of the first `[`, if any.
    pub preamble: Option<AttributedLine>,
    pub line: AttributedLine,
}

impl IntoIterator for LineAttribution {
    type Item = AttributedLine;
    type IntoIter =
        std::iter::Chain<std::option::IntoIter<AttributedLine>, std::iter::Once<AttributedLine>>;

    fn into_iter(self) -> Self::IntoIter {
        self.preamble.into_iter().chain(std::iter::once(self.line))
    }
}
