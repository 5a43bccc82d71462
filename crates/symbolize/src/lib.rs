#![forbid(unsafe_code)]
//! Front end for symbolizing serial debug logs.
//!
//! Two layers share one [`Cursor`] abstraction:
//! - The streaming pipeline ([`start_parsing`], or [`LogLineReader`] for
//!   synchronous input) splits a raw byte stream into lines, recognizes the
//!   `[time] pid.tid>` envelope and emits [`AttributedLine`] values in input
//!   order. Lines it cannot attribute are passed through as dummy lines, never
//!   dropped.
//! - The markup parser ([`parse_line`]) turns a message containing
//!   `{{{module:...}}}`, `{{{mmap:...}}}`, `{{{pc:...}}}`, `{{{bt:...}}}`,
//!   `{{{reset}}}` fences and ANSI color escapes into an [`Element`] tree. A
//!   line is only accepted when every byte is consumed.
//!
//! Symbol resolution and rendering are left to the consumer of these types.

mod config;
mod cursor;
mod element;
mod envelope;
mod error;
mod line;
mod parser;
mod pipeline;
mod reader;

pub use config::PipelineConfig;
pub use cursor::{Cursor, Rule};
pub use element::{
    BacktraceFrame, ColorGroup, Element, Mapping, MappingLoad, Module, PresentationGroup,
    ProgramCounter,
};
pub use envelope::{attribute_line, parse_envelope};
pub use error::{EnvelopeError, ScanError};
pub use line::{AttributedLine, LineAttribution, LineHeader, LineSource};
pub use parser::{
    parse_backtrace, parse_color, parse_line, parse_line_or_text, parse_mapping, parse_module,
    parse_pc, parse_presentation_group, parse_reset, parse_text,
};
pub use pipeline::{start_parsing, start_parsing_with_config, AttributedLineStream};
pub use reader::{log_line_file, LogLineReader};
pub use tokio_util::sync::CancellationToken;
