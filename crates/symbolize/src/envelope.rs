use crate::{
    cursor::Cursor,
    error::EnvelopeError,
    line::{AttributedLine, LineAttribution, LineHeader},
};

/// Recognizes a `[<seconds>] <pid>.<tid>> ` prefix.
///
/// On success returns the header and a cursor positioned at the message. The
/// input cursor is taken by value, so a failure never leaves anything
/// half-consumed for the caller.
pub fn parse_envelope(cursor: Cursor<'_>) -> Result<(LineHeader, Cursor<'_>), EnvelopeError> {
    let mut c = cursor;
    if !c.expect("[") {
        return Err(EnvelopeError::MissingOpenBracket);
    }
    let timestamp = c.float_before("]").map_err(EnvelopeError::field("timestamp"))?;
    c.whitespace();
    let process_id = c.dec_before(".").map_err(EnvelopeError::field("process id"))?;
    let thread_id = c.dec_before(">").map_err(EnvelopeError::field("thread id"))?;
    c.whitespace();

    Ok((
        LineHeader {
            process_id,
            thread_id,
            timestamp,
        },
        c,
    ))
}

/// Splits one raw line into its attributed parts.
///
/// Text in front of the first `[` becomes a dummy preamble. The rest is either
/// attributed to the process named by its envelope or, when the envelope is
/// malformed, emitted whole as a dummy line.
pub fn attribute_line(text: &str) -> LineAttribution {
    let mut cursor = Cursor::new(text);
    let preamble = match cursor.only_before("[") {
        Ok(noise) if !noise.is_empty() => Some(AttributedLine::dummy(noise)),
        _ => None,
    };

    let line = match parse_envelope(cursor) {
        Ok((header, message)) => AttributedLine::from_process(header, message.remaining()),
        Err(err) => {
            tracing::trace!(error = %err, "unattributed serial line");
            AttributedLine::dummy(cursor.remaining())
        }
    };

    LineAttribution { preamble, line }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScanError;
    use crate::line::LineSource;

    #[test]
    fn parses_envelope_fields() {
        let (header, rest) = parse_envelope(Cursor::new("[1.234] 42.7> hello world")).unwrap();
        assert_eq!(
            header,
            LineHeader {
                process_id: 42,
                thread_id: 7,
                timestamp: 1.234,
            }
        );
        assert_eq!(rest.remaining(), "hello world");
    }

    #[test]
    fn rescanning_the_same_cursor_is_stable() {
        let cursor = Cursor::new("[00012.500] 1000.1001> ok");
        let first = parse_envelope(cursor);
        let second = parse_envelope(cursor);
        assert_eq!(first, second);
        assert_eq!(cursor.remaining(), "[00012.500] 1000.1001> ok");
    }

    #[test]
    fn reports_which_field_failed() {
        assert_eq!(
            parse_envelope(Cursor::new("hello")),
            Err(EnvelopeError::MissingOpenBracket)
        );
        assert!(matches!(
            parse_envelope(Cursor::new("[abc] 1.2> x")),
            Err(EnvelopeError::Field {
                field: "timestamp",
                source: ScanError::InvalidFloat { .. }
            })
        ));
        assert!(matches!(
            parse_envelope(Cursor::new("[1.0] 0x1.2> x")),
            Err(EnvelopeError::Field {
                field: "process id",
                ..
            })
        ));
        assert!(matches!(
            parse_envelope(Cursor::new("[1.0] 1.2 x")),
            Err(EnvelopeError::Field {
                field: "thread id",
                source: ScanError::MissingDelimiter { .. }
            })
        ));
    }

    #[test]
    fn attributes_enveloped_line() {
        let out = attribute_line("[1.234] 42.7> hello world");
        assert_eq!(out.preamble, None);
        assert_eq!(out.line.source, LineSource::Process(42));
        assert_eq!(out.line.message, "hello world");
    }

    #[test]
    fn leading_noise_becomes_dummy_preamble() {
        let items: Vec<_> = attribute_line("noise[1.0] 1.1> ok").into_iter().collect();
        assert_eq!(
            items,
            vec![
                AttributedLine::dummy("noise"),
                AttributedLine::from_process(
                    LineHeader {
                        process_id: 1,
                        thread_id: 1,
                        timestamp: 1.0,
                    },
                    "ok"
                ),
            ]
        );
    }

    #[test]
    fn malformed_envelope_keeps_every_byte() {
        let out = attribute_line("not a log line at all");
        assert_eq!(out.preamble, None);
        assert_eq!(out.line, AttributedLine::dummy("not a log line at all"));

        let out = attribute_line("boot: [bad] 1.2> x");
        assert_eq!(out.preamble, Some(AttributedLine::dummy("boot: ")));
        assert_eq!(out.line, AttributedLine::dummy("[bad] 1.2> x"));
    }

    #[test]
    fn empty_line_is_an_empty_dummy() {
        let out = attribute_line("");
        assert_eq!(out.preamble, None);
        assert_eq!(out.line, AttributedLine::dummy(""));
    }
}
