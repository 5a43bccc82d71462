use std::io::Write;

use futures_util::StreamExt;
use symbolize::{
    log_line_file, parse_line_or_text, start_parsing, start_parsing_with_config, AttributedLine,
    CancellationToken, Element, LineSource, PipelineConfig, ProgramCounter,
};
use tokio::io::AsyncWriteExt;

const SERIAL_LOG: &str = "\
boot banner
[00000.010] 1000.1001> starting
uart: [00001.500] 2042.2043> {{{pc:0x401000}}} crashed
[00002.000] bad.envelope> oops
[3.25] 7.8>    padded
";

#[tokio::test]
async fn every_non_envelope_byte_reaches_the_consumer() {
    let stream = start_parsing(SERIAL_LOG.as_bytes(), CancellationToken::new());
    let lines: Vec<AttributedLine> = stream.collect().await;

    let summary: Vec<_> = lines
        .iter()
        .map(|line| (line.source, line.message.as_str()))
        .collect();
    assert_eq!(
        summary,
        vec![
            (LineSource::Dummy, "boot banner"),
            (LineSource::Process(1000), "starting"),
            (LineSource::Dummy, "uart: "),
            (LineSource::Process(2042), "{{{pc:0x401000}}} crashed"),
            (LineSource::Dummy, "[00002.000] bad.envelope> oops"),
            (LineSource::Process(7), "padded"),
        ]
    );

    let header = lines[3].header.expect("attributed line has a header");
    assert_eq!(header.thread_id, 2043);
    assert_eq!(header.timestamp, 1.5);
    assert!(lines[4].header.is_none());
}

#[tokio::test]
async fn messages_feed_the_markup_parser() {
    let stream = start_parsing(SERIAL_LOG.as_bytes(), CancellationToken::new());
    let decoded: Vec<_> = stream
        .filter(|line| std::future::ready(!line.is_dummy()))
        .map(|line| parse_line_or_text(&line.message))
        .collect()
        .await;

    assert_eq!(
        decoded[1].children,
        vec![
            Element::ProgramCounter(ProgramCounter { vaddr: 0x401000 }),
            Element::text(" crashed"),
        ]
    );
}

#[tokio::test]
async fn cancelled_before_start_emits_nothing() {
    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut stream = start_parsing(SERIAL_LOG.as_bytes(), cancel);
    assert_eq!(stream.next_line().await, None);
}

#[tokio::test]
async fn cancellation_mid_stream_emits_at_most_one_more_item() {
    let (mut writer, reader) = tokio::io::duplex(8192);
    let cancel = CancellationToken::new();
    let mut stream = start_parsing(reader, cancel.clone());

    for n in 0..50 {
        writer
            .write_all(format!("[{n}.0] 1.1> line {n}\n").as_bytes())
            .await
            .unwrap();
    }

    let first = stream.next_line().await.expect("first item");
    assert_eq!(first.message, "line 0");
    cancel.cancel();

    let mut remaining = 0;
    while stream.next_line().await.is_some() {
        remaining += 1;
    }
    assert!(remaining <= 1, "got {remaining} items after cancel");
}

#[tokio::test]
async fn larger_capacity_preserves_order() {
    let input: String = (0..200).map(|n| format!("[{n}.5] 9.{n}> m{n}\n")).collect();
    let config = PipelineConfig {
        channel_capacity: 16,
        ..PipelineConfig::default()
    };
    let stream = start_parsing_with_config(
        std::io::Cursor::new(input.into_bytes()),
        CancellationToken::new(),
        config,
    );
    let threads: Vec<u64> = stream
        .map(|line| line.header.map(|h| h.thread_id).unwrap_or(u64::MAX))
        .collect()
        .await;
    assert_eq!(threads, (0..200).collect::<Vec<_>>());
}

#[test]
fn file_reader_matches_streaming_output() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(SERIAL_LOG.as_bytes()).unwrap();
    file.flush().unwrap();

    let from_file: Vec<_> = log_line_file(file.path()).unwrap().collect();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .unwrap();
    let from_stream: Vec<_> = runtime.block_on(async {
        start_parsing(SERIAL_LOG.as_bytes(), CancellationToken::new())
            .collect()
            .await
    });

    assert_eq!(from_file, from_stream);
}
