use std::{
    pin::Pin,
    task::{Context, Poll},
};

use futures_core::Stream;
use tokio::{
    io::{AsyncBufReadExt, AsyncRead, BufReader},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::{
    config::PipelineConfig, envelope::attribute_line, line::AttributedLine, reader::decode_line,
};

/// Receiving end of a running pipeline.
///
/// Yields attributed lines in input order and ends with `None` once the input
/// is exhausted, the read fails, or the pipeline is cancelled.
#[derive(Debug)]
pub struct AttributedLineStream {
    rx: mpsc::Receiver<AttributedLine>,
}

impl AttributedLineStream {
    pub async fn next_line(&mut self) -> Option<AttributedLine> {
        self.rx.recv().await
    }
}

impl Stream for AttributedLineStream {
    type Item = AttributedLine;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().rx.poll_recv(cx)
    }
}

/// Spawns a task that reads `reader` line by line and attributes each line.
///
/// Must be called from within a tokio runtime. The task stops once `cancel`
/// fires or the returned stream is dropped.
pub fn start_parsing<R>(reader: R, cancel: CancellationToken) -> AttributedLineStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    start_parsing_with_config(reader, cancel, PipelineConfig::default())
}

pub fn start_parsing_with_config<R>(
    reader: R,
    cancel: CancellationToken,
    config: PipelineConfig,
) -> AttributedLineStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.channel_capacity.max(1));
    tokio::spawn(forward_lines(reader, tx, cancel, config));
    AttributedLineStream { rx }
}

pub(crate) async fn forward_lines<R>(
    reader: R,
    sender: mpsc::Sender<AttributedLine>,
    cancel: CancellationToken,
    config: PipelineConfig,
) where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buffer = Vec::new();
    let mut line_number = 0usize;

    loop {
        buffer.clear();
        let read = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            read = reader.read_until(b'\n', &mut buffer) => read,
        };
        match read {
            Ok(0) => {
                debug!(line_number, "serial log input exhausted");
                return;
            }
            Ok(_) => {}
            Err(err) => {
                warn!(error = %err, line_number = line_number + 1, "failed to read serial log");
                return;
            }
        }
        line_number += 1;

        // The line just read is dropped once cancellation is observed.
        if cancel.is_cancelled() {
            break;
        }

        let attribution = attribute_line(&decode_line(
            &buffer,
            config.strip_carriage_return,
            line_number,
        ));
        for item in attribution {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(line_number, "serial log parsing cancelled");
                    return;
                }
                sent = sender.send(item) => {
                    if sent.is_err() {
                        debug!(line_number, "serial log consumer went away");
                        return;
                    }
                }
            }
        }
    }

    debug!(line_number, "serial log parsing cancelled");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::line::{LineHeader, LineSource};
    use futures_util::StreamExt;
    use tokio::io::AsyncWriteExt;

    #[tokio::test]
    async fn streams_lines_in_order() {
        let input: &[u8] =
            b"[1.234] 42.7> hello world\nnoise[1.0] 1.1> ok\nnot a log line at all\n";
        let stream = start_parsing(input, CancellationToken::new());
        let lines: Vec<_> = stream.collect().await;

        assert_eq!(
            lines,
            vec![
                AttributedLine::from_process(
                    LineHeader {
                        process_id: 42,
                        thread_id: 7,
                        timestamp: 1.234,
                    },
                    "hello world"
                ),
                AttributedLine::dummy("noise"),
                AttributedLine::from_process(
                    LineHeader {
                        process_id: 1,
                        thread_id: 1,
                        timestamp: 1.0,
                    },
                    "ok"
                ),
                AttributedLine::dummy("not a log line at all"),
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_closes_stream() {
        let (mut writer, reader) = tokio::io::duplex(1024);
        let cancel = CancellationToken::new();
        let mut stream = start_parsing(reader, cancel.clone());

        writer.write_all(b"[1.0] 5.6> first\n").await.unwrap();
        let first = stream.next_line().await.expect("first line");
        assert_eq!(first.source, LineSource::Process(5));

        cancel.cancel();
        let _ = writer.write_all(b"[2.0] 5.6> second\n").await;

        // The writer stays open, so the stream can only end through cancellation.
        assert_eq!(stream.next_line().await, None);
    }

    #[tokio::test]
    async fn dropping_the_stream_stops_the_producer() {
        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::channel(1);
        let handle = tokio::spawn(forward_lines(
            reader,
            tx,
            CancellationToken::new(),
            PipelineConfig::default(),
        ));
        drop(rx);

        writer.write_all(b"[1.0] 1.1> a\n").await.unwrap();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn producer_waits_for_slow_consumer() {
        let (mut writer, reader) = tokio::io::duplex(4096);
        let (tx, mut rx) = mpsc::channel(1);
        let handle = tokio::spawn(forward_lines(
            reader,
            tx,
            CancellationToken::new(),
            PipelineConfig::default(),
        ));

        for n in 0..5 {
            writer
                .write_all(format!("[{n}.0] 1.1> line {n}\n").as_bytes())
                .await
                .unwrap();
        }
        writer.shutdown().await.unwrap();
        tokio::task::yield_now().await;
        assert!(!handle.is_finished());

        let mut messages = Vec::new();
        while let Some(line) = rx.recv().await {
            messages.push(line.message);
        }
        handle.await.unwrap();
        assert_eq!(
            messages,
            (0..5).map(|n| format!("line {n}")).collect::<Vec<_>>()
        );
    }
}
