use std::path::PathBuf;

use serde::Serialize;
use symbolize::{
    parse_line_or_text, start_parsing_with_config, AttributedLine, CancellationToken, Element,
    LineSource, PipelineConfig, PresentationGroup,
};
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use tracing::{debug, warn};

use crate::Error;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Log file to read; stdin when omitted.
    pub path: Option<PathBuf>,
    /// Print one JSON object per line instead of text.
    #[arg(long)]
    pub json: bool,
    /// Parse symbolizer markup in each message.
    #[arg(long)]
    pub markup: bool,
    /// Keep a trailing carriage return on each line.
    #[arg(long)]
    pub keep_cr: bool,
    /// How many parsed lines may queue up ahead of the output.
    #[arg(long, default_value_t = 1)]
    pub buffer: usize,
}

impl Args {
    fn config(&self) -> PipelineConfig {
        PipelineConfig {
            channel_capacity: self.buffer,
            strip_carriage_return: !self.keep_cr,
        }
    }
}

#[derive(Serialize)]
struct Record<'a> {
    #[serde(flatten)]
    line: &'a AttributedLine,
    #[serde(skip_serializing_if = "Option::is_none")]
    markup: Option<PresentationGroup>,
}

pub async fn run(args: Args) -> Result<(), Error> {
    let input: Box<dyn AsyncRead + Unpin + Send> = match &args.path {
        Some(path) => {
            let file = tokio::fs::File::open(path)
                .await
                .map_err(|source| Error::Open {
                    path: path.clone(),
                    source,
                })?;
            Box::new(file)
        }
        None => Box::new(tokio::io::stdin()),
    };

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                debug!("interrupted, stopping decode");
                interrupt.cancel();
            }
            Err(err) => warn!(error = %err, "unable to listen for ctrl-c"),
        }
    });

    let mut lines = start_parsing_with_config(input, cancel, args.config());
    let mut out = BufWriter::new(tokio::io::stdout());
    while let Some(line) = lines.next_line().await {
        let markup = args.markup.then(|| parse_line_or_text(&line.message));
        let rendered = if args.json {
            serde_json::to_string(&Record {
                line: &line,
                markup,
            })?
        } else {
            render_text(&line, markup.as_ref())
        };
        out.write_all(rendered.as_bytes())
            .await
            .map_err(Error::Write)?;
        out.write_all(b"\n").await.map_err(Error::Write)?;
    }
    out.flush().await.map_err(Error::Write)
}

fn render_text(line: &AttributedLine, markup: Option<&PresentationGroup>) -> String {
    let mut out = match (line.source, line.header) {
        (LineSource::Process(_), Some(header)) => format!(
            "{}.{} @ {:.6} | ",
            header.process_id, header.thread_id, header.timestamp
        ),
        _ => "- | ".to_string(),
    };
    match markup {
        Some(group) => render_elements(&group.children, &mut out),
        None => out.push_str(&line.message),
    }
    out
}

fn render_elements(elements: &[Element], out: &mut String) {
    for element in elements {
        match element {
            Element::Text { content } => out.push_str(content),
            Element::Color(group) => render_elements(&group.children, out),
            Element::PresentationGroup(group) => render_elements(&group.children, out),
            Element::Module(module) => out.push_str(&format!(
                "<module {} {} {}>",
                module.id, module.name, module.build_id
            )),
            Element::Mapping(mapping) => match &mapping.load {
                Some(load) => out.push_str(&format!(
                    "<mmap {:#x} {:#x} load {} {} {:#x}>",
                    mapping.vaddr, mapping.size, load.module_id, load.flags, load.module_offset
                )),
                None => out.push_str(&format!("<mmap {:#x} {:#x}>", mapping.vaddr, mapping.size)),
            },
            Element::ProgramCounter(pc) => out.push_str(&format!("<pc {:#x}>", pc.vaddr)),
            Element::Backtrace(frame) => {
                out.push_str(&format!("<bt #{} {:#x}>", frame.frame, frame.vaddr))
            }
            Element::Reset => {}
        }
    }
}
