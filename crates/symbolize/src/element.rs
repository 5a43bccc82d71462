use serde::Serialize;

/// One recognized piece of symbolizer markup.
///
/// The set of variants is closed; consumers are expected to match on it
/// exhaustively.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Element {
    /// Literal run that does not start a fence or a color escape.
    Text { content: String },
    Color(ColorGroup),
    Module(Module),
    Mapping(Mapping),
    ProgramCounter(ProgramCounter),
    Backtrace(BacktraceFrame),
    Reset,
    PresentationGroup(PresentationGroup),
}

impl Element {
    pub fn text(content: impl Into<String>) -> Self {
        Element::Text {
            content: content.into(),
        }
    }
}

/// An ANSI color escape (`ESC[<code>m`) and the text/pc elements that follow
/// it up to the next unrelated marker.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ColorGroup {
    pub color: u64,
    pub children: Vec<Element>,
}

/// `{{{module:<id>:<name>:elf:<build id>}}}`
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Module {
    pub id: u64,
    pub name: String,
    pub build_id: String,
}

/// `{{{mmap:<vaddr>:<size>:...}}}`
///
/// Only `load` mappings keep their payload; other mapping kinds retain just
/// the address range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mapping {
    pub vaddr: u64,
    pub size: u64,
    pub load: Option<MappingLoad>,
}

/// Payload of a `load:<module id>:<flags>:<module relative addr>` mapping.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MappingLoad {
    pub module_id: u64,
    pub flags: String,
    pub module_offset: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ProgramCounter {
    pub vaddr: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BacktraceFrame {
    pub frame: u64,
    pub vaddr: u64,
}

/// Root of a fully parsed line, children in source order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PresentationGroup {
    pub children: Vec<Element>,
}

impl PresentationGroup {
    /// Concatenates every text run in the tree, including those nested in
    /// color groups, dropping all structured markers.
    pub fn text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.children, &mut out);
        out
    }
}

fn collect_text(elements: &[Element], out: &mut String) {
    for element in elements {
        match element {
            Element::Text { content } => out.push_str(content),
            Element::Color(group) => collect_text(&group.children, out),
            Element::PresentationGroup(group) => collect_text(&group.children, out),
            Element::Module(_)
            | Element::Mapping(_)
            | Element::ProgramCounter(_)
            | Element::Backtrace(_)
            | Element::Reset => {}
        }
    }
}
