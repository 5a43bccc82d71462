//! Recursive-descent parser for the inline symbolizer markup.
//!
//! A line is a sequence of elements, each tried in a fixed priority order.
//! The first production that matches wins; a production whose prefix matches
//! but whose body is malformed simply fails, and since plain text never starts
//! at a fence, such a line is rejected as a whole.

use tracing::trace;

use crate::cursor::{Cursor, Rule};
use crate::element::{
    BacktraceFrame, ColorGroup, Element, Mapping, MappingLoad, Module, PresentationGroup,
    ProgramCounter,
};

const ELEM_PREFIX: &str = "{{{";
const ELEM_SUFFIX: &str = "}}}";
const COLOR_PREFIX: &str = "\x1b[";
const MODULE_PREFIX: &str = "{{{module:";
const MMAP_PREFIX: &str = "{{{mmap:";
const PC_PREFIX: &str = "{{{pc:";
const BT_PREFIX: &str = "{{{bt:";
const RESET: &str = "{{{reset}}}";

const LINE_RULES: &[Rule] = &[
    parse_color,
    parse_module,
    parse_mapping,
    parse_backtrace,
    parse_reset,
    parse_pc,
    parse_text,
];

const COLOR_RULES: &[Rule] = &[parse_pc, parse_text];

/// Parses one line of markup.
///
/// Returns `None` unless every byte of `line` was consumed by some element.
pub fn parse_line(line: &str) -> Option<PresentationGroup> {
    let mut cursor = Cursor::new(line);
    let group = parse_presentation_group(&mut cursor);
    if !cursor.is_empty() {
        trace!(unparsed = cursor.remaining(), "markup line rejected");
        return None;
    }
    Some(group)
}

/// Parses one line of markup, treating a rejected line as a single text run.
pub fn parse_line_or_text(line: &str) -> PresentationGroup {
    parse_line(line).unwrap_or_else(|| PresentationGroup {
        children: vec![Element::text(line)],
    })
}

pub fn parse_presentation_group(cursor: &mut Cursor<'_>) -> PresentationGroup {
    let mut group = PresentationGroup::default();
    cursor.many(&mut group.children, |c| c.choice(LINE_RULES));
    group
}

/// Plain text up to the next fence or color escape. Never empty.
pub fn parse_text(cursor: &mut Cursor<'_>) -> Option<Element> {
    let rest = cursor.remaining();
    let end = [ELEM_PREFIX, COLOR_PREFIX]
        .iter()
        .filter_map(|marker| rest.find(marker))
        .min()
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let text = cursor.take(end)?;
    Some(Element::text(text))
}

pub fn parse_color(cursor: &mut Cursor<'_>) -> Option<Element> {
    cursor.prefix(COLOR_PREFIX, |c| {
        let color = c.int_before("m").ok()?;
        let mut children = Vec::new();
        c.many(&mut children, |c| c.choice(COLOR_RULES));
        Some(Element::Color(ColorGroup { color, children }))
    })
}

pub fn parse_module(cursor: &mut Cursor<'_>) -> Option<Element> {
    cursor.prefix(MODULE_PREFIX, |c| {
        let id = c.int_before(":").ok()?;
        let name = c.before(":").ok()?;
        if !c.expect("elf:") {
            return None;
        }
        let build_id = c.before(ELEM_SUFFIX).ok()?;
        Some(Element::Module(Module {
            id,
            name: name.to_string(),
            build_id: build_id.to_string(),
        }))
    })
}

pub fn parse_mapping(cursor: &mut Cursor<'_>) -> Option<Element> {
    cursor.prefix(MMAP_PREFIX, |c| {
        let vaddr = c.int_before(":").ok()?;
        let size = c.int_before(":").ok()?;
        let load = if c.expect("load:") {
            let module_id = c.int_before(":").ok()?;
            let flags = c.before(":").ok()?;
            let module_offset = c.int_before(ELEM_SUFFIX).ok()?;
            Some(MappingLoad {
                module_id,
                flags: flags.to_string(),
                module_offset,
            })
        } else {
            c.before(ELEM_SUFFIX).ok()?;
            None
        };
        Some(Element::Mapping(Mapping { vaddr, size, load }))
    })
}

pub fn parse_backtrace(cursor: &mut Cursor<'_>) -> Option<Element> {
    cursor.prefix(BT_PREFIX, |c| {
        let frame = c.int_before(":").ok()?;
        let vaddr = c.int_before(ELEM_SUFFIX).ok()?;
        Some(Element::Backtrace(BacktraceFrame { frame, vaddr }))
    })
}

pub fn parse_pc(cursor: &mut Cursor<'_>) -> Option<Element> {
    cursor.prefix(PC_PREFIX, |c| {
        let vaddr = c.int_before(ELEM_SUFFIX).ok()?;
        Some(Element::ProgramCounter(ProgramCounter { vaddr }))
    })
}

pub fn parse_reset(cursor: &mut Cursor<'_>) -> Option<Element> {
    cursor.expect(RESET).then_some(Element::Reset)
}
