use crate::{element::Element, error::ScanError};

/// A grammar production: on success it returns an element and advances the
/// cursor, on failure it returns `None`.
pub type Rule = fn(&mut Cursor<'_>) -> Option<Element>;

/// View over the unconsumed remainder of a single line.
///
/// Cursors are `Copy`, so a production can probe a snapshot and only write it
/// back once it succeeds. Every primitive below follows that rule: a failed
/// scan leaves the cursor exactly where it was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    pub fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    /// Text that has not been consumed yet.
    pub fn remaining(&self) -> &'a str {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Consumes `literal` if the remainder starts with it.
    pub fn expect(&mut self, literal: &str) -> bool {
        match self.rest.strip_prefix(literal) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    /// Returns the text up to the first `delimiter` and consumes through it.
    pub fn before(&mut self, delimiter: &str) -> Result<&'a str, ScanError> {
        let (head, tail) = self
            .rest
            .split_once(delimiter)
            .ok_or_else(|| missing(delimiter))?;
        self.rest = tail;
        Ok(head)
    }

    /// Returns the text up to the first `delimiter`, leaving the delimiter
    /// itself as the start of the remainder.
    pub fn only_before(&mut self, delimiter: &str) -> Result<&'a str, ScanError> {
        let idx = self.rest.find(delimiter).ok_or_else(|| missing(delimiter))?;
        let (head, tail) = self.rest.split_at(idx);
        self.rest = tail;
        Ok(head)
    }

    /// Like [`Cursor::before`], parsing the captured text as an unsigned
    /// integer. `0x`, `0o`, `0b` and leading-zero octal prefixes are honored.
    pub fn int_before(&mut self, delimiter: &str) -> Result<u64, ScanError> {
        self.scan_before(delimiter, parse_int)
    }

    /// Like [`Cursor::before`], parsing the captured text as a base-10 integer.
    pub fn dec_before(&mut self, delimiter: &str) -> Result<u64, ScanError> {
        self.scan_before(delimiter, |text| parse_radix(text, text, 10))
    }

    pub fn float_before(&mut self, delimiter: &str) -> Result<f64, ScanError> {
        self.scan_before(delimiter, |text| {
            text.parse::<f64>().map_err(|_| ScanError::InvalidFloat {
                text: text.to_string(),
            })
        })
    }

    pub fn whitespace(&mut self) {
        self.rest = self.rest.trim_start();
    }

    /// Ordered choice: the first rule that succeeds wins. Each rule starts from
    /// the same position, and only the winner's advance is kept.
    pub fn choice(&mut self, rules: &[Rule]) -> Option<Element> {
        for rule in rules {
            let mut probe = *self;
            if let Some(element) = rule(&mut probe) {
                *self = probe;
                return Some(element);
            }
        }
        None
    }

    /// Applies `rule` until it fails, collecting every result in order.
    pub fn many<F>(&mut self, out: &mut Vec<Element>, mut rule: F)
    where
        F: FnMut(&mut Cursor<'a>) -> Option<Element>,
    {
        loop {
            let mut probe = *self;
            let Some(element) = rule(&mut probe) else {
                return;
            };
            out.push(element);
            // A rule that succeeds without consuming would repeat forever.
            if probe.rest.len() == self.rest.len() {
                return;
            }
            *self = probe;
        }
    }

    /// Consumes `literal` and runs `body` on what follows. Nothing is consumed
    /// unless both succeed.
    pub fn prefix<F>(&mut self, literal: &str, body: F) -> Option<Element>
    where
        F: FnOnce(&mut Cursor<'a>) -> Option<Element>,
    {
        let mut probe = *self;
        if !probe.expect(literal) {
            return None;
        }
        let element = body(&mut probe)?;
        *self = probe;
        Some(element)
    }

    /// Consumes the next `len` bytes; `len` must fall on a char boundary.
    pub(crate) fn take(&mut self, len: usize) -> Option<&'a str> {
        let head = self.rest.get(..len)?;
        self.rest = self.rest.get(len..)?;
        Some(head)
    }

    fn scan_before<T, P>(&mut self, delimiter: &str, parse: P) -> Result<T, ScanError>
    where
        P: FnOnce(&str) -> Result<T, ScanError>,
    {
        let mut probe = *self;
        let text = probe.before(delimiter)?;
        let value = parse(text)?;
        *self = probe;
        Ok(value)
    }
}

fn missing(delimiter: &str) -> ScanError {
    ScanError::MissingDelimiter {
        delimiter: delimiter.to_string(),
    }
}

fn parse_int(text: &str) -> Result<u64, ScanError> {
    let strip = |lower: &str, upper: &str| {
        text.strip_prefix(lower)
            .or_else(|| text.strip_prefix(upper))
    };

    if let Some(digits) = strip("0x", "0X") {
        parse_radix(text, digits, 16)
    } else if let Some(digits) = strip("0b", "0B") {
        parse_radix(text, digits, 2)
    } else if let Some(digits) = strip("0o", "0O") {
        parse_radix(text, digits, 8)
    } else if text.len() > 1 && text.starts_with('0') {
        parse_radix(text, &text[1..], 8)
    } else {
        parse_radix(text, text, 10)
    }
}

// `from_str_radix` tolerates a leading `+`, so digits are checked up front.
fn parse_radix(text: &str, digits: &str, radix: u32) -> Result<u64, ScanError> {
    let invalid = || ScanError::InvalidInteger {
        text: text.to_string(),
    };
    if digits.is_empty() || !digits.chars().all(|ch| ch.is_digit(radix)) {
        return Err(invalid());
    }
    u64::from_str_radix(digits, radix).map_err(|_| invalid())
}
