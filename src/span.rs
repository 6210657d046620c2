/// Span tracking for positions in definition text
use crate::sanitizer::PathSegment;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Represents a span in the source text (byte offsets)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Convert to a Range for use with ariadne
    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Span at a 1-based line and column, as reported by `serde_json`
    ///
    /// The column is a byte count and may land inside a multibyte
    /// character; the span starts at that character instead.
    pub fn at_line_column(text: &str, line: usize, column: usize) -> Self {
        let line_start: usize = text
            .split_inclusive('\n')
            .take(line.saturating_sub(1))
            .map(str::len)
            .sum();
        let mut start = (line_start + column.saturating_sub(1)).min(text.len());
        while !text.is_char_boundary(start) {
            start -= 1;
        }
        let end = text[start..]
            .chars()
            .next()
            .map_or(start, |c| start + c.len_utf8());
        Span::new(start, end)
    }
}

/// Find the span of the JSON value at `path` within `text`
///
/// Returns `None` if the text is not shaped the way the path expects.
pub fn locate(text: &str, path: &[PathSegment]) -> Option<Span> {
    let mut cursor = Cursor {
        bytes: text.as_bytes(),
        pos: 0,
    };
    cursor.skip_ws();
    for segment in path {
        match segment {
            PathSegment::Index(index) => cursor.enter_index(*index)?,
            PathSegment::Key(key) => cursor.enter_key(key)?,
        }
    }
    let start = cursor.pos;
    cursor.skip_value()?;
    Some(Span::new(start, cursor.pos))
}

/// Like [`locate`], but falls back to the closest enclosing value
pub fn locate_nearest(text: &str, path: &[PathSegment]) -> Option<Span> {
    (0..=path.len())
        .rev()
        .find_map(|len| locate(text, &path[..len]))
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl Cursor<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn expect(&mut self, byte: u8) -> Option<()> {
        (self.peek()? == byte).then(|| self.pos += 1)
    }

    fn skip_ws(&mut self) {
        while matches!(self.peek(), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            self.pos += 1;
        }
    }

    /// Read a string, returning its raw (still escaped) contents
    fn read_string(&mut self) -> Option<&[u8]> {
        self.expect(b'"')?;
        let start = self.pos;
        loop {
            match self.peek()? {
                b'"' => break,
                b'\\' => self.pos += 2,
                _ => self.pos += 1,
            }
        }
        let raw = self.bytes.get(start..self.pos)?;
        self.pos += 1;
        Some(raw)
    }

    fn skip_value(&mut self) -> Option<()> {
        match self.peek()? {
            b'"' => self.read_string().map(|_| ()),
            open @ (b'[' | b'{') => {
                let close = if open == b'[' { b']' } else { b'}' };
                self.pos += 1;
                self.skip_ws();
                if self.peek()? == close {
                    self.pos += 1;
                    return Some(());
                }
                loop {
                    if open == b'{' {
                        self.read_string()?;
                        self.skip_ws();
                        self.expect(b':')?;
                        self.skip_ws();
                    }
                    self.skip_value()?;
                    self.skip_ws();
                    match self.peek()? {
                        b',' => {
                            self.pos += 1;
                            self.skip_ws();
                        }
                        c if c == close => {
                            self.pos += 1;
                            return Some(());
                        }
                        _ => return None,
                    }
                }
            }
            _ => {
                // number, true, false, null
                let start = self.pos;
                while matches!(self.peek(), Some(c) if !matches!(c, b',' | b']' | b'}' | b' ' | b'\t' | b'\n' | b'\r'))
                {
                    self.pos += 1;
                }
                (self.pos > start).then_some(())
            }
        }
    }

    fn enter_index(&mut self, index: usize) -> Option<()> {
        self.expect(b'[')?;
        self.skip_ws();
        for _ in 0..index {
            if self.peek()? == b']' {
                return None;
            }
            self.skip_value()?;
            self.skip_ws();
            self.expect(b',')?;
            self.skip_ws();
        }
        (self.peek()? != b']').then_some(())
    }

    fn enter_key(&mut self, key: &str) -> Option<()> {
        self.expect(b'{')?;
        self.skip_ws();
        loop {
            if self.peek()? == b'}' {
                return None;
            }
            let found = self.read_string()? == key.as_bytes();
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            if found {
                return Some(());
            }
            self.skip_value()?;
            self.skip_ws();
            self.expect(b',')?;
            self.skip_ws();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sanitizer::PathSegment::{Index, Key};

    const TEXT: &str = r#"[
  {"name": "size", "items": [{"value": "small"}, {"value": "large", "tags": "big"}]},
  {"name": 3, "items": {}}
]"#;

    fn slice(span: Span) -> &'static str {
        &TEXT[span.range()]
    }

    #[test]
    fn test_locate_nested_field() {
        let span = locate(TEXT, &[Index(0), Key("items"), Index(1), Key("tags")]).unwrap();
        assert_eq!(slice(span), "\"big\"");
    }

    #[test]
    fn test_locate_object() {
        let span = locate(TEXT, &[Index(1), Key("items")]).unwrap();
        assert_eq!(slice(span), "{}");
        let span = locate(TEXT, &[Index(1), Key("name")]).unwrap();
        assert_eq!(slice(span), "3");
    }

    #[test]
    fn test_locate_missing() {
        assert!(locate(TEXT, &[Index(2)]).is_none());
        assert!(locate(TEXT, &[Index(0), Key("weight")]).is_none());
    }

    #[test]
    fn test_locate_nearest_falls_back() {
        let span = locate_nearest(TEXT, &[Index(0), Key("items"), Index(0), Key("only")]).unwrap();
        assert_eq!(slice(span), r#"{"value": "small"}"#);
    }

    #[test]
    fn test_line_column_inside_multibyte_char() {
        // serde_json reports column 4 for the truncated string `["é`
        let text = "[\"é";
        let span = Span::at_line_column(text, 1, 4);
        assert_eq!(&text[span.range()], "é");
    }

    #[test]
    fn test_line_column_past_end() {
        let text = "[1,";
        let span = Span::at_line_column(text, 1, 10);
        assert_eq!(span, Span::new(3, 3));
    }

    #[test]
    fn test_line_column() {
        let text = "[\n  1,\n  x\n]";
        let span = Span::at_line_column(text, 3, 3);
        assert_eq!(&text[span.range()], "x");
    }
}
