//! Parse Utilities
//!
//! Source files, locations, spans and the template diagnostic type shared by
//! the HTML parser, the expression parser and the template parser.

use std::fmt;
use std::rc::Rc;

#[derive(Debug, PartialEq)]
pub struct ParseSourceFile {
    pub content: String,
    pub url: String,
}

impl ParseSourceFile {
    pub fn new(content: impl Into<String>, url: impl Into<String>) -> Rc<Self> {
        Rc::new(ParseSourceFile {
            content: content.into(),
            url: url.into(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseLocation {
    pub file: Rc<ParseSourceFile>,
    pub offset: usize,
    pub line: usize,
    pub col: usize,
}

impl ParseLocation {
    pub fn new(file: Rc<ParseSourceFile>, offset: usize, line: usize, col: usize) -> Self {
        ParseLocation {
            file,
            offset,
            line,
            col,
        }
    }

    /// Location of `offset` in `file`, computing line and column.
    pub fn at_offset(file: &Rc<ParseSourceFile>, offset: usize) -> Self {
        ParseLocation::new(file.clone(), 0, 0, 0).move_by(offset as i64)
    }

    pub fn move_by(&self, delta: i64) -> ParseLocation {
        let source = self.file.content.as_bytes();
        let len = source.len();
        let mut offset = self.offset;
        let mut line = self.line;
        let mut col = self.col;
        let mut delta = delta;

        while offset > 0 && delta < 0 {
            offset -= 1;
            delta += 1;
            if source[offset] == b'\n' {
                line = line.saturating_sub(1);
                col = match self.file.content[..offset].rfind('\n') {
                    Some(prior_line) => offset - prior_line,
                    None => offset,
                };
            } else {
                col = col.saturating_sub(1);
            }
        }

        while offset < len && delta > 0 {
            let ch = source[offset];
            offset += 1;
            delta -= 1;
            if ch == b'\n' {
                line += 1;
                col = 0;
            } else {
                col += 1;
            }
        }

        ParseLocation::new(self.file.clone(), offset, line, col)
    }

    /// Source text around the location, bounded by `max_chars` and `max_lines`
    /// on each side.
    pub fn get_context(&self, max_chars: usize, max_lines: usize) -> Option<(String, String)> {
        let content = &self.file.content;
        if content.is_empty() {
            return None;
        }
        let bytes = content.as_bytes();
        let anchor = self.offset.min(content.len());
        let mut start = anchor;
        let mut end = anchor;

        let mut chars = 0;
        let mut lines = 0;
        while chars < max_chars && start > 0 {
            start -= 1;
            chars += 1;
            if bytes[start] == b'\n' {
                lines += 1;
                if lines == max_lines {
                    break;
                }
            }
        }

        chars = 0;
        lines = 0;
        while chars < max_chars && end < content.len() {
            if bytes[end] == b'\n' {
                lines += 1;
                if lines == max_lines {
                    break;
                }
            }
            end += 1;
            chars += 1;
        }

        while !content.is_char_boundary(start) {
            start += 1;
        }
        while !content.is_char_boundary(end) {
            end -= 1;
        }
        Some((
            content[start..anchor].to_string(),
            content[anchor..end].to_string(),
        ))
    }
}

impl fmt::Display for ParseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.file.url, self.line, self.col)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseSourceSpan {
    pub start: ParseLocation,
    pub end: ParseLocation,
    pub details: Option<String>,
}

impl ParseSourceSpan {
    pub fn new(start: ParseLocation, end: ParseLocation) -> Self {
        ParseSourceSpan {
            start,
            end,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Zero-width span for synthesized nodes.
    pub fn empty(url: &str) -> Self {
        let file = ParseSourceFile::new("", url);
        let loc = ParseLocation::new(file, 0, 0, 0);
        ParseSourceSpan::new(loc.clone(), loc)
    }

    pub fn text(&self) -> &str {
        let content = &self.start.file.content;
        let end = self.end.offset.min(content.len());
        let start = self.start.offset.min(end);
        &content[start..end]
    }
}

impl fmt::Display for ParseSourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorLevel {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub span: ParseSourceSpan,
    pub msg: String,
    pub level: ParseErrorLevel,
}

impl ParseError {
    pub fn new(span: ParseSourceSpan, msg: impl Into<String>) -> Self {
        ParseError {
            span,
            msg: msg.into(),
            level: ParseErrorLevel::Error,
        }
    }

    pub fn warning(span: ParseSourceSpan, msg: impl Into<String>) -> Self {
        ParseError {
            span,
            msg: msg.into(),
            level: ParseErrorLevel::Warning,
        }
    }

    pub fn is_fatal(&self) -> bool {
        self.level == ParseErrorLevel::Error
    }

    pub fn contextual_message(&self) -> String {
        match self.span.start.get_context(100, 3) {
            Some((before, after)) => {
                let level = match self.level {
                    ParseErrorLevel::Warning => "WARNING",
                    ParseErrorLevel::Error => "ERROR",
                };
                format!("{} (\"{}[{} ->]{}\")", self.msg, before, level, after)
            }
            None => self.msg.clone(),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let details = self
            .span
            .details
            .as_ref()
            .map(|d| format!(", {}", d))
            .unwrap_or_default();
        write!(f, "{}: {}{}", self.contextual_message(), self.span.start, details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn move_by_tracks_lines() {
        let file = ParseSourceFile::new("ab\ncd", "t.html");
        let loc = ParseLocation::at_offset(&file, 4);
        assert_eq!((loc.line, loc.col), (1, 1));
        let back = loc.move_by(-2);
        assert_eq!(back.offset, 2);
        assert_eq!(back.line, 0);
    }

    #[test]
    fn contextual_message_marks_position() {
        let file = ParseSourceFile::new("<div>", "t.html");
        let start = ParseLocation::at_offset(&file, 1);
        let end = ParseLocation::at_offset(&file, 4);
        let err = ParseError::new(ParseSourceSpan::new(start, end), "Bad");
        assert_eq!(err.contextual_message(), "Bad (\"<[ERROR ->]div>\")");
        assert_eq!(err.to_string(), "Bad (\"<[ERROR ->]div>\"): t.html@0:1");
    }
}
