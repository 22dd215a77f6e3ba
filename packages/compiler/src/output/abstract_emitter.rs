//! Printing context shared by emitters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static LEGAL_IDENTIFIER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z_$][0-9a-zA-Z_$]*$").unwrap());
const INDENT_WITH: &str = "  ";

pub const CATCH_ERROR_VAR: &str = "error";
pub const CATCH_STACK_VAR: &str = "stack";

#[derive(Debug, Clone)]
struct EmittedLine {
    parts: Vec<String>,
    indent: usize,
}

impl EmittedLine {
    fn new(indent: usize) -> Self {
        EmittedLine {
            parts: Vec::new(),
            indent,
        }
    }
}

/// Lines of generated source with their indentation.
pub struct EmitterVisitorContext {
    exported_vars: HashSet<String>,
    lines: Vec<EmittedLine>,
    indent: usize,
}

impl EmitterVisitorContext {
    pub fn create_root(exported_vars: &[String]) -> Self {
        EmitterVisitorContext {
            exported_vars: exported_vars.iter().cloned().collect(),
            lines: vec![EmittedLine::new(0)],
            indent: 0,
        }
    }

    pub fn is_exported_var(&self, name: &str) -> bool {
        self.exported_vars.contains(name)
    }

    fn current_line_mut(&mut self) -> &mut EmittedLine {
        if self.lines.is_empty() {
            self.lines.push(EmittedLine::new(self.indent));
        }
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn line_is_empty(&self) -> bool {
        self.lines.last().map_or(true, |line| line.parts.is_empty())
    }

    pub fn print(&mut self, part: &str) {
        if !part.is_empty() {
            self.current_line_mut().parts.push(part.to_string());
        }
    }

    pub fn println(&mut self, last_part: &str) {
        self.print(last_part);
        self.lines.push(EmittedLine::new(self.indent));
    }

    pub fn inc_indent(&mut self) {
        self.indent += 1;
        if self.line_is_empty() {
            self.current_line_mut().indent = self.indent;
        }
    }

    pub fn dec_indent(&mut self) {
        self.indent = self.indent.saturating_sub(1);
        if self.line_is_empty() {
            self.current_line_mut().indent = self.indent;
        }
    }

    pub fn to_source(&self) -> String {
        let mut lines: &[EmittedLine] = &self.lines;
        if let Some((last, rest)) = lines.split_last() {
            if last.parts.is_empty() {
                lines = rest;
            }
        }
        lines
            .iter()
            .map(|line| {
                if line.parts.is_empty() {
                    String::new()
                } else {
                    format!("{}{}", INDENT_WITH.repeat(line.indent), line.parts.join(""))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Single-quoted string literal.
pub fn escape_single_quote_string(input: &str, escape_dollar: bool) -> String {
    let mut escaped = String::with_capacity(input.len() + 2);
    escaped.push('\'');
    for c in input.chars() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '$' if escape_dollar => escaped.push_str("\\$"),
            c => escaped.push(c),
        }
    }
    escaped.push('\'');
    escaped
}

/// Quotes `input` when it is not a legal identifier.
pub fn escape_identifier(input: &str, escape_dollar: bool, always_quote: bool) -> String {
    if input.is_empty() {
        return "''".to_string();
    }
    if !always_quote && LEGAL_IDENTIFIER_RE.is_match(input) {
        return input.to_string();
    }
    escape_single_quote_string(input, escape_dollar)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_indent_nested_lines() {
        let mut ctx = EmitterVisitorContext::create_root(&[]);
        ctx.println("if (a) {");
        ctx.inc_indent();
        ctx.print("b");
        ctx.println(";");
        ctx.dec_indent();
        ctx.println("}");
        assert_eq!(ctx.to_source(), "if (a) {\n  b;\n}");
    }

    #[test]
    fn should_quote_only_illegal_identifiers() {
        assert_eq!(escape_identifier("abc", false, false), "abc");
        assert_eq!(escape_identifier("a-b", false, false), "'a-b'");
        assert_eq!(escape_identifier("it's\n$", true, true), "'it\\'s\\n\\$'");
    }
}
