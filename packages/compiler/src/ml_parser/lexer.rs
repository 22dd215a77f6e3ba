//! ML Parser Lexer
//!
//! HTML tokenizer: converts template source into the token stream consumed
//! by the tree builder in `parser.rs`.

use super::interpolation_config::InterpolationConfig;
use super::tags::{get_html_tag_definition, TagContentType, NAMED_ENTITIES};
use super::tokens::{Token, TokenType};
use crate::parse_util::{ParseError, ParseLocation, ParseSourceFile, ParseSourceSpan};
use std::rc::Rc;

#[derive(Debug, Clone)]
pub struct TokenizeResult {
    pub tokens: Vec<Token>,
    pub errors: Vec<ParseError>,
}

pub fn tokenize(
    source: &str,
    url: &str,
    tokenize_expansion_forms: bool,
    interpolation_config: &InterpolationConfig,
) -> TokenizeResult {
    let file = ParseSourceFile::new(source, url);
    Tokenizer::new(file, tokenize_expansion_forms, interpolation_config).tokenize()
}

fn unexpected_character_error_msg(ch: Option<char>) -> String {
    let ch = ch.map(|c| c.to_string()).unwrap_or_else(|| "EOF".to_string());
    format!("Unexpected character \"{}\"", ch)
}

fn unknown_entity_error_msg(entity: &str) -> String {
    format!(
        "Unknown entity \"{}\" - use the \"&#<decimal>;\" or  \"&#x<hex>;\" syntax",
        entity
    )
}

fn is_whitespace(c: char) -> bool {
    ('\t'..=' ').contains(&c) || c == '\u{00A0}'
}

fn is_name_end(c: char) -> bool {
    is_whitespace(c) || matches!(c, '>' | '/' | '\'' | '"' | '=')
}

fn is_prefix_end(c: char) -> bool {
    !c.is_ascii_alphanumeric()
}

fn is_digit_entity_end(c: char) -> bool {
    c == ';' || !c.is_ascii_hexdigit()
}

fn is_named_entity_end(c: char) -> bool {
    c == ';' || !c.is_ascii_alphabetic()
}

fn process_carriage_returns(content: String) -> String {
    if content.contains('\r') {
        content.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        content
    }
}

type LexResult<T> = std::result::Result<T, ParseError>;

#[derive(Debug, Clone, Copy)]
struct Cursor {
    offset: usize,
    line: usize,
    col: usize,
    peek: Option<char>,
}

struct Tokenizer<'a> {
    file: Rc<ParseSourceFile>,
    tokenize_icu: bool,
    interpolation_config: &'a InterpolationConfig,
    cursor: Cursor,
    current_token_start: Option<Cursor>,
    current_token_type: Option<TokenType>,
    expansion_case_stack: Vec<TokenType>,
    in_interpolation: bool,
    tokens: Vec<Token>,
    errors: Vec<ParseError>,
}

impl<'a> Tokenizer<'a> {
    fn new(
        file: Rc<ParseSourceFile>,
        tokenize_icu: bool,
        interpolation_config: &'a InterpolationConfig,
    ) -> Self {
        let peek = file.content.chars().next();
        Tokenizer {
            file,
            tokenize_icu,
            interpolation_config,
            cursor: Cursor {
                offset: 0,
                line: 0,
                col: 0,
                peek,
            },
            current_token_start: None,
            current_token_type: None,
            expansion_case_stack: Vec::new(),
            in_interpolation: false,
            tokens: Vec::new(),
            errors: Vec::new(),
        }
    }

    fn tokenize(mut self) -> TokenizeResult {
        while self.cursor.peek.is_some() {
            let start = self.cursor;
            if let Err(error) = self.scan(start) {
                self.errors.push(error);
                if self.cursor.offset == start.offset {
                    let _ = self.advance();
                }
            }
        }
        self.begin_token(TokenType::Eof, None);
        self.end_token(Vec::new(), None);
        TokenizeResult {
            tokens: self.tokens,
            errors: self.errors,
        }
    }

    fn scan(&mut self, start: Cursor) -> LexResult<()> {
        if self.attempt_char('<') {
            if self.attempt_char('!') {
                if self.attempt_char('[') {
                    self.consume_cdata(start)
                } else if self.attempt_char('-') {
                    self.consume_comment(start)
                } else {
                    self.consume_doc_type(start)
                }
            } else if self.attempt_char('/') {
                self.consume_tag_close(start)
            } else {
                self.consume_tag_open(start)
            }
        } else if self.tokenize_icu && self.tokenize_expansion_form()? {
            Ok(())
        } else {
            self.consume_text()
        }
    }

    // cursor primitives

    fn location(&self, cursor: Cursor) -> ParseLocation {
        ParseLocation::new(self.file.clone(), cursor.offset, cursor.line, cursor.col)
    }

    fn span(&self, start: Cursor, end: Cursor) -> ParseSourceSpan {
        ParseSourceSpan::new(self.location(start), self.location(end))
    }

    fn current_span(&self) -> ParseSourceSpan {
        self.span(self.cursor, self.cursor)
    }

    fn substring(&self, start: usize, end: usize) -> String {
        self.file.content[start..end].to_string()
    }

    fn char_after_peek(&self) -> Option<char> {
        let peek = self.cursor.peek?;
        self.file.content[self.cursor.offset + peek.len_utf8()..]
            .chars()
            .next()
    }

    fn advance(&mut self) -> LexResult<()> {
        let Some(ch) = self.cursor.peek else {
            return Err(self.create_error(unexpected_character_error_msg(None), self.current_span()));
        };
        if ch == '\n' {
            self.cursor.line += 1;
            self.cursor.col = 0;
        } else if ch != '\r' {
            self.cursor.col += 1;
        }
        self.cursor.offset += ch.len_utf8();
        self.cursor.peek = self.file.content[self.cursor.offset..].chars().next();
        Ok(())
    }

    fn attempt_char(&mut self, ch: char) -> bool {
        if self.cursor.peek == Some(ch) {
            self.advance().is_ok()
        } else {
            false
        }
    }

    fn attempt_char_case_insensitive(&mut self, ch: char) -> bool {
        match self.cursor.peek {
            Some(peek) if peek.to_ascii_lowercase() == ch.to_ascii_lowercase() => {
                self.advance().is_ok()
            }
            _ => false,
        }
    }

    fn require_char(&mut self, ch: char) -> LexResult<()> {
        let location = self.cursor;
        if !self.attempt_char(ch) {
            return Err(self.create_error(
                unexpected_character_error_msg(self.cursor.peek),
                self.span(location, location),
            ));
        }
        Ok(())
    }

    fn attempt_str(&mut self, chars: &str) -> bool {
        let saved = self.cursor;
        for ch in chars.chars() {
            if !self.attempt_char(ch) {
                self.cursor = saved;
                return false;
            }
        }
        true
    }

    fn attempt_str_case_insensitive(&mut self, chars: &str) -> bool {
        let saved = self.cursor;
        for ch in chars.chars() {
            if !self.attempt_char_case_insensitive(ch) {
                self.cursor = saved;
                return false;
            }
        }
        true
    }

    fn require_str(&mut self, chars: &str) -> LexResult<()> {
        let location = self.cursor;
        if !self.attempt_str(chars) {
            return Err(self.create_error(
                unexpected_character_error_msg(self.cursor.peek),
                self.span(location, location),
            ));
        }
        Ok(())
    }

    /// Advances until `stop` holds for the next character or input ends.
    fn attempt_until(&mut self, stop: impl Fn(char) -> bool) {
        while let Some(ch) = self.cursor.peek {
            if stop(ch) || self.advance().is_err() {
                break;
            }
        }
    }

    fn require_until(&mut self, stop: impl Fn(char) -> bool, min_len: usize) -> LexResult<()> {
        let start = self.cursor;
        self.attempt_until(stop);
        if self.cursor.offset - start.offset < min_len {
            return Err(self.create_error(
                unexpected_character_error_msg(self.cursor.peek),
                self.span(start, start),
            ));
        }
        Ok(())
    }

    fn attempt_until_char(&mut self, ch: char) {
        self.attempt_until(|c| c == ch);
    }

    fn read_until(&mut self, ch: char) -> String {
        let start = self.cursor.offset;
        self.attempt_until_char(ch);
        self.substring(start, self.cursor.offset)
    }

    fn read_char(&mut self, decode_entities: bool) -> LexResult<String> {
        if decode_entities && self.cursor.peek == Some('&') {
            return self.decode_entity();
        }
        let start = self.cursor.offset;
        self.advance()?;
        Ok(self.substring(start, self.cursor.offset))
    }

    fn decode_entity(&mut self) -> LexResult<String> {
        let start = self.cursor;
        self.advance()?;
        if self.attempt_char('#') {
            let is_hex = self.attempt_char('x') || self.attempt_char('X');
            let number_start = self.cursor.offset;
            self.require_until(is_digit_entity_end, 1)?;
            if self.cursor.peek != Some(';') {
                return Err(self.create_error(
                    unexpected_character_error_msg(self.cursor.peek),
                    self.current_span(),
                ));
            }
            self.advance()?;
            let digits = self.substring(number_start, self.cursor.offset - 1);
            let radix = if is_hex { 16 } else { 10 };
            match u32::from_str_radix(&digits, radix)
                .ok()
                .and_then(char::from_u32)
            {
                Some(ch) => Ok(ch.to_string()),
                None => {
                    let entity = self.substring(start.offset + 1, self.cursor.offset - 1);
                    Err(self.create_error(
                        unknown_entity_error_msg(&entity),
                        self.span(start, self.cursor),
                    ))
                }
            }
        } else {
            let saved = self.cursor;
            self.attempt_until(is_named_entity_end);
            if self.cursor.peek != Some(';') {
                self.cursor = saved;
                return Ok("&".to_string());
            }
            self.advance()?;
            let name = self.substring(start.offset + 1, self.cursor.offset - 1);
            match NAMED_ENTITIES.get(name.as_str()) {
                Some(value) => Ok(value.to_string()),
                None => Err(self.create_error(
                    unknown_entity_error_msg(&name),
                    self.span(start, self.cursor),
                )),
            }
        }
    }

    // tokens

    fn begin_token(&mut self, token_type: TokenType, start: Option<Cursor>) {
        self.current_token_start = Some(start.unwrap_or(self.cursor));
        self.current_token_type = Some(token_type);
    }

    fn end_token(&mut self, parts: Vec<String>, end: Option<Cursor>) -> Cursor {
        let start = self.current_token_start.take().unwrap_or(self.cursor);
        let token_type = self.current_token_type.take().unwrap_or(TokenType::Text);
        let end = end.unwrap_or(self.cursor);
        let source_span = self.span(start, end);
        self.tokens.push(Token {
            token_type,
            parts,
            source_span,
        });
        end
    }

    fn create_error(&mut self, msg: String, span: ParseSourceSpan) -> ParseError {
        let msg = if self.is_in_expansion_form() {
            format!(
                "{} (Do you have an unescaped \"{{\" in your template? Use \"{{{{ '{{' }}}}\") to escape it.)",
                msg
            )
        } else {
            msg
        };
        self.current_token_start = None;
        self.current_token_type = None;
        ParseError::new(span, msg)
    }

    // markup

    fn consume_cdata(&mut self, start: Cursor) -> LexResult<()> {
        self.begin_token(TokenType::CdataStart, Some(start));
        self.require_str("CDATA[")?;
        self.end_token(Vec::new(), None);
        let end = self.consume_raw_text(false, ']', |t| t.attempt_str("]>"))?;
        self.begin_token(TokenType::CdataEnd, Some(end));
        self.end_token(Vec::new(), None);
        Ok(())
    }

    fn consume_comment(&mut self, start: Cursor) -> LexResult<()> {
        self.begin_token(TokenType::CommentStart, Some(start));
        self.require_char('-')?;
        self.end_token(Vec::new(), None);
        let end = self.consume_raw_text(false, '-', |t| t.attempt_str("->"))?;
        self.begin_token(TokenType::CommentEnd, Some(end));
        self.end_token(Vec::new(), None);
        Ok(())
    }

    fn consume_doc_type(&mut self, start: Cursor) -> LexResult<()> {
        self.begin_token(TokenType::DocType, Some(start));
        let content_start = self.cursor.offset;
        self.attempt_until_char('>');
        let content = self.substring(content_start, self.cursor.offset);
        self.advance()?;
        self.end_token(vec![content], None);
        Ok(())
    }

    /// Reads raw text up to a terminator starting with `first_char_of_end`
    /// and confirmed by `attempt_end_rest`. Returns where the terminator
    /// begins.
    fn consume_raw_text(
        &mut self,
        decode_entities: bool,
        first_char_of_end: char,
        attempt_end_rest: impl Fn(&mut Self) -> bool,
    ) -> LexResult<Cursor> {
        let token_type = if decode_entities {
            TokenType::EscapableRawText
        } else {
            TokenType::RawText
        };
        self.begin_token(token_type, None);
        let mut parts = String::new();
        let tag_close_start = loop {
            let candidate = self.cursor;
            if self.attempt_char(first_char_of_end) && attempt_end_rest(self) {
                break candidate;
            }
            if self.cursor.offset > candidate.offset {
                parts.push_str(&self.substring(candidate.offset, self.cursor.offset));
            }
            while self.cursor.peek != Some(first_char_of_end) {
                let ch = self.read_char(decode_entities)?;
                parts.push_str(&ch);
            }
        };
        self.end_token(vec![process_carriage_returns(parts)], Some(tag_close_start));
        Ok(tag_close_start)
    }

    fn consume_prefix_and_name(&mut self) -> LexResult<(String, String)> {
        let name_or_prefix_start = self.cursor.offset;
        let mut prefix = String::new();
        self.attempt_until(|c| c == ':' || is_prefix_end(c));
        let name_start = if self.cursor.peek == Some(':') {
            self.advance()?;
            prefix = self.substring(name_or_prefix_start, self.cursor.offset - 1);
            self.cursor.offset
        } else {
            name_or_prefix_start
        };
        let min_len = if self.cursor.offset == name_start { 1 } else { 0 };
        self.require_until(is_name_end, min_len)?;
        let name = self.substring(name_start, self.cursor.offset);
        Ok((prefix, name))
    }

    fn consume_tag_open(&mut self, start: Cursor) -> LexResult<()> {
        let saved = (self.cursor, self.tokens.len());
        let tag_name = match self.consume_tag_open_parts(start) {
            Ok(tag_name) => tag_name,
            Err(_) => {
                // an invalid start tag is plain text beginning with "<"
                self.cursor = saved.0;
                self.tokens.truncate(saved.1);
                self.begin_token(TokenType::Text, Some(start));
                self.end_token(vec!["<".to_string()], None);
                return Ok(());
            }
        };
        let lowercase_tag_name = tag_name.to_lowercase();
        match get_html_tag_definition(&tag_name).content_type {
            TagContentType::RawText => self.consume_raw_text_with_tag_close(&lowercase_tag_name, false),
            TagContentType::EscapableRawText => {
                self.consume_raw_text_with_tag_close(&lowercase_tag_name, true)
            }
            TagContentType::ParsableData => Ok(()),
        }
    }

    fn consume_tag_open_parts(&mut self, start: Cursor) -> LexResult<String> {
        if !self.cursor.peek.map_or(false, |c| c.is_ascii_alphabetic()) {
            return Err(self.create_error(
                unexpected_character_error_msg(self.cursor.peek),
                self.span(start, self.cursor),
            ));
        }
        let name_start = self.cursor.offset;
        self.begin_token(TokenType::TagOpenStart, Some(start));
        let (prefix, name) = self.consume_prefix_and_name()?;
        self.end_token(vec![prefix, name], None);
        let tag_name = self.substring(name_start, self.cursor.offset);
        self.attempt_until(|c| !is_whitespace(c));
        while self.cursor.peek != Some('/') && self.cursor.peek != Some('>') {
            self.begin_token(TokenType::AttrName, None);
            let (prefix, name) = self.consume_prefix_and_name()?;
            self.end_token(vec![prefix, name], None);
            self.attempt_until(|c| !is_whitespace(c));
            if self.attempt_char('=') {
                self.attempt_until(|c| !is_whitespace(c));
                self.consume_attribute_value()?;
            }
            self.attempt_until(|c| !is_whitespace(c));
        }
        let token_type = if self.attempt_char('/') {
            TokenType::TagOpenEndVoid
        } else {
            TokenType::TagOpenEnd
        };
        self.begin_token(token_type, None);
        self.require_char('>')?;
        self.end_token(Vec::new(), None);
        Ok(tag_name)
    }

    fn consume_attribute_value(&mut self) -> LexResult<()> {
        self.begin_token(TokenType::AttrValue, None);
        let value = match self.cursor.peek {
            Some(quote @ ('\'' | '"')) => {
                self.advance()?;
                let mut value = String::new();
                while self.cursor.peek != Some(quote) {
                    value.push_str(&self.read_char(true)?);
                }
                self.advance()?;
                value
            }
            _ => {
                let value_start = self.cursor.offset;
                self.require_until(is_name_end, 1)?;
                self.substring(value_start, self.cursor.offset)
            }
        };
        self.end_token(vec![process_carriage_returns(value)], None);
        Ok(())
    }

    fn consume_raw_text_with_tag_close(
        &mut self,
        lowercase_tag_name: &str,
        decode_entities: bool,
    ) -> LexResult<()> {
        let end = self.consume_raw_text(decode_entities, '<', |t| {
            if !t.attempt_char('/') {
                return false;
            }
            t.attempt_until(|c| !is_whitespace(c));
            if !t.attempt_str_case_insensitive(lowercase_tag_name) {
                return false;
            }
            t.attempt_until(|c| !is_whitespace(c));
            t.attempt_char('>')
        })?;
        self.begin_token(TokenType::TagClose, Some(end));
        self.end_token(vec![String::new(), lowercase_tag_name.to_string()], None);
        Ok(())
    }

    fn consume_tag_close(&mut self, start: Cursor) -> LexResult<()> {
        self.begin_token(TokenType::TagClose, Some(start));
        self.attempt_until(|c| !is_whitespace(c));
        let (prefix, name) = self.consume_prefix_and_name()?;
        self.attempt_until(|c| !is_whitespace(c));
        self.require_char('>')?;
        self.end_token(vec![prefix, name], None);
        Ok(())
    }

    // text and ICU

    fn consume_text(&mut self) -> LexResult<()> {
        self.begin_token(TokenType::Text, None);
        let interpolation_start = self.interpolation_config.start.clone();
        let interpolation_end = self.interpolation_config.end.clone();
        let mut parts = String::new();
        loop {
            if self.attempt_str(&interpolation_start) {
                parts.push_str(&interpolation_start);
                self.in_interpolation = true;
            } else if self.in_interpolation && self.attempt_str(&interpolation_end) {
                parts.push_str(&interpolation_end);
                self.in_interpolation = false;
            } else {
                let ch = self.read_char(true)?;
                parts.push_str(&ch);
            }
            if self.is_text_end() {
                break;
            }
        }
        self.end_token(vec![process_carriage_returns(parts)], None);
        Ok(())
    }

    fn is_text_end(&mut self) -> bool {
        if self.is_tag_start() || self.cursor.peek.is_none() {
            return true;
        }
        if self.tokenize_icu && !self.in_interpolation {
            if self.is_expansion_form_start() {
                return true;
            }
            if self.cursor.peek == Some('}') && self.is_in_expansion_case() {
                return true;
            }
        }
        false
    }

    fn is_tag_start(&self) -> bool {
        if self.cursor.peek != Some('<') {
            return false;
        }
        matches!(self.char_after_peek(), Some(c) if c.is_ascii_alphabetic() || c == '/' || c == '!')
    }

    fn tokenize_expansion_form(&mut self) -> LexResult<bool> {
        if self.is_expansion_form_start() {
            self.consume_expansion_form_start()?;
            return Ok(true);
        }
        if self.is_in_expansion_form() && self.is_expansion_case_start() {
            self.consume_expansion_case_start()?;
            return Ok(true);
        }
        if self.cursor.peek == Some('}') {
            if self.is_in_expansion_case() {
                self.consume_expansion_case_end()?;
                return Ok(true);
            }
            if self.is_in_expansion_form() {
                self.consume_expansion_form_end()?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn is_expansion_form_start(&mut self) -> bool {
        if self.cursor.peek != Some('{') {
            return false;
        }
        let saved = self.cursor;
        let start = self.interpolation_config.start.clone();
        let is_interpolation = self.attempt_str(&start);
        self.cursor = saved;
        !is_interpolation
    }

    fn is_expansion_case_start(&mut self) -> bool {
        let saved = self.cursor;
        let is_case = !self.read_until('{').trim().is_empty();
        self.cursor = saved;
        is_case
    }

    fn is_in_expansion_case(&self) -> bool {
        self.expansion_case_stack.last() == Some(&TokenType::ExpansionCaseExpStart)
    }

    fn is_in_expansion_form(&self) -> bool {
        self.expansion_case_stack.last() == Some(&TokenType::ExpansionFormStart)
    }

    fn consume_expansion_form_start(&mut self) -> LexResult<()> {
        self.begin_token(TokenType::ExpansionFormStart, None);
        self.require_char('{')?;
        self.end_token(Vec::new(), None);
        self.expansion_case_stack.push(TokenType::ExpansionFormStart);

        self.begin_token(TokenType::RawText, None);
        let condition = self.read_until(',');
        self.end_token(vec![condition], None);
        self.require_char(',')?;
        self.attempt_until(|c| !is_whitespace(c));

        self.begin_token(TokenType::RawText, None);
        let type_ = self.read_until(',');
        self.end_token(vec![type_], None);
        self.require_char(',')?;
        self.attempt_until(|c| !is_whitespace(c));
        Ok(())
    }

    fn consume_expansion_case_start(&mut self) -> LexResult<()> {
        self.begin_token(TokenType::ExpansionCaseValue, None);
        let value = self.read_until('{').trim().to_string();
        self.end_token(vec![value], None);
        self.attempt_until(|c| !is_whitespace(c));

        self.begin_token(TokenType::ExpansionCaseExpStart, None);
        self.require_char('{')?;
        self.end_token(Vec::new(), None);
        self.attempt_until(|c| !is_whitespace(c));
        self.expansion_case_stack.push(TokenType::ExpansionCaseExpStart);
        Ok(())
    }

    fn consume_expansion_case_end(&mut self) -> LexResult<()> {
        self.begin_token(TokenType::ExpansionCaseExpEnd, None);
        self.require_char('}')?;
        self.end_token(Vec::new(), None);
        self.attempt_until(|c| !is_whitespace(c));
        self.expansion_case_stack.pop();
        Ok(())
    }

    fn consume_expansion_form_end(&mut self) -> LexResult<()> {
        self.begin_token(TokenType::ExpansionFormEnd, None);
        self.require_char('}')?;
        self.end_token(Vec::new(), None);
        self.expansion_case_stack.pop();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenize_and_humanize_parts(input: &str, icu: bool) -> Vec<(TokenType, Vec<String>)> {
        tokenize(input, "someUrl", icu, &InterpolationConfig::default())
            .tokens
            .into_iter()
            .map(|t| (t.token_type, t.parts))
            .collect()
    }

    fn parts(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn should_tokenize_tags_and_attributes() {
        assert_eq!(
            tokenize_and_humanize_parts("<a [b]=\"c\" d></a>", false),
            vec![
                (TokenType::TagOpenStart, parts(&["", "a"])),
                (TokenType::AttrName, parts(&["", "[b]"])),
                (TokenType::AttrValue, parts(&["c"])),
                (TokenType::AttrName, parts(&["", "d"])),
                (TokenType::TagOpenEnd, vec![]),
                (TokenType::TagClose, parts(&["", "a"])),
                (TokenType::Eof, vec![]),
            ]
        );
    }

    #[test]
    fn should_decode_entities_in_text() {
        assert_eq!(
            tokenize_and_humanize_parts("a&amp;b&#65;&#x42;", false),
            vec![
                (TokenType::Text, parts(&["a&bAB"])),
                (TokenType::Eof, vec![]),
            ]
        );
    }

    #[test]
    fn should_report_unknown_entities() {
        let result = tokenize("&tbo;", "someUrl", false, &InterpolationConfig::default());
        assert_eq!(
            result.errors[0].msg,
            "Unknown entity \"tbo\" - use the \"&#<decimal>;\" or  \"&#x<hex>;\" syntax"
        );
    }

    #[test]
    fn should_treat_invalid_tag_start_as_text() {
        assert_eq!(
            tokenize_and_humanize_parts("a < b", false),
            vec![(TokenType::Text, parts(&["a < b"])), (TokenType::Eof, vec![])]
        );
    }

    #[test]
    fn should_keep_raw_text_in_script() {
        assert_eq!(
            tokenize_and_humanize_parts("<script>a<b></script>", false),
            vec![
                (TokenType::TagOpenStart, parts(&["", "script"])),
                (TokenType::TagOpenEnd, vec![]),
                (TokenType::RawText, parts(&["a<b>"])),
                (TokenType::TagClose, parts(&["", "script"])),
                (TokenType::Eof, vec![]),
            ]
        );
    }

    #[test]
    fn should_tokenize_expansion_forms() {
        assert_eq!(
            tokenize_and_humanize_parts("{one.two, three, =4 {four} =5 {five} }", true),
            vec![
                (TokenType::ExpansionFormStart, vec![]),
                (TokenType::RawText, parts(&["one.two"])),
                (TokenType::RawText, parts(&["three"])),
                (TokenType::ExpansionCaseValue, parts(&["=4"])),
                (TokenType::ExpansionCaseExpStart, vec![]),
                (TokenType::Text, parts(&["four"])),
                (TokenType::ExpansionCaseExpEnd, vec![]),
                (TokenType::ExpansionCaseValue, parts(&["=5"])),
                (TokenType::ExpansionCaseExpStart, vec![]),
                (TokenType::Text, parts(&["five"])),
                (TokenType::ExpansionCaseExpEnd, vec![]),
                (TokenType::ExpansionFormEnd, vec![]),
                (TokenType::Eof, vec![]),
            ]
        );
    }

    #[test]
    fn should_not_treat_interpolation_as_expansion() {
        assert_eq!(
            tokenize_and_humanize_parts("{{ a }}", true),
            vec![(TokenType::Text, parts(&["{{ a }}"])), (TokenType::Eof, vec![])]
        );
    }
}
