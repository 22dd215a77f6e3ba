//! Angular Expression Lexer
//!
//! Tokenizes template expressions for the parser.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Character,
    Identifier,
    Keyword,
    String,
    Operator,
    Number,
    Error,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub index: usize,
    pub token_type: TokenType,
    pub num_value: f64,
    pub str_value: String,
}

const KEYWORDS: [&str; 9] = [
    "var", "let", "null", "undefined", "true", "false", "if", "else", "this",
];

impl Token {
    fn new(index: usize, token_type: TokenType, num_value: f64, str_value: String) -> Self {
        Token {
            index,
            token_type,
            num_value,
            str_value,
        }
    }

    pub fn is_character(&self, ch: char) -> bool {
        self.token_type == TokenType::Character && self.num_value == ch as u32 as f64
    }

    pub fn is_number(&self) -> bool {
        self.token_type == TokenType::Number
    }

    pub fn is_string(&self) -> bool {
        self.token_type == TokenType::String
    }

    pub fn is_operator(&self, operator: &str) -> bool {
        self.token_type == TokenType::Operator && self.str_value == operator
    }

    pub fn is_identifier(&self) -> bool {
        self.token_type == TokenType::Identifier
    }

    pub fn is_keyword(&self) -> bool {
        self.token_type == TokenType::Keyword
    }

    fn is_keyword_named(&self, name: &str) -> bool {
        self.token_type == TokenType::Keyword && self.str_value == name
    }

    pub fn is_keyword_let(&self) -> bool {
        self.is_keyword_named("let")
    }

    pub fn is_keyword_null(&self) -> bool {
        self.is_keyword_named("null")
    }

    pub fn is_keyword_undefined(&self) -> bool {
        self.is_keyword_named("undefined")
    }

    pub fn is_keyword_true(&self) -> bool {
        self.is_keyword_named("true")
    }

    pub fn is_keyword_false(&self) -> bool {
        self.is_keyword_named("false")
    }

    pub fn is_keyword_this(&self) -> bool {
        self.is_keyword_named("this")
    }

    pub fn is_error(&self) -> bool {
        self.token_type == TokenType::Error
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.token_type {
            TokenType::Number => write!(f, "{}", self.num_value),
            _ => f.write_str(&self.str_value),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Lexer;

impl Lexer {
    pub fn new() -> Self {
        Lexer
    }

    pub fn tokenize(&self, text: &str) -> Vec<Token> {
        let mut scanner = Scanner::new(text);
        let mut tokens = Vec::new();
        while let Some(token) = scanner.scan_token() {
            tokens.push(token);
        }
        tokens
    }
}

fn is_identifier_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || ch == '_' || ch == '$'
}

fn is_identifier_part(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'
}

/// Whether `input` is a plain identifier such as `foo` or `$bar`.
pub fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(first) if is_identifier_start(first) => chars.all(is_identifier_part),
        _ => false,
    }
}

fn is_whitespace(ch: char) -> bool {
    ch <= ' ' || ch == '\u{00A0}'
}

struct Scanner<'a> {
    input: &'a str,
    index: usize,
    peek: Option<char>,
}

impl<'a> Scanner<'a> {
    fn new(input: &'a str) -> Self {
        Scanner {
            input,
            index: 0,
            peek: input.chars().next(),
        }
    }

    fn advance(&mut self) {
        if let Some(ch) = self.peek {
            self.index += ch.len_utf8();
        }
        self.peek = self.input[self.index..].chars().next();
    }

    fn scan_token(&mut self) -> Option<Token> {
        while matches!(self.peek, Some(ch) if is_whitespace(ch)) {
            self.advance();
        }
        let ch = self.peek?;
        let start = self.index;
        if is_identifier_start(ch) {
            return Some(self.scan_identifier());
        }
        if ch.is_ascii_digit() {
            return Some(self.scan_number(start));
        }
        let token = match ch {
            '.' => {
                self.advance();
                if matches!(self.peek, Some(c) if c.is_ascii_digit()) {
                    self.scan_number(start)
                } else {
                    character_token(start, '.')
                }
            }
            '(' | ')' | '{' | '}' | '[' | ']' | ',' | ':' | ';' => {
                self.advance();
                character_token(start, ch)
            }
            '\'' | '"' => self.scan_string(),
            '#' | '+' | '-' | '*' | '/' | '%' | '^' => {
                self.advance();
                operator_token(start, ch.to_string())
            }
            '?' => self.scan_complex_operator(start, "?", '.', None),
            '<' | '>' => self.scan_complex_operator(start, &ch.to_string(), '=', None),
            '!' | '=' => self.scan_complex_operator(start, &ch.to_string(), '=', Some('=')),
            '&' => self.scan_complex_operator(start, "&", '&', None),
            '|' => self.scan_complex_operator(start, "|", '|', None),
            other => {
                self.advance();
                self.error(&format!("Unexpected character [{}]", other), 0)
            }
        };
        Some(token)
    }

    fn scan_identifier(&mut self) -> Token {
        let start = self.index;
        self.advance();
        while matches!(self.peek, Some(ch) if is_identifier_part(ch)) {
            self.advance();
        }
        let text = self.input[start..self.index].to_string();
        let token_type = if KEYWORDS.contains(&text.as_str()) {
            TokenType::Keyword
        } else {
            TokenType::Identifier
        };
        Token::new(start, token_type, 0.0, text)
    }

    fn scan_number(&mut self, start: usize) -> Token {
        self.advance();
        loop {
            match self.peek {
                Some(ch) if ch.is_ascii_digit() || ch == '.' => {}
                Some('e') | Some('E') => {
                    self.advance();
                    if matches!(self.peek, Some('+') | Some('-')) {
                        self.advance();
                    }
                    if !matches!(self.peek, Some(ch) if ch.is_ascii_digit()) {
                        return self.error("Invalid exponent", -1);
                    }
                }
                _ => break,
            }
            self.advance();
        }
        let text = &self.input[start..self.index];
        let value = text.parse::<f64>().unwrap_or(f64::NAN);
        Token::new(start, TokenType::Number, value, String::new())
    }

    fn scan_string(&mut self) -> Token {
        let start = self.index;
        let quote = self.peek;
        self.advance();
        let mut buffer = String::new();
        let mut marker = self.index;
        while self.peek != quote {
            match self.peek {
                Some('\\') => {
                    buffer.push_str(&self.input[marker..self.index]);
                    self.advance();
                    if self.peek == Some('u') {
                        let hex: String = self.input[self.index + 1..].chars().take(4).collect();
                        match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                            Some(ch) if hex.len() == 4 => buffer.push(ch),
                            _ => return self.error(&format!("Invalid unicode escape [\\u{}]", hex), 0),
                        }
                        for _ in 0..5 {
                            self.advance();
                        }
                    } else {
                        let escaped = match self.peek {
                            Some('n') => '\n',
                            Some('f') => '\u{000C}',
                            Some('r') => '\r',
                            Some('t') => '\t',
                            Some('v') => '\u{000B}',
                            Some(other) => other,
                            None => return self.error("Unterminated quote", 0),
                        };
                        buffer.push(escaped);
                        self.advance();
                    }
                    marker = self.index;
                }
                None => return self.error("Unterminated quote", 0),
                Some(_) => self.advance(),
            }
        }
        buffer.push_str(&self.input[marker..self.index]);
        self.advance();
        Token::new(start, TokenType::String, 0.0, buffer)
    }

    fn scan_complex_operator(
        &mut self,
        start: usize,
        one: &str,
        two: char,
        three: Option<char>,
    ) -> Token {
        self.advance();
        let mut operator = one.to_string();
        if self.peek == Some(two) {
            self.advance();
            operator.push(two);
        }
        if let Some(three) = three {
            if self.peek == Some(three) {
                self.advance();
                operator.push(three);
            }
        }
        operator_token(start, operator)
    }

    fn error(&self, message: &str, offset: i64) -> Token {
        let position = (self.index as i64 + offset).max(0) as usize;
        Token::new(
            position,
            TokenType::Error,
            0.0,
            format!(
                "Lexer Error: {} at column {} in expression [{}]",
                message, position, self.input
            ),
        )
    }
}

fn character_token(index: usize, ch: char) -> Token {
    Token::new(index, TokenType::Character, ch as u32 as f64, ch.to_string())
}

fn operator_token(index: usize, operator: String) -> Token {
    Token::new(index, TokenType::Operator, 0.0, operator)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(text: &str) -> Vec<Token> {
        Lexer::new().tokenize(text)
    }

    #[test]
    fn should_tokenize_identifiers_keywords_and_operators() {
        let tokens = lex("a?.b !== null");
        assert!(tokens[0].is_identifier());
        assert!(tokens[1].is_operator("?."));
        assert!(tokens[3].is_operator("!=="));
        assert!(tokens[4].is_keyword_null());
    }

    #[test]
    fn should_tokenize_numbers_and_strings() {
        let tokens = lex("1.5e3 'a\\'b' \"\\u0041\"");
        assert_eq!(tokens[0].num_value, 1500.0);
        assert_eq!(tokens[1].str_value, "a'b");
        assert_eq!(tokens[2].str_value, "A");
    }

    #[test]
    fn should_report_unterminated_quotes() {
        let tokens = lex("'abc");
        assert!(tokens[0].is_error());
        assert_eq!(
            tokens[0].str_value,
            "Lexer Error: Unterminated quote at column 4 in expression ['abc]"
        );
    }

    #[test]
    fn should_recognize_identifiers() {
        assert!(is_identifier("$foo_1"));
        assert!(!is_identifier("1foo"));
        assert!(!is_identifier("a-b"));
    }
}
