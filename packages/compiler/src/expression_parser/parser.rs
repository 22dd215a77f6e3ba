//! Angular Expression Parser
//!
//! Recursive descent parser for bindings, actions, interpolations and
//! microsyntax (`*ngFor="let item of items"`). Errors are collected on the
//! returned `ASTWithSource` rather than raised.

use super::ast::{
    ASTWithSource, LiteralValue, ParseSpan, ParserError, TemplateBinding,
    TemplateBindingParseResult, AST,
};
use super::lexer::{is_identifier, Lexer, Token};
use crate::ml_parser::interpolation_config::InterpolationConfig;
use regex::Regex;

#[derive(Debug, Clone, PartialEq)]
pub struct SplitInterpolation {
    pub strings: Vec<String>,
    pub expressions: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Parser {
    lexer: Lexer,
}

impl Parser {
    pub fn new(lexer: Lexer) -> Self {
        Parser { lexer }
    }

    pub fn parse_action(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
    ) -> ASTWithSource {
        let mut errors = Vec::new();
        self.check_no_interpolation(input, location, interpolation_config, &mut errors);
        let tokens = self.lexer.tokenize(strip_comments(input));
        let ast = ParseAst::new(input, location, tokens, true, &mut errors).parse_chain();
        ASTWithSource {
            ast,
            source: input.to_string(),
            location: location.to_string(),
            errors,
        }
    }

    pub fn parse_binding(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
    ) -> ASTWithSource {
        let mut errors = Vec::new();
        let ast = self.parse_binding_ast(input, location, interpolation_config, &mut errors);
        ASTWithSource {
            ast,
            source: input.to_string(),
            location: location.to_string(),
            errors,
        }
    }

    /// Host property bindings: like `parse_binding`, but pipes are rejected.
    pub fn parse_simple_binding(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
    ) -> ASTWithSource {
        let mut errors = Vec::new();
        let ast = self.parse_binding_ast(input, location, interpolation_config, &mut errors);
        let checker_errors = simple_expression_errors(&ast);
        if !checker_errors.is_empty() {
            errors.push(ParserError::new(
                &format!(
                    "Host binding expression cannot contain {}",
                    checker_errors.join(" ")
                ),
                input,
                "in",
                location,
            ));
        }
        ASTWithSource {
            ast,
            source: input.to_string(),
            location: location.to_string(),
            errors,
        }
    }

    fn parse_binding_ast(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
        errors: &mut Vec<ParserError>,
    ) -> AST {
        if let Some(quote) = parse_quote(input, location) {
            return quote;
        }
        self.check_no_interpolation(input, location, interpolation_config, errors);
        let tokens = self.lexer.tokenize(strip_comments(input));
        ParseAst::new(input, location, tokens, false, errors).parse_chain()
    }

    pub fn parse_template_bindings(&self, input: &str, location: &str) -> TemplateBindingParseResult {
        let mut errors = Vec::new();
        let tokens = self.lexer.tokenize(input);
        let template_bindings =
            ParseAst::new(input, location, tokens, false, &mut errors).parse_template_bindings();
        TemplateBindingParseResult {
            template_bindings,
            warnings: Vec::new(),
            errors,
        }
    }

    /// Returns `None` when `input` holds no interpolation.
    pub fn parse_interpolation(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
    ) -> Option<ASTWithSource> {
        let mut errors = Vec::new();
        let split = self.split_interpolation_into(input, location, interpolation_config, &mut errors)?;
        let expressions = split
            .expressions
            .iter()
            .map(|expression| {
                let tokens = self.lexer.tokenize(strip_comments(expression));
                ParseAst::new(input, location, tokens, false, &mut errors).parse_chain()
            })
            .collect();
        Some(ASTWithSource {
            ast: AST::Interpolation {
                span: ParseSpan::new(0, input.len()),
                strings: split.strings,
                expressions,
            },
            source: input.to_string(),
            location: location.to_string(),
            errors,
        })
    }

    pub fn split_interpolation(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
    ) -> (Option<SplitInterpolation>, Vec<ParserError>) {
        let mut errors = Vec::new();
        let split = self.split_interpolation_into(input, location, interpolation_config, &mut errors);
        (split, errors)
    }

    fn split_interpolation_into(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
        errors: &mut Vec<ParserError>,
    ) -> Option<SplitInterpolation> {
        let parts = split_by_interpolation(input, interpolation_config);
        if parts.len() <= 1 {
            return None;
        }
        let mut strings = Vec::new();
        let mut expressions = Vec::new();
        for (i, part) in parts.iter().enumerate() {
            if i % 2 == 0 {
                strings.push(part.clone());
            } else if !part.trim().is_empty() {
                expressions.push(part.clone());
            } else {
                errors.push(ParserError::new(
                    "Blank expressions are not allowed in interpolated strings",
                    input,
                    &format!(
                        "at column {} in",
                        interpolation_error_column(&parts, i, interpolation_config)
                    ),
                    location,
                ));
            }
        }
        Some(SplitInterpolation {
            strings,
            expressions,
        })
    }

    pub fn wrap_literal_primitive(&self, input: &str, location: &str) -> ASTWithSource {
        ASTWithSource {
            ast: AST::LiteralPrimitive {
                span: ParseSpan::new(0, input.len()),
                value: LiteralValue::String(input.to_string()),
            },
            source: input.to_string(),
            location: location.to_string(),
            errors: Vec::new(),
        }
    }

    fn check_no_interpolation(
        &self,
        input: &str,
        location: &str,
        interpolation_config: &InterpolationConfig,
        errors: &mut Vec<ParserError>,
    ) {
        let parts = split_by_interpolation(input, interpolation_config);
        if parts.len() > 1 {
            errors.push(ParserError::new(
                &format!(
                    "Got interpolation ({}{}) where expression was expected",
                    interpolation_config.start, interpolation_config.end
                ),
                input,
                &format!(
                    "at column {} in",
                    interpolation_error_column(&parts, 1, interpolation_config)
                ),
                location,
            ));
        }
    }
}

/// Splits like a JS `split` on a capturing regexp: literal text at even
/// indexes, expression text at odd ones.
fn split_by_interpolation(input: &str, config: &InterpolationConfig) -> Vec<String> {
    let pattern = format!(
        "{}([\\s\\S]*?){}",
        regex::escape(&config.start),
        regex::escape(&config.end)
    );
    let regexp = match Regex::new(&pattern) {
        Ok(regexp) => regexp,
        Err(_) => return vec![input.to_string()],
    };
    let mut parts = Vec::new();
    let mut last = 0;
    for captures in regexp.captures_iter(input) {
        let (Some(whole), Some(inner)) = (captures.get(0), captures.get(1)) else {
            continue;
        };
        parts.push(input[last..whole.start()].to_string());
        parts.push(inner.as_str().to_string());
        last = whole.end();
    }
    parts.push(input[last..].to_string());
    parts
}

fn interpolation_error_column(parts: &[String], part_in_err_idx: usize, config: &InterpolationConfig) -> usize {
    parts[..part_in_err_idx]
        .iter()
        .enumerate()
        .map(|(j, part)| {
            if j % 2 == 0 {
                part.len()
            } else {
                config.start.len() + part.len() + config.end.len()
            }
        })
        .sum()
}

fn parse_quote(input: &str, location: &str) -> Option<AST> {
    let separator = input.find(':')?;
    let prefix = input[..separator].trim();
    if !is_identifier(prefix) {
        return None;
    }
    Some(AST::Quote {
        span: ParseSpan::new(0, input.len()),
        prefix: prefix.to_string(),
        uninterpreted_expression: input[separator + 1..].to_string(),
        location: location.to_string(),
    })
}

fn strip_comments(input: &str) -> &str {
    match comment_start(input) {
        Some(index) => input[..index].trim(),
        None => input,
    }
}

fn comment_start(input: &str) -> Option<usize> {
    let mut outer_quote: Option<char> = None;
    let mut chars = input.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        let next = chars.peek().map(|(_, c)| *c);
        if ch == '/' && next == Some('/') && outer_quote.is_none() {
            return Some(i);
        }
        if outer_quote == Some(ch) {
            outer_quote = None;
        } else if outer_quote.is_none() && (ch == '\'' || ch == '"' || ch == '`') {
            outer_quote = Some(ch);
        }
    }
    None
}

fn simple_expression_errors(ast: &AST) -> Vec<String> {
    let mut errors = Vec::new();
    collect_simple_expression_errors(ast, &mut errors);
    errors
}

fn collect_simple_expression_errors(ast: &AST, errors: &mut Vec<String>) {
    match ast {
        AST::BindingPipe { .. } => errors.push("pipes".to_string()),
        AST::LiteralArray { expressions, .. } => expressions
            .iter()
            .for_each(|e| collect_simple_expression_errors(e, errors)),
        AST::LiteralMap { values, .. } => values
            .iter()
            .for_each(|e| collect_simple_expression_errors(e, errors)),
        _ => {}
    }
}

struct ParseAst<'a> {
    input: &'a str,
    location: &'a str,
    tokens: Vec<Token>,
    parse_action: bool,
    errors: &'a mut Vec<ParserError>,
    rparens_expected: usize,
    rbrackets_expected: usize,
    rbraces_expected: usize,
    index: usize,
}

impl<'a> ParseAst<'a> {
    fn new(
        input: &'a str,
        location: &'a str,
        tokens: Vec<Token>,
        parse_action: bool,
        errors: &'a mut Vec<ParserError>,
    ) -> Self {
        ParseAst {
            input,
            location,
            tokens,
            parse_action,
            errors,
            rparens_expected: 0,
            rbrackets_expected: 0,
            rbraces_expected: 0,
            index: 0,
        }
    }

    fn peek(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.index + offset)
    }

    fn next(&self) -> Option<&Token> {
        self.peek(0)
    }

    fn at_end(&self) -> bool {
        self.index >= self.tokens.len()
    }

    fn input_index(&self) -> usize {
        self.next().map_or(self.input.len(), |t| t.index)
    }

    fn span(&self, start: usize) -> ParseSpan {
        ParseSpan::new(start, self.input_index())
    }

    fn advance(&mut self) {
        self.index += 1;
    }

    fn next_is_character(&self, ch: char) -> bool {
        self.next().map_or(false, |t| t.is_character(ch))
    }

    fn optional_character(&mut self, ch: char) -> bool {
        if self.next_is_character(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn peek_keyword_let(&self) -> bool {
        self.next().map_or(false, |t| t.is_keyword_let())
    }

    fn expect_character(&mut self, ch: char) {
        if !self.optional_character(ch) {
            self.error(&format!("Missing expected {}", ch));
        }
    }

    fn optional_operator(&mut self, operator: &str) -> bool {
        if self.next().map_or(false, |t| t.is_operator(operator)) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn next_description(&self) -> String {
        self.next().map(|t| t.to_string()).unwrap_or_default()
    }

    fn expect_identifier_or_keyword(&mut self) -> String {
        match self.next() {
            Some(t) if t.is_identifier() || t.is_keyword() => {
                let value = t.str_value.clone();
                self.advance();
                value
            }
            _ => {
                let description = self.next_description();
                self.error(&format!(
                    "Unexpected token {}, expected identifier or keyword",
                    description
                ));
                String::new()
            }
        }
    }

    fn expect_identifier_or_keyword_or_string(&mut self) -> String {
        match self.next() {
            Some(t) if t.is_identifier() || t.is_keyword() || t.is_string() => {
                let value = t.str_value.clone();
                self.advance();
                value
            }
            _ => {
                let description = self.next_description();
                self.error(&format!(
                    "Unexpected token {}, expected identifier, keyword, or string",
                    description
                ));
                String::new()
            }
        }
    }

    fn parse_chain(&mut self) -> AST {
        let mut exprs = Vec::new();
        let start = self.input_index();
        while !self.at_end() {
            let before = self.index;
            exprs.push(self.parse_pipe());
            if self.optional_character(';') {
                if !self.parse_action {
                    self.error("Binding expression cannot contain chained expression");
                }
                while self.optional_character(';') {}
            } else if !self.at_end() {
                let description = self.next_description();
                self.error(&format!("Unexpected token '{}'", description));
            }
            if self.index == before {
                // error recovery stopped on a token nothing consumes
                self.advance();
            }
        }
        match exprs.len() {
            0 => AST::EmptyExpr {
                span: self.span(start),
            },
            1 => exprs.remove(0),
            _ => AST::Chain {
                span: self.span(start),
                expressions: exprs,
            },
        }
    }

    fn parse_pipe(&mut self) -> AST {
        let mut result = self.parse_expression();
        if self.optional_operator("|") {
            if self.parse_action {
                self.error("Cannot have a pipe in an action expression");
            }
            loop {
                let name = self.expect_identifier_or_keyword();
                let mut args = Vec::new();
                while self.optional_character(':') {
                    args.push(self.parse_expression());
                }
                let start = result.span().start;
                result = AST::BindingPipe {
                    span: self.span(start),
                    exp: Box::new(result),
                    name,
                    args,
                };
                if !self.optional_operator("|") {
                    break;
                }
            }
        }
        result
    }

    fn parse_expression(&mut self) -> AST {
        self.parse_conditional()
    }

    fn parse_conditional(&mut self) -> AST {
        let start = self.input_index();
        let result = self.parse_logical_or();
        if self.optional_operator("?") {
            let yes = self.parse_pipe();
            let no = if !self.optional_character(':') {
                let end = self.input_index();
                let expression = self.input.get(start..end).unwrap_or("").to_string();
                self.error(&format!(
                    "Conditional expression {} requires all 3 expressions",
                    expression
                ));
                AST::EmptyExpr {
                    span: self.span(start),
                }
            } else {
                self.parse_pipe()
            };
            return AST::Conditional {
                span: self.span(start),
                condition: Box::new(result),
                true_exp: Box::new(yes),
                false_exp: Box::new(no),
            };
        }
        result
    }

    fn parse_binary_level(
        &mut self,
        operators: &[&str],
        operand: fn(&mut Self) -> AST,
    ) -> AST {
        let mut result = operand(self);
        'outer: loop {
            for operator in operators {
                if self.optional_operator(operator) {
                    let right = operand(self);
                    let start = result.span().start;
                    result = AST::Binary {
                        span: self.span(start),
                        operation: operator.to_string(),
                        left: Box::new(result),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return result;
        }
    }

    fn parse_logical_or(&mut self) -> AST {
        self.parse_binary_level(&["||"], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> AST {
        self.parse_binary_level(&["&&"], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> AST {
        self.parse_binary_level(&["==", "===", "!=", "!=="], Self::parse_relational)
    }

    fn parse_relational(&mut self) -> AST {
        self.parse_binary_level(&["<", ">", "<=", ">="], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> AST {
        self.parse_binary_level(&["+", "-"], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> AST {
        self.parse_binary_level(&["*", "%", "/"], Self::parse_prefix)
    }

    fn parse_prefix(&mut self) -> AST {
        let start = self.input_index();
        if self.optional_operator("+") {
            return self.parse_prefix();
        }
        if self.optional_operator("-") {
            let result = self.parse_prefix();
            return AST::Binary {
                span: self.span(start),
                operation: "-".to_string(),
                left: Box::new(AST::LiteralPrimitive {
                    span: ParseSpan::new(start, start),
                    value: LiteralValue::Number(0.0),
                }),
                right: Box::new(result),
            };
        }
        if self.optional_operator("!") {
            let result = self.parse_prefix();
            return AST::PrefixNot {
                span: self.span(start),
                expression: Box::new(result),
            };
        }
        self.parse_call_chain()
    }

    fn parse_call_chain(&mut self) -> AST {
        let mut result = self.parse_primary();
        loop {
            if self.optional_character('.') {
                result = self.parse_access_member_or_method_call(result, false);
            } else if self.optional_operator("?.") {
                result = self.parse_access_member_or_method_call(result, true);
            } else if self.optional_character('[') {
                self.rbrackets_expected += 1;
                let key = self.parse_pipe();
                self.rbrackets_expected -= 1;
                self.expect_character(']');
                let start = result.span().start;
                if self.optional_operator("=") {
                    let value = self.parse_conditional();
                    result = AST::KeyedWrite {
                        span: self.span(start),
                        obj: Box::new(result),
                        key: Box::new(key),
                        value: Box::new(value),
                    };
                } else {
                    result = AST::KeyedRead {
                        span: self.span(start),
                        obj: Box::new(result),
                        key: Box::new(key),
                    };
                }
            } else if self.optional_character('(') {
                self.rparens_expected += 1;
                let args = self.parse_call_arguments();
                self.rparens_expected -= 1;
                self.expect_character(')');
                let start = result.span().start;
                result = AST::FunctionCall {
                    span: self.span(start),
                    target: Box::new(result),
                    args,
                };
            } else {
                return result;
            }
        }
    }

    fn parse_primary(&mut self) -> AST {
        let start = self.input_index();
        let Some(next) = self.next().cloned() else {
            self.error(&format!("Unexpected end of expression: {}", self.input));
            return AST::EmptyExpr {
                span: self.span(start),
            };
        };
        if self.optional_character('(') {
            self.rparens_expected += 1;
            let result = self.parse_pipe();
            self.rparens_expected -= 1;
            self.expect_character(')');
            result
        } else if next.is_keyword_null() {
            self.advance();
            literal(self.span(start), LiteralValue::Null)
        } else if next.is_keyword_undefined() {
            self.advance();
            literal(self.span(start), LiteralValue::Undefined)
        } else if next.is_keyword_true() {
            self.advance();
            literal(self.span(start), LiteralValue::Bool(true))
        } else if next.is_keyword_false() {
            self.advance();
            literal(self.span(start), LiteralValue::Bool(false))
        } else if next.is_keyword_this() {
            self.advance();
            AST::ImplicitReceiver {
                span: self.span(start),
            }
        } else if self.optional_character('[') {
            self.rbrackets_expected += 1;
            let expressions = self.parse_expression_list(']');
            self.rbrackets_expected -= 1;
            self.expect_character(']');
            AST::LiteralArray {
                span: self.span(start),
                expressions,
            }
        } else if next.is_character('{') {
            self.parse_literal_map()
        } else if next.is_identifier() {
            let receiver = AST::ImplicitReceiver {
                span: ParseSpan::new(start, start),
            };
            self.parse_access_member_or_method_call(receiver, false)
        } else if next.is_number() {
            self.advance();
            literal(self.span(start), LiteralValue::Number(next.num_value))
        } else if next.is_string() {
            self.advance();
            literal(self.span(start), LiteralValue::String(next.str_value.clone()))
        } else {
            self.error(&format!("Unexpected token {}", next));
            AST::EmptyExpr {
                span: self.span(start),
            }
        }
    }

    fn parse_expression_list(&mut self, terminator: char) -> Vec<AST> {
        let mut result = Vec::new();
        if !self.next_is_character(terminator) {
            loop {
                result.push(self.parse_pipe());
                if !self.optional_character(',') {
                    break;
                }
            }
        }
        result
    }

    fn parse_literal_map(&mut self) -> AST {
        let mut keys = Vec::new();
        let mut values = Vec::new();
        let start = self.input_index();
        self.expect_character('{');
        if !self.optional_character('}') {
            self.rbraces_expected += 1;
            loop {
                keys.push(self.expect_identifier_or_keyword_or_string());
                self.expect_character(':');
                values.push(self.parse_pipe());
                if !self.optional_character(',') {
                    break;
                }
            }
            self.rbraces_expected -= 1;
            self.expect_character('}');
        }
        AST::LiteralMap {
            span: self.span(start),
            keys,
            values,
        }
    }

    fn parse_access_member_or_method_call(&mut self, receiver: AST, is_safe: bool) -> AST {
        let start = receiver.span().start;
        let id = self.expect_identifier_or_keyword();
        if self.optional_character('(') {
            self.rparens_expected += 1;
            let args = self.parse_call_arguments();
            self.expect_character(')');
            self.rparens_expected -= 1;
            let span = self.span(start);
            let receiver = Box::new(receiver);
            return if is_safe {
                AST::SafeMethodCall {
                    span,
                    receiver,
                    name: id,
                    args,
                }
            } else {
                AST::MethodCall {
                    span,
                    receiver,
                    name: id,
                    args,
                }
            };
        }
        if is_safe {
            if self.optional_operator("=") {
                self.error("The '?.' operator cannot be used in the assignment");
                return AST::EmptyExpr {
                    span: self.span(start),
                };
            }
            return AST::SafePropertyRead {
                span: self.span(start),
                receiver: Box::new(receiver),
                name: id,
            };
        }
        if self.optional_operator("=") {
            if !self.parse_action {
                self.error("Bindings cannot contain assignments");
                return AST::EmptyExpr {
                    span: self.span(start),
                };
            }
            let value = self.parse_conditional();
            return AST::PropertyWrite {
                span: self.span(start),
                receiver: Box::new(receiver),
                name: id,
                value: Box::new(value),
            };
        }
        AST::PropertyRead {
            span: self.span(start),
            receiver: Box::new(receiver),
            name: id,
        }
    }

    fn parse_call_arguments(&mut self) -> Vec<AST> {
        if self.next_is_character(')') {
            return Vec::new();
        }
        let mut positionals = Vec::new();
        loop {
            positionals.push(self.parse_pipe());
            if !self.optional_character(',') {
                break;
            }
        }
        positionals
    }

    /// Keys may contain dashes: `ng-for-of`.
    fn expect_template_binding_key(&mut self) -> String {
        let mut result = String::new();
        loop {
            result.push_str(&self.expect_identifier_or_keyword_or_string());
            if !self.optional_operator("-") {
                break;
            }
            result.push('-');
        }
        result
    }

    fn parse_template_bindings(&mut self) -> Vec<TemplateBinding> {
        let mut bindings = Vec::new();
        let mut prefix: Option<String> = None;
        while !self.at_end() {
            let before = self.index;
            let start = self.input_index();
            let key_is_var = self.peek_keyword_let();
            if key_is_var {
                self.advance();
            }
            let mut key = self.expect_template_binding_key();
            if !key_is_var {
                match &prefix {
                    None => prefix = Some(key.clone()),
                    Some(prefix) => key = format!("{}{}", prefix, capitalize(&key)),
                }
            }
            self.optional_character(':');
            let mut name = None;
            let mut expression = None;
            if key_is_var {
                name = Some(if self.optional_operator("=") {
                    self.expect_template_binding_key()
                } else {
                    "$implicit".to_string()
                });
            } else if !self.at_end() && !self.peek_keyword_let() {
                let exp_start = self.input_index();
                let ast = self.parse_pipe();
                let source = self
                    .input
                    .get(exp_start..self.input_index())
                    .unwrap_or("")
                    .to_string();
                expression = Some(ASTWithSource {
                    ast,
                    source,
                    location: self.location.to_string(),
                    errors: Vec::new(),
                });
            }
            bindings.push(TemplateBinding {
                span: self.span(start),
                key,
                key_is_var,
                name,
                expression,
            });
            if !self.optional_character(';') {
                self.optional_character(',');
            }
            if self.index == before {
                self.advance();
            }
        }
        bindings
    }

    fn location_text(&self) -> String {
        match self.next() {
            Some(token) => format!("at column {} in", token.index + 1),
            None => "at the end of the expression".to_string(),
        }
    }

    fn error(&mut self, message: &str) {
        let location = self.location_text();
        self.errors
            .push(ParserError::new(message, self.input, &location, self.location));
        self.skip();
    }

    /// Error recovery: skips to the next `;` or to an expected closing
    /// delimiter.
    fn skip(&mut self) {
        while let Some(n) = self.next() {
            if n.is_character(';')
                || (self.rparens_expected > 0 && n.is_character(')'))
                || (self.rbraces_expected > 0 && n.is_character('}'))
                || (self.rbrackets_expected > 0 && n.is_character(']'))
            {
                break;
            }
            let lexer_error = n.is_error().then(|| n.str_value.clone());
            if let Some(message) = lexer_error {
                let location = self.location_text();
                self.errors
                    .push(ParserError::new(&message, self.input, &location, self.location));
            }
            self.advance();
        }
    }
}

fn literal(span: ParseSpan, value: LiteralValue) -> AST {
    AST::LiteralPrimitive { span, value }
}

fn capitalize(key: &str) -> String {
    let mut chars = key.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expression_parser::serializer::unparse;

    fn parser() -> Parser {
        Parser::new(Lexer::new())
    }

    fn config() -> InterpolationConfig {
        InterpolationConfig::default()
    }

    fn check_binding(input: &str, expected: &str) {
        let result = parser().parse_binding(input, "location", &config());
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(unparse(&result.ast), expected);
    }

    fn check_action(input: &str, expected: &str) {
        let result = parser().parse_action(input, "location", &config());
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        assert_eq!(unparse(&result.ast), expected);
    }

    fn binding_errors(input: &str) -> Vec<String> {
        parser()
            .parse_binding(input, "location", &config())
            .errors
            .into_iter()
            .map(|e| e.message)
            .collect()
    }

    #[test]
    fn should_parse_operators_with_precedence() {
        check_binding("1 + 2 * 3", "1 + 2 * 3");
        check_binding("-a", "0 - a");
        check_binding("!a && b || c", "!a && b || c");
        check_binding("a ? b : c", "a ? b : c");
    }

    #[test]
    fn should_parse_member_access_and_calls() {
        check_binding("a.b.c", "a.b.c");
        check_binding("a?.b", "a?.b");
        check_binding("a?.b()", "a?.b()");
        check_binding("fn()(1)", "fn()(1)");
        check_binding("a[0]", "a[0]");
        check_binding("[1, 2]", "[1, 2]");
        check_binding("{a: 1, 'b': 2}", "{a: 1, b: 2}");
    }

    #[test]
    fn should_parse_pipes_with_arguments() {
        check_binding("a | b:c:d | e", "((a | b:c:d) | e)");
    }

    #[test]
    fn should_parse_chained_actions_and_assignments() {
        check_action("a = 1; b()", "a = 1; b()");
        check_action("a[0] = 2", "a[0] = 2");
    }

    #[test]
    fn should_report_chain_in_binding() {
        assert_eq!(
            binding_errors("a;b"),
            vec!["Parser Error: Binding expression cannot contain chained expression at column 3 in [a;b] in location"]
        );
    }

    #[test]
    fn should_report_assignment_in_binding() {
        assert_eq!(
            binding_errors("a = 1"),
            vec!["Parser Error: Bindings cannot contain assignments at column 5 in [a = 1] in location"]
        );
    }

    #[test]
    fn should_report_pipes_in_actions() {
        let result = parser().parse_action("a | b", "location", &config());
        assert_eq!(
            result.errors[0].message,
            "Parser Error: Cannot have a pipe in an action expression at column 5 in [a | b] in location"
        );
    }

    #[test]
    fn should_report_interpolation_in_binding() {
        assert_eq!(
            binding_errors("{{a}}")[0],
            "Parser Error: Got interpolation ({{}}) where expression was expected at column 0 in [{{a}}] in location"
        );
    }

    #[test]
    fn should_parse_quotes() {
        let result = parser().parse_binding("javascript:alert(1)", "location", &config());
        match result.ast {
            AST::Quote {
                prefix,
                uninterpreted_expression,
                ..
            } => {
                assert_eq!(prefix, "javascript");
                assert_eq!(uninterpreted_expression, "alert(1)");
            }
            other => panic!("expected quote, got {:?}", other),
        }
    }

    #[test]
    fn should_reject_pipes_in_host_bindings() {
        let result = parser().parse_simple_binding("a | b", "location", &config());
        assert_eq!(
            result.errors[0].message,
            "Parser Error: Host binding expression cannot contain pipes in [a | b] in location"
        );
    }

    #[test]
    fn should_parse_interpolations() {
        let result = parser()
            .parse_interpolation("a {{ b }} c {{d}}", "location", &config())
            .unwrap();
        match result.ast {
            AST::Interpolation {
                strings,
                expressions,
                ..
            } => {
                assert_eq!(strings, vec!["a ", " c ", ""]);
                assert_eq!(expressions.len(), 2);
            }
            other => panic!("expected interpolation, got {:?}", other),
        }
        assert!(parser()
            .parse_interpolation("nothing", "location", &config())
            .is_none());
    }

    #[test]
    fn should_report_blank_interpolations() {
        let (_, errors) = parser().split_interpolation("a {{ }} b", "location", &config());
        assert_eq!(
            errors[0].message,
            "Parser Error: Blank expressions are not allowed in interpolated strings at column 2 in [a {{ }} b] in location"
        );
    }

    #[test]
    fn should_strip_comments() {
        check_binding("a // comment", "a");
        check_binding("'a//b'", "\"a//b\"");
    }

    #[test]
    fn should_parse_template_bindings() {
        let result = parser().parse_template_bindings("ngFor let item of items; let i=index", "location");
        let bindings: Vec<_> = result
            .template_bindings
            .iter()
            .map(|b| (b.key.clone(), b.key_is_var, b.name.clone()))
            .collect();
        assert_eq!(
            bindings,
            vec![
                ("ngFor".to_string(), false, None),
                ("item".to_string(), true, Some("$implicit".to_string())),
                ("ngForOf".to_string(), false, None),
                ("i".to_string(), true, Some("index".to_string())),
            ]
        );
        let of = result.template_bindings[2].expression.as_ref().unwrap();
        assert_eq!(of.source, "items");
    }
}
