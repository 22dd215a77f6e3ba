//! ML Parser tree builder
//!
//! Builds the node tree from the token stream, applying the implicit
//! closing and namespace rules of `tags.rs`.

use super::ast::{Attribute, Comment, Element, Expansion, ExpansionCase, Node, Text};
use super::tags::{get_html_tag_definition, get_ns_prefix, merge_ns_and_name};
use super::tokens::{Token, TokenType};
use crate::parse_util::{ParseError, ParseSourceSpan};

#[derive(Debug, Clone)]
pub struct ParseTreeResult {
    pub root_nodes: Vec<Node>,
    pub errors: Vec<ParseError>,
}

pub(crate) struct TreeBuilder {
    tokens: Vec<Token>,
    index: usize,
    root_nodes: Vec<Node>,
    errors: Vec<ParseError>,
    element_stack: Vec<Element>,
}

impl TreeBuilder {
    pub(crate) fn new(tokens: Vec<Token>) -> Self {
        TreeBuilder {
            tokens,
            index: 0,
            root_nodes: Vec::new(),
            errors: Vec::new(),
            element_stack: Vec::new(),
        }
    }

    pub(crate) fn build(mut self) -> ParseTreeResult {
        while self.peek().token_type != TokenType::Eof {
            match self.peek().token_type {
                TokenType::TagOpenStart => {
                    let token = self.advance();
                    self.consume_start_tag(token);
                }
                TokenType::TagClose => {
                    let token = self.advance();
                    self.consume_end_tag(token);
                }
                TokenType::CdataStart => {
                    self.close_void_element();
                    self.advance();
                    let text = self.advance();
                    self.consume_text(text);
                    self.advance_if(TokenType::CdataEnd);
                }
                TokenType::CommentStart => {
                    self.close_void_element();
                    let token = self.advance();
                    self.consume_comment(token);
                }
                TokenType::Text | TokenType::RawText | TokenType::EscapableRawText => {
                    self.close_void_element();
                    let token = self.advance();
                    self.consume_text(token);
                }
                TokenType::ExpansionFormStart => {
                    let token = self.advance();
                    self.consume_expansion(token);
                }
                _ => {
                    self.advance();
                }
            }
        }
        while let Some(element) = self.element_stack.pop() {
            self.add_to_parent(Node::Element(element));
        }
        ParseTreeResult {
            root_nodes: self.root_nodes,
            errors: self.errors,
        }
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
        token
    }

    fn advance_if(&mut self, token_type: TokenType) -> Option<Token> {
        if self.peek().token_type == token_type {
            Some(self.advance())
        } else {
            None
        }
    }

    fn consume_comment(&mut self, token: Token) {
        let text = self.advance_if(TokenType::RawText);
        self.advance_if(TokenType::CommentEnd);
        let value = text.map(|t| t.part(0).trim().to_string());
        self.add_to_parent(Node::Comment(Comment {
            value,
            source_span: token.source_span,
        }));
    }

    fn consume_expansion(&mut self, token: Token) {
        let switch_value = self.advance();
        let type_ = self.advance();
        let mut cases = Vec::new();
        while self.peek().token_type == TokenType::ExpansionCaseValue {
            match self.parse_expansion_case() {
                Some(case) => cases.push(case),
                None => return,
            }
        }
        if self.peek().token_type != TokenType::ExpansionFormEnd {
            let span = self.peek().source_span.clone();
            self.errors
                .push(ParseError::new(span, "Invalid ICU message. Missing '}'."));
            return;
        }
        let source_span = ParseSourceSpan::new(
            token.source_span.start.clone(),
            self.peek().source_span.end.clone(),
        );
        self.add_to_parent(Node::Expansion(Expansion {
            switch_value: switch_value.part(0).to_string(),
            type_: type_.part(0).to_string(),
            cases,
            source_span,
            switch_value_source_span: switch_value.source_span,
        }));
        self.advance();
    }

    fn parse_expansion_case(&mut self) -> Option<ExpansionCase> {
        let value = self.advance();
        if self.peek().token_type != TokenType::ExpansionCaseExpStart {
            let span = self.peek().source_span.clone();
            self.errors
                .push(ParseError::new(span, "Invalid ICU message. Missing '{'."));
            return None;
        }
        let start = self.advance();
        let mut exp = self.collect_expansion_exp_tokens(&start)?;
        let end = self.advance();
        exp.push(Token {
            token_type: TokenType::Eof,
            parts: Vec::new(),
            source_span: end.source_span.clone(),
        });
        let parsed = TreeBuilder::new(exp).build();
        if !parsed.errors.is_empty() {
            self.errors.extend(parsed.errors);
            return None;
        }
        Some(ExpansionCase {
            value: value.part(0).to_string(),
            expression: parsed.root_nodes,
            source_span: ParseSourceSpan::new(
                value.source_span.start.clone(),
                end.source_span.end.clone(),
            ),
            value_source_span: value.source_span,
            exp_source_span: ParseSourceSpan::new(
                start.source_span.start.clone(),
                end.source_span.end.clone(),
            ),
        })
    }

    fn collect_expansion_exp_tokens(&mut self, start: &Token) -> Option<Vec<Token>> {
        let mut exp = Vec::new();
        let mut stack = vec![TokenType::ExpansionCaseExpStart];
        loop {
            let token_type = self.peek().token_type;
            if matches!(
                token_type,
                TokenType::ExpansionFormStart | TokenType::ExpansionCaseExpStart
            ) {
                stack.push(token_type);
            }
            if token_type == TokenType::ExpansionCaseExpEnd {
                if stack.last() == Some(&TokenType::ExpansionCaseExpStart) {
                    stack.pop();
                    if stack.is_empty() {
                        return Some(exp);
                    }
                } else {
                    self.missing_closing_brace(start);
                    return None;
                }
            }
            if token_type == TokenType::ExpansionFormEnd {
                if stack.last() == Some(&TokenType::ExpansionFormStart) {
                    stack.pop();
                } else {
                    self.missing_closing_brace(start);
                    return None;
                }
            }
            if token_type == TokenType::Eof {
                self.missing_closing_brace(start);
                return None;
            }
            exp.push(self.advance());
        }
    }

    fn missing_closing_brace(&mut self, start: &Token) {
        self.errors.push(ParseError::new(
            start.source_span.clone(),
            "Invalid ICU message. Missing '}'.",
        ));
    }

    fn consume_text(&mut self, token: Token) {
        let mut text = token.part(0).to_string();
        if text.starts_with('\n') {
            if let Some(parent) = self.element_stack.last() {
                if parent.children.is_empty()
                    && get_html_tag_definition(&parent.name).ignore_first_lf
                {
                    text.remove(0);
                }
            }
        }
        if !text.is_empty() {
            self.add_to_parent(Node::Text(Text {
                value: text,
                source_span: token.source_span,
            }));
        }
    }

    fn close_void_element(&mut self) {
        let is_void = self
            .element_stack
            .last()
            .map_or(false, |el| get_html_tag_definition(&el.name).is_void);
        if is_void {
            self.pop_top();
        }
    }

    fn consume_start_tag(&mut self, start_tag: Token) {
        let mut attrs = Vec::new();
        while self.peek().token_type == TokenType::AttrName {
            let attr_name = self.advance();
            attrs.push(self.consume_attr(attr_name));
        }
        let full_name = self.element_full_name(start_tag.part(0), start_tag.part(1));
        let mut self_closing = false;
        if self.peek().token_type == TokenType::TagOpenEndVoid {
            self.advance();
            self_closing = true;
            let tag_def = get_html_tag_definition(&full_name);
            if !(tag_def.can_self_close || get_ns_prefix(&full_name).is_some() || tag_def.is_void)
            {
                self.errors.push(ParseError::new(
                    start_tag.source_span.clone(),
                    format!(
                        "Only void and foreign elements can be self closed \"{}\"",
                        start_tag.part(1)
                    ),
                ));
            }
        } else if self.peek().token_type == TokenType::TagOpenEnd {
            self.advance();
        }
        let end = self.peek().source_span.start.clone();
        let span = ParseSourceSpan::new(start_tag.source_span.start.clone(), end);
        let element = Element {
            name: full_name.clone(),
            attrs,
            children: Vec::new(),
            source_span: span.clone(),
            start_source_span: span.clone(),
            end_source_span: None,
        };
        self.push_element(element);
        if self_closing {
            if let Some(top) = self.element_stack.last_mut() {
                top.end_source_span = Some(span);
            }
            self.pop_element(&full_name);
        }
    }

    fn push_element(&mut self, element: Element) {
        let closes_parent = self.element_stack.last().map_or(false, |parent| {
            get_html_tag_definition(&parent.name).is_closed_by_child(&element.name)
        });
        if closes_parent {
            self.pop_top();
        }
        self.element_stack.push(element);
    }

    fn consume_end_tag(&mut self, end_tag: Token) {
        let full_name = self.element_full_name(end_tag.part(0), end_tag.part(1));
        if let Some(parent) = self.element_stack.last_mut() {
            parent.end_source_span = Some(end_tag.source_span.clone());
        }
        if get_html_tag_definition(&full_name).is_void {
            self.errors.push(ParseError::new(
                end_tag.source_span.clone(),
                format!("Void elements do not have end tags \"{}\"", end_tag.part(1)),
            ));
        } else if !self.pop_element(&full_name) {
            self.errors.push(ParseError::new(
                end_tag.source_span.clone(),
                format!("Unexpected closing tag \"{}\"", end_tag.part(1)),
            ));
        }
    }

    /// Closes `full_name` and every implicitly closable element above it.
    fn pop_element(&mut self, full_name: &str) -> bool {
        for index in (0..self.element_stack.len()).rev() {
            let element = &self.element_stack[index];
            if element.name == full_name {
                while self.element_stack.len() > index {
                    self.pop_top();
                }
                return true;
            }
            if !get_html_tag_definition(&element.name).closed_by_parent {
                return false;
            }
        }
        false
    }

    fn pop_top(&mut self) {
        if let Some(element) = self.element_stack.pop() {
            self.add_to_parent(Node::Element(element));
        }
    }

    fn consume_attr(&mut self, attr_name: Token) -> Attribute {
        let name = merge_ns_and_name(Some(attr_name.part(0)), attr_name.part(1));
        let mut end = attr_name.source_span.end.clone();
        let mut value = String::new();
        let mut value_span = None;
        if self.peek().token_type == TokenType::AttrValue {
            let value_token = self.advance();
            value = value_token.part(0).to_string();
            end = value_token.source_span.end.clone();
            value_span = Some(value_token.source_span);
        }
        Attribute {
            name,
            value,
            source_span: ParseSourceSpan::new(attr_name.source_span.start.clone(), end),
            value_span,
        }
    }

    fn element_full_name(&self, prefix: &str, local_name: &str) -> String {
        let prefix = if prefix.is_empty() {
            get_html_tag_definition(local_name)
                .implicit_namespace_prefix
                .clone()
                .or_else(|| {
                    self.element_stack
                        .last()
                        .and_then(|parent| get_ns_prefix(&parent.name))
                })
        } else {
            Some(prefix.to_string())
        };
        merge_ns_and_name(prefix.as_deref(), local_name)
    }

    fn add_to_parent(&mut self, node: Node) {
        match self.element_stack.last_mut() {
            Some(parent) => parent.children.push(node),
            None => self.root_nodes.push(node),
        }
    }
}
