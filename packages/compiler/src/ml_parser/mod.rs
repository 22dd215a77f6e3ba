//! ML (Markup Language) Parser Module
//!
//! Tokenizer, tree builder and tree transforms for template HTML.

pub mod ast;
pub mod html_parser;
pub mod html_whitespaces;
pub mod icu_ast_expander;
pub mod interpolation_config;
pub mod lexer;
pub mod parser;
pub mod tags;
pub mod tokens;

pub use ast::*;
pub use html_parser::{HtmlParser, ParseTreeResult};
pub use interpolation_config::InterpolationConfig;
