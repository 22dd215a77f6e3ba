//! Template Parser Module
//!
//! Turns component templates into `TemplateAst`s for the view compiler.

pub mod binding_parser;
pub mod template_ast;
pub mod template_parser;
pub mod template_preparser;

pub use binding_parser::{BindingParser, BoundProperty, BoundPropertyType};
pub use template_ast::*;
pub use template_parser::{TemplateParseResult, TemplateParser};
pub use template_preparser::{preparse_element, PreparsedElement, PreparsedElementType};
