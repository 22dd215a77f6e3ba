//! Helpers shared by the view, directive wrapper and module compilers.

pub mod binding_util;
pub mod expression_converter;
pub mod identifier_util;
pub mod render_util;
