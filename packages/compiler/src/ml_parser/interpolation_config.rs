//! Interpolation delimiters.

use crate::error::{CompilerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpolationConfig {
    pub start: String,
    pub end: String,
}

impl InterpolationConfig {
    pub fn new(start: &str, end: &str) -> Self {
        InterpolationConfig {
            start: start.to_string(),
            end: end.to_string(),
        }
    }

    /// Config for a component's `interpolation` option, or the default.
    pub fn from_markers(markers: Option<&(String, String)>) -> Self {
        match markers {
            Some((start, end)) => InterpolationConfig::new(start, end),
            None => InterpolationConfig::default(),
        }
    }
}

impl Default for InterpolationConfig {
    fn default() -> Self {
        InterpolationConfig::new("{{", "}}")
    }
}

static INTERPOLATION_BLACKLIST: Lazy<Vec<Regex>> = Lazy::new(|| {
    [r"^\s*$", r"[<>]", r#"^[{}]$"#, r"&(#|[a-z])", r"^//"]
        .iter()
        .map(|pattern| Regex::new(pattern).unwrap())
        .collect()
});

/// Rejects delimiter pairs the HTML lexer could not tell apart from markup.
pub fn assert_interpolation_symbols(identifier: &str, value: &[String]) -> Result<()> {
    if value.len() != 2 {
        return Err(CompilerError::syntax(format!(
            "Expected '{}' to be an array, [start, end].",
            identifier
        )));
    }
    let (start, end) = (&value[0], &value[1]);
    for regexp in INTERPOLATION_BLACKLIST.iter() {
        if regexp.is_match(start) || regexp.is_match(end) {
            return Err(CompilerError::syntax(format!(
                "['{}', '{}'] contains unusable interpolation symbol.",
                start, end
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_markup_delimiters() {
        let ok = vec!["{%".to_string(), "%}".to_string()];
        assert!(assert_interpolation_symbols("interpolation", &ok).is_ok());
        let bad = vec!["<".to_string(), ">".to_string()];
        assert_eq!(
            assert_interpolation_symbols("interpolation", &bad)
                .unwrap_err()
                .to_string(),
            "['<', '>'] contains unusable interpolation symbol."
        );
    }
}
