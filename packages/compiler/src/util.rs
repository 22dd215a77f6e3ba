//! Utility Functions

use crate::error::Result;
use futures::future::LocalBoxFuture;
use once_cell::sync::Lazy;
use regex::Regex;

static DASH_CASE_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"-+([a-z0-9])").unwrap());
static CAMEL_CASE_REGEXP: Lazy<Regex> = Lazy::new(|| Regex::new(r"([A-Z])").unwrap());

pub fn dash_case_to_camel_case(input: &str) -> String {
    DASH_CASE_REGEXP
        .replace_all(input, |caps: &regex::Captures| caps[1].to_uppercase())
        .into_owned()
}

pub fn camel_case_to_dash_case(input: &str) -> String {
    CAMEL_CASE_REGEXP
        .replace_all(input, |caps: &regex::Captures| {
            format!("-{}", caps[1].to_lowercase())
        })
        .into_owned()
}

/// Splits at the first `:`; both halves trimmed. Falls back to `defaults`.
pub fn split_at_colon<'a>(input: &'a str, defaults: (&'a str, &'a str)) -> (String, String) {
    split_at(input, ':', defaults)
}

pub fn split_at_period<'a>(input: &'a str, defaults: (&'a str, &'a str)) -> (String, String) {
    split_at(input, '.', defaults)
}

fn split_at<'a>(input: &'a str, character: char, defaults: (&'a str, &'a str)) -> (String, String) {
    match input.find(character) {
        Some(idx) => (
            input[..idx].trim().to_string(),
            input[idx + 1..].trim().to_string(),
        ),
        None => (defaults.0.to_string(), defaults.1.to_string()),
    }
}

/// Replaces every non-word character with `_`.
pub fn sanitize_identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Either an already computed value or a single-resolution future.
///
/// Synchronous callers use `sync`, which is only present once the value is
/// known; asynchronous callers always await `into_future`.
pub struct SyncAsync<T: 'static> {
    pub sync: Option<T>,
    pub pending: Option<LocalBoxFuture<'static, Result<T>>>,
}

impl<T: Clone + 'static> SyncAsync<T> {
    pub fn ready(value: T) -> Self {
        SyncAsync {
            sync: Some(value),
            pending: None,
        }
    }

    pub fn pending(future: LocalBoxFuture<'static, Result<T>>) -> Self {
        SyncAsync {
            sync: None,
            pending: Some(future),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.sync.is_some()
    }

    pub async fn into_future(self) -> Result<T> {
        match (self.sync, self.pending) {
            (Some(value), _) => Ok(value),
            (None, Some(future)) => future.await,
            (None, None) => Err(crate::error::CompilerError::illegal_state(
                "Illegal state: SyncAsync without a value",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_case() {
        assert_eq!(dash_case_to_camel_case("inner-html"), "innerHtml");
        assert_eq!(camel_case_to_dash_case("innerHtml"), "inner-html");
    }

    #[test]
    fn splits_with_defaults() {
        assert_eq!(
            split_at_colon("dirProp: elProp", ("", "")),
            ("dirProp".to_string(), "elProp".to_string())
        );
        assert_eq!(
            split_at_colon("prop", ("prop", "prop")),
            ("prop".to_string(), "prop".to_string())
        );
        assert_eq!(
            split_at_period("@trigger.done", ("", "")),
            ("@trigger".to_string(), "done".to_string())
        );
    }

    #[test]
    fn sync_async_ready_resolves_immediately() {
        let value = futures::executor::block_on(SyncAsync::ready(3).into_future()).unwrap();
        assert_eq!(value, 3);
    }
}
