//! Compiler errors
//!
//! One error type for the whole compiler. Template diagnostics keep their
//! individual `ParseError`s so tooling can inspect them after the aggregated
//! message has been produced.

use crate::parse_util::ParseError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CompilerError>;

#[derive(Error, Debug, Clone)]
pub enum CompilerError {
    /// Generic syntax / user error carrying a fully formatted message.
    #[error("{message}")]
    Syntax { message: String },

    /// Expression parser failure.
    #[error("{message}")]
    ParseError { message: String },

    /// Raised by the static reflector while evaluating metadata.
    #[error("{message}")]
    StaticResolution {
        message: String,
        position: Option<(u32, u32)>,
        context: Option<String>,
    },

    #[error("Template parse errors:\n{}", join_errors(.errors))]
    TemplateParse { errors: Vec<ParseError> },

    /// Caller contract violations.
    #[error("{message}")]
    IllegalState { message: String },

    #[error("Can't compile synchronously as {type_name} is still being loaded!")]
    ComponentStillLoading { type_name: String },

    #[error("Failed to load {url}: {message}")]
    ResourceLoad { url: String, message: String },

    #[error("Invalid summary file {path}: {message}")]
    Summary { path: String, message: String },
}

fn join_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl CompilerError {
    pub fn syntax(message: impl Into<String>) -> Self {
        CompilerError::Syntax {
            message: message.into(),
        }
    }

    pub fn illegal_state(message: impl Into<String>) -> Self {
        CompilerError::IllegalState {
            message: message.into(),
        }
    }

    pub fn is_component_still_loading(&self) -> bool {
        matches!(self, CompilerError::ComponentStillLoading { .. })
    }
}

impl From<serde_json::Error> for CompilerError {
    fn from(err: serde_json::Error) -> Self {
        CompilerError::Summary {
            path: String::new(),
            message: err.to_string(),
        }
    }
}

/// Sink for recoverable errors.
///
/// Resolvers constructed with a collector report through it and carry on with
/// a best-effort value; without one they return the error to the caller.
pub trait ErrorCollector {
    fn collect(&self, error: CompilerError, context: Option<&str>);
}

/// Collector that keeps every reported error in order.
#[derive(Default)]
pub struct CollectedErrors {
    errors: std::cell::RefCell<Vec<(CompilerError, Option<String>)>>,
}

impl CollectedErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.borrow().is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.borrow().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.errors
            .borrow()
            .iter()
            .map(|(e, _)| e.to_string())
            .collect()
    }

    pub fn take(&self) -> Vec<(CompilerError, Option<String>)> {
        std::mem::take(&mut *self.errors.borrow_mut())
    }
}

impl ErrorCollector for CollectedErrors {
    fn collect(&self, error: CompilerError, context: Option<&str>) {
        tracing::debug!(error = %error, context = ?context, "collected compiler error");
        self.errors
            .borrow_mut()
            .push((error, context.map(str::to_string)));
    }
}

/// Strict/collecting dispatch shared by the resolvers.
///
/// With no collector the error is returned; with one it is recorded and the
/// caller receives `Ok(None)` to continue with a fallback.
pub fn report<T>(
    collector: Option<&dyn ErrorCollector>,
    error: CompilerError,
    context: Option<&str>,
) -> Result<Option<T>> {
    match collector {
        Some(collector) => {
            collector.collect(error, context);
            Ok(None)
        }
        None => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_report_returns_error() {
        let result: Result<Option<()>> = report(None, CompilerError::syntax("boom"), None);
        assert_eq!(result.unwrap_err().to_string(), "boom");
    }

    #[test]
    fn collecting_report_records_and_continues() {
        let collector = CollectedErrors::new();
        let result: Result<Option<()>> =
            report(Some(&collector), CompilerError::syntax("boom"), Some("A"));
        assert!(result.unwrap().is_none());
        assert_eq!(collector.messages(), vec!["boom".to_string()]);
        let taken = collector.take();
        assert_eq!(taken[0].1.as_deref(), Some("A"));
        assert!(collector.is_empty());
    }

    #[test]
    fn still_loading_message() {
        let err = CompilerError::ComponentStillLoading {
            type_name: "MyComp".to_string(),
        };
        assert!(err.is_component_still_loading());
        assert_eq!(
            err.to_string(),
            "Can't compile synchronously as MyComp is still being loaded!"
        );
    }
}
