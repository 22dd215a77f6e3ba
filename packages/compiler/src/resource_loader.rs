//! Resource loading for external templates and stylesheets.

use crate::error::{CompilerError, Result};
use futures::future::{self, LocalBoxFuture};
use std::cell::RefCell;
use std::collections::HashMap;

/// Fetches the text of a template or stylesheet url.
pub trait ResourceLoader {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String>>;
}

/// Loader backed by a url → content map. Missing urls fail.
#[derive(Default)]
pub struct MapResourceLoader {
    resources: RefCell<HashMap<String, String>>,
}

impl MapResourceLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, url: impl Into<String>, content: impl Into<String>) {
        self.resources.borrow_mut().insert(url.into(), content.into());
    }
}

impl ResourceLoader for MapResourceLoader {
    fn get(&self, url: &str) -> LocalBoxFuture<'static, Result<String>> {
        let result = self
            .resources
            .borrow()
            .get(url)
            .cloned()
            .ok_or_else(|| CompilerError::ResourceLoad {
                url: url.to_string(),
                message: "not found".to_string(),
            });
        Box::pin(future::ready(result))
    }
}
