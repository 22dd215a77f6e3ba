//! Element Schema Registry

use crate::core::{SchemaMetadata, SecurityContext};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationResult {
    pub error: bool,
    pub msg: Option<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self::default()
    }

    pub fn error(msg: impl Into<String>) -> Self {
        ValidationResult {
            error: true,
            msg: Some(msg.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizationResult {
    pub error: String,
    pub value: String,
}

/// Knowledge about the elements a template may contain.
///
/// The template parser and the animation compiler only see the DOM through
/// this trait so tests and other renderers can substitute their own schema.
pub trait ElementSchemaRegistry {
    fn has_property(&self, tag_name: &str, prop_name: &str, schema_metas: &[SchemaMetadata])
        -> bool;

    fn has_element(&self, tag_name: &str, schema_metas: &[SchemaMetadata]) -> bool;

    fn security_context(&self, element_name: &str, prop_name: &str, is_attribute: bool)
        -> SecurityContext;

    fn all_known_element_names(&self) -> Vec<String>;

    /// Property name an attribute-style binding maps to (`class` -> `className`).
    fn get_mapped_prop_name(&self, prop_name: &str) -> String;

    fn get_default_component_element_name(&self) -> String;

    fn validate_property(&self, name: &str) -> ValidationResult;

    fn validate_attribute(&self, name: &str) -> ValidationResult;

    fn normalize_animation_style_property(&self, prop_name: &str) -> String;

    fn normalize_animation_style_value(
        &self,
        camel_case_prop: &str,
        user_provided_prop: &str,
        val: &str,
    ) -> NormalizationResult;
}
