//! Element schemas
//!
//! Which elements, properties and events the DOM knows about, and the
//! security context of each bindable property.

pub mod dom_element_schema_registry;
pub mod dom_security_schema;
pub mod element_schema_registry;

pub use dom_element_schema_registry::DomElementSchemaRegistry;
pub use element_schema_registry::{ElementSchemaRegistry, NormalizationResult, ValidationResult};
