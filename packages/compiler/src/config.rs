//! Compiler configuration

use crate::core::ViewEncapsulation;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CompilerConfig {
    /// Encapsulation applied to components that don't set one.
    pub default_encapsulation: ViewEncapsulation,
    /// Emit debug node information in generated views.
    pub gen_debug_info: bool,
    /// Record `ng-reflect-*` attributes when bindings update.
    pub log_binding_update: bool,
    pub use_jit: bool,
    pub preserve_whitespaces: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        CompilerConfig {
            default_encapsulation: ViewEncapsulation::Emulated,
            gen_debug_info: false,
            log_binding_update: false,
            use_jit: true,
            preserve_whitespaces: true,
        }
    }
}

impl CompilerConfig {
    /// Settings used for ahead-of-time compilation.
    pub fn aot() -> Self {
        CompilerConfig {
            use_jit: false,
            ..CompilerConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let config: CompilerConfig =
            serde_json::from_str(r#"{"genDebugInfo": true, "defaultEncapsulation": "None"}"#)
                .unwrap();
        assert!(config.gen_debug_info);
        assert_eq!(config.default_encapsulation, ViewEncapsulation::None);
        assert!(config.use_jit);
    }
}
