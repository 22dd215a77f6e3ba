//! Options of the ahead-of-time pipeline.

use crate::config::CompilerConfig;
use regex::Regex;

#[derive(Debug, Clone, Default)]
pub struct AotCompilerOptions {
    /// Emit debug information into generated views.
    pub debug: bool,
    /// Provided as `LOCALE_ID` by every compiled module injector.
    pub locale: Option<String>,
    /// Provided as `TRANSLATIONS_FORMAT` by every compiled module injector.
    pub i18n_format: Option<String>,
    /// Files the program compiles; everything else is treated as a library.
    pub include_file_pattern: Option<Regex>,
    pub exclude_file_pattern: Option<Regex>,
    /// Only write summaries; no factory or style files.
    pub skip_template_codegen: bool,
    /// Template and view settings. `use_jit` is ignored.
    pub config: Option<CompilerConfig>,
}

impl AotCompilerOptions {
    /// Whether `file_name` belongs to the compiled program.
    pub fn filter_file(&self, file_name: &str) -> bool {
        let included = self
            .include_file_pattern
            .as_ref()
            .map_or(true, |pattern| pattern.is_match(file_name));
        let excluded = self
            .exclude_file_pattern
            .as_ref()
            .map_or(false, |pattern| pattern.is_match(file_name));
        included && !excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_accept_everything_without_patterns() {
        assert!(AotCompilerOptions::default().filter_file("/any/file.ts"));
    }

    #[test]
    fn should_apply_include_and_exclude_patterns() {
        let options = AotCompilerOptions {
            include_file_pattern: Some(Regex::new(r"^/app/").unwrap()),
            exclude_file_pattern: Some(Regex::new(r"\.d\.ts$").unwrap()),
            ..Default::default()
        };
        assert!(options.filter_file("/app/a.ts"));
        assert!(!options.filter_file("/app/a.d.ts"));
        assert!(!options.filter_file("/lib/a.ts"));
    }
}
