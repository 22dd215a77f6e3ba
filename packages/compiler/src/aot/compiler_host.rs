//! Host services for ahead-of-time compilation.

use super::static_reflector::StaticReflectorHost;
use crate::resource_loader::ResourceLoader;
use crate::url_resolver::relative_module_name;

/// Everything the AOT pipeline asks of its environment: metadata and module
/// resolution (through `StaticReflectorHost`), summaries of library files,
/// external resources, and import naming for generated code.
pub trait AotCompilerHost: StaticReflectorHost + ResourceLoader {
    /// Contents of a `.ngsummary.json` file, if present.
    fn load_summary(&self, file_path: &str) -> Option<String>;

    /// True for files compiled in this program; false for libraries, whose
    /// metadata comes from summaries.
    fn is_source_file(&self, file_path: &str) -> bool {
        !file_path.ends_with(".d.ts")
    }

    /// Module specifier used by generated code in `containing_file` to import
    /// `imported_file`.
    fn file_name_to_module_name(&self, imported_file: &str, containing_file: &str) -> String {
        if let Some(index) = imported_file.find("/node_modules/") {
            let package_path = &imported_file[index + "/node_modules/".len()..];
            return crate::url_resolver::strip_module_extension(package_path)
                .trim_end_matches("/index")
                .to_string();
        }
        if !imported_file.starts_with('/') {
            return imported_file.to_string();
        }
        relative_module_name(containing_file, imported_file)
    }

    /// Maps a source path to the path generated artifacts are written under.
    fn get_output_file_name(&self, file_path: &str) -> String {
        file_path.to_string()
    }
}
