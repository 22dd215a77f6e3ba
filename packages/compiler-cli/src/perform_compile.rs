//! Perform Compile
//!
//! Config parsing and the compilation entry point.

use crate::compiler_host::{source_file_name, NodeCompilerHost, METADATA_SUFFIX};
use angular_view_compiler::aot::{create_aot_compiler, AotCompilerOptions, GeneratedFile};
use angular_view_compiler::config::CompilerConfig;
use angular_view_compiler::core::ViewEncapsulation;
use angular_view_compiler::error::{CollectedErrors, CompilerError, ErrorCollector};
use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// The `angularCompilerOptions` section of the project file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NgcOptions {
    pub gen_dir: Option<String>,
    pub base_path: Option<String>,
    pub skip_template_codegen: bool,
    pub debug: bool,
    /// Not applied; only accepted so existing project files parse.
    pub locale: Option<String>,
    pub default_encapsulation: Option<ViewEncapsulation>,
    pub preserve_whitespaces: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProjectFile {
    files: Vec<String>,
    include: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    #[serde(rename = "angularCompilerOptions")]
    angular_compiler_options: NgcOptions,
}

/// Parsed configuration from the project file.
#[derive(Debug, Clone)]
pub struct ParsedConfiguration {
    /// Path to the project file.
    pub project: PathBuf,
    /// Root source file names (`.ts` paths of the discovered metadata files).
    pub root_names: Vec<String>,
    pub base_path: PathBuf,
    pub gen_dir: PathBuf,
    pub options: NgcOptions,
}

impl ParsedConfiguration {
    pub fn aot_options(&self) -> AotCompilerOptions {
        let defaults = CompilerConfig::aot();
        AotCompilerOptions {
            debug: self.options.debug,
            skip_template_codegen: self.options.skip_template_codegen,
            config: Some(CompilerConfig {
                default_encapsulation: self
                    .options
                    .default_encapsulation
                    .unwrap_or(defaults.default_encapsulation),
                preserve_whitespaces: self
                    .options
                    .preserve_whitespaces
                    .unwrap_or(defaults.preserve_whitespaces),
                ..defaults
            }),
            ..AotCompilerOptions::default()
        }
    }

    /// Where a generated file is written: its path relative to the base
    /// path, placed under the gen dir.
    pub fn emit_path(&self, gen_file_url: &str) -> PathBuf {
        let gen_file = Path::new(gen_file_url);
        match gen_file.strip_prefix(&self.base_path) {
            Ok(relative) => self.gen_dir.join(relative),
            Err(_) => gen_file.to_path_buf(),
        }
    }
}

/// Read configuration from project file. `project` is the file itself or
/// a directory containing `tsconfig.json`.
pub fn read_configuration(project: &Path) -> Result<ParsedConfiguration> {
    let project_file = if project.is_dir() {
        project.join("tsconfig.json")
    } else {
        project.to_path_buf()
    };
    let content = fs::read_to_string(&project_file)
        .with_context(|| format!("Cannot read project file {}", project_file.display()))?;
    let parsed: ProjectFile = serde_json::from_str(&strip_json_comments(&content))
        .with_context(|| format!("Failed to parse {}", project_file.display()))?;

    let project_dir = project_file
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    let project_dir = fs::canonicalize(&project_dir).unwrap_or(project_dir);
    let options = parsed.angular_compiler_options;
    let base_path = options
        .base_path
        .as_deref()
        .map(|p| project_dir.join(p))
        .unwrap_or_else(|| project_dir.clone());
    let gen_dir = options
        .gen_dir
        .as_deref()
        .map(|p| project_dir.join(p))
        .unwrap_or_else(|| base_path.clone());

    let metadata_files = if parsed.files.is_empty() {
        let include = parsed
            .include
            .unwrap_or_else(|| vec![format!("**/*{}", METADATA_SUFFIX)]);
        let exclude = parsed
            .exclude
            .unwrap_or_else(|| vec!["**/node_modules/**".to_string()]);
        discover_files(&project_dir, &include, &exclude)?
    } else {
        parsed
            .files
            .iter()
            .map(|file| project_dir.join(file).to_string_lossy().to_string())
            .collect()
    };
    let root_names: Vec<String> = metadata_files
        .iter()
        .filter_map(|file| source_file_name(file))
        .collect();
    tracing::info!(files = root_names.len(), project = %project_file.display(), "read configuration");

    Ok(ParsedConfiguration {
        project: project_file,
        root_names,
        base_path,
        gen_dir,
        options,
    })
}

/// Strip JSON comments (whole-line `//` and `/*` comments)
fn strip_json_comments(input: &str) -> String {
    let mut result = String::new();
    for line in input.lines() {
        let trimmed = line.trim();
        if !trimmed.starts_with("//") && !trimmed.starts_with("/*") && !trimmed.starts_with('*') {
            result.push_str(line);
            result.push('\n');
        }
    }
    result
}

/// Discover files matching include patterns and excluding exclude patterns
fn discover_files(base_dir: &Path, include: &[String], exclude: &[String]) -> Result<Vec<String>> {
    let exclude_patterns = exclude
        .iter()
        .map(|excl| glob::Pattern::new(&base_dir.join(excl).to_string_lossy()))
        .collect::<std::result::Result<Vec<_>, _>>()
        .context("Invalid exclude pattern")?;
    let mut files = Vec::new();
    for pattern in include {
        let full_pattern = base_dir.join(pattern);
        let paths = glob::glob(&full_pattern.to_string_lossy())
            .with_context(|| format!("Invalid include pattern '{}'", pattern))?;
        for path in paths.flatten() {
            let path_str = path.to_string_lossy().to_string();
            if !path_str.ends_with(METADATA_SUFFIX) || !path.is_file() {
                continue;
            }
            if exclude_patterns.iter().any(|p| p.matches(&path_str)) {
                continue;
            }
            if !files.contains(&path_str) {
                files.push(path_str);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Compilation result.
#[derive(Debug)]
pub struct CompilationResult {
    /// Paths of the files written.
    pub emitted: Vec<PathBuf>,
}

/// Compiles the program and writes every generated file under the gen dir.
pub fn perform_compilation(config: &ParsedConfiguration) -> Result<CompilationResult> {
    let host = Rc::new(NodeCompilerHost::new(&config.base_path));
    let errors = Rc::new(CollectedErrors::new());
    let collector: Rc<dyn ErrorCollector> = errors.clone();
    let compiler = create_aot_compiler(host, config.aot_options(), Some(collector)).map_err(compiler_error)?;
    let generated = futures::executor::block_on(compiler.compile_all_async(&config.root_names));
    if !errors.is_empty() {
        bail!("{}", errors.messages().join("\n"));
    }
    let generated = generated.map_err(compiler_error)?;
    let emitted = write_generated_files(config, &generated)?;
    Ok(CompilationResult { emitted })
}

/// Compiler errors hold source spans that are not `Send`; keep their text.
fn compiler_error(err: CompilerError) -> anyhow::Error {
    anyhow!("{}", err)
}

fn write_generated_files(config: &ParsedConfiguration, generated: &[GeneratedFile]) -> Result<Vec<PathBuf>> {
    let mut emitted = Vec::with_capacity(generated.len());
    for file in generated {
        let path = config.emit_path(&file.gen_file_url);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| format!("Cannot create {}", parent.display()))?;
        }
        fs::write(&path, &file.source).with_context(|| format!("Cannot write {}", path.display()))?;
        tracing::debug!(path = %path.display(), "wrote generated file");
        emitted.push(path);
    }
    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_discover_metadata_files_and_read_options() {
        let dir = tempfile::tempdir().unwrap();
        let root = fs::canonicalize(dir.path()).unwrap();
        fs::create_dir_all(root.join("src")).unwrap();
        fs::create_dir_all(root.join("node_modules/lib")).unwrap();
        fs::write(root.join("src/app.metadata.json"), "{}").unwrap();
        fs::write(root.join("src/app.ts"), "").unwrap();
        fs::write(root.join("node_modules/lib/index.metadata.json"), "{}").unwrap();
        fs::write(
            root.join("tsconfig.json"),
            r#"{
  // comment
  "include": ["**/*.metadata.json"],
  "angularCompilerOptions": {"genDir": "gen", "skipTemplateCodegen": true}
}"#,
        )
        .unwrap();

        let config = read_configuration(&root).unwrap();
        assert_eq!(
            config.root_names,
            vec![root.join("src/app.ts").to_string_lossy().to_string()]
        );
        assert_eq!(config.gen_dir, root.join("gen"));
        assert!(config.aot_options().skip_template_codegen);
        assert_eq!(
            config.emit_path(&root.join("src/app.ngsummary.json").to_string_lossy()),
            root.join("gen/src/app.ngsummary.json")
        );
    }

    #[test]
    fn should_fail_for_missing_project_files() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_configuration(&dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().starts_with("Cannot read project file"));
    }
}
