//! Style Compiler
//!
//! Turns the styles of a component into a `styles` array declaration. With
//! emulated encapsulation every style is shimmed first. Each `@import`ed
//! stylesheet becomes a dependency whose placeholder the caller points at
//! the stylesheet's own compiled module.

use crate::compile_metadata::{
    identifier_module_url, identifier_name, CompileDirectiveMetadata, CompileStylesheetMetadata,
};
use crate::core::ViewEncapsulation;
use crate::error::{CompilerError, Result};
use crate::output::output_ast::{self as o, Placeholder, Statement};
use crate::shadow_css::ShadowCss;

pub const COMPONENT_VARIABLE: &str = "%COMP%";
pub const HOST_ATTR: &str = "_nghost-%COMP%";
pub const CONTENT_ATTR: &str = "_ngcontent-%COMP%";

#[derive(Debug, Clone)]
pub struct StylesCompileDependency {
    /// Url of the imported stylesheet.
    pub module_url: String,
    pub is_shimmed: bool,
    /// Stands for the `styles` export of the imported stylesheet.
    pub set_value: Placeholder,
}

#[derive(Debug, Clone)]
pub struct CompiledStylesheet {
    pub statements: Vec<Statement>,
    pub styles_var: String,
    pub dependencies: Vec<StylesCompileDependency>,
    pub is_shimmed: bool,
    pub meta: CompileStylesheetMetadata,
}

#[derive(Debug, Clone)]
pub struct StylesCompileResult {
    pub component_stylesheet: CompiledStylesheet,
    pub external_stylesheets: Vec<CompiledStylesheet>,
}

#[derive(Debug, Default)]
pub struct StyleCompiler {
    shadow_css: ShadowCss,
}

impl StyleCompiler {
    pub fn new() -> Self {
        StyleCompiler::default()
    }

    pub fn compile_component(&self, comp: &CompileDirectiveMetadata) -> Result<StylesCompileResult> {
        let template = comp.template.as_ref().ok_or_else(|| {
            CompilerError::illegal_state(format!(
                "Illegal state: {} is not a component",
                identifier_name(comp.reference())
            ))
        })?;
        let shim = template.encapsulation == Some(ViewEncapsulation::Emulated);
        let component_meta = CompileStylesheetMetadata {
            module_url: Some(identifier_module_url(comp.reference()).to_string()),
            styles: template.styles.clone(),
            style_urls: template.style_urls.clone(),
        };
        let component_stylesheet = self.compile_styles(Some(comp), component_meta, shim);
        let external_stylesheets = template
            .external_stylesheets
            .iter()
            .map(|stylesheet| self.compile_styles(None, stylesheet.clone(), shim))
            .collect();
        Ok(StylesCompileResult {
            component_stylesheet,
            external_stylesheets,
        })
    }

    fn compile_styles(
        &self,
        comp: Option<&CompileDirectiveMetadata>,
        stylesheet: CompileStylesheetMetadata,
        shim: bool,
    ) -> CompiledStylesheet {
        let mut style_expressions: Vec<o::Expression> = stylesheet
            .styles
            .iter()
            .map(|style| o::literal(self.shim_if_needed(style, shim)))
            .collect();
        let mut dependencies = Vec::with_capacity(stylesheet.style_urls.len());
        for style_url in &stylesheet.style_urls {
            let set_value = Placeholder::new(styles_var_name(None));
            style_expressions.push(o::placeholder_expr(&set_value));
            dependencies.push(StylesCompileDependency {
                module_url: style_url.clone(),
                is_shimmed: shim,
                set_value,
            });
        }
        // Entries are strings or nested `styles` arrays of imports.
        let styles_var = styles_var_name(comp);
        let statement = o::literal_arr(style_expressions).to_decl_stmt(styles_var.clone(), true);
        CompiledStylesheet {
            statements: vec![statement],
            styles_var,
            dependencies,
            is_shimmed: shim,
            meta: stylesheet,
        }
    }

    fn shim_if_needed(&self, style: &str, shim: bool) -> String {
        if shim {
            self.shadow_css.shim_css_text(style, CONTENT_ATTR, HOST_ATTR)
        } else {
            style.to_string()
        }
    }
}

fn styles_var_name(comp: Option<&CompileDirectiveMetadata>) -> String {
    match comp {
        Some(comp) => format!("styles_{}", identifier_name(comp.reference())),
        None => "styles".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_metadata::{CompileTemplateMetadata, CompileTypeMetadata, DirectiveMetadataInput};
    use crate::testing::MockReflector;
    use pretty_assertions::assert_eq;

    fn component(encapsulation: ViewEncapsulation, template: CompileTemplateMetadata) -> CompileDirectiveMetadata {
        let reflector = MockReflector::new();
        CompileDirectiveMetadata::create(
            CompileTypeMetadata::new(reflector.symbol("/app/comp.ts", "MyComp")),
            DirectiveMetadataInput {
                is_component: true,
                selector: Some("my-comp".to_string()),
                template: Some(CompileTemplateMetadata {
                    encapsulation: Some(encapsulation),
                    ..template
                }),
                ..Default::default()
            },
        )
    }

    fn literal_strings(stmt: &Statement) -> Vec<String> {
        match stmt {
            Statement::DeclareVar(decl) => match &decl.value {
                o::Expression::LiteralArray(entries) => entries
                    .iter()
                    .filter_map(|entry| match entry {
                        o::Expression::Literal(o::LiteralValue::String(s)) => Some(s.clone()),
                        _ => None,
                    })
                    .collect(),
                other => panic!("unexpected value {:?}", other),
            },
            other => panic!("unexpected statement {:?}", other),
        }
    }

    #[test]
    fn should_shim_styles_with_emulated_encapsulation() {
        let comp = component(
            ViewEncapsulation::Emulated,
            CompileTemplateMetadata {
                styles: vec!["div {color: red;}".to_string()],
                ..Default::default()
            },
        );
        let result = StyleCompiler::new().compile_component(&comp).unwrap();
        let stylesheet = &result.component_stylesheet;
        assert_eq!(stylesheet.styles_var, "styles_MyComp");
        assert!(stylesheet.is_shimmed);
        assert_eq!(
            literal_strings(&stylesheet.statements[0]),
            vec!["div[_ngcontent-%COMP%] {color: red;}"]
        );
    }

    #[test]
    fn should_keep_styles_without_emulation() {
        let comp = component(
            ViewEncapsulation::None,
            CompileTemplateMetadata {
                styles: vec!["div {color: red;}".to_string()],
                ..Default::default()
            },
        );
        let result = StyleCompiler::new().compile_component(&comp).unwrap();
        assert!(!result.component_stylesheet.is_shimmed);
        assert_eq!(
            literal_strings(&result.component_stylesheet.statements[0]),
            vec!["div {color: red;}"]
        );
    }

    #[test]
    fn should_compile_external_stylesheets_with_dependencies() {
        let comp = component(
            ViewEncapsulation::Emulated,
            CompileTemplateMetadata {
                style_urls: vec!["/app/comp.css".to_string()],
                external_stylesheets: vec![CompileStylesheetMetadata {
                    module_url: Some("/app/comp.css".to_string()),
                    styles: vec!["span {}".to_string()],
                    style_urls: vec!["/app/base.css".to_string()],
                }],
                ..Default::default()
            },
        );
        let result = StyleCompiler::new().compile_component(&comp).unwrap();
        let component_deps = &result.component_stylesheet.dependencies;
        assert_eq!(component_deps.len(), 1);
        assert_eq!(component_deps[0].module_url, "/app/comp.css");
        assert!(component_deps[0].is_shimmed);

        assert_eq!(result.external_stylesheets.len(), 1);
        let external = &result.external_stylesheets[0];
        assert_eq!(external.styles_var, "styles");
        assert_eq!(external.meta.module_url.as_deref(), Some("/app/comp.css"));
        assert_eq!(literal_strings(&external.statements[0]), vec!["span[_ngcontent-%COMP%] {}"]);
        assert_eq!(external.dependencies[0].module_url, "/app/base.css");
    }
}
