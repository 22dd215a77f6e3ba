//! Template AST
//!
//! Output of the template parser. Every element carries the directives that
//! matched it, the providers those directives need, and the bindings split by
//! target (DOM property, directive input, event, reference, variable).

use crate::compile_metadata::{
    CompileDirectiveSummary, CompileProviderMetadata, CompileTokenMetadata,
};
use crate::core::{LifecycleHooks, SecurityContext};
use crate::expression_parser::ASTWithSource;
use crate::parse_util::ParseSourceSpan;

#[derive(Debug, Clone, PartialEq)]
pub enum TemplateAst {
    Text(TextAst),
    BoundText(BoundTextAst),
    Attr(AttrAst),
    Element(ElementAst),
    EmbeddedTemplate(EmbeddedTemplateAst),
    NgContent(NgContentAst),
}

impl TemplateAst {
    pub fn source_span(&self) -> &ParseSourceSpan {
        match self {
            TemplateAst::Text(ast) => &ast.source_span,
            TemplateAst::BoundText(ast) => &ast.source_span,
            TemplateAst::Attr(ast) => &ast.source_span,
            TemplateAst::Element(ast) => &ast.source_span,
            TemplateAst::EmbeddedTemplate(ast) => &ast.source_span,
            TemplateAst::NgContent(ast) => &ast.source_span,
        }
    }

    /// Slot of the parent component's `<ng-content>` this node projects into.
    pub fn ng_content_index(&self) -> Option<usize> {
        match self {
            TemplateAst::Text(ast) => ast.ng_content_index,
            TemplateAst::BoundText(ast) => ast.ng_content_index,
            TemplateAst::Element(ast) => ast.ng_content_index,
            TemplateAst::EmbeddedTemplate(ast) => ast.ng_content_index,
            TemplateAst::NgContent(ast) => ast.ng_content_index,
            TemplateAst::Attr(_) => None,
        }
    }

    pub fn children(&self) -> &[TemplateAst] {
        match self {
            TemplateAst::Element(ast) => &ast.children,
            TemplateAst::EmbeddedTemplate(ast) => &ast.children,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextAst {
    pub value: String,
    pub ng_content_index: Option<usize>,
    pub source_span: ParseSourceSpan,
}

/// Text containing interpolations.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundTextAst {
    pub value: ASTWithSource,
    pub ng_content_index: Option<usize>,
    pub source_span: ParseSourceSpan,
}

/// A plain attribute with a static value.
#[derive(Debug, Clone, PartialEq)]
pub struct AttrAst {
    pub name: String,
    pub value: String,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyBindingType {
    /// `[prop]`
    Property,
    /// `[attr.name]`
    Attribute,
    /// `[class.name]`
    Class,
    /// `[style.name]`, with an optional unit suffix.
    Style,
    /// `[@trigger]`
    Animation,
}

/// A binding to a property of the element itself.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundElementPropertyAst {
    pub name: String,
    pub type_: PropertyBindingType,
    pub security_context: SecurityContext,
    /// Set when the element name alone does not decide the security context
    /// (e.g. the element is matched by a selector covering several tags).
    pub needs_runtime_security_context: bool,
    pub value: ASTWithSource,
    pub unit: Option<String>,
    pub source_span: ParseSourceSpan,
}

impl BoundElementPropertyAst {
    pub fn is_animation(&self) -> bool {
        self.type_ == PropertyBindingType::Animation
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoundEventAst {
    pub name: String,
    /// `window`, `document` or `body` for global listeners.
    pub target: Option<String>,
    /// `start` or `done` for animation callbacks.
    pub phase: Option<String>,
    pub handler: ASTWithSource,
    pub source_span: ParseSourceSpan,
}

impl BoundEventAst {
    pub fn calc_full_name(name: &str, target: Option<&str>, phase: Option<&str>) -> String {
        match (target, phase) {
            (Some(target), _) => format!("{}:{}", target, name),
            (None, Some(phase)) => format!("@{}.{}", name, phase),
            (None, None) => name.to_string(),
        }
    }

    pub fn full_name(&self) -> String {
        Self::calc_full_name(&self.name, self.target.as_deref(), self.phase.as_deref())
    }

    pub fn is_animation(&self) -> bool {
        self.phase.is_some()
    }
}

/// `#name` / `ref-name`. `value` is the token the reference resolves to;
/// `None` refers to the element itself.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceAst {
    pub name: String,
    pub value: Option<CompileTokenMetadata>,
    pub source_span: ParseSourceSpan,
}

/// `let-name="value"` on a template.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableAst {
    pub name: String,
    pub value: String,
    pub source_span: ParseSourceSpan,
}

/// A binding to an input of a directive.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundDirectivePropertyAst {
    pub directive_name: String,
    pub template_name: String,
    pub value: ASTWithSource,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectiveAst {
    pub directive: CompileDirectiveSummary,
    pub inputs: Vec<BoundDirectivePropertyAst>,
    pub host_properties: Vec<BoundElementPropertyAst>,
    pub host_events: Vec<BoundEventAst>,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderAstType {
    /// `providers` of a directive/component, visible to children.
    PublicService,
    /// `viewProviders` of a component, visible to its view only.
    PrivateService,
    /// The component instance itself.
    Component,
    /// A directive instance.
    Directive,
    /// ElementRef, TemplateRef, ViewContainerRef and friends.
    Builtin,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderAst {
    pub token: CompileTokenMetadata,
    pub multi_provider: bool,
    pub eager: bool,
    pub providers: Vec<CompileProviderMetadata>,
    pub provider_type: ProviderAstType,
    pub lifecycle_hooks: LifecycleHooks,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementAst {
    pub name: String,
    pub attrs: Vec<AttrAst>,
    pub inputs: Vec<BoundElementPropertyAst>,
    pub outputs: Vec<BoundEventAst>,
    pub references: Vec<ReferenceAst>,
    pub directives: Vec<DirectiveAst>,
    pub providers: Vec<ProviderAst>,
    pub has_view_container: bool,
    pub children: Vec<TemplateAst>,
    pub ng_content_index: Option<usize>,
    pub source_span: ParseSourceSpan,
    pub end_source_span: Option<ParseSourceSpan>,
}

impl ElementAst {
    pub fn component(&self) -> Option<&CompileDirectiveSummary> {
        self.directives
            .iter()
            .map(|d| &d.directive)
            .find(|d| d.is_component)
    }
}

/// `<template>` or the desugared form of a `*directive` attribute.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedTemplateAst {
    pub attrs: Vec<AttrAst>,
    pub outputs: Vec<BoundEventAst>,
    pub references: Vec<ReferenceAst>,
    pub variables: Vec<VariableAst>,
    pub directives: Vec<DirectiveAst>,
    pub providers: Vec<ProviderAst>,
    pub has_view_container: bool,
    pub children: Vec<TemplateAst>,
    pub ng_content_index: Option<usize>,
    pub source_span: ParseSourceSpan,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NgContentAst {
    /// Position among the `<ng-content>` elements of the template.
    pub index: usize,
    pub ng_content_index: Option<usize>,
    pub source_span: ParseSourceSpan,
}

/// Calls `f` on every node of `asts`, parents before children.
pub fn template_visit_all(asts: &[TemplateAst], f: &mut dyn FnMut(&TemplateAst)) {
    for ast in asts {
        f(ast);
        template_visit_all(ast.children(), f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_compute_event_full_names() {
        assert_eq!(BoundEventAst::calc_full_name("click", None, None), "click");
        assert_eq!(
            BoundEventAst::calc_full_name("resize", Some("window"), None),
            "window:resize"
        );
        assert_eq!(
            BoundEventAst::calc_full_name("fade", None, Some("done")),
            "@fade.done"
        );
    }
}
