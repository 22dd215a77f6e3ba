//! Artifacts a compiled view refers to before they exist.
//!
//! The view compiler emits placeholders for them; the AOT and JIT compilers
//! patch each placeholder once they know where the artifact lives.

use crate::aot::static_symbol::StaticSymbol;
use crate::output::output_ast::Placeholder;

/// The component view class of a child component.
#[derive(Debug, Clone)]
pub struct ViewClassDependency {
    pub comp: StaticSymbol,
    pub name: String,
    pub placeholder: Placeholder,
}

/// The factory of an entry component.
#[derive(Debug, Clone)]
pub struct ComponentFactoryDependency {
    pub comp: StaticSymbol,
    pub placeholder: Placeholder,
}

/// The wrapper class of a directive used in the template.
#[derive(Debug, Clone)]
pub struct DirectiveWrapperDependency {
    pub dir: StaticSymbol,
    pub name: String,
    pub placeholder: Placeholder,
}

#[derive(Debug, Clone)]
pub enum ViewCompileDependency {
    ViewClass(ViewClassDependency),
    ComponentFactory(ComponentFactoryDependency),
    DirectiveWrapper(DirectiveWrapperDependency),
}

impl ViewCompileDependency {
    pub fn placeholder(&self) -> &Placeholder {
        match self {
            ViewCompileDependency::ViewClass(dep) => &dep.placeholder,
            ViewCompileDependency::ComponentFactory(dep) => &dep.placeholder,
            ViewCompileDependency::DirectiveWrapper(dep) => &dep.placeholder,
        }
    }
}
