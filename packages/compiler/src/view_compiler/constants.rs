//! Names shared by every generated view class.

use crate::output::output_ast::{self as o, Expression, FnParam};

pub struct ViewConstructorVars;

impl ViewConstructorVars {
    pub const VIEW_UTILS: &'static str = "viewUtils";
    pub const PARENT_VIEW: &'static str = "parentView";
    pub const PARENT_INDEX: &'static str = "parentIndex";
    pub const PARENT_ELEMENT: &'static str = "parentElement";

    pub fn params() -> Vec<FnParam> {
        [
            Self::VIEW_UTILS,
            Self::PARENT_VIEW,
            Self::PARENT_INDEX,
            Self::PARENT_ELEMENT,
        ]
        .into_iter()
        .map(FnParam::new)
        .collect()
    }
}

pub struct ViewProperties;

impl ViewProperties {
    pub fn renderer() -> Expression {
        o::this_expr().prop("renderer")
    }

    pub fn view_utils() -> Expression {
        o::this_expr().prop("viewUtils")
    }
}

pub struct InjectMethodVars;

impl InjectMethodVars {
    pub const TOKEN: &'static str = "token";
    pub const REQUEST_NODE_INDEX: &'static str = "requestNodeIndex";
    pub const NOT_FOUND_RESULT: &'static str = "notFoundResult";
}

pub struct DetectChangesVars;

impl DetectChangesVars {
    pub const THROW_ON_CHANGE: &'static str = "throwOnChange";

    pub fn throw_on_change() -> Expression {
        o::variable(Self::THROW_ON_CHANGE)
    }
}

pub struct EventHandlerVars;

impl EventHandlerVars {
    pub const EVENT_NAME: &'static str = "eventName";
    pub const EVENT: &'static str = "$event";
}

/// Name of the per-node event dispatch method.
pub fn handle_event_method_name(node_index: usize) -> String {
    format!("handleEvent_{}", node_index)
}
