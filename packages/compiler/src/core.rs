//! Core Types
//!
//! Framework-level enums the compiler shares with the runtime.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ViewEncapsulation {
    #[default]
    Emulated,
    Native,
    None,
}

impl ViewEncapsulation {
    /// Decodes the numeric value stored in metadata (`ViewEncapsulation.Emulated` is 0).
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(ViewEncapsulation::Emulated),
            1 => Some(ViewEncapsulation::Native),
            2 => Some(ViewEncapsulation::None),
            _ => None,
        }
    }

    pub fn from_member(name: &str) -> Option<Self> {
        match name {
            "Emulated" => Some(ViewEncapsulation::Emulated),
            "Native" => Some(ViewEncapsulation::Native),
            "None" => Some(ViewEncapsulation::None),
            _ => None,
        }
    }

    pub fn member_name(self) -> &'static str {
        match self {
            ViewEncapsulation::Emulated => "Emulated",
            ViewEncapsulation::Native => "Native",
            ViewEncapsulation::None => "None",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ChangeDetectionStrategy {
    OnPush,
    #[default]
    Default,
}

impl ChangeDetectionStrategy {
    pub fn from_index(index: i64) -> Option<Self> {
        match index {
            0 => Some(ChangeDetectionStrategy::OnPush),
            1 => Some(ChangeDetectionStrategy::Default),
            _ => None,
        }
    }

    pub fn from_member(name: &str) -> Option<Self> {
        match name {
            "OnPush" => Some(ChangeDetectionStrategy::OnPush),
            "Default" => Some(ChangeDetectionStrategy::Default),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SecurityContext {
    None,
    Html,
    Style,
    Script,
    Url,
    ResourceUrl,
}

impl SecurityContext {
    /// Member name on the runtime `SecurityContext` enum.
    pub fn member_name(&self) -> &'static str {
        match self {
            SecurityContext::None => "NONE",
            SecurityContext::Html => "HTML",
            SecurityContext::Style => "STYLE",
            SecurityContext::Script => "SCRIPT",
            SecurityContext::Url => "URL",
            SecurityContext::ResourceUrl => "RESOURCE_URL",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaMetadata {
    pub name: String,
}

pub const CUSTOM_ELEMENTS_SCHEMA_NAME: &str = "custom-elements";
pub const NO_ERRORS_SCHEMA_NAME: &str = "no-errors-schema";

pub fn custom_elements_schema() -> SchemaMetadata {
    SchemaMetadata {
        name: CUSTOM_ELEMENTS_SCHEMA_NAME.to_string(),
    }
}

pub fn no_errors_schema() -> SchemaMetadata {
    SchemaMetadata {
        name: NO_ERRORS_SCHEMA_NAME.to_string(),
    }
}

bitflags! {
    /// Lifecycle hooks a directive class implements.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct LifecycleHooks: u16 {
        const ON_INIT = 1 << 0;
        const ON_DESTROY = 1 << 1;
        const DO_CHECK = 1 << 2;
        const ON_CHANGES = 1 << 3;
        const AFTER_CONTENT_INIT = 1 << 4;
        const AFTER_CONTENT_CHECKED = 1 << 5;
        const AFTER_VIEW_INIT = 1 << 6;
        const AFTER_VIEW_CHECKED = 1 << 7;
    }
}

impl LifecycleHooks {
    /// Method name the runtime calls for a single hook.
    pub fn method_name(self) -> &'static str {
        match self {
            h if h == LifecycleHooks::ON_INIT => "ngOnInit",
            h if h == LifecycleHooks::ON_DESTROY => "ngOnDestroy",
            h if h == LifecycleHooks::DO_CHECK => "ngDoCheck",
            h if h == LifecycleHooks::ON_CHANGES => "ngOnChanges",
            h if h == LifecycleHooks::AFTER_CONTENT_INIT => "ngAfterContentInit",
            h if h == LifecycleHooks::AFTER_CONTENT_CHECKED => "ngAfterContentChecked",
            h if h == LifecycleHooks::AFTER_VIEW_INIT => "ngAfterViewInit",
            h if h == LifecycleHooks::AFTER_VIEW_CHECKED => "ngAfterViewChecked",
            _ => "",
        }
    }

    pub fn all_hooks() -> [LifecycleHooks; 8] {
        [
            LifecycleHooks::ON_INIT,
            LifecycleHooks::ON_DESTROY,
            LifecycleHooks::DO_CHECK,
            LifecycleHooks::ON_CHANGES,
            LifecycleHooks::AFTER_CONTENT_INIT,
            LifecycleHooks::AFTER_CONTENT_CHECKED,
            LifecycleHooks::AFTER_VIEW_INIT,
            LifecycleHooks::AFTER_VIEW_CHECKED,
        ]
    }
}
