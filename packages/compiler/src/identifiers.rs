//! Runtime identifiers referenced by generated code.
//!
//! Each identifier names an export of the framework runtime. Generated
//! programs reference them as external symbols, resolved through the
//! reflector so a re-export seen through `@angular/core` and the identifier
//! used by the compiler are the same symbol.

use crate::aot::static_symbol::StaticSymbol;
use crate::compile_metadata::CompileTokenMetadata;
use crate::compile_reflector::CompileReflector;
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IdentifierSpec {
    pub name: &'static str,
    pub module_url: &'static str,
}

const fn id(name: &'static str, module_url: &'static str) -> IdentifierSpec {
    IdentifierSpec { name, module_url }
}

pub const ANGULAR_CORE: &str = "@angular/core";
pub const VIEW_UTILS_MODULE_URL: &str = "@angular/core/src/linker/view_utils";
const ELEMENT_REF: &str = "@angular/core/src/linker/element_ref";
const VIEW_CONTAINER_REF: &str = "@angular/core/src/linker/view_container_ref";
const TEMPLATE_REF: &str = "@angular/core/src/linker/template_ref";
const COMPONENT_FACTORY: &str = "@angular/core/src/linker/component_factory";
const COMPONENT_FACTORY_RESOLVER: &str = "@angular/core/src/linker/component_factory_resolver";
const NG_MODULE_FACTORY: &str = "@angular/core/src/linker/ng_module_factory";
const NG_MODULE_FACTORY_LOADER: &str = "@angular/core/src/linker/ng_module_factory_loader";
const QUERY_LIST: &str = "@angular/core/src/linker/query_list";
const VIEW: &str = "@angular/core/src/linker/view";
const VIEW_CONTAINER: &str = "@angular/core/src/linker/view_container";
const VIEW_TYPE: &str = "@angular/core/src/linker/view_type";
const COMPILER: &str = "@angular/core/src/linker/compiler";
const CHANGE_DETECTOR_REF: &str = "@angular/core/src/change_detection/change_detector_ref";
const CHANGE_DETECTION_CONSTANTS: &str = "@angular/core/src/change_detection/constants";
const CHANGE_DETECTION_UTIL: &str = "@angular/core/src/change_detection/change_detection_util";
const METADATA_VIEW: &str = "@angular/core/src/metadata/view";
const METADATA_DI: &str = "@angular/core/src/metadata/di";
const SECURITY: &str = "@angular/core/src/security";
const INJECTOR: &str = "@angular/core/src/di/injector";
const I18N_TOKENS: &str = "@angular/core/src/i18n/tokens";
const RENDER_API: &str = "@angular/core/src/render/api";
const ANIMATION_TRANSITION: &str = "@angular/core/src/animation/animation_transition";
const ANIMATION_STYLES: &str = "@angular/core/src/animation/animation_styles";
const ANIMATION_PLAYERS: &str = "@angular/core/src/animation/animation_players";
const ANIMATION_KEYFRAME: &str = "@angular/core/src/animation/animation_keyframe";
const ANIMATION_STYLE_UTIL: &str = "@angular/core/src/animation/animation_style_util";

pub struct Identifiers;

#[allow(non_upper_case_globals)]
impl Identifiers {
    pub const ANALYZE_FOR_ENTRY_COMPONENTS: IdentifierSpec =
        id("ANALYZE_FOR_ENTRY_COMPONENTS", METADATA_DI);
    pub const ElementRef: IdentifierSpec = id("ElementRef", ELEMENT_REF);
    pub const ViewContainerRef: IdentifierSpec = id("ViewContainerRef", VIEW_CONTAINER_REF);
    pub const ChangeDetectorRef: IdentifierSpec = id("ChangeDetectorRef", CHANGE_DETECTOR_REF);
    pub const QueryList: IdentifierSpec = id("QueryList", QUERY_LIST);
    pub const TemplateRef: IdentifierSpec = id("TemplateRef", TEMPLATE_REF);
    pub const TemplateRef_: IdentifierSpec = id("TemplateRef_", TEMPLATE_REF);
    pub const CodegenComponentFactoryResolver: IdentifierSpec =
        id("CodegenComponentFactoryResolver", COMPONENT_FACTORY_RESOLVER);
    pub const ComponentFactoryResolver: IdentifierSpec =
        id("ComponentFactoryResolver", COMPONENT_FACTORY_RESOLVER);
    pub const ComponentFactory: IdentifierSpec = id("ComponentFactory", COMPONENT_FACTORY);
    pub const ComponentRef_: IdentifierSpec = id("ComponentRef_", COMPONENT_FACTORY);
    pub const NgModuleFactory: IdentifierSpec = id("NgModuleFactory", NG_MODULE_FACTORY);
    pub const NgModuleInjector: IdentifierSpec = id("NgModuleInjector", NG_MODULE_FACTORY);
    pub const NgModuleRef: IdentifierSpec = id("NgModuleRef", NG_MODULE_FACTORY);
    pub const RegisterModuleFactoryFn: IdentifierSpec =
        id("registerModuleFactory", NG_MODULE_FACTORY_LOADER);
    pub const ViewContainer: IdentifierSpec = id("ViewContainer", VIEW_CONTAINER);
    pub const AppView: IdentifierSpec = id("AppView", VIEW);
    pub const DebugAppView: IdentifierSpec = id("DebugAppView", VIEW);
    pub const ViewType: IdentifierSpec = id("ViewType", VIEW_TYPE);
    pub const Compiler: IdentifierSpec = id("Compiler", COMPILER);
    pub const ChangeDetectionStrategy: IdentifierSpec =
        id("ChangeDetectionStrategy", CHANGE_DETECTION_CONSTANTS);
    pub const ChangeDetectorStatus: IdentifierSpec =
        id("ChangeDetectorStatus", CHANGE_DETECTION_CONSTANTS);
    pub const SimpleChange: IdentifierSpec = id("SimpleChange", CHANGE_DETECTION_UTIL);
    pub const ViewEncapsulation: IdentifierSpec = id("ViewEncapsulation", METADATA_VIEW);
    pub const SecurityContext: IdentifierSpec = id("SecurityContext", SECURITY);
    pub const Injector: IdentifierSpec = id("Injector", INJECTOR);
    pub const LOCALE_ID: IdentifierSpec = id("LOCALE_ID", I18N_TOKENS);
    pub const TRANSLATIONS_FORMAT: IdentifierSpec = id("TRANSLATIONS_FORMAT", I18N_TOKENS);
    pub const RenderComponentType: IdentifierSpec = id("RenderComponentType", RENDER_API);
    pub const Renderer: IdentifierSpec = id("Renderer", RENDER_API);
    pub const ViewUtils: IdentifierSpec = id("ViewUtils", VIEW_UTILS_MODULE_URL);
    pub const checkBinding: IdentifierSpec = id("checkBinding", VIEW_UTILS_MODULE_URL);
    pub const checkRenderProperty: IdentifierSpec =
        id("checkRenderProperty", VIEW_UTILS_MODULE_URL);
    pub const checkRenderAttribute: IdentifierSpec =
        id("checkRenderAttribute", VIEW_UTILS_MODULE_URL);
    pub const checkRenderClass: IdentifierSpec = id("checkRenderClass", VIEW_UTILS_MODULE_URL);
    pub const checkRenderStyle: IdentifierSpec = id("checkRenderStyle", VIEW_UTILS_MODULE_URL);
    pub const interpolate: IdentifierSpec = id("interpolate", VIEW_UTILS_MODULE_URL);
    pub const inlineInterpolate: IdentifierSpec = id("inlineInterpolate", VIEW_UTILS_MODULE_URL);
    pub const castByValue: IdentifierSpec = id("castByValue", VIEW_UTILS_MODULE_URL);
    pub const EMPTY_ARRAY: IdentifierSpec = id("EMPTY_ARRAY", VIEW_UTILS_MODULE_URL);
    pub const EMPTY_MAP: IdentifierSpec = id("EMPTY_MAP", VIEW_UTILS_MODULE_URL);
    pub const UNINITIALIZED: IdentifierSpec = id("UNINITIALIZED", VIEW_UTILS_MODULE_URL);
    pub const createRenderComponentType: IdentifierSpec =
        id("createRenderComponentType", VIEW_UTILS_MODULE_URL);
    pub const createRenderElement: IdentifierSpec =
        id("createRenderElement", VIEW_UTILS_MODULE_URL);
    pub const selectOrCreateRenderHostElement: IdentifierSpec =
        id("selectOrCreateRenderHostElement", VIEW_UTILS_MODULE_URL);
    pub const subscribeToRenderElement: IdentifierSpec =
        id("subscribeToRenderElement", VIEW_UTILS_MODULE_URL);
    pub const noop: IdentifierSpec = id("noop", VIEW_UTILS_MODULE_URL);
    pub const setBindingDebugInfo: IdentifierSpec =
        id("setBindingDebugInfo", VIEW_UTILS_MODULE_URL);
    pub const AnimationTransition: IdentifierSpec = id("AnimationTransition", ANIMATION_TRANSITION);
    pub const AnimationStyles: IdentifierSpec = id("AnimationStyles", ANIMATION_STYLES);
    pub const AnimationSequencePlayer: IdentifierSpec =
        id("AnimationSequencePlayer", ANIMATION_PLAYERS);
    pub const AnimationGroupPlayer: IdentifierSpec = id("AnimationGroupPlayer", ANIMATION_PLAYERS);
    pub const NoOpAnimationPlayer: IdentifierSpec = id("NoOpAnimationPlayer", ANIMATION_PLAYERS);
    pub const balanceAnimationKeyframes: IdentifierSpec =
        id("balanceAnimationKeyframes", ANIMATION_PLAYERS);
    pub const prepareFinalAnimationStyles: IdentifierSpec =
        id("prepareFinalAnimationStyles", ANIMATION_PLAYERS);
    pub const AnimationKeyframe: IdentifierSpec = id("AnimationKeyframe", ANIMATION_KEYFRAME);
    pub const renderStyles: IdentifierSpec = id("renderStyles", ANIMATION_STYLE_UTIL);
    pub const clearStyles: IdentifierSpec = id("clearStyles", ANIMATION_STYLE_UTIL);
    pub const collectAndResolveStyles: IdentifierSpec =
        id("collectAndResolveStyles", ANIMATION_STYLE_UTIL);

    /// Every identifier; seeds the built-in core metadata.
    pub const ALL: &'static [IdentifierSpec] = &[
        Self::ANALYZE_FOR_ENTRY_COMPONENTS,
        Self::ElementRef,
        Self::ViewContainerRef,
        Self::ChangeDetectorRef,
        Self::QueryList,
        Self::TemplateRef,
        Self::TemplateRef_,
        Self::CodegenComponentFactoryResolver,
        Self::ComponentFactoryResolver,
        Self::ComponentFactory,
        Self::ComponentRef_,
        Self::NgModuleFactory,
        Self::NgModuleInjector,
        Self::NgModuleRef,
        Self::RegisterModuleFactoryFn,
        Self::ViewContainer,
        Self::AppView,
        Self::DebugAppView,
        Self::ViewType,
        Self::Compiler,
        Self::ChangeDetectionStrategy,
        Self::ChangeDetectorStatus,
        Self::SimpleChange,
        Self::ViewEncapsulation,
        Self::SecurityContext,
        Self::Injector,
        Self::LOCALE_ID,
        Self::TRANSLATIONS_FORMAT,
        Self::RenderComponentType,
        Self::Renderer,
        Self::ViewUtils,
        Self::checkBinding,
        Self::checkRenderProperty,
        Self::checkRenderAttribute,
        Self::checkRenderClass,
        Self::checkRenderStyle,
        Self::interpolate,
        Self::inlineInterpolate,
        Self::castByValue,
        Self::EMPTY_ARRAY,
        Self::EMPTY_MAP,
        Self::UNINITIALIZED,
        Self::createRenderComponentType,
        Self::createRenderElement,
        Self::selectOrCreateRenderHostElement,
        Self::subscribeToRenderElement,
        Self::noop,
        Self::setBindingDebugInfo,
        Self::AnimationTransition,
        Self::AnimationStyles,
        Self::AnimationSequencePlayer,
        Self::AnimationGroupPlayer,
        Self::NoOpAnimationPlayer,
        Self::balanceAnimationKeyframes,
        Self::prepareFinalAnimationStyles,
        Self::AnimationKeyframe,
        Self::renderStyles,
        Self::clearStyles,
        Self::collectAndResolveStyles,
    ];
}

pub fn resolve_identifier(
    reflector: &dyn CompileReflector,
    identifier: &IdentifierSpec,
) -> Result<StaticSymbol> {
    reflector.resolve_identifier(identifier.name, identifier.module_url)
}

pub fn identifier_token(
    reflector: &dyn CompileReflector,
    identifier: &IdentifierSpec,
) -> Result<CompileTokenMetadata> {
    Ok(CompileTokenMetadata::from_symbol(resolve_identifier(
        reflector, identifier,
    )?))
}

/// Symbol for `Enum.member` of a runtime enum such as `ViewType`.
pub fn resolve_enum_member(
    reflector: &dyn CompileReflector,
    enum_identifier: &IdentifierSpec,
    member: &str,
) -> Result<StaticSymbol> {
    let enum_symbol = resolve_identifier(reflector, enum_identifier)?;
    Ok(reflector.resolve_enum(&enum_symbol, member))
}
