//! DOM Element Schema Registry
//!
//! Every entry of `SCHEMA` has the form `names^parent|properties`:
//! comma separated element names share one property set, `^parent` inherits
//! the parent's properties and events, and each property carries a type
//! prefix (`*` event, `!` boolean, `#` number, `%` object, none for string).
//! Names in brackets such as `[Element]` are abstract bases.
//!
//! Properties added here must also get a security context in
//! `dom_security_schema`.

use super::dom_security_schema::lookup_security_context;
use super::element_schema_registry::{
    ElementSchemaRegistry, NormalizationResult, ValidationResult,
};
use crate::core::{SchemaMetadata, SecurityContext, CUSTOM_ELEMENTS_SCHEMA_NAME, NO_ERRORS_SCHEMA_NAME};
use crate::ml_parser::tags::{is_ng_container, is_ng_content};
use crate::util::dash_case_to_camel_case;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyType {
    String,
    Boolean,
    Number,
    Object,
}

pub static SCHEMA: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "[Element]|textContent,%ariaActiveDescendantElement,%ariaAtomic,%ariaAutoComplete,%ariaBusy,%ariaChecked,%ariaColCount,%ariaColIndex,%ariaColIndexText,%ariaColSpan,%ariaControlsElements,%ariaCurrent,%ariaDescribedByElements,%ariaDescription,%ariaDetailsElements,%ariaDisabled,%ariaErrorMessageElements,%ariaExpanded,%ariaFlowToElements,%ariaHasPopup,%ariaHidden,%ariaInvalid,%ariaKeyShortcuts,%ariaLabel,%ariaLabelledByElements,%ariaLevel,%ariaLive,%ariaModal,%ariaMultiLine,%ariaMultiSelectable,%ariaOrientation,%ariaOwnsElements,%ariaPlaceholder,%ariaPosInSet,%ariaPressed,%ariaReadOnly,%ariaRelevant,%ariaRequired,%ariaRoleDescription,%ariaRowCount,%ariaRowIndex,%ariaRowIndexText,%ariaRowSpan,%ariaSelected,%ariaSetSize,%ariaSort,%ariaValueMax,%ariaValueMin,%ariaValueNow,%ariaValueText,%classList,className,elementTiming,id,innerHTML,*beforecopy,*beforecut,*beforepaste,*fullscreenchange,*fullscreenerror,*search,*webkitfullscreenchange,*webkitfullscreenerror,outerHTML,%part,#scrollLeft,#scrollTop,slot,*message,*mozfullscreenchange,*mozfullscreenerror,*mozpointerlockchange,*mozpointerlockerror,*webglcontextcreationerror,*webglcontextlost,*webglcontextrestored",
        "[HTMLElement]^[Element]|accessKey,autocapitalize,!autofocus,contentEditable,dir,!draggable,enterKeyHint,!hidden,!inert,innerText,inputMode,lang,nonce,*abort,*animationend,*animationiteration,*animationstart,*auxclick,*beforexrselect,*blur,*cancel,*canplay,*canplaythrough,*change,*click,*close,*contextmenu,*copy,*cuechange,*cut,*dblclick,*drag,*dragend,*dragenter,*dragleave,*dragover,*dragstart,*drop,*durationchange,*emptied,*ended,*error,*focus,*formdata,*gotpointercapture,*input,*invalid,*keydown,*keypress,*keyup,*load,*loadeddata,*loadedmetadata,*loadstart,*lostpointercapture,*mousedown,*mouseenter,*mouseleave,*mousemove,*mouseout,*mouseover,*mouseup,*mousewheel,*paste,*pause,*play,*playing,*pointercancel,*pointerdown,*pointerenter,*pointerleave,*pointermove,*pointerout,*pointerover,*pointerrawupdate,*pointerup,*progress,*ratechange,*reset,*resize,*scroll,*securitypolicyviolation,*seeked,*seeking,*select,*selectionchange,*selectstart,*slotchange,*stalled,*submit,*suspend,*timeupdate,*toggle,*transitioncancel,*transitionend,*transitionrun,*transitionstart,*volumechange,*waiting,*webkitanimationend,*webkitanimationiteration,*webkitanimationstart,*webkittransitionend,*wheel,outerText,!spellcheck,%style,#tabIndex,title,!translate,virtualKeyboardPolicy",
        "abbr,address,article,aside,b,bdi,bdo,cite,content,code,dd,dfn,dt,em,figcaption,figure,footer,header,hgroup,i,kbd,main,mark,nav,noscript,rb,rp,rt,rtc,ruby,s,samp,search,section,small,strong,sub,sup,u,var,wbr^[HTMLElement]|accessKey,autocapitalize,!autofocus,contentEditable,dir,!draggable,enterKeyHint,!hidden,innerText,inputMode,lang,nonce,*abort,*animationend,*animationiteration,*animationstart,*auxclick,*beforexrselect,*blur,*cancel,*canplay,*canplaythrough,*change,*click,*close,*contextmenu,*copy,*cuechange,*cut,*dblclick,*drag,*dragend,*dragenter,*dragleave,*dragover,*dragstart,*drop,*durationchange,*emptied,*ended,*error,*focus,*formdata,*gotpointercapture,*input,*invalid,*keydown,*keypress,*keyup,*load,*loadeddata,*loadedmetadata,*loadstart,*lostpointercapture,*mousedown,*mouseenter,*mouseleave,*mousemove,*mouseout,*mouseover,*mouseup,*mousewheel,*paste,*pause,*play,*playing,*pointercancel,*pointerdown,*pointerenter,*pointerleave,*pointermove,*pointerout,*pointerover,*pointerrawupdate,*pointerup,*progress,*ratechange,*reset,*resize,*scroll,*securitypolicyviolation,*seeked,*seeking,*select,*selectionchange,*selectstart,*slotchange,*stalled,*submit,*suspend,*timeupdate,*toggle,*transitioncancel,*transitionend,*transitionrun,*transitionstart,*volumechange,*waiting,*webkitanimationend,*webkitanimationiteration,*webkitanimationstart,*webkittransitionend,*wheel,outerText,!spellcheck,%style,#tabIndex,title,!translate,virtualKeyboardPolicy",
        "media^[HTMLElement]|!autoplay,!controls,%controlsList,%crossOrigin,#currentTime,!defaultMuted,#defaultPlaybackRate,!disableRemotePlayback,!loop,!muted,*encrypted,*waitingforkey,#playbackRate,preload,!preservesPitch,src,%srcObject,#volume",
        ":svg:^[HTMLElement]|!autofocus,nonce,*abort,*animationend,*animationiteration,*animationstart,*auxclick,*beforexrselect,*blur,*cancel,*canplay,*canplaythrough,*change,*click,*close,*contextmenu,*copy,*cuechange,*cut,*dblclick,*drag,*dragend,*dragenter,*dragleave,*dragover,*dragstart,*drop,*durationchange,*emptied,*ended,*error,*focus,*formdata,*gotpointercapture,*input,*invalid,*keydown,*keypress,*keyup,*load,*loadeddata,*loadedmetadata,*loadstart,*lostpointercapture,*mousedown,*mouseenter,*mouseleave,*mousemove,*mouseout,*mouseover,*mouseup,*mousewheel,*paste,*pause,*play,*playing,*pointercancel,*pointerdown,*pointerenter,*pointerleave,*pointermove,*pointerout,*pointerover,*pointerrawupdate,*pointerup,*progress,*ratechange,*reset,*resize,*scroll,*securitypolicyviolation,*seeked,*seeking,*select,*selectionchange,*selectstart,*slotchange,*stalled,*submit,*suspend,*timeupdate,*toggle,*transitioncancel,*transitionend,*transitionrun,*transitionstart,*volumechange,*waiting,*webkitanimationend,*webkitanimationiteration,*webkitanimationstart,*webkittransitionend,*wheel,%style,#tabIndex",
        ":svg:graphics^:svg:|",
        ":svg:animation^:svg:|*begin,*end,*repeat",
        ":svg:geometry^:svg:|",
        ":svg:componentTransferFunction^:svg:|",
        ":svg:gradient^:svg:|",
        ":svg:textContent^:svg:graphics|",
        ":svg:textPositioning^:svg:textContent|",
        "a^[HTMLElement]|charset,coords,download,hash,host,hostname,href,hreflang,name,password,pathname,ping,port,protocol,referrerPolicy,rel,%relList,rev,search,shape,target,text,type,username",
        "area^[HTMLElement]|alt,coords,download,hash,host,hostname,href,!noHref,password,pathname,ping,port,protocol,referrerPolicy,rel,%relList,search,shape,target,username",
        "audio^media|",
        "br^[HTMLElement]|clear",
        "base^[HTMLElement]|href,target",
        "body^[HTMLElement]|aLink,background,bgColor,link,*afterprint,*beforeprint,*beforeunload,*blur,*error,*focus,*hashchange,*languagechange,*load,*message,*messageerror,*offline,*online,*pagehide,*pageshow,*popstate,*rejectionhandled,*resize,*scroll,*storage,*unhandledrejection,*unload,text,vLink",
        "button^[HTMLElement]|!disabled,formAction,formEnctype,formMethod,!formNoValidate,formTarget,name,type,value",
        "canvas^[HTMLElement]|#height,#width",
        "content^[HTMLElement]|select",
        "dl^[HTMLElement]|!compact",
        "data^[HTMLElement]|value",
        "datalist^[HTMLElement]|",
        "details^[HTMLElement]|!open",
        "dialog^[HTMLElement]|!open,returnValue",
        "dir^[HTMLElement]|!compact",
        "div^[HTMLElement]|align",
        "embed^[HTMLElement]|align,height,name,src,type,width",
        "fieldset^[HTMLElement]|!disabled,name",
        "font^[HTMLElement]|color,face,size",
        "form^[HTMLElement]|acceptCharset,action,autocomplete,encoding,enctype,method,name,!noValidate,target",
        "frame^[HTMLElement]|frameBorder,longDesc,marginHeight,marginWidth,name,!noResize,scrolling,src",
        "frameset^[HTMLElement]|cols,*afterprint,*beforeprint,*beforeunload,*blur,*error,*focus,*hashchange,*languagechange,*load,*message,*messageerror,*offline,*online,*pagehide,*pageshow,*popstate,*rejectionhandled,*resize,*scroll,*storage,*unhandledrejection,*unload,rows",
        "hr^[HTMLElement]|align,color,!noShade,size,width",
        "head^[HTMLElement]|",
        "h1,h2,h3,h4,h5,h6^[HTMLElement]|align",
        "html^[HTMLElement]|version",
        "iframe^[HTMLElement]|align,allow,!allowFullscreen,!allowPaymentRequest,csp,frameBorder,height,loading,longDesc,marginHeight,marginWidth,name,referrerPolicy,%sandbox,scrolling,src,srcdoc,width",
        "img^[HTMLElement]|align,alt,border,%crossOrigin,decoding,#height,#hspace,!isMap,loading,longDesc,lowsrc,name,referrerPolicy,sizes,src,srcset,useMap,#vspace,#width",
        "input^[HTMLElement]|accept,align,alt,autocomplete,!checked,!defaultChecked,defaultValue,dirName,!disabled,%files,formAction,formEnctype,formMethod,!formNoValidate,formTarget,#height,!incremental,!indeterminate,max,#maxLength,min,#minLength,!multiple,name,pattern,placeholder,!readOnly,!required,selectionDirection,#selectionEnd,#selectionStart,#size,src,step,type,useMap,value,%valueAsDate,#valueAsNumber,#width",
        "li^[HTMLElement]|type,#value",
        "label^[HTMLElement]|htmlFor",
        "legend^[HTMLElement]|align",
        "link^[HTMLElement]|as,charset,%crossOrigin,!disabled,href,hreflang,imageSizes,imageSrcset,integrity,media,referrerPolicy,rel,%relList,rev,%sizes,target,type",
        "map^[HTMLElement]|name",
        "marquee^[HTMLElement]|behavior,bgColor,direction,height,#hspace,#loop,#scrollAmount,#scrollDelay,!trueSpeed,#vspace,width",
        "menu^[HTMLElement]|!compact",
        "meta^[HTMLElement]|content,httpEquiv,media,name,scheme",
        "meter^[HTMLElement]|#high,#low,#max,#min,#optimum,#value",
        "ins,del^[HTMLElement]|cite,dateTime",
        "ol^[HTMLElement]|!compact,!reversed,#start,type",
        "object^[HTMLElement]|align,archive,border,code,codeBase,codeType,data,!declare,height,#hspace,name,standby,type,useMap,#vspace,width",
        "optgroup^[HTMLElement]|!disabled,label",
        "option^[HTMLElement]|!defaultSelected,!disabled,label,!selected,text,value",
        "output^[HTMLElement]|defaultValue,%htmlFor,name,value",
        "p^[HTMLElement]|align",
        "param^[HTMLElement]|name,type,value,valueType",
        "picture^[HTMLElement]|",
        "pre^[HTMLElement]|#width",
        "progress^[HTMLElement]|#max,#value",
        "q,blockquote,cite^[HTMLElement]|",
        "script^[HTMLElement]|!async,charset,%crossOrigin,!defer,event,htmlFor,integrity,!noModule,%referrerPolicy,src,text,type",
        "select^[HTMLElement]|autocomplete,!disabled,#length,!multiple,name,!required,#selectedIndex,#size,value",
        "selectedcontent^[HTMLElement]|",
        "slot^[HTMLElement]|name",
        "source^[HTMLElement]|#height,media,sizes,src,srcset,type,#width",
        "span^[HTMLElement]|",
        "style^[HTMLElement]|!disabled,media,type",
        "search^[HTMLELement]|",
        "caption^[HTMLElement]|align",
        "th,td^[HTMLElement]|abbr,align,axis,bgColor,ch,chOff,#colSpan,headers,height,!noWrap,#rowSpan,scope,vAlign,width",
        "col,colgroup^[HTMLElement]|align,ch,chOff,#span,vAlign,width",
        "table^[HTMLElement]|align,bgColor,border,%caption,cellPadding,cellSpacing,frame,rules,summary,%tFoot,%tHead,width",
        "tr^[HTMLElement]|align,bgColor,ch,chOff,vAlign",
        "tfoot,thead,tbody^[HTMLElement]|align,ch,chOff,vAlign",
        "template^[HTMLElement]|",
        "textarea^[HTMLElement]|autocomplete,#cols,defaultValue,dirName,!disabled,#maxLength,#minLength,name,placeholder,!readOnly,!required,#rows,selectionDirection,#selectionEnd,#selectionStart,value,wrap",
        "time^[HTMLElement]|dateTime",
        "title^[HTMLElement]|text",
        "track^[HTMLElement]|!default,kind,label,src,srclang",
        "ul^[HTMLElement]|!compact,type",
        "unknown^[HTMLElement]|",
        "video^media|!disablePictureInPicture,#height,*enterpictureinpicture,*leavepictureinpicture,!playsInline,poster,#width",
        ":svg:a^:svg:graphics|",
        ":svg:animate^:svg:animation|",
        ":svg:animateMotion^:svg:animation|",
        ":svg:animateTransform^:svg:animation|",
        ":svg:circle^:svg:geometry|",
        ":svg:clipPath^:svg:graphics|",
        ":svg:defs^:svg:graphics|",
        ":svg:desc^:svg:|",
        ":svg:discard^:svg:|",
        ":svg:ellipse^:svg:geometry|",
        ":svg:feBlend^:svg:|",
        ":svg:feColorMatrix^:svg:|",
        ":svg:feComponentTransfer^:svg:|",
        ":svg:feComposite^:svg:|",
        ":svg:feConvolveMatrix^:svg:|",
        ":svg:feDiffuseLighting^:svg:|",
        ":svg:feDisplacementMap^:svg:|",
        ":svg:feDistantLight^:svg:|",
        ":svg:feDropShadow^:svg:|",
        ":svg:feFlood^:svg:|",
        ":svg:feFuncA^:svg:componentTransferFunction|",
        ":svg:feFuncB^:svg:componentTransferFunction|",
        ":svg:feFuncG^:svg:componentTransferFunction|",
        ":svg:feFuncR^:svg:componentTransferFunction|",
        ":svg:feGaussianBlur^:svg:|",
        ":svg:feImage^:svg:|",
        ":svg:feMerge^:svg:|",
        ":svg:feMergeNode^:svg:|",
        ":svg:feMorphology^:svg:|",
        ":svg:feOffset^:svg:|",
        ":svg:fePointLight^:svg:|",
        ":svg:feSpecularLighting^:svg:|",
        ":svg:feSpotLight^:svg:|",
        ":svg:feTile^:svg:|",
        ":svg:feTurbulence^:svg:|",
        ":svg:filter^:svg:|",
        ":svg:foreignObject^:svg:graphics|",
        ":svg:g^:svg:graphics|",
        ":svg:image^:svg:graphics|decoding",
        ":svg:line^:svg:geometry|",
        ":svg:linearGradient^:svg:gradient|",
        ":svg:mpath^:svg:|",
        ":svg:marker^:svg:|",
        ":svg:mask^:svg:|",
        ":svg:metadata^:svg:|",
        ":svg:path^:svg:geometry|",
        ":svg:pattern^:svg:|",
        ":svg:polygon^:svg:geometry|",
        ":svg:polyline^:svg:geometry|",
        ":svg:radialGradient^:svg:gradient|",
        ":svg:rect^:svg:geometry|",
        ":svg:svg^:svg:graphics|#currentScale,#zoomAndPan",
        ":svg:script^:svg:|type",
        ":svg:set^:svg:animation|",
        ":svg:stop^:svg:|",
        ":svg:style^:svg:|!disabled,media,title,type",
        ":svg:switch^:svg:graphics|",
        ":svg:symbol^:svg:|",
        ":svg:tspan^:svg:textPositioning|",
        ":svg:text^:svg:textPositioning|",
        ":svg:textPath^:svg:textContent|",
        ":svg:title^:svg:|",
        ":svg:use^:svg:graphics|",
        ":svg:view^:svg:|#zoomAndPan",
        "data^[HTMLElement]|value",
        "keygen^[HTMLElement]|!autofocus,challenge,!disabled,form,keytype,name",
        "menuitem^[HTMLElement]|type,label,icon,!disabled,!checked,radiogroup,!default",
        "summary^[HTMLElement]|",
        "time^[HTMLElement]|dateTime",
        ":svg:cursor^:svg:|",
        ":math:^[HTMLElement]|!autofocus,nonce,*abort,*animationend,*animationiteration,*animationstart,*auxclick,*beforeinput,*beforematch,*beforetoggle,*beforexrselect,*blur,*cancel,*canplay,*canplaythrough,*change,*click,*close,*contentvisibilityautostatechange,*contextlost,*contextmenu,*contextrestored,*copy,*cuechange,*cut,*dblclick,*drag,*dragend,*dragenter,*dragleave,*dragover,*dragstart,*drop,*durationchange,*emptied,*ended,*error,*focus,*formdata,*gotpointercapture,*input,*invalid,*keydown,*keypress,*keyup,*load,*loadeddata,*loadedmetadata,*loadstart,*lostpointercapture,*mousedown,*mouseenter,*mouseleave,*mousemove,*mouseout,*mouseover,*mouseup,*mousewheel,*paste,*pause,*play,*playing,*pointercancel,*pointerdown,*pointerenter,*pointerleave,*pointermove,*pointerout,*pointerover,*pointerrawupdate,*pointerup,*progress,*ratechange,*reset,*resize,*scroll,*scrollend,*securitypolicyviolation,*seeked,*seeking,*select,*selectionchange,*selectstart,*slotchange,*stalled,*submit,*suspend,*timeupdate,*toggle,*transitioncancel,*transitionend,*transitionrun,*transitionstart,*volumechange,*waiting,*webkitanimationend,*webkitanimationiteration,*webkitanimationstart,*webkittransitionend,*wheel,%style,#tabIndex",
        ":math:math^:math:|",
        ":math:maction^:math:|",
        ":math:menclose^:math:|",
        ":math:merror^:math:|",
        ":math:mfenced^:math:|",
        ":math:mfrac^:math:|",
        ":math:mi^:math:|",
        ":math:mmultiscripts^:math:|",
        ":math:mn^:math:|",
        ":math:mo^:math:|",
        ":math:mover^:math:|",
        ":math:mpadded^:math:|",
        ":math:mphantom^:math:|",
        ":math:mroot^:math:|",
        ":math:mrow^:math:|",
        ":math:ms^:math:|",
        ":math:mspace^:math:|",
        ":math:msqrt^:math:|",
        ":math:mstyle^:math:|",
        ":math:msub^:math:|",
        ":math:msubsup^:math:|",
        ":math:msup^:math:|",
        ":math:mtable^:math:|",
        ":math:mtd^:math:|",
        ":math:mtext^:math:|",
        ":math:mtr^:math:|",
        ":math:munder^:math:|",
        ":math:munderover^:math:|",
        ":math:semantics^:math:|",
    ]
});

static ATTR_TO_PROP: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("class", "className"),
        ("for", "htmlFor"),
        ("formaction", "formAction"),
        ("innerHtml", "innerHTML"),
        ("readonly", "readOnly"),
        ("tabindex", "tabIndex"),
    ])
});

static UNIT_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[+-]?[\d.]+([a-z]*)$").unwrap());

pub struct DomElementSchemaRegistry {
    schema: HashMap<String, HashMap<String, PropertyType>>,
    // Events are kept apart: binding to `on*` properties is never allowed.
    event_schema: HashMap<String, HashSet<String>>,
}

impl DomElementSchemaRegistry {
    pub fn new() -> Self {
        let mut schema: HashMap<String, HashMap<String, PropertyType>> = HashMap::new();
        let mut event_schema: HashMap<String, HashSet<String>> = HashMap::new();

        for encoded in SCHEMA.iter() {
            let Some((type_part, properties)) = encoded.split_once('|') else {
                continue;
            };
            let (names, parent) = match type_part.split_once('^') {
                Some((names, parent)) => (names, Some(parent)),
                None => (type_part, None),
            };

            let mut props = parent
                .and_then(|p| schema.get(p))
                .cloned()
                .unwrap_or_default();
            let mut events = parent
                .and_then(|p| event_schema.get(p))
                .cloned()
                .unwrap_or_default();

            for property in properties.split(',').filter(|p| !p.is_empty()) {
                let (kind, name) = match property.as_bytes()[0] {
                    b'*' => {
                        events.insert(property[1..].to_string());
                        continue;
                    }
                    b'!' => (PropertyType::Boolean, &property[1..]),
                    b'#' => (PropertyType::Number, &property[1..]),
                    b'%' => (PropertyType::Object, &property[1..]),
                    _ => (PropertyType::String, property),
                };
                props.insert(name.to_string(), kind);
            }

            for name in names.split(',') {
                schema.insert(name.to_string(), props.clone());
                event_schema.insert(name.to_string(), events.clone());
            }
        }

        DomElementSchemaRegistry {
            schema,
            event_schema,
        }
    }

    fn element_properties(&self, tag_name: &str) -> Option<&HashMap<String, PropertyType>> {
        self.schema
            .get(&tag_name.to_lowercase())
            .or_else(|| self.schema.get("unknown"))
    }

    pub fn property_type(&self, tag_name: &str, prop_name: &str) -> Option<PropertyType> {
        self.element_properties(tag_name)
            .and_then(|props| props.get(prop_name))
            .copied()
    }

    pub fn all_known_events_of_element(&self, tag_name: &str) -> Vec<String> {
        let mut events: Vec<String> = self
            .event_schema
            .get(&tag_name.to_lowercase())
            .map(|events| events.iter().cloned().collect())
            .unwrap_or_default();
        events.sort();
        events
    }
}

impl Default for DomElementSchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn has_schema(schema_metas: &[SchemaMetadata], name: &str) -> bool {
    schema_metas.iter().any(|s| s.name == name)
}

impl ElementSchemaRegistry for DomElementSchemaRegistry {
    fn has_property(&self, tag_name: &str, prop_name: &str, schema_metas: &[SchemaMetadata]) -> bool {
        if has_schema(schema_metas, NO_ERRORS_SCHEMA_NAME) {
            return true;
        }
        if tag_name.contains('-') {
            if is_ng_container(tag_name) || is_ng_content(tag_name) {
                return false;
            }
            // Custom elements may receive any property once upgraded.
            if has_schema(schema_metas, CUSTOM_ELEMENTS_SCHEMA_NAME) {
                return true;
            }
        }
        self.element_properties(tag_name)
            .map_or(false, |props| props.contains_key(prop_name))
    }

    fn has_element(&self, tag_name: &str, schema_metas: &[SchemaMetadata]) -> bool {
        if has_schema(schema_metas, NO_ERRORS_SCHEMA_NAME) {
            return true;
        }
        if tag_name.contains('-') {
            if is_ng_container(tag_name) || is_ng_content(tag_name) {
                return true;
            }
            if has_schema(schema_metas, CUSTOM_ELEMENTS_SCHEMA_NAME) {
                return true;
            }
        }
        self.schema.contains_key(&tag_name.to_lowercase())
    }

    fn security_context(&self, element_name: &str, prop_name: &str, is_attribute: bool) -> SecurityContext {
        // Attributes are checked under the property they map to so `class`
        // and `className` cannot differ.
        let prop_name = if is_attribute {
            self.get_mapped_prop_name(prop_name)
        } else {
            prop_name.to_string()
        };
        lookup_security_context(element_name, &prop_name)
    }

    fn all_known_element_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.schema.keys().cloned().collect();
        names.sort();
        names
    }

    fn get_mapped_prop_name(&self, prop_name: &str) -> String {
        ATTR_TO_PROP
            .get(prop_name)
            .copied()
            .unwrap_or(prop_name)
            .to_string()
    }

    fn get_default_component_element_name(&self) -> String {
        "ng-component".to_string()
    }

    fn validate_property(&self, name: &str) -> ValidationResult {
        if name.to_lowercase().starts_with("on") {
            ValidationResult::error(format!(
                "Binding to event property '{}' is disallowed for security reasons, please use ({})=...\n\
                 If '{}' is a directive input, make sure the directive is imported by the current module.",
                name,
                &name[2..],
                name
            ))
        } else {
            ValidationResult::ok()
        }
    }

    fn validate_attribute(&self, name: &str) -> ValidationResult {
        if name.to_lowercase().starts_with("on") {
            ValidationResult::error(format!(
                "Binding to event attribute '{}' is disallowed for security reasons, please use ({})=...",
                name,
                &name[2..]
            ))
        } else {
            ValidationResult::ok()
        }
    }

    fn normalize_animation_style_property(&self, prop_name: &str) -> String {
        dash_case_to_camel_case(prop_name)
    }

    fn normalize_animation_style_value(
        &self,
        camel_case_prop: &str,
        user_provided_prop: &str,
        val: &str,
    ) -> NormalizationResult {
        let mut unit = "";
        let mut error = String::new();
        let trimmed = val.trim();
        if is_pixel_dimension_style(camel_case_prop) && !trimmed.is_empty() && trimmed != "0" {
            if trimmed.parse::<f64>().is_ok() {
                unit = "px";
            } else if UNIT_SUFFIX
                .captures(trimmed)
                .map_or(false, |caps| caps[1].is_empty())
            {
                error = format!(
                    "Please provide a CSS unit value for {}:{}",
                    user_provided_prop, val
                );
            }
        }
        NormalizationResult {
            error,
            value: format!("{}{}", trimmed, unit),
        }
    }
}

fn is_pixel_dimension_style(prop: &str) -> bool {
    matches!(
        prop,
        "width"
            | "height"
            | "minWidth"
            | "minHeight"
            | "maxWidth"
            | "maxHeight"
            | "left"
            | "top"
            | "bottom"
            | "right"
            | "fontSize"
            | "outlineWidth"
            | "outlineOffset"
            | "paddingTop"
            | "paddingLeft"
            | "paddingBottom"
            | "paddingRight"
            | "marginTop"
            | "marginLeft"
            | "marginBottom"
            | "marginRight"
            | "borderRadius"
            | "borderWidth"
            | "borderTopWidth"
            | "borderLeftWidth"
            | "borderRightWidth"
            | "borderBottomWidth"
            | "textIndent"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{custom_elements_schema, no_errors_schema};

    #[test]
    fn should_detect_elements_and_properties() {
        let registry = DomElementSchemaRegistry::new();
        assert!(registry.has_element("div", &[]));
        assert!(registry.has_element("DIV", &[]));
        assert!(!registry.has_element("my-cmp", &[]));
        assert!(registry.has_property("div", "id", &[]));
        assert!(registry.has_property("input", "value", &[]));
        assert!(!registry.has_property("div", "unknownProp", &[]));
        assert_eq!(registry.property_type("input", "checked"), Some(PropertyType::Boolean));
    }

    #[test]
    fn should_inherit_events_from_parents() {
        let registry = DomElementSchemaRegistry::new();
        assert!(registry
            .all_known_events_of_element("div")
            .contains(&"click".to_string()));
    }

    #[test]
    fn should_honor_schemas_for_custom_elements() {
        let registry = DomElementSchemaRegistry::new();
        assert!(registry.has_element("my-cmp", &[custom_elements_schema()]));
        assert!(registry.has_property("my-cmp", "foo", &[custom_elements_schema()]));
        assert!(!registry.has_property("ng-container", "foo", &[custom_elements_schema()]));
        assert!(registry.has_property("div", "anything", &[no_errors_schema()]));
        assert!(registry.has_element("ng-content", &[]));
    }

    #[test]
    fn should_map_attribute_names_to_properties() {
        let registry = DomElementSchemaRegistry::new();
        assert_eq!(registry.get_mapped_prop_name("class"), "className");
        assert_eq!(registry.get_mapped_prop_name("title"), "title");
        assert_eq!(
            registry.security_context("a", "href", true),
            SecurityContext::Url
        );
        assert_eq!(
            registry.security_context("div", "innerHtml", true),
            SecurityContext::Html
        );
    }

    #[test]
    fn should_reject_event_bindings() {
        let registry = DomElementSchemaRegistry::new();
        let result = registry.validate_property("onClick");
        assert!(result.error);
        assert!(result
            .msg
            .unwrap()
            .starts_with("Binding to event property 'onClick' is disallowed for security reasons, please use (Click)=..."));
        assert!(!registry.validate_attribute("title").error);
    }

    #[test]
    fn should_normalize_animation_values() {
        let registry = DomElementSchemaRegistry::new();
        assert_eq!(registry.normalize_animation_style_property("border-width"), "borderWidth");
        let result = registry.normalize_animation_style_value("width", "width", "10");
        assert_eq!(result.value, "10px");
        let result = registry.normalize_animation_style_value("width", "width", "10 ");
        assert_eq!(result.value, "10px");
        let result = registry.normalize_animation_style_value("opacity", "opacity", "0.5");
        assert_eq!(result.value, "0.5");
        assert!(result.error.is_empty());
    }
}
