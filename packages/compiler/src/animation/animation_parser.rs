//! Validates and normalizes the animation triggers of a component.

use super::animation_ast::*;
use super::{ANY_STATE, EMPTY_STATE};
use crate::aot::static_value::StaticValue;
use crate::compile_metadata::{
    identifier_name, AnimationStyleToken, CompileAnimationEntryMetadata, CompileAnimationMetadata,
    CompileAnimationStateMetadata, CompileAnimationStyleMetadata, CompileDirectiveMetadata,
};
use crate::error::{CompilerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static TRANSITION_EXPR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*|[-\w]+)\s*(<?[=-]>)\s*(\*|[-\w]+)$").unwrap());

static TIMING_EXPR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(-?[\.\d]+)(m?s)(?:\s+(-?[\.\d]+)(m?s))?(?:\s+([-a-z]+(?:\(.+?\))?))?$").unwrap()
});

const ENTER_ALIAS: &str = ":enter";
const LEAVE_ALIAS: &str = ":leave";

#[derive(Debug, Default)]
pub struct AnimationParser;

impl AnimationParser {
    pub fn new() -> Self {
        AnimationParser
    }

    /// Parses every trigger of `component`. All problems are reported at
    /// once, grouped by trigger.
    pub fn parse_component(&self, component: &CompileDirectiveMetadata) -> Result<Vec<AnimationEntryAst>> {
        let component_name = identifier_name(component.reference());
        let entries = component
            .template
            .as_ref()
            .map(|template| template.animations.as_slice())
            .unwrap_or_default();
        let mut trigger_names = HashSet::new();
        let mut messages = Vec::new();
        let mut asts = Vec::with_capacity(entries.len());
        for entry in entries {
            let (ast, mut errors) = self.parse_entry(entry);
            if !trigger_names.insert(ast.name.clone()) {
                errors.push(format!(
                    "The animation trigger \"{}\" has already been registered for the {} component",
                    ast.name, component_name
                ));
            }
            if !errors.is_empty() {
                let mut message = format!(
                    "- Unable to parse the animation sequence for \"{}\" due to the following errors:",
                    ast.name
                );
                for error in errors {
                    message.push_str("\n-- ");
                    message.push_str(&error);
                }
                messages.push(message);
            }
            asts.push(ast);
        }
        if !messages.is_empty() {
            return Err(CompilerError::syntax(format!(
                "Animation parse errors:\n{}",
                messages.join("\n")
            )));
        }
        tracing::trace!(component = %component_name, triggers = asts.len(), "parsed animations");
        Ok(asts)
    }

    pub fn parse_entry(&self, entry: &CompileAnimationEntryMetadata) -> (AnimationEntryAst, Vec<String>) {
        let mut errors = Vec::new();
        let mut state_declarations = Vec::new();
        let mut state_transitions = Vec::new();
        for definition in &entry.definitions {
            match definition {
                CompileAnimationStateMetadata::Declaration {
                    state_name_expr,
                    styles,
                } => {
                    let styles = parse_styles(styles, &mut errors);
                    for state_name in state_name_expr.split(',') {
                        state_declarations.push(AnimationStateDeclarationAst {
                            state_name: state_name.trim().to_string(),
                            styles: styles.clone(),
                        });
                    }
                }
                CompileAnimationStateMetadata::Transition {
                    state_change_expr,
                    steps,
                } => {
                    let state_changes = parse_transition_expr(state_change_expr, &mut errors);
                    let animation = match steps {
                        CompileAnimationMetadata::Sequence { steps } => {
                            AnimationAst::Sequence(parse_sequence(steps, &mut errors))
                        }
                        CompileAnimationMetadata::Group { .. } => parse_step(steps, AnimationStyleMap::new(), &mut errors),
                        other => AnimationAst::Sequence(parse_sequence(std::slice::from_ref(other), &mut errors)),
                    };
                    state_transitions.push(AnimationStateTransitionAst {
                        state_changes,
                        animation,
                    });
                }
            }
        }
        let ast = AnimationEntryAst {
            name: entry.name.clone(),
            state_declarations,
            state_transitions,
        };
        (ast, errors)
    }
}

fn parse_transition_expr(expr: &str, errors: &mut Vec<String>) -> Vec<AnimationStateTransitionExpression> {
    let mut changes = Vec::new();
    for part in expr.split(',') {
        let part = part.trim();
        let (from, op, to) = match part {
            ENTER_ALIAS => (EMPTY_STATE, "=>", ANY_STATE),
            LEAVE_ALIAS => (ANY_STATE, "=>", EMPTY_STATE),
            _ => match TRANSITION_EXPR.captures(part) {
                Some(caps) => match (caps.get(1), caps.get(2), caps.get(3)) {
                    (Some(from), Some(op), Some(to)) => (from.as_str(), op.as_str(), to.as_str()),
                    _ => continue,
                },
                None => {
                    errors.push(format!(
                        "the provided {} is not of a supported format, please use one of the following: stateA => stateB, stateA <=> stateB",
                        part
                    ));
                    continue;
                }
            },
        };
        changes.push(AnimationStateTransitionExpression {
            from_state: from.to_string(),
            to_state: to.to_string(),
        });
        if op.starts_with('<') && !(from == ANY_STATE && to == ANY_STATE) {
            changes.push(AnimationStateTransitionExpression {
                from_state: to.to_string(),
                to_state: from.to_string(),
            });
        }
    }
    changes
}

/// A bare `style()` directly followed by `animate()` becomes the starting
/// styles of that step; anywhere else it is applied without delay.
fn parse_sequence(steps: &[CompileAnimationMetadata], errors: &mut Vec<String>) -> Vec<AnimationAst> {
    let mut result = Vec::with_capacity(steps.len());
    let mut pending: Option<AnimationStyleMap> = None;
    for step in steps {
        match step {
            CompileAnimationMetadata::Style(styles) => {
                if let Some(previous) = pending.take() {
                    result.push(style_step(previous));
                }
                pending = Some(parse_styles(styles, errors));
            }
            CompileAnimationMetadata::Animate { .. } => {
                let starting_styles = pending.take().unwrap_or_default();
                result.push(parse_step(step, starting_styles, errors));
            }
            other => {
                if let Some(previous) = pending.take() {
                    result.push(style_step(previous));
                }
                result.push(parse_step(other, AnimationStyleMap::new(), errors));
            }
        }
    }
    if let Some(previous) = pending {
        result.push(style_step(previous));
    }
    result
}

fn parse_step(
    step: &CompileAnimationMetadata,
    starting_styles: AnimationStyleMap,
    errors: &mut Vec<String>,
) -> AnimationAst {
    match step {
        CompileAnimationMetadata::Style(styles) => style_step(parse_styles(styles, errors)),
        CompileAnimationMetadata::Sequence { steps } => AnimationAst::Sequence(parse_sequence(steps, errors)),
        CompileAnimationMetadata::Group { steps } => AnimationAst::Group(
            steps
                .iter()
                .map(|step| parse_step(step, AnimationStyleMap::new(), errors))
                .collect(),
        ),
        CompileAnimationMetadata::Keyframes { .. } => {
            errors.push("keyframes() must be placed inside of a call to animate()".to_string());
            AnimationAst::Sequence(Vec::new())
        }
        CompileAnimationMetadata::Animate { timings, styles } => {
            let (duration, delay, easing) = parse_timings(timings, errors);
            let keyframes = match styles.as_ref() {
                CompileAnimationMetadata::Style(styles) => vec![
                    AnimationKeyframeAst {
                        offset: 0.0,
                        styles: AnimationStyleMap::new(),
                    },
                    AnimationKeyframeAst {
                        offset: 1.0,
                        styles: parse_styles(styles, errors),
                    },
                ],
                CompileAnimationMetadata::Keyframes { steps } => parse_keyframes(steps, errors),
                _ => {
                    errors.push("animate() only accepts a style() or keyframes() entry".to_string());
                    Vec::new()
                }
            };
            AnimationAst::Step(AnimationStepAst {
                starting_styles,
                keyframes,
                duration,
                delay,
                easing,
            })
        }
    }
}

fn style_step(styles: AnimationStyleMap) -> AnimationAst {
    AnimationAst::Step(AnimationStepAst {
        starting_styles: AnimationStyleMap::new(),
        keyframes: vec![AnimationKeyframeAst { offset: 1.0, styles }],
        duration: 0.0,
        delay: 0.0,
        easing: None,
    })
}

fn parse_styles(styles: &CompileAnimationStyleMetadata, errors: &mut Vec<String>) -> AnimationStyleMap {
    let mut map = AnimationStyleMap::new();
    for token in &styles.styles {
        match token {
            AnimationStyleToken::Map(entries) => {
                for (prop, value) in entries {
                    map.insert(prop.clone(), value.clone());
                }
            }
            AnimationStyleToken::Name(name) => errors.push(format!(
                "\"{}\" is not a supported style entry, style() expects a map of style properties",
                name
            )),
        }
    }
    map
}

fn parse_keyframes(steps: &[CompileAnimationStyleMetadata], errors: &mut Vec<String>) -> Vec<AnimationKeyframeAst> {
    let total = steps.len();
    let with_offset = steps.iter().filter(|step| step.offset.is_some()).count();
    if with_offset > 0 && with_offset < total {
        errors.push("Not all style() entries contain an offset for the provided keyframe()".to_string());
        return Vec::new();
    }
    let mut keyframes: Vec<AnimationKeyframeAst> = Vec::with_capacity(total + 2);
    let mut previous = 0.0;
    for (index, step) in steps.iter().enumerate() {
        let offset = match step.offset {
            Some(offset) => offset,
            None if total > 1 => index as f64 / (total - 1) as f64,
            None => 1.0,
        };
        if !(0.0..=1.0).contains(&offset) {
            errors.push("Offset values for animations must be between 0 and 1".to_string());
            return Vec::new();
        }
        if offset < previous {
            errors.push("Please ensure that all keyframe offsets are in order".to_string());
            return Vec::new();
        }
        previous = offset;
        keyframes.push(AnimationKeyframeAst {
            offset,
            styles: parse_styles(step, errors),
        });
    }
    if keyframes.first().map_or(true, |first| first.offset != 0.0) {
        keyframes.insert(
            0,
            AnimationKeyframeAst {
                offset: 0.0,
                styles: AnimationStyleMap::new(),
            },
        );
    }
    if let Some(last) = keyframes.last() {
        if last.offset != 1.0 {
            let styles = last.styles.clone();
            keyframes.push(AnimationKeyframeAst { offset: 1.0, styles });
        }
    }
    keyframes
}

/// `(duration, delay, easing)` in milliseconds.
fn parse_timings(timings: &StaticValue, errors: &mut Vec<String>) -> (f64, f64, Option<String>) {
    let (duration, delay, easing) = match timings {
        StaticValue::Number(duration) => (*duration, 0.0, None),
        StaticValue::String(expr) => match TIMING_EXPR.captures(expr.trim()) {
            Some(caps) => {
                let to_millis = |value: Option<regex::Match>, unit: Option<regex::Match>| {
                    let value = value.and_then(|v| v.as_str().parse::<f64>().ok()).unwrap_or(0.0);
                    match unit.map(|u| u.as_str()) {
                        Some("s") => value * 1000.0,
                        _ => value,
                    }
                };
                (
                    to_millis(caps.get(1), caps.get(2)),
                    to_millis(caps.get(3), caps.get(4)),
                    caps.get(5).map(|easing| easing.as_str().to_string()),
                )
            }
            None => {
                errors.push(format!("The provided timing value \"{}\" is invalid.", expr));
                return (0.0, 0.0, None);
            }
        },
        other => {
            errors.push(format!("The provided timing value \"{}\" is invalid.", other.to_js_string()));
            return (0.0, 0.0, None);
        }
    };
    if duration < 0.0 {
        errors.push("Duration values below 0 are not allowed for this animation step.".to_string());
    }
    if delay < 0.0 {
        errors.push("Delay values below 0 are not allowed for this animation step.".to_string());
    }
    (duration, delay, easing)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile_metadata::{CompileTemplateMetadata, CompileTypeMetadata, DirectiveMetadataInput};
    use crate::testing::MockReflector;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn style(entries: &[(&str, StaticValue)]) -> CompileAnimationStyleMetadata {
        let map: IndexMap<String, StaticValue> =
            entries.iter().map(|(k, v)| (k.to_string(), v.clone())).collect();
        CompileAnimationStyleMetadata {
            offset: None,
            styles: vec![AnimationStyleToken::Map(map)],
        }
    }

    fn animate(timings: &str, styles: CompileAnimationMetadata) -> CompileAnimationMetadata {
        CompileAnimationMetadata::Animate {
            timings: StaticValue::from(timings),
            styles: Box::new(styles),
        }
    }

    fn transition(expr: &str, steps: CompileAnimationMetadata) -> CompileAnimationStateMetadata {
        CompileAnimationStateMetadata::Transition {
            state_change_expr: expr.to_string(),
            steps,
        }
    }

    fn component(entries: Vec<CompileAnimationEntryMetadata>) -> CompileDirectiveMetadata {
        let reflector = MockReflector::new();
        CompileDirectiveMetadata::create(
            CompileTypeMetadata::new(reflector.symbol("/app/comp.ts", "Comp")),
            DirectiveMetadataInput {
                is_component: true,
                template: Some(CompileTemplateMetadata {
                    animations: entries,
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
    }

    #[test]
    fn should_expand_bidirectional_and_alias_transitions() {
        let mut errors = Vec::new();
        let changes = parse_transition_expr("open <=> closed, :enter", &mut errors);
        assert!(errors.is_empty());
        let pairs: Vec<(&str, &str)> = changes
            .iter()
            .map(|c| (c.from_state.as_str(), c.to_state.as_str()))
            .collect();
        assert_eq!(pairs, vec![("open", "closed"), ("closed", "open"), ("void", "*")]);
    }

    #[test]
    fn should_parse_timings() {
        let mut errors = Vec::new();
        assert_eq!(
            parse_timings(&StaticValue::from("1s 100ms ease-out"), &mut errors),
            (1000.0, 100.0, Some("ease-out".to_string()))
        );
        assert_eq!(parse_timings(&StaticValue::Number(250.0), &mut errors), (250.0, 0.0, None));
        assert!(errors.is_empty());
        parse_timings(&StaticValue::from("fast"), &mut errors);
        assert_eq!(errors, vec!["The provided timing value \"fast\" is invalid.".to_string()]);
    }

    #[test]
    fn should_merge_leading_style_into_the_next_animate_step() {
        let entry = CompileAnimationEntryMetadata {
            name: "fade".to_string(),
            definitions: vec![transition(
                "* => *",
                CompileAnimationMetadata::Sequence {
                    steps: vec![
                        CompileAnimationMetadata::Style(style(&[("opacity", StaticValue::Number(0.0))])),
                        animate("500ms", CompileAnimationMetadata::Style(style(&[("opacity", StaticValue::Number(1.0))]))),
                    ],
                },
            )],
        };
        let asts = AnimationParser::new().parse_component(&component(vec![entry])).unwrap();
        let steps = match &asts[0].state_transitions[0].animation {
            AnimationAst::Sequence(steps) => steps,
            other => panic!("unexpected {:?}", other),
        };
        assert_eq!(steps.len(), 1);
        match &steps[0] {
            AnimationAst::Step(step) => {
                assert_eq!(step.starting_styles["opacity"], StaticValue::Number(0.0));
                assert_eq!(step.duration, 500.0);
                assert_eq!(step.keyframes.len(), 2);
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(asts[0].state_transitions[0].animation.total_time(), 500.0);
    }

    #[test]
    fn should_fill_missing_keyframe_offsets() {
        let mut errors = Vec::new();
        let keyframes = parse_keyframes(
            &[
                style(&[("left", StaticValue::Number(0.0))]),
                style(&[("left", StaticValue::Number(50.0))]),
                style(&[("left", StaticValue::Number(100.0))]),
            ],
            &mut errors,
        );
        let offsets: Vec<f64> = keyframes.iter().map(|k| k.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);

        let mut partial = style(&[]);
        partial.offset = Some(0.3);
        parse_keyframes(&[partial, style(&[])], &mut errors);
        assert_eq!(
            errors,
            vec!["Not all style() entries contain an offset for the provided keyframe()".to_string()]
        );
    }

    #[test]
    fn should_report_errors_per_trigger() {
        let bad = CompileAnimationEntryMetadata {
            name: "open".to_string(),
            definitions: vec![transition(
                "open -> ",
                animate("-1s", CompileAnimationMetadata::Style(style(&[]))),
            )],
        };
        let err = AnimationParser::new()
            .parse_component(&component(vec![bad.clone(), bad]))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with(
            "Animation parse errors:\n- Unable to parse the animation sequence for \"open\" due to the following errors:"
        ));
        assert!(message.contains("-- the provided open -> is not of a supported format"));
        assert!(message.contains("-- Duration values below 0 are not allowed for this animation step."));
        assert!(message.contains("The animation trigger \"open\" has already been registered for the Comp component"));
    }
}
