//! Normalized animation triggers.

use crate::aot::static_value::StaticValue;
use indexmap::IndexMap;

pub type AnimationStyleMap = IndexMap<String, StaticValue>;

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationEntryAst {
    pub name: String,
    pub state_declarations: Vec<AnimationStateDeclarationAst>,
    pub state_transitions: Vec<AnimationStateTransitionAst>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationStateDeclarationAst {
    pub state_name: String,
    pub styles: AnimationStyleMap,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimationStateTransitionExpression {
    pub from_state: String,
    pub to_state: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationStateTransitionAst {
    pub state_changes: Vec<AnimationStateTransitionExpression>,
    pub animation: AnimationAst,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationKeyframeAst {
    pub offset: f64,
    pub styles: AnimationStyleMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnimationStepAst {
    /// Styles applied before the first keyframe.
    pub starting_styles: AnimationStyleMap,
    pub keyframes: Vec<AnimationKeyframeAst>,
    /// Milliseconds.
    pub duration: f64,
    pub delay: f64,
    pub easing: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnimationAst {
    Step(AnimationStepAst),
    Sequence(Vec<AnimationAst>),
    Group(Vec<AnimationAst>),
}

impl AnimationAst {
    /// Time the animation takes from start to end, delays included.
    pub fn total_time(&self) -> f64 {
        match self {
            AnimationAst::Step(step) => step.duration + step.delay,
            AnimationAst::Sequence(steps) => steps.iter().map(AnimationAst::total_time).sum(),
            AnimationAst::Group(steps) => steps
                .iter()
                .map(AnimationAst::total_time)
                .fold(0.0, f64::max),
        }
    }
}
