//! Animation factories.
//!
//! Each trigger becomes `<Comp>_<trigger>_factory(view, element,
//! currentState, nextState)`. The factory picks the first transition
//! matching the state change, builds its player and returns an
//! `AnimationTransition`.

use super::animation_ast::*;
use super::{ANY_STATE, EMPTY_STATE};
use crate::compile_reflector::CompileReflector;
use crate::compiler_util::identifier_util::convert_value_to_output_ast;
use crate::error::Result;
use crate::identifiers::{resolve_identifier, IdentifierSpec, Identifiers};
use crate::output::output_ast::{self as o, DeclareFunctionStmt, Expression, FnParam, Statement};
use crate::util::sanitize_identifier;
use indexmap::IndexMap;
use std::rc::Rc;

const VIEW_VAR: &str = "view";
const ELEMENT_VAR: &str = "element";
const CURRENT_STATE_VAR: &str = "currentState";
const NEXT_STATE_VAR: &str = "nextState";
const PREVIOUS_PLAYERS_VAR: &str = "previousPlayers";
const COLLECTED_STYLES_VAR: &str = "collectedStyles";
const PLAYER_VAR: &str = "player";
const TOTAL_TIME_VAR: &str = "totalTime";
const DEFAULT_STATE_STYLES_VAR: &str = "defaultStateStyles";
const START_STATE_STYLES_VAR: &str = "currentStateStyles";
const END_STATE_STYLES_VAR: &str = "nextStateStyles";

#[derive(Debug, Clone)]
pub struct AnimationEntryCompileResult {
    /// Trigger name as used in templates.
    pub name: String,
    /// Name of the factory function declared by `statements`.
    pub fn_name: String,
    pub statements: Vec<Statement>,
}

pub struct AnimationCompiler {
    reflector: Rc<dyn CompileReflector>,
}

impl AnimationCompiler {
    pub fn new(reflector: Rc<dyn CompileReflector>) -> Self {
        AnimationCompiler { reflector }
    }

    pub fn compile(
        &self,
        component_name: &str,
        entries: &[AnimationEntryAst],
    ) -> Result<Vec<AnimationEntryCompileResult>> {
        entries
            .iter()
            .map(|entry| {
                let prefix = format!("{}_{}", component_name, sanitize_identifier(&entry.name));
                EntryBuilder {
                    reflector: self.reflector.as_ref(),
                    entry,
                    states_var: format!("{}_states", prefix),
                    fn_name: format!("{}_factory", prefix),
                    states: IndexMap::new(),
                }
                .build()
            })
            .collect()
    }
}

struct EntryBuilder<'a> {
    reflector: &'a dyn CompileReflector,
    entry: &'a AnimationEntryAst,
    states_var: String,
    fn_name: String,
    states: IndexMap<String, Option<AnimationStyleMap>>,
}

/// Per-transition bookkeeping while its player expression is built.
struct TransitionContext {
    expecting_first_style: bool,
    expecting_first_animate: bool,
    step_count: usize,
    last_step: usize,
}

impl<'a> EntryBuilder<'a> {
    fn import(&self, spec: &IdentifierSpec) -> Result<Expression> {
        Ok(o::import_expr(resolve_identifier(self.reflector, spec)?))
    }

    fn build(mut self) -> Result<AnimationEntryCompileResult> {
        let entry = self.entry;
        self.states.insert(ANY_STATE.to_string(), None);
        for declaration in &entry.state_declarations {
            self.states
                .insert(declaration.state_name.clone(), Some(declaration.styles.clone()));
        }

        let view = o::variable(VIEW_VAR);
        let element = o::variable(ELEMENT_VAR);
        let current_state = o::variable(CURRENT_STATE_VAR);
        let next_state = o::variable(NEXT_STATE_VAR);
        let player = o::variable(PLAYER_VAR);
        let renderer = view.clone().prop("renderer");
        let animation_context = view.prop("animationContext");
        let states = o::variable(self.states_var.clone());
        let start_styles = o::variable(START_STATE_STYLES_VAR);
        let end_styles = o::variable(END_STATE_STYLES_VAR);
        let default_styles = o::variable(DEFAULT_STATE_STYLES_VAR);
        let render_styles = self.import(&Identifiers::renderStyles)?;

        let mut body = vec![
            animation_context
                .clone()
                .call_method(
                    "getAnimationPlayers",
                    vec![
                        element.clone(),
                        next_state
                            .clone()
                            .equals(o::literal(EMPTY_STATE))
                            .conditional(o::null_expr(), Some(o::literal(self.entry.name.as_str()))),
                    ],
                )
                .to_decl_stmt(PREVIOUS_PLAYERS_VAR, false),
            o::literal_map(Vec::new()).to_decl_stmt(COLLECTED_STYLES_VAR, false),
            o::null_expr().to_decl_stmt(PLAYER_VAR, false),
            o::literal(0usize).to_decl_stmt(TOTAL_TIME_VAR, false),
            states
                .clone()
                .key(o::literal(ANY_STATE))
                .to_decl_stmt(DEFAULT_STATE_STYLES_VAR, false),
            states
                .clone()
                .key(current_state.clone())
                .to_decl_stmt(START_STATE_STYLES_VAR, false),
            o::if_stmt(
                start_styles.clone().equals(o::null_expr()),
                vec![o::assign_var(START_STATE_STYLES_VAR, default_styles.clone())],
            ),
            states.key(next_state.clone()).to_decl_stmt(END_STATE_STYLES_VAR, false),
            o::if_stmt(
                end_styles.clone().equals(o::null_expr()),
                vec![o::assign_var(END_STATE_STYLES_VAR, default_styles)],
            ),
            render_styles
                .clone()
                .call_fn(vec![
                    element.clone(),
                    renderer.clone(),
                    self.import(&Identifiers::clearStyles)?
                        .call_fn(vec![start_styles.clone()]),
                ])
                .to_stmt(),
        ];

        for transition in &entry.state_transitions {
            body.push(self.visit_transition(transition)?);
        }

        body.push(o::if_stmt(
            player.clone().equals(o::null_expr()),
            vec![o::assign_var(
                PLAYER_VAR,
                self.import(&Identifiers::NoOpAnimationPlayer)?.instantiate(vec![]),
            )],
        ));
        body.push(
            player
                .clone()
                .call_method(
                    "onDone",
                    vec![o::fn_expr(
                        vec![],
                        vec![
                            player.clone().call_method("destroy", vec![]).to_stmt(),
                            render_styles
                                .call_fn(vec![
                                    element.clone(),
                                    renderer,
                                    self.import(&Identifiers::prepareFinalAnimationStyles)?
                                        .call_fn(vec![start_styles, end_styles]),
                                ])
                                .to_stmt(),
                        ],
                    )],
                )
                .to_stmt(),
        );
        body.push(
            self.import(&Identifiers::AnimationSequencePlayer)?
                .instantiate(vec![o::variable(PREVIOUS_PLAYERS_VAR)])
                .call_method("destroy", vec![])
                .to_stmt(),
        );
        body.push(
            animation_context
                .call_method(
                    "queueAnimation",
                    vec![element, o::literal(self.entry.name.as_str()), player.clone()],
                )
                .to_stmt(),
        );
        body.push(o::return_stmt(self.import(&Identifiers::AnimationTransition)?.instantiate(vec![
            player,
            current_state,
            next_state,
            o::variable(TOTAL_TIME_VAR),
        ])));

        let factory = Statement::DeclareFn(DeclareFunctionStmt {
            name: self.fn_name.clone(),
            params: [VIEW_VAR, ELEMENT_VAR, CURRENT_STATE_VAR, NEXT_STATE_VAR]
                .into_iter()
                .map(FnParam::new)
                .collect(),
            statements: body,
        });
        let states_map = o::literal_map(
            self.states
                .iter()
                .map(|(name, styles)| o::LiteralMapEntry {
                    key: name.clone(),
                    value: style_map_expr(styles.as_ref().unwrap_or(&AnimationStyleMap::new())),
                    quoted: true,
                })
                .collect(),
        );
        Ok(AnimationEntryCompileResult {
            name: self.entry.name.clone(),
            fn_name: self.fn_name,
            statements: vec![states_map.to_decl_stmt(self.states_var, false), factory],
        })
    }

    fn visit_transition(&mut self, transition: &AnimationStateTransitionAst) -> Result<Statement> {
        let mut preconditions = Vec::with_capacity(transition.state_changes.len());
        for change in &transition.state_changes {
            preconditions.push(
                compare_to_state(o::variable(CURRENT_STATE_VAR), &change.from_state)
                    .and(compare_to_state(o::variable(NEXT_STATE_VAR), &change.to_state)),
            );
            for state in [&change.from_state, &change.to_state] {
                if state != ANY_STATE {
                    self.states.entry(state.clone()).or_insert(None);
                }
            }
        }
        let matches_change = preconditions
            .into_iter()
            .reduce(|a, b| a.or(b))
            .unwrap_or_else(|| o::literal(false));

        let mut ctx = TransitionContext {
            expecting_first_style: true,
            expecting_first_animate: true,
            step_count: 0,
            last_step: count_steps(&transition.animation),
        };
        let player_expr = self.visit_animation(&transition.animation, &mut ctx)?;
        Ok(o::if_stmt(
            o::variable(PLAYER_VAR).equals(o::null_expr()).and(matches_change),
            vec![
                o::assign_var(PLAYER_VAR, player_expr),
                o::assign_var(TOTAL_TIME_VAR, o::literal(transition.animation.total_time())),
            ],
        ))
    }

    fn visit_animation(&self, ast: &AnimationAst, ctx: &mut TransitionContext) -> Result<Expression> {
        match ast {
            AnimationAst::Sequence(steps) => {
                let players = steps
                    .iter()
                    .map(|step| self.visit_animation(step, ctx))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self
                    .import(&Identifiers::AnimationSequencePlayer)?
                    .instantiate(vec![o::literal_arr(players)]))
            }
            AnimationAst::Group(steps) => {
                let players = steps
                    .iter()
                    .map(|step| self.visit_animation(step, ctx))
                    .collect::<Result<Vec<_>>>()?;
                Ok(self
                    .import(&Identifiers::AnimationGroupPlayer)?
                    .instantiate(vec![o::literal_arr(players)]))
            }
            AnimationAst::Step(step) => self.visit_step(step, ctx),
        }
    }

    fn visit_step(&self, step: &AnimationStepAst, ctx: &mut TransitionContext) -> Result<Expression> {
        ctx.step_count += 1;
        let starting_styles = self.styles_expr(&step.starting_styles, ctx)?;
        let keyframes = step
            .keyframes
            .iter()
            .map(|keyframe| {
                Ok(self.import(&Identifiers::AnimationKeyframe)?.instantiate(vec![
                    o::literal(keyframe.offset),
                    self.styles_expr(&keyframe.styles, ctx)?,
                ]))
            })
            .collect::<Result<Vec<_>>>()?;
        let mut keyframes_expr = o::literal_arr(keyframes);
        // The last step ends on the styles of the destination state.
        if ctx.step_count == ctx.last_step {
            keyframes_expr = self.import(&Identifiers::balanceAnimationKeyframes)?.call_fn(vec![
                o::variable(COLLECTED_STYLES_VAR),
                o::variable(END_STATE_STYLES_VAR),
                keyframes_expr,
            ]);
        }
        let previous_players = if ctx.expecting_first_animate {
            ctx.expecting_first_animate = false;
            o::variable(PREVIOUS_PLAYERS_VAR)
        } else {
            o::literal_arr(Vec::new())
        };
        Ok(o::variable(VIEW_VAR).prop("renderer").call_method(
            "animate",
            vec![
                o::variable(ELEMENT_VAR),
                starting_styles,
                keyframes_expr,
                o::literal(step.duration),
                o::literal(step.delay),
                step.easing.as_deref().map_or_else(o::null_expr, o::literal),
                previous_players,
            ],
        ))
    }

    /// `new AnimationStyles(collectAndResolveStyles(collectedStyles, [...]))`;
    /// the first styles of a transition start from the current state.
    fn styles_expr(&self, styles: &AnimationStyleMap, ctx: &mut TransitionContext) -> Result<Expression> {
        let mut entries = Vec::with_capacity(2);
        if ctx.expecting_first_style {
            ctx.expecting_first_style = false;
            entries.push(o::variable(START_STATE_STYLES_VAR));
        }
        entries.push(style_map_expr(styles));
        Ok(self.import(&Identifiers::AnimationStyles)?.instantiate(vec![self
            .import(&Identifiers::collectAndResolveStyles)?
            .call_fn(vec![o::variable(COLLECTED_STYLES_VAR), o::literal_arr(entries)])]))
    }
}

fn compare_to_state(value: Expression, state: &str) -> Expression {
    match state {
        ANY_STATE => o::literal(true),
        _ => value.equals(o::literal(state)),
    }
}

fn count_steps(ast: &AnimationAst) -> usize {
    match ast {
        AnimationAst::Step(_) => 1,
        AnimationAst::Sequence(steps) | AnimationAst::Group(steps) => steps.iter().map(count_steps).sum(),
    }
}

fn style_map_expr(styles: &AnimationStyleMap) -> Expression {
    o::literal_map(
        styles
            .iter()
            .map(|(prop, value)| o::LiteralMapEntry {
                key: prop.clone(),
                value: convert_value_to_output_ast(value),
                quoted: true,
            })
            .collect(),
    )
}
