//! Compiles declarative quest definitions into runtime quests.

use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};
use tale_data::{ConditionDef, ConditionExpr, CriteriaDef, QuestDef};

use crate::quest::{Condition, CriteriaBuilder, CriteriaRole, Quest, QuestCriteria, QuestFactory, QuestInfo};

/// Build a runtime [`Quest`] from its definition.
///
/// The quest's own callbacks only log; the quest log announces resolutions on the bus.
///
/// # Errors
/// Fails on criteria that cannot be assembled (bad durations, empty criteria) or if
/// the factory rejects the result.
pub fn build_quest(def: &QuestDef) -> Result<Quest> {
    let completion = build_criteria_set(&def.complete_when, CriteriaRole::Completion)
        .with_context(|| format!("building completion criteria for quest '{}'", def.id))?;
    let failure = build_criteria_set(&def.fail_when, CriteriaRole::Failure)
        .with_context(|| format!("building failure criteria for quest '{}'", def.id))?;

    let quest = QuestFactory::new().build(
        QuestInfo::new(&def.id, &def.name, &def.description),
        completion,
        failure,
        Box::new(|info: &QuestInfo| info!("quest completed: {} ({})", info.name, info.id)),
        Some(Box::new(|info: &QuestInfo| warn!("quest failed: {} ({})", info.name, info.id))),
    )?;
    Ok(quest)
}

fn build_criteria_set(defs: &[CriteriaDef], role: CriteriaRole) -> Result<Vec<QuestCriteria>> {
    defs.iter()
        .enumerate()
        .map(|(index, def)| build_criteria(def, role).with_context(|| format!("{role} criteria #{index}")))
        .collect()
}

fn build_criteria(def: &CriteriaDef, role: CriteriaRole) -> Result<QuestCriteria> {
    let mut builder = CriteriaBuilder::new();
    if let Some(expr) = &def.condition {
        let condition = compile(expr);
        builder = builder.when(move |state| condition.holds(state))?;
    }
    if let Some(secs) = def.after_secs {
        let limit = Duration::try_from_secs_f64(secs).with_context(|| format!("invalid after_secs value {secs}"))?;
        builder = builder.if_time_has_passed(limit)?;
    }
    let criteria = match role {
        CriteriaRole::Completion => builder.then_progress_this_quest()?,
        CriteriaRole::Failure => builder.then_fail_this_quest()?,
    };
    Ok(criteria)
}

/// Turn a condition expression into a predicate over game state.
///
/// An empty `all` holds; an empty `any` does not. Content files never reach here with
/// an empty group since validation rejects them at any depth.
pub fn compile(expr: &ConditionExpr) -> Condition {
    match expr {
        ConditionExpr::All(exprs) => exprs
            .iter()
            .fold(Condition::when(|_| true), |acc, e| acc.and_all(compile(e))),
        ConditionExpr::Any(exprs) => exprs
            .iter()
            .fold(Condition::when(|_| false), |acc, e| acc.or_all(compile(e))),
        ConditionExpr::Not(inner) => compile(inner).negate(),
        ConditionExpr::Pred(def) => compile_pred(def.clone()),
    }
}

fn compile_pred(def: ConditionDef) -> Condition {
    match def {
        ConditionDef::FlagSet { flag } => Condition::when(move |s| s.flags.is_set(&flag)),
        ConditionDef::FlagUnset { flag } => Condition::when_not(move |s| s.flags.is_set(&flag)),
        ConditionDef::CounterAtLeast { counter, value } => {
            Condition::when(move |s| s.counters.try_get(&counter).is_some_and(|c| c >= value))
        },
        ConditionDef::CounterBelow { counter, value } => {
            Condition::when(move |s| s.counters.try_get(&counter).is_some_and(|c| c < value))
        },
        ConditionDef::LabelIs { label, value } => {
            Condition::when(move |s| s.labels.try_get(&label) == Some(value.as_str()))
        },
    }
}
