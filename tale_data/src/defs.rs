use serde::{Deserialize, Serialize};

use crate::manifest::KeyKind;

/// Stable identifier used to refer to quests from content.
pub type Id = String;

/// Top-level contents of a quest definition file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuestFile {
    #[serde(default)]
    pub quests: Vec<QuestDef>,
}

/// A quest as authored: metadata plus completion and failure criteria.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestDef {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub complete_when: Vec<CriteriaDef>,
    #[serde(default)]
    pub fail_when: Vec<CriteriaDef>,
}

/// One criteria object: an optional state condition and an optional elapsed-time gate.
///
/// A criteria def with neither is rejected by validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriteriaDef {
    #[serde(default)]
    pub condition: Option<ConditionExpr>,
    /// Seconds of ticked time that must pass before the criteria can hold.
    #[serde(default)]
    pub after_secs: Option<f64>,
}

impl CriteriaDef {
    pub fn is_empty(&self) -> bool {
        self.condition.is_none() && self.after_secs.is_none()
    }
}

/// Boolean composition of state predicates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionExpr {
    All(Vec<ConditionExpr>),
    Any(Vec<ConditionExpr>),
    Not(Box<ConditionExpr>),
    Pred(ConditionDef),
}

impl ConditionExpr {
    /// Every state key this expression reads, tagged with its namespace.
    pub fn referenced_keys(&self) -> Vec<(KeyKind, &str)> {
        let mut keys = Vec::new();
        self.collect_keys(&mut keys);
        keys
    }

    /// True if an `all` or `any` group anywhere in the tree has no members.
    pub fn has_empty_group(&self) -> bool {
        match self {
            ConditionExpr::All(exprs) | ConditionExpr::Any(exprs) => {
                exprs.is_empty() || exprs.iter().any(ConditionExpr::has_empty_group)
            },
            ConditionExpr::Not(inner) => inner.has_empty_group(),
            ConditionExpr::Pred(_) => false,
        }
    }

    fn collect_keys<'a>(&'a self, keys: &mut Vec<(KeyKind, &'a str)>) {
        match self {
            ConditionExpr::All(exprs) | ConditionExpr::Any(exprs) => {
                exprs.iter().for_each(|e| e.collect_keys(keys));
            },
            ConditionExpr::Not(inner) => inner.collect_keys(keys),
            ConditionExpr::Pred(def) => keys.push(def.key()),
        }
    }
}

/// Leaf predicates over the game state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConditionDef {
    FlagSet { flag: String },
    FlagUnset { flag: String },
    CounterAtLeast { counter: String, value: i32 },
    CounterBelow { counter: String, value: i32 },
    LabelIs { label: String, value: String },
}

impl ConditionDef {
    /// The key this predicate reads.
    pub fn key(&self) -> (KeyKind, &str) {
        match self {
            ConditionDef::FlagSet { flag } | ConditionDef::FlagUnset { flag } => (KeyKind::Flag, flag),
            ConditionDef::CounterAtLeast { counter, .. } | ConditionDef::CounterBelow { counter, .. } => {
                (KeyKind::Counter, counter)
            },
            ConditionDef::LabelIs { label, .. } => (KeyKind::Label, label),
        }
    }
}
