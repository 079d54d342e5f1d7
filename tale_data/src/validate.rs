use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Validation error for malformed quest definitions or unregistered keys.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateId { kind: &'static str, id: String },
    UnregisteredKey { kind: KeyKind, key: String, context: String },
    EmptyCriteria { context: String },
    NoCompletionCriteria { quest: String },
    InvalidValue { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateId { kind, id } => {
                write!(f, "duplicate {kind} id '{id}'")
            },
            ValidationError::UnregisteredKey { kind, key, context } => {
                write!(f, "unregistered {kind} '{key}' ({context})")
            },
            ValidationError::EmptyCriteria { context } => {
                write!(f, "criteria has neither a condition nor a time limit ({context})")
            },
            ValidationError::NoCompletionCriteria { quest } => {
                write!(f, "quest '{quest}' has no completion criteria")
            },
            ValidationError::InvalidValue { context } => {
                write!(f, "invalid value ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validate quest definitions against the registered keys.
///
/// ```
/// use tale_data::{ConditionDef, ConditionExpr, CriteriaDef, KeyManifest, QuestDef, QuestFile, validate_quests};
///
/// let manifest: KeyManifest = KeyManifest {
///     flags: [("lamp_lit".to_string(), false)].into(),
///     ..KeyManifest::default()
/// };
/// let file = QuestFile {
///     quests: vec![QuestDef {
///         id: "light".into(),
///         name: "Light".into(),
///         description: String::new(),
///         complete_when: vec![CriteriaDef {
///             condition: Some(ConditionExpr::Pred(ConditionDef::FlagSet { flag: "lamp_lit".into() })),
///             after_secs: None,
///         }],
///         fail_when: Vec::new(),
///     }],
/// };
/// assert!(validate_quests(&file, &manifest).is_empty());
/// ```
pub fn validate_quests(file: &QuestFile, manifest: &KeyManifest) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for quest in &file.quests {
        if !seen.insert(quest.id.as_str()) {
            errors.push(ValidationError::DuplicateId {
                kind: "quest",
                id: quest.id.clone(),
            });
        }
        if quest.complete_when.is_empty() {
            errors.push(ValidationError::NoCompletionCriteria { quest: quest.id.clone() });
        }

        let sets = [("complete_when", &quest.complete_when), ("fail_when", &quest.fail_when)];
        for (set_name, criteria) in sets {
            for (idx, def) in criteria.iter().enumerate() {
                let context = format!("quest '{}' {set_name}[{idx}]", quest.id);
                validate_criteria(def, manifest, &mut errors, &context);
            }
        }
    }

    errors
}

fn validate_criteria(def: &CriteriaDef, manifest: &KeyManifest, errors: &mut Vec<ValidationError>, context: &str) {
    if def.is_empty() {
        errors.push(ValidationError::EmptyCriteria {
            context: context.to_string(),
        });
        return;
    }
    if let Some(secs) = def.after_secs
        && !(secs.is_finite() && secs >= 0.0)
    {
        errors.push(ValidationError::InvalidValue {
            context: format!("{context}: after_secs = {secs}"),
        });
    }
    if let Some(expr) = &def.condition {
        if expr.has_empty_group() {
            errors.push(ValidationError::InvalidValue {
                context: format!("{context}: empty condition group"),
            });
        }
        for (kind, key) in expr.referenced_keys() {
            if !manifest.is_registered(kind, key) {
                errors.push(ValidationError::UnregisteredKey {
                    kind,
                    key: key.to_string(),
                    context: context.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> KeyManifest {
        KeyManifest {
            flags: [("gate_open".to_string(), false)].into(),
            counters: [("coins".to_string(), 0)].into(),
            ..KeyManifest::default()
        }
    }

    fn flag_set(flag: &str) -> ConditionExpr {
        ConditionExpr::Pred(ConditionDef::FlagSet { flag: flag.into() })
    }

    fn quest(id: &str, complete_when: Vec<CriteriaDef>) -> QuestDef {
        QuestDef {
            id: id.to_string(),
            name: format!("Quest {id}"),
            description: String::new(),
            complete_when,
            fail_when: Vec::new(),
        }
    }

    fn criteria(condition: Option<ConditionExpr>, after_secs: Option<f64>) -> CriteriaDef {
        CriteriaDef { condition, after_secs }
    }

    #[test]
    fn duplicate_ids_are_reported() {
        let file = QuestFile {
            quests: vec![
                quest("same", vec![criteria(Some(flag_set("gate_open")), None)]),
                quest("same", vec![criteria(Some(flag_set("gate_open")), None)]),
            ],
        };
        let errors = validate_quests(&file, &manifest());
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateId { kind, id } if *kind == "quest" && id == "same"))
        );
    }

    #[test]
    fn unregistered_keys_are_reported_with_namespace() {
        let expr = ConditionExpr::All(vec![
            flag_set("gate_opne"),
            ConditionExpr::Pred(ConditionDef::CounterAtLeast {
                counter: "coins".into(),
                value: 3,
            }),
        ]);
        let file = QuestFile {
            quests: vec![quest("q", vec![criteria(Some(expr), None)])],
        };
        let errors = validate_quests(&file, &manifest());
        assert_eq!(errors.len(), 1);
        assert!(matches!(
            &errors[0],
            ValidationError::UnregisteredKey { kind: KeyKind::Flag, key, .. } if key == "gate_opne"
        ));
    }

    #[test]
    fn empty_and_missing_criteria_are_reported() {
        let mut q = quest("q", Vec::new());
        q.fail_when = vec![criteria(None, None)];
        let errors = validate_quests(&QuestFile { quests: vec![q] }, &manifest());
        assert!(errors.iter().any(|e| matches!(e, ValidationError::NoCompletionCriteria { .. })));
        assert!(errors.iter().any(|e| matches!(e, ValidationError::EmptyCriteria { .. })));
    }

    #[test]
    fn nested_empty_groups_are_invalid() {
        let expr = ConditionExpr::All(vec![
            flag_set("gate_open"),
            ConditionExpr::Not(Box::new(ConditionExpr::Any(Vec::new()))),
        ]);
        let file = QuestFile {
            quests: vec![quest("q", vec![criteria(Some(expr), None)])],
        };
        let errors = validate_quests(&file, &manifest());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("empty condition group"));
    }

    #[test]
    fn negative_durations_are_invalid() {
        let file = QuestFile {
            quests: vec![quest("q", vec![criteria(None, Some(-1.0))])],
        };
        let errors = validate_quests(&file, &manifest());
        assert!(errors.iter().any(|e| matches!(e, ValidationError::InvalidValue { .. })));
    }
}
