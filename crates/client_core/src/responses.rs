//! Response tree construction and pure edits.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use shared::{
    domain::Answer,
    protocol::{QuestionResponse, QuestionSchema, ResponseTree, SchemeResponses},
};
use thiserror::Error;

/// What to send for a follow-up whose parent question is answered "No".
/// The stored tree always keeps the last answer either way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HiddenFollowUpPolicy {
    #[default]
    SubmitAsStored,
    MaskAsNo,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hidden follow-up policy '{0}' (expected submit_as_stored or mask_as_no)")]
pub struct ParsePolicyError(String);

impl FromStr for HiddenFollowUpPolicy {
    type Err = ParsePolicyError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submit_as_stored" => Ok(Self::SubmitAsStored),
            "mask_as_no" => Ok(Self::MaskAsNo),
            _ => Err(ParsePolicyError(raw.to_string())),
        }
    }
}

impl fmt::Display for HiddenFollowUpPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SubmitAsStored => f.write_str("submit_as_stored"),
            Self::MaskAsNo => f.write_str("mask_as_no"),
        }
    }
}

pub fn initialize_responses(schema: &QuestionSchema) -> ResponseTree {
    let mut tree = ResponseTree::default();
    for (scheme, questions) in schema.schemes() {
        let responses: SchemeResponses = questions
            .iter()
            .map(|(question, spec)| {
                let follow_ups = spec.follow_ups.as_ref().map(|follow_ups| {
                    follow_ups
                        .keys()
                        .map(|text| (text.clone(), Answer::No))
                        .collect::<BTreeMap<_, _>>()
                });
                (
                    question.clone(),
                    QuestionResponse {
                        answer: Answer::No,
                        follow_ups,
                    },
                )
            })
            .collect();
        tree.insert_scheme(scheme.clone(), responses);
    }
    tree
}

pub fn set_answer(tree: &ResponseTree, scheme: &str, question: &str, value: Answer) -> ResponseTree {
    let mut next = tree.clone();
    if tree.question(scheme, question).is_none() {
        return next;
    }
    if let Some(entry) = next
        .scheme_mut(scheme)
        .and_then(|responses| responses.get_mut(question))
    {
        entry.answer = value;
    }
    next
}

pub fn set_follow_up_answer(
    tree: &ResponseTree,
    scheme: &str,
    question: &str,
    follow_up: &str,
    value: Answer,
) -> ResponseTree {
    let mut next = tree.clone();
    let exists = tree
        .question(scheme, question)
        .and_then(|entry| entry.follow_up(follow_up))
        .is_some();
    if !exists {
        return next;
    }
    if let Some(slot) = next
        .scheme_mut(scheme)
        .and_then(|responses| responses.get_mut(question))
        .and_then(|entry| entry.follow_ups.as_mut())
        .and_then(|follow_ups| follow_ups.get_mut(follow_up))
    {
        *slot = value;
    }
    next
}

pub fn follow_up_visible(tree: &ResponseTree, scheme: &str, question: &str) -> bool {
    tree.question(scheme, question)
        .is_some_and(|entry| entry.answer.is_yes())
}

pub fn submission_view(tree: &ResponseTree, policy: HiddenFollowUpPolicy) -> ResponseTree {
    match policy {
        HiddenFollowUpPolicy::SubmitAsStored => tree.clone(),
        HiddenFollowUpPolicy::MaskAsNo => {
            let mut masked = tree.clone();
            for (scheme, responses) in tree.schemes() {
                for (question, entry) in responses {
                    if entry.answer.is_yes() {
                        continue;
                    }
                    let Some(follow_up_texts) = entry.follow_ups.as_ref() else {
                        continue;
                    };
                    for follow_up in follow_up_texts.keys() {
                        masked =
                            set_follow_up_answer(&masked, scheme, question, follow_up, Answer::No);
                    }
                }
            }
            masked
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUpView {
    pub text: String,
    pub answer: Answer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView {
    pub text: String,
    pub answer: Answer,
    pub has_follow_ups: bool,
    /// Empty unless the question is answered "Yes".
    pub visible_follow_ups: Vec<FollowUpView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemeSection {
    pub scheme: String,
    pub questions: Vec<QuestionView>,
}

pub fn render_view(schema: &QuestionSchema, tree: &ResponseTree) -> Vec<SchemeSection> {
    schema
        .schemes()
        .map(|(scheme, questions)| SchemeSection {
            scheme: scheme.clone(),
            questions: questions
                .iter()
                .map(|(question, spec)| {
                    let entry = tree.question(scheme, question);
                    let answer = entry.map(|entry| entry.answer).unwrap_or_default();
                    let visible_follow_ups = if follow_up_visible(tree, scheme, question) {
                        spec.follow_up_texts()
                            .map(|text| FollowUpView {
                                text: text.clone(),
                                answer: entry
                                    .and_then(|entry| entry.follow_up(text))
                                    .unwrap_or_default(),
                            })
                            .collect()
                    } else {
                        Vec::new()
                    };
                    QuestionView {
                        text: question.clone(),
                        answer,
                        has_follow_ups: spec.follow_ups.is_some(),
                        visible_follow_ups,
                    }
                })
                .collect(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;

    fn scenario_schema() -> QuestionSchema {
        serde_json::from_value(json!({
            "SchemeA": {"Q1": {}, "Q2": {"followUps": {"Q2a": {}}}},
            "SchemeB": {"B1": {"answer": "Yes", "follow_ups": {"B1a": "Yes", "B1b": "No"}}}
        }))
        .expect("schema")
    }

    fn leaves(tree: &ResponseTree) -> Vec<(String, Answer)> {
        let mut out = Vec::new();
        for (scheme, responses) in tree.schemes() {
            for (question, entry) in responses {
                out.push((format!("{scheme}/{question}"), entry.answer));
                for (follow_up, answer) in entry.follow_ups.iter().flatten() {
                    out.push((format!("{scheme}/{question}/{follow_up}"), *answer));
                }
            }
        }
        out
    }

    #[test]
    fn initialization_mirrors_schema_with_every_leaf_no() {
        let tree = initialize_responses(&scenario_schema());

        assert_eq!(
            serde_json::to_value(&tree).expect("json"),
            json!({
                "SchemeA": {
                    "Q1": {"answer": "No"},
                    "Q2": {"answer": "No", "follow_ups": {"Q2a": "No"}}
                },
                "SchemeB": {
                    "B1": {"answer": "No", "follow_ups": {"B1a": "No", "B1b": "No"}}
                }
            })
        );
        assert!(leaves(&tree).iter().all(|(_, answer)| *answer == Answer::No));
    }

    #[test]
    fn initialization_of_empty_schema_is_empty() {
        assert!(initialize_responses(&QuestionSchema::default()).is_empty());
    }

    #[test]
    fn set_answer_changes_exactly_one_leaf() {
        let tree = initialize_responses(&scenario_schema());
        let next = set_answer(&tree, "SchemeA", "Q1", Answer::Yes);

        let before = leaves(&tree);
        let after = leaves(&next);
        let changed: Vec<_> = before
            .iter()
            .zip(after.iter())
            .filter(|(a, b)| a != b)
            .map(|(_, b)| b.0.clone())
            .collect();
        assert_eq!(changed, vec!["SchemeA/Q1".to_string()]);

        assert!(Arc::ptr_eq(
            tree.scheme_branch("SchemeB").expect("b"),
            next.scheme_branch("SchemeB").expect("b")
        ));
        assert!(!Arc::ptr_eq(
            tree.scheme_branch("SchemeA").expect("a"),
            next.scheme_branch("SchemeA").expect("a")
        ));
        assert_eq!(tree.question("SchemeA", "Q1").expect("q1").answer, Answer::No);
    }

    #[test]
    fn set_answer_is_idempotent() {
        let tree = initialize_responses(&scenario_schema());
        let once = set_answer(&tree, "SchemeA", "Q2", Answer::Yes);
        let twice = set_answer(&once, "SchemeA", "Q2", Answer::Yes);
        assert_eq!(once, twice);
    }

    #[test]
    fn edits_to_unknown_keys_are_no_ops() {
        let tree = initialize_responses(&scenario_schema());

        assert_eq!(set_answer(&tree, "Nope", "Q1", Answer::Yes), tree);
        assert_eq!(set_answer(&tree, "SchemeA", "Nope", Answer::Yes), tree);
        assert_eq!(
            set_follow_up_answer(&tree, "SchemeA", "Q1", "Q2a", Answer::Yes),
            tree
        );
        assert_eq!(
            set_follow_up_answer(&tree, "SchemeA", "Q2", "Nope", Answer::Yes),
            tree
        );
    }

    #[test]
    fn hidden_follow_up_answer_survives_parent_round_trip() {
        let schema = scenario_schema();
        let tree = initialize_responses(&schema);

        let tree = set_answer(&tree, "SchemeA", "Q2", Answer::Yes);
        assert!(follow_up_visible(&tree, "SchemeA", "Q2"));

        let tree = set_follow_up_answer(&tree, "SchemeA", "Q2", "Q2a", Answer::Yes);
        let tree = set_answer(&tree, "SchemeA", "Q2", Answer::No);
        assert!(!follow_up_visible(&tree, "SchemeA", "Q2"));
        assert_eq!(
            tree.question("SchemeA", "Q2").expect("q2").follow_up("Q2a"),
            Some(Answer::Yes)
        );

        let tree = set_answer(&tree, "SchemeA", "Q2", Answer::Yes);
        let view = render_view(&schema, &tree);
        let q2 = &view[0].questions[1];
        assert_eq!(q2.text, "Q2");
        assert_eq!(
            q2.visible_follow_ups,
            vec![FollowUpView {
                text: "Q2a".into(),
                answer: Answer::Yes
            }]
        );
    }

    #[test]
    fn render_view_hides_follow_ups_under_no() {
        let schema = scenario_schema();
        let tree = initialize_responses(&schema);
        let view = render_view(&schema, &tree);

        assert_eq!(view.len(), 2);
        let q2 = &view[0].questions[1];
        assert!(q2.has_follow_ups);
        assert!(q2.visible_follow_ups.is_empty());
        assert!(!view[0].questions[0].has_follow_ups);
    }

    #[test]
    fn submission_view_applies_policy_to_hidden_follow_ups_only() {
        let tree = initialize_responses(&scenario_schema());
        let tree = set_answer(&tree, "SchemeA", "Q2", Answer::Yes);
        let tree = set_follow_up_answer(&tree, "SchemeA", "Q2", "Q2a", Answer::Yes);
        let tree = set_answer(&tree, "SchemeB", "B1", Answer::Yes);
        let tree = set_follow_up_answer(&tree, "SchemeB", "B1", "B1a", Answer::Yes);
        let tree = set_answer(&tree, "SchemeA", "Q2", Answer::No);

        let stored = submission_view(&tree, HiddenFollowUpPolicy::SubmitAsStored);
        assert_eq!(stored, tree);

        let masked = submission_view(&tree, HiddenFollowUpPolicy::MaskAsNo);
        assert_eq!(
            masked.question("SchemeA", "Q2").expect("q2").follow_up("Q2a"),
            Some(Answer::No)
        );
        assert_eq!(
            masked.question("SchemeB", "B1").expect("b1").follow_up("B1a"),
            Some(Answer::Yes)
        );
        assert_eq!(
            tree.question("SchemeA", "Q2").expect("q2").follow_up("Q2a"),
            Some(Answer::Yes)
        );
    }

    #[test]
    fn policy_parses_from_config_strings() {
        assert_eq!(
            "mask_as_no".parse::<HiddenFollowUpPolicy>(),
            Ok(HiddenFollowUpPolicy::MaskAsNo)
        );
        assert!("reset".parse::<HiddenFollowUpPolicy>().is_err());
        assert_eq!(HiddenFollowUpPolicy::default().to_string(), "submit_as_stored");
    }
}
