use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::template::value::Value;

pub const OPERATOR_IN: &str = "In";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LabelsOperator {
    #[default]
    And,
    Or,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorEntry {
    pub label_key: String,
    pub values: Vec<String>,
}

/// Node-affinity request built from caller target labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelectorSpec {
    pub entries: Vec<SelectorEntry>,
    pub operator: LabelsOperator,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchExpression {
    pub key: String,
    pub operator: String,
    pub values: Vec<String>,
}

/// Shape handed to templates as `NODE_SELECTORS`. Each inner list is one
/// `nodeSelectorTerm`; expressions within a term are AND'ed and terms are
/// OR'ed by the scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSelectorContext {
    pub operator: LabelsOperator,
    pub terms: Vec<Vec<MatchExpression>>,
}

impl NodeSelectorSpec {
    /// `None` when no usable target labels were supplied.
    pub fn from_target_labels(labels: &BTreeMap<String, Value>, operator: LabelsOperator) -> Option<Self> {
        let entries: Vec<SelectorEntry> = labels
            .iter()
            .map(|(key, value)| SelectorEntry {
                label_key: key.clone(),
                values: value.to_string_list(),
            })
            .filter(|e| !e.values.is_empty())
            .collect();

        if entries.is_empty() {
            return None;
        }
        Some(Self { entries, operator })
    }

    pub fn terms(&self) -> Vec<Vec<MatchExpression>> {
        match self.operator {
            LabelsOperator::And => vec![self
                .entries
                .iter()
                .map(|e| MatchExpression {
                    key: e.label_key.clone(),
                    operator: OPERATOR_IN.to_string(),
                    values: e.values.clone(),
                })
                .collect()],
            LabelsOperator::Or => self
                .entries
                .iter()
                .flat_map(|e| {
                    e.values.iter().map(|v| {
                        vec![MatchExpression {
                            key: e.label_key.clone(),
                            operator: OPERATOR_IN.to_string(),
                            values: vec![v.clone()],
                        }]
                    })
                })
                .collect(),
        }
    }

    pub fn to_context(&self) -> NodeSelectorContext {
        NodeSelectorContext {
            operator: self.operator,
            terms: self.terms(),
        }
    }
}
