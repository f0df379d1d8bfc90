//! Deployment naming under the Kubernetes 63-character DNS label limit.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::template::value::Value;
use crate::errors::AppError;

pub const MAX_NAME_LEN: usize = 63;
pub const SUFFIX_LEN: usize = 6;
pub const JOB_LABEL_KEY: &str = "kalavai.job.name";

/// Produces the random part of generated names.
pub trait SuffixSource: Send + Sync {
    fn suffix(&self) -> String;
}

/// First six hex characters of a v4 UUID.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidSuffix;

impl SuffixSource for UuidSuffix {
    fn suffix(&self) -> String {
        Uuid::new_v4().simple().to_string()[..SUFFIX_LEN].to_string()
    }
}

/// Always returns the same suffix. Useful for reproducible renders.
#[derive(Debug, Clone)]
pub struct FixedSuffix(pub String);

impl SuffixSource for FixedSuffix {
    fn suffix(&self) -> String {
        self.0.clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobLabel {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentIdentity {
    pub job_name: String,
    pub label: JobLabel,
    pub ports: Vec<u16>,
    pub replica_index: u32,
}

/// Lower-case and collapse every run of non `[a-z0-9]` characters into one `-`.
pub fn sanitize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_run = false;
        } else if !in_run {
            out.push('-');
            in_run = true;
        }
    }
    out
}

pub fn common_prefix(candidates: &[String]) -> String {
    let Some(first) = candidates.first() else {
        return String::new();
    };
    let mut len = first.len();
    for other in &candidates[1..] {
        len = first
            .bytes()
            .zip(other.bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
    }
    first[..len].to_string()
}

/// Base deployment name from an identity value. Comma-separated candidates
/// are sanitized individually and reduced to their common prefix.
pub fn parse_deployment_name(raw: &str) -> String {
    let candidates: Vec<String> = raw.split(',').map(|c| sanitize(c.trim())).collect();
    common_prefix(&candidates).trim_matches('-').to_string()
}

fn digits(n: u32) -> usize {
    n.to_string().len()
}

/// Characters left for the base name once the random suffix (`-xxxxxx`) and
/// the replica suffix (`-{index}`) are accounted for.
pub fn name_budget(random_suffix: bool, replicas: u32) -> usize {
    let mut budget = MAX_NAME_LEN;
    if random_suffix {
        budget -= SUFFIX_LEN + 1;
    }
    if replicas > 1 {
        budget -= 1 + digits(replicas - 1);
    }
    budget
}

pub fn truncate_name(name: &str, budget: usize) -> String {
    // sanitized names are ASCII, so byte slicing is char slicing
    let cut = &name[..name.len().min(budget)];
    cut.trim_end_matches('-').to_string()
}

/// Ports from the `endpoint_ports` value: a comma-separated string, a single
/// integer or a list of either.
pub fn parse_ports(raw: Option<&Value>) -> Result<Vec<u16>, AppError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    raw.to_string_list()
        .iter()
        .flat_map(|s| s.split(','))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u16>()
                .map_err(|_| AppError::ValidationError(format!("Invalid endpoint port '{}'", s)))
        })
        .collect()
}

/// One identity per replica, all sharing the group label
/// `{base}[-{suffix}]`. Replica names append `-{index}` only when
/// `replicas > 1`.
pub fn assign_identities(
    raw_name: &str,
    suffix: Option<&str>,
    replicas: u32,
    ports: &[u16],
) -> Result<Vec<DeploymentIdentity>, AppError> {
    if replicas == 0 {
        return Err(AppError::ValidationError("replicas must be at least 1".to_string()));
    }

    let base = truncate_name(&parse_deployment_name(raw_name), name_budget(suffix.is_some(), replicas));
    if base.is_empty() {
        return Err(AppError::ValidationError(format!(
            "Deployment name '{}' has no usable characters",
            raw_name
        )));
    }

    let suffix: Option<String> = suffix
        .map(|s| sanitize(s).trim_matches('-').chars().take(SUFFIX_LEN).collect::<String>())
        .filter(|s| !s.is_empty());
    let group = match suffix {
        Some(s) => format!("{}-{}", base, s),
        None => base,
    };

    let identities = (0..replicas)
        .map(|i| DeploymentIdentity {
            job_name: if replicas > 1 { format!("{}-{}", group, i) } else { group.clone() },
            label: JobLabel {
                key: JOB_LABEL_KEY.to_string(),
                value: group.clone(),
            },
            ports: ports.to_vec(),
            replica_index: i,
        })
        .collect();

    Ok(identities)
}
