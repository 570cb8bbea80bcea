//! Enumerations and small value types for memory objects.

use serde::{Deserialize, Serialize};

/// Kinds of durable memory objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectType {
    /// A hard rule the agent must follow ("never use `any`").
    Constraint,
    /// A choice that was made and why.
    Decision,
    /// A recurring practice observed in the project.
    Convention,
    /// A user preference.
    Preference,
    /// A property of the environment (versions, paths, services).
    Environment,
    /// A discrete fact.
    #[default]
    Fact,
}

impl ObjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectType::Constraint => "constraint",
            ObjectType::Decision => "decision",
            ObjectType::Convention => "convention",
            ObjectType::Preference => "preference",
            ObjectType::Environment => "environment",
            ObjectType::Fact => "fact",
        }
    }

    /// Parse from the stored string form.
    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "constraint" => Some(ObjectType::Constraint),
            "decision" => Some(ObjectType::Decision),
            "convention" => Some(ObjectType::Convention),
            "preference" => Some(ObjectType::Preference),
            "environment" => Some(ObjectType::Environment),
            "fact" => Some(ObjectType::Fact),
            _ => None,
        }
    }

    /// Types whose temporal overlap suggests one superseded the other.
    pub fn is_opinionated(&self) -> bool {
        matches!(
            self,
            ObjectType::Decision | ObjectType::Convention | ObjectType::Preference
        )
    }
}

impl std::fmt::Display for ObjectType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lifecycle status. Transitions only move forward:
/// `active → superseded → retired`; `retired` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ObjectStatus {
    #[default]
    Active,
    Superseded,
    Retired,
}

impl ObjectStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectStatus::Active => "active",
            ObjectStatus::Superseded => "superseded",
            ObjectStatus::Retired => "retired",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "active" => Some(ObjectStatus::Active),
            "superseded" => Some(ObjectStatus::Superseded),
            "retired" => Some(ObjectStatus::Retired),
            _ => None,
        }
    }

    /// Whether moving from `self` to `next` is a legal forward transition.
    pub fn can_transition_to(&self, next: ObjectStatus) -> bool {
        match (self, next) {
            (ObjectStatus::Active, ObjectStatus::Superseded) => true,
            (ObjectStatus::Active, ObjectStatus::Retired) => true,
            (ObjectStatus::Superseded, ObjectStatus::Retired) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Coarse stated confidence, assigned at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceLevel::Low => "low",
            ConfidenceLevel::Medium => "medium",
            ConfidenceLevel::High => "high",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "low" => Some(ConfidenceLevel::Low),
            "medium" => Some(ConfidenceLevel::Medium),
            "high" => Some(ConfidenceLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for ConfidenceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Derived evidence tier. Never stored as source of truth; recomputed from
/// review status, evidence, code refs, and verification recency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceTier {
    /// No evidence, not reviewed.
    Hypothesis,
    /// Some provenance but no direct evidence events.
    Inferred,
    /// Backed by at least one evidence event.
    Observed,
    /// Approved and anchored to code or recently verified.
    Grounded,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::Hypothesis => "hypothesis",
            ConfidenceTier::Inferred => "inferred",
            ConfidenceTier::Observed => "observed",
            ConfidenceTier::Grounded => "grounded",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Human review status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl ReviewStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::Pending => "pending",
            ReviewStatus::Approved => "approved",
            ReviewStatus::Rejected => "rejected",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(ReviewStatus::Pending),
            "approved" => Some(ReviewStatus::Approved),
            "rejected" => Some(ReviewStatus::Rejected),
            _ => None,
        }
    }
}

/// Where a memory applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    /// The current project (memory root).
    #[default]
    Project,
    /// Every project.
    Global,
    /// A specific path inside the project.
    Path,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScopeKind::Project => "project",
            ScopeKind::Global => "global",
            ScopeKind::Path => "path",
        }
    }

    pub fn parse_name(s: &str) -> Option<Self> {
        match s {
            "project" => Some(ScopeKind::Project),
            "global" => Some(ScopeKind::Global),
            "path" => Some(ScopeKind::Path),
            _ => None,
        }
    }
}

/// Scope = kind plus an optional path (required for `ScopeKind::Path`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub struct Scope {
    pub kind: ScopeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Scope {
    pub fn project() -> Self {
        Self { kind: ScopeKind::Project, path: None }
    }

    pub fn global() -> Self {
        Self { kind: ScopeKind::Global, path: None }
    }

    pub fn path(p: impl Into<String>) -> Self {
        Self { kind: ScopeKind::Path, path: Some(p.into()) }
    }
}

/// A code anchor: a path and an optional line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CodeRef {
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
}

impl CodeRef {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), line: None }
    }

    pub fn with_line(path: impl Into<String>, line: u32) -> Self {
        Self { path: path.into(), line: Some(line) }
    }
}
