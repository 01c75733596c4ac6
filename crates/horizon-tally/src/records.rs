//! Typed records returned by the labelling backend's list queries.
//!
//! Field names follow the backend's camelCase wire format; timestamps are
//! RFC 3339. Every record that appears as a list row implements
//! [`Identified`], keyed by the field that is unique within its list: a
//! view's files are keyed by `file_id`, a project's members by `account_id`.

use chrono::{DateTime, Utc};
use horizon_tally_core::Identified;
use serde::{Deserialize, Serialize};

/// A user's access to a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
    View,
    Manage,
}

/// Progress of one file through a classification run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CandidateStatus {
    Ready,
    Pending,
    Completed,
    Failed,
}

impl CandidateStatus {
    /// Returns true once the candidate has a final result or failed.
    pub fn is_finished(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for Project {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub account_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for User {
    fn id(&self) -> &str {
        &self.account_id
    }
}

/// A member row of a project's member list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMembership {
    pub account_id: String,
    pub project_id: String,
    pub access: AccessLevel,
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub project: Option<Project>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for ProjectMembership {
    fn id(&self) -> &str {
        &self.account_id
    }
}

/// An uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: String,
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub author: Option<User>,
    #[serde(default)]
    pub owner: Option<String>,
    /// Signed thumbnail URL, sized by the request's image options.
    #[serde(default)]
    pub resource: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for File {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A file row of a project's file list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectFile {
    pub project_id: String,
    pub file_id: String,
    pub file: File,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for ProjectFile {
    fn id(&self) -> &str {
        &self.file_id
    }
}

/// A named subset of a project's files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct View {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for View {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A file row of a view, with its ground-truth label if one is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewFile {
    pub view_id: String,
    pub file_id: String,
    pub file: File,
    #[serde(default)]
    pub label_id: Option<String>,
    #[serde(default)]
    pub label: Option<Label>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for ViewFile {
    fn id(&self) -> &str {
        &self.file_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Label {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Identified for Label {
    fn id(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: String,
    pub project_id: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub active_version: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for Prompt {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A classification run of one prompt version over one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub id: String,
    pub project_id: String,
    pub view_id: String,
    pub prompt_id: String,
    pub version: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identified for Classification {
    fn id(&self) -> &str {
        &self.id
    }
}

/// The label a classification assigned to one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub id: String,
    pub classification_id: String,
    pub file_id: String,
    pub label_id: String,
    pub confidence: f64,
    #[serde(default)]
    pub label: Option<Label>,
}

impl Identified for ClassificationResult {
    fn id(&self) -> &str {
        &self.id
    }
}

/// A file row of a classification run, with its result once classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationCandidate {
    pub classification_id: String,
    pub file_id: String,
    pub file: File,
    pub status: CandidateStatus,
    #[serde(default)]
    pub result_id: Option<String>,
    #[serde(default)]
    pub result: Option<ClassificationResult>,
}

impl Identified for ClassificationCandidate {
    fn id(&self) -> &str {
        &self.file_id
    }
}

impl ClassificationCandidate {
    /// Confidence of the result, if classified.
    pub fn confidence(&self) -> Option<f64> {
        self.result.as_ref().map(|result| result.confidence)
    }

    /// Name of the assigned label, if classified.
    pub fn label_name(&self) -> Option<&str> {
        self.result
            .as_ref()
            .and_then(|result| result.label.as_ref())
            .map(|label| label.name.as_str())
    }
}
