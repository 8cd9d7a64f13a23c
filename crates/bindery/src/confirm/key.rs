//! Typed operation keys for pending destructive operations.
//!
//! A key renders as `delete:<kind>:<subject-id>:<nonce>`. Embedding the
//! kind and subject makes collisions between operation kinds impossible;
//! the nonce makes the key single-use and unguessable.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConfirmError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Category,
    Comic,
    Episode,
    Season,
    PremiumPackage,
}

impl SubjectKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubjectKind::Category => "category",
            SubjectKind::Comic => "comic",
            SubjectKind::Episode => "episode",
            SubjectKind::Season => "season",
            SubjectKind::PremiumPackage => "premium_package",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "category" => Some(SubjectKind::Category),
            "comic" => Some(SubjectKind::Comic),
            "episode" => Some(SubjectKind::Episode),
            "season" => Some(SubjectKind::Season),
            "premium_package" => Some(SubjectKind::PremiumPackage),
            _ => None,
        }
    }
}

impl std::fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The entity a destructive operation targets.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Subject {
    pub kind: SubjectKind,
    pub id: String,
}

impl Subject {
    pub fn new(kind: SubjectKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Cache key of the per-subject pending marker.
    pub(crate) fn pending_cache_key(&self) -> String {
        format!("pending:{}:{}", self.kind.as_str(), self.id)
    }
}

impl std::fmt::Display for Subject {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.kind.as_str(), self.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationKey {
    subject: Subject,
    nonce: String,
}

impl OperationKey {
    /// Mints a fresh key for the subject. Every call produces a new nonce.
    pub fn mint(subject: &Subject) -> Self {
        Self {
            subject: subject.clone(),
            nonce: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Parses a key presented by a client.
    pub fn parse(raw: &str) -> Result<Self, ConfirmError> {
        let malformed = || ConfirmError::MalformedKey(raw.to_string());

        let mut parts = raw.splitn(4, ':');
        let op = parts.next().ok_or_else(&malformed)?;
        let kind = parts.next().ok_or_else(&malformed)?;
        let id = parts.next().ok_or_else(&malformed)?;
        let nonce = parts.next().ok_or_else(&malformed)?;

        if op != "delete" || id.is_empty() || nonce.is_empty() {
            return Err(malformed());
        }
        let kind = SubjectKind::parse(kind).ok_or_else(malformed)?;

        Ok(Self {
            subject: Subject::new(kind, id),
            nonce: nonce.to_string(),
        })
    }

    pub fn subject(&self) -> &Subject {
        &self.subject
    }

    pub(crate) fn cache_key(&self) -> String {
        self.to_string()
    }
}

impl std::fmt::Display for OperationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "delete:{}:{}:{}",
            self.subject.kind.as_str(),
            self.subject.id,
            self.nonce
        )
    }
}
