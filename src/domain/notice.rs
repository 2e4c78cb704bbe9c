use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use thiserror::Error;
use time::format_description::well_known::Rfc3339;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;
use time::{OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

/// Offset-less ISO-8601 forms accepted for `expires_at`; read as UTC.
const LOCAL_FORMATS: &[&[BorrowedFormatItem<'static>]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NoticeError {
    #[error("{0}")]
    Validation(String),
    #[error("notice {0} not found")]
    NotFound(Uuid),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub id: Uuid,
    pub title: String,
    pub message: String,
    pub date: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

impl Notice {
    pub fn is_active(&self, now: OffsetDateTime) -> bool {
        self.expires_at > now
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.message.to_lowercase().contains(needle)
    }
}

/// Create payload. Fields are optional so that a missing field and a blank
/// one produce the same validation error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewNotice {
    pub title: Option<String>,
    pub message: Option<String>,
    pub date: Option<String>,
    pub expires_at: Option<String>,
}

impl NewNotice {
    pub fn new(title: &str, message: &str, date: &str, expires_at: &str) -> Self {
        Self {
            title: Some(title.to_string()),
            message: Some(message.to_string()),
            date: Some(date.to_string()),
            expires_at: Some(expires_at.to_string()),
        }
    }

    /// Validates the payload against `now` and builds the record to store.
    pub(crate) fn into_notice(self, now: OffsetDateTime) -> Result<Notice, NoticeError> {
        let fields = [
            ("title", &self.title),
            ("message", &self.message),
            ("date", &self.date),
            ("expires_at", &self.expires_at),
        ];
        let missing: Vec<&str> = fields
            .iter()
            .filter(|(_, v)| trimmed(v).is_none())
            .map(|(name, _)| *name)
            .collect();
        if !missing.is_empty() {
            return Err(NoticeError::Validation(format!(
                "missing required fields: {}",
                missing.join(", ")
            )));
        }

        let expires_at = future_expiry(trimmed(&self.expires_at).unwrap_or_default(), now)?;
        Ok(Notice {
            id: Uuid::new_v4(),
            title: trimmed(&self.title).unwrap_or_default().to_string(),
            message: trimmed(&self.message).unwrap_or_default().to_string(),
            date: trimmed(&self.date).unwrap_or_default().to_string(),
            expires_at,
            created_at: now,
            updated_at: None,
        })
    }
}

/// Partial update payload; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NoticePatch {
    pub title: Option<String>,
    pub message: Option<String>,
    pub date: Option<String>,
    pub expires_at: Option<String>,
}

impl NoticePatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.message.is_none() && self.date.is_none() && self.expires_at.is_none()
    }

    /// Applies every present field or none of them.
    pub(crate) fn apply(self, notice: &mut Notice, now: OffsetDateTime) -> Result<(), NoticeError> {
        if self.is_empty() {
            return Err(NoticeError::Validation("no fields to update".into()));
        }
        let text = |name: &str, v: &Option<String>| -> Result<Option<String>, NoticeError> {
            match v {
                None => Ok(None),
                Some(_) => trimmed(v)
                    .map(|s| Some(s.to_string()))
                    .ok_or_else(|| NoticeError::Validation(format!("{name} must not be empty"))),
            }
        };
        let title = text("title", &self.title)?;
        let message = text("message", &self.message)?;
        let date = text("date", &self.date)?;
        let expires_at = match text("expires_at", &self.expires_at)? {
            Some(raw) => Some(future_expiry(&raw, now)?),
            None => None,
        };

        if let Some(title) = title { notice.title = title; }
        if let Some(message) = message { notice.message = message; }
        if let Some(date) = date { notice.date = date; }
        if let Some(expires_at) = expires_at { notice.expires_at = expires_at; }
        notice.updated_at = Some(now);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    CreatedAt,
    UpdatedAt,
    ExpiresAt,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Desc,
    Asc,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    #[serde(default)]
    pub sort: SortKey,
    #[serde(default)]
    pub order: SortOrder,
    pub limit: Option<i64>,
}

impl ListQuery {
    pub fn search(term: &str) -> Self {
        Self { search: Some(term.to_string()), ..Self::default() }
    }

    /// Filters and orders a snapshot of active notices. Returns the number
    /// of matches before `limit` is applied alongside the page.
    pub(crate) fn apply(&self, mut notices: Vec<Notice>) -> (usize, Vec<Notice>) {
        if let Some(needle) = trimmed(&self.search).map(str::to_lowercase) {
            notices.retain(|n| n.matches(&needle));
        }

        notices.sort_by(|a, b| {
            let ord = match self.sort {
                SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
                // never-updated notices fall back to their creation time
                SortKey::UpdatedAt => a
                    .updated_at
                    .unwrap_or(a.created_at)
                    .cmp(&b.updated_at.unwrap_or(b.created_at)),
                SortKey::ExpiresAt => a.expires_at.cmp(&b.expires_at),
                SortKey::Title => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
            };
            let ord = if ord == Ordering::Equal { a.created_at.cmp(&b.created_at) } else { ord };
            match self.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            }
        });

        let total = notices.len();
        if let Some(limit) = self.limit.filter(|l| *l > 0) {
            notices.truncate(limit as usize);
        }
        (total, notices)
    }
}

/// Parses an `expires_at` value: RFC 3339 with offset, or a local ISO-8601
/// date-time taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    let raw = raw.trim();
    if let Ok(t) = OffsetDateTime::parse(raw, &Rfc3339) {
        return Some(t);
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|fmt| PrimitiveDateTime::parse(raw, *fmt).ok())
        .map(PrimitiveDateTime::assume_utc)
}

fn future_expiry(raw: &str, now: OffsetDateTime) -> Result<OffsetDateTime, NoticeError> {
    let expires_at = parse_timestamp(raw)
        .ok_or_else(|| NoticeError::Validation(format!("invalid expires_at timestamp: {raw}")))?;
    if expires_at <= now {
        return Err(NoticeError::Validation("expires_at must be in the future".into()));
    }
    Ok(expires_at)
}

fn trimmed(v: &Option<String>) -> Option<&str> {
    v.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
