use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, TimeZone, Utc};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use super::MacKey;

pub const MAX_GROUPS: usize = 8;
pub const MAX_ENTRIES_PER_GROUP: usize = 24;
pub const DEFAULT_EXPIRES_IN_HOURS: u32 = 8;

const SECONDS_PER_HOUR: i64 = 3600;

/// One path-prefix rule inside a permission group.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct GroupEntry {
    pub prefix: String,
}

impl GroupEntry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

impl From<String> for GroupEntry {
    fn from(prefix: String) -> Self {
        Self { prefix }
    }
}

impl From<&str> for GroupEntry {
    fn from(prefix: &str) -> Self {
        Self::new(prefix)
    }
}

pub type PermissionGroup = Vec<GroupEntry>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmConfigError {
    #[error("LLM token config: max {MAX_GROUPS} groups, got {0}")]
    TooManyGroups(usize),

    #[error("LLM token config: group {group} has {entries} entries (max {MAX_ENTRIES_PER_GROUP})")]
    TooManyEntries { group: usize, entries: usize },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LlmTokenError {
    /// The expiry offset does not fit the 24-bit field (or the clock is before the epoch).
    #[error("token expiry of {0} hours since epoch does not fit in 24 bits")]
    ExpiryOutOfRange(i64),
}

/// Primary authentication check, e.g. a browser session cookie.
///
/// When it returns true the request is served without looking at LLM tokens,
/// and the caller may mint new tokens.
#[async_trait]
pub trait PrimaryAuth: Send + Sync {
    async fn is_authenticated(&self, headers: &HeaderMap) -> bool;
}

/// Validated, immutable token configuration. Built once at startup and shared
/// behind an `Arc` by every request.
#[derive(Clone)]
pub struct LlmTokenRuntime {
    epoch: DateTime<Utc>,
    groups: Vec<PermissionGroup>,
    key: Arc<dyn MacKey>,
    expires_in_hours: u32,
    primary_auth: Option<Arc<dyn PrimaryAuth>>,
}

impl LlmTokenRuntime {
    pub fn new(
        groups: Vec<PermissionGroup>,
        key: Arc<dyn MacKey>,
        expires_in_hours: Option<u32>,
        primary_auth: Option<Arc<dyn PrimaryAuth>>,
    ) -> Result<Self, LlmConfigError> {
        if groups.len() > MAX_GROUPS {
            return Err(LlmConfigError::TooManyGroups(groups.len()));
        }
        for (index, group) in groups.iter().enumerate() {
            if group.len() > MAX_ENTRIES_PER_GROUP {
                return Err(LlmConfigError::TooManyEntries {
                    group: index,
                    entries: group.len(),
                });
            }
        }

        Ok(Self {
            epoch: Self::default_epoch(),
            groups,
            key,
            expires_in_hours: expires_in_hours.unwrap_or(DEFAULT_EXPIRES_IN_HOURS),
            primary_auth,
        })
    }

    /// 2025-01-01T00:00:00Z, a whole hour.
    fn default_epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or(DateTime::<Utc>::UNIX_EPOCH)
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }

    pub fn groups(&self) -> &[PermissionGroup] {
        &self.groups
    }

    pub fn expires_in_hours(&self) -> u32 {
        self.expires_in_hours
    }

    pub(super) fn key(&self) -> &dyn MacKey {
        self.key.as_ref()
    }

    pub fn primary_auth(&self) -> Option<&Arc<dyn PrimaryAuth>> {
        self.primary_auth.as_ref()
    }

    /// Runs the primary authentication predicate; false when none is configured.
    pub async fn is_primary_authenticated(&self, headers: &HeaderMap) -> bool {
        match &self.primary_auth {
            Some(auth) => auth.is_authenticated(headers).await,
            None => false,
        }
    }

    /// Whole hours elapsed between the epoch and `now`.
    pub fn hours_since_epoch(&self, now: DateTime<Utc>) -> i64 {
        hours_since_unix_epoch(now) - hours_since_unix_epoch(self.epoch)
    }
}

impl std::fmt::Debug for LlmTokenRuntime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LlmTokenRuntime")
            .field("epoch", &self.epoch)
            .field("groups", &self.groups)
            .field("expires_in_hours", &self.expires_in_hours)
            .field("primary_auth", &self.primary_auth.is_some())
            .finish_non_exhaustive()
    }
}

fn hours_since_unix_epoch(instant: DateTime<Utc>) -> i64 {
    instant.timestamp().div_euclid(SECONDS_PER_HOUR)
}
