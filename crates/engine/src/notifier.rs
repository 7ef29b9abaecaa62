//! Transient user-facing feedback messages.
//!
//! Notices are a side channel: they are never persisted and carry no
//! collection state. Each one expires after the configured time to live.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::clock::Clock;

/// Maximum notices kept at once. The oldest is dropped to make room.
const MAX_NOTICES: usize = 5;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// A one-shot feedback message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub id: Uuid,
    pub level: NoticeLevel,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Notice {
    /// Whether the notice should no longer be shown at `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Queue of transient notices for one context.
#[derive(Debug)]
pub struct Notifier {
    ttl: TimeDelta,
    clock: Arc<dyn Clock>,
    notices: Mutex<VecDeque<Notice>>,
}

impl Notifier {
    /// Create a notifier whose notices live for `ttl`.
    #[must_use]
    pub fn new(ttl: TimeDelta, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            notices: Mutex::new(VecDeque::new()),
        }
    }

    /// Queue a notice and return its ID.
    pub fn notify(&self, level: NoticeLevel, message: impl Into<String>) -> Uuid {
        let now = self.clock.now();
        let notice = Notice {
            id: Uuid::new_v4(),
            level,
            message: message.into(),
            created_at: now,
            // A TTL past the end of time means the notice never expires.
            expires_at: now
                .checked_add_signed(self.ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        let id = notice.id;

        match level {
            NoticeLevel::Error => warn!(%id, message = %notice.message, "User notice"),
            NoticeLevel::Success | NoticeLevel::Info => {
                info!(%id, message = %notice.message, "User notice");
            }
        }

        let mut notices = self.notices();
        if notices.len() >= MAX_NOTICES {
            notices.pop_front();
        }
        notices.push_back(notice);
        id
    }

    /// Queue a success notice.
    pub fn success(&self, message: impl Into<String>) -> Uuid {
        self.notify(NoticeLevel::Success, message)
    }

    /// Queue an informational notice.
    pub fn info(&self, message: impl Into<String>) -> Uuid {
        self.notify(NoticeLevel::Info, message)
    }

    /// Queue an error notice.
    pub fn error(&self, message: impl Into<String>) -> Uuid {
        self.notify(NoticeLevel::Error, message)
    }

    /// Notices still visible now, oldest first. Expired notices are dropped.
    #[must_use]
    pub fn active(&self) -> Vec<Notice> {
        let now = self.clock.now();
        let mut notices = self.notices();
        notices.retain(|notice| !notice.is_expired(now));
        notices.iter().cloned().collect()
    }

    /// Take every visible notice, leaving the queue empty.
    pub fn drain(&self) -> Vec<Notice> {
        let now = self.clock.now();
        self.notices()
            .drain(..)
            .filter(|notice| !notice.is_expired(now))
            .collect()
    }

    /// Dismiss a notice before it expires. Returns whether it was queued.
    pub fn dismiss(&self, id: Uuid) -> bool {
        let mut notices = self.notices();
        let before = notices.len();
        notices.retain(|notice| notice.id != id);
        notices.len() != before
    }

    fn notices(&self) -> MutexGuard<'_, VecDeque<Notice>> {
        self.notices.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
