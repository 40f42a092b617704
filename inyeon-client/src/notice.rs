/// Transient notices (toasts)
///
/// Controllers push a notice for every user-visible outcome; the UI drains
/// and shows them. Failures never escape as panics, they become notices.

use crate::error::ServiceError;
use serde::Serialize;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

impl From<&ServiceError> for Notice {
    fn from(error: &ServiceError) -> Self {
        let level = match error {
            ServiceError::DemoRestricted => NoticeLevel::Info,
            ServiceError::Invalid(_) | ServiceError::DuplicateCheckRequired => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };

        Self {
            level,
            message: error.to_string(),
        }
    }
}

/// Shared notice queue
#[derive(Debug, Clone, Default)]
pub struct Notices {
    queue: Arc<Mutex<Vec<Notice>>>,
}

impl Notices {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, notice: Notice) {
        tracing::debug!(level = ?notice.level, message = %notice.message, "Notice");
        match self.queue.lock() {
            Ok(mut queue) => queue.push(notice),
            Err(poisoned) => poisoned.into_inner().push(notice),
        }
    }

    /// Records the failure and hands it back to the caller
    pub fn report(&self, error: ServiceError) -> ServiceError {
        self.push(Notice::from(&error));
        error
    }

    pub fn drain(&self) -> Vec<Notice> {
        match self.queue.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inyeon_shared::messages;

    #[test]
    fn test_demo_restriction_is_info() {
        let notices = Notices::new();
        let error = notices.report(ServiceError::DemoRestricted);

        assert!(matches!(error, ServiceError::DemoRestricted));
        assert_eq!(notices.drain(), vec![Notice::info(messages::DEMO_RESTRICTED)]);
        assert!(notices.drain().is_empty());
    }

    #[test]
    fn test_backend_failure_is_error() {
        let notice = Notice::from(&ServiceError::Failed(messages::DELETE_PLAN_FAILED));
        assert_eq!(notice.level, NoticeLevel::Error);
        assert_eq!(notice.message, messages::DELETE_PLAN_FAILED);
    }
}
