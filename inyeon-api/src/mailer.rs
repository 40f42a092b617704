/// Outgoing email
///
/// Confirmation and recovery links go through the [`Mailer`] trait so the
/// transport can be swapped without touching the handlers.
///
/// The bundled [`LogMailer`] delivers nothing: it logs each message at debug
/// level with the link's token redacted and keeps the most recent messages in
/// memory for local development and the tests. A deployment that must reach
/// real inboxes passes its own [`Mailer`] to `AppState::with_mailer`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use url::Url;

/// Messages a [`LogMailer`] keeps before dropping the oldest
pub const OUTBOX_CAPACITY: usize = 32;

const REDACTED: &str = "redacted";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// The actionable link in the body
    pub link: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError>;
}

/// Builds the sign-up confirmation message
pub fn confirmation_email(to: &str, nickname: &str, link: String) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "[인연] 이메일 인증을 완료해주세요".to_string(),
        body: format!(
            "{}님, 가입을 환영합니다.\n아래 링크를 눌러 이메일 인증을 완료해주세요.\n{}",
            nickname, link
        ),
        link,
    }
}

/// Builds the password recovery message
pub fn recovery_email(to: &str, link: String) -> OutgoingEmail {
    OutgoingEmail {
        to: to.to_string(),
        subject: "[인연] 비밀번호 재설정".to_string(),
        body: format!(
            "아래 링크에서 새 비밀번호를 설정해주세요. 링크는 1시간 동안 유효합니다.\n{}",
            link
        ),
        link,
    }
}

/// `link` with its `token` query value and fragment blanked out
pub fn redact_link(link: &str) -> String {
    let Ok(mut url) = Url::parse(link) else {
        return REDACTED.to_string();
    };

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "token" { REDACTED.to_string() } else { value.into_owned() };
            (key.into_owned(), value)
        })
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(&pairs);
    }
    url.set_fragment(None);
    url.to_string()
}

/// Development mailer; see the module docs
#[derive(Debug, Clone, Default)]
pub struct LogMailer {
    outbox: Arc<Mutex<VecDeque<OutgoingEmail>>>,
}

impl LogMailer {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last [`OUTBOX_CAPACITY`] messages, oldest first
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.outbox
            .lock()
            .map(|outbox| outbox.iter().cloned().collect())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: OutgoingEmail) -> Result<(), MailError> {
        tracing::debug!(
            to = %email.to,
            subject = %email.subject,
            link = %redact_link(&email.link),
            "Email not delivered (log mailer)"
        );

        let mut outbox = self
            .outbox
            .lock()
            .map_err(|e| MailError::Delivery(e.to_string()))?;
        if outbox.len() == OUTBOX_CAPACITY {
            outbox.pop_front();
        }
        outbox.push_back(email);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_keeps_outbox() {
        let mailer = LogMailer::new();
        let link = "http://localhost:8080/v1/auth/confirm?token=abc".to_string();

        mailer
            .send(confirmation_email("a@b.com", "철수", link.clone()))
            .await
            .expect("Send should succeed");

        let sent = mailer.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to, "a@b.com");
        assert_eq!(sent[0].link, link);
        assert!(sent[0].body.contains("철수님"));
    }

    #[tokio::test]
    async fn test_outbox_keeps_only_recent_messages() {
        let mailer = LogMailer::new();

        for i in 0..OUTBOX_CAPACITY + 5 {
            let link = format!("http://localhost:8080/v1/auth/confirm?token=t{}", i);
            mailer
                .send(recovery_email("a@b.com", link))
                .await
                .expect("Send should succeed");
        }

        let sent = mailer.sent();
        assert_eq!(sent.len(), OUTBOX_CAPACITY);
        assert!(sent[0].link.ends_with("token=t5"));
        assert!(sent[OUTBOX_CAPACITY - 1].link.ends_with(&format!("token=t{}", OUTBOX_CAPACITY + 4)));
    }

    #[test]
    fn test_redacted_link_hides_token() {
        let redacted = redact_link("http://localhost:3000/change-password?token=s3cret&next=%2Fhome#frag");

        assert!(!redacted.contains("s3cret"));
        assert!(!redacted.contains("frag"));
        assert!(redacted.starts_with("http://localhost:3000/change-password?"));
        assert!(redacted.contains("token=redacted"));
        assert!(redacted.contains("next=%2Fhome"));

        assert_eq!(redact_link("not a url?token=s3cret"), "redacted");
    }

    #[test]
    fn test_recovery_email_contains_link() {
        let email = recovery_email("a@b.com", "http://x/change-password?token=t".to_string());
        assert!(email.body.ends_with("token=t"));
    }
}
