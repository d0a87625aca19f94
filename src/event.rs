//! Outcome events for audit consumers. Exactly one is emitted per
//! verification attempt.

use futures::channel::mpsc::UnboundedSender;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationEvent {
    ValidVerification {
        /// The credential subject, for display.
        #[serde(rename = "extra")]
        subject: Value,
    },
    InvalidVerification {
        /// The offending credential, or the raw input if it did not parse.
        #[serde(rename = "extra")]
        payload: Value,
    },
    RevokedCertificate {
        #[serde(rename = "extra")]
        payload: Value,
    },
}

impl VerificationEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ValidVerification { .. } => "VALID_VERIFICATION",
            Self::InvalidVerification { .. } => "INVALID_VERIFICATION",
            Self::RevokedCertificate { .. } => "REVOKED_CERTIFICATE",
        }
    }
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: VerificationEvent);
}

/// Writes each event to the log at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn emit(&self, event: VerificationEvent) {
        match serde_json::to_string(&event) {
            Ok(json) => log::info!("{}", json),
            Err(err) => log::warn!("unable to serialize {} event: {}", event.name(), err),
        }
    }
}

impl EventSink for UnboundedSender<VerificationEvent> {
    fn emit(&self, event: VerificationEvent) {
        if let Err(err) = self.unbounded_send(event) {
            log::warn!("event receiver dropped: {}", err);
        }
    }
}
