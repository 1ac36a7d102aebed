//! Transient flash messages, stored in the session.
//!
//! A message pushed during one request is drained and rendered by the
//! next page view. Losing a flash (session write failure) is logged but
//! never fails the request that pushed it.

use axum::{
    extract::FromRequestParts,
    http::{StatusCode, request::Parts},
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

/// Session key for pending flash messages.
const FLASH_KEY: &str = "flash.messages";

/// Category of a flash message, used as a CSS class when rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Info,
    Error,
}

impl FlashKind {
    /// The CSS class name for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Info => "info",
            Self::Error => "error",
        }
    }
}

/// A single flash message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub kind: FlashKind,
    pub message: String,
}

impl FlashMessage {
    /// The CSS class name for this message's kind.
    #[must_use]
    pub const fn kind_str(&self) -> &'static str {
        self.kind.as_str()
    }
}

/// Extractor for pushing and draining flash messages.
pub struct Flash {
    session: Session,
}

impl Flash {
    /// Queue a message for the next page view.
    pub async fn push(&self, kind: FlashKind, message: impl Into<String>) {
        let mut messages: Vec<FlashMessage> = self
            .session
            .get(FLASH_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or_default();

        messages.push(FlashMessage {
            kind,
            message: message.into(),
        });

        if let Err(e) = self.session.insert(FLASH_KEY, &messages).await {
            tracing::warn!("Failed to store flash message: {e}");
        }
    }

    /// Queue a success message.
    pub async fn success(&self, message: impl Into<String>) {
        self.push(FlashKind::Success, message).await;
    }

    /// Queue an informational message.
    pub async fn info(&self, message: impl Into<String>) {
        self.push(FlashKind::Info, message).await;
    }

    /// Queue an error message.
    pub async fn error(&self, message: impl Into<String>) {
        self.push(FlashKind::Error, message).await;
    }

    /// Drain all pending messages for rendering.
    pub async fn take(&self) -> Vec<FlashMessage> {
        self.session
            .remove::<Vec<FlashMessage>>(FLASH_KEY)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)?;

        Ok(Self { session })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_css_classes() {
        assert_eq!(FlashKind::Success.as_str(), "success");
        assert_eq!(FlashKind::Info.as_str(), "info");
        assert_eq!(FlashKind::Error.as_str(), "error");
    }

    #[test]
    fn test_message_serde_roundtrip() {
        let msg = FlashMessage {
            kind: FlashKind::Info,
            message: "This page 4 does not exist!".to_owned(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(json.contains("\"info\""));
        let back: FlashMessage = serde_json::from_str(&json).unwrap();
        assert_eq!(back, msg);
    }
}
