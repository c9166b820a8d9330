//! NotificationDispatcher: maps a push outcome to what the platform displays.

use serde::{Deserialize, Serialize};

use sealed_push_core::NotificationPayload;

use crate::config::PushConfig;

/// What came out of processing one push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecryptOutcome {
    /// The push carried no envelope.
    Plaintext(NotificationPayload),
    /// The envelope opened successfully.
    Decrypted(NotificationPayload),
    /// The envelope could not be opened. Carries no detail on purpose.
    Failed,
}

/// A notification ready for the platform to show.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayRequest {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub target_url: String,
}

/// Builds display requests, filling in defaults.
#[derive(Debug, Clone, Default)]
pub struct NotificationDispatcher {
    config: PushConfig,
}

impl NotificationDispatcher {
    pub fn new(config: PushConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PushConfig {
        &self.config
    }

    /// Build the display request for an outcome.
    ///
    /// Empty strings in the payload count as absent.
    pub fn build_display_request(&self, outcome: &DecryptOutcome) -> DisplayRequest {
        let c = &self.config;
        match outcome {
            DecryptOutcome::Plaintext(p) | DecryptOutcome::Decrypted(p) => DisplayRequest {
                title: or_default(&p.title, &c.default_title),
                body: or_default(&p.body, &c.default_body),
                icon: or_default(&p.icon, &c.default_icon),
                badge: or_default(&p.badge, &c.default_badge),
                target_url: or_default(&p.url, &c.default_target_url),
            },
            DecryptOutcome::Failed => DisplayRequest {
                title: c.fallback_title.clone(),
                body: c.fallback_body.clone(),
                icon: c.default_icon.clone(),
                badge: c.default_badge.clone(),
                target_url: c.default_target_url.clone(),
            },
        }
    }
}

fn or_default(value: &Option<String>, default: &str) -> String {
    match value.as_deref() {
        Some(v) if !v.is_empty() => v.to_owned(),
        _ => default.to_owned(),
    }
}
