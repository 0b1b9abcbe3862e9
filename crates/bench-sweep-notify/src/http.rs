// crates/bench-sweep-notify/src/http.rs
// ============================================================================
// Module: HTTP Notifier
// Description: Messaging-endpoint notifier using bounded GET requests.
// Purpose: Push run and sweep outcomes to a chat bot endpoint.
// Dependencies: bench-sweep-core, reqwest
// ============================================================================

//! ## Overview
//! Each event is rendered with [`render_message`] and sent as a GET request
//! carrying `text`, `parse_mode`, and `chat_id` query parameters, the shape
//! accepted by Telegram-compatible bot APIs. Redirects are not followed and
//! every request is bounded by the configured timeout. Endpoint URLs often
//! embed bot tokens, so errors and log events never include the URL.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use bench_sweep_core::LogEvent;
use bench_sweep_core::LogLevel;
use bench_sweep_core::Notifier;
use bench_sweep_core::SweepEvent;
use bench_sweep_core::SweepLog;
use bench_sweep_core::render_message;
use reqwest::Url;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use thiserror::Error;

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Configuration for the HTTP notifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpNotifierConfig {
    /// Endpoint URL receiving messages.
    pub endpoint: String,
    /// Chat identifier sent with every message.
    pub chat_id: String,
    /// Message markup mode.
    pub parse_mode: String,
    /// Request timeout covering the full request lifecycle.
    pub timeout: Duration,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl HttpNotifierConfig {
    /// Creates a configuration with the default markup mode and timeout.
    #[must_use]
    pub fn new(endpoint: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            chat_id: chat_id.into(),
            parse_mode: "markdown".to_string(),
            timeout: Duration::from_secs(5),
            user_agent: concat!("bench-sweep/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Notification delivery errors.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// Endpoint URL is malformed or not http(s).
    #[error("notify endpoint invalid: {0}")]
    Endpoint(String),
    /// HTTP client could not be constructed.
    #[error("notify client build failed: {0}")]
    Client(String),
    /// Request failed before a response arrived.
    #[error("notify request failed: {0}")]
    Request(String),
    /// Endpoint answered with a non-success status.
    #[error("notify endpoint returned status {0}")]
    Status(u16),
}

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Notifier delivering messages to an HTTP endpoint.
pub struct HttpNotifier {
    /// Parsed endpoint URL.
    endpoint: Url,
    /// Chat identifier.
    chat_id: String,
    /// Markup mode.
    parse_mode: String,
    /// Client used for outbound requests.
    client: Client,
    /// Sink for delivery failures.
    log: Arc<dyn SweepLog>,
}

impl HttpNotifier {
    /// Creates a notifier for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the endpoint is invalid or the client
    /// cannot be built.
    pub fn new(config: HttpNotifierConfig, log: Arc<dyn SweepLog>) -> Result<Self, NotifyError> {
        let endpoint = Url::parse(config.endpoint.trim())
            .map_err(|err| NotifyError::Endpoint(err.to_string()))?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(NotifyError::Endpoint(format!(
                "unsupported scheme {}",
                endpoint.scheme()
            )));
        }
        if endpoint.host_str().is_none() {
            return Err(NotifyError::Endpoint("missing host".to_string()));
        }
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .redirect(Policy::none())
            .build()
            .map_err(|err| NotifyError::Client(err.without_url().to_string()))?;
        Ok(Self {
            endpoint,
            chat_id: config.chat_id,
            parse_mode: config.parse_mode,
            client,
            log,
        })
    }

    /// Sends one message.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the request fails or the endpoint
    /// answers with a non-success status.
    pub fn deliver(&self, text: &str) -> Result<(), NotifyError> {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("text", text)
            .append_pair("parse_mode", &self.parse_mode)
            .append_pair("chat_id", &self.chat_id);
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| NotifyError::Request(err.without_url().to_string()))?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(NotifyError::Status(status.as_u16()))
        }
    }
}

impl Notifier for HttpNotifier {
    fn notify(&self, event: &SweepEvent<'_>) {
        if let Err(err) = self.deliver(&render_message(event)) {
            self.log.record(
                &LogEvent::new("notify_failed", LogLevel::Warn, "notification not delivered")
                    .with("host", self.endpoint.host_str().unwrap_or_default())
                    .with("error", err),
            );
        }
    }
}
