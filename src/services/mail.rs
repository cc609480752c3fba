// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Transactional mail provider client.
//!
//! Speaks the Brevo `POST /v3/smtp/email` JSON API: sender, recipients,
//! subject, HTML body and base64 attachments, authenticated with an
//! `api-key` header. The provider returns a message ID used for auditing.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use serde::{Deserialize, Serialize};

use crate::config::Config;

/// One file attached to an outgoing message.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub name: String,
    pub content: Vec<u8>,
}

/// Fully composed outgoing message.
#[derive(Debug, Clone)]
pub struct OutgoingMessage {
    pub to_email: String,
    pub to_name: String,
    pub subject: String,
    pub html_body: String,
    pub attachments: Vec<Attachment>,
}

#[derive(Serialize)]
struct Contact<'a> {
    email: &'a str,
    name: &'a str,
}

#[derive(Serialize)]
struct EncodedAttachment<'a> {
    name: &'a str,
    content: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Contact<'a>,
    to: Vec<Contact<'a>>,
    subject: &'a str,
    html_content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    attachment: Vec<EncodedAttachment<'a>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SendResponse {
    message_id: String,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail provider API key not configured")]
    NotConfigured,

    #[error("mail provider unreachable: {0}")]
    Unreachable(#[source] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    Rejected {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("unexpected mail provider response: {0}")]
    Decode(#[source] reqwest::Error),
}

#[derive(Clone, Copy)]
enum Transport {
    Provider,
    #[cfg(debug_assertions)]
    Mock,
}

/// Mail provider client.
#[derive(Clone)]
pub struct MailService {
    http: reqwest::Client,
    transport: Transport,
    api_url: String,
    api_key: Option<String>,
    sender_email: String,
    sender_name: String,
}

impl MailService {
    /// Client for the configured provider. A missing API key is not an error
    /// here; every send then fails with [`MailError::NotConfigured`].
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.mail_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            transport: Transport::Provider,
            api_url: config.mail_api_url.clone(),
            api_key: config.mail_api_key.clone(),
            sender_email: config.mail_sender_email.clone(),
            sender_name: config.mail_sender_name.clone(),
        })
    }

    /// Client that accepts every message without network I/O.
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self {
            http: reqwest::Client::new(),
            transport: Transport::Mock,
            api_url: "http://mock.invalid/v3/smtp/email".to_string(),
            api_key: None,
            sender_email: "noreply@certportal.local".to_string(),
            sender_name: "Certificate Office".to_string(),
        }
    }

    /// Submit a message. Returns the provider's message ID.
    pub async fn send(&self, message: &OutgoingMessage) -> Result<String, MailError> {
        // Mock mode (Debug builds only)
        #[cfg(debug_assertions)]
        {
            if matches!(self.transport, Transport::Mock) {
                tracing::debug!(recipient = %message.to_email, "Mock mail transport accepted message");
                return Ok(format!("<mock-{}@certportal.local>", message.to_email));
            }
        }

        let api_key = self.api_key.as_deref().ok_or(MailError::NotConfigured)?;

        let body = SendRequest {
            sender: Contact {
                email: &self.sender_email,
                name: &self.sender_name,
            },
            to: vec![Contact {
                email: &message.to_email,
                name: &message.to_name,
            }],
            subject: &message.subject,
            html_content: &message.html_body,
            attachment: message
                .attachments
                .iter()
                .map(|a| EncodedAttachment {
                    name: &a.name,
                    content: BASE64.encode(&a.content),
                })
                .collect(),
        };

        let response = self
            .http
            .post(&self.api_url)
            .header("api-key", api_key)
            .header("accept", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(MailError::Unreachable)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(MailError::Rejected { status, body });
        }

        let parsed: SendResponse = response.json().await.map_err(MailError::Decode)?;
        Ok(parsed.message_id)
    }
}
