// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Certificate email delivery.
//!
//! Sending is always an explicit follow-up to issuance. Every attempt that
//! gets past input validation is appended to the certificate's email history,
//! successful or not. There is no automatic retry.

use std::path::PathBuf;
use std::sync::OnceLock;

use chrono::Utc;
use tera::{Context, Tera};

use crate::db::RecordStore;
use crate::error::AppError;
use crate::models::certificate::EmailAttempt;
use crate::models::{AchievementLevel, Certificate, EmailStatus};
use crate::services::mail::{Attachment, MailService, OutgoingMessage};
use crate::services::storage::ArtifactStore;

#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("recipient email address is missing")]
    MissingRecipient,

    #[error("certificate ID is missing")]
    MissingCertificateId,

    #[error("certificate artifact location is missing")]
    MissingArtifactLocation,

    #[error("certificate artifact not found at {0}")]
    ArtifactNotFound(String),

    #[error("email template failed to render: {0}")]
    Template(String),

    #[error("mail provider rejected the message: {0}")]
    Provider(String),
}

/// Everything needed to email one certificate.
#[derive(Debug, Clone, Default)]
pub struct CertificateDelivery {
    pub recipient_email: Option<String>,
    pub recipient_name: String,
    pub certificate_id: Option<String>,
    pub artifact_path: Option<String>,
    pub title: String,
    pub organizing_body: Option<String>,
    pub level: Option<AchievementLevel>,
    pub verification_url: String,
    pub verification_code: String,
}

/// Validated delivery inputs.
struct Validated<'a> {
    recipient: &'a str,
    certificate_id: &'a str,
    artifact_path: &'a str,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CertificateDelivery {
    pub fn for_certificate(cert: &Certificate, recipient_email: Option<String>) -> Self {
        Self {
            recipient_email,
            recipient_name: cert.student_name.clone(),
            certificate_id: Some(cert.id.clone()),
            artifact_path: Some(cert.artifact_path.clone()),
            title: cert.title.clone(),
            organizing_body: cert.organizing_body.clone(),
            level: cert.level,
            verification_url: cert.verification_url.clone(),
            verification_code: cert.verification_code.clone(),
        }
    }

    fn validate(&self) -> Result<Validated<'_>, DeliveryError> {
        Ok(Validated {
            recipient: non_blank(&self.recipient_email).ok_or(DeliveryError::MissingRecipient)?,
            certificate_id: non_blank(&self.certificate_id)
                .ok_or(DeliveryError::MissingCertificateId)?,
            artifact_path: non_blank(&self.artifact_path)
                .ok_or(DeliveryError::MissingArtifactLocation)?,
        })
    }
}

const EMAIL_TEMPLATE: &str = "certificate_email.html";

static TERA: OnceLock<Result<Tera, String>> = OnceLock::new();

/// Email templates, compiled once. The `.html` name turns on autoescaping.
fn templates() -> Result<&'static Tera, DeliveryError> {
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_template(
            EMAIL_TEMPLATE,
            include_str!("../../templates/certificate_email.html"),
        )
        .map_err(|e| e.to_string())?;
        Ok(tera)
    })
    .as_ref()
    .map_err(|e| DeliveryError::Template(e.clone()))
}

/// Build the templated message with the PDF attached.
pub fn compose_message(
    delivery: &CertificateDelivery,
    recipient: &str,
    pdf: Vec<u8>,
) -> Result<OutgoingMessage, DeliveryError> {
    let certificate_id = delivery.certificate_id.as_deref().unwrap_or_default();

    let mut context = Context::new();
    context.insert("name", &delivery.recipient_name);
    context.insert("title", &delivery.title);
    context.insert("level", &delivery.level.unwrap_or_default().to_string());
    context.insert(
        "organizer",
        delivery.organizing_body.as_deref().unwrap_or("Unknown"),
    );
    context.insert("certificate_id", certificate_id);
    context.insert("verification_code", &delivery.verification_code);
    context.insert("verification_url", &delivery.verification_url);

    let html_body = templates()?
        .render(EMAIL_TEMPLATE, &context)
        .map_err(|e| DeliveryError::Template(e.to_string()))?;

    Ok(OutgoingMessage {
        to_email: recipient.to_string(),
        to_name: delivery.recipient_name.clone(),
        subject: format!("Your certificate: {}", delivery.title),
        html_body,
        attachments: vec![Attachment {
            name: format!("{}.pdf", certificate_id),
            content: pdf,
        }],
    })
}

/// Outcome of a delivery attempt that passed validation.
#[derive(Debug)]
pub struct DeliveryOutcome {
    pub attempt: EmailAttempt,
    pub result: Result<String, DeliveryError>,
}

#[derive(Clone)]
pub struct NotificationDispatcher {
    db: RecordStore,
    artifacts: ArtifactStore,
    mail: MailService,
}

impl NotificationDispatcher {
    pub fn new(db: RecordStore, artifacts: ArtifactStore, mail: MailService) -> Self {
        Self {
            db,
            artifacts,
            mail,
        }
    }

    /// Read the artifact, attach it and submit to the provider.
    ///
    /// Validation failures return `Err` before any I/O. Everything after
    /// validation yields a [`DeliveryOutcome`] carrying the attempt to record.
    pub async fn deliver(
        &self,
        delivery: &CertificateDelivery,
    ) -> Result<DeliveryOutcome, DeliveryError> {
        let valid = delivery.validate()?;

        let outcome = |result: Result<String, DeliveryError>| {
            let (status, message_id, error) = match &result {
                Ok(id) => (EmailStatus::Sent, Some(id.clone()), None),
                Err(e) => (EmailStatus::Failed, None, Some(e.to_string())),
            };
            DeliveryOutcome {
                attempt: EmailAttempt {
                    attempted_at: Utc::now(),
                    recipient: valid.recipient.to_string(),
                    message_id,
                    status,
                    error,
                },
                result,
            }
        };

        let path = PathBuf::from(valid.artifact_path);
        let pdf = match self.artifacts.read(&path).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                return Ok(outcome(Err(DeliveryError::ArtifactNotFound(
                    valid.artifact_path.to_string(),
                ))))
            }
            Err(e) => {
                tracing::warn!(certificate_id = valid.certificate_id, error = %e, "Artifact read failed");
                return Ok(outcome(Err(DeliveryError::ArtifactNotFound(
                    valid.artifact_path.to_string(),
                ))));
            }
        };

        let message = match compose_message(delivery, valid.recipient, pdf) {
            Ok(message) => message,
            Err(e) => return Ok(outcome(Err(e))),
        };
        let result = self
            .mail
            .send(&message)
            .await
            .map_err(|e| DeliveryError::Provider(e.to_string()));
        Ok(outcome(result))
    }

    /// Email an issued certificate to its student and record the attempt.
    ///
    /// Returns the recorded attempt on success. On delivery failure the
    /// failed attempt is still recorded before the error is returned.
    pub async fn send_certificate(&self, certificate_id: &str) -> Result<EmailAttempt, AppError> {
        let cert = self
            .db
            .get_certificate(certificate_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Certificate {}", certificate_id)))?;

        let student = self.db.get_user(&cert.student_id).await?;
        let recipient = student.and_then(|s| s.email);

        let delivery = CertificateDelivery::for_certificate(&cert, recipient);
        let DeliveryOutcome { attempt, result } = self.deliver(&delivery).await?;

        let recorded = attempt.clone();
        self.db
            .update_certificate(certificate_id, move |c: &mut Certificate| {
                c.record_email(recorded.clone());
                Ok(())
            })
            .await?;

        match result {
            Ok(message_id) => {
                tracing::info!(
                    certificate_id,
                    recipient = %attempt.recipient,
                    message_id = %message_id,
                    "Certificate emailed"
                );
                Ok(attempt)
            }
            Err(e) => {
                tracing::warn!(
                    certificate_id,
                    recipient = %attempt.recipient,
                    error = %e,
                    "Certificate email failed"
                );
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delivery() -> CertificateDelivery {
        CertificateDelivery {
            recipient_email: Some("asha@example.edu".to_string()),
            recipient_name: "Asha <Rao>".to_string(),
            certificate_id: Some("CERT_1_ABCD".to_string()),
            artifact_path: Some("certificates/CERT_1_ABCD/certificate.pdf".to_string()),
            title: "Hackathon Win".to_string(),
            organizing_body: None,
            level: None,
            verification_url: "http://localhost/verify/CERT_1_ABCD".to_string(),
            verification_code: "00FF".to_string(),
        }
    }

    #[test]
    fn test_validation_order() {
        let mut d = delivery();
        d.recipient_email = Some("  ".to_string());
        d.certificate_id = None;
        assert!(matches!(d.validate(), Err(DeliveryError::MissingRecipient)));

        let mut d = delivery();
        d.certificate_id = None;
        assert!(matches!(d.validate(), Err(DeliveryError::MissingCertificateId)));

        let mut d = delivery();
        d.artifact_path = Some(String::new());
        assert!(matches!(
            d.validate(),
            Err(DeliveryError::MissingArtifactLocation)
        ));

        assert!(delivery().validate().is_ok());
    }

    #[test]
    fn test_compose_message_attaches_pdf_and_escapes() {
        let mut d = delivery();
        d.title = "<script>alert(1)</script>".to_string();
        d.organizing_body = Some("Tom & Jerry's".to_string());
        let message = compose_message(&d, "asha@example.edu", b"%PDF".to_vec()).unwrap();

        assert_eq!(message.subject, "Your certificate: <script>alert(1)</script>");
        assert!(message.html_body.contains("Dear Asha &lt;Rao&gt;"));
        assert!(!message.html_body.contains("<script>"));
        assert!(message.html_body.contains("&lt;script&gt;"));
        assert!(message.html_body.contains("Tom &amp; Jerry"));
        assert!(message
            .html_body
            .contains("<a href=\"http:&#x2F;&#x2F;localhost&#x2F;verify&#x2F;CERT_1_ABCD\">"));
    }

    #[test]
    fn test_compose_message_defaults() {
        let message =
            compose_message(&delivery(), "asha@example.edu", b"%PDF".to_vec()).unwrap();
        assert!(message.html_body.contains("Level: College"));
        assert!(message.html_body.contains("Organized by: Unknown"));
        assert_eq!(message.attachments.len(), 1);
        assert_eq!(message.attachments[0].name, "CERT_1_ABCD.pdf");
        assert_eq!(message.attachments[0].content, b"%PDF");
    }
}
