// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod activity;
pub mod ids;
pub mod issuer;
pub mod mail;
pub mod notification;
pub mod profile;
pub mod qr;
pub mod renderer;
pub mod storage;
pub mod verification;

pub use activity::{ActivityService, NewActivity, ProofUpload};
pub use issuer::{CertificateIssuer, IssuerSettings};
pub use mail::{MailError, MailService};
pub use notification::{DeliveryError, NotificationDispatcher};
pub use profile::{ProfileService, RecruiterProfile};
pub use renderer::PdfRenderer;
pub use storage::ArtifactStore;
pub use verification::{Caller, VerificationResult, VerificationService};
