// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Certportal: student achievement certification service
//!
//! Students submit achievement claims, faculty review them, admins issue
//! PDF certificates carrying a verification QR code and email them, and
//! anyone can verify a certificate by its ID or verification code.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::RecordStore;
use services::{
    ActivityService, ArtifactStore, CertificateIssuer, IssuerSettings, MailService,
    NotificationDispatcher, PdfRenderer, ProfileService, VerificationService,
};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: RecordStore,
    pub artifacts: ArtifactStore,
    pub activities: ActivityService,
    pub issuer: CertificateIssuer,
    pub dispatcher: NotificationDispatcher,
    pub verifier: VerificationService,
    pub profiles: ProfileService,
}

impl AppState {
    /// Wire services over one store, renderer and mail transport.
    pub fn new(config: Config, db: RecordStore, renderer: PdfRenderer, mail: MailService) -> Self {
        let artifacts = ArtifactStore::new(&config.certificate_dir, &config.upload_dir);

        Self {
            activities: ActivityService::new(db.clone(), artifacts.clone()),
            issuer: CertificateIssuer::new(
                db.clone(),
                artifacts.clone(),
                renderer,
                IssuerSettings::from_config(&config),
            ),
            dispatcher: NotificationDispatcher::new(db.clone(), artifacts.clone(), mail),
            verifier: VerificationService::new(db.clone(), config.enforce_certificate_expiry),
            profiles: ProfileService::new(db.clone(), config.enforce_certificate_expiry),
            artifacts,
            db,
            config,
        }
    }
}
