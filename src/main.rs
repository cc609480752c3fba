// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Certportal API Server
//!
//! Reviews student achievement claims and issues verifiable PDF
//! certificates with embedded QR codes.

use certportal::{
    config::{Config, StoreBackend},
    db::RecordStore,
    services::{MailService, PdfRenderer},
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(port = config.port, "Starting Certportal API");

    certportal::error::expose_internal_details(!config.production);

    // Record store connection failure is fatal
    let db = match config.store_backend {
        StoreBackend::Firestore => RecordStore::connect_firestore(&config.gcp_project_id).await?,
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory record store; data is lost on restart");
            RecordStore::new_in_memory()
        }
    };

    let renderer = PdfRenderer::new(config.font_dir.as_deref(), &config.font_family)?;
    let mail = MailService::new(&config)?;
    if config.mail_api_key.is_none() {
        tracing::warn!("MAIL_API_KEY not set; certificate emails cannot be delivered");
    }

    let state = Arc::new(AppState::new(config.clone(), db, renderer, mail));
    state.artifacts.ensure_dirs().await?;
    tracing::info!(
        certificate_dir = %config.certificate_dir.display(),
        upload_dir = %config.upload_dir.display(),
        "Artifact storage ready"
    );

    // Build router
    let app = certportal::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("certportal=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
