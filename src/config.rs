//! Application configuration loaded from environment variables.
//!
//! Values are read once at startup; a `.env` file is honored for local
//! development.

use std::env;
use std::path::PathBuf;

/// Which record store backend to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Firestore,
    Memory,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Service ---
    /// Server port
    pub port: u16,
    /// `true` when APP_ENV=production (hides internal error details)
    pub production: bool,
    /// Frontend URL (CORS origin)
    pub frontend_url: String,
    /// GCP project ID
    pub gcp_project_id: String,
    /// Record store backend
    pub store_backend: StoreBackend,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    // --- Certificates ---
    /// Base URL encoded into QR codes; the certificate ID is appended
    pub verification_base_url: String,
    /// Root directory for rendered certificates and QR images
    pub certificate_dir: PathBuf,
    /// Root directory for uploaded proof documents
    pub upload_dir: PathBuf,
    /// Human-readable certificate ID prefix
    pub certificate_id_prefix: String,
    /// Validity window from issuance
    pub certificate_validity_days: i64,
    /// Reject expired certificates on verification
    pub enforce_certificate_expiry: bool,
    /// Refuse to issue a second certificate for the same activity
    pub single_certificate_per_activity: bool,
    /// Directory holding the PDF font family (searched if unset)
    pub font_dir: Option<PathBuf>,
    /// Font family file stem, e.g. "LiberationSans"
    pub font_family: String,

    // --- Mail provider ---
    pub mail_api_url: String,
    /// Empty key selects the mock transport in debug builds
    pub mail_api_key: Option<String>,
    pub mail_sender_email: String,
    pub mail_sender_name: String,
    pub mail_timeout_secs: u64,
}

impl Config {
    /// Deterministic config for tests.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            production: false,
            frontend_url: "http://localhost:5173".to_string(),
            gcp_project_id: "test-project".to_string(),
            store_backend: StoreBackend::Memory,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            verification_base_url: "http://localhost:5173/verify".to_string(),
            certificate_dir: PathBuf::from("certificates"),
            upload_dir: PathBuf::from("uploads"),
            certificate_id_prefix: "CERT".to_string(),
            certificate_validity_days: 365,
            enforce_certificate_expiry: true,
            single_certificate_per_activity: false,
            font_dir: None,
            font_family: "LiberationSans".to_string(),
            mail_api_url: "http://127.0.0.1:9/v3/smtp/email".to_string(),
            mail_api_key: None,
            mail_sender_email: "noreply@certportal.local".to_string(),
            mail_sender_name: "Certificate Office".to_string(),
            mail_timeout_secs: 5,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let frontend_url =
            env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string());

        let store_backend = match env::var("STORE_BACKEND")
            .unwrap_or_else(|_| "firestore".to_string())
            .to_lowercase()
            .as_str()
        {
            "firestore" => StoreBackend::Firestore,
            "memory" => StoreBackend::Memory,
            other => {
                return Err(ConfigError::Invalid(
                    "STORE_BACKEND",
                    format!("expected 'firestore' or 'memory', got '{}'", other),
                ))
            }
        };

        Ok(Self {
            port: parse_or("PORT", 8080)?,
            production: env::var("APP_ENV")
                .map(|v| v.eq_ignore_ascii_case("production"))
                .unwrap_or(false),
            verification_base_url: env::var("VERIFICATION_BASE_URL")
                .unwrap_or_else(|_| format!("{}/verify", frontend_url.trim_end_matches('/'))),
            frontend_url,
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),
            store_backend,
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            certificate_dir: PathBuf::from(
                env::var("CERTIFICATE_DIR").unwrap_or_else(|_| "certificates".to_string()),
            ),
            upload_dir: PathBuf::from(
                env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string()),
            ),
            certificate_id_prefix: env::var("CERTIFICATE_ID_PREFIX")
                .unwrap_or_else(|_| "CERT".to_string()),
            certificate_validity_days: validity_days(parse_or(
                "CERTIFICATE_VALIDITY_DAYS",
                365,
            )?)?,
            enforce_certificate_expiry: parse_or("ENFORCE_CERTIFICATE_EXPIRY", true)?,
            single_certificate_per_activity: parse_or("SINGLE_CERTIFICATE_PER_ACTIVITY", false)?,
            font_dir: env::var("FONT_DIR").ok().map(PathBuf::from),
            font_family: env::var("FONT_FAMILY").unwrap_or_else(|_| "LiberationSans".to_string()),

            mail_api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.brevo.com/v3/smtp/email".to_string()),
            mail_api_key: env::var("MAIL_API_KEY")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            mail_sender_email: env::var("MAIL_SENDER_EMAIL")
                .unwrap_or_else(|_| "noreply@certportal.local".to_string()),
            mail_sender_name: env::var("MAIL_SENDER_NAME")
                .unwrap_or_else(|_| "Certificate Office".to_string()),
            mail_timeout_secs: parse_or("MAIL_TIMEOUT_SECS", 30)?,
        })
    }
}

/// Parse an optional env var, falling back to `default` when unset.
/// Longest accepted certificate validity, about a century.
const MAX_VALIDITY_DAYS: i64 = 36_500;

fn validity_days(days: i64) -> Result<i64, ConfigError> {
    if !(1..=MAX_VALIDITY_DAYS).contains(&days) {
        return Err(ConfigError::Invalid(
            "CERTIFICATE_VALIDITY_DAYS",
            format!("{} is outside 1..={}", days, MAX_VALIDITY_DAYS),
        ));
    }
    Ok(days)
}

fn parse_or<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::Invalid(name, e.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
