// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identifier generation for activities, certificates and verification codes.

use chrono::{DateTime, Utc};
use ring::rand::{SecureRandom, SystemRandom};

use crate::error::AppError;

/// Random bytes in a certificate ID suffix (8 hex chars).
const CERTIFICATE_SUFFIX_BYTES: usize = 4;
/// Random bytes in a verification code (32 hex chars).
const VERIFICATION_CODE_BYTES: usize = 16;
const ACTIVITY_SUFFIX_BYTES: usize = 6;

fn random_hex(len: usize) -> Result<String, AppError> {
    let mut buf = vec![0u8; len];
    SystemRandom::new()
        .fill(&mut buf)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("System RNG failure")))?;
    Ok(hex::encode_upper(buf))
}

/// Human-readable certificate ID: `<PREFIX>_<unix millis>_<8 hex>`.
pub fn certificate_id(prefix: &str, now: DateTime<Utc>) -> Result<String, AppError> {
    Ok(format!(
        "{}_{}_{}",
        prefix,
        now.timestamp_millis(),
        random_hex(CERTIFICATE_SUFFIX_BYTES)?
    ))
}

/// Unguessable public verification code, distinct from the certificate ID.
pub fn verification_code() -> Result<String, AppError> {
    random_hex(VERIFICATION_CODE_BYTES)
}

pub fn activity_id(now: DateTime<Utc>) -> Result<String, AppError> {
    Ok(format!(
        "ACT_{}_{}",
        now.timestamp_millis(),
        random_hex(ACTIVITY_SUFFIX_BYTES)?
    ))
}
