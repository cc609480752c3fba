// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! QR encoding of certificate verification URLs.
//!
//! The payload is always `{verification_base_url}/{certificate_id}`, i.e. the
//! QR code points at the lookup-by-ID route. The separate verification code
//! is never encoded here.

use image::{DynamicImage, ImageOutputFormat, Luma};
use qrcode::{EcLevel, QrCode};

/// Minimum rendered edge length in pixels (quiet zone included).
pub const QR_MIN_DIMENSION: u32 = 240;

#[derive(Debug, thiserror::Error)]
pub enum QrError {
    #[error("QR encoding failed: {0}")]
    Encode(#[from] qrcode::types::QrError),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Build the URL embedded in a certificate's QR code.
pub fn verification_url(base_url: &str, certificate_id: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(certificate_id)
    )
}

/// Encode `payload` at high error correction as a grayscale raster.
pub fn encode(payload: &str) -> Result<DynamicImage, QrError> {
    let code = QrCode::with_error_correction_level(payload.as_bytes(), EcLevel::H)?;
    let raster = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_MIN_DIMENSION, QR_MIN_DIMENSION)
        .quiet_zone(true)
        .build();
    Ok(DynamicImage::ImageLuma8(raster))
}

/// PNG bytes for a QR image.
pub fn to_png(image: &DynamicImage) -> Result<Vec<u8>, QrError> {
    let mut png = Vec::new();
    image.write_to(&mut png, ImageOutputFormat::Png)?;
    Ok(png)
}
