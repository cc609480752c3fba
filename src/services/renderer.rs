// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Certificate document renderer.
//!
//! Layout is computed as plain data ([`CertificateLayout`]) and then drawn
//! with `genpdf` onto a fixed landscape A4 page. genpdf needs real font files
//! for metrics; they are loaded once when the renderer is created.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use genpdf::elements::{Break, Image, LinearLayout, Paragraph};
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style::Style;
use genpdf::{Alignment, Element as _, Size};
use image::{DynamicImage, GenericImageView};

use crate::models::AchievementLevel;
use crate::time_utils::format_display_date;

/// Landscape A4, in millimetres.
const PAGE_WIDTH_MM: f64 = 297.0;
const PAGE_HEIGHT_MM: f64 = 210.0;

/// Directories searched for fonts when no FONT_DIR is configured.
const FONT_SEARCH_PATHS: &[&str] = &[
    "/usr/share/fonts/truetype/liberation",
    "/usr/share/fonts/liberation",
    "/usr/share/fonts/TTF",
    "/usr/share/fonts/truetype/dejavu",
    "/System/Library/Fonts/Supplemental",
    "/Library/Fonts",
];
const FALLBACK_FAMILIES: &[&str] = &["LiberationSans", "DejaVuSans", "Arial"];

/// Families whose files don't follow genpdf's `<name>-Regular.ttf` naming,
/// as (family, regular, bold, italic, bold italic) file names.
const EXPLICIT_FAMILIES: &[(&str, [&str; 4])] = &[(
    "DejaVuSans",
    [
        "DejaVuSans.ttf",
        "DejaVuSans-Bold.ttf",
        "DejaVuSans-Oblique.ttf",
        "DejaVuSans-BoldOblique.ttf",
    ],
)];

const UNKNOWN: &str = "Unknown";

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("Missing required certificate field: {0}")]
    MissingField(&'static str),

    #[error("Font loading failed: {0}")]
    Font(String),

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Input fields for one certificate. Only name, title and ID are required.
#[derive(Debug, Clone, Default)]
pub struct CertificateFields {
    pub student_name: Option<String>,
    pub title: Option<String>,
    pub organizing_body: Option<String>,
    pub level: Option<AchievementLevel>,
    pub event_date: Option<NaiveDate>,
    pub certificate_id: Option<String>,
    pub description: Option<String>,
}

/// Text content of a rendered certificate, in page order.
#[derive(Debug, Clone, PartialEq)]
pub struct CertificateLayout {
    pub heading: String,
    pub preamble: String,
    /// Uppercased
    pub student_name: String,
    pub achievement_line: String,
    /// Uppercased
    pub title: String,
    /// (label, value) rows
    pub details: Vec<(String, String)>,
    pub description: Option<String>,
    pub footer: String,
    pub certificate_id: String,
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, RenderError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or(RenderError::MissingField(field))
}

impl CertificateLayout {
    /// Build the layout, defaulting optional fields to display strings.
    ///
    /// `today` fills in a missing event date and is always the issue date.
    pub fn from_fields(fields: &CertificateFields, today: NaiveDate) -> Result<Self, RenderError> {
        let student_name = required(&fields.student_name, "student_name")?;
        let title = required(&fields.title, "title")?;
        let certificate_id = required(&fields.certificate_id, "certificate_id")?;

        let organizer = fields
            .organizing_body
            .as_deref()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .unwrap_or(UNKNOWN)
            .to_string();
        let level = fields.level.unwrap_or_default().to_string();
        let event_date = format_display_date(fields.event_date.unwrap_or(today));

        let details = vec![
            ("Level".to_string(), level),
            ("Organized by".to_string(), organizer),
            ("Event date".to_string(), event_date),
            ("Issued on".to_string(), format_display_date(today)),
            ("Certificate ID".to_string(), certificate_id.clone()),
        ];

        Ok(Self {
            heading: "CERTIFICATE OF ACHIEVEMENT".to_string(),
            preamble: "This is to certify that".to_string(),
            student_name: student_name.to_uppercase(),
            achievement_line: "has been recognized for".to_string(),
            title: title.to_uppercase(),
            details,
            description: fields
                .description
                .as_deref()
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(String::from),
            footer: "Scan the QR code or visit the verification portal to confirm authenticity."
                .to_string(),
            certificate_id,
        })
    }

    /// All text lines in page order.
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            self.heading.clone(),
            self.preamble.clone(),
            self.student_name.clone(),
            self.achievement_line.clone(),
            self.title.clone(),
        ];
        lines.extend(
            self.details
                .iter()
                .map(|(label, value)| format!("{}: {}", label, value)),
        );
        if let Some(description) = &self.description {
            lines.push(description.clone());
        }
        lines.push(self.footer.clone());
        lines
    }
}

/// Style files for `name` in `dir`: explicit names first, then genpdf's
/// `<name>-Regular/-Bold/-Italic/-BoldItalic.ttf` convention.
fn family_files(dir: &Path, name: &str) -> [PathBuf; 4] {
    match EXPLICIT_FAMILIES.iter().find(|(family, _)| *family == name) {
        Some((_, files)) => files.map(|file| dir.join(file)),
        None => ["Regular", "Bold", "Italic", "BoldItalic"]
            .map(|style| dir.join(format!("{}-{}.ttf", name, style))),
    }
}

fn load_family(dir: &Path, name: &str) -> Option<FontFamily<FontData>> {
    let [regular, bold, italic, bold_italic] = family_files(dir, name)
        .map(|path| FontData::load(&path, None).map_err(|e| (path, e)));
    match (regular, bold, italic, bold_italic) {
        (Ok(regular), Ok(bold), Ok(italic), Ok(bold_italic)) => Some(FontFamily {
            regular,
            bold,
            italic,
            bold_italic,
        }),
        (Err((path, e)), ..) => {
            tracing::debug!(path = %path.display(), error = %e, "Font family not loadable");
            None
        }
        _ => {
            tracing::debug!(dir = %dir.display(), family = name, "Font family incomplete");
            None
        }
    }
}

/// PDF renderer holding a loaded font family.
#[derive(Clone)]
pub struct PdfRenderer {
    fonts: Option<Arc<FontFamily<FontData>>>,
}

impl PdfRenderer {
    /// Load fonts from `font_dir`, or search the usual system locations.
    pub fn new(font_dir: Option<&Path>, family: &str) -> Result<Self, RenderError> {
        let dirs: Vec<PathBuf> = match font_dir {
            Some(dir) => vec![dir.to_path_buf()],
            None => FONT_SEARCH_PATHS.iter().map(PathBuf::from).collect(),
        };

        let fonts = dirs
            .iter()
            .filter(|dir| dir.exists())
            .find_map(|dir| {
                std::iter::once(family)
                    .chain(FALLBACK_FAMILIES.iter().copied())
                    .find_map(|name| load_family(dir, name))
            })
            .ok_or_else(|| {
                RenderError::Font(format!(
                    "No usable '{}' font family found (install fonts-liberation or set FONT_DIR)",
                    family
                ))
            })?;

        tracing::info!(family, "Loaded certificate fonts");

        Ok(Self {
            fonts: Some(Arc::new(fonts)),
        })
    }

    /// Renderer that emits a deterministic text placeholder instead of a PDF.
    /// Only available in debug/test builds.
    #[cfg(debug_assertions)]
    pub fn new_mock() -> Self {
        Self { fonts: None }
    }

    /// Render the certificate page with the QR image placed below the details.
    pub fn render(
        &self,
        layout: &CertificateLayout,
        qr: &DynamicImage,
    ) -> Result<Vec<u8>, RenderError> {
        // Mock mode (Debug builds only)
        #[cfg(debug_assertions)]
        {
            if self.fonts.is_none() {
                let mut out = b"%PDF-1.4\n".to_vec();
                for line in layout.lines() {
                    out.extend_from_slice(line.as_bytes());
                    out.push(b'\n');
                }
                out.extend_from_slice(format!("QR {}x{}\n", qr.width(), qr.height()).as_bytes());
                out.extend_from_slice(b"%%EOF\n");
                return Ok(out);
            }
        }

        let fonts = self
            .fonts
            .as_ref()
            .ok_or_else(|| RenderError::Font("Fonts not loaded".to_string()))?;

        let mut doc = genpdf::Document::new(FontFamily::clone(fonts));
        doc.set_title(format!("Certificate {}", layout.certificate_id));
        doc.set_paper_size(Size::new(PAGE_WIDTH_MM, PAGE_HEIGHT_MM));

        let mut decorator = genpdf::SimplePageDecorator::new();
        decorator.set_margins(12);
        doc.set_page_decorator(decorator);

        let centered = |text: &str, style: Style| {
            Paragraph::new(text)
                .aligned(Alignment::Center)
                .styled(style)
        };

        let mut body = LinearLayout::vertical();
        body.push(centered(&layout.heading, Style::new().bold().with_font_size(28)));
        body.push(Break::new(1.0));
        body.push(centered(&layout.preamble, Style::new().with_font_size(13)));
        body.push(centered(
            &layout.student_name,
            Style::new().bold().with_font_size(24),
        ));
        body.push(centered(&layout.achievement_line, Style::new().with_font_size(13)));
        body.push(centered(&layout.title, Style::new().bold().with_font_size(18)));
        body.push(Break::new(1.0));

        for (label, value) in &layout.details {
            body.push(centered(
                &format!("{}: {}", label, value),
                Style::new().with_font_size(11),
            ));
        }

        if let Some(description) = &layout.description {
            body.push(Break::new(0.5));
            body.push(centered(description, Style::new().italic().with_font_size(10)));
        }

        body.push(Break::new(0.5));
        let qr_element = Image::from_dynamic_image(qr.clone())
            .map_err(|e| RenderError::Pdf(format!("QR image rejected: {}", e)))?
            .with_alignment(Alignment::Center);
        body.push(qr_element);

        body.push(Break::new(0.5));
        body.push(centered(&layout.footer, Style::new().with_font_size(9)));

        doc.push(body.padded(4).framed());

        let mut out = Vec::new();
        doc.render(&mut out)
            .map_err(|e| RenderError::Pdf(e.to_string()))?;
        Ok(out)
    }
}
