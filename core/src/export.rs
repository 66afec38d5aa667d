//! Tabular export of an edition's guests and preselections.
//!
//! Used when an edition is archived. The renderer is a seam: `CsvRenderer` writes
//! RFC 4180 CSV, other formats can be plugged in through [`ExportRenderer`].

use crate::phone::format_phone_for_display;
use crate::types::{Guest, Preselection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;

/// Column order of the guest export
pub const GUEST_FIELDS: [&str; 20] = [
    "id",
    "name",
    "email",
    "phone",
    "company",
    "role",
    "referrer",
    "status",
    "registered_at",
    "confirmed_at",
    "checked_in_at",
    "checked_in_by",
    "preferred_name",
    "profile_url",
    "company_size",
    "industry",
    "product_description",
    "revenue_band",
    "business_model",
    "invite_url",
];

/// Column order of the preselection export
pub const PRESELECTION_FIELDS: [&str; 9] = [
    "id",
    "name",
    "phone",
    "company",
    "role",
    "email",
    "status",
    "created_at",
    "promoted_at",
];

/// Turns field names plus rows into a text document
pub trait ExportRenderer: Send + Sync {
    /// Renders `rows` under a header made of `fields`
    fn render(&self, fields: &[&str], rows: &[Vec<String>]) -> String;
}

/// RFC 4180 CSV with `\n` line endings
#[derive(Clone, Copy, Debug, Default)]
pub struct CsvRenderer;

impl ExportRenderer for CsvRenderer {
    fn render(&self, fields: &[&str], rows: &[Vec<String>]) -> String {
        let mut out = String::new();
        push_line(&mut out, fields.iter().copied());
        for row in rows {
            push_line(&mut out, row.iter().map(String::as_str));
        }
        out
    }
}

fn push_line<'a>(out: &mut String, fields: impl Iterator<Item = &'a str>) {
    for (index, field) in fields.enumerate() {
        if index > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push('\n');
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\r', '\n']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// The side artifacts produced by archiving an edition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionExport {
    /// Guests of the archived edition
    pub guests_csv: String,
    /// Preselections of the archived edition
    pub preselections_csv: String,
}

impl EditionExport {
    /// Renders both exports with `renderer`
    #[must_use]
    pub fn render(
        renderer: &dyn ExportRenderer,
        guests: &[Guest],
        preselections: &[Preselection],
    ) -> Self {
        let guest_rows: Vec<Vec<String>> = guests.iter().map(guest_row).collect();
        let preselection_rows: Vec<Vec<String>> =
            preselections.iter().map(preselection_row).collect();
        Self {
            guests_csv: renderer.render(&GUEST_FIELDS, &guest_rows),
            preselections_csv: renderer.render(&PRESELECTION_FIELDS, &preselection_rows),
        }
    }
}

fn timestamp(value: Option<DateTime<Utc>>) -> String {
    value.map(|at| at.to_rfc3339()).unwrap_or_default()
}

fn text(value: Option<&String>) -> String {
    value.cloned().unwrap_or_default()
}

fn guest_row(guest: &Guest) -> Vec<String> {
    let enrichment = &guest.enrichment;
    vec![
        guest.id.to_string(),
        guest.name.clone(),
        guest.email.clone(),
        format_phone_for_display(&guest.phone),
        guest.company.clone(),
        guest.role.clone(),
        guest.referrer.clone(),
        guest.status.as_str().to_string(),
        guest.registered_at.to_rfc3339(),
        timestamp(guest.confirmed_at),
        timestamp(guest.checked_in_at),
        text(guest.checked_in_by.as_ref()),
        text(enrichment.preferred_name.as_ref()),
        text(enrichment.profile_url.as_ref()),
        text(enrichment.company_size.as_ref()),
        text(enrichment.industry.as_ref()),
        text(enrichment.product_description.as_ref()),
        text(enrichment.revenue_band.as_ref()),
        text(enrichment.business_model.as_ref()),
        guest.invite_url.clone(),
    ]
}

fn preselection_row(preselection: &Preselection) -> Vec<String> {
    vec![
        preselection.id.to_string(),
        preselection.name.clone(),
        format_phone_for_display(&preselection.phone),
        preselection.company.clone(),
        preselection.role.clone(),
        text(preselection.email.as_ref()),
        preselection.status.as_str().to_string(),
        preselection.created_at.to_rfc3339(),
        timestamp(preselection.promoted_at),
    ]
}
