//! Filling a template: substitution, then the gallery, then the annexures.

use std::time::Instant;

use serde::Serialize;

use crate::config::Config;
use crate::docx::Document;
use crate::error::Error;
use crate::fields::{ANNEXURE_PLACEHOLDERS, GALLERY_PLACEHOLDER};
use crate::layout::{Placement, layout_annexure, layout_gallery};
use crate::request::ReportRequest;
use crate::store::{OutputStore, StoredReport};
use crate::substitute::substitute;

/// What happened to each placeholder during one assembly run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AssemblyReport {
    /// Containers changed across all substitutions.
    pub replacements: usize,
    /// Tokens with a value that matched nothing in the document.
    pub missing_placeholders: Vec<String>,
    /// Tokens left in place because their value was empty.
    pub empty_fields: Vec<String>,
    pub gallery: Option<Placement>,
    pub annexures: Vec<Placement>,
}

/// Apply `request` to an already loaded template.
///
/// Empty field values are skipped, leaving their tokens in the output. Only
/// an unreadable gallery image fails the run; missing placeholders and bad
/// annexure images are reported in the returned [`AssemblyReport`].
pub fn assemble(
    doc: &mut Document,
    request: &ReportRequest,
    config: &Config,
) -> Result<AssemblyReport, Error> {
    let mut report = AssemblyReport::default();

    for (token, value) in request.fields.iter() {
        if value.is_empty() {
            log::debug!("Skipping {}: empty value", token);
            report.empty_fields.push(token.to_string());
            continue;
        }
        let count = substitute(doc, token, value);
        if count == 0 {
            log::warn!("Placeholder {} not found in document", token);
            report.missing_placeholders.push(token.to_string());
        } else {
            log::debug!("Replaced {} ({} times)", token, count);
        }
        report.replacements += count;
    }
    log::info!("Total replacements made: {}", report.replacements);

    if !request.gallery.is_empty() {
        report.gallery = Some(layout_gallery(
            doc,
            &request.gallery,
            GALLERY_PLACEHOLDER,
            &config.gallery,
        )?);
    }

    let last = ANNEXURE_PLACEHOLDERS.len() - 1;
    for (i, (placeholder, items)) in ANNEXURE_PLACEHOLDERS
        .iter()
        .zip(request.annexures.iter())
        .enumerate()
    {
        if items.is_empty() {
            continue;
        }
        report.annexures.push(layout_annexure(
            doc,
            items,
            placeholder,
            &config.annexure,
            i != last,
        ));
    }

    Ok(report)
}

/// A persisted report together with its assembly diagnostics.
#[derive(Clone, Debug, Serialize)]
pub struct GeneratedReport {
    pub stored: StoredReport,
    pub assembly: AssemblyReport,
}

/// Resolve the template for the request, fill it and save the result.
pub fn generate(
    config: &Config,
    request: &ReportRequest,
    store: &OutputStore,
) -> Result<GeneratedReport, Error> {
    let t0 = Instant::now();

    let path = config.templates.resolve(
        &config.template_dir,
        &request.training_type,
        &request.template_id,
    )?;
    let mut doc = Document::open(&path)?;
    log::info!("Loaded template: {}", path.display());
    let t_load = t0.elapsed();

    let assembly = assemble(&mut doc, request, config)?;
    let t_fill = t0.elapsed();

    let bytes = doc.to_bytes()?;
    let stored = store.save(&bytes, &request.filename)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: load={:.1}ms, fill={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_load.as_secs_f64() * 1000.0,
        (t_fill - t_load).as_secs_f64() * 1000.0,
        (t_total - t_fill).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        bytes.len(),
    );

    Ok(GeneratedReport { stored, assembly })
}
