pub mod assembly;
pub mod config;
pub mod docx;
mod error;
pub mod fields;
pub mod layout;
pub mod model;
pub mod request;
pub mod store;
pub mod substitute;
pub mod xml;

pub use assembly::{AssemblyReport, GeneratedReport, assemble, generate};
pub use config::Config;
pub use docx::Document;
pub use error::Error;
pub use model::{FieldValues, MediaItem};
pub use request::ReportRequest;

use std::path::Path;
use std::time::Instant;

/// Fill the template at `template` and write the result to `output`.
pub fn fill_template(
    template: &Path,
    request: &ReportRequest,
    config: &Config,
    output: &Path,
) -> Result<AssemblyReport, Error> {
    let t0 = Instant::now();

    let mut doc = Document::open(template)?;
    let t_parse = t0.elapsed();

    let report = assemble(&mut doc, request, config)?;
    let t_fill = t0.elapsed();

    let size = doc.save(output)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: parse={:.1}ms, fill={:.1}ms, write={:.1}ms, total={:.1}ms (output {} bytes)",
        t_parse.as_secs_f64() * 1000.0,
        (t_fill - t_parse).as_secs_f64() * 1000.0,
        (t_total - t_fill).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        size,
    );

    Ok(report)
}

/// In-memory variant of [`fill_template`].
pub fn fill_template_bytes(
    template: &[u8],
    request: &ReportRequest,
    config: &Config,
) -> Result<(Vec<u8>, AssemblyReport), Error> {
    let mut doc = Document::from_bytes(template)?;
    let report = assemble(&mut doc, request, config)?;
    Ok((doc.to_bytes()?, report))
}
