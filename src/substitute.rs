//! Placeholder substitution over paragraphs, table cells, headers and footers.

use crate::docx::{Document, wml};
use crate::xml::Element;

/// Replace every occurrence of `token` with `value` and return how many
/// containers (paragraphs, table cells, in body, headers and footers) changed.
///
/// Visiting order: body paragraphs, body table cells (row-major), then per
/// section its header parts followed by its footer parts. A part shared by
/// several sections is visited once.
pub fn substitute(doc: &mut Document, token: &str, value: &str) -> usize {
    if token.is_empty() {
        log::warn!("Ignoring substitution with an empty token");
        return 0;
    }

    let mut count = substitute_in_container(doc.body_mut(), token, value);

    let mut order: Vec<usize> = Vec::new();
    for section in doc.sections() {
        for &idx in section.headers.iter().chain(section.footers.iter()) {
            if !order.contains(&idx) {
                order.push(idx);
            }
        }
    }
    for idx in order {
        if let Some(part) = doc.header_footer_part_mut(idx) {
            let changed = substitute_in_container(&mut part.root, token, value);
            if changed > 0 {
                log::debug!("Replaced {} in {} container(s) of {}", token, changed, part.name);
            }
            count += changed;
        }
    }
    count
}

/// Body, header or footer: its direct paragraphs, then its direct tables' cells.
pub fn substitute_in_container(container: &mut Element, token: &str, value: &str) -> usize {
    let mut count = 0;
    for paragraph in container.elements_mut().filter(|e| wml::is(e, "p")) {
        if replace_in_paragraph(paragraph, token, value) {
            count += 1;
        }
    }
    for table in container.elements_mut().filter(|e| wml::is(e, "tbl")) {
        for row in table.elements_mut().filter(|e| wml::is(e, "tr")) {
            for cell in row.elements_mut().filter(|e| wml::is(e, "tc")) {
                if replace_in_cell(cell, token, value) {
                    count += 1;
                }
            }
        }
    }
    count
}

fn replace_in_cell(cell: &mut Element, token: &str, value: &str) -> bool {
    let mut replaced = false;
    for paragraph in cell.elements_mut().filter(|e| wml::is(e, "p")) {
        if replace_in_paragraph(paragraph, token, value) {
            replaced = true;
        }
    }
    replaced
}

/// Runs that contain the whole token are edited in place and keep their
/// formatting. The paragraph's text collapses into its first run only when no
/// single run held the token; a direct match leaves cross-run occurrences in the
/// same paragraph untouched.
pub fn replace_in_paragraph(paragraph: &mut Element, token: &str, value: &str) -> bool {
    let mut direct = false;
    for run in wml::runs_mut(paragraph) {
        let text = wml::run_text(run);
        if text.contains(token) {
            wml::set_run_text(run, &text.replace(token, value));
            direct = true;
        }
    }
    if direct {
        return true;
    }
    collapse_replace(paragraph, token, value)
}

/// Replace `token` in the paragraph's concatenated run text, put the result in
/// the first run and blank the rest. Formatting of later runs is lost.
pub fn collapse_replace(paragraph: &mut Element, token: &str, value: &str) -> bool {
    let full_text = wml::paragraph_text(paragraph);
    if !full_text.contains(token) {
        return false;
    }
    let new_text = full_text.replace(token, value);
    for (i, run) in wml::runs_mut(paragraph).enumerate() {
        wml::set_run_text(run, if i == 0 { &new_text } else { "" });
    }
    true
}
