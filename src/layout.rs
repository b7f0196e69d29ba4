//! Placeholder-anchored picture layouts: the paginated gallery and the
//! one-picture-per-page annexures.

pub mod annexure;
pub mod gallery;

use serde::Serialize;

use crate::docx::wml;
use crate::substitute::collapse_replace;
use crate::xml::{Element, Node};

pub use annexure::layout_annexure;
pub use gallery::{LayoutPage, layout_gallery, plan_pages};

/// Where a placeholder search may look.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnchorScope {
    /// Paragraphs directly under the body.
    Body,
    /// Body paragraphs first, then paragraphs in body table cells.
    BodyThenTables,
}

/// Position of a paragraph: the raw child-index path from the body to its
/// container, and its index within that container.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Anchor {
    pub container: Vec<usize>,
    pub index: usize,
}

/// Paragraphs in search order. Lazy, so `find` stops at the first match.
pub fn paragraphs_in_order(
    body: &Element,
    scope: AnchorScope,
) -> impl Iterator<Item = (Anchor, &Element)> {
    let direct = wml::indexed(body, "p").map(|(index, p)| {
        (
            Anchor {
                container: Vec::new(),
                index,
            },
            p,
        )
    });

    let in_tables = wml::indexed(body, "tbl")
        .filter(move |_| scope == AnchorScope::BodyThenTables)
        .flat_map(|(ti, table)| {
            wml::indexed(table, "tr").flat_map(move |(ri, row)| {
                wml::indexed(row, "tc").flat_map(move |(ci, cell)| {
                    wml::indexed(cell, "p").map(move |(index, p)| {
                        (
                            Anchor {
                                container: vec![ti, ri, ci],
                                index,
                            },
                            p,
                        )
                    })
                })
            })
        });

    direct.chain(in_tables)
}

/// First paragraph whose run text contains `placeholder`.
pub fn find_anchor(body: &Element, placeholder: &str, scope: AnchorScope) -> Option<Anchor> {
    if placeholder.is_empty() {
        return None;
    }
    paragraphs_in_order(body, scope)
        .find(|(_, p)| wml::paragraph_text(p).contains(placeholder))
        .map(|(anchor, _)| anchor)
}

/// Remove the placeholder text from the anchor paragraph, keeping the paragraph.
pub fn erase_placeholder(body: &mut Element, anchor: &Anchor, placeholder: &str) -> bool {
    body.at_path_mut(&anchor.container)
        .and_then(|container| container.children.get_mut(anchor.index))
        .and_then(Node::as_element_mut)
        .is_some_and(|paragraph| collapse_replace(paragraph, placeholder, ""))
}

/// Inserts blocks one after another, starting right after an anchor paragraph.
pub(crate) struct Cursor {
    container: Vec<usize>,
    position: usize,
}

impl Cursor {
    pub(crate) fn after(anchor: &Anchor) -> Self {
        Self {
            container: anchor.container.clone(),
            position: anchor.index,
        }
    }

    /// Insert `block` after the current position and move onto it. False, with
    /// the body unchanged, when the cursor's container no longer exists.
    #[must_use]
    pub(crate) fn insert(&mut self, body: &mut Element, block: Element) -> bool {
        let Some(container) = body.at_path_mut(&self.container) else {
            return false;
        };
        let at = (self.position + 1).min(container.children.len());
        container.children.insert(at, Node::Element(block));
        self.position = at;
        true
    }
}

/// An image that was left out of a layout, and why.
#[derive(Clone, Debug, Serialize)]
pub struct SkippedImage {
    pub position: usize,
    pub label: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct LayoutSummary {
    pub tables: usize,
    pub images: usize,
    pub page_breaks: usize,
    pub skipped: Vec<SkippedImage>,
}

/// Outcome of a layout call. A missing placeholder is reported, not raised.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Placement {
    NotFound { placeholder: String },
    Placed(LayoutSummary),
}

impl Placement {
    pub fn summary(&self) -> Option<&LayoutSummary> {
        match self {
            Placement::Placed(summary) => Some(summary),
            Placement::NotFound { .. } => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Placement::NotFound { .. })
    }
}
