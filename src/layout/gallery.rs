use crate::config::GallerySettings;
use crate::docx::{Document, wml};
use crate::error::Error;
use crate::model::{EmbeddedImage, Extent, MediaItem};

use super::{AnchorScope, Cursor, LayoutSummary, Placement, erase_placeholder, find_anchor};

const CAPTION: wml::CaptionStyle = wml::CaptionStyle {
    half_points: 20,
    bold: true,
    space_after: None,
};

/// Images assigned to one physical page of the gallery.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LayoutPage {
    pub start: usize,
    pub end: usize,
    pub rows: usize,
}

impl LayoutPage {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `count` images into pages of `images_per_row * rows_per_page`. The last
/// page gets only as many rows as it needs.
pub fn plan_pages(count: usize, images_per_row: usize, rows_per_page: usize) -> Vec<LayoutPage> {
    let per_row = images_per_row.max(1);
    let rows_per_page = rows_per_page.max(1);
    let per_page = per_row * rows_per_page;

    (0..count)
        .step_by(per_page)
        .map(|start| {
            let end = (start + per_page).min(count);
            let rows = (end - start).div_ceil(per_row).min(rows_per_page);
            LayoutPage { start, end, rows }
        })
        .collect()
}

/// Lay out `items` as a grid of tables, one table per page, at the first body
/// paragraph containing `placeholder`. Every table is followed by a page break.
///
/// Images are checked before the document is touched; an unreadable image
/// fails the whole gallery.
pub fn layout_gallery(
    doc: &mut Document,
    items: &[MediaItem],
    placeholder: &str,
    settings: &GallerySettings,
) -> Result<Placement, Error> {
    let Some(anchor) = find_anchor(doc.body(), placeholder, AnchorScope::Body) else {
        log::warn!("Placeholder {} not found in document", placeholder);
        return Ok(Placement::NotFound {
            placeholder: placeholder.to_string(),
        });
    };

    let images = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            EmbeddedImage::decode(&item.data).map_err(|e| {
                Error::Image(format!("gallery image {} ({}): {}", i + 1, item.label, e))
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    if !erase_placeholder(doc.body_mut(), &anchor, placeholder) {
        log::warn!("Could not erase {} from its paragraph", placeholder);
    }
    let mut summary = LayoutSummary::default();
    if items.is_empty() {
        return Ok(Placement::Placed(summary));
    }

    let per_row = settings.images_per_row.max(1);
    let extent = Extent::from_cm(settings.image_width_cm, settings.image_height_cm);
    let pages = plan_pages(items.len(), per_row, settings.rows_per_page);
    log::info!(
        "Inserting {} gallery images on {} page(s) at {}",
        items.len(),
        pages.len(),
        placeholder
    );

    let mut cursor = Cursor::after(&anchor);
    for page in &pages {
        let mut placed = 0;
        let mut rows: Vec<Vec<Option<wml::GridCell>>> = Vec::with_capacity(page.rows);
        for r in 0..page.rows {
            let mut row = Vec::with_capacity(per_row);
            for c in 0..per_row {
                let i = page.start + r * per_row + c;
                if i >= page.end {
                    row.push(None);
                    continue;
                }
                let item = &items[i];
                let drawing_run = doc.embed_image(&images[i], extent, &item.label);
                row.push(Some(wml::GridCell {
                    drawing_run,
                    caption: item.caption().map(String::from),
                }));
                placed += 1;
            }
            rows.push(row);
        }

        let table = wml::fragment(&wml::grid_table_xml(
            &rows,
            per_row,
            settings.image_width_cm,
            &CAPTION,
        ))?;
        if !cursor.insert(doc.body_mut(), table) {
            log::warn!("Lost the insertion point after {}, stopping", placeholder);
            break;
        }
        summary.tables += 1;
        summary.images += placed;

        if cursor.insert(doc.body_mut(), wml::page_break_paragraph()) {
            summary.page_breaks += 1;
        }
    }

    Ok(Placement::Placed(summary))
}
