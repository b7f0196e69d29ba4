use crate::config::AnnexureSettings;
use crate::docx::{Document, wml};
use crate::error::Error;
use crate::model::{EmbeddedImage, Extent, MediaItem};
use crate::xml::Element;

use super::{
    AnchorScope, Cursor, LayoutSummary, Placement, SkippedImage, erase_placeholder, find_anchor,
};

const CAPTION: wml::CaptionStyle = wml::CaptionStyle {
    half_points: 22,
    bold: true,
    space_after: Some(240),
};

/// Insert one picture per page after the first paragraph (body, then table
/// cells) containing `placeholder`, each followed by its caption.
///
/// Pages are separated by page breaks; a break after the last picture is added
/// only with `add_final_page_break`. An image that can't be embedded is logged
/// and skipped without affecting the others.
pub fn layout_annexure(
    doc: &mut Document,
    items: &[MediaItem],
    placeholder: &str,
    settings: &AnnexureSettings,
    add_final_page_break: bool,
) -> Placement {
    let Some(anchor) = find_anchor(doc.body(), placeholder, AnchorScope::BodyThenTables) else {
        log::warn!("Placeholder {} not found in document", placeholder);
        return Placement::NotFound {
            placeholder: placeholder.to_string(),
        };
    };
    if !erase_placeholder(doc.body_mut(), &anchor, placeholder) {
        log::warn!("Could not erase {} from its paragraph", placeholder);
    }
    log::info!("Found {}, inserting {} images", placeholder, items.len());

    let extent = Extent::from_cm(settings.image_width_cm, settings.image_height_cm);
    let mut summary = LayoutSummary::default();
    let mut cursor = Cursor::after(&anchor);

    for (i, item) in items.iter().enumerate() {
        let blocks = match image_blocks(doc, item, extent) {
            Ok(blocks) => blocks,
            Err(e) => {
                log::warn!("Error inserting annexure image {} ({}): {}", i + 1, item.label, e);
                summary.skipped.push(SkippedImage {
                    position: i + 1,
                    label: item.label.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        // Break before every inserted picture except the first.
        if summary.images > 0 && cursor.insert(doc.body_mut(), wml::page_break_paragraph()) {
            summary.page_breaks += 1;
        }
        if !blocks.into_iter().all(|block| cursor.insert(doc.body_mut(), block)) {
            log::warn!("Lost the insertion point after {}, stopping", placeholder);
            break;
        }
        summary.images += 1;
        log::debug!("Inserted annexure image {}: {}", i + 1, item.label);
    }

    if add_final_page_break
        && summary.images > 0
        && cursor.insert(doc.body_mut(), wml::page_break_paragraph())
    {
        summary.page_breaks += 1;
        log::debug!("Added final page break after {}", placeholder);
    }

    Placement::Placed(summary)
}

/// The picture paragraph and, when captioned, the caption paragraph.
fn image_blocks(doc: &mut Document, item: &MediaItem, extent: Extent) -> Result<Vec<Element>, Error> {
    let image = EmbeddedImage::decode(&item.data)?;
    let drawing_run = doc.embed_image(&image, extent, &item.label);
    let mut blocks = vec![wml::fragment(&wml::picture_paragraph_xml(&drawing_run))?];
    if let Some(caption) = item.caption() {
        blocks.push(wml::fragment(&wml::caption_paragraph_xml(caption, &CAPTION))?);
    }
    Ok(blocks)
}
