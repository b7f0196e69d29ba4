mod common;

use common::{Block, TemplateBuilder, body_blocks, document_xml, jpeg, p, png, table};
use docxide_report::config::AnnexureSettings;
use docxide_report::layout::layout_annexure;
use docxide_report::model::EMU_PER_CM;
use docxide_report::{Document, MediaItem};

const PLACEHOLDER: &str = "{{ANNEXURE1_TABLE}}";

fn scans(n: usize) -> Vec<MediaItem> {
    (1..=n)
        .map(|i| MediaItem::new(jpeg(6, 8), format!("Scan {}", i)).with_label(format!("scan{}.jpg", i)))
        .collect()
}

fn pictures(blocks: &[Block]) -> usize {
    blocks
        .iter()
        .filter(|b| matches!(b, Block::Picture { .. }))
        .count()
}

#[test]
fn breaks_between_pictures_without_final_flag() {
    let _ = env_logger::try_init();
    let template = TemplateBuilder::new(p(&[PLACEHOLDER])).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    let placement = layout_annexure(&mut doc, &scans(3), PLACEHOLDER, &AnnexureSettings::default(), false);
    let summary = placement.summary().unwrap();
    assert_eq!((summary.images, summary.page_breaks), (3, 2));

    let blocks = body_blocks(&document_xml(&doc.to_bytes().unwrap()));
    assert_eq!(
        blocks,
        vec![
            Block::Paragraph("".into()),
            Block::Picture { caption: Some("Scan 1".into()) },
            Block::PageBreak,
            Block::Picture { caption: Some("Scan 2".into()) },
            Block::PageBreak,
            Block::Picture { caption: Some("Scan 3".into()) },
            Block::SectPr,
        ]
    );
}

#[test]
fn final_flag_adds_one_more_break() {
    let _ = env_logger::try_init();
    for k in 1..=4 {
        for final_break in [false, true] {
            let template = TemplateBuilder::new(p(&[PLACEHOLDER])).build();
            let mut doc = Document::from_bytes(&template).unwrap();
            layout_annexure(&mut doc, &scans(k), PLACEHOLDER, &AnnexureSettings::default(), final_break);

            let blocks = body_blocks(&document_xml(&doc.to_bytes().unwrap()));
            assert_eq!(pictures(&blocks), k);
            let expected = if final_break { k } else { k - 1 };
            assert_eq!(common::count_page_breaks(&blocks), expected, "k={} final={}", k, final_break);
        }
    }
}

#[test]
fn anchor_in_table_cell_is_found() {
    let _ = env_logger::try_init();
    let body = format!("{}{}", p(&["Annexure I"]), table(&[&["label", PLACEHOLDER]]));
    let template = TemplateBuilder::new(body).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    let placement = layout_annexure(&mut doc, &scans(2), PLACEHOLDER, &AnnexureSettings::default(), false);
    assert_eq!(placement.summary().unwrap().images, 2);

    let xml = document_xml(&doc.to_bytes().unwrap());
    assert!(!xml.contains(PLACEHOLDER));
    let parsed = roxmltree::Document::parse(&xml).unwrap();
    let cell = parsed
        .descendants()
        .filter(|n| n.tag_name().name() == "tc")
        .nth(1)
        .unwrap();
    let drawings = cell
        .descendants()
        .filter(|n| n.tag_name().name() == "drawing")
        .count();
    assert_eq!(drawings, 2);
}

#[test]
fn summary_counts_match_blocks_inserted_in_a_cell() {
    let _ = env_logger::try_init();
    let body = table(&[&["label", PLACEHOLDER]]);
    let template = TemplateBuilder::new(body).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    let placement = layout_annexure(&mut doc, &scans(3), PLACEHOLDER, &AnnexureSettings::default(), true);
    let summary = placement.summary().unwrap();

    let xml = document_xml(&doc.to_bytes().unwrap());
    let parsed = roxmltree::Document::parse(&xml).unwrap();
    let cell = parsed
        .descendants()
        .filter(|n| n.tag_name().name() == "tc")
        .nth(1)
        .unwrap();
    let drawings = cell
        .descendants()
        .filter(|n| n.tag_name().name() == "drawing")
        .count();
    let breaks = cell
        .descendants()
        .filter(|n| n.tag_name().name() == "br" && n.attribute((common::W_NS, "type")) == Some("page"))
        .count();
    assert_eq!((summary.images, summary.page_breaks), (3, 3));
    assert_eq!((drawings, breaks), (summary.images, summary.page_breaks));
    assert!(!xml.contains(PLACEHOLDER));
}

#[test]
fn body_anchor_wins_over_table_anchor() {
    let _ = env_logger::try_init();
    let body = format!("{}{}", table(&[&[PLACEHOLDER]]), p(&[PLACEHOLDER]));
    let template = TemplateBuilder::new(body).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    layout_annexure(&mut doc, &scans(1), PLACEHOLDER, &AnnexureSettings::default(), false);
    let xml = document_xml(&doc.to_bytes().unwrap());
    let blocks = body_blocks(&xml);
    assert_eq!(blocks[0], Block::Table { rows: 1, pictures: 0 });
    assert_eq!(blocks[2], Block::Picture { caption: Some("Scan 1".into()) });
    assert_eq!(xml.matches(PLACEHOLDER).count(), 1);
}

#[test]
fn unreadable_image_is_skipped() {
    let _ = env_logger::try_init();
    let template = TemplateBuilder::new(p(&[PLACEHOLDER])).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    let items = vec![
        MediaItem::new(png(4, 4), "First"),
        MediaItem::new(b"\x00\x01garbage".to_vec(), "Broken").with_label("broken.png"),
        MediaItem::new(png(4, 4), "Third"),
    ];
    let placement = layout_annexure(&mut doc, &items, PLACEHOLDER, &AnnexureSettings::default(), false);
    let summary = placement.summary().unwrap();
    assert_eq!(summary.images, 2);
    assert_eq!(summary.skipped.len(), 1);
    assert_eq!(summary.skipped[0].position, 2);
    assert_eq!(summary.skipped[0].label, "broken.png");

    let blocks = body_blocks(&document_xml(&doc.to_bytes().unwrap()));
    assert_eq!(
        &blocks[1..],
        &[
            Block::Picture { caption: Some("First".into()) },
            Block::PageBreak,
            Block::Picture { caption: Some("Third".into()) },
            Block::SectPr,
        ]
    );
}

#[test]
fn missing_placeholder_is_reported() {
    let _ = env_logger::try_init();
    let template = TemplateBuilder::new(p(&["{{ANNEXURE2_TABLE}}"])).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    let placement = layout_annexure(&mut doc, &scans(2), PLACEHOLDER, &AnnexureSettings::default(), true);
    assert!(placement.is_not_found());
    let blocks = body_blocks(&document_xml(&doc.to_bytes().unwrap()));
    assert_eq!(blocks[0], Block::Paragraph("{{ANNEXURE2_TABLE}}".into()));
    assert_eq!(pictures(&blocks), 0);
}

#[test]
fn uncaptioned_picture_has_no_caption_paragraph() {
    let _ = env_logger::try_init();
    let template = TemplateBuilder::new(p(&[PLACEHOLDER])).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    let items = vec![MediaItem::new(png(2, 2), ""), MediaItem::new(png(2, 2), "")];
    layout_annexure(&mut doc, &items, PLACEHOLDER, &AnnexureSettings::default(), false);
    let xml = document_xml(&doc.to_bytes().unwrap());
    let blocks = body_blocks(&xml);
    assert_eq!(
        blocks,
        vec![
            Block::Paragraph("".into()),
            Block::Picture { caption: None },
            Block::PageBreak,
            Block::Picture { caption: None },
            Block::SectPr,
        ]
    );
}

#[test]
fn pictures_use_configured_size() {
    let _ = env_logger::try_init();
    let template = TemplateBuilder::new(p(&[PLACEHOLDER])).build();
    let mut doc = Document::from_bytes(&template).unwrap();

    layout_annexure(&mut doc, &scans(1), PLACEHOLDER, &AnnexureSettings::default(), false);
    let xml = document_xml(&doc.to_bytes().unwrap());
    let parsed = roxmltree::Document::parse(&xml).unwrap();
    let extent = parsed
        .descendants()
        .find(|n| n.tag_name().name() == "extent")
        .unwrap();
    assert_eq!(extent.attribute("cx"), Some(&*format!("{}", (15.0 * EMU_PER_CM) as i64)));
    assert_eq!(extent.attribute("cy"), Some(&*format!("{}", (20.0 * EMU_PER_CM) as i64)));
}
