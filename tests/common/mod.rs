#![allow(dead_code)]

use std::io::{Cursor, Read, Write};
use std::path::PathBuf;

use zip::write::SimpleFileOptions;

pub const W_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const R_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// Output directory: tests/output/<name>/
pub fn output_dir(name: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(name);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// A paragraph with one run per piece, e.g. `p(&["{{EVE", "NT_DATE}}"])`.
pub fn p(runs: &[&str]) -> String {
    let runs: String = runs
        .iter()
        .map(|t| format!(r#"<w:r><w:rPr><w:b/></w:rPr><w:t xml:space="preserve">{}</w:t></w:r>"#, t))
        .collect();
    format!("<w:p>{}</w:p>", runs)
}

/// A table with one paragraph per cell.
pub fn table(rows: &[&[&str]]) -> String {
    let rows: String = rows
        .iter()
        .map(|cells| {
            let cells: String = cells
                .iter()
                .map(|text| format!("<w:tc>{}</w:tc>", p(&[*text])))
                .collect();
            format!("<w:tr>{}</w:tr>", cells)
        })
        .collect();
    format!("<w:tbl><w:tblPr/>{}</w:tbl>", rows)
}

/// Minimal DOCX package, with optional default header/footer parts.
pub struct TemplateBuilder {
    body: String,
    header: Option<String>,
    footer: Option<String>,
}

impl TemplateBuilder {
    pub fn new(body: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            header: None,
            footer: None,
        }
    }

    /// Paragraph XML for the default header.
    pub fn header(mut self, content: impl Into<String>) -> Self {
        self.header = Some(content.into());
        self
    }

    pub fn footer(mut self, content: impl Into<String>) -> Self {
        self.footer = Some(content.into());
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut refs = String::new();
        let mut rels = String::new();
        let mut overrides = String::new();
        let mut parts: Vec<(String, String)> = Vec::new();

        if let Some(header) = &self.header {
            refs.push_str(r#"<w:headerReference w:type="default" r:id="rId10"/>"#);
            rels.push_str(r#"<Relationship Id="rId10" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/header" Target="header1.xml"/>"#);
            overrides.push_str(r#"<Override PartName="/word/header1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.header+xml"/>"#);
            parts.push((
                "word/header1.xml".into(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:hdr xmlns:w="{}" xmlns:r="{}">{}</w:hdr>"#, W_NS, R_NS, header),
            ));
        }
        if let Some(footer) = &self.footer {
            refs.push_str(r#"<w:footerReference w:type="default" r:id="rId11"/>"#);
            rels.push_str(r#"<Relationship Id="rId11" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/footer" Target="footer1.xml"/>"#);
            overrides.push_str(r#"<Override PartName="/word/footer1.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.footer+xml"/>"#);
            parts.push((
                "word/footer1.xml".into(),
                format!(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:ftr xmlns:w="{}" xmlns:r="{}">{}</w:ftr>"#, W_NS, R_NS, footer),
            ));
        }

        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="{}" xmlns:r="{}"><w:body>{}<w:sectPr>{}<w:pgSz w:w="11906" w:h="16838"/></w:sectPr></w:body></w:document>"#,
            W_NS, R_NS, self.body, refs
        );
        let content_types = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>{}</Types>"#,
            overrides
        );
        let package_rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;
        let document_rels = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">{}</Relationships>"#,
            rels
        );

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let mut add = |name: &str, data: &str| {
            zip.start_file(name, SimpleFileOptions::default()).unwrap();
            zip.write_all(data.as_bytes()).unwrap();
        };
        add("[Content_Types].xml", &content_types);
        add("_rels/.rels", package_rels);
        add("word/document.xml", &document);
        add("word/_rels/document.xml.rels", &document_rels);
        for (name, data) in &parts {
            add(name, data);
        }
        zip.finish().unwrap().into_inner()
    }
}

pub fn png(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Png)
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, image::ImageFormat::Jpeg)
}

fn encode(width: u32, height: u32, format: image::ImageFormat) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x * 40) as u8, (y * 40) as u8, 128])
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

pub fn part_names(docx: &[u8]) -> Vec<String> {
    let zip = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    zip.file_names().map(String::from).collect()
}

pub fn read_part(docx: &[u8], name: &str) -> Option<String> {
    let mut zip = zip::ZipArchive::new(Cursor::new(docx)).unwrap();
    let mut entry = zip.by_name(name).ok()?;
    let mut s = String::new();
    entry.read_to_string(&mut s).unwrap();
    Some(s)
}

pub fn document_xml(docx: &[u8]) -> String {
    read_part(docx, "word/document.xml").unwrap()
}

/// Top-level body content, summarised.
#[derive(Debug, PartialEq)]
pub enum Block {
    Paragraph(String),
    PageBreak,
    Picture { caption: Option<String> },
    /// Row count and number of cells holding a picture.
    Table { rows: usize, pictures: usize },
    SectPr,
}

fn w(node: roxmltree::Node, local: &str) -> bool {
    node.is_element() && node.tag_name().name() == local && node.tag_name().namespace() == Some(W_NS)
}

pub fn text_of(node: roxmltree::Node) -> String {
    node.descendants()
        .filter(|n| w(*n, "t"))
        .filter_map(|n| n.text())
        .collect()
}

fn has_drawing(node: roxmltree::Node) -> bool {
    node.descendants().any(|n| w(n, "drawing"))
}

fn is_page_break(node: roxmltree::Node) -> bool {
    node.descendants()
        .any(|n| w(n, "br") && n.attribute((W_NS, "type")) == Some("page"))
}

/// Body blocks in order. A caption paragraph directly after a picture is folded
/// into the picture.
pub fn body_blocks(document_xml: &str) -> Vec<Block> {
    let doc = roxmltree::Document::parse(document_xml).unwrap();
    let body = doc
        .root_element()
        .children()
        .find(|n| w(*n, "body"))
        .unwrap();
    let mut blocks: Vec<Block> = Vec::new();
    for node in body.children().filter(|n| n.is_element()) {
        if w(node, "tbl") {
            let rows = node.children().filter(|n| w(*n, "tr")).count();
            let pictures = node
                .descendants()
                .filter(|n| w(*n, "tc"))
                .filter(|tc| has_drawing(*tc))
                .count();
            blocks.push(Block::Table { rows, pictures });
        } else if w(node, "p") {
            if is_page_break(node) {
                blocks.push(Block::PageBreak);
            } else if has_drawing(node) {
                blocks.push(Block::Picture { caption: None });
            } else if let Some(Block::Picture { caption }) = blocks.last_mut()
                && caption.is_none()
                && !text_of(node).is_empty()
            {
                *caption = Some(text_of(node));
            } else {
                blocks.push(Block::Paragraph(text_of(node)));
            }
        } else if w(node, "sectPr") {
            blocks.push(Block::SectPr);
        }
    }
    blocks
}

pub fn count_page_breaks(blocks: &[Block]) -> usize {
    blocks.iter().filter(|b| **b == Block::PageBreak).count()
}

/// Per-cell pictures of every body table, row-major.
pub fn table_captions(document_xml: &str) -> Vec<Vec<String>> {
    let doc = roxmltree::Document::parse(document_xml).unwrap();
    doc.descendants()
        .filter(|n| w(*n, "tbl"))
        .map(|tbl| {
            tbl.descendants()
                .filter(|n| w(*n, "tc"))
                .filter(|tc| has_drawing(*tc))
                .map(|tc| {
                    tc.children()
                        .filter(|n| w(*n, "p") && !has_drawing(*n))
                        .map(text_of)
                        .collect::<String>()
                })
                .collect()
        })
        .collect()
}
