//! WordprocessingML helpers over the owned tree: run/paragraph text and the
//! fragments inserted by the layouts.

use crate::error::Error;
use crate::model::{Extent, cm_to_twips};
use crate::xml::{self, Element, Node, QName, escape_attr, escape_text};

use super::WML_NS;

const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const DML_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const PIC_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

pub fn is(el: &Element, local: &str) -> bool {
    el.is(WML_NS, local)
}

pub fn name(local: &str) -> QName {
    QName::new(Some("w"), Some(WML_NS), local)
}

/// Direct `w:r` children of a paragraph.
pub fn runs(paragraph: &Element) -> impl Iterator<Item = &Element> {
    paragraph.elements().filter(|e| is(e, "r"))
}

pub fn runs_mut(paragraph: &mut Element) -> impl Iterator<Item = &mut Element> {
    paragraph.elements_mut().filter(|e| is(e, "r"))
}

/// Raw-index children with the given WML name.
pub fn indexed<'a>(parent: &'a Element, local: &'a str) -> impl Iterator<Item = (usize, &'a Element)> {
    parent.indexed_elements().filter(move |(_, e)| is(e, local))
}

fn is_page_break(el: &Element) -> bool {
    matches!(el.attribute(Some(WML_NS), "type"), Some("page") | Some("column"))
}

fn text_of(el: &Element) -> Option<String> {
    if el.name.namespace.as_deref() != Some(WML_NS) {
        return None;
    }
    match el.name.local.as_str() {
        "t" => Some(
            el.children
                .iter()
                .filter_map(|n| match n {
                    Node::Text(t) => Some(t.as_str()),
                    _ => None,
                })
                .collect(),
        ),
        "tab" | "ptab" => Some("\t".into()),
        "br" if !is_page_break(el) => Some("\n".into()),
        "cr" => Some("\n".into()),
        "noBreakHyphen" => Some("-".into()),
        _ => None,
    }
}

fn is_text_content(node: &Node) -> bool {
    node.as_element().is_some_and(|e| text_of(e).is_some())
}

pub fn run_text(run: &Element) -> String {
    run.elements().filter_map(text_of).collect()
}

/// Concatenated text of the paragraph's direct runs.
pub fn paragraph_text(paragraph: &Element) -> String {
    runs(paragraph).map(run_text).collect()
}

/// Replace the text-bearing children of a run. Run properties, drawings and
/// page breaks stay where they are; `\t` and `\n` become `w:tab` / `w:br`.
pub fn set_run_text(run: &mut Element, text: &str) {
    let insert_at = run
        .children
        .iter()
        .position(is_text_content)
        .unwrap_or(run.children.len());
    run.children.retain(|n| !is_text_content(n));
    let insert_at = insert_at.min(run.children.len());
    let nodes = text_nodes(text);
    run.children.splice(insert_at..insert_at, nodes);
}

fn text_nodes(text: &str) -> Vec<Node> {
    let mut nodes = Vec::new();
    let mut pending = String::new();
    let flush = |pending: &mut String, nodes: &mut Vec<Node>| {
        if pending.is_empty() {
            return;
        }
        let mut t = Element::new(name("t"));
        t.set_attribute(QName::new(Some("xml"), Some(XML_NS), "space"), "preserve");
        t.children.push(Node::Text(std::mem::take(pending)));
        nodes.push(Node::Element(t));
    };
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut pending, &mut nodes);
                nodes.push(Node::Element(Element::new(name("tab"))));
            }
            '\n' => {
                flush(&mut pending, &mut nodes);
                nodes.push(Node::Element(Element::new(name("br"))));
            }
            '\r' => {}
            _ => pending.push(c),
        }
    }
    flush(&mut pending, &mut nodes);
    nodes
}

/// `<w:p><w:r><w:br w:type="page"/></w:r></w:p>`
pub fn page_break_paragraph() -> Element {
    let mut br = Element::new(name("br"));
    br.set_attribute(name("type"), "page");
    let mut run = Element::new(name("r"));
    run.children.push(Node::Element(br));
    let mut p = Element::new(name("p"));
    p.children.push(Node::Element(run));
    p
}

/// Formatting of a caption paragraph under a picture.
pub struct CaptionStyle {
    pub half_points: u32,
    pub bold: bool,
    /// Space after the paragraph, in twentieths of a point.
    pub space_after: Option<u32>,
}

pub fn drawing_run_xml(rel_id: &str, extent: Extent, drawing_id: u32, descr: &str) -> String {
    format!(
        r#"<w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0" xmlns:wp="{wpd}"><wp:extent cx="{cx}" cy="{cy}"/><wp:effectExtent l="0" t="0" r="0" b="0"/><wp:docPr id="{id}" name="Picture {id}" descr="{descr}"/><wp:cNvGraphicFramePr><a:graphicFrameLocks xmlns:a="{dml}" noChangeAspect="1"/></wp:cNvGraphicFramePr><a:graphic xmlns:a="{dml}"><a:graphicData uri="{pic}"><pic:pic xmlns:pic="{pic}"><pic:nvPicPr><pic:cNvPr id="{id}" name="Picture {id}"/><pic:cNvPicPr/></pic:nvPicPr><pic:blipFill><a:blip r:embed="{rel}" xmlns:r="{rel_ns}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill><pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm><a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing></w:r>"#,
        wpd = WPD_NS,
        dml = DML_NS,
        pic = PIC_NS,
        rel_ns = REL_NS,
        cx = extent.cx,
        cy = extent.cy,
        id = drawing_id,
        descr = escape_attr(descr),
        rel = escape_attr(rel_id),
    )
}

pub fn caption_paragraph_xml(caption: &str, style: &CaptionStyle) -> String {
    let spacing = style
        .space_after
        .map(|after| format!(r#"<w:spacing w:after="{}"/>"#, after))
        .unwrap_or_default();
    let bold = if style.bold { "<w:b/><w:bCs/>" } else { "" };
    let mut runs = String::new();
    for (i, line) in caption.split('\n').enumerate() {
        let br = if i > 0 { "<w:br/>" } else { "" };
        runs.push_str(&format!(
            r#"<w:r><w:rPr>{bold}<w:sz w:val="{sz}"/><w:szCs w:val="{sz}"/></w:rPr>{br}<w:t xml:space="preserve">{text}</w:t></w:r>"#,
            bold = bold,
            sz = style.half_points,
            br = br,
            text = escape_text(line),
        ));
    }
    format!(
        r#"<w:p><w:pPr>{spacing}<w:jc w:val="center"/></w:pPr>{runs}</w:p>"#,
        spacing = spacing,
        runs = runs,
    )
}

pub fn picture_paragraph_xml(drawing_run: &str) -> String {
    format!(r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr>{}</w:p>"#, drawing_run)
}

/// A cell of a layout grid: either a picture (with optional caption) or empty.
pub struct GridCell {
    pub drawing_run: String,
    pub caption: Option<String>,
}

/// A borderless-by-style, auto-width table of `cols` columns.
pub fn grid_table_xml(
    rows: &[Vec<Option<GridCell>>],
    cols: usize,
    col_width_cm: f64,
    caption_style: &CaptionStyle,
) -> String {
    let col_twips = cm_to_twips(col_width_cm) + 216;
    let mut xml = String::from(
        r#"<w:tbl><w:tblPr><w:tblW w:w="0" w:type="auto"/><w:jc w:val="center"/><w:tblLook w:val="04A0" w:firstRow="0" w:lastRow="0" w:firstColumn="0" w:lastColumn="0" w:noHBand="1" w:noVBand="1"/></w:tblPr><w:tblGrid>"#,
    );
    for _ in 0..cols {
        xml.push_str(&format!(r#"<w:gridCol w:w="{}"/>"#, col_twips));
    }
    xml.push_str("</w:tblGrid>");

    for row in rows {
        xml.push_str("<w:tr>");
        for c in 0..cols {
            match row.get(c).and_then(|cell| cell.as_ref()) {
                Some(cell) => {
                    xml.push_str(
                        r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/><w:vAlign w:val="center"/></w:tcPr>"#,
                    );
                    xml.push_str(&picture_paragraph_xml(&cell.drawing_run));
                    if let Some(caption) = cell.caption.as_deref().filter(|c| !c.is_empty()) {
                        xml.push_str(&caption_paragraph_xml(caption, caption_style));
                    }
                    xml.push_str("</w:tc>");
                }
                None => {
                    xml.push_str(r#"<w:tc><w:tcPr><w:tcW w:w="0" w:type="auto"/></w:tcPr><w:p/></w:tc>"#);
                }
            }
        }
        xml.push_str("</w:tr>");
    }
    xml.push_str("</w:tbl>");
    xml
}

/// Parse a generated WML fragment; `w` is assumed bound at the insertion point.
pub fn fragment(xml: &str) -> Result<Element, Error> {
    xml::parse_fragment(xml, &[("w", WML_NS)])
}
