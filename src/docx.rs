mod package;
pub mod wml;

use std::io::Cursor;
use std::path::Path;

use crate::error::Error;
use crate::model::{EmbeddedImage, Extent};
use crate::xml::{self, Element, Node};

use package::{Package, resolve_target};

pub(crate) const WML_NS: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const REL_NS: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const WPD_NS: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";

const DOCUMENT_PART: &str = "word/document.xml";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeaderFooterKind {
    Header,
    Footer,
}

/// A parsed header or footer part (`w:hdr` / `w:ftr`).
pub struct HeaderFooterPart {
    pub name: String,
    pub kind: HeaderFooterKind,
    pub root: Element,
}

/// Header/footer parts that apply to one section, as indices into
/// [`Document::header_footer_parts`]. Kinds a section doesn't define itself are
/// inherited from the previous section.
#[derive(Clone, Debug, Default)]
pub struct SectionParts {
    pub headers: Vec<usize>,
    pub footers: Vec<usize>,
}

/// A DOCX package with its main document and header/footer parts parsed into
/// mutable trees.
pub struct Document {
    package: Package,
    /// `w:document` with the body taken out; it goes back at `body_index` on save.
    root: Element,
    body: Element,
    body_index: usize,
    parts: Vec<HeaderFooterPart>,
    sections: Vec<SectionParts>,
    next_drawing_id: u32,
}

impl Document {
    pub fn open(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => Error::TemplateNotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Error::Io(std::io::Error::new(
                e.kind(),
                format!("{}: {}", e, path.display()),
            )),
            _ => Error::Io(e),
        })?;
        Self::from_package(Package::read(file)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        Self::from_package(Package::read(Cursor::new(bytes))?)
    }

    fn from_package(package: Package) -> Result<Self, Error> {
        let xml_content = package.read_text(DOCUMENT_PART).ok_or_else(|| {
            Error::InvalidDocx("missing word/document.xml (is this a DOCX file?)".into())
        })?;
        let mut root = xml::parse(&xml_content)?;
        if !root.is(WML_NS, "document") {
            return Err(Error::InvalidDocx("word/document.xml has no w:document root".into()));
        }
        let body_index = root
            .children
            .iter()
            .position(|n| n.as_element().is_some_and(|e| e.is(WML_NS, "body")))
            .ok_or_else(|| Error::InvalidDocx("missing w:body".into()))?;
        let body = match root.children.remove(body_index) {
            Node::Element(body) => body,
            _ => return Err(Error::InvalidDocx("missing w:body".into())),
        };

        let rels = package.document_relationships();
        let mut parts: Vec<HeaderFooterPart> = Vec::new();
        let mut sections = Vec::new();
        let mut inherited: Vec<(HeaderFooterKind, String, usize)> = Vec::new();

        for sect_pr in section_properties(&body) {
            let mut current: Vec<(HeaderFooterKind, String, usize)> = Vec::new();
            for reference in sect_pr.elements() {
                let kind = if wml::is(reference, "headerReference") {
                    HeaderFooterKind::Header
                } else if wml::is(reference, "footerReference") {
                    HeaderFooterKind::Footer
                } else {
                    continue;
                };
                let ref_type = reference
                    .attribute(Some(WML_NS), "type")
                    .unwrap_or("default")
                    .to_string();
                let Some(target) = reference
                    .attribute(Some(REL_NS), "id")
                    .and_then(|id| rels.get(id))
                else {
                    continue;
                };
                let part_name = resolve_target(target);

                let idx = match parts.iter().position(|p| p.name == part_name) {
                    Some(idx) => idx,
                    None => {
                        let Some(content) = package.read_text(&part_name) else {
                            log::warn!("Section references missing part {}", part_name);
                            continue;
                        };
                        parts.push(HeaderFooterPart {
                            name: part_name.clone(),
                            kind,
                            root: xml::parse(&content)?,
                        });
                        parts.len() - 1
                    }
                };
                current.retain(|(k, t, _)| !(*k == kind && *t == ref_type));
                current.push((kind, ref_type, idx));
            }

            for (kind, ref_type, idx) in &inherited {
                if !current.iter().any(|(k, t, _)| k == kind && t == ref_type) {
                    current.push((*kind, ref_type.clone(), *idx));
                }
            }
            current.sort_by_key(|(kind, ref_type, _)| (*kind as u8, type_order(ref_type)));

            let mut section = SectionParts::default();
            for (kind, _, idx) in &current {
                match kind {
                    HeaderFooterKind::Header => section.headers.push(*idx),
                    HeaderFooterKind::Footer => section.footers.push(*idx),
                }
            }
            sections.push(section);
            inherited = current;
        }

        let next_drawing_id = std::iter::once(&body)
            .chain(parts.iter().map(|p| &p.root))
            .flat_map(|el| el.descendants())
            .filter(|e| e.is(WPD_NS, "docPr"))
            .filter_map(|e| e.attribute(None, "id"))
            .filter_map(|id| id.parse::<u32>().ok())
            .max()
            .map_or(1, |id| id + 1);

        log::debug!(
            "Parsed document: {} sections, {} header/footer parts",
            sections.len(),
            parts.len()
        );

        Ok(Self {
            package,
            root,
            body,
            body_index,
            parts,
            sections,
            next_drawing_id,
        })
    }

    pub fn body(&self) -> &Element {
        &self.body
    }

    pub fn body_mut(&mut self) -> &mut Element {
        &mut self.body
    }

    pub fn sections(&self) -> &[SectionParts] {
        &self.sections
    }

    pub fn header_footer_parts(&self) -> &[HeaderFooterPart] {
        &self.parts
    }

    pub fn header_footer_part_mut(&mut self, idx: usize) -> Option<&mut HeaderFooterPart> {
        self.parts.get_mut(idx)
    }

    /// Adds the image to the package and returns the `w:r` holding its inline drawing.
    pub fn embed_image(&mut self, image: &EmbeddedImage, extent: Extent, descr: &str) -> String {
        let rel_id = self.package.add_image(&image.data, image.format);
        let id = self.next_drawing_id;
        self.next_drawing_id += 1;
        log::debug!(
            "Embedded {}x{} {:?} image as {} (drawing {})",
            image.pixel_width,
            image.pixel_height,
            image.format,
            rel_id,
            id
        );
        wml::drawing_run_xml(&rel_id, extent, id, descr)
    }

    pub fn to_bytes(self) -> Result<Vec<u8>, Error> {
        let Self {
            mut package,
            mut root,
            body,
            body_index,
            parts,
            ..
        } = self;
        root.children.insert(body_index, Node::Element(body));
        package.replace(DOCUMENT_PART, xml::to_string(&root).into_bytes());
        for part in parts {
            package.replace(&part.name, xml::to_string(&part.root).into_bytes());
        }
        package.write()
    }

    pub fn save(self, path: &Path) -> Result<usize, Error> {
        let bytes = self.to_bytes()?;
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, &bytes).map_err(Error::Io)?;
        Ok(bytes.len())
    }
}

fn type_order(ref_type: &str) -> u8 {
    match ref_type {
        "default" => 0,
        "first" => 1,
        _ => 2,
    }
}

/// `w:sectPr` elements in body order: those closing a section inside a
/// paragraph's `w:pPr`, then the body's final one.
fn section_properties(body: &Element) -> Vec<&Element> {
    let mut out = Vec::new();
    for block in body.elements() {
        if wml::is(block, "p")
            && let Some(sect_pr) = block
                .child(WML_NS, "pPr")
                .and_then(|ppr| ppr.child(WML_NS, "sectPr"))
        {
            out.push(sect_pr);
        } else if wml::is(block, "sectPr") {
            out.push(block);
        }
    }
    out
}
