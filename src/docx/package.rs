use std::collections::HashMap;
use std::io::{Cursor, Read, Seek, Write};

use zip::write::SimpleFileOptions;

use crate::error::Error;
use crate::model::ImageFormat;

pub(super) const IMAGE_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

pub(super) struct PackagePart {
    pub(super) name: String,
    pub(super) data: Vec<u8>,
}

/// A relationship added during assembly, appended to the part's `.rels` on save.
struct NewRelationship {
    id: String,
    target: String,
}

/// All parts of a DOCX archive, kept in archive order.
pub(super) struct Package {
    parts: Vec<PackagePart>,
    new_document_rels: Vec<NewRelationship>,
    new_image_formats: Vec<ImageFormat>,
    next_rel: u32,
    next_media: u32,
}

impl Package {
    pub(super) fn read<R: Read + Seek>(reader: R) -> Result<Self, Error> {
        let mut zip = zip::ZipArchive::new(reader)
            .map_err(|_| Error::InvalidDocx("file is not a ZIP archive".into()))?;

        let mut parts = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut entry = zip.by_index(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let mut data = Vec::new();
            entry.read_to_end(&mut data)?;
            parts.push(PackagePart { name, data });
        }

        let mut package = Self {
            parts,
            new_document_rels: Vec::new(),
            new_image_formats: Vec::new(),
            next_rel: 1,
            next_media: 1,
        };
        package.next_rel = package
            .document_relationships()
            .keys()
            .filter_map(|id| id.strip_prefix("rId"))
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .map_or(1, |n| n + 1);
        package.next_media = package
            .parts
            .iter()
            .filter_map(|p| p.name.strip_prefix("word/media/image"))
            .filter_map(|rest| rest.split('.').next())
            .filter_map(|n| n.parse::<u32>().ok())
            .max()
            .map_or(1, |n| n + 1);
        Ok(package)
    }

    pub(super) fn part(&self, name: &str) -> Option<&PackagePart> {
        self.parts.iter().find(|p| p.name == name)
    }

    pub(super) fn read_text(&self, name: &str) -> Option<String> {
        let part = self.part(name)?;
        String::from_utf8(part.data.clone()).ok()
    }

    pub(super) fn replace(&mut self, name: &str, data: Vec<u8>) {
        match self.parts.iter_mut().find(|p| p.name == name) {
            Some(part) => part.data = data,
            None => self.parts.push(PackagePart {
                name: name.to_string(),
                data,
            }),
        }
    }

    /// Relationship id → target for `word/document.xml`.
    pub(super) fn document_relationships(&self) -> HashMap<String, String> {
        self.read_text("word/_rels/document.xml.rels")
            .map(|xml| parse_rels_xml(&xml))
            .unwrap_or_default()
    }

    /// Stores the image under `word/media/` and returns the new relationship id.
    pub(super) fn add_image(&mut self, data: &[u8], format: ImageFormat) -> String {
        let file_name = loop {
            let candidate = format!("image{}.{}", self.next_media, format.extension());
            self.next_media += 1;
            if self.part(&format!("word/media/{}", candidate)).is_none() {
                break candidate;
            }
        };
        self.parts.push(PackagePart {
            name: format!("word/media/{}", file_name),
            data: data.to_vec(),
        });

        let id = format!("rId{}", self.next_rel);
        self.next_rel += 1;
        self.new_document_rels.push(NewRelationship {
            id: id.clone(),
            target: format!("media/{}", file_name),
        });
        if !self.new_image_formats.contains(&format) {
            self.new_image_formats.push(format);
        }
        id
    }

    pub(super) fn write(mut self) -> Result<Vec<u8>, Error> {
        self.flush_relationships()?;
        self.flush_content_types()?;

        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for part in &self.parts {
            // Images don't compress well
            let method = if part.name.starts_with("word/media/") {
                zip::CompressionMethod::Stored
            } else {
                zip::CompressionMethod::Deflated
            };
            let options = SimpleFileOptions::default().compression_method(method);
            zip.start_file(part.name.as_str(), options)?;
            zip.write_all(&part.data)?;
        }
        let cursor = zip.finish()?;
        Ok(cursor.into_inner())
    }

    fn flush_relationships(&mut self) -> Result<(), Error> {
        if self.new_document_rels.is_empty() {
            return Ok(());
        }
        let rels_name = "word/_rels/document.xml.rels";
        let xml = self.read_text(rels_name).unwrap_or_else(|| {
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\r\n\
             <Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
             </Relationships>"
                .to_string()
        });
        let close = xml.rfind("</Relationships>").ok_or_else(|| {
            Error::InvalidDocx(format!("could not find </Relationships> in {}", rels_name))
        })?;

        let mut out = String::with_capacity(xml.len() + self.new_document_rels.len() * 160);
        out.push_str(&xml[..close]);
        for rel in &self.new_document_rels {
            out.push_str(&format!(
                r#"<Relationship Id="{}" Type="{}" Target="{}"/>"#,
                rel.id, IMAGE_REL_TYPE, rel.target
            ));
        }
        out.push_str(&xml[close..]);
        self.replace(rels_name, out.into_bytes());
        self.new_document_rels.clear();
        Ok(())
    }

    fn flush_content_types(&mut self) -> Result<(), Error> {
        if self.new_image_formats.is_empty() {
            return Ok(());
        }
        let name = "[Content_Types].xml";
        let xml = self
            .read_text(name)
            .ok_or_else(|| Error::InvalidDocx("missing [Content_Types].xml".into()))?;
        let close = xml
            .rfind("</Types>")
            .ok_or_else(|| Error::InvalidDocx("could not find </Types> in [Content_Types].xml".into()))?;

        let lower = xml.to_ascii_lowercase();
        let mut defaults = String::new();
        for format in &self.new_image_formats {
            let ext = format.extension();
            if lower.contains(&format!("extension=\"{}\"", ext)) {
                continue;
            }
            defaults.push_str(&format!(
                r#"<Default Extension="{}" ContentType="{}"/>"#,
                ext,
                format.content_type()
            ));
        }
        if defaults.is_empty() {
            return Ok(());
        }
        let out = format!("{}{}{}", &xml[..close], defaults, &xml[close..]);
        self.replace(name, out.into_bytes());
        self.new_image_formats.clear();
        Ok(())
    }
}

pub(super) fn parse_rels_xml(xml_content: &str) -> HashMap<String, String> {
    let mut rels = HashMap::new();
    let Ok(xml) = roxmltree::Document::parse(xml_content) else {
        return rels;
    };
    for node in xml.root_element().children() {
        if node.tag_name().name() == "Relationship"
            && let (Some(id), Some(target)) = (node.attribute("Id"), node.attribute("Target"))
        {
            rels.insert(id.to_string(), target.to_string());
        }
    }
    rels
}

/// Resolve a relationship target of `word/document.xml` to a part name.
pub(super) fn resolve_target(target: &str) -> String {
    target
        .strip_prefix('/')
        .map(String::from)
        .unwrap_or_else(|| format!("word/{}", target))
}
