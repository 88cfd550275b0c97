//! Content types and relationships

use quick_xml::events::Event;

use crate::codec::{escape_attr, XmlCursor, XmlPart, XML_HEADER};
use crate::error::DecodeError;

pub const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";
pub const ROOT_RELS_PATH: &str = "_rels/.rels";

pub const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
pub const NS_RELATIONSHIPS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";

pub const CT_RELATIONSHIPS: &str = "application/vnd.openxmlformats-package.relationships+xml";
pub const CT_XML: &str = "application/xml";
pub const CT_WORKBOOK: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml";
pub const CT_WORKSHEET: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml";
pub const CT_STYLES: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml";
pub const CT_SHARED_STRINGS: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml";
pub const CT_CORE_PROPS: &str = "application/vnd.openxmlformats-package.core-properties+xml";
pub const CT_APP_PROPS: &str = "application/vnd.openxmlformats-officedocument.extended-properties+xml";

pub const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
pub const REL_WORKSHEET: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet";
pub const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
pub const REL_SHARED_STRINGS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings";
pub const REL_CORE_PROPS: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
pub const REL_APP_PROPS: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";

/// `[Content_Types].xml`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentTypes {
    /// (extension, content type)
    pub defaults: Vec<(String, String)>,
    /// (part name with leading `/`, content type)
    pub overrides: Vec<(String, String)>,
}

impl ContentTypes {
    /// Content type of a package path, override first
    pub fn content_type(&self, path: &str) -> Option<&str> {
        let part_name = part_name(path);
        if let Some((_, ct)) = self
            .overrides
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(&part_name))
        {
            return Some(ct);
        }
        let ext = path.rsplit_once('.').map(|(_, ext)| ext)?;
        self.defaults
            .iter()
            .find(|(e, _)| e.eq_ignore_ascii_case(ext))
            .map(|(_, ct)| ct.as_str())
    }

    /// Add or replace the override for a path
    pub fn set_override(&mut self, path: &str, content_type: &str) {
        let name = part_name(path);
        match self.overrides.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = content_type.to_string(),
            None => self.overrides.push((name, content_type.to_string())),
        }
    }

    /// Add a default unless the extension already has one
    pub fn ensure_default(&mut self, ext: &str, content_type: &str) {
        if !self.defaults.iter().any(|(e, _)| e.eq_ignore_ascii_case(ext)) {
            self.defaults.push((ext.to_string(), content_type.to_string()));
        }
    }

    pub fn has_override(&self, path: &str) -> bool {
        let name = part_name(path);
        self.overrides.iter().any(|(n, _)| n.eq_ignore_ascii_case(&name))
    }
}

fn part_name(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

impl XmlPart for ContentTypes {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        let mut cursor = XmlCursor::new(xml);
        let (_, empty) = cursor.root("Types")?;
        let mut out = ContentTypes::default();
        if empty {
            return Ok(out);
        }

        loop {
            match cursor.next()? {
                Event::Empty(e) | Event::Start(e) => match e.local_name().as_ref() {
                    b"Default" => {
                        let ext = cursor.attr(&e, b"Extension")?;
                        let ct = cursor.attr(&e, b"ContentType")?;
                        if let (Some(ext), Some(ct)) = (ext, ct) {
                            out.defaults.push((ext, ct));
                        }
                    }
                    b"Override" => {
                        let name = cursor.attr(&e, b"PartName")?;
                        let ct = cursor.attr(&e, b"ContentType")?;
                        if let (Some(name), Some(ct)) = (name, ct) {
                            out.overrides.push((name, ct));
                        }
                    }
                    _ => {}
                },
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(out)
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + 160 * (self.defaults.len() + self.overrides.len()));
        xml.push_str(XML_HEADER);
        xml.push_str(&format!("<Types xmlns=\"{}\">", NS_CONTENT_TYPES));
        for (ext, ct) in &self.defaults {
            xml.push_str(&format!(
                "<Default Extension=\"{}\" ContentType=\"{}\"/>",
                escape_attr(ext),
                escape_attr(ct)
            ));
        }
        for (name, ct) in &self.overrides {
            xml.push_str(&format!(
                "<Override PartName=\"{}\" ContentType=\"{}\"/>",
                escape_attr(name),
                escape_attr(ct)
            ));
        }
        xml.push_str("</Types>");
        xml
    }
}

/// One `<Relationship>` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    pub target: String,
    /// `External` for targets outside the package
    pub target_mode: Option<String>,
}

impl Relationship {
    pub fn is_external(&self) -> bool {
        self.target_mode
            .as_deref()
            .is_some_and(|m| m.eq_ignore_ascii_case("External"))
    }
}

/// A `.rels` part
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relationships {
    pub items: Vec<Relationship>,
}

impl Relationships {
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.id == id)
    }

    /// First relationship of a type
    pub fn find_by_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.items.iter().find(|r| r.rel_type == rel_type)
    }

    /// Append a relationship and return its new `rIdN`
    pub fn add(&mut self, rel_type: &str, target: &str) -> String {
        let next = self
            .items
            .iter()
            .filter_map(|r| r.id.strip_prefix("rId")?.parse::<u32>().ok())
            .max()
            .unwrap_or(0)
            + 1;
        let id = format!("rId{}", next);
        self.items.push(Relationship {
            id: id.clone(),
            rel_type: rel_type.to_string(),
            target: target.to_string(),
            target_mode: None,
        });
        id
    }
}

impl XmlPart for Relationships {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        let mut cursor = XmlCursor::new(xml);
        let (_, empty) = cursor.root("Relationships")?;
        let mut out = Relationships::default();
        if empty {
            return Ok(out);
        }

        loop {
            match cursor.next()? {
                Event::Empty(e) | Event::Start(e) if e.local_name().as_ref() == b"Relationship" => {
                    let (Some(id), Some(rel_type), Some(target)) = (
                        cursor.attr(&e, b"Id")?,
                        cursor.attr(&e, b"Type")?,
                        cursor.attr(&e, b"Target")?,
                    ) else {
                        return Err(cursor.error("relationship is missing Id, Type or Target"));
                    };
                    out.items.push(Relationship {
                        id,
                        rel_type,
                        target,
                        target_mode: cursor.attr(&e, b"TargetMode")?,
                    });
                }
                Event::Eof => break,
                _ => {}
            }
        }
        Ok(out)
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + 200 * self.items.len());
        xml.push_str(XML_HEADER);
        xml.push_str(&format!("<Relationships xmlns=\"{}\">", NS_RELATIONSHIPS));
        for rel in &self.items {
            xml.push_str(&format!(
                "<Relationship Id=\"{}\" Type=\"{}\" Target=\"{}\"",
                escape_attr(&rel.id),
                escape_attr(&rel.rel_type),
                escape_attr(&rel.target)
            ));
            if let Some(mode) = &rel.target_mode {
                xml.push_str(&format!(" TargetMode=\"{}\"", escape_attr(mode)));
            }
            xml.push_str("/>");
        }
        xml.push_str("</Relationships>");
        xml
    }
}

/// The `.rels` part that holds relationships whose source is `part`
pub fn rels_for_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file_name)) => format!("{dir}/_rels/{file_name}.rels"),
        None => format!("_rels/{part}.rels"),
    }
}

/// Resolve a relationship target against the part it belongs to
pub fn resolve_target(source_part: &str, target: &str) -> String {
    let target = target.split('#').next().unwrap_or(target);
    if target.is_empty() {
        return normalize(source_part);
    }
    if let Some(target) = target.strip_prefix('/') {
        return normalize(target);
    }

    let base_dir = source_part.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("");
    normalize(&format!("{base_dir}/{target}"))
}

/// Target of `part` written relative to the directory of `source_part`
pub fn relative_target(source_part: &str, part: &str) -> String {
    let base: Vec<&str> = source_part
        .rsplit_once('/')
        .map(|(dir, _)| dir.split('/').collect())
        .unwrap_or_default();
    let parts: Vec<&str> = part.split('/').collect();

    let common = base
        .iter()
        .zip(parts.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut out: Vec<&str> = std::iter::repeat("..").take(base.len() - common).collect();
    out.extend_from_slice(&parts[common..]);
    out.join("/")
}

fn normalize(path: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    out.join("/")
}
