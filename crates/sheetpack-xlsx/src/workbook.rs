//! Workbook sheet directory

use quick_xml::events::{BytesStart, Event};
use sheetpack_core::Error;

use crate::codec::{escape_attr, XmlCursor, XmlPart, XML_HEADER};
use crate::error::{DecodeError, XlsxError, XlsxResult};
use crate::package::manifest::{
    relative_target, rels_for_part, resolve_target, ContentTypes, Relationships,
    CONTENT_TYPES_PATH, CT_WORKSHEET, REL_OFFICE_DOCUMENT, REL_WORKSHEET, ROOT_RELS_PATH,
};
use crate::package::{worksheet_template, Package, WORKBOOK_PATH};

/// Longest sheet name Excel accepts
pub const MAX_SHEET_NAME_CHARS: usize = 31;

/// One `<sheet>` entry of `xl/workbook.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetEntry {
    pub name: String,
    pub sheet_id: u32,
    /// Relationship id of the worksheet part
    pub rel_id: String,
    /// `hidden` or `veryHidden`
    pub state: Option<String>,
}

/// `xl/workbook.xml`
///
/// Only the sheet list is modelled. Everything around `<sheets>` is kept
/// verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workbook {
    pub sheets: Vec<SheetEntry>,
    head: String,
    tail: String,
    rel_prefix: String,
}

impl Default for Workbook {
    fn default() -> Self {
        Self {
            sheets: Vec::new(),
            head: format!(
                "<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" xmlns:r=\"{}\">",
                "http://schemas.openxmlformats.org/officeDocument/2006/relationships"
            ),
            tail: "</workbook>".to_string(),
            rel_prefix: "r".to_string(),
        }
    }
}

impl Workbook {
    pub fn sheet(&self, name: &str) -> Option<&SheetEntry> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
    }
}

fn strip_declaration(text: &str) -> &str {
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.starts_with("<?xml") {
        if let Some(end) = text.find("?>") {
            return text[end + 2..].trim_start();
        }
    }
    text
}

impl XmlPart for Workbook {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        let mut cursor = XmlCursor::new(xml);
        let (_, empty) = cursor.root("workbook")?;
        if empty {
            return Err(cursor.error("workbook has no content"));
        }

        let mut out = Workbook {
            sheets: Vec::new(),
            head: String::new(),
            tail: String::new(),
            rel_prefix: "r".to_string(),
        };
        let mut depth = 0usize;
        let mut split: Option<(usize, usize)> = None;

        loop {
            let begin = cursor.position();
            match cursor.next()? {
                Event::Start(e) if depth == 0 && e.local_name().as_ref() == b"sheets" => {
                    loop {
                        let (s, open) = match cursor.next()? {
                            Event::Empty(s) => (s, false),
                            Event::Start(s) => (s, true),
                            Event::End(_) => break,
                            Event::Eof => return Err(cursor.error("unexpected EOF")),
                            _ => continue,
                        };
                        if s.local_name().as_ref() == b"sheet" {
                            out.sheets.push(parse_sheet(&cursor, &s, &mut out.rel_prefix)?);
                        }
                        if open {
                            cursor.skip(&s)?;
                        }
                    }
                    split = Some((begin, cursor.position()));
                }
                Event::Empty(e) if depth == 0 && e.local_name().as_ref() == b"sheets" => {
                    split = Some((begin, cursor.position()));
                }
                Event::Start(_) => depth += 1,
                Event::End(_) if depth > 0 => depth -= 1,
                Event::End(_) => {
                    if split.is_none() {
                        split = Some((begin, begin));
                    }
                    break;
                }
                Event::Eof => return Err(cursor.error("unexpected EOF")),
                _ => {}
            }
        }

        if let Some((begin, end)) = split {
            out.head = strip_declaration(&xml[..begin]).to_string();
            out.tail = xml[end..].trim().to_string();
        }
        Ok(out)
    }

    fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(self.head.len() + self.tail.len() + 64 * self.sheets.len() + 64);
        xml.push_str(XML_HEADER);
        xml.push_str(&self.head);
        xml.push_str("<sheets>");
        for sheet in &self.sheets {
            xml.push_str(&format!(
                "<sheet name=\"{}\" sheetId=\"{}\"",
                escape_attr(&sheet.name),
                sheet.sheet_id
            ));
            if let Some(state) = &sheet.state {
                xml.push_str(&format!(" state=\"{}\"", escape_attr(state)));
            }
            xml.push_str(&format!(
                " {}:id=\"{}\"/>",
                self.rel_prefix,
                escape_attr(&sheet.rel_id)
            ));
        }
        xml.push_str("</sheets>");
        xml.push_str(&self.tail);
        xml
    }
}

fn parse_sheet(
    cursor: &XmlCursor<'_>,
    e: &BytesStart<'_>,
    rel_prefix: &mut String,
) -> Result<SheetEntry, DecodeError> {
    let name = cursor
        .attr(e, b"name")?
        .ok_or_else(|| cursor.error("sheet is missing name"))?;
    let mut rel_id = None;
    for (key, value) in cursor.attrs(e)? {
        if let Some((prefix, "id")) = key.split_once(':') {
            *rel_prefix = prefix.to_string();
            rel_id = Some(value);
        }
    }
    Ok(SheetEntry {
        name,
        sheet_id: cursor.attr_parse(e, b"sheetId")?.unwrap_or(0),
        rel_id: rel_id.ok_or_else(|| cursor.error("sheet is missing r:id"))?,
        state: cursor.attr(e, b"state")?,
    })
}

fn validate_sheet_name(name: &str) -> XlsxResult<()> {
    let reason = if name.trim().is_empty() {
        Some("sheet name is empty")
    } else if name.chars().count() > MAX_SHEET_NAME_CHARS {
        Some("sheet name is longer than 31 characters")
    } else if name.contains(|c| matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\')) {
        Some("sheet name contains one of [ ] : * ? / \\")
    } else if name.starts_with('\'') || name.ends_with('\'') {
        Some("sheet name starts or ends with an apostrophe")
    } else {
        None
    };
    match reason {
        Some(reason) => Err(Error::invalid_value(name, reason).into()),
        None => Ok(()),
    }
}

impl Package {
    /// Path of the main workbook part, found through `_rels/.rels`
    pub fn workbook_path(&self) -> XlsxResult<String> {
        let rels: Relationships = self.decode(ROOT_RELS_PATH)?;
        Ok(rels
            .find_by_type(REL_OFFICE_DOCUMENT)
            .map(|r| resolve_target("", &r.target))
            .unwrap_or_else(|| WORKBOOK_PATH.to_string()))
    }

    /// Path of the first internal part the workbook links with `rel_type`
    pub(crate) fn workbook_related_path(&self, rel_type: &str) -> XlsxResult<Option<String>> {
        let workbook = self.workbook_path()?;
        let rels: Relationships = self.decode(&rels_for_part(&workbook))?;
        Ok(rels
            .items
            .iter()
            .find(|r| r.rel_type == rel_type && !r.is_external())
            .map(|r| resolve_target(&workbook, &r.target)))
    }

    /// Register a workbook-level part in the content types and workbook rels
    pub(crate) fn link_workbook_part(
        &self,
        path: &str,
        content_type: &str,
        rel_type: &str,
    ) -> XlsxResult<()> {
        let mut types: ContentTypes = self.decode(CONTENT_TYPES_PATH)?;
        if !types.has_override(path) {
            types.set_override(path, content_type);
            self.encode(CONTENT_TYPES_PATH, &types);
        }

        let workbook = self.workbook_path()?;
        let rels_path = rels_for_part(&workbook);
        let mut rels: Relationships = self.decode(&rels_path)?;
        let linked = rels
            .items
            .iter()
            .any(|r| r.rel_type == rel_type && resolve_target(&workbook, &r.target) == path);
        if !linked {
            rels.add(rel_type, &relative_target(&workbook, path));
            self.encode(&rels_path, &rels);
        }
        Ok(())
    }

    /// Sheet names in workbook order
    pub fn sheet_names(&self) -> XlsxResult<Vec<String>> {
        let workbook: Workbook = self.decode(&self.workbook_path()?)?;
        Ok(workbook.sheets.into_iter().map(|s| s.name).collect())
    }

    /// Part path of the worksheet named `name`
    pub fn sheet_path(&self, name: &str) -> XlsxResult<String> {
        let workbook_path = self.workbook_path()?;
        let workbook: Workbook = self.decode(&workbook_path)?;
        let sheet = workbook
            .sheet(name)
            .ok_or_else(|| XlsxError::SheetNotFound(name.to_string()))?;

        let rels: Relationships = self.decode(&rels_for_part(&workbook_path))?;
        let rel = rels
            .get(&sheet.rel_id)
            .ok_or_else(|| XlsxError::MissingPart(format!("relationship {}", sheet.rel_id)))?;
        Ok(resolve_target(&workbook_path, &rel.target))
    }

    /// Append an empty worksheet and return its part path
    pub fn add_sheet(&self, name: &str) -> XlsxResult<String> {
        validate_sheet_name(name)?;

        let workbook_path = self.workbook_path()?;
        let mut workbook: Workbook = self.decode(&workbook_path)?;
        if workbook.sheet(name).is_some() {
            return Err(Error::invalid_value(name, "a sheet with this name already exists").into());
        }

        let base_dir = workbook_path
            .rsplit_once('/')
            .map(|(dir, _)| format!("{dir}/"))
            .unwrap_or_default();
        let mut n = workbook.sheets.len() + 1;
        let path = loop {
            let candidate = format!("{base_dir}worksheets/sheet{n}.xml");
            if !self.contains(&candidate) {
                break candidate;
            }
            n += 1;
        };

        let rels_path = rels_for_part(&workbook_path);
        let mut rels: Relationships = self.decode(&rels_path)?;
        let rel_id = rels.add(REL_WORKSHEET, &relative_target(&workbook_path, &path));

        let sheet_id = workbook.sheets.iter().map(|s| s.sheet_id).max().unwrap_or(0) + 1;
        workbook.sheets.push(SheetEntry {
            name: name.to_string(),
            sheet_id,
            rel_id,
            state: None,
        });

        let mut types: ContentTypes = self.decode(CONTENT_TYPES_PATH)?;
        types.set_override(&path, CT_WORKSHEET);

        self.put_raw(&path, worksheet_template().into_bytes());
        self.encode(&rels_path, &rels);
        self.encode(&workbook_path, &workbook);
        self.encode(CONTENT_TYPES_PATH, &types);

        log::debug!("added sheet {:?} at {}", name, path);
        Ok(path)
    }
}
