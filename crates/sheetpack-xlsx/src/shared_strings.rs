//! `xl/sharedStrings.xml` reading and writing

use std::collections::HashMap;

use quick_xml::events::BytesStart;
use sheetpack_core::{RichTextRun, RunFont, SharedStringItem, SharedStringTable, Underline};

use crate::codec::{
    decode_excel_escapes, encode_excel_escapes, escape_attr, escape_text, XmlCursor, XmlPart,
    XML_HEADER,
};
use crate::error::DecodeError;
use crate::styles::{read_color, write_color};

/// A shared string table together with markup it does not model
///
/// Phonetic runs (`rPh`) and phonetic properties (`phoneticPr`) carry no
/// cell text. They are kept as markup per item and written back after the
/// item's text.
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    table: SharedStringTable,
    phonetics: HashMap<u32, String>,
}

impl SharedStrings {
    pub fn table(&self) -> &SharedStringTable {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut SharedStringTable {
        &mut self.table
    }

    pub fn into_table(self) -> SharedStringTable {
        self.table
    }

    /// Phonetic markup read with the item at `index`
    pub fn phonetic(&self, index: u32) -> Option<&str> {
        self.phonetics.get(&index).map(String::as_str)
    }
}

impl XmlPart for SharedStrings {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        let mut cursor = XmlCursor::preserving_space(xml);
        let (_, empty) = cursor.root("sst")?;
        let mut items = Vec::new();
        let mut phonetics = HashMap::new();
        if !empty {
            cursor.children(|cursor, e, open| {
                if e.local_name().as_ref() != b"si" {
                    if open {
                        cursor.skip(&e)?;
                    }
                    return Ok(());
                }
                if !open {
                    items.push(SharedStringItem::default());
                    return Ok(());
                }
                let (item, phonetic) = read_item(cursor)?;
                if !phonetic.is_empty() {
                    phonetics.insert(items.len() as u32, phonetic);
                }
                items.push(item);
                Ok(())
            })?;
        }
        log::trace!("read {} shared strings", items.len());
        Ok(SharedStrings {
            table: SharedStringTable::from_items(items),
            phonetics,
        })
    }

    fn to_xml(&self) -> String {
        write_table(&self.table, &self.phonetics)
    }
}

impl XmlPart for SharedStringTable {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        SharedStrings::from_xml(xml).map(SharedStrings::into_table)
    }

    fn to_xml(&self) -> String {
        write_table(self, &HashMap::new())
    }
}

fn write_table(table: &SharedStringTable, phonetics: &HashMap<u32, String>) -> String {
    let mut xml = String::with_capacity(256 + table.len() * 32);
    xml.push_str(XML_HEADER);
    xml.push_str(&format!(
        "<sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" count=\"{}\" uniqueCount=\"{}\">",
        table.len(),
        table.unique_count()
    ));
    for (index, item) in table.iter() {
        xml.push_str("<si>");
        if item.is_rich() {
            for run in &item.runs {
                xml.push_str("<r>");
                if let Some(font) = &run.font {
                    write_run_font(&mut xml, font);
                }
                write_t(&mut xml, &run.text);
                xml.push_str("</r>");
            }
        } else {
            write_t(&mut xml, &item.text);
        }
        if let Some(phonetic) = phonetics.get(&index) {
            xml.push_str(phonetic);
        }
        xml.push_str("</si>");
    }
    xml.push_str("</sst>");
    xml
}

/// Read the content of an open `<si>`, with its phonetic markup
fn read_item(cursor: &mut XmlCursor<'_>) -> Result<(SharedStringItem, String), DecodeError> {
    let mut text = String::new();
    let mut runs = Vec::new();
    let mut phonetic = String::new();
    cursor.children_at(|cursor, begin, e, open| {
        match (e.local_name().as_ref(), open) {
            (b"t", true) => text.push_str(&read_t(cursor, &e)?),
            (b"r", true) => runs.push(read_run(cursor)?),
            (b"rPh" | b"phoneticPr", _) => {
                if open {
                    cursor.skip(&e)?;
                }
                phonetic.push_str(cursor.slice(begin, cursor.position()));
            }
            (_, true) => cursor.skip(&e)?,
            (_, false) => {}
        }
        Ok(())
    })?;

    let item = if runs.is_empty() {
        SharedStringItem::plain(text)
    } else {
        SharedStringItem::rich(runs)
    };
    Ok((item, phonetic))
}

fn read_run(cursor: &mut XmlCursor<'_>) -> Result<RichTextRun, DecodeError> {
    let mut run = RichTextRun::default();
    cursor.children(|cursor, e, open| {
        match (e.local_name().as_ref(), open) {
            (b"t", true) => run.text.push_str(&read_t(cursor, &e)?),
            (b"rPr", true) => run.font = Some(read_run_font(cursor)?),
            (b"rPr", false) => run.font = Some(RunFont::default()),
            (_, true) => cursor.skip(&e)?,
            (_, false) => {}
        }
        Ok(())
    })?;
    Ok(run)
}

fn read_t(cursor: &mut XmlCursor<'_>, e: &BytesStart<'_>) -> Result<String, DecodeError> {
    let raw = cursor.text_of(e)?;
    Ok(decode_excel_escapes(&raw).into_owned())
}

fn read_run_font(cursor: &mut XmlCursor<'_>) -> Result<RunFont, DecodeError> {
    let mut font = RunFont::default();
    cursor.children(|cursor, e, open| {
        match e.local_name().as_ref() {
            b"b" => font.bold = cursor.attr_bool(&e, b"val")?.unwrap_or(true),
            b"i" => font.italic = cursor.attr_bool(&e, b"val")?.unwrap_or(true),
            b"strike" => font.strike = cursor.attr_bool(&e, b"val")?.unwrap_or(true),
            b"u" => font.underline = Underline::from_val(cursor.attr(&e, b"val")?.as_deref()),
            b"sz" => font.size = cursor.attr_parse(&e, b"val")?,
            b"color" => font.color = Some(read_color(cursor, &e)?),
            b"rFont" => font.name = cursor.attr(&e, b"val")?,
            b"vertAlign" => font.vert_align = cursor.attr(&e, b"val")?,
            _ => {}
        }
        if open {
            cursor.skip(&e)?;
        }
        Ok(())
    })?;
    Ok(font)
}

fn write_t(xml: &mut String, text: &str) {
    let encoded = encode_excel_escapes(text);
    let escaped = escape_text(&encoded);
    if needs_preserve(text) {
        xml.push_str("<t xml:space=\"preserve\">");
    } else {
        xml.push_str("<t>");
    }
    xml.push_str(&escaped);
    xml.push_str("</t>");
}

fn needs_preserve(text: &str) -> bool {
    text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.contains('\n')
        || text.contains("  ")
}

fn write_run_font(xml: &mut String, font: &RunFont) {
    xml.push_str("<rPr>");
    if font.bold {
        xml.push_str("<b/>");
    }
    if font.italic {
        xml.push_str("<i/>");
    }
    if font.strike {
        xml.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => xml.push_str("<u/>"),
        other => {
            if let Some(val) = other.as_str() {
                xml.push_str(&format!("<u val=\"{}\"/>", val));
            }
        }
    }
    if let Some(vert) = &font.vert_align {
        xml.push_str(&format!("<vertAlign val=\"{}\"/>", escape_attr(vert)));
    }
    if let Some(size) = font.size {
        xml.push_str(&format!("<sz val=\"{}\"/>", size));
    }
    if let Some(color) = &font.color {
        xml.push_str(&write_color("color", color));
    }
    if let Some(name) = &font.name {
        xml.push_str(&format!("<rFont val=\"{}\"/>", escape_attr(name)));
    }
    xml.push_str("</rPr>");
}
