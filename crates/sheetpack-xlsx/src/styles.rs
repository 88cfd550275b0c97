//! `xl/styles.xml` reading and writing
//!
//! The style registry is the source of truth for `cellXfs`: a cell's `s`
//! attribute is its registry id. A [`StyleSheet`] read from a package also
//! keeps the original document. Entries already in the file are written back
//! verbatim and only styles registered since are generated, so gradient
//! fills, differential formats and named cell styles survive a save.

use std::collections::HashMap;
use std::ops::Range;

use quick_xml::events::BytesStart;
use sheetpack_core::{
    Alignment, BorderEdge, BorderLineStyle, BorderStyle, Color, FillStyle, FontStyle,
    HorizontalAlignment, NumberFormat, PatternType, Protection, Style, StyleRegistry, Underline,
    VerticalAlignment,
};

use crate::codec::{escape_attr, XmlCursor, XmlPart, XML_HEADER};
use crate::error::DecodeError;

#[derive(Debug, Clone, Copy)]
struct ResolvedXfIds {
    font_id: u32,
    fill_id: u32,
    border_id: u32,
    num_fmt_id: u32,
}

/// Top-level sections whose position matters when splicing, in schema order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Section {
    NumFmts,
    Fonts,
    Fills,
    Borders,
    CellStyleXfs,
    CellXfs,
}

impl Section {
    fn from_name(name: &[u8]) -> Option<Self> {
        match name {
            b"numFmts" => Some(Section::NumFmts),
            b"fonts" => Some(Section::Fonts),
            b"fills" => Some(Section::Fills),
            b"borders" => Some(Section::Borders),
            b"cellStyleXfs" => Some(Section::CellStyleXfs),
            b"cellXfs" => Some(Section::CellXfs),
            _ => None,
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Section::NumFmts => "numFmts",
            Section::Fonts => "fonts",
            Section::Fills => "fills",
            Section::Borders => "borders",
            Section::CellStyleXfs => "cellStyleXfs",
            Section::CellXfs => "cellXfs",
        }
    }
}

/// One table entry as it appeared in the file
#[derive(Debug, Clone)]
struct Entry<T> {
    raw: String,
    model: T,
    /// The model says everything the markup does
    exact: bool,
}

#[derive(Debug, Clone)]
struct SectionSpan {
    section: Section,
    span: Range<usize>,
    /// Start tag attributes other than `count`
    attrs: Vec<(String, String)>,
}

/// The document a [`StyleSheet`] was read from
#[derive(Debug, Clone)]
struct Source {
    text: String,
    /// Offset just past the root start tag
    body_start: usize,
    sections: Vec<SectionSpan>,
    numfmts: Vec<Entry<(u32, String)>>,
    fonts: Vec<Entry<FontStyle>>,
    fills: Vec<Entry<FillStyle>>,
    borders: Vec<Entry<BorderStyle>>,
    xfs: Vec<Entry<(ResolvedXfIds, Alignment, Protection)>>,
}

impl Source {
    fn span(&self, section: Section) -> Option<&SectionSpan> {
        self.sections.iter().find(|s| s.section == section)
    }
}

/// A style registry together with the stylesheet it was read from
#[derive(Debug, Clone, Default)]
pub struct StyleSheet {
    registry: StyleRegistry,
    source: Option<Source>,
}

impl StyleSheet {
    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut StyleRegistry {
        &mut self.registry
    }

    pub fn into_registry(self) -> StyleRegistry {
        self.registry
    }
}

/// Font with nothing set, the starting point when reading `<font>`
fn blank_font() -> FontStyle {
    FontStyle {
        name: String::new(),
        size: 11.0,
        bold: false,
        italic: false,
        underline: Underline::None,
        strikethrough: false,
        color: Color::Auto,
        family: None,
        scheme: None,
    }
}

fn gray125() -> FillStyle {
    FillStyle::Pattern {
        pattern: PatternType::Gray125,
        foreground: Color::Auto,
        background: Color::Auto,
    }
}

impl XmlPart for StyleSheet {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        let mut cursor = XmlCursor::new(xml);
        let (_, empty) = cursor.root("styleSheet")?;
        if empty {
            return Ok(StyleSheet::default());
        }

        let mut source = Source {
            text: xml.to_string(),
            body_start: cursor.position(),
            sections: Vec::new(),
            numfmts: Vec::new(),
            fonts: Vec::new(),
            fills: Vec::new(),
            borders: Vec::new(),
            xfs: Vec::new(),
        };

        cursor.children_at(|cursor, begin, e, open| {
            let Some(section) = Section::from_name(e.local_name().as_ref()) else {
                if open {
                    cursor.skip(&e)?;
                }
                return Ok(());
            };
            let attrs = cursor
                .attrs(&e)?
                .into_iter()
                .filter(|(key, _)| key != "count")
                .collect();
            if open {
                read_section(cursor, section, &mut source)?;
            }
            source.sections.push(SectionSpan {
                section,
                span: begin..cursor.position(),
                attrs,
            });
            Ok(())
        })?;

        let numfmts: HashMap<u32, &str> = source
            .numfmts
            .iter()
            .map(|entry| (entry.model.0, entry.model.1.as_str()))
            .collect();
        let styles = source
            .xfs
            .iter()
            .map(|entry| {
                let (ids, alignment, protection) = &entry.model;
                Style {
                    number_format: NumberFormat::from_id(
                        ids.num_fmt_id,
                        numfmts.get(&ids.num_fmt_id).copied(),
                    ),
                    font: source
                        .fonts
                        .get(ids.font_id as usize)
                        .map(|f| f.model.clone())
                        .unwrap_or_default(),
                    fill: source
                        .fills
                        .get(ids.fill_id as usize)
                        .map(|f| f.model)
                        .unwrap_or_default(),
                    border: source
                        .borders
                        .get(ids.border_id as usize)
                        .map(|b| b.model)
                        .unwrap_or_default(),
                    alignment: *alignment,
                    protection: *protection,
                }
            })
            .collect();

        // An xf over a gradient fill reads as a plain style; do not hand it
        // out for that plain style
        let reusable: Vec<bool> = source
            .xfs
            .iter()
            .map(|entry| {
                let ids = &entry.model.0;
                let exact = |found: Option<bool>| found.unwrap_or(true);
                exact(source.fonts.get(ids.font_id as usize).map(|f| f.exact))
                    && exact(source.fills.get(ids.fill_id as usize).map(|f| f.exact))
                    && exact(source.borders.get(ids.border_id as usize).map(|b| b.exact))
            })
            .collect();

        Ok(StyleSheet {
            registry: StyleRegistry::from_styles_with(styles, |id| {
                reusable.get(id as usize).copied().unwrap_or(true)
            }),
            source: Some(source),
        })
    }

    fn to_xml(&self) -> String {
        write_styles(&self.registry, self.source.as_ref())
    }
}

impl XmlPart for StyleRegistry {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        StyleSheet::from_xml(xml).map(StyleSheet::into_registry)
    }

    fn to_xml(&self) -> String {
        write_styles(self, None)
    }
}

// === Reading ===

fn read_section(
    cursor: &mut XmlCursor<'_>,
    section: Section,
    source: &mut Source,
) -> Result<(), DecodeError> {
    let item: &[u8] = match section {
        Section::NumFmts => b"numFmt",
        Section::Fonts => b"font",
        Section::Fills => b"fill",
        Section::Borders => b"border",
        Section::CellXfs => b"xf",
        // Base cell styles are only ever kept verbatim
        Section::CellStyleXfs => b"",
    };
    cursor.children_at(|cursor, begin, e, open| {
        if e.local_name().as_ref() != item {
            if open {
                cursor.skip(&e)?;
            }
            return Ok(());
        }
        match section {
            Section::NumFmts => {
                let id = cursor
                    .attr_parse::<u32>(&e, b"numFmtId")?
                    .ok_or_else(|| cursor.error("numFmt is missing numFmtId"))?;
                let code = cursor.attr(&e, b"formatCode")?.unwrap_or_default();
                if open {
                    cursor.skip(&e)?;
                }
                source.numfmts.push(Entry {
                    raw: cursor.slice(begin, cursor.position()).to_string(),
                    model: (id, code),
                    exact: true,
                });
            }
            Section::Fonts => {
                let (model, exact) = read_font(cursor, open)?;
                let raw = cursor.slice(begin, cursor.position()).to_string();
                source.fonts.push(Entry { raw, model, exact });
            }
            Section::Fills => {
                let (model, exact) = read_fill(cursor, open)?;
                let raw = cursor.slice(begin, cursor.position()).to_string();
                source.fills.push(Entry { raw, model, exact });
            }
            Section::Borders => {
                let (model, exact) = read_border(cursor, &e, open)?;
                let raw = cursor.slice(begin, cursor.position()).to_string();
                source.borders.push(Entry { raw, model, exact });
            }
            Section::CellXfs => {
                let model = read_xf(cursor, &e, open)?;
                let raw = cursor.slice(begin, cursor.position()).to_string();
                source.xfs.push(Entry {
                    raw,
                    model,
                    exact: true,
                });
            }
            Section::CellStyleXfs => {
                if open {
                    cursor.skip(&e)?;
                }
            }
        }
        Ok(())
    })
}

fn read_font(cursor: &mut XmlCursor<'_>, open: bool) -> Result<(FontStyle, bool), DecodeError> {
    let mut font = blank_font();
    let mut exact = true;
    if !open {
        return Ok((font, exact));
    }
    cursor.children(|cursor, e, open| {
        match e.local_name().as_ref() {
            b"b" => font.bold = cursor.attr_bool(&e, b"val")?.unwrap_or(true),
            b"i" => font.italic = cursor.attr_bool(&e, b"val")?.unwrap_or(true),
            b"strike" => font.strikethrough = cursor.attr_bool(&e, b"val")?.unwrap_or(true),
            b"u" => font.underline = Underline::from_val(cursor.attr(&e, b"val")?.as_deref()),
            b"sz" => font.size = cursor.attr_parse(&e, b"val")?.unwrap_or(font.size),
            b"name" => font.name = cursor.attr(&e, b"val")?.unwrap_or_default(),
            b"color" => font.color = read_color(cursor, &e)?,
            b"family" => font.family = cursor.attr_parse(&e, b"val")?,
            b"scheme" => font.scheme = cursor.attr(&e, b"val")?,
            // charset, outline, shadow and the like
            _ => exact = false,
        }
        if open {
            cursor.skip(&e)?;
        }
        Ok(())
    })?;
    Ok((font, exact))
}

fn read_fill(cursor: &mut XmlCursor<'_>, open: bool) -> Result<(FillStyle, bool), DecodeError> {
    let mut fill = FillStyle::None;
    let mut exact = true;
    if !open {
        return Ok((fill, exact));
    }
    cursor.children(|cursor, e, open| {
        if e.local_name().as_ref() != b"patternFill" {
            // Gradient fills are kept as markup only
            exact = false;
            if open {
                cursor.skip(&e)?;
            }
            return Ok(());
        }

        let pattern = match cursor.attr(&e, b"patternType")? {
            None => PatternType::None,
            Some(p) => PatternType::parse(&p)
                .ok_or_else(|| cursor.error(format!("unknown pattern type {:?}", p)))?,
        };
        let mut foreground = Color::Auto;
        let mut background = Color::Auto;
        if open {
            cursor.children(|cursor, e, open| {
                match e.local_name().as_ref() {
                    b"fgColor" => foreground = read_color(cursor, &e)?,
                    b"bgColor" => background = read_color(cursor, &e)?,
                    _ => {}
                }
                if open {
                    cursor.skip(&e)?;
                }
                Ok(())
            })?;
        }

        fill = match pattern {
            PatternType::None => FillStyle::None,
            pattern => FillStyle::Pattern {
                pattern,
                foreground,
                background,
            },
        };
        Ok(())
    })?;
    Ok((fill, exact))
}

fn read_border(
    cursor: &mut XmlCursor<'_>,
    e: &BytesStart<'_>,
    open: bool,
) -> Result<(BorderStyle, bool), DecodeError> {
    let mut border = BorderStyle {
        diagonal_up: cursor.attr_bool(e, b"diagonalUp")?.unwrap_or(false),
        diagonal_down: cursor.attr_bool(e, b"diagonalDown")?.unwrap_or(false),
        ..Default::default()
    };
    let mut exact = true;
    if !open {
        return Ok((border, exact));
    }
    cursor.children(|cursor, e, open| {
        let slot = match e.local_name().as_ref() {
            b"left" | b"start" => Some(&mut border.left),
            b"right" | b"end" => Some(&mut border.right),
            b"top" => Some(&mut border.top),
            b"bottom" => Some(&mut border.bottom),
            b"diagonal" => Some(&mut border.diagonal),
            _ => None,
        };
        let Some(slot) = slot else {
            exact = false;
            if open {
                cursor.skip(&e)?;
            }
            return Ok(());
        };

        let style = match cursor.attr(&e, b"style")? {
            None => None,
            Some(s) => Some(
                BorderLineStyle::parse(&s)
                    .ok_or_else(|| cursor.error(format!("unknown border style {:?}", s)))?,
            ),
        };
        let mut color = Color::Auto;
        if open {
            cursor.children(|cursor, e, open| {
                if e.local_name().as_ref() == b"color" {
                    color = read_color(cursor, &e)?;
                }
                if open {
                    cursor.skip(&e)?;
                }
                Ok(())
            })?;
        }
        *slot = style.map(|style| BorderEdge { style, color });
        Ok(())
    })?;
    Ok((border, exact))
}

fn read_xf(
    cursor: &mut XmlCursor<'_>,
    e: &BytesStart<'_>,
    open: bool,
) -> Result<(ResolvedXfIds, Alignment, Protection), DecodeError> {
    let ids = ResolvedXfIds {
        num_fmt_id: cursor.attr_parse(e, b"numFmtId")?.unwrap_or(0),
        font_id: cursor.attr_parse(e, b"fontId")?.unwrap_or(0),
        fill_id: cursor.attr_parse(e, b"fillId")?.unwrap_or(0),
        border_id: cursor.attr_parse(e, b"borderId")?.unwrap_or(0),
    };
    let mut alignment = Alignment::default();
    let mut protection = Protection::default();
    if open {
        cursor.children(|cursor, e, open| {
            match e.local_name().as_ref() {
                b"alignment" => alignment = read_alignment(cursor, &e)?,
                b"protection" => {
                    protection.locked = cursor.attr_bool(&e, b"locked")?.unwrap_or(true);
                    protection.hidden = cursor.attr_bool(&e, b"hidden")?.unwrap_or(false);
                }
                _ => {}
            }
            if open {
                cursor.skip(&e)?;
            }
            Ok(())
        })?;
    }
    Ok((ids, alignment, protection))
}

fn read_alignment(cursor: &XmlCursor<'_>, e: &BytesStart<'_>) -> Result<Alignment, DecodeError> {
    let mut alignment = Alignment::default();
    if let Some(h) = cursor.attr(e, b"horizontal")? {
        alignment.horizontal = HorizontalAlignment::parse(&h)
            .ok_or_else(|| cursor.error(format!("unknown horizontal alignment {:?}", h)))?;
    }
    if let Some(v) = cursor.attr(e, b"vertical")? {
        alignment.vertical = VerticalAlignment::parse(&v)
            .ok_or_else(|| cursor.error(format!("unknown vertical alignment {:?}", v)))?;
    }
    alignment.wrap_text = cursor.attr_bool(e, b"wrapText")?.unwrap_or(false);
    alignment.shrink_to_fit = cursor.attr_bool(e, b"shrinkToFit")?.unwrap_or(false);
    alignment.indent = cursor.attr_parse(e, b"indent")?.unwrap_or(0);
    alignment.rotation = cursor.attr_parse(e, b"textRotation")?.unwrap_or(0);
    Ok(alignment)
}

/// Parse a color element (`color`, `fgColor`, `bgColor`)
///
/// Priority: rgb > theme > indexed > auto.
pub(crate) fn read_color(cursor: &XmlCursor<'_>, e: &BytesStart<'_>) -> Result<Color, DecodeError> {
    if let Some(rgb) = cursor.attr(e, b"rgb")? {
        return Color::from_hex(&rgb)
            .ok_or_else(|| cursor.error(format!("invalid rgb color {:?}", rgb)));
    }
    if let Some(index) = cursor.attr_parse::<u8>(e, b"theme")? {
        let tint = cursor.attr_parse::<f64>(e, b"tint")?.unwrap_or(0.0);
        return Ok(Color::theme(index, tint));
    }
    if let Some(index) = cursor.attr_parse::<u8>(e, b"indexed")? {
        return Ok(Color::Indexed(index));
    }
    Ok(Color::Auto)
}

// === Writing ===

/// One output table: entry markup plus the ids of entries it can reuse
struct Table<T> {
    raws: Vec<String>,
    ids: HashMap<T, u32>,
}

impl<T: Clone + Eq + std::hash::Hash> Table<T> {
    fn new() -> Self {
        Self {
            raws: Vec::new(),
            ids: HashMap::new(),
        }
    }

    /// Keep the entries of the original document at their indices
    fn seed(&mut self, entries: &[Entry<T>]) {
        for entry in entries {
            let id = self.raws.len() as u32;
            self.raws.push(entry.raw.clone());
            if entry.exact {
                self.ids.entry(entry.model.clone()).or_insert(id);
            }
        }
    }

    fn intern(&mut self, value: &T, write: impl FnOnce(&T) -> String) -> u32 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.raws.len() as u32;
        self.raws.push(write(value));
        self.ids.insert(value.clone(), id);
        id
    }
}

/// The tables `cellXfs` entries point into
struct Tables {
    numfmts: Vec<String>,
    numfmt_ids: HashMap<String, u32>,
    next_numfmt_id: u32,
    fonts: Table<FontStyle>,
    fills: Table<FillStyle>,
    borders: Table<BorderStyle>,
}

impl Tables {
    fn new(source: Option<&Source>) -> Self {
        let mut tables = Tables {
            numfmts: Vec::new(),
            numfmt_ids: HashMap::new(),
            next_numfmt_id: NumberFormat::FIRST_CUSTOM_ID,
            fonts: Table::new(),
            fills: Table::new(),
            borders: Table::new(),
        };
        if let Some(source) = source {
            for entry in &source.numfmts {
                let (id, code) = &entry.model;
                tables.numfmts.push(entry.raw.clone());
                if *id >= NumberFormat::FIRST_CUSTOM_ID {
                    tables.numfmt_ids.entry(code.clone()).or_insert(*id);
                    tables.next_numfmt_id = tables.next_numfmt_id.max(id + 1);
                }
            }
            tables.fonts.seed(&source.fonts);
            tables.fills.seed(&source.fills);
            tables.borders.seed(&source.borders);
        }

        // Excel requires the first two fills to be none and gray125
        if tables.fills.raws.is_empty() {
            tables.fills.intern(&FillStyle::None, write_fill);
            tables.fills.intern(&gray125(), write_fill);
        }
        if tables.borders.raws.is_empty() {
            tables.borders.intern(&BorderStyle::default(), write_border);
        }
        tables
    }

    fn resolve(&mut self, style: &Style) -> ResolvedXfIds {
        let num_fmt_id = match &style.number_format {
            NumberFormat::General => 0,
            NumberFormat::BuiltIn(id) => *id,
            NumberFormat::Custom(code) => match self.numfmt_ids.get(code) {
                Some(&id) => id,
                None => {
                    let id = self.next_numfmt_id;
                    self.next_numfmt_id += 1;
                    self.numfmt_ids.insert(code.clone(), id);
                    self.numfmts.push(format!(
                        "<numFmt numFmtId=\"{}\" formatCode=\"{}\"/>",
                        id,
                        escape_attr(code)
                    ));
                    id
                }
            },
        };

        ResolvedXfIds {
            font_id: self.fonts.intern(&style.font, write_font),
            fill_id: self.fills.intern(&style.fill, write_fill),
            border_id: self.borders.intern(&style.border, write_border),
            num_fmt_id,
        }
    }
}

fn write_section(section: Section, attrs: &[(String, String)], items: &[String]) -> String {
    let tag = section.tag();
    let mut xml = format!("<{} count=\"{}\"", tag, items.len());
    for (key, value) in attrs {
        xml.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
    }
    xml.push('>');
    for item in items {
        xml.push_str(item);
    }
    xml.push_str(&format!("</{}>", tag));
    xml
}

fn write_styles(registry: &StyleRegistry, source: Option<&Source>) -> String {
    let mut tables = Tables::new(source);
    let kept = source.map_or(&[][..], |s| s.xfs.as_slice());

    let mut xfs = Vec::with_capacity(registry.len());
    for (id, style) in registry.iter() {
        match kept.get(id as usize) {
            Some(entry) => xfs.push(entry.raw.clone()),
            None => {
                let ids = tables.resolve(style);
                xfs.push(write_xf(style, ids));
            }
        }
    }

    let attrs = |section: Section| {
        source
            .and_then(|s| s.span(section))
            .map_or(&[][..], |s| s.attrs.as_slice())
    };
    let mut sections = Vec::with_capacity(5);
    if !tables.numfmts.is_empty() {
        sections.push((
            Section::NumFmts,
            write_section(Section::NumFmts, attrs(Section::NumFmts), &tables.numfmts),
        ));
    }
    for (section, items) in [
        (Section::Fonts, &tables.fonts.raws),
        (Section::Fills, &tables.fills.raws),
        (Section::Borders, &tables.borders.raws),
        (Section::CellXfs, &xfs),
    ] {
        sections.push((section, write_section(section, attrs(section), items)));
    }

    match source {
        Some(source) => splice(source, sections),
        None => template(sections),
    }
}

/// Replace the regenerated sections in the original document
///
/// A section the document lacks goes after the closest earlier one.
fn splice(source: &Source, sections: Vec<(Section, String)>) -> String {
    let mut edits: Vec<(Range<usize>, String)> = sections
        .into_iter()
        .map(|(section, xml)| {
            let range = match source.span(section) {
                Some(found) => found.span.clone(),
                None => {
                    let at = source
                        .sections
                        .iter()
                        .filter(|s| s.section < section)
                        .map(|s| s.span.end)
                        .max()
                        .unwrap_or(source.body_start);
                    at..at
                }
            };
            (range, xml)
        })
        .collect();
    edits.sort_by_key(|(range, _)| range.start);

    let grown: usize = edits.iter().map(|(_, xml)| xml.len()).sum();
    let mut out = String::with_capacity(source.text.len() + grown);
    let mut last = 0;
    for (range, xml) in edits {
        out.push_str(&source.text[last..range.start]);
        out.push_str(&xml);
        last = range.end;
    }
    out.push_str(&source.text[last..]);
    out
}

/// A complete stylesheet around the generated sections
fn template(sections: Vec<(Section, String)>) -> String {
    let mut xml = String::with_capacity(1024 + sections.iter().map(|(_, s)| s.len()).sum::<usize>());
    xml.push_str(XML_HEADER);
    xml.push_str(
        "<styleSheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">",
    );
    for (section, body) in sections {
        if section == Section::CellXfs {
            xml.push_str(
                "<cellStyleXfs count=\"1\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\"/></cellStyleXfs>",
            );
        }
        xml.push_str(&body);
    }
    xml.push_str(
        "<cellStyles count=\"1\"><cellStyle name=\"Normal\" xfId=\"0\" builtinId=\"0\"/></cellStyles>",
    );
    xml.push_str("<dxfs count=\"0\"/>");
    xml.push_str("<tableStyles count=\"0\" defaultTableStyle=\"TableStyleMedium9\" defaultPivotStyle=\"PivotStyleLight16\"/>");
    xml.push_str("</styleSheet>");
    xml
}

pub(crate) fn write_color(tag: &str, color: &Color) -> String {
    match color {
        Color::Auto => format!("<{tag} auto=\"1\"/>"),
        Color::Argb { a, r, g, b } => {
            format!("<{tag} rgb=\"{:02X}{:02X}{:02X}{:02X}\"/>", a, r, g, b)
        }
        Color::Indexed(i) => format!("<{tag} indexed=\"{}\"/>", i),
        Color::Theme { index, tint } => {
            if *tint == 0.0 {
                format!("<{tag} theme=\"{}\"/>", index)
            } else {
                format!("<{tag} theme=\"{}\" tint=\"{}\"/>", index, tint)
            }
        }
    }
}

fn write_font(font: &FontStyle) -> String {
    let mut s = String::from("<font>");
    if font.bold {
        s.push_str("<b/>");
    }
    if font.italic {
        s.push_str("<i/>");
    }
    if font.strikethrough {
        s.push_str("<strike/>");
    }
    match font.underline {
        Underline::None => {}
        Underline::Single => s.push_str("<u/>"),
        other => {
            if let Some(val) = other.as_str() {
                s.push_str(&format!("<u val=\"{}\"/>", val));
            }
        }
    }
    s.push_str(&format!("<sz val=\"{}\"/>", font.size));
    if font.color != Color::Auto {
        s.push_str(&write_color("color", &font.color));
    }
    if !font.name.is_empty() {
        s.push_str(&format!("<name val=\"{}\"/>", escape_attr(&font.name)));
    }
    if let Some(family) = font.family {
        s.push_str(&format!("<family val=\"{}\"/>", family));
    }
    if let Some(scheme) = &font.scheme {
        s.push_str(&format!("<scheme val=\"{}\"/>", escape_attr(scheme)));
    }
    s.push_str("</font>");
    s
}

fn write_fill(fill: &FillStyle) -> String {
    match fill {
        FillStyle::None => "<fill><patternFill patternType=\"none\"/></fill>".to_string(),
        FillStyle::Pattern {
            pattern,
            foreground,
            background,
        } => {
            let mut s = format!("<fill><patternFill patternType=\"{}\">", pattern.as_str());
            if *foreground != Color::Auto {
                s.push_str(&write_color("fgColor", foreground));
            }
            if *background != Color::Auto {
                s.push_str(&write_color("bgColor", background));
            }
            s.push_str("</patternFill></fill>");
            s
        }
    }
}

fn write_border_edge(tag: &str, edge: &Option<BorderEdge>) -> String {
    match edge {
        None => format!("<{tag}/>"),
        Some(e) => format!(
            "<{tag} style=\"{}\">{}</{tag}>",
            e.style.as_str(),
            write_color("color", &e.color)
        ),
    }
}

fn write_border(border: &BorderStyle) -> String {
    let mut s = String::from("<border");
    if border.diagonal_up {
        s.push_str(" diagonalUp=\"1\"");
    }
    if border.diagonal_down {
        s.push_str(" diagonalDown=\"1\"");
    }
    s.push('>');
    s.push_str(&write_border_edge("left", &border.left));
    s.push_str(&write_border_edge("right", &border.right));
    s.push_str(&write_border_edge("top", &border.top));
    s.push_str(&write_border_edge("bottom", &border.bottom));
    s.push_str(&write_border_edge("diagonal", &border.diagonal));
    s.push_str("</border>");
    s
}

fn write_alignment(al: &Alignment) -> String {
    let default = Alignment::default();
    if al.is_default() {
        return String::new();
    }

    let mut s = String::from("<alignment");
    if al.horizontal != default.horizontal {
        s.push_str(&format!(" horizontal=\"{}\"", al.horizontal.as_str()));
    }
    if al.vertical != default.vertical {
        s.push_str(&format!(" vertical=\"{}\"", al.vertical.as_str()));
    }
    if al.wrap_text {
        s.push_str(" wrapText=\"1\"");
    }
    if al.shrink_to_fit {
        s.push_str(" shrinkToFit=\"1\"");
    }
    if al.indent != 0 {
        s.push_str(&format!(" indent=\"{}\"", al.indent));
    }
    if al.rotation != 0 {
        s.push_str(&format!(" textRotation=\"{}\"", al.rotation));
    }
    s.push_str("/>");
    s
}

fn write_protection(p: &Protection) -> String {
    let default = Protection::default();
    if p == &default {
        return String::new();
    }
    format!(
        "<protection locked=\"{}\" hidden=\"{}\"/>",
        p.locked as u8, p.hidden as u8
    )
}

fn write_xf(style: &Style, ids: ResolvedXfIds) -> String {
    let mut attrs = String::new();
    if ids.num_fmt_id != 0 {
        attrs.push_str(" applyNumberFormat=\"1\"");
    }
    if ids.font_id != 0 {
        attrs.push_str(" applyFont=\"1\"");
    }
    if ids.fill_id != 0 {
        attrs.push_str(" applyFill=\"1\"");
    }
    if ids.border_id != 0 {
        attrs.push_str(" applyBorder=\"1\"");
    }
    if !style.alignment.is_default() {
        attrs.push_str(" applyAlignment=\"1\"");
    }
    if style.protection != Protection::default() {
        attrs.push_str(" applyProtection=\"1\"");
    }

    let mut s = format!(
        "<xf numFmtId=\"{}\" fontId=\"{}\" fillId=\"{}\" borderId=\"{}\" xfId=\"0\"{}",
        ids.num_fmt_id, ids.font_id, ids.fill_id, ids.border_id, attrs
    );

    let alignment_xml = write_alignment(&style.alignment);
    let protection_xml = write_protection(&style.protection);
    if alignment_xml.is_empty() && protection_xml.is_empty() {
        s.push_str("/>");
        return s;
    }

    s.push('>');
    s.push_str(&alignment_xml);
    s.push_str(&protection_xml);
    s.push_str("</xf>");
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::decode_part;
    use pretty_assertions::assert_eq;

    fn reread(registry: &StyleRegistry) -> StyleRegistry {
        decode_part(registry.to_xml().as_bytes()).unwrap()
    }

    #[test]
    fn test_default_registry_survives() {
        let registry = reread(&StyleRegistry::new());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.default_style(), &Style::default());
    }

    #[test]
    fn test_styles_keep_their_ids() {
        let mut registry = StyleRegistry::new();
        let styles = [
            Style::new().bold(true),
            Style::new()
                .bold(true)
                .fill_color(Color::YELLOW)
                .number_format("0.000")
                .border(BorderStyle::all(BorderEdge::new(
                    BorderLineStyle::Thin,
                    Color::BLACK,
                ))),
            Style::new()
                .font_color(Color::theme(4, -0.249977111117893))
                .horizontal_alignment(HorizontalAlignment::Center)
                .wrap_text(true)
                .locked(false),
            Style::new().builtin_format(NumberFormat::ID_PERCENT_INT),
        ];
        let ids: Vec<u32> = styles.iter().cloned().map(|s| registry.register(s)).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);

        let mut back = reread(&registry);
        assert_eq!(back.len(), registry.len());
        for (id, style) in ids.iter().zip(styles) {
            assert_eq!(back.resolve(*id).unwrap(), &style);
            assert_eq!(back.register(style), *id);
        }
    }

    #[test]
    fn test_reserved_fills_and_custom_formats() {
        let mut registry = StyleRegistry::new();
        registry.register(Style::new().number_format("0.0%"));
        registry.register(Style::new().number_format("#,##0.00"));
        registry.register(Style::new().fill_color(Color::RED));
        let xml = registry.to_xml();

        assert!(xml.contains("<fills count=\"3\"><fill><patternFill patternType=\"none\"/></fill><fill><patternFill patternType=\"gray125\"></patternFill></fill>"));
        assert!(xml.contains("<numFmt numFmtId=\"164\" formatCode=\"0.0%\"/>"));
        assert!(xml.contains("<numFmt numFmtId=\"165\" formatCode=\"#,##0.00\"/>"));
        assert!(xml.contains("<cellXfs count=\"4\">"));
    }

    #[test]
    fn test_read_excel_stylesheet() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:mc="http://schemas.openxmlformats.org/markup-compatibility/2006">
  <numFmts count="1"><numFmt numFmtId="164" formatCode="yyyy\-mm\-dd"/></numFmts>
  <fonts count="2">
    <font><sz val="12"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font>
    <font><b/><sz val="12"/><color rgb="FFFF0000"/><name val="Arial"/></font>
  </fonts>
  <fills count="2">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
  </fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="3">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="164" fontId="1" fillId="0" borderId="0" xfId="0" applyNumberFormat="1" applyFont="1"/>
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0" applyAlignment="1"><alignment horizontal="right" vertical="top"/></xf>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
  <extLst><ext uri="{EB79DEF2-80B8-43e5-95BD-54CBDDF9020C}"/></extLst>
</styleSheet>"#;
        let registry: StyleRegistry = decode_part(xml.as_bytes()).unwrap();
        assert_eq!(registry.len(), 3);

        let dated = registry.resolve(1).unwrap();
        assert_eq!(dated.number_format, NumberFormat::Custom("yyyy\\-mm\\-dd".into()));
        assert!(dated.font.bold);
        assert_eq!(dated.font.color, Color::RED);
        assert_eq!(dated.font.name, "Arial");

        let aligned = registry.resolve(2).unwrap();
        assert_eq!(aligned.alignment.horizontal, HorizontalAlignment::Right);
        assert_eq!(aligned.alignment.vertical, VerticalAlignment::Top);
        assert_eq!(registry.resolve(0).unwrap().font.size, 12.0);
    }

    const DECORATED: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:x14ac="http://schemas.microsoft.com/office/spreadsheetml/2009/9/ac">
<numFmts count="1"><numFmt numFmtId="164" formatCode="0.0%"/></numFmts>
<fonts count="1" x14ac:knownFonts="1"><font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font></fonts>
<fills count="3"><fill><patternFill patternType="none"/></fill><fill><patternFill patternType="gray125"/></fill><fill><gradientFill degree="90"><stop position="0"><color theme="0"/></stop><stop position="1"><color theme="4" tint="-0.249977111117893"/></stop></gradientFill></fill></fills>
<borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
<cellStyleXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/><xf numFmtId="0" fontId="0" fillId="2" borderId="0"/></cellStyleXfs>
<cellXfs count="2"><xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/><xf numFmtId="164" fontId="0" fillId="2" borderId="0" xfId="1" applyFill="1"/></cellXfs>
<cellStyles count="2"><cellStyle name="Normal" xfId="0" builtinId="0"/><cellStyle name="Banner" xfId="1"/></cellStyles>
<dxfs count="1"><dxf><font><color rgb="FF9C0006"/></font></dxf></dxfs>
<tableStyles count="0" defaultTableStyle="TableStyleMedium2" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#;

    #[test]
    fn test_unmodelled_styles_survive_growth() {
        let mut sheet: StyleSheet = decode_part(DECORATED.as_bytes()).unwrap();
        assert_eq!(sheet.registry().len(), 2);
        let bold = sheet.registry_mut().register(Style::new().bold(true));
        // Same model as xf 1, which really has a gradient fill
        let percent = sheet.registry_mut().register(Style::new().number_format("0.0%"));
        assert_eq!((bold, percent), (2, 3));

        let xml = sheet.to_xml();
        assert!(xml.contains("<gradientFill degree=\"90\">"));
        assert!(xml.contains("<stop position=\"1\"><color theme=\"4\" tint=\"-0.249977111117893\"/></stop>"));
        assert!(xml.contains("<dxfs count=\"1\"><dxf><font><color rgb=\"FF9C0006\"/></font></dxf></dxfs>"));
        assert!(xml.contains("<cellStyle name=\"Banner\" xfId=\"1\"/>"));
        assert!(xml.contains("<cellStyleXfs count=\"2\">"));
        assert!(xml.contains("<fonts count=\"2\" x14ac:knownFonts=\"1\">"));
        assert!(xml.contains("<fills count=\"3\">"));
        assert!(xml.contains("<numFmts count=\"1\">"));
        assert!(xml.contains(
            "<cellXfs count=\"4\"><xf numFmtId=\"0\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\"/><xf numFmtId=\"164\" fontId=\"0\" fillId=\"2\" borderId=\"0\" xfId=\"1\" applyFill=\"1\"/>"
        ));
        assert!(xml.contains(
            "<xf numFmtId=\"0\" fontId=\"1\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyFont=\"1\"/>"
        ));
        assert!(xml.contains(
            "<xf numFmtId=\"164\" fontId=\"0\" fillId=\"0\" borderId=\"0\" xfId=\"0\" applyNumberFormat=\"1\"/></cellXfs>"
        ));

        let back: StyleSheet = decode_part(xml.as_bytes()).unwrap();
        assert_eq!(back.registry().len(), 4);
        assert!(back.registry().resolve(bold).unwrap().font.bold);
    }

    #[test]
    fn test_missing_sections_are_inserted_in_order() {
        let xml = r#"<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles></styleSheet>"#;
        let mut sheet: StyleSheet = decode_part(xml.as_bytes()).unwrap();
        sheet.registry_mut().register(Style::new().number_format("0.000"));
        let out = sheet.to_xml();

        let at = |tag: &str| out.find(tag).unwrap();
        assert!(at("<numFmts") < at("<fonts"));
        assert!(at("<fonts") < at("<fills"));
        assert!(at("<borders") < at("<cellXfs"));
        assert!(at("</cellXfs>") < at("<cellStyles"));
        let back: StyleRegistry = decode_part(out.as_bytes()).unwrap();
        assert_eq!(back.len(), 2);
        assert_eq!(
            back.resolve(1).unwrap().number_format,
            NumberFormat::Custom("0.000".into())
        );
    }

    #[test]
    fn test_bad_color_reports_line() {
        let xml = "<styleSheet>\n<fonts count=\"1\">\n<font><color rgb=\"nope\"/></font>\n</fonts>\n</styleSheet>";
        let err = decode_part::<StyleRegistry>(xml.as_bytes()).unwrap_err();
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_write_color() {
        assert_eq!(write_color("color", &Color::RED), "<color rgb=\"FFFF0000\"/>");
        assert_eq!(
            write_color("fgColor", &Color::theme(4, 0.4)),
            "<fgColor theme=\"4\" tint=\"0.4\"/>"
        );
        assert_eq!(write_color("bgColor", &Color::Indexed(64)), "<bgColor indexed=\"64\"/>");
        assert_eq!(
            write_color("color", &Color::theme(4, -0.249977111117893)),
            "<color theme=\"4\" tint=\"-0.249977111117893\"/>"
        );
    }
}
