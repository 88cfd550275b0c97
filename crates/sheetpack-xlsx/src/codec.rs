//! XML marshalling for individual parts
//!
//! A part type implements [`XmlPart`]; [`decode_part`] runs the charset
//! pipeline and then the type's parser. Parsers walk quick-xml events through
//! an [`XmlCursor`], which turns every failure into a [`DecodeError`] that
//! names the line it happened on.

use std::borrow::Cow;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;

use crate::charset;
use crate::error::DecodeError;

/// Declaration written at the top of every generated part
pub const XML_HEADER: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n";

/// A typed view of one XML part
///
/// `Default` is the value an absent part decodes to.
pub trait XmlPart: Default + Sized {
    /// Parse a complete document
    fn from_xml(xml: &str) -> Result<Self, DecodeError>;

    /// Serialize to a complete document, declaration included
    fn to_xml(&self) -> String;
}

/// Decode raw part bytes into `T`
///
/// Text that is empty after charset decoding yields `T::default()`; anything
/// else must parse.
pub fn decode_part<T: XmlPart>(bytes: &[u8]) -> Result<T, DecodeError> {
    let text = charset::decode_text(bytes)?;
    if text.trim().is_empty() {
        return Ok(T::default());
    }
    T::from_xml(&text)
}

/// 1-based line number of a byte offset
pub fn line_at(text: &str, pos: usize) -> u64 {
    let end = pos.min(text.len());
    text.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() as u64 + 1
}

/// Event reader over decoded part text
pub struct XmlCursor<'a> {
    text: &'a str,
    /// Offset of the reader's input within `text`
    base: usize,
    reader: Reader<&'a [u8]>,
}

impl<'a> XmlCursor<'a> {
    pub fn new(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.trim_text(true);
        Self {
            text,
            base: 0,
            reader,
        }
    }

    /// A cursor that reports whitespace-only text, for parts where cell or
    /// string text is significant
    pub fn preserving_space(text: &'a str) -> Self {
        let mut reader = Reader::from_str(text);
        reader.trim_text(false);
        Self {
            text,
            base: 0,
            reader,
        }
    }

    /// A space-preserving cursor that starts at byte `offset` of `text`
    ///
    /// End tags are not matched against start tags read before `offset`.
    /// Positions and lines stay relative to the whole text.
    pub fn at_offset(text: &'a str, offset: usize) -> Self {
        let mut reader = Reader::from_str(&text[offset..]);
        reader.trim_text(false);
        reader.check_end_names(false);
        Self {
            text,
            base: offset,
            reader,
        }
    }

    /// Next event
    pub fn next(&mut self) -> Result<Event<'a>, DecodeError> {
        match self.reader.read_event() {
            Ok(event) => Ok(event),
            Err(e) => Err(self.error(e.to_string())),
        }
    }

    /// Byte offset of the reader within the text
    pub fn position(&self) -> usize {
        self.base + self.reader.buffer_position()
    }

    /// Line the reader is on
    pub fn line(&self) -> u64 {
        line_at(self.text, self.position())
    }

    /// A decode error at the current line
    pub fn error<S: Into<String>>(&self, reason: S) -> DecodeError {
        DecodeError::new(self.line(), reason)
    }

    /// Advance to the root element and check its local name
    ///
    /// Returns the root start tag and whether it was self-closing.
    pub fn root(&mut self, expected: &str) -> Result<(BytesStart<'a>, bool), DecodeError> {
        loop {
            let (start, empty) = match self.next()? {
                Event::Start(e) => (e, false),
                Event::Empty(e) => (e, true),
                Event::Eof => return Err(self.error("unexpected EOF")),
                _ => continue,
            };
            if start.local_name().as_ref() != expected.as_bytes() {
                return Err(self.error(format!(
                    "expected element type <{}> but have <{}>",
                    expected,
                    String::from_utf8_lossy(start.name().as_ref())
                )));
            }
            return Ok((start, empty));
        }
    }

    /// Visit each child element of the element just opened
    ///
    /// `f` gets the child's start tag and whether it has content (a `Start`
    /// rather than an `Empty` event). A child with content must be consumed
    /// by `f`, for example with [`XmlCursor::skip`]. Returns after the
    /// parent's end tag.
    pub fn children<F>(&mut self, mut f: F) -> Result<(), DecodeError>
    where
        F: FnMut(&mut Self, BytesStart<'a>, bool) -> Result<(), DecodeError>,
    {
        loop {
            match self.next()? {
                Event::Start(e) => f(self, e, true)?,
                Event::Empty(e) => f(self, e, false)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.error("unexpected EOF")),
                _ => {}
            }
        }
    }

    /// Like [`XmlCursor::children`], also passing the position each child's
    /// start tag was read from
    pub fn children_at<F>(&mut self, mut f: F) -> Result<(), DecodeError>
    where
        F: FnMut(&mut Self, usize, BytesStart<'a>, bool) -> Result<(), DecodeError>,
    {
        loop {
            let begin = self.position();
            match self.next()? {
                Event::Start(e) => f(self, begin, e, true)?,
                Event::Empty(e) => f(self, begin, e, false)?,
                Event::End(_) => return Ok(()),
                Event::Eof => return Err(self.error("unexpected EOF")),
                _ => {}
            }
        }
    }

    /// Skip everything up to and including the end tag of `start`
    pub fn skip(&mut self, start: &BytesStart<'_>) -> Result<(), DecodeError> {
        match self.reader.read_to_end(start.name()) {
            Ok(_) => Ok(()),
            Err(e) => Err(self.error(e.to_string())),
        }
    }

    /// Consume the element opened by `start` and return it verbatim
    ///
    /// `begin` is the position recorded before `start` was read.
    pub fn capture(&mut self, begin: usize, start: &BytesStart<'_>) -> Result<String, DecodeError> {
        self.skip(start)?;
        Ok(self.text[begin..self.position()].trim().to_string())
    }

    /// The slice of the source between two positions
    pub fn slice(&self, begin: usize, end: usize) -> &'a str {
        self.text[begin..end].trim()
    }

    /// Collect the text content of the element opened by `start`
    ///
    /// Nested markup is ignored; its text is kept.
    pub fn text_of(&mut self, start: &BytesStart<'_>) -> Result<String, DecodeError> {
        let mut out = String::new();
        let mut depth = 0usize;
        loop {
            match self.next()? {
                Event::Text(t) => {
                    let text = t.unescape().map_err(|e| self.error(e.to_string()))?;
                    out.push_str(&text);
                }
                Event::CData(c) => out.push_str(&String::from_utf8_lossy(&c)),
                Event::Start(_) => depth += 1,
                Event::End(e) => {
                    if depth == 0 {
                        if e.name() != start.name() {
                            return Err(self.error("element end tag mismatch"));
                        }
                        return Ok(out);
                    }
                    depth -= 1;
                }
                Event::Eof => return Err(self.error("unexpected EOF")),
                _ => {}
            }
        }
    }

    /// Value of the attribute whose full name is `key`
    pub fn attr(&self, e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>, DecodeError> {
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(err.to_string()))?;
            if attr.key.as_ref() == key {
                let value = attr
                    .unescape_value()
                    .map_err(|err| self.error(err.to_string()))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Attribute value parsed with `FromStr`
    pub fn attr_parse<T: std::str::FromStr>(
        &self,
        e: &BytesStart<'_>,
        key: &[u8],
    ) -> Result<Option<T>, DecodeError> {
        match self.attr(e, key)? {
            None => Ok(None),
            Some(v) => v.trim().parse().map(Some).map_err(|_| {
                self.error(format!(
                    "invalid value {:?} for attribute {}",
                    v,
                    String::from_utf8_lossy(key)
                ))
            }),
        }
    }

    /// Boolean attribute ("1"/"true" or "0"/"false")
    pub fn attr_bool(&self, e: &BytesStart<'_>, key: &[u8]) -> Result<Option<bool>, DecodeError> {
        match self.attr(e, key)? {
            None => Ok(None),
            Some(v) => parse_bool(&v).map(Some).ok_or_else(|| {
                self.error(format!(
                    "invalid boolean {:?} for attribute {}",
                    v,
                    String::from_utf8_lossy(key)
                ))
            }),
        }
    }

    /// All attributes in document order
    pub fn attrs(&self, e: &BytesStart<'_>) -> Result<Vec<(String, String)>, DecodeError> {
        let mut out = Vec::new();
        for attr in e.attributes() {
            let attr = attr.map_err(|err| self.error(err.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|err| self.error(err.to_string()))?;
            out.push((
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }
        Ok(out)
    }
}

/// Parse an xsd:boolean
pub fn parse_bool(s: &str) -> Option<bool> {
    match s.trim() {
        "1" | "true" => Some(true),
        "0" | "false" => Some(false),
        _ => None,
    }
}

/// Escape text content
pub fn escape_text(s: &str) -> Cow<'_, str> {
    quick_xml::escape::partial_escape(s)
}

/// Escape an attribute value
pub fn escape_attr(s: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(s)
}

/// Decode Excel's `_xHHHH_` escape sequences
///
/// - `_x000D_` = CR
/// - `_x000A_` = LF
/// - `_x0009_` = Tab
/// - `_x005F_` = a literal underscore
pub fn decode_excel_escapes(s: &str) -> Cow<'_, str> {
    if !s.contains("_x") {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(at) = rest.find("_x") {
        out.push_str(&rest[..at]);
        let candidate = &rest[at..];
        let decoded = candidate
            .get(2..6)
            .filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
            .filter(|_| candidate.as_bytes().get(6) == Some(&b'_'))
            .and_then(|hex| u32::from_str_radix(hex, 16).ok())
            .and_then(char::from_u32);

        match decoded {
            Some(c) => {
                out.push(c);
                rest = &candidate[7..];
            }
            None => {
                out.push_str("_x");
                rest = &candidate[2..];
            }
        }
    }
    out.push_str(rest);

    Cow::Owned(out)
}

/// Encode characters XML 1.0 cannot carry as `_xHHHH_`
///
/// Underscores that would otherwise read back as an escape are escaped too.
pub fn encode_excel_escapes(s: &str) -> Cow<'_, str> {
    let needs = |(i, c): (usize, char)| {
        (c < ' ' && !matches!(c, '\t' | '\n' | '\r'))
            || c == '\u{FFFE}'
            || c == '\u{FFFF}'
            || (c == '_' && looks_like_escape(&s[i..]))
    };
    if !s.char_indices().any(needs) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len() + 8);
    for (i, c) in s.char_indices() {
        if needs((i, c)) {
            out.push_str(&format!("_x{:04X}_", c as u32));
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

fn looks_like_escape(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 7
        && b.starts_with(b"_x")
        && b[2..6].iter().all(u8::is_ascii_hexdigit)
        && b[6] == b'_'
}
