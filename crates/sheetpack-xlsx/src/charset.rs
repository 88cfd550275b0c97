//! Charset detection for part bytes
//!
//! Parts are normally UTF-8, but legacy producers write XML in 8-bit
//! codepages and say so in the XML declaration. Decoding runs an ordered list
//! of candidates and stops at the first one that decodes the bytes without
//! replacement characters. Nothing is guessed: bytes that only decode under an
//! undeclared legacy charset are rejected, naming the line of the first bad
//! byte.

use std::borrow::Cow;

use encoding_rs::{Encoding, UTF_8};

use crate::error::DecodeError;

/// A source of encoding information, tried in [`FALLBACK_CHAIN`] order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Candidate {
    /// UTF-8 or UTF-16 byte order mark
    Bom,
    /// `encoding="..."` of the XML declaration, resolved as a WHATWG label
    DeclaredLabel,
    /// Declared labels outside WHATWG: Windows/Mac codepage names and numbers
    LegacyCodepage,
    /// Strict UTF-8
    Utf8,
}

/// The order candidates are attempted in
pub const FALLBACK_CHAIN: [Candidate; 4] = [
    Candidate::Bom,
    Candidate::DeclaredLabel,
    Candidate::LegacyCodepage,
    Candidate::Utf8,
];

impl Candidate {
    /// The encoding this candidate proposes, and the number of leading bytes to skip
    pub fn propose(self, bytes: &[u8]) -> Option<(&'static Encoding, usize)> {
        match self {
            Candidate::Bom => Encoding::for_bom(bytes),
            Candidate::DeclaredLabel => declared_label(bytes)
                .and_then(|label| Encoding::for_label(label.as_bytes()))
                .filter(|enc| enc.is_ascii_compatible() && *enc != UTF_8)
                .map(|enc| (enc, 0)),
            Candidate::LegacyCodepage => declared_label(bytes)
                .filter(|label| Encoding::for_label(label.as_bytes()).is_none())
                .and_then(legacy_codepage)
                .map(|enc| (enc, 0)),
            Candidate::Utf8 => Some((UTF_8, 0)),
        }
    }
}

/// Decode part bytes into text
pub fn decode_text(bytes: &[u8]) -> Result<Cow<'_, str>, DecodeError> {
    for candidate in FALLBACK_CHAIN {
        let Some((encoding, skip)) = candidate.propose(bytes) else {
            continue;
        };

        match encoding.decode_without_bom_handling_and_without_replacement(&bytes[skip..]) {
            Some(text) => {
                if encoding != UTF_8 {
                    log::debug!("decoded part as {} ({:?})", encoding.name(), candidate);
                }
                return Ok(text);
            }
            None if candidate != Candidate::Utf8 => {
                log::warn!(
                    "part bytes are not valid {} ({:?}), trying next charset",
                    encoding.name(),
                    candidate
                );
            }
            None => {}
        }
    }

    Err(utf8_error(bytes))
}

fn utf8_error(bytes: &[u8]) -> DecodeError {
    let valid = match std::str::from_utf8(bytes) {
        Ok(_) => bytes.len(),
        Err(e) => e.valid_up_to(),
    };
    let line = bytes[..valid].iter().filter(|&&b| b == b'\n').count() as u64 + 1;
    DecodeError::new(line, "invalid UTF-8")
}

/// The `encoding` pseudo-attribute of an ASCII XML declaration
pub fn declared_label(bytes: &[u8]) -> Option<&str> {
    let head = &bytes[..bytes.len().min(1024)];
    if !head.starts_with(b"<?xml") {
        return None;
    }

    let decl = &head[..find(head, b"?>")?];
    let after = &decl[find(decl, b"encoding")? + b"encoding".len()..];
    let after = trim_ascii_start(after).strip_prefix(b"=")?;
    let after = trim_ascii_start(after);

    let quote = *after.first()?;
    if quote != b'"' && quote != b'\'' {
        return None;
    }
    let value = &after[1..];
    let close = value.iter().position(|&b| b == quote)?;

    std::str::from_utf8(&value[..close]).ok().map(str::trim)
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn trim_ascii_start(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    &bytes[start..]
}

/// Map codepage labels that WHATWG does not define
fn legacy_codepage(label: &str) -> Option<&'static Encoding> {
    let label = label.to_ascii_lowercase();

    match label.as_str() {
        "maccyrillic" | "mac-cyrillic" | "macintosh-cyrillic" | "x-mac-cyrillic" => {
            return Some(encoding_rs::X_MAC_CYRILLIC)
        }
        "macroman" | "mac-roman" | "x-mac-roman" => return Some(encoding_rs::MACINTOSH),
        _ => {}
    }

    let digits = ["windows-", "x-cp", "cp-", "cp", "ibm-", "ibm", "ms"]
        .iter()
        .find_map(|prefix| label.strip_prefix(prefix))?;
    codepage_to_encoding(digits.parse().ok()?)
}

/// Windows codepage number to encoding
fn codepage_to_encoding(codepage: u32) -> Option<&'static Encoding> {
    match codepage {
        866 => Some(encoding_rs::IBM866),
        874 => Some(encoding_rs::WINDOWS_874),
        1250 => Some(encoding_rs::WINDOWS_1250),
        1251 => Some(encoding_rs::WINDOWS_1251),
        1252 => Some(encoding_rs::WINDOWS_1252),
        1253 => Some(encoding_rs::WINDOWS_1253),
        1254 => Some(encoding_rs::WINDOWS_1254),
        1255 => Some(encoding_rs::WINDOWS_1255),
        1256 => Some(encoding_rs::WINDOWS_1256),
        1257 => Some(encoding_rs::WINDOWS_1257),
        1258 => Some(encoding_rs::WINDOWS_1258),
        932 => Some(encoding_rs::SHIFT_JIS),
        936 => Some(encoding_rs::GBK),
        949 => Some(encoding_rs::EUC_KR),
        950 => Some(encoding_rs::BIG5),
        10000 => Some(encoding_rs::MACINTOSH),
        10007 | 10017 => Some(encoding_rs::X_MAC_CYRILLIC),
        20866 => Some(encoding_rs::KOI8_R),
        21866 => Some(encoding_rs::KOI8_U),
        28592 => Some(encoding_rs::ISO_8859_2),
        28595 => Some(encoding_rs::ISO_8859_5),
        28597 => Some(encoding_rs::ISO_8859_7),
        28605 => Some(encoding_rs::ISO_8859_15),
        54936 => Some(encoding_rs::GB18030),
        _ => None,
    }
}
