//! Shared string table
//!
//! String cells reference entries in this table by index instead of carrying
//! their text. The table only grows: indices handed out during a session stay
//! valid and are never reused.

use std::hash::{Hash, Hasher};

use ahash::AHashMap;

use crate::error::{Error, Result};
use crate::style::{Color, Underline};

/// One entry of the shared string table
///
/// Two items are the same entry only if both the text and the run structure
/// match. A plain string never collapses into a rich one with equal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SharedStringItem {
    /// Full text (the concatenation of all runs for rich text)
    pub text: String,
    /// Formatting runs; empty for plain text
    pub runs: Vec<RichTextRun>,
}

impl SharedStringItem {
    /// A plain, unformatted string
    pub fn plain<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            runs: Vec::new(),
        }
    }

    /// A rich string; its text is the concatenation of the runs
    pub fn rich(runs: Vec<RichTextRun>) -> Self {
        let text = runs.iter().map(|r| r.text.as_str()).collect();
        Self { text, runs }
    }

    pub fn is_rich(&self) -> bool {
        !self.runs.is_empty()
    }
}

/// A run of rich text sharing one font
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct RichTextRun {
    pub text: String,
    /// Run properties; `None` inherits the cell font
    pub font: Option<RunFont>,
}

impl RichTextRun {
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            font: None,
        }
    }

    pub fn with_font(mut self, font: RunFont) -> Self {
        self.font = Some(font);
        self
    }
}

/// Font overrides of a rich text run
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunFont {
    pub name: Option<String>,
    pub size: Option<f64>,
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub underline: Underline,
    pub color: Option<Color>,
    /// "superscript" or "subscript"
    pub vert_align: Option<String>,
}

impl Hash for RunFont {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.size.map(f64::to_bits).hash(state);
        self.bold.hash(state);
        self.italic.hash(state);
        self.strike.hash(state);
        self.underline.hash(state);
        self.color.hash(state);
        self.vert_align.hash(state);
    }
}

impl Eq for RunFont {}

/// Append-only deduplicating pool of [`SharedStringItem`]s
#[derive(Debug, Clone, Default)]
pub struct SharedStringTable {
    items: Vec<SharedStringItem>,
    /// Item hash -> indices with that hash
    buckets: AHashMap<u64, Vec<u32>>,
}

fn item_hash(item: &SharedStringItem) -> u64 {
    let mut hasher = ahash::AHasher::default();
    item.hash(&mut hasher);
    hasher.finish()
}

impl SharedStringTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a table from items read out of a part, keeping every position
    ///
    /// Files may legally contain the same string twice. Both positions stay
    /// addressable; later interning resolves to the first occurrence.
    pub fn from_items(items: Vec<SharedStringItem>) -> Self {
        let mut buckets: AHashMap<u64, Vec<u32>> = AHashMap::with_capacity(items.len());
        for (idx, item) in items.iter().enumerate() {
            let bucket = buckets.entry(item_hash(item)).or_default();
            if !bucket.iter().any(|&i| items[i as usize] == *item) {
                bucket.push(idx as u32);
            }
        }
        Self { items, buckets }
    }

    /// Return the index of an equal entry, appending one if needed
    pub fn intern<S: Into<String>>(&mut self, text: S, runs: Vec<RichTextRun>) -> u32 {
        self.intern_item(SharedStringItem {
            text: text.into(),
            runs,
        })
    }

    /// Like [`SharedStringTable::intern`] for an already built item
    pub fn intern_item(&mut self, item: SharedStringItem) -> u32 {
        let hash = item_hash(&item);
        if let Some(idx) = self.find_hashed(hash, &item) {
            return idx;
        }

        let idx = self.items.len() as u32;
        self.items.push(item);
        self.buckets.entry(hash).or_default().push(idx);
        idx
    }

    /// Index of an equal entry, without adding one
    pub fn find(&self, item: &SharedStringItem) -> Option<u32> {
        self.find_hashed(item_hash(item), item)
    }

    fn find_hashed(&self, hash: u64, item: &SharedStringItem) -> Option<u32> {
        self.buckets
            .get(&hash)?
            .iter()
            .find(|&&i| self.items[i as usize] == *item)
            .copied()
    }

    /// Look up an entry by index
    pub fn resolve(&self, index: u32) -> Result<&SharedStringItem> {
        self.items
            .get(index as usize)
            .ok_or(Error::InvalidStringIndex(index))
    }

    /// Number of assigned indices
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of structurally distinct entries
    pub fn unique_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &SharedStringItem)> {
        self.items.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}
