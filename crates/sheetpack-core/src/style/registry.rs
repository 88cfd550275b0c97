//! Style registry for deduplication

use super::Style;
use crate::error::{Error, Result};
use ahash::AHashMap;

/// Deduplicating pool of cell styles
///
/// Cells reference styles by id. Id 0 is the default style and always
/// exists; every other id is handed out in increasing order and never reused.
#[derive(Debug, Clone)]
pub struct StyleRegistry {
    /// All registered styles, indexed by id
    styles: Vec<Style>,
    /// Style hash -> ids with that hash
    buckets: AHashMap<StyleKey, Vec<u32>>,
}

/// Key for style lookup (hash-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct StyleKey(u64);

impl StyleKey {
    fn from_style(style: &Style) -> Self {
        use std::hash::{Hash, Hasher};
        let mut hasher = ahash::AHasher::default();
        style.hash(&mut hasher);
        StyleKey(hasher.finish())
    }
}

impl StyleRegistry {
    /// Create a registry holding only the default style at id 0
    pub fn new() -> Self {
        Self::from_styles(Vec::new())
    }

    /// Build a registry from styles read out of a part, keeping their ids
    ///
    /// An empty list yields a registry with just the default style.
    pub fn from_styles(styles: Vec<Style>) -> Self {
        Self::from_styles_with(styles, |_| true)
    }

    /// Like [`StyleRegistry::from_styles`], but ids for which `reusable`
    /// returns false are never handed out by [`StyleRegistry::register`]
    ///
    /// For entries whose stored form says more than their [`Style`] does.
    pub fn from_styles_with(mut styles: Vec<Style>, reusable: impl Fn(u32) -> bool) -> Self {
        if styles.is_empty() {
            styles.push(Style::default());
        }

        let mut buckets: AHashMap<StyleKey, Vec<u32>> = AHashMap::with_capacity(styles.len());
        for (idx, style) in styles.iter().enumerate() {
            if !reusable(idx as u32) {
                continue;
            }
            let bucket = buckets.entry(StyleKey::from_style(style)).or_default();
            if !bucket.iter().any(|&i| styles[i as usize] == *style) {
                bucket.push(idx as u32);
            }
        }

        Self { styles, buckets }
    }

    /// Return the id of an equal style, registering it if needed
    pub fn register(&mut self, style: Style) -> u32 {
        let key = StyleKey::from_style(&style);

        if let Some(bucket) = self.buckets.get(&key) {
            // Equal hashes are not proof of equal styles
            if let Some(&id) = bucket.iter().find(|&&i| self.styles[i as usize] == style) {
                return id;
            }
        }

        let id = self.styles.len() as u32;
        self.styles.push(style);
        self.buckets.entry(key).or_default().push(id);
        id
    }

    /// Look up a style by id
    pub fn resolve(&self, id: u32) -> Result<&Style> {
        self.styles
            .get(id as usize)
            .ok_or(Error::InvalidStyleIndex(id))
    }

    /// Check that `id` names a registered style
    pub fn contains(&self, id: u32) -> bool {
        (id as usize) < self.styles.len()
    }

    /// The style at id 0
    pub fn default_style(&self) -> &Style {
        &self.styles[0]
    }

    /// Number of registered styles, including the default
    pub fn len(&self) -> usize {
        self.styles.len()
    }

    /// True when only the default style is registered
    pub fn is_empty(&self) -> bool {
        self.styles.len() <= 1
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Style)> {
        self.styles.iter().enumerate().map(|(i, s)| (i as u32, s))
    }
}

impl Default for StyleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::style::{BorderEdge, BorderLineStyle, BorderStyle, Color};

    #[test]
    fn test_default_style() {
        let mut registry = StyleRegistry::new();
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.resolve(0).unwrap(), &Style::default());
        assert_eq!(registry.register(Style::default()), 0);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_deduplication() {
        let mut registry = StyleRegistry::new();

        let bold = registry.register(Style::new().bold(true));
        let bold_again = registry.register(Style::new().bold(true));
        let italic = registry.register(Style::new().italic(true));

        assert_eq!(bold, bold_again);
        assert_eq!(bold, 1);
        assert_eq!(italic, 2);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_ids_strictly_increase() {
        let mut registry = StyleRegistry::new();
        let mut last = 0;
        for size in [9.0, 10.0, 12.0, 14.0] {
            let id = registry.register(Style::new().font_size(size));
            assert!(id > last);
            last = id;
        }
    }

    #[test]
    fn test_complex_styles() {
        let mut registry = StyleRegistry::new();

        let style = Style::new()
            .bold(true)
            .fill_color(Color::YELLOW)
            .number_format("0.000")
            .border(BorderStyle::all(BorderEdge::new(
                BorderLineStyle::Thin,
                Color::BLACK,
            )));

        let id = registry.register(style.clone());
        assert!(id > 0);
        assert_eq!(registry.resolve(id).unwrap(), &style);
        assert_eq!(registry.resolve(id + 1), Err(Error::InvalidStyleIndex(id + 1)));
    }

    #[test]
    fn test_from_styles_keeps_positions() {
        let bold = Style::new().bold(true);
        let registry =
            StyleRegistry::from_styles(vec![Style::default(), bold.clone(), bold.clone()]);
        assert_eq!(registry.len(), 3);

        let mut registry = registry;
        assert_eq!(registry.register(bold), 1);
    }

    #[test]
    fn test_opaque_ids_are_not_reused() {
        let percent = Style::new().number_format("0.0%");
        let mut registry =
            StyleRegistry::from_styles_with(vec![Style::default(), percent.clone()], |id| id != 1);
        assert_eq!(registry.resolve(1).unwrap(), &percent);
        assert_eq!(registry.register(percent.clone()), 2);
        assert_eq!(registry.register(percent), 2);
    }
}
