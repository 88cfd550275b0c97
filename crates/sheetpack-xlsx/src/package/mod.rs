//! The package store
//!
//! A [`Package`] owns every part of an archive as raw bytes keyed by path.
//! Typed views are decoded on demand and cached next to the bytes they came
//! from. An absent part decodes to its default value; a present part that
//! does not decode is an error.

pub mod manifest;

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use sheetpack_core::{SharedStringTable, StyleRegistry};

use crate::codec::{decode_part, XmlPart, XML_HEADER};
use crate::docprops::{self, APP_PROPS_PATH, CORE_PROPS_PATH};
use crate::error::{XlsxError, XlsxResult};
use crate::shared_strings::SharedStrings;
use crate::styles::StyleSheet;
use crate::Options;
use manifest::{
    ContentTypes, Relationships, CONTENT_TYPES_PATH, CT_APP_PROPS, CT_CORE_PROPS, CT_RELATIONSHIPS,
    CT_SHARED_STRINGS, CT_STYLES, CT_WORKBOOK, CT_WORKSHEET, CT_XML, REL_APP_PROPS, REL_CORE_PROPS,
    REL_OFFICE_DOCUMENT, REL_SHARED_STRINGS, REL_STYLES, REL_WORKSHEET, ROOT_RELS_PATH,
};

pub const WORKBOOK_PATH: &str = "xl/workbook.xml";
pub const SHARED_STRINGS_PATH: &str = "xl/sharedStrings.xml";
pub const STYLES_PATH: &str = "xl/styles.xml";

const NS_MAIN: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

/// One stored part
struct Part {
    raw: Arc<[u8]>,
    /// Typed value decoded from `raw`
    decoded: Option<Box<dyn Any + Send + Sync>>,
    /// Changed since the package was read or last saved
    dirty: bool,
}

impl Part {
    fn new(raw: Arc<[u8]>, dirty: bool) -> Self {
        Self {
            raw,
            decoded: None,
            dirty,
        }
    }
}

/// A part type that backs one of the workbook-wide pools
trait PoolPart: XmlPart + Send + 'static {
    const REL_TYPE: &'static str;
    const CONTENT_TYPE: &'static str;
    const DEFAULT_PATH: &'static str;

    /// What callers of the pool get to see and grow
    type Entries;

    fn entries(&mut self) -> &mut Self::Entries;

    fn pool_len(&self) -> usize;
}

impl PoolPart for SharedStrings {
    const REL_TYPE: &'static str = REL_SHARED_STRINGS;
    const CONTENT_TYPE: &'static str = CT_SHARED_STRINGS;
    const DEFAULT_PATH: &'static str = SHARED_STRINGS_PATH;

    type Entries = SharedStringTable;

    fn entries(&mut self) -> &mut SharedStringTable {
        self.table_mut()
    }

    fn pool_len(&self) -> usize {
        self.table().len()
    }
}

impl PoolPart for StyleSheet {
    const REL_TYPE: &'static str = REL_STYLES;
    const CONTENT_TYPE: &'static str = CT_STYLES;
    const DEFAULT_PATH: &'static str = STYLES_PATH;

    type Entries = StyleRegistry;

    fn entries(&mut self) -> &mut StyleRegistry {
        self.registry_mut()
    }

    fn pool_len(&self) -> usize {
        self.registry().len()
    }
}

/// A loaded pool and the part it came from
struct Pool<T> {
    path: String,
    value: T,
    /// Entries present when the pool was loaded or last flushed
    flushed_len: usize,
}

/// An in-memory OOXML package
///
/// All methods take `&self`; a package can be shared between threads.
/// Concurrent writes to the same part are last-writer-wins, and there is no
/// atomicity across parts.
pub struct Package {
    parts: RwLock<HashMap<String, Part>>,
    shared_strings: Mutex<Option<Pool<SharedStrings>>>,
    styles: Mutex<Option<Pool<StyleSheet>>>,
    /// Parts with an open stream writer
    sessions: Mutex<HashSet<String>>,
    path: Mutex<Option<PathBuf>>,
    options: Options,
}

/// Strip a leading `/` and use forward slashes
pub fn canonical_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

impl Package {
    /// Create a package holding an empty one-sheet workbook
    pub fn new() -> Self {
        let package = Self::empty(Options::default(), None);

        let mut content_types = ContentTypes::default();
        content_types.ensure_default("rels", CT_RELATIONSHIPS);
        content_types.ensure_default("xml", CT_XML);
        content_types.set_override(WORKBOOK_PATH, CT_WORKBOOK);
        content_types.set_override("xl/worksheets/sheet1.xml", CT_WORKSHEET);
        content_types.set_override(STYLES_PATH, CT_STYLES);
        content_types.set_override(CORE_PROPS_PATH, CT_CORE_PROPS);
        content_types.set_override(APP_PROPS_PATH, CT_APP_PROPS);

        let mut root_rels = Relationships::default();
        root_rels.add(REL_OFFICE_DOCUMENT, WORKBOOK_PATH);
        root_rels.add(REL_CORE_PROPS, CORE_PROPS_PATH);
        root_rels.add(REL_APP_PROPS, APP_PROPS_PATH);

        let mut workbook_rels = Relationships::default();
        workbook_rels.add(REL_WORKSHEET, "worksheets/sheet1.xml");
        workbook_rels.add(REL_STYLES, "styles.xml");

        let now = chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

        let templates = [
            (CONTENT_TYPES_PATH, content_types.to_xml()),
            (ROOT_RELS_PATH, root_rels.to_xml()),
            (APP_PROPS_PATH, docprops::app_template()),
            (CORE_PROPS_PATH, docprops::core_template(&now)),
            (WORKBOOK_PATH, workbook_template()),
            ("xl/_rels/workbook.xml.rels", workbook_rels.to_xml()),
            ("xl/worksheets/sheet1.xml", worksheet_template()),
            (STYLES_PATH, StyleRegistry::new().to_xml()),
        ];
        {
            let mut parts = package.parts.write();
            for (path, xml) in templates {
                parts.insert(path.to_string(), Part::new(xml.into_bytes().into(), true));
            }
        }
        package
    }

    fn empty(options: Options, path: Option<PathBuf>) -> Self {
        Self {
            parts: RwLock::new(HashMap::new()),
            shared_strings: Mutex::new(None),
            styles: Mutex::new(None),
            sessions: Mutex::new(HashSet::new()),
            path: Mutex::new(path),
            options,
        }
    }

    /// Open a package file
    pub fn open<P: AsRef<Path>>(path: P) -> XlsxResult<Self> {
        Self::open_with(path, Options::default())
    }

    /// Open a package file with options
    pub fn open_with<P: AsRef<Path>>(path: P, options: Options) -> XlsxResult<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let package = Self::read_with(BufReader::new(file), options)?;
        *package.path.lock() = Some(path.to_path_buf());
        Ok(package)
    }

    /// Read a package from any seekable reader
    pub fn read<R: Read + Seek>(reader: R) -> XlsxResult<Self> {
        Self::read_with(reader, Options::default())
    }

    /// Read a package from any seekable reader with options
    pub fn read_with<R: Read + Seek>(reader: R, options: Options) -> XlsxResult<Self> {
        let mut archive = zip::ZipArchive::new(reader)?;
        let mut parts = HashMap::with_capacity(archive.len());
        let mut total: u64 = 0;

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            if file.is_dir() {
                continue;
            }
            let name = canonical_path(file.name());

            // Declared sizes can lie; the read below is capped as well
            if file.size() > options.part_size_limit {
                return Err(XlsxError::SizeLimit {
                    part: name,
                    limit: options.part_size_limit,
                });
            }

            let mut buf = Vec::with_capacity(file.size() as usize);
            file.take(options.part_size_limit + 1).read_to_end(&mut buf)?;
            if buf.len() as u64 > options.part_size_limit {
                return Err(XlsxError::SizeLimit {
                    part: name,
                    limit: options.part_size_limit,
                });
            }

            total += buf.len() as u64;
            if total > options.unzip_size_limit {
                return Err(XlsxError::SizeLimit {
                    part: name,
                    limit: options.unzip_size_limit,
                });
            }

            parts.insert(name, Part::new(buf.into(), false));
        }

        if !parts.contains_key(CONTENT_TYPES_PATH) {
            return Err(XlsxError::InvalidFormat(format!(
                "{} not found",
                CONTENT_TYPES_PATH
            )));
        }

        let package = Self::empty(options, None);
        let count = parts.len();
        *package.parts.write() = parts;

        let workbook = package.workbook_path()?;
        if !package.contains(&workbook) {
            return Err(XlsxError::MissingPart(workbook));
        }

        log::debug!("read package with {} parts ({} bytes)", count, total);
        Ok(package)
    }

    /// Options the package was opened with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// File the package was opened from or last saved to
    pub fn path(&self) -> Option<PathBuf> {
        self.path.lock().clone()
    }

    /// Raw bytes of a part; `None` when the part is absent
    pub fn get(&self, path: &str) -> Option<Arc<[u8]>> {
        self.parts
            .read()
            .get(&canonical_path(path))
            .map(|part| part.raw.clone())
    }

    /// Store raw bytes for a part, replacing anything there
    pub fn put_raw<B: Into<Arc<[u8]>>>(&self, path: &str, bytes: B) {
        let path = canonical_path(path);
        self.store(&path, bytes.into(), None);
        self.invalidate_pools(&path);
    }

    /// Make a part absent
    pub fn remove(&self, path: &str) -> bool {
        let path = canonical_path(path);
        let removed = self.parts.write().remove(&path).is_some();
        self.invalidate_pools(&path);
        removed
    }

    pub fn contains(&self, path: &str) -> bool {
        self.parts.read().contains_key(&canonical_path(path))
    }

    /// All part paths, sorted
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.parts.read().keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn is_dirty(&self, path: &str) -> bool {
        self.parts
            .read()
            .get(&canonical_path(path))
            .is_some_and(|part| part.dirty)
    }

    /// Paths changed since the package was read or saved, sorted
    pub fn dirty_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .parts
            .read()
            .iter()
            .filter(|(_, part)| part.dirty)
            .map(|(path, _)| path.clone())
            .collect();
        paths.sort();
        paths
    }

    /// Decode a part into its typed view
    ///
    /// An absent part yields `T::default()`. Present bytes that fail the
    /// charset pipeline or the parser are an error.
    pub fn decode<T>(&self, path: &str) -> XlsxResult<T>
    where
        T: XmlPart + Clone + Send + Sync + 'static,
    {
        let path = canonical_path(path);
        let raw = {
            let parts = self.parts.read();
            let Some(part) = parts.get(&path) else {
                return Ok(T::default());
            };
            if let Some(value) = part.decoded.as_ref().and_then(|d| d.downcast_ref::<T>()) {
                return Ok(value.clone());
            }
            part.raw.clone()
        };

        let value: T = decode_part(&raw)?;
        log::debug!("decoded {} ({} bytes)", path, raw.len());

        let mut parts = self.parts.write();
        if let Some(part) = parts.get_mut(&path) {
            // Skip the cache if the bytes were replaced meanwhile
            if Arc::ptr_eq(&part.raw, &raw) {
                part.decoded = Some(Box::new(value.clone()));
            }
        }
        Ok(value)
    }

    /// Serialize a typed view and store it as the part's bytes
    pub fn encode<T>(&self, path: &str, value: &T)
    where
        T: XmlPart + Clone + Send + Sync + 'static,
    {
        let path = canonical_path(path);
        let raw: Arc<[u8]> = value.to_xml().into_bytes().into();
        self.store(&path, raw, Some(Box::new(value.clone())));
        self.invalidate_pools(&path);
    }

    fn store(&self, path: &str, raw: Arc<[u8]>, decoded: Option<Box<dyn Any + Send + Sync>>) {
        let mut part = Part::new(raw, true);
        part.decoded = decoded;
        self.parts.write().insert(path.to_string(), part);
    }

    /// Run `f` against the workbook's shared string table
    ///
    /// The table is loaded from its part on first use. `f` must not call back
    /// into the package.
    pub fn with_shared_strings<R>(
        &self,
        f: impl FnOnce(&mut SharedStringTable) -> R,
    ) -> XlsxResult<R> {
        self.with_pool(&self.shared_strings, f)
    }

    /// Run `f` against the workbook's style registry
    ///
    /// The registry is loaded from its part on first use. `f` must not call
    /// back into the package.
    pub fn with_styles<R>(&self, f: impl FnOnce(&mut StyleRegistry) -> R) -> XlsxResult<R> {
        self.with_pool(&self.styles, f)
    }

    fn with_pool<T: PoolPart, R>(
        &self,
        slot: &Mutex<Option<Pool<T>>>,
        f: impl FnOnce(&mut T::Entries) -> R,
    ) -> XlsxResult<R> {
        let mut guard = slot.lock();
        let pool = match guard.take() {
            Some(pool) => pool,
            None => self.load_pool::<T>()?,
        };
        let pool = guard.insert(pool);
        Ok(f(pool.value.entries()))
    }

    fn load_pool<T: PoolPart>(&self) -> XlsxResult<Pool<T>> {
        let path = self
            .workbook_related_path(T::REL_TYPE)?
            .unwrap_or_else(|| T::DEFAULT_PATH.to_string());
        let value: T = match self.get(&path) {
            Some(raw) => decode_part(&raw)?,
            None => T::default(),
        };
        let flushed_len = value.pool_len();
        log::debug!("loaded {} with {} entries", path, flushed_len);
        Ok(Pool {
            path,
            value,
            flushed_len,
        })
    }

    fn invalidate_pools(&self, path: &str) {
        let mut sst = self.shared_strings.lock();
        if sst.as_ref().is_some_and(|pool| pool.path == path) {
            *sst = None;
        }
        drop(sst);
        let mut styles = self.styles.lock();
        if styles.as_ref().is_some_and(|pool| pool.path == path) {
            *styles = None;
        }
    }

    /// Write a pool back to its part if it grew
    fn flush_pool<T: PoolPart>(&self, slot: &Mutex<Option<Pool<T>>>) -> XlsxResult<()> {
        let (path, xml) = {
            let mut guard = slot.lock();
            let Some(pool) = guard.as_mut() else {
                return Ok(());
            };
            if pool.value.pool_len() <= pool.flushed_len {
                return Ok(());
            }
            pool.flushed_len = pool.value.pool_len();
            (pool.path.clone(), pool.value.to_xml())
        };

        self.store(&path, xml.into_bytes().into(), None);
        self.link_workbook_part(&path, T::CONTENT_TYPE, T::REL_TYPE)?;
        Ok(())
    }

    pub(crate) fn begin_session(&self, path: &str) -> XlsxResult<()> {
        if !self.sessions.lock().insert(path.to_string()) {
            return Err(XlsxError::SessionOpen(path.to_string()));
        }
        Ok(())
    }

    pub(crate) fn end_session(&self, path: &str) {
        self.sessions.lock().remove(path);
    }

    /// Save to the file the package was opened from
    pub fn save(&self) -> XlsxResult<()> {
        let path = self.path().ok_or(XlsxError::NoPath)?;
        self.save_as(path)
    }

    /// Save to a new file, which becomes the package's path
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> XlsxResult<()> {
        let path = path.as_ref();
        // Check before touching the file system
        self.check_no_sessions()?;
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))?;
        *self.path.lock() = Some(path.to_path_buf());
        Ok(())
    }

    /// Write the package as a zip archive
    ///
    /// `[Content_Types].xml` comes first, the other parts follow sorted by path.
    pub fn write_to<W: Write + Seek>(&self, writer: W) -> XlsxResult<()> {
        self.check_no_sessions()?;
        self.flush_pool(&self.shared_strings)?;
        self.flush_pool(&self.styles)?;

        let mut entries: Vec<(String, Arc<[u8]>)> = self
            .parts
            .read()
            .iter()
            .map(|(path, part)| (path.clone(), part.raw.clone()))
            .collect();
        entries.sort_by(|(a, _), (b, _)| {
            (a != CONTENT_TYPES_PATH)
                .cmp(&(b != CONTENT_TYPES_PATH))
                .then_with(|| a.cmp(b))
        });

        let mut zip = zip::ZipWriter::new(writer);
        let options = zip::write::SimpleFileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);
        let mut total = 0usize;
        for (path, raw) in &entries {
            zip.start_file(path.as_str(), options)?;
            zip.write_all(raw)?;
            total += raw.len();
        }
        zip.finish()?;

        for part in self.parts.write().values_mut() {
            part.dirty = false;
        }
        log::debug!("wrote package with {} parts ({} bytes)", entries.len(), total);
        Ok(())
    }

    fn check_no_sessions(&self) -> XlsxResult<()> {
        match self.sessions.lock().iter().next() {
            Some(path) => Err(XlsxError::SessionOpen(path.clone())),
            None => Ok(()),
        }
    }

    /// Release the package
    pub fn close(self) {
        let dirty = self.dirty_paths();
        if !dirty.is_empty() {
            log::debug!("closing package with {} unsaved parts", dirty.len());
        }
    }
}

impl Default for Package {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("path", &self.path())
            .field("parts", &self.paths())
            .field("options", &self.options)
            .finish()
    }
}

fn workbook_template() -> String {
    format!(
        "{}<workbook xmlns=\"{}\" xmlns:r=\"{}\"><bookViews><workbookView xWindow=\"0\" yWindow=\"0\" windowWidth=\"16384\" windowHeight=\"8192\"/></bookViews><sheets><sheet name=\"Sheet1\" sheetId=\"1\" r:id=\"rId1\"/></sheets></workbook>",
        XML_HEADER, NS_MAIN, NS_R
    )
}

pub(crate) fn worksheet_template() -> String {
    format!(
        "{}<worksheet xmlns=\"{}\" xmlns:r=\"{}\"><dimension ref=\"A1\"/><sheetData/></worksheet>",
        XML_HEADER, NS_MAIN, NS_R
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Cursor;

    fn zip_of(entries: &[(&str, &[u8])]) -> Cursor<Vec<u8>> {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        let mut cursor = zip.finish().unwrap();
        cursor.set_position(0);
        cursor
    }

    const CT: &[u8] = br#"<?xml version="1.0"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="xml" ContentType="application/xml"/></Types>"#;
    const WB: &[u8] = br#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheets/></workbook>"#;

    #[test]
    fn test_new_package_has_templates() {
        let package = Package::new();
        for path in [
            CONTENT_TYPES_PATH,
            ROOT_RELS_PATH,
            WORKBOOK_PATH,
            STYLES_PATH,
            "xl/worksheets/sheet1.xml",
            APP_PROPS_PATH,
            CORE_PROPS_PATH,
        ] {
            assert!(package.contains(path), "{path}");
        }
        assert!(package.is_dirty(WORKBOOK_PATH));
        assert_eq!(package.sheet_names().unwrap(), vec!["Sheet1".to_string()]);
    }

    #[test]
    fn test_get_absent_and_empty() {
        let package = Package::new();
        assert!(package.get("xl/nothing.xml").is_none());
        package.put_raw("xl/empty.xml", Vec::new());
        assert_eq!(package.get("/xl/empty.xml").unwrap().len(), 0);
        assert!(package.remove("xl/empty.xml"));
        assert!(package.get("xl/empty.xml").is_none());
    }

    #[test]
    fn test_paths_are_canonical() {
        let package = Package::new();
        package.put_raw("\\custom\\a.xml", b"<a/>".to_vec());
        assert!(package.contains("custom/a.xml"));
        assert!(package.contains("/custom/a.xml"));
    }

    #[test]
    fn test_decode_absent_is_default() {
        let package = Package::new();
        let rels: Relationships = package.decode("xl/_rels/none.rels").unwrap();
        assert!(rels.items.is_empty());
    }

    #[test]
    fn test_decode_malformed_is_error() {
        let package = Package::new();
        package.put_raw("_rels/.rels", b"<Relationships><Rel".to_vec());
        let err = package.decode::<Relationships>("_rels/.rels").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }

    #[test]
    fn test_put_raw_drops_cache() {
        let package = Package::new();
        let before: Relationships = package.decode(ROOT_RELS_PATH).unwrap();
        assert_eq!(before.items.len(), 3);

        let mut rels = Relationships::default();
        rels.add(REL_OFFICE_DOCUMENT, WORKBOOK_PATH);
        package.put_raw(ROOT_RELS_PATH, rels.to_xml().into_bytes());

        let after: Relationships = package.decode(ROOT_RELS_PATH).unwrap();
        assert_eq!(after.items.len(), 1);
    }

    #[test]
    fn test_read_requires_content_types() {
        let err = Package::read(zip_of(&[("xl/workbook.xml", WB)])).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_read_requires_workbook() {
        let err = Package::read(zip_of(&[(CONTENT_TYPES_PATH, CT)])).unwrap_err();
        assert!(matches!(err, XlsxError::MissingPart(ref p) if p == WORKBOOK_PATH));
    }

    #[test]
    fn test_read_not_a_zip() {
        let err = Package::read(Cursor::new(b"not a zip".to_vec())).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_part_size_limit() {
        let options = Options {
            part_size_limit: 16,
            ..Options::default()
        };
        let err = Package::read_with(
            zip_of(&[(CONTENT_TYPES_PATH, CT), (WORKBOOK_PATH, WB)]),
            options,
        )
        .unwrap_err();
        assert!(matches!(err, XlsxError::SizeLimit { limit: 16, .. }));
    }

    #[test]
    fn test_unzip_size_limit() {
        let options = Options {
            unzip_size_limit: (CT.len() + 10) as u64,
            ..Options::default()
        };
        let err = Package::read_with(
            zip_of(&[(CONTENT_TYPES_PATH, CT), (WORKBOOK_PATH, WB)]),
            options,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Archive);
    }

    #[test]
    fn test_write_orders_content_types_first() {
        let package = Package::new();
        let mut out = Cursor::new(Vec::new());
        package.write_to(&mut out).unwrap();
        assert!(package.dirty_paths().is_empty());

        out.set_position(0);
        let mut archive = zip::ZipArchive::new(out).unwrap();
        let mut archive_order: Vec<String> = Vec::new();
        for i in 0..archive.len() {
            archive_order.push(archive.by_index(i).unwrap().name().to_string());
        }
        assert_eq!(archive_order.len(), package.paths().len());
        assert_eq!(archive_order[0], CONTENT_TYPES_PATH);
        let mut rest = archive_order[1..].to_vec();
        rest.sort();
        assert_eq!(rest, archive_order[1..].to_vec());
    }

    #[test]
    fn test_save_without_path() {
        let package = Package::new();
        assert!(matches!(package.save(), Err(XlsxError::NoPath)));
    }

    #[test]
    fn test_pools_flush_on_save() {
        let package = Package::new();
        let idx = package
            .with_shared_strings(|sst| sst.intern("hello", Vec::new()))
            .unwrap();
        assert_eq!(idx, 0);
        assert!(!package.contains(SHARED_STRINGS_PATH));

        let mut out = Cursor::new(Vec::new());
        package.write_to(&mut out).unwrap();
        assert!(package.contains(SHARED_STRINGS_PATH));

        out.set_position(0);
        let reread = Package::read(out).unwrap();
        let text = reread
            .with_shared_strings(|sst| sst.resolve(0).map(|item| item.text.clone()))
            .unwrap()
            .unwrap();
        assert_eq!(text, "hello");
        let ct: ContentTypes = reread.decode(CONTENT_TYPES_PATH).unwrap();
        assert!(ct.has_override(SHARED_STRINGS_PATH));
    }

    #[test]
    fn test_package_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Package>();
    }
}
