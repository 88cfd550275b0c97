//! Document properties (`docProps/app.xml` and `docProps/core.xml`)
//!
//! Both parts are flat lists of property elements. They are read into a
//! [`PropertyBag`] so that properties this crate does not model survive an
//! update untouched.

use quick_xml::events::Event;

use crate::codec::{escape_attr, escape_text, parse_bool, XmlCursor, XmlPart, XML_HEADER};
use crate::error::{DecodeError, XlsxResult};
use crate::package::Package;

pub const APP_PROPS_PATH: &str = "docProps/app.xml";
pub const CORE_PROPS_PATH: &str = "docProps/core.xml";

const NS_EXTENDED: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";
const NS_VT: &str = "http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes";
const NS_CP: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_DC: &str = "http://purl.org/dc/elements/1.1/";
const NS_DCTERMS: &str = "http://purl.org/dc/terms/";
const NS_DCMITYPE: &str = "http://purl.org/dc/dcmitype/";
const NS_XSI: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Element order of the extended-properties schema
const APP_ORDER: &[&str] = &[
    "Template",
    "Manager",
    "Company",
    "Pages",
    "Words",
    "Characters",
    "PresentationFormat",
    "Lines",
    "Paragraphs",
    "Slides",
    "Notes",
    "TotalTime",
    "HiddenSlides",
    "MMClips",
    "ScaleCrop",
    "HeadingPairs",
    "TitlesOfParts",
    "LinksUpToDate",
    "CharactersWithSpaces",
    "SharedDoc",
    "HyperlinkBase",
    "HLinks",
    "HyperlinksChanged",
    "DigSig",
    "Application",
    "AppVersion",
    "DocSecurity",
];

/// Extended properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AppProperties {
    pub application: String,
    pub scale_crop: bool,
    pub doc_security: i32,
    pub company: String,
    pub links_up_to_date: bool,
    pub hyperlinks_changed: bool,
    pub app_version: String,
}

/// Core properties
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DocProperties {
    pub category: String,
    pub content_status: String,
    /// W3CDTF timestamp
    pub created: String,
    pub creator: String,
    pub description: String,
    pub identifier: String,
    pub keywords: String,
    pub last_modified_by: String,
    /// W3CDTF timestamp
    pub modified: String,
    pub revision: String,
    pub subject: String,
    pub title: String,
    pub language: String,
    pub version: String,
}

/// Content of a property element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyBody {
    Text(String),
    /// An element with nested markup, kept verbatim
    Raw(String),
}

/// One child element of a property part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    /// Qualified name as written
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub body: PropertyBody,
    /// Source line, 0 for properties added in memory
    pub line: u64,
}

impl Property {
    pub fn local_name(&self) -> &str {
        self.name
            .split_once(':')
            .map(|(_, local)| local)
            .unwrap_or(&self.name)
    }

    fn text(&self) -> Option<&str> {
        match &self.body {
            PropertyBody::Text(t) => Some(t),
            PropertyBody::Raw(_) => None,
        }
    }
}

/// A property part: a root element and its children in document order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertyBag {
    pub root: String,
    pub root_attrs: Vec<(String, String)>,
    pub properties: Vec<Property>,
}

impl PropertyBag {
    fn parse(xml: &str, expected_root: &str) -> Result<Self, DecodeError> {
        let mut cursor = XmlCursor::new(xml);
        let (root, empty) = cursor.root(expected_root)?;
        let mut bag = PropertyBag {
            root: String::from_utf8_lossy(root.name().as_ref()).into_owned(),
            root_attrs: cursor.attrs(&root)?,
            properties: Vec::new(),
        };
        if empty {
            return Ok(bag);
        }

        loop {
            let begin = cursor.position();
            match cursor.next()? {
                Event::Empty(e) => bag.properties.push(Property {
                    name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                    attrs: cursor.attrs(&e)?,
                    body: PropertyBody::Text(String::new()),
                    line: cursor.line(),
                }),
                Event::Start(e) => {
                    let line = cursor.line();
                    let attrs = cursor.attrs(&e)?;
                    let mut text = String::new();
                    let mut nested = false;
                    let mut depth = 0usize;
                    loop {
                        match cursor.next()? {
                            Event::Text(t) if depth == 0 => {
                                text.push_str(&t.unescape().map_err(|err| cursor.error(err.to_string()))?);
                            }
                            Event::CData(c) if depth == 0 => {
                                text.push_str(&String::from_utf8_lossy(&c));
                            }
                            Event::Start(_) => {
                                nested = true;
                                depth += 1;
                            }
                            Event::Empty(_) => nested = true,
                            Event::End(_) if depth == 0 => break,
                            Event::End(_) => depth -= 1,
                            Event::Eof => return Err(cursor.error("unexpected EOF")),
                            _ => {}
                        }
                    }
                    let body = if nested {
                        PropertyBody::Raw(cursor.slice(begin, cursor.position()).to_string())
                    } else {
                        PropertyBody::Text(text)
                    };
                    bag.properties.push(Property {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        attrs,
                        body,
                        line,
                    });
                }
                Event::End(_) => break,
                Event::Eof => return Err(cursor.error("unexpected EOF")),
                _ => {}
            }
        }
        Ok(bag)
    }

    pub fn get(&self, local: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.local_name() == local)
    }

    /// Prefix bound to `ns` on the root, declaring `preferred` if there is none
    fn prefix_for(&mut self, ns: &str, preferred: &str) -> String {
        for (key, value) in &self.root_attrs {
            if value == ns {
                if let Some(prefix) = key.strip_prefix("xmlns:") {
                    return prefix.to_string();
                }
                if key == "xmlns" {
                    return String::new();
                }
            }
        }
        let key = if preferred.is_empty() {
            if self.root_attrs.iter().any(|(k, _)| k == "xmlns") {
                return String::new();
            }
            "xmlns".to_string()
        } else {
            format!("xmlns:{}", preferred)
        };
        self.root_attrs.push((key, ns.to_string()));
        preferred.to_string()
    }

    /// Set a property's text, adding it if missing
    ///
    /// A new property goes before the first existing one that follows it in
    /// `order`; properties not in `order` are appended.
    fn set(
        &mut self,
        (ns, preferred, local): (&str, &str, &str),
        value: String,
        attrs: Vec<(String, String)>,
        order: &[&str],
    ) {
        if let Some(prop) = self.properties.iter_mut().find(|p| p.local_name() == local) {
            prop.body = PropertyBody::Text(value);
            if !attrs.is_empty() {
                prop.attrs = attrs;
            }
            return;
        }

        let prefix = self.prefix_for(ns, preferred);
        let name = if prefix.is_empty() {
            local.to_string()
        } else {
            format!("{}:{}", prefix, local)
        };
        let prop = Property {
            name,
            attrs,
            body: PropertyBody::Text(value),
            line: 0,
        };

        let rank = |name: &str| order.iter().position(|o| *o == name);
        let at = rank(local).map(|mine| {
            let before = self
                .properties
                .iter()
                .rposition(|p| rank(p.local_name()).is_some_and(|theirs| theirs < mine));
            match before {
                Some(i) => i + 1,
                None => self
                    .properties
                    .iter()
                    .position(|p| rank(p.local_name()).is_some())
                    .unwrap_or(self.properties.len()),
            }
        });
        match at {
            Some(at) => self.properties.insert(at, prop),
            None => self.properties.push(prop),
        }
    }

    fn text(&self, local: &str) -> String {
        self.get(local)
            .and_then(Property::text)
            .unwrap_or_default()
            .to_string()
    }

    fn parse_value<T>(
        &self,
        local: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<Option<T>, DecodeError> {
        let Some(prop) = self.get(local) else {
            return Ok(None);
        };
        let text = prop.text().unwrap_or_default().trim();
        if text.is_empty() {
            return Ok(None);
        }
        parse(text).map(Some).ok_or_else(|| {
            DecodeError::new(
                prop.line,
                format!("invalid value {:?} for element {}", text, prop.name),
            )
        })
    }

    fn render(&self) -> String {
        let mut xml = String::with_capacity(512);
        xml.push_str(XML_HEADER);
        xml.push('<');
        xml.push_str(&self.root);
        for (key, value) in &self.root_attrs {
            xml.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
        }
        xml.push('>');
        for prop in &self.properties {
            match &prop.body {
                PropertyBody::Raw(raw) => xml.push_str(raw),
                PropertyBody::Text(text) => {
                    xml.push('<');
                    xml.push_str(&prop.name);
                    for (key, value) in &prop.attrs {
                        xml.push_str(&format!(" {}=\"{}\"", key, escape_attr(value)));
                    }
                    if text.is_empty() {
                        xml.push_str("/>");
                    } else {
                        xml.push('>');
                        xml.push_str(&escape_text(text));
                        xml.push_str(&format!("</{}>", prop.name));
                    }
                }
            }
        }
        xml.push_str(&format!("</{}>", self.root));
        xml
    }
}

/// `docProps/app.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppXml(pub PropertyBag);

impl Default for AppXml {
    fn default() -> Self {
        AppXml(PropertyBag {
            root: "Properties".to_string(),
            root_attrs: vec![
                ("xmlns".to_string(), NS_EXTENDED.to_string()),
                ("xmlns:vt".to_string(), NS_VT.to_string()),
            ],
            properties: Vec::new(),
        })
    }
}

impl XmlPart for AppXml {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        PropertyBag::parse(xml, "Properties").map(AppXml)
    }

    fn to_xml(&self) -> String {
        self.0.render()
    }
}

/// `docProps/core.xml`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreXml(pub PropertyBag);

impl Default for CoreXml {
    fn default() -> Self {
        CoreXml(PropertyBag {
            root: "cp:coreProperties".to_string(),
            root_attrs: vec![
                ("xmlns:cp".to_string(), NS_CP.to_string()),
                ("xmlns:dc".to_string(), NS_DC.to_string()),
                ("xmlns:dcterms".to_string(), NS_DCTERMS.to_string()),
                ("xmlns:dcmitype".to_string(), NS_DCMITYPE.to_string()),
                ("xmlns:xsi".to_string(), NS_XSI.to_string()),
            ],
            properties: Vec::new(),
        })
    }
}

impl XmlPart for CoreXml {
    fn from_xml(xml: &str) -> Result<Self, DecodeError> {
        PropertyBag::parse(xml, "coreProperties").map(CoreXml)
    }

    fn to_xml(&self) -> String {
        self.0.render()
    }
}

impl AppProperties {
    /// Read the modelled fields out of a decoded part
    pub fn from_xml_part(part: &AppXml) -> Result<Self, DecodeError> {
        let bag = &part.0;
        Ok(AppProperties {
            application: bag.text("Application"),
            scale_crop: bag.parse_value("ScaleCrop", parse_bool)?.unwrap_or_default(),
            doc_security: bag
                .parse_value("DocSecurity", |s| s.parse::<i32>().ok())?
                .unwrap_or_default(),
            company: bag.text("Company"),
            links_up_to_date: bag
                .parse_value("LinksUpToDate", parse_bool)?
                .unwrap_or_default(),
            hyperlinks_changed: bag
                .parse_value("HyperlinksChanged", parse_bool)?
                .unwrap_or_default(),
            app_version: bag.text("AppVersion"),
        })
    }

    /// Write every field into a part, keeping other properties
    pub fn apply_to(&self, part: &mut AppXml) {
        let fields = [
            ("Application", self.application.clone()),
            ("ScaleCrop", self.scale_crop.to_string()),
            ("DocSecurity", self.doc_security.to_string()),
            ("Company", self.company.clone()),
            ("LinksUpToDate", self.links_up_to_date.to_string()),
            ("HyperlinksChanged", self.hyperlinks_changed.to_string()),
            ("AppVersion", self.app_version.clone()),
        ];
        for (local, value) in fields {
            part.0
                .set((NS_EXTENDED, "", local), value, Vec::new(), APP_ORDER);
        }
    }
}

/// (namespace, preferred prefix, local name) of each core property
const CORE_FIELDS: [(&str, &str, &str); 14] = [
    (NS_CP, "cp", "category"),
    (NS_CP, "cp", "contentStatus"),
    (NS_DCTERMS, "dcterms", "created"),
    (NS_DC, "dc", "creator"),
    (NS_DC, "dc", "description"),
    (NS_DC, "dc", "identifier"),
    (NS_CP, "cp", "keywords"),
    (NS_CP, "cp", "lastModifiedBy"),
    (NS_DCTERMS, "dcterms", "modified"),
    (NS_CP, "cp", "revision"),
    (NS_DC, "dc", "subject"),
    (NS_DC, "dc", "title"),
    (NS_DC, "dc", "language"),
    (NS_CP, "cp", "version"),
];

impl DocProperties {
    fn values(&self) -> [&str; 14] {
        [
            &self.category,
            &self.content_status,
            &self.created,
            &self.creator,
            &self.description,
            &self.identifier,
            &self.keywords,
            &self.last_modified_by,
            &self.modified,
            &self.revision,
            &self.subject,
            &self.title,
            &self.language,
            &self.version,
        ]
    }

    /// Read the modelled fields out of a decoded part
    pub fn from_xml_part(part: &CoreXml) -> Self {
        let bag = &part.0;
        DocProperties {
            category: bag.text("category"),
            content_status: bag.text("contentStatus"),
            created: bag.text("created"),
            creator: bag.text("creator"),
            description: bag.text("description"),
            identifier: bag.text("identifier"),
            keywords: bag.text("keywords"),
            last_modified_by: bag.text("lastModifiedBy"),
            modified: bag.text("modified"),
            revision: bag.text("revision"),
            subject: bag.text("subject"),
            title: bag.text("title"),
            language: bag.text("language"),
            version: bag.text("version"),
        }
    }

    /// Write the non-empty fields into a part
    pub fn apply_to(&self, part: &mut CoreXml) {
        let order: Vec<&str> = CORE_FIELDS.iter().map(|(_, _, local)| *local).collect();
        for (field, value) in CORE_FIELDS.into_iter().zip(self.values()) {
            if value.is_empty() {
                continue;
            }
            let (_, _, local) = field;
            let attrs = if local == "created" || local == "modified" {
                let xsi = part.0.prefix_for(NS_XSI, "xsi");
                let dcterms = part.0.prefix_for(NS_DCTERMS, "dcterms");
                vec![(format!("{}:type", xsi), format!("{}:W3CDTF", dcterms))]
            } else {
                Vec::new()
            };
            part.0.set(field, value.to_string(), attrs, &order);
        }
    }
}

/// `docProps/app.xml` for a new package
pub(crate) fn app_template() -> String {
    let mut part = AppXml::default();
    AppProperties {
        application: "Microsoft Excel".to_string(),
        app_version: "16.0300".to_string(),
        ..Default::default()
    }
    .apply_to(&mut part);
    part.to_xml()
}

/// `docProps/core.xml` for a new package, stamped with `timestamp`
pub(crate) fn core_template(timestamp: &str) -> String {
    let mut part = CoreXml::default();
    DocProperties {
        creator: "sheetpack".to_string(),
        created: timestamp.to_string(),
        modified: timestamp.to_string(),
        ..Default::default()
    }
    .apply_to(&mut part);
    part.to_xml()
}

impl Package {
    /// Read the extended properties
    ///
    /// An absent part reads as the default value.
    pub fn app_props(&self) -> XlsxResult<AppProperties> {
        let part: AppXml = self.decode(APP_PROPS_PATH)?;
        Ok(AppProperties::from_xml_part(&part)?)
    }

    /// Overwrite all extended properties
    ///
    /// The existing part is decoded first, so a malformed part is an error
    /// rather than silently replaced.
    pub fn set_app_props(&self, props: &AppProperties) -> XlsxResult<()> {
        let mut part: AppXml = self.decode(APP_PROPS_PATH)?;
        props.apply_to(&mut part);
        self.encode(APP_PROPS_PATH, &part);
        Ok(())
    }

    /// Read the core properties
    pub fn doc_props(&self) -> XlsxResult<DocProperties> {
        let part: CoreXml = self.decode(CORE_PROPS_PATH)?;
        Ok(DocProperties::from_xml_part(&part))
    }

    /// Update core properties; empty fields leave the stored value alone
    pub fn set_doc_props(&self, props: &DocProperties) -> XlsxResult<()> {
        let mut part: CoreXml = self.decode(CORE_PROPS_PATH)?;
        props.apply_to(&mut part);
        self.encode(CORE_PROPS_PATH, &part);
        Ok(())
    }
}
