//! Application and core properties through a full archive round trip

use pretty_assertions::assert_eq;
use sheetpack_xlsx::{AppProperties, DocProperties, ErrorKind, Package};

use crate::common::*;

#[test]
fn test_app_props_roundtrip() {
    let package = Package::new();
    let props = AppProperties {
        application: "Microsoft Excel".to_string(),
        scale_crop: true,
        doc_security: 3,
        company: "Company Name".to_string(),
        links_up_to_date: true,
        hyperlinks_changed: true,
        app_version: "16.0000".to_string(),
    };
    package.set_app_props(&props).unwrap();
    assert_eq!(package.app_props().unwrap(), props);

    let reopened = reopen(&package);
    assert_eq!(reopened.app_props().unwrap(), props);
}

#[test]
fn test_mac_cyrillic_app_props() {
    let app = mac_cyrillic_app_xml();
    let package = open_fixture(&[("docProps/app.xml", &app)]);
    let props = package.app_props().unwrap();
    assert_eq!(props.application, "Microsoft Macintosh Excel");
    assert_eq!(props.company, "Привет");
    assert_eq!(props.app_version, "16.0300");
}

#[test]
fn test_absent_core_props_read_as_default() {
    let package = open_fixture(&[]);
    assert!(!package.contains("docProps/core.xml"));
    assert_eq!(package.doc_props().unwrap(), DocProperties::default());
}

#[test]
fn test_undeclared_legacy_bytes_are_rejected() {
    let mut app = b"<Properties><Company>".to_vec();
    app.extend_from_slice(MAC_CYRILLIC_PRIVET);
    app.extend_from_slice(b"</Company></Properties>");
    let package = open_fixture(&[("docProps/app.xml", &app)]);

    let err = package.app_props().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    assert_eq!(
        err.to_string(),
        "xml decode error: XML syntax error on line 1: invalid UTF-8"
    );

    // The broken part is not papered over by a write either
    let err = package.set_app_props(&AppProperties::default()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
}

#[test]
fn test_bad_integer_names_its_line() {
    let app = b"<?xml version=\"1.0\"?>\n<Properties>\n<DocSecurity>high</DocSecurity>\n</Properties>";
    let package = open_fixture(&[("docProps/app.xml", app)]);
    let err = package.app_props().unwrap_err();
    assert!(err.to_string().contains("on line 3"), "{err}");
}

#[test]
fn test_doc_props_partial_update() {
    let package = Package::new();
    let before = package.doc_props().unwrap();
    assert_eq!(before.creator, "sheetpack");

    package
        .set_doc_props(&DocProperties {
            title: "Quarterly".to_string(),
            modified: "2024-05-01T10:00:00Z".to_string(),
            ..Default::default()
        })
        .unwrap();

    let after = reopen(&package).doc_props().unwrap();
    assert_eq!(after.title, "Quarterly");
    assert_eq!(after.modified, "2024-05-01T10:00:00Z");
    assert_eq!(after.creator, "sheetpack");
    assert_eq!(after.created, before.created);

    let xml = String::from_utf8(package.get("docProps/core.xml").unwrap().to_vec()).unwrap();
    assert!(xml.contains("xsi:type=\"dcterms:W3CDTF\">2024-05-01T10:00:00Z</dcterms:modified>"));
}

#[test]
fn test_unmodelled_app_properties_survive() {
    let app = br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes"><Application>Microsoft Excel</Application><TitlesOfParts><vt:vector size="1" baseType="lpstr"><vt:lpstr>Sheet1</vt:lpstr></vt:vector></TitlesOfParts><AppVersion>16.0300</AppVersion></Properties>"#;
    let package = open_fixture(&[("docProps/app.xml", app)]);
    package
        .set_app_props(&AppProperties {
            company: "Acme".to_string(),
            ..package.app_props().unwrap()
        })
        .unwrap();

    let xml = String::from_utf8(package.get("docProps/app.xml").unwrap().to_vec()).unwrap();
    assert!(xml.contains("<vt:lpstr>Sheet1</vt:lpstr>"));
    assert_eq!(package.app_props().unwrap().company, "Acme");
}

#[test]
fn test_empty_props_parts_accept_updates() {
    let package = Package::new();
    package.put_raw("docProps/app.xml", Vec::new());
    package.put_raw("docProps/core.xml", Vec::new());
    assert_eq!(package.app_props().unwrap(), AppProperties::default());
    assert_eq!(package.doc_props().unwrap(), DocProperties::default());

    let app = AppProperties {
        application: "Microsoft Excel".to_string(),
        company: "Company Name".to_string(),
        ..Default::default()
    };
    package.set_app_props(&app).unwrap();
    let core = DocProperties {
        title: "Recovered".to_string(),
        creator: "someone".to_string(),
        ..Default::default()
    };
    package.set_doc_props(&core).unwrap();
    assert_eq!(package.app_props().unwrap(), app);

    let reopened = reopen(&package);
    assert_eq!(reopened.app_props().unwrap(), app);
    let read = reopened.doc_props().unwrap();
    assert_eq!(read.title, "Recovered");
    assert_eq!(read.creator, "someone");
}
