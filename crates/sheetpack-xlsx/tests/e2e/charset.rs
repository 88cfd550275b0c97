//! Parts written in legacy and non-UTF-8 charsets

use pretty_assertions::assert_eq;
use sheetpack_core::{CellValue, SharedStringTable};
use sheetpack_xlsx::{ErrorKind, XlsxError};

use crate::common::*;

/// "Привет" in windows-1251
const CP1251_PRIVET: &[u8] = &[0xCF, 0xF0, 0xE8, 0xE2, 0xE5, 0xF2];

fn app_xml(declaration: &str, company: &[u8]) -> Vec<u8> {
    let mut bytes = declaration.as_bytes().to_vec();
    bytes.extend_from_slice(
        br#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>Microsoft Excel</Application><Company>"#,
    );
    bytes.extend_from_slice(company);
    bytes.extend_from_slice(b"</Company></Properties>");
    bytes
}

#[test]
fn test_declared_whatwg_label() {
    let app = app_xml(
        "<?xml version=\"1.0\" encoding=\"windows-1251\"?>\n",
        CP1251_PRIVET,
    );
    let package = open_fixture(&[("docProps/app.xml", &app)]);
    assert_eq!(package.app_props().unwrap().company, "Привет");
}

#[test]
fn test_declared_codepage_number() {
    let app = app_xml("<?xml version=\"1.0\" encoding=\"cp1251\"?>\n", CP1251_PRIVET);
    let package = open_fixture(&[("docProps/app.xml", &app)]);
    assert_eq!(package.app_props().unwrap().company, "Привет");
}

#[test]
fn test_utf8_bom() {
    let mut app = vec![0xEF, 0xBB, 0xBF];
    app.extend_from_slice(&app_xml("", "Привет".as_bytes()));
    let package = open_fixture(&[("docProps/app.xml", &app)]);
    assert_eq!(package.app_props().unwrap().company, "Привет");
}

#[test]
fn test_utf16_bom() {
    let text = String::from_utf8(app_xml("", "Привет".as_bytes())).unwrap();
    let mut app = vec![0xFF, 0xFE];
    for unit in text.encode_utf16() {
        app.extend_from_slice(&unit.to_le_bytes());
    }
    let package = open_fixture(&[("docProps/app.xml", &app)]);
    let props = package.app_props().unwrap();
    assert_eq!(props.application, "Microsoft Excel");
    assert_eq!(props.company, "Привет");
}

#[test]
fn test_legacy_shared_strings_feed_the_reader() {
    let mut sst = br#"<?xml version="1.0" encoding="windows-1252"?>
<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" count="1" uniqueCount="1"><si><t>caf"#
        .to_vec();
    sst.push(0xE9);
    sst.extend_from_slice(b"</t></si></sst>");
    let sheet = r#"<?xml version="1.0" encoding="UTF-8"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c></row></sheetData></worksheet>"#;
    let rels = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

    let package = sheetpack_xlsx::Package::read(zip_of(&[
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", rels.as_bytes()),
        ("xl/worksheets/sheet1.xml", sheet.as_bytes()),
        ("xl/sharedStrings.xml", &sst),
    ]))
    .unwrap();

    let table: SharedStringTable = package.decode("xl/sharedStrings.xml").unwrap();
    assert_eq!(table.resolve(0).unwrap().text, "café");

    let row = package.stream_reader("Sheet1").unwrap().next().unwrap().unwrap();
    assert_eq!(row.cells[0].value, CellValue::text("café"));
}

#[test]
fn test_undeclared_legacy_part_names_line() {
    let mut bad = b"<sst xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\">\n<si><t>".to_vec();
    bad.extend_from_slice(MAC_CYRILLIC_PRIVET);
    bad.extend_from_slice(b"</t></si></sst>");
    let package = open_fixture(&[("xl/sharedStrings.xml", &bad)]);

    let err = package.decode::<SharedStringTable>("xl/sharedStrings.xml").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Decode);
    match err {
        XlsxError::Decode(e) => {
            assert_eq!(e.line, 2);
            assert_eq!(e.to_string(), "XML syntax error on line 2: invalid UTF-8");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_unknown_declared_label_falls_back_to_utf8() {
    let app = app_xml(
        "<?xml version=\"1.0\" encoding=\"x-made-up\"?>\n",
        "Привет".as_bytes(),
    );
    let package = open_fixture(&[("docProps/app.xml", &app)]);
    assert_eq!(package.app_props().unwrap().company, "Привет");
}
