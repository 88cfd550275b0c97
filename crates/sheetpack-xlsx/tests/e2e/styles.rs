//! Stylesheets from other producers through a save

use pretty_assertions::assert_eq;
use sheetpack_core::{CellValue, Style};
use sheetpack_xlsx::Package;

use crate::common::*;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<styleSheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">
  <fonts count="1"><font><sz val="11"/><color theme="1"/><name val="Calibri"/><family val="2"/><scheme val="minor"/></font></fonts>
  <fills count="3">
    <fill><patternFill patternType="none"/></fill>
    <fill><patternFill patternType="gray125"/></fill>
    <fill><gradientFill degree="90"><stop position="0"><color theme="0"/></stop><stop position="1"><color theme="4" tint="-0.249977111117893"/></stop></gradientFill></fill>
  </fills>
  <borders count="1"><border><left/><right/><top/><bottom/><diagonal/></border></borders>
  <cellStyleXfs count="1"><xf numFmtId="0" fontId="0" fillId="0" borderId="0"/></cellStyleXfs>
  <cellXfs count="2">
    <xf numFmtId="0" fontId="0" fillId="0" borderId="0" xfId="0"/>
    <xf numFmtId="0" fontId="0" fillId="2" borderId="0" xfId="0" applyFill="1"/>
  </cellXfs>
  <cellStyles count="1"><cellStyle name="Normal" xfId="0" builtinId="0"/></cellStyles>
  <dxfs count="1"><dxf><fill><patternFill><bgColor rgb="FFFFC7CE"/></patternFill></fill></dxf></dxfs>
  <tableStyles count="0" defaultTableStyle="TableStyleMedium2" defaultPivotStyle="PivotStyleLight16"/>
</styleSheet>"#;

fn saved_styles(package: &Package) -> String {
    let raw = package.get("xl/styles.xml").unwrap();
    String::from_utf8(raw.to_vec()).unwrap()
}

fn assert_decorations_kept(xml: &str) {
    assert!(xml.contains("<gradientFill degree=\"90\">"), "gradient fill lost");
    assert!(xml.contains("tint=\"-0.249977111117893\""), "tint rounded");
    assert!(xml.contains("<dxfs count=\"1\">"), "dxfs lost");
    assert!(xml.contains("<bgColor rgb=\"FFFFC7CE\"/>"), "dxf body lost");
    assert!(
        xml.contains("<xf numFmtId=\"0\" fontId=\"0\" fillId=\"2\" borderId=\"0\" xfId=\"0\" applyFill=\"1\"/>"),
        "existing cell format rewritten"
    );
    assert!(xml.contains("<fills count=\"3\">"));
    assert!(xml.contains("<cellXfs count=\"3\">"));
}

#[test]
fn test_registering_a_style_keeps_existing_formatting() {
    let package = open_fixture(&[("xl/styles.xml", STYLES.as_bytes())]);
    let bold = package
        .with_styles(|styles| styles.register(Style::new().bold(true)))
        .unwrap();
    assert_eq!(bold, 2);

    let reopened = reopen(&package);
    assert_decorations_kept(&saved_styles(&reopened));
    let style = reopened
        .with_styles(|styles| styles.resolve(bold).cloned())
        .unwrap()
        .unwrap();
    assert!(style.font.bold);
}

#[test]
fn test_untouched_styles_are_byte_identical() {
    let package = open_fixture(&[("xl/styles.xml", STYLES.as_bytes())]);
    // Registering an existing style does not grow the registry
    let plain = package
        .with_styles(|styles| styles.register(Style::new()))
        .unwrap();
    assert_eq!(plain, 0);

    let reopened = reopen(&package);
    assert_eq!(saved_styles(&reopened), STYLES);
}

#[test]
fn test_styles_survive_save_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("styled.xlsx");

    let package = open_fixture(&[("xl/styles.xml", STYLES.as_bytes())]);
    let bold = package
        .with_styles(|styles| styles.register(Style::new().bold(true)))
        .unwrap();
    let mut writer = package.stream_writer("Sheet1").unwrap();
    writer
        .add_row(1, vec![(1, CellValue::text("banner"), bold)])
        .unwrap();
    writer.close().unwrap();
    package.save_as(&path).unwrap();

    let opened = Package::open(&path).unwrap();
    assert_decorations_kept(&saved_styles(&opened));
    let row = opened.stream_reader("Sheet1").unwrap().next().unwrap().unwrap();
    assert_eq!(row.cells[0].style, bold);
    assert_eq!(row.cells[0].value, CellValue::text("banner"));

    // Saving again in place leaves the stylesheet alone
    opened.save().unwrap();
    let again = Package::open(&path).unwrap();
    assert_eq!(saved_styles(&again), saved_styles(&opened));
}
