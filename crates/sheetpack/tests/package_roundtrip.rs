//! End-to-end tests for package files (create -> save -> open -> patch -> save)

use pretty_assertions::assert_eq;
use sheetpack::prelude::*;

#[test]
fn test_save_without_path_is_refused() {
    let package = Package::new();
    let err = package.save().unwrap_err();
    assert!(matches!(err, XlsxError::NoPath));
    assert_eq!(err.kind(), ErrorKind::State);
}

#[test]
fn test_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("book.xlsx");

    let package = Package::new();
    let mut writer = package.stream_writer("Sheet1").unwrap();
    writer
        .add_row(1, vec![(1, CellValue::text("Hello, World!")), (2, CellValue::from(3.5))])
        .unwrap();
    writer.close().unwrap();
    package.put_raw("customXml/item1.xml", b"<data>keep me</data>".to_vec());
    package.save_as(&path).unwrap();
    assert_eq!(package.path().as_deref(), Some(path.as_path()));
    assert!(package.dirty_paths().is_empty());

    let opened = Package::open(&path).unwrap();
    assert_eq!(
        &*opened.get("customXml/item1.xml").unwrap(),
        b"<data>keep me</data>"
    );
    let row = opened.stream_reader("Sheet1").unwrap().next().unwrap().unwrap();
    assert_eq!(row.cells[0].value, CellValue::text("Hello, World!"));
    assert_eq!(row.cells[1].value, CellValue::Number(3.5));

    // Patch in place and save back to the same file
    let props = AppProperties {
        company: "Acme".to_string(),
        ..opened.app_props().unwrap()
    };
    opened.set_app_props(&props).unwrap();
    assert_eq!(opened.dirty_paths(), vec!["docProps/app.xml".to_string()]);
    opened.save().unwrap();

    let again = Package::open(&path).unwrap();
    assert_eq!(again.app_props().unwrap().company, "Acme");
    assert_eq!(again.paths(), opened.paths());
}

#[test]
fn test_save_refused_while_writer_open() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("open.xlsx");

    let package = Package::new();
    let mut writer = package.stream_writer("Sheet1").unwrap();
    writer.add_row(1, vec![(1, CellValue::from(1.0))]).unwrap();

    let err = package.save_as(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(!path.exists());

    writer.close().unwrap();
    package.save_as(&path).unwrap();
    assert!(path.exists());
}

#[test]
fn test_open_rejects_non_package() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plain.xlsx");
    std::fs::write(&path, b"not a zip").unwrap();

    let err = Package::open(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Archive);
}

#[test]
fn test_styles_survive_file_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("styled.xlsx");

    let package = Package::new();
    let style = Style::new()
        .bold(true)
        .fill_color(Color::YELLOW)
        .number_format("0.000");
    let id = package.with_styles(|styles| styles.register(style.clone())).unwrap();
    let mut writer = package.stream_writer("Sheet1").unwrap();
    writer
        .add_row(1, vec![StreamCell::new(1, CellValue::from(1.25)).with_style(id)])
        .unwrap();
    writer.close().unwrap();
    package.save_as(&path).unwrap();

    let opened = Package::open(&path).unwrap();
    let row = opened.stream_reader("Sheet1").unwrap().next().unwrap().unwrap();
    assert_eq!(row.cells[0].style, id);
    let stored = opened
        .with_styles(|styles| styles.resolve(id).cloned())
        .unwrap()
        .unwrap();
    assert_eq!(stored, style);
    assert_eq!(stored.number_format, NumberFormat::Custom("0.000".to_string()));
}
