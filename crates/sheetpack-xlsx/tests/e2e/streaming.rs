//! Streaming writer and reader through a full archive round trip

use pretty_assertions::assert_eq;
use sheetpack_core::{CellError, CellValue, Formula, SharedString, SharedStringItem, Style};
use sheetpack_xlsx::{ErrorKind, Options, Package, RowOptions, StreamCell, XlsxError};

use crate::common::*;

#[test]
fn test_writer_order_and_close() {
    let package = Package::new();
    let mut writer = package.stream_writer("Sheet1").unwrap();

    writer.add_row(5, vec![(1, CellValue::from(1.0))]).unwrap();

    let err = writer.add_row(3, vec![(1, CellValue::from(2.0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderViolation);
    let err = writer.add_row(5, vec![(1, CellValue::from(3.0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::OrderViolation);

    writer.add_row(6, vec![(1, CellValue::from(4.0))]).unwrap();
    assert_eq!(writer.last_row(), Some(6));
    writer.close().unwrap();

    let err = writer.add_row(7, vec![(1, CellValue::from(5.0))]).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);
    assert!(matches!(err, XlsxError::WriterClosed(_)));

    let rows: Vec<_> = package
        .stream_reader("Sheet1")
        .unwrap()
        .map(|row| row.unwrap())
        .collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].index, 5);
    assert_eq!(rows[0].cells[0].value, CellValue::Number(1.0));
    assert_eq!(rows[1].index, 6);
    assert_eq!(rows[1].cells[0].value, CellValue::Number(4.0));
}

#[test]
fn test_write_save_read_back() {
    let package = Package::new();
    let header = package
        .with_styles(|styles| styles.register(Style::new().bold(true)))
        .unwrap();

    let mut writer = package.stream_writer("Sheet1").unwrap();
    writer.set_col_width(1, 2, 18.5).unwrap();
    writer
        .add_row_with(
            1,
            vec![
                StreamCell::new(1, CellValue::text("name")).with_style(header),
                StreamCell::new(2, CellValue::text("score")).with_style(header),
            ],
            RowOptions {
                height: Some(21.0),
                ..Default::default()
            },
        )
        .unwrap();
    writer
        .add_row(
            2,
            vec![
                (1, CellValue::text("ada")),
                (2, CellValue::from(91.5)),
                (3, CellValue::Bool(true)),
            ],
        )
        .unwrap();
    writer
        .add_row(
            3,
            vec![
                (1, CellValue::text("ada")),
                (2, CellValue::Formula(Formula::new("=B2*2").with_cached(CellValue::from(183.0)))),
                (3, CellValue::Error(CellError::Div0)),
                (4, CellValue::inline("inline text")),
            ],
        )
        .unwrap();
    writer.merge_cell("E1:F1").unwrap();
    writer.close().unwrap();

    let reopened = reopen(&package);
    let strings = reopened.with_shared_strings(|sst| sst.len()).unwrap();
    // "ada" is interned once
    assert_eq!(strings, 3);

    let mut reader = reopened.stream_reader("Sheet1").unwrap();

    let row = reader.next().unwrap().unwrap();
    assert_eq!(row.index, 1);
    assert_eq!(row.height, Some(21.0));
    assert_eq!(row.cells[0].style, header);
    assert_eq!(
        row.cells[0].value,
        CellValue::SharedString(SharedString::Item(SharedStringItem::plain("name")))
    );

    let row = reader.next().unwrap().unwrap();
    assert_eq!(row.cell(1).unwrap().value, CellValue::text("ada"));
    assert_eq!(row.cell(2).unwrap().value, CellValue::Number(91.5));
    assert_eq!(row.cell(3).unwrap().value, CellValue::Bool(true));

    let row = reader.next().unwrap().unwrap();
    assert_eq!(row.cell(1).unwrap().value, CellValue::text("ada"));
    assert_eq!(
        row.cell(2).unwrap().value,
        CellValue::Formula(Formula::new("B2*2").with_cached(CellValue::Number(183.0)))
    );
    assert_eq!(row.cell(3).unwrap().value, CellValue::Error(CellError::Div0));
    assert_eq!(row.cell(4).unwrap().value, CellValue::inline("inline text"));

    assert!(reader.next().is_none());
    assert!(reader.next().is_none());

    let xml = String::from_utf8(reopened.get("xl/worksheets/sheet1.xml").unwrap().to_vec()).unwrap();
    assert!(xml.contains("<mergeCell ref=\"E1:F1\"/>"));
    assert!(xml.contains("<col min=\"1\" max=\"2\""));
}

#[test]
fn test_raw_values_after_reopen() {
    let package = Package::new();
    let mut writer = package.stream_writer("Sheet1").unwrap();
    writer
        .add_row(1, vec![(1, CellValue::text("a")), (2, CellValue::text("b"))])
        .unwrap();
    writer.close().unwrap();

    let mut out = std::io::Cursor::new(Vec::new());
    package.write_to(&mut out).unwrap();
    out.set_position(0);
    let options = Options {
        raw_cell_value: true,
        ..Default::default()
    };
    let reopened = Package::read_with(out, options).unwrap();

    let row = reopened.stream_reader("Sheet1").unwrap().next().unwrap().unwrap();
    assert_eq!(
        row.cells[1].value,
        CellValue::SharedString(SharedString::Index(1))
    );
}

#[test]
fn test_indexed_reader_over_written_sheet() {
    let package = Package::new();
    let mut writer = package.stream_writer("Sheet1").unwrap();
    for r in [2, 4, 8, 16] {
        writer.add_row(r, vec![(1, CellValue::from(r as f64))]).unwrap();
    }
    writer.close().unwrap();
    let reopened = reopen(&package);

    let mut forward = reopened.stream_reader("Sheet1").unwrap();
    assert_eq!(forward.row(8).unwrap().unwrap().index, 8);
    let err = forward.row(4).unwrap_err();
    assert!(matches!(err, XlsxError::ReaderForwardOnly { row: 4, cursor: 8 }));

    let mut indexed = reopened.stream_reader("Sheet1").unwrap().indexed();
    let row = indexed.row(16).unwrap().unwrap();
    assert_eq!(row.cells[0].value, CellValue::Number(16.0));
    let row = indexed.row(2).unwrap().unwrap();
    assert_eq!(row.cells[0].value, CellValue::Number(2.0));
    assert_eq!(indexed.row(3).unwrap(), None);
}

#[test]
fn test_reader_on_fixture_sheet() {
    let package = open_fixture(&[]);
    let mut reader = package.stream_reader("Sheet1").unwrap();
    let row = reader.next().unwrap().unwrap();
    assert_eq!(row.index, 1);
    assert_eq!(row.cells[0].value, CellValue::inline("hello"));
    assert!(reader.next().is_none());

    let err = package.stream_reader("Nope").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::MissingPart);
}

#[test]
fn test_second_writer_on_same_sheet_is_refused() {
    let package = Package::new();
    let mut first = package.stream_writer("Sheet1").unwrap();
    let err = package.stream_writer("Sheet1").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::State);

    first.close().unwrap();
    let mut second = package.stream_writer("Sheet1").unwrap();
    second.close().unwrap();
}
