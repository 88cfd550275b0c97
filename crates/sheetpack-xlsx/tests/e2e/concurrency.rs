//! One package shared between threads

use std::thread;

use pretty_assertions::assert_eq;
use sheetpack_core::{CellValue, Style};
use sheetpack_xlsx::{AppProperties, Package};

use crate::common::*;

#[test]
fn test_parallel_puts_on_distinct_paths() {
    let package = Package::new();
    thread::scope(|s| {
        for t in 0..8 {
            let package = &package;
            s.spawn(move || {
                for i in 0..50 {
                    let path = format!("custom/t{t}/item{i}.xml");
                    package.put_raw(&path, format!("<v>{t}-{i}</v>").into_bytes());
                    assert!(package.get(&path).is_some());
                }
            });
        }
    });

    for t in 0..8 {
        for i in 0..50 {
            let raw = package.get(&format!("custom/t{t}/item{i}.xml")).unwrap();
            assert_eq!(&*raw, format!("<v>{t}-{i}</v>").as_bytes());
        }
    }
}

#[test]
fn test_same_path_is_last_writer_wins() {
    let package = open_fixture(&[]);
    let candidates: Vec<Vec<u8>> = (0..16)
        .map(|n| format!("<v>{}</v>", n).into_bytes())
        .collect();
    let candidates = &candidates;

    thread::scope(|s| {
        for bytes in candidates {
            let package = &package;
            s.spawn(move || {
                for _ in 0..20 {
                    package.put_raw("custom/shared.xml", bytes.clone());
                    // Readers see one complete value, never a mix
                    let seen = package.get("custom/shared.xml").unwrap();
                    assert!(candidates.iter().any(|c| c.as_slice() == &*seen));
                }
            });
        }
    });

    let last = package.get("custom/shared.xml").unwrap();
    assert!(candidates.iter().any(|c| c.as_slice() == &*last));
}

#[test]
fn test_decode_races_with_writes() {
    let package = Package::new();
    let names: Vec<String> = (0..4).map(|n| format!("Company {n}")).collect();
    let names = &names;

    thread::scope(|s| {
        for name in names {
            let package = &package;
            s.spawn(move || {
                for _ in 0..25 {
                    let props = AppProperties {
                        company: name.clone(),
                        ..Default::default()
                    };
                    package.set_app_props(&props).unwrap();
                    let read = package.app_props().unwrap();
                    assert!(names.contains(&read.company));
                }
            });
        }
    });

    let company = package.app_props().unwrap().company;
    assert!(names.contains(&company));
    assert_eq!(reopen(&package).app_props().unwrap().company, company);
}

#[test]
fn test_writers_on_different_sheets() {
    let package = Package::new();
    let sheets = ["Sheet1", "Alpha", "Beta", "Gamma"];
    for name in &sheets[1..] {
        package.add_sheet(name).unwrap();
    }
    let bold = package
        .with_styles(|styles| styles.register(Style::new().bold(true)))
        .unwrap();

    thread::scope(|s| {
        for name in sheets {
            let package = &package;
            s.spawn(move || {
                let mut writer = package.stream_writer(name).unwrap();
                for r in 1..=200u32 {
                    writer
                        .add_row(
                            r,
                            vec![
                                (1, CellValue::text(format!("{name}-{}", r % 10)), bold),
                                (2, CellValue::from(r as f64), 0),
                            ],
                        )
                        .unwrap();
                }
                writer.close().unwrap();
            });
        }
    });

    let reopened = reopen(&package);
    // 10 distinct strings per sheet, interned once each
    assert_eq!(reopened.with_shared_strings(|sst| sst.len()).unwrap(), 40);

    for name in sheets {
        let rows: Vec<_> = reopened
            .stream_reader(name)
            .unwrap()
            .map(|row| row.unwrap())
            .collect();
        assert_eq!(rows.len(), 200);
        let last = &rows[199];
        assert_eq!(last.index, 200);
        assert_eq!(last.cells[0].value, CellValue::text(format!("{name}-0")));
        assert_eq!(last.cells[0].style, bold);
        assert_eq!(last.cells[1].value, CellValue::Number(200.0));
    }
}
