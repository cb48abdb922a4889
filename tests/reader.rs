// End-to-end reader tests
//
// Everything here goes through CsvReader / read_csv, the way a caller would.

use std::collections::BTreeMap;

use parcsv::stage::gather_row_offsets;
use parcsv::{
    read_csv, ColumnRef, ConversionErrorPolicy, CsvError, CsvReader, CsvTable, DataType, Dtypes,
    ReadWindow, ReaderOptions, Value,
};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn headerless() -> ReaderOptions {
    ReaderOptions {
        header: None,
        ..ReaderOptions::default()
    }
}

/// Row-major rendering of a table for comparisons across reads.
fn render(table: &CsvTable) -> Vec<Vec<String>> {
    (0..table.num_rows())
        .map(|row| {
            table
                .columns
                .iter()
                .map(|c| match c.value(row) {
                    Some(v) => format!("{:?}", v),
                    None => "null".to_string(),
                })
                .collect()
        })
        .collect()
}

fn number_rows(n: usize) -> Vec<u8> {
    (0..n)
        .map(|i| format!("{},{}\n", i, i * 2))
        .collect::<String>()
        .into_bytes()
}

// ---------------------------------------------------------------------------
// Concrete scenarios
// ---------------------------------------------------------------------------

#[test]
fn header_row_with_quoted_delimiter() {
    init_logger();
    let table = read_csv(b"a,b\n1,x\n2,\"y,z\"\n", &ReaderOptions::default()).unwrap();
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.column_names(), vec!["a", "b"]);

    let a = &table.columns[0];
    assert_eq!(a.dtype(), DataType::Int64);
    assert_eq!(a.values().collect::<Vec<_>>(), vec![Some(Value::Int64(1)), Some(Value::Int64(2))]);

    let b = &table.columns[1];
    assert_eq!(b.dtype(), DataType::Str);
    assert_eq!(b.values().collect::<Vec<_>>(), vec![Some(Value::Str("x")), Some(Value::Str("y,z"))]);
}

#[test]
fn boolean_column_with_null() {
    init_logger();
    let opts = ReaderOptions {
        na_values: vec![String::new()],
        keep_default_na: false,
        true_values: vec!["true".into()],
        false_values: vec!["false".into()],
        ..headerless()
    };
    let table = read_csv(b"1,true\n2,false\n3,\n", &opts).unwrap();
    let col = &table.columns[1];
    assert_eq!(col.dtype(), DataType::Bool);
    assert_eq!(
        col.values().collect::<Vec<_>>(),
        vec![Some(Value::Bool(true)), Some(Value::Bool(false)), None]
    );
    assert_eq!(table.columns[0].dtype(), DataType::Int64);
}

#[test]
fn malformed_row_strict_and_lenient() {
    init_logger();
    let strict = ReaderOptions {
        strict: true,
        ..headerless()
    };
    let err = read_csv(b"1,2\n3\n", &strict).unwrap_err();
    assert!(
        matches!(err, CsvError::MalformedRow { row: 1, expected: 2, found: 1 }),
        "unexpected {:?}",
        err
    );

    let table = read_csv(b"1,2\n3\n", &headerless()).unwrap();
    assert_eq!(table.num_rows(), 2);
    assert_eq!(table.columns[0].value(1), Some(Value::Int64(3)));
    assert_eq!(table.columns[1].value(1), None);
}

#[test]
fn numeric_boolean_tokens() {
    init_logger();
    let opts = ReaderOptions {
        true_values: vec!["1".into()],
        false_values: vec!["0".into()],
        ..headerless()
    };
    let table = read_csv(b"1\n0\n1\n", &opts).unwrap();
    let col = &table.columns[0];
    assert_eq!(col.dtype(), DataType::Bool);
    assert_eq!(
        col.values().collect::<Vec<_>>(),
        vec![Some(Value::Bool(true)), Some(Value::Bool(false)), Some(Value::Bool(true))]
    );
}

#[test]
fn empty_row_window_keeps_columns() {
    init_logger();
    let reader = CsvReader::new(headerless()).unwrap();
    let window = ReadWindow {
        num_rows: Some(0),
        ..ReadWindow::all()
    };
    let table = reader.read(&b"1,2\n3,4\n"[..], window).unwrap();
    assert_eq!(table.num_columns(), 2);
    assert_eq!(table.num_rows(), 0);

    let window = ReadWindow {
        skip_rows: 1,
        skip_rows_end: 1,
        ..ReadWindow::all()
    };
    let table = reader.read(&b"x\n1,2,3\n4,5,6\n"[..], window).unwrap();
    assert_eq!(table.num_columns(), 3);
    assert_eq!(table.num_rows(), 1);
}

// ---------------------------------------------------------------------------
// Properties
// ---------------------------------------------------------------------------

#[test]
fn reading_twice_is_identical() {
    let data = b"id,name,score\n1,\"a\nb\",1.5\n2,c,\n3,\"d,e\",2\n";
    let reader = CsvReader::new(ReaderOptions {
        chunk_size: 4,
        ..ReaderOptions::default()
    })
    .unwrap();
    let first = reader.read(&data[..], ReadWindow::all()).unwrap();
    let second = reader.read(&data[..], ReadWindow::all()).unwrap();
    assert_eq!(first, second);

    let dialect = &reader.context().dialect;
    let a = gather_row_offsets(data, dialect, 0, data.len(), 4).unwrap();
    let b = gather_row_offsets(data, dialect, 0, data.len(), 4).unwrap();
    assert_eq!(a, b);
}

#[test]
fn row_window_is_slice_of_full_read() {
    init_logger();
    let n = 10;
    let data = number_rows(n);
    let reader = CsvReader::new(headerless()).unwrap();
    let full = render(&reader.read(&data, ReadWindow::all()).unwrap());
    assert_eq!(full.len(), n);

    for skip in [0, 1, 3] {
        for skip_end in [0, 2] {
            for k in [0, 1, 4, 100] {
                let window = ReadWindow {
                    skip_rows: skip,
                    skip_rows_end: skip_end,
                    num_rows: Some(k),
                    ..ReadWindow::all()
                };
                let got = render(&reader.read(&data, window).unwrap());
                let want_len = k.min(n - skip - skip_end);
                assert_eq!(got.len(), want_len, "skip {} end {} k {}", skip, skip_end, k);
                assert_eq!(got.as_slice(), &full[skip..skip + want_len]);
            }
        }
    }
}

#[test]
fn one_string_value_forces_string_column() {
    let numeric = read_csv(b"n\n1\n2\n3\n", &ReaderOptions::default()).unwrap();
    assert_eq!(numeric.columns[0].dtype(), DataType::Int64);

    let mixed = read_csv(b"n\n1\n2\nx\n3\n", &ReaderOptions::default()).unwrap();
    assert_eq!(mixed.columns[0].dtype(), DataType::Str);
    assert_eq!(mixed.columns[0].value(0), Some(Value::Str("1")));

    let restored = read_csv(b"n\n1\n2\n3\n", &ReaderOptions::default()).unwrap();
    assert_eq!(restored, numeric);
}

#[test]
fn byte_ranges_tile_the_input() {
    init_logger();
    let data = b"1,a\n2,b\n3,c\n4,d\n";
    let reader = CsvReader::new(headerless()).unwrap();
    let full = render(&reader.read(&data[..], ReadWindow::all()).unwrap());

    for k in 1..data.len() {
        let head = reader.read(&data[..], ReadWindow::byte_range(0, k)).unwrap();
        let tail = reader
            .read(&data[..], ReadWindow::byte_range(k, data.len() - k))
            .unwrap();
        let mut rows = render(&head);
        rows.extend(render(&tail));
        assert_eq!(rows, full, "split at {}", k);
    }
}

#[test]
fn byte_range_takes_header_from_start() {
    let data = b"k,v\n1,a\n2,b\n";
    let reader = CsvReader::new(ReaderOptions::default()).unwrap();

    let head = reader.read(&data[..], ReadWindow::byte_range(0, 6)).unwrap();
    assert_eq!(head.column_names(), vec!["k", "v"]);
    assert_eq!(render(&head), vec![vec!["Int64(1)", "Str(\"a\")"]]);

    let tail = reader.read(&data[..], ReadWindow::byte_range(6, 0)).unwrap();
    assert_eq!(tail.column_names(), vec!["k", "v"]);
    assert_eq!(render(&tail), vec![vec!["Int64(2)", "Str(\"b\")"]]);
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[test]
fn use_cols_and_parse_dates() {
    let data = b"a,b,c\n1,2020-01-02,x\n2,2020-01-03,y\n";
    let opts = ReaderOptions {
        use_cols: Some(vec![ColumnRef::from(0), ColumnRef::from("b")]),
        parse_dates: vec![ColumnRef::from("b")],
        ..ReaderOptions::default()
    };
    let table = read_csv(data, &opts).unwrap();
    assert_eq!(table.column_names(), vec!["a", "b"]);
    let b = table.column("b").unwrap();
    assert_eq!(b.dtype(), DataType::Date);
    assert_eq!(b.value(0), Some(Value::Date(18_263 * 86_400_000)));
}

#[test]
fn conversion_error_policy() {
    let data = b"a\n1\noops\n";
    let mut types = BTreeMap::new();
    types.insert("a".to_string(), DataType::Int64);

    let fail = ReaderOptions {
        dtypes: Some(Dtypes::Named(types.clone())),
        on_conversion_error: ConversionErrorPolicy::Fail,
        ..ReaderOptions::default()
    };
    match read_csv(data, &fail) {
        Err(CsvError::TypeConversion { row, column, dtype, value }) => {
            assert_eq!((row, column.as_str(), dtype, value.as_str()), (1, "a", DataType::Int64, "oops"));
        }
        other => panic!("unexpected {:?}", other),
    }

    let null = ReaderOptions {
        dtypes: Some(Dtypes::Named(types)),
        on_conversion_error: ConversionErrorPolicy::Null,
        ..ReaderOptions::default()
    };
    let table = read_csv(data, &null).unwrap();
    assert_eq!(
        table.columns[0].values().collect::<Vec<_>>(),
        vec![Some(Value::Int64(1)), None]
    );
}

#[test]
fn comments_and_blank_lines() {
    let data = b"# generated\na,b\n\n1,2\n# mid\r\n3,4 # trailing\n\r\n";
    let opts = ReaderOptions {
        comment: Some(b'#'),
        ..ReaderOptions::default()
    };
    let table = read_csv(data, &opts).unwrap();
    assert_eq!(table.column_names(), vec!["a", "b"]);
    assert_eq!(
        render(&table),
        vec![vec!["Int64(1)", "Int64(2)"], vec!["Int64(3)", "Int64(4)"]]
    );
}

#[test]
fn duplicate_and_generated_names() {
    let table = read_csv(b"x,x,y\n1,2,3\n", &ReaderOptions::default()).unwrap();
    assert_eq!(table.column_names(), vec!["x", "x.1", "y"]);

    let opts = ReaderOptions {
        prefix: "col_".into(),
        ..headerless()
    };
    let table = read_csv(b"1,2\n", &opts).unwrap();
    assert_eq!(table.column_names(), vec!["col_0", "col_1"]);
}

#[test]
fn european_number_format() {
    let opts = ReaderOptions {
        delimiter: b';',
        decimal: b',',
        thousands: Some(b'.'),
        ..ReaderOptions::default()
    };
    let table = read_csv(b"v;w\n1.234,5;1.000\n2;7\n", &opts).unwrap();
    assert_eq!(table.columns[0].dtype(), DataType::Float64);
    assert_eq!(table.columns[0].value(0), Some(Value::Float64(1234.5)));
    assert_eq!(table.columns[1].dtype(), DataType::Int64);
    assert_eq!(table.columns[1].value(0), Some(Value::Int64(1000)));
}

#[test]
fn integer_overflow_reads_as_float() {
    let table = read_csv(b"n\n99999999999999999999\n1\n", &ReaderOptions::default()).unwrap();
    assert_eq!(table.columns[0].dtype(), DataType::Float64);
    assert_eq!(table.columns[0].value(1), Some(Value::Float64(1.0)));
}

#[test]
fn options_from_json() {
    let opts = ReaderOptions::from_json(
        r#"{"delimiter": 124, "header": null, "names": ["a", "b"], "use_cols": ["b"]}"#,
    )
    .unwrap();
    let table = read_csv(b"1|x\n2|y\n", &opts).unwrap();
    assert_eq!(table.column_names(), vec!["b"]);
    assert_eq!(table.columns[0].value(1), Some(Value::Str("y")));

    assert!(matches!(
        ReaderOptions::from_json("{\"strict\": 3}"),
        Err(CsvError::Config(_))
    ));
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[test]
fn out_of_bounds_windows() {
    let reader = CsvReader::new(headerless()).unwrap();
    let data = b"1\n2\n";
    assert!(matches!(
        reader.read(&data[..], ReadWindow::byte_range(10, 1)),
        Err(CsvError::InputBounds(_))
    ));
    let window = ReadWindow {
        skip_rows: 2,
        skip_rows_end: 1,
        ..ReadWindow::all()
    };
    assert!(matches!(
        reader.read(&data[..], window),
        Err(CsvError::InputBounds(_))
    ));

    let window = ReadWindow {
        skip_rows: usize::MAX,
        ..ReadWindow::all()
    };
    assert!(matches!(
        reader.read(&data[..], window),
        Err(CsvError::InputBounds(_))
    ));
    let window = ReadWindow {
        skip_rows: 1,
        num_rows: Some(usize::MAX),
        ..ReadWindow::all()
    };
    assert_eq!(reader.read(&data[..], window).unwrap().num_rows(), 1);
}

#[test]
fn invalid_options_rejected() {
    let opts = ReaderOptions {
        quote: b',',
        ..ReaderOptions::default()
    };
    assert!(matches!(CsvReader::new(opts), Err(CsvError::InvalidOption(_))));

    let opts = ReaderOptions {
        use_cols: Some(vec![ColumnRef::from("missing")]),
        ..ReaderOptions::default()
    };
    assert!(matches!(
        read_csv(b"a\n1\n", &opts),
        Err(CsvError::InvalidOption(_))
    ));
}
