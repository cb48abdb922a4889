// Column descriptors: names, selection and pinned types
//
// Built on the calling thread after row offsets are known and before any
// inference or decoding. Every column of the input gets a descriptor; the
// stages skip the disabled ones.

use std::collections::{HashMap, HashSet};

use crate::column::DataType;
use crate::error::{CsvError, Result};
use crate::options::{ColumnRef, Dtypes, ReaderOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseFlags {
    /// Column is allocated and decoded.
    pub enabled: bool,
    /// Type comes from inference rather than from the caller.
    pub infer: bool,
    /// Column was requested through `parse_dates`.
    pub as_date: bool,
}

impl Default for ParseFlags {
    fn default() -> Self {
        ParseFlags {
            enabled: true,
            infer: true,
            as_date: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDescriptor {
    /// Field position within a row.
    pub index: usize,
    pub name: String,
    pub dtype: DataType,
    pub flags: ParseFlags,
}

/// Names for `count` columns.
///
/// `names` from the options win, then the header row, then `{prefix}{i}`.
pub fn column_names(header: Option<Vec<String>>, count: usize, opts: &ReaderOptions) -> Vec<String> {
    let mut names = match (&opts.names, header) {
        (Some(names), _) => names.clone(),
        (None, Some(header)) => header,
        (None, None) => (0..count).map(|i| format!("{}{}", opts.prefix, i)).collect(),
    };
    if opts.mangle_dupe_cols {
        mangle_duplicates(&mut names);
    }
    names
}

/// Rename repeated names to `name.1`, `name.2`, ...
pub fn mangle_duplicates(names: &mut [String]) {
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut counts: HashMap<String, usize> = HashMap::new();
    for name in names.iter_mut() {
        if seen.contains(name.as_str()) {
            let base = name.clone();
            let n = counts.entry(base.clone()).or_insert(0);
            loop {
                *n += 1;
                let candidate = format!("{}.{}", base, n);
                if !seen.contains(&candidate) {
                    *name = candidate;
                    break;
                }
            }
        }
        seen.insert(name.clone());
    }
}

/// Build one descriptor per name, applying `use_cols`, `dtypes` and
/// `parse_dates`.
pub fn build_columns(names: Vec<String>, opts: &ReaderOptions) -> Result<Vec<ColumnDescriptor>> {
    let mut columns: Vec<ColumnDescriptor> = names
        .into_iter()
        .enumerate()
        .map(|(index, name)| ColumnDescriptor {
            index,
            name,
            dtype: DataType::Str,
            flags: ParseFlags::default(),
        })
        .collect();

    if let Some(use_cols) = &opts.use_cols {
        let mut keep = vec![false; columns.len()];
        for col in use_cols {
            keep[resolve_ref(&columns, col, "use_cols")?] = true;
        }
        for (c, keep) in columns.iter_mut().zip(keep) {
            c.flags.enabled = keep;
        }
    }

    match &opts.dtypes {
        Some(Dtypes::Positional(types)) => {
            if types.len() > columns.len() {
                log::warn!(
                    "{} dtypes given for {} columns; extra entries ignored",
                    types.len(),
                    columns.len()
                );
            }
            for (c, &dtype) in columns.iter_mut().zip(types) {
                pin(c, dtype);
            }
        }
        Some(Dtypes::Named(types)) => {
            for (name, &dtype) in types {
                match columns.iter_mut().find(|c| &c.name == name) {
                    Some(c) => pin(c, dtype),
                    None => log::warn!("dtype given for unknown column {:?}", name),
                }
            }
        }
        None => {}
    }

    for col in &opts.parse_dates {
        let i = resolve_ref(&columns, col, "parse_dates")?;
        pin(&mut columns[i], DataType::Date);
        columns[i].flags.as_date = true;
    }

    Ok(columns)
}

fn pin(column: &mut ColumnDescriptor, dtype: DataType) {
    column.dtype = dtype;
    column.flags.infer = false;
}

fn resolve_ref(columns: &[ColumnDescriptor], col: &ColumnRef, option: &str) -> Result<usize> {
    match col {
        ColumnRef::Index(i) if *i < columns.len() => Ok(*i),
        ColumnRef::Index(i) => Err(CsvError::InvalidOption(format!(
            "{}: column {} out of range for {} columns",
            option,
            i,
            columns.len()
        ))),
        ColumnRef::Name(name) => columns
            .iter()
            .position(|c| &c.name == name)
            .ok_or_else(|| CsvError::InvalidOption(format!("{}: unknown column {:?}", option, name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_generated_names() {
        let opts = ReaderOptions {
            prefix: "col".into(),
            ..ReaderOptions::default()
        };
        assert_eq!(column_names(None, 3, &opts), strings(&["col0", "col1", "col2"]));
    }

    #[test]
    fn test_names_override_header() {
        let opts = ReaderOptions {
            names: Some(strings(&["x", "y"])),
            ..ReaderOptions::default()
        };
        assert_eq!(
            column_names(Some(strings(&["a", "b"])), 2, &opts),
            strings(&["x", "y"])
        );
    }

    #[test]
    fn test_mangle_duplicates() {
        let mut names = strings(&["a", "b", "a", "a", "a.1"]);
        mangle_duplicates(&mut names);
        assert_eq!(names, strings(&["a", "b", "a.1", "a.2", "a.1.1"]));
    }

    #[test]
    fn test_use_cols_and_dtypes() {
        let mut types = BTreeMap::new();
        types.insert("b".to_string(), DataType::Float64);
        types.insert("zzz".to_string(), DataType::Int64);
        let opts = ReaderOptions {
            use_cols: Some(vec![ColumnRef::from("b"), ColumnRef::from(2)]),
            dtypes: Some(Dtypes::Named(types)),
            parse_dates: vec![ColumnRef::from(2)],
            ..ReaderOptions::default()
        };
        let cols = build_columns(strings(&["a", "b", "c"]), &opts).unwrap();
        assert!(!cols[0].flags.enabled);
        assert!(cols[0].flags.infer);
        assert_eq!(cols[1].dtype, DataType::Float64);
        assert!(!cols[1].flags.infer);
        assert_eq!(cols[2].dtype, DataType::Date);
        assert!(cols[2].flags.as_date);
    }

    #[test]
    fn test_positional_dtypes() {
        let opts = ReaderOptions {
            dtypes: Some(Dtypes::Positional(vec![DataType::Bool])),
            ..ReaderOptions::default()
        };
        let cols = build_columns(strings(&["a", "b"]), &opts).unwrap();
        assert_eq!(cols[0].dtype, DataType::Bool);
        assert!(cols[1].flags.infer);
    }

    #[test]
    fn test_unknown_use_col_rejected() {
        let opts = ReaderOptions {
            use_cols: Some(vec![ColumnRef::from("nope")]),
            ..ReaderOptions::default()
        };
        assert!(matches!(
            build_columns(strings(&["a"]), &opts),
            Err(CsvError::InvalidOption(_))
        ));
        let opts = ReaderOptions {
            use_cols: Some(vec![ColumnRef::from(3)]),
            ..ReaderOptions::default()
        };
        assert!(matches!(
            build_columns(strings(&["a"]), &opts),
            Err(CsvError::InvalidOption(_))
        ));
    }
}
