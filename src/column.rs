// Typed column storage
//
// Buffers are allocated once with the exact row count computed by the
// resolver, then handed out as disjoint row blocks so that decode tasks
// write without synchronisation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{try_alloc, Result};

/// Column data types produced by inference or pinned by the caller.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Int64,
    Float64,
    Bool,
    /// Milliseconds since the Unix epoch.
    Date,
    Str,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Int64 => "int64",
            DataType::Float64 => "float64",
            DataType::Bool => "bool",
            DataType::Date => "date",
            DataType::Str => "str",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Int64(Vec<i64>),
    Float64(Vec<f64>),
    Bool(Vec<bool>),
    Date(Vec<i64>),
    Str(Vec<String>),
}

/// A single non-null cell borrowed from a column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    Int64(i64),
    Float64(f64),
    Bool(bool),
    Date(i64),
    Str(&'a str),
}

/// One output column: values plus a validity mask (`false` = null).
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnBuffer {
    pub name: String,
    pub data: ColumnData,
    pub validity: Vec<bool>,
}

impl ColumnBuffer {
    /// Allocate a column of `rows` cells, all null until written.
    pub fn allocate(name: impl Into<String>, dtype: DataType, rows: usize) -> Result<Self> {
        let data = match dtype {
            DataType::Int64 => ColumnData::Int64(try_alloc("int64 column", rows, 0)?),
            DataType::Float64 => ColumnData::Float64(try_alloc("float64 column", rows, 0.0)?),
            DataType::Bool => ColumnData::Bool(try_alloc("bool column", rows, false)?),
            DataType::Date => ColumnData::Date(try_alloc("date column", rows, 0)?),
            DataType::Str => ColumnData::Str(try_alloc("string column", rows, String::new())?),
        };
        Ok(ColumnBuffer {
            name: name.into(),
            data,
            validity: try_alloc("validity mask", rows, false)?,
        })
    }

    pub fn dtype(&self) -> DataType {
        match self.data {
            ColumnData::Int64(_) => DataType::Int64,
            ColumnData::Float64(_) => DataType::Float64,
            ColumnData::Bool(_) => DataType::Bool,
            ColumnData::Date(_) => DataType::Date,
            ColumnData::Str(_) => DataType::Str,
        }
    }

    pub fn len(&self) -> usize {
        self.validity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.validity.is_empty()
    }

    pub fn null_count(&self) -> usize {
        self.validity.iter().filter(|v| !**v).count()
    }

    /// Cell at `row`, or `None` when null or out of range.
    pub fn value(&self, row: usize) -> Option<Value<'_>> {
        if !*self.validity.get(row)? {
            return None;
        }
        Some(match &self.data {
            ColumnData::Int64(v) => Value::Int64(v[row]),
            ColumnData::Float64(v) => Value::Float64(v[row]),
            ColumnData::Bool(v) => Value::Bool(v[row]),
            ColumnData::Date(v) => Value::Date(v[row]),
            ColumnData::Str(v) => Value::Str(&v[row]),
        })
    }

    /// Iterate all cells in row order.
    pub fn values(&self) -> impl Iterator<Item = Option<Value<'_>>> + '_ {
        (0..self.len()).map(move |row| self.value(row))
    }

    /// Split the column into disjoint mutable blocks of `block_rows` rows.
    pub(crate) fn blocks_mut(&mut self, block_rows: usize) -> Vec<CellBlockMut<'_>> {
        let validity = self.validity.chunks_mut(block_rows);
        match &mut self.data {
            ColumnData::Int64(v) => zip_blocks(v.chunks_mut(block_rows).map(ValuesMut::Int64), validity),
            ColumnData::Float64(v) => {
                zip_blocks(v.chunks_mut(block_rows).map(ValuesMut::Float64), validity)
            }
            ColumnData::Bool(v) => zip_blocks(v.chunks_mut(block_rows).map(ValuesMut::Bool), validity),
            ColumnData::Date(v) => zip_blocks(v.chunks_mut(block_rows).map(ValuesMut::Date), validity),
            ColumnData::Str(v) => zip_blocks(v.chunks_mut(block_rows).map(ValuesMut::Str), validity),
        }
    }
}

fn zip_blocks<'a>(
    values: impl Iterator<Item = ValuesMut<'a>>,
    validity: std::slice::ChunksMut<'a, bool>,
) -> Vec<CellBlockMut<'a>> {
    values
        .zip(validity)
        .map(|(values, validity)| CellBlockMut { values, validity })
        .collect()
}

/// Mutable view over a contiguous run of one column's values.
pub(crate) enum ValuesMut<'a> {
    Int64(&'a mut [i64]),
    Float64(&'a mut [f64]),
    Bool(&'a mut [bool]),
    Date(&'a mut [i64]),
    Str(&'a mut [String]),
}

/// A row block of one column, owned by exactly one decode task.
pub(crate) struct CellBlockMut<'a> {
    pub values: ValuesMut<'a>,
    pub validity: &'a mut [bool],
}

/// Decoded columns plus their names.
#[derive(Debug, Clone, PartialEq)]
pub struct CsvTable {
    pub columns: Vec<ColumnBuffer>,
}

impl CsvTable {
    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&ColumnBuffer> {
        self.columns.iter().find(|c| c.name == name)
    }
}
