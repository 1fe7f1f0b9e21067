//! Tabular store boundary.
//!
//! The catalog subsystem treats the on-disk table format as an opaque store
//! exposing `read(path) -> table` and `write(table, path)`. This module
//! realizes it as a CSV codec with a typed header (`name:kind`, kinds `f8`,
//! `i8`, `bool`, `str`) so that column names, kinds, values and the
//! NaN/0/false/"" sentinels round-trip exactly.

use camino::Utf8Path;
use log::info;

use crate::catalog::column::{Column, ColumnKind};
use crate::catalog::table::ColumnTable;
use crate::skysim_errors::SkysimError;

/// Read a table from the store.
pub fn read_table(path: &Utf8Path) -> Result<ColumnTable, SkysimError> {
    info!("reading table from {path}");
    let mut reader = csv::Reader::from_path(path)?;

    let mut names = Vec::new();
    let mut kinds = Vec::new();
    for field in reader.headers()?.iter() {
        let (name, kind) = field.rsplit_once(':').ok_or_else(|| {
            SkysimError::ParseError(format!(
                "{path}: header field '{field}' is not of the form name:kind"
            ))
        })?;
        names.push(name.to_string());
        kinds.push(ColumnKind::from_name(kind)?);
    }

    let mut columns: Vec<Column> = kinds
        .iter()
        .map(|&kind| match kind {
            ColumnKind::Float => Column::Float(Vec::new()),
            ColumnKind::Int => Column::Int(Vec::new()),
            ColumnKind::Bool => Column::Bool(Vec::new()),
            ColumnKind::Str => Column::Str(Vec::new()),
        })
        .collect();

    for (irow, record) in reader.records().enumerate() {
        let record = record?;
        if record.len() != names.len() {
            return Err(SkysimError::ParseError(format!(
                "{path}: row {irow} has {} fields, header has {}",
                record.len(),
                names.len()
            )));
        }
        for ((cell, column), name) in record.iter().zip(&mut columns).zip(&names) {
            let bad_cell = || {
                SkysimError::ParseError(format!(
                    "{path}: row {irow}, column '{name}': cannot parse '{cell}'"
                ))
            };
            match column {
                Column::Float(v) => v.push(cell.parse().map_err(|_| bad_cell())?),
                Column::Int(v) => v.push(cell.parse().map_err(|_| bad_cell())?),
                Column::Bool(v) => v.push(cell.parse().map_err(|_| bad_cell())?),
                Column::Str(v) => v.push(cell.to_string()),
            }
        }
    }

    let mut table = ColumnTable::new();
    for (name, column) in names.iter().zip(columns) {
        table.set(name, column)?;
    }
    Ok(table)
}

/// Write a table to the store, creating parent directories as needed.
pub fn write_table(table: &ColumnTable, path: &Utf8Path) -> Result<(), SkysimError> {
    info!("writing {} rows to {path}", table.len());
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let mut writer = csv::Writer::from_path(path)?;

    let header: Vec<String> = table
        .fields()
        .iter()
        .map(|name| {
            let kind = table
                .get(name)
                .unwrap_or_else(|_| unreachable!())
                .kind()
                .name();
            format!("{name}:{kind}")
        })
        .collect();
    writer.write_record(&header)?;

    for row in 0..table.len() {
        let mut record = Vec::with_capacity(table.fields().len());
        for name in table.fields() {
            let cell = match table.get(name).unwrap_or_else(|_| unreachable!()) {
                // Ryu-style shortest representation round-trips f64 exactly,
                // including NaN.
                Column::Float(v) => format!("{:?}", v[row]),
                Column::Int(v) => v[row].to_string(),
                Column::Bool(v) => v[row].to_string(),
                Column::Str(v) => v[row].clone(),
            };
            record.push(cell);
        }
        writer.write_record(&record)?;
    }
    writer.flush()?;
    Ok(())
}
