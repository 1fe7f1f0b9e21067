use std::collections::HashMap;

use ahash::RandomState;

use crate::catalog::column::{Column, ColumnKind, Rows};
use crate::skysim_errors::SkysimError;

/// Row destination of a [`ColumnTable::merge`].
#[derive(Debug, Clone)]
pub enum MergeIndex {
    /// Boolean mask over the rows of self; the number of `true` flags must
    /// equal the number of source rows.
    Mask(Vec<bool>),
    /// Explicit destination row indices, aligned one-to-one with the source
    /// rows.
    Indices(Vec<usize>),
    /// Append the source rows after the existing rows of self.
    Append,
}

/// What to do when a merged column exists in both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Overwrite the rows of self designated by the merge index.
    Overwrite,
    /// Refuse the merge with [`SkysimError::SchemaMismatch`].
    Fail,
}

/// In-memory table of named, equal-length columns.
///
/// Column order is preserved (insertion order); rows are identified only by
/// position unless a caller adds an explicit id column. Every mutating
/// operation upholds the invariant that all columns share the same row count.
#[derive(Debug, Clone, Default)]
pub struct ColumnTable {
    names: Vec<String>,
    columns: HashMap<String, Column, RandomState>,
}

impl ColumnTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows (0 for a table with no columns).
    pub fn len(&self) -> usize {
        self.names
            .first()
            .and_then(|name| self.columns.get(name))
            .map_or(0, Column::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Column names, in insertion order.
    pub fn fields(&self) -> &[String] {
        &self.names
    }

    pub fn has(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    /// `0..N`, used as a join key by matching and merge.
    pub fn index(&self) -> Vec<usize> {
        (0..self.len()).collect()
    }

    pub fn get(&self, name: &str) -> Result<&Column, SkysimError> {
        self.columns
            .get(name)
            .ok_or_else(|| SkysimError::NotFound(format!("column '{name}'")))
    }

    pub fn get_float(&self, name: &str) -> Result<&[f64], SkysimError> {
        match self.get(name)? {
            Column::Float(v) => Ok(v),
            other => Err(SkysimError::SchemaMismatch(format!(
                "column '{}' has kind {}, expected f8",
                name,
                other.kind().name()
            ))),
        }
    }

    pub fn get_int(&self, name: &str) -> Result<&[i64], SkysimError> {
        match self.get(name)? {
            Column::Int(v) => Ok(v),
            other => Err(SkysimError::SchemaMismatch(format!(
                "column '{}' has kind {}, expected i8",
                name,
                other.kind().name()
            ))),
        }
    }

    pub fn get_bool(&self, name: &str) -> Result<&[bool], SkysimError> {
        match self.get(name)? {
            Column::Bool(v) => Ok(v),
            other => Err(SkysimError::SchemaMismatch(format!(
                "column '{}' has kind {}, expected bool",
                name,
                other.kind().name()
            ))),
        }
    }

    pub fn get_str(&self, name: &str) -> Result<&[String], SkysimError> {
        match self.get(name)? {
            Column::Str(v) => Ok(v),
            other => Err(SkysimError::SchemaMismatch(format!(
                "column '{}' has kind {}, expected str",
                name,
                other.kind().name()
            ))),
        }
    }

    /// Add or replace a column.
    ///
    /// On a non-empty table the length must match the established row count;
    /// on an empty table the first `set` establishes it.
    pub fn set(&mut self, name: &str, column: Column) -> Result<(), SkysimError> {
        if !self.names.is_empty() && column.len() != self.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "column '{}' has {} rows, table has {}",
                name,
                column.len(),
                self.len()
            )));
        }
        if !self.columns.contains_key(name) {
            self.names.push(name.to_string());
        }
        self.columns.insert(name.to_string(), column);
        Ok(())
    }

    pub fn remove(&mut self, name: &str) -> Result<Column, SkysimError> {
        let column = self
            .columns
            .remove(name)
            .ok_or_else(|| SkysimError::NotFound(format!("column '{name}'")))?;
        self.names.retain(|n| n != name);
        Ok(column)
    }

    /// Rename column `old` into `new`.
    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), SkysimError> {
        if !self.columns.contains_key(old) {
            return Err(SkysimError::NotFound(format!("column '{old}'")));
        }
        if self.columns.contains_key(new) {
            return Err(SkysimError::SchemaMismatch(format!(
                "column '{new}' already exists"
            )));
        }
        let column = self.columns.remove(old).unwrap_or_else(|| unreachable!());
        self.columns.insert(new.to_string(), column);
        for name in &mut self.names {
            if name == old {
                *name = new.to_string();
            }
        }
        Ok(())
    }

    /// Drop every column not listed. Listed names absent from the table are
    /// ignored.
    pub fn keep_columns(&mut self, names: &[&str]) {
        let keep: Vec<String> = self
            .names
            .iter()
            .filter(|n| names.contains(&n.as_str()))
            .cloned()
            .collect();
        self.columns.retain(|name, _| keep.contains(name));
        self.names = keep;
    }

    /// New table with every column filtered identically; always copies.
    pub fn select(&self, rows: &Rows) -> Result<ColumnTable, SkysimError> {
        let mut out = ColumnTable::new();
        for name in &self.names {
            let column = self.columns[name].select(rows, name)?;
            out.set(name, column)?;
        }
        Ok(out)
    }

    /// In-place row subset, the mutating counterpart of [`select`](Self::select).
    pub fn cut(&mut self, rows: &Rows) -> Result<(), SkysimError> {
        *self = self.select(rows)?;
        Ok(())
    }

    /// Concatenation of two tables with identical column-name sets; `a`'s
    /// rows precede `b`'s, column order and kinds follow `a`.
    pub fn concat(a: &ColumnTable, b: &ColumnTable) -> Result<ColumnTable, SkysimError> {
        for name in b.fields() {
            if !a.has(name) {
                return Err(SkysimError::SchemaMismatch(format!(
                    "column '{name}' present only in the second table"
                )));
            }
        }
        let mut out = ColumnTable::new();
        for name in &a.names {
            let other = b.get(name).map_err(|_| {
                SkysimError::SchemaMismatch(format!(
                    "column '{name}' present only in the first table"
                ))
            })?;
            out.set(name, a.columns[name].concat(other, name)?)?;
        }
        Ok(out)
    }

    /// Merge rows of `other` into self.
    ///
    /// `index_self` designates the destination rows (or [`MergeIndex::Append`]
    /// for new rows at the end); `index_other` the aligned source rows of
    /// `other`. Columns present only in `other` are added to self, with every
    /// row not covered by `index_self` set to the kind's sentinel (NaN, 0,
    /// false, empty string). Columns present in both follow `policy`; an
    /// appended row is new, so appends write shared columns regardless of the
    /// policy. A failed merge leaves self untouched.
    pub fn merge(
        &mut self,
        other: &ColumnTable,
        index_self: &MergeIndex,
        index_other: &[usize],
        policy: CollisionPolicy,
    ) -> Result<(), SkysimError> {
        let appending = matches!(index_self, MergeIndex::Append);
        let into_rows: Vec<usize> = match index_self {
            MergeIndex::Mask(mask) => {
                if mask.len() != self.len() {
                    return Err(SkysimError::SchemaMismatch(format!(
                        "merge mask length {} does not match table length {}",
                        mask.len(),
                        self.len()
                    )));
                }
                mask.iter()
                    .enumerate()
                    .filter_map(|(i, &keep)| keep.then_some(i))
                    .collect()
            }
            MergeIndex::Indices(idx) => idx.clone(),
            MergeIndex::Append => (self.len()..self.len() + index_other.len()).collect(),
        };
        if into_rows.len() != index_other.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "merge aligns {} destination rows with {} source rows",
                into_rows.len(),
                index_other.len()
            )));
        }

        // Validate every column before mutating anything, so an error cannot
        // leave the table half-merged.
        let nrows = if appending {
            self.len() + index_other.len()
        } else {
            self.len()
        };
        if let Some(&row) = into_rows.iter().find(|&&i| i >= nrows) {
            return Err(SkysimError::SchemaMismatch(format!(
                "merge destination row {row} out of bounds for {nrows} rows"
            )));
        }
        if let Some(&row) = index_other.iter().find(|&&j| j >= other.len()) {
            return Err(SkysimError::SchemaMismatch(format!(
                "merge source row {row} out of bounds for {} rows",
                other.len()
            )));
        }
        for name in other.fields() {
            let source = other.get(name)?;
            if let Some(existing) = self.columns.get(name) {
                if policy == CollisionPolicy::Fail && !appending {
                    return Err(SkysimError::SchemaMismatch(format!(
                        "column '{name}' present in both tables"
                    )));
                }
                if existing.kind() != source.kind() {
                    return Err(SkysimError::SchemaMismatch(format!(
                        "column '{}': cannot write {} values into {} column",
                        name,
                        source.kind().name(),
                        existing.kind().name()
                    )));
                }
            }
        }

        if appending {
            for name in &self.names {
                if let Some(column) = self.columns.get_mut(name) {
                    column.extend_sentinel(index_other.len());
                }
            }
        }
        for name in other.fields().to_vec() {
            let source = other.get(&name)?;
            if !self.has(&name) {
                self.set(&name, Column::sentinel(source.kind(), nrows))?;
            }
            let column = self
                .columns
                .get_mut(&name)
                .unwrap_or_else(|| unreachable!());
            column.overwrite_rows(&into_rows, source, index_other, &name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_table() -> ColumnTable {
        let mut t = ColumnTable::new();
        t.set("x", Column::Float(vec![1.0, 2.0, 3.0])).unwrap();
        t.set("name", Column::Str(vec!["a".into(), "b".into(), "c".into()]))
            .unwrap();
        t
    }

    #[test]
    fn first_set_establishes_row_count() {
        let mut t = ColumnTable::new();
        assert_eq!(t.len(), 0);
        t.set("x", Column::Int(vec![1, 2])).unwrap();
        assert_eq!(t.len(), 2);
        let err = t.set("y", Column::Int(vec![1])).unwrap_err();
        assert!(matches!(err, SkysimError::SchemaMismatch(_)));
    }

    #[test]
    fn rename_errors() {
        let mut t = small_table();
        assert!(matches!(
            t.rename("missing", "y"),
            Err(SkysimError::NotFound(_))
        ));
        assert!(matches!(
            t.rename("x", "name"),
            Err(SkysimError::SchemaMismatch(_))
        ));
        t.rename("x", "flux").unwrap();
        assert_eq!(t.fields(), ["flux", "name"]);
        assert_eq!(t.get_float("flux").unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn select_is_idempotent_under_all_true() {
        let t = small_table();
        let once = t.select(&Rows::Mask(vec![true, false, true])).unwrap();
        let twice = once.select(&Rows::Mask(vec![true, true])).unwrap();
        assert_eq!(once.get_float("x").unwrap(), twice.get_float("x").unwrap());
        assert_eq!(
            once.get_str("name").unwrap(),
            twice.get_str("name").unwrap()
        );
    }

    #[test]
    fn select_copies_storage() {
        let t = small_table();
        let mut sub = t.select(&Rows::Indices(vec![0])).unwrap();
        sub.set("x", Column::Float(vec![99.0])).unwrap();
        assert_eq!(t.get_float("x").unwrap(), [1.0, 2.0, 3.0]);
    }

    #[test]
    fn keep_columns_drops_the_rest() {
        let mut t = small_table();
        t.keep_columns(&["name"]);
        assert_eq!(t.fields(), ["name"]);
        assert!(t.get("x").is_err());
    }

    #[test]
    fn concat_requires_identical_name_sets() {
        let a = small_table();
        let b = small_table();
        let joined = ColumnTable::concat(&a, &b).unwrap();
        assert_eq!(joined.len(), 6);
        assert_eq!(joined.get_float("x").unwrap(), [1.0, 2.0, 3.0, 1.0, 2.0, 3.0]);

        let mut c = small_table();
        c.set("extra", Column::Bool(vec![true, false, true])).unwrap();
        assert!(matches!(
            ColumnTable::concat(&a, &c),
            Err(SkysimError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn merge_fills_uncovered_rows_with_sentinel() {
        // Scenario: A{rows=2, cols=[x]} merged with B{cols=[x, y]} at
        // index_self=[1], index_other=[0].
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0, 2.0])).unwrap();
        let mut b = ColumnTable::new();
        b.set("x", Column::Float(vec![10.0])).unwrap();
        b.set("y", Column::Float(vec![20.0])).unwrap();

        a.merge(
            &b,
            &MergeIndex::Indices(vec![1]),
            &[0],
            CollisionPolicy::Overwrite,
        )
        .unwrap();

        let y = a.get_float("y").unwrap();
        assert!(y[0].is_nan());
        assert_eq!(y[1], 20.0);
        assert_eq!(a.get_float("x").unwrap(), [1.0, 10.0]);
    }

    #[test]
    fn merge_collision_policy_fail() {
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0, 2.0])).unwrap();
        let mut b = ColumnTable::new();
        b.set("x", Column::Float(vec![10.0])).unwrap();

        let err = a
            .merge(
                &b,
                &MergeIndex::Indices(vec![1]),
                &[0],
                CollisionPolicy::Fail,
            )
            .unwrap_err();
        assert!(matches!(err, SkysimError::SchemaMismatch(_)));
    }

    #[test]
    fn merge_append_adds_rows() {
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0])).unwrap();
        a.set("tag", Column::Str(vec!["old".into()])).unwrap();
        let mut b = ColumnTable::new();
        b.set("x", Column::Float(vec![5.0, 6.0])).unwrap();
        b.set("y", Column::Int(vec![7, 8])).unwrap();

        a.merge(&b, &MergeIndex::Append, &[0, 1], CollisionPolicy::Fail)
            .unwrap();

        assert_eq!(a.len(), 3);
        assert_eq!(a.get_float("x").unwrap(), [1.0, 5.0, 6.0]);
        // Appended rows take the sentinel in columns b does not provide.
        assert_eq!(a.get_str("tag").unwrap(), ["old", "", ""]);
        // Pre-existing rows take the sentinel in columns b introduces.
        assert_eq!(a.get_int("y").unwrap(), [0, 7, 8]);
    }

    #[test]
    fn failed_merge_leaves_table_untouched() {
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0, 2.0])).unwrap();
        let mut b = ColumnTable::new();
        // Column order puts the new column first, so a non-atomic merge would
        // add it before hitting the collision on x.
        b.set("y", Column::Float(vec![20.0])).unwrap();
        b.set("x", Column::Float(vec![10.0])).unwrap();

        let err = a
            .merge(
                &b,
                &MergeIndex::Indices(vec![1]),
                &[0],
                CollisionPolicy::Fail,
            )
            .unwrap_err();
        assert!(matches!(err, SkysimError::SchemaMismatch(_)));
        assert!(!a.has("y"));
        assert_eq!(a.fields(), ["x"]);
        assert_eq!(a.get_float("x").unwrap(), [1.0, 2.0]);
    }

    #[test]
    fn kind_mismatch_merge_leaves_table_untouched() {
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0, 2.0])).unwrap();
        let mut b = ColumnTable::new();
        b.set("y", Column::Float(vec![20.0])).unwrap();
        b.set("x", Column::Int(vec![10])).unwrap();

        let err = a
            .merge(
                &b,
                &MergeIndex::Indices(vec![1]),
                &[0],
                CollisionPolicy::Overwrite,
            )
            .unwrap_err();
        assert!(matches!(err, SkysimError::SchemaMismatch(_)));
        assert!(!a.has("y"));
        assert_eq!(a.get_float("x").unwrap(), [1.0, 2.0]);
    }

    #[test]
    fn out_of_bounds_merge_leaves_table_untouched() {
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0, 2.0])).unwrap();
        let mut b = ColumnTable::new();
        b.set("y", Column::Float(vec![20.0])).unwrap();

        let err = a
            .merge(
                &b,
                &MergeIndex::Indices(vec![5]),
                &[0],
                CollisionPolicy::Overwrite,
            )
            .unwrap_err();
        assert!(matches!(err, SkysimError::SchemaMismatch(_)));
        assert!(!a.has("y"));
    }

    #[test]
    fn merge_with_mask_destination() {
        let mut a = ColumnTable::new();
        a.set("x", Column::Float(vec![1.0, 2.0, 3.0])).unwrap();
        let mut b = ColumnTable::new();
        b.set("y", Column::Float(vec![10.0, 30.0])).unwrap();

        a.merge(
            &b,
            &MergeIndex::Mask(vec![true, false, true]),
            &[0, 1],
            CollisionPolicy::Overwrite,
        )
        .unwrap();

        let y = a.get_float("y").unwrap();
        assert_eq!(y[0], 10.0);
        assert!(y[1].is_nan());
        assert_eq!(y[2], 30.0);
    }
}
