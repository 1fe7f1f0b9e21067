use crate::skysim_errors::SkysimError;

/// Element kind of a [`Column`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Float,
    Int,
    Bool,
    Str,
}

impl ColumnKind {
    pub fn name(&self) -> &'static str {
        match self {
            ColumnKind::Float => "f8",
            ColumnKind::Int => "i8",
            ColumnKind::Bool => "bool",
            ColumnKind::Str => "str",
        }
    }

    pub fn from_name(name: &str) -> Result<Self, SkysimError> {
        match name {
            "f8" => Ok(ColumnKind::Float),
            "i8" => Ok(ColumnKind::Int),
            "bool" => Ok(ColumnKind::Bool),
            "str" => Ok(ColumnKind::Str),
            other => Err(SkysimError::ParseError(format!(
                "unknown column kind '{other}'"
            ))),
        }
    }
}

/// Row subset specification used by table filtering.
///
/// Both forms always copy; a selected table never aliases the storage of its
/// source.
#[derive(Debug, Clone)]
pub enum Rows {
    /// Boolean mask, one flag per row of the source table.
    Mask(Vec<bool>),
    /// Explicit row indices; repetitions and arbitrary order are allowed.
    Indices(Vec<usize>),
}

fn select_vec<T: Clone>(
    values: &[T],
    rows: &Rows,
    name: &str,
) -> Result<Vec<T>, SkysimError> {
    match rows {
        Rows::Mask(mask) => {
            if mask.len() != values.len() {
                return Err(SkysimError::SchemaMismatch(format!(
                    "mask length {} does not match column '{}' length {}",
                    mask.len(),
                    name,
                    values.len()
                )));
            }
            Ok(values
                .iter()
                .zip(mask)
                .filter_map(|(v, &keep)| keep.then(|| v.clone()))
                .collect())
        }
        Rows::Indices(idx) => idx
            .iter()
            .map(|&i| {
                values.get(i).cloned().ok_or_else(|| {
                    SkysimError::SchemaMismatch(format!(
                        "row index {} out of bounds for column '{}' of length {}",
                        i,
                        name,
                        values.len()
                    ))
                })
            })
            .collect(),
    }
}

/// A fixed-length homogeneous array, one per named column of a table.
///
/// The sentinel value marking "no data" is NaN for [`Column::Float`], `0` for
/// [`Column::Int`], `false` for [`Column::Bool`] and the empty string for
/// [`Column::Str`]. Downstream comparisons rely on masking these out, so the
/// choice is part of the on-disk contract and must not change.
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Column::Float(v) => v.len(),
            Column::Int(v) => v.len(),
            Column::Bool(v) => v.len(),
            Column::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn kind(&self) -> ColumnKind {
        match self {
            Column::Float(_) => ColumnKind::Float,
            Column::Int(_) => ColumnKind::Int,
            Column::Bool(_) => ColumnKind::Bool,
            Column::Str(_) => ColumnKind::Str,
        }
    }

    /// A column of `len` sentinel values of the given kind.
    pub fn sentinel(kind: ColumnKind, len: usize) -> Self {
        match kind {
            ColumnKind::Float => Column::Float(vec![f64::NAN; len]),
            ColumnKind::Int => Column::Int(vec![0; len]),
            ColumnKind::Bool => Column::Bool(vec![false; len]),
            ColumnKind::Str => Column::Str(vec![String::new(); len]),
        }
    }

    /// Append `count` sentinel values in place.
    pub fn extend_sentinel(&mut self, count: usize) {
        match self {
            Column::Float(v) => v.extend(std::iter::repeat(f64::NAN).take(count)),
            Column::Int(v) => v.extend(std::iter::repeat(0).take(count)),
            Column::Bool(v) => v.extend(std::iter::repeat(false).take(count)),
            Column::Str(v) => v.extend(std::iter::repeat(String::new()).take(count)),
        }
    }

    /// Copy of the rows designated by `rows`; `name` is only used in error
    /// messages.
    pub fn select(&self, rows: &Rows, name: &str) -> Result<Column, SkysimError> {
        Ok(match self {
            Column::Float(v) => Column::Float(select_vec(v, rows, name)?),
            Column::Int(v) => Column::Int(select_vec(v, rows, name)?),
            Column::Bool(v) => Column::Bool(select_vec(v, rows, name)?),
            Column::Str(v) => Column::Str(select_vec(v, rows, name)?),
        })
    }

    /// Concatenation `self` then `other`; kinds must agree.
    pub fn concat(&self, other: &Column, name: &str) -> Result<Column, SkysimError> {
        match (self, other) {
            (Column::Float(a), Column::Float(b)) => {
                Ok(Column::Float(a.iter().chain(b).copied().collect()))
            }
            (Column::Int(a), Column::Int(b)) => {
                Ok(Column::Int(a.iter().chain(b).copied().collect()))
            }
            (Column::Bool(a), Column::Bool(b)) => {
                Ok(Column::Bool(a.iter().chain(b).copied().collect()))
            }
            (Column::Str(a), Column::Str(b)) => {
                Ok(Column::Str(a.iter().chain(b).cloned().collect()))
            }
            (a, b) => Err(SkysimError::SchemaMismatch(format!(
                "column '{}': cannot concatenate {} with {}",
                name,
                a.kind().name(),
                b.kind().name()
            ))),
        }
    }

    /// Write `from[from_rows[k]]` into `self[into_rows[k]]` for every k.
    ///
    /// Kinds must agree; both index slices must have the same length and be
    /// in bounds.
    pub fn overwrite_rows(
        &mut self,
        into_rows: &[usize],
        from: &Column,
        from_rows: &[usize],
        name: &str,
    ) -> Result<(), SkysimError> {
        if into_rows.len() != from_rows.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "column '{}': {} destination rows vs {} source rows",
                name,
                into_rows.len(),
                from_rows.len()
            )));
        }
        let bounds_err = |i: usize, len: usize| {
            SkysimError::SchemaMismatch(format!(
                "column '{name}': row index {i} out of bounds for length {len}"
            ))
        };
        match (self, from) {
            (Column::Float(dst), Column::Float(src)) => {
                for (&i, &j) in into_rows.iter().zip(from_rows) {
                    let v = *src.get(j).ok_or_else(|| bounds_err(j, src.len()))?;
                    let len = dst.len();
                    *dst.get_mut(i).ok_or_else(|| bounds_err(i, len))? = v;
                }
            }
            (Column::Int(dst), Column::Int(src)) => {
                for (&i, &j) in into_rows.iter().zip(from_rows) {
                    let v = *src.get(j).ok_or_else(|| bounds_err(j, src.len()))?;
                    let len = dst.len();
                    *dst.get_mut(i).ok_or_else(|| bounds_err(i, len))? = v;
                }
            }
            (Column::Bool(dst), Column::Bool(src)) => {
                for (&i, &j) in into_rows.iter().zip(from_rows) {
                    let v = *src.get(j).ok_or_else(|| bounds_err(j, src.len()))?;
                    let len = dst.len();
                    *dst.get_mut(i).ok_or_else(|| bounds_err(i, len))? = v;
                }
            }
            (Column::Str(dst), Column::Str(src)) => {
                for (&i, &j) in into_rows.iter().zip(from_rows) {
                    let v = src.get(j).ok_or_else(|| bounds_err(j, src.len()))?.clone();
                    let len = dst.len();
                    *dst.get_mut(i).ok_or_else(|| bounds_err(i, len))? = v;
                }
            }
            (dst, src) => {
                return Err(SkysimError::SchemaMismatch(format!(
                    "column '{}': cannot write {} values into {} column",
                    name,
                    src.kind().name(),
                    dst.kind().name()
                )))
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn select_mask_and_indices() {
        let col = Column::Int(vec![10, 20, 30]);
        let by_mask = col
            .select(&Rows::Mask(vec![true, false, true]), "x")
            .unwrap();
        assert_eq!(by_mask, Column::Int(vec![10, 30]));
        let by_idx = col.select(&Rows::Indices(vec![2, 0, 2]), "x").unwrap();
        assert_eq!(by_idx, Column::Int(vec![30, 10, 30]));
    }

    #[test]
    fn select_bad_mask_length_fails() {
        let col = Column::Float(vec![1.0, 2.0]);
        let err = col.select(&Rows::Mask(vec![true]), "x").unwrap_err();
        assert!(matches!(err, SkysimError::SchemaMismatch(_)));
    }

    #[test]
    fn sentinel_values_per_kind() {
        match Column::sentinel(ColumnKind::Float, 2) {
            Column::Float(v) => assert!(v.iter().all(|x| x.is_nan())),
            _ => unreachable!(),
        }
        assert_eq!(Column::sentinel(ColumnKind::Int, 1), Column::Int(vec![0]));
        assert_eq!(
            Column::sentinel(ColumnKind::Bool, 1),
            Column::Bool(vec![false])
        );
        assert_eq!(
            Column::sentinel(ColumnKind::Str, 1),
            Column::Str(vec![String::new()])
        );
    }

    #[test]
    fn concat_kind_mismatch_fails() {
        let a = Column::Int(vec![1]);
        let b = Column::Float(vec![1.0]);
        assert!(matches!(
            a.concat(&b, "x"),
            Err(SkysimError::SchemaMismatch(_))
        ));
    }

    #[test]
    fn overwrite_rows_copies_values() {
        let mut dst = Column::Str(vec!["a".into(), "b".into(), "c".into()]);
        let src = Column::Str(vec!["X".into(), "Y".into()]);
        dst.overwrite_rows(&[2, 0], &src, &[0, 1], "s").unwrap();
        assert_eq!(
            dst,
            Column::Str(vec!["Y".into(), "b".into(), "X".into()])
        );
    }
}
