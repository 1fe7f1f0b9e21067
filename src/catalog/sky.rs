use camino::Utf8Path;
use itertools::izip;
use log::debug;
use nalgebra::Vector3;

use crate::catalog::column::{Column, Rows};
use crate::catalog::table::{CollisionPolicy, ColumnTable, MergeIndex};
use crate::catalog::table_file;
use crate::constants::{Degree, RADEG};
use crate::skysim_errors::SkysimError;

/// Unit vector on the celestial sphere for (ra, dec) in degrees.
pub(crate) fn radec_to_xyz(ra: Degree, dec: Degree) -> Vector3<f64> {
    let (sin_ra, cos_ra) = (ra * RADEG).sin_cos();
    let (sin_dec, cos_dec) = (dec * RADEG).sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Matched index pairs of a sphere match, with their angular separations.
///
/// The two index arrays have equal length; rows without a match below the
/// radius are simply absent, never sentinel-padded.
#[derive(Debug, Clone, Default)]
pub struct RadecMatch {
    pub index_self: Vec<usize>,
    pub index_other: Vec<usize>,
    pub separation_deg: Vec<Degree>,
}

impl RadecMatch {
    pub fn len(&self) -> usize {
        self.index_self.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index_self.is_empty()
    }
}

/// A [`ColumnTable`] with mandatory sky-position columns.
///
/// `ra` (degrees, `[0, 360)`) and `dec` (degrees, `[-90, 90]`) are f8 columns
/// validated at construction; all other table operations are inherited by
/// delegation, re-validating whenever the position columns could be touched.
#[derive(Debug, Clone)]
pub struct SkyCatalog {
    table: ColumnTable,
}

fn check_positions(table: &ColumnTable) -> Result<(), SkysimError> {
    let ra = table.get_float("ra")?;
    let dec = table.get_float("dec")?;
    for (i, (&r, &d)) in ra.iter().zip(dec).enumerate() {
        if !(0.0..360.0).contains(&r) || !(-90.0..=90.0).contains(&d) {
            return Err(SkysimError::SchemaMismatch(format!(
                "row {i}: position (ra={r}, dec={d}) outside ra [0, 360), dec [-90, 90]"
            )));
        }
    }
    Ok(())
}

impl SkyCatalog {
    /// Wrap a table, validating the mandatory position columns.
    pub fn new(table: ColumnTable) -> Result<Self, SkysimError> {
        check_positions(&table)?;
        Ok(SkyCatalog { table })
    }

    /// Catalog holding only the position columns.
    pub fn from_radec(ra: Vec<Degree>, dec: Vec<Degree>) -> Result<Self, SkysimError> {
        if ra.len() != dec.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "{} ra values vs {} dec values",
                ra.len(),
                dec.len()
            )));
        }
        let mut table = ColumnTable::new();
        table.set("ra", Column::Float(ra))?;
        table.set("dec", Column::Float(dec))?;
        SkyCatalog::new(table)
    }

    /// Read from the tabular store.
    pub fn read(path: &Utf8Path) -> Result<Self, SkysimError> {
        SkyCatalog::new(table_file::read_table(path)?)
    }

    /// Write to the tabular store.
    pub fn write(&self, path: &Utf8Path) -> Result<(), SkysimError> {
        table_file::write_table(&self.table, path)
    }

    pub fn table(&self) -> &ColumnTable {
        &self.table
    }

    pub fn into_table(self) -> ColumnTable {
        self.table
    }

    pub fn ra(&self) -> &[f64] {
        self.table
            .get_float("ra")
            .unwrap_or_else(|_| unreachable!("validated at construction"))
    }

    pub fn dec(&self) -> &[f64] {
        self.table
            .get_float("dec")
            .unwrap_or_else(|_| unreachable!("validated at construction"))
    }

    // ---------------------------------------------------------------------------------------------
    // Delegated table operations
    // ---------------------------------------------------------------------------------------------

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn fields(&self) -> &[String] {
        self.table.fields()
    }

    pub fn index(&self) -> Vec<usize> {
        self.table.index()
    }

    pub fn get(&self, name: &str) -> Result<&Column, SkysimError> {
        self.table.get(name)
    }

    pub fn get_float(&self, name: &str) -> Result<&[f64], SkysimError> {
        self.table.get_float(name)
    }

    /// Add or replace a column; replacing `ra`/`dec` re-validates the ranges.
    pub fn set(&mut self, name: &str, column: Column) -> Result<(), SkysimError> {
        self.table.set(name, column)?;
        if name == "ra" || name == "dec" {
            check_positions(&self.table)?;
        }
        Ok(())
    }

    pub fn rename(&mut self, old: &str, new: &str) -> Result<(), SkysimError> {
        if old == "ra" || old == "dec" {
            return Err(SkysimError::SchemaMismatch(format!(
                "cannot rename mandatory position column '{old}'"
            )));
        }
        self.table.rename(old, new)
    }

    /// Drop every column not listed; the position columns are always kept.
    pub fn keep_columns(&mut self, names: &[&str]) {
        let mut keep = vec!["ra", "dec"];
        keep.extend_from_slice(names);
        self.table.keep_columns(&keep);
    }

    pub fn select(&self, rows: &Rows) -> Result<SkyCatalog, SkysimError> {
        Ok(SkyCatalog {
            table: self.table.select(rows)?,
        })
    }

    /// In-place row subset.
    pub fn cut(&mut self, rows: &Rows) -> Result<(), SkysimError> {
        self.table.cut(rows)
    }

    pub fn concat(a: &SkyCatalog, b: &SkyCatalog) -> Result<SkyCatalog, SkysimError> {
        Ok(SkyCatalog {
            table: ColumnTable::concat(&a.table, &b.table)?,
        })
    }

    /// See [`ColumnTable::merge`]; positions are re-validated since shared
    /// `ra`/`dec` columns may have been overwritten. The merge happens aside
    /// and is committed only once both steps succeed, so a failed merge
    /// leaves the catalog untouched.
    pub fn merge(
        &mut self,
        other: &SkyCatalog,
        index_self: &MergeIndex,
        index_other: &[usize],
        policy: CollisionPolicy,
    ) -> Result<(), SkysimError> {
        let mut merged = self.table.clone();
        merged.merge(&other.table, index_self, index_other, policy)?;
        check_positions(&merged)?;
        self.table = merged;
        Ok(())
    }

    // ---------------------------------------------------------------------------------------------
    // Sphere matching
    // ---------------------------------------------------------------------------------------------

    /// Sphere-match against `other` within `radius_deg`.
    ///
    /// Positions are compared as unit-sphere vectors through the equivalent
    /// chord-length threshold `2 sin(θ/2)`, so the match is exact across the
    /// RA 0/360° wrap and at the poles, where planar (Δra, Δdec) tests break.
    ///
    /// With `nearest = true` each row of self keeps at most the one candidate
    /// with minimum separation (exact ties break toward the lower row index
    /// in `other`), and each row of `other` is claimed at most once (the pair
    /// with the smaller separation wins, ties toward the lower self index),
    /// so the number of pairs is bounded by the smaller catalog. With
    /// `nearest = false` every pair below the radius is returned, ordered by
    /// (self, other) index.
    pub fn match_radec(
        &self,
        other: &SkyCatalog,
        radius_deg: Degree,
        nearest: bool,
    ) -> RadecMatch {
        let mut out = RadecMatch::default();
        if self.is_empty() || other.is_empty() || radius_deg <= 0.0 {
            return out;
        }

        let xyz_self: Vec<Vector3<f64>> = izip!(self.ra(), self.dec())
            .map(|(&r, &d)| radec_to_xyz(r, d))
            .collect();
        let xyz_other: Vec<Vector3<f64>> = izip!(other.ra(), other.dec())
            .map(|(&r, &d)| radec_to_xyz(r, d))
            .collect();

        // Chord length corresponding to the angular radius; comparisons use
        // the squared value.
        let chord = 2.0 * (0.5 * radius_deg * RADEG).sin();
        let chord2 = chord * chord;

        // Candidate pruning: only rows of `other` within the dec band
        // [dec - radius, dec + radius] can fall below the radius.
        let dec_other = other.dec();
        let mut order: Vec<usize> = (0..dec_other.len()).collect();
        order.sort_by(|&a, &b| {
            dec_other[a]
                .partial_cmp(&dec_other[b])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        let sorted_dec: Vec<f64> = order.iter().map(|&j| dec_other[j]).collect();

        // nearest: per-other best claim (separation, self index).
        let mut claimed: Vec<Option<(f64, usize)>> = if nearest {
            vec![None; other.len()]
        } else {
            Vec::new()
        };

        for (i, (v, &dec)) in xyz_self.iter().zip(self.dec()).enumerate() {
            let lo = sorted_dec.partition_point(|&d| d < dec - radius_deg);
            let hi = sorted_dec.partition_point(|&d| d <= dec + radius_deg);

            let mut best: Option<(f64, usize)> = None;
            let mut window: Vec<usize> = order[lo..hi].to_vec();
            window.sort_unstable();
            for j in window {
                let d2 = (v - xyz_other[j]).norm_squared();
                if d2 > chord2 {
                    continue;
                }
                if nearest {
                    match best {
                        Some((bd2, _)) if d2 >= bd2 => {}
                        _ => best = Some((d2, j)),
                    }
                } else {
                    out.index_self.push(i);
                    out.index_other.push(j);
                    out.separation_deg.push(chord2_to_deg(d2));
                }
            }
            if let Some((d2, j)) = best {
                match claimed[j] {
                    Some((cd2, _)) if cd2 <= d2 => {}
                    _ => claimed[j] = Some((d2, i)),
                }
            }
        }

        if nearest {
            // Each self row claims at most one row of `other`, and each row
            // of `other` keeps at most one claim; surviving pairs come out in
            // ascending self order for determinism.
            let mut pairs: Vec<(usize, usize, f64)> = claimed
                .iter()
                .enumerate()
                .filter_map(|(j, claim)| claim.map(|(d2, i)| (i, j, chord2_to_deg(d2))))
                .collect();
            pairs.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));
            for (i, j, sep) in pairs {
                out.index_self.push(i);
                out.index_other.push(j);
                out.separation_deg.push(sep);
            }
        }

        debug!(
            "match_radec: {} x {} rows, radius {:.3e} deg, {} pairs",
            self.len(),
            other.len(),
            radius_deg,
            out.len()
        );
        out
    }
}

fn chord2_to_deg(d2: f64) -> Degree {
    2.0 * (0.5 * d2.sqrt().min(2.0)).asin() / RADEG
}
