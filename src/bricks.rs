//! # Brick registry
//!
//! Immutable partition of the survey footprint into named tiles ("bricks").
//! The registry is loaded once at startup (from the tabular store, a CSV
//! tile-definition file, or generated as a full-sky grid) and only queried
//! afterwards: point-to-brick lookup, name lookup, and box/area aggregation.
//! Bricks tile the footprint without gaps or overlaps, so a point inside the
//! footprint always resolves to exactly one brick.

use std::collections::HashMap;

use ahash::RandomState;
use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};

use crate::catalog::table::ColumnTable;
use crate::constants::{Degree, SqDegree, BRICK_SIZE_DEG, RADEG};
use crate::skysim_errors::SkysimError;

/// A bounding box in (ra, dec), degrees.
///
/// `ra1 > ra2` encodes a box crossing the RA 0/360° wrap: the RA interval is
/// `[ra1, 360) ∪ [0, ra2)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadecBox {
    pub ra1: Degree,
    pub ra2: Degree,
    pub dec1: Degree,
    pub dec2: Degree,
}

impl RadecBox {
    pub fn contains(&self, ra: Degree, dec: Degree) -> bool {
        if !(self.dec1..self.dec2).contains(&dec) && !(dec == 90.0 && self.dec2 == 90.0) {
            return false;
        }
        if self.ra1 <= self.ra2 {
            (self.ra1..self.ra2).contains(&ra)
        } else {
            ra >= self.ra1 || ra < self.ra2
        }
    }

    /// RA extent, accounting for the wrap branch.
    pub fn ra_span(&self) -> Degree {
        if self.ra1 <= self.ra2 {
            self.ra2 - self.ra1
        } else {
            360.0 - self.ra1 + self.ra2
        }
    }
}

/// One immutable sky tile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub brickname: String,
    /// Center position, degrees.
    pub ra: Degree,
    pub dec: Degree,
    /// Bounding box edges, degrees; `ra1 > ra2` crosses the RA wrap.
    pub ra1: Degree,
    pub ra2: Degree,
    pub dec1: Degree,
    pub dec2: Degree,
}

impl Brick {
    pub fn radecbox(&self) -> RadecBox {
        RadecBox {
            ra1: self.ra1,
            ra2: self.ra2,
            dec1: self.dec1,
            dec2: self.dec2,
        }
    }

    pub fn contains(&self, ra: Degree, dec: Degree) -> bool {
        self.radecbox().contains(ra, dec)
    }

    /// Exact spherical area of the bounding box, square degrees.
    pub fn area(&self) -> SqDegree {
        let dsin = (self.dec2 * RADEG).sin() - (self.dec1 * RADEG).sin();
        self.radecbox().ra_span() * dsin / RADEG
    }
}

/// Standard brick name: RA and dec of the center in tenths of a degree,
/// e.g. `"2599p187"` for (259.9x, +18.7x).
fn brick_name(ra: Degree, dec: Degree) -> String {
    let ra10 = ((ra * 10.0).floor() as i64).rem_euclid(3600);
    let hemi = if dec < 0.0 { 'm' } else { 'p' };
    let dec10 = (dec.abs() * 10.0).floor() as i64;
    format!("{ra10:04}{hemi}{dec10:03}")
}

/// Dec rows of the registry; each holds the brick indices of one dec band,
/// sorted by `ra1`, with at most one wrap brick kept apart.
#[derive(Debug, Clone)]
struct DecRow {
    dec1: Degree,
    dec2: Degree,
    by_ra: Vec<usize>,
    wrap: Option<usize>,
}

/// Immutable registry of all bricks of a survey footprint.
#[derive(Debug, Clone)]
pub struct BrickCatalog {
    bricks: Vec<Brick>,
    by_name: HashMap<String, usize, RandomState>,
    rows: Vec<DecRow>,
}

impl BrickCatalog {
    /// Build the registry from a list of bricks.
    ///
    /// Duplicate names are rejected, since the name is the primary key of the
    /// partition.
    pub fn from_bricks(bricks: Vec<Brick>) -> Result<Self, SkysimError> {
        let mut by_name = HashMap::with_capacity_and_hasher(bricks.len(), RandomState::new());
        for (i, brick) in bricks.iter().enumerate() {
            if by_name.insert(brick.brickname.clone(), i).is_some() {
                return Err(SkysimError::SchemaMismatch(format!(
                    "duplicate brick name '{}'",
                    brick.brickname
                )));
            }
        }

        // Group into dec bands; the tiling invariant makes bands exact.
        let mut rows: Vec<DecRow> = Vec::new();
        let mut band_of: HashMap<(u64, u64), usize, RandomState> = HashMap::default();
        for (i, brick) in bricks.iter().enumerate() {
            let key = (brick.dec1.to_bits(), brick.dec2.to_bits());
            let irow = *band_of.entry(key).or_insert_with(|| {
                rows.push(DecRow {
                    dec1: brick.dec1,
                    dec2: brick.dec2,
                    by_ra: Vec::new(),
                    wrap: None,
                });
                rows.len() - 1
            });
            if brick.ra1 > brick.ra2 {
                rows[irow].wrap = Some(i);
            } else {
                rows[irow].by_ra.push(i);
            }
        }
        for row in &mut rows {
            row.by_ra
                .sort_by(|&a, &b| bricks[a].ra1.total_cmp(&bricks[b].ra1));
        }
        rows.sort_by(|a, b| a.dec1.total_cmp(&b.dec1));

        info!("brick registry: {} bricks in {} dec rows", bricks.len(), rows.len());
        Ok(BrickCatalog {
            bricks,
            by_name,
            rows,
        })
    }

    /// Load from a table with columns `brickname, ra, dec, ra1, ra2, dec1, dec2`.
    pub fn from_table(table: &ColumnTable) -> Result<Self, SkysimError> {
        let brickname = table.get_str("brickname")?;
        let ra = table.get_float("ra")?;
        let dec = table.get_float("dec")?;
        let ra1 = table.get_float("ra1")?;
        let ra2 = table.get_float("ra2")?;
        let dec1 = table.get_float("dec1")?;
        let dec2 = table.get_float("dec2")?;
        let bricks = (0..table.len())
            .map(|i| Brick {
                brickname: brickname[i].clone(),
                ra: ra[i],
                dec: dec[i],
                ra1: ra1[i],
                ra2: ra2[i],
                dec1: dec1[i],
                dec2: dec2[i],
            })
            .collect();
        Self::from_bricks(bricks)
    }

    /// Load from a CSV tile-definition file with a `brickname,ra,dec,ra1,ra2,dec1,dec2`
    /// header.
    pub fn from_csv(path: &Utf8Path) -> Result<Self, SkysimError> {
        info!("reading brick definitions from {path}");
        let mut reader = csv::Reader::from_path(path)?;
        let bricks = reader
            .deserialize()
            .collect::<Result<Vec<Brick>, _>>()?;
        Self::from_bricks(bricks)
    }

    /// Generate the full-sky grid: dec rows of height `bricksize` degrees,
    /// each split into `ceil(360 cos(dec_center) / bricksize)` RA columns.
    pub fn full_sky(bricksize: Degree) -> Result<Self, SkysimError> {
        if !(bricksize > 0.0 && bricksize <= 180.0) {
            return Err(SkysimError::SchemaMismatch(format!(
                "invalid brick size {bricksize} deg"
            )));
        }
        let nrows = (180.0 / bricksize).ceil() as usize;
        let mut bricks = Vec::new();
        for irow in 0..nrows {
            let dec1 = -90.0 + irow as f64 * bricksize;
            let dec2 = (dec1 + bricksize).min(90.0);
            let dec_center = 0.5 * (dec1 + dec2);
            let ncols = ((360.0 * (dec_center * RADEG).cos()) / bricksize)
                .ceil()
                .max(1.0) as usize;
            let width = 360.0 / ncols as f64;
            for icol in 0..ncols {
                let ra1 = icol as f64 * width;
                let ra2 = if icol + 1 == ncols {
                    360.0
                } else {
                    (icol + 1) as f64 * width
                };
                let ra_center = 0.5 * (ra1 + ra2);
                bricks.push(Brick {
                    brickname: brick_name(ra_center, dec_center),
                    ra: ra_center,
                    dec: dec_center,
                    // The last column closes the row at exactly 360, stored
                    // as ra2 = 360 (no wrap brick in the generated grid).
                    ra1,
                    ra2,
                    dec1,
                    dec2,
                });
            }
        }
        Self::from_bricks(bricks)
    }

    pub fn len(&self) -> usize {
        self.bricks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bricks.is_empty()
    }

    pub fn bricks(&self) -> &[Brick] {
        &self.bricks
    }

    pub fn get_by_name(&self, name: &str) -> Result<&Brick, SkysimError> {
        self.by_name
            .get(name)
            .map(|&i| &self.bricks[i])
            .ok_or_else(|| SkysimError::NotFound(format!("brick '{name}'")))
    }

    /// Vectorized point-to-brick lookup.
    ///
    /// Each point resolves to the unique brick whose dec band and RA band
    /// (handling the 360° wrap) contain it; a point outside every brick fails
    /// with [`SkysimError::OutOfFootprint`], which the tiling invariant rules
    /// out for points inside the declared footprint.
    pub fn get_by_radec(
        &self,
        ra: &[Degree],
        dec: &[Degree],
    ) -> Result<Vec<&Brick>, SkysimError> {
        if ra.len() != dec.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "{} ra values vs {} dec values",
                ra.len(),
                dec.len()
            )));
        }
        ra.iter()
            .zip(dec)
            .map(|(&r, &d)| self.lookup(r, d))
            .collect()
    }

    fn lookup(&self, ra: Degree, dec: Degree) -> Result<&Brick, SkysimError> {
        let out_of_footprint = || SkysimError::OutOfFootprint { ra, dec };
        let irow = self
            .rows
            .partition_point(|row| row.dec1 <= dec)
            .checked_sub(1)
            .ok_or_else(out_of_footprint)?;
        let row = &self.rows[irow];
        // dec == 90 belongs to the topmost band.
        if !(dec < row.dec2 || (dec == 90.0 && row.dec2 == 90.0)) {
            return Err(out_of_footprint());
        }

        let icol = row
            .by_ra
            .partition_point(|&i| self.bricks[i].ra1 <= ra)
            .checked_sub(1);
        if let Some(icol) = icol {
            let brick = &self.bricks[row.by_ra[icol]];
            if brick.contains(ra, dec) {
                return Ok(brick);
            }
        }
        if let Some(i) = row.wrap {
            let brick = &self.bricks[i];
            if brick.contains(ra, dec) {
                return Ok(brick);
            }
        }
        Err(out_of_footprint())
    }

    fn resolve<'a>(&'a self, names: &[&str]) -> Result<Vec<&'a Brick>, SkysimError> {
        names.iter().map(|name| self.get_by_name(name)).collect()
    }

    /// Per-brick bounding boxes.
    pub fn get_radecbox(&self, names: &[&str]) -> Result<Vec<RadecBox>, SkysimError> {
        Ok(self.resolve(names)?.iter().map(|b| b.radecbox()).collect())
    }

    /// Minimal box enclosing the named bricks.
    ///
    /// The dec range is the plain envelope. The RA interval is the complement
    /// of the largest RA stretch left uncovered by the bricks, so it crosses
    /// the 0/360° wrap whenever that makes the span shorter.
    pub fn get_radecbox_total(&self, names: &[&str]) -> Result<RadecBox, SkysimError> {
        let bricks = self.resolve(names)?;
        if bricks.is_empty() {
            return Err(SkysimError::NotFound("empty brick list".to_string()));
        }
        let dec1 = bricks.iter().map(|b| b.dec1).fold(f64::INFINITY, f64::min);
        let dec2 = bricks
            .iter()
            .map(|b| b.dec2)
            .fold(f64::NEG_INFINITY, f64::max);

        // Unwrap every RA interval to start..start+span; a wrap brick also
        // contributes a copy shifted down by 360° so its coverage near RA 0
        // counts during the sweep.
        let mut intervals: Vec<(f64, f64)> = Vec::new();
        for brick in &bricks {
            let start = brick.ra1;
            let end = start + brick.radecbox().ra_span();
            intervals.push((start, end));
            if end > 360.0 {
                intervals.push((start - 360.0, end - 360.0));
            }
        }
        intervals.sort_by(|a, b| a.0.total_cmp(&b.0));

        // Largest uncovered gap, sweeping with the running coverage end; the
        // final candidate closes the circle back to the first start.
        let mut covered_to = intervals[0].1;
        let mut gap = (f64::NEG_INFINITY, 0.0, 360.0);
        for &(start, end) in &intervals[1..] {
            if start - covered_to > gap.0 {
                gap = (start - covered_to, covered_to, start);
            }
            covered_to = covered_to.max(end);
        }
        let around = intervals[0].0 + 360.0;
        if around - covered_to > gap.0 {
            gap = (around - covered_to, covered_to, around);
        }

        let (width, gap_start, gap_end) = gap;
        if width <= 0.0 {
            // The bricks cover the whole RA circle.
            return Ok(RadecBox {
                ra1: 0.0,
                ra2: 360.0,
                dec1,
                dec2,
            });
        }
        let ra1 = gap_end.rem_euclid(360.0);
        let ra2 = gap_start.rem_euclid(360.0);
        // A coverage edge at exactly 360 is the plain right edge, not a wrap.
        let ra2 = if ra2 == 0.0 && ra1 > 0.0 { 360.0 } else { ra2 };
        Ok(RadecBox { ra1, ra2, dec1, dec2 })
    }

    /// Per-brick areas in square degrees.
    pub fn get_area(&self, names: &[&str]) -> Result<Vec<SqDegree>, SkysimError> {
        Ok(self.resolve(names)?.iter().map(|b| b.area()).collect())
    }

    /// Total area of the named bricks; bricks are disjoint, so areas sum
    /// directly.
    pub fn get_area_total(&self, names: &[&str]) -> Result<SqDegree, SkysimError> {
        Ok(self.get_area(names)?.iter().sum())
    }

    /// Persist the brick names as newline-delimited UTF-8 text.
    pub fn write_list(&self, path: &Utf8Path) -> Result<(), SkysimError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = String::new();
        for brick in &self.bricks {
            text.push_str(&brick.brickname);
            text.push('\n');
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

impl Default for BrickCatalog {
    /// Full-sky grid at the survey brick size.
    fn default() -> Self {
        Self::full_sky(BRICK_SIZE_DEG).unwrap_or_else(|_| unreachable!("valid brick size"))
    }
}
