//! # Target selection and truth-table sampling
//!
//! Produces the synthetic-source catalogs that are injected into images.
//! A color-cut classifier over-selects candidate truth objects (the margin
//! enlarges the accepted color box; downstream resampling narrows the
//! population back down), and a resampler draws truth rows with replacement
//! onto target positions, deriving fluxes from magnitudes and per-band
//! transmission factors and drawing random galaxy shapes.

use log::info;
use rand::Rng;

use crate::catalog::column::Column;
use crate::catalog::sky::SkyCatalog;
use crate::constants::{Degree, FLUX_FLOOR, MAG_ZEROPOINT};
use crate::skysim_errors::SkysimError;

/// Magnitude from flux in the survey convention; the floor keeps zero and
/// negative fluxes finite (very faint) instead of singular.
pub fn flux_to_mag(flux: f64) -> f64 {
    MAG_ZEROPOINT - 2.5 * flux.max(FLUX_FLOOR).log10()
}

/// Inverse of [`flux_to_mag`] for magnitudes above the floor.
pub fn mag_to_flux(mag: f64) -> f64 {
    10f64.powf((MAG_ZEROPOINT - mag) / 2.5)
}

/// Emission-line-galaxy color box over (g, r, z) fluxes.
///
/// Linear inequality cuts on magnitude differences, with disjoint north and
/// south branches and a tunable margin added to every threshold. A positive
/// margin enlarges the accepted box.
#[derive(Debug, Clone, Copy)]
pub struct ColorCuts {
    pub south: bool,
    pub margin: f64,
}

impl Default for ColorCuts {
    fn default() -> Self {
        ColorCuts {
            south: true,
            margin: 0.0,
        }
    }
}

impl ColorCuts {
    /// Selection mask over three equal-length flux arrays (nanomaggies).
    pub fn select(
        &self,
        gflux: &[f64],
        rflux: &[f64],
        zflux: &[f64],
    ) -> Result<Vec<bool>, SkysimError> {
        if gflux.len() != rflux.len() || gflux.len() != zflux.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "flux arrays of lengths {}, {}, {}",
                gflux.len(),
                rflux.len(),
                zflux.len()
            )));
        }
        // Faint g limit and g-r intercept differ between the two imaging
        // hemispheres.
        let (gfaint, gr_offset) = if self.south { (23.5, 0.15) } else { (23.6, 0.35) };
        let m = self.margin;

        let mask = gflux
            .iter()
            .zip(rflux)
            .zip(zflux)
            .map(|((&gf, &rf), &zf)| {
                let g = flux_to_mag(gf);
                let r = flux_to_mag(rf);
                let z = flux_to_mag(zf);
                let gr = g - r;
                let rz = r - z;
                g > 20.0 - m
                    && g < gfaint + m
                    && rz > 0.3 - m
                    && rz < 1.6 + m
                    && gr < 1.15 * rz - gr_offset + m
                    && gr < 1.6 - 1.2 * rz + m
            })
            .collect();
        Ok(mask)
    }
}

/// Per-band inputs of the resampler: truth magnitude column, output flux
/// column, and Milky Way transmission factor in (0, 1].
#[derive(Debug, Clone, Copy)]
pub struct BandSampling<'a> {
    pub mag_column: &'a str,
    pub flux_column: &'a str,
    pub transmission: f64,
}

/// Draw one truth row per target position, with replacement.
///
/// The output catalog holds the target positions, the copied `copy_fields`
/// of the drawn truth rows, one flux column per requested band derived from
/// the truth magnitude and the band transmission, and random galaxy shapes:
/// ellipticity components from axis ratio `U(0.2, 1)` and position angle
/// `U(0, π)`.
pub fn sample_truth<R: Rng>(
    truth: &SkyCatalog,
    ra: Vec<Degree>,
    dec: Vec<Degree>,
    bands: &[BandSampling<'_>],
    copy_fields: &[&str],
    rng: &mut R,
) -> Result<SkyCatalog, SkysimError> {
    if truth.is_empty() {
        return Err(SkysimError::NotFound("empty truth table".to_string()));
    }
    let mut out = SkyCatalog::from_radec(ra, dec)?;
    let size = out.len();

    let draws: Vec<usize> = (0..size).map(|_| rng.random_range(0..truth.len())).collect();

    for &field in copy_fields {
        let column = truth
            .get(field)?
            .select(&crate::catalog::column::Rows::Indices(draws.clone()), field)?;
        out.set(field, column)?;
    }

    for band in bands {
        let mags = truth.get_float(band.mag_column)?;
        let flux: Vec<f64> = draws
            .iter()
            .map(|&j| mag_to_flux(mags[j]) * band.transmission)
            .collect();
        out.set(band.flux_column, Column::Float(flux))?;
    }

    let mut e1 = Vec::with_capacity(size);
    let mut e2 = Vec::with_capacity(size);
    for _ in 0..size {
        let axis_ratio: f64 = rng.random_range(0.2..1.0);
        let angle: f64 = rng.random_range(0.0..std::f64::consts::PI);
        let e = (1.0 - axis_ratio) / (1.0 + axis_ratio);
        e1.push(e * (2.0 * angle).cos());
        e2.push(e * (2.0 * angle).sin());
    }
    out.set("e1", Column::Float(e1))?;
    out.set("e2", Column::Float(e2))?;

    info!("sampled {} sources from {} truth rows", size, truth.len());
    Ok(out)
}
