//! # Canonical output paths
//!
//! Pure path resolution: no filesystem access, so the sim-id round-trip law
//! holds regardless of storage state. The layout is bit-exact:
//!
//! ```text
//! base_dir/<encoded-sim-id>/<filetype-dir>/<brickname[:3]>/<prefix>-<brickname>[-<stage>].<ext>
//! ```
//!
//! Outputs of the external upstream pipeline are not parameterized by sim-id,
//! so [`Source::Pipeline`] omits the sim-id segment.

use camino::{Utf8Path, Utf8PathBuf};

use crate::runs::sim_id::SimIdScheme;
use crate::skysim_errors::SkysimError;

/// Which system produced (or will produce) the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// The external upstream processing pipeline.
    Pipeline,
    /// This system's injection runs, sharded by sim-id.
    Sim,
}

/// Subfolder, file prefix and extension of one file type.
fn filetype_entry(filetype: &str) -> Result<(&'static str, &'static str, &'static str), SkysimError> {
    Ok(match filetype {
        "tractor" => ("tractor", "tractor", "csv"),
        "injected" => ("sim", "injected", "csv"),
        "ps" => ("metrics", "ps", "csv"),
        "pickle" => ("pickles", "runbrick", "bin"),
        "checkpoint" => ("checkpoints", "checkpoint", "bin"),
        "log" => ("logs", "log", "log"),
        other => {
            return Err(SkysimError::NotFound(format!("file type '{other}'")))
        }
    })
}

/// Leading brick-name shard (`brickname[:3]`).
fn brick_shard(brickname: &str) -> &str {
    brickname.get(..3).unwrap_or(brickname)
}

/// Resolve the canonical path of one output file.
///
/// Unknown `filetype` fails with [`SkysimError::NotFound`] purely from the
/// arguments; `sim_id` overrides follow `scheme` defaults and fail with
/// [`SkysimError::UnknownKey`] for undeclared keys. The special filetype
/// `"bricks"` resolves to the survey tile-definition file at the base
/// directory, independent of brick, sim-id and stage.
pub fn find_file(
    scheme: &SimIdScheme,
    base_dir: &Utf8Path,
    filetype: &str,
    brickname: &str,
    source: Source,
    sim_id: &[(&str, i64)],
    stage: Option<&str>,
) -> Result<Utf8PathBuf, SkysimError> {
    if filetype == "bricks" {
        return Ok(base_dir.join("survey-bricks.csv"));
    }
    let (dir, prefix, ext) = filetype_entry(filetype)?;

    let mut path = base_dir.to_path_buf();
    if source == Source::Sim {
        path.push(scheme.encode(sim_id)?);
    }
    path.push(dir);
    path.push(brick_shard(brickname));
    let filename = match stage {
        Some(stage) => format!("{prefix}-{brickname}-{stage}.{ext}"),
        None => format!("{prefix}-{brickname}.{ext}"),
    };
    path.push(filename);
    Ok(path)
}

/// [`find_file`] for upstream pipeline outputs.
pub fn find_pipeline_file(
    base_dir: &Utf8Path,
    filetype: &str,
    brickname: &str,
    stage: Option<&str>,
) -> Result<Utf8PathBuf, SkysimError> {
    find_file(
        &crate::runs::sim_id::SIM_ID_V1,
        base_dir,
        filetype,
        brickname,
        Source::Pipeline,
        &[],
        stage,
    )
}

/// [`find_file`] for this system's outputs.
pub fn find_sim_file(
    scheme: &SimIdScheme,
    base_dir: &Utf8Path,
    filetype: &str,
    brickname: &str,
    sim_id: &[(&str, i64)],
    stage: Option<&str>,
) -> Result<Utf8PathBuf, SkysimError> {
    find_file(scheme, base_dir, filetype, brickname, Source::Sim, sim_id, stage)
}
