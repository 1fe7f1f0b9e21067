//! # Run catalog
//!
//! Enumerable collection of (brickname, sim-id tuple) records: which work
//! units exist, or should exist. Built by filesystem discovery over the
//! canonical layout, by reading a plain-text run list, or by filtering
//! another catalog. Discovery that finds nothing yields an empty catalog,
//! not an error; duplicate records are a data error and fail loudly.

use std::collections::HashSet;

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use log::{debug, info};
use regex::Regex;

use crate::runs::sim_id::SimIdScheme;
use crate::skysim_errors::SkysimError;

/// One work unit: a brick processed under one sim-id tuple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RunEntry {
    pub brickname: String,
    /// Full ordered sim-id values, one per scheme key.
    pub sim_id: Vec<i64>,
}

/// Ordered sequence of unique [`RunEntry`] records under one sim-id scheme.
#[derive(Debug, Clone)]
pub struct RunCatalog {
    scheme: &'static SimIdScheme,
    entries: Vec<RunEntry>,
}

impl RunCatalog {
    pub fn new(scheme: &'static SimIdScheme) -> Self {
        RunCatalog {
            scheme,
            entries: Vec::new(),
        }
    }

    pub fn scheme(&self) -> &'static SimIdScheme {
        self.scheme
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RunEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RunEntry> {
        self.entries.iter()
    }

    /// Append a record; a (brickname, sim-id) pair may appear only once.
    pub fn push(&mut self, entry: RunEntry) -> Result<(), SkysimError> {
        if entry.sim_id.len() != self.scheme.len() {
            return Err(SkysimError::SchemaMismatch(format!(
                "sim id of run '{}' has {} values, scheme declares {} keys",
                entry.brickname,
                entry.sim_id.len(),
                self.scheme.len()
            )));
        }
        if self.entries.contains(&entry) {
            return Err(SkysimError::DuplicateRun {
                brickname: entry.brickname,
                sim_id: self.scheme.encode_values(&entry.sim_id),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// New catalog holding the entries satisfying `predicate`, in order.
    pub fn filtered(&self, predicate: impl Fn(&RunEntry) -> bool) -> RunCatalog {
        RunCatalog {
            scheme: self.scheme,
            entries: self
                .entries
                .iter()
                .filter(|e| predicate(e))
                .cloned()
                .collect(),
        }
    }

    /// Discover completed runs under the canonical output layout.
    ///
    /// Every directory of `base_dir` whose name matches the sim-id pattern
    /// (with `pinned` keys fixed and the rest wildcarded) contributes one
    /// record per brickname found in its `tractor` subtree, or per brick of
    /// `bricks` whose tractor file exists when an explicit list is given.
    /// De-duplicated; a missing or empty tree yields an empty catalog.
    pub fn from_output_directory(
        scheme: &'static SimIdScheme,
        base_dir: &Utf8Path,
        bricks: Option<&[String]>,
        pinned: &[(&str, i64)],
    ) -> Result<RunCatalog, SkysimError> {
        let pattern = scheme.regex(pinned)?;
        let mut catalog = RunCatalog::new(scheme);
        let mut seen: HashSet<RunEntry> = HashSet::new();

        let read_dir = match std::fs::read_dir(base_dir.as_std_path()) {
            Ok(read_dir) => read_dir,
            Err(_) => {
                debug!("no output directory at {base_dir}");
                return Ok(catalog);
            }
        };

        let mut sim_dirs: Vec<(Vec<i64>, Utf8PathBuf)> = Vec::new();
        for dir_entry in read_dir {
            let dir_entry = dir_entry?;
            if !dir_entry.file_type()?.is_dir() {
                continue;
            }
            let name = dir_entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !pattern.is_match(name) {
                continue;
            }
            sim_dirs.push((scheme.decode_values(name)?, base_dir.join(name)));
        }
        sim_dirs.sort();

        for (sim_id, dir) in sim_dirs {
            let bricknames = match bricks {
                Some(bricks) => bricks
                    .iter()
                    .filter(|brickname| {
                        tractor_file(&dir, brickname).is_file()
                    })
                    .cloned()
                    .collect(),
                None => scan_bricknames(&dir)?,
            };
            for brickname in bricknames {
                let entry = RunEntry {
                    brickname,
                    sim_id: sim_id.clone(),
                };
                if seen.insert(entry.clone()) {
                    catalog.entries.push(entry);
                }
            }
        }

        info!(
            "discovered {} runs under {base_dir}",
            catalog.len()
        );
        Ok(catalog)
    }

    /// Read a run list: one run per line, `brickname [values...]` with
    /// whitespace separators; missing values take the scheme defaults.
    pub fn from_list(
        scheme: &'static SimIdScheme,
        path: &Utf8Path,
    ) -> Result<RunCatalog, SkysimError> {
        let text = std::fs::read_to_string(path)?;
        let mut catalog = RunCatalog::new(scheme);
        for (iline, line) in text.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut tokens = line.split_whitespace();
            let brickname = tokens
                .next()
                .unwrap_or_else(|| unreachable!("non-empty line"))
                .to_string();
            let mut sim_id: Vec<i64> = scheme.keys().iter().map(|k| k.default).collect();
            for (ikey, token) in tokens.enumerate() {
                if ikey >= sim_id.len() {
                    return Err(SkysimError::ParseError(format!(
                        "{path}:{}: {} sim-id values, scheme declares {} keys",
                        iline + 1,
                        ikey + 1,
                        scheme.len()
                    )));
                }
                sim_id[ikey] = token.parse().map_err(|e| {
                    SkysimError::ParseError(format!(
                        "{path}:{}: sim-id value '{token}': {e}",
                        iline + 1
                    ))
                })?;
            }
            catalog.push(RunEntry { brickname, sim_id })?;
        }
        Ok(catalog)
    }

    /// Read a plain brick list (newline-delimited names); every run takes the
    /// scheme defaults.
    pub fn from_brick_list(
        scheme: &'static SimIdScheme,
        path: &Utf8Path,
    ) -> Result<RunCatalog, SkysimError> {
        RunCatalog::from_list(scheme, path)
    }

    /// Persist as a run list readable by [`from_list`](Self::from_list).
    pub fn write_list(&self, path: &Utf8Path) -> Result<(), SkysimError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&entry.brickname);
            for value in &entry.sim_id {
                text.push(' ');
                text.push_str(&value.to_string());
            }
            text.push('\n');
        }
        std::fs::write(path, text)?;
        Ok(())
    }
}

/// Two catalogs are equal iff they hold the same multiset of
/// (brickname, sim-id tuple) pairs, independent of order.
impl PartialEq for RunCatalog {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme
            && self.entries.iter().sorted().collect::<Vec<_>>()
                == other.entries.iter().sorted().collect::<Vec<_>>()
    }
}

impl Eq for RunCatalog {}

impl<'a> IntoIterator for &'a RunCatalog {
    type Item = &'a RunEntry;
    type IntoIter = std::slice::Iter<'a, RunEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn tractor_file(sim_dir: &Utf8Path, brickname: &str) -> Utf8PathBuf {
    let shard = brickname.get(..3).unwrap_or(brickname);
    sim_dir
        .join("tractor")
        .join(shard)
        .join(format!("tractor-{brickname}.csv"))
}

/// Bricknames present in the `tractor` subtree of one sim-id directory.
fn scan_bricknames(sim_dir: &Utf8Path) -> Result<Vec<String>, SkysimError> {
    let tractor_re = Regex::new(r"^tractor-(.+)\.csv$")
        .unwrap_or_else(|_| unreachable!("valid literal regex"));
    let mut names = Vec::new();
    let tractor_dir = sim_dir.join("tractor");
    let Ok(shards) = std::fs::read_dir(tractor_dir.as_std_path()) else {
        return Ok(names);
    };
    for shard in shards {
        let shard = shard?;
        if !shard.file_type()?.is_dir() {
            continue;
        }
        for file in std::fs::read_dir(shard.path())? {
            let file = file?;
            let name = file.file_name();
            let Some(name) = name.to_str() else { continue };
            if let Some(caps) = tractor_re.captures(name) {
                names.push(caps[1].to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}
