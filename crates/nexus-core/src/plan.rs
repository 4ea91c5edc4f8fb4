//! Local destination planning for downloads.
//!
//! Remote paths tend to encode deep build and version hierarchies. A
//! download keeps only the last two segments of each path (the file and
//! its immediate folder), which keeps the local tree shallow while still
//! telling apart same-named files from different components.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, InvalidInputError, PathCollisionError};
use crate::search::AssetRecord;

/// What to do when two assets flatten to the same local path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Refuse the whole batch before anything is written.
    #[default]
    Abort,
    /// Rename later assets to `name~N.ext`.
    Suffix,
}

/// One asset and where it will be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadPlan {
    pub asset: AssetRecord,
    pub local_path: PathBuf,
}

/// Maps remote asset paths to local destinations.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathPlanner {
    policy: CollisionPolicy,
}

impl PathPlanner {
    pub fn new(policy: CollisionPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CollisionPolicy {
        self.policy
    }

    /// Derive the destination of a single asset under `output_root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the path has no segments or contains `.` or
    /// `..`, which could place the file outside `output_root`.
    pub fn plan(asset: &AssetRecord, output_root: &Path) -> Result<PathBuf, Error> {
        let segments = Self::segments(&asset.path)?;
        let keep = &segments[segments.len().saturating_sub(2)..];

        let mut local = output_root.to_path_buf();
        for segment in keep {
            local.push(segment);
        }
        Ok(local)
    }

    /// Plan every asset, detecting collisions before any file is written.
    ///
    /// The same remote asset appearing more than once is planned once.
    pub fn plan_all(
        &self,
        assets: &[AssetRecord],
        output_root: &Path,
    ) -> Result<Vec<DownloadPlan>, Error> {
        let mut plans: Vec<DownloadPlan> = Vec::with_capacity(assets.len());
        // local path -> index into `plans`
        let mut taken: HashMap<PathBuf, usize> = HashMap::new();
        let mut planned: HashSet<(&str, &str)> = HashSet::new();

        for asset in assets {
            if !planned.insert((asset.repository.as_str(), asset.path.as_str())) {
                debug!(path = %asset.path, "skipping duplicate asset");
                continue;
            }

            let local_path = Self::plan(asset, output_root)?;

            let Some(&existing) = taken.get(&local_path) else {
                taken.insert(local_path.clone(), plans.len());
                plans.push(DownloadPlan {
                    asset: asset.clone(),
                    local_path,
                });
                continue;
            };

            let first = &plans[existing].asset;

            match self.policy {
                CollisionPolicy::Abort => {
                    return Err(PathCollisionError {
                        local_path,
                        first: first.path.clone(),
                        second: asset.path.clone(),
                    }
                    .into());
                }
                CollisionPolicy::Suffix => {
                    let renamed = Self::free_variant(&local_path, &taken);
                    debug!(path = %asset.path, local = %renamed.display(), "renamed colliding asset");
                    taken.insert(renamed.clone(), plans.len());
                    plans.push(DownloadPlan {
                        asset: asset.clone(),
                        local_path: renamed,
                    });
                }
            }
        }

        Ok(plans)
    }

    fn segments(path: &str) -> Result<Vec<&str>, Error> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        if segments.is_empty() {
            return Err(InvalidInputError::AssetPath {
                value: path.to_string(),
                reason: "path has no segments".to_string(),
            }
            .into());
        }

        if segments.iter().any(|s| *s == "." || *s == ".." || s.contains('\\')) {
            return Err(InvalidInputError::AssetPath {
                value: path.to_string(),
                reason: "path segments cannot be '.', '..' or contain '\\'".to_string(),
            }
            .into());
        }

        Ok(segments)
    }

    /// Smallest `stem~N.ext` with N >= 1 not already taken.
    fn free_variant(local_path: &Path, taken: &HashMap<PathBuf, usize>) -> PathBuf {
        let stem = local_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = local_path
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        (1..)
            .map(|n| local_path.with_file_name(format!("{}~{}{}", stem, n, extension)))
            .find(|candidate| !taken.contains_key(candidate))
            .unwrap_or_else(|| local_path.to_path_buf())
    }
}
