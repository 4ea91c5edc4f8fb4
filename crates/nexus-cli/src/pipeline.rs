//! Command pipelines, independent of the transport.
//!
//! Everything here works against any [`Repository`], so the steps that
//! matter (per-pattern searching, batch downloads with per-item outcomes)
//! can be exercised without a server.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, Utc};
use futures_util::{StreamExt, stream};
use tracing::{debug, info, warn};

use nexus_core::error::{DownloadError, Error, InvalidInputError};
use nexus_core::{DownloadPlan, Repository, SearchQuery, SearchResult, WildcardPattern};

/// Default number of simultaneous downloads.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// How many assets one pattern matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCount {
    pub pattern: String,
    pub count: usize,
}

/// A finished search and its per-pattern breakdown.
#[derive(Debug)]
pub struct SearchOutcome {
    pub result: SearchResult,
    pub counts: Vec<PatternCount>,
}

/// Run one search per pattern and concatenate the results in pattern order.
///
/// Overlapping patterns may return the same asset twice; nothing is
/// deduplicated here.
pub async fn search<R>(
    repo: &R,
    repository: &str,
    patterns: &[WildcardPattern],
    timestamp: DateTime<Utc>,
) -> nexus_core::Result<SearchOutcome>
where
    R: Repository + ?Sized,
{
    let mut assets = Vec::new();
    let mut counts = Vec::with_capacity(patterns.len());

    for pattern in patterns {
        let found = repo.search(repository, pattern.filter_value()).await?;
        debug!(pattern = %pattern, count = found.len(), "pattern searched");

        counts.push(PatternCount {
            pattern: pattern.to_string(),
            count: found.len(),
        });
        assets.extend(found);
    }

    let query = SearchQuery::new(repository, patterns.iter().map(|p| p.to_string()).collect());
    Ok(SearchOutcome {
        result: SearchResult::new(query, timestamp, assets),
        counts,
    })
}

/// The timestamped directory a download batch is written into.
pub fn output_root(base: &Path, now: &DateTime<Local>) -> PathBuf {
    base.join(format!("artifacts_{}", now.format("%Y%m%d%H%M%S")))
}

/// The result of downloading one planned asset.
#[derive(Debug)]
pub struct DownloadOutcome {
    /// Position of the asset in the plan.
    pub index: usize,
    pub plan: DownloadPlan,
    pub result: Result<u64, Error>,
}

/// Outcomes of a download batch, in plan order.
#[derive(Debug, Default)]
pub struct DownloadReport {
    pub outcomes: Vec<DownloadOutcome>,
}

impl DownloadReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> impl Iterator<Item = &DownloadOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    pub fn failed_count(&self) -> usize {
        self.failed().count()
    }

    pub fn total_bytes(&self) -> u64 {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed_count() == 0
    }
}

/// Download every planned asset, at most `concurrency` at a time.
///
/// A failure only affects its own asset. `on_complete` sees each outcome
/// as soon as it finishes, in completion order.
pub async fn download_all<R, F>(
    repo: &R,
    plans: Vec<DownloadPlan>,
    concurrency: usize,
    mut on_complete: F,
) -> DownloadReport
where
    R: Repository + ?Sized,
    F: FnMut(&DownloadOutcome),
{
    let concurrency = concurrency.max(1);
    info!(assets = plans.len(), concurrency, "starting downloads");

    let mut outcomes: Vec<DownloadOutcome> = stream::iter(plans.into_iter().enumerate())
        .map(|(index, plan)| async move {
            let result = match plan.asset.download_url.as_deref() {
                Some(url) => repo.download(url, &plan.local_path).await,
                None => Err(DownloadError::new(
                    &plan.local_path,
                    InvalidInputError::Other {
                        message: format!("asset '{}' has no download URL", plan.asset.path),
                    },
                )
                .into()),
            };

            match &result {
                Ok(bytes) => debug!(index, path = %plan.asset.path, bytes, "downloaded"),
                Err(e) => warn!(index, path = %plan.asset.path, error = %e, "download failed"),
            }

            DownloadOutcome {
                index,
                plan,
                result,
            }
        })
        .buffer_unordered(concurrency)
        .inspect(|outcome| on_complete(outcome))
        .collect()
        .await;

    outcomes.sort_by_key(|o| o.index);
    DownloadReport { outcomes }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    use async_trait::async_trait;
    use nexus_core::error::ProtocolError;
    use nexus_core::search::{AssetPage, AssetRecord};
    use nexus_core::{PathPlanner, UploadReceipt, UploadRequest};
    use tempfile::TempDir;

    /// In-memory repository: one page per filter, downloads write the URL
    /// as the file body.
    #[derive(Default)]
    struct FakeRepository {
        assets: HashMap<String, Vec<AssetRecord>>,
        failing: HashSet<String>,
        searches: Mutex<Vec<String>>,
    }

    impl FakeRepository {
        fn with_assets(mut self, filter: &str, paths: &[&str]) -> Self {
            let records = paths
                .iter()
                .map(|p| AssetRecord::new("raw-hosted", *p).with_download_url(format!("mem://{p}")))
                .collect();
            self.assets.insert(filter.to_string(), records);
            self
        }

        fn failing(mut self, path: &str) -> Self {
            self.failing.insert(format!("mem://{path}"));
            self
        }
    }

    #[async_trait]
    impl Repository for FakeRepository {
        async fn search_page(
            &self,
            _repository: &str,
            filter: &str,
            _continuation_token: Option<&str>,
        ) -> nexus_core::Result<AssetPage> {
            self.searches.lock().unwrap().push(filter.to_string());
            Ok(AssetPage {
                items: self.assets.get(filter).cloned().unwrap_or_default(),
                continuation_token: None,
            })
        }

        async fn download(&self, url: &str, destination: &Path) -> nexus_core::Result<u64> {
            tokio::task::yield_now().await;
            if self.failing.contains(url) {
                return Err(DownloadError::new(destination, ProtocolError::new(500, None)).into());
            }
            std::fs::create_dir_all(destination.parent().unwrap())?;
            std::fs::write(destination, url)?;
            Ok(url.len() as u64)
        }

        async fn upload(&self, _request: &UploadRequest) -> nexus_core::Result<UploadReceipt> {
            unimplemented!()
        }
    }

    fn patterns(values: &[&str]) -> Vec<WildcardPattern> {
        values.iter().map(|v| WildcardPattern::new(*v).unwrap()).collect()
    }

    #[tokio::test]
    async fn one_search_per_pattern_in_order() {
        let repo = FakeRepository::default()
            .with_assets("a/*", &["a/1.zip", "a/2.zip"])
            .with_assets("b/*", &["b/3.zip"])
            .with_assets("c/*", &[]);

        let outcome = search(&repo, "raw-hosted", &patterns(&["a/*", "b/*", "c/*"]), Utc::now())
            .await
            .unwrap();

        assert_eq!(*repo.searches.lock().unwrap(), ["a/*", "b/*", "c/*"]);
        let counts: Vec<_> = outcome.counts.iter().map(|c| c.count).collect();
        assert_eq!(counts, [2, 1, 0]);
        assert_eq!(outcome.result.len(), 3);
        assert_eq!(outcome.result.assets[2].path, "b/3.zip");
        assert_eq!(outcome.result.query.patterns, ["a/*", "b/*", "c/*"]);
    }

    #[tokio::test]
    async fn overlapping_patterns_are_not_deduplicated() {
        let repo = FakeRepository::default()
            .with_assets("a/*", &["a/1.zip"])
            .with_assets("*.zip", &["a/1.zip"]);

        let outcome = search(&repo, "raw-hosted", &patterns(&["a/*", "*.zip"]), Utc::now())
            .await
            .unwrap();
        assert_eq!(outcome.result.len(), 2);
    }

    #[test]
    fn output_root_is_timestamped() {
        use chrono::TimeZone;

        let now = Local.with_ymd_and_hms(2025, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(
            output_root(Path::new("downloads"), &now),
            Path::new("downloads/artifacts_20250102030405")
        );
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_batch() {
        let dir = TempDir::new().unwrap();
        let paths = ["p/c1/a.zip", "p/c2/b.zip", "p/c3/c.zip", "p/c4/d.zip", "p/c5/e.zip"];
        let repo = FakeRepository::default()
            .with_assets("p/*", &paths)
            .failing("p/c3/c.zip");

        let assets = repo.search("raw-hosted", "p/*").await.unwrap();
        let plans = PathPlanner::default().plan_all(&assets, dir.path()).unwrap();

        let mut seen = 0;
        let report = download_all(&repo, plans, 2, |_| seen += 1).await;

        assert_eq!(seen, 5);
        assert_eq!(report.succeeded(), 4);
        assert_eq!(report.failed_count(), 1);
        assert!(!report.is_success());

        let failed: Vec<_> = report.failed().map(|o| o.index).collect();
        assert_eq!(failed, [2]);

        for outcome in &report.outcomes {
            assert_eq!(outcome.plan.local_path.exists(), outcome.index != 2);
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("c5/e.zip")).unwrap(),
            "mem://p/c5/e.zip"
        );
    }

    #[tokio::test]
    async fn sequential_downloads_keep_plan_order() {
        let dir = TempDir::new().unwrap();
        let repo = FakeRepository::default().with_assets("*", &["x/1.bin", "y/2.bin", "z/3.bin"]);
        let assets = repo.search("raw-hosted", "*").await.unwrap();
        let plans = PathPlanner::default().plan_all(&assets, dir.path()).unwrap();

        let mut order = Vec::new();
        let report = download_all(&repo, plans, 1, |o| order.push(o.index)).await;

        assert!(report.is_success());
        assert_eq!(order, [0, 1, 2]);
        assert_eq!(report.total_bytes(), 3 * "mem://x/1.bin".len() as u64);
    }

    #[tokio::test]
    async fn asset_without_url_counts_as_failure() {
        let dir = TempDir::new().unwrap();
        let repo = FakeRepository::default();
        let plans = PathPlanner::default()
            .plan_all(&[AssetRecord::new("raw-hosted", "a/b.zip")], dir.path())
            .unwrap();

        let report = download_all(&repo, plans, DEFAULT_CONCURRENCY, |_| {}).await;
        assert_eq!(report.failed_count(), 1);
        assert!(matches!(report.outcomes[0].result, Err(Error::Download(_))));
    }
}
