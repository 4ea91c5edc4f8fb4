//! Repository trait.

use std::path::Path;

use async_trait::async_trait;
use futures_core::Stream;
use futures_util::TryStreamExt;
use tracing::trace;

use crate::error::ProtocolError;
use crate::search::{AssetPage, AssetRecord};
use crate::Result;

use super::{UploadReceipt, UploadRequest};

/// A remote repository manager.
///
/// Implementations map each call onto exactly one protocol exchange and
/// never retry; a failed call surfaces immediately so batch callers can
/// attribute it to the right item.
#[async_trait]
pub trait Repository: Send + Sync {
    /// Fetch one page of assets matching `filter` in `repository`.
    async fn search_page(
        &self,
        repository: &str,
        filter: &str,
        continuation_token: Option<&str>,
    ) -> Result<AssetPage>;

    /// Fetch every asset matching `filter`, following continuation tokens
    /// until the server reports the last page.
    ///
    /// Assets are returned in server order. Each call starts from the
    /// first page.
    async fn search(&self, repository: &str, filter: &str) -> Result<Vec<AssetRecord>> {
        paginate(self, repository, filter).try_collect().await
    }

    /// Stream an asset to `destination`, returning the number of bytes
    /// written. On failure nothing is left at `destination`.
    async fn download(&self, url: &str, destination: &Path) -> Result<u64>;

    /// Upload a single file as a new component.
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt>;
}

/// Lazily walk all pages of a search.
///
/// The next page is only requested once the current one has been
/// consumed.
pub fn paginate<'a, R>(
    repo: &'a R,
    repository: &'a str,
    filter: &'a str,
) -> impl Stream<Item = Result<AssetRecord>> + Send + 'a
where
    R: Repository + ?Sized,
{
    async_stream::try_stream! {
        let mut token: Option<String> = None;
        let mut pages = 0usize;

        loop {
            let page = repo.search_page(repository, filter, token.as_deref()).await?;
            pages += 1;

            let next = page.next_token().map(str::to_string);
            trace!(page = pages, items = page.items.len(), has_next = next.is_some(), "search page");

            for item in page.items {
                yield item;
            }

            match next {
                Some(next) if token.as_deref() == Some(next.as_str()) => {
                    Err::<(), _>(ProtocolError::new(
                        200,
                        Some(format!("server repeated continuation token '{}'", next)),
                    ))?;
                }
                Some(next) => token = Some(next),
                None => break,
            }
        }
    }
}
