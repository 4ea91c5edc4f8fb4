//! REST-backed repository implementation.

use std::path::Path;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Body, Method};
use tokio::fs::File;
use tokio_util::io::ReaderStream;
use tracing::{debug, info, instrument};

use nexus_core::error::{DownloadError, Error, InvalidInputError, UploadError};
use nexus_core::search::AssetPage;
use nexus_core::traits::{Repository, UploadReceipt, UploadRequest};
use nexus_core::{HostUrl, Result};

use crate::client::RestClient;
use crate::config::ClientConfig;
use crate::endpoints::*;
use crate::error::transport;

/// A network-backed repository using the REST API.
#[derive(Debug, Clone)]
pub struct NexusRepository {
    client: RestClient,
}

impl NexusRepository {
    /// Create a repository client from connection settings.
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            client: RestClient::new(config)?,
        })
    }

    /// Returns the host this client talks to.
    pub fn host(&self) -> &HostUrl {
        self.client.host()
    }

    async fn fetch(&self, url: &str, destination: &Path) -> Result<u64> {
        let response = self
            .client
            .request(Method::GET, url)
            .send()
            .await
            .map_err(transport)?;

        let response = RestClient::check_status(response).await?;
        crate::download::write_body(response, destination).await
    }

    async fn upload_form(&self, request: &UploadRequest, name: &str) -> Result<Form> {
        let file = File::open(&request.file).await?;
        let metadata = file.metadata().await?;
        if !metadata.is_file() {
            return Err(InvalidInputError::Other {
                message: format!("{} is not a regular file", request.file.display()),
            }
            .into());
        }

        let body = Body::wrap_stream(ReaderStream::new(file));
        let asset = Part::stream_with_length(body, metadata.len()).file_name(name.to_string());

        let mut form = Form::new()
            .text(RAW_DIRECTORY, request.directory.clone())
            .part(RAW_ASSET, asset)
            .text(RAW_ASSET_FILENAME, name.to_string());

        for (key, value) in request.properties.iter() {
            form = form.text(key.to_string(), value.to_string());
        }

        Ok(form)
    }
}

#[async_trait]
impl Repository for NexusRepository {
    #[instrument(skip(self))]
    async fn search_page(
        &self,
        repository: &str,
        filter: &str,
        continuation_token: Option<&str>,
    ) -> Result<AssetPage> {
        let query = SearchAssetsQuery {
            repository,
            name: filter,
            continuation_token,
        };

        let mut page: AssetPage = self.client.get_json(SEARCH_ASSETS, &query).await?;

        let host = self.client.host();
        for item in &mut page.items {
            item.download_url = Some(match item.download_url.as_deref() {
                Some(url) if !url.is_empty() => host.resolve(url),
                _ => host.asset_url(&item.repository, &item.path),
            });
        }

        debug!(
            items = page.items.len(),
            has_next = page.next_token().is_some(),
            "fetched search page"
        );
        Ok(page)
    }

    #[instrument(skip(self, destination), fields(destination = %destination.display()))]
    async fn download(&self, url: &str, destination: &Path) -> Result<u64> {
        let url = self.client.host().resolve(url);
        debug!(%url, "downloading asset");

        match self.fetch(&url, destination).await {
            Ok(bytes) => {
                debug!(bytes, "download complete");
                Ok(bytes)
            }
            Err(cause) => Err(DownloadError::new(destination, cause).into()),
        }
    }

    #[instrument(skip(self, request), fields(repository = %request.repository, file = %request.file.display()))]
    async fn upload(&self, request: &UploadRequest) -> Result<UploadReceipt> {
        let name = request.asset_name()?;
        let asset_path = request.asset_path()?;
        let form = self.upload_form(request, &name).await?;

        let url = self.client.host().rest_url(COMPONENTS);
        debug!(%url, %asset_path, properties = request.properties.len(), "uploading component");

        let response = self
            .client
            .request(Method::POST, &url)
            .query(&ComponentsQuery {
                repository: &request.repository,
            })
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            let error = RestClient::parse_error_response(response).await;
            return Err(Error::Upload(UploadError {
                status: error.status,
                message: error.message,
            }));
        }

        info!(%asset_path, "upload accepted");
        Ok(UploadReceipt {
            repository: request.repository.clone(),
            asset_path,
        })
    }
}
