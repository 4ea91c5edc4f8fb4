//! REST HTTP client implementation.

use reqwest::{Method, RequestBuilder};
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, instrument, trace};

use nexus_core::error::{Error, ProtocolError, TransportError};
use nexus_core::HostUrl;

use crate::config::ClientConfig;
use crate::credentials::Credentials;
use crate::endpoints::error_message;
use crate::error::transport;

/// HTTP client for the REST API and asset content URLs.
#[derive(Debug, Clone)]
pub(crate) struct RestClient {
    client: reqwest::Client,
    host: HostUrl,
    credentials: Option<Credentials>,
    timeout: std::time::Duration,
}

impl RestClient {
    /// Create a new client from connection settings.
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nexus/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.timeout)
            .read_timeout(config.timeout)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| TransportError::Tls {
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            host: config.host,
            credentials: config.credentials,
            timeout: config.timeout,
        })
    }

    pub fn host(&self) -> &HostUrl {
        &self.host
    }

    /// Start a request to an absolute URL, attaching credentials.
    pub fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let builder = self.client.request(method, url);
        match &self.credentials {
            Some(creds) => builder.basic_auth(creds.username(), Some(creds.password())),
            None => builder,
        }
    }

    /// Make a GET request to a REST endpoint and decode the JSON body.
    ///
    /// The whole exchange, body included, is bounded by the timeout.
    #[instrument(skip(self), fields(host = %self.host))]
    pub async fn get_json<Q, R>(&self, endpoint: &str, params: &Q) -> Result<R, Error>
    where
        Q: Serialize + std::fmt::Debug,
        R: DeserializeOwned,
    {
        let url = self.host.rest_url(endpoint);
        debug!(endpoint, "REST query");
        trace!(?params, "query parameters");

        let response = self
            .request(Method::GET, &url)
            .query(params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport)?;

        let response = Self::check_status(response).await?;
        response.json::<R>().await.map_err(transport)
    }

    /// Pass through success responses; turn anything else into a
    /// [`ProtocolError`] carrying the server's message.
    pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, Error> {
        let status = response.status();
        trace!(status = %status, "REST response");

        if status.is_success() {
            Ok(response)
        } else {
            Err(Error::Protocol(Self::parse_error_response(response).await))
        }
    }

    /// Parse an error response.
    pub async fn parse_error_response(response: reqwest::Response) -> ProtocolError {
        let status = response.status().as_u16();
        let message = match response.text().await {
            Ok(body) => error_message(&body),
            Err(_) => None,
        };
        ProtocolError::new(status, message)
    }
}
