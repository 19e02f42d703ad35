//! HTTP request facade

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::backends::{
    ClientTransport, EventTransport, ExternalClient, FetchTransport, CLIENT_ADAPTER,
    EVENT_ADAPTER, FETCH_ADAPTER,
};
use crate::config::{ClientConfig, ClientOptions, Method, RequestBody, RequestConfig};
use crate::error::{Error, Normalize};
use crate::response::{DecodedBody, Response};
use crate::transport::Transport;

/// HTTP request facade
///
/// Holds an immutable [`ClientConfig`] and a registry of named transports.
/// The three built-in transports are always registered; more can be added
/// with [`HttpClient::use_adapter`]. Registration needs `&mut self`, so it
/// has to happen before the client is shared between concurrent callers.
#[derive(Debug, Clone)]
pub struct HttpClient {
    config: ClientConfig,
    adapters: HashMap<String, Arc<dyn Transport>>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new(ClientOptions::default())
    }
}

impl HttpClient {
    /// Create a new HTTP client, unset options take their defaults
    pub fn new(options: ClientOptions) -> Self {
        Self::builder().options(options).build()
    }

    /// Create a new HTTP client builder
    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Configuration every request starts from
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Names of all registered transports
    pub fn adapter_names(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }

    /// Register a transport under `name`
    ///
    /// Registering a name that already exists replaces the previous
    /// transport, built-in ones included. This is not an error.
    pub fn use_adapter(
        &mut self,
        name: impl Into<String>,
        adapter: impl Transport + 'static,
    ) -> &mut Self {
        let name = name.into();
        if self
            .adapters
            .insert(name.clone(), Arc::new(adapter))
            .is_some()
        {
            tracing::debug!("Replaced transport registered as {}", name);
        }
        self
    }

    /// Send a request
    ///
    /// `path` is resolved against the configured base url, then the call is
    /// routed to the transport named by the merged configuration.
    pub async fn request(&self, path: &str, config: RequestConfig) -> Response<DecodedBody> {
        self.request_with_cancel(path, config, CancellationToken::new())
            .await
    }

    /// Send a request that can be aborted through `cancel`
    ///
    /// Cancelling the token fails the request with an aborted
    /// [`crate::NormalizedError`]. Cancelling it after the request completed
    /// has no effect.
    #[instrument(skip(self, config, cancel))]
    pub async fn request_with_cancel(
        &self,
        path: &str,
        config: RequestConfig,
        cancel: CancellationToken,
    ) -> Response<DecodedBody> {
        let request = self.config.resolve(path, config);

        let adapter = self
            .adapters
            .get(&request.adapter)
            .ok_or_else(|| Error::AdapterNotFound(request.adapter.clone()))?;

        tracing::debug!(
            "{} {} via {} transport",
            request.method,
            request.url,
            request.adapter
        );

        adapter
            .execute(request.clone(), cancel)
            .await
            .map_err(|err| {
                let err = err.normalize(&request);
                tracing::warn!(
                    "{} {} failed: {} (aborted: {})",
                    request.method,
                    request.url,
                    err,
                    err.is_aborted
                );
                Error::from(err)
            })
    }

    /// GET request
    pub async fn get(&self, path: &str, config: RequestConfig) -> Response<DecodedBody> {
        self.request(path, config.method(Method::Get)).await
    }

    /// GET request, JSON body deserialized to R
    pub async fn get_json<R>(&self, path: &str, config: RequestConfig) -> Response<R>
    where
        R: DeserializeOwned,
    {
        let request = self.config.resolve(path, config.clone().method(Method::Get));
        let body = self.get(path, config).await?;

        body.deserialize()
            .map_err(|err| Error::from(err.normalize(&request)))
    }

    /// POST request with a body
    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        config: RequestConfig,
    ) -> Response<DecodedBody> {
        self.request(path, config.method(Method::Post).body(body))
            .await
    }

    /// PUT request with a body
    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
        config: RequestConfig,
    ) -> Response<DecodedBody> {
        self.request(path, config.method(Method::Put).body(body))
            .await
    }

    /// DELETE request
    pub async fn delete(&self, path: &str, config: RequestConfig) -> Response<DecodedBody> {
        self.request(path, config.method(Method::Delete)).await
    }
}

/// HTTP client builder for configuring options and transports
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    options: ClientOptions,
    reqwest: Option<reqwest::Client>,
    external: Option<Arc<dyn ExternalClient>>,
    adapters: Vec<(String, Arc<dyn Transport>)>,
}

impl HttpClientBuilder {
    /// Overlay client options, fields already set are replaced
    pub fn options(mut self, options: ClientOptions) -> Self {
        self.options = self.options.merge(options);
        self
    }

    /// Use a configured reqwest::Client for the fetch and event transports
    pub fn reqwest_client(mut self, client: reqwest::Client) -> Self {
        self.reqwest = Some(client);
        self
    }

    /// Use another third-party client for the client transport
    pub fn external_client(mut self, client: Arc<dyn ExternalClient>) -> Self {
        self.external = Some(client);
        self
    }

    /// Register an additional transport
    pub fn adapter(mut self, name: impl Into<String>, adapter: impl Transport + 'static) -> Self {
        self.adapters.push((name.into(), Arc::new(adapter)));
        self
    }

    /// Build the HTTP client
    pub fn build(self) -> HttpClient {
        let reqwest = self.reqwest.unwrap_or_default();
        let client_transport = match self.external {
            Some(external) => ClientTransport::new(external),
            None => ClientTransport::default(),
        };

        let mut adapters: HashMap<String, Arc<dyn Transport>> = HashMap::new();
        adapters.insert(
            FETCH_ADAPTER.to_string(),
            Arc::new(FetchTransport::from_reqwest(reqwest.clone())),
        );
        adapters.insert(
            EVENT_ADAPTER.to_string(),
            Arc::new(EventTransport::from_reqwest(reqwest)),
        );
        adapters.insert(CLIENT_ADAPTER.to_string(), Arc::new(client_transport));
        adapters.extend(self.adapters);

        HttpClient {
            config: ClientConfig::from(self.options),
            adapters,
        }
    }
}

/// Convenience function for a one-off GET with the default configuration
pub async fn fetch(url: &str) -> Response<DecodedBody> {
    HttpClient::default().get(url, RequestConfig::new()).await
}
