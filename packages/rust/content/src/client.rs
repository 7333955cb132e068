//! HTTP client for the content store's query and listen endpoints.

use std::time::Duration;

use reqwest::Client;
use reqwest::header::ACCEPT;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};
use url::Url;

use groqspec_shared::{Chapter, ContentConfig, GroqSpecError, Result};

use crate::listen::{self, EVENT_BUFFER, Subscription};
use crate::query::{self, Drafts};

/// User-Agent string for content store requests.
const USER_AGENT: &str = concat!("groqspec/", env!("CARGO_PKG_VERSION"));

/// Timeout for query requests.
const QUERY_TIMEOUT_SECS: u64 = 30;

/// Connect timeout for the long-lived listen request.
const LISTEN_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Envelope of a query response.
#[derive(Debug, Deserialize)]
struct QueryResponse<T> {
    result: T,
}

/// Authenticated client for one project/dataset.
///
/// Built once at startup and shared by reference with every component that
/// talks to the content store.
#[derive(Clone)]
pub struct ContentClient {
    config: ContentConfig,
    base_url: Url,
    token: String,
    client: Client,
    stream_client: Client,
}

impl ContentClient {
    /// Create a client for the configured project.
    pub fn new(config: &ContentConfig, token: impl Into<String>) -> Result<Self> {
        let base_url = config.base_url()?;

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(QUERY_TIMEOUT_SECS))
            .build()
            .map_err(|e| GroqSpecError::Network(format!("failed to build HTTP client: {e}")))?;

        // No overall timeout: the listen response stays open indefinitely.
        let stream_client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(LISTEN_CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| GroqSpecError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            config: config.clone(),
            base_url,
            token: token.into(),
            client,
            stream_client,
        })
    }

    /// The configuration this client was built from.
    pub fn config(&self) -> &ContentConfig {
        &self.config
    }

    /// Run a GROQ query and deserialize its `result`.
    #[instrument(skip(self))]
    pub async fn fetch<T: DeserializeOwned>(&self, groq: &str) -> Result<T> {
        let url = self.endpoint("query", groq)?;
        debug!(%url, "querying content store");

        let response = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|e| GroqSpecError::Network(format!("query request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GroqSpecError::ContentStore(format!("HTTP {status}: {body}")));
        }

        let envelope: QueryResponse<T> = response
            .json()
            .await
            .map_err(|e| GroqSpecError::parse(format!("invalid query response: {e}")))?;

        Ok(envelope.result)
    }

    /// Fetch all chapters in sort order.
    pub async fn fetch_chapters(&self, drafts: Drafts) -> Result<Vec<Chapter>> {
        let groq = query::chapters_query(&self.config, drafts);
        let chapters: Vec<Chapter> = self.fetch(&groq).await?;
        info!(count = chapters.len(), ?drafts, "fetched chapters");
        Ok(chapters)
    }

    /// Subscribe to mutations of documents matching `filter`.
    #[instrument(skip(self))]
    pub async fn listen(&self, filter: &str) -> Result<Subscription> {
        let mut url = self.endpoint("listen", filter)?;
        url.query_pairs_mut().append_pair("includeResult", "false");

        let response = self
            .stream_client
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| GroqSpecError::Network(format!("listen request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GroqSpecError::ContentStore(format!("HTTP {status}: {body}")));
        }

        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let task = tokio::spawn(listen::pump(response, tx));
        Ok(Subscription::spawned(rx, task))
    }

    /// Subscribe to changes of any specification chapter.
    pub async fn listen_chapters(&self) -> Result<Subscription> {
        self.listen(&query::listen_filter(&self.config)).await
    }

    /// `<base>/<version>/data/<kind>/<dataset>?query=<groq>`
    fn endpoint(&self, kind: &str, groq: &str) -> Result<Url> {
        let path = format!(
            "{}/data/{kind}/{}",
            self.config.api_version, self.config.dataset
        );
        let mut url = self
            .base_url
            .join(&path)
            .map_err(|e| GroqSpecError::config(format!("invalid endpoint '{path}': {e}")))?;
        url.query_pairs_mut().append_pair("query", groq);
        Ok(url)
    }
}

impl std::fmt::Debug for ContentClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContentClient")
            .field("base_url", &self.base_url.as_str())
            .field("dataset", &self.config.dataset)
            .field("token", &"<redacted>")
            .finish()
    }
}
