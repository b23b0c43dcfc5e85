use crate::error::{FmexportError, Result};
use reqwest::Client;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use url::Url;

/// Raw JSON detail payload for one artist, stored verbatim.
pub type Snapshot = String;

/// Narrow seam over the metadata service consumed by the walker and the
/// worker pool. Production uses [`LastfmClient`]; tests substitute in-memory
/// graphs. Returned futures are `Send` so persister tasks can be spawned on
/// the runtime.
pub trait MetadataService: Send + Sync + 'static {
    /// Similar artists for `name`, in the order the service returns them.
    fn similar_artists(&self, name: &str) -> impl Future<Output = Result<Vec<String>>> + Send;

    /// Full detail payload for `name` as raw JSON.
    fn artist_detail(&self, name: &str) -> impl Future<Output = Result<Snapshot>> + Send;
}

/// Response structure for artist.getSimilar
#[derive(Deserialize)]
struct SimilarResponse {
    similarartists: SimilarArtists,
}

#[derive(Deserialize)]
struct SimilarArtists {
    #[serde(default)]
    artist: Vec<SimilarArtist>,
}

#[derive(Deserialize)]
struct SimilarArtist {
    name: String,
}

/// Last.fm reports application errors in a 200 body: {"error": 6, "message": "..."}
#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: i64,
    message: Option<String>,
}

/// Last.fm API client
///
/// Speaks the 2.0 REST API (`artist.getSimilar`, `artist.getInfo`) with
/// `format=json`. Failures are surfaced as opaque errors; the crawl core
/// does not interpret them beyond propagating or dropping per its contract.
pub struct LastfmClient {
    client: Client,
    api_key: String,
    base_url: Url,
}

impl LastfmClient {
    /// Create a new client.
    ///
    /// `base_url` is the API root (normally `https://ws.audioscrobbler.com/2.0/`);
    /// `timeout_secs` bounds each request.
    pub fn new(api_key: String, base_url: Url, timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    /// Perform one API call and return the raw response body.
    ///
    /// Checks both the HTTP status and the Last.fm error envelope, which the
    /// service sends with a 200 status for application failures.
    async fn call(&self, method: &str, artist: &str) -> Result<String> {
        let response = self
            .client
            .get(self.base_url.clone())
            .query(&[
                ("method", method),
                ("artist", artist),
                ("api_key", self.api_key.as_str()),
                ("format", "json"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(FmexportError::Api(format!(
                "{} for '{}' returned HTTP {}: {}",
                method, artist, status, body
            )));
        }

        if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(&body) {
            return Err(FmexportError::Api(format!(
                "{} for '{}' failed with code {}: {}",
                method,
                artist,
                envelope.error,
                envelope.message.unwrap_or_default()
            )));
        }

        Ok(body)
    }
}

impl MetadataService for LastfmClient {
    async fn similar_artists(&self, name: &str) -> Result<Vec<String>> {
        let body = self.call("artist.getsimilar", name).await?;

        let parsed: SimilarResponse = serde_json::from_str(&body).map_err(|e| {
            FmexportError::Api(format!("Malformed getsimilar response for '{}': {}", name, e))
        })?;

        Ok(parsed
            .similarartists
            .artist
            .into_iter()
            .map(|a| a.name)
            .collect())
    }

    async fn artist_detail(&self, name: &str) -> Result<Snapshot> {
        // Stored verbatim; only the error envelope is sniffed, in call().
        self.call("artist.getinfo", name).await
    }
}
