use crate::models::{
    ActionKind, ActionRequest, CatalogLoad, HardwareCatalog, HardwareOption, Submission,
};
use futures::future::join_all;
use log::{debug, error, info};
use reqwest::Client;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://netheria.takehome.octoml.ai";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP client initialization failed: {0}")]
    InitFailed(#[source] reqwest::Error),
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[source] reqwest::Error),
    #[error("{url} responded with status {status}")]
    Status { status: u16, url: String },
    #[error("failed to parse response: {0}")]
    ParseFailed(#[source] reqwest::Error),
}

impl ClientError {
    /// HTTP status of the failed call, if a response was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::RequestFailed(e) | ClientError::ParseFailed(e) => {
                e.status().map(|status| status.as_u16())
            }
            ClientError::InitFailed(_) | ClientError::InvalidUrl(_) => None,
        }
    }
}

/// A failed submission batch. Only the first failure is reported; calls
/// that already went out are neither retried nor undone.
#[derive(Debug, thiserror::Error)]
#[error("{kind} submission failed: {source}")]
pub struct SubmissionError {
    pub kind: ActionKind,
    #[source]
    pub source: ClientError,
}

impl SubmissionError {
    pub fn status(&self) -> Option<u16> {
        self.source.status()
    }
}

/// HTTP client for the optimization service.
#[derive(Debug, Clone)]
pub struct OctomizeClient {
    client: Client,
    base_url: Url,
}

impl OctomizeClient {
    pub fn new(mut base_url: Url, timeout: Duration) -> Result<Self, ClientError> {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("octomize/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(ClientError::InitFailed)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn endpoint(&self, route: &str) -> Result<Url, ClientError> {
        Ok(self.base_url.join(route)?)
    }

    /// Fetches every available hardware target in one call.
    pub async fn fetch_hardware(&self) -> Result<Vec<HardwareOption>, ClientError> {
        let url = self.endpoint("hardware")?;
        debug!("Fetching hardware targets from: {url}");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(ClientError::RequestFailed)?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }

        response
            .json::<Vec<HardwareOption>>()
            .await
            .map_err(ClientError::ParseFailed)
    }

    /// Loads the hardware catalog. Failures are folded into
    /// [`CatalogLoad::Failed`] instead of being returned as errors.
    pub async fn load_catalog(&self) -> CatalogLoad {
        match self.fetch_hardware().await {
            Ok(options) => {
                let catalog = HardwareCatalog::from_options(options);
                info!("Loaded {} hardware targets", catalog.len());
                CatalogLoad::Loaded(catalog)
            }
            Err(e) => {
                error!("Failed to load hardware targets: {e}");
                CatalogLoad::Failed(e.to_string())
            }
        }
    }

    /// Like [`Self::load_catalog`], but yields `None` if `token` is cancelled
    /// before the load settles. The late result is dropped.
    pub async fn load_catalog_until(&self, token: &CancellationToken) -> Option<CatalogLoad> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!("Hardware catalog load cancelled");
                None
            }
            load = self.load_catalog() => Some(load),
        }
    }

    /// Posts a single action request to `/{kind}`.
    pub async fn submit(
        &self,
        kind: ActionKind,
        request: &ActionRequest,
    ) -> Result<(), ClientError> {
        let url = self.endpoint(kind.as_str())?;
        debug!(
            "Submitting {kind} for {}",
            request.hardware.instance.as_deref().unwrap_or("<none>")
        );

        let response = self
            .client
            .post(url.clone())
            .json(request)
            .send()
            .await
            .map_err(ClientError::RequestFailed)?;

        if !response.status().is_success() {
            return Err(ClientError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(())
    }

    /// Issues every submission concurrently and waits for all of them to
    /// settle. A failure does not stop the other calls; the first failed call
    /// in batch order is reported. Returns the number of calls made.
    pub async fn submit_all(&self, submissions: &[Submission]) -> Result<usize, SubmissionError> {
        let calls = submissions.iter().map(|submission| async move {
            self.submit(submission.kind, &submission.request)
                .await
                .map_err(|source| SubmissionError {
                    kind: submission.kind,
                    source,
                })
        });

        let results = join_all(calls).await;
        let sent = results.len();
        let failed = results.iter().filter(|result| result.is_err()).count();

        if let Some(e) = results.into_iter().find_map(Result::err) {
            error!("Submission batch failed ({failed} of {sent} calls): {e}");
            return Err(e);
        }
        info!("Submitted {sent} runs");
        Ok(sent)
    }
}
