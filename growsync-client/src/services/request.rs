use std::time::Duration;

use async_trait::async_trait;

use growsync_api::models::Datapoint;
use growsync_api::read_datapoints;

use crate::errors::FetchError;

/// Performs a view GET and yields normalized datapoints or a typed failure.
#[async_trait]
pub trait RequestClient: Send + Sync + 'static {
    async fn get_datapoints(&self, url: &str) -> Result<Vec<Datapoint>, FetchError>;
}

#[derive(Clone)]
pub struct HttpRequestClient {
    client: reqwest::Client,
}

impl HttpRequestClient {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl RequestClient for HttpRequestClient {
    async fn get_datapoints(&self, url: &str) -> Result<Vec<Datapoint>, FetchError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| FetchError::transport(url, e))?;

        let data = read_datapoints(&body).map_err(|e| FetchError::decode(url, e))?;

        tracing::debug!("GET {} -> {} datapoints", url, data.len());

        Ok(data)
    }
}
