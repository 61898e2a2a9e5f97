//! Client for the deals API.

use reqwest::StatusCode;

use super::model::SaleResponse;

/// Failure to retrieve the current sales.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("deals api request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("deals api returned non-OK code {0}")]
    Status(StatusCode),
    #[error("deals api returned invalid json: {0}")]
    Body(#[source] reqwest::Error),
}

/// Gets the games currently on sale.
///
/// The API key is passed as the `api_key` query parameter.
pub async fn fetch_sales(
    http: &reqwest::Client,
    url: &str,
    api_key: &str,
) -> Result<SaleResponse, FetchError> {
    let response = http
        .get(url)
        .query(&[("api_key", api_key)])
        .send()
        .await
        .map_err(FetchError::Request)?;

    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::Status(status));
    }

    response.json().await.map_err(FetchError::Body)
}
