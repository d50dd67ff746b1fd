//! Request helpers shared by the upstream clients

use crate::error::SourceError;
use reqwest::header::ACCEPT;
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

fn join(base: &Url, path: &str) -> Result<Url, SourceError> {
    base.join(path).map_err(|e| SourceError::InvalidEndpoint {
        endpoint: base.to_string(),
        reason: format!("cannot join '{path}': {e}"),
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, SourceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Status {
            status: status.as_u16(),
            body,
        });
    }

    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| SourceError::Decode(e.to_string()))
}

/// GET `path` relative to `base` and decode the JSON body
pub(crate) async fn get_json<T: DeserializeOwned>(
    http: &Client,
    base: &Url,
    path: &str,
) -> Result<T, SourceError> {
    let response = http
        .get(join(base, path)?)
        .header(ACCEPT, "application/json")
        .send()
        .await?;

    read_json(response).await
}

/// POST a JSON body to `path` relative to `base` and decode the JSON reply
pub(crate) async fn post_json<T: DeserializeOwned, B: Serialize + ?Sized>(
    http: &Client,
    base: &Url,
    path: &str,
    body: &B,
) -> Result<T, SourceError> {
    let response = http
        .post(join(base, path)?)
        .header(ACCEPT, "application/json")
        .json(body)
        .send()
        .await?;

    read_json(response).await
}
