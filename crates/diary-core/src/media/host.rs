//! HTTP client for the asset host: multipart uploads and delete-token discards.

use reqwest::header::ACCEPT;
use reqwest::{multipart, Client, Request, StatusCode};
use serde::{Deserialize, Serialize};

use super::{AssetHost, UploadedAsset};
use crate::api::parse_api_error;
use crate::config::{AssetHostConfig, ClientConfig};
use crate::models::ImageSelection;
use crate::util::is_http_url;
use crate::{Error, Result};

/// Unsigned uploads to a Cloudinary-style host.
#[derive(Debug, Clone)]
pub struct HttpAssetHost {
    config: AssetHostConfig,
    client: Client,
}

impl HttpAssetHost {
    /// Build a host client from the client configuration.
    ///
    /// Fails when no asset host is configured.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let asset_host = config.asset_host.clone().ok_or_else(|| {
            Error::Config("asset host is not configured; image uploads are unavailable".to_string())
        })?;
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(client, asset_host))
    }

    pub fn with_client(client: Client, config: AssetHostConfig) -> Self {
        Self { config, client }
    }

    fn build_upload_request(&self, image: &ImageSelection) -> Result<Request> {
        let file_part = multipart::Part::bytes(image.bytes.clone())
            .file_name(image.file_name.clone())
            .mime_str(&image.content_type)?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("upload_preset", self.config.upload_preset.clone())
            .text("return_delete_token", "true");

        Ok(self
            .client
            .post(&self.config.upload_url)
            .header(ACCEPT, "application/json")
            .multipart(form)
            .build()?)
    }

    fn build_discard_request(&self, delete_token: &str) -> Result<Request> {
        let endpoint = self.config.delete_by_token_url().ok_or_else(|| {
            Error::Config(format!(
                "cannot derive a delete endpoint from {}",
                self.config.upload_url
            ))
        })?;
        Ok(self
            .client
            .post(endpoint)
            .header(ACCEPT, "application/json")
            .json(&DeleteByTokenRequest {
                token: delete_token,
            })
            .build()?)
    }
}

impl AssetHost for HttpAssetHost {
    async fn upload(&self, image: &ImageSelection) -> Result<UploadedAsset> {
        let request = self.build_upload_request(image)?;
        tracing::debug!(
            "Uploading {} ({} bytes, {})",
            image.file_name,
            image.size_bytes(),
            image.content_type
        );

        let response = self.client.execute(request).await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(parse_host_error(status, &body));
        }
        parse_upload_response(&body)
    }

    async fn discard(&self, asset: &UploadedAsset) -> Result<()> {
        let delete_token = asset.delete_token.as_deref().ok_or_else(|| {
            Error::InvalidInput(format!("no delete token for {}", asset.url))
        })?;
        let response = self
            .client
            .execute(self.build_discard_request(delete_token)?)
            .await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_host_error(status, &body));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize)]
struct DeleteByTokenRequest<'a> {
    token: &'a str,
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: Option<String>,
    delete_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct HostErrorResponse {
    error: HostErrorDetail,
}

#[derive(Debug, Deserialize)]
struct HostErrorDetail {
    message: String,
}

fn parse_upload_response(body: &str) -> Result<UploadedAsset> {
    let payload: UploadResponse = serde_json::from_str(body)
        .map_err(|error| Error::MalformedResponse(error.to_string()))?;
    let url = payload
        .secure_url
        .map(|url| url.trim().to_string())
        .filter(|url| is_http_url(url))
        .ok_or_else(|| {
            Error::MalformedResponse("upload response did not include secure_url".to_string())
        })?;
    Ok(UploadedAsset {
        url,
        delete_token: payload
            .delete_token
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty()),
    })
}

/// The host nests its message under `error.message`; anything else falls back
/// to the backend error parser.
fn parse_host_error(status: StatusCode, body: &str) -> Error {
    match serde_json::from_str::<HostErrorResponse>(body) {
        Ok(payload) if !payload.error.message.trim().is_empty() => Error::Api {
            status: status.as_u16(),
            message: Some(payload.error.message.trim().to_string()),
        },
        _ => parse_api_error(status, body),
    }
}
