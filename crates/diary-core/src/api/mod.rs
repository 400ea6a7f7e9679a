//! Diary backend REST client.
//!
//! `DiaryBackend` is the seam the store, the session validator and the
//! controller talk to. `HttpDiaryBackend` implements it over `reqwest`,
//! sending the raw session token as the `Authorization` header value.

use std::fmt;
use std::future::Future;

use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, Request, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ClientConfig;
use crate::models::{DiaryEntry, EntryFields, EntryId, UserProfile};
use crate::util::compact_text;
use crate::{Error, Result};

/// Raw session token issued by the backend on login.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthToken(String);

impl AuthToken {
    /// Wrap a token, treating blank values as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AuthToken {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("AuthToken([REDACTED])")
    }
}

#[derive(Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("LoginRequest")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegisterRequest {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("RegisterRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateEntryRequest {
    pub title: String,
    pub description: String,
    pub media: Vec<String>,
}

impl CreateEntryRequest {
    #[must_use]
    pub fn new(fields: EntryFields, media: Vec<String>) -> Self {
        Self {
            title: fields.title,
            description: fields.description,
            media,
        }
    }
}

/// Operations offered by the diary backend.
pub trait DiaryBackend {
    /// Exchange credentials for a session token.
    fn login(&self, request: &LoginRequest) -> impl Future<Output = Result<AuthToken>> + Send;

    fn register(&self, request: &RegisterRequest) -> impl Future<Output = Result<()>> + Send;

    /// Look up the profile owning `token`.
    fn current_user(&self, token: &AuthToken)
        -> impl Future<Output = Result<UserProfile>> + Send;

    fn list_entries(
        &self,
        token: &AuthToken,
    ) -> impl Future<Output = Result<Vec<DiaryEntry>>> + Send;

    fn create_entry(
        &self,
        token: &AuthToken,
        request: &CreateEntryRequest,
    ) -> impl Future<Output = Result<DiaryEntry>> + Send;

    fn update_entry(
        &self,
        token: &AuthToken,
        id: &EntryId,
        fields: &EntryFields,
    ) -> impl Future<Output = Result<DiaryEntry>> + Send;

    fn delete_entry(
        &self,
        token: &AuthToken,
        id: &EntryId,
    ) -> impl Future<Output = Result<()>> + Send;
}

/// `reqwest` implementation of [`DiaryBackend`].
#[derive(Debug, Clone)]
pub struct HttpDiaryBackend {
    base_url: String,
    client: Client,
}

impl HttpDiaryBackend {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self::with_client(client, &config.api_base_url))
    }

    /// Create from an existing `reqwest::Client`.
    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            client,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    fn build_login_request(&self, request: &LoginRequest) -> Result<Request> {
        Ok(self
            .client
            .post(self.url("/auth/login"))
            .header(ACCEPT, "application/json")
            .json(request)
            .build()?)
    }

    fn build_register_request(&self, request: &RegisterRequest) -> Result<Request> {
        Ok(self
            .client
            .post(self.url("/auth/register"))
            .header(ACCEPT, "application/json")
            .json(request)
            .build()?)
    }

    fn build_current_user_request(&self, token: &AuthToken) -> Result<Request> {
        Ok(self
            .client
            .get(self.url("/auth/get-user"))
            .header(AUTHORIZATION, token.as_str())
            .header(ACCEPT, "application/json")
            .build()?)
    }

    fn build_list_request(&self, token: &AuthToken) -> Result<Request> {
        Ok(self
            .client
            .get(self.url("/diary"))
            .header(AUTHORIZATION, token.as_str())
            .header(ACCEPT, "application/json")
            .build()?)
    }

    fn build_create_request(
        &self,
        token: &AuthToken,
        request: &CreateEntryRequest,
    ) -> Result<Request> {
        Ok(self
            .client
            .post(self.url("/diary/"))
            .header(AUTHORIZATION, token.as_str())
            .header(ACCEPT, "application/json")
            .json(request)
            .build()?)
    }

    fn build_update_request(
        &self,
        token: &AuthToken,
        id: &EntryId,
        fields: &EntryFields,
    ) -> Result<Request> {
        Ok(self
            .client
            .put(self.url(&format!("/diary/{}", urlencoding::encode(id.as_str()))))
            .header(AUTHORIZATION, token.as_str())
            .header(ACCEPT, "application/json")
            .json(fields)
            .build()?)
    }

    fn build_delete_request(&self, token: &AuthToken, id: &EntryId) -> Result<Request> {
        Ok(self
            .client
            .delete(self.url(&format!("/diary/{}", urlencoding::encode(id.as_str()))))
            .header(AUTHORIZATION, token.as_str())
            .build()?)
    }

    async fn execute(&self, request: Request) -> Result<Response> {
        let method = request.method().clone();
        let path = request.url().path().to_string();
        tracing::debug!("{} {}", method, path);

        let response = self.client.execute(request).await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::warn!("{} {} failed with HTTP {}", method, path, status.as_u16());
            return Err(parse_api_error(status, &body));
        }
        Ok(response)
    }
}

impl DiaryBackend for HttpDiaryBackend {
    async fn login(&self, request: &LoginRequest) -> Result<AuthToken> {
        let response = self.execute(self.build_login_request(request)?).await?;
        let payload: LoginResponse = decode_json(response).await?;
        AuthToken::new(payload.token).ok_or_else(|| {
            Error::MalformedResponse("login response did not include a token".to_string())
        })
    }

    async fn register(&self, request: &RegisterRequest) -> Result<()> {
        self.execute(self.build_register_request(request)?).await?;
        Ok(())
    }

    async fn current_user(&self, token: &AuthToken) -> Result<UserProfile> {
        let response = self
            .execute(self.build_current_user_request(token)?)
            .await?;
        decode_json(response).await
    }

    async fn list_entries(&self, token: &AuthToken) -> Result<Vec<DiaryEntry>> {
        let response = self.execute(self.build_list_request(token)?).await?;
        let entries: Vec<DiaryEntry> = decode_json(response).await?;
        for entry in &entries {
            entry.validate()?;
        }
        Ok(entries)
    }

    async fn create_entry(
        &self,
        token: &AuthToken,
        request: &CreateEntryRequest,
    ) -> Result<DiaryEntry> {
        let response = self
            .execute(self.build_create_request(token, request)?)
            .await?;
        let entry: DiaryEntry = decode_json(response).await?;
        entry.validate()?;
        Ok(entry)
    }

    async fn update_entry(
        &self,
        token: &AuthToken,
        id: &EntryId,
        fields: &EntryFields,
    ) -> Result<DiaryEntry> {
        let response = self
            .execute(self.build_update_request(token, id, fields)?)
            .await?;
        let entry: DiaryEntry = decode_json(response).await?;
        entry.validate()?;
        Ok(entry)
    }

    async fn delete_entry(&self, token: &AuthToken, id: &EntryId) -> Result<()> {
        self.execute(self.build_delete_request(token, id)?).await?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    token: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    message: Option<String>,
    error: Option<String>,
    msg: Option<String>,
}

/// Turn a non-success response into an error, keeping the server's own
/// message when the body carries one.
pub(crate) fn parse_api_error(status: StatusCode, body: &str) -> Error {
    let from_json = serde_json::from_str::<ApiErrorResponse>(body)
        .ok()
        .and_then(|payload| payload.message.or(payload.error).or(payload.msg))
        .map(|message| message.trim().to_string())
        .filter(|message| !message.is_empty());

    let message = from_json.or_else(|| {
        let trimmed = compact_text(body);
        if trimmed.is_empty() || trimmed.starts_with('<') || trimmed.starts_with('{') {
            None
        } else {
            Some(trimmed)
        }
    });

    Error::Api {
        status: status.as_u16(),
        message,
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|error| Error::MalformedResponse(error.to_string()))
}
