use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::PixelaError;
use crate::types::{
    CreateGraphRequest, CreateUserRequest, CreateWebhookRequest, GraphDefinition, GraphList,
    GraphStats, GraphSvgQuery, Pixel, PixelList, PixelaResponse, PixelsQuery, PostPixelRequest,
    QuantityRequest, UpdateGraphRequest, UpdatePixelRequest, UpdateUserProfileRequest,
    UpdateUserRequest, WebhookList,
};

pub const DEFAULT_BASE_URL: &str = "https://pixe.la";
pub const USER_TOKEN_HEADER: &str = "X-USER-TOKEN";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
const CONNECT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    /// Deadline for a whole request, connect through body.
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            connect_timeout: Duration::from_secs(CONNECT_TIMEOUT_SECS),
        }
    }
}

impl ClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// Typed Pixela API client: one method per remote capability.
///
/// Cloning is cheap and shares the connection pool. The client holds no
/// credentials; every authenticated call takes the caller's token.
#[derive(Clone, Debug)]
pub struct PixelaClient {
    base_url: String,
    http: reqwest::Client,
}

/// Whether a response's status line is trusted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum StatusPolicy {
    /// Read endpoints: non-2xx is a `Remote` error.
    Gate,
    /// Write endpoints: the body's `isSuccess` decides, status is ignored.
    Ignore,
}

impl PixelaClient {
    pub fn new(config: &ClientConfig) -> Result<Self, PixelaError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(concat!("pixela-mcp/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- users ---------------------------------------------------------------

    pub async fn create_user(
        &self,
        request: &CreateUserRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let builder = self.request(Method::POST, "/v1/users", None).json(request);
        self.write(builder).await
    }

    pub async fn update_user(
        &self,
        username: &str,
        token: &str,
        request: &UpdateUserRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}");
        self.write_json(Method::PUT, &path, token, request).await
    }

    pub async fn update_user_profile(
        &self,
        username: &str,
        token: &str,
        request: &UpdateUserProfileRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/@{username}");
        self.write_json(Method::PUT, &path, token, request).await
    }

    pub async fn delete_user(
        &self,
        username: &str,
        token: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}");
        self.write_empty(Method::DELETE, &path, Some(token)).await
    }

    // -- graphs --------------------------------------------------------------

    pub async fn create_graph(
        &self,
        username: &str,
        token: &str,
        request: &CreateGraphRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs");
        self.write_json(Method::POST, &path, token, request).await
    }

    pub async fn get_graphs(&self, username: &str, token: &str) -> Result<GraphList, PixelaError> {
        let path = format!("/v1/users/{username}/graphs");
        let body: Value = self.read_json(&path, token, &[]).await?;
        GraphList::decode("graphs", body.get("graphs"))
    }

    pub async fn get_graph_definition(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<GraphDefinition, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/graph-def");
        self.read_json(&path, token, &[]).await
    }

    pub async fn update_graph(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        request: &UpdateGraphRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}");
        self.write_json(Method::PUT, &path, token, request).await
    }

    pub async fn delete_graph(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}");
        self.write_empty(Method::DELETE, &path, Some(token)).await
    }

    /// Public SVG rendering of a graph. No token: secret graphs are not served.
    pub async fn get_graph_svg(
        &self,
        username: &str,
        graph_id: &str,
        query: &GraphSvgQuery,
    ) -> Result<String, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}");
        let builder = self.request(Method::GET, &path, None).query(&query.pairs());
        let (_, bytes) = self.execute(builder, StatusPolicy::Gate).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn get_graph_stats(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<GraphStats, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/stats");
        self.read_json(&path, token, &[]).await
    }

    // -- pixels --------------------------------------------------------------

    pub async fn post_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        request: &PostPixelRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}");
        self.write_json(Method::POST, &path, token, request).await
    }

    pub async fn batch_post_pixels(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        pixels: &[PostPixelRequest],
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/pixels");
        self.write_json(Method::POST, &path, token, &pixels).await
    }

    pub async fn get_pixels(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        query: &PixelsQuery,
    ) -> Result<PixelList, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/pixels");
        let body: Value = self.read_json(&path, token, &query.pairs()).await?;
        PixelList::decode("pixels", body.get("pixels"))
    }

    pub async fn get_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        date: &str,
    ) -> Result<Pixel, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/{date}");
        self.read_json(&path, token, &[]).await
    }

    pub async fn get_latest_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<Pixel, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/latest");
        self.read_json(&path, token, &[]).await
    }

    pub async fn get_today_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        return_empty: Option<bool>,
    ) -> Result<Pixel, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/today");
        let query: Vec<(&str, String)> = return_empty
            .map(|flag| vec![("returnEmpty", flag.to_string())])
            .unwrap_or_default();
        self.read_json(&path, token, &query).await
    }

    pub async fn update_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        date: &str,
        request: &UpdatePixelRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/{date}");
        self.write_json(Method::PUT, &path, token, request).await
    }

    pub async fn delete_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        date: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/{date}");
        self.write_empty(Method::DELETE, &path, Some(token)).await
    }

    pub async fn increment_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/increment");
        self.write_empty(Method::PUT, &path, Some(token)).await
    }

    pub async fn decrement_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/decrement");
        self.write_empty(Method::PUT, &path, Some(token)).await
    }

    pub async fn add_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        quantity: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/add");
        let body = QuantityRequest {
            quantity: quantity.to_string(),
        };
        self.write_json(Method::PUT, &path, token, &body).await
    }

    pub async fn subtract_pixel(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
        quantity: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/subtract");
        let body = QuantityRequest {
            quantity: quantity.to_string(),
        };
        self.write_json(Method::PUT, &path, token, &body).await
    }

    /// Starts the stopwatch on the first call, records elapsed minutes on the second.
    pub async fn stopwatch(
        &self,
        username: &str,
        token: &str,
        graph_id: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/graphs/{graph_id}/stopwatch");
        self.write_empty(Method::POST, &path, Some(token)).await
    }

    // -- webhooks ------------------------------------------------------------

    pub async fn create_webhook(
        &self,
        username: &str,
        token: &str,
        request: &CreateWebhookRequest,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/webhooks");
        self.write_json(Method::POST, &path, token, request).await
    }

    pub async fn get_webhooks(
        &self,
        username: &str,
        token: &str,
    ) -> Result<WebhookList, PixelaError> {
        let path = format!("/v1/users/{username}/webhooks");
        self.read_json(&path, token, &[]).await
    }

    /// The hash is the secret, so no token is sent.
    pub async fn invoke_webhook(
        &self,
        username: &str,
        webhook_hash: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/webhooks/{webhook_hash}");
        self.write_empty(Method::POST, &path, None).await
    }

    pub async fn delete_webhook(
        &self,
        username: &str,
        token: &str,
        webhook_hash: &str,
    ) -> Result<PixelaResponse, PixelaError> {
        let path = format!("/v1/users/{username}/webhooks/{webhook_hash}");
        self.write_empty(Method::DELETE, &path, Some(token)).await
    }

    // -- plumbing ------------------------------------------------------------

    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        tracing::debug!(
            method = %method,
            path = %loggable_path(path),
            authenticated = token.is_some(),
            "pixela request"
        );
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match token {
            Some(token) => builder.header(USER_TOKEN_HEADER, token),
            None => builder,
        }
    }

    async fn write_json<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<PixelaResponse, PixelaError> {
        let builder = self.request(method, path, Some(token)).json(body);
        self.write(builder).await
    }

    /// Zero-length body with an explicit `Content-Length: 0`.
    async fn write_empty(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
    ) -> Result<PixelaResponse, PixelaError> {
        let builder = self.request(method, path, token).body(Vec::<u8>::new());
        self.write(builder).await
    }

    async fn write(&self, builder: RequestBuilder) -> Result<PixelaResponse, PixelaError> {
        let (_, bytes) = self.execute(builder, StatusPolicy::Ignore).await?;
        decode_body(&bytes)
    }

    async fn read_json<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &str,
        query: &[(&str, String)],
    ) -> Result<T, PixelaError> {
        let mut builder = self.request(Method::GET, path, Some(token));
        if !query.is_empty() {
            builder = builder.query(query);
        }
        let (_, bytes) = self.execute(builder, StatusPolicy::Gate).await?;
        decode_body(&bytes)
    }

    async fn execute(
        &self,
        builder: RequestBuilder,
        policy: StatusPolicy,
    ) -> Result<(StatusCode, Vec<u8>), PixelaError> {
        let response = builder.send().await.map_err(|err| {
            let err = PixelaError::from(err);
            tracing::warn!(error = %err, timeout = err.is_timeout(), "pixela request failed");
            err
        })?;
        let status = response.status();
        let bytes = response.bytes().await?.to_vec();
        tracing::debug!(status = status.as_u16(), bytes = bytes.len(), "pixela response");

        if policy == StatusPolicy::Gate && !status.is_success() {
            return Err(PixelaError::Remote {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }
        Ok((status, bytes))
    }
}

/// Webhook hashes are bearer secrets; everything after `/webhooks/` is masked.
fn loggable_path(path: &str) -> String {
    match path.split_once("/webhooks/") {
        Some((prefix, _)) => format!("{prefix}/webhooks/<redacted>"),
        None => path.to_string(),
    }
}

fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, PixelaError> {
    serde_json::from_slice(bytes).map_err(|err| {
        PixelaError::Decode(format!(
            "{err} (body: {})",
            String::from_utf8_lossy(bytes).chars().take(200).collect::<String>()
        ))
    })
}
