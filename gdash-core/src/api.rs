use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use tracing::debug;

use crate::config::Config;
use crate::error::{ApiError, ApiResult, extract_error_message};
use crate::model::{Page, WeatherInsight, WeatherLog};
use crate::poller::LatestInsight;
use crate::session::Session;

pub mod auth;
pub mod people;
pub mod weather;

pub use people::PeopleClient;

/// HTTP client for the weather-dashboard backend.
///
/// `base_url` points at the versioned API root (e.g. `…/api/v1`). When a
/// token is present it is attached as `Authorization: Token <token>` on
/// every call; without one the calls go out unauthenticated and the backend
/// decides whether to reject them.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: Client::new(), base_url: base_url.into(), token: None }
    }

    pub fn from_config(config: &Config, session: Option<&Session>) -> Self {
        let mut client = Self::new(config.base_url.clone());
        client.token = session.map(|s| s.token.clone());
        client
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, self.url(path));
        match &self.token {
            Some(token) => builder.header("Authorization", format!("Token {token}")),
            None => builder,
        }
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }
}

/// The backend surface the dashboard driver needs. `ApiClient` is the real
/// implementation; tests script their own.
#[async_trait]
pub trait WeatherBackend: Send + Sync {
    async fn list_logs(
        &self,
        limit: u32,
        offset: u32,
        city: Option<&str>,
    ) -> ApiResult<Page<WeatherLog>>;

    async fn list_insights(
        &self,
        days: Option<u32>,
        limit: u32,
        offset: u32,
        city: Option<&str>,
    ) -> ApiResult<Page<WeatherInsight>>;

    async fn latest_insight(&self) -> ApiResult<Option<WeatherInsight>>;

    async fn generate_insight(&self, hours: u32, city: Option<&str>) -> ApiResult<()>;

    async fn fetch_city(&self, city: &str) -> ApiResult<WeatherLog>;
}

/// Any backend can feed the insight poller.
#[async_trait]
impl<B> LatestInsight for B
where
    B: WeatherBackend + ?Sized,
{
    async fn latest_insight(&self) -> ApiResult<Option<WeatherInsight>> {
        WeatherBackend::latest_insight(self).await
    }
}

/// Turn a non-success response into the normalized [`ApiError::Backend`].
pub(crate) async fn check(res: Response) -> ApiResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }

    let body = res.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %truncate_body(&body), "backend error response");

    Err(ApiError::Backend { status: status.as_u16(), message: extract_error_message(&body) })
}

pub(crate) fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}
