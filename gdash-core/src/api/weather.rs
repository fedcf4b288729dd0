//! Weather endpoints under `weather/logs/`.

use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::CONTENT_DISPOSITION;
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::api::{ApiClient, check};
use crate::error::ApiResult;
use crate::model::{ExportBlob, Page, WeatherInsight, WeatherLog};

impl ApiClient {
    /// One page of the historical log listing, newest first.
    pub async fn list_logs(
        &self,
        limit: u32,
        offset: u32,
        city: Option<&str>,
    ) -> ApiResult<Page<WeatherLog>> {
        let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(city) = city {
            query.push(("city", city.to_string()));
        }

        let res = self.get("weather/logs/").query(&query).send().await?;
        let res = check(res).await?;
        let page: Page<WeatherLog> = serde_json::from_str(&res.text().await?)?;

        debug!(count = page.count, returned = page.results.len(), "fetched weather logs");
        Ok(page)
    }

    /// One page of recent insights, newest first.
    ///
    /// The plain `{count, next, previous, results}` envelope is the
    /// authoritative response shape for this endpoint.
    pub async fn list_insights(
        &self,
        days: Option<u32>,
        limit: u32,
        offset: u32,
        city: Option<&str>,
    ) -> ApiResult<Page<WeatherInsight>> {
        let mut query = vec![("limit", limit.to_string()), ("offset", offset.to_string())];
        if let Some(days) = days {
            query.push(("days", days.to_string()));
        }
        if let Some(city) = city {
            query.push(("city", city.to_string()));
        }

        let res = self.get("weather/logs/insights/").query(&query).send().await?;
        let res = check(res).await?;
        let page: Page<WeatherInsight> = serde_json::from_str(&res.text().await?)?;

        debug!(count = page.count, returned = page.results.len(), "fetched insights");
        Ok(page)
    }

    /// The single most recent insight, or `None` when the backend has none
    /// yet (it answers 204 in that case).
    pub async fn latest_insight(&self) -> ApiResult<Option<WeatherInsight>> {
        let res = self.get("weather/logs/insights/latest/").send().await?;
        if res.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let res = check(res).await?;
        let body = res.text().await?;
        if body.trim().is_empty() {
            return Ok(None);
        }

        Ok(Some(serde_json::from_str(&body)?))
    }

    /// Ask the backend to generate an insight over the last `hours` hours,
    /// optionally scoped to one city. Generation is asynchronous on the
    /// backend; only acceptance is observed here.
    pub async fn generate_insight(&self, hours: u32, city: Option<&str>) -> ApiResult<()> {
        let res = self
            .post("weather/logs/insights/")
            .json(&serde_json::json!({ "hours": hours, "city": city }))
            .send()
            .await?;

        check(res).await?;
        info!(hours, city = city.unwrap_or("(todas)"), "insight generation requested");
        Ok(())
    }

    /// Trigger collection of current weather for a city; returns the log
    /// the backend stored.
    pub async fn fetch_city(&self, city: &str) -> ApiResult<WeatherLog> {
        let res = self
            .post("weather/logs/fetch-city/")
            .json(&serde_json::json!({ "city": city }))
            .send()
            .await?;

        let res = check(res).await?;
        let log: WeatherLog = serde_json::from_str(&res.text().await?)?;

        info!(id = log.id, city = %log.city, "city collection stored");
        Ok(log)
    }

    pub async fn export_csv(&self, limit: u32, offset: u32) -> ApiResult<ExportBlob> {
        self.export("weather/logs/export.csv", "weather_logs.csv", limit, offset).await
    }

    pub async fn export_xlsx(&self, limit: u32, offset: u32) -> ApiResult<ExportBlob> {
        self.export("weather/logs/export.xlsx", "weather_logs.xlsx", limit, offset).await
    }

    /// Download an export blob. The filename comes from the
    /// `content-disposition` header when the backend sends one.
    async fn export(
        &self,
        path: &str,
        default_name: &str,
        limit: u32,
        offset: u32,
    ) -> ApiResult<ExportBlob> {
        let query = [("limit", limit.to_string()), ("offset", offset.to_string())];
        let res = self.get(path).query(&query).send().await?;
        let res = check(res).await?;

        let filename = res
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(disposition_filename)
            .unwrap_or(default_name)
            .to_string();

        let bytes = res.bytes().await?.to_vec();
        debug!(filename = %filename, size = bytes.len(), "export downloaded");

        Ok(ExportBlob { filename, bytes })
    }
}

#[async_trait::async_trait]
impl crate::api::WeatherBackend for ApiClient {
    async fn list_logs(
        &self,
        limit: u32,
        offset: u32,
        city: Option<&str>,
    ) -> ApiResult<Page<WeatherLog>> {
        ApiClient::list_logs(self, limit, offset, city).await
    }

    async fn list_insights(
        &self,
        days: Option<u32>,
        limit: u32,
        offset: u32,
        city: Option<&str>,
    ) -> ApiResult<Page<WeatherInsight>> {
        ApiClient::list_insights(self, days, limit, offset, city).await
    }

    async fn latest_insight(&self) -> ApiResult<Option<WeatherInsight>> {
        ApiClient::latest_insight(self).await
    }

    async fn generate_insight(&self, hours: u32, city: Option<&str>) -> ApiResult<()> {
        ApiClient::generate_insight(self, hours, city).await
    }

    async fn fetch_city(&self, city: &str) -> ApiResult<WeatherLog> {
        ApiClient::fetch_city(self, city).await
    }
}

/// Pull the `filename=` token out of a `content-disposition` value, quoted
/// or bare.
fn disposition_filename(value: &str) -> Option<&str> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re =
        RE.get_or_init(|| Regex::new(r#"filename="?([^"]+)"?"#).expect("filename pattern must compile"));

    re.captures(value).and_then(|caps| caps.get(1)).map(|m| m.as_str())
}
