//! Log/insight correlation driver.
//!
//! Owns the client-local dashboard state (selected city, log page, selected
//! log, displayed insight) and coordinates the selector and the poller into
//! it. Overlapping flows are deliberately not synchronized: there is no
//! cancellation and no request-generation counter, so the last flow to write
//! wins even when an earlier-issued flow resolves later. Rapid city
//! switching may transiently show a stale insight until in-flight work
//! settles.

use chrono::{DateTime, Utc};
use std::time::Duration;
use tracing::{debug, info};

use crate::api::WeatherBackend;
use crate::config::Config;
use crate::error::ApiResult;
use crate::insight::select_insight;
use crate::model::{WeatherInsight, WeatherLog};
use crate::poller::poll_for_new_insight;

/// Result of a collect-and-generate command. Backend failures surface as
/// errors before this is produced; partial side effects (a collected log
/// without a fresh insight) are visible, not rolled back.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerateOutcome {
    /// Collection succeeded and the freshly generated insight arrived.
    Fresh(WeatherInsight),
    /// Collection succeeded but no new insight appeared within the attempt
    /// budget; whatever was displayed before stays untouched.
    TimedOut,
}

pub struct Dashboard {
    backend: Box<dyn WeatherBackend>,

    city: String,
    days: u32,
    page: u32,
    page_size: u32,
    total_count: u64,
    logs: Vec<WeatherLog>,
    selected_log_id: Option<i64>,

    insight_text: String,
    /// Id of the insight the displayed text came from; polls compare new
    /// arrivals against it.
    insight_id: Option<i64>,

    insight_window: u32,
    poll_attempts: u32,
    poll_interval: Duration,
}

impl Dashboard {
    pub fn new(backend: Box<dyn WeatherBackend>, config: &Config) -> Self {
        Self {
            backend,
            city: config.default_city.clone(),
            days: config.default_days.max(1),
            page: 1,
            page_size: config.page_size.max(1),
            total_count: 0,
            logs: Vec::new(),
            selected_log_id: None,
            insight_text: String::new(),
            insight_id: None,
            insight_window: config.insight_window,
            poll_attempts: config.poll_attempts,
            poll_interval: config.poll_interval(),
        }
    }

    pub fn city(&self) -> &str {
        &self.city
    }

    pub fn days(&self) -> u32 {
        self.days
    }

    pub fn set_days(&mut self, days: u32) {
        self.days = days.max(1);
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn total_count(&self) -> u64 {
        self.total_count
    }

    pub fn logs(&self) -> &[WeatherLog] {
        &self.logs
    }

    pub fn insight_text(&self) -> &str {
        &self.insight_text
    }

    pub fn insight_id(&self) -> Option<i64> {
        self.insight_id
    }

    pub fn selected_log(&self) -> Option<&WeatherLog> {
        let id = self.selected_log_id?;
        self.logs.iter().find(|log| log.id == id)
    }

    /// The log the summary reflects: the selection, else the most recent
    /// one in the window.
    pub fn current_log(&self) -> Option<&WeatherLog> {
        self.selected_log().or_else(|| self.logs.iter().max_by_key(|log| log.timestamp))
    }

    /// Temperature series over the current window, oldest first.
    pub fn chart_points(&self) -> Vec<(DateTime<Utc>, f64)> {
        let mut points: Vec<_> =
            self.logs.iter().map(|log| (log.timestamp, log.temperature)).collect();
        points.sort_by_key(|(timestamp, _)| *timestamp);
        points
    }

    pub fn has_previous(&self) -> bool {
        self.page > 1
    }

    pub fn has_next(&self) -> bool {
        u64::from(self.page) * u64::from(self.page_size) < self.total_count
    }

    /// Fetch the current page of logs. A selection pointing outside the
    /// freshly fetched window is stale and gets cleared.
    pub async fn load_page(&mut self) -> ApiResult<()> {
        let offset = (self.page - 1) * self.page_size;
        let page = self.backend.list_logs(self.page_size, offset, None).await?;

        self.total_count = page.count;
        self.logs = page.results;

        if let Some(id) = self.selected_log_id {
            if !self.logs.iter().any(|log| log.id == id) {
                debug!(id, "selected log left the window, clearing selection");
                self.selected_log_id = None;
            }
        }

        Ok(())
    }

    /// Select a log from the current window (or clear with `None`) and
    /// re-correlate the displayed insight.
    pub async fn select_log(&mut self, log_id: Option<i64>) -> ApiResult<()> {
        self.selected_log_id = log_id.filter(|id| self.logs.iter().any(|log| log.id == *id));
        self.refresh_insight().await
    }

    /// Re-derive the displayed insight from the current selection.
    ///
    /// With a selected log, a window of recent insights is scanned for the
    /// log's city; no match means the empty "not enough data" state (the
    /// last known insight id is kept so later polls still have a baseline).
    /// With no selection the globally latest insight is shown, regardless
    /// of city.
    pub async fn refresh_insight(&mut self) -> ApiResult<()> {
        let target_city = self.selected_log().map(|log| log.city.clone());

        match target_city {
            Some(city) => {
                let window =
                    self.backend.list_insights(None, self.insight_window, 0, None).await?;

                match select_insight(&window.results, Some(&city)) {
                    Some(matched) => {
                        debug!(city = %city, id = matched.id, "insight correlated to selection");
                        self.insight_text = matched.text.clone();
                        self.insight_id = Some(matched.id);
                    }
                    None => {
                        debug!(city = %city, "no insight in window for selected city");
                        self.insight_text.clear();
                    }
                }
            }
            None => match self.backend.latest_insight().await? {
                Some(latest) => {
                    self.insight_id = Some(latest.id);
                    self.insight_text = latest.text;
                }
                None => {
                    self.insight_text.clear();
                    self.insight_id = None;
                }
            },
        }

        Ok(())
    }

    pub async fn next_page(&mut self) -> ApiResult<bool> {
        if !self.has_next() {
            return Ok(false);
        }
        self.page += 1;
        self.load_page().await?;
        self.refresh_insight().await?;
        Ok(true)
    }

    pub async fn previous_page(&mut self) -> ApiResult<bool> {
        if !self.has_previous() {
            return Ok(false);
        }
        self.page -= 1;
        self.load_page().await?;
        self.refresh_insight().await?;
        Ok(true)
    }

    /// Collect current weather for `city`, reload the first log page, ask
    /// the backend for a fresh insight over the configured lookback window
    /// and poll until it lands.
    ///
    /// The selection is cleared up front so a stale selected log cannot mask
    /// the incoming insight, and the poll baseline is the insight id from
    /// before this command started. Any backend failure propagates as-is;
    /// the log page may already reflect new data in that case.
    pub async fn generate_for_city(&mut self, city: &str) -> ApiResult<GenerateOutcome> {
        self.city = city.to_string();
        self.page = 1;
        self.selected_log_id = None;
        let previous_id = self.insight_id;

        self.backend.fetch_city(city).await?;
        self.load_page().await?;

        let hours = self.days * 24;
        self.backend.generate_insight(hours, Some(city)).await?;

        let polled = poll_for_new_insight(
            self.backend.as_ref(),
            previous_id,
            self.poll_attempts,
            self.poll_interval,
        )
        .await?;

        match polled {
            Some(fresh) => {
                info!(city = %self.city, id = fresh.id, "dashboard updated with fresh insight");
                self.insight_id = Some(fresh.id);
                self.insight_text = fresh.text.clone();
                Ok(GenerateOutcome::Fresh(fresh))
            }
            None => Ok(GenerateOutcome::TimedOut),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    use crate::model::Page;

    fn log(id: i64, city: &str, minute: u32) -> WeatherLog {
        WeatherLog {
            id,
            timestamp: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
            city: city.to_string(),
            temperature: 25.0 + id as f64,
            humidity: 60.0,
            pressure: 1013.0,
            wind_speed: 2.5,
            condition: "céu limpo".to_string(),
            raw: None,
            created_at: None,
        }
    }

    fn insight(id: i64, minute: u32, text: &str) -> WeatherInsight {
        WeatherInsight {
            id,
            generated_at: Utc.with_ymd_and_hms(2025, 6, 1, 12, minute, 0).unwrap(),
            text: text.to_string(),
            city: None,
        }
    }

    fn page_of(logs: Vec<WeatherLog>, count: u64) -> Page<WeatherLog> {
        Page { count, next: None, previous: None, results: logs }
    }

    struct MockState {
        logs_page: Page<WeatherLog>,
        insights: Vec<WeatherInsight>,
        /// Replayed by `latest_insight`; the final entry repeats.
        latest_script: Vec<Option<WeatherInsight>>,
        calls: Vec<String>,
    }

    impl Default for MockState {
        fn default() -> Self {
            Self {
                logs_page: Page::empty(),
                insights: Vec::new(),
                latest_script: Vec::new(),
                calls: Vec::new(),
            }
        }
    }

    #[derive(Clone, Default)]
    struct MockBackend {
        state: Arc<Mutex<MockState>>,
    }

    impl MockBackend {
        fn calls(&self) -> Vec<String> {
            self.state.lock().unwrap().calls.clone()
        }
    }

    #[async_trait]
    impl WeatherBackend for MockBackend {
        async fn list_logs(
            &self,
            limit: u32,
            offset: u32,
            _city: Option<&str>,
        ) -> ApiResult<Page<WeatherLog>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("list_logs {limit} {offset}"));
            Ok(state.logs_page.clone())
        }

        async fn list_insights(
            &self,
            _days: Option<u32>,
            limit: u32,
            offset: u32,
            _city: Option<&str>,
        ) -> ApiResult<Page<WeatherInsight>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("list_insights {limit} {offset}"));
            Ok(Page {
                count: state.insights.len() as u64,
                next: None,
                previous: None,
                results: state.insights.clone(),
            })
        }

        async fn latest_insight(&self) -> ApiResult<Option<WeatherInsight>> {
            let mut state = self.state.lock().unwrap();
            state.calls.push("latest_insight".to_string());
            if state.latest_script.len() > 1 {
                Ok(state.latest_script.remove(0))
            } else {
                Ok(state.latest_script.first().cloned().flatten())
            }
        }

        async fn generate_insight(&self, hours: u32, city: Option<&str>) -> ApiResult<()> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("generate_insight {hours} {}", city.unwrap_or("-")));
            Ok(())
        }

        async fn fetch_city(&self, city: &str) -> ApiResult<WeatherLog> {
            let mut state = self.state.lock().unwrap();
            state.calls.push(format!("fetch_city {city}"));
            Ok(log(100, city, 0))
        }
    }

    fn test_config() -> Config {
        Config { poll_interval_ms: 0, poll_attempts: 3, ..Config::default() }
    }

    fn dashboard_with(mock: &MockBackend) -> Dashboard {
        Dashboard::new(Box::new(mock.clone()), &test_config())
    }

    #[tokio::test]
    async fn selecting_a_log_correlates_and_clearing_reverts_to_latest() {
        let mock = MockBackend::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.logs_page = page_of(vec![log(1, "Recife", 0), log(2, "Brasília", 1)], 2);
            state.insights = vec![
                insight(10, 5, "Em Brasília, tempo seco."),
                insight(11, 4, "Em Recife, calor e umidade alta."),
            ];
            state.latest_script = vec![Some(insight(99, 9, "Em Brasília, o mais recente."))];
        }

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();

        dash.select_log(Some(1)).await.unwrap();
        assert_eq!(dash.insight_text(), "Em Recife, calor e umidade alta.");
        assert_eq!(dash.insight_id(), Some(11));

        dash.select_log(None).await.unwrap();
        assert_eq!(dash.insight_text(), "Em Brasília, o mais recente.");
        assert_eq!(dash.insight_id(), Some(99));
    }

    #[tokio::test]
    async fn no_window_match_shows_empty_state_but_keeps_baseline_id() {
        let mock = MockBackend::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.logs_page = page_of(vec![log(1, "Curitiba", 0)], 1);
            state.insights = vec![insight(10, 5, "Em Brasília, tempo seco.")];
            state.latest_script = vec![Some(insight(10, 5, "Em Brasília, tempo seco."))];
        }

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();
        dash.refresh_insight().await.unwrap();
        assert_eq!(dash.insight_id(), Some(10));

        dash.select_log(Some(1)).await.unwrap();
        assert_eq!(dash.insight_text(), "");
        assert_eq!(dash.insight_id(), Some(10));
    }

    #[tokio::test]
    async fn stale_selection_is_cleared_on_reload() {
        let mock = MockBackend::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.logs_page = page_of(vec![log(1, "Recife", 0)], 1);
            state.insights = vec![insight(11, 4, "Em Recife, calor.")];
        }

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();
        dash.select_log(Some(1)).await.unwrap();
        assert!(dash.selected_log().is_some());

        mock.state.lock().unwrap().logs_page = page_of(vec![log(3, "Manaus", 2)], 1);
        dash.load_page().await.unwrap();
        assert!(dash.selected_log().is_none());
    }

    #[tokio::test]
    async fn pagination_boundaries() {
        let mock = MockBackend::default();
        mock.state.lock().unwrap().logs_page = page_of(vec![], 10);

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();
        // Exactly one full page: nothing before, nothing after.
        assert!(!dash.has_previous());
        assert!(!dash.has_next());

        mock.state.lock().unwrap().logs_page = page_of(vec![], 0);
        dash.load_page().await.unwrap();
        assert!(!dash.has_previous());
        assert!(!dash.has_next());

        mock.state.lock().unwrap().logs_page = page_of(vec![], 25);
        dash.load_page().await.unwrap();
        assert!(dash.has_next());
        assert!(dash.next_page().await.unwrap());
        assert!(dash.next_page().await.unwrap());
        assert_eq!(dash.page(), 3);
        assert!(!dash.has_next());
        assert!(dash.has_previous());
        assert!(!dash.next_page().await.unwrap());
    }

    #[tokio::test]
    async fn generate_applies_fresh_insight_and_resets_selection() {
        let mock = MockBackend::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.logs_page = page_of(vec![log(1, "Recife", 0)], 1);
            state.latest_script = vec![
                // Consumed by the initial refresh; becomes the poll baseline.
                Some(insight(5, 1, "Em Recife, antigo.")),
                Some(insight(5, 1, "Em Recife, antigo.")),
                Some(insight(7, 8, "Em Recife, recém-gerado.")),
            ];
        }

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();
        dash.refresh_insight().await.unwrap();
        assert_eq!(dash.insight_id(), Some(5));
        dash.select_log(Some(1)).await.unwrap();

        let outcome = dash.generate_for_city("Recife").await.unwrap();
        match outcome {
            GenerateOutcome::Fresh(fresh) => assert_eq!(fresh.id, 7),
            other => panic!("expected fresh insight, got {other:?}"),
        }
        assert_eq!(dash.insight_id(), Some(7));
        assert_eq!(dash.insight_text(), "Em Recife, recém-gerado.");
        assert_eq!(dash.page(), 1);
        assert!(dash.selected_log().is_none());
        assert_eq!(dash.city(), "Recife");

        // Collection happens before the page reload, generation after, and
        // the lookback is days * 24 hours.
        let calls = mock.calls();
        let fetch = calls.iter().position(|c| c == "fetch_city Recife").unwrap();
        let reload = calls.iter().rposition(|c| c.starts_with("list_logs")).unwrap();
        let generate = calls.iter().position(|c| c.starts_with("generate_insight")).unwrap();
        assert!(fetch < reload && reload < generate);
        assert!(calls.contains(&"generate_insight 72 Recife".to_string()));
    }

    #[tokio::test]
    async fn generate_timeout_leaves_previous_insight_untouched() {
        let mock = MockBackend::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.logs_page = page_of(vec![log(1, "Recife", 0)], 1);
            state.latest_script = vec![Some(insight(5, 1, "Em Recife, antigo."))];
        }

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();
        dash.refresh_insight().await.unwrap();

        let outcome = dash.generate_for_city("Recife").await.unwrap();
        assert_eq!(outcome, GenerateOutcome::TimedOut);
        assert_eq!(dash.insight_id(), Some(5));
        assert_eq!(dash.insight_text(), "Em Recife, antigo.");
    }

    #[tokio::test]
    async fn current_log_prefers_selection_then_newest() {
        let mock = MockBackend::default();
        {
            let mut state = mock.state.lock().unwrap();
            state.logs_page = page_of(vec![log(1, "Recife", 0), log(2, "Manaus", 30)], 2);
            state.insights = vec![insight(11, 4, "Em Recife, calor.")];
        }

        let mut dash = dashboard_with(&mock);
        dash.load_page().await.unwrap();
        assert_eq!(dash.current_log().map(|l| l.id), Some(2));

        dash.select_log(Some(1)).await.unwrap();
        assert_eq!(dash.current_log().map(|l| l.id), Some(1));

        // Chart points come out oldest first regardless of page order.
        let points = dash.chart_points();
        assert_eq!(points.len(), 2);
        assert!(points[0].0 < points[1].0);
    }
}
