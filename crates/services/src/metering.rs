use crate::{
    error::Result,
    fetch::{JsonCache, Wiring},
    keys::{AdminKey, ScheduleKey},
};
use api_client::{ApiClient, ApiRequest, paths};
use cache::{InvalidationSignal, Observation, RefreshClock};
use common::{
    Config,
    entities::{MeteringSchedule, Report},
};
use faststr::FastStr;
use tracing::info;

const REFRESH_MULTIPLIER: u32 = 10;

/// Metering report schedules and the reports each one produced.
#[derive(Clone)]
pub struct MeteringService {
    client:    ApiClient,
    schedules: JsonCache<AdminKey, Vec<MeteringSchedule>>,
    reports:   JsonCache<ScheduleKey, Vec<Report>>,
}

impl MeteringService {
    pub fn new(client: ApiClient, config: &Config) -> Self {
        let clock = RefreshClock::start(config.refresh_every(REFRESH_MULTIPLIER));
        Self::with_clock(client, clock)
    }

    pub fn with_clock(client: ApiClient, clock: RefreshClock) -> Self {
        let signal = InvalidationSignal::new();
        let wiring = Wiring {
            client: &client,
            clock:  &clock,
            signal: &signal,
        };

        Self {
            schedules: wiring.json_cache(
                "metering-schedules",
                |_: &AdminKey| ApiRequest::get(paths::metering_schedules()),
                Vec::new(),
            ),
            reports: wiring.json_cache(
                "metering-reports",
                |k: &ScheduleKey| {
                    ApiRequest::get(paths::metering_reports()).query("configuration_name", k.0.clone())
                },
                Vec::new(),
            ),
            client,
        }
    }

    pub fn schedules(&self) -> Observation<Vec<MeteringSchedule>> {
        self.schedules.get_or_create(AdminKey)
    }

    pub fn reports(&self, schedule: &str) -> Observation<Vec<Report>> {
        self.reports
            .get_or_create(ScheduleKey(schedule.to_owned().into()))
    }

    pub fn refresh_schedules(&self) {
        self.schedules.invalidate(None);
    }

    pub fn refresh_reports(&self, schedule: Option<&str>) {
        let key = schedule.map(|s| ScheduleKey(s.to_owned().into()));
        self.reports.invalidate(key.as_ref());
    }

    pub async fn create_schedule(&self, schedule: &MeteringSchedule) -> Result<()> {
        let request = ApiRequest::post(paths::metering_schedule(&schedule.name), schedule)?;
        self.client.execute_unit(request).await?;
        info!(schedule = %schedule.name, "metering schedule created");
        self.refresh_schedules();
        Ok(())
    }

    pub async fn update_schedule(&self, schedule: &MeteringSchedule) -> Result<()> {
        let request = ApiRequest::put(paths::metering_schedule(&schedule.name), schedule)?;
        self.client.execute_unit(request).await?;
        self.refresh_schedules();
        Ok(())
    }

    /// Removes the schedule. Reports already generated for it are kept by the backend.
    pub async fn delete_schedule(&self, name: &str) -> Result<()> {
        self.client
            .execute_unit(ApiRequest::delete(paths::metering_schedule(name)))
            .await?;
        info!(schedule = name, "metering schedule deleted");
        self.refresh_schedules();
        self.refresh_reports(Some(name));
        Ok(())
    }

    /// Asks the backend for a short-lived download link. Not cached.
    pub async fn report_download_url(&self, schedule: &str, report: &str) -> Result<FastStr> {
        let request = ApiRequest::get(paths::metering_report(report))
            .query("configuration_name", schedule.to_owned());
        Ok(self.client.execute(request).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::api_client;
    use futures_util::StreamExt;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_partial_json, method, path, query_param},
    };

    #[tokio::test]
    async fn test_reports_per_schedule() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/admin/metering/reports"))
            .and(query_param("configuration_name", "weekly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "weekly/2026-10-05.csv", "size": 512 },
                { "name": "weekly/2026-10-12.csv", "size": 640 }
            ])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/admin/metering/reports"))
            .and(query_param("configuration_name", "daily"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = MeteringService::with_clock(api_client(&server), clock);

        let mut weekly = service.reports("weekly");
        let mut daily = service.reports("daily");
        let reports = weekly.next().await.unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[1].size, 640);
        assert!(daily.next().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_schedule_refreshes_schedules() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/admin/metering/configurations/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/admin/metering/configurations/reports"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "name": "weekly", "schedule": "0 1 * * 6", "interval": 7, "retention": 30 }
            ])))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v2/admin/metering/configurations/reports/weekly"))
            .and(body_partial_json(json!({ "schedule": "0 1 * * 6", "interval": 7 })))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = MeteringService::with_clock(api_client(&server), clock);
        let mut schedules = service.schedules();
        assert!(schedules.next().await.unwrap().is_empty());

        let schedule = MeteringSchedule {
            name: "weekly".into(),
            schedule: "0 1 * * 6".into(),
            interval: 7,
            retention: Some(30),
            types: Vec::new(),
        };
        service.create_schedule(&schedule).await.unwrap();

        let schedules = schedules.next().await.unwrap();
        assert_eq!(schedules.as_slice(), [schedule]);
    }

    #[tokio::test]
    async fn test_report_download_url() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/admin/metering/reports/weekly%2F2026-10-12.csv"))
            .and(query_param("configuration_name", "weekly"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!("https://s3.local/report?sig=abc")))
            .expect(1)
            .mount(&server)
            .await;

        let (clock, _driver) = RefreshClock::manual();
        let service = MeteringService::with_clock(api_client(&server), clock);
        let url = service
            .report_download_url("weekly", "weekly/2026-10-12.csv")
            .await
            .unwrap();
        assert_eq!(url.as_str(), "https://s3.local/report?sig=abc");
    }
}
