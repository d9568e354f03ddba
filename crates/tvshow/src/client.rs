//! Schedule fetching.

use chrono::NaiveDate;

use crate::area::Area;
use crate::schedule::{Program, ScheduleError, parse_programs};

/// Public schedule site.
pub const BASE_URL: &str = "https://bangumi.org";

/// User agent sent with schedule requests.
pub const USER_AGENT: &str = concat!("tvshow/", env!("CARGO_PKG_VERSION"));

/// Daily schedule URL for `area` on `date`.
pub fn schedule_url(base: &str, date: NaiveDate, area: Area) -> String {
    format!(
        "{}/epg/td?broad_cast_date={}&ggm_group_id={}",
        base.trim_end_matches('/'),
        date.format("%Y%m%d"),
        area.id
    )
}

/// Fetches daily schedules from a schedule site.
#[derive(Debug, Clone)]
pub struct ScheduleClient {
    client: reqwest::Client,
    base: String,
}

impl ScheduleClient {
    /// Client for the site at `base`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base: impl Into<String>) -> Result<Self, ScheduleError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(std::time::Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base: base.into(),
        })
    }

    /// Fetch and parse the schedule for `area` on `date`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the site answers with an error status.
    pub async fn fetch(&self, date: NaiveDate, area: Area) -> Result<Vec<Program>, ScheduleError> {
        let url = schedule_url(&self.base, date, area);
        tracing::debug!(%url, area = area.name, "fetching schedule");

        let html = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;

        let programs = parse_programs(&html)?;
        tracing::debug!(count = programs.len(), "parsed schedule");
        Ok(programs)
    }
}
