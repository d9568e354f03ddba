//! tvshow - Japanese TV schedules in the terminal
//!
//! Fetches the daily schedule for a broadcast area from the public schedule
//! site and lists the programs that are on air or still to come.
//!
//! ```no_run
//! # async fn run() -> Result<(), tvshow::ScheduleError> {
//! let tokyo = tvshow::area::find("東京").expect("known area");
//! let client = tvshow::ScheduleClient::new(tvshow::client::BASE_URL)?;
//! let today = chrono::Local::now().date_naive();
//! for program in client.fetch(today, tokyo).await? {
//!     println!("{program}");
//! }
//! # Ok(())
//! # }
//! ```

pub mod area;
pub mod client;
pub mod schedule;

pub use area::Area;
pub use client::ScheduleClient;
pub use schedule::{ATTRIBUTION, Program, ScheduleError};
