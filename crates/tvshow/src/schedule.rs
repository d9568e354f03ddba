//! Schedule page parsing.
//!
//! The schedule page lists one `<li>` per program under `#program_area`. Each
//! entry carries its id in `se-id` and its start/end as `YYYYMMDDHHMM` in the
//! `s`/`e` attributes; the title, link and summary live in the entry's markup.

use std::fmt;

use chrono::NaiveDateTime;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// Attribution printed after every schedule.
pub const ATTRIBUTION: &str = "This TV schedule is got from テレビ番組表Gガイド(https://bangumi.org)";

const TIME_FORMAT: &str = "%Y%m%d%H%M";

/// Length of the prefix in `se-id` that precedes the program id.
const SE_ID_PREFIX_LEN: usize = 7;

/// Errors raised while fetching or reading a schedule.
#[derive(Error, Debug)]
pub enum ScheduleError {
    /// The schedule page could not be fetched.
    #[error("failed to fetch schedule: {0}")]
    Http(#[from] reqwest::Error),

    /// A CSS selector failed to compile.
    #[error("invalid selector '{selector}': {reason}")]
    Selector {
        /// The selector text.
        selector: &'static str,
        /// Parser message.
        reason: String,
    },
}

/// One broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Program id (the `se-id` attribute without its prefix).
    pub id: String,
    /// Title.
    pub name: String,
    /// Summary, empty if the page has none.
    pub description: String,
    /// Relative link to the program page.
    pub link: String,
    /// Start time (local, Japan).
    pub start: NaiveDateTime,
    /// End time (local, Japan).
    pub end: NaiveDateTime,
}

impl Program {
    /// Whether the program ended before `now`.
    pub fn has_ended(&self, now: NaiveDateTime) -> bool {
        self.end < now
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}~{} {} [{}]",
            self.start.format("%H:%M"),
            self.end.format("%H:%M"),
            self.name,
            self.id
        )
    }
}

struct Selectors {
    entry: Selector,
    name: Selector,
    link: Selector,
    description: Selector,
}

impl Selectors {
    fn new() -> Result<Self, ScheduleError> {
        Ok(Self {
            entry: compile("div #program_area ul li")?,
            name: compile("div a p")?,
            link: compile("div a")?,
            description: compile("div p.program_detail")?,
        })
    }
}

fn compile(selector: &'static str) -> Result<Selector, ScheduleError> {
    Selector::parse(selector).map_err(|e| ScheduleError::Selector {
        selector,
        reason: e.to_string(),
    })
}

/// Extract every program from a schedule page, ordered by start time then id.
///
/// Entries without a title or with unreadable times are skipped.
///
/// # Errors
///
/// Returns [`ScheduleError::Selector`] only if the built-in selectors fail to compile.
pub fn parse_programs(html: &str) -> Result<Vec<Program>, ScheduleError> {
    let selectors = Selectors::new()?;
    let document = Html::parse_document(html);

    let mut programs: Vec<Program> = document
        .select(&selectors.entry)
        .filter_map(|node| parse_entry(node, &selectors))
        .collect();

    // Entries sharing a start time are all kept.
    programs.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));
    Ok(programs)
}

fn parse_entry(node: ElementRef<'_>, selectors: &Selectors) -> Option<Program> {
    // Match against the entry's own markup only, not the page around it.
    let fragment = Html::parse_fragment(&node.inner_html());
    let first_text = |selector: &Selector| {
        fragment
            .select(selector)
            .next()
            .and_then(|el| el.text().next())
            .map(str::to_string)
    };

    let name = first_text(&selectors.name)?;
    let attr = |key: &str| node.value().attr(key).unwrap_or_default();

    let (Some(start), Some(end)) = (parse_time(attr("s")), parse_time(attr("e"))) else {
        tracing::debug!(%name, s = attr("s"), e = attr("e"), "skipping entry with bad times");
        return None;
    };

    Some(Program {
        id: attr("se-id")
            .get(SE_ID_PREFIX_LEN..)
            .unwrap_or_default()
            .to_string(),
        name,
        description: first_text(&selectors.description).unwrap_or_default(),
        link: fragment
            .select(&selectors.link)
            .next()
            .and_then(|el| el.value().attr("href"))
            .unwrap_or_default()
            .to_string(),
        start,
        end,
    })
}

fn parse_time(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, TIME_FORMAT).ok()
}

/// Programs still on air or upcoming at `now`.
pub fn upcoming(programs: &[Program], now: NaiveDateTime) -> impl Iterator<Item = &Program> {
    programs.iter().filter(move |p| !p.has_ended(now))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const PAGE: &str = r#"
<html><body>
<div class="contents">
  <div id="program_area">
    <ul>
      <li se-id="epg_id_1002" s="202401011900" e="202401011954">
        <div><a href="/tv_events/1002"><p class="program_title">ニュース7</p></a>
        <p class="program_detail">今日のニュース</p></div>
      </li>
      <li se-id="epg_id_1001" s="202401010500" e="202401010600">
        <div><a href="/tv_events/1001"><p class="program_title">おはよう日本</p></a></div>
      </li>
      <li se-id="epg_id_1003" s="202401010500" e="202401010530">
        <div><span>休止</span></div>
      </li>
      <li se-id="epg_id_1004" s="bad" e="202401012300">
        <div><a href="/tv_events/1004"><p>壊れた時刻</p></a></div>
      </li>
      <li se-id="epg_id_1005" s="202401012330" e="202401020030">
        <div><a href="/tv_events/1005"><p>深夜映画</p></a></div>
      </li>
    </ul>
  </div>
</div>
</body></html>
"#;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn parses_and_orders_by_start() {
        let programs = parse_programs(PAGE).unwrap();
        let names: Vec<_> = programs.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["おはよう日本", "ニュース7", "深夜映画"]);

        let news = &programs[1];
        assert_eq!(news.id, "1002");
        assert_eq!(news.link, "/tv_events/1002");
        assert_eq!(news.description, "今日のニュース");
        assert_eq!(programs[0].description, "");
    }

    #[test]
    fn formats_like_a_listing() {
        let programs = parse_programs(PAGE).unwrap();
        assert_eq!(programs[1].to_string(), "19:00~19:54 ニュース7 [1002]");
        assert_eq!(programs[2].to_string(), "23:30~00:30 深夜映画 [1005]");
    }

    #[test]
    fn finished_programs_are_dropped() {
        let programs = parse_programs(PAGE).unwrap();
        let names: Vec<_> = upcoming(&programs, at(19, 54))
            .map(|p| p.name.as_str())
            .collect();
        // A program ending exactly now is still listed.
        assert_eq!(names, vec!["ニュース7", "深夜映画"]);
        assert_eq!(upcoming(&programs, at(0, 0)).count(), 3);
    }

    #[test]
    fn shared_start_time_keeps_both() {
        let page = r#"<div><div id="program_area"><ul>
            <li se-id="epg_id_2002" s="202401010600" e="202401010700"><div><a href="/b"><p>B</p></a></div></li>
            <li se-id="epg_id_2001" s="202401010600" e="202401010630"><div><a href="/a"><p>A</p></a></div></li>
        </ul></div></div>"#;
        let programs = parse_programs(page).unwrap();
        let ids: Vec<_> = programs.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["2001", "2002"]);
    }

    #[test]
    fn markup_outside_the_entry_does_not_count() {
        let page = r#"<div><div id="program_area"><ul>
            <li se-id="epg_id_5001" s="202401010600" e="202401010700"><a href="/x"><p>NoDivWrapper</p></a></li>
            <li se-id="epg_id_5002" s="202401010700" e="202401010800"><div><a href="/y"><p>Wrapped</p></a></div></li>
        </ul></div></div>"#;
        let names: Vec<_> = parse_programs(page)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["Wrapped"]);
    }

    #[test]
    fn page_without_schedule_is_empty() {
        assert!(parse_programs("<html><body>メンテナンス中</body></html>")
            .unwrap()
            .is_empty());
    }
}
