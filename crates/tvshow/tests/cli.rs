//! End-to-end tests for the tvshow viewer binary.

use std::process::{Command, Output};

const PAGE: &str = r#"<html><body><div class="contents"><div id="program_area"><ul>
<li se-id="epg_id_4002" s="202401012100" e="202401012154">
  <div><a href="/tv_events/4002"><p class="program_title">ドラマ</p></a><p class="program_detail">第1話</p></div>
</li>
<li se-id="epg_id_4001" s="202401010600" e="202401010800">
  <div><a href="/tv_events/4001"><p class="program_title">朝のニュース</p></a></div>
</li>
</ul></div></div></body></html>"#;

fn tvshow(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tvshow"))
        .env_remove("TVSHOW_ENDPOINT")
        .args(args)
        .output()
        .expect("failed to run tvshow")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_help_command() {
    let output = tvshow(&["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("tvshow"));
}

#[test]
fn test_list_areas() {
    let output = tvshow(&["--list-areas"]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("  42  東京"));
    assert_eq!(out.lines().count(), 54);
}

#[test]
fn test_unknown_area_fails() {
    let output = tvshow(&["--area", "ロンドン"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("invalid area"));
}

#[test]
fn test_prints_schedule_with_attribution() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", "/epg/td")
        .match_query(mockito::Matcher::AllOf(vec![
            mockito::Matcher::UrlEncoded("broad_cast_date".into(), "20240101".into()),
            mockito::Matcher::UrlEncoded("ggm_group_id".into(), "117".into()),
        ]))
        .with_status(200)
        .with_body(PAGE)
        .create();

    let url = server.url();
    let output = tvshow(&[
        "--area", "福岡", "--date", "2024-01-01", "--all", "--endpoint", &url,
    ]);
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    mock.assert();

    let out = stdout(&output);
    let lines: Vec<_> = out.lines().collect();
    assert_eq!(
        lines,
        vec![
            "06:00~08:00 朝のニュース [4001]",
            "21:00~21:54 ドラマ [4002]",
            "",
            "This TV schedule is got from テレビ番組表Gガイド(https://bangumi.org)",
        ]
    );
}

#[test]
fn test_past_day_hides_finished_programs() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", "/epg/td")
        .match_query(mockito::Matcher::Any)
        .with_status(200)
        .with_body(PAGE)
        .create();

    let url = server.url();
    let output = tvshow(&["--date", "20240101", "--endpoint", &url]);
    assert!(output.status.success());
    let out = stdout(&output);
    assert!(!out.contains("朝のニュース"));
    assert!(out.contains("bangumi.org"));
}
