//! End-to-end tests for the tvshow-tap binary.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use sha2::{Digest, Sha256};
use tempfile::TempDir;

const REPO_FORMULA: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../Formula/tvshow.toml");
const REPO_FORMULA_RB: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/../../Formula/tvshow.rb");
const ARTIFACT_PATH: &str =
    "/Doarakko/tvshow/releases/download/v0.1.2/tvshow-x86_64-unknown-linux-gnu.tar.gz";

/// Test context that sets up a temporary prefix and descriptor
struct TestContext {
    temp_dir: TempDir,
    prefix: PathBuf,
}

impl TestContext {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let prefix = temp_dir.path().join(".tvshow-tap");
        Self { temp_dir, prefix }
    }

    fn cmd(&self, formula: &Path) -> Command {
        let bin_path = env!("CARGO_BIN_EXE_tvshow-tap");
        let mut cmd = Command::new(bin_path);
        cmd.env("HOME", self.temp_dir.path());
        cmd.env("TVSHOW_TAP_HOME", &self.prefix);
        cmd.env_remove("TVSHOW_TAP_MIRROR");
        cmd.arg("--formula").arg(formula);
        cmd
    }

    fn run(&self, formula: &Path, args: &[&str]) -> Output {
        self.cmd(formula)
            .args(args)
            .output()
            .expect("failed to run tvshow-tap")
    }

    /// Write a descriptor whose linux/x86_64 variant carries `sha256`.
    fn descriptor(&self, sha256: &str) -> PathBuf {
        let path = self.temp_dir.path().join("tvshow.toml");
        let content = std::fs::read_to_string(REPO_FORMULA)
            .unwrap()
            .replacen(
                "tvshow-x86_64-unknown-linux-gnu.tar.gz\"\nsha256 = \"PLACEHOLDER\"",
                &format!("tvshow-x86_64-unknown-linux-gnu.tar.gz\"\nsha256 = \"{sha256}\""),
                1,
            );
        std::fs::write(&path, content).unwrap();
        path
    }

    fn installed_bin(&self) -> PathBuf {
        self.prefix.join("bin").join("tvshow")
    }
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn release_tarball() -> Vec<u8> {
    let script = b"#!/bin/sh\necho \"tvshow - Display Japanese TV schedules ($1)\"\n";
    let encoder = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(script.len() as u64);
    header.set_mode(0o755);
    header.set_entry_type(tar::EntryType::Regular);
    header.set_cksum();
    builder
        .append_data(&mut header, "tvshow", &script[..])
        .unwrap();
    builder.into_inner().unwrap().finish().unwrap()
}

#[test]
fn test_help_command() {
    let ctx = TestContext::new();
    let output = ctx.run(Path::new(REPO_FORMULA), &["--help"]);
    assert!(output.status.success());
    assert!(stdout(&output).contains("Usage:"));
}

#[test]
fn test_check_repo_formula() {
    let ctx = TestContext::new();
    let output = ctx.run(Path::new(REPO_FORMULA), &["check"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("is valid"));

    // The published descriptor still carries placeholders.
    let strict = ctx.run(Path::new(REPO_FORMULA), &["check", "--strict"]);
    assert!(!strict.status.success());
    assert!(stderr(&strict).contains("placeholder"));
}

#[test]
fn test_resolve_macos_arm() {
    let ctx = TestContext::new();
    let output = ctx.run(
        Path::new(REPO_FORMULA),
        &["resolve", "--os", "macos", "--arch", "arm"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    assert_eq!(
        stdout(&output).trim(),
        "https://github.com/Doarakko/tvshow/releases/download/v0.1.2/tvshow-aarch64-apple-darwin.tar.gz"
    );
}

#[test]
fn test_resolve_json() {
    let ctx = TestContext::new();
    let output = ctx.run(
        Path::new(REPO_FORMULA),
        &["resolve", "--os", "linux", "--arch", "x86_64", "--json"],
    );
    assert!(output.status.success(), "{}", stderr(&output));
    let value: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(value["target"], "x86_64-unknown-linux-gnu");
    assert_eq!(value["sha256"], "PLACEHOLDER");
}

#[test]
fn test_linux_arm_is_unsupported() {
    let ctx = TestContext::new();
    let output = ctx.run(
        Path::new(REPO_FORMULA),
        &["install", "--os", "linux", "--arch", "arm64"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("unsupported platform"));
    assert!(!ctx.installed_bin().exists());
}

#[test]
fn test_render_matches_committed_formula() {
    let ctx = TestContext::new();
    let output = ctx.run(Path::new(REPO_FORMULA), &["render"]);
    assert!(output.status.success(), "{}", stderr(&output));
    let committed = std::fs::read_to_string(REPO_FORMULA_RB).unwrap();
    assert_eq!(stdout(&output), committed);
}

#[test]
fn test_placeholder_checksum_blocks_install() {
    let ctx = TestContext::new();
    let output = ctx.run(
        Path::new(REPO_FORMULA),
        &["install", "--os", "linux", "--arch", "x86_64"],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("checksum"));
    assert!(!ctx.installed_bin().exists());
}

#[cfg(unix)]
#[test]
fn test_install_smoke_test_and_uninstall() {
    let body = release_tarball();
    let sha = hex::encode(Sha256::digest(&body));
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(body)
        .expect(1)
        .create();

    let ctx = TestContext::new();
    let formula = ctx.descriptor(&sha);
    let url = server.url();
    let install = [
        "install", "--os", "linux", "--arch", "x86_64", "--mirror", url.as_str(),
    ];

    let first = ctx.run(&formula, &install);
    assert!(first.status.success(), "{}", stderr(&first));
    assert!(ctx.installed_bin().is_file());

    // Unchanged descriptor: nothing is downloaded again.
    let second = ctx.run(&formula, &install);
    assert!(second.status.success(), "{}", stderr(&second));
    assert!(stdout(&second).contains("already installed"));
    mock.assert();

    let help = Command::new(ctx.installed_bin())
        .arg("--help")
        .output()
        .unwrap();
    assert!(stdout(&help).contains("tvshow"));

    let test = ctx.run(&formula, &["test"]);
    assert!(test.status.success(), "{}", stderr(&test));

    let status = ctx.run(&formula, &["status", "--json"]);
    let receipt: serde_json::Value = serde_json::from_str(&stdout(&status)).unwrap();
    assert_eq!(receipt["version"], "0.1.2");
    assert_eq!(receipt["sha256"], sha.as_str());

    let preview = ctx.run(&formula, &["--dry-run", "uninstall"]);
    assert!(preview.status.success(), "{}", stderr(&preview));
    assert!(stdout(&preview).contains("Would remove"));
    assert!(ctx.installed_bin().is_file());

    let uninstall = ctx.run(&formula, &["uninstall"]);
    assert!(uninstall.status.success(), "{}", stderr(&uninstall));
    assert!(!ctx.installed_bin().exists());
}

#[test]
fn test_corrupted_download_installs_nothing() {
    let body = release_tarball();
    let sha = hex::encode(Sha256::digest(&body));
    let mut server = mockito::Server::new();
    let _m = server
        .mock("GET", ARTIFACT_PATH)
        .with_status(200)
        .with_body(&body[..body.len() - 10])
        .create();

    let ctx = TestContext::new();
    let formula = ctx.descriptor(&sha);
    let url = server.url();
    let output = ctx.run(
        &formula,
        &[
            "install", "--os", "linux", "--arch", "x86_64", "--skip-test", "--mirror", &url,
        ],
    );

    assert!(!output.status.success());
    assert!(stderr(&output).contains("checksum mismatch"));
    assert!(!ctx.installed_bin().exists());
}

#[test]
fn test_checksum_write_then_bump() {
    let mut server = mockito::Server::new();
    let _m = server
        .mock(
            "GET",
            mockito::Matcher::Regex(r"^/Doarakko/tvshow/releases/download/v0\.1\.2/.*".to_string()),
        )
        .with_status(200)
        .with_body("test")
        .create();

    let ctx = TestContext::new();
    let formula = ctx.descriptor("PLACEHOLDER");
    let url = server.url();

    let output = ctx.run(&formula, &["checksum", "--write", "--mirror", &url]);
    assert!(output.status.success(), "{}", stderr(&output));
    let strict = ctx.run(&formula, &["check", "--strict"]);
    assert!(strict.status.success(), "{}", stderr(&strict));

    let bumped = ctx.run(&formula, &["bump", "0.1.3"]);
    assert!(bumped.status.success(), "{}", stderr(&bumped));
    let content = std::fs::read_to_string(&formula).unwrap();
    assert!(content.contains("version = \"0.1.3\""));
    assert!(content.contains("v{{version}}"));
    assert_eq!(content.matches("PLACEHOLDER").count(), 3);
}

#[test]
fn test_hash_needs_no_prefix() {
    let ctx = TestContext::new();
    let file = ctx.temp_dir.path().join("artifact");
    std::fs::write(&file, b"test").unwrap();
    let output = ctx
        .cmd(Path::new(REPO_FORMULA))
        .env_remove("HOME")
        .env_remove("TVSHOW_TAP_HOME")
        .args(["hash", file.to_str().unwrap()])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", stderr(&output));
}

#[test]
fn test_uninstall_dry_run_when_not_installed() {
    let ctx = TestContext::new();
    let output = ctx.run(Path::new(REPO_FORMULA), &["--dry-run", "uninstall"]);
    assert!(output.status.success(), "{}", stderr(&output));
    assert!(stdout(&output).contains("not installed"));

    let real = ctx.run(Path::new(REPO_FORMULA), &["uninstall"]);
    assert!(!real.status.success());
    assert!(stderr(&real).contains("not installed"));
}

#[test]
fn test_hash_command() {
    let ctx = TestContext::new();
    let file = ctx.temp_dir.path().join("artifact");
    std::fs::write(&file, b"test").unwrap();
    let output = ctx.run(Path::new(REPO_FORMULA), &["hash", file.to_str().unwrap()]);
    assert!(output.status.success());
    assert!(
        stdout(&output)
            .starts_with("9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08")
    );
}
