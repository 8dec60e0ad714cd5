//! End-to-end runs of the shellcache binary

use assert_cmd::{cargo::cargo_bin_cmd, Command};
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Temp workspace with an asset directory and a config pointing at it
struct Workspace {
    temp: TempDir,
}

impl Workspace {
    fn new() -> Self {
        let temp = TempDir::new().unwrap();
        let public = temp.path().join("public");
        fs::create_dir_all(&public).unwrap();
        fs::write(public.join("index.html"), "<html>Diario de Bordo</html>").unwrap();
        fs::write(public.join("style.css"), "body { margin: 0 }").unwrap();
        fs::write(public.join("script.js"), "console.log('diario')").unwrap();
        fs::write(public.join("manifest.json"), "{\"name\":\"Diario\"}").unwrap();

        let config = format!(
            "[network]\nasset_dir = \"{}\"\n\n[storage]\ndir = \"{}\"\n",
            slashes(&public),
            slashes(&temp.path().join("state")),
        );
        fs::write(temp.path().join("config.toml"), config).unwrap();

        Self { temp }
    }

    fn public(&self) -> PathBuf {
        self.temp.path().join("public")
    }

    fn cmd(&self) -> Command {
        let mut cmd = cargo_bin_cmd!("shellcache");
        cmd.arg("--config").arg(self.temp.path().join("config.toml"));
        cmd
    }
}

fn slashes(path: &Path) -> String {
    path.display().to_string().replace('\\', "/")
}

fn shellcache() -> Command {
    cargo_bin_cmd!("shellcache")
}

#[test]
fn help_displays() {
    shellcache()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("offline cache controller"));
}

#[test]
fn version_displays() {
    shellcache()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("shellcache"));
}

#[test]
fn config_path_and_show() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("config.toml"));
    ws.cmd()
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[controller]"))
        .stdout(predicate::str::contains("diario-de-bordo"));
}

#[test]
fn install_reports_skipped_icons() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("Activated"))
        .stdout(predicate::str::contains("icon-512x512.png"));

    ws.cmd()
        .arg("install")
        .assert()
        .success()
        .stdout(predicate::str::contains("already installed"));
}

#[test]
fn fetch_serves_from_cache_when_offline() {
    let ws = Workspace::new();
    ws.cmd().arg("install").assert().success();

    ws.cmd()
        .args(["fetch", "style.css", "--offline"])
        .assert()
        .success()
        .stdout("body { margin: 0 }")
        .stderr(predicate::str::contains("cache"));

    ws.cmd()
        .args(["fetch", "/journal/2024", "--html", "--offline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Diario de Bordo"))
        .stderr(predicate::str::contains("offline-document"));

    ws.cmd()
        .args(["fetch", "/api/entries", "--offline"])
        .assert()
        .success()
        .stderr(predicate::str::contains("503"));
}

#[test]
fn fetch_without_install_fails_offline() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["fetch", "style.css", "--offline"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Network request failed"));
}

#[test]
fn new_deploy_replaces_old_generation() {
    let ws = Workspace::new();
    ws.cmd().arg("install").assert().success();

    fs::write(ws.public().join("style.css"), "body { margin: 1em }").unwrap();
    ws.cmd()
        .args(["install", "--version", "v2.0"])
        .assert()
        .success();

    ws.cmd()
        .args(["cache", "list", "--format", "plain"])
        .assert()
        .success()
        .stdout("diario-de-bordo-v2.0\n");

    ws.cmd()
        .args(["fetch", "style.css", "--offline"])
        .assert()
        .success()
        .stdout("body { margin: 1em }");
}

#[test]
fn hash_version_follows_asset_contents() {
    let ws = Workspace::new();
    let hash = ws
        .cmd()
        .args(["manifest", "hash"])
        .arg(ws.public())
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let hash = String::from_utf8(hash).unwrap().trim().to_string();
    assert_eq!(hash.len(), 12);
    assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));

    ws.cmd()
        .args(["install", "--hash-version", "--asset-dir"])
        .arg(ws.public())
        .assert()
        .success()
        .stdout(predicate::str::contains(hash.as_str()));
}

#[test]
fn cache_clear_all_forgets_registration() {
    let ws = Workspace::new();
    ws.cmd().arg("install").assert().success();

    ws.cmd()
        .args(["cache", "clear", "--all"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 generation"));

    ws.cmd()
        .args(["cache", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No cache generations found"));
}

#[test]
fn status_shows_active_generation() {
    let ws = Workspace::new();
    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("None installed"));

    ws.cmd().arg("install").assert().success();
    ws.cmd()
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("diario-de-bordo-v1.0"));
}

#[test]
fn journal_entries_round_trip() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["entry", "add", "-t", "Harbor", "-d", "Calm seas", "--date", "2024-05-01"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Added entry"));
    ws.cmd()
        .args(["entry", "add", "-t", "Storm", "-d", "Reefed sails", "--date", "2024-05-03"])
        .assert()
        .success();

    let listing = ws
        .cmd()
        .args(["entry", "list", "--format", "plain"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let listing = String::from_utf8(listing).unwrap();
    let lines: Vec<&str> = listing.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].ends_with("Storm"));
    let harbor_id = lines[1].split('\t').next().unwrap().to_string();

    ws.cmd()
        .args(["entry", "list", "--date", "2024-05-01", "--format", "plain"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Harbor").and(predicate::str::contains("Storm").not()));

    ws.cmd()
        .args(["entry", "delete", &harbor_id])
        .assert()
        .success();
    ws.cmd()
        .args(["entry", "delete", &harbor_id])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}

#[test]
fn empty_title_is_rejected() {
    let ws = Workspace::new();
    ws.cmd()
        .args(["entry", "add", "-t", "  ", "-d", "text"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid journal entry"));
}
