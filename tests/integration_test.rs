use assert_cmd::Command;
use assert_cmd::cargo;
use mockito::{Mock, Server, ServerGuard};
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use tempfile::{TempDir, tempdir};
use zip::ZipWriter;
use zip::write::FileOptions;

fn create_zip(files: &[(&str, &str)]) -> Vec<u8> {
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut zip = ZipWriter::new(&mut buffer);
        for (name, content) in files {
            zip.start_file(*name, FileOptions::<()>::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }
    buffer.into_inner()
}

/// A catalog with a framework and a mod depending on it, served locally.
struct Env {
    server: ServerGuard,
    _mocks: Vec<Mock>,
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let mut server = Server::new();
        let url = server.url();

        let catalog = server
            .mock("GET", "/mods.json")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(format!(
                r#"[
                    {{"name": "Modding API", "author": "Damocles", "latestVersion": "1.2.0",
                      "latestDownloadURL": "{url}/api.zip", "pluginFile": "ModdingAPI.dll",
                      "requiredDlls": ["Shared.dll"], "dependencies": null}},
                    {{"name": "Randomizer", "author": "Damocles", "latestVersion": "2.0.0",
                      "latestDownloadURL": "{url}/rando.zip", "pluginFile": "Randomizer.dll",
                      "dependencies": ["Modding API"]}}
                ]"#
            ))
            .create();
        let api = server
            .mock("GET", "/api.zip")
            .with_status(200)
            .with_body(create_zip(&[
                ("plugins/ModdingAPI.dll", "api"),
                ("data/Shared.dll", "shared"),
            ]))
            .create();
        let rando = server
            .mock("GET", "/rando.zip")
            .with_status(200)
            .with_body(create_zip(&[
                ("plugins/Randomizer.dll", "rando"),
                ("data/Randomizer/items.json", "{}"),
            ]))
            .create();

        Self {
            server,
            _mocks: vec![catalog, api, rando],
            dir: tempdir().unwrap(),
        }
    }

    fn root(&self) -> PathBuf {
        self.dir.path().join("game")
    }

    fn modding(&self) -> PathBuf {
        self.root().join("Modding")
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::new(cargo::cargo_bin!("modman"));
        cmd.arg("--root")
            .arg(self.root())
            .arg("--cache-dir")
            .arg(self.dir.path().join("cache"))
            .arg("--catalog-url")
            .arg(format!("{}/mods.json", self.server.url()))
            .env_remove("MODMAN_ROOT")
            .env_remove("MODMAN_CACHE_DIR");
        cmd
    }
}

#[test]
fn test_install_resolves_dependencies_and_lists() {
    let env = Env::new();

    env.cmd()
        .args(["--yes", "install", "Randomizer"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Installing Randomizer..."))
        .stdout(predicates::str::contains("Installed Modding API"))
        .stdout(predicates::str::contains("Installed Randomizer"));

    assert!(env.modding().join("plugins/ModdingAPI.dll").exists());
    assert!(env.modding().join("plugins/Randomizer.dll").exists());
    assert!(env.modding().join("data/Shared.dll").exists());
    assert!(env.dir.path().join("cache/blas1mods/Randomizer/2.0.0/data.zip").exists());

    env.cmd()
        .arg("list")
        .assert()
        .success()
        .stdout(predicates::str::contains("Frameworks:"))
        .stdout(predicates::str::contains("Installed:"))
        .stdout(predicates::str::contains("[enabled]"));
}

#[test]
fn test_declined_dependency_prompt_changes_nothing() {
    let env = Env::new();

    env.cmd()
        .args(["install", "Randomizer"])
        .write_stdin("n\n")
        .assert()
        .success()
        .stdout(predicates::str::contains("Modding API"))
        .stdout(predicates::str::contains("Cancelled. No changes were made."));

    assert!(!env.modding().exists());
}

#[test]
fn test_disable_enable_uninstall_cycle() {
    let env = Env::new();
    env.cmd()
        .args(["-y", "install", "Randomizer"])
        .assert()
        .success();

    // disabling the framework takes its dependent along
    env.cmd()
        .args(["-y", "disable", "Modding API"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Disabled Randomizer"))
        .stdout(predicates::str::contains("Disabled Modding API"));
    assert!(env.modding().join("disabled/Randomizer.dll").exists());
    assert!(env.modding().join("disabled/ModdingAPI.dll").exists());

    // enabling the dependent brings the framework back
    env.cmd()
        .args(["-y", "enable", "Randomizer"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Enabled Modding API"))
        .stdout(predicates::str::contains("Enabled Randomizer"));

    env.cmd()
        .args(["-y", "uninstall", "Randomizer"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Uninstalled Randomizer"));
    assert!(!env.modding().join("plugins/Randomizer.dll").exists());
    assert!(!env.modding().join("data/Randomizer").exists());
    assert!(env.modding().join("plugins/ModdingAPI.dll").exists());

    env.cmd()
        .args(["list", "--status", "available"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Randomizer"))
        .stdout(predicates::str::contains("Modding API").not());
}

#[test]
fn test_uninstall_asks_before_removing() {
    let env = Env::new();
    env.cmd()
        .args(["-y", "install", "Modding API"])
        .assert()
        .success();

    env.cmd()
        .args(["uninstall", "Modding API"])
        .write_stdin("no\n")
        .assert()
        .success()
        .stdout(predicates::str::contains("Are you sure?"))
        .stdout(predicates::str::contains("Cancelled."));
    assert!(env.modding().join("plugins/ModdingAPI.dll").exists());

    env.cmd()
        .args(["uninstall", "Modding API"])
        .write_stdin("y\n")
        .assert()
        .success();
    assert!(!env.modding().join("plugins/ModdingAPI.dll").exists());
    assert!(!env.modding().join("data/Shared.dll").exists());
}

#[test]
fn test_show_and_unknown_package() {
    let env = Env::new();

    env.cmd()
        .args(["show", "Randomizer"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Package: Randomizer"))
        .stdout(predicates::str::contains("Status: not installed"))
        .stdout(predicates::str::contains("Dependencies:\n  Modding API"));

    env.cmd()
        .args(["enable", "Nope"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Package 'Nope' is not in the catalog"));

    env.cmd()
        .args(["disable", "Randomizer"])
        .assert()
        .failure()
        .stderr(predicates::str::contains("Package 'Randomizer' is not installed"));
}

#[test]
fn test_update_all_reinstalls_outdated() {
    let env = Env::new();
    env.cmd()
        .args(["-y", "install", "Modding API"])
        .assert()
        .success();

    // pretend an older release is installed
    let receipt = env.dir.path().join("cache/blas1mods/receipts/Modding API.json");
    let content = fs::read_to_string(&receipt).unwrap().replace("1.2.0", "1.1.0");
    fs::write(&receipt, content).unwrap();

    env.cmd()
        .args(["list", "--status", "updates"])
        .assert()
        .success()
        .stdout(predicates::str::contains("(update: 1.2.0)"));

    env.cmd()
        .args(["-y", "update", "--all"])
        .assert()
        .success()
        .stdout(predicates::str::contains("Updating Modding API..."))
        .stdout(predicates::str::contains("Installed Modding API"));

    env.cmd()
        .args(["-y", "update", "--all"])
        .assert()
        .success()
        .stdout(predicates::str::contains("All installed packages are up to date."));
}

#[test]
fn test_sections_needs_no_root() {
    Command::new(cargo::cargo_bin!("modman"))
        .env_remove("MODMAN_ROOT")
        .arg("sections")
        .assert()
        .success()
        .stdout(predicates::str::contains("blas1mods"))
        .stdout(predicates::str::contains("blas2mods"));
}

#[test]
fn test_missing_root_is_error() {
    Command::new(cargo::cargo_bin!("modman"))
        .env_remove("MODMAN_ROOT")
        .arg("list")
        .assert()
        .failure()
        .stderr(predicates::str::contains("--root"));
}
