#![allow(dead_code)]

use apictl::archive::application_archive_name;
use std::io::{Cursor, Write};
use std::path::PathBuf;
use std::process::{Command, Output};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// The built binary, run against its own throwaway config directory
pub struct Apictl {
    pub config_dir: TempDir,
}

impl Apictl {
    pub fn new() -> Self {
        Apictl {
            config_dir: TempDir::new().unwrap(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_apictl"));
        cmd.args(args)
            .env("APICTL_CONFIG_DIR", self.config_dir.path())
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args)
            .output()
            .expect("Failed to execute apictl")
    }

    /// Run without blocking the runtime that serves the mock environments
    pub async fn run_async(&self, args: &[&str]) -> Output {
        let mut cmd = self.command(args);
        tokio::task::spawn_blocking(move || cmd.output().expect("Failed to execute apictl"))
            .await
            .unwrap()
    }

    pub fn export_root(&self) -> PathBuf {
        self.config_dir.path().join("exported")
    }

    pub fn app_archive_path(&self, env: &str, name: &str, owner: &str) -> PathBuf {
        self.export_root()
            .join("apps")
            .join(env)
            .join(application_archive_name(name, owner))
    }

    pub fn api_archive_path(&self, env: &str, name: &str, version: &str) -> PathBuf {
        self.export_root()
            .join("apis")
            .join(env)
            .join(format!("{name}_{version}.zip"))
    }

    pub async fn setup_env(&self, name: &str, apim: &str) {
        let out = self.run_async(&["env", "add", name, "--apim", apim]).await;
        assert_success(&out);
    }

    pub async fn login(&self, env: &str, username: &str, password: &str) {
        let out = self
            .run_async(&["login", env, "-u", username, "-p", password])
            .await;
        assert_success(&out);
    }
}

pub fn stdout(out: &Output) -> String {
    String::from_utf8_lossy(&out.stdout).into_owned()
}

pub fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

pub fn assert_success(out: &Output) {
    assert!(
        out.status.success(),
        "apictl failed\nstdout: {}\nstderr: {}",
        stdout(out),
        stderr(out)
    );
}

/// Accept client registration and hand out a fixed token
pub async fn mount_oauth(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/client-registration/v0.17/register"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "clientId": "test-client",
            "clientSecret": "test-secret"
        })))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/oauth2/token"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"access_token": "test-token"})),
        )
        .mount(server)
        .await;
}

/// A zip shaped like the platform's export: every entry under one root directory
pub fn platform_zip(root: &str, entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, body) in entries {
        writer
            .start_file(format!("{root}/{name}"), SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

pub fn contains_bytes(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
