#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

/// Database keys cleared from the child so the parent's environment can't leak in
const DATABASE_KEYS: &[&str] = &[
    "DATABASE_URL",
    "PLATEAU_DB_HOST",
    "PLATEAU_DB_PORT",
    "PLATEAU_DB_USER",
    "PLATEAU_DB_PASSWORD",
    "PLATEAU_DB_NAME",
    "PLATEAU_DB_TABLE",
];

pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    child: Child,
}

impl TestServer {
    /// Start the server pointed at a port where no database listens
    pub async fn without_database() -> Result<Self> {
        let dead_port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let url = format!("mysql://root@127.0.0.1:{}/PEC", dead_port);
        Self::start(&[("DATABASE_URL", url), ("PLATEAU_DB_CONNECT_TIMEOUT", "5".to_string())]).await
    }

    /// Start the server pointed at a live database and table
    pub async fn with_database(url: &str, table: &str) -> Result<Self> {
        Self::start(&[
            ("DATABASE_URL", url.to_string()),
            ("PLATEAU_DB_TABLE", table.to_string()),
        ])
        .await
    }

    async fn start(envs: &[(&str, String)]) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_plateau-recorder"));
        for key in DATABASE_KEYS {
            cmd.env_remove(key);
        }
        cmd.env("PLATEAU_BIND", "127.0.0.1")
            .env("PLATEAU_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("RUST_LOG", "warn")
            .envs(envs.iter().map(|(k, v)| (*k, v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;
        let server = Self { port, base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
