use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use backoffice_guard::auth::{generate_jwt, Claims};
use backoffice_guard::types::Role;
use reqwest::{header, StatusCode};

pub const JWT_SECRET: &str = "integration-test-secret";

static SERVER: OnceLock<TestServer> = OnceLock::new();

pub struct TestServer {
    pub base_url: String,
    pub session_dir: PathBuf,
    #[allow(dead_code)]
    child: Child,
}

impl TestServer {
    fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let session_dir = std::env::temp_dir().join(format!("backoffice-guard-it-{}", port));

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_backoffice-guard"));
        cmd.env("APP_ENV", "development")
            .env("BACKOFFICE_HOST", "127.0.0.1")
            .env("BACKOFFICE_PORT", port.to_string())
            .env("SECURITY_JWT_SECRET", JWT_SECRET)
            .env("SESSION_STORAGE_DIR", &session_dir)
            .env("GUARD_UNCONFIGURED_POLICY", "allow")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, session_dir, child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn().expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// Client that never follows redirects, so tests see the guard's decision
pub fn http_client() -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()?)
}

pub fn token_for(role: Role) -> Result<String> {
    let claims = Claims::new("it-user".to_string(), "Integración".to_string(), None, role, 1)?;
    Ok(generate_jwt(&claims, JWT_SECRET)?)
}

/// "name=value" pair from a Set-Cookie header
pub fn session_cookie(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn location(response: &reqwest::Response) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}
