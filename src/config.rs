use std::env;
use std::net::SocketAddr;

use anyhow::{Context, Result};

/// Runtime configuration, resolved from the environment once at startup and
/// passed down explicitly; nothing below `main` reads the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub github_token: String,
    pub repo_owner: String,
    pub repo_name: String,
    pub github_api_base: String,
    pub tasks_path: String,
    pub state_path: String,
}

fn env_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn env_required(name: &str) -> Result<String> {
    let value = env::var(name).with_context(|| format!("{name} is not set"))?;
    if value.trim().is_empty() {
        anyhow::bail!("{name} is empty");
    }
    Ok(value)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_or("ROADMAPD_ADDR", "127.0.0.1:8787")
            .parse()
            .context("ROADMAPD_ADDR is not a valid socket address")?;
        Ok(Self {
            bind_addr,
            github_token: env_required("GITHUB_TOKEN")?,
            repo_owner: env_required("GITHUB_REPO_OWNER")?,
            repo_name: env_required("GITHUB_REPO_NAME")?,
            github_api_base: env_or("GITHUB_API_BASE", "https://api.github.com"),
            tasks_path: env_or("ROADMAP_TASKS_PATH", "tasks.json"),
            state_path: env_or("ROADMAP_STATE_PATH", "state.json"),
        })
    }
}
