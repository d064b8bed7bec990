//! The remote collaborator.
//!
//! Provides the [`RemoteHabits`] trait and an HTTP implementation speaking the
//! habits JSON API (`/api/habits`, `/api/habits/{id}`, `/api/habits/{id}/toggle`)
//! with bearer-token auth. The client is created via [`create_client`] from configuration.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;

use super::session::Session;
use crate::config::RemoteConfig;
use crate::habit::types::{Habit, HabitRecord};

/// Asynchronous calls into the remote source of truth. Any `Err` is treated
/// the same way regardless of cause.
#[async_trait]
pub trait RemoteHabits: Send + Sync {
    async fn create_remote(&self, session: &Session, habit: &Habit) -> Result<()>;

    async fn toggle_remote(&self, session: &Session, habit_id: &str, date: &str) -> Result<()>;

    async fn delete_remote(&self, session: &Session, habit_id: &str) -> Result<()>;

    /// Every habit the remote holds for this session's user.
    async fn fetch_all(&self, session: &Session) -> Result<Vec<HabitRecord>>;
}

/// Create the remote client from config. `None` means local-only operation.
pub fn create_client(config: &RemoteConfig) -> Result<Option<Arc<dyn RemoteHabits>>> {
    match config.base_url() {
        Some(url) => {
            let remote = HttpRemote::new(url)?;
            Ok(Some(Arc::new(remote)))
        }
        None => Ok(None),
    }
}

pub struct HttpRemote {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct HabitListResponse {
    #[serde(default)]
    habits: Vec<HabitRecord>,
}

impl HttpRemote {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("cadence/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn ensure_success(response: &reqwest::Response, what: &str) -> Result<()> {
    anyhow::ensure!(
        response.status().is_success(),
        "{what} rejected with HTTP {}",
        response.status()
    );
    Ok(())
}

#[async_trait]
impl RemoteHabits for HttpRemote {
    async fn create_remote(&self, session: &Session, habit: &Habit) -> Result<()> {
        let response = self
            .client
            .post(self.url("/api/habits"))
            .bearer_auth(&session.token)
            .json(habit)
            .send()
            .await
            .context("create request failed")?;
        ensure_success(&response, "create")
    }

    async fn toggle_remote(&self, session: &Session, habit_id: &str, date: &str) -> Result<()> {
        let response = self
            .client
            .post(self.url(&format!("/api/habits/{habit_id}/toggle")))
            .bearer_auth(&session.token)
            .json(&serde_json::json!({ "date": date }))
            .send()
            .await
            .context("toggle request failed")?;
        ensure_success(&response, "toggle")
    }

    async fn delete_remote(&self, session: &Session, habit_id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("/api/habits/{habit_id}")))
            .bearer_auth(&session.token)
            .send()
            .await
            .context("delete request failed")?;
        ensure_success(&response, "delete")
    }

    async fn fetch_all(&self, session: &Session) -> Result<Vec<HabitRecord>> {
        let response = self
            .client
            .get(self.url("/api/habits"))
            .bearer_auth(&session.token)
            .send()
            .await
            .context("fetch request failed")?;
        ensure_success(&response, "fetch")?;
        let body: HabitListResponse = response
            .json()
            .await
            .context("failed to parse remote habit list")?;
        Ok(body.habits)
    }
}
