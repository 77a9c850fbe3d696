use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::future::Future;

use crate::error::{AutoplayError, Result};
use crate::input::event::KeyCode;
use crate::planner::oracle::MoveOracle;
use crate::state::snapshot::Grid;

/// Oracle served over HTTP. No client timeout: a hanging oracle stalls the tick.
#[derive(Clone)]
pub struct HttpOracle {
    client: Client,
    url: String,
}

#[derive(Serialize)]
struct MoveRequest<'a> {
    grid: &'a Grid,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MoveResponse {
    Bare(u32),
    Object {
        #[serde(alias = "keyCode")]
        r#move: u32,
    },
}

impl MoveResponse {
    fn key_code(&self) -> KeyCode {
        match self {
            MoveResponse::Bare(code) => KeyCode(*code),
            MoveResponse::Object { r#move } => KeyCode(*r#move),
        }
    }
}

impl HttpOracle {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub async fn request(&self, grid: &Grid) -> Result<KeyCode> {
        let response = self
            .client
            .post(&self.url)
            .json(&MoveRequest { grid })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AutoplayError::Oracle(format!(
                "oracle server error: {}",
                response.status()
            )));
        }

        let body: MoveResponse = response.json().await?;
        Ok(body.key_code())
    }
}

impl MoveOracle for HttpOracle {
    fn decide(&mut self, grid: &Grid) -> impl Future<Output = Result<KeyCode>> + Send {
        let oracle = self.clone();
        let grid = *grid;
        async move { oracle.request(&grid).await }
    }
}
