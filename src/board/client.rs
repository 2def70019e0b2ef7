//! HTTP client for a running board server.
//!
//! `BoardClient` holds no board state of its own. Callers keep a
//! `BoardView` snapshot (from `fetch_board`) and hand it to `move_card` /
//! `move_column`, which update it speculatively and put it back the way it
//! was if the server refuses the batch.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::json;

use super::models::*;
use super::ordering::{DropTarget, apply_card_plan, plan_column_move, resolve_card_drop};
use crate::errors::ClientError;

/// Result of a drag gesture that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Nothing to submit; no request was sent.
    Unchanged,
    /// The server applied a batch of this many entries.
    Applied { entries: usize },
}

#[derive(Clone)]
pub struct BoardClient {
    http: reqwest::Client,
    base_url: String,
}

impl BoardClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub async fn fetch_board(&self) -> Result<BoardView, ClientError> {
        let resp = self.http.get(self.url("/api/board")).send().await?;
        read_json(resp).await
    }

    pub async fn export_board(&self) -> Result<BoardExport, ClientError> {
        let resp = self.http.get(self.url("/api/board/export")).send().await?;
        read_json(resp).await
    }

    pub async fn create_card(&self, req: &CardRequest) -> Result<Card, ClientError> {
        let resp = self.http.post(self.url("/api/cards")).json(req).send().await?;
        read_json(resp).await
    }

    pub async fn create_column(
        &self,
        title: &str,
        order_index: Option<i64>,
    ) -> Result<Column, ClientError> {
        let req = ColumnRequest {
            title: Some(title.to_string()),
            order_index,
        };
        let resp = self
            .http
            .post(self.url("/api/columns"))
            .json(&req)
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn reorder_cards(&self, orders: &[CardOrder]) -> Result<Vec<Card>, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/cards/reorder"))
            .json(&json!({ "orders": orders }))
            .send()
            .await?;
        read_json(resp).await
    }

    pub async fn reorder_columns(
        &self,
        orders: &[ColumnOrder],
    ) -> Result<Vec<Column>, ClientError> {
        let resp = self
            .http
            .post(self.url("/api/columns/reorder"))
            .json(&json!({ "orders": orders }))
            .send()
            .await?;
        read_json(resp).await
    }

    /// Drop `card_id` on `target` within `view`.
    ///
    /// The resolved plan is applied to `view.cards` before the request goes
    /// out. On success `view.cards` becomes the server's list; on any
    /// failure it is restored to its pre-drag contents. Unresolvable drops
    /// fail with `InvalidDrop` before any request is made.
    pub async fn move_card(
        &self,
        view: &mut BoardView,
        card_id: i64,
        target: Option<DropTarget>,
    ) -> Result<MoveOutcome, ClientError> {
        let Some(plan) = resolve_card_drop(&view.columns, &view.cards, card_id, target)? else {
            return Ok(MoveOutcome::Unchanged);
        };

        let previous = view.cards.clone();
        apply_card_plan(&mut view.cards, &plan);

        match self.reorder_cards(&plan).await {
            Ok(cards) => {
                view.cards = cards;
                Ok(MoveOutcome::Applied {
                    entries: plan.len(),
                })
            }
            Err(e) => {
                tracing::warn!(card_id, error = %e, "Card move rejected, restoring board");
                view.cards = previous;
                Err(e)
            }
        }
    }

    /// Move a column to `position` within `view`, with the same
    /// speculative-update contract as `move_card`.
    pub async fn move_column(
        &self,
        view: &mut BoardView,
        column_id: i64,
        position: usize,
    ) -> Result<MoveOutcome, ClientError> {
        let Some(plan) = plan_column_move(&view.columns, column_id, position)? else {
            return Ok(MoveOutcome::Unchanged);
        };

        let previous = view.columns.clone();
        for entry in &plan {
            if let Some(column) = view.columns.iter_mut().find(|c| c.id == entry.id) {
                column.order_index = entry.order_index;
            }
        }
        view.columns.sort_by_key(|c| (c.order_index, c.id));

        match self.reorder_columns(&plan).await {
            Ok(columns) => {
                view.columns = columns;
                Ok(MoveOutcome::Applied {
                    entries: plan.len(),
                })
            }
            Err(e) => {
                tracing::warn!(column_id, error = %e, "Column move rejected, restoring board");
                view.columns = previous;
                Err(e)
            }
        }
    }
}

/// Decode a success body, or turn an error response into `ClientError::Status`
/// carrying the server's `{"error": ...}` message.
async fn read_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp.json().await?);
    }
    let message = resp
        .json::<serde_json::Value>()
        .await
        .ok()
        .and_then(|body| body["error"].as_str().map(str::to_string))
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Request failed").to_string());
    Err(ClientError::Status {
        status: status.as_u16(),
        message,
    })
}
