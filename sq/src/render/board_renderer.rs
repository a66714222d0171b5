//! Renderer that writes widget output into a [`Board`]

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use super::{Board, ChartRow, ChartSummary, ChartType, ContainerState, Renderer, WidgetKind};
use crate::transport::{FetchError, FetchResponse};

/// Message shown when the stats endpoint wants a login
pub const LOGIN_MESSAGE: &str = "You must login to access Statistics";

/// Renders one widget into one board container
pub struct BoardRenderer {
    container_id: String,
    kind: WidgetKind,
    board: Board,
}

impl BoardRenderer {
    pub fn new(container_id: impl Into<String>, kind: WidgetKind, board: Board) -> Self {
        Self {
            container_id: container_id.into(),
            kind,
            board,
        }
    }

    /// Turn a successful response into container content
    pub fn render(&self, response: &FetchResponse) -> ContainerState {
        if self.kind.is_html() {
            return ContainerState::Html(response.body.clone());
        }

        let json = match response.json() {
            Ok(json) => json,
            Err(e) => {
                warn!(container_id = %self.container_id, error = %e, "BoardRenderer::render: bad chart payload");
                return ContainerState::Error(e.to_string());
            }
        };

        // Only the full graph reports "no data" style messages
        if self.kind == WidgetKind::GoogleGraph {
            if let Some(msg) = json.get("msg").and_then(Value::as_str) {
                return ContainerState::Message(msg.to_string());
            }
        }

        let chart = match self.kind {
            WidgetKind::GoogleGraph => {
                if json.get("show_average").and_then(Value::as_bool).unwrap_or(false) {
                    ChartType::Combo
                } else {
                    match json.get("type").and_then(Value::as_str) {
                        None | Some("area") => ChartType::Area,
                        Some(_) => ChartType::Column,
                    }
                }
            }
            WidgetKind::GoogleSpark => ChartType::Area,
            WidgetKind::GoogleGeoChart => ChartType::Geo,
            _ => ChartType::Pie,
        };

        ContainerState::Chart(ChartSummary {
            chart,
            rows: parse_rows(json.get("data")),
        })
    }
}

/// Parse `[[label, value, ...], ...]`; malformed rows are skipped
fn parse_rows(data: Option<&Value>) -> Vec<ChartRow> {
    let Some(rows) = data.and_then(Value::as_array) else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(Value::as_array)
        .filter_map(|row| {
            let (label, values) = row.split_first()?;
            let label = match label {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            Some(ChartRow {
                label,
                values: values.iter().filter_map(Value::as_f64).collect(),
            })
        })
        .collect()
}

#[async_trait]
impl Renderer for BoardRenderer {
    async fn wait(&self) {
        debug!(container_id = %self.container_id, "BoardRenderer::wait: called");
        self.board.set(&self.container_id, ContainerState::Loading).await;
    }

    async fn on_success(&self, response: &FetchResponse) {
        debug!(container_id = %self.container_id, kind = %self.kind, "BoardRenderer::on_success: called");
        let state = self.render(response);
        self.board.set(&self.container_id, state).await;
    }

    async fn on_failure(&self, error: &FetchError) {
        debug!(container_id = %self.container_id, %error, "BoardRenderer::on_failure: called");
        let state = if error.is_unauthorized() {
            ContainerState::LoginRequired
        } else {
            ContainerState::Error(error.to_string())
        };
        self.board.set(&self.container_id, state).await;
    }
}
