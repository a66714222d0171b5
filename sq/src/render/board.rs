//! In-memory widget containers

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;

/// Chart flavour picked from the response
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartType {
    Area,
    Column,
    Combo,
    Geo,
    Pie,
}

/// One data row: a label and its numeric series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartRow {
    pub label: String,
    pub values: Vec<f64>,
}

/// What a chart widget would draw
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSummary {
    pub chart: ChartType,
    pub rows: Vec<ChartRow>,
}

impl ChartSummary {
    /// Sum of the first series
    pub fn total(&self) -> f64 {
        self.rows.iter().filter_map(|r| r.values.first()).sum()
    }
}

/// What a container currently shows
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "content", rename_all = "snake_case")]
pub enum ContainerState {
    Loading,
    Html(String),
    Message(String),
    Chart(ChartSummary),
    LoginRequired,
    Error(String),
}

impl ContainerState {
    pub fn is_loading(&self) -> bool {
        matches!(self, ContainerState::Loading)
    }
}

/// Shared set of containers keyed by container id
#[derive(Debug, Clone, Default)]
pub struct Board {
    containers: Arc<Mutex<BTreeMap<String, ContainerState>>>,
}

impl Board {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set(&self, container_id: &str, state: ContainerState) {
        debug!(%container_id, ?state, "Board::set: called");
        self.containers.lock().await.insert(container_id.to_string(), state);
    }

    pub async fn get(&self, container_id: &str) -> Option<ContainerState> {
        self.containers.lock().await.get(container_id).cloned()
    }

    /// Copy of every container, ordered by id
    pub async fn snapshot(&self) -> BTreeMap<String, ContainerState> {
        self.containers.lock().await.clone()
    }

    /// Containers still showing the waiting indicator
    pub async fn loading(&self) -> Vec<String> {
        self.containers
            .lock()
            .await
            .iter()
            .filter(|(_, s)| s.is_loading())
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_snapshot() {
        let board = Board::new();
        board.set("b", ContainerState::Loading).await;
        board.set("a", ContainerState::Html("<p>1</p>".to_string())).await;

        let snapshot = board.snapshot().await;
        assert_eq!(snapshot.keys().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(board.loading().await, vec!["b".to_string()]);

        board.set("b", ContainerState::LoginRequired).await;
        assert!(board.loading().await.is_empty());
        assert_eq!(board.get("b").await, Some(ContainerState::LoginRequired));
    }

    #[test]
    fn test_chart_total() {
        let summary = ChartSummary {
            chart: ChartType::Area,
            rows: vec![
                ChartRow {
                    label: "2020".to_string(),
                    values: vec![2.0, 1.0],
                },
                ChartRow {
                    label: "2021".to_string(),
                    values: vec![3.0],
                },
            ],
        };
        assert_eq!(summary.total(), 5.0);
    }

    #[test]
    fn test_state_serializes_tagged() {
        let json = serde_json::to_value(ContainerState::Message("no data".to_string())).unwrap();
        assert_eq!(json["state"], "message");
        assert_eq!(json["content"], "no data");
    }
}
