//! Rendering side of a widget
//!
//! Renderers are told about three moments in a job's life: the waiting
//! indicator at submission, and exactly one of success or failure.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::transport::{FetchError, FetchResponse};

mod board;
mod board_renderer;
mod widget;

pub use board::{Board, ChartRow, ChartSummary, ChartType, ContainerState};
pub use board_renderer::{BoardRenderer, LOGIN_MESSAGE};
pub use widget::{CONTEXT_FIELDS, Widget, WidgetConfig};

/// Interprets fetch outcomes for display
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Show the waiting indicator
    async fn wait(&self);

    /// Render a successful fetch
    async fn on_success(&self, response: &FetchResponse);

    /// Render a failed fetch; must leave the waiting state
    async fn on_failure(&self, error: &FetchError);
}

/// Renderer that discards everything
pub struct NullRenderer;

#[async_trait]
impl Renderer for NullRenderer {
    async fn wait(&self) {}

    async fn on_success(&self, _response: &FetchResponse) {}

    async fn on_failure(&self, _error: &FetchError) {}
}

/// Widget types and the server-side view each one asks for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WidgetKind {
    /// Generic HTML view named by configuration
    View { view: String },
    Counter,
    Table,
    GoogleGraph,
    GoogleSpark,
    GoogleGeoChart,
    GooglePieChart,
}

impl WidgetKind {
    /// Value sent as the `view` parameter
    pub fn view_name(&self) -> &str {
        match self {
            Self::View { view } => view,
            Self::Counter => "Counter",
            Self::Table => "Table",
            Self::GoogleGraph => "Google::Graph",
            Self::GoogleSpark => "Google::Spark",
            Self::GoogleGeoChart => "Google::GeoChart",
            Self::GooglePieChart => "Google::PieChart",
        }
    }

    /// Whether the server answers with HTML rather than chart JSON
    pub fn is_html(&self) -> bool {
        matches!(self, Self::View { .. } | Self::Counter | Self::Table)
    }

    /// Built-in kinds, for listing
    pub fn builtin() -> Vec<WidgetKind> {
        vec![
            Self::View {
                view: "<configured>".to_string(),
            },
            Self::Counter,
            Self::Table,
            Self::GoogleGraph,
            Self::GoogleSpark,
            Self::GoogleGeoChart,
            Self::GooglePieChart,
        ]
    }
}

impl std::fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::View { .. } => write!(f, "view"),
            Self::Counter => write!(f, "counter"),
            Self::Table => write!(f, "table"),
            Self::GoogleGraph => write!(f, "google-graph"),
            Self::GoogleSpark => write!(f, "google-spark"),
            Self::GoogleGeoChart => write!(f, "google-geo-chart"),
            Self::GooglePieChart => write!(f, "google-pie-chart"),
        }
    }
}
