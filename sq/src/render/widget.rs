//! Widget definitions and drawing

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Board, BoardRenderer, Renderer, WidgetKind};
use crate::job::Job;
use crate::scheduler::{Admission, Scheduler, SubmitError};
use crate::transport::{DEFAULT_URL, FetchRequest};

/// Context keys every request carries, set or not
pub const CONTEXT_FIELDS: [&str; 8] = [
    "datatype",
    "datafilter",
    "grouping",
    "set_name",
    "set_value",
    "range",
    "to",
    "from",
];

/// One widget as configured
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetConfig {
    #[serde(flatten)]
    pub kind: WidgetKind,

    /// Container the widget renders into
    #[serde(default, rename = "container-id")]
    pub container_id: Option<String>,

    /// Endpoint override
    #[serde(default)]
    pub url: Option<String>,

    /// Values for the context fields
    #[serde(default)]
    pub context: BTreeMap<String, String>,

    /// Extra request parameters (e.g. `limit`)
    #[serde(default)]
    pub options: BTreeMap<String, String>,
}

impl WidgetConfig {
    pub fn new(kind: WidgetKind, container_id: impl Into<String>) -> Self {
        Self {
            kind,
            container_id: Some(container_id.into()),
            url: None,
            context: BTreeMap::new(),
            options: BTreeMap::new(),
        }
    }

    /// Build the fetch request: context fields, then options, then `view`
    pub fn request(&self) -> FetchRequest {
        let mut request = FetchRequest::new(self.url.as_deref().unwrap_or(DEFAULT_URL));

        for field in CONTEXT_FIELDS {
            request.set(field, self.context.get(field).cloned());
        }
        for (key, value) in &self.options {
            request.set(key.clone(), Some(value.clone()));
        }
        if let Some(container_id) = &self.container_id {
            request.set("container_id", Some(container_id.clone()));
        }
        request.set("view", Some(self.kind.view_name().to_string()));

        request
    }
}

/// A configured widget bound to its renderer
pub struct Widget {
    config: WidgetConfig,
    renderer: Arc<dyn Renderer>,
}

impl Widget {
    pub fn new(config: WidgetConfig, renderer: Arc<dyn Renderer>) -> Self {
        Self { config, renderer }
    }

    /// Widget rendering into a board container
    pub fn on_board(config: WidgetConfig, board: &Board) -> Self {
        let container_id = config.container_id.clone().unwrap_or_default();
        let renderer = BoardRenderer::new(container_id, config.kind.clone(), board.clone());
        Self::new(config, Arc::new(renderer))
    }

    pub fn config(&self) -> &WidgetConfig {
        &self.config
    }

    /// A fresh job for this widget
    pub fn job(&self) -> Job {
        Job::new(self.config.request(), Arc::clone(&self.renderer))
    }

    /// Show the waiting indicator and submit a job.
    ///
    /// Malformed widgets are refused before anything is shown. The waiting
    /// indicator goes up before submission whether the job runs or queues.
    pub async fn draw(&self, scheduler: &Scheduler) -> Result<Admission, SubmitError> {
        debug!(container = ?self.config.container_id, kind = %self.config.kind, "Widget::draw: called");
        let job = self.job();
        job.validate()?;

        self.renderer.wait().await;
        scheduler.submit(job).await
    }
}
