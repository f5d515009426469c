//! Document sinks.

use async_trait::async_trait;
use lectern_error::{PipelineError, PipelineErrorKind};
use lectern_interface::DocumentSink;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, instrument};

/// Writes the workbook as pretty-printed JSON to a file.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    path: PathBuf,
}

impl JsonFileSink {
    /// Sink writing to `path`, creating parent directories as needed.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl DocumentSink for JsonFileSink {
    #[instrument(skip(self, workbook), fields(path = %self.path.display()))]
    async fn export(&self, workbook: &Value) -> Result<String, PipelineError> {
        let text = serde_json::to_string_pretty(workbook)
            .map_err(|e| PipelineError::new(PipelineErrorKind::Export(e.to_string())))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                PipelineError::new(PipelineErrorKind::Export(format!(
                    "{}: {}",
                    parent.display(),
                    e
                )))
            })?;
        }
        tokio::fs::write(&self.path, text).await.map_err(|e| {
            PipelineError::new(PipelineErrorKind::Export(format!(
                "{}: {}",
                self.path.display(),
                e
            )))
        })?;
        debug!("Workbook written");
        Ok(self.path.display().to_string())
    }
}

/// Keeps exported workbooks in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    documents: Mutex<Vec<Value>>,
}

impl MemorySink {
    /// Everything exported so far.
    pub fn documents(&self) -> Vec<Value> {
        self.documents
            .lock()
            .map(|docs| docs.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentSink for MemorySink {
    async fn export(&self, workbook: &Value) -> Result<String, PipelineError> {
        let mut documents = self
            .documents
            .lock()
            .map_err(|e| PipelineError::new(PipelineErrorKind::Export(e.to_string())))?;
        documents.push(workbook.clone());
        Ok(format!("memory://{}", documents.len() - 1))
    }
}
