// Source module - where smartctl documents come from
//
// Running smartctl is somebody else's job. A source hands over the JSON it
// produced, one document per device.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::collector::{parse_document, CollectError};

/// Errors that can occur while loading a document
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("failed to read {origin}: {source}")]
    Io {
        origin: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{origin} is not a usable smartctl document: {source}")]
    Invalid {
        origin: String,
        #[source]
        source: CollectError,
    },
}

/// One parsed device document and where it came from
#[derive(Debug, Clone)]
pub struct DeviceDocument {
    pub origin: String,
    pub json: Arc<Value>,
}

/// Supplier of smartctl JSON documents
#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Human-readable origin, used in logs and failure reports
    fn origin(&self) -> String;

    /// Loads and parses the document
    async fn load(&self) -> Result<DeviceDocument, SourceError>;
}

fn parse(origin: String, bytes: &[u8]) -> Result<DeviceDocument, SourceError> {
    match parse_document(bytes) {
        Ok(json) => Ok(DeviceDocument {
            origin,
            json: Arc::new(json),
        }),
        Err(source) => Err(SourceError::Invalid { origin, source }),
    }
}

/// A smartctl JSON file on disk, e.g. the output of `smartctl --json -a /dev/sda`
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        FileSource { path: path.into() }
    }
}

#[async_trait]
impl DocumentSource for FileSource {
    fn origin(&self) -> String {
        self.path.display().to_string()
    }

    async fn load(&self) -> Result<DeviceDocument, SourceError> {
        let bytes = tokio::fs::read(&self.path).await.map_err(|source| SourceError::Io {
            origin: self.origin(),
            source,
        })?;
        debug!("Read {} bytes from {}", bytes.len(), self.path.display());
        parse(self.origin(), &bytes)
    }
}

/// A document already held in memory
pub struct StaticSource {
    origin: String,
    bytes: Vec<u8>,
}

impl StaticSource {
    pub fn new(origin: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        StaticSource {
            origin: origin.into(),
            bytes: bytes.into(),
        }
    }
}

#[async_trait]
impl DocumentSource for StaticSource {
    fn origin(&self) -> String {
        self.origin.clone()
    }

    async fn load(&self) -> Result<DeviceDocument, SourceError> {
        parse(self.origin.clone(), &self.bytes)
    }
}
