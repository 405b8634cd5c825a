// Collector module - one full collection pass over one smartctl document
//
// The collector:
// 1. Derives the device label from `device.name` / `device.type`
// 2. Detects the device family (for logging only)
// 3. Runs every enabled extractor against the document
// 4. Pushes every resulting point into the sink before returning
//
// It holds no state between calls: collecting the same document twice
// yields the same points.

use std::fmt;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info_span, Span};

use crate::config::ExporterSettings;
use crate::document::{self, Field};
use crate::label::build_device_label;
use crate::metrics::{create_all_extractors, AttributeExtractor, DeviceContext, DEFAULT_NAMESPACE};
use crate::sink::{MetricSink, SinkError};
use crate::status;

/// Errors that abort a collection
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("document is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("document root must be a JSON object, found {0}")]
    NotAnObject(&'static str),

    #[error("failed to push metric: {0}")]
    Sink(#[from] SinkError),
}

/// Parses raw smartctl output. Anything that is not a JSON object is rejected.
pub fn parse_document(bytes: &[u8]) -> Result<Value, CollectError> {
    let document: Value = serde_json::from_slice(bytes)?;
    if !document.is_object() {
        return Err(CollectError::NotAnObject(document::type_name(&document)));
    }
    Ok(document)
}

/// Protocol class of the device, deciding which sections are present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceFamily {
    Ata,
    Nvme,
    Scsi,
    Unknown,
}

impl DeviceFamily {
    /// Reads `device.protocol`, falling back to which family sections exist
    pub fn detect(document: &Value) -> Self {
        if let Field::Present(protocol) = document::string(document, "device.protocol") {
            match protocol.trim().to_ascii_lowercase().as_str() {
                "ata" => return DeviceFamily::Ata,
                "nvme" => return DeviceFamily::Nvme,
                "scsi" => return DeviceFamily::Scsi,
                _ => {}
            }
        }

        if document::lookup(document, "ata_smart_attributes").is_some() {
            DeviceFamily::Ata
        } else if document::lookup(document, "nvme_smart_health_information_log").is_some() {
            DeviceFamily::Nvme
        } else if document::lookup(document, "scsi_error_counter_log").is_some() {
            DeviceFamily::Scsi
        } else {
            DeviceFamily::Unknown
        }
    }
}

impl fmt::Display for DeviceFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeviceFamily::Ata => "ata",
            DeviceFamily::Nvme => "nvme",
            DeviceFamily::Scsi => "scsi",
            DeviceFamily::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Device path and smartctl device type, as reported in the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub path: String,
    pub device_type: String,
}

impl DeviceIdentity {
    pub fn from_document(document: &Value) -> Self {
        let read = |path: &str| document::string(document, path).present().unwrap_or("").to_string();
        DeviceIdentity {
            path: read("device.name"),
            device_type: read("device.type"),
        }
    }

    pub fn label(&self) -> String {
        build_device_label(&self.path, &self.device_type)
    }
}

/// What a collection pass produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectSummary {
    pub device: String,
    pub family: DeviceFamily,
    pub points: usize,
}

/// Collector for one smartctl document
pub struct SmartCollector<'a, S: MetricSink + ?Sized> {
    document: &'a Value,
    sink: &'a S,
    extractors: Vec<Box<dyn AttributeExtractor>>,
    namespace: String,
    span: Span,
}

impl<'a, S: MetricSink + ?Sized> SmartCollector<'a, S> {
    /// Creates a collector with every extractor enabled and the default namespace
    pub fn new(document: &'a Value, sink: &'a S) -> Self {
        Self::build(document, sink, DEFAULT_NAMESPACE.to_string(), create_all_extractors())
    }

    /// Creates a collector honouring namespace and extractor toggles from `settings`
    pub fn with_settings(document: &'a Value, sink: &'a S, settings: &ExporterSettings) -> Self {
        let extractors = create_all_extractors()
            .into_iter()
            .filter(|extractor| settings.is_extractor_enabled(extractor.name()))
            .collect();
        Self::build(document, sink, settings.namespace.clone(), extractors)
    }

    fn build(
        document: &'a Value,
        sink: &'a S,
        namespace: String,
        extractors: Vec<Box<dyn AttributeExtractor>>,
    ) -> Self {
        let identity = DeviceIdentity::from_document(document);
        let span = info_span!(
            "collect",
            device = identity.label().as_str(),
            family = %DeviceFamily::detect(document),
        );
        SmartCollector {
            document,
            sink,
            extractors,
            namespace,
            span,
        }
    }

    /// Runs one full pass and pushes every point into the sink.
    ///
    /// Only a sink failure aborts the pass; per-field problems are logged
    /// and skipped by the extractors.
    pub fn collect(&self) -> Result<CollectSummary, CollectError> {
        let _entered = self.span.enter();

        let label = DeviceIdentity::from_document(self.document).label();
        let family = DeviceFamily::detect(self.document);
        status::log_diagnostics(self.document, &label);

        let context = DeviceContext::new(self.document, &label, &self.namespace);
        let mut pushed = 0;

        for extractor in &self.extractors {
            let points = extractor.extract(&context);
            debug!(extractor = extractor.name(), points = points.len(), "Extractor finished");

            for point in points {
                self.sink.push(point)?;
                pushed += 1;
            }
        }

        debug!(points = pushed, "Collection pass complete");

        Ok(CollectSummary {
            device: label,
            family,
            points: pushed,
        })
    }
}
