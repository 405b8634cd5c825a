// Scheduler module - one scrape across many devices
//
// Each device document gets its own collector, run on Tokio's blocking pool
// (collection is pure CPU work). Every collector gets its own ChannelSink
// handle onto one shared bounded channel, which is drained once all
// collectors have finished.
//
// # Architecture
// - Sources are loaded concurrently
// - A semaphore caps how many collectors run at once
// - Failures in one device don't affect others

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::collector::SmartCollector;
use crate::config::ExporterSettings;
use crate::point::DataPoint;
use crate::sink::ChannelSink;
use crate::source::{DeviceDocument, DocumentSource};

/// A device that could not be collected
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeFailure {
    pub origin: String,
    pub reason: String,
}

/// Outcome of one scrape
#[derive(Debug, Clone)]
pub struct ScrapeReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    /// Number of devices collected successfully
    pub devices: usize,

    pub failures: Vec<ScrapeFailure>,

    pub points: Vec<DataPoint>,
}

impl ScrapeReport {
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Runs one collector per device document
pub struct ScrapeScheduler {
    settings: Arc<ExporterSettings>,
}

impl ScrapeScheduler {
    pub fn new(settings: ExporterSettings) -> Self {
        ScrapeScheduler {
            settings: Arc::new(settings),
        }
    }

    /// Loads every source and collects every document that loaded
    pub async fn scrape(&self, sources: Vec<Box<dyn DocumentSource>>) -> ScrapeReport {
        let started_at = Utc::now();
        info!("Starting scrape of {} device(s)", sources.len());

        let loads = join_all(sources.iter().map(|source| source.load())).await;

        let mut documents = Vec::new();
        let mut failures = Vec::new();
        for (source, loaded) in sources.iter().zip(loads) {
            match loaded {
                Ok(document) => documents.push(document),
                Err(e) => {
                    error!("Failed to load {}: {}", source.origin(), e);
                    failures.push(ScrapeFailure {
                        origin: source.origin(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let (devices, points, collect_failures) = self.collect_documents(documents).await;
        failures.extend(collect_failures);

        let report = ScrapeReport {
            started_at,
            finished_at: Utc::now(),
            devices,
            failures,
            points,
        };

        info!(
            "Scrape complete: {} device(s), {} point(s), {} failure(s) in {} ms",
            report.devices,
            report.points.len(),
            report.failures.len(),
            report.duration_ms()
        );

        report
    }

    /// Room for every device's points, within what a tokio channel accepts
    fn channel_capacity(&self, documents: usize) -> usize {
        match self.settings.sink_capacity.checked_mul(documents.max(1)) {
            Some(capacity) if capacity <= Semaphore::MAX_PERMITS => capacity,
            _ => {
                warn!(
                    "Sink capacity {} x {} device(s) exceeds the channel limit, clamping to {}",
                    self.settings.sink_capacity,
                    documents,
                    Semaphore::MAX_PERMITS
                );
                Semaphore::MAX_PERMITS
            }
        }
    }

    /// Collects already-parsed documents in parallel
    pub async fn collect_documents(
        &self,
        documents: Vec<DeviceDocument>,
    ) -> (usize, Vec<DataPoint>, Vec<ScrapeFailure>) {
        let (sink, mut receiver) = ChannelSink::bounded(self.channel_capacity(documents.len()));
        let parallel = self.settings.max_parallel.clamp(1, Semaphore::MAX_PERMITS);
        let permits = Arc::new(Semaphore::new(parallel));

        let mut handles = Vec::new();
        for document in documents {
            let sink = sink.clone();
            let settings = Arc::clone(&self.settings);
            let permits = Arc::clone(&permits);

            handles.push(tokio::spawn(async move {
                // acquire only fails on a closed semaphore; this one is never closed
                let _permit = permits.acquire_owned().await.ok();
                let origin = document.origin.clone();

                let outcome = tokio::task::spawn_blocking(move || {
                    SmartCollector::with_settings(&document.json, &sink, &settings)
                        .collect()
                        .map_err(|e| e.to_string())
                })
                .await;

                match outcome {
                    Ok(Ok(summary)) => Ok(summary),
                    Ok(Err(reason)) => Err(ScrapeFailure { origin, reason }),
                    Err(join_error) => Err(ScrapeFailure {
                        origin,
                        reason: format!("collector task failed: {}", join_error),
                    }),
                }
            }));
        }

        // Only the task handles keep the channel open from here on
        drop(sink);

        let mut devices = 0;
        let mut failures = Vec::new();
        for handle in join_all(handles).await {
            match handle {
                Ok(Ok(summary)) => {
                    info!(
                        "Collected {} point(s) from {} ({})",
                        summary.points, summary.device, summary.family
                    );
                    devices += 1;
                }
                Ok(Err(failure)) => {
                    warn!("Failed to collect {}: {}", failure.origin, failure.reason);
                    failures.push(failure);
                }
                Err(e) => {
                    error!("Collector task panicked: {}", e);
                    failures.push(ScrapeFailure {
                        origin: "unknown".to_string(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        let mut points = Vec::new();
        while let Ok(point) = receiver.try_recv() {
            points.push(point);
        }

        (devices, points, failures)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::StaticSource;

    fn disk(name: &str, device_type: &str, temperature: u32) -> Box<dyn DocumentSource> {
        let json = format!(
            r#"{{ "device": {{ "name": "{}", "type": "{}", "protocol": "ATA" }},
                 "temperature": {{ "current": {} }} }}"#,
            name, device_type, temperature
        );
        Box::new(StaticSource::new(name, json))
    }

    #[tokio::test]
    async fn test_scrape_many_devices() {
        let scheduler = ScrapeScheduler::new(ExporterSettings::default());
        let sources = vec![
            disk("/dev/bus/0", "megaraid,0", 30),
            disk("/dev/bus/0", "megaraid,1", 31),
            disk("/dev/sda", "auto", 32),
        ];

        let report = scheduler.scrape(sources).await;

        assert_eq!(report.devices, 3);
        assert!(report.failures.is_empty());
        assert!(report.finished_at >= report.started_at);

        let mut temperatures: Vec<(String, f64)> = report
            .points
            .iter()
            .filter(|p| p.name == "smartctl_device_temperature")
            .map(|p| (p.labels["device"].clone(), p.value))
            .collect();
        temperatures.sort_by(|a, b| a.0.cmp(&b.0));
        assert_eq!(
            temperatures,
            vec![
                ("bus_0_megaraid_0".to_string(), 30.0),
                ("bus_0_megaraid_1".to_string(), 31.0),
                ("sda".to_string(), 32.0),
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_document_fails_alone() {
        let scheduler = ScrapeScheduler::new(ExporterSettings::default());
        let sources = vec![
            disk("/dev/sda", "auto", 35),
            Box::new(StaticSource::new("broken", "{ truncated")) as Box<dyn DocumentSource>,
        ];

        let report = scheduler.scrape(sources).await;

        assert_eq!(report.devices, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].origin, "broken");
        assert!(report.points.iter().all(|p| p.labels["device"] == "sda"));
    }

    #[tokio::test]
    async fn test_undersized_sink_is_reported() {
        let settings = ExporterSettings {
            sink_capacity: 1,
            ..ExporterSettings::default()
        };
        let scheduler = ScrapeScheduler::new(settings);

        let report = scheduler.scrape(vec![disk("/dev/sda", "auto", 35)]).await;

        assert_eq!(report.devices, 0);
        assert_eq!(report.failures.len(), 1);
        assert!(report.failures[0].reason.contains("full"));
    }

    #[tokio::test]
    async fn test_oversized_limits_are_clamped() {
        let settings = ExporterSettings {
            sink_capacity: usize::MAX,
            max_parallel: usize::MAX,
            ..ExporterSettings::default()
        };
        let scheduler = ScrapeScheduler::new(settings);
        assert_eq!(scheduler.channel_capacity(2), Semaphore::MAX_PERMITS);

        let report = scheduler
            .scrape(vec![disk("/dev/sda", "auto", 35), disk("/dev/sdb", "auto", 36)])
            .await;
        assert_eq!(report.devices, 2);
        assert!(report.failures.is_empty());
    }

    #[test]
    fn test_channel_capacity_scales_with_devices() {
        let scheduler = ScrapeScheduler::new(ExporterSettings::default());
        assert_eq!(scheduler.channel_capacity(3), 3000);
        assert_eq!(scheduler.channel_capacity(0), 1000);
    }
}
