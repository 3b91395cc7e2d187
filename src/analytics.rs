//! Anonymized analytics and QA events.
//!
//! Emission is fire-and-forget: the orchestrator logs and swallows any
//! sink error. Events never carry unredacted query text.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::models::{EmergencyType, TriageLevel};
use crate::rules::redact::redacted_excerpt;
use crate::rules::tables::RULE_SET_VERSION;
use crate::safety::SafetyVerdict;

/// Hex chars kept from the session digest.
const SESSION_HASH_LEN: usize = 16;

#[derive(Error, Debug)]
pub enum AnalyticsError {
    #[error("Analytics queue full, event dropped")]
    QueueFull,

    #[error("Analytics channel closed")]
    Closed,

    #[error("Analytics sink failed: {0}")]
    Sink(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    pub event_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub rule_set_version: String,
    pub session_hash: Option<String>,
    pub region: String,
    pub triage_level: TriageLevel,
    pub safety_flags: Vec<String>,
    pub priority_score: u8,
    pub should_block_ai: bool,
    pub route_to_provider: bool,
    pub emergency_type: Option<EmergencyType>,
    pub input_chars: usize,
    /// Privacy-redacted and truncated.
    pub redacted_excerpt: String,
}

impl AnalyticsEvent {
    pub fn from_verdict(
        verdict: &SafetyVerdict,
        region: &str,
        session_id: Option<&str>,
        display_text: Option<&str>,
        excerpt_chars: usize,
    ) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            rule_set_version: RULE_SET_VERSION.to_string(),
            session_hash: session_id.map(session_hash),
            region: region.to_string(),
            triage_level: verdict.triage_result.level,
            safety_flags: verdict.triage_result.safety_flags.clone(),
            priority_score: verdict.priority_score.value(),
            should_block_ai: verdict.should_block_ai,
            route_to_provider: verdict.route_to_provider,
            emergency_type: verdict.emergency_detection.emergency_type,
            input_chars: display_text.map_or(0, |t| t.chars().count()),
            redacted_excerpt: display_text
                .map(|t| redacted_excerpt(t, excerpt_chars))
                .unwrap_or_default(),
        }
    }
}

/// Truncated SHA-256 of a session id.
pub fn session_hash(session_id: &str) -> String {
    let digest = Sha256::digest(session_id.as_bytes());
    let hex = format!("{digest:x}");
    hex[..SESSION_HASH_LEN].to_string()
}

/// One-way analytics collaborator.
pub trait AnalyticsSink: Send + Sync {
    fn record(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError>;
}

/// Writes events to the tracing subscriber. Structured fields only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl AnalyticsSink for TracingSink {
    fn record(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        tracing::info!(
            target: "vigil::analytics",
            event_id = %event.event_id,
            rule_set = %event.rule_set_version,
            region = %event.region,
            level = event.triage_level.as_str(),
            flags = ?event.safety_flags,
            priority = event.priority_score,
            blocked = event.should_block_ai,
            routed = event.route_to_provider,
            input_chars = event.input_chars,
            "Safety verdict recorded"
        );
        Ok(())
    }
}

/// Bounded, non-blocking queue in front of another sink.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<AnalyticsEvent>,
}

impl ChannelSink {
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<AnalyticsEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

impl AnalyticsSink for ChannelSink {
    fn record(&self, event: AnalyticsEvent) -> Result<(), AnalyticsError> {
        self.tx.try_send(event).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => AnalyticsError::QueueFull,
            mpsc::error::TrySendError::Closed(_) => AnalyticsError::Closed,
        })
    }
}

/// Spawn a task draining a `ChannelSink` into `inner`. The task ends when
/// every `ChannelSink` clone is dropped and yields the number of events
/// forwarded. Must be called inside a tokio runtime.
pub fn spawn_analytics_worker(
    inner: Arc<dyn AnalyticsSink>,
    capacity: usize,
) -> (ChannelSink, JoinHandle<usize>) {
    let (sink, mut rx) = ChannelSink::new(capacity);
    let handle = tokio::spawn(async move {
        let mut forwarded = 0usize;
        while let Some(event) = rx.recv().await {
            match inner.record(event) {
                Ok(()) => forwarded += 1,
                Err(e) => tracing::warn!(error = %e, "Analytics sink rejected event"),
            }
        }
        tracing::debug!(forwarded, "Analytics worker stopped");
        forwarded
    });
    (sink, handle)
}


#[cfg(test)]
mod tests {
    use super::test_support::MemorySink;
    use super::*;
    use crate::safety::{EvaluateOptions, SafetyOrchestrator};

    fn verdict(text: &str) -> SafetyVerdict {
        SafetyOrchestrator::default().evaluate(Some(text), &EvaluateOptions::default())
    }

    #[test]
    fn session_hash_is_stable_and_truncated() {
        let a = session_hash("session-1");
        assert_eq!(a.len(), SESSION_HASH_LEN);
        assert_eq!(a, session_hash("session-1"));
        assert_ne!(a, session_hash("session-2"));
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn event_carries_no_raw_text() {
        let text = "My name is Jane Doe, call 555-123-4567, I have chest pain";
        let v = verdict(text);
        let event = AnalyticsEvent::from_verdict(&v, "US", Some("s1"), Some(text), 160);
        let json = serde_json::to_string(&event).unwrap();
        assert!(!json.contains("Jane"));
        assert!(!json.contains("555-123-4567"));
        assert!(!json.contains("\"s1\""));
        assert_eq!(event.triage_level, TriageLevel::Emergency);
        assert_eq!(event.rule_set_version, RULE_SET_VERSION);
        assert_eq!(event.input_chars, text.chars().count());
    }

    #[test]
    fn tracing_sink_accepts() {
        let v = verdict("i have a cough");
        let event = AnalyticsEvent::from_verdict(&v, "US", None, None, 160);
        assert!(TracingSink.record(event).is_ok());
    }

    #[test]
    fn channel_sink_reports_full_without_blocking() {
        let (sink, _rx) = ChannelSink::new(1);
        let v = verdict("i have a cough");
        let event = AnalyticsEvent::from_verdict(&v, "US", None, None, 160);
        assert!(sink.record(event.clone()).is_ok());
        assert!(matches!(sink.record(event), Err(AnalyticsError::QueueFull)));
    }

    #[test]
    fn channel_sink_reports_closed() {
        let (sink, rx) = ChannelSink::new(4);
        drop(rx);
        let v = verdict("i have a cough");
        let event = AnalyticsEvent::from_verdict(&v, "US", None, None, 160);
        assert!(matches!(sink.record(event), Err(AnalyticsError::Closed)));
    }

    #[tokio::test]
    async fn worker_forwards_to_inner_sink() {
        let memory = Arc::new(MemorySink::default());
        let (sink, handle) = spawn_analytics_worker(memory.clone(), 8);
        let v = verdict("i have a high fever");
        for _ in 0..3 {
            sink.record(AnalyticsEvent::from_verdict(&v, "US", None, None, 160))
                .unwrap();
        }
        drop(sink);
        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(memory.events.lock().unwrap().len(), 3);
    }
}
