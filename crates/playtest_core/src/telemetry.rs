//! Fire-and-forget usage telemetry.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CoreError, CoreResult};

/// A telemetry notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data", rename_all = "snake_case")]
pub enum TelemetryEvent {
    RunTests { num_tests: usize },
}

/// Receives telemetry notifications.
///
/// Errors are reported back to the caller but never affect a run.
#[cfg_attr(test, mockall::automock)]
pub trait TelemetrySink: Send + Sync {
    fn record(&self, event: &TelemetryEvent) -> CoreResult<()>;
}

/// Writes telemetry events to the `playtest::telemetry` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingTelemetry;

impl TelemetrySink for TracingTelemetry {
    fn record(&self, event: &TelemetryEvent) -> CoreResult<()> {
        let payload =
            serde_json::to_string(event).map_err(|e| CoreError::Telemetry(e.to_string()))?;
        info!(target: "playtest::telemetry", "{}", payload);
        Ok(())
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetrySink for NoopTelemetry {
    fn record(&self, _event: &TelemetryEvent) -> CoreResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_shape() {
        let json = serde_json::to_value(TelemetryEvent::RunTests { num_tests: 3 }).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"action": "run_tests", "data": {"num_tests": 3}})
        );
    }

    #[test]
    fn test_builtin_sinks_accept_events() {
        let event = TelemetryEvent::RunTests { num_tests: 1 };
        assert!(TracingTelemetry.record(&event).is_ok());
        assert!(NoopTelemetry.record(&event).is_ok());
    }
}
