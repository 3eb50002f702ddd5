//! Structured request logging utilities.

use tracing::{error, info, warn, Span};

/// Request logger for stage lifecycle events.
///
/// Every line carries the request id and stage name so one request can be
/// followed across stages.
#[derive(Debug, Clone)]
pub struct RequestLogger {
    request_id: String,
    stage: String,
}

impl RequestLogger {
    pub fn new(request_id: &str, stage: &str) -> Self {
        Self {
            request_id: request_id.to_string(),
            stage: stage.to_string(),
        }
    }

    /// Logger for another stage of the same request.
    pub fn for_stage(&self, stage: &str) -> Self {
        Self::new(&self.request_id, stage)
    }

    pub fn log_start(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            stage = %self.stage,
            "Stage started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            stage = %self.stage,
            "Stage progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            request_id = %self.request_id,
            stage = %self.stage,
            "Stage warning: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            request_id = %self.request_id,
            stage = %self.stage,
            "Stage error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            request_id = %self.request_id,
            stage = %self.stage,
            "Stage completed: {}", message
        );
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    /// Span carrying the request id and stage.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "stage",
            request_id = %self.request_id,
            stage = %self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_logger_for_stage() {
        let logger = RequestLogger::new("req-42", "segment");
        let next = logger.for_stage("match");

        assert_eq!(next.request_id(), "req-42");
        assert_eq!(next.stage(), "match");
        assert_eq!(logger.stage(), "segment");
    }
}
