use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

/// Fixed message shown when the service answered but the body was not the
/// expected predictions shape.
pub const PARSE_FAILURE_MESSAGE: &str = "Upload complete, but error parsing response";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum UploadStatus {
    Queued,
    Uploading,
    Completed,
    Failed,
}

/// One file staged for or undergoing classification. The session holds at
/// most one of these at a time.
#[derive(Debug, Clone)]
pub struct UploadItem {
    pub file_name: String,
    pub contents: Vec<u8>,
    pub status: UploadStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prediction {
    pub category: String,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClassificationResult {
    pub file_name: String,
    pub predictions: Vec<Prediction>,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    predictions: Vec<Prediction>,
}

/// Outcome of one upload request, as delivered by the transport layer.
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Service answered with a success status and a parseable body.
    Classified(Vec<Prediction>),
    /// Service answered with a success status but the body could not be
    /// interpreted as predictions.
    BadResponse,
    /// The request never completed, or the service answered with a
    /// non-success status. Carries the raw response body or error text.
    TransportFailed(String),
}

/// Parse a classification response body into its predictions, preserving
/// service order verbatim.
pub fn parse_predictions(body: &str) -> Result<Vec<Prediction>> {
    let response: ClassifyResponse =
        serde_json::from_str(body).map_err(|e| anyhow!("unexpected response body: {}", e))?;
    Ok(response.predictions)
}

/// Client-side upload session: the single-slot queue, the user-facing status
/// message, and the most recent classification result.
///
/// Transitions are synchronous and run to completion; the async transport
/// in the controller only ever touches the session through these methods.
#[derive(Debug, Default)]
pub struct SessionState {
    pub queue: Option<UploadItem>,
    pub status_message: String,
    pub last_result: Option<ClassificationResult>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when the slot holds a submittable (queued, not yet sent) item.
    pub fn has_pending_item(&self) -> bool {
        matches!(
            self.queue,
            Some(UploadItem {
                status: UploadStatus::Queued,
                ..
            })
        )
    }

    pub fn staged_file_name(&self) -> Option<String> {
        self.queue.as_ref().map(|item| item.file_name.clone())
    }

    /// Stage a file for upload. The slot has capacity 1: any item already
    /// there, whatever its status, is evicted and replaced. Clears the status
    /// message but keeps the last result so the view can show it alongside
    /// the newly staged file.
    pub fn stage(&mut self, file_name: String, contents: Vec<u8>) {
        self.queue = Some(UploadItem {
            file_name,
            contents,
            status: UploadStatus::Queued,
        });
        self.status_message.clear();
    }

    /// Move the staged item into flight and hand back what the transport
    /// needs. Returns `None` when there is nothing submittable: an empty
    /// slot is benign idle, and a failed item can only be superseded by a
    /// new `stage`, never resubmitted in place.
    pub fn begin_upload(&mut self) -> Option<(String, Vec<u8>)> {
        let item = self.queue.as_mut()?;
        if item.status != UploadStatus::Queued {
            return None;
        }
        item.status = UploadStatus::Uploading;
        self.status_message = "Uploading...".to_string();
        Some((item.file_name.clone(), item.contents.clone()))
    }

    /// Apply the outcome of the request that was sent for `file_name`.
    ///
    /// Responses carry no correlation id, so a late completion can land
    /// after a newer file has been staged. It still overwrites the status
    /// message (and the last result on success), but it only empties or
    /// fails the slot when the slot still holds the in-flight item; a newer
    /// queued item is left untouched.
    pub fn apply_outcome(&mut self, file_name: &str, outcome: UploadOutcome) {
        match outcome {
            UploadOutcome::Classified(predictions) => {
                self.last_result = Some(ClassificationResult {
                    file_name: file_name.to_string(),
                    predictions,
                });
                self.status_message.clear();
                if self.in_flight_slot() {
                    // Completed items leave the slot immediately.
                    self.queue = None;
                }
            }
            UploadOutcome::BadResponse => {
                // A bad follow-up must not destroy a prior good result.
                self.status_message = PARSE_FAILURE_MESSAGE.to_string();
                self.fail_in_flight_slot();
            }
            UploadOutcome::TransportFailed(detail) => {
                self.status_message = format!("Upload failed: {}", detail);
                // Failed item stays in the slot for inspection until the
                // next stage() evicts it.
                self.fail_in_flight_slot();
            }
        }
    }

    fn in_flight_slot(&self) -> bool {
        matches!(
            self.queue,
            Some(UploadItem {
                status: UploadStatus::Uploading,
                ..
            })
        )
    }

    fn fail_in_flight_slot(&mut self) {
        if self.in_flight_slot() {
            if let Some(item) = self.queue.as_mut() {
                item.status = UploadStatus::Failed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn staged(name: &str) -> SessionState {
        let mut session = SessionState::new();
        session.stage(name.to_string(), b"contents".to_vec());
        session
    }

    fn invoice_predictions() -> Vec<Prediction> {
        vec![Prediction {
            category: "invoice".to_string(),
            confidence: 0.92,
        }]
    }

    #[test]
    fn stage_replaces_rather_than_accumulates() {
        let mut session = staged("a.pdf");
        session.stage("b.pdf".to_string(), b"b".to_vec());
        session.stage("c.pdf".to_string(), b"c".to_vec());

        let item = session.queue.as_ref().unwrap();
        assert_eq!(item.file_name, "c.pdf");
        assert_eq!(item.status, UploadStatus::Queued);
    }

    #[test]
    fn restaging_same_file_keeps_one_item() {
        let mut session = staged("doc.pdf");
        session.stage("doc.pdf".to_string(), b"contents".to_vec());

        assert!(session.has_pending_item());
        assert_eq!(session.staged_file_name().as_deref(), Some("doc.pdf"));
    }

    #[test]
    fn stage_clears_message_but_keeps_result() {
        let mut session = SessionState::new();
        session.last_result = Some(ClassificationResult {
            file_name: "old.pdf".to_string(),
            predictions: invoice_predictions(),
        });
        session.status_message = "Upload failed: boom".to_string();

        session.stage("new.pdf".to_string(), b"new".to_vec());

        assert_eq!(session.status_message, "");
        assert_eq!(
            session.last_result.as_ref().unwrap().file_name,
            "old.pdf"
        );
    }

    #[test]
    fn begin_upload_on_empty_queue_is_a_noop() {
        let mut session = SessionState::new();
        assert!(session.begin_upload().is_none());
        assert_eq!(session.status_message, "");
        assert!(session.last_result.is_none());
    }

    #[test]
    fn failed_item_cannot_be_resubmitted_in_place() {
        let mut session = staged("doc.pdf");
        let (name, _) = session.begin_upload().unwrap();
        session.apply_outcome(&name, UploadOutcome::TransportFailed("boom".to_string()));

        assert!(session.begin_upload().is_none());
        assert_eq!(
            session.queue.as_ref().unwrap().status,
            UploadStatus::Failed
        );
    }

    #[test]
    fn begin_upload_marks_item_and_sets_message() {
        let mut session = staged("doc.pdf");
        let (name, contents) = session.begin_upload().unwrap();

        assert_eq!(name, "doc.pdf");
        assert_eq!(contents, b"contents".to_vec());
        assert_eq!(session.status_message, "Uploading...");
        assert_eq!(
            session.queue.as_ref().unwrap().status,
            UploadStatus::Uploading
        );
        assert!(!session.has_pending_item());
    }

    #[test]
    fn successful_classification_stores_result_and_empties_queue() {
        let mut session = staged("doc.pdf");
        let (name, _) = session.begin_upload().unwrap();
        session.apply_outcome(&name, UploadOutcome::Classified(invoice_predictions()));

        assert!(session.queue.is_none());
        assert_eq!(session.status_message, "");
        let result = session.last_result.unwrap();
        assert_eq!(result.file_name, "doc.pdf");
        assert_eq!(result.predictions, invoice_predictions());
    }

    #[test]
    fn transport_failure_surfaces_raw_body_and_keeps_result() {
        let mut session = staged("doc.pdf");
        session.last_result = Some(ClassificationResult {
            file_name: "earlier.pdf".to_string(),
            predictions: invoice_predictions(),
        });
        let prior = session.last_result.clone();

        let (name, _) = session.begin_upload().unwrap();
        session.apply_outcome(
            &name,
            UploadOutcome::TransportFailed("server error".to_string()),
        );

        assert!(session.status_message.contains("server error"));
        assert_eq!(
            session.queue.as_ref().unwrap().status,
            UploadStatus::Failed
        );
        assert_eq!(session.last_result, prior);
    }

    #[test]
    fn bad_response_preserves_prior_result() {
        let mut session = staged("doc.pdf");
        session.last_result = Some(ClassificationResult {
            file_name: "earlier.pdf".to_string(),
            predictions: invoice_predictions(),
        });
        let prior = session.last_result.clone();

        let (name, _) = session.begin_upload().unwrap();
        session.apply_outcome(&name, UploadOutcome::BadResponse);

        assert_eq!(session.status_message, PARSE_FAILURE_MESSAGE);
        assert_eq!(session.last_result, prior);
        assert_eq!(
            session.queue.as_ref().unwrap().status,
            UploadStatus::Failed
        );
    }

    #[test]
    fn stale_failure_overwrites_message_but_not_newer_item() {
        let mut session = staged("first.pdf");
        let (name, _) = session.begin_upload().unwrap();

        // A new file arrives while the first request is still in flight.
        session.stage("second.pdf".to_string(), b"second".to_vec());

        session.apply_outcome(&name, UploadOutcome::TransportFailed("timeout".to_string()));

        assert!(session.status_message.contains("timeout"));
        let item = session.queue.as_ref().unwrap();
        assert_eq!(item.file_name, "second.pdf");
        assert_eq!(item.status, UploadStatus::Queued);
    }

    #[test]
    fn stale_success_keeps_newer_item_queued() {
        let mut session = staged("first.pdf");
        let (name, _) = session.begin_upload().unwrap();
        session.stage("second.pdf".to_string(), b"second".to_vec());

        session.apply_outcome(&name, UploadOutcome::Classified(invoice_predictions()));

        assert_eq!(
            session.last_result.as_ref().unwrap().file_name,
            "first.pdf"
        );
        assert!(session.has_pending_item());
        assert_eq!(session.staged_file_name().as_deref(), Some("second.pdf"));
    }

    #[test]
    fn parse_predictions_preserves_order_and_values() {
        let body = r#"{"predictions": [
            {"category": "invoice", "confidence": 0.92},
            {"category": "receipt", "confidence": 0.05},
            {"category": "contract", "confidence": 0.03}
        ]}"#;

        let predictions = parse_predictions(body).unwrap();
        assert_eq!(predictions.len(), 3);
        assert_eq!(predictions[0].category, "invoice");
        assert_eq!(predictions[1].category, "receipt");
        assert_eq!(predictions[2].category, "contract");
        assert_eq!(predictions[0].confidence, 0.92);
    }

    #[test]
    fn parse_predictions_rejects_malformed_json() {
        assert!(parse_predictions("not json").is_err());
    }

    #[test]
    fn parse_predictions_rejects_missing_field() {
        assert!(parse_predictions(r#"{"filename": "doc.pdf"}"#).is_err());
    }
}
