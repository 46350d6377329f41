use std::sync::Arc;

use log::{error, info, warn};
use serde::Serialize;
use tauri::{AppHandle, Emitter};
use tokio::sync::Mutex;

use crate::settings::SettingsStore;

use super::state::{parse_predictions, ClassificationResult, SessionState, UploadOutcome};

#[derive(Debug, Serialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UploadSnapshot {
    pub status_message: String,
    pub has_pending_item: bool,
    pub staged_file_name: Option<String>,
    pub last_result: Option<ClassificationResult>,
}

#[derive(Serialize, Clone)]
struct StatusChangedEvent {
    message: String,
}

#[derive(Serialize, Clone)]
#[serde(rename_all = "camelCase")]
struct QueueChangedEvent {
    has_pending_item: bool,
}

/// Drives the single-item upload session: staging, submission, and
/// interpretation of the service response. All session mutation goes through
/// one mutex, so each transition runs to completion before the next event
/// is processed.
#[derive(Clone)]
pub struct UploadController {
    state: Arc<Mutex<SessionState>>,
    client: reqwest::Client,
    app_handle: AppHandle,
    settings: Arc<SettingsStore>,
}

impl UploadController {
    pub fn new(app_handle: AppHandle, settings: Arc<SettingsStore>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::new())),
            client: reqwest::Client::new(),
            app_handle,
            settings,
        }
    }

    pub async fn get_snapshot(&self) -> UploadSnapshot {
        let guard = self.state.lock().await;
        snapshot_of(&guard)
    }

    /// Stage a file for classification, evicting any file already staged.
    pub async fn stage_document(&self, file_name: String, contents: Vec<u8>) -> UploadSnapshot {
        let snapshot = {
            let mut guard = self.state.lock().await;
            guard.stage(file_name, contents);
            snapshot_of(&guard)
        };

        info!(
            "Staged {} for upload",
            snapshot.staged_file_name.as_deref().unwrap_or("<unnamed>")
        );
        self.emit_session(&snapshot);
        snapshot
    }

    /// Submit the staged file. Returns as soon as the request is in flight;
    /// the outcome is applied by a spawned task and delivered through
    /// events. Submitting with nothing staged is benign and does nothing.
    pub async fn submit(&self) -> UploadSnapshot {
        let (payload, snapshot) = {
            let mut guard = self.state.lock().await;
            let payload = guard.begin_upload();
            (payload, snapshot_of(&guard))
        };

        let Some((file_name, contents)) = payload else {
            return snapshot;
        };

        self.emit_session(&snapshot);
        info!("Uploading {} ({} bytes)", file_name, contents.len());

        let controller = self.clone();
        tauri::async_runtime::spawn(async move {
            let outcome = controller.perform_upload(&file_name, contents).await;
            controller.finish_upload(&file_name, outcome).await;
        });

        snapshot
    }

    async fn perform_upload(&self, file_name: &str, contents: Vec<u8>) -> UploadOutcome {
        let url = self.settings.service().upload_url;
        let part = reqwest::multipart::Part::bytes(contents).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = match self.client.post(&url).multipart(form).send().await {
            Ok(response) => response,
            Err(e) => return UploadOutcome::TransportFailed(e.to_string()),
        };

        let status = response.status();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return UploadOutcome::TransportFailed(e.to_string()),
        };

        if !status.is_success() {
            return UploadOutcome::TransportFailed(body);
        }

        match parse_predictions(&body) {
            Ok(predictions) => UploadOutcome::Classified(predictions),
            Err(e) => {
                error!("Error parsing response for {}: {}", file_name, e);
                UploadOutcome::BadResponse
            }
        }
    }

    async fn finish_upload(&self, file_name: &str, outcome: UploadOutcome) {
        let classified = matches!(outcome, UploadOutcome::Classified(_));
        match &outcome {
            UploadOutcome::Classified(predictions) => {
                info!(
                    "{} classified as {}",
                    file_name,
                    predictions
                        .first()
                        .map(|p| p.category.as_str())
                        .unwrap_or("<no category>")
                );
            }
            UploadOutcome::BadResponse => {
                warn!("Upload of {} completed with an uninterpretable body", file_name);
            }
            UploadOutcome::TransportFailed(detail) => {
                error!("Upload of {} failed: {}", file_name, detail);
            }
        }

        let (snapshot, result) = {
            let mut guard = self.state.lock().await;
            guard.apply_outcome(file_name, outcome);
            (snapshot_of(&guard), guard.last_result.clone())
        };

        if classified {
            if let Some(result) = result {
                let _ = self.app_handle.emit("classification-ready", result);
            }
        }
        self.emit_session(&snapshot);
    }

    fn emit_session(&self, snapshot: &UploadSnapshot) {
        let _ = self.app_handle.emit(
            "upload-status-changed",
            StatusChangedEvent {
                message: snapshot.status_message.clone(),
            },
        );
        let _ = self.app_handle.emit(
            "upload-queue-changed",
            QueueChangedEvent {
                has_pending_item: snapshot.has_pending_item,
            },
        );
    }
}

fn snapshot_of(state: &SessionState) -> UploadSnapshot {
    UploadSnapshot {
        status_message: state.status_message.clone(),
        has_pending_item: state.has_pending_item(),
        staged_file_name: state.staged_file_name(),
        last_result: state.last_result.clone(),
    }
}
