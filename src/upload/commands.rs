use tauri::State;

use crate::AppState;

use super::{UploadController, UploadSnapshot};

fn controller_from_state(state: &State<'_, AppState>) -> UploadController {
    state.upload.clone()
}

#[tauri::command]
pub async fn get_upload_snapshot(state: State<'_, AppState>) -> Result<UploadSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.get_snapshot().await)
}

#[tauri::command]
pub async fn stage_document(
    state: State<'_, AppState>,
    file_name: String,
    contents: Vec<u8>,
) -> Result<UploadSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.stage_document(file_name, contents).await)
}

#[tauri::command]
pub async fn submit_upload(state: State<'_, AppState>) -> Result<UploadSnapshot, String> {
    let controller = controller_from_state(&state);
    Ok(controller.submit().await)
}
