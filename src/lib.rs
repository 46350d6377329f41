mod history;
mod settings;
mod upload;

use std::sync::Arc;

use history::fetch_documents;
use settings::{ServiceSettings, SettingsStore};
use tauri::{Emitter, Manager, State};
use upload::{
    commands::{get_upload_snapshot, stage_document, submit_upload},
    UploadController,
};

pub(crate) struct AppState {
    pub(crate) upload: UploadController,
    pub(crate) settings: Arc<SettingsStore>,
}

#[tauri::command]
fn get_service_settings(state: State<AppState>) -> Result<ServiceSettings, String> {
    Ok(state.settings.service())
}

#[tauri::command]
fn set_service_settings(
    settings: ServiceSettings,
    state: State<AppState>,
    app_handle: tauri::AppHandle,
) -> Result<(), String> {
    state
        .settings
        .update_service(settings.clone())
        .map_err(|e| e.to_string())?;

    app_handle
        .emit("service-settings-updated", &settings)
        .map_err(|e| e.to_string())?;

    Ok(())
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    log::info!("DocSift starting up...");

    tauri::Builder::default()
        .plugin(tauri_plugin_opener::init())
        .setup(|app| {
            let result = (|| -> anyhow::Result<()> {
                let app_data_dir = app
                    .path()
                    .app_data_dir()
                    .map_err(|err| anyhow::anyhow!(err))?;
                std::fs::create_dir_all(&app_data_dir)?;

                let settings_path = app_data_dir.join("settings.json");
                let settings_store = Arc::new(SettingsStore::new(settings_path)?);

                let upload_controller =
                    UploadController::new(app.handle().clone(), settings_store.clone());

                app.manage(AppState {
                    upload: upload_controller,
                    settings: settings_store,
                });

                Ok(())
            })();

            result.map_err(|err| err.into())
        })
        .invoke_handler(tauri::generate_handler![
            get_upload_snapshot,
            stage_document,
            submit_upload,
            fetch_documents,
            get_service_settings,
            set_service_settings,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
