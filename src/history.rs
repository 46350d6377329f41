use anyhow::{anyhow, Result};
use log::info;
use serde::{Deserialize, Deserializer, Serialize};
use tauri::State;

use crate::AppState;

/// One previously classified document, as returned by the history endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentRecord {
    pub filename: String,
    pub category: String,
    #[serde(deserialize_with = "confidence_value")]
    pub confidence: f64,
    pub upload_time: String,
}

/// The service stores confidence as text and returns it unconverted, so the
/// field arrives as either a number or a stringified number.
fn confidence_value<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrText {
        Number(f64),
        Text(String),
    }

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

fn parse_documents(body: &str) -> Result<Vec<DocumentRecord>> {
    serde_json::from_str(body).map_err(|e| anyhow!("unexpected history body: {}", e))
}

/// The service returns oldest-first; the view wants most-recent-first.
fn most_recent_first(mut records: Vec<DocumentRecord>) -> Vec<DocumentRecord> {
    records.reverse();
    records
}

async fn fetch(state: &State<'_, AppState>) -> Result<Vec<DocumentRecord>> {
    let url = state.settings.service().documents_url;
    let body = reqwest::get(&url).await?.error_for_status()?.text().await?;
    let records = most_recent_first(parse_documents(&body)?);
    info!("Fetched {} classified documents", records.len());
    Ok(records)
}

#[tauri::command]
pub async fn fetch_documents(state: State<'_, AppState>) -> Result<Vec<DocumentRecord>, String> {
    fetch(&state).await.map_err(|e| e.to_string())
}
