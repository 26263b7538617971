use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use quiz_mastery::config::Config;
use quiz_mastery::logging::init_tracing;
use quiz_mastery::mastery::{PracticeRecommendation, RecentSession, TopicProficiency, WeakArea};
use quiz_mastery::{JsonFileStore, MasteryEngine};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Report {
    weak_areas: Vec<WeakArea>,
    recommendations: Vec<PracticeRecommendation>,
}

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = Config::from_env();
    let _log_guard = init_tracing(&config.log_level);

    let Some(records_path) = config.records_path.as_deref() else {
        tracing::error!("MASTERY_RECORDS_PATH is not set");
        return ExitCode::FAILURE;
    };

    let records: Vec<TopicProficiency> = match read_json(records_path) {
        Ok(records) => records,
        Err(e) => {
            tracing::error!(path = %records_path.display(), error = %e, "failed to read topic records");
            return ExitCode::FAILURE;
        }
    };

    let sessions: Vec<RecentSession> = match config.sessions_path.as_deref() {
        Some(path) => read_json(path).unwrap_or_else(|e| {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable sessions file");
            Vec::new()
        }),
        None => Vec::new(),
    };

    let engine = MasteryEngine::new(Arc::new(JsonFileStore::new(&config.store_path)));
    tracing::info!(
        topics = records.len(),
        sessions = sessions.len(),
        config_version = %engine.config().version,
        "building mastery report"
    );

    let report = Report {
        weak_areas: engine.weak_areas(&records),
        recommendations: engine.recommendations(&records, &sessions),
    };

    match serde_json::to_string_pretty(&report) {
        Ok(body) => {
            println!("{body}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to encode report");
            ExitCode::FAILURE
        }
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    serde_json::from_str(&raw).map_err(|e| e.to_string())
}
