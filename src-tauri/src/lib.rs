use std::sync::{Arc, Mutex};

use serde::Serialize;
use tauri::{path::BaseDirectory, Manager};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use dwhelper_core::{
    settings, Answer, AssetCache, FileStore, IdentifierField, KeyValueStore, Loader, MemoryStore,
    SymptomRecord,
};
use dwhelper_engine::{AdviceReport, LoadErrorLabels, Session, SessionView, LOAD_ERROR_LABELS};

type Store = Box<dyn KeyValueStore + Send>;

/// Managed state: the session exists once the knowledge base has loaded.
struct AppState(Mutex<Option<Session<Store>>>);

/// What the page gets back when the knowledge base cannot be loaded.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct LoadFailure {
    message: String,
    labels: LoadErrorLabels,
}

impl LoadFailure {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            labels: LOAD_ERROR_LABELS,
        }
    }
}

fn open_store() -> Store {
    match FileStore::open_default() {
        Ok(store) => {
            info!(path = %store.path().display(), "answers persist to state file");
            Box::new(store)
        }
        Err(e) => {
            warn!(error = %e, "durable store unavailable, answers will not persist");
            Box::new(MemoryStore::default())
        }
    }
}

fn with_session<T>(
    state: &tauri::State<'_, AppState>,
    f: impl FnOnce(&mut Session<Store>) -> T,
) -> Result<T, String> {
    let mut guard = state.0.lock().map_err(|e| e.to_string())?;
    let session = guard
        .as_mut()
        .ok_or_else(|| "knowledge base not loaded".to_string())?;
    Ok(f(session))
}

/// Load the knowledge base and open the session. Runs once; later calls
/// return the existing session's view.
#[tauri::command]
async fn load_knowledge_base(
    app: tauri::AppHandle,
    state: tauri::State<'_, AppState>,
) -> Result<SessionView, LoadFailure> {
    if let Ok(view) = with_session(&state, |s| s.view()) {
        return Ok(view);
    }

    let bundled = app
        .path()
        .resolve("app_data.json", BaseDirectory::Resource)
        .map_err(|e| LoadFailure::new(e.to_string()))?;
    let settings = settings::read_settings();
    let mut loader = Loader::new(settings.knowledge_source(bundled));
    if settings.offline_cache {
        loader = loader.with_cache(AssetCache::in_data_dir());
    }

    let kb = loader
        .load()
        .await
        .map_err(|e| LoadFailure::new(e.to_string()))?;

    let session = Session::open(Arc::new(kb), open_store());
    let mut guard = state.0.lock().map_err(|e| LoadFailure::new(e.to_string()))?;
    Ok(adopt_session(&mut guard, session))
}

/// Install `session` unless a concurrent load already did, and return the
/// view of whichever session is kept.
fn adopt_session<S: KeyValueStore>(slot: &mut Option<Session<S>>, session: Session<S>) -> SessionView {
    slot.get_or_insert(session).view()
}

#[tauri::command]
fn session_view(state: tauri::State<'_, AppState>) -> Result<SessionView, String> {
    with_session(&state, |s| s.view())
}

#[tauri::command]
fn set_answer(
    key: String,
    answer: Answer,
    state: tauri::State<'_, AppState>,
) -> Result<AdviceReport, String> {
    with_session(&state, |s| s.set_answer(&key, answer))
}

#[tauri::command]
fn select_symptom(
    name: Option<String>,
    state: tauri::State<'_, AppState>,
) -> Result<Option<SymptomRecord>, String> {
    with_session(&state, |s| s.select_symptom(name.as_deref()))
}

#[tauri::command]
fn set_identifier(
    field: IdentifierField,
    value: String,
    state: tauri::State<'_, AppState>,
) -> Result<String, String> {
    with_session(&state, |s| s.set_identifier(field, &value))
}

#[tauri::command]
fn summary(state: tauri::State<'_, AppState>) -> Result<String, String> {
    with_session(&state, |s| s.summary())
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("DWHELPER_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_logging();
    info!(data_dir = %dwhelper_core::data_dir().display(), "starting Dishwasher Helper");

    tauri::Builder::default()
        .manage(AppState(Mutex::new(None)))
        .invoke_handler(tauri::generate_handler![
            load_knowledge_base,
            session_view,
            set_answer,
            select_symptom,
            set_identifier,
            summary,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
