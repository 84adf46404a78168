use crate::allocator;
use crate::data::{AllocationOutput, AllocationReport, Class, Room, Subject, Teacher, Timetable};
use crate::error::{AllocationError, IngestError, StoreError};
use crate::ingest::{self, UploadBundle};
use crate::store::TimetableStore;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::{error, info};
use serde::Serialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;

/// The store behind a mutex: every replace and allocation run holds it for
/// its whole read-plan-commit cycle.
pub type SharedStore = Arc<Mutex<TimetableStore>>;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::Allocation(AllocationError::Invalid(_))
            | ApiError::Store(StoreError::Validation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR")
            }
            ApiError::Allocation(_) | ApiError::Store(StoreError::Allocation(_)) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "DATA_INTEGRITY")
            }
            ApiError::Ingest(_) => (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_UPLOAD"),
            ApiError::Store(e) => {
                error!("Store failure: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            ApiError::Task(e) => {
                error!("Store task failed: {e}");
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
        });
        (status, Json(body)).into_response()
    }
}

/// Row counts of the snapshot now held by the store.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TimetableSummary {
    classes: usize,
    rooms: usize,
    teachers: usize,
    subjects: usize,
    entries: usize,
    floating_unallocated: usize,
}

impl From<&Timetable> for TimetableSummary {
    fn from(timetable: &Timetable) -> Self {
        Self {
            classes: timetable.classes.len(),
            rooms: timetable.rooms.len(),
            teachers: timetable.teachers.len(),
            subjects: timetable.subjects.len(),
            entries: timetable.entries.len(),
            floating_unallocated: timetable.entries.iter().filter(|e| e.needs_room()).count(),
        }
    }
}

#[derive(Debug, Serialize)]
struct SubjectsView {
    subjects: Vec<Subject>,
    teachers: Vec<Teacher>,
}

async fn allocate_handler(
    Json(timetable): Json<Timetable>,
) -> Result<Json<AllocationOutput>, ApiError> {
    Ok(Json(allocator::allocate(timetable)?))
}

// The lock moves into the blocking task, so file writes stay off the
// runtime workers and no other writer gets in until the commit is done.
async fn replace_store(
    store: SharedStore,
    timetable: Timetable,
) -> Result<TimetableSummary, ApiError> {
    let mut store = store.lock_owned().await;
    let summary = tokio::task::spawn_blocking(move || {
        store.replace(timetable)?;
        Ok::<_, StoreError>(TimetableSummary::from(store.timetable()))
    })
    .await??;
    Ok(summary)
}

async fn upload_handler(
    State(store): State<SharedStore>,
    Json(bundle): Json<UploadBundle>,
) -> Result<Json<TimetableSummary>, ApiError> {
    let timetable = ingest::ingest(&bundle)?;
    Ok(Json(replace_store(store, timetable).await?))
}

async fn replace_handler(
    State(store): State<SharedStore>,
    Json(timetable): Json<Timetable>,
) -> Result<Json<TimetableSummary>, ApiError> {
    Ok(Json(replace_store(store, timetable).await?))
}

async fn store_allocate_handler(
    State(store): State<SharedStore>,
) -> Result<Json<AllocationReport>, ApiError> {
    let mut store = store.lock_owned().await;
    let report = tokio::task::spawn_blocking(move || store.run_allocation()).await??;
    Ok(Json(report))
}

async fn timetable_handler(State(store): State<SharedStore>) -> Json<Timetable> {
    Json(store.lock().await.timetable().clone())
}

async fn classes_handler(State(store): State<SharedStore>) -> Json<Vec<Class>> {
    Json(store.lock().await.timetable().classes.clone())
}

async fn rooms_handler(State(store): State<SharedStore>) -> Json<Vec<Room>> {
    Json(store.lock().await.timetable().rooms.clone())
}

async fn subjects_handler(State(store): State<SharedStore>) -> Json<SubjectsView> {
    let store = store.lock().await;
    let timetable = store.timetable();
    Json(SubjectsView {
        subjects: timetable.subjects.clone(),
        teachers: timetable.teachers.clone(),
    })
}

pub fn router(store: SharedStore) -> Router {
    Router::new()
        .route("/v1/rooms/allocate", post(allocate_handler))
        .route("/v1/timetable", get(timetable_handler).put(replace_handler))
        .route("/v1/timetable/upload", post(upload_handler))
        .route("/v1/timetable/allocate", post(store_allocate_handler))
        .route("/v1/classes", get(classes_handler))
        .route("/v1/rooms", get(rooms_handler))
        .route("/v1/subjects", get(subjects_handler))
        .with_state(store)
}

pub async fn run_server(addr: SocketAddr, store: TimetableStore) -> std::io::Result<()> {
    let app = router(Arc::new(Mutex::new(store)));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{}", listener.local_addr()?);

    axum::serve(listener, app).await
}
