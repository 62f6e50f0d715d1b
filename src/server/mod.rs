//! Web server exposing the reconciliation pipeline.
//!
//! One POST endpoint accepts the ledger sheet and the PDF batch (directly or
//! as a ZIP bundle), runs the pipeline, and returns the summary with bounded
//! previews plus a report id. The rendered report is then downloadable in
//! CSV or JSON form for the lifetime of the process.

mod handlers;
mod routes;

pub use routes::create_router;

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::config::Settings;
use crate::error::ReconError;
use crate::pipeline::Pipeline;
use crate::recon::ReconReport;

/// Reports held for download. Older entries are evicted past this bound.
const MAX_STORED_REPORTS: usize = 32;

/// A finished run waiting to be downloaded.
#[derive(Debug, Clone)]
pub struct StoredReport {
    pub report: ReconReport,
    pub created_at: DateTime<Utc>,
}

/// Shared state for the web server.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub pipeline: Arc<Pipeline>,
    pub reports: Arc<RwLock<HashMap<String, StoredReport>>>,
}

impl AppState {
    pub fn new(settings: Arc<Settings>) -> Result<Self, ReconError> {
        let pipeline = Arc::new(Pipeline::new(Arc::clone(&settings))?);
        Ok(Self::with_pipeline(settings, pipeline))
    }

    /// Build state around an already-built pipeline.
    pub fn with_pipeline(settings: Arc<Settings>, pipeline: Arc<Pipeline>) -> Self {
        Self {
            settings,
            pipeline,
            reports: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a report under a fresh id, evicting the oldest entry when the
    /// store is full.
    pub async fn store_report(&self, report: ReconReport) -> String {
        let id = uuid::Uuid::new_v4().to_string();
        let mut reports = self.reports.write().await;
        if reports.len() >= MAX_STORED_REPORTS {
            let oldest = reports
                .iter()
                .min_by_key(|(_, stored)| stored.created_at)
                .map(|(id, _)| id.clone());
            if let Some(oldest) = oldest {
                reports.remove(&oldest);
            }
        }
        reports.insert(
            id.clone(),
            StoredReport {
                report,
                created_at: Utc::now(),
            },
        );
        id
    }
}

/// Start the web server.
pub async fn serve(settings: Arc<Settings>, host: &str, port: u16) -> anyhow::Result<()> {
    let state = AppState::new(settings)?;
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    tracing::info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
