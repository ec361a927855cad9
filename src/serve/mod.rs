use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::{reject::Rejection, reply::Reply, Filter};

use crate::error::DashboardError;
use crate::ingest;
use crate::merge::{self, COMPANY_A, COMPANY_B};
use crate::report::{self, DashboardView, Metric};
use crate::standardize;

const INDEX_HTML: &str = include_str!("index.html");

/// Uploads arrive as the raw CSV text of both files; the page reads the
/// chosen files client-side and posts them in one request, so the upload
/// pair only ever lives inside that request.
#[derive(Debug, Deserialize)]
pub struct DashboardRequest {
    pub company_a_csv: String,
    pub company_b_csv: String,
    #[serde(default)]
    pub metric: Option<Metric>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    details: Option<String>,
}

/// Run the whole pipeline for one upload pair: ingest both files,
/// standardize each independently, label, combine, and report.
pub fn build_dashboard(req: &DashboardRequest) -> Result<DashboardView, DashboardError> {
    let raw_a = ingest::read_csv(COMPANY_A, req.company_a_csv.as_bytes())?;
    let raw_b = ingest::read_csv(COMPANY_B, req.company_b_csv.as_bytes())?;

    let table_a = standardize::standardize(&raw_a)?;
    let table_b = standardize::standardize(&raw_b)?;

    let labeled_a = merge::label(table_a, COMPANY_A)?;
    let labeled_b = merge::label(table_b, COMPANY_B)?;
    let combined = merge::combine(labeled_a, labeled_b)?;

    report::dashboard(&combined, req.metric.unwrap_or_default())
}

async fn dashboard_route(req: DashboardRequest) -> Result<impl Reply, Rejection> {
    match build_dashboard(&req) {
        Ok(view) => {
            info!(rows = view.rows, "dashboard rendered");
            Ok(warp::reply::with_status(
                warp::reply::json(&view),
                StatusCode::OK,
            ))
        }
        Err(err @ DashboardError::LoadFailure { .. }) => {
            warn!("load failure: {}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorResponse {
                    error: "Error loading files".to_string(),
                    details: Some(err.to_string()),
                }),
                StatusCode::BAD_REQUEST,
            ))
        }
        Err(err) => {
            warn!("dashboard failed: {:?}", err);
            Ok(warp::reply::with_status(
                warp::reply::json(&ErrorResponse {
                    error: "Internal error".to_string(),
                    details: Some(err.to_string()),
                }),
                StatusCode::INTERNAL_SERVER_ERROR,
            ))
        }
    }
}

async fn health_check() -> Result<impl Reply, Rejection> {
    Ok(warp::reply::json(&serde_json::json!({
        "status": "healthy",
        "service": "company-performance-dashboard"
    })))
}

/// All routes: the dashboard page, its JSON API, and a health check.
pub fn routes() -> impl Filter<Extract = impl Reply, Error = Rejection> + Clone {
    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(INDEX_HTML));

    let health = warp::path("health").and(warp::get()).and_then(health_check);

    let dashboard = warp::path!("api" / "dashboard")
        .and(warp::post())
        .and(warp::body::json())
        .and_then(dashboard_route);

    index.or(health).or(dashboard)
}
