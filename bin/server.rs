// Workforce Insights - Web Server
// JSON API over the cohort pipeline, with memoized uploads

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use workforce_insights::{
    logging, Analysis, AnalysisCache, DashboardConfig, InsightReport, MergedRow, CONFIG_ENV_VAR,
};

#[derive(Parser)]
#[command(name = "insights-server", version, about = "Workforce insights JSON API")]
struct ServerArgs {
    /// Prior-year CSV served by /api/insights
    #[arg(long)]
    prior: Option<PathBuf>,

    /// Current-year CSV served by /api/insights
    #[arg(long)]
    current: Option<PathBuf>,

    #[arg(long, env = CONFIG_ENV_VAR)]
    config: Option<PathBuf>,

    #[arg(long, default_value = "0.0.0.0:3000")]
    addr: String,
}

/// Shared application state
#[derive(Clone)]
struct AppState {
    config: Arc<DashboardConfig>,
    /// Analysis of the files given at startup, if any
    preloaded: Option<Arc<Analysis>>,
    cache: Arc<Mutex<AnalysisCache>>,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Response {
        (
            StatusCode::OK,
            Json(Self {
                success: true,
                data: Some(data),
                error: None,
            }),
        )
            .into_response()
    }
}

fn api_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message.into()),
        }),
    )
        .into_response()
}

/// Merged row (simplified for API)
#[derive(Serialize, Deserialize)]
struct MergedRowResponse {
    employee_id: String,
    status: String,
    department: String,
    manager_prior: String,
    manager_current: Option<String>,
    manager_changed: Option<bool>,
    stagnant_prior: bool,
    stagnant_current: Option<bool>,
    high_dual_risk_prior: bool,
    high_dual_risk_current: Option<bool>,
    replacement_cost: f64,
}

impl From<&MergedRow> for MergedRowResponse {
    fn from(row: &MergedRow) -> Self {
        Self {
            employee_id: row.employee_id().to_string(),
            status: row.status.to_string(),
            department: row.prior.department.clone(),
            manager_prior: row.prior.manager.clone(),
            manager_current: row.current.as_ref().map(|c| c.manager.clone()),
            manager_changed: row.manager_changed(),
            stagnant_prior: row.prior.is_stagnant,
            stagnant_current: row.still_stagnant(),
            high_dual_risk_prior: row.prior.is_high_dual_risk,
            high_dual_risk_current: row.still_high_dual_risk(),
            replacement_cost: row.prior.replacement_cost,
        }
    }
}

#[derive(Deserialize)]
struct AnalyzeRequest {
    prior_csv: String,
    current_csv: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> Response {
    ApiResponse::ok("OK")
}

fn preloaded(state: &AppState) -> Result<&Arc<Analysis>, Response> {
    state.preloaded.as_ref().ok_or_else(|| {
        api_error(
            StatusCode::NOT_FOUND,
            "No CSV files loaded at startup; use POST /api/analyze",
        )
    })
}

/// GET /api/insights - Report for the startup files
async fn get_insights(State(state): State<AppState>) -> Response {
    match preloaded(&state) {
        Ok(analysis) => ApiResponse::ok(InsightReport::build(analysis, &state.config)),
        Err(response) => response,
    }
}

/// GET /api/merged - Merged rows for the startup files
async fn get_merged(State(state): State<AppState>) -> Response {
    match preloaded(&state) {
        Ok(analysis) => {
            let rows: Vec<MergedRowResponse> = analysis.merged.iter().map(Into::into).collect();
            ApiResponse::ok(rows)
        }
        Err(response) => response,
    }
}

/// GET /api/departments/:name - Merged rows of one prior-year department
async fn get_department(State(state): State<AppState>, Path(department): Path<String>) -> Response {
    let analysis = match preloaded(&state) {
        Ok(analysis) => analysis,
        Err(response) => return response,
    };

    // Path already percent-decodes the segment
    let rows: Vec<MergedRowResponse> = analysis
        .merged
        .iter()
        .filter(|row| row.prior.department == department)
        .map(Into::into)
        .collect();

    ApiResponse::ok(rows)
}

/// POST /api/analyze - Analyze uploaded CSV text, memoized by content
async fn analyze(State(state): State<AppState>, Json(request): Json<AnalyzeRequest>) -> Response {
    let result = match state.cache.lock() {
        Ok(mut cache) => cache.get_or_analyze(
            request.prior_csv.as_bytes(),
            request.current_csv.as_bytes(),
            &state.config,
        ),
        Err(_) => {
            tracing::error!("analysis cache lock poisoned");
            return api_error(StatusCode::INTERNAL_SERVER_ERROR, "cache unavailable");
        }
    };

    match result {
        Ok(analysis) => ApiResponse::ok(InsightReport::build(&analysis, &state.config)),
        Err(e) => {
            tracing::warn!(error = %e, "rejected upload");
            api_error(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
    }
}

/// GET / - Serve index.html
async fn serve_index() -> impl IntoResponse {
    Html(include_str!("../web/index.html"))
}

fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/insights", get(get_insights))
        .route("/merged", get(get_merged))
        .route("/departments/:name", get(get_department))
        .route("/analyze", post(analyze))
        .with_state(state);

    Router::new()
        .route("/", get(serve_index))
        .nest("/api", api_routes)
        .layer(CorsLayer::permissive())
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init_logging();
    let args = ServerArgs::parse();

    println!("🌐 Workforce Insights - Web Server");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");

    let config = DashboardConfig::resolve(args.config.as_deref())?;

    let preloaded = match (&args.prior, &args.current) {
        (Some(prior), Some(current)) => {
            let analysis = Analysis::from_paths(prior, current, &config)?;
            println!(
                "✓ Loaded {} + {} records ({} merged)",
                analysis.prior.len(),
                analysis.current.len(),
                analysis.merged.len()
            );
            Some(Arc::new(analysis))
        }
        (None, None) => {
            println!("ℹ️  No startup files; uploads only (POST /api/analyze)");
            None
        }
        _ => anyhow::bail!("--prior and --current must be given together"),
    };

    let state = AppState {
        config: Arc::new(config),
        preloaded,
        cache: Arc::new(Mutex::new(AnalysisCache::default())),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&args.addr).await?;
    tracing::info!(addr = %args.addr, "server listening");

    println!("\n🚀 Server running on http://{}", args.addr);
    println!("   API: http://{}/api/insights", args.addr);
    println!("\n   Press Ctrl+C to stop\n");

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    const PRIOR: &str = "Team member ID,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department,Manager\n\
                         1,>4,STARTER1,KEY,HIGH,R&D Lab,Alice\n\
                         2,1-2,LEAD,SOLID,LOW,Ops,Bob\n";
    const CURRENT: &str = "Team member ID,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department,Manager\n\
                           2,1-2,LEAD,SOLID,LOW,Ops,Carol\n";

    fn state(preload: bool) -> AppState {
        let config = DashboardConfig::default();
        let preloaded = preload.then(|| {
            Arc::new(Analysis::from_csv_bytes(PRIOR.as_bytes(), CURRENT.as_bytes(), &config).unwrap())
        });
        AppState {
            config: Arc::new(config),
            preloaded,
            cache: Arc::new(Mutex::new(AnalysisCache::new(4))),
        }
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(build_router(state(false)), get("/api/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "OK");
    }

    #[tokio::test]
    async fn test_insights_without_startup_files() {
        let (status, body) = call(build_router(state(false)), get("/api/insights")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_insights_with_startup_files() {
        let (status, body) = call(build_router(state(true)), get("/api/insights")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["kpis"]["headcount"], 2);
        assert_eq!(body["data"]["kpis"]["turnover_count"], 1);
    }

    #[tokio::test]
    async fn test_merged_rows() {
        let (status, body) = call(build_router(state(true)), get("/api/merged")).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["status"], "Left");
        assert_eq!(rows[1]["manager_changed"], true);
    }

    #[tokio::test]
    async fn test_department_name_is_decoded() {
        let (status, body) =
            call(build_router(state(true)), get("/api/departments/R%26D%20Lab")).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["employee_id"], "1");
    }

    #[tokio::test]
    async fn test_department_name_with_literal_percent() {
        let prior = "Team member ID,Time in Role (Range),Competence,Talent & Potential,Attrition Risk,Department\n\
                     1,>4,STARTER1,KEY,HIGH,A%20B\n\
                     2,>4,STARTER1,KEY,HIGH,A B\n";
        let config = DashboardConfig::default();
        let analysis = Analysis::from_csv_bytes(prior.as_bytes(), prior.as_bytes(), &config).unwrap();
        let state = AppState {
            config: Arc::new(config),
            preloaded: Some(Arc::new(analysis)),
            cache: Arc::new(Mutex::new(AnalysisCache::new(1))),
        };

        let (status, body) = call(build_router(state), get("/api/departments/A%2520B")).await;
        assert_eq!(status, StatusCode::OK);

        let rows = body["data"].as_array().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["employee_id"], "1");
    }

    #[tokio::test]
    async fn test_analyze_upload() {
        let payload = serde_json::json!({ "prior_csv": PRIOR, "current_csv": CURRENT });
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = call(build_router(state(false)), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["risk_mitigation"]["left"], 1);
    }

    #[tokio::test]
    async fn test_analyze_rejects_duplicate_current_ids() {
        let current = format!("{}2,1-2,LEAD,SOLID,LOW,Ops,Dan\n", CURRENT);
        let payload = serde_json::json!({ "prior_csv": PRIOR, "current_csv": current });
        let request = Request::builder()
            .method("POST")
            .uri("/api/analyze")
            .header("content-type", "application/json")
            .body(Body::from(payload.to_string()))
            .unwrap();

        let (status, body) = call(build_router(state(false)), request).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body["error"].as_str().unwrap().contains("duplicate employee id '2'"));
    }
}
