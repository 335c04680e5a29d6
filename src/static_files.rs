//! Static Asset Server: stored artifacts under `/storage` and, when built,
//! the front-end bundle under `/` and `/assets`.

use axum::{routing::get, Json, Router};
use serde_json::{json, Value};
use std::path::Path;
use tower_http::services::{ServeDir, ServeFile};
use tracing::{info, warn};

pub fn mount<S>(router: Router<S>, storage_dir: &Path, frontend_dist: &Path) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let router = router.nest_service("/storage", ServeDir::new(storage_dir));

    if frontend_dist.exists() {
        info!(dist = %frontend_dist.display(), "Serving front-end bundle");
        router
            .nest_service("/assets", ServeDir::new(frontend_dist.join("assets")))
            .route_service("/", ServeFile::new(frontend_dist.join("index.html")))
    } else {
        warn!(dist = %frontend_dist.display(), "Front-end bundle not found");
        router.route("/", get(frontend_missing))
    }
}

async fn frontend_missing() -> Json<Value> {
    Json(json!({
        "error": "Frontend not built. Run 'cd frontend && npm run build'"
    }))
}
