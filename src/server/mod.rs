use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::{delete, get},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::db::models::{BoxScore, Metric, Projection, ResultRow, Sport};
use crate::db::Database;
use crate::eval;
use crate::export::results_to_csv;
use crate::providers::BoxScoreProvider;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub providers: HashMap<Sport, Arc<dyn BoxScoreProvider>>,
}

/// Build the Axum router for the dashboard and JSON API.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route(
            "/api/projections",
            get(list_projections_handler)
                .post(add_projection_handler)
                .delete(clear_projections_handler),
        )
        .route("/api/projections/:id", delete(remove_projection_handler))
        .route("/api/results", get(results_handler))
        .route("/api/results.csv", get(results_csv_handler))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

type ApiError = (StatusCode, String);

fn internal(e: anyhow::Error) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}

async fn index_handler() -> impl IntoResponse {
    Html(DASHBOARD_HTML)
}

#[derive(Debug, Deserialize)]
struct SessionQuery {
    session: String,
    sport: Option<Sport>,
}

/// GET /api/projections?session=..&sport=..
async fn list_projections_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<SessionQuery>,
) -> Result<Json<Vec<Projection>>, ApiError> {
    state
        .db
        .list_projections(&q.session, q.sport)
        .map(Json)
        .map_err(internal)
}

#[derive(Debug, Deserialize)]
struct AddProjectionRequest {
    session_id: String,
    sport: Sport,
    player: String,
    metric: Metric,
    target: f64,
}

/// POST /api/projections
async fn add_projection_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddProjectionRequest>,
) -> Result<(StatusCode, Json<Projection>), ApiError> {
    if req.player.trim().is_empty() {
        return Err(bad_request("player name must not be empty"));
    }
    if req.metric.sport() != req.sport {
        return Err(bad_request(format!(
            "metric '{}' does not belong to sport '{}'",
            req.metric, req.sport
        )));
    }

    let mut projection = Projection {
        id: None,
        session_id: req.session_id,
        sport: req.sport,
        player: req.player.trim().to_string(),
        metric: req.metric,
        target: req.target,
        created_at: chrono::Utc::now(),
    };
    let id = state.db.add_projection(&projection).map_err(internal)?;
    projection.id = Some(id);
    Ok((StatusCode::CREATED, Json(projection)))
}

#[derive(Debug, Deserialize)]
struct RemoveQuery {
    session: String,
}

/// DELETE /api/projections/:id?session=..
async fn remove_projection_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Query(q): Query<RemoveQuery>,
) -> Result<StatusCode, ApiError> {
    let removed = state
        .db
        .remove_projection(id, &q.session)
        .map_err(internal)?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, format!("no projection {id} in session")))
    }
}

/// DELETE /api/projections?session=..
async fn clear_projections_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<RemoveQuery>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let removed = state.db.clear_projections(&q.session).map_err(internal)?;
    Ok(Json(serde_json::json!({ "removed": removed })))
}

#[derive(Debug, Deserialize)]
struct ResultsQuery {
    session: String,
    sport: Sport,
    date: String,
}

/// Fetch box scores fresh and evaluate the session's projections. Every call
/// re-fetches so live games reflect updated stats; nothing is cached.
async fn evaluate_session(
    state: &AppState,
    q: &ResultsQuery,
) -> Result<Vec<ResultRow>, ApiError> {
    let date = NaiveDate::from_str(&q.date)
        .map_err(|_| bad_request(format!("bad date '{}', expected YYYY-MM-DD", q.date)))?;

    let provider = state
        .providers
        .get(&q.sport)
        .ok_or_else(|| bad_request(format!("no provider configured for {}", q.sport)))?;

    let projections = state
        .db
        .list_projections(&q.session, Some(q.sport))
        .map_err(internal)?;

    // Provider unavailability is "no data", not a failed request: every
    // projection still comes back, as not-found.
    let box_scores: Vec<BoxScore> = match provider.fetch_box_scores(date).await {
        Ok(scores) => scores,
        Err(e) => {
            warn!("Provider '{}' failed for {}: {}", provider.name(), date, e);
            Vec::new()
        }
    };
    info!(
        "Evaluating {} projection(s) against {} box score(s) from {} for {}",
        projections.len(),
        box_scores.len(),
        provider.name(),
        date
    );

    Ok(eval::evaluate(&projections, &box_scores, provider.eval_config()))
}

/// GET /api/results?session=..&sport=..&date=YYYY-MM-DD
async fn results_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ResultsQuery>,
) -> Result<Json<Vec<ResultRow>>, ApiError> {
    evaluate_session(&state, &q).await.map(Json)
}

/// GET /api/results.csv?session=..&sport=..&date=YYYY-MM-DD
async fn results_csv_handler(
    State(state): State<Arc<AppState>>,
    Query(q): Query<ResultsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = evaluate_session(&state, &q).await?;
    let csv = results_to_csv(&rows);
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"results.csv\"",
            ),
        ],
        csv,
    ))
}

/// Embedded single-file dashboard (HTML + CSS + JS)
const DASHBOARD_HTML: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>Propcheck</title>
<style>
  :root {
    --bg: #0f1117;
    --card: #1a1d27;
    --border: #2a2d3a;
    --accent: #6c63ff;
    --green: #00c896;
    --red: #ff4f6a;
    --text: #e0e0e0;
    --muted: #8888aa;
  }
  * { box-sizing: border-box; margin: 0; padding: 0; }
  body { background: var(--bg); color: var(--text); font-family: 'Segoe UI', system-ui, sans-serif; }
  header { display: flex; align-items: center; gap: 1rem; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
  header h1 { font-size: 1.4rem; font-weight: 700; }
  main { padding: 1.5rem 2rem; display: grid; gap: 1.5rem; max-width: 900px; margin: 0 auto; }
  .panel { background: var(--card); border: 1px solid var(--border); border-radius: 10px; overflow: hidden; }
  .panel-header { padding: .9rem 1.2rem; border-bottom: 1px solid var(--border); font-weight: 600; display: flex; justify-content: space-between; align-items: center; }
  .panel-body { padding: 1rem 1.2rem; display: flex; flex-wrap: wrap; gap: .8rem; align-items: flex-end; }
  label { display: block; color: var(--muted); font-size: .75rem; text-transform: uppercase; margin-bottom: .3rem; }
  input, select { background: var(--bg); border: 1px solid var(--border); color: var(--text); padding: .45rem .6rem; border-radius: 6px; font-size: .9rem; }
  button { background: var(--accent); border: none; color: #fff; padding: .5rem 1rem; border-radius: 6px; cursor: pointer; font-size: .9rem; font-weight: 600; }
  button.ghost { background: none; border: 1px solid var(--border); color: var(--muted); }
  button.ghost:hover { border-color: var(--red); color: var(--red); }
  table { width: 100%; border-collapse: collapse; }
  th { padding: .7rem 1rem; text-align: left; font-size: .75rem; text-transform: uppercase; color: var(--muted); border-bottom: 1px solid var(--border); }
  td { padding: .65rem 1rem; font-size: .88rem; border-bottom: 1px solid #1e2130; }
  tr:last-child td { border-bottom: none; }
  .pill { display: inline-block; padding: .15rem .55rem; border-radius: 20px; font-size: .75rem; font-weight: 600; }
  .pill.met { background: rgba(0,200,150,.15); color: var(--green); }
  .pill.miss { background: rgba(255,79,106,.15); color: var(--red); }
  .empty { color: var(--muted); text-align: center; padding: 2rem; font-size: .9rem; }
  .del { background: none; border: none; color: var(--red); cursor: pointer; font-size: 1rem; }
</style>
</head>
<body>
<header>
  <h1>&#9889; Propcheck</h1>
  <span style="margin-left:auto;color:var(--muted);font-size:.8rem;" id="status"></span>
</header>

<main>
  <div class="panel">
    <div class="panel-header">Add Projection</div>
    <div class="panel-body">
      <div><label>Sport</label>
        <select id="sport" onchange="fillMetrics()">
          <option value="baseball">Baseball</option>
          <option value="basketball">Basketball</option>
        </select>
      </div>
      <div><label>Player</label><input id="player" placeholder="Aaron Judge"></div>
      <div><label>Metric</label><select id="metric"></select></div>
      <div><label>Target</label><input id="target" type="number" step="0.5" value="1"></div>
      <button onclick="addProjection()">Add</button>
    </div>
  </div>

  <div class="panel">
    <div class="panel-header">Projections
      <button class="ghost" onclick="clearProjections()">Clear all</button>
    </div>
    <table>
      <thead><tr><th>Player</th><th>Metric</th><th>Target</th><th></th></tr></thead>
      <tbody id="projections-tbody"><tr><td colspan="4" class="empty">No projections yet</td></tr></tbody>
    </table>
  </div>

  <div class="panel">
    <div class="panel-header">Results
      <span>
        <select id="date"></select>
        <button onclick="checkResults()">Check</button>
        <button class="ghost" onclick="downloadCsv()">CSV</button>
      </span>
    </div>
    <table>
      <thead><tr><th>Player</th><th>Metric</th><th>Target</th><th>Actual</th><th>Met?</th></tr></thead>
      <tbody id="results-tbody"><tr><td colspan="5" class="empty">Add projections, pick a date, press Check</td></tr></tbody>
    </table>
  </div>
</main>

<script>
const METRICS = {
  baseball: ["hits","homeRuns","totalBases","rbi","baseOnBalls","runs","stolenBases"],
  basketball: ["points","assists","rebounds","steals","blocks","threePointsMade","pointsReboundsAssists"]
};

// Session id lives in localStorage so projections survive reloads.
let session = localStorage.getItem('propcheck-session');
if (!session) {
  session = 'sess-' + Math.random().toString(36).slice(2, 12);
  localStorage.setItem('propcheck-session', session);
}

function fillMetrics() {
  const sport = document.getElementById('sport').value;
  const sel = document.getElementById('metric');
  sel.innerHTML = METRICS[sport].map(m => `<option>${m}</option>`).join('');
  loadProjections();
}

function fillDates() {
  const sel = document.getElementById('date');
  const opts = [];
  for (let i = 0; i < 7; i++) {
    const d = new Date(Date.now() - i * 86400000);
    opts.push(`<option>${d.toISOString().slice(0, 10)}</option>`);
  }
  sel.innerHTML = opts.join('');
}

async function loadProjections() {
  const sport = document.getElementById('sport').value;
  const r = await fetch(`/api/projections?session=${session}&sport=${sport}`);
  if (!r.ok) return;
  const projections = await r.json();
  const tbody = document.getElementById('projections-tbody');
  if (!projections.length) {
    tbody.innerHTML = '<tr><td colspan="4" class="empty">No projections yet</td></tr>';
    return;
  }
  tbody.innerHTML = projections.map(p => `<tr>
    <td>${p.player}</td>
    <td>${p.metric}</td>
    <td>${p.target}</td>
    <td><button class="del" onclick="removeProjection(${p.id})">&#10060;</button></td>
  </tr>`).join('');
}

async function addProjection() {
  const body = {
    session_id: session,
    sport: document.getElementById('sport').value,
    player: document.getElementById('player').value,
    metric: document.getElementById('metric').value,
    target: parseFloat(document.getElementById('target').value)
  };
  const r = await fetch('/api/projections', {
    method: 'POST',
    headers: { 'Content-Type': 'application/json' },
    body: JSON.stringify(body)
  });
  if (!r.ok) { setStatus(await r.text()); return; }
  document.getElementById('player').value = '';
  setStatus('Added');
  loadProjections();
}

async function removeProjection(id) {
  await fetch(`/api/projections/${id}?session=${session}`, { method: 'DELETE' });
  loadProjections();
}

async function clearProjections() {
  await fetch(`/api/projections?session=${session}`, { method: 'DELETE' });
  loadProjections();
}

function resultsUrl(ext) {
  const sport = document.getElementById('sport').value;
  const date = document.getElementById('date').value;
  return `/api/results${ext}?session=${session}&sport=${sport}&date=${date}`;
}

async function checkResults() {
  setStatus('Fetching box scores…');
  const r = await fetch(resultsUrl(''));
  const tbody = document.getElementById('results-tbody');
  if (!r.ok) { setStatus(await r.text()); return; }
  const rows = await r.json();
  setStatus(`Checked ${rows.length} projection(s)`);
  if (!rows.length) {
    tbody.innerHTML = '<tr><td colspan="5" class="empty">No projections for this sport</td></tr>';
    return;
  }
  tbody.innerHTML = rows.map(row => `<tr>
    <td>${row.player}</td>
    <td>${row.metric}</td>
    <td>${row.target}</td>
    <td>${row.actual == null ? 'N/A' : row.actual}</td>
    <td><span class="pill ${row.met ? 'met' : 'miss'}">${row.met ? 'Met' : 'Not met'}</span></td>
  </tr>`).join('');
}

function downloadCsv() {
  window.location = resultsUrl('.csv');
}

function setStatus(msg) {
  document.getElementById('status').textContent = msg;
}

fillMetrics();
fillDates();
loadProjections();
</script>
</body>
</html>"#;
