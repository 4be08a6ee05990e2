use askama::Template;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::get,
    Router,
};
use nfl_spread_predictor::config::Config;
use nfl_spread_predictor::data::predictions_to_csv;
use nfl_spread_predictor::team_names::TeamCode;
use nfl_spread_predictor::{fetch_dashboard_data, DashboardData};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::services::ServeDir;
use tracing::{error, info};

struct PredictionView {
    matchup: String,
    date: String,
    summary: String,
    home_injuries: String,
    away_injuries: String,
}

struct InjuryView {
    player: String,
    position: String,
    depth: String,
    injuries: String,
    status: String,
    last_updated: String,
}

struct OddsView {
    team: String,
    line: String,
    odds: String,
}

#[derive(Template)]
#[template(path = "predictions.html")]
struct PredictionsTemplate {
    active_page: String,
    window: String,
    stats_timestamp: String,
    generated_at: String,
    skipped_sources: String,
    unmapped_teams: String,
    predictions: Vec<PredictionView>,
}

#[derive(Template)]
#[template(path = "injuries.html")]
struct InjuriesTemplate {
    active_page: String,
    teams: Vec<String>,
    selected: String,
    entries: Vec<InjuryView>,
}

#[derive(Template)]
#[template(path = "odds.html")]
struct OddsTemplate {
    active_page: String,
    bookmaker: String,
    rows: Vec<OddsView>,
}

struct HtmlTemplate<T>(T);

impl<T> IntoResponse for HtmlTemplate<T>
where
    T: Template,
{
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(html) => Html(html).into_response(),
            Err(err) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to render template: {}", err),
            )
                .into_response(),
        }
    }
}

struct AppState {
    config: Config,
    data: RwLock<Option<DashboardData>>,
}

type SharedState = Arc<AppState>;

fn not_loaded() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Failed to fetch team stats. Please try again later.",
    )
        .into_response()
}

async fn predictions(State(state): State<SharedState>) -> impl IntoResponse {
    let data = state.data.read().await;
    let Some(data) = data.as_ref() else {
        return not_loaded();
    };

    let predictions = data
        .predictions
        .iter()
        .map(|p| PredictionView {
            matchup: format!("{} @ {}", p.game.away_team, p.game.home_team),
            date: format!("{} {}", p.game.gameday, p.game.gametime),
            summary: match (&p.prediction, &p.error) {
                (Some(prediction), _) => prediction.format(),
                (None, Some(e)) => format!("Unable to make prediction due to {}.", e),
                (None, None) => String::new(),
            },
            home_injuries: p.home_injuries.clone(),
            away_injuries: p.away_injuries.clone(),
        })
        .collect::<Vec<_>>();

    let template = PredictionsTemplate {
        active_page: "predictions".to_string(),
        window: format!("{} to {}", data.window_start, data.window_end),
        stats_timestamp: data.stats_timestamp.format("%Y-%m-%d %H:%M").to_string(),
        generated_at: data.generated_at.format("%Y-%m-%d %H:%M").to_string(),
        skipped_sources: data.skipped_sources.join(", "),
        unmapped_teams: data.unmapped_teams.join(", "),
        predictions,
    };

    HtmlTemplate(template).into_response()
}

async fn predictions_csv(State(state): State<SharedState>) -> impl IntoResponse {
    let data = state.data.read().await;
    let Some(data) = data.as_ref() else {
        return not_loaded();
    };

    match predictions_to_csv(&data.predictions) {
        Ok(csv) => (
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"nfl_predictions.csv\"",
                ),
            ],
            csv,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[derive(Deserialize)]
struct InjuryQuery {
    team: Option<String>,
}

async fn injuries(
    State(state): State<SharedState>,
    Query(query): Query<InjuryQuery>,
) -> impl IntoResponse {
    let data = state.data.read().await;
    let Some(data) = data.as_ref() else {
        return not_loaded();
    };

    let teams = data.injuries.teams();
    let selected = query
        .team
        .and_then(|t| t.parse::<TeamCode>().ok())
        .or_else(|| teams.first().copied());

    let entries = selected
        .map(|team| {
            data.injuries
                .for_team(team)
                .into_iter()
                .map(|e| InjuryView {
                    player: e.player.clone(),
                    position: e.position.clone(),
                    depth: e.depth.clone(),
                    injuries: [e.primary_injury.as_deref(), e.secondary_injury.as_deref()]
                        .into_iter()
                        .flatten()
                        .collect::<Vec<_>>()
                        .join(", "),
                    status: e.status.clone(),
                    last_updated: e.last_updated.format("%Y-%m-%d %H:%M:%S").to_string(),
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let template = InjuriesTemplate {
        active_page: "injuries".to_string(),
        teams: teams.iter().map(|t| t.to_string()).collect(),
        selected: selected.map(|t| t.to_string()).unwrap_or_default(),
        entries,
    };

    HtmlTemplate(template).into_response()
}

async fn odds(State(state): State<SharedState>) -> impl IntoResponse {
    let data = state.data.read().await;
    let Some(data) = data.as_ref() else {
        return not_loaded();
    };

    let rows = data
        .odds
        .as_ref()
        .map(|table| {
            table
                .team_lines(&state.config.bookmaker)
                .into_iter()
                .map(|(team, line)| OddsView {
                    team: team.to_string(),
                    line: line.line,
                    odds: line.odds,
                })
                .collect::<Vec<_>>()
        })
        .unwrap_or_default();

    let template = OddsTemplate {
        active_page: "odds".to_string(),
        bookmaker: state.config.bookmaker.clone(),
        rows,
    };

    HtmlTemplate(template).into_response()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    info!("Fetching stats, schedule, injuries and odds...");
    let data = match fetch_dashboard_data(&config).await {
        Ok(data) => {
            info!(
                "Data loaded: {} upcoming games, {} injury reports",
                data.predictions.len(),
                data.injuries.entries().len()
            );
            Some(data)
        }
        Err(e) => {
            error!("Error fetching data: {:#}", e);
            error!("Server will start but pages will show errors");
            None
        }
    };

    let bind_addr = config.bind_addr.clone();
    let state = Arc::new(AppState {
        config,
        data: RwLock::new(data),
    });

    let app = Router::new()
        .nest_service("/static", ServeDir::new("static"))
        .route("/", get(predictions))
        .route("/predictions.csv", get(predictions_csv))
        .route("/injuries", get(injuries))
        .route("/odds", get(odds))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Serving dashboard at http://{}", bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}
