//! Single binary web server: JSON API over the tournament engine with an in-memory store.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default.
//! Override with env: HOST (e.g. 0.0.0.0), PORT (e.g. 8080), MATCH_DURATION_MINUTES (e.g. 30).

use actix_web::{
    get, post, put,
    web::{Data, Json, Path, Query},
    App, HttpResponse, HttpServer, Responder,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::sync::Mutex;
use tournament_engine::{
    standings_to_csv, InMemoryRepository, MatchId, MatchRepository, Phase, PhaseController,
    RepositoryError, SeedingMode, Side, SlotPlan, StandingsCache, Team, Tournament,
    TournamentError, TournamentId,
};

/// Server settings read from the environment.
#[derive(Clone, Debug)]
struct ServerConfig {
    host: String,
    port: u16,
    /// Slot length used when a fixture request does not give one.
    match_duration_minutes: u32,
}

impl ServerConfig {
    fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: env_parse("PORT").unwrap_or_else(default_port),
            match_duration_minutes: env_parse("MATCH_DURATION_MINUTES")
                .unwrap_or_else(default_match_duration),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_match_duration() -> u32 {
    30
}

fn default_qualifiers() -> usize {
    8
}

struct AppState {
    controller: PhaseController<InMemoryRepository>,
    standings: Mutex<StandingsCache>,
    config: ServerConfig,
}

type State = Data<AppState>;

#[derive(serde::Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    name: String,
    #[serde(default = "default_qualifiers")]
    qualifiers_count: usize,
    #[serde(default)]
    seeding: SeedingMode,
}

#[derive(Deserialize)]
struct AddTeamBody {
    name: String,
    #[serde(default)]
    logo: Option<String>,
}

#[derive(Deserialize)]
struct FixturePlanBody {
    start_time: DateTime<Utc>,
    #[serde(default)]
    match_duration_minutes: Option<u32>,
    #[serde(default)]
    venue: String,
    #[serde(default)]
    round_number: Option<u32>,
}

impl FixturePlanBody {
    fn to_plan(&self, config: &ServerConfig) -> SlotPlan {
        SlotPlan {
            start_time: self.start_time,
            match_duration_minutes: self
                .match_duration_minutes
                .unwrap_or(config.match_duration_minutes),
            venue: self.venue.clone(),
            round_number: self.round_number,
        }
    }
}

#[derive(Deserialize)]
struct SessionBody {
    max_matches: usize,
    #[serde(flatten)]
    plan: FixturePlanBody,
}

#[derive(Deserialize)]
struct ResultBody {
    home_score: u32,
    away_score: u32,
}

#[derive(Deserialize)]
struct WalkoverBody {
    absent_side: Side,
}

#[derive(Deserialize)]
struct AdvanceBody {
    #[serde(default)]
    venue: String,
}

#[derive(Deserialize)]
struct MatchesQuery {
    phase: Option<Phase>,
}

#[derive(Deserialize)]
struct StandingsQuery {
    format: Option<String>,
}

/// Path segment: tournament id (e.g. /api/tournaments/{id})
#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

/// Path segments: tournament id and match id (e.g. /api/tournaments/{id}/matches/{match_id})
#[derive(Deserialize)]
struct TournamentMatchPath {
    id: TournamentId,
    match_id: MatchId,
}

/// Map an engine error to a status code; blocking match ids are listed for the client.
fn error_response(e: TournamentError) -> HttpResponse {
    let message = e.to_string();
    match e {
        TournamentError::Repository(
            RepositoryError::TournamentNotFound(_) | RepositoryError::MatchNotFound(_),
        ) => HttpResponse::NotFound().json(serde_json::json!({ "error": message })),
        TournamentError::Repository(RepositoryError::LockPoisoned) => {
            HttpResponse::InternalServerError().json(serde_json::json!({ "error": message }))
        }
        TournamentError::MatchesPending(ids) | TournamentError::UndecidedMatches(ids) => {
            HttpResponse::Conflict().json(serde_json::json!({ "error": message, "match_ids": ids }))
        }
        TournamentError::DuplicateFixtures { .. }
        | TournamentError::TournamentComplete
        | TournamentError::Repository(RepositoryError::Conflict(_)) => {
            HttpResponse::Conflict().json(serde_json::json!({ "error": message }))
        }
        _ => HttpResponse::BadRequest().json(serde_json::json!({ "error": message })),
    }
}

fn respond<T: serde::Serialize, E: Into<TournamentError>>(result: Result<T, E>) -> HttpResponse {
    match result {
        Ok(body) => HttpResponse::Ok().json(body),
        Err(e) => error_response(e.into()),
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "tournament-engine",
    })
}

/// Create a new tournament in the group phase.
#[post("/api/tournaments")]
async fn api_create_tournament(state: State, body: Json<CreateTournamentBody>) -> HttpResponse {
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Name is required" }));
    }
    let tournament = Tournament::new(name, body.qualifiers_count).with_seeding(body.seeding);
    log::info!("Created tournament {} ({})", tournament.id, tournament.name);
    respond(state.controller.repository().create_tournament(tournament))
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.controller.repository().get_tournament(path.id))
}

#[get("/api/tournaments/{id}/teams")]
async fn api_list_teams(state: State, path: Path<TournamentPath>) -> HttpResponse {
    respond(state.controller.repository().list_teams(path.id))
}

/// Register a team (group phase only).
#[post("/api/tournaments/{id}/teams")]
async fn api_add_team(state: State, path: Path<TournamentPath>, body: Json<AddTeamBody>) -> HttpResponse {
    let repo = state.controller.repository();
    match repo.get_tournament(path.id) {
        Ok(t) if t.current_phase != Phase::Groups => {
            return error_response(TournamentError::InvalidState)
        }
        Ok(_) => {}
        Err(e) => return error_response(e.into()),
    }
    let name = body.name.trim();
    if name.is_empty() {
        return HttpResponse::BadRequest().json(serde_json::json!({ "error": "Name is required" }));
    }
    let team = match &body.logo {
        Some(logo) => Team::new(name).with_logo(logo.clone()),
        None => Team::new(name),
    };
    respond(repo.add_team(path.id, team))
}

/// List matches, optionally of one phase (?phase=quarter).
#[get("/api/tournaments/{id}/matches")]
async fn api_list_matches(
    state: State,
    path: Path<TournamentPath>,
    query: Query<MatchesQuery>,
) -> HttpResponse {
    respond(state.controller.repository().list_matches(path.id, query.phase))
}

#[get("/api/tournaments/{id}/matches/{match_id}")]
async fn api_get_match(state: State, path: Path<TournamentMatchPath>) -> HttpResponse {
    respond(state.controller.repository().get_match(path.id, path.match_id))
}

/// Generate the full group-stage round robin.
#[post("/api/tournaments/{id}/fixtures/round-robin")]
async fn api_generate_round_robin(
    state: State,
    path: Path<TournamentPath>,
    body: Json<FixturePlanBody>,
) -> HttpResponse {
    let plan = body.to_plan(&state.config);
    respond(state.controller.generate_round_robin(path.id, &plan))
}

/// Generate the next session: no team plays twice, up to `max_matches` matches.
#[post("/api/tournaments/{id}/fixtures/session")]
async fn api_generate_session(
    state: State,
    path: Path<TournamentPath>,
    body: Json<SessionBody>,
) -> HttpResponse {
    let plan = body.plan.to_plan(&state.config);
    match state.controller.generate_session(path.id, body.max_matches, &plan) {
        Ok(outcome) => {
            let partial = outcome.is_partial();
            HttpResponse::Ok().json(serde_json::json!({
                "matches": outcome.into_matches(),
                "partial": partial,
                "requested": body.max_matches,
            }))
        }
        Err(e) => error_response(e),
    }
}

/// Enter a played result.
#[put("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_record_result(
    state: State,
    path: Path<TournamentMatchPath>,
    body: Json<ResultBody>,
) -> HttpResponse {
    respond(state.controller.repository().record_result(
        path.id,
        path.match_id,
        body.home_score,
        body.away_score,
    ))
}

/// Enter a walkover: the present side wins 3-0.
#[put("/api/tournaments/{id}/matches/{match_id}/walkover")]
async fn api_record_walkover(
    state: State,
    path: Path<TournamentMatchPath>,
    body: Json<WalkoverBody>,
) -> HttpResponse {
    respond(
        state
            .controller
            .repository()
            .record_walkover(path.id, path.match_id, body.absent_side),
    )
}

/// Group-stage standings as JSON, or CSV with ?format=csv.
#[get("/api/tournaments/{id}/standings")]
async fn api_standings(
    state: State,
    path: Path<TournamentPath>,
    query: Query<StandingsQuery>,
) -> HttpResponse {
    let repo = state.controller.repository();
    let loaded = repo.get_tournament(path.id).and_then(|t| {
        let teams = repo.list_teams(path.id)?;
        let matches = repo.list_finalized_matches(path.id, Some(Phase::Groups))?;
        Ok((t, teams, matches))
    });
    let (tournament, teams, matches) = match loaded {
        Ok(data) => data,
        Err(e) => return error_response(e.into()),
    };
    let rows = match state.standings.lock() {
        Ok(mut cache) => cache.get_or_compute(
            tournament.id,
            Phase::Groups,
            &teams,
            &matches,
            tournament.qualifiers_count,
        ),
        Err(_) => return HttpResponse::InternalServerError().body("lock error"),
    };
    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => return error_response(e),
    };
    if query.format.as_deref() == Some("csv") {
        return match standings_to_csv(&rows, &teams) {
            Ok(csv) => HttpResponse::Ok()
                .content_type("text/csv; charset=utf-8")
                .body(csv),
            Err(e) => {
                log::error!("CSV export failed for {}: {}", tournament.id, e);
                HttpResponse::InternalServerError().body("csv error")
            }
        };
    }
    HttpResponse::Ok().json(rows)
}

/// Close the active phase and open the next one.
#[post("/api/tournaments/{id}/advance")]
async fn api_advance(
    state: State,
    path: Path<TournamentPath>,
    body: Option<Json<AdvanceBody>>,
) -> HttpResponse {
    let venue = body.map(|b| b.into_inner().venue).unwrap_or_default();
    respond(state.controller.advance(path.id, &venue))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::from_env();
    log::info!("Starting server at http://{}:{}", config.host, config.port);

    let bind = (config.host.clone(), config.port);
    let state = Data::new(AppState {
        controller: PhaseController::new(InMemoryRepository::new()),
        standings: Mutex::new(StandingsCache::new()),
        config,
    });

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_list_teams)
            .service(api_add_team)
            .service(api_list_matches)
            .service(api_get_match)
            .service(api_generate_round_robin)
            .service(api_generate_session)
            .service(api_record_result)
            .service(api_record_walkover)
            .service(api_standings)
            .service(api_advance)
    })
    .bind(bind)?
    .run()
    .await
}
