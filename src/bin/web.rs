//! Web host for the tournament core: JSON API over the tournament operations.
//! Run with: cargo run --bin web
//! Listens on 0.0.0.0:8080 by default. Override with env: HOST, PORT.
//! Tournaments are loaded from TOURNAMENTS_FILE (default ./data/tournaments.json)
//! at startup and saved after every successful mutation.

use actix_web::{
    get, post, put,
    web::{Data, Json, Path},
    App, HttpResponse, HttpServer, Responder,
};
use chess_tournament::{
    JsonFileStore, Match, MatchId, MatchResult, Player, Round, RoundFixtures, RoundTag, Tournament,
    TournamentError, TournamentId, TournamentMap, TournamentPhase, TournamentStore,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tokio::sync::mpsc;
use uuid::Uuid;

/// Shared state: every tournament by id, plus the queue feeding the saver task.
/// The write lock serializes mutations, so one result is applied at a time.
struct Host {
    tournaments: RwLock<TournamentMap>,
    saver: mpsc::UnboundedSender<TournamentMap>,
}

type AppState = Data<Host>;

struct Config {
    host: String,
    port: u16,
    tournaments_file: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_tournaments_file() -> PathBuf {
    PathBuf::from("./data/tournaments.json")
}

impl Config {
    fn from_env() -> Self {
        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| default_host()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or_else(default_port),
            tournaments_file: std::env::var("TOURNAMENTS_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_tournaments_file()),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    service: &'static str,
}

#[derive(Deserialize)]
struct CreateTournamentBody {
    /// Chat or session the tournament belongs to; a fresh uuid when absent.
    #[serde(default)]
    key: Option<TournamentId>,
    #[serde(default = "default_tournament_name")]
    name: String,
    players: Vec<String>,
}

fn default_tournament_name() -> String {
    "Chess Tournament".to_string()
}

#[derive(Deserialize)]
struct RecordResultBody {
    result: String,
}

#[derive(Deserialize)]
struct TournamentPath {
    id: TournamentId,
}

#[derive(Deserialize)]
struct MatchPath {
    id: TournamentId,
    match_id: MatchId,
}

#[derive(Deserialize)]
struct RoundPath {
    id: TournamentId,
    round: u32,
}

#[derive(Serialize)]
struct CreatedResponse<'a> {
    id: TournamentId,
    tournament: &'a Tournament,
}

/// A match with both players resolved from the current standings.
#[derive(Serialize)]
struct MatchView<'a> {
    id: MatchId,
    round: Round,
    player1: &'a Player,
    player2: &'a Player,
    result: Option<MatchResult>,
}

#[derive(Serialize)]
struct RoundView<'a> {
    round: RoundTag,
    matches: Vec<MatchView<'a>>,
}

#[derive(Serialize)]
struct RecordedResponse<'a> {
    #[serde(rename = "match")]
    recorded: MatchView<'a>,
    phase: TournamentPhase,
    current_round: u32,
}

fn match_view<'a>(t: &'a Tournament, m: &Match) -> Option<MatchView<'a>> {
    Some(MatchView {
        id: m.id,
        round: m.round,
        player1: t.player(m.player1)?,
        player2: t.player(m.player2)?,
        result: m.result,
    })
}

fn match_views<'a>(t: &'a Tournament, matches: &[&Match]) -> Vec<MatchView<'a>> {
    matches.iter().filter_map(|m| match_view(t, m)).collect()
}

fn round_view<'a>(t: &'a Tournament, fixtures: &RoundFixtures<'_>) -> RoundView<'a> {
    RoundView {
        round: fixtures.round,
        matches: match_views(t, &fixtures.matches),
    }
}

fn error_response(e: &TournamentError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        TournamentError::MatchNotFound(_) => HttpResponse::NotFound().json(body),
        TournamentError::MatchAlreadyDecided { .. } => HttpResponse::Conflict().json(body),
        _ => HttpResponse::BadRequest().json(body),
    }
}

fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(serde_json::json!({ "error": "No tournament" }))
}

fn lock_error() -> HttpResponse {
    HttpResponse::InternalServerError().body("lock error")
}

/// Hand a snapshot to the saver task. A failed save is logged there and never
/// affects the in-memory state.
fn persist(host: &Host, tournaments: &TournamentMap) {
    if host.saver.send(tournaments.clone()).is_err() {
        log::error!("Saver task is gone; tournaments are not being persisted");
    }
}

#[get("/api/health")]
async fn api_health() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        ok: true,
        service: "chess-tournament",
    })
}

/// Create a tournament, register its players, and start the group stage.
#[post("/api/tournaments")]
async fn api_create_tournament(state: AppState, body: Json<CreateTournamentBody>) -> HttpResponse {
    let body = body.into_inner();
    let mut tournament = Tournament::new(body.name);
    let started = tournament
        .register_players(&body.players)
        .and_then(|()| tournament.start_group_stage().map(|_| ()));
    if let Err(e) = started {
        return error_response(&e);
    }

    let mut g = match state.tournaments.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let id = body.key.unwrap_or_else(|| Uuid::new_v4().to_string());
    if g.contains_key(&id) {
        let error = format!("Tournament {} already exists", id);
        return HttpResponse::Conflict().json(serde_json::json!({ "error": error }));
    }
    g.insert(id.clone(), tournament);
    persist(&state, &g);
    match g.get(&id) {
        Some(tournament) => HttpResponse::Ok().json(CreatedResponse { id, tournament }),
        None => lock_error(),
    }
}

#[get("/api/tournaments/{id}")]
async fn api_get_tournament(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.tournaments.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(t) => HttpResponse::Ok().json(t),
        None => not_found(),
    }
}

#[get("/api/tournaments/{id}/standings")]
async fn api_standings(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.tournaments.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(t) => HttpResponse::Ok().json(t.standings()),
        None => not_found(),
    }
}

#[get("/api/tournaments/{id}/rounds/current")]
async fn api_current_round(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.tournaments.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(t) => HttpResponse::Ok().json(match_views(t, &t.current_round_matches())),
        None => not_found(),
    }
}

#[get("/api/tournaments/{id}/rounds/last")]
async fn api_last_round(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.tournaments.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(t) => {
            let last = t.last_completed_round().map(|f| round_view(t, &f));
            HttpResponse::Ok().json(last)
        }
        None => not_found(),
    }
}

#[get("/api/tournaments/{id}/rounds/upcoming")]
async fn api_upcoming_rounds(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let g = match state.tournaments.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(t) => {
            let upcoming: Vec<RoundView> = t
                .upcoming_matches()
                .iter()
                .map(|f| round_view(t, f))
                .collect();
            HttpResponse::Ok().json(upcoming)
        }
        None => not_found(),
    }
}

#[get("/api/tournaments/{id}/rounds/{round}")]
async fn api_round(state: AppState, path: Path<RoundPath>) -> HttpResponse {
    let g = match state.tournaments.read() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    match g.get(&path.id) {
        Some(t) => HttpResponse::Ok().json(match_views(t, &t.matches_in_round(path.round))),
        None => not_found(),
    }
}

/// Record a match result, then move the group stage on if the round is done.
#[put("/api/tournaments/{id}/matches/{match_id}/result")]
async fn api_record_result(
    state: AppState,
    path: Path<MatchPath>,
    body: Json<RecordResultBody>,
) -> HttpResponse {
    let mut g = match state.tournaments.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let t = match g.get_mut(&path.id) {
        Some(t) => t,
        None => return not_found(),
    };
    let recorded = match t.record_result(path.match_id, body.result.trim()) {
        Ok(m) => m,
        Err(e) => return error_response(&e),
    };
    t.advance_round();
    persist(&state, &g);

    let Some(t) = g.get(&path.id) else {
        return not_found();
    };
    match match_view(t, &recorded) {
        Some(view) => HttpResponse::Ok().json(RecordedResponse {
            recorded: view,
            phase: t.phase(),
            current_round: t.current_round(),
        }),
        None => error_response(&TournamentError::PlayerNotFound(recorded.player1)),
    }
}

#[post("/api/tournaments/{id}/advance")]
async fn api_advance_round(state: AppState, path: Path<TournamentPath>) -> HttpResponse {
    let mut g = match state.tournaments.write() {
        Ok(guard) => guard,
        Err(_) => return lock_error(),
    };
    let t = match g.get_mut(&path.id) {
        Some(t) => t,
        None => return not_found(),
    };
    if t.advance_round() {
        persist(&state, &g);
    }
    match g.get(&path.id) {
        Some(t) => HttpResponse::Ok().json(t),
        None => not_found(),
    }
}

/// Single consumer of tournament snapshots; saves land in mutation order and
/// only the newest pending snapshot is written.
async fn run_saver(
    store: Arc<dyn TournamentStore>,
    mut rx: mpsc::UnboundedReceiver<TournamentMap>,
) {
    while let Some(mut snapshot) = rx.recv().await {
        while let Ok(newer) = rx.try_recv() {
            snapshot = newer;
        }
        let store = store.clone();
        let count = snapshot.len();
        match tokio::task::spawn_blocking(move || store.save(&snapshot)).await {
            Ok(Ok(())) => log::debug!("Saved {} tournament(s)", count),
            Ok(Err(e)) => log::error!("Error saving tournaments: {}", e),
            Err(e) => log::error!("Save task failed: {}", e),
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env();
    let file_store = JsonFileStore::new(&config.tournaments_file);
    let tournaments = match file_store.load() {
        Ok(t) => {
            log::info!("Loaded {} tournament(s) from {}", t.len(), file_store.path().display());
            t
        }
        Err(e) => {
            log::error!("Error loading {}: {}", file_store.path().display(), e);
            let aside = file_store.quarantine().map_err(|qe| {
                std::io::Error::other(format!(
                    "refusing to start: {} is unreadable and could not be moved aside: {}",
                    file_store.path().display(),
                    qe
                ))
            })?;
            log::warn!("Moved unreadable store to {}, starting empty", aside.display());
            TournamentMap::new()
        }
    };
    let store: Arc<dyn TournamentStore> = Arc::new(file_store);

    let (tx, rx) = mpsc::unbounded_channel();
    actix_web::rt::spawn(run_saver(store, rx));

    let state = Data::new(Host {
        tournaments: RwLock::new(tournaments),
        saver: tx,
    });

    let bind = (config.host.as_str(), config.port);
    log::info!("Starting server at http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .service(api_health)
            .service(api_create_tournament)
            .service(api_get_tournament)
            .service(api_standings)
            .service(api_current_round)
            .service(api_last_round)
            .service(api_upcoming_rounds)
            .service(api_round)
            .service(api_record_result)
            .service(api_advance_round)
    })
    .bind(bind)?
    .run()
    .await
}
