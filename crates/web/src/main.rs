mod config;

use config::ServerConfig;
use deckforge_core::{
    Card, CardAction, CountMap, DeckRequest, DifficultyTable, GameTypes, MemoryStore, Notice, NoticeKind,
    Phase, Preferences, Progress, RngState, Session, SessionError, SessionSnapshot,
    SnapshotStore, StoreError,
};
use deckforge_data::{DirCatalogProvider, FileStore};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::io::Read;
use std::sync::{Arc, Mutex};
use tiny_http::{Header, Method, Response, Server, StatusCode};

fn main() {
    env_logger::init();
    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = ServerConfig::from_env_and_args(&args);
    let state = match AppState::open(&config) {
        Ok(state) => state,
        Err(err) => {
            error!("cannot start session: {err}");
            std::process::exit(1);
        }
    };
    let server = match Server::http(config.addr.as_str()) {
        Ok(server) => server,
        Err(err) => {
            error!("cannot bind {}: {err}", config.addr);
            std::process::exit(1);
        }
    };
    info!("deckforge web server on http://{}", config.addr);
    let state = Arc::new(Mutex::new(state));
    for request in server.incoming_requests() {
        let state = state.clone();
        if let Err(err) = handle_request(request, state) {
            warn!("request error: {err}");
        }
    }
}

/// The host either saves to a file or keeps the snapshot in memory.
enum HostStore {
    File(FileStore),
    Memory(MemoryStore),
}

impl SnapshotStore for HostStore {
    fn get(&self) -> Result<Option<SessionSnapshot>, StoreError> {
        match self {
            Self::File(store) => store.get(),
            Self::Memory(store) => store.get(),
        }
    }

    fn set(&mut self, snapshot: &SessionSnapshot) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.set(snapshot),
            Self::Memory(store) => store.set(snapshot),
        }
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        match self {
            Self::File(store) => store.remove(),
            Self::Memory(store) => store.remove(),
        }
    }
}

struct AppState {
    session: Session<HostStore>,
}

impl AppState {
    fn open(config: &ServerConfig) -> Result<Self, SessionError> {
        let provider = DirCatalogProvider::new(&config.data_dir);
        let store = match &config.save_path {
            Some(path) => {
                info!("saving session to {}", path.display());
                HostStore::File(FileStore::new(path))
            }
            None => HostStore::Memory(MemoryStore::new()),
        };
        let rng = config
            .seed
            .map(RngState::from_seed)
            .unwrap_or_else(RngState::from_entropy);
        info!("session seed {}", rng.seed());
        let session = Session::open_with(&provider, store, rng)?;
        Ok(Self { session })
    }
}

#[derive(Serialize)]
struct ApiResponse {
    ok: bool,
    error: Option<Notice>,
    state: UiState,
    notices: Vec<Notice>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UiState {
    phase: Phase,
    current_card: Option<Card>,
    progress: Progress,
    in_play: Vec<Card>,
    discard_size: usize,
    sentry_remaining: usize,
    selected_games: Vec<String>,
    available_types: BTreeSet<String>,
    card_counts: CountMap,
    special_card_counts: CountMap,
    sentry_card_counts: CountMap,
    sentry_enabled: bool,
    corrupter_enabled: bool,
    difficulty_index: Option<usize>,
    preferences: Preferences,
    seed: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CatalogView {
    games: Vec<UiGame>,
    sentry_types: Vec<String>,
    corrupter_types: Vec<String>,
    held_back_types: Vec<String>,
    difficulties: DifficultyTable,
    card_actions: Vec<&'static str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UiGame {
    id: String,
    card_count: usize,
    types: GameTypes,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ActionRequest {
    action: String,
    #[serde(default)]
    target: Option<String>,
    #[serde(default)]
    n: Option<i64>,
    #[serde(default)]
    games: Vec<String>,
    #[serde(default)]
    counts: Option<CountMap>,
    #[serde(default)]
    special_counts: CountMap,
    #[serde(default)]
    sentry_counts: CountMap,
    #[serde(default)]
    sentry_enabled: bool,
    #[serde(default)]
    corrupter_enabled: bool,
    #[serde(default)]
    difficulty: Option<usize>,
    #[serde(default)]
    enabled: Option<bool>,
    #[serde(default)]
    keep_preferences: bool,
}

fn handle_request(
    mut request: tiny_http::Request,
    state: Arc<Mutex<AppState>>,
) -> Result<(), Box<dyn std::error::Error>> {
    let url = request.url().to_string();
    match (request.method(), url.as_str()) {
        (&Method::Get, "/api/state") => {
            let mut guard = state.lock().map_err(|_| "session lock poisoned")?;
            let response = build_response(&mut guard, None);
            respond_json(request, &response)?;
        }
        (&Method::Get, "/api/catalog") => {
            let guard = state.lock().map_err(|_| "session lock poisoned")?;
            let view = catalog_view(&guard.session);
            respond_json(request, &view)?;
        }
        (&Method::Post, "/api/action") => {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body)?;
            let mut guard = state.lock().map_err(|_| "session lock poisoned")?;
            let err = match serde_json::from_str::<ActionRequest>(&body) {
                Ok(action) => apply_action(&mut guard, action),
                Err(err) => Some(Notice::new(
                    NoticeKind::InvalidState,
                    format!("bad request: {err}"),
                )),
            };
            let response = build_response(&mut guard, err);
            respond_json(request, &response)?;
        }
        _ => {
            let response = Response::empty(StatusCode(404));
            request.respond(response)?;
        }
    }
    Ok(())
}

fn respond_json<T: Serialize>(
    request: tiny_http::Request,
    body: &T,
) -> Result<(), Box<dyn std::error::Error>> {
    let body = serde_json::to_vec_pretty(body)?;
    let header = Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..])
        .map_err(|_| "invalid content-type header")?;
    request.respond(Response::from_data(body).with_header(header))?;
    Ok(())
}

fn build_response(state: &mut AppState, err: Option<Notice>) -> ApiResponse {
    let notices = state.session.drain_notices();
    ApiResponse {
        ok: err.is_none(),
        error: err,
        state: snapshot_state(&state.session),
        notices,
    }
}

fn snapshot_state(session: &Session<HostStore>) -> UiState {
    let state = session.state();
    UiState {
        phase: state.phase,
        current_card: session.current_card().cloned(),
        progress: session.progress(),
        in_play: session.in_play().to_vec(),
        discard_size: state.deck.discard.len(),
        sentry_remaining: state.deck.sentry.len(),
        selected_games: state.selected_games.clone(),
        available_types: session.registry().tags_for(&state.selected_games),
        card_counts: state.card_counts.clone(),
        special_card_counts: state.special_card_counts.clone(),
        sentry_card_counts: state.sentry_card_counts.clone(),
        sentry_enabled: state.sentry_enabled,
        corrupter_enabled: state.corrupter_enabled,
        difficulty_index: state.difficulty_index,
        preferences: state.preferences,
        seed: session.seed(),
    }
}

fn catalog_view(session: &Session<HostStore>) -> CatalogView {
    let catalog = session.catalog();
    let games = catalog
        .games
        .iter()
        .map(|(id, cards)| UiGame {
            id: id.clone(),
            card_count: cards.len(),
            types: session.registry().game(id).cloned().unwrap_or_default(),
        })
        .collect();
    CatalogView {
        games,
        sentry_types: catalog.sentry_types.clone(),
        corrupter_types: catalog.corrupter_types.clone(),
        held_back_types: catalog.held_back_types.clone(),
        difficulties: session.difficulties().clone(),
        card_actions: CardAction::ALL.iter().map(|action| action.name()).collect(),
    }
}

/// The single count form is routed by rule set; explicit special and sentry
/// maps override what routing produced.
fn deck_request(session: &Session<HostStore>, req: ActionRequest) -> DeckRequest {
    let raw = req
        .counts
        .unwrap_or_else(|| session.state().card_counts.clone());
    let routed = session
        .registry()
        .route_counts(&raw, req.sentry_enabled, req.corrupter_enabled);
    let mut special_card_counts = routed.special_card_counts;
    special_card_counts.extend(req.special_counts);
    let mut sentry_card_counts = routed.sentry_card_counts;
    sentry_card_counts.extend(req.sentry_counts);
    DeckRequest {
        card_counts: routed.card_counts,
        special_card_counts,
        sentry_card_counts,
        sentry_enabled: req.sentry_enabled,
        corrupter_enabled: req.corrupter_enabled,
    }
}

fn describe(err: SessionError) -> Notice {
    Notice::from(&err)
}

fn missing(message: &str) -> Option<Notice> {
    Some(Notice::new(NoticeKind::InvalidIndex, message))
}

fn apply_action(state: &mut AppState, req: ActionRequest) -> Option<Notice> {
    let session = &mut state.session;
    let action = req.action.clone();
    match action.as_str() {
        "select_games" => {
            session.select_games(&req.games);
            None
        }
        "generate" => {
            let request = deck_request(session, req);
            session.generate_deck(request).map(|_| ()).err().map(describe)
        }
        "next" => session.next().map(|_| ()).err().map(describe),
        "prev" => session.prev().map(|_| ()).err().map(describe),
        "mark_in_play" => match req.target {
            Some(id) => session.mark_in_play(&id).map(|_| ()).err().map(describe),
            None => missing("mark_in_play needs a target card id"),
        },
        "clear_in_play" => match req.target {
            Some(id) => {
                session.clear_in_play(&id);
                None
            }
            None => missing("clear_in_play needs a target card id"),
        },
        "clear_all_in_play" => {
            session.clear_all_in_play();
            None
        }
        "set_difficulty" => {
            let index = match req.difficulty.or_else(|| number(req.target.as_deref())) {
                Some(index) => index,
                None => return missing("set_difficulty needs a difficulty index"),
            };
            session.set_difficulty(index).map(|_| ()).err().map(describe)
        }
        "set_dark_mode" => {
            let enabled = req
                .enabled
                .unwrap_or(!session.state().preferences.dark_mode);
            session.set_dark_mode(enabled);
            None
        }
        "reset" => {
            session.reset(req.keep_preferences);
            None
        }
        name => {
            let n = req
                .n
                .or_else(|| req.target.as_deref().and_then(|value| value.parse().ok()));
            session.apply_named(name, n).err().map(describe)
        }
    }
}

fn number(target: Option<&str>) -> Option<usize> {
    target.and_then(|value| value.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckforge_core::{Catalog, LoadedCatalog};
    use std::collections::BTreeMap;

    fn app() -> AppState {
        let cards = (0..4)
            .map(|i| Card::new(format!("t{i}"), "Pit", Some("Trap")).with_game("base"))
            .collect();
        let mut games = BTreeMap::new();
        games.insert("base".to_string(), cards);
        let loaded = LoadedCatalog {
            catalog: Catalog {
                games,
                ..Catalog::default()
            },
            difficulties: DifficultyTable::default(),
        };
        let store = HostStore::Memory(MemoryStore::new());
        AppState {
            session: Session::open(loaded, store, RngState::from_seed(1)),
        }
    }

    fn act(state: &mut AppState, body: &str) -> ApiResponse {
        let req: ActionRequest = serde_json::from_str(body).expect("request");
        let err = apply_action(state, req);
        build_response(state, err)
    }

    #[test]
    fn session_errors_carry_their_kind() {
        let mut state = app();
        let response = act(&mut state, r#"{"action":"generate","counts":{"Trap":2}}"#);
        let error = response.error.expect("no games selected");
        assert!(!response.ok);
        assert_eq!(error.kind, NoticeKind::NoGamesSelected);

        let response = act(&mut state, r#"{"action":"burn"}"#);
        assert_eq!(response.error.map(|notice| notice.kind), Some(NoticeKind::UnknownAction));
    }

    #[test]
    fn catalog_lists_card_actions() {
        let state = app();
        let view = catalog_view(&state.session);
        assert_eq!(view.games.len(), 1);
        assert_eq!(view.games[0].card_count, 4);
        assert!(view.card_actions.contains(&"shuffleTopN"));
        assert_eq!(view.card_actions.len(), 4);
    }

    #[test]
    fn missing_target_is_reported() {
        let mut state = app();
        let response = act(&mut state, r#"{"action":"mark_in_play"}"#);
        assert_eq!(response.error.map(|notice| notice.kind), Some(NoticeKind::InvalidIndex));
    }

    #[test]
    fn generate_then_next_succeeds() {
        let mut state = app();
        assert!(act(&mut state, r#"{"action":"select_games","games":["base"]}"#).ok);
        assert!(act(&mut state, r#"{"action":"generate","counts":{"Trap":3}}"#).ok);
        let response = act(&mut state, r#"{"action":"next"}"#);
        assert!(response.ok);
        assert_eq!(response.state.progress.total_cards, 3);
        assert!(response.state.current_card.is_some());
    }
}
