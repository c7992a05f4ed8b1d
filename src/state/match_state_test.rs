use super::*;
use board::PieceKind;

const FEN_1: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
const FEN_2: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq e6 0 2";
const FEN_3: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2";

fn entry(fen: &str, last_move: Option<(u8, u8)>, white_ms: i64, black_ms: i64) -> HistoryEntry {
    HistoryEntry {
        fen: fen.to_owned(),
        last_move,
        algebraic_notation: String::new(),
        white_player_time_remaining_milliseconds: white_ms,
        black_player_time_remaining_milliseconds: black_ms,
    }
}

fn plies(n: usize) -> Vec<HistoryEntry> {
    let all = [
        entry(START_FEN, None, 300_000, 300_000),
        entry(FEN_1, Some((52, 36)), 298_000, 300_000),
        entry(FEN_2, Some((12, 28)), 298_000, 297_000),
        entry(FEN_3, Some((62, 45)), 295_000, 297_000),
    ];
    all[..n].to_vec()
}

fn update(history: Vec<HistoryEntry>) -> MoveBody {
    MoveBody { match_state_history: history, game_over_status: GameOverStatus::Ongoing, threefold_repetition: false }
}

fn state_with(n: usize) -> MatchState {
    let mut state = MatchState::new("m1");
    state.apply_move_update(update(plies(n))).expect("non-empty history");
    state
}

// =============================================================
// Defaults
// =============================================================

#[test]
fn new_state_shows_start_position_at_ply_zero() {
    let state = MatchState::new("m1");
    assert_eq!(state.match_id(), "m1");
    assert_eq!(state.history().len(), 1);
    assert_eq!(state.active_move(), 0);
    assert!(state.is_latest());
    assert_eq!(state.active().fen, START_FEN);
    assert_eq!(state.game_over(), GameOverStatus::Ongoing);
    assert!(state.player().is_none());
    assert!(state.opponent_event().is_none());
}

#[test]
fn first_push_advances_from_the_start_position() {
    let state = state_with(2);
    assert_eq!(state.active_move(), 1);
    assert_eq!(state.active().fen, FEN_1);
    assert_eq!(state.active().last_move, Some((52, 36)));
}

// =============================================================
// Reconciliation
// =============================================================

#[test]
fn push_while_viewing_live_advances_pointer_and_board() {
    let mut state = state_with(2);
    assert!(state.is_latest());

    state.apply_move_update(update(plies(3))).expect("apply");

    assert_eq!(state.history().len(), 3);
    assert_eq!(state.active_move(), 2);
    assert_eq!(state.active().fen, FEN_2);
    assert_eq!(
        state.active().position.piece_at(28),
        Some(board::Piece::new(Color::Black, PieceKind::Pawn))
    );
    assert!(state.is_latest());
}

#[test]
fn push_while_scrubbed_back_keeps_view_but_grows_history() {
    let mut state = state_with(3);
    state.select_ply(1);
    let before = state.active().clone();

    state.apply_move_update(update(plies(4))).expect("apply");

    assert_eq!(state.history().len(), 4);
    assert_eq!(state.active_move(), 1);
    assert_eq!(state.active().fen, before.fen);
    assert_eq!(state.active().position, before.position);
    assert_eq!(state.active().last_move, before.last_move);
    assert!(!state.is_latest());
}

#[test]
fn push_always_updates_clock_values_from_the_head() {
    let mut state = state_with(3);
    state.select_ply(0);

    state.apply_move_update(update(plies(4))).expect("apply");

    assert_eq!(state.active().white_ms, 295_000);
    assert_eq!(state.active().black_ms, 297_000);
}

#[test]
fn push_derives_side_to_move_from_the_head() {
    let mut state = state_with(2);
    assert_eq!(state.active_colour(), Color::Black);
    state.select_ply(0);
    state.apply_move_update(update(plies(3))).expect("apply");
    assert_eq!(state.active_colour(), Color::White);
}

#[test]
fn empty_push_is_rejected_and_state_is_unchanged() {
    let mut state = state_with(3);
    let rev = state.rev();
    let err = state.apply_move_update(update(Vec::new())).expect_err("empty");
    assert_eq!(err, StateError::EmptyHistory);
    assert_eq!(state.history().len(), 3);
    assert_eq!(state.active_move(), 2);
    assert_eq!(state.rev(), rev);
}

#[test]
fn push_records_game_over_and_threefold() {
    let mut state = state_with(2);
    state
        .apply_move_update(MoveBody {
            match_state_history: plies(3),
            game_over_status: GameOverStatus::Checkmate,
            threefold_repetition: true,
        })
        .expect("apply");
    assert!(state.is_game_over());
    assert!(state.threefold());
}

#[test]
fn push_clears_pending_opponent_event() {
    let mut state = state_with(2);
    state.set_opponent_event(OpponentEventKind::Takeback);
    state.apply_move_update(update(plies(3))).expect("apply");
    assert!(state.opponent_event().is_none());
}

#[test]
fn shrinking_push_below_scrubbed_ply_clamps_to_head() {
    let mut state = state_with(4);
    state.select_ply(3);
    state.select_ply(2);

    state.apply_move_update(update(plies(2))).expect("apply");

    assert_eq!(state.active_move(), 1);
    assert_eq!(state.active().fen, FEN_1);
}

#[test]
fn shrinking_push_while_live_follows_head() {
    let mut state = state_with(4);
    state.apply_move_update(update(plies(3))).expect("apply");
    assert_eq!(state.active_move(), 2);
    assert_eq!(state.active().fen, FEN_2);
}

#[test]
fn every_push_bumps_rev() {
    let mut state = MatchState::new("m1");
    let before = state.rev();
    state.apply_move_update(update(plies(2))).expect("apply");
    assert!(state.rev() > before);
}

// =============================================================
// Navigation
// =============================================================

#[test]
fn select_ply_clamps_to_history() {
    let mut state = state_with(3);
    state.select_ply(10);
    assert_eq!(state.active_move(), 2);
}

#[test]
fn select_ply_shows_that_ply_but_keeps_live_clock() {
    let mut state = state_with(4);
    state.select_ply(1);
    assert_eq!(state.active().fen, FEN_1);
    assert_eq!(state.active().last_move, Some((52, 36)));
    assert_eq!(state.active().white_ms, 295_000);
}

#[test]
fn step_back_and_forward_stay_in_bounds() {
    let mut state = state_with(3);
    state.jump_to_start();
    state.step_back();
    assert_eq!(state.active_move(), 0);
    state.step_forward();
    state.step_forward();
    state.step_forward();
    assert_eq!(state.active_move(), 2);
    assert!(state.is_latest());
}

#[test]
fn jump_to_latest_reattaches_to_live_updates() {
    let mut state = state_with(3);
    state.select_ply(0);
    state.jump_to_latest();
    state.apply_move_update(update(plies(4))).expect("apply");
    assert_eq!(state.active_move(), 3);
    assert_eq!(state.active().fen, FEN_3);
}

// =============================================================
// Player, presence, events
// =============================================================

#[test]
fn player_code_maps_to_roles() {
    assert_eq!(PlayerRole::from_code(0), PlayerRole::Player(Color::White));
    assert_eq!(PlayerRole::from_code(1), PlayerRole::Player(Color::Black));
    assert_eq!(PlayerRole::from_code(2), PlayerRole::Spectator);
    assert_eq!(PlayerRole::from_code(-1), PlayerRole::Spectator);
}

#[test]
fn player_is_assigned_only_once() {
    let mut state = MatchState::new("m1");
    assert!(state.assign_player(1));
    assert!(!state.assign_player(0));
    assert_eq!(state.player_color(), Some(Color::Black));
    assert!(state.is_flipped());
}

#[test]
fn connect_applies_move_update_then_presence() {
    let mut state = MatchState::new("m1");
    state
        .apply_connect(ConnectBody {
            update: update(plies(2)),
            white_player_connected: true,
            black_player_connected: false,
        })
        .expect("apply");
    assert_eq!(state.active_move(), 1);
    assert!(state.presence().white_connected);
    assert!(!state.presence().black_connected);
}

#[test]
fn connect_with_empty_history_still_sets_presence() {
    let mut state = MatchState::new("m1");
    let result = state.apply_connect(ConnectBody {
        update: update(Vec::new()),
        white_player_connected: false,
        black_player_connected: true,
    });
    assert_eq!(result, Err(StateError::EmptyHistory));
    assert!(!state.presence().white_connected);
    assert_eq!(state.history().len(), 1);
}

#[test]
fn connection_status_sets_and_clears_countdown() {
    let mut state = MatchState::new("m1");
    state.apply_connection_status(ConnectionStatusBody {
        player_colour: Color::White,
        is_connected: false,
        milliseconds_until_timeout: Some(60_000),
    });
    assert!(!state.presence().is_connected(Color::White));
    assert!(state.presence().is_connected(Color::Black));
    assert_eq!(
        state.presence().countdown,
        Some(DisconnectCountdown { color: Color::White, milliseconds: 60_000 })
    );

    state.apply_connection_status(ConnectionStatusBody {
        player_colour: Color::White,
        is_connected: true,
        milliseconds_until_timeout: None,
    });
    assert!(state.presence().white_connected);
    assert_eq!(state.presence().countdown, None);
}

#[test]
fn opponent_event_set_and_clear() {
    let mut state = MatchState::new("m1");
    state.set_opponent_event(OpponentEventKind::Rematch);
    assert_eq!(state.opponent_event(), Some(OpponentEventKind::Rematch));
    assert_eq!(state.clear_opponent_event(), Some(OpponentEventKind::Rematch));
    assert_eq!(state.clear_opponent_event(), None);
}

// =============================================================
// Derived views
// =============================================================

#[test]
fn clock_runs_only_after_first_move_while_ongoing() {
    let mut state = MatchState::new("m1");
    assert_eq!(state.clock_running(), None);
    state.apply_move_update(update(plies(2))).expect("apply");
    assert_eq!(state.clock_running(), Some(Color::Black));
    state
        .apply_move_update(MoveBody {
            match_state_history: plies(3),
            game_over_status: GameOverStatus::Draw,
            threefold_repetition: false,
        })
        .expect("apply");
    assert_eq!(state.clock_running(), None);
}

#[test]
fn interaction_context_reflects_view() {
    let mut state = state_with(3);
    state.assign_player(0);
    state.select_ply(1);
    let ctx = state.interaction_context();
    assert!(!ctx.is_latest);
    assert!(!ctx.game_over);
    assert_eq!(ctx.player, Some(Color::White));
    assert_eq!(ctx.latest_fen, FEN_2);
    assert_eq!(ctx.position, fen::parse(FEN_1));
}
