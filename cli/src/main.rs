mod render;

use std::io::Write as _;
use std::time::{Duration, Instant};

use board::consts::START_FEN;
use board::{fen, geometry};
use clap::{Parser, Subcommand};
use matchroom::config::{
    DEFAULT_API_URL, DEFAULT_RECONNECT_INITIAL_MS, DEFAULT_RECONNECT_MAX_MS, DEFAULT_REQUEST_TIMEOUT_SECS,
    parse_reconnect,
};
use matchroom::{
    ApiClient, ApiError, ClientConfig, ConfigError, ConnectionError, InputOutcome, MatchSession,
    TungsteniteConnector,
};
use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

use crate::render::{PLAY_HELP, PlayInput, RoomView, parse_play_input, render_board};

/// How often the clock line is refreshed between server pushes.
const CLOCK_TICK: Duration = Duration::from_millis(200);

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("api request failed: {0}")]
    Api(#[from] ApiError),
    #[error("match connection failed: {0}")]
    Connection(#[from] ConnectionError),
    #[error("invalid square `{0}` (expected a name like e4)")]
    InvalidSquare(String),
    #[error("not logged in")]
    NotLoggedIn,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "matchroom-cli", about = "Live chess match client")]
struct Cli {
    #[arg(long, env = "MATCHROOM_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// Defaults to the API URL with a ws scheme and `/matchroom` path.
    #[arg(long, env = "MATCHROOM_WS_URL")]
    ws_url: Option<String>,

    #[arg(long, env = "MATCHROOM_SESSION_TOKEN")]
    session_token: Option<String>,

    #[arg(long, env = "MATCHROOM_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT_SECS)]
    request_timeout_secs: u64,

    /// `backoff` or `immediate`.
    #[arg(long, env = "MATCHROOM_RECONNECT", default_value = "backoff")]
    reconnect: String,

    #[arg(long, env = "MATCHROOM_RECONNECT_INITIAL_MS", default_value_t = DEFAULT_RECONNECT_INITIAL_MS)]
    reconnect_initial_ms: u64,

    #[arg(long, env = "MATCHROOM_RECONNECT_MAX_MS", default_value_t = DEFAULT_RECONNECT_MAX_MS)]
    reconnect_max_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account.
    Register {
        username: String,
        #[arg(long, env = "MATCHROOM_PASSWORD")]
        password: String,
    },
    /// Log in and print the session token.
    Login {
        username: String,
        #[arg(long, env = "MATCHROOM_PASSWORD")]
        password: String,
    },
    Logout,
    /// Print the username of the current session.
    Whoami,
    /// Join the matchmaking queue and wait for an opponent.
    Queue {
        #[arg(long, default_value_t = 180_000)]
        time_ms: u64,
        #[arg(long, default_value_t = 0)]
        increment_ms: u64,
    },
    /// List matches in progress.
    Matches,
    /// Follow a match as it is played.
    Watch { match_id: String },
    /// Play a match from the terminal.
    Play { match_id: String },
    /// Ask the server for the legal moves of one square.
    Moves {
        square: String,
        #[arg(long, default_value = START_FEN)]
        fen: String,
    },
    /// Parse a FEN and print the board.
    Fen {
        fen: String,
        #[arg(long, default_value_t = false)]
        flipped: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let reconnect = parse_reconnect(Some(&cli.reconnect), cli.reconnect_initial_ms, cli.reconnect_max_ms)?;
    let config = ClientConfig::build(
        &cli.api_url,
        cli.ws_url.as_deref(),
        cli.session_token.clone(),
        cli.request_timeout_secs,
        reconnect,
    )?;

    match cli.command {
        Command::Register { username, password } => run_register(&config, &username, &password).await,
        Command::Login { username, password } => run_login(&config, &username, &password).await,
        Command::Logout => run_logout(&config).await,
        Command::Whoami => run_whoami(&config).await,
        Command::Queue { time_ms, increment_ms } => run_queue(&config, time_ms, increment_ms).await,
        Command::Matches => run_matches(&config).await,
        Command::Watch { match_id } => run_room(&config, &match_id, false).await,
        Command::Play { match_id } => run_room(&config, &match_id, true).await,
        Command::Moves { square, fen } => run_moves(&config, &fen, &square).await,
        Command::Fen { fen, flipped } => run_fen(&fen, flipped),
    }
}

async fn run_register(config: &ClientConfig, username: &str, password: &str) -> Result<(), CliError> {
    ApiClient::new(config)?.register(username, password).await?;
    println!("registered {username}");
    Ok(())
}

async fn run_login(config: &ClientConfig, username: &str, password: &str) -> Result<(), CliError> {
    match ApiClient::new(config)?.login(username, password).await? {
        Some(token) => println!("export MATCHROOM_SESSION_TOKEN={token}"),
        None => eprintln!("logged in, but the server set no session cookie"),
    }
    Ok(())
}

async fn run_logout(config: &ClientConfig) -> Result<(), CliError> {
    ApiClient::new(config)?.logout().await?;
    println!("logged out");
    Ok(())
}

async fn run_whoami(config: &ClientConfig) -> Result<(), CliError> {
    let username = ApiClient::new(config)?.validate_session().await.ok_or(CliError::NotLoggedIn)?;
    println!("{username}");
    Ok(())
}

async fn run_queue(config: &ClientConfig, time_ms: u64, increment_ms: u64) -> Result<(), CliError> {
    let api = ApiClient::new(config)?;
    api.join_queue(time_ms, increment_ms).await?;
    eprintln!("queued for {}+{}; waiting for an opponent (ctrl-c to leave)", time_ms / 1_000, increment_ms / 1_000);

    let assigned = tokio::select! {
        result = api.wait_for_match() => result,
        _ = tokio::signal::ctrl_c() => {
            api.leave_queue(time_ms, increment_ms).await?;
            eprintln!("left the queue");
            return Ok(());
        }
    };

    let assignment = match assigned {
        Ok(assignment) => assignment,
        Err(e) => {
            if let Err(leave_err) = api.leave_queue(time_ms, increment_ms).await {
                tracing::warn!(error = %leave_err, "failed to leave queue after stream error");
            }
            return Err(e.into());
        }
    };

    print_json(&json!({
        "matchID": assignment.match_id,
        "timeFormatInMilliseconds": assignment.time_format_ms,
        "incrementInMilliseconds": assignment.increment_ms,
    }))?;
    eprintln!("play it with: matchroom-cli play {}", assignment.match_id);
    Ok(())
}

async fn run_matches(config: &ClientConfig) -> Result<(), CliError> {
    let matches = ApiClient::new(config)?.list_live_matches().await?;
    print_json(&serde_json::to_value(matches)?)
}

async fn run_moves(config: &ClientConfig, fen_str: &str, square: &str) -> Result<(), CliError> {
    let index = geometry::parse_square(square).ok_or_else(|| CliError::InvalidSquare(square.to_owned()))?;
    let legal = ApiClient::new(config)?.legal_moves(fen_str, index).await?;
    let names = |squares: &[u8]| -> Vec<Value> {
        squares
            .iter()
            .filter_map(|sq| geometry::square_name(*sq))
            .map(Value::String)
            .collect()
    };
    print_json(&json!({
        "square": square,
        "moves": names(&legal.moves),
        "captures": names(&legal.captures),
        "triggerPromotion": legal.trigger_promotion,
    }))
}

fn run_fen(fen_str: &str, flipped: bool) -> Result<(), CliError> {
    let position = fen::parse(fen_str);
    print!("{}", render_board(&position, flipped, None));
    println!("{} to move", position.active_color.as_str());
    println!("{}", fen::serialize(&position));
    Ok(())
}

async fn run_room(config: &ClientConfig, match_id: &str, interactive: bool) -> Result<(), CliError> {
    let api = ApiClient::new(config)?;
    let session = MatchSession::open(match_id, config, api, TungsteniteConnector);
    let mut changes = session.subscribe();
    let mut view = RoomView::new(Instant::now());
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut ticker = tokio::time::interval(CLOCK_TICK);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The ticker rewrites its line in place until the next full render.
    let mut ticker_shown = false;

    if interactive {
        eprintln!("{PLAY_HELP}");
    }

    let result = loop {
        tokio::select! {
            changed = changes.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let rendered = view.on_push(&*session.store().lock().await, Instant::now());
                show_room(&rendered, &mut ticker_shown);
            }
            line = lines.next_line(), if interactive => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break Ok(()),
                    Err(e) => break Err(e.into()),
                };
                match handle_play_line(&session, &line).await {
                    Ok(true) => {
                        let rendered = view.redraw(&*session.store().lock().await, Instant::now());
                        show_room(&rendered, &mut ticker_shown);
                    }
                    Ok(false) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }
            _ = ticker.tick() => {
                if let Some(status) = view.tick(Instant::now()) {
                    print!("\r{status}\x1b[K");
                    if let Err(e) = std::io::stdout().flush() {
                        break Err(e.into());
                    }
                    ticker_shown = true;
                }
            }
            _ = tokio::signal::ctrl_c() => break Ok(()),
        }
    };

    session.leave().await;
    result
}

fn show_room(rendered: &str, ticker_shown: &mut bool) {
    if std::mem::take(ticker_shown) {
        println!();
    }
    println!("{rendered}");
}

/// Returns `Ok(false)` when the user asked to quit.
async fn handle_play_line(session: &MatchSession<ApiClient>, line: &str) -> Result<bool, CliError> {
    let Some(input) = parse_play_input(line) else {
        eprintln!("unrecognized input `{}`; type `help`", line.trim());
        return Ok(true);
    };

    match input {
        PlayInput::Square(square) => {
            let outcome = session.click(square).await?;
            report_outcome(&outcome);
        }
        PlayInput::Back => session.store().lock().await.step_back(),
        PlayInput::Forward => session.store().lock().await.step_forward(),
        PlayInput::Start => session.store().lock().await.jump_to_start(),
        PlayInput::Latest => session.store().lock().await.jump_to_latest(),
        PlayInput::Event(kind) => session.send_event(kind)?,
        PlayInput::Accept | PlayInput::Decline => {
            if session.resolve_event(input == PlayInput::Accept).await?.is_none() {
                eprintln!("no pending proposal");
            }
        }
        PlayInput::Board => {}
        PlayInput::Help => eprintln!("{PLAY_HELP}"),
        PlayInput::Quit => return Ok(false),
    }
    Ok(true)
}

fn report_outcome(outcome: &InputOutcome) {
    let name = |square: u8| geometry::square_name(square).unwrap_or_default();
    match outcome {
        InputOutcome::Ignored => eprintln!("board is not accepting moves right now"),
        InputOutcome::Cleared => eprintln!("selection cleared"),
        InputOutcome::Selected { square, legal } => {
            let targets: Vec<String> = legal.moves.iter().chain(&legal.captures).map(|sq| name(*sq)).collect();
            if targets.is_empty() {
                eprintln!("{} selected; no legal moves", name(*square));
            } else {
                eprintln!("{} selected; moves: {}", name(*square), targets.join(" "));
            }
        }
        InputOutcome::PromotionPending { to, offer, .. } => {
            let [queen, knight, rook, bishop] = offer.map(name);
            eprintln!("promotion on {}: queen {queen}, knight {knight}, rook {rook}, bishop {bishop}", name(*to));
        }
        InputOutcome::Submit(post) => {
            eprintln!("sent {}{}{}", name(post.piece), name(post.to), post.promotion_string);
        }
    }
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
