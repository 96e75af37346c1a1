use std::io::{self, stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use clap::Parser;
use crossterm::{
    cursor,
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind, MouseEventKind},
    execute, terminal,
};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use flappy_ado::audio::{AudioEngine, FlapCadence};
use flappy_ado::config::GameConfig;
use flappy_ado::driver::{Driver, SystemClock};
use flappy_ado::game::{Game, GameEvent};
use flappy_ado::leaderboard::{self, LeaderboardClient, Session, Tagged, Update, UNKNOWN_IP};
use flappy_ado::render::{self, FrameInput, Overlay, PixelBuf};

#[derive(Parser, Debug)]
#[command(name = "flappy-ado")]
#[command(about = "Flappy Ado in your terminal, global leaderboard included")]
struct Cli {
    /// Leaderboard API base URL
    #[arg(long, default_value = "http://localhost:3000/api/flappyado")]
    api: String,

    /// Obstacle RNG seed; omit for a fresh course every launch
    #[arg(long)]
    seed: Option<u64>,

    /// Disable all sound
    #[arg(long, default_value_t = false)]
    mute: bool,

    /// Frames per second
    #[arg(long, default_value_t = 30)]
    fps: u64,
}

/// Which modal layer owns the keyboard right now.
enum Ui {
    Start,
    Playing,
    GameOver,
    NameEntry { input: String, raw_score: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // Logs go to stderr; redirect it to a file to watch them, the alternate
    // screen owns stdout.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let mut out = stdout();
    setup_terminal(&mut out)?;
    let result = run(&cli, &mut out).await;
    restore_terminal(&mut out)?;
    result
}

fn setup_terminal(out: &mut io::Stdout) -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(
        out,
        terminal::EnterAlternateScreen,
        cursor::Hide,
        terminal::DisableLineWrap,
        EnableMouseCapture,
    )
}

fn restore_terminal(out: &mut io::Stdout) -> io::Result<()> {
    execute!(
        out,
        DisableMouseCapture,
        terminal::LeaveAlternateScreen,
        cursor::Show,
        terminal::EnableLineWrap,
    )?;
    terminal::disable_raw_mode()
}

async fn run(cli: &Cli, out: &mut io::Stdout) -> Result<()> {
    let (cols, rows) = terminal::size()?;
    let mut buf = PixelBuf::new(cols as usize, rows as usize * 2);

    let seed = cli.seed.unwrap_or_else(rand::random);
    let mut game = Game::new(GameConfig::default(), seed);
    let mut driver = Driver::new(SystemClock::new());
    let mut audio = AudioEngine::new(cli.mute);
    let mut cadence = FlapCadence::new();
    let mut session = Session::new();
    let mut ui = Ui::Start;
    let mut show_dashboard = false;

    let client = LeaderboardClient::new(&cli.api);
    let (tx, mut rx) = mpsc::channel::<Tagged>(16);
    leaderboard::spawn_fetch_ip(&client, &tx, session.round);
    leaderboard::spawn_fetch_top(&client, &tx, session.round);
    info!(seed, api = %cli.api, audio = audio.is_live(), "flappy-ado starting");

    let frame_dur = Duration::from_millis(1000 / cli.fps.max(1));

    'main: loop {
        let frame_start = Instant::now();

        // Leaderboard responses, never on the tick path
        while let Ok(msg) = rx.try_recv() {
            let was_ip = matches!(msg.update, Update::Ip(_));
            if session.apply(msg) && was_ip && session.is_identified() {
                leaderboard::spawn_fetch_personal(
                    &client,
                    &tx,
                    session.round,
                    session.user_ip.clone(),
                );
            }
        }
        game.sync_high_score(session.global_best());

        // Input
        while event::poll(Duration::ZERO)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if let Ui::NameEntry { input, raw_score } = &mut ui {
                        match key.code {
                            KeyCode::Enter => {
                                if let Some(name) = leaderboard::validate_name(input) {
                                    let score = *raw_score;
                                    submit(&client, &tx, &mut session, name, score);
                                    ui = Ui::GameOver;
                                }
                            }
                            KeyCode::Esc => ui = Ui::GameOver,
                            KeyCode::Backspace => {
                                input.pop();
                            }
                            KeyCode::Char(c) if !c.is_control() && input.chars().count() < 20 => {
                                input.push(c);
                            }
                            _ => {}
                        }
                        continue;
                    }
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => break 'main,
                        KeyCode::Char(' ') | KeyCode::Up | KeyCode::Enter => {
                            flap_pressed(
                                &mut ui,
                                &mut game,
                                &mut driver,
                                &mut audio,
                                &mut cadence,
                                &mut session,
                                &client,
                                &tx,
                            );
                        }
                        KeyCode::Char('d') | KeyCode::Char('D') => {
                            if matches!(ui, Ui::Playing) {
                                show_dashboard = !show_dashboard;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Mouse(m) if matches!(m.kind, MouseEventKind::Down(_)) => {
                    if !matches!(ui, Ui::NameEntry { .. }) {
                        flap_pressed(
                            &mut ui,
                            &mut game,
                            &mut driver,
                            &mut audio,
                            &mut cadence,
                            &mut session,
                            &client,
                            &tx,
                        );
                    }
                }
                Event::Resize(c, r) => buf.resize(c as usize, r as usize * 2),
                _ => {}
            }
        }

        // Physics
        for ev in driver.tick(&mut game) {
            match ev {
                GameEvent::ScoredPair { raw_score } => audio.play_score(raw_score),
                GameEvent::NewLocalBest { .. } => audio.play_best(),
                GameEvent::Crashed(_) => audio.play_crash(),
                GameEvent::RoundOver { raw_score, round } => {
                    audio.stop_music();
                    info!(raw_score, display = raw_score / 2, round, "round over");
                    if session.has_played_before {
                        // Returning player: auto-submit under the stored
                        // name, the server decides whether it sticks.
                        let name = session.existing_name.clone();
                        submit(&client, &tx, &mut session, name, raw_score);
                        ui = Ui::GameOver;
                    } else {
                        ui = Ui::NameEntry {
                            input: String::new(),
                            raw_score,
                        };
                    }
                }
            }
        }

        // Render
        let overlay = match &ui {
            Ui::Start => Overlay::Start,
            Ui::Playing => Overlay::Playing,
            Ui::GameOver => Overlay::GameOver {
                submitting: session.submitting,
            },
            Ui::NameEntry { input, .. } => Overlay::NameEntry { input: input.as_str() },
        };
        let frame = FrameInput {
            game: &game,
            session: &session,
            overlay,
            show_dashboard,
            click_speed: cadence.clicks_per_second,
            music_playing: audio.music_playing(),
        };
        render::draw(&frame, &mut buf);
        buf.flush(out)?;

        // Frame pacing; the await lets background fetches breathe
        let elapsed = frame_start.elapsed();
        if elapsed < frame_dur {
            tokio::time::sleep(frame_dur - elapsed).await;
        }
    }

    Ok(())
}

/// A flap press means different things per mode: start a round, flap the
/// bird, or restart after a crash.
#[allow(clippy::too_many_arguments)]
fn flap_pressed(
    ui: &mut Ui,
    game: &mut Game,
    driver: &mut Driver<SystemClock>,
    audio: &mut AudioEngine,
    cadence: &mut FlapCadence,
    session: &mut Session,
    client: &LeaderboardClient,
    tx: &mpsc::Sender<Tagged>,
) {
    match ui {
        Ui::Start | Ui::GameOver => {
            driver.start(game);
            session.advance_round(game.round);
            session.submitting = false;
            cadence.reset();
            // Round-start refresh keeps the best display tracking the board.
            leaderboard::spawn_fetch_top(client, tx, session.round);
            if session.is_identified() {
                leaderboard::spawn_fetch_personal(client, tx, session.round, session.user_ip.clone());
            }
            audio.start_music();
            audio.play_start();
            *ui = Ui::Playing;
        }
        Ui::Playing => {
            if game.flap() {
                if let Some(speed) = cadence.record(driver.now_ms()) {
                    audio.retune_music(speed);
                }
                audio.play_flap();
            }
        }
        Ui::NameEntry { .. } => {}
    }
}

fn submit(
    client: &LeaderboardClient,
    tx: &mpsc::Sender<Tagged>,
    session: &mut Session,
    name: String,
    raw_score: u32,
) {
    let ip = if session.user_ip.is_empty() {
        UNKNOWN_IP.to_string()
    } else {
        session.user_ip.clone()
    };
    session.submitting = true;
    leaderboard::spawn_submit(client, tx, session.round, name, raw_score, ip);
}
