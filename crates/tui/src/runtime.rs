//! Runtime: terminal lifecycle and the event loop.
//!
//! - Own the terminal (raw mode, alternate screen, mouse capture).
//! - A dedicated input thread blocks on `crossterm::event::read()` and
//!   forwards events over a channel; keeping the blocking read on its own
//!   OS thread avoids lost or delayed events in some terminals.
//! - One `select!` loop routes terminal input, resolved network calls, the
//!   debounce tick, and the telemetry interval into the app; effects come
//!   back out and are executed by [`cmd`].
//! - Smart ticking: the clock ticks fast only while a debounce deadline is
//!   armed, and drops to a slow idle interval otherwise.

use std::io::Stdout;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, MouseEventKind};
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ghosttyper_api::BackendClient;
use ghosttyper_types::{Effect, SessionEvent, SessionSettings};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tracing::warn;

use crate::app::App;
use crate::cmd;
use crate::ui;

/// Tick interval while a debounce deadline is armed.
const FAST_TICK: Duration = Duration::from_millis(50);

/// Tick interval while nothing is pending.
const IDLE_TICK: Duration = Duration::from_millis(500);

/// Spawn the input thread; events arrive over the returned channel.
///
/// Mouse-move events are dropped at the source since nothing downstream
/// consumes them.
fn spawn_input_thread() -> mpsc::Receiver<Event> {
    let (sender, receiver) = mpsc::channel(500);
    std::thread::spawn(move || {
        loop {
            match event::read() {
                Ok(Event::Mouse(mouse)) if mouse.kind == MouseEventKind::Moved => continue,
                Ok(event) => {
                    if sender.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(error) => {
                    warn!(%error, "failed to read terminal event");
                    break;
                }
            }
        }
    });
    receiver
}

/// Put the terminal into raw mode and enter the alternate screen.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

/// Restore terminal settings and leave the alternate screen.
fn cleanup_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

fn make_ticker(interval: Duration) -> time::Interval {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

/// Set up the terminal, run the event loop, and clean up on exit.
pub async fn run_app(settings: SessionSettings, client: BackendClient, telemetry_interval: Duration) -> Result<()> {
    let mut input_receiver = spawn_input_thread();
    // Results of spawned network calls flow back in as session events.
    let (events_tx, mut events_rx) = mpsc::unbounded_channel::<SessionEvent>();

    let mut app = App::new(settings, None);
    let mut terminal = setup_terminal()?;
    let result = event_loop(
        &mut terminal,
        &mut app,
        &mut input_receiver,
        &events_tx,
        &mut events_rx,
        &client,
        telemetry_interval,
    )
    .await;
    cleanup_terminal(&mut terminal)?;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    app: &mut App,
    input_receiver: &mut mpsc::Receiver<Event>,
    events_tx: &mpsc::UnboundedSender<SessionEvent>,
    events_rx: &mut mpsc::UnboundedReceiver<SessionEvent>,
    client: &BackendClient,
    telemetry_interval: Duration,
) -> Result<()> {
    let mut current_interval = IDLE_TICK;
    let mut ticker = make_ticker(current_interval);
    let mut telemetry = make_ticker(telemetry_interval);

    terminal.draw(|frame| ui::draw(frame, app))?;

    loop {
        let target_interval = if app.session.pending_trigger() { FAST_TICK } else { IDLE_TICK };
        if target_interval != current_interval {
            current_interval = target_interval;
            ticker = make_ticker(current_interval);
        }

        let mut effects: Vec<Effect> = Vec::new();
        let mut needs_render = false;
        tokio::select! {
            maybe_event = input_receiver.recv() => {
                match maybe_event {
                    Some(Event::Key(key)) if key.kind != KeyEventKind::Release => {
                        effects = app.handle_key(key, Instant::now());
                        needs_render = true;
                    }
                    Some(Event::Mouse(mouse)) => {
                        effects = app.handle_mouse(mouse, Instant::now());
                        needs_render = true;
                    }
                    Some(Event::Resize(..)) => {
                        // Redrawing re-measures every field, which also
                        // repositions or hides the overlay.
                        needs_render = true;
                    }
                    Some(_) => {}
                    // Input channel closed; shut down cleanly.
                    None => break,
                }
            }

            Some(event) = events_rx.recv() => {
                effects = app.dispatch(event, Instant::now());
                needs_render = true;
            }

            _ = ticker.tick() => {
                effects = app.dispatch(SessionEvent::Tick, Instant::now());
                needs_render = !effects.is_empty();
            }

            _ = telemetry.tick() => {
                effects = app.dispatch(SessionEvent::TelemetryTick, Instant::now());
            }

            _ = signal::ctrl_c() => break,
        }

        let commands = cmd::from_effects(app, effects);
        cmd::run_cmds(commands, client, events_tx);

        if app.should_quit {
            break;
        }
        if needs_render {
            terminal.draw(|frame| ui::draw(frame, app))?;
        }
    }
    Ok(())
}
