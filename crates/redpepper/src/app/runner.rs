//! Application runner and event loop.
//!
//! Handles terminal setup/teardown and the main event loop. Events
//! from the input reader, the tick timer, scheduled one-shots, and
//! command workers all funnel into one mpsc channel consumed here;
//! state mutation happens serially in `handle_event`, effects are
//! performed afterwards, and the render cache is consulted once per
//! drained batch.

use std::io;
use std::process::Command;
use std::sync::mpsc::{self, Sender};
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind, KeyboardEnhancementFlags,
    PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::Paragraph;
use ratatui::Terminal;

use crate::config::Config;
use crate::events::{AppEvent, Effect};
use crate::jj::{self, CommandRequest, ExecResult};

use super::render::RenderCache;
use super::state::{App, RunState};

const RENDER_INTERVAL: Duration = Duration::from_millis(8);

/// Everything the CLI layer hands to the loop: resolved config, the
/// repository root, and an optional startup script.
pub struct CliContext {
    pub config: Config,
    pub cwd: std::path::PathBuf,
    pub location: String,
    pub script: Option<String>,
}

/// Entry point: set up the terminal and run the event loop.
pub fn run(ctx: CliContext) -> io::Result<()> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(EnableMouseCapture)?;
    stdout.execute(SetTitle(format!("redpepper - {}", ctx.location)))?;
    stdout.execute(PushKeyboardEnhancementFlags(
        KeyboardEnhancementFlags::DISAMBIGUATE_ESCAPE_CODES,
    ))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_loop(&mut terminal, ctx);

    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableMouseCapture)?;
    terminal.backend_mut().execute(PopKeyboardEnhancementFlags)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Main event loop: process events until quit.
fn run_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, ctx: CliContext) -> io::Result<()> {
    let (event_tx, event_rx) = mpsc::channel::<AppEvent>();
    spawn_input_thread(event_tx.clone());
    spawn_tick_thread(event_tx.clone());

    let size = terminal.size()?;
    let mut app = App::new(ctx.config, ctx.cwd, size.width, size.height);
    let mut cache = RenderCache::new(RENDER_INTERVAL);

    let mut startup = app.refresh_effects();
    let interval = app.config.ui.auto_refresh_interval;
    if interval > 0 {
        startup.push(Effect::Schedule {
            after: Duration::from_secs(interval),
            event: AppEvent::AutoRefresh,
        });
    }
    if let Some(source) = ctx.script {
        startup.push(Effect::Emit(AppEvent::ScriptStarted(source)));
    }
    let mut quit = perform_effects(&mut app, terminal, &event_tx, startup)?;

    while !quit {
        let event = match event_rx.recv() {
            Ok(event) => event,
            Err(_) => break,
        };
        let effects = super::input::handle_event(&mut app, event);
        quit = perform_effects(&mut app, terminal, &event_tx, effects)?;
        // Drain any pending events before redraw
        while let Ok(event) = event_rx.try_recv() {
            let effects = super::input::handle_event(&mut app, event);
            quit = perform_effects(&mut app, terminal, &event_tx, effects)? || quit;
        }

        cache.mark_dirty();
        let frame = cache.frame(&mut app, Instant::now()).to_string();
        terminal.draw(|f| f.render_widget(Paragraph::new(frame), f.area()))?;
    }
    Ok(())
}

/// Perform the follow-up effects produced by one update. Only
/// interactive commands touch the terminal; everything else hands
/// work to other threads.
fn perform_effects(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    tx: &Sender<AppEvent>,
    effects: Vec<Effect>,
) -> io::Result<bool> {
    let mut quit = false;
    for effect in effects {
        match effect {
            Effect::Run(request) => jj::spawn_async(request, tx.clone()),
            Effect::RunInteractive(request) => run_interactive(app, terminal, request, tx)?,
            Effect::Schedule { after, event } => schedule_event(tx.clone(), after, event),
            Effect::Emit(event) => {
                let _ = tx.send(event);
            }
            Effect::Quit => quit = true,
        }
    }
    Ok(quit)
}

/// Hand the real terminal to the child process and block until it
/// exits; the completion event is posted like any other command.
fn run_interactive(
    app: &mut App,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    request: CommandRequest,
    tx: &Sender<AppEvent>,
) -> io::Result<()> {
    app.run_state = RunState::DelegatedToExternalProcess;
    disable_raw_mode()?;
    terminal.backend_mut().execute(DisableMouseCapture)?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;

    let status = Command::new("jj")
        .args(&request.args)
        .current_dir(&request.cwd)
        .status();

    terminal.backend_mut().execute(EnterAlternateScreen)?;
    terminal.backend_mut().execute(EnableMouseCapture)?;
    enable_raw_mode()?;
    terminal.clear()?;
    app.run_state = RunState::Normal;

    let result = match status {
        Ok(status) => ExecResult {
            ok: status.success(),
            exit_code: status.code().unwrap_or(-1),
            stdout: String::new(),
            stderr: if status.success() {
                String::new()
            } else {
                format!("exited with status {}", status.code().unwrap_or(-1))
            },
        },
        Err(err) => ExecResult::spawn_failure(&err),
    };
    let _ = tx.send(AppEvent::CommandDone {
        name: request.name,
        result,
    });
    Ok(())
}

fn schedule_event(tx: Sender<AppEvent>, after: Duration, event: AppEvent) {
    std::thread::spawn(move || {
        std::thread::sleep(after);
        let _ = tx.send(event);
    });
}

/// Spawn a thread to read terminal input events.
fn spawn_input_thread(sender: Sender<AppEvent>) {
    std::thread::spawn(move || loop {
        match event::read() {
            Ok(Event::Key(key)) => {
                if key.kind == KeyEventKind::Release {
                    continue;
                }
                if sender.send(AppEvent::Input(key)).is_err() {
                    break;
                }
            }
            Ok(Event::Mouse(mouse)) => {
                if sender.send(AppEvent::Mouse(mouse)).is_err() {
                    break;
                }
            }
            Ok(Event::Resize(cols, rows)) => {
                if sender.send(AppEvent::Resize(cols, rows)).is_err() {
                    break;
                }
            }
            Ok(Event::FocusGained) => {
                if sender.send(AppEvent::FocusGained).is_err() {
                    break;
                }
            }
            Ok(_) => {}
            Err(_) => break,
        }
    });
}

/// Drives flash expiry, script polling, and the render cadence.
fn spawn_tick_thread(sender: Sender<AppEvent>) {
    std::thread::spawn(move || loop {
        std::thread::sleep(RENDER_INTERVAL);
        if sender.send(AppEvent::Tick).is_err() {
            break;
        }
    });
}
