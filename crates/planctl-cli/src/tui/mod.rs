//! Interactive dashboard for browsing and transitioning plans.

pub mod app;
mod ui;

use std::io;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;

use planctl_client::http::ManagementClient;
use planctl_core::guard;
use planctl_core::lifecycle::PlanAction;

use app::App;

/// Launch the interactive dashboard for one API.
pub async fn run_dashboard(client: ManagementClient, api_id: String) -> Result<()> {
    // Set up terminal.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(client, api_id);

    // Initial data load.
    app.refresh().await;

    let result = run_event_loop(&mut terminal, &mut app).await;

    // Restore terminal.
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let tick_rate = app.tick_rate;

    loop {
        terminal.draw(|f| ui::render(f, app))?;

        // Poll for events with a timeout matching the tick rate.
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                if app.pending.is_some() {
                    handle_prompt_key(app, key.code, key.modifiers).await;
                } else {
                    handle_key(app, key.code, key.modifiers).await;
                }
            }
        } else if app.pending.is_none() {
            // Tick refresh pauses while a confirmation is open.
            app.refresh().await;
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

/// Keys while a confirmation prompt is open. Typed characters feed the
/// type-to-confirm input.
async fn handle_prompt_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    match code {
        KeyCode::Esc => app.cancel_pending(),
        KeyCode::Enter => app.confirm_pending().await,
        KeyCode::Backspace => app.pending_backspace(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char(c) => app.pending_push(c),
        _ => {}
    }
}

async fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    // Clear the outcome banner on any keypress.
    app.notification = None;

    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.navigate_back(),
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
            app.should_quit = true;
        }
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Tab => app.cycle_filter().await,
        KeyCode::Char('r') => app.refresh().await,
        KeyCode::Char('p') => begin(app, PlanAction::Publish).await,
        KeyCode::Char('d') => begin(app, PlanAction::Deprecate).await,
        KeyCode::Char('c') => begin(app, PlanAction::Close).await,
        KeyCode::Char('?') => app.show_help = true,
        _ => {}
    }
}

async fn begin(app: &mut App, action: PlanAction) {
    if let Err(e) = app.begin_action(action).await {
        app.notification = Some(guard::error_notification(&e));
    }
}
