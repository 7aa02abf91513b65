//! Strata - A terminal viewer for manifest-driven data packages.

use anyhow::{bail, Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use strata::app::{App, Focus, InputMode, Theme};
use strata::config::ViewerConfig;
use strata::data::EntityId;
use strata::plain;
use strata::search::SearchOutcome;
use strata::session::{DetailState, Session};
use strata::source::open_source;
use strata::ui;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "strata")]
#[command(about = "A terminal viewer for manifest-driven data packages", long_about = None)]
struct Args {
    /// Query API base URL (http:// or https://) or package directory
    source: String,

    /// Print a view as plain text and exit
    #[arg(long, value_name = "KEY")]
    view: Option<String>,

    /// Print search results as plain text and exit
    #[arg(long, value_name = "QUERY")]
    search: Option<String>,

    /// Print one record as plain text and exit
    #[arg(long, num_args = 2, value_names = ["VIEW", "ID"])]
    detail: Option<Vec<String>>,

    /// Results shown per search category
    #[arg(long, value_name = "N")]
    search_limit: Option<usize>,

    /// Start with the light theme
    #[arg(long)]
    light: bool,

    /// Enable logging to specified file
    #[arg(long)]
    log: Option<PathBuf>,
}

impl Args {
    fn is_headless(&self) -> bool {
        self.view.is_some() || self.search.is_some() || self.detail.is_some()
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Set up logging if --log option is provided
    if let Some(log_path) = &args.log {
        let file = std::fs::File::create(log_path)
            .with_context(|| format!("Failed to open log file {}", log_path.display()))?;
        let filter = EnvFilter::try_from_env("STRATA_LOG").unwrap_or_else(|_| EnvFilter::new("debug"));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        tracing::info!("Starting Strata");
    }

    let mut config = ViewerConfig::default();
    if let Some(limit) = args.search_limit {
        config = config.with_search_limit(limit);
    }

    let runtime = tokio::runtime::Runtime::new()?;
    let source = open_source(&args.source, &config.http)?;
    let mut session = runtime
        .block_on(Session::load(source, config))
        .with_context(|| format!("Failed to load manifest from {}", args.source))?;

    if args.is_headless() {
        let text = runtime.block_on(run_headless(&mut session, &args))?;
        print!("{text}");
        return Ok(());
    }

    let mut app = App::new(session, runtime.handle().clone());
    if args.light {
        app.theme = Theme::GruvboxLight;
    }
    app.start(None);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {}", err);
    }

    if args.log.is_some() {
        tracing::info!("Strata exited");
    }

    Ok(())
}

async fn run_headless(session: &mut Session, args: &Args) -> Result<String> {
    let mut out = String::new();

    if let Some(key) = &args.view {
        if !session.switch_to_view(key).await {
            bail!("No view named '{}'", key);
        }
        if let Some(content) = session.view().content() {
            out.push_str(&plain::view_text(content));
        }
    }

    if let Some(query) = &args.search {
        session.preload_search_index().await;
        match session.search(query) {
            SearchOutcome::Results(results) => {
                let meta_max = session.config().search.meta_truncate;
                out.push_str(&plain::search_text(&results, meta_max));
            },
            SearchOutcome::Hidden => {
                let min = session.config().search.min_query_chars;
                out.push_str(&format!("Query must be at least {min} characters\n"));
            },
            SearchOutcome::NotReady => bail!("Search index is not ready"),
        }
    }

    if let Some([view, id]) = args.detail.as_deref() {
        session.open_detail(view, &EntityId::from(id.as_str())).await;
        match session.detail() {
            DetailState::Closed => bail!("No detail view named '{}'", view),
            DetailState::Error(message) => bail!("{}", message),
            state => out.push_str(&plain::detail_text(state)),
        }
    }

    Ok(out)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, mut app: App) -> Result<()> {
    let mut pending_g = false; // For 'gg' vim binding

    loop {
        terminal.draw(|f| ui::draw(f, &mut app))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && handle_key(&mut app, key, &mut pending_g) {
                    return Ok(());
                }
            }
        }

        app.tick(Instant::now());
    }
}

/// Dispatch one key press. Returns true when the app should quit.
fn handle_key(app: &mut App, key: KeyEvent, pending_g: &mut bool) -> bool {
    // Note input - handle separately
    if let InputMode::Note(draft) = &mut app.input {
        match key.code {
            KeyCode::Enter => app.submit_note(),
            KeyCode::Esc => app.input = InputMode::Normal,
            KeyCode::Tab => draft.annotation_type = draft.annotation_type.next(),
            KeyCode::Backspace => {
                draft.content.pop();
            },
            KeyCode::Char(c) => draft.content.push(c),
            _ => {},
        }
        return false;
    }

    // Table filter input
    if matches!(app.input, InputMode::Filter) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => app.input = InputMode::Normal,
            KeyCode::Backspace => app.edit_filter(|f| {
                f.pop();
            }),
            KeyCode::Char(c) => app.edit_filter(|f| f.push(c)),
            _ => {},
        }
        return false;
    }

    // Search mode - handle separately
    if app.search.is_active() {
        match (key.modifiers, key.code) {
            (_, KeyCode::Esc) => app.search.cancel(),
            (_, KeyCode::Enter) => app.open_search_result(),
            (_, KeyCode::Down) | (KeyModifiers::CONTROL, KeyCode::Char('n')) => {
                if let Some(results) = app.search.results_mut() {
                    results.move_highlight(1);
                }
            },
            (_, KeyCode::Up) | (KeyModifiers::CONTROL, KeyCode::Char('p')) => {
                if let Some(results) = app.search.results_mut() {
                    results.move_highlight(-1);
                }
            },
            (_, KeyCode::Tab) => app.show_more_results(),
            (_, KeyCode::Backspace) => app.search.backspace(),
            (_, KeyCode::Char(c)) => app.search.input(c),
            _ => {},
        }
        return false;
    }

    // Detail overlay
    if app.session.detail().is_open() {
        match (key.modifiers, key.code) {
            (KeyModifiers::NONE, KeyCode::Esc) | (KeyModifiers::NONE, KeyCode::Char('q')) => {
                app.close_detail();
            },
            (KeyModifiers::NONE, KeyCode::Down)
            | (KeyModifiers::NONE, KeyCode::Char('j'))
            | (KeyModifiers::NONE, KeyCode::Tab) => app.move_detail_cursor(1),
            (KeyModifiers::NONE, KeyCode::Up)
            | (KeyModifiers::NONE, KeyCode::Char('k'))
            | (KeyModifiers::SHIFT, KeyCode::BackTab) => app.move_detail_cursor(-1),
            (KeyModifiers::NONE, KeyCode::Enter) => app.activate_detail(),
            (KeyModifiers::NONE, KeyCode::Char('a')) => app.start_note(),
            (KeyModifiers::NONE, KeyCode::Char('x')) => app.delete_selected_note(),
            (KeyModifiers::NONE, KeyCode::Char('c')) => app.copy(),
            (KeyModifiers::CONTROL, KeyCode::Char('d')) => {
                app.detail_scroll = app.detail_scroll.saturating_add(10);
            },
            (KeyModifiers::CONTROL, KeyCode::Char('u')) => {
                app.detail_scroll = app.detail_scroll.saturating_sub(10);
            },
            _ => {},
        }
        return false;
    }

    // Normal mode
    match (key.modifiers, key.code) {
        // Quit
        (KeyModifiers::NONE, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
            return true;
        },

        // Navigation
        (KeyModifiers::NONE, KeyCode::Up) | (KeyModifiers::NONE, KeyCode::Char('k')) => {
            app.move_cursor(-1);
        },
        (KeyModifiers::NONE, KeyCode::Down) | (KeyModifiers::NONE, KeyCode::Char('j')) => {
            app.move_cursor(1);
        },
        (KeyModifiers::NONE, KeyCode::Left) | (KeyModifiers::NONE, KeyCode::Char('h')) => {
            app.move_left();
        },
        (KeyModifiers::NONE, KeyCode::Right) | (KeyModifiers::NONE, KeyCode::Char('l')) => {
            app.move_right();
        },
        (KeyModifiers::NONE, KeyCode::Enter) => app.activate(),

        // Vim navigation
        (KeyModifiers::NONE, KeyCode::Char('g')) => {
            if *pending_g {
                app.goto_first();
                *pending_g = false;
            } else {
                *pending_g = true;
            }
            return false;
        },
        (KeyModifiers::SHIFT, KeyCode::Char('G')) => app.goto_last(),
        (KeyModifiers::CONTROL, KeyCode::Char('f')) => app.move_cursor(15),
        (KeyModifiers::CONTROL, KeyCode::Char('b')) => app.move_cursor(-15),

        // Views
        (KeyModifiers::NONE, KeyCode::Tab) => app.cycle_tab(1),
        (KeyModifiers::SHIFT, KeyCode::BackTab) => app.cycle_tab(-1),
        (KeyModifiers::NONE, KeyCode::Char(c @ '1'..='9')) => {
            app.select_tab(c as usize - '1' as usize);
        },

        // Search
        (KeyModifiers::NONE, KeyCode::Char('/')) => {
            app.search.start();
            app.start_index_build();
        },

        // Tree
        (KeyModifiers::NONE, KeyCode::Char('i')) => app.node_info(),
        (KeyModifiers::SHIFT, KeyCode::Char('E')) => app.set_all_expanded(true),
        (KeyModifiers::SHIFT, KeyCode::Char('C')) => app.set_all_expanded(false),
        (KeyModifiers::NONE, KeyCode::Char('v')) => app.toggle_valid_only(),
        (KeyModifiers::NONE, KeyCode::Esc) if app.focus == Focus::Items => {
            app.focus = Focus::Main;
        },

        // Table
        (KeyModifiers::NONE, KeyCode::Char('s')) => app.toggle_sort(),
        (KeyModifiers::NONE, KeyCode::Char('f')) => app.start_filter(),

        // Features
        (KeyModifiers::NONE, KeyCode::Char('c')) => app.copy(),
        (KeyModifiers::SHIFT, KeyCode::Char('T')) => app.cycle_theme(),
        (KeyModifiers::SHIFT, KeyCode::Char('?')) => {
            app.status = "Help: q=quit, j/k=nav, Enter=open, /=search, Tab=next view, c=copy, T=theme".to_string();
        },

        _ => {},
    }
    *pending_g = false;
    false
}
