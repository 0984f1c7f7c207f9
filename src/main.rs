use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
};
use tabledrill::{
    app::{App, Engine},
    config::{Config, ConfigStore, FileConfigStore},
    feedback::{Feedback, Silent, TerminalBell},
    high_score::{HighScoreStore, MemoryHighScoreStore, SqliteHighScoreStore},
    logging,
    runtime::{CrosstermEventSource, Runner},
    session::SessionEngine,
    ui,
};

/// timed multiplication table drill with streak bonuses
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Answer as many multiplication problems as you can before the clock runs out. Consecutive correct answers earn streak bonuses, and every missed problem is listed for review at the end."
)]
pub struct Cli {
    /// tables to practice, comma separated; skips the menu
    #[clap(short = 't', long, value_delimiter = ',', value_parser = clap::value_parser!(u32).range(1..=12))]
    tables: Vec<u32>,

    /// session length in seconds
    #[clap(short = 's', long, value_parser = clap::value_parser!(u32).range(1..))]
    secs: Option<u32>,

    /// pause after each answer before the next problem, in milliseconds
    #[clap(long)]
    settle_ms: Option<u64>,

    /// disable the terminal bell
    #[clap(long)]
    no_sound: bool,

    /// forget the stored high score and exit
    #[clap(long)]
    reset_high_score: bool,

    /// write debug output to the log file
    #[clap(short = 'v', long)]
    verbose: bool,
}

impl Cli {
    /// Flags given on the command line win over the stored config
    fn apply(&self, mut cfg: Config) -> Config {
        if !self.tables.is_empty() {
            cfg.tables = self.tables.clone();
        }
        if let Some(secs) = self.secs {
            cfg.session_secs = secs;
        }
        if let Some(ms) = self.settle_ms {
            cfg.settle_delay_ms = ms;
        }
        if self.no_sound {
            cfg.sound = false;
        }
        cfg
    }
}

fn open_store() -> Box<dyn HighScoreStore> {
    match SqliteHighScoreStore::new() {
        Ok(store) => Box::new(store),
        Err(e) => {
            log::warn!("high score database unavailable, scores will not persist: {e}");
            Box::new(MemoryHighScoreStore::default())
        }
    }
}

fn build_app(cfg: &Config) -> App {
    let feedback: Box<dyn Feedback> = if cfg.sound {
        Box::new(TerminalBell)
    } else {
        Box::new(Silent)
    };
    let engine: Engine =
        SessionEngine::new(open_store(), feedback).with_session_secs(cfg.session_secs);
    App::new(engine, cfg.selected_tables(), cfg.settle_delay())
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    if cli.reset_high_score {
        SqliteHighScoreStore::new()?.clear()?;
        log::info!("high score reset");
        println!("high score reset");
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config_store = FileConfigStore::new();
    let cfg = cli.apply(config_store.load());
    let mut app = build_app(&cfg);
    if !cli.tables.is_empty() {
        app.start_session();
    }

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Quitting mid-session still counts towards the high score
    if app.engine.is_running() {
        app.stop_session();
    }

    let saved = Config {
        tables: app.menu.selected.iter().copied().collect(),
        ..cfg
    };
    if let Err(e) = config_store.save(&saved) {
        log::warn!("could not save config: {e}");
    }

    result
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new());

    loop {
        terminal.draw(|f| ui::draw(app, f))?;
        runner.step().apply(app);

        if app.should_quit {
            break;
        }
    }

    Ok(())
}
