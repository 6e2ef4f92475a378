mod app;
mod config;
mod event;
mod generator;
mod ingest;
mod session;
mod store;
mod ui;

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Paragraph};
use tracing::info;
use tracing_subscriber::EnvFilter;

use app::App;
use config::{Config, ExampleBackend};
use event::{AppEvent, EventHandler};
use generator::client::{ExampleClient, FetchOptions};
use session::practice::Phase;
use session::scenario::Scenario;
use store::cache::ExampleCache;
use store::schema::{WORDBOOK_KEY, WordbookData};
use store::{JsonStore, load_json, save_json};
use ui::components::practice_area::PracticeArea;
use ui::layout::AppLayout;

#[derive(Parser)]
#[command(
    name = "vocabdr",
    version,
    about = "Terminal vocabulary practice with AI-generated example sentences",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[arg(short, long, global = true, help = "Theme name")]
    theme: Option<String>,

    #[arg(short, long, global = true, help = "Sentences per generated pack (1-20)")]
    count: Option<usize>,

    #[arg(short, long, global = true, value_enum, help = "Where example sentences come from")]
    backend: Option<ExampleBackend>,

    #[command(subcommand)]
    command: Option<Command>,

    /// Words to practice; defaults to the wordbook.
    words: Vec<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Practice typing example sentences.
    Practice {
        words: Vec<String>,
        #[arg(long, help = "Word to start with")]
        start: Option<String>,
    },
    /// Add words to the wordbook.
    Add {
        #[arg(required = true)]
        words: Vec<String>,
    },
    /// Remove a word from the wordbook.
    Remove { word: String },
    /// List the wordbook.
    List,
    /// Show the config file path, or write a default one with `--init`.
    Config {
        #[arg(long, help = "Write the default config if none exists")]
        init: bool,
    },
    /// Fetch one pack of example sentences and print it.
    Fetch {
        word: String,
        #[arg(long, default_value_t = 0, value_parser = clap::value_parser!(u8).range(0..=2))]
        scenario: u8,
        #[arg(long, help = "Ignore the cache")]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, load_error) = Config::load();
    if let Some(err) = load_error {
        eprintln!("Ignoring {}: {err:#}", Config::config_path().display());
    }
    if let Some(theme) = cli.theme {
        config.theme = theme;
    }
    if let Some(count) = cli.count {
        config.sentence_count = count;
    }
    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    config.validate();

    let store = JsonStore::new()?;

    match cli.command {
        None => run_practice(config, &store, cli.words, None),
        Some(Command::Practice { words, start }) => run_practice(config, &store, words, start),
        Some(Command::Add { words }) => {
            let mut book: WordbookData = load_json(&store, WORDBOOK_KEY);
            for word in &words {
                if book.add(word) {
                    println!("Added {}", word.trim());
                } else {
                    println!("Skipped {word:?} (blank or already saved)");
                }
            }
            save_json(&store, WORDBOOK_KEY, &book)
        }
        Some(Command::Remove { word }) => {
            let mut book: WordbookData = load_json(&store, WORDBOOK_KEY);
            if !book.remove(&word) {
                bail!("{word:?} is not in the wordbook");
            }
            save_json(&store, WORDBOOK_KEY, &book)?;
            println!("Removed {word}");
            Ok(())
        }
        Some(Command::List) => {
            let book: WordbookData = load_json(&store, WORDBOOK_KEY);
            for entry in &book.words {
                println!("{}\t{}", entry.word, entry.added_at.format("%Y-%m-%d"));
            }
            Ok(())
        }
        Some(Command::Config { init }) => {
            let path = Config::config_path();
            if init {
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                Config::default().save()?;
                println!("Wrote {}", path.display());
            } else {
                println!("{}", path.display());
            }
            Ok(())
        }
        Some(Command::Fetch {
            word,
            scenario,
            force,
        }) => run_fetch(&config, &store, &word, Scenario::from_stage(scenario as usize), force),
    }
}

fn env_filter(config: &Config) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_filter))
}

/// The TUI owns the terminal, so interactive runs log to a file.
fn init_file_logging(config: &Config, store: &JsonStore) -> Result<()> {
    let log_path = store.base_dir().join("vocabdr.log");
    let log_file = OpenOptions::new().create(true).append(true).open(&log_path)?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_ansi(false)
        .with_writer(Mutex::new(log_file))
        .init();
    Ok(())
}

fn run_fetch(
    config: &Config,
    store: &JsonStore,
    word: &str,
    scenario: Scenario,
    force: bool,
) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config))
        .with_writer(io::stderr)
        .init();

    let mut client = ExampleClient::new(
        generator::source_from_config(config),
        ExampleCache::open(Box::new(store.clone())),
    );
    let opts = FetchOptions {
        force,
        scenario: scenario.prompt().to_string(),
    };
    let items = client.fetch(word, config.sentence_count, &opts)?;

    for (i, item) in items.iter().enumerate() {
        println!("{:>2}. {}", i + 1, item.sentence);
        if let Some(translation) = &item.translation {
            println!("    {translation}");
        }
    }
    Ok(())
}

fn run_practice(
    config: Config,
    store: &JsonStore,
    words: Vec<String>,
    start: Option<String>,
) -> Result<()> {
    init_file_logging(&config, store)?;

    let words = if words.is_empty() {
        load_json::<WordbookData>(store, WORDBOOK_KEY).word_list()
    } else {
        words
    };
    info!(words = words.len(), backend = ?config.backend, "starting practice");

    let events = EventHandler::new(Duration::from_millis(100));
    let mut app = App::from_config(config, store, words, events.sender());
    if let (Some(start), Some(session)) = (start, app.session.as_mut()) {
        session.select_word(&start);
    }
    app.start();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut app, &events);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
) -> Result<()> {
    loop {
        terminal.draw(|frame| render(frame, app))?;

        match events.next()? {
            AppEvent::Key(key) => handle_key(app, key),
            AppEvent::Tick | AppEvent::Resize(_, _) => {}
            worker => app.handle_event(worker),
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let failed = app
        .session
        .as_ref()
        .is_some_and(|s| matches!(s.phase(), Phase::Failed(_)));

    match key.code {
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('c') | KeyCode::Char('q') if ctrl => app.should_quit = true,
        KeyCode::Char('n') if ctrl => app.skip(),
        KeyCode::Char('r') if ctrl || failed => app.retry(),
        KeyCode::Enter => app.submit(),
        KeyCode::Backspace => app.backspace(),
        KeyCode::Tab | KeyCode::Right | KeyCode::Char(' ') => app.focus_next(),
        KeyCode::BackTab | KeyCode::Left => app.focus_prev(),
        KeyCode::PageDown => app.next_word(),
        KeyCode::PageUp => app.prev_word(),
        KeyCode::Char(ch @ '1'..='9') => app.reveal_hints(ch as usize - '0' as usize),
        KeyCode::Char(ch) if !ctrl => app.type_char(ch),
        _ => {}
    }
}

fn render(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();
    let colors = &app.theme.colors;

    frame.render_widget(Block::default().style(Style::default().bg(colors.bg())), area);
    let layout = AppLayout::new(area);

    let header_text = match &app.session {
        Some(session) => {
            let (index, total) = session.word_position();
            format!(" vocabdr | word {}/{total} | {}", index + 1, session.scenario().label())
        }
        None => " vocabdr".to_string(),
    };
    let header = Paragraph::new(Line::from(Span::styled(
        header_text,
        Style::default()
            .fg(colors.header_fg())
            .bg(colors.header_bg())
            .add_modifier(Modifier::BOLD),
    )))
    .style(Style::default().bg(colors.header_bg()));
    frame.render_widget(header, layout.header);

    if let Some(session) = &app.session {
        frame.render_widget(PracticeArea::new(session, &app.theme, Instant::now()), layout.main);
    }

    let mut footer = vec![Line::from(Span::styled(
        app.status.clone().unwrap_or_default(),
        Style::default().fg(colors.warning()),
    ))];
    if layout.show_key_help {
        footer.push(Line::from(Span::styled(
            " [Enter] Check/Next  [Tab] Next word  [1-9] Hints  [Ctrl+N] Skip  [PgUp/PgDn] Word  [Esc] Quit",
            Style::default().fg(colors.accent_dim()),
        )));
    }
    frame.render_widget(Paragraph::new(footer), layout.footer);
}
