mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use practic::{
    app_dirs::AppDirs,
    catalog::Catalog,
    comments::{CommentThreadSync, TracingSink},
    config::{Config, ConfigStore, FileConfigStore},
    runtime::{CrosstermEventSource, FixedTicker, Runner, TaskEvent},
    selector::SpinSettings,
    store::{FileStore, KeyValueStore},
    task::PracticeTask,
    timer::format_elapsed,
    PracticError, TaskPhase,
};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::{Duration, Instant},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use unicode_width::UnicodeWidthStr;

const DEFAULT_PAGE: &str = "/tasks";

/// practice tasks with a random variant, a running clock and attempt history
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Practice tasks in the terminal: draw a random variant, solve it against the clock, and keep a history of every attempt."
)]
pub struct Cli {
    /// task catalog (JSON) to use instead of the bundled one
    #[clap(short = 't', long = "tasks")]
    tasks: Option<PathBuf>,

    /// identifier of the task to open first
    #[clap(long)]
    task: Option<String>,

    /// directory for saved progress
    #[clap(short = 's', long)]
    store: Option<PathBuf>,

    /// pick the variant straight away instead of spinning through candidates
    #[clap(long)]
    no_animation: bool,

    /// print the task catalog and exit
    #[clap(short = 'l', long)]
    list: bool,

    /// page path the discussion thread is keyed on
    #[clap(long, default_value = DEFAULT_PAGE)]
    page: String,
}

/// Runtime knobs after merging the config file with CLI flags.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub spin: SpinSettings,
    pub page: String,
    pub comment_origin: String,
}

impl Settings {
    fn resolve(cli: &Cli, config: &Config) -> Self {
        let mut spin = config.spin_settings();
        if cli.no_animation {
            spin.animate = false;
        }
        Self {
            spin,
            page: cli.page.clone(),
            comment_origin: config.comment_origin.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Mode {
    Task,
    History,
    /// Read-only view of the history record at this index.
    Viewer(usize),
    Alert(String),
    ConfirmClear,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

pub struct App<S: KeyValueStore + Clone> {
    pub catalog: Catalog,
    pub current: usize,
    pub task: PracticeTask<S>,
    pub mode: Mode,
    /// Row in the history pane, counted from the newest attempt.
    pub history_cursor: usize,
    pub status: Option<String>,
    backend: S,
    spin: SpinSettings,
    page: String,
    comments: CommentThreadSync<TracingSink>,
    rng: StdRng,
}

impl<S: KeyValueStore + Clone> App<S> {
    pub fn new(catalog: Catalog, start: usize, backend: S, settings: &Settings) -> practic::Result<Self> {
        let definition = catalog
            .tasks
            .get(start)
            .cloned()
            .ok_or_else(|| PracticError::UnknownTask(format!("#{start}")))?;
        let task = PracticeTask::mount(definition, backend.clone(), settings.spin);

        let mut app = Self {
            catalog,
            current: start,
            task,
            mode: Mode::Task,
            history_cursor: 0,
            status: None,
            backend,
            spin: settings.spin,
            page: settings.page.clone(),
            comments: CommentThreadSync::new(Some(TracingSink), settings.comment_origin.clone()),
            rng: StdRng::from_entropy(),
        };
        let route = app.route();
        app.comments.on_route_change(&route);
        Ok(app)
    }

    pub fn route(&self) -> String {
        format!(
            "{}/{}",
            self.page.trim_end_matches('/'),
            self.task.session().task_id()
        )
    }

    pub fn comments(&self) -> &CommentThreadSync<TracingSink> {
        &self.comments
    }

    /// History record behind the cursor, newest first.
    pub fn selected_record(&self) -> Option<usize> {
        self.task
            .session()
            .history()
            .len()
            .checked_sub(1 + self.history_cursor)
    }

    pub fn on_tick(&mut self, dt: Duration) -> bool {
        self.task.on_tick(dt, &mut self.rng)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Flow {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return Flow::Quit;
        }

        match self.mode {
            Mode::Task => return self.on_task_key(key),
            Mode::History => self.on_history_key(key),
            Mode::Viewer(_) => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q')
                ) {
                    self.mode = Mode::History;
                }
            }
            Mode::Alert(_) => self.mode = Mode::Task,
            Mode::ConfirmClear => {
                let confirmed = matches!(key.code, KeyCode::Char('y') | KeyCode::Char('Y'));
                if self.task.clear_progress(|_: &str| confirmed) {
                    self.history_cursor = 0;
                    self.status = Some("Progress cleared".to_string());
                }
                self.mode = Mode::Task;
            }
        }
        Flow::Continue
    }

    fn on_task_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Tab => {
                self.history_cursor = 0;
                self.mode = Mode::History;
            }
            KeyCode::Char('s') if ctrl => self.complete(),
            KeyCode::Char('r') if ctrl => self.reset(),
            KeyCode::Char('x') if ctrl => self.mode = Mode::ConfirmClear,
            KeyCode::Char('o') if ctrl => self.open_sandbox(),
            KeyCode::Char('n') if ctrl => self.next_task(),
            KeyCode::Char('p') if ctrl => self.previous_task(),
            _ if ctrl => {}
            KeyCode::Enter | KeyCode::Char(' ') if self.task.phase() == TaskPhase::Idle => {
                self.task.request_variant(&mut self.rng);
            }
            KeyCode::Enter => {
                self.task.push_char('\n');
            }
            KeyCode::Char(c) => {
                self.task.push_char(c);
            }
            KeyCode::Backspace => {
                self.task.pop_char();
            }
            _ => {}
        }
        Flow::Continue
    }

    fn on_history_key(&mut self, key: KeyEvent) {
        let len = self.task.session().history().len();
        match key.code {
            KeyCode::Tab | KeyCode::Esc => self.mode = Mode::Task,
            KeyCode::Up => self.history_cursor = self.history_cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.history_cursor + 1 < len {
                    self.history_cursor += 1;
                }
            }
            KeyCode::Enter => {
                if let Some(index) = self.selected_record() {
                    self.mode = Mode::Viewer(index);
                }
            }
            _ => {}
        }
    }

    fn complete(&mut self) {
        match self.task.complete() {
            Ok(seconds) => {
                self.status = Some(format!("Completed in {}", format_elapsed(seconds)));
            }
            Err(rejected) => self.mode = Mode::Alert(rejected.to_string()),
        }
    }

    fn reset(&mut self) {
        let saved = self
            .task
            .reset()
            .map(|record| format!("Attempt on variant {} saved to history", record.variant_number));
        if saved.is_some() {
            self.history_cursor = 0;
            self.status = saved;
        }
    }

    fn open_sandbox(&mut self) {
        self.status = match self.task.sandbox() {
            Some(embed) if embed.open() => None,
            Some(embed) => Some(format!("Open {} in a browser", embed.url())),
            None => Some("The online editor appears once a variant is drawn".to_string()),
        };
    }

    fn next_task(&mut self) {
        let len = self.catalog.len();
        self.switch_to((self.current + 1) % len);
    }

    fn previous_task(&mut self) {
        let len = self.catalog.len();
        self.switch_to((self.current + len - 1) % len);
    }

    fn switch_to(&mut self, index: usize) {
        if index == self.current {
            return;
        }
        let Some(definition) = self.catalog.tasks.get(index).cloned() else {
            return;
        };

        let next = PracticeTask::mount(definition, self.backend.clone(), self.spin);
        let previous = std::mem::replace(&mut self.task, next);
        previous.unmount();

        self.current = index;
        self.mode = Mode::Task;
        self.history_cursor = 0;
        self.status = None;

        let route = self.route();
        self.comments.on_route_change(&route);
    }

    /// Stop recurring work before the process exits.
    fn shutdown(self) {
        self.task.unmount();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging();

    let catalog = match &cli.tasks {
        Some(path) => Catalog::load(path)?,
        None => Catalog::bundled()?,
    };

    if cli.list {
        print!("{}", render_listing(&catalog));
        return Ok(());
    }

    if catalog.is_empty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::InvalidValue, "the task catalog is empty")
            .exit();
    }

    let start = match &cli.task {
        Some(id) => catalog.position(id)?,
        None => 0,
    };

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let config = FileConfigStore::new().load();
    let settings = Settings::resolve(&cli, &config);
    let store_dir = cli
        .store
        .clone()
        .or_else(|| config.store_path.clone())
        .or_else(AppDirs::progress_dir)
        .unwrap_or_else(|| PathBuf::from("practic-progress"));
    info!(store = %store_dir.display(), tasks = catalog.len(), "starting");

    let mut app = App::new(catalog, start, FileStore::new(store_dir), &settings)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app, config.tick_rate());

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen,)?;
    terminal.show_cursor()?;

    app.shutdown();
    result
}

fn init_logging() {
    let Some(path) = AppDirs::log_path() else {
        return;
    };
    if let Some(parent) = path.parent() {
        if fs::create_dir_all(parent).is_err() {
            return;
        }
    }
    let Ok(file) = OpenOptions::new().create(true).append(true).open(&path) else {
        return;
    };

    let filter = EnvFilter::try_from_env("PRACTIC_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    if tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .is_err()
    {
        warn!("logging was already initialized");
    }
}

fn render_listing(catalog: &Catalog) -> String {
    let ids: Vec<String> = catalog.tasks.iter().map(|t| t.identifier()).collect();
    let width = ids.iter().map(|id| id.width()).max().unwrap_or(0);

    let mut out = String::new();
    for (task, id) in catalog.tasks.iter().zip(&ids) {
        let pad = " ".repeat(width - id.width());
        let variants = match task.variants.len() {
            1 => "1 variant".to_string(),
            n => format!("{n} variants"),
        };
        out.push_str(&format!("{id}{pad}  {}  ({variants}", task.title));
        if let Some(estimate) = &task.estimated_time {
            out.push_str(&format!(", ~{estimate}"));
        }
        out.push_str(")\n");
    }
    out
}

fn start_tui<B: Backend, S: KeyValueStore + Clone>(
    terminal: &mut Terminal<B>,
    app: &mut App<S>,
    tick_rate: Duration,
) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(CrosstermEventSource::new(), FixedTicker::new(tick_rate));
    let mut last = Instant::now();

    terminal.draw(|f| ui(app, f))?;

    loop {
        let event = runner.step();
        let now = Instant::now();
        let mut redraw = app.on_tick(now.duration_since(last));
        last = now;

        match event {
            TaskEvent::Tick => {}
            TaskEvent::Resize => redraw = true,
            TaskEvent::Key(key) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
                redraw = true;
            }
        }

        if redraw {
            terminal.draw(|f| ui(app, f))?;
        }
    }

    Ok(())
}

fn ui<S: KeyValueStore + Clone>(app: &App<S>, f: &mut Frame) {
    let area = f.area();
    match &app.mode {
        Mode::History => ui::history::render_history(app, area, f.buffer_mut()),
        Mode::Viewer(index) => ui::history::render_viewer(app, *index, area, f.buffer_mut()),
        Mode::Task | Mode::Alert(_) | Mode::ConfirmClear => f.render_widget(app, area),
    }

    match &app.mode {
        Mode::Alert(message) => ui::dialog::render_alert(message, area, f.buffer_mut()),
        Mode::ConfirmClear => {
            ui::dialog::render_confirm(practic::task::CLEAR_PROMPT, area, f.buffer_mut())
        }
        _ => {}
    }
}
