mod app;
mod clock;
mod domain;
mod input;
mod logging;
mod notifications;
mod persistence;
mod report;
mod store;
mod ticker;
mod time_utils;
mod timer;
mod ui;

use anyhow::{bail, Context, Result};
use app::AppState;
use clap::{Parser, Subcommand, ValueEnum};
use clock::{Clock, SystemClock};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use domain::{TimerContext, Todo};
use persistence::{ensure_dir, get_data_dir, init_local_data_dir, report_file, FileStore, Settings, SharedStorage};
use ratatui::{backend::CrosstermBackend, Terminal};
use report::AnalyticsAggregator;
use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use store::sync::Signals;
use store::TaskStore;
use time_utils::{format_time, format_time_spent, validate_custom_minutes};
use tracing::info;

#[derive(Parser)]
#[command(name = "pourover")]
#[command(about = "A terminal Pomodoro timer that credits focus time to the tasks you finish", long_about = None)]
struct Cli {
    /// Data directory. Defaults to the nearest .pourover directory, then ~/.pourover
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Mirror log output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a local .pourover directory in the current directory
    Init,
    /// Add a task
    Add {
        text: String,
        /// Project name or id
        #[arg(short, long)]
        project: Option<String>,
    },
    /// Complete or reopen a task (by id or id prefix)
    Toggle { id: String },
    /// Delete a task (by id or id prefix)
    Delete { id: String },
    /// List tasks
    List,
    /// Move a task to a 1-based position within its list
    Move { id: String, position: usize },
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommand,
    },
    /// Set the timer duration in minutes (1-60)
    SetTime { minutes: u32 },
    /// Show focus time analytics
    Stats {
        #[arg(value_enum, default_value_t = StatsView::Task)]
        view: StatsView,
    },
    /// Generate a markdown analytics report
    Report {
        /// Output file path. Defaults to <data dir>/report-YYYY-MM-DD.md
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show or change stored preferences
    Settings {
        #[arg(long)]
        muted: Option<bool>,
        #[arg(long)]
        dark_mode: Option<bool>,
        /// Background image id
        #[arg(long)]
        image: Option<String>,
        /// Playlist index
        #[arg(long)]
        song: Option<usize>,
    },
}

#[derive(Subcommand)]
enum ProjectCommand {
    /// Create a project
    Add { name: String },
    /// Delete a project; its tasks become unfiled
    Delete { id: String },
    /// List projects
    List,
}

#[derive(Clone, Copy, ValueEnum)]
enum StatsView {
    Task,
    Day,
    Week,
    Month,
}

/// Handles shared by every command
struct Session {
    data_dir: PathBuf,
    storage: SharedStorage,
    signals: Rc<Signals>,
    clock: Rc<dyn Clock>,
}

impl Session {
    fn task_store(&self) -> TaskStore {
        TaskStore::open("cli", self.storage.clone(), self.signals.clone(), self.clock.clone())
    }

    fn settings(&self) -> Settings {
        Settings::new(self.storage.clone(), self.signals.clone())
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Init) = cli.command {
        let data_dir = init_local_data_dir()?;
        println!("Initialized pourover directory: {}", data_dir.display());
        println!();
        println!("Pourover will now use this local directory for tasks and settings.");
        println!("Run 'pourover' to start a focus session.");
        return Ok(());
    }

    let data_dir = match cli.data_dir {
        Some(dir) => dir,
        None => get_data_dir()?,
    };
    ensure_dir(&data_dir)?;
    logging::enable_logging(&data_dir, None, cli.verbose)?;

    let store = FileStore::open(&data_dir)?;
    let ctx = Session {
        data_dir,
        storage: Rc::new(RefCell::new(store)),
        signals: Rc::new(Signals::new()),
        clock: Rc::new(SystemClock),
    };

    match cli.command {
        Some(Commands::Init) => Ok(()),
        Some(Commands::Add { text, project }) => cmd_add(&ctx, &text, project.as_deref()),
        Some(Commands::Toggle { id }) => cmd_toggle(&ctx, &id),
        Some(Commands::Delete { id }) => cmd_delete(&ctx, &id),
        Some(Commands::List) => cmd_list(&ctx),
        Some(Commands::Move { id, position }) => cmd_move(&ctx, &id, position),
        Some(Commands::Project { command }) => cmd_project(&ctx, command),
        Some(Commands::SetTime { minutes }) => cmd_set_time(&ctx, minutes),
        Some(Commands::Stats { view }) => cmd_stats(&ctx, view),
        Some(Commands::Report { output }) => cmd_report(&ctx, output),
        Some(Commands::Settings { muted, dark_mode, image, song }) => {
            cmd_settings(&ctx, muted, dark_mode, image, song)
        }
        None => run_tui(&ctx),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// Find exactly one task whose id starts with `prefix`
fn resolve_todo(store: &TaskStore, prefix: &str) -> Result<Todo> {
    let mut matches = store.find_by_prefix(prefix);
    match matches.len() {
        0 => bail!("No task matches '{}'", prefix),
        1 => Ok(matches.remove(0)),
        n => bail!("'{}' matches {} tasks; use a longer prefix", prefix, n),
    }
}

/// Find a project by exact name (case-insensitive) or id prefix
fn resolve_project(store: &TaskStore, key: &str) -> Result<String> {
    let projects = store.projects();
    if let Some(p) = projects.iter().find(|p| p.name.eq_ignore_ascii_case(key)) {
        return Ok(p.id.clone());
    }
    let matches: Vec<_> = projects.iter().filter(|p| p.id.starts_with(key)).collect();
    match matches.as_slice() {
        [project] => Ok(project.id.clone()),
        [] => bail!("No project matches '{}'", key),
        _ => bail!("'{}' matches several projects", key),
    }
}

fn print_todo(store: &TaskStore, todo: &Todo) {
    let mark = if todo.completed { "x" } else { " " };
    let mut line = format!("{}  [{}] {}", short_id(&todo.id), mark, todo.text);
    if let Some(name) = todo.project_id.as_deref().and_then(|id| store.project_name(id)) {
        line.push_str(&format!("  ({})", name));
    }
    if let Some(seconds) = todo.focus_seconds() {
        line.push_str(&format!("  {}", format_time_spent(seconds)));
    }
    println!("{}", line);
}

fn cmd_add(ctx: &Session, text: &str, project: Option<&str>) -> Result<()> {
    let store = ctx.task_store();
    let project_id = project.map(|key| resolve_project(&store, key)).transpose()?;
    match store.create(text, project_id.as_deref()) {
        Some(todo) => {
            println!("Added {}", short_id(&todo.id));
            Ok(())
        }
        None => bail!("Task text cannot be empty"),
    }
}

fn cmd_toggle(ctx: &Session, id: &str) -> Result<()> {
    let store = ctx.task_store();
    let todo = resolve_todo(&store, id)?;
    // No timer runs outside the terminal view, so nothing is credited
    if let Some(updated) = store.toggle(&todo.id, &TimerContext::inactive()) {
        print_todo(&store, &updated);
    }
    Ok(())
}

fn cmd_delete(ctx: &Session, id: &str) -> Result<()> {
    let store = ctx.task_store();
    let todo = resolve_todo(&store, id)?;
    store.delete(&todo.id);
    println!("Deleted \"{}\"", todo.text);
    Ok(())
}

fn cmd_list(ctx: &Session) -> Result<()> {
    let store = ctx.task_store();
    let rows = app::list_rows(&store);
    if rows.is_empty() {
        println!("No tasks yet. Add one with 'pourover add <text>'.");
    }
    for todo in &rows {
        print_todo(&store, todo);
    }
    Ok(())
}

fn cmd_move(ctx: &Session, id: &str, position: usize) -> Result<()> {
    let store = ctx.task_store();
    let todo = resolve_todo(&store, id)?;
    let group = todo.group();
    let members = store.group(&group);
    let from = members
        .iter()
        .position(|t| t.id == todo.id)
        .context("Task vanished while moving")?;
    let to = position
        .checked_sub(1)
        .context("Positions start at 1")?;

    if !store.reorder(&group, from, to) {
        bail!("Position {} is out of range (1-{})", position, members.len());
    }
    println!("Moved \"{}\" to position {}", todo.text, position);
    Ok(())
}

fn cmd_project(ctx: &Session, command: ProjectCommand) -> Result<()> {
    let store = ctx.task_store();
    match command {
        ProjectCommand::Add { name } => match store.create_project(&name) {
            Some(project) => println!("Created project {} ({})", project.name, project.id),
            None => bail!("Project name cannot be empty"),
        },
        ProjectCommand::Delete { id } => {
            let project_id = resolve_project(&store, &id)?;
            store.delete_project(&project_id);
            println!("Deleted project {}", project_id);
        }
        ProjectCommand::List => {
            let todos = store.todos();
            for project in store.projects() {
                let count = todos
                    .iter()
                    .filter(|t| t.project_id.as_deref() == Some(project.id.as_str()))
                    .count();
                println!("{}  {} ({} tasks)", project.id, project.name, count);
            }
        }
    }
    Ok(())
}

fn cmd_set_time(ctx: &Session, minutes: u32) -> Result<()> {
    let seconds = validate_custom_minutes(minutes).map_err(anyhow::Error::msg)?;
    if !ctx.settings().save_custom_time(seconds) {
        bail!("Could not save the timer duration");
    }
    println!("Timer set to {}", format_time(seconds));
    Ok(())
}

fn cmd_stats(ctx: &Session, view: StatsView) -> Result<()> {
    let todos = ctx.task_store().todos();
    let analytics = AnalyticsAggregator::local(&todos);

    println!("Total focus time: {}", format_time_spent(analytics.total_focus_time()));
    println!();

    match view {
        StatsView::Task => {
            for task in analytics.by_task() {
                println!(
                    "{:>8}  {} ({}x)",
                    format_time_spent(task.total_time_spent),
                    task.task_name,
                    task.completion_count
                );
            }
        }
        StatsView::Day => {
            for day in analytics.by_day() {
                println!("{}  {:>8}  {} tasks", day.date, format_time_spent(day.total_time_spent), day.task_count);
            }
        }
        StatsView::Week => {
            for week in analytics.by_week() {
                println!(
                    "{} - {}  {:>8}  {} tasks",
                    week.week_start,
                    week.week_end,
                    format_time_spent(week.total_time_spent),
                    week.task_count
                );
            }
        }
        StatsView::Month => {
            for month in analytics.by_month() {
                println!(
                    "{:<15} {:>8}  {} tasks",
                    month.month_name,
                    format_time_spent(month.total_time_spent),
                    month.task_count
                );
            }
        }
    }
    Ok(())
}

fn cmd_report(ctx: &Session, output: Option<PathBuf>) -> Result<()> {
    let store = ctx.task_store();
    let now = ctx.clock.now();
    let report = report::generate_report(&store.todos(), &store.projects(), chrono::Local, now);

    let output = output.unwrap_or_else(|| report_file(&ctx.data_dir, chrono::Local::now().date_naive()));
    report::write_report(&output, &report)?;
    println!("Report generated: {}", output.display());
    Ok(())
}

fn cmd_settings(
    ctx: &Session,
    muted: Option<bool>,
    dark_mode: Option<bool>,
    image: Option<String>,
    song: Option<usize>,
) -> Result<()> {
    let settings = ctx.settings();
    if let Some(muted) = muted {
        settings.set_music_muted(muted);
    }
    if let Some(enabled) = dark_mode {
        settings.set_dark_mode(enabled);
    }
    if let Some(image) = image {
        settings.set_coffee_shop_image(&image);
    }
    if let Some(index) = song {
        settings.set_selected_song_index(index);
    }

    println!("timer:  {}", format_time(settings.initial_time()));
    println!("muted:  {}", settings.music_muted());
    println!("dark:   {}", settings.dark_mode());
    println!("image:  {}", settings.coffee_shop_image());
    println!("song:   {}", settings.selected_song_index());
    Ok(())
}

fn run_tui(ctx: &Session) -> Result<()> {
    eprintln!("Using pourover directory: {}", ctx.data_dir.display());

    let mut app = AppState::new(ctx.storage.clone(), ctx.signals.clone(), ctx.clock.clone());
    info!(seconds = app.timer.initial_time(), "Terminal view started");

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run app
    let result = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // Save anything still pending on exit
    app.flush();

    // Print any errors
    if let Err(err) = result {
        eprintln!("Error: {}", err);
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut AppState) -> Result<()> {
    let tick_rate = ticker::tick_duration();

    loop {
        // Render
        terminal.draw(|f| ui::render(f, app))?;

        // Handle events with timeout for ticking
        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                // Only process key press events (ignore key release)
                if key.kind == KeyEventKind::Press && input::handle_key(app, key)? {
                    return Ok(());
                }
            }
        }

        // Deliver due countdown ticks
        app.tick();

        // Persistence step for both mounted lists
        app.flush();
    }
}
