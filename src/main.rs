//! my-workout - Personal workout schedule viewer

use anyhow::{bail, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use my_workout::config::{AppConfig, DEFAULT_DB_PATH, DEFAULT_SWIPE_COLUMNS};
use my_workout::counter::count_key;
use my_workout::db::Database;
use my_workout::loader::{fetch_plan, PlanSource, DEFAULT_BASE};
use my_workout::plan::{find_session, WorkoutPlan};
use my_workout::selection::{initial_selection, on_date_changed, GroupPolicy};
use my_workout::tui::App;

#[derive(Parser)]
#[command(name = "my-workout")]
#[command(author, version, about = "Personal workout schedule viewer")]
struct Cli {
    /// Whose plan to show (loads <base>/data/<workout>-workout.json)
    #[arg(short, long, env = "WORKOUT", global = true)]
    workout: Option<String>,

    /// Base URL or directory the plan documents are served under
    #[arg(long, env = "MY_WORKOUT_BASE", default_value = DEFAULT_BASE, global = true)]
    base: String,

    /// SQLite file holding completion counters
    #[arg(long, env = "MY_WORKOUT_DB", default_value = DEFAULT_DB_PATH, global = true)]
    db: String,

    /// How the first group is picked when the plan opens
    #[arg(long, value_enum, default_value_t = GroupPolicy::LeastCompleted, global = true)]
    policy: GroupPolicy,

    /// Pretend today is this date (YYYY-MM-DD)
    #[arg(long, global = true)]
    today: Option<NaiveDate>,

    /// Mouse drag distance in columns that counts as a swipe
    #[arg(long, default_value_t = DEFAULT_SWIPE_COLUMNS, global = true)]
    swipe: i32,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open TUI dashboard
    Tui,

    /// Print a session's group with its exercises
    Show {
        /// Session date (defaults to the latest one not in the future)
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Group title (defaults to the usual pick for the date)
        #[arg(short, long)]
        title: Option<String>,
    },

    /// List session dates
    Dates,

    /// Mark a group as done once more
    Done {
        #[arg(short, long)]
        date: NaiveDate,

        #[arg(short, long)]
        title: String,
    },

    /// Take back one completion
    Undo {
        #[arg(short, long)]
        date: NaiveDate,

        #[arg(short, long)]
        title: String,
    },
}

impl Cli {
    fn config(&self) -> AppConfig {
        AppConfig {
            workout: self.workout.clone(),
            source: PlanSource::from_base(&self.base),
            db_path: self.db.clone(),
            policy: self.policy,
            today: self.today,
            swipe_threshold: self.swipe,
        }
    }
}

/// Logs go to stderr; the dashboard stays quiet unless RUST_LOG asks otherwise
fn init_tracing(interactive: bool) {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) if interactive => return,
        Err(_) => EnvFilter::new("warn"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn load(config: &AppConfig) -> Result<WorkoutPlan> {
    let identifier = config.identifier()?;
    Ok(fetch_plan(config.source.clone(), identifier).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(matches!(cli.command, None | Some(Commands::Tui)));

    let config = cli.config();
    let db = Database::open(&config.db_path)?;

    match cli.command {
        Some(Commands::Show { date, title }) => {
            let plan = load(&config).await?;
            let counts = db.load_counts();

            let (date, title) = match date {
                Some(date) => (date, title.or_else(|| on_date_changed(&plan, date))),
                None => match initial_selection(&plan, &counts, config.today(), config.policy) {
                    Some(sel) => (sel.date, title.or(sel.title)),
                    None => bail!("Plan has no sessions"),
                },
            };

            let Some(session) = find_session(&plan, date) else {
                bail!("No session on {}", date);
            };
            println!("Started at {}", session.display_date());
            if !session.notes.is_empty() {
                println!("{}", session.notes);
            }

            let Some(group) = title.as_deref().and_then(|t| session.group(t)) else {
                println!("Nothing to display");
                return Ok(());
            };
            let count = counts.get(&count_key(session.date, &group.title));
            println!("{:-<60}", "");
            println!("{} ({} / {})", group.title, count, group.frequency);
            println!("{:-<60}", "");
            println!("{:30} | {:>6} | {:>11} | {}", "Exercise", "Series", "Repetitions", "Weight");
            for e in &group.exercises {
                println!("{:30} | {:>6} | {:>11} | {}", e.name, e.series, e.repetitions, e.weight);
            }
        }

        Some(Commands::Dates) => {
            let plan = load(&config).await?;
            for s in &plan {
                let titles: Vec<_> = s.groups.iter().map(|g| g.title.as_str()).collect();
                println!("{} | {}", s.display_date(), titles.join(", "));
            }
        }

        Some(Commands::Done { date, title }) => {
            let plan = load(&config).await?;
            let Some(group) = find_session(&plan, date).and_then(|s| s.group(&title)) else {
                bail!("No group {} on {}", title, date);
            };

            let key = count_key(date, &group.title);
            let (counts, outcome) = db.load_counts().increment(&key, group.frequency);
            if outcome.changed {
                db.save_counts(&counts)?;
            }
            println!("{}: {} / {}", group.title, outcome.count, group.frequency);
            if outcome.target_reached {
                println!("Target reached!");
            }
        }

        Some(Commands::Undo { date, title }) => {
            let key = count_key(date, &title);
            let counts = db.load_counts().decrement(&key);
            db.save_counts(&counts)?;
            println!("{}: {}", title, counts.get(&key));
        }

        Some(Commands::Tui) | None => {
            // Default: show TUI
            let mut app = App::new(db, config)?;
            app.run()?;
        }
    }

    Ok(())
}
