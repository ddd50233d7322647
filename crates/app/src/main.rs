use std::fmt;
use std::sync::Arc;

use learn_core::model::{CourseDefaults, CourseId, LessonId, ModuleId};
use services::{AppServices, Clock};
use tracing_subscriber::EnvFilter;

mod terminal;

use terminal::StdoutNotifier;

const DEFAULT_DB_URL: &str = "sqlite://lms.sqlite3";
const DEFAULT_LOG_FILTER: &str = "app=info,services=info,storage=warn";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidDbUrl { raw: String },
    InvalidNumber { name: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { command, name } => {
                write!(f, "{command} requires <{name}>")
            }
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNumber { name, raw } => write!(f, "invalid {name} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app import <file.csv>                  [--db <sqlite_url>]");
    eprintln!("  app status                             [--db <sqlite_url>]");
    eprintln!("  app open <course> <module> <lesson>    [--db <sqlite_url>]");
    eprintln!("  app complete <lesson>                  [--db <sqlite_url>]");
    eprintln!("  app quiz <course> <module>             [--db <sqlite_url>]");
    eprintln!("  app reset                              [--db <sqlite_url>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_PASSING_SCORE, LEARN_QUIZ_MINUTES, LEARN_MAX_ATTEMPTS, RUST_LOG");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Import { path: String },
    Status,
    Open {
        course: CourseId,
        module: ModuleId,
        lesson: LessonId,
    },
    Complete { lesson: LessonId },
    Quiz { course: CourseId, module: ModuleId },
    Reset,
}

impl Command {
    /// Parse the subcommand and its positional arguments. Flags are left in
    /// `rest`.
    fn parse(argv: Vec<String>) -> Result<(Self, Vec<String>), ArgsError> {
        let (positional, rest): (Vec<String>, Vec<String>) = split_flags(argv);
        let mut positional = positional.into_iter();
        let name = positional
            .next()
            .ok_or_else(|| ArgsError::UnknownCommand(String::new()))?;

        let mut take = |command: &'static str, name: &'static str| {
            positional
                .next()
                .ok_or(ArgsError::MissingArgument { command, name })
        };

        let cmd = match name.as_str() {
            "import" => Self::Import {
                path: take("import", "file")?,
            },
            "status" => Self::Status,
            "open" => Self::Open {
                course: CourseId::new(take("open", "course")?),
                module: ModuleId::new(take("open", "module")?),
                lesson: LessonId::new(take("open", "lesson")?),
            },
            "complete" => Self::Complete {
                lesson: LessonId::new(take("complete", "lesson")?),
            },
            "quiz" => Self::Quiz {
                course: CourseId::new(take("quiz", "course")?),
                module: ModuleId::new(take("quiz", "module")?),
            },
            "reset" => Self::Reset,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };

        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        Ok((cmd, rest))
    }
}

/// Separate positional words from `--flag value` pairs.
fn split_flags(argv: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut positional = Vec::new();
    let mut flags = Vec::new();
    let mut iter = argv.into_iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            let takes_value = arg == "--db";
            flags.push(arg);
            if takes_value {
                flags.extend(iter.next());
            }
        } else {
            positional.push(arg);
        }
    }
    (positional, flags)
}

struct Args {
    db_url: String,
    defaults: CourseDefaults,
    command: Command,
}

impl Args {
    fn parse(argv: Vec<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let (command, flags) = Command::parse(argv)?;
        let mut db_url = std::env::var("LEARN_DB_URL")
            .ok()
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);

        let mut flags = flags.into_iter();
        while let Some(arg) = flags.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut flags, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value }.into());
                    }
                    db_url = normalize_sqlite_url(value);
                }
                _ => return Err(ArgsError::UnknownArg(arg).into()),
            }
        }

        Ok(Self {
            db_url,
            defaults: defaults_from_env()?,
            command,
        })
    }
}

fn defaults_from_env() -> Result<CourseDefaults, Box<dyn std::error::Error>> {
    let fallback = CourseDefaults::default();
    let passing_score = env_number("LEARN_PASSING_SCORE", fallback.passing_score())?;
    let minutes = env_number("LEARN_QUIZ_MINUTES", fallback.time_limit_minutes())?;
    let max_attempts = env_number("LEARN_MAX_ATTEMPTS", fallback.max_attempts())?;
    Ok(CourseDefaults::new(passing_score, minutes, max_attempts)?)
}

fn env_number<T: std::str::FromStr>(name: &'static str, fallback: T) -> Result<T, ArgsError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ArgsError::InvalidNumber { name, raw }),
        Err(_) => Ok(fallback),
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// The store creates the database file; its directory has to exist.
fn prepare_db_dir(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();
    if argv.is_empty() || argv.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    let args = Args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    prepare_db_dir(&args.db_url)?;
    let services = AppServices::new_sqlite(
        &args.db_url,
        Clock::System,
        args.defaults,
        Arc::new(StdoutNotifier),
    )
    .await?;
    let learning = services.learning();
    let mut state = learning.load().await;

    match args.command {
        Command::Import { path } => {
            let text = tokio::fs::read_to_string(&path).await?;
            let summary = learning
                .import_csv(&mut state, &text, &mut terminal::print_progress)
                .await?;
            terminal::print_import_summary(&summary);
        }
        Command::Status => terminal::print_status(&state),
        Command::Open {
            course,
            module,
            lesson,
        } => {
            let lesson = learning.open_lesson(&mut state, &course, &module, &lesson)?;
            terminal::print_lesson(&lesson);
        }
        Command::Complete { lesson } => {
            learning.complete_lesson(&mut state, &lesson).await?;
        }
        Command::Quiz { course, module } => {
            terminal::run_quiz(&services.quizzes(), &mut state, &course, &module).await?;
        }
        Command::Reset => learning.reset(&mut state).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    init_tracing();
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
