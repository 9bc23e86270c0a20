use std::fmt;

use services::{AppConfig, AppServices, AuthContext, Clock, DashboardOverview, Notifier};
use toeic_core::model::practice::PracticeKind;
use toeic_core::model::{CourseId, LessonId, User};

mod quiz;
mod telemetry;

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { command: &'static str, name: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    InvalidId { raw: String },
    InvalidDbUrl { raw: String },
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
            ArgsError::InvalidId { raw } => write!(f, "invalid id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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
    eprintln!("  toeic [--db <sqlite_url>] courses");
    eprintln!("  toeic [--db <sqlite_url>] course <course_id>");
    eprintln!("  toeic [--db <sqlite_url>] lesson <lesson_id>");
    eprintln!("  toeic [--db <sqlite_url>] login <username> <password>");
    eprintln!("  toeic [--db <sqlite_url>] register <username> <email> <password>");
    eprintln!("  toeic [--db <sqlite_url>] logout | whoami | dashboard | profile | practice");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  TOEIC_API_BASE_URL, TOEIC_PRACTICE_BASE_URL, TOEIC_THEORY_BASE_URL,");
    eprintln!("  TOEIC_PROGRESS_BASE_URL, TOEIC_DB_URL, TOEIC_HTTP_TIMEOUT_SECS,");
    eprintln!("  TOEIC_CONFIG_PATH, TOEIC_LOG, TOEIC_LOG_FORMAT");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Courses,
    Course(CourseId),
    Lesson(LessonId),
    Login { username: String, password: String },
    Register { username: String, email: String, password: String },
    Logout,
    WhoAmI,
    Dashboard,
    Profile,
    Practice,
}

struct Args {
    db_url: Option<String>,
    command: Command,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut args = args.into_iter();
        let mut db_url = None;
        let mut positional = Vec::new();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = Some(normalize_sqlite_url(value));
                }
                "--help" | "-h" => return Ok(None),
                flag if flag.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positional.push(arg),
            }
        }

        let mut positional = positional.into_iter();
        let Some(name) = positional.next() else {
            return Ok(None);
        };
        let mut arg = |command: &'static str, name: &'static str| {
            positional
                .next()
                .ok_or(ArgsError::MissingArgument { command, name })
        };

        let command = match name.as_str() {
            "courses" => Command::Courses,
            "course" => Command::Course(parse_id(arg("course", "course_id")?)?),
            "lesson" => Command::Lesson(parse_id(arg("lesson", "lesson_id")?)?),
            "login" => Command::Login {
                username: arg("login", "username")?,
                password: arg("login", "password")?,
            },
            "register" => Command::Register {
                username: arg("register", "username")?,
                email: arg("register", "email")?,
                password: arg("register", "password")?,
            },
            "logout" => Command::Logout,
            "whoami" => Command::WhoAmI,
            "dashboard" => Command::Dashboard,
            "profile" => Command::Profile,
            "practice" => Command::Practice,
            _ => return Err(ArgsError::UnknownCommand(name)),
        };
        if let Some(extra) = positional.next() {
            return Err(ArgsError::UnknownArg(extra));
        }

        Ok(Some(Self { db_url, command }))
    }
}

fn parse_id<T: std::str::FromStr>(raw: String) -> Result<T, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidId { raw })
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

/// sqlx will not create a missing database file on its own.
fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
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

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

pub(crate) fn print_notifications(notifier: &Notifier) {
    for note in notifier.drain() {
        println!("[{}] {}", note.level, note.message);
    }
}

fn print_dashboard(overview: &DashboardOverview) {
    println!(
        "courses: {}  modules: {}  lessons: {}",
        overview.course_count, overview.module_count, overview.lesson_count
    );
    if let Some(learner) = &overview.learner {
        println!(
            "completed: {}/{} ({}%)",
            learner.completed_lessons,
            learner.total_lessons,
            learner.percent()
        );
        if let Some(average) = learner.average_score {
            println!("average score: {average}%");
        }
    }
    if let Some(stats) = &overview.stats {
        println!(
            "streak: {} days  study time: {:.1} h  predicted score: {}",
            stats.current_streak, stats.total_study_hours, stats.predicted_score
        );
    }
    for course in &overview.courses {
        println!("{} ({}%)", course.name, course.percent());
        for module in &course.modules {
            println!(
                "  {} {}/{} ({}%)",
                module.name,
                module.completed,
                module.total,
                module.percent()
            );
        }
    }
}

async fn print_profile(
    services: &AppServices,
    user: &User,
) -> Result<(), Box<dyn std::error::Error>> {
    let profiles = services.profiles();
    match profiles.profile(user.id).await? {
        Some(profile) => println!(
            "{} <{}>",
            profile.full_name.as_deref().unwrap_or(&user.username),
            profile.email.as_deref().unwrap_or(&user.email)
        ),
        None => println!("{} (no profile yet)", user.username),
    }
    for goal in profiles.goals(user.id).await? {
        let mark = if goal.completed { "x" } else { " " };
        println!(
            "[{mark}] {} {}/{} ({}%)",
            goal.goal_type,
            goal.current_value,
            goal.target_value,
            goal.percent()
        );
    }
    for achievement in profiles.achievements(user.id).await? {
        println!(
            "{}  {}",
            achievement.earned_at.format("%Y-%m-%d"),
            achievement.title
        );
    }
    Ok(())
}

async fn print_practice(
    services: &AppServices,
    user: &User,
) -> Result<(), Box<dyn std::error::Error>> {
    let practice = services.practice();
    let stats = practice.dashboard_stats(user.id).await?;
    println!(
        "vocabulary: {}  notes: {}  highlights: {}",
        stats.vocabulary_count, stats.notes_count, stats.highlights_count
    );
    for kind in [
        PracticeKind::Grammar,
        PracticeKind::Reading,
        PracticeKind::Listening,
    ] {
        let done = practice.completed_count(kind, user.id).await?;
        println!("{} completed: {done}", kind.path_segment());
    }
    println!(
        "flashcards mastered: {}",
        practice.mastered_flashcards(user.id).await?
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let parsed = Args::parse(std::env::args().skip(1)).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let Some(args) = parsed else {
        print_usage();
        return Ok(());
    };

    let mut config = AppConfig::from_env()?;
    if let Some(db_url) = args.db_url {
        config.db_url = db_url;
    }
    // Keep file creation in the binary glue so services stay free of it.
    prepare_sqlite_file(&config.db_url)?;

    let services = AppServices::new(&config, Clock::default_clock()).await?;
    let mut auth: AuthContext = services.auth().await?;

    match args.command {
        Command::Courses => {
            for course in services.content().courses().await? {
                println!("{:>4}  {}", course.id, course.name);
            }
        }
        Command::Course(id) => {
            let detail = services.content().course_detail(id).await?;
            println!("# {}", detail.name);
            for module in &detail.modules {
                println!("{}", module.name);
                for lesson in &module.lessons {
                    println!("  {:>4}  {}", lesson.id, lesson.title);
                }
            }
        }
        Command::Lesson(id) => {
            quiz::run(&services.session_loop(), id, auth.user()).await?;
        }
        Command::Login { username, password } => {
            let user = auth.login(&username, &password).await?;
            println!("logged in as {}", user.username);
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let user = auth.register(&username, &email, &password).await?;
            println!("registered and logged in as {}", user.username);
        }
        Command::Logout => {
            auth.logout().await?;
            println!("logged out");
        }
        Command::WhoAmI => match auth.user() {
            Some(user) => println!("{} <{}> (id {})", user.username, user.email, user.id),
            None => println!("not logged in"),
        },
        Command::Dashboard => {
            let overview = services.dashboard().overview(auth.user()).await?;
            print_dashboard(&overview);
        }
        Command::Profile => match auth.user() {
            Some(user) => print_profile(&services, user).await?,
            None => println!("not logged in"),
        },
        Command::Practice => match auth.user() {
            Some(user) => print_practice(&services, user).await?,
            None => println!("not logged in"),
        },
    }

    print_notifications(services.notifier());
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    telemetry::init_tracing();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
