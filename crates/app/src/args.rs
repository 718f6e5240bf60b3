use std::fmt;
use std::path::PathBuf;

use finzo_core::Answers;
use finzo_core::model::{CourseId, UserId};

#[derive(Debug, PartialEq, Eq)]
pub enum ArgsError {
    MissingCommand,
    UnknownCommand(String),
    MissingValue { flag: &'static str },
    MissingArgument { name: &'static str },
    UnknownArg(String),
    InvalidCourseId { raw: String },
    InvalidUserId { raw: String },
    InvalidSection { raw: String },
    InvalidAnswer { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingCommand => write!(f, "missing command"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown command: {cmd}"),
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { name } => write!(f, "missing <{name}>"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidCourseId { raw } => write!(f, "invalid course id: {raw:?}"),
            ArgsError::InvalidUserId { raw } => write!(f, "invalid user id: {raw}"),
            ArgsError::InvalidSection { raw } => write!(f, "invalid --section value: {raw}"),
            ArgsError::InvalidAnswer { raw } => {
                write!(f, "invalid --answer value: {raw} (expected <question-id>=<text>)")
            }
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw:?}"),
        }
    }
}

impl std::error::Error for ArgsError {}

#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Help,
    Import {
        path: PathBuf,
        id: Option<CourseId>,
    },
    Fetch {
        course_id: CourseId,
        api_url: Option<String>,
        token: Option<String>,
    },
    Courses,
    Login(UserId),
    Logout,
    Enroll(CourseId),
    Enrollments,
    Show(CourseId),
    Submit {
        course_id: CourseId,
        section: u32,
        answers: Answers,
    },
}

#[derive(Debug, PartialEq, Eq)]
pub struct Cli {
    pub db_url: String,
    pub json: bool,
    pub command: Command,
}

pub fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  finzo [--db <sqlite_url>] [--json] <command>");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  import <file.json> [--id <course-id>]");
    eprintln!("  fetch <course-id> [--api-url <url>] [--token <token>]");
    eprintln!("  courses");
    eprintln!("  login <user-id>");
    eprintln!("  logout");
    eprintln!("  enroll <course-id>");
    eprintln!("  enrollments");
    eprintln!("  show <course-id>");
    eprintln!("  submit <course-id> --section <n> --answer <question-id>=<text>...");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:finzo.sqlite3");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  FINZO_DB_URL, FINZO_API_BASE_URL, FINZO_API_TOKEN, RUST_LOG");
}

/// Flags collected before the command decides which ones it accepts.
#[derive(Default)]
struct Flags {
    id: Option<String>,
    api_url: Option<String>,
    token: Option<String>,
    section: Option<String>,
    answers: Vec<String>,
}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn course_id(raw: String) -> Result<CourseId, ArgsError> {
    CourseId::new(raw.clone()).map_err(|_| ArgsError::InvalidCourseId { raw })
}

fn parse_answer(raw: &str) -> Result<(String, String), ArgsError> {
    match raw.split_once('=') {
        Some((qid, text)) if !qid.trim().is_empty() => {
            Ok((qid.trim().to_string(), text.to_string()))
        }
        _ => Err(ArgsError::InvalidAnswer {
            raw: raw.to_string(),
        }),
    }
}

impl Cli {
    /// Parses arguments after the program name. `default_db` is used unless
    /// `--db` is given.
    pub fn parse(
        args: impl IntoIterator<Item = String>,
        default_db: String,
    ) -> Result<Self, ArgsError> {
        let mut db_url = default_db;
        let mut json = false;
        let mut flags = Flags::default();
        let mut positionals = Vec::new();

        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--json" => json = true,
                "--id" => flags.id = Some(require_value(&mut args, "--id")?),
                "--api-url" => flags.api_url = Some(require_value(&mut args, "--api-url")?),
                "--token" => flags.token = Some(require_value(&mut args, "--token")?),
                "--section" => flags.section = Some(require_value(&mut args, "--section")?),
                "--answer" => flags.answers.push(require_value(&mut args, "--answer")?),
                "--help" | "-h" => {
                    return Ok(Self {
                        db_url,
                        json,
                        command: Command::Help,
                    });
                }
                other if other.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positionals.push(arg),
            }
        }

        let command = build_command(positionals, flags)?;
        Ok(Self {
            db_url,
            json,
            command,
        })
    }
}

fn build_command(positionals: Vec<String>, mut flags: Flags) -> Result<Command, ArgsError> {
    let mut positionals = positionals.into_iter();
    let name = positionals.next().ok_or(ArgsError::MissingCommand)?;

    let mut take = |name: &'static str| {
        positionals
            .next()
            .ok_or(ArgsError::MissingArgument { name })
    };

    let command = match name.as_str() {
        "help" => Command::Help,
        "import" => Command::Import {
            path: PathBuf::from(take("file.json")?),
            id: flags.id.take().map(course_id).transpose()?,
        },
        "fetch" => Command::Fetch {
            course_id: course_id(take("course-id")?)?,
            api_url: flags.api_url.take(),
            token: flags.token.take(),
        },
        "courses" => Command::Courses,
        "login" => {
            let raw = take("user-id")?;
            let id: u64 = raw
                .parse()
                .map_err(|_| ArgsError::InvalidUserId { raw: raw.clone() })?;
            Command::Login(UserId::new(id))
        }
        "logout" => Command::Logout,
        "enroll" => Command::Enroll(course_id(take("course-id")?)?),
        "enrollments" => Command::Enrollments,
        "show" => Command::Show(course_id(take("course-id")?)?),
        "submit" => {
            let course = course_id(take("course-id")?)?;
            let raw = flags
                .section
                .take()
                .ok_or(ArgsError::MissingValue { flag: "--section" })?;
            let section: u32 = raw
                .parse()
                .map_err(|_| ArgsError::InvalidSection { raw: raw.clone() })?;
            let answers = std::mem::take(&mut flags.answers)
                .iter()
                .map(|raw| parse_answer(raw))
                .collect::<Result<Answers, _>>()?;
            Command::Submit {
                course_id: course,
                section,
                answers,
            }
        }
        _ => return Err(ArgsError::UnknownCommand(name)),
    };

    if let Some(extra) = positionals.next() {
        return Err(ArgsError::UnknownArg(extra));
    }
    let leftover = [
        flags.id.map(|_| "--id"),
        flags.api_url.map(|_| "--api-url"),
        flags.token.map(|_| "--token"),
        flags.section.map(|_| "--section"),
        (!flags.answers.is_empty()).then_some("--answer"),
    ];
    if let Some(flag) = leftover.into_iter().flatten().next() {
        return Err(ArgsError::UnknownArg(flag.to_string()));
    }
    Ok(command)
}

/// Accepts `sqlite::memory:`, `sqlite://...` URLs and bare paths, resolving
/// relative paths against the working directory.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw.starts_with("sqlite::memory:")
        || raw.starts_with("sqlite://")
        || raw.starts_with("sqlite:file:")
    {
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
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}
