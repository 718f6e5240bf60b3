mod args;

use finzo_core::CourseView;
use finzo_core::model::Course;
use services::{AppServices, Clock, CourseFetcher, CourseFetcherConfig};
use tracing_subscriber::EnvFilter;

use crate::args::{ArgsError, Cli, Command, normalize_sqlite_url, print_usage};

type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

fn fetcher_for(api_url: Option<String>, token: Option<String>) -> CourseFetcher {
    let mut config = CourseFetcherConfig::from_env();
    if let Some(url) = api_url {
        config.base_url = url;
    }
    if let Some(token) = token {
        config.token = Some(token);
    }
    CourseFetcher::new(config)
}

fn print_json(value: &impl serde::Serialize) -> AppResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_course(course: &Course, view: &CourseView) {
    println!("{} ({})", course.title(), course.id());
    if !course.description().is_empty() {
        println!("{}", course.description());
    }
    println!("Progress: {}%", view.progress.rounded());
    for section in course.sections() {
        let Some(state) = view.section(section.index()) else {
            continue;
        };
        let mark = if state.is_completed { "x" } else { " " };
        let pointer = if state.is_current { ">" } else { " " };
        let lock = if state.is_locked { " (locked)" } else { "" };
        println!(
            "{pointer} [{mark}] {}. {}{lock}",
            section.index(),
            section.title()
        );
    }
    let nav = view.navigation;
    println!(
        "Next: {}  Previous: {}",
        if nav.can_go_next { "yes" } else { "no" },
        if nav.can_go_previous { "yes" } else { "no" }
    );
}

async fn run() -> AppResult<()> {
    let default_db = std::env::var("FINZO_DB_URL")
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| "sqlite:finzo.sqlite3".into());

    let cli = Cli::parse(std::env::args().skip(1), default_db).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    if cli.command == Command::Help {
        print_usage();
        return Ok(());
    }

    let db_url = normalize_sqlite_url(cli.db_url);
    prepare_sqlite_file(&db_url)?;
    tracing::debug!(db = %db_url, "opening database");

    let fetcher = match &cli.command {
        Command::Fetch { api_url, token, .. } => fetcher_for(api_url.clone(), token.clone()),
        _ => CourseFetcher::from_env(),
    };
    let services = AppServices::new_sqlite(&db_url, Clock::default(), fetcher).await?;
    let catalog = services.catalog();
    let learning = services.learning();

    match cli.command {
        Command::Help => {}
        Command::Import { path, id } => {
            let course = catalog.import_file(&path, id).await?;
            println!(
                "Imported {} \"{}\" with {} sections",
                course.id(),
                course.title(),
                course.section_count()
            );
        }
        Command::Fetch { course_id, .. } => {
            let fetcher = services.fetcher();
            let course = catalog.import_remote(&fetcher, &course_id).await?;
            println!(
                "Fetched {} \"{}\" with {} sections",
                course.id(),
                course.title(),
                course.section_count()
            );
        }
        Command::Courses => {
            let courses = catalog.list_courses().await?;
            if courses.is_empty() {
                println!("No courses imported yet.");
            }
            for course in courses {
                let duration = course
                    .estimated_duration
                    .map(|d| format!(", {d}"))
                    .unwrap_or_default();
                println!(
                    "{}  {} ({} sections{duration})",
                    course.id, course.title, course.total_sections
                );
            }
        }
        Command::Login(user_id) => {
            learning.sign_in(user_id).await?;
            println!("Signed in as user {user_id}");
        }
        Command::Logout => {
            learning.sign_out().await?;
            println!("Signed out");
        }
        Command::Enroll(course_id) => {
            let outcome = learning.enroll(&course_id).await?;
            if outcome.created {
                println!("Enrolled in {course_id}");
            } else {
                println!("Already enrolled in {course_id}");
            }
        }
        Command::Enrollments => {
            let enrollments = learning.enrollments().await?;
            if enrollments.is_empty() {
                println!("No enrollments.");
            }
            for row in enrollments {
                let status = if row.enrollment.is_completed {
                    "completed"
                } else {
                    "in progress"
                };
                println!(
                    "{}  {}  {}%  {status}  last accessed {}",
                    row.enrollment.course_id,
                    row.course_title,
                    row.progress.rounded(),
                    row.enrollment.last_accessed_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        Command::Show(course_id) => {
            let session = learning.open_course(&course_id).await?;
            if cli.json {
                print_json(&session.view)?;
            } else {
                print_course(&session.course, &session.view);
            }
        }
        Command::Submit {
            course_id,
            section,
            answers,
        } => {
            let submission = learning.submit_quiz(&course_id, section, &answers).await?;
            if cli.json {
                print_json(&submission.result)?;
            } else {
                let result = submission.result;
                println!(
                    "{}/{} correct ({:.0}%): {}",
                    result.correct_count,
                    result.total_questions,
                    result.score_percent,
                    if result.passed { "passed" } else { "not passed" }
                );
                if submission.course_completed {
                    println!("Course completed.");
                } else {
                    let nav = submission.view.navigation;
                    println!("Current section: {}", nav.active_section);
                }
            }
        }
    }

    Ok(())
}

fn prepare_sqlite_file(db_url: &str) -> AppResult<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        // In-memory and `sqlite:file:` URLs need no file on disk.
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
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

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
