use std::fmt;
use std::sync::Arc;

use dioxus::LaunchBuilder;
use dioxus::desktop::{Config as DesktopConfig, WindowBuilder};
use services::{
    AppServices, Clock, InstallService, ServicesConfigDraft, TutorSessionService, UpdateService,
};
use tokio::sync::watch;
use tracing::info;
use tracing_subscriber::EnvFilter;
use ui::{App, UiApp, build_app_context};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
    EmptyValue { flag: &'static str },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::EmptyValue { flag } => write!(f, "{flag} must not be empty"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    let value = args.next().ok_or(ArgsError::MissingValue { flag })?;
    if value.trim().is_empty() {
        return Err(ArgsError::EmptyValue { flag });
    }
    Ok(value)
}

struct DesktopApp {
    services: AppServices,
}

impl UiApp for DesktopApp {
    fn tutor(&self) -> Arc<TutorSessionService> {
        self.services.tutor()
    }

    fn updates(&self) -> Option<Arc<UpdateService>> {
        self.services.updates()
    }

    fn install(&self) -> Arc<InstallService> {
        self.services.install()
    }

    fn reloads(&self) -> Option<watch::Receiver<u64>> {
        self.services
            .release_shell()
            .map(|shell| shell.subscribe_reloads())
    }
}

struct Args {
    db_url: String,
    config: ServicesConfigDraft,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--db <sqlite_url>] [--api <base_url>] [--user <id>] [--topic <id>]"
    );
    eprintln!("                     [--origin <url>] [--force-update]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db sqlite:nextgrades.sqlite3");
    eprintln!("  --topic {}", services::config::DEFAULT_TOPIC_ID);
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  NEXTGRADES_DB_URL, NEXTGRADES_API_BASE_URL, NEXTGRADES_USER_ID,");
    eprintln!("  NEXTGRADES_TOPIC_ID, NEXTGRADES_APP_ORIGIN, NEXTGRADES_FORCE_UPDATE");
    eprintln!("  RUST_LOG (default: info)");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut db_url = normalize_sqlite_url(
            std::env::var("NEXTGRADES_DB_URL")
                .unwrap_or_else(|_| "sqlite:nextgrades.sqlite3".into()),
        );
        let mut config = ServicesConfigDraft::from_env();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    db_url = normalize_sqlite_url(value);
                }
                "--api" => config.api.base_url = Some(require_value(args, "--api")?),
                "--user" => config.api.user_id = Some(require_value(args, "--user")?),
                "--topic" => config.api.topic_id = Some(require_value(args, "--topic")?),
                "--origin" => config.app_origin = Some(require_value(args, "--origin")?),
                "--force-update" => config.force_update = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self { db_url, config })
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

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;
    let config = parsed.config.validate()?;
    info!(
        db = %parsed.db_url,
        api = %config.api.base_url(),
        updates = config.app_origin.is_some(),
        force_update = config.force_update,
        "starting NextGrades"
    );

    // Flag storage is opened and migrated here so core/services stay free of file-system setup.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(&parsed.db_url, config, Clock::default_clock()).await?;

    let app: Arc<dyn UiApp> = Arc::new(DesktopApp { services });
    let context = build_app_context(&app);

    // On macOS, Dioxus/tao can default to an always-on-top window in some dev setups.
    let desktop_cfg = DesktopConfig::new().with_window(
        WindowBuilder::new()
            .with_title("NextGrades")
            .with_always_on_top(false),
    );

    LaunchBuilder::desktop()
        .with_cfg(desktop_cfg)
        .with_context(context)
        .launch(App);
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|arg| (*arg).to_string());
        Args::parse(&mut iter)
    }

    #[test]
    fn flags_override_config() {
        let args = parse(&[
            "--db",
            "sqlite::memory:",
            "--api",
            "https://api.example.com",
            "--user",
            "student-1",
            "--topic",
            "topic-9",
            "--force-update",
        ])
        .expect("valid args");
        assert_eq!(args.db_url, "sqlite::memory:");
        assert_eq!(args.config.api.base_url.as_deref(), Some("https://api.example.com"));
        assert_eq!(args.config.api.user_id.as_deref(), Some("student-1"));
        assert_eq!(args.config.api.topic_id.as_deref(), Some("topic-9"));
        assert!(args.config.force_update);
    }

    #[test]
    fn missing_flag_value_is_reported() {
        assert!(matches!(
            parse(&["--api"]),
            Err(ArgsError::MissingValue { flag: "--api" })
        ));
        assert!(matches!(
            parse(&["--user", "  "]),
            Err(ArgsError::EmptyValue { flag: "--user" })
        ));
    }

    #[test]
    fn unknown_flags_are_rejected() {
        assert!(matches!(parse(&["--deck-id"]), Err(ArgsError::UnknownArg(_))));
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/app.sqlite3".into());
        assert!(url.starts_with("sqlite:///"), "{url}");
        assert!(url.ends_with("data/app.sqlite3"), "{url}");
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }
}
