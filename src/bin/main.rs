//! reportgrid CLI - Render report pages against a SQLite database
//!
//! Usage:
//!   reportgrid render <page> [--user <name>] [--format html|csv|sql] [--param key=value]...
//!   reportgrid list
//!   reportgrid prefs <user> [--clear <report>]
//!
//! Examples:
//!   reportgrid render unbilled --user jsmith --param filter_groupby=name_staff
//!   reportgrid render services --format csv --param customerid=12
//!   reportgrid prefs jsmith --clear timereg_unbilled

use std::io;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use reportgrid::config::{PreferenceBackend, Settings};
use reportgrid::datasource::SqliteDataSource;
use reportgrid::error::{ReportError, ReportResult};
use reportgrid::options::RequestParams;
use reportgrid::pages;
use reportgrid::preferences::{
    MemoryPreferenceStore, PreferenceKey, PreferenceStore, SqlitePreferenceStore,
};
use reportgrid::render::{MapTranslator, QueryStringLinks};
use reportgrid::report::RenderEnv;

#[derive(Parser)]
#[command(name = "reportgrid")]
#[command(about = "reportgrid - Configurable tabular reports over SQL data")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report page
    Render {
        /// Page name or path (see `list`)
        page: String,

        /// User whose display preferences apply
        #[arg(short, long, default_value = "default")]
        user: String,

        /// Output format
        #[arg(short, long, default_value = "html")]
        format: OutputFormat,

        /// Request parameter, as submitted by the options form
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// List available report pages
    List,

    /// Show or clear a user's saved display preferences
    Prefs {
        user: String,

        /// Report key to forget
        #[arg(long)]
        clear: Option<String>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Interactive table with options form
    Html,
    /// Delimited export
    Csv,
    /// The generated query only
    Sql,
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{}'", s))
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match Settings::load() {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error loading configuration: {}", e);
            return ExitCode::FAILURE;
        }
    };

    init_logging(&settings);

    let result = match cli.command {
        Commands::Render {
            page,
            user,
            format,
            params,
        } => cmd_render(&settings, &page, &user, format, params),
        Commands::List => cmd_list(),
        Commands::Prefs { user, clear } => cmd_prefs(&settings, &user, clear),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn open_store(settings: &Settings) -> ReportResult<Box<dyn PreferenceStore>> {
    match settings.preferences.backend {
        PreferenceBackend::Memory => Ok(Box::new(MemoryPreferenceStore::new())),
        PreferenceBackend::Sqlite => {
            let store = match settings.preferences.resolved_path()? {
                Some(path) => SqlitePreferenceStore::open(path)?,
                None => SqlitePreferenceStore::open_default()?,
            };
            Ok(Box::new(store))
        }
    }
}

fn cmd_render(
    settings: &Settings,
    page_name: &str,
    user: &str,
    format: OutputFormat,
    params: Vec<(String, String)>,
) -> ReportResult<()> {
    let page = pages::find(page_name)?;

    let db_path = settings.database.resolved_path()?;
    if !db_path.exists() {
        return Err(ReportError::DatabaseNotFound(db_path));
    }
    let source = SqliteDataSource::open(&db_path)?;
    let store = open_store(settings)?;
    let request = RequestParams::from_query_pairs(params);

    let (report, result) = pages::run(page.as_ref(), &source, store.as_ref(), user, &request)?;

    let translator = MapTranslator::from_settings(settings);
    let links = QueryStringLinks::new(&settings.render.page_base);
    let env = RenderEnv {
        page: page.path(),
        language: &settings.render.language,
        translator: &translator,
        link_renderer: &links,
    };

    match format {
        OutputFormat::Html => {
            println!("<h3>{}</h3>", page.title().to_uppercase());
            print!("{}", report.render_interactive(&env, &result));
        }
        OutputFormat::Csv => {
            let delimiter = settings.render.delimiter_byte()?;
            report.render_export(&env, &result, delimiter, io::stdout().lock())?;
        }
        OutputFormat::Sql => {
            println!("{}", report.generate_query(settings.database.dialect()?));
        }
    }

    Ok(())
}

fn cmd_list() -> ReportResult<()> {
    println!("Pages:");
    for page in pages::all() {
        println!("  - {} ({}): {}", page.name(), page.path(), page.title());
    }
    Ok(())
}

fn cmd_prefs(settings: &Settings, user: &str, clear: Option<String>) -> ReportResult<()> {
    if settings.preferences.backend == PreferenceBackend::Memory {
        println!("Preferences are not persisted with the memory backend.");
        return Ok(());
    }

    let store = match settings.preferences.resolved_path()? {
        Some(path) => SqlitePreferenceStore::open(path)?,
        None => SqlitePreferenceStore::open_default()?,
    };

    if let Some(report) = clear {
        let key = PreferenceKey::new(user, report);
        if store.delete(&key)? {
            println!("Cleared {}", key);
        } else {
            println!("No preferences saved for {}", key);
        }
        return Ok(());
    }

    let reports = store.reports_for_user(user)?;
    if reports.is_empty() {
        println!("No preferences saved for {}.", user);
        return Ok(());
    }
    println!("Saved preferences for {}:", user);
    for report in reports {
        let key = PreferenceKey::new(user, report.as_str());
        if let Some(pref) = store.get(&key)? {
            println!(
                "  - {}: columns [{}], order [{}]{}",
                report,
                pref.selected_columns.join(", "),
                pref.order_columns.join(", "),
                pref.group_by
                    .map(|g| format!(", grouped by {}", g))
                    .unwrap_or_default()
            );
        }
    }
    Ok(())
}
