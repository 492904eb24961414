use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use cuaca::city::{parse_document, resolve, CatalogSource, CityMatch, Resolution};
use cuaca::config::{Settings, DEFAULT_CITIES_PATH};
use cuaca::server::{self, AppState, WeatherResponse};
use cuaca::upstream::Upstream;
use tracing_subscriber::EnvFilter;

/// cuaca: city lookup and BMKG data-cuaca passthrough
///
/// Resolves free-text Indonesian city names against a fixed catalog and
/// fetches the matching weather document from infoBMKG/data-cuaca.
///
/// Examples:
///   cuaca serve --port 8000
///   cuaca resolve "Bandung"
///   cuaca weather Jakarta --at 2025-01-31
///   cuaca update-cities --source https://example.org/cities.json
///   cuaca list --path data
///   cuaca fetch --path data/aceh.json
#[derive(Parser)]
#[command(name = "cuaca", version, about, long_about = None)]
struct Cli {
    /// Catalog source (file path or URL). Overrides CITIES_PATH.
    #[arg(long, global = true)]
    cities: Option<String>,

    /// Maximum number of suggestions. Overrides SUGGEST_LIMIT.
    #[arg(long, global = true)]
    limit: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP API (/health, /cities, /weather).
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[arg(long, short = 'p', default_value_t = 8000)]
        port: u16,
    },

    /// Resolve a city name and print the match as JSON.
    Resolve { query: String },

    /// Resolve a city and print its weather document.
    Weather {
        city: String,

        /// Date (YYYY-MM-DD), echoed in the output.
        #[arg(long)]
        at: Option<String>,
    },

    /// Validate a {code, name} JSON array and write it as the catalog file.
    UpdateCities {
        /// URL or file path containing the JSON array.
        #[arg(long)]
        source: String,

        #[arg(long, default_value = DEFAULT_CITIES_PATH)]
        output: PathBuf,
    },

    /// List repository contents through the GitHub API.
    List {
        /// Path inside infoBMKG/data-cuaca.
        #[arg(long)]
        path: Option<String>,
    },

    /// Print a file from the repository.
    Fetch {
        /// Path inside infoBMKG/data-cuaca.
        #[arg(long)]
        path: String,

        /// Print as-is instead of pretty-printing JSON.
        #[arg(long)]
        raw: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let settings = load_settings(&cli);

    match cli.command {
        Command::Serve { ref host, port } => serve(settings, host, port),
        Command::Resolve { ref query } => run_resolve(&settings, query),
        Command::Weather { ref city, ref at } => run_weather(&settings, city, at.as_deref()),
        Command::UpdateCities {
            ref source,
            ref output,
        } => update_cities(source, output),
        Command::List { ref path } => run_list(&settings, path.as_deref()),
        Command::Fetch { ref path, raw } => run_fetch(&settings, path, raw),
    }
}

fn fail(msg: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", msg);
    std::process::exit(1);
}

fn load_settings(cli: &Cli) -> Settings {
    let mut settings = Settings::from_env().unwrap_or_else(|e| fail(e));
    if let Some(ref cities) = cli.cities {
        settings.cities = CatalogSource::parse(cities);
    }
    if let Some(limit) = cli.limit {
        settings.suggest_limit = limit;
    }
    settings
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => fail(e),
    }
}

// ─── serve ───────────────────────────────────────────────────────

fn serve(settings: Settings, host: &str, port: u16) {
    // No traffic without a complete catalog.
    let catalog = settings.cities.load().unwrap_or_else(|e| {
        tracing::error!("{}", e);
        std::process::exit(1);
    });

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| fail(e));
    runtime.block_on(server::start(host, port, AppState::new(catalog, settings)));
}

// ─── resolve / weather ───────────────────────────────────────────

fn resolve_query(settings: &Settings, query: &str) -> Resolution {
    if query.trim().is_empty() {
        fail("Query must not be empty.");
    }
    let catalog = settings.cities.load().unwrap_or_else(|e| fail(e));
    resolve(&catalog, query, settings.suggest_limit)
}

fn run_resolve(settings: &Settings, query: &str) {
    print_json(&CityMatch::from(resolve_query(settings, query)));
}

fn run_weather(settings: &Settings, query: &str, at: Option<&str>) {
    if let Some(d) = at {
        if let Err(e) = NaiveDate::parse_from_str(d, "%Y-%m-%d") {
            fail(format!("Invalid date '{}': {}", d, e));
        }
    }

    let city = match resolve_query(settings, query) {
        Resolution::Found { city } => city,
        other => {
            eprintln!("{}", other.message());
            for (i, c) in other.suggestions().iter().enumerate() {
                eprintln!("  {}. {} [{}]", i + 1, c.name, c.code);
            }
            std::process::exit(1);
        }
    };

    let data = Upstream::from_settings(settings)
        .weather(settings, &city.code)
        .unwrap_or_else(|e| fail(e));

    print_json(&WeatherResponse {
        city,
        date: at.map(str::to_string),
        data,
    });
}

// ─── update-cities ───────────────────────────────────────────────

fn update_cities(source: &str, output: &Path) {
    let text = CatalogSource::parse(source)
        .read()
        .unwrap_or_else(|e| fail(e));
    let (payload, cities) = parse_document(&text).unwrap_or_else(|e| fail(e));

    let mut json = serde_json::to_string_pretty(&payload).unwrap_or_else(|e| fail(e));
    json.push('\n');

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).unwrap_or_else(|e| fail(e));
    }
    fs::write(output, json).unwrap_or_else(|e| fail(e));

    tracing::info!("Wrote {} cities", cities.len());
    println!("Updated {}", output.display());
}

// ─── list / fetch ────────────────────────────────────────────────

fn run_list(settings: &Settings, path: Option<&str>) {
    let listing = Upstream::from_settings(settings)
        .list_contents(path)
        .unwrap_or_else(|e| fail(e));
    print_json(&listing);
}

fn run_fetch(settings: &Settings, path: &str, raw: bool) {
    let text = Upstream::from_settings(settings)
        .fetch_raw(path)
        .unwrap_or_else(|e| fail(e));

    if raw {
        println!("{}", text);
        return;
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(value) => print_json(&value),
        Err(_) => fail("response is not valid JSON. Use --raw to print it as-is."),
    }
}
