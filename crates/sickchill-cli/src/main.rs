//! sickchill - command-line client for SickChill-compatible media managers.

/// Application configuration (TOML).
mod config;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::instrument;
use tracing_subscriber::filter::EnvFilter;
#[cfg(not(feature = "otel"))]
use tracing_subscriber::fmt;
#[cfg(feature = "otel")]
use tracing_subscriber::layer::SubscriberExt;
#[cfg(feature = "otel")]
use tracing_subscriber::util::SubscriberInitExt;
use url::Url;

use crate::config::{AppConfig, resolve_config_path};
use sickchill_api::{
    CancellationToken, Credentials, LocalSickChillApi, SearchResult, ShowEntry, SickChillClient,
};

/// Environment variable overriding `server.api_key`.
const API_KEY_ENV: &str = "SICKCHILL_API_KEY";

/// CLI argument parser.
#[derive(Parser)]
#[command(about, version)]
struct Cli {
    /// Override config directory.
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Subcommand to run.
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Exchange a username and password for the server's API key.
    Key(KeyArgs),
    /// Movie operations.
    Movie(MovieCommand),
    /// Show operations.
    Show(ShowCommand),
    /// Manage the config file.
    Config(ConfigCommand),
}

/// Arguments for the `key` subcommand.
#[derive(clap::Args)]
struct KeyArgs {
    /// Server URL (default: derived from the config file).
    #[arg(long)]
    server_url: Option<Url>,
    /// Login username.
    #[arg(long, required = true)]
    username: String,
    /// Login password.
    #[arg(long, env = "SICKCHILL_PASSWORD", hide_env_values = true)]
    password: String,
}

/// Arguments for the `movie` subcommand.
#[derive(clap::Args)]
struct MovieCommand {
    /// Movie subcommand to run.
    #[command(subcommand)]
    command: MovieSubcommands,
}

/// Available movie subcommands.
#[derive(Subcommand)]
enum MovieSubcommands {
    /// Add a movie (`movie.add`). Already tracked titles are not re-added.
    Add(MovieAddArgs),
    /// Trigger a full movie search (`movie.searcher.full_search`).
    FullSearch,
}

/// Arguments for the `movie add` subcommand.
#[derive(clap::Args)]
struct MovieAddArgs {
    /// IMDb ID (e.g. "tt0133093").
    #[arg(long, required = true)]
    id: String,
    /// Movie title.
    #[arg(long, required = true)]
    title: String,
}

/// Arguments for the `show` subcommand.
#[derive(clap::Args)]
struct ShowCommand {
    /// Show subcommand to run.
    #[command(subcommand)]
    command: ShowSubcommands,
}

/// Available show subcommands.
#[derive(Subcommand)]
enum ShowSubcommands {
    /// Add a show by TVDB ID (`show.addnew`).
    Add(ShowAddArgs),
    /// Search the indexers for a show (`sb.searchtvdb`).
    Search(ShowSearchArgs),
}

/// Arguments for the `show add` subcommand.
#[derive(clap::Args)]
struct ShowAddArgs {
    /// TVDB ID.
    #[arg(long, required = true)]
    tvdbid: u64,
    /// Initial quality profile (e.g. "hdtv").
    #[arg(long)]
    initial: Option<String>,
}

/// Arguments for the `show search` subcommand.
#[derive(clap::Args)]
struct ShowSearchArgs {
    /// Show name to search for.
    #[arg(long, required = true)]
    query: String,
}

/// Arguments for the `config` subcommand.
#[derive(clap::Args)]
struct ConfigCommand {
    /// Config subcommand to run.
    #[command(subcommand)]
    command: ConfigSubcommands,
}

/// Available config subcommands.
#[derive(Subcommand)]
enum ConfigSubcommands {
    /// Write a default config file.
    Init,
    /// Print the effective config (API key redacted).
    Show,
}

/// Builds a client from the config file and `SICKCHILL_API_KEY`.
///
/// # Errors
///
/// Returns an error if the client fails to build.
#[instrument(skip_all)]
fn build_client(app: &AppConfig) -> Result<SickChillClient> {
    let api_key = std::env::var(API_KEY_ENV).ok();

    SickChillClient::builder()
        .config(app.client_config(api_key.as_deref()))
        .timeout(app.client.timeout())
        .retry_delay(app.client.retry_delay())
        .user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ))
        .build()
        .context("failed to build SickChill client")
}

/// Formats one search result row.
fn format_entry(entry: &ShowEntry) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}",
        entry.external_id,
        entry.name,
        entry.first_aired.as_deref().unwrap_or("-"),
        entry.indexer_id,
        if entry.already_tracked { "yes" } else { "no" },
    )
}

/// Header plus one row per entry, in server order.
fn result_rows(result: &SearchResult) -> Vec<String> {
    std::iter::once(String::from("TVDB ID\tName\tFirstAired\tIndexer\tTracked"))
        .chain(result.entries().iter().map(format_entry))
        .collect()
}

/// Logs the status line of a `show.addnew` or search response.
fn log_result_status(result: &SearchResult) {
    tracing::info!(
        "Result: {} {}",
        result.result_status.as_deref().unwrap_or("-"),
        result.message.as_deref().unwrap_or(""),
    );
}

/// Runs the `key` subcommand.
///
/// # Errors
///
/// Returns an error if the request fails or the server refuses the login.
#[instrument(skip_all)]
async fn run_key(
    api: &impl LocalSickChillApi,
    args: &KeyArgs,
    default_url: impl FnOnce() -> Result<Url>,
) -> Result<()> {
    let server_url = match &args.server_url {
        Some(url) => url.clone(),
        None => default_url()?,
    };
    let credentials = Credentials::new(&args.username, &args.password);

    let key = api
        .fetch_api_key(&server_url, &credentials)
        .await
        .context("getkey request failed")?;

    tracing::info!("API key: {key}");
    Ok(())
}

/// Runs the `movie add` subcommand.
///
/// # Errors
///
/// Returns an error if the API key is invalid or the request fails.
#[instrument(skip_all)]
async fn run_movie_add(api: &impl LocalSickChillApi, args: &MovieAddArgs) -> Result<()> {
    let body = api
        .add_movie(&args.id, &args.title)
        .await
        .context("movie.add request failed")?;

    tracing::info!("{body}");
    Ok(())
}

/// Runs the `movie full-search` subcommand.
///
/// # Errors
///
/// Returns an error if the API key is invalid or the request fails.
#[instrument(skip_all)]
async fn run_movie_full_search(api: &impl LocalSickChillApi) -> Result<()> {
    let body = api
        .trigger_full_search()
        .await
        .context("movie.searcher.full_search request failed")?;

    tracing::info!("{body}");
    Ok(())
}

/// Runs the `show add` subcommand.
///
/// # Errors
///
/// Returns an error if the API key is invalid, the request fails, or the
/// response cannot be decoded.
#[instrument(skip_all)]
async fn run_show_add(api: &impl LocalSickChillApi, args: &ShowAddArgs) -> Result<()> {
    let result = api
        .add_new_show(args.tvdbid, args.initial.as_deref())
        .await
        .context("show.addnew request failed")?;

    log_result_status(&result);
    Ok(())
}

/// Returns a token that is cancelled on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let on_ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling search");
            on_ctrl_c.cancel();
        }
    });
    token
}

/// Runs the `show search` subcommand. `cancel` is honoured between attempts.
///
/// # Errors
///
/// Returns an error if the API key is invalid, the request fails, the search
/// is cancelled, or no results are found.
#[instrument(skip_all)]
async fn run_show_search(
    api: &impl LocalSickChillApi,
    args: &ShowSearchArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let result = api
        .search_cancellable(&args.query, cancel)
        .await
        .context("sb.searchtvdb request failed")?;

    log_result_status(&result);
    for row in result_rows(&result) {
        tracing::info!("{row}");
    }
    Ok(())
}

/// Runs the `config init` subcommand.
///
/// # Errors
///
/// Returns an error if the file already exists or cannot be written.
fn run_config_init(path: &Path) -> Result<()> {
    if path.exists() {
        bail!("config file already exists: {}", path.display());
    }
    AppConfig::default().save(path)?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}

/// Runs the `config show` subcommand.
///
/// # Errors
///
/// Returns an error if the config cannot be serialized.
fn run_config_show(app: &AppConfig, path: &Path) -> Result<()> {
    let mut rendered = toml::to_string_pretty(app).context("failed to serialize config")?;
    if !app.server.api_key.is_empty() {
        rendered = rendered.replace(&app.server.api_key, "***");
    }
    tracing::info!("# {}\n{rendered}", path.display());
    Ok(())
}

/// Entry point.
///
/// # Errors
///
/// Returns an error if subcommand execution fails.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    #[cfg(not(feature = "otel"))]
    {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_target(false)
            .init();
    }

    #[cfg(feature = "otel")]
    {
        let env_filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let fmt_layer = tracing_subscriber::fmt::layer().with_target(false);

        let otel_layer = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .and_then(|_| {
                let exporter = opentelemetry_otlp::SpanExporter::builder()
                    .with_http()
                    .build()
                    .ok()?;

                let tracer_provider = opentelemetry_sdk::trace::SdkTracerProvider::builder()
                    .with_simple_exporter(exporter)
                    .build();

                let tracer = opentelemetry::trace::TracerProvider::tracer(
                    &tracer_provider,
                    env!("CARGO_PKG_NAME"),
                );
                opentelemetry::global::set_tracer_provider(tracer_provider);

                Some(tracing_opentelemetry::layer().with_tracer(tracer))
            });

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .with(otel_layer)
            .init();
    }

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.dir.as_ref())?;

    if let Commands::Config(cmd) = &cli.command
        && matches!(cmd.command, ConfigSubcommands::Init)
    {
        return run_config_init(&config_path);
    }

    let app = AppConfig::load(&config_path)?;

    match cli.command {
        Commands::Key(args) => {
            let client = build_client(&app)?;
            run_key(&client, &args, || {
                app.client_config(None).server_url().context("invalid server address")
            })
            .await
        }
        Commands::Movie(movie) => {
            let client = build_client(&app)?;
            match movie.command {
                MovieSubcommands::Add(args) => run_movie_add(&client, &args).await,
                MovieSubcommands::FullSearch => run_movie_full_search(&client).await,
            }
        }
        Commands::Show(show) => {
            let client = build_client(&app)?;
            match show.command {
                ShowSubcommands::Add(args) => run_show_add(&client, &args).await,
                ShowSubcommands::Search(args) => {
                    run_show_search(&client, &args, &cancel_on_ctrl_c()).await
                }
            }
        }
        Commands::Config(cmd) => match cmd.command {
            ConfigSubcommands::Init => run_config_init(&config_path),
            ConfigSubcommands::Show => run_config_show(&app, &config_path),
        },
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use std::sync::Mutex;

    use sickchill_api::{ClientError, NetworkError, SEARCH_ATTEMPTS, SearchData};

    use super::*;

    /// In-memory API double recording calls.
    #[derive(Default)]
    struct FakeApi {
        calls: Mutex<Vec<String>>,
        fail_status: Option<u16>,
        shows: Vec<ShowEntry>,
    }

    impl FakeApi {
        fn failing(status: u16) -> Self {
            Self {
                fail_status: Some(status),
                ..Self::default()
            }
        }

        fn with_shows(shows: Vec<ShowEntry>) -> Self {
            Self {
                shows,
                ..Self::default()
            }
        }

        fn record(&self, call: String) -> sickchill_api::Result<()> {
            self.calls.lock().unwrap().push(call);
            match self.fail_status {
                Some(status) => Err(ClientError::Network(NetworkError::Status {
                    url: String::from("http://localhost:8081/api/***/"),
                    status,
                })),
                None => Ok(()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl LocalSickChillApi for FakeApi {
        async fn fetch_api_key(
            &self,
            server_url: &Url,
            credentials: &Credentials,
        ) -> sickchill_api::Result<String> {
            self.record(format!(
                "getkey {server_url} {}",
                credentials.username_digest()
            ))?;
            Ok(String::from("0123456789abcdef0123456789abcdef"))
        }

        async fn add_movie(&self, external_id: &str, title: &str) -> sickchill_api::Result<String> {
            self.record(format!("movie.add {external_id} {title}"))?;
            Ok(String::from(r#"{"result":"success"}"#))
        }

        async fn add_new_show(
            &self,
            tvdb_id: u64,
            quality: Option<&str>,
        ) -> sickchill_api::Result<SearchResult> {
            self.record(format!("show.addnew {tvdb_id} {quality:?}"))?;
            Ok(SearchResult {
                data: SearchData::default(),
                message: Some(String::from("queued")),
                result_status: Some(String::from("success")),
            })
        }

        async fn search(&self, query: &str) -> sickchill_api::Result<SearchResult> {
            self.search_cancellable(query, &CancellationToken::new()).await
        }

        async fn search_cancellable(
            &self,
            query: &str,
            cancel: &CancellationToken,
        ) -> sickchill_api::Result<SearchResult> {
            if cancel.is_cancelled() {
                return Err(ClientError::Cancelled { attempts: 0 });
            }
            self.record(format!("sb.searchtvdb {query}"))?;
            if self.shows.is_empty() {
                return Err(ClientError::NotFound {
                    query: String::from(query),
                    attempts: SEARCH_ATTEMPTS,
                });
            }
            Ok(SearchResult {
                data: SearchData {
                    results: self.shows.clone(),
                },
                message: None,
                result_status: Some(String::from("success")),
            })
        }

        async fn trigger_full_search(&self) -> sickchill_api::Result<String> {
            self.record(String::from("movie.searcher.full_search"))?;
            Ok(String::from("{}"))
        }
    }

    #[tokio::test]
    async fn test_run_movie_add_calls_api() {
        // Arrange
        let api = FakeApi::default();
        let args = MovieAddArgs {
            id: String::from("tt0133093"),
            title: String::from("The Matrix"),
        };

        // Act
        run_movie_add(&api, &args).await.unwrap();

        // Assert
        assert_eq!(api.calls(), vec![String::from("movie.add tt0133093 The Matrix")]);
    }

    #[tokio::test]
    async fn test_run_movie_add_propagates_status() {
        // Arrange
        let api = FakeApi::failing(404);
        let args = MovieAddArgs {
            id: String::from("tt0133093"),
            title: String::from("The Matrix"),
        };

        // Act
        let err = run_movie_add(&api, &args).await.unwrap_err();

        // Assert
        let chain = format!("{err:#}");
        assert!(chain.contains("movie.add request failed"));
        assert!(chain.contains("HTTP 404"));
    }

    #[tokio::test]
    async fn test_run_show_add_passes_quality() {
        // Arrange
        let api = FakeApi::default();
        let args = ShowAddArgs {
            tvdbid: 75134,
            initial: Some(String::from("hdtv")),
        };

        // Act
        run_show_add(&api, &args).await.unwrap();

        // Assert
        assert_eq!(
            api.calls(),
            vec![String::from("show.addnew 75134 Some(\"hdtv\")")]
        );
    }

    #[tokio::test]
    async fn test_run_full_search() {
        let api = FakeApi::default();

        run_movie_full_search(&api).await.unwrap();

        assert_eq!(api.calls(), vec![String::from("movie.searcher.full_search")]);
    }

    #[tokio::test]
    async fn test_run_key_prefers_explicit_url() {
        // Arrange
        let api = FakeApi::default();
        let args = KeyArgs {
            server_url: Some(Url::parse("http://nas.lan:8081/").unwrap()),
            username: String::from("admin"),
            password: String::from("password"),
        };

        // Act
        run_key(&api, &args, || bail!("default URL should not be used"))
            .await
            .unwrap();

        // Assert
        assert_eq!(
            api.calls(),
            vec![String::from(
                "getkey http://nas.lan:8081/ 21232f297a57a5a743894a0e4a801fc3"
            )]
        );
    }

    #[tokio::test]
    async fn test_run_key_falls_back_to_config_url() {
        // Arrange
        let api = FakeApi::default();
        let mut app = AppConfig::default();
        app.server.url_base = String::from("/sickchill/");
        app.server.use_tls = true;
        let args = KeyArgs {
            server_url: None,
            username: String::from("admin"),
            password: String::from("password"),
        };

        // Act
        run_key(&api, &args, || {
            app.client_config(None).server_url().context("invalid server address")
        })
        .await
        .unwrap();

        // Assert
        assert_eq!(
            api.calls(),
            vec![String::from(
                "getkey https://localhost:8081/sickchill/ 21232f297a57a5a743894a0e4a801fc3"
            )]
        );
    }

    fn archer(name: &str, tvdbid: u64, tracked: bool) -> ShowEntry {
        ShowEntry {
            first_aired: Some(String::from("2009-09-17")),
            already_tracked: tracked,
            indexer_id: 1,
            name: String::from(name),
            external_id: tvdbid,
        }
    }

    #[tokio::test]
    async fn test_run_show_search_lists_results() {
        // Arrange
        let api = FakeApi::with_shows(vec![
            archer("Archer (2009)", 110_381, false),
            archer("Archer", 75134, true),
        ]);
        let args = ShowSearchArgs {
            query: String::from("Archer"),
        };

        // Act
        let result = run_show_search(&api, &args, &CancellationToken::new()).await;

        // Assert
        assert!(result.is_ok());
        assert_eq!(api.calls(), vec![String::from("sb.searchtvdb Archer")]);
    }

    #[tokio::test]
    async fn test_run_show_search_not_found() {
        // Arrange
        let api = FakeApi::default();
        let args = ShowSearchArgs {
            query: String::from("Nothing"),
        };

        // Act
        let err = run_show_search(&api, &args, &CancellationToken::new())
            .await
            .unwrap_err();

        // Assert
        let chain = format!("{err:#}");
        assert!(chain.contains("sb.searchtvdb request failed"));
        assert!(chain.contains("no results found for \"Nothing\" after 3 attempts"));
    }

    #[tokio::test]
    async fn test_run_show_search_cancelled() {
        // Arrange
        let api = FakeApi::with_shows(vec![archer("Archer", 75134, false)]);
        let args = ShowSearchArgs {
            query: String::from("Archer"),
        };
        let token = CancellationToken::new();
        token.cancel();

        // Act
        let err = run_show_search(&api, &args, &token).await.unwrap_err();

        // Assert
        assert!(format!("{err:#}").contains("search cancelled after 0 attempts"));
        assert!(api.calls().is_empty());
    }

    #[test]
    fn test_result_rows_keep_server_order() {
        // Arrange
        let result = SearchResult {
            data: SearchData {
                results: vec![
                    archer("Archer (2009)", 110_381, false),
                    archer("Archer", 75134, true),
                ],
            },
            message: None,
            result_status: None,
        };

        // Act
        let rows = result_rows(&result);

        // Assert
        assert_eq!(
            rows,
            vec![
                String::from("TVDB ID\tName\tFirstAired\tIndexer\tTracked"),
                String::from("110381\tArcher (2009)\t2009-09-17\t1\tno"),
                String::from("75134\tArcher\t2009-09-17\t1\tyes"),
            ]
        );
    }

    #[test]
    fn test_format_entry() {
        // Arrange
        let entry = ShowEntry {
            first_aired: None,
            already_tracked: true,
            indexer_id: 1,
            name: String::from("Archer"),
            external_id: 75134,
        };

        // Act
        let row = format_entry(&entry);

        // Assert
        assert_eq!(row, "75134\tArcher\t-\t1\tyes");
    }

    #[test]
    fn test_config_init_refuses_overwrite() {
        // Arrange
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        // Act
        let first = run_config_init(&path);
        let second = run_config_init(&path);

        // Assert
        assert!(first.is_ok());
        assert!(path.exists());
        assert!(second.unwrap_err().to_string().contains("already exists"));
    }
}
