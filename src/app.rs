use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{error::ErrorKind, Parser};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::args::{CliArgs, Command, DownloadArgs, FilterArgs, ReportArgs};
use crate::cli::validation;
use crate::client::{self, ClientOptions, HttpBackend, ReportBackend};
use crate::clipboard::Osc52Clipboard;
use crate::config::{self, ConfigFile};
use crate::export::{self, HostField};
use crate::filters::{Department, FilterState, UserStatus};
use crate::output::{self, OutputFormat};
use crate::table::Column;
use crate::widget::{ReportWidget, WidgetOptions};

const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_DEBOUNCE_MS: u64 = 200;

fn format_kv_line(label: &str, value: &str) {
    eprintln!(":: {:<10}: {}", label, value);
}

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    if let Ok(style) = ProgressStyle::with_template(":: {spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("permreport={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn summarize_filters(filters: &FilterState) -> String {
    let pairs = filters.query_pairs();
    if pairs.is_empty() {
        return "none".to_string();
    }
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Clone, Debug)]
struct RunConfig {
    client: ClientOptions,
    debounce: Duration,
    output_format: Option<OutputFormat>,
    no_color: bool,
    verbose: u8,
    command: Command,
}

fn build_filters(args: &FilterArgs) -> Result<FilterState, String> {
    let user_status = match args.status.as_deref() {
        Some(raw) => UserStatus::parse(raw)
            .ok_or_else(|| format!("invalid --status '{raw}', expected all, active or inactive"))?,
        None => UserStatus::All,
    };
    let from_date = if args.no_date {
        String::new()
    } else {
        match args.from.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => {
                crate::utils::parse_date(raw)?;
                raw.to_string()
            }
            Some(_) => String::new(),
            None => crate::utils::today(),
        }
    };
    Ok(FilterState {
        department: Department::parse(args.site.as_deref().unwrap_or_default()),
        user_status,
        username: args.user.clone().unwrap_or_default().trim().to_string(),
        from_date,
    })
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let raw_url = args
        .url
        .or(cfg.url)
        .ok_or_else(|| "a page URL is required (--url or `url` in the config file)".to_string())?;
    let page_url =
        crate::utils::parse_page_url(&raw_url).map_err(|e| format!("invalid url '{raw_url}': {e}"))?;

    let timeout_seconds = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS);
    if timeout_seconds == 0 {
        return Err("invalid timeout, expected positive integer".to_string());
    }

    let header = args.header.or(cfg.header);
    if let Some(raw) = header.as_deref() {
        crate::utils::parse_header(raw).map_err(|e| format!("invalid header '{raw}': {e}"))?;
    }

    let debounce_ms = match &args.command {
        Command::Suggest {
            debounce_ms: Some(ms),
        } => *ms,
        _ => cfg.debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS),
    };

    let output_format = match cfg.output_format.as_deref() {
        Some(raw) => Some(
            OutputFormat::parse(raw)
                .ok_or_else(|| format!("invalid output_format '{raw}' in config"))?,
        ),
        None => None,
    };

    Ok(RunConfig {
        client: ClientOptions {
            page_url,
            username: args.user_name.or(cfg.username),
            password: args.password.or(cfg.password),
            header,
            proxy: args.proxy.or(cfg.proxy),
            timeout_seconds,
        },
        debounce: Duration::from_millis(debounce_ms),
        output_format,
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        verbose: args.verbose,
        command: args.command,
    })
}

async fn write_output(path: Option<&str>, bytes: &[u8]) -> Result<(), String> {
    match path {
        Some(path) => {
            let path = config::expand_tilde(path);
            let mut outfile = tokio::fs::File::create(&path)
                .await
                .map_err(|e| format!("failed to open output file: {e}"))?;
            outfile
                .write_all(bytes)
                .await
                .map_err(|_| "failed to write output file".to_string())?;
            format_kv_line("Saved", &path.display().to_string());
        }
        None => write_flushed(&mut tokio::io::stdout(), bytes).await?,
    }
    Ok(())
}

async fn write_flushed<W: AsyncWrite + Unpin>(out: &mut W, bytes: &[u8]) -> Result<(), String> {
    out.write_all(bytes)
        .await
        .map_err(|e| format!("failed to write output: {e}"))?;
    out.flush()
        .await
        .map_err(|e| format!("failed to flush output: {e}"))
}

async fn run_sites(widget: &mut ReportWidget<HttpBackend>) -> Result<(), String> {
    let pb = spinner("Loading sites...");
    let loaded = widget.load_departments().await.map(|o| o.to_vec());
    pb.finish_and_clear();
    let options = loaded.map_err(|_| widget.status().to_string())?;
    for option in options {
        println!("{:<24} {}", option.value, option.label);
    }
    Ok(())
}

async fn run_users(backend: &HttpBackend, text: &str) -> Result<(), String> {
    let query = text.trim();
    let people = backend
        .search_people(query)
        .await
        .map_err(|e| format!("people search failed: {e}"))?;
    for name in client::filter_usernames(people, query) {
        println!("{name}");
    }
    Ok(())
}

fn print_suggestions(suggestions: &[String]) {
    if suggestions.is_empty() {
        println!("{}", "(no suggestions)".dimmed());
        return;
    }
    for (idx, name) in suggestions.iter().enumerate() {
        println!("  #{idx} {name}");
    }
}

/// Each stdin line is the new content of the username field; `#N` picks
/// suggestion N.
async fn run_suggest(widget: &mut ReportWidget<HttpBackend>) -> Result<(), String> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = line.map_err(|e| format!("failed to read stdin: {e}"))?;
                let Some(line) = line else { break };
                if let Some(index) = line.trim().strip_prefix('#').and_then(|n| n.parse::<usize>().ok()) {
                    match widget.select_suggestion(index) {
                        Some(name) => format_kv_line("Selected", &name),
                        None => warn!(index, "no such suggestion"),
                    }
                    continue;
                }
                widget.type_username(&line);
                if line.trim().is_empty() {
                    print_suggestions(&[]);
                }
            }
            _ = widget.settle_suggestions(), if widget.suggestions_pending() => {
                print_suggestions(&widget.suggestions());
            }
        }
    }
    if widget.suggestions_pending() {
        widget.settle_suggestions().await;
        print_suggestions(&widget.suggestions());
    }
    format_kv_line("Username", &widget.filters.username);
    Ok(())
}

fn resolve_output_format(args: &ReportArgs, configured: Option<OutputFormat>) -> OutputFormat {
    args.format
        .as_deref()
        .and_then(OutputFormat::parse)
        .or_else(|| args.output.as_deref().and_then(output::infer_format_from_path))
        .or(configured)
        .unwrap_or(OutputFormat::Text)
}

async fn run_report(
    widget: &mut ReportWidget<HttpBackend>,
    args: &ReportArgs,
    configured_format: Option<OutputFormat>,
) -> Result<(), String> {
    if let Department::Site(site) = widget.filters.department.clone() {
        if widget.load_departments().await.is_ok()
            && !widget.departments().iter().any(|o| o.value == site)
        {
            warn!(%site, "site is not in the department list");
        }
    }

    format_kv_line("Filters", &summarize_filters(&widget.filters));
    let pb = spinner("Loading...");
    let submitted = widget.submit().await;
    pb.finish_and_clear();
    if submitted.is_err() {
        return Err(widget.status().to_string());
    }
    eprintln!("{}", widget.status());

    for raw in args.sort.iter() {
        if let Some(column) = Column::parse(raw) {
            let state = widget.sort_by(column);
            debug!(column = column.key(), direction = ?state.direction, "sorted");
        }
    }

    let format = resolve_output_format(args, configured_format);
    let table = widget.table();
    if format != OutputFormat::Text && widget.export_records().is_none() {
        warn!("no rows to export");
        eprintln!("{}", crate::table::EMPTY_PLACEHOLDER);
    } else {
        let rendered = output::render(format, table.records(), table.sort_state(), table.summary());
        write_output(args.output.as_deref(), &rendered).await?;
    }

    if let Some(row) = args.copy_row {
        let mut clipboard = Osc52Clipboard::new(std::io::stdout());
        match widget.activate_row(row, &mut clipboard) {
            Some(node_ref) => format_kv_line("Copied", &node_ref),
            None => format_kv_line("Copied", &format!("row {row} has no node reference")),
        }
    }
    Ok(())
}

async fn run_download(
    widget: &mut ReportWidget<HttpBackend>,
    args: &DownloadArgs,
) -> Result<(), String> {
    if widget.filters.username.is_empty() {
        if let Some(form_path) = args.form.as_deref() {
            let raw = tokio::fs::read_to_string(config::expand_tilde(form_path))
                .await
                .map_err(|e| format!("failed to read form capture: {e}"))?;
            let fields: Vec<HostField> = serde_json::from_str(&raw)
                .map_err(|e| format!("failed to parse form capture: {e}"))?;
            if let Some(found) = export::locate_username(&fields) {
                debug!(selector = %found.selector, value = %found.value, "username lookup");
                widget.filters.username = found.value;
            }
        }
    }

    let url = widget.download_url().map_err(|e| e.to_string())?;
    if args.print_url {
        println!("{url}");
        return Ok(());
    }
    let path: PathBuf = match args.output.as_deref() {
        Some(p) => config::expand_tilde(p),
        None => return Err("--output is required unless --print-url is set".to_string()),
    };
    format_kv_line("Download", url.as_str());
    let pb = spinner("Downloading...");
    let saved = widget.download(&path).await;
    pb.finish_and_clear();
    let bytes = saved.map_err(|e| format!("{}: {e}", widget.status()))?;
    format_kv_line("Saved", &format!("{} ({bytes} bytes)", path.display()));
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }

    let backend = Arc::new(HttpBackend::new(&run.client).map_err(|e| e.to_string())?);
    debug!(base = backend.endpoints().base(), origin = backend.endpoints().origin(), "endpoints");

    let filters = match &run.command {
        Command::Report(r) => build_filters(&r.filters)?,
        Command::Download(d) => build_filters(&d.filters)?,
        _ => FilterState::default(),
    };
    let mut widget = ReportWidget::new(
        Arc::clone(&backend),
        WidgetOptions {
            filters,
            debounce: run.debounce,
        },
    );

    match &run.command {
        Command::Sites => run_sites(&mut widget).await,
        Command::Users { text } => run_users(&backend, text).await,
        Command::Suggest { .. } => run_suggest(&mut widget).await,
        Command::Report(args) => run_report(&mut widget, args, run.output_format).await,
        Command::Download(args) => run_download(&mut widget, args).await,
    }
}

fn load_run_config(args: CliArgs) -> Result<RunConfig, String> {
    let cfg = match args.config.as_deref() {
        Some(path) => config::load_config(&config::expand_tilde(path), false)?,
        None => match config::default_config_path() {
            Some(path) => {
                if let Err(e) = config::ensure_default_config_file(&path) {
                    warn!(error = %e, "could not create default config");
                }
                config::load_config(&path, true)?
            }
            None => ConfigFile::default(),
        },
    };
    build_run_config(args, cfg)
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                let _ = e.print();
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);
    let run = load_run_config(args)?;
    debug!(verbose = run.verbose, "configuration loaded");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))
}
