mod config;
mod error;
mod paths;
mod view;

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::{LevelFilter, error, info};
use serde_json::Value;
use simplelog::{ColorChoice, CombinedLogger, Config, SharedLogger, TermLogger, TerminalMode, WriteLogger};
use tabula_lib::http::HttpFetcher;
use tabula_lib::prelude::*;

use crate::error::CliError;

/// Render paginated tables from JSON files or HTTP endpoints.
#[derive(Debug, Parser)]
#[command(name = "tabula", version)]
struct Args {
    /// JSON file holding an array of records
    #[arg(long, conflicts_with = "url", required_unless_present = "url")]
    file: Option<PathBuf>,

    /// Endpoint returning pages of records
    #[arg(long)]
    url: Option<String>,

    /// Page to show (1-indexed)
    #[arg(long, default_value_t = 1)]
    page: u32,

    /// Rows per page
    #[arg(long)]
    page_size: Option<u32>,

    /// Columns as `key` or `key:Header`, comma separated. Defaults to the
    /// fields of the first record.
    #[arg(long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Field holding the row identity
    #[arg(long, default_value = "id")]
    id_field: String,

    /// Row IDs to mark as selected, comma separated
    #[arg(long, value_delimiter = ',')]
    select: Vec<String>,

    /// Extra request parameter as `key=value` (repeatable)
    #[arg(long = "param")]
    params: Vec<String>,

    /// Show every row without a footer
    #[arg(long)]
    no_pagination: bool,

    /// Request timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Settings file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the render model as JSON
    #[arg(long)]
    json: bool,

    /// Also log to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn setup_logging(verbose: bool) {
    paths::rotate_logs();

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if let Some(path) = paths::log_file()
        && let Ok(file) = File::create(&path)
    {
        loggers.push(WriteLogger::new(LevelFilter::Debug, Config::default(), file));
    }
    if verbose {
        loggers.push(TermLogger::new(
            LevelFilter::Debug,
            Config::default(),
            TerminalMode::Stderr,
            ColorChoice::Auto,
        ));
    }
    let _ = CombinedLogger::init(loggers);
}

/// Numeric strings become integer IDs so `--select 3` matches `"id": 3`.
fn row_id(text: String) -> RowId {
    text.parse::<i64>()
        .map(RowId::from)
        .unwrap_or_else(|_| RowId::from(text))
}

fn columns_for(wanted: &[String], sample: Option<&Value>) -> Vec<Column<Value>> {
    let wanted: Vec<(String, String)> = if wanted.is_empty() {
        match sample {
            Some(Value::Object(map)) => map.keys().map(|k| (k.clone(), k.clone())).collect(),
            _ => Vec::new(),
        }
    } else {
        wanted
            .iter()
            .map(|entry| match entry.split_once(':') {
                Some((key, header)) => (key.to_string(), header.to_string()),
                None => (entry.clone(), entry.clone()),
            })
            .collect()
    };

    wanted
        .into_iter()
        .map(|(key, header)| {
            let numeric = sample
                .and_then(|row| row.pointer(&format!("/{}", key.replace('.', "/"))))
                .is_some_and(Value::is_number);
            let column = Column::key(key, header);
            if numeric {
                column.align(Alignment::Right)
            } else {
                column
            }
        })
        .collect()
}

fn load_rows(path: &Path) -> Result<Vec<Value>, CliError> {
    let text = fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_json::from_str(&text).map_err(|source| CliError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Array(rows) => Ok(rows),
        _ => Err(CliError::NotAnArray(path.to_path_buf())),
    }
}

fn fetch_config(args: &Args, url: &str) -> Result<FetchConfig<Value>, CliError> {
    let mut builder = HttpFetcher::<Value>::builder(url);
    if let Some(secs) = args.timeout {
        builder = builder.timeout(Duration::from_secs(secs));
    }
    let mut config = FetchConfig::new(builder.build()?);
    for param in &args.params {
        let (key, value) = param
            .split_once('=')
            .ok_or_else(|| CliError::InvalidParam(param.clone()))?;
        config = config.extra_param(key, value);
    }
    Ok(config)
}

async fn run(args: Args) -> Result<ExitCode, CliError> {
    let settings = config::load_settings(args.config.as_deref())?;

    let mut pagination = if args.no_pagination {
        PaginationConfig::disabled()
    } else {
        PaginationConfig::new()
    };
    if let Some(size) = args.page_size {
        pagination = pagination.page_size(size);
    }

    let id_field = args.id_field.clone();
    let mut builder = DataTable::builder()
        .row_key(move |row: &Value, index| match row.field(&id_field) {
            Some(id) => row_id(id),
            None => RowId::from(index as i64),
        })
        .pagination(pagination)
        .settings(settings)
        .on_data_change(|rows: &[Value], total| info!("Fetched {} of {} rows", rows.len(), total));

    if !args.select.is_empty() {
        builder = builder.selection(
            SelectionConfig::new(|| info!("Select all requested"), |id| info!("Toggle requested for {}", id))
                .selected_ids(args.select.iter().cloned().map(row_id)),
        );
    }

    let table = match (&args.file, &args.url) {
        (Some(path), _) => {
            let rows = load_rows(path)?;
            info!("Loaded {} rows from {}", rows.len(), path.display());
            builder
                .columns(columns_for(&args.columns, rows.first()))
                .rows(rows)
                .build()?
        }
        (None, Some(url)) => builder.fetch(fetch_config(&args, url)?).build()?,
        (None, None) => return Err(CliError::NoSource),
    };

    table.change_page(args.page);
    if table.is_managed() {
        table.mount().await;
        let data = table.data();
        table.set_columns(columns_for(&args.columns, data.first()));
    }

    let rendered = table.render();
    if args.json {
        println!("{}", serde_json::to_string_pretty(&rendered)?);
    } else {
        print!("{}", view::render_text(&rendered));
    }

    if let Some(err) = table.error() {
        error!("{}", err);
        return Ok(ExitCode::from(2));
    }
    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    setup_logging(args.verbose);

    match run(args).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
