//! pgrest — PostgREST from the command line
//!
//! Compiles one request from flags, prints it, and sends it.
//!
//! # Usage
//!
//! ```bash
//! # Show the request without sending it
//! pgrest --schema public select users --columns id,name --limit 10 --dry-run
//!
//! # Send it
//! PGREST_URL=http://localhost:3000 pgrest select users --filter 'age=gt.21'
//!
//! # Call a procedure
//! pgrest rpc add_user --data '{"name":"Bob"}'
//! ```

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use pgrest::prelude::*;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Base URI used to render requests when none is configured.
const PLACEHOLDER_URL: &str = "http://localhost:3000";

#[derive(Parser)]
#[command(name = "pgrest")]
#[command(version)]
#[command(about = "Compile and send PostgREST requests", long_about = None)]
#[command(after_help = "EXAMPLES:
    pgrest select users --columns id,name --limit 10
    pgrest update todos --filter id=eq.4 --data '{\"done\":true}' --single
    pgrest upsert employees --data @rows.json --merge-duplicates
    pgrest rpc search --get --filter q=eq.rust")]
struct Cli {
    /// PostgREST base URL
    #[arg(long, env = "PGREST_URL", global = true)]
    url: Option<String>,

    /// Schema (profile) to target
    #[arg(long, env = "PGREST_SCHEMA", global = true)]
    schema: Option<String>,

    #[arg(long, env = "PGREST_USER", global = true)]
    user: Option<String>,

    #[arg(long, env = "PGREST_PASSWORD", global = true, hide_env_values = true)]
    password: Option<String>,

    /// Bearer token (JWT)
    #[arg(long, env = "PGREST_TOKEN", global = true, hide_env_values = true)]
    token: Option<String>,

    /// Config file (default: ./pgrest.toml, then the user config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Don't send, just show the compiled request
    #[arg(short, long, global = true)]
    dry_run: bool,

    /// Extra Prefer directives, merged into one header
    #[arg(long, global = true)]
    prefer: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Clone, ValueEnum)]
enum CountArg {
    Exact,
    Planned,
    Estimated,
}

impl From<CountArg> for CountPreference {
    fn from(arg: CountArg) -> Self {
        match arg {
            CountArg::Exact => CountPreference::Exact,
            CountArg::Planned => CountPreference::Planned,
            CountArg::Estimated => CountPreference::Estimated,
        }
    }
}

#[derive(Args)]
struct Shape {
    /// Raw filter expression, repeatable (e.g. age=gt.21)
    #[arg(long = "filter", short = 'w')]
    filters: Vec<String>,

    /// Columns to return
    #[arg(long)]
    columns: Option<String>,

    /// Unwrap a single row into an object
    #[arg(long)]
    single: bool,

    /// Count strategy
    #[arg(long, value_enum)]
    count: Option<CountArg>,
}

#[derive(Subcommand)]
enum Commands {
    /// Read rows
    Select {
        table: String,
        #[command(flatten)]
        shape: Shape,
        /// Sort column, suffix with .desc for descending
        #[arg(long)]
        order: Option<String>,
        #[arg(long)]
        limit: Option<u64>,
        #[arg(long)]
        offset: Option<u64>,
    },
    /// Insert rows
    Insert {
        table: String,
        /// JSON payload, or @path to read it from a file
        #[arg(long)]
        data: String,
        /// Only insert these payload keys
        #[arg(long = "only")]
        only: Option<String>,
        #[command(flatten)]
        shape: Shape,
    },
    /// Update rows matching the filters
    Update {
        table: String,
        #[arg(long)]
        data: String,
        #[command(flatten)]
        shape: Shape,
    },
    /// Insert or update rows
    Upsert {
        table: String,
        #[arg(long)]
        data: String,
        /// Conflict target (PUT upsert)
        #[arg(long, conflicts_with_all = ["merge_duplicates", "ignore_duplicates"])]
        on_conflict: Option<String>,
        #[arg(long, conflicts_with = "ignore_duplicates")]
        merge_duplicates: bool,
        #[arg(long)]
        ignore_duplicates: bool,
        #[command(flatten)]
        shape: Shape,
    },
    /// Delete rows matching the filters
    Delete {
        table: String,
        #[command(flatten)]
        shape: Shape,
    },
    /// Call a stored procedure
    Rpc {
        name: String,
        /// JSON arguments, or @path
        #[arg(long)]
        data: Option<String>,
        /// Read-only call (GET)
        #[arg(long, conflicts_with_all = ["csv", "single_object", "data"])]
        get: bool,
        /// Pass the payload as one object argument
        #[arg(long)]
        single_object: bool,
        /// CSV file, one call per row
        #[arg(long, conflicts_with = "data")]
        csv: Option<PathBuf>,
        #[command(flatten)]
        shape: Shape,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if let Err(e) = run(&cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "pgrest=debug" } else { "pgrest=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<()> {
    let (config, has_url) = resolve_config(cli)?;
    let client = PostgrestClient::from_config(&config)?;

    let request = compile(&client, &cli.command, &cli.prefer, config.count)?;

    if cli.dry_run || !has_url {
        println!("{}", "Compiled request:".green().bold());
        println!("{}", request.to_string().white());
        if !cli.dry_run {
            println!();
            println!(
                "{}",
                "⚠ No server URL. Use --url, set PGREST_URL or add base_url to pgrest.toml"
                    .yellow()
            );
        }
        return Ok(());
    }

    if cli.verbose {
        println!("{}", request.to_string().dimmed());
        println!();
    }

    let transport = match config.timeout() {
        Some(timeout) => HttpTransport::with_timeout(timeout)?,
        None => HttpTransport::new()?,
    };
    let response = transport.send(&request).await?;

    let status = response.status.to_string();
    if response.is_success() {
        println!("{} {}", "✓".green(), status.green());
    } else {
        println!("{} {}", "✗".red(), status.red());
    }
    if let Some(range) = response.header("Content-Range") {
        println!("{} {}", "Range:".dimmed(), range.cyan());
    }
    print_body(&response, &cli.format);

    if !response.is_success() {
        anyhow::bail!("server answered {}", response.status);
    }
    Ok(())
}

/// File config first, then flags and environment on top. The flag is false
/// when no server URL came from anywhere.
fn resolve_config(cli: &Cli) -> Result<(ClientConfig, bool)> {
    let discovered = ClientConfig::discover(cli.config.as_deref()).context("failed to load config")?;
    let has_url = discovered.is_some() || cli.url.is_some();
    let overrides = ConfigOverrides {
        base_url: cli.url.clone(),
        schema: cli.schema.clone(),
        user: cli.user.clone(),
        password: cli.password.clone(),
        token: cli.token.clone(),
    };
    let config = discovered
        .unwrap_or_else(|| ClientConfig::builder().base_url(PLACEHOLDER_URL).build())
        .overlay(&overrides);
    Ok((config, has_url))
}

fn compile(
    client: &PostgrestClient,
    command: &Commands,
    prefer: &[String],
    default_count: Option<CountPreference>,
) -> Result<PostgrestRequest> {
    let (qb, shape) = match command {
        Commands::Select {
            table,
            shape,
            order,
            limit,
            offset,
        } => {
            let mut qb = client.from(table).select();
            if let Some(order) = order {
                qb = match order.strip_suffix(".desc") {
                    Some(col) => qb.order(col, SortOrder::Desc),
                    None => qb.order(order.trim_end_matches(".asc"), SortOrder::Asc),
                };
            }
            if let Some(n) = limit {
                qb = qb.limit(*n);
            }
            if let Some(n) = offset {
                qb = qb.offset(*n);
            }
            (qb, shape)
        }
        Commands::Insert {
            table,
            data,
            only,
            shape,
        } => {
            let body = read_json(data)?;
            let qb = match only {
                Some(cols) => client.from(table).insert_columns(cols, body),
                None => client.from(table).insert(body),
            };
            (qb.json(), shape)
        }
        Commands::Update { table, data, shape } => {
            (client.from(table).update(read_json(data)?).json(), shape)
        }
        Commands::Upsert {
            table,
            data,
            on_conflict,
            merge_duplicates,
            ignore_duplicates,
            shape,
        } => {
            let body = read_json(data)?;
            let qb = client.from(table);
            let qb = if *merge_duplicates || *ignore_duplicates {
                qb.upsert_with(body, *merge_duplicates)
            } else {
                match on_conflict {
                    Some(cols) => qb.upsert_on_conflict(body, cols),
                    None => qb.upsert(body),
                }
            };
            (qb.json(), shape)
        }
        Commands::Delete { table, shape } => (client.from(table).delete(), shape),
        Commands::Rpc {
            name,
            data,
            get,
            single_object,
            csv,
            shape,
        } => {
            let qb = client.rpc(name);
            let qb = if *get {
                qb.read_only_rpc(name)
            } else if let Some(path) = csv {
                let rows = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                qb.bulk_rpc(name, rows)
            } else {
                let body = match data {
                    Some(d) => read_json(d)?,
                    None => serde_json::json!({}),
                };
                qb.rpc_single_object(name, body, *single_object)
            };
            (qb, shape)
        }
    };

    let qb = prefer.iter().fold(qb, |qb, token| qb.prefer(token));
    Ok(apply_shape(qb, shape, default_count).build()?)
}

fn apply_shape(
    mut qb: QueryBuilder,
    shape: &Shape,
    default_count: Option<CountPreference>,
) -> QueryBuilder {
    for filter in &shape.filters {
        qb = qb.raw_param(filter.as_str());
    }
    if let Some(cols) = &shape.columns {
        qb = qb.returned_columns(cols);
    }
    if shape.single {
        qb = qb.single_result();
    }
    let count = shape.count.clone().map(CountPreference::from).or(default_count);
    if let Some(count) = count {
        qb = qb.count(count);
    }
    qb
}

/// `@path` reads the JSON from a file.
fn read_json(arg: &str) -> Result<serde_json::Value> {
    let text = match arg.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path))?
        }
        None => arg.to_string(),
    };
    serde_json::from_str(&text).context("payload is not valid JSON")
}

fn print_body(response: &RawResponse, format: &OutputFormat) {
    if response.body.is_empty() {
        println!("{}", "(empty body)".dimmed());
        return;
    }

    let parsed: Option<serde_json::Value> = serde_json::from_slice(&response.body).ok();
    match (format, parsed) {
        (OutputFormat::Table, Some(serde_json::Value::Array(rows))) => print_table(&rows),
        (OutputFormat::Table, Some(serde_json::Value::Object(row))) => {
            print_table(&[serde_json::Value::Object(row)])
        }
        (_, Some(value)) => {
            println!("{}", serde_json::to_string_pretty(&value).unwrap_or_default());
        }
        (_, None) => println!("{}", response.text()),
    }
}

/// Widest a cell is drawn before it is cut with an ellipsis.
const MAX_CELL_WIDTH: usize = 40;

fn print_table(rows: &[serde_json::Value]) {
    let Some(table) = Table::from_rows(rows) else {
        println!("{}", "(no results)".dimmed());
        return;
    };

    let (header, rule, body) = table.render();
    println!("{}", header.white().bold());
    println!("{}", rule.dimmed());
    for line in body {
        println!("{}", line);
    }

    println!();
    println!("{} row(s) returned", table.cells.len().to_string().cyan());
}

/// Rows flattened to display strings, columns in the order the server sent
/// them. Keys that only show up in later rows are appended.
struct Table {
    columns: Vec<String>,
    cells: Vec<Vec<Cell>>,
}

struct Cell {
    text: String,
    numeric: bool,
}

impl Table {
    fn from_rows(rows: &[serde_json::Value]) -> Option<Self> {
        let rows: Vec<_> = rows.iter().filter_map(|r| r.as_object()).collect();
        if rows.is_empty() {
            return None;
        }

        let mut columns: Vec<String> = Vec::new();
        for row in &rows {
            for key in row.keys() {
                if !columns.contains(key) {
                    columns.push(key.clone());
                }
            }
        }

        let cells = rows
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .map(|col| match row.get(col) {
                        Some(val) => Cell::from_json(val),
                        None => Cell {
                            text: String::new(),
                            numeric: false,
                        },
                    })
                    .collect()
            })
            .collect();

        Some(Self { columns, cells })
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.cells
                    .iter()
                    .map(|row| row[i].text.chars().count())
                    .fold(col.chars().count(), usize::max)
            })
            .collect()
    }

    /// Header line, separator rule and one line per row, uncolored.
    fn render(&self) -> (String, String, Vec<String>) {
        let widths = self.widths();
        let header: Vec<String> = self
            .columns
            .iter()
            .zip(&widths)
            .map(|(col, w)| format!("{:<w$}", col, w = *w))
            .collect();
        let rule: Vec<String> = widths.iter().map(|w| "─".repeat(*w)).collect();
        let body = self
            .cells
            .iter()
            .map(|row| {
                row.iter()
                    .zip(&widths)
                    .map(|(cell, w)| {
                        if cell.numeric {
                            format!("{:>w$}", cell.text, w = *w)
                        } else {
                            format!("{:<w$}", cell.text, w = *w)
                        }
                    })
                    .collect::<Vec<_>>()
                    .join(" │ ")
            })
            .collect();
        (header.join(" │ "), rule.join("─┼─"), body)
    }
}

impl Cell {
    fn from_json(val: &serde_json::Value) -> Self {
        let text = match val {
            serde_json::Value::Null => "NULL".to_string(),
            serde_json::Value::String(s) => s.clone(),
            // Nested arrays and objects (embedded resources) stay compact JSON.
            other => other.to_string(),
        };
        Self {
            text: truncate(&text, MAX_CELL_WIDTH),
            numeric: val.is_number(),
        }
    }
}

fn truncate(text: &str, max: usize) -> String {
    let text = text.replace('\n', " ");
    if text.chars().count() <= max {
        return text;
    }
    let mut cut: String = text.chars().take(max - 1).collect();
    cut.push('…');
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_table_keeps_server_column_order() {
        let rows = [
            json!({"name": "Ann", "id": 1}),
            json!({"name": "Bob", "id": 22, "email": "b@x"}),
        ];
        let table = Table::from_rows(&rows).unwrap();
        assert_eq!(table.columns, vec!["name", "id", "email"]);

        let (header, rule, body) = table.render();
        assert_eq!(header, "name │ id │ email");
        assert_eq!(rule, "─────┼────┼──────");
        assert_eq!(body, vec!["Ann  │  1 │      ", "Bob  │ 22 │ b@x  "]);
    }

    #[test]
    fn test_long_cells_are_cut() {
        let long = "x".repeat(100);
        let cell = Cell::from_json(&json!(long));
        assert_eq!(cell.text.chars().count(), MAX_CELL_WIDTH);
        assert!(cell.text.ends_with('…'));

        let nested = Cell::from_json(&json!({"tags": ["a", "b"]}));
        assert_eq!(nested.text, r#"{"tags":["a","b"]}"#);
        assert_eq!(Cell::from_json(&json!(null)).text, "NULL");
    }

    #[test]
    fn test_no_object_rows() {
        assert!(Table::from_rows(&[json!(1), json!("a")]).is_none());
    }

    #[test]
    fn test_rpc_get_rejects_data() {
        let parsed = Cli::try_parse_from(["pgrest", "rpc", "f", "--get", "--data", "{}"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_config_count_is_default_only() {
        let client = PostgrestClient::new(PLACEHOLDER_URL).unwrap().schema("public");
        let cli = Cli::try_parse_from(["pgrest", "select", "t"]).unwrap();
        let req = compile(&client, &cli.command, &[], Some(CountPreference::Planned)).unwrap();
        assert_eq!(req.header("Prefer"), Some("count=planned"));

        let cli = Cli::try_parse_from(["pgrest", "select", "t", "--count", "exact"]).unwrap();
        let req = compile(&client, &cli.command, &[], Some(CountPreference::Planned)).unwrap();
        assert_eq!(req.header("Prefer"), Some("count=exact"));
    }
}
