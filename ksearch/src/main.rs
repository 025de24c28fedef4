//! ksearch: query a Chef-style search index from the command line.

use clap::{ArgAction, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use render::OutputFormat;

/// Environment variable holding a tracing filter directive.
const LOG_VAR: &str = "KSEARCH_LOG";

#[derive(Parser)]
#[command(name = "ksearch")]
#[command(about = "Search indexed nodes, roles, environments, clients and data bags")]
#[command(version, disable_version_flag = true)]
struct Cli {
    /// [TYPE] QUERY; TYPE defaults to node
    args: Vec<String>,

    /// Sort results by this attribute
    #[arg(short = 'o', long = "sort")]
    sort: Option<String>,

    /// Row to start returning results from
    #[arg(short = 'b', long = "start", default_value = "0")]
    start: usize,

    /// Number of rows to return
    #[arg(short = 'R', long = "rows")]
    rows: Option<usize>,

    /// Show only the run list
    #[arg(short = 'r', long = "run-list")]
    run_list: bool,

    /// Show only the ID of matching objects
    #[arg(short = 'i', long = "id-only")]
    id_only: bool,

    /// The search query; useful to protect queries starting with -
    #[arg(short = 'q', long = "query", allow_hyphen_values = true)]
    query: Option<String>,

    /// Only return specific attributes: "name1=path.to.a, name2=path.b"
    #[arg(short = 'f', long = "filter-result")]
    filter_result: Option<String>,

    /// Show one or more attributes (repeatable)
    #[arg(short = 'a', long = "attribute")]
    attributes: Vec<String>,

    /// Output format (defaults to the configured format)
    #[arg(short = 'F', long = "format", value_enum)]
    format: Option<OutputFormat>,

    /// Search server URL (overrides config)
    #[arg(short = 's', long = "server-url")]
    server_url: Option<String>,

    /// Replay a recorded search response instead of contacting a server
    #[arg(long = "from-file", value_name = "PATH")]
    from_file: Option<String>,

    /// More log output (-V info, -VV debug)
    #[arg(short = 'V', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Print version
    #[allow(dead_code)]
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env(LOG_VAR).unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let opts = commands::SearchCommand {
        args: cli.args,
        query: cli.query,
        sort: cli.sort,
        start: cli.start,
        rows: cli.rows,
        run_list: cli.run_list,
        id_only: cli.id_only,
        filter_result: cli.filter_result,
        attributes: cli.attributes,
        format: cli.format,
        server_url: cli.server_url,
        from_file: cli.from_file,
    };

    if let Err(e) = commands::search(opts) {
        match e {
            sift::Error::Usage(message) => {
                eprintln!("{}", message);
                eprintln!("{}", Cli::command().render_usage());
            }
            sift::Error::Transport { message, .. } => eprintln!("ksearch: search failed: {}", message),
            other => eprintln!("Error: {}", other),
        }
        std::process::exit(1);
    }
}
