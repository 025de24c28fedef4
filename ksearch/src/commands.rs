//! CLI command implementations.

use std::io;

use sift::{
    resolve_query_args, run_search, Config, Error, FileTransport, HttpTransport, SearchOptions,
    SearchResults, SearchTransport,
};
use tracing::debug;

use crate::render::{self, OutputFormat};

/// Parsed options for one search invocation.
pub struct SearchCommand {
    pub args: Vec<String>,
    pub query: Option<String>,
    pub sort: Option<String>,
    pub start: usize,
    pub rows: Option<usize>,
    pub run_list: bool,
    pub id_only: bool,
    pub filter_result: Option<String>,
    pub attributes: Vec<String>,
    pub format: Option<OutputFormat>,
    pub server_url: Option<String>,
    pub from_file: Option<String>,
}

/// Run a search and print the results.
pub fn search(cmd: SearchCommand) -> sift::Result<()> {
    let query = resolve_query_args(&cmd.args, cmd.query.as_deref())?;

    let mut config = Config::load()?;
    if let Some(url) = cmd.server_url {
        config.server_url = url;
    }
    let format = match cmd.format {
        Some(format) => format,
        None => OutputFormat::parse(&config.format).map_err(Error::Config)?,
    };

    let options = SearchOptions {
        sort: cmd.sort,
        start: cmd.start,
        rows: cmd.rows,
        filter_result: cmd.filter_result,
        attributes: cmd.attributes,
        run_list: cmd.run_list,
        id_only: cmd.id_only,
    };

    let transport: Box<dyn SearchTransport> = match cmd.from_file {
        Some(path) => {
            debug!(%path, "replaying recorded response");
            Box::new(FileTransport::open(path)?)
        }
        None => {
            debug!(server_url = %config.server_url, "searching server");
            Box::new(HttpTransport::from_config(&config))
        }
    };

    let results = run_search(transport.as_ref(), &query, &options, config.page_size)?;
    print_results(&results, format, options.id_only)
}

fn print_results(results: &SearchResults, format: OutputFormat, id_only: bool) -> sift::Result<()> {
    let stdout = io::stdout();
    let stderr = io::stderr();
    render::write_results(&mut stdout.lock(), &mut stderr.lock(), results, format, id_only)?;
    Ok(())
}
