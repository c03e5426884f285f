use anyhow::Result;
#[cfg(feature = "connections")]
use clap::{ArgGroup, Args, CommandFactory};
use clap::{Parser, Subcommand};
#[cfg(feature = "connections")]
use std::io::Write;
use std::path::PathBuf;
#[cfg(any(feature = "connections", feature = "feed"))]
use tracing::info;

mod config;
mod logging;
mod output;

#[cfg(any(feature = "connections", feature = "feed"))]
use netkit_core::table::Style;
#[cfg(any(feature = "connections", feature = "feed"))]
use output::Sink;
use output::OutputFormat;

#[cfg(feature = "feed")]
const DEFAULT_FEED_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Parser)]
#[command(name = "netkit", version, about = "Host connection listing and release feed digest")]
struct Cli {
    /// Optional config file (YAML). If omitted, loads ./netkit.yaml if present.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Debug logging on stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true, default_value_t = false)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "connections")]
#[derive(Debug, Args)]
#[command(group(ArgGroup::new("mode").args(["all", "local", "incoming", "outgoing"])))]
struct ConnectionsArgs {
    /// Display all connections
    #[arg(short, long)]
    all: bool,
    /// Display connections where either endpoint is a local interface address
    #[arg(short, long)]
    local: bool,
    /// Display connections whose destination is a local interface address
    #[arg(short, long)]
    incoming: bool,
    /// Display connections whose source is not a local interface address
    #[arg(short, long)]
    outgoing: bool,
    /// Only keep connections whose source or destination IP equals this exactly
    #[arg(long)]
    ip: Option<String>,
    /// Reverse-resolve destination addresses (one blocking lookup per connection)
    #[arg(long, visible_alias = "ns")]
    nslookup: bool,
    /// Output format: text, json, or jsonl
    #[arg(long, value_enum)]
    format: Option<OutputFormat>,
    /// Output file (overwrites)
    #[arg(long, value_name = "FILE")]
    out: Option<PathBuf>,
    /// Write CSV to --out instead of text/json
    #[arg(long, default_value_t = false, requires = "out")]
    csv: bool,
}

#[cfg(feature = "connections")]
impl ConnectionsArgs {
    fn mode(&self) -> Option<connections::Mode> {
        use connections::Mode;
        match (self.all, self.local, self.incoming, self.outgoing) {
            (true, ..) => Some(Mode::All),
            (_, true, ..) => Some(Mode::Local),
            (_, _, true, _) => Some(Mode::Incoming),
            (.., true) => Some(Mode::Outgoing),
            _ => None,
        }
    }

    fn query(&self, cfg: Option<&config::ConnectionsConfig>) -> connections::ConnectionQuery {
        let cfg_nslookup = cfg.and_then(|c| c.nslookup).unwrap_or(false);
        connections::ConnectionQuery {
            mode: self.mode(),
            ip: self.ip.clone(),
            nslookup: self.nslookup || cfg_nslookup,
        }
    }
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print version information
    Version,
    /// List active inet connections with owning process and user
    #[cfg(feature = "connections")]
    Connections(ConnectionsArgs),
    /// Fetch a release feed and tabulate entries that mention known products
    #[cfg(feature = "feed")]
    Feed {
        /// Feed URL (feed://, http:// or https://)
        #[arg(long)]
        url: Option<String>,
        /// Request timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Output format: text, json, or jsonl
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Output file (overwrites)
        #[arg(long, value_name = "FILE")]
        out: Option<PathBuf>,
        /// Write CSV to --out instead of text/json
        #[arg(long, default_value_t = false, requires = "out")]
        csv: bool,
    },
}

#[cfg(feature = "connections")]
fn connections_help() -> String {
    let mut cmd = Cli::command();
    cmd.find_subcommand_mut("connections")
        .map(|sub| sub.render_help().to_string())
        .unwrap_or_default()
}

/// Run `query` against a probe built by `make_probe`. Without a mode the
/// subcommand usage goes to `help`, no probe is built and `None` is returned.
#[cfg(feature = "connections")]
fn list_connections<P, F, W>(
    query: &connections::ConnectionQuery,
    make_probe: F,
    help: &mut W,
) -> Result<Option<Vec<connections::ConnectionRecord>>>
where
    P: connections::HostProbe,
    F: FnOnce() -> P,
    W: Write,
{
    use connections::ClassifyError;
    let result = match query.mode {
        None => Err(ClassifyError::InvalidMode),
        Some(_) => query.run(&make_probe()),
    };
    match result {
        Ok(records) => Ok(Some(records)),
        Err(ClassifyError::InvalidMode) => {
            write!(help, "{}", connections_help())?;
            Ok(None)
        }
        Err(ClassifyError::Probe(e)) => Err(e),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose)?;
    let loaded_cfg = config::load_config(cli.config.as_deref())?;
    match cli.command {
        Commands::Version => {
            println!("netkit {} (core {})", env!("CARGO_PKG_VERSION"), netkit_core::version());
        }
        #[cfg(feature = "connections")]
        Commands::Connections(args) => {
            use connections::{SystemProbe, HEADERS};
            let cfg = loaded_cfg.as_ref().and_then(|c| c.connections.as_ref());
            let query = args.query(cfg);
            let Some(records) = list_connections(&query, SystemProbe::new, &mut std::io::stdout())? else {
                return Ok(());
            };
            info!(mode = ?query.mode, ip = ?query.ip, shown = records.len(), "connections listed");
            let sink = Sink {
                format: OutputFormat::resolve(args.format, cfg.and_then(|c| c.format.as_deref()))?,
                out: args.out.as_deref(),
                csv: args.csv,
                style: Style::Fancy,
            };
            sink.emit(&HEADERS, &records, |r| r.cells())?;
        }
        #[cfg(feature = "feed")]
        Commands::Feed { url, timeout_ms, format, out, csv } => {
            let cfg = loaded_cfg.as_ref().and_then(|c| c.feed.as_ref());
            let url = url
                .or_else(|| cfg.and_then(|c| c.url.clone()))
                .unwrap_or_else(|| feeds::DEFAULT_FEED_URL.to_string());
            let timeout_ms = timeout_ms
                .or_else(|| cfg.and_then(|c| c.timeout_ms))
                .unwrap_or(DEFAULT_FEED_TIMEOUT_MS);
            let matcher = match cfg.and_then(|c| c.patterns.as_ref()) {
                Some(p) => {
                    let pairs: Vec<(&str, &str)> = p.iter().map(|p| (p.product.as_str(), p.pattern.as_str())).collect();
                    feeds::ProductMatcher::new(&pairs)?
                }
                None => feeds::ProductMatcher::with_defaults()?,
            };
            let user_agent = format!("netkit/{}", env!("CARGO_PKG_VERSION"));
            let xml = feeds::fetch_feed(&url, std::time::Duration::from_millis(timeout_ms), &user_agent)?;
            let rows = feeds::digest(&xml, &matcher)?;
            info!(%url, rows = rows.len(), "feed tabulated");
            let sink = Sink {
                format: OutputFormat::resolve(format, cfg.and_then(|c| c.format.as_deref()))?,
                out: out.as_deref(),
                csv,
                style: Style::Grid,
            };
            sink.emit(&feeds::HEADERS, &rows, |r| r.cells())?;
        }
    }
    Ok(())
}
