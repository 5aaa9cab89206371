use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{anyhow, bail, Result};
use clap::{ArgAction, Parser};
use log::LevelFilter;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use wol_send::config::{self, Config};
use wol_send::store::{self, LastUsed, LastUsedStore, YamlFileStore};
use wol_send::{iface, is_valid_mac, parse_port, Destination, MacAddress, MagicPacket};

/// Wake machines on the local network with Wake-on-LAN magic packets
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// MAC addresses (AA:BB:CC:DD:EE:FF or AA-BB-CC-DD-EE-FF) or configured host names
    #[arg(required_unless_present = "last")]
    targets: Vec<String>,

    /// Broadcast or unicast address to send to
    #[arg(short, long)]
    destination: Option<String>,

    /// UDP port (default 9)
    ///
    /// Anything that is not a number in 0-65535, including out of range
    /// values like 70000, falls back to 9.
    #[arg(short, long)]
    port: Option<String>,

    /// Send to the subnet broadcast address of this interface
    #[arg(short, long, conflicts_with = "destination")]
    interface: Option<String>,

    /// Configuration file
    #[arg(short, long, default_value = config::DEFAULT_CONFIG_PATH)]
    config: String,

    /// File remembering the last used values
    #[arg(long, default_value = store::DEFAULT_STATE_PATH)]
    state: String,

    /// Fill in anything not given on the command line from the last run
    #[arg(long, default_value_t = false)]
    last: bool,

    /// Do not remember the values of this run
    #[arg(long, default_value_t = false)]
    no_save: bool,

    /// Per target timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout: u64,

    /// More output, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

/// A single wake request after all sources have been merged.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Request {
    label: String,
    mac: String,
    destination: String,
    port: u16,
}

fn build_requests(
    opts: &Cli,
    cfg: &Config,
    last: Option<&LastUsed>,
    iface_broadcast: Option<String>,
) -> Result<Vec<Request>> {
    let targets: Vec<String> = if opts.targets.is_empty() {
        match last {
            Some(l) if !l.mac.is_empty() => vec![l.mac.clone()],
            _ => bail!("no target given and no previously used MAC address"),
        }
    } else {
        opts.targets.clone()
    };

    let defaults = cfg.defaults();
    let requests = targets
        .into_iter()
        .map(|target| {
            let host = if is_valid_mac(&target) { None } else { cfg.host(&target) };
            let mac = host.map(|h| h.mac.to_string()).unwrap_or_else(|| target.clone());

            let destination = iface_broadcast
                .clone()
                .or_else(|| opts.destination.clone())
                .or_else(|| host.and_then(|h| h.destination.clone()))
                .or_else(|| last.map(|l| l.destination.clone()))
                .unwrap_or_else(|| defaults.destination.clone());

            let port = match &opts.port {
                Some(p) => parse_port(Some(p)),
                None => host
                    .and_then(|h| h.port)
                    .or_else(|| last.map(|l| l.port))
                    .unwrap_or(defaults.port),
            };

            Request { label: target, mac, destination, port }
        })
        .collect();

    Ok(requests)
}

async fn wake(packet: MagicPacket, dest: Destination, timeout: Duration) -> Result<SocketAddr> {
    match tokio::time::timeout(timeout, wol_send::send_magic_packet_async(&packet, &dest)).await {
        Ok(res) => Ok(res?),
        Err(_) => Err(anyhow!("timed out after {:?}", timeout)),
    }
}

fn init_logging(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    simple_logger::SimpleLogger::new()
        .with_level(level)
        .env()
        .init()?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let opts = Cli::parse();
    init_logging(opts.verbose)?;

    let cancel_token: CancellationToken = CancellationToken::new();
    let sigint_token = cancel_token.clone();

    ctrlc::set_handler(move || {
        log::warn!("received SIGINT, abandoning outstanding requests");
        sigint_token.cancel();
    }).expect("Failed to install SIGINT handler");

    let cfg = Config::load(&config::expand_path(&opts.config))?;
    let state = YamlFileStore::new(config::expand_path(&opts.state));

    let last = if opts.last {
        match state.load() {
            Ok(values) => Some(values),
            Err(e) => {
                log::warn!("ignoring stored values: {:#}", anyhow::Error::from(e));
                None
            },
        }
    } else {
        None
    };

    let iface_broadcast = match &opts.interface {
        Some(name) => Some(iface::interface_broadcast(name)?.to_string()),
        None => None,
    };

    let requests = build_requests(&opts, &cfg, last.as_ref(), iface_broadcast)?;
    let timeout = Duration::from_millis(opts.timeout);

    let mut failed = 0usize;
    let mut to_save: Option<LastUsed> = None;
    let mut tasks: JoinSet<(String, Result<SocketAddr>)> = JoinSet::new();

    for req in requests {
        // validation errors never reach the network
        let prepared = req
            .mac
            .parse::<MacAddress>()
            .and_then(|mac| Ok((mac, Destination::new(req.destination.clone(), Some(req.port))?)));
        let (mac, dest) = match prepared {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{}: {}", req.label, e);
                failed += 1;
                continue;
            },
        };

        to_save = Some(LastUsed {
            mac: req.mac.clone(),
            destination: req.destination.clone(),
            port: req.port,
        });

        log::debug!("[{}] waking {} via {}", req.label, mac, dest);
        tasks.spawn(async move {
            let res = wake(MagicPacket::new(&mac), dest, timeout).await;
            (req.label, res)
        });
    }

    if let Some(values) = to_save.filter(|_| !opts.no_save) {
        if let Err(e) = state.save(&values) {
            log::warn!("could not remember values: {:#}", anyhow::Error::from(e));
        }
    }

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                failed += tasks.len();
                tasks.abort_all();
                break;
            }
            joined = tasks.join_next() => {
                let Some(joined) = joined else { break; };
                match joined {
                    Ok((label, Ok(addr))) => println!("{}: magic packet sent to {}", label, addr),
                    Ok((label, Err(e))) => {
                        eprintln!("{}: {:#}", label, e);
                        failed += 1;
                    },
                    Err(e) => {
                        log::error!("wake task failed: {}", e);
                        failed += 1;
                    },
                }
            }
        }
    }

    if failed > 0 {
        bail!("{} wake request(s) failed", failed);
    }
    Ok(())
}
