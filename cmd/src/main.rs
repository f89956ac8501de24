use anyhow::{bail, Context};
use authdns::dns::name::DomainName;
use authdns::server::{NameServer, Responder, ZoneStore};
use authdns::sign::keys::KeyPair;
use authdns::sign::DnssecConfig;
use authdns::zone::{masterfile, yaml};
use authdns::SignedZone;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Authoritative DNS server with DNSSEC online signing.
#[derive(Parser, Debug)]
#[command(name = "authdns", version)]
struct Args {
    /// bind address
    #[arg(long, default_value = "0.0.0.0")]
    bind: String,

    /// bind port
    #[arg(long, default_value_t = 53)]
    port: u16,

    /// UDP worker task count
    #[arg(long, default_value_t = 1)]
    thread: u16,

    /// zone file; .yaml/.yml selects the YAML form, anything else the
    /// one-record-per-line form
    #[arg(long)]
    file: PathBuf,

    /// zone apex
    #[arg(long)]
    zone: String,

    /// KSK key file (YAML, flags 257)
    #[arg(long)]
    ksk: Option<PathBuf>,

    /// ZSK key file (YAML, flags 256)
    #[arg(long)]
    zsk: Option<PathBuf>,

    /// enable NSEC denial of existence
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    nsec: bool,

    /// enable NSEC3 denial of existence (takes precedence over --nsec)
    #[arg(long, default_value_t = false, action = clap::ArgAction::Set)]
    nsec3: bool,

    /// NSEC3 salt, hex
    #[arg(long, default_value = "00")]
    salt: String,

    /// NSEC3 iteration count
    #[arg(long, default_value_t = 1)]
    iterate: u16,

    /// NSEC3 hash algorithm (1 = SHA-1)
    #[arg(long, default_value_t = 1)]
    hash: u8,

    /// NSEC3 opt-out: leave insecure delegations out of the chain
    #[arg(long)]
    opt_out: bool,

    /// debug logging
    #[arg(long)]
    debug: bool,
}

fn load_zone(apex: &DomainName, path: &Path) -> anyhow::Result<authdns::Zone> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read zone file {}", path.display()))?;
    let by_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"))
        .unwrap_or(false);
    let zone = if by_extension {
        yaml::load(apex, &text)?
    } else {
        masterfile::load(apex, &text)?
    };
    zone.validate()?;
    Ok(zone)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let filter = if args.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    let apex_text = if args.zone.ends_with('.') {
        args.zone.clone()
    } else {
        format!("{}.", args.zone)
    };
    let apex = DomainName::from_text(&apex_text, None)
        .with_context(|| format!("bad zone apex {:?}", args.zone))?;

    let zone = load_zone(&apex, &args.file)?;

    let store = match (&args.ksk, &args.zsk) {
        (Some(ksk_path), Some(zsk_path)) => {
            let ksk = KeyPair::load(ksk_path)?;
            let zsk = KeyPair::load(zsk_path)?;
            let config = DnssecConfig {
                enable_nsec: args.nsec,
                enable_nsec3: args.nsec3,
                salt: hex::decode(&args.salt)
                    .with_context(|| format!("bad --salt value {:?}", args.salt))?,
                iterations: args.iterate,
                hash_algorithm: args.hash,
                opt_out: args.opt_out,
                ..DnssecConfig::default()
            };
            let signed = SignedZone::new(zone, ksk, zsk, config)?;

            // DS records for the parent, one per line
            for line in signed.ds_records().to_zone() {
                println!("{}", line);
            }
            ZoneStore::Signed(signed)
        }
        (None, None) => ZoneStore::Plain(zone),
        _ => bail!("a signed zone needs both --ksk and --zsk"),
    };

    let server = NameServer::new(&args.bind, args.port, args.thread, Responder::new(store));
    server.serve().await?;
    Ok(())
}
