//! Vouch Node
//!
//! Command line front end for trusted introductions. It keeps
//! introductions in a local database and reads contacts' identity keys
//! from a JSON contacts file that stands in for the host's directory.

mod contacts;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use vouch_core::{
    Contact, FingerprintCheck, FingerprintParty, IdentityKey, IdentityRecord, InMemoryDirectory,
    IntroductionId, IntroductionService, OutboundContact, ReceiveOutcome, SafetyNumber, ServiceId,
    TrustConfig, TrustConfigBuilder, VerifiedStatus,
};
use vouch_store::IntroductionBackup;

use crate::contacts::ContactsFile;

/// Vouch Node
///
/// Receive, verify and decide on introductions of contacts' identity keys.
#[derive(Parser, Debug)]
#[command(name = "vouch-node")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to data directory
    #[arg(short, long, env = "VOUCH_DATA_DIR", default_value = "vouch-data")]
    data_dir: PathBuf,

    /// Contacts file holding the local account and known contacts
    #[arg(short, long, env = "VOUCH_CONTACTS", default_value = "contacts.json")]
    contacts: PathBuf,

    /// Service configuration file (JSON)
    #[arg(long, env = "VOUCH_CONFIG")]
    config: Option<PathBuf>,

    /// Maximum concurrent mutations
    #[arg(long, env = "VOUCH_MAX_CONCURRENT_TASKS")]
    max_concurrent_tasks: Option<usize>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "VOUCH_LOG_LEVEL", default_value = "warn")]
    log_level: String,

    /// Log format (plain, json)
    #[arg(long, env = "VOUCH_LOG_FORMAT", default_value = "plain")]
    log_format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the safety number between two parties.
    ///
    /// Parties given as phone numbers (leading '+') use version 1
    /// identifiers, service ids use version 2.
    Fingerprint {
        /// Local party's phone number or service id
        local: String,
        /// Local party's identity key (base64)
        local_key: String,
        /// Remote party's phone number or service id
        remote: String,
        /// Remote party's identity key (base64)
        remote_key: String,
        /// Print the scannable form as well
        #[arg(long)]
        qr: bool,
    },

    /// Decode a message body without storing it ('-' reads stdin).
    Inspect {
        /// File holding the message body
        body: PathBuf,
    },

    /// Store the introductions in a received message ('-' reads stdin).
    Receive {
        /// Sender of the message
        #[arg(long)]
        from: ServiceId,
        /// Receive time in milliseconds since the epoch (default: now)
        #[arg(long)]
        timestamp: Option<i64>,
        /// File holding the message body
        body: PathBuf,
    },

    /// List every stored introduction.
    List,

    /// Accept an introduction.
    Accept {
        /// Introduction id
        id: IntroductionId,
    },

    /// Reject an introduction.
    Reject {
        /// Introduction id
        id: IntroductionId,
    },

    /// Forget who sent an introduction. Irreversible.
    Forget {
        /// Introduction id
        id: IntroductionId,
    },

    /// Delete an introduction.
    Delete {
        /// Introduction id
        id: IntroductionId,
    },

    /// Compare an introduction's predicted safety number with ours.
    Verify {
        /// Introduction id
        id: IntroductionId,
    },

    /// Turn every introduction of a contact stale after a key change.
    Stale {
        /// The introducee
        service_id: ServiceId,
    },

    /// Record a contact's identity key and turn conflicting introductions
    /// stale.
    Resolve {
        /// The contact
        service_id: ServiceId,
        /// The contact's identity key (base64)
        identity_key: IdentityKey,
        /// Name for a contact not yet in the contacts file
        #[arg(long)]
        name: Option<String>,
    },

    /// Write an introduction message for a recipient to stdout.
    Introduce {
        /// Who receives the introduction
        #[arg(long)]
        to: ServiceId,
        /// Contacts to introduce
        #[arg(required = true)]
        contacts: Vec<ServiceId>,
    },

    /// Export every introduction as a JSON backup.
    Export {
        /// Output file
        file: PathBuf,
    },

    /// Import a JSON backup.
    Import {
        /// Backup file
        file: PathBuf,
    },
}

fn setup_logging(log_level: &str, log_format: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("sled=warn".parse()?);

    match log_format.to_lowercase().as_str() {
        "json" => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .json()
                .flatten_event(true)
                .with_current_span(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
        _ => {
            let subscriber = fmt::Subscriber::builder()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)
                .context("Failed to set subscriber")?;
        }
    }

    Ok(())
}

/// Build service configuration from the config file and CLI arguments
fn build_config(args: &Args) -> Result<TrustConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let json = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => TrustConfigBuilder::new().build(),
    };

    config.storage.data_dir = args.data_dir.clone();
    config.storage.in_memory = false;
    if let Some(max) = args.max_concurrent_tasks {
        config.workers.max_concurrent_tasks = max;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// Read a message body from a file, or stdin for '-'.
fn read_body(path: &Path) -> Result<String> {
    if path.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin()
            .read_to_string(&mut body)
            .context("Failed to read stdin")?;
        return Ok(body);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn parse_party(identifier: &str, key: &str) -> Result<FingerprintParty> {
    let key = IdentityKey::from_base64(key)
        .with_context(|| format!("Invalid identity key '{}'", key))?;
    if identifier.starts_with('+') {
        return Ok(FingerprintParty::phone_number(identifier, key));
    }
    let id = ServiceId::parse(identifier)
        .with_context(|| format!("Invalid service id '{}'", identifier))?;
    Ok(FingerprintParty::service(id, key))
}

fn print_fingerprint(
    local: &str,
    local_key: &str,
    remote: &str,
    remote_key: &str,
    qr: bool,
) -> Result<()> {
    let local = parse_party(local, local_key)?;
    let remote = parse_party(remote, remote_key)?;
    let number = SafetyNumber::compute(&local, &remote)?;

    println!("{}", number);
    if qr {
        println!("{}", number.to_qr_string());
    }
    Ok(())
}

fn print_inspect(path: &Path) -> Result<()> {
    let body = read_body(path)?;
    match vouch_protocol::message::decode(&body)? {
        Some(payloads) => println!("{}", serde_json::to_string_pretty(&payloads)?),
        None => println!("not an introduction"),
    }
    Ok(())
}

/// Open the service over the contacts file's directory.
fn open_service(
    args: &Args,
    contacts: &ContactsFile,
) -> Result<(IntroductionService, Arc<InMemoryDirectory>)> {
    let config = build_config(args)?;
    if !config.storage.data_dir.exists() {
        std::fs::create_dir_all(&config.storage.data_dir)
            .context("Failed to create data directory")?;
        info!(path = %config.storage.data_dir.display(), "Created data directory");
    }

    let directory = Arc::new(contacts.directory());
    let service = IntroductionService::open(config, directory.clone(), contacts.local)
        .context("Failed to open introduction service")?;
    Ok((service, directory))
}

async fn run(args: &Args) -> Result<()> {
    match &args.command {
        Command::Fingerprint {
            local,
            local_key,
            remote,
            remote_key,
            qr,
        } => return print_fingerprint(local, local_key, remote, remote_key, *qr),
        Command::Inspect { body } => return print_inspect(body),
        _ => {}
    }

    let mut contacts = ContactsFile::load(&args.contacts)?;
    let (service, directory) = open_service(args, &contacts)?;

    let outcome = execute(&args.command, &service, &directory).await;
    finish(outcome, &service, &directory, &mut contacts, &args.contacts).await
}

/// Run one command against an open service.
async fn execute(
    command: &Command,
    service: &IntroductionService,
    directory: &InMemoryDirectory,
) -> Result<()> {
    match command {
        Command::Fingerprint { .. } | Command::Inspect { .. } => {}

        Command::Receive {
            from,
            timestamp,
            body,
        } => {
            let body = read_body(body)?;
            let received_at = timestamp.unwrap_or_else(|| Utc::now().timestamp_millis());
            match service.receive_message(*from, &body, received_at).await? {
                ReceiveOutcome::NotIntroduction => println!("not an introduction"),
                ReceiveOutcome::Dropped => bail!("malformed introduction message dropped"),
                ReceiveOutcome::Stored(outcomes) => {
                    for outcome in outcomes {
                        let verb = if outcome.is_inserted() { "stored" } else { "refreshed" };
                        println!("{} {}", verb, outcome.id());
                    }
                }
            }
        }

        Command::List => {
            for row in service.all_displayable() {
                let row = row?;
                println!(
                    "{:>5}  {}  {:<20}  {:<24}  {}  from {}",
                    row.id.get(),
                    row.formatted_date(),
                    row.state.as_str(),
                    row.introducee_name,
                    row.introducee_service_id,
                    row.introducer
                );
            }
        }

        Command::Accept { id } => {
            let row = service.accept(*id).await?;
            println!("{} {}", row.id, row.state);
        }

        Command::Reject { id } => {
            let row = service.reject(*id).await?;
            println!("{} {}", row.id, row.state);
        }

        Command::Forget { id } => {
            let row = service.forget_introducer(*id).await?;
            println!("{} introducer {}", row.id, row.introducer);
        }

        Command::Delete { id } => {
            if !service.delete(*id).await? {
                bail!("no introduction {}", id);
            }
            println!("deleted {}", id);
        }

        Command::Verify { id } => match service.verify_introduction(*id).await? {
            FingerprintCheck::Match => println!("match"),
            FingerprintCheck::Mismatch {
                predicted,
                computed,
            } => {
                println!("MISMATCH");
                println!("predicted {}", predicted);
                println!("computed  {}", vouch_protocol::message::group_digits(&computed));
            }
            FingerprintCheck::IntroduceeUnknown => println!("introducee unknown"),
        },

        Command::Stale { service_id } => {
            let staled = service.turn_stale(*service_id).await?;
            println!("{} introductions turned stale", staled.len());
        }

        Command::Resolve {
            service_id,
            identity_key,
            name,
        } => {
            let existing = directory.contact(service_id).await;
            let name = name
                .clone()
                .or_else(|| existing.as_ref().map(|c| c.name.clone()))
                .unwrap_or_else(|| service_id.to_string());
            let status = match &existing {
                Some(c) if c.record.identity_key == *identity_key => c.record.verified_status,
                _ => VerifiedStatus::Default,
            };
            directory
                .insert(Contact {
                    name,
                    number: existing.as_ref().and_then(|c| c.number.clone()),
                    record: IdentityRecord {
                        service_id: *service_id,
                        identity_key: *identity_key,
                        verified_status: status,
                        first_use: existing.is_none(),
                        timestamp: Utc::now().timestamp_millis(),
                        nonblocking_approval: false,
                    },
                })
                .await;

            let staled = service.handle_dangling(*service_id, *identity_key).await?;
            println!("{} introductions turned stale", staled.len());
        }

        Command::Introduce { to, contacts: ids } => {
            let mut targets = Vec::with_capacity(ids.len());
            for id in ids {
                let contact = directory
                    .contact(id)
                    .await
                    .with_context(|| format!("{} is not in the contacts file", id))?;
                targets.push(OutboundContact {
                    service_id: *id,
                    name: contact.name,
                    number: contact.number,
                });
            }
            let outbound = service.prepare_introduction(*to, &targets).await?;
            print!("{}", outbound.encode()?);
        }

        Command::Export { file } => {
            let backup = service.export()?;
            std::fs::write(file, backup.to_json()?)
                .with_context(|| format!("Failed to write {}", file.display()))?;
            println!("exported {} introductions", backup.introductions.len());
        }

        Command::Import { file } => {
            let json = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let backup = IntroductionBackup::from_json(&json)?;
            let summary = service.import(backup).await?;
            println!(
                "imported {} introductions, refreshed {}, unchanged {}",
                summary.inserted, summary.refreshed, summary.unchanged
            );
        }
    }
    Ok(())
}

/// Flush the store and write the directory back to the contacts file,
/// whether or not the command succeeded. A command error wins over a
/// persistence error.
async fn finish(
    outcome: Result<()>,
    service: &IntroductionService,
    directory: &InMemoryDirectory,
    contacts: &mut ContactsFile,
    path: &Path,
) -> Result<()> {
    let flushed = service.flush().context("Failed to flush introduction store");
    contacts.sync_from(directory).await;
    let persisted = flushed.and(contacts.save(path));

    match (outcome, persisted) {
        (Err(e), Err(persist_error)) => {
            error!(error = %persist_error, "Failed to persist state after failed command");
            Err(e)
        }
        (outcome, persisted) => outcome.and(persisted),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    setup_logging(&args.log_level, &args.log_format)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        data_dir = %args.data_dir.display(),
        contacts = %args.contacts.display(),
        "Starting vouch node"
    );

    run(&args).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "vouch-node",
            "--data-dir",
            "/tmp/vouch",
            "accept",
            "7",
        ])
        .unwrap();

        assert_eq!(args.data_dir, PathBuf::from("/tmp/vouch"));
        assert!(matches!(args.command, Command::Accept { id } if id.get() == 7));
    }

    #[test]
    fn test_args_reject_zero_id() {
        assert!(Args::try_parse_from(["vouch-node", "accept", "0"]).is_err());
    }

    #[test]
    fn test_parse_party_versions() {
        let key = "BQABAgMEBQYHCAkKCwwNDg8QERITFBUWFxgZGhscHR4f";

        let phone = parse_party("+14152222222", key).unwrap();
        assert_eq!(phone.identifier.version(), 1);

        let service = parse_party("9d0652a3-dcc3-4d11-975f-74d61598733f", key).unwrap();
        assert_eq!(service.identifier.version(), 2);

        assert!(parse_party("nobody", key).is_err());
        assert!(parse_party("+14152222222", "AAAA").is_err());
    }

    #[tokio::test]
    async fn test_failed_command_still_saves_contacts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contacts.json");
        let mut contacts = ContactsFile {
            local: vouch_core::LocalIdentity {
                service_id: ServiceId::random_aci(),
                identity_key: IdentityKey::from_public_bytes([1; 32]),
            },
            contacts: Vec::new(),
        };
        contacts.save(&path).unwrap();

        let data_dir = dir.path().join("db");
        let args = Args::try_parse_from([
            "vouch-node",
            "--data-dir",
            data_dir.to_str().unwrap(),
            "--contacts",
            path.to_str().unwrap(),
            "accept",
            "99",
        ])
        .unwrap();
        let (service, directory) = open_service(&args, &contacts).unwrap();

        // A contact learned before the command fails.
        let bob = ServiceId::random_aci();
        directory
            .insert(Contact {
                name: "Bob".into(),
                number: None,
                record: IdentityRecord {
                    service_id: bob,
                    identity_key: IdentityKey::from_public_bytes([2; 32]),
                    verified_status: VerifiedStatus::Default,
                    first_use: true,
                    timestamp: 0,
                    nonblocking_approval: false,
                },
            })
            .await;

        let outcome = execute(&args.command, &service, &directory).await;
        assert!(outcome.is_err());
        let result = finish(outcome, &service, &directory, &mut contacts, &args.contacts).await;
        assert!(result.is_err());

        let saved = ContactsFile::load(&path).unwrap();
        assert_eq!(saved.contacts.len(), 1);
        assert_eq!(saved.contacts[0].record.service_id, bob);
    }

    #[test]
    fn test_build_config_overrides() {
        let args = Args::try_parse_from([
            "vouch-node",
            "--data-dir",
            "/tmp/vouch",
            "--max-concurrent-tasks",
            "2",
            "list",
        ])
        .unwrap();

        let config = build_config(&args).unwrap();
        assert_eq!(config.storage.data_dir, PathBuf::from("/tmp/vouch"));
        assert_eq!(config.workers.max_concurrent_tasks, 2);
    }
}
