use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use trenova::api::accounting::{AccountingControl, DivisionCode, InvoiceControl};
use trenova::api::admin::{AuditLog, EmailProfile, User};
use trenova::api::commodity::{Commodity, HazardousMaterial};
use trenova::api::dispatch::{ConsolidationGroup, DistanceOverride, Rate};
use trenova::api::equipment::{EquipmentType, FleetCode, Trailer};
use trenova::api::reports::{DEFAULT_MAX_POLLS, ReportError, ReportFormat};
use trenova::api::{ListParams, Resource};
use trenova::http::HttpError;
use trenova::http::config::DEFAULT_API_URL;
use trenova::notifications::DEFAULT_WS_URL;
use trenova::session::SessionError;
use trenova::table::TableState;
use trenova::{ErrorCode, Session, SessionConfig};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("missing token; pass --token or set TRENOVA_TOKEN")]
    MissingToken,
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Http(#[from] HttpError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

impl CliError {
    fn code(&self) -> &'static str {
        match self {
            Self::MissingToken => "E_MISSING_TOKEN",
            Self::Session(e) => e.error_code(),
            Self::Http(e) => e.error_code(),
            Self::Report(e) => e.error_code(),
            Self::Io(_) => "E_IO",
            Self::InvalidJson(_) => "E_JSON",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "trenova-cli", about = "Trenova back-office API CLI")]
struct Cli {
    #[arg(long, env = "TRENOVA_API_URL", default_value = DEFAULT_API_URL)]
    base_url: String,

    #[arg(long, env = "TRENOVA_WS_URL", default_value = DEFAULT_WS_URL)]
    ws_url: String,

    #[arg(long, env = "TRENOVA_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the current user may perform an action.
    Can { resource: String, action: String },
    /// Show how a field renders for the current user.
    Field { resource: String, field: String },
    /// Print the permission manifest.
    Manifest,
    List(ListArgs),
    Get { entity: Entity, id: String },
    /// Generate a report, wait for it and save the file.
    Report(ReportArgs),
    /// Stream live notifications as JSON lines.
    Notifications {
        #[arg(long, help = "Exit after this many notifications")]
        count: Option<usize>,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    entity: Entity,
    #[arg(long, default_value_t = 10)]
    limit: u32,
    #[arg(long, default_value_t = 0)]
    offset: u32,
    #[arg(long)]
    query: Option<String>,
}

#[derive(Args, Debug)]
struct ReportArgs {
    entity: Entity,
    #[arg(long, default_value = "csv")]
    format: ReportFormat,
    #[arg(long, value_delimiter = ',', required = true)]
    columns: Vec<String>,
    #[arg(long)]
    query: Option<String>,
    #[arg(long, help = "Output path; defaults to the server's file name")]
    output: Option<PathBuf>,
    #[arg(long, default_value_t = 2)]
    poll_secs: u64,
    #[arg(long, default_value_t = DEFAULT_MAX_POLLS)]
    max_polls: u32,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Entity {
    Commodity,
    HazardousMaterial,
    Trailer,
    EquipmentType,
    FleetCode,
    DivisionCode,
    EmailProfile,
    DistanceOverride,
    ConsolidationGroup,
    Rate,
    AccountingControl,
    InvoiceControl,
    User,
    AuditLog,
}

/// Run `$body` with `$T` bound to the record type of `$entity`.
macro_rules! with_entity {
    ($entity:expr, $T:ident => $body:expr) => {
        match $entity {
            Entity::Commodity => {
                type $T = Commodity;
                $body
            }
            Entity::HazardousMaterial => {
                type $T = HazardousMaterial;
                $body
            }
            Entity::Trailer => {
                type $T = Trailer;
                $body
            }
            Entity::EquipmentType => {
                type $T = EquipmentType;
                $body
            }
            Entity::FleetCode => {
                type $T = FleetCode;
                $body
            }
            Entity::DivisionCode => {
                type $T = DivisionCode;
                $body
            }
            Entity::EmailProfile => {
                type $T = EmailProfile;
                $body
            }
            Entity::DistanceOverride => {
                type $T = DistanceOverride;
                $body
            }
            Entity::ConsolidationGroup => {
                type $T = ConsolidationGroup;
                $body
            }
            Entity::Rate => {
                type $T = Rate;
                $body
            }
            Entity::AccountingControl => {
                type $T = AccountingControl;
                $body
            }
            Entity::InvoiceControl => {
                type $T = InvoiceControl;
                $body
            }
            Entity::User => {
                type $T = User;
                $body
            }
            Entity::AuditLog => {
                type $T = AuditLog;
                $body
            }
        }
    };
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error [{}]: {e}", e.code());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = SessionConfig::from_env();
    config.http.base_url = cli.base_url.trim_end_matches('/').to_owned();
    config.notifications.url = cli.ws_url;

    let session = Session::bootstrap(config)?;
    let token = cli.token.ok_or(CliError::MissingToken)?;
    session.resume(&token);

    match cli.command {
        Command::Can { resource, action } => {
            let perms = session.ensure_permissions().await?;
            let allowed = perms.can(&resource, &action);
            print_json(&json!({ "resource": resource, "action": action, "allowed": allowed }))
        }
        Command::Field { resource, field } => {
            let perms = session.ensure_permissions().await?;
            let access = format!("{:?}", perms.field_access(&resource, &field));
            print_json(&json!({ "resource": resource, "field": field, "access": access }))
        }
        Command::Manifest => {
            let perms = session.ensure_permissions().await?;
            print_json(&serde_json::to_value(perms.manifest())?)
        }
        Command::List(args) => {
            let params = ListParams {
                limit: args.limit,
                offset: args.offset,
                query: args.query,
                ..ListParams::default()
            };
            let page = with_entity!(args.entity, T => list::<T>(&session, &params).await?);
            print_json(&page)
        }
        Command::Get { entity, id } => {
            let record = with_entity!(entity, T => get::<T>(&session, &id).await?);
            print_json(&record)
        }
        Command::Report(args) => {
            let resource = with_entity!(args.entity, T => T::NAME);
            run_report(&session, resource, args).await
        }
        Command::Notifications { count } => run_notifications(&session, count).await,
    }
}

async fn list<T: Resource>(session: &Session, params: &ListParams) -> Result<Value, CliError> {
    let page = session.resource::<T>().list(params).await?;
    Ok(serde_json::to_value(page)?)
}

async fn get<T: Resource>(session: &Session, id: &str) -> Result<Value, CliError> {
    let record = session.resource::<T>().get(id).await?;
    Ok(serde_json::to_value(record)?)
}

async fn run_report(session: &Session, resource: &str, args: ReportArgs) -> Result<(), CliError> {
    let mut table = TableState::new(resource);
    if let Some(query) = &args.query {
        table.set_global_filter(query);
    }
    let columns: Vec<&str> = args.columns.iter().map(String::as_str).collect();
    let request = table.export_request(args.format, &columns);

    let reports = session.reports();
    let job = reports.generate(&request).await?;
    eprintln!("report {} queued", job.id);

    let ready = reports
        .wait_until_ready(&job.id, Duration::from_secs(args.poll_secs), args.max_polls)
        .await?;
    let bytes = reports.download(&ready).await?;

    let path = args.output.unwrap_or_else(|| PathBuf::from(ready.file_name()));
    tokio::fs::write(&path, &bytes).await?;
    eprintln!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

async fn run_notifications(session: &Session, count: Option<usize>) -> Result<(), CliError> {
    let mut rx = session.start_notifications().await?;
    let mut received = 0_usize;

    loop {
        let next = tokio::select! {
            n = rx.recv() => n,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(notification) = next else {
            break;
        };
        println!("{}", serde_json::to_string(&notification)?);
        received = received.saturating_add(1);
        if count.is_some_and(|limit| received >= limit) {
            break;
        }
    }

    session.stop_notifications().await;
    eprintln!("received {received} notifications");
    Ok(())
}

fn print_json(value: &Value) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
