use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand};
use serde::Serialize;
use shared_types::{
    parse_api_date, CreateLeadRequest, DateRange, Lead, LeadRoute, ListQuery, StatusSelection,
    TabLabel, TabPath,
};
use std::path::PathBuf;
use std::sync::Arc;

use crm_client::config::{get_session_path, ClientConfig};
use crm_client::{ApiClient, ApiOutcome, ClientError, FileSessionStore, LeadBoard};

const DEFAULT_RANGE_DAYS: u32 = 30;

#[derive(Parser, Debug)]
#[command(author, version, about = "Command line client for the CRM API", long_about = None)]
struct Cli {
    /// Path to client.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Overrides `base_url` from the config file
    #[arg(long, global = true)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args, Debug, Clone)]
struct BoardArgs {
    /// leads, leads-admin, branch-leads or sales-manager-leads
    #[arg(long, default_value = "leads")]
    route: LeadRoute,

    /// Tab path, e.g. "Contacted > Interested > Hot Lead"
    #[arg(long, default_value = "")]
    tab: String,

    #[arg(long, default_value = "")]
    search: String,

    /// Inclusive start date (YYYY-MM-DD), defaults to 30 days before --to
    #[arg(long)]
    from: Option<String>,

    /// Inclusive end date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    to: Option<String>,

    /// Page of the filtered list, 20 leads per page
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long)]
    branch: Option<i64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },
    Logout,
    Whoami,
    /// Lists leads of one route, filtered by tab path and search text
    Leads(BoardArgs),
    /// Tab badge counts one level below --tab
    Counts(BoardArgs),
    /// Files a lead under a contact outcome, e.g. --path "Contacted > Interested > Warm Lead"
    UpdateStatus {
        lead_id: i64,
        #[arg(long)]
        path: String,
        #[arg(long, default_value = "")]
        remarks: String,
    },
    Assign {
        lead_id: i64,
        agent_id: i64,
    },
    CreateLead {
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        nationality: Option<String>,
        #[arg(long)]
        source: Option<String>,
        #[arg(long)]
        branch: Option<i64>,
        #[arg(long)]
        agent: Option<i64>,
    },
    DeleteLead {
        id: i64,
    },
    History {
        lead_id: i64,
    },
    Branches {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Users {
        #[arg(long)]
        role: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    Tasks {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LeadListing<'a> {
    route: &'static str,
    tab: String,
    total: u64,
    matched: usize,
    page: u32,
    leads: Vec<&'a Lead>,
}

#[derive(Serialize)]
struct TabCount {
    label: TabLabel,
    count: usize,
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn date_range(from: Option<&str>, to: Option<&str>) -> anyhow::Result<DateRange> {
    let end = match to {
        Some(raw) => parse_api_date(raw)?,
        None => Utc::now().date_naive(),
    };
    match from {
        Some(raw) => Ok(DateRange::new(parse_api_date(raw)?, end)?),
        None => Ok(DateRange::ending_on(end, DEFAULT_RANGE_DAYS)),
    }
}

fn build_board(args: &BoardArgs) -> anyhow::Result<LeadBoard> {
    let mut board = LeadBoard::new(
        args.route,
        date_range(args.from.as_deref(), args.to.as_deref())?,
    );
    board.set_path(TabPath::parse(args.route, &args.tab)?)?;
    board.set_search(args.search.as_str());
    board.set_page(args.page);
    board.set_branch(args.branch);
    Ok(board)
}

fn page_query(page: u32) -> ListQuery {
    ListQuery {
        param_page: Some(page),
        ..Default::default()
    }
}

/// Prints the outcome as JSON and reports whether it succeeded.
fn print<T: Serialize>(outcome: ApiOutcome<T>) -> anyhow::Result<bool> {
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.success)
}

fn respond<T: Serialize>(result: Result<T, ClientError>, message: &str) -> anyhow::Result<bool> {
    print(ApiOutcome::from_result(result, message))
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    let mut config = ClientConfig::load(cli.config.as_deref()).context("Failed to load config")?;
    if let Some(base_url) = cli.base_url {
        config.base_url = base_url;
    }

    let session = Arc::new(FileSessionStore::new(get_session_path()));
    let client = ApiClient::new(&config, session)?;
    tracing::debug!("Using API at {}", config.base_url);

    match cli.command {
        Command::Login { email, password } => {
            respond(client.login(&email, &password).await.map(|l| l.user), "Logged in")
        }
        Command::Logout => respond(client.logout().await, "Logged out"),
        Command::Whoami => respond(client.me().await, "Current user"),
        Command::Leads(args) => {
            let mut board = build_board(&args)?;
            let outcome = board.refresh(&client).await;
            if !outcome.success {
                return print(outcome);
            }

            let listing = LeadListing {
                route: board.route().as_str(),
                tab: board.path().to_string(),
                total: board.total(),
                matched: board.visible().len(),
                page: board.page(),
                leads: board.visible_page(),
            };
            print(ApiOutcome::from_result(Ok(listing), "Leads fetched"))
        }
        Command::Counts(args) => {
            let mut board = build_board(&args)?;
            let outcome = board.refresh(&client).await;
            if !outcome.success {
                return print(outcome);
            }

            let counts: Vec<TabCount> = board
                .counts()
                .into_iter()
                .map(|(label, count)| TabCount { label, count })
                .collect();
            respond(Ok(counts), "Tab counts")
        }
        Command::UpdateStatus {
            lead_id,
            path,
            remarks,
        } => {
            let selection = StatusSelection::from_tab_path(&TabPath::parse(LeadRoute::Leads, &path)?)?;
            let update = match selection.encode(&remarks) {
                Ok(update) => update,
                Err(e) => return respond::<Lead>(Err(ClientError::Validation(e.to_string())), ""),
            };

            // The server checks visibility and keeps the assignee; the agent
            // field is informational.
            let request = update.into_request(lead_id, None, Utc::now().timestamp());
            respond(client.update_status(&request).await, "Status updated")
        }
        Command::Assign { lead_id, agent_id } => {
            respond(client.assign_to_agent(lead_id, agent_id).await, "Lead assigned")
        }
        Command::CreateLead {
            name,
            phone,
            email,
            nationality,
            source,
            branch,
            agent,
        } => {
            let request = CreateLeadRequest {
                name,
                phone,
                email,
                nationality,
                language: None,
                source,
                branch_id: branch,
                lead_agent_id: agent,
            };
            respond(client.create_lead(&request).await, "Lead created")
        }
        Command::DeleteLead { id } => respond(client.delete_lead(id).await, "Lead deleted"),
        Command::History { lead_id } => {
            respond(client.lead_history(lead_id).await, "History fetched")
        }
        Command::Branches { page } => {
            respond(client.branches(&page_query(page)).await, "Branches fetched")
        }
        Command::Users { role, page } => {
            let query = ListQuery {
                role,
                ..page_query(page)
            };
            respond(client.users(&query).await, "Users fetched")
        }
        Command::Tasks { page } => respond(client.tasks(&page_query(page)).await, "Tasks fetched"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    if !run(cli).await? {
        std::process::exit(1);
    }
    Ok(())
}
