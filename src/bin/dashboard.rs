//! Terminal client for the OregonSMB dashboard.

use anyhow::Result;
use clap::{Parser, Subcommand};
use oregon_smb_api::config::{Config, DataSource};
use oregon_smb_api::dashboard::DashboardSession;
use oregon_smb_api::models::{LeadStatus, Plan};
use oregon_smb_api::plan_store::{FilePlanStorage, PlanStore};
use oregon_smb_api::shell::{Page, PageShell};
use oregon_smb_api::sources::{self, DatasetSource};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dashboard")]
#[command(about = "OregonSMB Growth Suite dashboard in your terminal")]
#[command(version)]
struct Cli {
    /// Use the built-in sample data instead of the API
    #[arg(long = "static", global = true)]
    use_static: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render the dashboard for the saved plan
    Show {
        /// Preview another plan without saving it
        #[arg(long)]
        plan: Option<Plan>,
    },

    /// Print the saved plan
    Plan,

    /// Choose a plan and open its dashboard
    SetPlan { plan: Plan },

    /// Move a lead to another pipeline status (Growth and Scale)
    SetStatus {
        lead_id: u32,
        /// new, contacted, quote-sent, won or lost
        status: LeadStatus,
    },

    /// Show the pricing table
    Pricing,

    /// Show the upgrade prompt and pricing
    Upgrade,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("oregon_smb_api=warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if cli.use_static {
        config.data_source = DataSource::Static;
    }

    let store = Arc::new(PlanStore::new(
        FilePlanStorage::new(&config.plan_storage_path),
        config.default_plan,
    ));
    let mut shell = PageShell::new(Arc::clone(&store));

    match cli.command {
        Command::Show { plan } => {
            shell.navigate(Page::Dashboard);
            let source = sources::from_config(&config)?;
            show_dashboard(plan.unwrap_or_else(|| shell.plan()), source).await;
        }
        Command::Plan => {
            println!("{}", shell.plan());
            if !store.is_persistent() {
                eprintln!("(plan storage unavailable, using in-memory value)");
            }
        }
        Command::SetPlan { plan } => {
            let notice = shell.select_plan(plan);
            println!("{}\n", notice);
            let source = sources::from_config(&config)?;
            show_dashboard(shell.plan(), source).await;
        }
        Command::SetStatus { lead_id, status } => {
            shell.navigate(Page::Dashboard);
            let source = sources::from_config(&config)?;
            let mut session = DashboardSession::new(source);
            session.mount(shell.plan());
            session.settle().await;

            let lead = session.set_lead_status(lead_id, status).await?;
            println!("Lead {} ({}) is now {}\n", lead.id, lead.name, lead.status.label());
            session.settle().await;
            print_views(&session);
        }
        Command::Pricing => {
            shell.navigate("pricing".parse()?);
            print_pricing(&shell);
        }
        Command::Upgrade => {
            let notice = shell.upgrade();
            println!("{}\n", notice);
            print_pricing(&shell);
        }
    }

    Ok(())
}

async fn show_dashboard(plan: Plan, source: Arc<dyn DatasetSource>) {
    let mut session = DashboardSession::new(source);
    session.mount(plan);
    session.settle().await;

    // One more pass for widgets that failed after exhausting their own retries.
    if session.retry_failed() > 0 {
        session.settle().await;
    }

    println!("Your {} Dashboard", plan.display_name());
    println!("Welcome back! Here's what's happening with your business.\n");
    print_views(&session);
}

fn print_views(session: &DashboardSession) {
    for view in session.views() {
        println!("{}", view);
    }
}

fn print_pricing(shell: &PageShell) {
    for tier in shell.pricing() {
        println!("{}\n", tier);
    }
}
