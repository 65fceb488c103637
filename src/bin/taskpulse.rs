use clap::{Args, Parser, Subcommand};

use taskpulse::Scope;

#[derive(Parser)]
#[command(name = "taskpulse", about = "Role-scoped task analytics CLI")]
struct Cli {
    /// Database path (default: ~/.taskpulse/taskpulse.db)
    #[arg(long)]
    db: Option<String>,

    /// Increase logging verbosity
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a JSON snapshot into the local store
    Import {
        /// Snapshot file path
        file: String,
    },
    /// Headline task stats for a scope
    Stats {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Priority distribution for a scope
    Priority {
        #[command(flatten)]
        scope: ScopeArgs,
        #[arg(long)]
        json: bool,
    },
    /// Completed-task trend over a trailing window
    Trend {
        #[command(flatten)]
        scope: ScopeArgs,
        /// Window size in days
        #[arg(long, default_value = "7")]
        days: u32,
        #[arg(long)]
        json: bool,
    },
    /// Per-client task distribution within an organization
    Clients {
        /// Organization id
        #[arg(long)]
        org: i64,
        #[arg(long)]
        json: bool,
    },
    /// Performance summary for a user
    Performance {
        /// Username
        username: String,
        #[arg(long)]
        json: bool,
    },
    /// Personal metrics for a user
    Personal {
        /// Username
        username: String,
        #[arg(long)]
        json: bool,
    },
    /// Show store status
    Status,
}

/// Scope selection: no flags means global, `--org` narrows to one
/// organization, `--user` to one user's assigned tasks.
#[derive(Args)]
struct ScopeArgs {
    /// Restrict to one organization
    #[arg(long, conflicts_with = "user")]
    org: Option<i64>,

    /// Restrict to one user (username)
    #[arg(long)]
    user: Option<String>,
}

async fn resolve_scope(db: &taskpulse::Database, args: &ScopeArgs) -> anyhow::Result<Scope> {
    if let Some(org_id) = args.org {
        Ok(taskpulse::scope::resolve_organization(db, org_id).await?)
    } else if let Some(ref username) = args.user {
        Ok(taskpulse::scope::resolve_user(db, username).await?)
    } else {
        Ok(Scope::Global)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let db = match &cli.db {
        Some(path) => taskpulse::Database::open_at(path).await?,
        None => taskpulse::Database::open().await?,
    };

    match cli.command {
        Commands::Import { file } => {
            let snapshot = taskpulse::read_snapshot(&file)?;
            let report = taskpulse::import_snapshot(&db, snapshot).await?;
            println!("Imported from {file}:");
            println!("  Organizations: {}", report.organizations);
            println!("  Users:         {}", report.users);
            println!("  Clients:       {}", report.clients);
            println!("  Tasks:         {}", report.tasks);
        }
        Commands::Stats { scope, json } => {
            let scope = resolve_scope(&db, &scope).await?;
            let stats = taskpulse::task_stats(&db, scope).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("Task Stats ({scope})");
                println!("  Total:       {}", stats.total);
                println!("  Open:        {}", stats.pending_or_in_progress);
                println!("  Completed:   {}", stats.completed);
                println!("  Cancelled:   {}", stats.cancelled);
                println!("  On hold:     {}", stats.on_hold);
                println!("  Overdue:     {}", stats.overdue_count);
                println!("  Completion:  {:.1}%", stats.completion_rate);
            }
        }
        Commands::Priority { scope, json } => {
            let scope = resolve_scope(&db, &scope).await?;
            let dist = taskpulse::priority_distribution(&db, scope).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dist)?);
            } else if dist.is_empty() {
                println!("No tasks in {scope}.");
            } else {
                println!("Priority Distribution ({scope})");
                for bucket in &dist {
                    println!(
                        "  {:<16} {:>5}  ({:.1}%)",
                        bucket.label, bucket.count, bucket.percentage
                    );
                }
            }
        }
        Commands::Trend { scope, days, json } => {
            let scope = resolve_scope(&db, &scope).await?;
            let trend = taskpulse::completion_trend(&db, scope, days).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&trend)?);
            } else if trend.is_empty() {
                println!("No completions in the last {days} days ({scope}).");
            } else {
                println!("Completions, last {days} days ({scope})");
                for point in &trend {
                    println!("  {}  {}", point.date, point.count);
                }
            }
        }
        Commands::Clients { org, json } => {
            let scope = taskpulse::scope::resolve_organization(&db, org).await?;
            let dist = taskpulse::client_distribution(&db, scope).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&dist)?);
            } else if dist.is_empty() {
                println!("No clients with tasks in organization {org}.");
            } else {
                println!("Client Distribution (organization {org})");
                for c in &dist {
                    println!(
                        "  {} {} ({}): {} tasks, {} completed ({:.1}%)",
                        c.first_name,
                        c.last_name,
                        c.client_id,
                        c.task_count,
                        c.completed_count,
                        c.completion_rate
                    );
                }
            }
        }
        Commands::Performance { username, json } => {
            let user_id = taskpulse::scope::lookup_user_id(&db, &username).await?;
            let perf = taskpulse::user_performance(&db, user_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&perf)?);
            } else {
                println!(
                    "Performance: {} {} ({})",
                    perf.first_name, perf.last_name, perf.username
                );
                println!("  Assigned:    {}", perf.total_assigned);
                println!("  Completed:   {}", perf.total_completed);
                println!("  Completion:  {:.1}%", perf.completion_rate);
                println!("  Avg time:    {:.1}h", perf.avg_completion_time_hours);
            }
        }
        Commands::Personal { username, json } => {
            let user_id = taskpulse::scope::lookup_user_id(&db, &username).await?;
            let metrics = taskpulse::personal_metrics(&db, user_id).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&metrics)?);
            } else {
                println!("Personal Metrics ({username})");
                println!("  Completed:   {}", metrics.completed_count);
                println!("  On time:     {:.1}%", metrics.on_time_rate);
                println!("  Avg time:    {:.1}h", metrics.avg_completion_time_hours);
            }
        }
        Commands::Status => {
            print_status(&db).await?;
        }
    }

    Ok(())
}

async fn print_status(db: &taskpulse::Database) -> anyhow::Result<()> {
    let (orgs, users, clients, tasks) = db
        .reader()
        .call(|conn| {
            let orgs: i64 =
                conn.query_row("SELECT COUNT(*) FROM organizations", [], |row| row.get(0))?;
            let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
            let clients: i64 =
                conn.query_row("SELECT COUNT(*) FROM clients", [], |row| row.get(0))?;
            let tasks: i64 = conn.query_row("SELECT COUNT(*) FROM tasks", [], |row| row.get(0))?;
            Ok::<_, rusqlite::Error>((orgs, users, clients, tasks))
        })
        .await
        .map_err(taskpulse::Error::from)?;

    println!("Store Status");
    println!("  Organizations: {orgs}");
    println!("  Users:         {users}");
    println!("  Clients:       {clients}");
    println!("  Tasks:         {tasks}");
    Ok(())
}
