use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use storage::{NewCollectionPoint, Storage, UserKind};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "coleta-tools", about = "Database setup for the scheduling server")]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/lixo_eletronico.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the schema and load the demo users, companies and appointments.
    Setup,
    CreateUser {
        name: String,
        email: String,
        /// `cidadao` or `empresa`.
        #[arg(long, default_value = "cidadao")]
        kind: String,
    },
    CreatePoint {
        name: String,
        address: String,
        #[arg(long, allow_hyphen_values = true)]
        latitude: f64,
        #[arg(long, allow_hyphen_values = true)]
        longitude: f64,
        #[arg(long)]
        hours: Option<String>,
    },
}

fn parse_kind(raw: &str) -> Result<UserKind> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "cidadao" | "citizen" => Ok(UserKind::Citizen),
        "empresa" | "company" => Ok(UserKind::Company),
        other => bail!("unknown user kind '{other}', expected cidadao or empresa"),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url)
        .await
        .with_context(|| format!("failed to open database {}", cli.database_url))?;

    match cli.command {
        Command::Setup => {
            let summary = storage.seed_demo_data().await?;
            info!(
                users = summary.users,
                collection_points = summary.collection_points,
                appointments = summary.appointments,
                "database ready"
            );
            println!(
                "schema ready at {} (seeded {} users, {} collection points, {} appointments)",
                cli.database_url, summary.users, summary.collection_points, summary.appointments
            );
        }
        Command::CreateUser { name, email, kind } => {
            let user_id = storage.create_user(&name, &email, parse_kind(&kind)?).await?;
            println!("created user_id={user_id}");
        }
        Command::CreatePoint {
            name,
            address,
            latitude,
            longitude,
            hours,
        } => {
            let point_id = storage
                .create_collection_point(&NewCollectionPoint {
                    name,
                    address,
                    latitude,
                    longitude,
                    opening_hours: hours,
                })
                .await?;
            println!("created collection_point_id={point_id}");
        }
    }

    Ok(())
}
