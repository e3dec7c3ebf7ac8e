use std::{
    io::{self, BufRead, Write},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    config::{load_client_settings, validated_base_url},
    render::{render_buckets, render_directory, render_notice},
    AlwaysConfirm, AppointmentForm, AppointmentListController, ConfirmationPrompt,
    HttpSchedulingClient, SubmitOutcome, TransitionOutcome, ViewModel,
};
use shared::domain::{AppointmentId, AppointmentStatus};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "coleta", about = "Schedule and track e-waste pickups")]
struct Cli {
    /// Overrides `api_base_url` from client.toml and the environment.
    #[arg(long, global = true)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show pending and confirmed appointments.
    List,
    /// Show the collection companies available for scheduling.
    Points,
    Schedule {
        #[arg(long)]
        user_id: String,
        #[arg(long)]
        point_id: String,
        #[arg(long)]
        category: String,
        /// Pickup date, `YYYY-MM-DD`.
        #[arg(long)]
        date: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        landmark: Option<String>,
    },
    /// Mark an appointment as collected.
    Confirm {
        id: i64,
        #[arg(long)]
        status: Option<String>,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

struct StdinPrompt;

impl ConfirmationPrompt for StdinPrompt {
    fn confirm(&self, message: &str) -> bool {
        print!("{message} [y/N] ");
        if io::stdout().flush().is_err() {
            return false;
        }
        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes" | "s" | "sim")
    }
}

fn print_notice(view: &ViewModel) {
    if let Some(notice) = render_notice(view) {
        println!("{notice}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(io::stderr)
        .init();
    let cli = Cli::parse();

    let settings = load_client_settings();
    let base_url = validated_base_url(cli.api_url.as_deref().unwrap_or(&settings.api_base_url))
        .context("failed to resolve the scheduling api url")?;
    let api = Arc::new(HttpSchedulingClient::new(base_url));

    let prompt: Arc<dyn ConfirmationPrompt> = match &cli.command {
        Command::Confirm { yes: false, .. } => Arc::new(StdinPrompt),
        _ => Arc::new(AlwaysConfirm),
    };
    let controller = AppointmentListController::new(api, prompt);

    match cli.command {
        Command::List => {
            let _ = controller.synchronize().await;
            print!("{}", render_buckets(&controller.snapshot().await));
        }
        Command::Points => {
            controller.load_directory().await;
            print!("{}", render_directory(&controller.snapshot().await));
        }
        Command::Schedule {
            user_id,
            point_id,
            category,
            date,
            address,
            landmark,
        } => {
            controller
                .set_form(AppointmentForm {
                    user_id,
                    collection_point_id: point_id,
                    waste_category: category,
                    pickup_date: date,
                    address,
                    landmark: landmark.unwrap_or_default(),
                })
                .await;
            let outcome = controller.submit().await;
            let view = controller.snapshot().await;
            print_notice(&view);
            match outcome {
                SubmitOutcome::Rejected(err) => bail!("appointment not sent: {err}"),
                SubmitOutcome::Failed(reason) => bail!(reason),
                SubmitOutcome::Inserted(_) | SubmitOutcome::Resynchronized => {
                    print!("{}", render_buckets(&view));
                }
            }
        }
        Command::Confirm { id, status, .. } => {
            let status =
                status.unwrap_or_else(|| AppointmentStatus::Confirmed.wire_value().to_string());
            let outcome = controller.transition_status(AppointmentId(id), &status).await;
            let view = controller.snapshot().await;
            print_notice(&view);
            match outcome {
                TransitionOutcome::Declined => println!("No changes made."),
                TransitionOutcome::Failed(reason) => bail!(reason),
                TransitionOutcome::Applied => print!("{}", render_buckets(&view)),
            }
        }
    }

    Ok(())
}
