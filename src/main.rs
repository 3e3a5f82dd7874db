mod cli;

use std::{sync::Arc, time::Duration};

use anyhow::Result;
use clap::Parser;
use fincoach::{
    AppContext,
    actor::{Guardian, GuardianMessage, SessionClient},
    config,
    domain::profile::ProfilePatch,
    workflow::{briefing::briefing_steps, runner::WorkflowRunner}
};
use serde_json::json;

use crate::cli::{Cli, CoachCommand};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = config::load_config()?;
    let app_context = Arc::new(AppContext::init(config)?);

    let guardian = Guardian::spawn_system(app_context.clone()).await?;
    let sessions = SessionClient::new(guardian.clone());
    let runner = WorkflowRunner::new(
        app_context.checkpoints.clone(),
        briefing_steps(&app_context, sessions.clone()),
        app_context.config.retry.into()
    );

    let result = run_command(cli.command, &sessions, &runner).await;

    // Let the actor system drain before the process exits
    let _ = guardian.cast(GuardianMessage::Shutdown);
    tokio::time::sleep(Duration::from_millis(100)).await;

    result
}

async fn run_command(command: CoachCommand, sessions: &SessionClient, runner: &WorkflowRunner) -> Result<()> {
    match command {
        CoachCommand::Chat { entity, message } => {
            let reply = sessions.send_message(&entity, message).await?;
            println!("{}", reply.content);
        }
        CoachCommand::History { entity } => {
            let history = sessions.get_history(&entity).await?;
            if history.is_empty() {
                println!("No messages yet.");
            }
            for message in history {
                println!("[{}] {}: {}", message.timestamp.format("%Y-%m-%d %H:%M:%S"), message.role, message.content);
            }
        }
        CoachCommand::Profile { entity } => {
            let profile = sessions.get_profile(&entity).await?;
            match profile.summary() {
                Some(summary) => println!("{}", summary),
                None => println!("No profile recorded yet.")
            }
        }
        CoachCommand::SetProfile { entity, monthly_income, total_debt, savings_target, goals } => {
            let patch = ProfilePatch {
                monthly_income,
                total_debt,
                savings_target,
                goals: if goals.is_empty() { None } else { Some(goals) }
            };
            if patch.is_empty() {
                anyhow::bail!("Nothing to update; set at least one profile field");
            }
            let profile = sessions.update_profile(&entity, patch).await?;
            println!("{}", profile.summary().unwrap_or_default());
        }
        CoachCommand::Clear { entity } => {
            sessions.clear(&entity).await?;
            println!("History cleared.");
        }
        CoachCommand::Brief { entity } => {
            let instance_id = runner.create(json!({"entityId": entity})).await?;
            println!("Briefing started: {}", instance_id);

            // Wait for the background run to reach a terminal status
            loop {
                tokio::time::sleep(Duration::from_millis(100)).await;
                let status = runner.status(&instance_id).await?;
                if status.status.is_terminal() {
                    print_status(&status);
                    break;
                }
            }
        }
        CoachCommand::Status { instance } => {
            let status = runner.status(&instance).await?;
            print_status(&status);
        }
        CoachCommand::Resume { instance } => {
            let status = runner.resume(&instance).await?;
            print_status(&status);
        }
    }

    Ok(())
}

fn print_status(status: &fincoach::domain::workflow::InstanceStatus) {
    println!("{} {:?}", status.instance_id, status.status);
    if let Some(error) = &status.error {
        println!("error: {}", error);
    }
    if let Some(output) = &status.output {
        println!("{}", serde_json::to_string_pretty(output).unwrap_or_default());
    }
}
