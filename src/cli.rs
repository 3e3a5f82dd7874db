//! Command-line interface definition

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "fincoach", about = "Durable personal budgeting coach", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CoachCommand
}

#[derive(Subcommand)]
pub enum CoachCommand {
    /// Send a chat message and print the coach's reply
    Chat {
        /// Entity id owning the session
        #[arg(long, default_value = "default")]
        entity:  String,
        /// Message text
        message: String
    },
    /// Print the session history
    History {
        #[arg(long, default_value = "default")]
        entity: String
    },
    /// Print the financial profile
    Profile {
        #[arg(long, default_value = "default")]
        entity: String
    },
    /// Update profile fields; unset fields are left untouched
    SetProfile {
        #[arg(long, default_value = "default")]
        entity:         String,
        #[arg(long)]
        monthly_income: Option<f64>,
        #[arg(long)]
        total_debt:     Option<f64>,
        #[arg(long)]
        savings_target: Option<f64>,
        /// Goal; repeat the flag for multiple goals
        #[arg(long = "goal")]
        goals:          Vec<String>
    },
    /// Clear the session history, keeping the profile
    Clear {
        #[arg(long, default_value = "default")]
        entity: String
    },
    /// Run the daily briefing workflow for an entity
    Brief {
        #[arg(long, default_value = "default")]
        entity: String
    },
    /// Print the status of a workflow instance
    Status {
        /// Workflow instance id
        instance: String
    },
    /// Resume an interrupted workflow instance
    Resume {
        /// Workflow instance id
        instance: String
    }
}
