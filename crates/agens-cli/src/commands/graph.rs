//! Graph lifecycle commands.

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{confirm, Settings};

#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Create a graph
    Create {
        /// Graph name
        name: String,
        /// Do nothing if the graph exists
        #[arg(long)]
        if_not_exists: bool,
        /// Owner role (defaults to the connecting user)
        #[arg(long)]
        authorization: Option<String>,
    },

    /// Drop a graph and everything in it
    Drop {
        /// Graph name
        name: String,
        /// Do nothing if the graph does not exist
        #[arg(long)]
        if_exists: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Rename a graph
    Rename {
        name: String,
        new_name: String,
    },

    /// Change the owner of a graph
    Owner {
        name: String,
        /// New owner role, CURRENT_USER or SESSION_USER
        owner: String,
    },

    /// Show the server's default graph_path
    Path,
}

pub async fn execute(cmd: GraphCommands, settings: &Settings) -> Result<()> {
    match cmd {
        GraphCommands::Create { name, if_not_exists, authorization } => {
            cmd_create(settings, &name, if_not_exists, authorization).await
        }
        GraphCommands::Drop { name, if_exists, yes } => cmd_drop(settings, &name, if_exists, yes).await,
        GraphCommands::Rename { name, new_name } => {
            let mut cursor = settings.cursor().await?;
            cursor.alter_graph(&name).rename(&new_name).await?;
            println!("{} Renamed graph {} to {}", "✓".green(), name.cyan(), new_name.cyan());
            Ok(())
        }
        GraphCommands::Owner { name, owner } => {
            let mut cursor = settings.cursor().await?;
            cursor.alter_graph(&name).owner_to(&owner).await?;
            println!("{} Graph {} is now owned by {}", "✓".green(), name.cyan(), owner.yellow());
            Ok(())
        }
        GraphCommands::Path => {
            let mut cursor = settings.cursor().await?;
            match cursor.graph_path().await? {
                Some(path) => println!("graph_path = {}", path.cyan()),
                None => println!("{}", "graph_path is not set.".dimmed()),
            }
            Ok(())
        }
    }
}

async fn cmd_create(settings: &Settings, name: &str, if_not_exists: bool, authorization: Option<String>) -> Result<()> {
    let mut cursor = settings.cursor().await?;
    let owner = authorization.unwrap_or_else(|| settings.config.user.clone());
    cursor.create_graph(name, if_not_exists, Some(&owner)).await?;
    println!("{} Created graph {} (owner {})", "✓".green(), name.cyan(), owner.yellow());
    Ok(())
}

async fn cmd_drop(settings: &Settings, name: &str, if_exists: bool, yes: bool) -> Result<()> {
    let prompt = format!("Drop graph '{}' with all its vertices and edges?", name);
    if !confirm(&prompt, yes)? {
        println!("{}", "Aborted.".dimmed());
        return Ok(());
    }
    let mut cursor = settings.cursor().await?;
    cursor.drop_graph(name, if_exists).await?;
    println!("{} Dropped graph {}", "✓".green(), name.cyan());
    Ok(())
}
