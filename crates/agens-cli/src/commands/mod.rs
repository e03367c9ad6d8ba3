//! CLI command definitions and handlers.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use agens_core::{ConnectionConfig, GraphOptions};
use agens_graph::{Cursor, Graph, PgConnection};

pub mod export;
pub mod graph;
pub mod import;
pub mod label;
pub mod query;
pub mod stats;

/// AgensGraph client - graphs, labels, Cypher queries and graph import/export
#[derive(Parser)]
#[command(name = "agens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log every command sent to the server
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// TOML file with connection settings
    #[arg(short, long, global = true, env = "AGENS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Server host
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Database user
    #[arg(short, long, global = true)]
    pub user: Option<String>,

    /// Database name
    #[arg(short, long, global = true)]
    pub dbname: Option<String>,

    /// Graph to work on. Only `import` creates it when missing; other
    /// commands fail if it does not exist
    #[arg(short, long, global = true, env = "AGENS_GRAPH")]
    pub graph: Option<String>,

    /// Also write logs to this file
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create, drop, rename or inspect graphs
    #[command(subcommand)]
    Graph(graph::GraphCommands),

    /// Manage vertex and edge labels
    #[command(subcommand)]
    Label(label::LabelCommands),

    /// Run a Cypher query and print the rows
    Query(query::QueryArgs),

    /// Vertex and edge counts per label
    Stats,

    /// Export a subgraph
    Export(export::ExportArgs),

    /// Import a JSON node-link document
    Import(import::ImportArgs),
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let settings = Settings::from_cli(&self)?;
        match self.command {
            Commands::Graph(cmd) => graph::execute(cmd, &settings).await,
            Commands::Label(cmd) => label::execute(cmd, &settings).await,
            Commands::Query(args) => query::execute(args, &settings).await,
            Commands::Stats => stats::execute(&settings).await,
            Commands::Export(args) => export::execute(args, &settings).await,
            Commands::Import(args) => import::execute(args, &settings).await,
        }
    }
}

/// Resolved settings shared by all commands.
pub struct Settings {
    pub config: ConnectionConfig,
    pub graph: Option<String>,
    pub verbose: bool,
}

impl Settings {
    /// Defaults, then the config file, then environment, then flags.
    fn from_cli(cli: &Cli) -> Result<Self> {
        let config = match &cli.config {
            Some(path) => ConnectionConfig::from_file(path)
                .with_context(|| format!("Failed to load config from {}", path.display()))?,
            None => ConnectionConfig::default(),
        };
        let mut config = config.apply_env()?;
        if let Some(host) = &cli.host {
            config.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.port = port;
        }
        if let Some(user) = &cli.user {
            config.user = user.clone();
        }
        if let Some(dbname) = &cli.dbname {
            config.dbname = dbname.clone();
        }
        Ok(Self {
            config,
            graph: cli.graph.clone(),
            verbose: cli.verbose,
        })
    }

    /// A bare cursor, for commands that are not bound to one graph.
    pub async fn cursor(&self) -> Result<Cursor<PgConnection>> {
        let conn = agens_graph::connect(&self.config).await?;
        Ok(Cursor::new(conn).verbose(self.verbose))
    }

    pub fn graph_name(&self) -> Result<&str> {
        self.graph
            .as_deref()
            .ok_or_else(|| anyhow::anyhow!("No graph selected. Pass --graph <name> or set AGENS_GRAPH."))
    }

    /// Open a session on the selected graph, creating it if needed.
    pub async fn open_graph(&self, replace: bool) -> Result<Graph<PgConnection>> {
        let opts = GraphOptions::new(self.graph_name()?).replace(replace);
        let mut graph = Graph::connect(&self.config, opts).await?;
        graph.cursor_mut().set_verbose(self.verbose);
        Ok(graph)
    }

    /// Open a session on the selected graph, which must already exist.
    pub async fn existing_graph(&self) -> Result<Graph<PgConnection>> {
        let opts = GraphOptions::new(self.graph_name()?);
        let mut graph = Graph::connect_existing(&self.config, opts).await?;
        graph.cursor_mut().set_verbose(self.verbose);
        Ok(graph)
    }
}

/// Ask before a destructive action unless `yes` is set.
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    let answer = dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()?;
    Ok(answer)
}
