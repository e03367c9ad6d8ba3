//! Import a node-link JSON document into the selected graph.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use tracing::warn;

use agens_core::{ImportOptions, JsonGraph};

use super::{confirm, Settings};
use crate::output;

#[derive(Args)]
pub struct ImportArgs {
    /// JSON file with `nodes` and `edges`
    pub file: PathBuf,

    /// Label for nodes without one
    #[arg(long)]
    pub node_label: Option<String>,

    /// Node attribute holding the vertex label
    #[arg(long)]
    pub node_label_attr: Option<String>,

    /// Label for edges without one
    #[arg(long)]
    pub edge_label: Option<String>,

    /// Edge attribute holding the edge label
    #[arg(long)]
    pub edge_label_attr: Option<String>,

    /// Replace spaces, '/' and '-' in attribute names with '_'
    #[arg(long)]
    pub strip_attrs: bool,

    /// Drop and recreate the graph before importing
    #[arg(long)]
    pub replace: bool,

    /// Skip the confirmation prompt for --replace
    #[arg(short, long)]
    pub yes: bool,
}

impl ImportArgs {
    fn options(&self) -> ImportOptions {
        let mut opts = ImportOptions::default().strip_attrs(self.strip_attrs);
        if let Some(label) = &self.node_label {
            opts = opts.node_label(label.as_str());
        }
        if let Some(attr) = &self.node_label_attr {
            opts = opts.node_label_attr(attr.as_str());
        }
        if let Some(label) = &self.edge_label {
            opts = opts.edge_label(label.as_str());
        }
        if let Some(attr) = &self.edge_label_attr {
            opts = opts.edge_label_attr(attr.as_str());
        }
        opts
    }
}

pub async fn execute(args: ImportArgs, settings: &Settings) -> Result<()> {
    let content = std::fs::read_to_string(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let doc: JsonGraph = serde_json::from_str(&content)
        .with_context(|| format!("Invalid graph document {}", args.file.display()))?;

    if args.replace {
        let prompt = format!("Replace graph '{}' and delete its contents?", settings.graph_name()?);
        if !confirm(&prompt, args.yes)? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let opts = args.options();
    let mut graph = settings.open_graph(args.replace).await?;

    let pb = ProgressBar::new((doc.nodes.len() + doc.edges.len()) as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    graph.cursor_mut().begin().await?;
    let imported = graph
        .create_from_json_graph_with(&doc, &opts, |p| pb.set_position(p.created as u64))
        .await;

    let sub = match imported {
        Ok(sub) => {
            graph.commit().await?;
            pb.finish_and_clear();
            sub
        }
        Err(e) => {
            pb.abandon();
            if let Err(rollback) = graph.rollback().await {
                warn!(error = %rollback, "Rollback failed");
            }
            return Err(e.context(format!("Import of {} failed", args.file.display())));
        }
    };

    output::print_success(&format!(
        "Imported {} vertices and {} edges into {}",
        sub.vertices().len(),
        sub.edges().len(),
        graph.name()
    ));
    graph.close().await
}
