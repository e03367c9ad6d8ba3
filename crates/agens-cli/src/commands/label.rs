//! Label commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use colored::Colorize;

use agens_core::ddl::{LabelKind, LabelOptions};
use agens_core::Properties;
use agens_graph::{Connection, Graph};

use super::{confirm, Settings};
use crate::output;

/// Selects edge labels instead of vertex labels.
#[derive(Args, Clone, Copy, Debug)]
pub struct KindArg {
    /// Work on edge labels (ELABEL) instead of vertex labels
    #[arg(short, long)]
    pub edge: bool,
}

impl KindArg {
    fn kind(self) -> LabelKind {
        if self.edge {
            LabelKind::Edge
        } else {
            LabelKind::Vertex
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Create a label
    Create {
        name: String,
        #[command(flatten)]
        kind: KindArg,
        #[arg(long)]
        if_not_exists: bool,
        /// Create the label's table without WAL logging
        #[arg(long)]
        unlogged: bool,
        /// Do not create the default id index
        #[arg(long)]
        disable_index: bool,
        /// Parent labels, comma separated
        #[arg(long, value_delimiter = ',')]
        inherits: Vec<String>,
        /// Storage parameter, e.g. "fillfactor=70"
        #[arg(long = "with")]
        storage_parameter: Option<String>,
        #[arg(long)]
        tablespace: Option<String>,
    },

    /// Drop a label
    Drop {
        name: String,
        #[command(flatten)]
        kind: KindArg,
        #[arg(long)]
        if_exists: bool,
        /// Also drop dependent objects, including child labels
        #[arg(long)]
        cascade: bool,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List labels of the graph
    List {
        #[command(flatten)]
        kind: KindArg,
        /// Also count the entities of each label
        #[arg(long)]
        counts: bool,
    },

    /// Show the label inheritance tree
    Tree {
        #[command(flatten)]
        kind: KindArg,
    },

    /// Rename a label
    Rename {
        name: String,
        new_name: String,
        #[command(flatten)]
        kind: KindArg,
        #[arg(long)]
        if_exists: bool,
    },
}

pub async fn execute(cmd: LabelCommands, settings: &Settings) -> Result<()> {
    let mut graph = settings.existing_graph().await?;

    match cmd {
        LabelCommands::Create {
            name,
            kind,
            if_not_exists,
            unlogged,
            disable_index,
            inherits,
            storage_parameter,
            tablespace,
        } => {
            let mut opts = LabelOptions::new().inherits(inherits);
            if if_not_exists {
                opts = opts.if_not_exists();
            }
            if unlogged {
                opts = opts.unlogged();
            }
            if disable_index {
                opts = opts.disable_index();
            }
            if let Some(param) = storage_parameter {
                opts = opts.storage_parameter(param);
            }
            if let Some(ts) = tablespace {
                opts = opts.tablespace(ts);
            }
            graph.cursor_mut().create_label(kind.kind(), &name, &opts).await?;
            println!("{} Created {} {}", "✓".green(), kind.kind(), name.cyan());
        }
        LabelCommands::Drop {
            name,
            kind,
            if_exists,
            cascade,
            yes,
        } => {
            let prompt = format!("Drop {} '{}' and all its entities?", kind.kind(), name);
            if !confirm(&prompt, yes)? {
                println!("{}", "Aborted.".dimmed());
                return Ok(());
            }
            graph
                .cursor_mut()
                .drop_label(kind.kind(), &name, if_exists, cascade)
                .await?;
            println!("{} Dropped {} {}", "✓".green(), kind.kind(), name.cyan());
        }
        LabelCommands::List { kind, counts } => {
            let rows = label_rows(&mut graph, kind.kind(), counts).await?;
            output::print_labels(kind.kind(), &rows);
        }
        LabelCommands::Tree { kind } => {
            let hierarchy = graph.label_inheritance(kind.kind()).await?;
            output::print_hierarchy(&hierarchy);
        }
        LabelCommands::Rename {
            name,
            new_name,
            kind,
            if_exists,
        } => {
            let mut alter = graph.cursor_mut().alter_label(kind.kind(), &name);
            if if_exists {
                alter = alter.if_exists();
            }
            alter.rename(&new_name).await?;
            println!("{} Renamed {} {} to {}", "✓".green(), kind.kind(), name.cyan(), new_name.cyan());
        }
    }

    graph.close().await
}

/// Label names of one kind, each with its entity count when `counts` is set.
pub(super) async fn label_rows<C: Connection>(
    graph: &mut Graph<C>,
    kind: LabelKind,
    counts: bool,
) -> Result<Vec<(String, Option<u64>)>> {
    let empty = Properties::new();
    let labels = graph.labels(kind).await?;
    let mut rows = Vec::with_capacity(labels.len());
    for label in labels {
        let count = match (counts, kind) {
            (false, _) => None,
            (true, LabelKind::Vertex) => Some(graph.numv(Some(&label), &empty, None).await?),
            (true, LabelKind::Edge) => Some(graph.nume(Some(&label), &empty, None).await?),
        };
        rows.push((label, count));
    }
    Ok(rows)
}
