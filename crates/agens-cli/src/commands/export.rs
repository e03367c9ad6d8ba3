//! Export a subgraph as a node-link document or a weighted edge list.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use petgraph::visit::EdgeRef;
use std::fmt::Write as _;
use std::path::PathBuf;

use agens_core::cypher::{PatternFilter, SubgraphQuery, Term, WhereClause};

use super::Settings;
use crate::output;

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    /// Node-link JSON
    Json,
    /// "source target weight" per line
    Edgelist,
}

#[derive(Args)]
pub struct ExportArgs {
    /// Source vertex label
    #[arg(long)]
    pub source_label: Option<String>,

    /// Edge label
    #[arg(long)]
    pub edge_label: Option<String>,

    /// Target vertex label
    #[arg(long)]
    pub target_label: Option<String>,

    /// WHERE terms over s, e and t; repeated terms are ANDed
    #[arg(long = "where")]
    pub filters: Vec<String>,

    #[arg(short, long, value_enum, default_value = "json")]
    pub format: ExportFormat,

    /// Edge property used as weight in edge lists
    #[arg(long)]
    pub weight_attr: Option<String>,

    /// Weight for edges without the weight property
    #[arg(long, default_value_t = 1.0)]
    pub default_weight: f64,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print JSON
    #[arg(long)]
    pub pretty: bool,
}

impl ExportArgs {
    fn query(&self) -> SubgraphQuery {
        let pattern = |label: &Option<String>| match label {
            Some(label) => PatternFilter::new().label(label.as_str()),
            None => PatternFilter::new(),
        };
        let mut query = SubgraphQuery::new()
            .source(pattern(&self.source_label))
            .edge(pattern(&self.edge_label))
            .target(pattern(&self.target_label));
        if !self.filters.is_empty() {
            let terms = self.filters.iter().map(|f| Term::from(f.as_str())).collect();
            query = query.filter(WhereClause::Cnf(terms));
        }
        query
    }
}

pub async fn execute(args: ExportArgs, settings: &Settings) -> Result<()> {
    let mut graph = settings.existing_graph().await?;
    let query = args.query();

    let text = match args.format {
        ExportFormat::Json => {
            let doc = graph.to_json_graph(&query).await?;
            if args.pretty {
                serde_json::to_string_pretty(&doc)?
            } else {
                serde_json::to_string(&doc)?
            }
        }
        ExportFormat::Edgelist => {
            let sub = graph.subgraph(&query).await?;
            let weighted = sub.to_weighted(args.weight_attr.as_deref(), args.default_weight);
            let mut text = String::new();
            for edge in weighted.edge_references() {
                writeln!(
                    text,
                    "{} {} {}",
                    weighted[edge.source()],
                    weighted[edge.target()],
                    edge.weight()
                )?;
            }
            text
        }
    };

    match &args.output {
        Some(path) => {
            std::fs::write(path, &text).with_context(|| format!("Failed to write {}", path.display()))?;
            output::print_success(&format!("Exported to {}", path.display()));
        }
        None => println!("{}", text.trim_end()),
    }

    graph.close().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: ExportArgs,
    }

    #[test]
    fn test_query_from_flags() {
        let h = Harness::parse_from([
            "export",
            "--source-label",
            "person",
            "--edge-label",
            "knows",
            "--where",
            "s.age > 30",
            "--where",
            "t.age < 40",
        ]);
        let cypher = h.args.query().render();
        assert!(cypher.starts_with("MATCH (s:person)-[e:knows]->(t)"));
        assert!(cypher.contains("WHERE s.age > 30 AND t.age < 40"));
    }

    #[test]
    fn test_query_without_flags_matches_everything() {
        let h = Harness::parse_from(["export"]);
        let cypher = h.args.query().render();
        assert!(cypher.starts_with("MATCH (s)-[e]->(t)"));
        assert!(!cypher.contains("WHERE"));
    }
}
