//! Run Cypher queries.

use anyhow::Result;
use clap::Args;

use super::Settings;
use crate::output;

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// Cypher (or SQL) text; a trailing ';' is optional
    pub cypher: String,

    /// Print the commands sent during this session
    #[arg(long)]
    pub show_history: bool,

    /// Print rows as JSON objects
    #[arg(long)]
    pub json: bool,
}

pub async fn execute(args: QueryArgs, settings: &Settings) -> Result<()> {
    let mut graph = settings.existing_graph().await?;
    let result = graph.cursor_mut().execute(&args.cypher).await?;

    if args.json {
        output::print_rows_json(&result.rows)?;
    } else {
        output::print_rows(&result.rows);
        if result.rows.is_empty() {
            if let Some(n) = result.affected {
                output::print_info(&format!("{} row(s) affected", n));
            }
        }
    }

    if args.show_history {
        output::print_history(graph.cursor().history());
    }

    graph.close().await
}
