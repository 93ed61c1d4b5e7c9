//! Generated code commands

use anyhow::{Context, Result};
use clap::Subcommand;
use fhub_client::Hub;
use fhub_common::{GeneratedCodeRecord, NewGeneratedCode, PageFilter};
use serde::Serialize;
use std::path::PathBuf;

use crate::output::{print_item, print_list, print_outcome, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum CodeCommands {
    /// List saved snippets, newest first
    List {
        /// Records to skip
        #[arg(long)]
        skip: Option<usize>,

        /// Records to return
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Show a snippet including its code
    Get {
        /// Snippet ID
        id: String,
    },

    /// Save a snippet
    Create {
        /// Language
        #[arg(short, long)]
        language: String,

        /// Snippet type (api, test, config, ...)
        #[arg(long = "type")]
        kind: String,

        /// Description
        #[arg(short, long, default_value = "")]
        description: String,

        /// Code text
        #[arg(long, conflicts_with = "file")]
        code: Option<String>,

        /// Read the code from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Delete a snippet
    Delete {
        /// Snippet ID
        id: String,
    },

    /// Delete every snippet
    Clear,
}

/// Snippet row for display
#[derive(Serialize)]
#[serde(transparent)]
pub struct CodeDisplay(pub GeneratedCodeRecord);

impl TableDisplay for CodeDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Language", "Type", "Description", "Lines", "Created"]
    }

    fn row(&self) -> Vec<String> {
        let code = &self.0;
        vec![
            code.id.clone(),
            code.language.clone(),
            code.kind.clone(),
            code.description.clone(),
            code.code.lines().count().to_string(),
            code.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]
    }
}

pub async fn execute(cmd: CodeCommands, hub: &Hub, format: OutputFormat) -> Result<()> {
    match cmd {
        CodeCommands::List { skip, limit } => {
            let codes = hub.generated_code.get_all(&PageFilter { skip, limit }).await?;
            let displays: Vec<_> = codes.into_iter().map(CodeDisplay).collect();
            print_list(&displays, format);
        }

        CodeCommands::Get { id } => {
            let code = hub.generated_code.get_by_id(&id).await?;
            match format {
                OutputFormat::Json => print_item(&CodeDisplay(code), format),
                _ => {
                    let body = code.code.clone();
                    print_item(&CodeDisplay(code), format);
                    println!();
                    println!("{}", body);
                }
            }
        }

        CodeCommands::Create {
            language,
            kind,
            description,
            code,
            file,
        } => {
            let code = match (code, file) {
                (Some(code), _) => code,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => anyhow::bail!("pass --code or --file"),
            };

            let input = NewGeneratedCode::new(language, kind, code, description);
            let resp = hub.generated_code.create(&input).await?;
            print_outcome(
                &format!("{} (id: {})", resp.message, resp.id),
                resp.is_offline(),
                format,
            );
        }

        CodeCommands::Delete { id } => {
            let resp = hub.generated_code.delete(&id).await?;
            print_outcome(&resp.message, resp.is_offline(), format);
        }

        CodeCommands::Clear => {
            let resp = hub.generated_code.clear_all().await?;
            print_outcome(&resp.message, resp.is_offline(), format);
        }
    }

    Ok(())
}
