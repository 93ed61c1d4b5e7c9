//! Build log commands

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Subcommand;
use fhub_client::Hub;
use fhub_common::{BuildLogFilter, BuildLogRecord, BuildLogUpdate, BuildStatus, NewBuildLog};
use serde::Serialize;

use crate::output::{colored_status, print_item, print_list, print_outcome, OutputFormat, TableDisplay};

#[derive(Subcommand)]
pub enum LogCommands {
    /// List build logs, newest first
    List {
        /// Only this status (running, completed, failed)
        #[arg(long)]
        status: Option<BuildStatus>,

        /// Only this build type
        #[arg(long = "type")]
        kind: Option<String>,

        /// Records to skip
        #[arg(long)]
        skip: Option<usize>,

        /// Records to return
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Get a build log
    Get {
        /// Build ID
        id: String,
    },

    /// Record a build
    Create {
        /// Build ID, unique per build
        build_id: String,

        /// Build type (JTAF Framework, Floating Framework, OS Making)
        #[arg(long = "type")]
        kind: String,

        /// Jenkins job name
        #[arg(long)]
        job: String,

        /// Initial status
        #[arg(long, default_value = "running")]
        status: BuildStatus,

        /// Start time (RFC 3339), defaults to now
        #[arg(long)]
        start_time: Option<DateTime<Utc>>,

        /// Command line that was run
        #[arg(long)]
        command: Option<String>,

        /// Build configuration as a JSON object
        #[arg(long)]
        config: Option<String>,
    },

    /// Update a build's status, end time or output
    Update {
        /// Build ID
        id: String,

        /// New status
        #[arg(long)]
        status: Option<BuildStatus>,

        /// End time (RFC 3339). Defaults to now when finishing a build.
        #[arg(long)]
        end_time: Option<DateTime<Utc>>,

        /// Captured output
        #[arg(long)]
        output_log: Option<String>,
    },

    /// Delete a build log
    Delete {
        /// Build ID
        id: String,
    },

    /// Delete every build log
    Clear,
}

/// Build log row for display
#[derive(Serialize)]
#[serde(transparent)]
pub struct BuildLogDisplay(pub BuildLogRecord);

fn short_time(t: &DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M:%S").to_string()
}

impl TableDisplay for BuildLogDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["ID", "Build ID", "Type", "Status", "Started", "Ended", "Job"]
    }

    fn row(&self) -> Vec<String> {
        let log = &self.0;
        vec![
            log.id.clone(),
            log.build_id.clone(),
            log.kind.clone(),
            colored_status(&log.status.to_string()),
            short_time(&log.start_time),
            log.end_time.as_ref().map(short_time).unwrap_or_else(|| "-".to_string()),
            log.jenkins_job.clone(),
        ]
    }
}

/// Update body for the given flags. A final status with no end time
/// is stamped with the current time.
fn build_update(
    status: Option<BuildStatus>,
    end_time: Option<DateTime<Utc>>,
    output_log: Option<String>,
) -> BuildLogUpdate {
    let finishing = matches!(status, Some(BuildStatus::Completed | BuildStatus::Failed));
    BuildLogUpdate {
        status,
        end_time: end_time.or_else(|| finishing.then(Utc::now)),
        output_log,
    }
}

pub async fn execute(cmd: LogCommands, hub: &Hub, format: OutputFormat) -> Result<()> {
    match cmd {
        LogCommands::List {
            status,
            kind,
            skip,
            limit,
        } => {
            let filter = BuildLogFilter {
                skip,
                limit,
                status,
                kind,
            };
            let logs = hub.build_logs.get_all(&filter).await?;
            let displays: Vec<_> = logs.into_iter().map(BuildLogDisplay).collect();
            print_list(&displays, format);
        }

        LogCommands::Get { id } => {
            let log = hub.build_logs.get_by_id(&id).await?;
            print_item(&BuildLogDisplay(log), format);
        }

        LogCommands::Create {
            build_id,
            kind,
            job,
            status,
            start_time,
            command,
            config,
        } => {
            let mut input = NewBuildLog::started(build_id, kind, job);
            input.status = status;
            input.command = command;
            if let Some(start) = start_time {
                input.start_time = start;
            }
            if let Some(raw) = config {
                input.config = serde_json::from_str(&raw).context("--config is not valid JSON")?;
            }

            let resp = hub.build_logs.create(&input).await?;
            print_outcome(
                &format!("{} (id: {})", resp.message, resp.id),
                resp.is_offline(),
                format,
            );
        }

        LogCommands::Update {
            id,
            status,
            end_time,
            output_log,
        } => {
            let update = build_update(status, end_time, output_log);
            if update.is_empty() {
                anyhow::bail!("nothing to update: pass --status, --end-time or --output-log");
            }
            let resp = hub.build_logs.update(&id, &update).await?;
            print_outcome(&resp.message, resp.is_offline(), format);
        }

        LogCommands::Delete { id } => {
            let resp = hub.build_logs.delete(&id).await?;
            print_outcome(&resp.message, resp.is_offline(), format);
        }

        LogCommands::Clear => {
            let resp = hub.build_logs.clear_all().await?;
            print_outcome(&resp.message, resp.is_offline(), format);
        }
    }

    Ok(())
}
