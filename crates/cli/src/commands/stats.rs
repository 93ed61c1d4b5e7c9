//! Aggregate stats command

use anyhow::Result;
use fhub_client::Hub;
use fhub_common::StatsSnapshot;
use serde::Serialize;

use crate::output::{print_item, OutputFormat, TableDisplay};

/// Stats as one table row
#[derive(Serialize)]
#[serde(transparent)]
pub struct StatsDisplay(pub StatsSnapshot);

impl TableDisplay for StatsDisplay {
    fn headers() -> Vec<&'static str> {
        vec![
            "Builds", "Running", "Completed", "Failed", "JTAF", "Floating", "OS Making", "Snippets",
        ]
    }

    fn row(&self) -> Vec<String> {
        let logs = &self.0.build_logs;
        let code = &self.0.generated_code;
        vec![
            logs.total.to_string(),
            logs.running.to_string(),
            logs.completed.to_string(),
            logs.failed.to_string(),
            logs.by_type.jtaf.to_string(),
            logs.by_type.floating.to_string(),
            logs.by_type.os_making.to_string(),
            format!("{}/{}", code.total, code.limit),
        ]
    }
}

pub async fn execute(hub: &Hub, format: OutputFormat) -> Result<()> {
    let stats = hub.stats.get().await?;
    print_item(&StatsDisplay(stats), format);
    Ok(())
}
