//! Jenkins trigger command

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use fhub_client::Hub;
use fhub_common::JenkinsJobRequest;

use crate::output::{print_json, print_success, print_warning, OutputFormat};

#[derive(Subcommand)]
pub enum JenkinsCommands {
    /// Trigger the Jenkins job for a build
    Trigger(TriggerArgs),
}

#[derive(Args)]
pub struct TriggerArgs {
    /// Build ID
    pub build_id: String,

    /// Build type (JTAF Framework, Floating Framework, OS Making)
    #[arg(long = "type")]
    pub job_type: String,

    /// Build configuration as a JSON object
    #[arg(long)]
    pub config: Option<String>,

    /// Command to run on the target
    #[arg(long, default_value = "")]
    pub command: String,

    /// Target system address
    #[arg(long)]
    pub system_ip: Option<String>,

    /// Target system SSH port
    #[arg(long)]
    pub system_port: Option<String>,

    /// Target system user
    #[arg(long)]
    pub system_username: Option<String>,

    /// Exit non-zero when the trigger does not go through
    #[arg(long)]
    pub strict: bool,
}

pub async fn execute(cmd: JenkinsCommands, hub: &Hub, format: OutputFormat) -> Result<()> {
    match cmd {
        JenkinsCommands::Trigger(args) => {
            let config = match &args.config {
                Some(raw) => serde_json::from_str(raw).context("--config is not valid JSON")?,
                None => serde_json::json!({}),
            };
            let request = JenkinsJobRequest {
                build_id: args.build_id,
                job_type: args.job_type,
                config,
                command: args.command,
                system_ip: args.system_ip,
                system_port: args.system_port,
                system_username: args.system_username,
            };

            match hub.jenkins.trigger(&request).await {
                Ok(ack) => match format {
                    OutputFormat::Json => print_json(&serde_json::json!({
                        "success": true,
                        "message": ack.message,
                        "build_id": ack.build_id,
                        "jenkins_result": ack.job,
                    })),
                    _ => {
                        print_success(&ack.message);
                        if let Some(job) = ack.job {
                            println!("  Job:     {}", job.job_name);
                            println!("  Queue:   {}", job.queue_id);
                            println!("  Build:   {}", job.build_number);
                            println!("  Target:  {}", job.system_target);
                            for (key, value) in &job.parameters {
                                println!("  {:<20} {}", key, value);
                            }
                        }
                    }
                },
                Err(warning) if args.strict => return Err(warning.into()),
                Err(warning) => match format {
                    OutputFormat::Json => print_json(&serde_json::json!({
                        "success": false,
                        "message": warning.to_string(),
                        "build_id": request.build_id,
                    })),
                    _ => print_warning(&warning.to_string()),
                },
            }
        }
    }

    Ok(())
}
