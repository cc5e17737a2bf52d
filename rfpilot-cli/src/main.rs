//! rfpilot CLI
//!
//! Runs a named list of RF workflow stages against one WMS environment:
//!
//!   rfpilot run --workflow nightly.yaml --credentials creds.json
//!
//! Each stage is a `bucket.scenario` pair with a per-stage config map;
//! the remaining stages are halted on the first failure.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tracing::{error, info};

use rfpilot::postmsg::MessageSource;
use rfpilot::{
    AutomationError, ChromeConfig, ChromeTerminal, CredentialStore, FileScreenshotSink,
    ReceiveRequest, RetryPolicy, RfOptions, RfSession, TerminalDriver,
};

#[derive(Parser)]
#[command(name = "rfpilot")]
#[command(about = "Scripted operator workflows for the RF warehouse terminal")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a workflow file against one environment
    Run(RunArgs),
}

#[derive(Parser)]
struct RunArgs {
    /// YAML workflow file (stages of bucket.scenario pairs)
    #[clap(long, short = 'w')]
    workflow: PathBuf,

    /// JSON credential file keyed by environment name
    #[clap(long, short = 'c', env = "RFPILOT_CREDENTIALS")]
    credentials: PathBuf,

    /// Show the browser window instead of running headless
    #[clap(long)]
    headed: bool,

    /// Directory for audit screenshots
    #[clap(long, default_value = "screenshots")]
    screenshot_dir: PathBuf,

    /// Retry attempts per stage
    #[clap(long, default_value_t = 3)]
    attempts: u32,
}

/// Parsed workflow document.
#[derive(Debug, Deserialize)]
struct WorkflowFile {
    environment: String,
    stages: Vec<Stage>,
}

#[derive(Debug, Deserialize)]
struct Stage {
    /// `bucket.scenario`, e.g. `receive.happy_path`.
    stage: String,
    #[serde(default)]
    config: serde_yaml::Value,
}

impl Stage {
    fn bucket(&self) -> &str {
        self.stage.split('.').next().unwrap_or(&self.stage)
    }
}

#[derive(Debug, Deserialize)]
struct ReceiveStageConfig {
    asn: String,
    item: String,
    quantity: u32,
    #[serde(default = "default_flow_hint")]
    flow_hint: String,
    #[serde(default)]
    auto_handle_deviation: bool,
}

fn default_flow_hint() -> String {
    "HAPPY_PATH".into()
}

#[derive(Debug, Deserialize)]
struct PostMessageStageConfig {
    message_type: String,
    payload_file: PathBuf,
}

/// Payload lookup backed by a JSON file of `{ message_type: payload }`.
struct FileMessageSource {
    payloads: HashMap<String, String>,
}

impl FileMessageSource {
    fn load(path: &PathBuf) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading payload file {}", path.display()))?;
        let payloads = serde_json::from_str(&raw)
            .with_context(|| format!("parsing payload file {}", path.display()))?;
        Ok(Self { payloads })
    }
}

impl MessageSource for FileMessageSource {
    fn resolve(&self, message_type: &str, _environment: &str) -> Result<String, AutomationError> {
        self.payloads.get(message_type).cloned().ok_or_else(|| {
            AutomationError::ConfigError(format!("no payload for message type {message_type}"))
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run(args) => run(args).await,
    }
}

async fn run(args: RunArgs) -> Result<()> {
    let raw = std::fs::read_to_string(&args.workflow)
        .with_context(|| format!("reading workflow file {}", args.workflow.display()))?;
    let workflow: WorkflowFile = serde_yaml::from_str(&raw).context("parsing workflow file")?;

    let store = CredentialStore::from_json_file(&args.credentials)?;
    let credentials = store.resolve(&workflow.environment)?.clone();

    info!(
        environment = %workflow.environment,
        stages = workflow.stages.len(),
        "starting workflow"
    );

    let driver: Arc<dyn TerminalDriver> = Arc::new(ChromeTerminal::launch(ChromeConfig {
        url: credentials.server_url.clone(),
        headless: !args.headed,
        ..ChromeConfig::default()
    })?);
    let screenshots = Arc::new(FileScreenshotSink::new(driver.clone(), &args.screenshot_dir));
    let session = RfSession::bootstrap(credentials, driver, screenshots, RfOptions::default());

    session.sign_on().await?;
    session.select_warehouse().await?;

    let policy = RetryPolicy {
        attempts: args.attempts,
        ..RetryPolicy::default()
    };

    for stage in &workflow.stages {
        info!(stage = %stage.stage, "running stage");
        if let Err(e) = run_stage(&session, stage, &policy).await {
            error!(stage = %stage.stage, error = %e, "stage failed, halting workflow");
            bail!("stage '{}' failed: {e}", stage.stage);
        }
        info!(stage = %stage.stage, "stage complete");
    }
    Ok(())
}

async fn run_stage(session: &RfSession, stage: &Stage, policy: &RetryPolicy) -> Result<()> {
    match stage.bucket() {
        "receive" => {
            let config: ReceiveStageConfig =
                serde_yaml::from_value(stage.config.clone()).context("receive stage config")?;
            let machine = session.receive();
            let report = rfpilot::run_with_retry(&stage.stage, policy, || {
                let request = ReceiveRequest {
                    asn: config.asn.clone(),
                    item: config.item.clone(),
                    quantity: config.quantity,
                    flow_hint: config.flow_hint.clone(),
                    auto_handle_deviation: config.auto_handle_deviation,
                };
                let machine = &machine;
                async move {
                    let report = machine.run(request).await?;
                    if report.is_complete() {
                        Ok(report)
                    } else {
                        Err(AutomationError::UiError(format!(
                            "run ended in {} ({})",
                            report.final_state,
                            report
                                .context
                                .error_message
                                .as_deref()
                                .unwrap_or("no message"),
                        )))
                    }
                }
            })
            .await?;
            info!(
                final_state = %report.final_state,
                transitions = %report.context.describe_transitions(),
                "receive finished"
            );
            Ok(())
        }
        "post_message" => {
            let config: PostMessageStageConfig =
                serde_yaml::from_value(stage.config.clone()).context("post_message stage config")?;
            let source = FileMessageSource::load(&config.payload_file)?;
            rfpilot::run_with_retry(&stage.stage, policy, || {
                let source = &source;
                let message_type = config.message_type.clone();
                async move { session.post_message(source, &message_type).await }
            })
            .await?;
            Ok(())
        }
        other => bail!("unknown stage bucket '{other}' in '{}'", stage.stage),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn workflow_files_parse_stages_in_order() {
        let raw = r#"
environment: qa
stages:
  - stage: receive.happy_path
    config:
      asn: "23907432"
      item: "J105SXC200TR"
      quantity: 1
      flow_hint: HAPPY_PATH
  - stage: post_message.asn
    config:
      message_type: asn
      payload_file: payloads.json
"#;
        let workflow: WorkflowFile = serde_yaml::from_str(raw).unwrap();
        assert_eq!(workflow.environment, "qa");
        assert_eq!(workflow.stages.len(), 2);
        assert_eq!(workflow.stages[0].bucket(), "receive");
        assert_eq!(workflow.stages[1].bucket(), "post_message");

        let receive: ReceiveStageConfig =
            serde_yaml::from_value(workflow.stages[0].config.clone()).unwrap();
        assert_eq!(receive.asn, "23907432");
        assert!(!receive.auto_handle_deviation);
    }
}
