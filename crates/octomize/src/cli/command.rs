use crate::config::Config;
use crate::console::Console;
use crate::plan::Plan;
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::{debug, info};
use shared::client::OctomizeClient;
use shared::form::{CatalogStatus, FormEvent, FormState};
use shared::models::ActionKind;
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Optimization service URL (overrides config)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds (overrides config)
    #[arg(long, global = true)]
    pub timeout_secs: Option<u64>,

    /// Log level
    #[arg(long, global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the available hardware targets
    Hardware {
        /// Only show instances of this provider
        #[arg(long)]
        provider: Option<String>,
    },
    /// Preview how many runs a plan starts
    Runs {
        /// Plan file (TOML)
        #[arg(short = 'p', long)]
        plan: PathBuf,
    },
    /// Submit a plan to the optimization service
    Submit {
        /// Plan file (TOML)
        #[arg(short = 'p', long)]
        plan: PathBuf,

        /// Print the requests without sending them
        #[arg(long, default_value = "false")]
        dry_run: bool,
    },
}

impl Cli {
    pub fn config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        if let Some(api_url) = &self.api_url {
            config = config.with_api_url(api_url.clone());
        }
        if let Some(timeout_secs) = self.timeout_secs {
            config = config.with_timeout_secs(timeout_secs);
        }
        Ok(config)
    }

    pub async fn run(&self, cancellation_token: CancellationToken) -> Result<()> {
        let config = self.config()?;
        debug!("Using optimization service at {}", config.api_url);
        let client = OctomizeClient::new(config.api_url()?, config.timeout())
            .context("Failed to create API client")?;

        match &self.command {
            Commands::Hardware { provider } => {
                list_hardware(&client, provider.as_deref(), &cancellation_token).await
            }
            Commands::Runs { plan } => {
                let state = plan_state(&client, plan, &cancellation_token).await?;
                print_summary(&state);
                Ok(())
            }
            Commands::Submit { plan, dry_run } => {
                let state = plan_state(&client, plan, &cancellation_token).await?;
                submit(&client, state, *dry_run).await.map(|_| ())
            }
        }
    }
}

async fn load_form(
    client: &OctomizeClient,
    cancellation_token: &CancellationToken,
) -> Result<FormState> {
    let spinner = Console::spinner("Loading hardware targets");
    let load = client.load_catalog_until(cancellation_token).await;
    spinner.finish_and_clear();

    let Some(load) = load else {
        bail!("Cancelled before the hardware catalog loaded");
    };

    let form = FormState::new().apply(FormEvent::CatalogLoaded(load));
    match form.catalog() {
        CatalogStatus::Failed(reason) => bail!("Hardware catalog unavailable: {reason}"),
        CatalogStatus::Loaded(catalog) if catalog.is_empty() => {
            Console::warning("The service does not offer any hardware targets");
        }
        _ => {}
    }
    Ok(form)
}

async fn plan_state(
    client: &OctomizeClient,
    plan_path: &Path,
    cancellation_token: &CancellationToken,
) -> Result<FormState> {
    let plan = Plan::load(plan_path)?;
    let form = load_form(client, cancellation_token).await?;
    let state = plan
        .apply(&form)
        .with_context(|| format!("Invalid plan {}", plan_path.display()))?;
    Ok(state)
}

async fn list_hardware(
    client: &OctomizeClient,
    provider: Option<&str>,
    cancellation_token: &CancellationToken,
) -> Result<()> {
    let form = load_form(client, cancellation_token).await?;
    let CatalogStatus::Loaded(catalog) = form.catalog() else {
        bail!("Hardware catalog is not loaded");
    };

    let mut shown = 0;
    for name in catalog.providers() {
        if provider.is_some_and(|wanted| wanted != name) {
            continue;
        }
        Console::section(name);
        for (instance, specs) in catalog.instances(name) {
            Console::info(
                instance,
                &format!("{} vCPU, {} GiB", specs.cpu, specs.memory),
            );
            shown += 1;
        }
    }

    if shown == 0 {
        if let Some(provider) = provider {
            Console::warning(&format!("No hardware targets for provider {provider}"));
        }
    }
    Ok(())
}

fn print_summary(state: &FormState) {
    Console::section("Actions");
    for kind in ActionKind::ALL {
        let config = state.actions().get(kind);
        let value = if config.selected {
            config.engine.to_string()
        } else {
            "off".to_string()
        };
        Console::info(kind.as_str(), &value);
    }

    let runs = state.run_counts();
    Console::section("Total Runs");
    for selection in state.targets().selections() {
        let Some(instance) = selection.instance.as_deref() else {
            continue;
        };
        Console::info(
            instance,
            &format!(
                "{} cores, {} runs",
                selection.display_cpu(),
                runs.get(instance).unwrap_or_default()
            ),
        );
    }
    Console::info("Total", &runs.total().to_string());
}

/// Sends every run of `state`. Returns the number of calls made.
async fn submit(client: &OctomizeClient, state: FormState, dry_run: bool) -> Result<usize> {
    if !state.can_submit() {
        bail!(
            "Nothing to submit: the first target needs an instance and at least one action must be enabled"
        );
    }
    print_summary(&state);

    let state = state.apply(FormEvent::SubmissionStarted);
    let submissions = state.submissions();

    if dry_run {
        Console::section("Dry run");
        for submission in &submissions {
            let body = serde_json::to_string(&submission.request)?;
            Console::progress(&format!("POST /{} {body}", submission.kind));
        }
        return Ok(0);
    }

    let spinner = Console::spinner("Submitting runs");
    let result = client.submit_all(&submissions).await;
    spinner.finish_and_clear();

    match result {
        Ok(sent) => {
            info!("Submitted {sent} runs to {}", client.base_url());
            Console::success(&format!("Submitted {sent} runs"));
            Ok(sent)
        }
        Err(e) => {
            let state = state.apply(FormEvent::SubmissionFailed(e.status()));
            Console::error(state.error_message().unwrap_or("Submission failed"));
            Err(e).context("Submission failed")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Mock, Server, ServerGuard};
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const PLAN: &str = r#"
        [[targets]]
        provider = "AWS"
        instance = "m4.large"

        [[targets]]
        provider = "AWS"
        instance = "c5.xlarge"

        [benchmark]
        num_trials = 1
        runs_per_trial = 3
    "#;

    async fn hardware_server() -> (ServerGuard, Mock) {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/hardware")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!([
                    {"provider": "AWS", "instance": "m4.large", "cpu": 2, "memory": 8},
                    {"provider": "AWS", "instance": "c5.xlarge", "cpu": 4, "memory": 8}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        (server, mock)
    }

    fn plan_file() -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{PLAN}").unwrap();
        file
    }

    fn cli(server: &ServerGuard, args: &[&str]) -> Cli {
        let mut argv = vec![
            "octomize",
            "--config",
            "/nonexistent/octomize.toml",
            "--api-url",
        ];
        let url = server.url();
        argv.push(&url);
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_parse_submit() {
        let cli = Cli::try_parse_from(["octomize", "submit", "--plan", "plan.toml", "--dry-run"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Submit { dry_run: true, .. }
        ));
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "octomize",
            "--config",
            "/nonexistent/octomize.toml",
            "--api-url",
            "http://localhost:1",
            "--timeout-secs",
            "3",
            "hardware",
        ])
        .unwrap();
        let config = cli.config().unwrap();
        assert_eq!(config.api_url, "http://localhost:1");
        assert_eq!(config.timeout_secs, 3);
    }

    #[tokio::test]
    async fn test_submit_sends_one_call_per_target() {
        let (mut server, _hardware) = hardware_server().await;
        let benchmark = server
            .mock("POST", "/benchmark")
            .match_body(Matcher::PartialJson(json!({
                "engine": "ONNX!",
                "num_trials": 1,
                "runs_per_trial": 3
            })))
            .with_status(200)
            .expect(2)
            .create_async()
            .await;

        let file = plan_file();
        let path = file.path().to_str().unwrap().to_string();
        let cli = cli(&server, &["submit", "--plan", &path]);
        let Commands::Submit { plan, .. } = &cli.command else {
            unreachable!();
        };

        let config = cli.config().unwrap();
        let client = OctomizeClient::new(config.api_url().unwrap(), config.timeout()).unwrap();
        let state = plan_state(&client, plan, &CancellationToken::new())
            .await
            .unwrap();
        let sent = submit(&client, state, false).await.unwrap();
        assert_eq!(sent, 2);
        benchmark.assert_async().await;
    }

    #[tokio::test]
    async fn test_dry_run_sends_nothing() {
        let (mut server, _hardware) = hardware_server().await;
        let benchmark = server
            .mock("POST", "/benchmark")
            .expect(0)
            .create_async()
            .await;

        let file = plan_file();
        let path = file.path().to_str().unwrap().to_string();
        let cli = cli(&server, &["submit", "--plan", &path, "--dry-run"]);
        cli.run(CancellationToken::new()).await.unwrap();
        benchmark.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_submission_is_an_error() {
        let (mut server, _hardware) = hardware_server().await;
        let _mock = server
            .mock("POST", "/benchmark")
            .with_status(503)
            .create_async()
            .await;

        let file = plan_file();
        let path = file.path().to_str().unwrap().to_string();
        let cli = cli(&server, &["submit", "--plan", &path]);
        let err = cli.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("Submission failed"));
    }

    #[tokio::test]
    async fn test_failed_catalog_load_is_an_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/hardware")
            .with_status(500)
            .create_async()
            .await;

        let cli = cli(&server, &["hardware"]);
        let err = cli.run(CancellationToken::new()).await.unwrap_err();
        assert!(err.to_string().contains("Hardware catalog unavailable"));
    }

    #[tokio::test]
    async fn test_cancelled_load_is_an_error() {
        let (server, _hardware) = hardware_server().await;
        let token = CancellationToken::new();
        token.cancel();

        let cli = cli(&server, &["hardware"]);
        let err = cli.run(token).await.unwrap_err();
        assert!(err.to_string().contains("Cancelled"));
    }

    #[tokio::test]
    async fn test_runs_preview() {
        let (server, _hardware) = hardware_server().await;
        let file = plan_file();
        let path = file.path().to_str().unwrap().to_string();
        let cli = cli(&server, &["runs", "--plan", &path]);
        cli.run(CancellationToken::new()).await.unwrap();
    }
}
