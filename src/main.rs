use clap::{Args, Parser, Subcommand};
use datadog_mcp::app::App;
use datadog_mcp::collection::Collection;
use datadog_mcp::constants::defaults::DOCS_FILE;
use datadog_mcp::errors::ToolError;
use datadog_mcp::http::{HttpExecutor, HttpTransport, ReqwestTransport};
use datadog_mcp::mcp::server::{McpServer, SERVER_NAME, SERVER_VERSION};
use datadog_mcp::services::config::{Config, ConfigOverrides};
use datadog_mcp::services::docs::{render_list_json, render_list_text, render_markdown};
use datadog_mcp::services::logger::Logger;
use datadog_mcp::services::smoke::run_smoke_checks;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Parser)]
#[command(name = "datadog-mcp", version, about = "Datadog REST API as MCP tools over stdio")]
struct Cli {
    #[command(flatten)]
    shared: SharedFlags,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Args)]
struct SharedFlags {
    /// Path to the Datadog Postman collection
    #[arg(long, global = true)]
    schema: Option<PathBuf>,
    /// Comma-separated top-level folders to expose (`all` for every folder)
    #[arg(long, global = true)]
    folders: Option<String>,
    #[arg(long, global = true)]
    site: Option<String>,
    #[arg(long, global = true)]
    subdomain: Option<String>,
    #[arg(long, global = true)]
    max_retries: Option<u32>,
    #[arg(long, global = true)]
    retry_base_ms: Option<u64>,
    /// Ignore Retry-After and always use computed backoff
    #[arg(long, global = true)]
    no_retry_after: bool,
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,
    #[arg(long, global = true)]
    user_agent: Option<String>,
}

impl SharedFlags {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            schema_path: self.schema.clone(),
            folders: self.folders.clone(),
            site: self.site.clone(),
            subdomain: self.subdomain.clone(),
            max_retries: self.max_retries,
            retry_base_ms: self.retry_base_ms,
            no_retry_after: self.no_retry_after,
            timeout_ms: self.timeout_ms,
            user_agent: self.user_agent.clone(),
        }
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the MCP server on stdio (default)
    Serve,
    /// Print the tools that would be registered
    ListTools {
        #[arg(long)]
        json: bool,
    },
    /// Write a markdown reference of every tool
    DocumentTools {
        #[arg(long, default_value = DOCS_FILE)]
        output: PathBuf,
    },
    /// Show resolved configuration and collection diagnostics
    Doctor {
        #[arg(long)]
        json: bool,
        /// Also run the live smoke checks
        #[arg(long)]
        live: bool,
    },
    /// Call a few read-only endpoints with the configured credentials
    SmokeTest {
        #[arg(long)]
        json: bool,
    },
    /// Check that the collection exists and credentials are set
    Validate,
    Version,
}

fn print_json(value: &serde_json::Value) {
    println!(
        "{}",
        serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
    );
}

fn standalone_executor(config: &Config, logger: &Logger) -> Result<HttpExecutor, ToolError> {
    let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::new()?);
    Ok(
        HttpExecutor::new(transport, config.credentials.clone(), logger.clone())
            .with_site(&config.site, &config.subdomain)
            .with_defaults(config.request_policy()),
    )
}

async fn doctor(
    config: Config,
    logger: Logger,
    as_json: bool,
    live: bool,
) -> Result<bool, ToolError> {
    let validation = config.validate();
    let collection = match Collection::load(&config.schema_path) {
        Ok(collection) => {
            let folders = collection.top_level_folders();
            let app = App::from_collection(
                config.clone(),
                logger.clone(),
                &collection,
                Arc::new(ReqwestTransport::new()?),
            );
            json!({
                "loaded": true,
                "top_level_folders": folders,
                "tools": app.catalog.len(),
                "generated": app.index.len(),
            })
        }
        Err(err) => json!({"loaded": false, "error": err.to_string()}),
    };
    let mut ok = validation["ok"].as_bool().unwrap_or(false);
    let mut report = json!({
        "config": config.summary(),
        "validation": validation,
        "collection": collection,
    });
    if live {
        let smoke = run_smoke_checks(&standalone_executor(&config, &logger)?).await;
        ok = ok && smoke.ok;
        report["smoke"] = serde_json::to_value(&smoke)?;
    }
    report["log"] = logger.stats();
    report["ok"] = json!(ok);
    if as_json {
        print_json(&report);
    } else {
        let verdict = if ok { "OK" } else { "PROBLEMS FOUND" };
        println!("{} {} doctor: {}", SERVER_NAME, SERVER_VERSION, verdict);
        print_json(&report);
    }
    Ok(ok)
}

async fn run(cli: Cli) -> Result<bool, ToolError> {
    let config = Config::from_env().apply_overrides(&cli.shared.overrides());
    let mut logger = Logger::new(SERVER_NAME);
    logger.set_level(config.log_level);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let app = App::initialize(config, logger)?;
            McpServer::new(Arc::new(app)).run_stdio().await?;
            Ok(true)
        }
        Command::ListTools { json } => {
            let app = App::initialize(config, logger)?;
            if json {
                print_json(&render_list_json(&app.entries));
            } else {
                print!("{}", render_list_text(&app.entries));
            }
            Ok(true)
        }
        Command::DocumentTools { output } => {
            let app = App::initialize(config, logger.clone())?;
            std::fs::write(&output, render_markdown(&app.entries))?;
            logger.info(
                "Wrote tool reference",
                Some(&json!({"path": output.display().to_string(), "tools": app.entries.len()})),
            );
            Ok(true)
        }
        Command::Doctor { json, live } => doctor(config, logger, json, live).await,
        Command::SmokeTest { json } => {
            let report = run_smoke_checks(&standalone_executor(&config, &logger)?).await;
            if json {
                print_json(&serde_json::to_value(&report)?);
            } else {
                print!("{}", report.render_text());
            }
            Ok(report.ok)
        }
        Command::Validate => {
            let report = config.validate();
            print_json(&report);
            Ok(report["ok"].as_bool().unwrap_or(false))
        }
        Command::Version => {
            println!("{} {}", SERVER_NAME, SERVER_VERSION);
            Ok(true)
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(err) => {
            eprintln!("{}: {}", SERVER_NAME, err.message);
            if let Some(hint) = &err.hint {
                eprintln!("hint: {}", hint);
            }
            std::process::exit(1);
        }
    }
}
