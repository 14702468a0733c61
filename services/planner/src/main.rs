//! Command-line planner.
//!
//! Builds one plan from a catalog file and a profile given either as a JSON
//! file or as individual flags, and writes the plan JSON to stdout or a file.

use anyhow::{Context, Result};
use clap::Parser;
use kidplan_core::{
    Catalog, PlanOutput, Planner,
    history::{HistorySource, NoHistory, StaticHistory},
    llm_client::{Provider, generator_for},
    prompts::PromptTemplates,
};
use serde_json::{Map, Value, json};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "kidplan", version)]
#[command(about = "Builds a four-week learning plan for a child", long_about = None)]
struct Cli {
    /// Topic catalog: a JSON array of topics or an object with a `topics` array.
    #[arg(long, env = "CATALOG_PATH", default_value = "./data/topics.json")]
    catalog: PathBuf,

    /// Profile JSON object. Replaces the individual profile flags.
    #[arg(long, conflicts_with_all = ["name", "age", "interests", "style", "plan_type", "completed"])]
    profile: Option<PathBuf>,

    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    age: Option<u32>,
    /// Repeat for several interests.
    #[arg(long = "interest")]
    interests: Vec<String>,
    /// visual, auditory, kinesthetic or hybrid.
    #[arg(long)]
    style: Option<String>,
    /// online, offline or hybrid.
    #[arg(long)]
    plan_type: Option<String>,
    /// Topic already completed; repeat for several.
    #[arg(long)]
    completed: Vec<String>,

    /// JSON object mapping child names to completed topic lists.
    #[arg(long, env = "HISTORY_PATH")]
    history: Option<PathBuf>,

    /// openai, gemini or disabled.
    #[arg(long, env = "LLM_PROVIDER", default_value = "disabled")]
    provider: String,
    #[arg(long, env = "CHAT_MODEL", default_value = "gpt-4o")]
    model: String,
    #[arg(long, env = "LLM_TIMEOUT_SECS", default_value_t = 20)]
    timeout_secs: u64,
    #[arg(long, env = "PROMPTS_PATH", default_value = "./prompts")]
    prompts: PathBuf,

    /// Output file. Defaults to stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Cli {
    /// The raw profile object handed to the planner.
    fn profile_input(&self) -> Result<Value> {
        if let Some(path) = &self.profile {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read profile file {}", path.display()))?;
            return serde_json::from_str(&raw)
                .with_context(|| format!("Profile file {} is not valid JSON", path.display()));
        }

        let mut input = Map::new();
        if let Some(name) = &self.name {
            input.insert("child_name".into(), json!(name));
        }
        if let Some(age) = self.age {
            input.insert("child_age".into(), json!(age));
        }
        if !self.interests.is_empty() {
            input.insert("interests".into(), json!(self.interests));
        }
        if let Some(style) = &self.style {
            input.insert("preferred_learning_style".into(), json!(style));
        }
        if let Some(plan_type) = &self.plan_type {
            input.insert("plan_type".into(), json!(plan_type));
        }
        if !self.completed.is_empty() {
            input.insert("completed_topics".into(), json!(self.completed));
        }
        Ok(Value::Object(input))
    }

    fn history(&self) -> Result<Arc<dyn HistorySource>> {
        Ok(match &self.history {
            Some(path) => Arc::new(StaticHistory::from_path(path)?),
            None => Arc::new(NoHistory),
        })
    }
}

fn api_key_for(provider: Provider) -> Option<String> {
    let var = match provider {
        Provider::OpenAI => "OPENAI_API_KEY",
        Provider::Gemini => "GEMINI_API_KEY",
        Provider::Disabled => return None,
    };
    std::env::var(var).ok()
}

async fn run(cli: &Cli) -> Result<PlanOutput> {
    let catalog = Catalog::load_or_empty(&cli.catalog);

    let provider = Provider::parse(&cli.provider);
    let api_key = api_key_for(provider);
    let generator = generator_for(provider, api_key.as_deref(), &cli.model)?;

    let planner = Planner::new(
        Arc::new(catalog),
        cli.history()?,
        generator,
        PromptTemplates::from_dir_or_default(&cli.prompts),
        Duration::from_secs(cli.timeout_secs),
    );

    let input = cli.profile_input()?;
    Ok(planner.plan_from_input(&input).await?)
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output = run(&cli).await?;
    let rendered = serde_json::to_string_pretty(&output)?;

    match &cli.out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Failed to write plan to {}", path.display()))?;
            info!(path = %path.display(), confidence = ?output.confidence, "Plan written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
