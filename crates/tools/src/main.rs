use std::env;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use streaming::RetryPolicy;
use tools::{DataLocation, Script, StoryFile, load_chapter_data, outline, replay};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Validate, prefetch and replay scroll-driven map stories")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a story file and print its chapter outline.
    Validate { story: PathBuf },
    /// Fetch every chapter's data file once and report feature counts.
    Prefetch {
        story: PathBuf,
        #[command(flatten)]
        data: DataArgs,
    },
    /// Run a signal script through the engine and print the trace as JSON lines.
    Replay {
        story: PathBuf,
        script: PathBuf,
        #[command(flatten)]
        data: DataArgs,
        /// Also print every map surface call.
        #[arg(long)]
        surface_calls: bool,
    },
}

#[derive(clap::Args, Debug)]
struct DataArgs {
    /// Local directory holding chapter data files (env: STORY_DATA_ROOT).
    #[arg(long)]
    data_root: Option<PathBuf>,
    /// Base URL for chapter data files (env: STORY_DATA_URL).
    #[arg(long)]
    data_url: Option<String>,
    #[arg(long, default_value_t = 3)]
    retries: u32,
    #[arg(long, default_value_t = 10_000)]
    timeout_ms: u64,
}

impl DataArgs {
    fn location(&self) -> Option<DataLocation> {
        DataLocation::resolve(
            self.data_root.clone(),
            self.data_url.clone(),
            env::var("STORY_DATA_ROOT").ok(),
            env::var("STORY_DATA_URL").ok(),
        )
    }

    fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.retries.max(1),
            attempt_timeout: Duration::from_millis(self.timeout_ms),
            ..RetryPolicy::default()
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = real_main(Args::parse()).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn real_main(args: Args) -> Result<(), String> {
    match args.command {
        Command::Validate { story } => cmd_validate(story),
        Command::Prefetch { story, data } => cmd_prefetch(story, data).await,
        Command::Replay {
            story,
            script,
            data,
            surface_calls,
        } => cmd_replay(story, script, data, surface_calls).await,
    }
}

fn cmd_validate(story: PathBuf) -> Result<(), String> {
    let (catalog, tuning) = StoryFile::load(&story)?.into_catalog()?;
    for line in outline(&catalog) {
        println!("{line}");
    }
    eprintln!(
        "{} chapters ok (fingerprint={}, debounce={}ms)",
        catalog.len(),
        catalog.fingerprint(),
        tuning.debounce_ms
    );
    Ok(())
}

async fn cmd_prefetch(story: PathBuf, data: DataArgs) -> Result<(), String> {
    let (catalog, _) = StoryFile::load(&story)?.into_catalog()?;
    let location = data
        .location()
        .ok_or("prefetch requires --data-root, --data-url, STORY_DATA_ROOT or STORY_DATA_URL")?;

    let loaded = load_chapter_data(&catalog, location.source(), data.retry()).await;
    let mut empty = 0;
    for (chapter, fc) in &loaded {
        println!("{chapter}\t{}", fc.len());
        if fc.is_empty() {
            empty += 1;
        }
    }
    eprintln!("{} chapters fetched, {empty} empty", loaded.len());
    Ok(())
}

async fn cmd_replay(
    story: PathBuf,
    script: PathBuf,
    data: DataArgs,
    surface_calls: bool,
) -> Result<(), String> {
    let (catalog, tuning) = StoryFile::load(&story)?.into_catalog()?;
    let raw = std::fs::read_to_string(&script).map_err(|e| format!("read {script:?}: {e}"))?;
    let script = Script::from_json_str(&raw)?;

    let chapter_data = match data.location() {
        Some(location) => load_chapter_data(&catalog, location.source(), data.retry()).await,
        None => Vec::new(),
    };

    let result = replay(catalog, tuning, &script, chapter_data);
    for event in &result.trace {
        let line = serde_json::to_string(event).map_err(|e| format!("json: {e}"))?;
        println!("{line}");
    }
    if surface_calls {
        for call in &result.surface_calls {
            let line = serde_json::to_string(call).map_err(|e| format!("json: {e}"))?;
            println!("{line}");
        }
    }

    for (name, value) in &result.counters {
        info!("{name}={value}");
    }
    eprintln!(
        "replayed {} steps, {} events, finished at {}ms",
        script.steps.len(),
        result.trace.len(),
        result.finished_at.0
    );
    Ok(())
}
