use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::*;
use serde::Deserialize;

use screeneval::providers::{create_provider_with_overrides, ProviderOverrides};
use screeneval::report::{append_csv, build_report, write_report_json};
use screeneval::{media, ui, Assertion, ModelId, Orchestrator, RunConfig, Strategy};

mod args;
use args::CliArgs;

const DEFAULT_OUTPUT: &str = "screeneval-report.json";

#[derive(Debug, Clone, Copy)]
enum RunMode {
    Agentic,
    Fixed(Strategy),
}

#[tokio::main]
async fn main() -> Result<()> {
    ui::init_logging();
    let args = CliArgs::parse()?;

    let mode = match args.strategy.as_deref() {
        None => RunMode::Fixed(Strategy::TwoPass),
        Some("agentic") => RunMode::Agentic,
        Some(other) => RunMode::Fixed(other.parse()?),
    };

    let file_cfg = screeneval::FileConfig::load().ok();
    let mut cfg = RunConfig::default();
    if let Some(max_frames) = args
        .max_frames
        .or(file_cfg.as_ref().and_then(|c| c.max_frames))
    {
        cfg.max_frames = max_frames;
    }
    if let Some(max_turns) = args
        .max_turns
        .or(file_cfg.as_ref().and_then(|c| c.max_turns))
    {
        cfg.max_turns = max_turns;
    }
    if let Some(fps) = args.fps.or(file_cfg.as_ref().and_then(|c| c.fps)) {
        cfg.fps = fps;
    }

    let provider = create_provider_with_overrides(ProviderOverrides {
        model: args.model.clone().map(ModelId::new),
        timeout_secs: file_cfg.as_ref().and_then(|c| c.timeout_secs),
    })?;
    cfg = cfg.with_model(provider.model().clone());
    if let Some(max_tokens) = file_cfg.as_ref().and_then(|c| c.max_tokens) {
        cfg.max_tokens = max_tokens;
    }

    let video = Path::new(&args.video);
    let assertions = load_assertions(Path::new(&args.assertions))?;
    if assertions.is_empty() {
        anyhow::bail!("No assertions found in {}", args.assertions);
    }

    if !args.quiet {
        println!(
            "{} {} | {} | {} assertions",
            ">>".bold(),
            "screeneval".bold(),
            format!("{}/{}", provider.name(), provider.model()).cyan(),
            assertions.len()
        );
    }

    let frames = media::extract_frames(video, cfg.fps)?;
    if frames.is_empty() {
        anyhow::bail!("No frames extracted from {}", video.display());
    }
    if !args.quiet {
        println!(
            "{} {} frames at {} fps",
            "●".dimmed(),
            frames.len(),
            cfg.fps
        );
    }
    let metadata = media::probe_metadata(video, cfg.fps);

    let result = match mode {
        RunMode::Agentic => {
            Orchestrator::new(provider.as_ref(), &cfg, &frames, &assertions)
                .run()
                .await?
        }
        RunMode::Fixed(strategy) => {
            screeneval::run_strategy(strategy, provider.as_ref(), &cfg, &frames, &assertions)
                .await?
        }
    };

    let report = build_report(metadata, &assertions, &result);

    let output = args.output.as_deref().unwrap_or(DEFAULT_OUTPUT);
    write_report_json(Path::new(output), &report)?;
    if let Some(csv) = args.csv.as_deref() {
        append_csv(Path::new(csv), &report)?;
    }

    if !args.quiet {
        ui::print_summary(&report);
        println!("{} report written to {}", "●".dimmed(), output);
    }

    Ok(())
}

/// Assertion inputs come either as a flat array of assertions or as a
/// document of test steps each carrying its assertions.
fn load_assertions(path: &Path) -> Result<Vec<Assertion>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let input: AssertionInput =
        serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))?;

    Ok(match input {
        AssertionInput::Flat(assertions) => assertions,
        AssertionInput::Steps { test_steps } => test_steps
            .into_iter()
            .flat_map(|step| {
                let step_id = step.id;
                let step_desc = step.description;
                step.assertions.into_iter().map(move |mut a| {
                    if a.test_step_id.is_none() {
                        a.test_step_id = Some(step_id.clone());
                    }
                    if a.test_step_description.is_none() {
                        a.test_step_description = step_desc.clone();
                    }
                    a
                })
            })
            .collect(),
    })
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AssertionInput {
    Flat(Vec<Assertion>),
    Steps {
        #[serde(rename = "testSteps")]
        test_steps: Vec<TestStepInput>,
    },
}

#[derive(Debug, Deserialize)]
struct TestStepInput {
    id: String,
    #[serde(default)]
    description: Option<String>,
    assertions: Vec<Assertion>,
}
