use anyhow::{anyhow, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct CliArgs {
    pub video: String,            // -v/--video
    pub assertions: String,       // -a/--assertions
    pub strategy: Option<String>, // -s/--strategy
    pub model: Option<String>,    // -m/--model
    pub fps: Option<f64>,         // --fps
    pub max_frames: Option<usize>, // --max-frames
    pub max_turns: Option<usize>, // --max-turns
    pub output: Option<String>,   // -o/--output
    pub csv: Option<String>,      // --csv
    pub quiet: bool,              // -q/--quiet
}

impl CliArgs {
    /// Parse command-line arguments
    pub fn parse() -> Result<Self> {
        let args: Vec<String> = env::args().collect();
        Self::parse_from(&args[1..])
    }

    /// Parse from a slice of arguments (for testing)
    pub fn parse_from(args: &[String]) -> Result<Self> {
        let mut video = None;
        let mut assertions = None;
        let mut result = CliArgs {
            video: String::new(),
            assertions: String::new(),
            strategy: None,
            model: None,
            fps: None,
            max_frames: None,
            max_turns: None,
            output: None,
            csv: None,
            quiet: false,
        };

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];

            match arg.as_str() {
                "-v" | "--video" => {
                    video = Some(take_value(args, &mut i, arg)?);
                }
                "-a" | "--assertions" => {
                    assertions = Some(take_value(args, &mut i, arg)?);
                }
                "-s" | "--strategy" => {
                    result.strategy = Some(take_value(args, &mut i, arg)?);
                }
                "-m" | "--model" => {
                    result.model = Some(take_value(args, &mut i, arg)?);
                }
                "--fps" => {
                    let raw = take_value(args, &mut i, arg)?;
                    result.fps = Some(
                        raw.parse()
                            .map_err(|_| anyhow!("--fps expects a number, got: {raw}"))?,
                    );
                }
                "--max-frames" => {
                    let raw = take_value(args, &mut i, arg)?;
                    result.max_frames = Some(
                        raw.parse()
                            .map_err(|_| anyhow!("--max-frames expects an integer, got: {raw}"))?,
                    );
                }
                "--max-turns" => {
                    let raw = take_value(args, &mut i, arg)?;
                    result.max_turns = Some(
                        raw.parse()
                            .map_err(|_| anyhow!("--max-turns expects an integer, got: {raw}"))?,
                    );
                }
                "-o" | "--output" => {
                    result.output = Some(take_value(args, &mut i, arg)?);
                }
                "--csv" => {
                    result.csv = Some(take_value(args, &mut i, arg)?);
                }
                "-q" | "--quiet" => {
                    result.quiet = true;
                }
                unknown => {
                    return Err(anyhow!("Unknown argument: {unknown}"));
                }
            }

            i += 1;
        }

        result.video = video.ok_or_else(|| anyhow!("-v/--video is required"))?;
        result.assertions = assertions.ok_or_else(|| anyhow!("-a/--assertions is required"))?;

        Ok(result)
    }
}

fn take_value(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    *i += 1;
    if *i >= args.len() {
        return Err(anyhow!("{flag} requires a value"));
    }
    Ok(args[*i].clone())
}
