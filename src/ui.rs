use colored::*;

use crate::report::Report;
use crate::verdict::Verdict;

pub fn init_logging() {
    // Internal logs are opt-in via RUST_LOG. Console output stays separate.
    let mut builder = env_logger::Builder::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        builder.filter_level(log::LevelFilter::Warn);
    }
    let _ = builder.try_init();
}

pub fn print_summary(report: &Report) {
    let mut pass = 0usize;
    let mut fail = 0usize;
    let mut uncertain = 0usize;

    for step in &report.test_steps {
        if let Some(desc) = step.description.as_deref().or(step.id.as_deref()) {
            println!("\n{} {}", "▸".bold(), desc.bold());
        }
        for a in &step.assertions {
            let (mark, count) = match a.verdict {
                Verdict::Pass => ("✓".green().bold(), &mut pass),
                Verdict::Fail => ("✗".red().bold(), &mut fail),
                Verdict::Uncertain => ("?".yellow().bold(), &mut uncertain),
            };
            *count += 1;
            println!(
                "  {} [{}] {} {}",
                mark,
                a.id.as_str().dimmed(),
                a.text,
                format!("({:.0}%)", a.confidence * 100.0).dimmed()
            );
        }
    }

    println!(
        "\n{} {} passed, {} failed, {} uncertain",
        "●".bold(),
        pass.to_string().green(),
        fail.to_string().red(),
        uncertain.to_string().yellow()
    );
}
