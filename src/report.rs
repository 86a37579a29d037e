use std::fs::{self, OpenOptions};
use std::io::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::media::VideoMetadata;
use crate::types::AssertionId;
use crate::verdict::{Assertion, Evidence, PipelineResult, Verdict};

/// The run's final JSON document: evaluations mapped back onto the input
/// assertions and grouped by test step.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub video_metadata: VideoMetadata,
    pub test_steps: Vec<TestStepReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStepReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub assertions: Vec<AssertionReport>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssertionReport {
    pub id: AssertionId,
    pub text: String,
    pub verdict: Verdict,
    pub confidence: f64,
    pub explanation: String,
    pub evidence: Vec<Evidence>,
}

/// Group by test step, preserving the order steps first appear in the
/// input. Assertions the model never addressed render as `uncertain` with
/// zero confidence so every input assertion shows up in the report.
pub fn build_report(
    metadata: VideoMetadata,
    assertions: &[Assertion],
    result: &PipelineResult,
) -> Report {
    let mut steps: Vec<TestStepReport> = Vec::new();

    for assertion in assertions {
        let entry = match result.evaluations.get(&assertion.id) {
            Some(eval) => AssertionReport {
                id: assertion.id.clone(),
                text: assertion.text.clone(),
                verdict: eval.verdict,
                confidence: eval.confidence,
                explanation: eval.explanation.clone(),
                evidence: eval.evidence.clone(),
            },
            None => AssertionReport {
                id: assertion.id.clone(),
                text: assertion.text.clone(),
                verdict: Verdict::Uncertain,
                confidence: 0.0,
                explanation: "Not evaluated.".to_string(),
                evidence: Vec::new(),
            },
        };

        match steps.iter().position(|s| s.id == assertion.test_step_id) {
            Some(pos) => steps[pos].assertions.push(entry),
            None => steps.push(TestStepReport {
                id: assertion.test_step_id.clone(),
                description: assertion.test_step_description.clone(),
                assertions: vec![entry],
            }),
        }
    }

    Report {
        video_metadata: metadata,
        test_steps: steps,
    }
}

pub fn write_report_json(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let json = serde_json::to_string_pretty(report)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

/// Append one CSV line per assertion to a run log, writing the header when
/// the file is new.
pub fn append_csv(path: &Path, report: &Report) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let new_file = !path.exists();
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    if new_file {
        writeln!(file, "testStepId,assertionId,text,verdict,confidence,explanation")?;
    }

    for step in &report.test_steps {
        let step_id = step.id.as_deref().unwrap_or("");
        for a in &step.assertions {
            writeln!(
                file,
                "{},{},{},{},{},{}",
                csv_field(step_id),
                csv_field(a.id.as_str()),
                csv_field(&a.text),
                csv_field(match a.verdict {
                    Verdict::Pass => "pass",
                    Verdict::Fail => "fail",
                    Verdict::Uncertain => "uncertain",
                }),
                a.confidence,
                csv_field(&a.explanation),
            )?;
        }
    }

    Ok(())
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}
