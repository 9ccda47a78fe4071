use std::env;
use std::fs;
use std::path::Path;

use anyhow::anyhow;
use datatest_stable::{harness, Result};
use fs_extra::dir::CopyOptions;
use serde::Deserialize;
use tempfile::tempdir;

use absint_engine::analysis::value::TargetKind;
use absint_engine::error::EngineResult;
use absint_engine::ir::adapter::eog::Graph;
use absint_engine::ir::bridge;
use absint_engine::{Evaluation, Evaluator, LatticeInterval};
use absint_shared::logging::{self, Verbosity};

/// Evaluate from an explicit start node instead of the declaration
#[derive(Deserialize)]
struct Manual {
    name: String,
    start: usize,
    ty: String,
    #[serde(default)]
    seed: Option<LatticeInterval>,
}

#[derive(Deserialize)]
struct Case {
    graph: Graph,
    target: usize,
    #[serde(default)]
    manual: Option<Manual>,
    /// interval expected at the target, checked on success
    #[serde(default)]
    expect: Option<LatticeInterval>,
}

fn workflow(case: &Case) -> EngineResult<Evaluation> {
    let graph = bridge::convert(&case.graph)?;
    let missing = |id: usize| {
        absint_engine::EngineError::InvalidAssumption(format!("no node with id {}", id))
    };
    let target = bridge::locate(&case.graph, case.target).ok_or_else(|| missing(case.target))?;

    let evaluator = Evaluator::new(&graph);
    match &case.manual {
        None => evaluator.inspect(target),
        Some(manual) => {
            let start =
                bridge::locate(&case.graph, manual.start).ok_or_else(|| missing(manual.start))?;
            evaluator.run(
                &manual.name.as_str().into(),
                start,
                target,
                TargetKind::from_type_name(&manual.ty)?,
                manual.seed.unwrap_or(LatticeInterval::Bottom),
            )
        }
    }
}

fn run_test(path_output: &Path) -> Result<()> {
    // config based on environment variable
    let keep = env::var("KEEP").map_or(false, |v| v == "1");
    let verbosity = Verbosity::from_env()?;
    if verbosity != Verbosity::Quiet {
        // the logger may already be installed by another case
        let _ = logging::setup(verbosity);
    }

    // load the expected result
    let expected = fs::read_to_string(path_output)?;
    let expected = expected.trim_end();

    // setup the directories
    let path_dir = path_output
        .parent()
        .ok_or_else(|| anyhow!("unable to locate the test case directory"))?;
    let path_artifact = path_dir.join("testing");
    if path_artifact.exists() {
        fs::remove_dir_all(&path_artifact)?;
    }

    // load the case
    let content = fs::read_to_string(path_dir.join("case.json"))?;
    let case: Case = serde_json::from_str(&content)?;

    let temp = tempdir()?;
    let success = match workflow(&case) {
        Ok(evaluation) => {
            fs::write(
                temp.path().join("evaluation.json"),
                serde_json::to_string_pretty(&evaluation)?,
            )?;
            if !expected.is_empty() {
                println!(
                    "Analysis succeeded while failure is expected:\n{}",
                    expected
                );
                false
            } else if case.expect.map_or(false, |v| v != evaluation.value) {
                println!(
                    "Interval mismatch: obtained {} after {} visits",
                    evaluation.value, evaluation.steps
                );
                false
            } else {
                if matches!(verbosity, Verbosity::Verbose | Verbosity::Extensive) {
                    println!(
                        "Interval {} after {} visits",
                        evaluation.value, evaluation.steps
                    );
                }
                true
            }
        }
        Err(err) => {
            let obtained = err.to_string();
            if expected.is_empty() {
                println!("Analysis failed while success is expected:\n{}", obtained);
                false
            } else if expected != obtained {
                println!(
                    "Error message mismatch:\n{}\n<- expected vs obtained ->\n{}",
                    expected, obtained
                );
                false
            } else {
                true
            }
        }
    };

    // save the workspace if on verbose mode or on failed test cases, if requested
    if matches!(verbosity, Verbosity::Extensive) || (keep && !success) {
        fs::create_dir(&path_artifact)?;
        let options = CopyOptions {
            content_only: true,
            ..Default::default()
        };
        fs_extra::dir::copy(temp.path(), &path_artifact, &options)?;
    }

    temp.close()?;

    if success {
        Ok(())
    } else {
        Err(anyhow!("result does not match with expectation").into())
    }
}

harness!(run_test, "tests/cases", r"output$");
