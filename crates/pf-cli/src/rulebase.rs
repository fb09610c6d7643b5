use std::fs;
use std::path::Path;
use std::time::Instant;

use clap::ValueEnum;
use pf_compiler::{BuildReport, CompilerConfig, KeywordRanker, RuleSetBuilder};
use pf_core::CompiledRuleBase;

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum Rank {
    /// Keep rule source order
    #[default]
    FileOrder,
    /// Keyword-weighted priority
    Keyword,
}

pub struct CompileOutput {
    pub rulebase: CompiledRuleBase,
    pub report: BuildReport,
    pub total_ms: f64,
}

pub fn load_config(path: Option<&str>) -> Result<CompilerConfig, String> {
    match path {
        Some(path) => CompilerConfig::load(path).map_err(|e| e.to_string()),
        None => Ok(CompilerConfig::default()),
    }
}

pub fn compile_rulebase(
    inputs: &[String],
    config: &CompilerConfig,
    rank: Rank,
    verbose: bool,
) -> Result<CompileOutput, String> {
    if inputs.is_empty() {
        return Err("No input files specified".to_string());
    }

    let start = Instant::now();
    let builder = RuleSetBuilder::from_config(config).map_err(|e| e.to_string())?;
    let mut builder = match rank {
        Rank::FileOrder => builder,
        Rank::Keyword => {
            let ranker = KeywordRanker::from_policy(builder.policy());
            builder.with_ranker(ranker)
        }
    };

    for (index, path) in inputs.iter().enumerate() {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read '{}': {}", path, e))?;

        let accepted_before = builder.drops().accepted;
        builder.add_source(&content);

        if verbose {
            println!(
                "  [{}] {} - {} lines, {} rules",
                index,
                Path::new(path).file_name().unwrap_or_default().to_string_lossy(),
                content.lines().count(),
                builder.drops().accepted - accepted_before
            );
        }
    }

    let (rulebase, report) = builder.build().map_err(|e| e.to_string())?;

    Ok(CompileOutput {
        rulebase,
        report,
        total_ms: start.elapsed().as_secs_f64() * 1000.0,
    })
}

pub fn write_rulebase(path: &Path, rulebase: &CompiledRuleBase) -> Result<(), String> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create '{}': {}", parent.display(), e))?;
    }
    let json = rulebase.to_json().map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("Failed to write '{}': {}", path.display(), e))
}

pub fn write_report(path: &Path, report: &BuildReport) -> Result<(), String> {
    let json = serde_json::to_string_pretty(report).map_err(|e| e.to_string())?;
    fs::write(path, json).map_err(|e| format!("Failed to write '{}': {}", path.display(), e))?;
    log::info!("wrote build report to {}", path.display());
    Ok(())
}

pub fn read_rulebase(path: &Path) -> Result<CompiledRuleBase, String> {
    let json = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read '{}': {}", path.display(), e))?;
    CompiledRuleBase::from_json(&json)
        .map_err(|e| format!("Invalid rule base '{}': {}", path.display(), e))
}

/// Load a compiled rule base, or compile one from rule sources.
pub fn obtain_rulebase(
    rulebase: Option<&str>,
    inputs: &[String],
    config: Option<&str>,
) -> Result<CompiledRuleBase, String> {
    match rulebase {
        Some(path) => read_rulebase(Path::new(path)),
        None => {
            let config = load_config(config)?;
            Ok(compile_rulebase(inputs, &config, Rank::FileOrder, false)?.rulebase)
        }
    }
}
