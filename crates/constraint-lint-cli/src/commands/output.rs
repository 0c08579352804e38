//! Shared output formatting for validation results.

use anyhow::Result;
use constraint_lint_core::{EngineStats, Severity, ValidationResult, Violation};
use serde::Serialize;
use std::fmt::Write;

use crate::OutputFormat;

/// Print validation results in the specified format.
pub fn print(results: &[ValidationResult], stats: &EngineStats, format: OutputFormat) -> Result<()> {
    let rendered = match format {
        OutputFormat::Text => render_text(results, stats),
        OutputFormat::Json => render_json(results, stats)?,
        OutputFormat::Compact => render_compact(results),
    };
    print!("{rendered}");
    Ok(())
}

fn severity_label(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

/// Violations with their file attached, in result order.
fn violations_of(results: &[ValidationResult]) -> impl Iterator<Item = Violation> + '_ {
    results.iter().flat_map(|result| {
        result.violations().iter().map(move |v| match v.file {
            Some(_) => v.clone(),
            None => v.clone().with_file(result.file()),
        })
    })
}

fn render_text(results: &[ValidationResult], stats: &EngineStats) -> String {
    let mut out = String::new();
    let violations: Vec<Violation> = violations_of(results).collect();

    for severity in &Severity::ALL {
        for violation in violations.iter().filter(|v| v.severity == *severity) {
            let _ = writeln!(out, "{} at {}", violation.rule_id, violation.location());
            let _ = writeln!(out, "  {}: {}", severity_label(*severity), violation.message);
            if let Some(snippet) = &violation.snippet {
                let _ = writeln!(out, "  | {snippet}");
            }
            if let Some(suggestion) = &violation.suggestion {
                let _ = writeln!(out, "  = help: {suggestion}");
            }
            out.push('\n');
        }
    }

    let errors = stats.violations_of(Severity::Error);
    let warnings = stats.violations_of(Severity::Warning);
    let infos = stats.violations_of(Severity::Info);
    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };

    let _ = writeln!(
        out,
        "{}Found {} error(s), {} warning(s), {} info(s) in {} file(s)\x1b[0m",
        summary_color,
        errors,
        warnings,
        infos,
        results.len()
    );
    let _ = writeln!(
        out,
        "{} rule evaluation(s), {} cache hit(s), {:.2?} total",
        stats.rules_executed, stats.cache_hits, stats.total_execution_time
    );
    out
}

#[derive(Serialize)]
struct JsonReport<'a> {
    results: &'a [ValidationResult],
    stats: &'a EngineStats,
}

fn render_json(results: &[ValidationResult], stats: &EngineStats) -> Result<String> {
    let mut json = serde_json::to_string_pretty(&JsonReport { results, stats })?;
    json.push('\n');
    Ok(json)
}

fn render_compact(results: &[ValidationResult]) -> String {
    violations_of(results).fold(String::new(), |mut out, v| {
        let _ = writeln!(out, "{v}");
        out
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn results() -> Vec<ValidationResult> {
        vec![
            ValidationResult::new(
                "src/a.ts",
                vec![
                    Violation::new("no-console", Severity::Warning, "console call")
                        .at(3, 5)
                        .with_snippet("console.log(input);"),
                    Violation::new("must-extend-base", Severity::Error, "missing base class")
                        .with_suggestion("extend BaseActionPlugin"),
                ],
                Duration::from_millis(2),
            ),
            ValidationResult::new("src/b.ts", vec![], Duration::from_millis(1)),
        ]
    }

    fn stats() -> EngineStats {
        let mut stats = EngineStats {
            files_processed: 2,
            rules_executed: 4,
            total_violations: 2,
            ..EngineStats::default()
        };
        stats.violations_by_severity.insert(Severity::Error, 1);
        stats.violations_by_severity.insert(Severity::Warning, 1);
        stats
    }

    #[test]
    fn text_lists_errors_before_warnings() {
        let text = render_text(&results(), &stats());
        let error = text.find("must-extend-base at src/a.ts").unwrap();
        let warning = text.find("no-console at src/a.ts:3:5").unwrap();
        assert!(error < warning);
        assert!(text.contains("= help: extend BaseActionPlugin"));
        assert!(text.contains("  | console.log(input);"));
        assert!(text.contains("Found 1 error(s), 1 warning(s), 0 info(s) in 2 file(s)"));
    }

    #[test]
    fn compact_is_one_line_per_violation() {
        let compact = render_compact(&results());
        let lines: Vec<&str> = compact.lines().collect();
        assert_eq!(
            lines,
            vec![
                "src/a.ts:3:5: warning [no-console] console call",
                "src/a.ts: error [must-extend-base] missing base class",
            ]
        );
    }

    #[test]
    fn json_carries_results_and_stats() {
        let json = render_json(&results(), &stats()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["results"].as_array().unwrap().len(), 2);
        assert_eq!(value["stats"]["files_processed"], 2);
        assert_eq!(value["results"][0]["violations"][0]["rule_id"], "no-console");
    }
}
