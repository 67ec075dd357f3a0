//! Output formatting for the final report.

use crate::model::RunReport;

const RULE: &str = "==============================";

/// Final banner with deleted/failed/kept counts.
pub(super) fn format_banner(report: &RunReport) -> String {
    let kept = match &report.kept {
        Some(id) => format!("{} ({id})", report.kept_count()),
        None => "0".to_string(),
    };

    let mut lines = vec![RULE.to_string()];
    if report.dry_run {
        lines.push(format!("Would delete: {}", report.planned.len()));
    } else {
        lines.push(format!("Deleted: {}", report.deleted));
        lines.push(format!("Failed:  {}", report.failed));
    }
    lines.push(format!("Kept:    {kept}"));
    lines.push(RULE.to_string());
    lines.join("\n")
}

/// How long the run took, e.g. `12.3s`.
pub(super) fn format_elapsed(report: &RunReport) -> String {
    let elapsed = report.finished_at.duration_since(report.started_at);
    format!("{:.1}s", elapsed.as_secs_f64())
}
