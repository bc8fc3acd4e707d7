//! Validation reports
//!
//! Two renderings of one [`Diagnostics`] collection: a human-readable block
//! per finding, and a machine-readable object for CI tooling.

use serde::Serialize;

use crate::diagnostics::{Diagnostic, Diagnostics, Severity};

fn glyph(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "✖",
        Severity::Warning => "⚠",
    }
}

/// Multi-line report: severity glyph, code and message, then path and hint
/// indented below, closed by a summary line.
pub fn render_text(diags: &Diagnostics, warnings_as_errors: bool) -> String {
    let mut out = String::new();

    for item in diags.errors().chain(diags.warnings()) {
        out.push_str(&format!("{} [{}] {}\n", glyph(item.severity), item.code, item.message));
        if let Some(path) = &item.path {
            out.push_str(&format!("   at {}\n", path));
        }
        if let Some(hint) = &item.hint {
            out.push_str(&format!("   hint: {}\n", hint));
        }
        out.push('\n');
    }

    let summary = diags.summary(warnings_as_errors);
    let verdict = if summary.success { "✔ passed" } else { "✖ failed" };
    out.push_str(&format!(
        "{}: {} error(s), {} warning(s)\n",
        verdict, summary.error_count, summary.warning_count
    ));
    out
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonReport<'a> {
    success: bool,
    error_count: usize,
    warning_count: usize,
    total_count: usize,
    errors: Vec<&'a Diagnostic>,
    warnings: Vec<&'a Diagnostic>,
}

/// `{ success, errorCount, warningCount, totalCount, errors, warnings }`
pub fn to_json(diags: &Diagnostics, warnings_as_errors: bool) -> serde_json::Value {
    let summary = diags.summary(warnings_as_errors);
    let report = JsonReport {
        success: summary.success,
        error_count: summary.error_count,
        warning_count: summary.warning_count,
        total_count: summary.total_count,
        errors: diags.errors().collect(),
        warnings: diags.warnings().collect(),
    };
    serde_json::to_value(report).unwrap_or(serde_json::Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Finding;

    fn sample() -> Diagnostics {
        let mut diags = Diagnostics::new();
        diags.report(
            Finding::NoLatestVersion {
                project: "guide".into(),
            },
            "projects[0].versions",
        );
        diags.report(
            Finding::UnknownVersion {
                document: "intro".into(),
                version: "v9".into(),
            },
            "projects[0].documents[0].versions[1]",
        );
        diags
    }

    #[test]
    fn test_text_report_lists_errors_first() {
        let text = render_text(&sample(), false);
        let error_at = text.find("✖ [REF_UNKNOWN_VERSION]").unwrap();
        let warning_at = text.find("⚠ [REF_NO_LATEST_VERSION]").unwrap();
        assert!(error_at < warning_at);
        assert!(text.contains("   at projects[0].documents[0].versions[1]"));
        assert!(text.trim_end().ends_with("✖ failed: 1 error(s), 1 warning(s)"));
    }

    #[test]
    fn test_json_report_shape() {
        let value = to_json(&sample(), false);
        assert_eq!(value["success"], false);
        assert_eq!(value["errorCount"], 1);
        assert_eq!(value["warningCount"], 1);
        assert_eq!(value["totalCount"], 2);
        assert_eq!(value["errors"][0]["code"], "REF_UNKNOWN_VERSION");
        assert_eq!(value["warnings"][0]["severity"], "warning");
        assert_eq!(value["errors"][0]["path"], "projects[0].documents[0].versions[1]");
    }

    #[test]
    fn test_clean_run() {
        let empty = Diagnostics::new();
        assert_eq!(render_text(&empty, true), "✔ passed: 0 error(s), 0 warning(s)\n");
        assert_eq!(to_json(&empty, true)["success"], true);
    }
}
