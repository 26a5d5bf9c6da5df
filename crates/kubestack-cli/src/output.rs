//! Formatted output helpers for CLI commands.

use std::fmt::Write as _;

use kubestack_render::{ObjectKind, RenderPlan};
use kubestack_tfstate::ExtractedState;

/// Formats a plan as one line per object, grouped by kind in apply order,
/// followed by the objects it removes.
#[must_use]
pub fn plan_summary(plan: &RenderPlan) -> String {
    let mut out = String::new();
    for kind in ObjectKind::ALL {
        for object in plan.of_kind(kind) {
            let _ = writeln!(out, "  + {}", object.key());
        }
    }
    for key in plan.removals() {
        let _ = writeln!(out, "  - {key}");
    }
    let _ = writeln!(
        out,
        "{} object(s) to apply, {} to remove.",
        plan.len(),
        plan.removals().len()
    );
    out
}

/// Formats the records and skip counts of an extraction pass.
#[must_use]
pub fn extraction_summary(extracted: &ExtractedState) -> String {
    let mut out = String::new();
    for (app, resources) in &extracted.applications {
        let _ = writeln!(out, "{app}:");
        for record in &resources.shared_resources {
            let _ = writeln!(out, "  {} (shared): {}", record.resource_name, keys(&record.data));
        }
        for (service, records) in &resources.service_resources {
            for record in records {
                let _ = writeln!(out, "  {} ({service}): {}", record.resource_name, keys(&record.data));
            }
        }
    }
    let report = &extracted.report;
    let _ = write!(out, "{} extracted, {} skipped", report.extracted, report.total_skipped());
    if !report.skipped.is_empty() {
        let reasons: Vec<String> = report
            .skipped
            .iter()
            .map(|(reason, count)| format!("{reason}: {count}"))
            .collect();
        let _ = write!(out, " ({})", reasons.join(", "));
    }
    out.push('\n');
    out
}

fn keys(data: &std::collections::BTreeMap<String, String>) -> String {
    data.keys().map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use kubestack_envfile::{Application, ImageRef, Service, System};
    use kubestack_render::{ApplicationResources, ExternalRecord, RenderingOptions, TagOverrides};
    use kubestack_tfstate::{ExtractionReport, SkipReason};

    use super::*;

    #[test]
    fn plan_summary_lists_applies_then_removals() {
        let system = System::default().with_application(
            Application::default().with_service(Service::new("web", ImageRef::new("r", "t"))),
        );
        let plan = kubestack_render::render(
            &system,
            &ApplicationResources::default(),
            &TagOverrides::new(),
            &RenderingOptions::default(),
        );
        assert_eq!(
            plan_summary(&plan),
            "  + deployment/web\n  + service/web\n  - ingress/web\n2 object(s) to apply, 1 to remove.\n"
        );
    }

    #[test]
    fn extraction_summary_lists_records_and_skips() {
        let mut resources = ApplicationResources::default();
        resources.add(None, ExternalRecord::new("db").with_data("HOST", "h").with_data("PORT", "1"));
        resources.add(Some("web"), ExternalRecord::new("es").with_data("HOST", "h"));
        let mut report = ExtractionReport {
            extracted: 2,
            ..ExtractionReport::default()
        };
        let _ = report.skipped.insert(SkipReason::Tainted, 1);
        let extracted = ExtractedState {
            applications: [("shop".to_owned(), resources)].into_iter().collect(),
            report,
        };
        assert_eq!(
            extraction_summary(&extracted),
            "shop:\n  db (shared): HOST, PORT\n  es (web): HOST\n2 extracted, 1 skipped (tainted: 1)\n"
        );
    }
}
