//! End-to-end extraction of a multi-module state file.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use kubestack_tfstate::{SkipReason, extract_state};
use pretty_assertions::assert_eq;

const STATE: &str = include_str!("fixtures/terraform.tfstate");

#[test]
fn extracts_tagged_resources_across_modules() {
    let extracted = extract_state(STATE).unwrap();
    assert_eq!(extracted.size(), 2);
    assert_eq!(extracted.report.extracted, 2);
    assert_eq!(extracted.report.skipped(SkipReason::MissingMetadata), 1);
    assert_eq!(extracted.report.skipped(SkipReason::UnrecognizedKind), 1);

    let (name, storefront) = extracted.single_application().unwrap();
    assert_eq!(name, "storefront");

    let db = storefront.shared("postgres96").unwrap();
    assert_eq!(
        db.data.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<Vec<_>>(),
        vec![
            ("HOST", "orders-develop.abc123.us-east-1.rds.amazonaws.com"),
            ("PASSWORD", "orders-password"),
            ("PORT", "5432"),
            ("USERNAME", "orders"),
        ]
    );

    let es = storefront.private("catalog", "es").unwrap();
    assert_eq!(es.data["HOST"], "search-develop.us-east-1.es.amazonaws.com");
    assert_eq!(es.data["PORT"], "80");
}
