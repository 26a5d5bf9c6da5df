//! Externally provisioned resources merged into a render.
//!
//! Records come from provisioning state and carry connection facts
//! (endpoints, credentials) for resources that live outside the cluster.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Connection data for one externally provisioned resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRecord {
    /// Requirement name this record satisfies.
    pub resource_name: String,
    /// Key/value data exposed to dependents.
    pub data: BTreeMap<String, String>,
}

impl ExternalRecord {
    /// Creates a record with no data.
    #[must_use]
    pub fn new(resource_name: impl Into<String>) -> Self {
        Self {
            resource_name: resource_name.into(),
            data: BTreeMap::new(),
        }
    }

    /// Returns a copy with one data entry added or replaced.
    #[must_use]
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        let _ = self.data.insert(key.into(), value.into());
        self
    }
}

/// External records of one application, partitioned by owner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationResources {
    /// Records backing shared requirements.
    pub shared_resources: Vec<ExternalRecord>,
    /// Records backing private requirements, keyed by service name.
    pub service_resources: BTreeMap<String, Vec<ExternalRecord>>,
}

impl ApplicationResources {
    /// Adds a record, owned by `service` if given, else shared.
    pub fn add(&mut self, service: Option<&str>, record: ExternalRecord) {
        match service {
            Some(service) => self
                .service_resources
                .entry(service.to_owned())
                .or_default()
                .push(record),
            None => self.shared_resources.push(record),
        }
    }

    /// Finds the shared record for `requirement`.
    #[must_use]
    pub fn shared(&self, requirement: &str) -> Option<&ExternalRecord> {
        self.shared_resources
            .iter()
            .find(|r| r.resource_name == requirement)
    }

    /// Finds the record for a private requirement of `service`.
    #[must_use]
    pub fn private(&self, service: &str, requirement: &str) -> Option<&ExternalRecord> {
        self.service_resources
            .get(service)?
            .iter()
            .find(|r| r.resource_name == requirement)
    }

    /// Returns the total number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.shared_resources.len() + self.service_resources.values().map(Vec::len).sum::<usize>()
    }

    /// Returns whether no record is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
