//! Workload identity parsing.
//!
//! Workloads are addressed by a fully qualified resource name of the form
//! `projects/<project>/locations/<location>/{services|workerPools}/<name>`.
//! The resource collection decides whether the workload is a long-running
//! service or a batch worker pool, which in turn decides which update path
//! the reconciler may use.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of compute workload behind a scale target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadKind {
    Service,
    WorkerPool,
}

impl WorkloadKind {
    fn collection(&self) -> &'static str {
        match self {
            WorkloadKind::Service => "services",
            WorkloadKind::WorkerPool => "workerPools",
        }
    }
}

/// A parsed workload identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkloadRef {
    pub project: String,
    pub location: String,
    pub name: String,
    pub kind: WorkloadKind,
}

/// Error returned when a scale target name is not a well-formed workload FQN.
#[derive(Debug, Error)]
#[error("workload name {name:?} is not of the form projects/<p>/locations/<l>/{{services|workerPools}}/<n>")]
pub struct WorkloadParseError {
    pub name: String,
}

impl WorkloadRef {
    /// Parse a fully qualified workload name.
    pub fn parse(name: &str) -> Result<Self, WorkloadParseError> {
        let err = || WorkloadParseError {
            name: name.to_string(),
        };

        let mut segments = name.split('/');
        if segments.next() != Some("projects") {
            return Err(err());
        }
        let project = segments.next().filter(|s| !s.is_empty()).ok_or_else(err)?;
        if segments.next() != Some("locations") {
            return Err(err());
        }
        let location = segments.next().filter(|s| !s.is_empty()).ok_or_else(err)?;

        let kind = match segments.next() {
            Some("services") => WorkloadKind::Service,
            // Accept both spellings; the admin API uses camelCase collections.
            Some("workerPools") | Some("workerpools") => WorkloadKind::WorkerPool,
            _ => return Err(err()),
        };

        let workload = segments.next().filter(|s| !s.is_empty()).ok_or_else(err)?;
        if segments.next().is_some() {
            return Err(err());
        }

        Ok(WorkloadRef {
            project: project.to_string(),
            location: location.to_string(),
            name: workload.to_string(),
            kind,
        })
    }
}

impl fmt::Display for WorkloadRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/locations/{}/{}/{}",
            self.project,
            self.location,
            self.kind.collection(),
            self.name
        )
    }
}
