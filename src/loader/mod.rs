//! Loader module - fetches a user's workout plan
//!
//! The plan document lives at `<base>/data/<identifier>-workout.json`, where
//! `<base>` is either an HTTP(S) URL or a local directory.

use std::path::PathBuf;

use thiserror::Error;
use tokio::sync::oneshot;
use tracing::{info, warn};

use crate::plan::{parse_plan, WorkoutPlan};

/// Default base the plan documents are served under
pub const DEFAULT_BASE: &str = "/my-workout";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("No workout selected, pass --workout <name>")]
    MissingIdentifier,
    #[error("Invalid workout name: {0}")]
    InvalidIdentifier(String),
    #[error("Could not find data for {identifier}")]
    NotFound { identifier: String, reason: String },
    #[error("Could not read data for {identifier}: {source}")]
    Parse {
        identifier: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Loading data for {0} was interrupted")]
    Interrupted(String),
}

/// Validated user identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier(String);

impl Identifier {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Identifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifiers end up inside a path or URL, so only `[A-Za-z0-9_-]` is allowed
pub fn validate_identifier(raw: Option<&str>) -> Result<Identifier, LoadError> {
    let raw = raw.map(str::trim).unwrap_or_default();
    if raw.is_empty() {
        return Err(LoadError::MissingIdentifier);
    }
    let valid = raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if !valid {
        return Err(LoadError::InvalidIdentifier(raw.to_string()));
    }
    Ok(Identifier(raw.to_string()))
}

/// Where plan documents come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanSource {
    Http(String),
    Dir(PathBuf),
}

impl PlanSource {
    pub fn from_base(base: &str) -> Self {
        if base.starts_with("http://") || base.starts_with("https://") {
            PlanSource::Http(base.trim_end_matches('/').to_string())
        } else {
            PlanSource::Dir(PathBuf::from(base))
        }
    }

    /// Location of the plan document for a user
    pub fn location(&self, identifier: &Identifier) -> String {
        let file = format!("{}-workout.json", identifier);
        match self {
            PlanSource::Http(base) => format!("{}/data/{}", base, file),
            PlanSource::Dir(dir) => dir.join("data").join(file).display().to_string(),
        }
    }
}

/// Read and parse a plan document (blocking)
pub fn load_plan(source: &PlanSource, identifier: &Identifier) -> Result<WorkoutPlan, LoadError> {
    let location = source.location(identifier);
    info!("Loading workout plan from {}", location);

    let not_found = |reason: String| {
        warn!("Plan for {} unavailable: {}", identifier, reason);
        LoadError::NotFound { identifier: identifier.to_string(), reason }
    };

    let body = match source {
        PlanSource::Http(_) => match ureq::get(&location).set("Accept", "application/json").call() {
            Ok(resp) => resp.into_string().map_err(|e| not_found(e.to_string()))?,
            Err(ureq::Error::Status(code, _)) => return Err(not_found(format!("HTTP {}", code))),
            Err(e) => return Err(not_found(e.to_string())),
        },
        PlanSource::Dir(_) => std::fs::read_to_string(&location).map_err(|e| not_found(e.to_string()))?,
    };

    let plan = parse_plan(&body).map_err(|source| LoadError::Parse {
        identifier: identifier.to_string(),
        source,
    })?;
    info!("Loaded {} sessions for {}", plan.len(), identifier);
    Ok(plan)
}

/// Load on the blocking pool so the caller's runtime keeps running
pub async fn fetch_plan(source: PlanSource, identifier: Identifier) -> Result<WorkoutPlan, LoadError> {
    let name = identifier.to_string();
    tokio::task::spawn_blocking(move || load_plan(&source, &identifier))
        .await
        .map_err(|_| LoadError::Interrupted(name))?
}

/// Start a load in the background; the result arrives on the receiver
pub fn spawn_load(
    source: PlanSource,
    identifier: Identifier,
) -> oneshot::Receiver<Result<WorkoutPlan, LoadError>> {
    let (tx, rx) = oneshot::channel();
    tokio::spawn(async move {
        let result = fetch_plan(source, identifier).await;
        // Receiver gone means the view moved on; nothing to deliver to
        let _ = tx.send(result);
    });
    rx
}

/// Plan lifecycle as seen by the view
#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Loading,
    Ready(WorkoutPlan),
    Error(String),
}

impl LoadState {
    pub fn plan(&self) -> Option<&WorkoutPlan> {
        match self {
            LoadState::Ready(plan) => Some(plan),
            _ => None,
        }
    }
}
