//! Queue records for documentation builds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Module for serializing chrono DateTime to SurrealDB datetime format.
pub(crate) mod surreal_dt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Module for serializing optional chrono DateTime to SurrealDB datetime
/// format. `None` serializes to SurrealDB `NONE`, so an in-progress record
/// simply has no `end_time` field.
pub(crate) mod surreal_dt_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(d) => {
                let sd = SurrealDatetime::from(*d);
                serde::Serialize::serialize(&Some(sd), serializer)
            }
            None => serde::Serialize::serialize(&None::<SurrealDatetime>, serializer),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Lifecycle state of a queue record, serialized with the worker's
/// camelCase names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuildStatus {
    InQueue,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            BuildStatus::InQueue => "inQueue",
            BuildStatus::InProgress => "inProgress",
            BuildStatus::Completed => "completed",
            BuildStatus::Failed => "failed",
        };
        write!(f, "{name}")
    }
}

/// Identifying fields the build worker stamps on each queue record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildPayload {
    /// Owning account of the repository the build ran for. A fork's build
    /// may carry the triggering actor here instead of the upstream owner.
    pub repo_owner: String,
    /// Repository name.
    pub repo_name: String,
    /// Branch the build ran against.
    pub branch_name: String,
}

/// Failure details recorded by the worker when a build fails outright.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildFailure {
    /// When the worker recorded the failure, formatted by the worker.
    pub time: String,
    /// What the worker reported.
    pub reason: String,
}

/// One build attempt in the shared queue.
///
/// Created and mutated entirely by the external build worker; the checker
/// only reads. `end_time` is the ongoing/completed discriminator: absent
/// while the build runs, set exactly once when it finishes. Historical
/// records for the same payload persist, so completed-build lookups order
/// by `end_time` descending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildRecord {
    /// SurrealDB record ID.
    pub id: Option<surrealdb::sql::Thing>,

    /// Unique build ID (UUID string).
    pub build_id: String,

    /// Who and what this build ran for.
    pub payload: BuildPayload,

    /// Lifecycle state.
    pub status: BuildStatus,

    /// Captured log lines, present once the worker uploads them.
    #[serde(default)]
    pub logs: Option<Vec<String>>,

    /// Failure details, present only when `status` is `failed`.
    #[serde(default)]
    pub error: Option<BuildFailure>,

    /// When the record was created.
    #[serde(with = "surreal_dt")]
    pub created_at: DateTime<Utc>,

    /// When the build finished (None while in progress).
    #[serde(default, with = "surreal_dt_opt", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
}

impl BuildRecord {
    /// Create a new queued record for `payload`.
    pub fn new(payload: BuildPayload) -> Self {
        Self {
            id: None,
            build_id: Uuid::new_v4().to_string(),
            payload,
            status: BuildStatus::InQueue,
            logs: None,
            error: None,
            created_at: Utc::now(),
            end_time: None,
        }
    }

    /// Mark the build as picked up by a worker.
    pub fn started(mut self) -> Self {
        self.status = BuildStatus::InProgress;
        self
    }

    /// Mark the build as completed with its captured log lines.
    pub fn completed(mut self, logs: Vec<String>) -> Self {
        self.status = BuildStatus::Completed;
        self.logs = Some(logs);
        self.end_time = Some(Utc::now());
        self
    }

    /// Mark the build as failed with the worker's reason.
    pub fn failed(mut self, reason: impl Into<String>) -> Self {
        let now = Utc::now();
        self.status = BuildStatus::Failed;
        self.error = Some(BuildFailure {
            time: now.to_rfc3339(),
            reason: reason.into(),
        });
        self.end_time = Some(now);
        self
    }

    /// True while the worker has not recorded an `end_time`.
    pub fn is_ongoing(&self) -> bool {
        self.end_time.is_none()
    }
}
