//! Build queue handle - connection and operations.
//!
//! Wraps a SurrealDB connection to the worker's `queue` table and provides
//! the checker's read side:
//! - live-query watches for ongoing and completed builds
//! - the most-recent-completed fallback lookup
//!
//! plus the worker-side writes (`enqueue`, `start`, `complete`, `fail`)
//! used by tests and tooling to simulate the worker.
//!
//! Supports both local (in-memory) and remote (WebSocket) connections.

use buildgate_core::BuildTarget;
use surrealdb::engine::any::Any;
use surrealdb::method::QueryStream;
use surrealdb::opt::auth::{Database, Root};
use surrealdb::Notification;
use surrealdb::Surreal;
use tracing::{debug, info, instrument};

use crate::error::StateError;
use crate::record::BuildRecord;
use crate::{migrations, Result};

/// Namespace holding the worker's queue.
const DEFAULT_NAMESPACE: &str = "pool";
/// Database holding the worker's queue.
const DEFAULT_DATABASE: &str = "main";
/// Table the worker writes build records to.
const QUEUE_TABLE: &str = "queue";

/// Filter fragment shared by every queue lookup: the owning account may be
/// recorded as either the actor or the owner of the target.
const SELECTOR: &str = "(payload.repo_owner = $actor OR payload.repo_owner = $owner) \
     AND payload.repo_name = $repo AND payload.branch_name = $branch";

/// Escape a value for use as a single-quoted SurrealQL string literal.
///
/// Live queries cannot see `.bind()` parameters when notifications are
/// evaluated, so the watch methods must inline their filter values.
fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// The shared selector with the target's values inlined as literals, for
/// use in `LIVE SELECT` statements where bound parameters do not apply.
fn inline_selector(target: &BuildTarget) -> String {
    format!(
        "(payload.repo_owner = '{actor}' OR payload.repo_owner = '{owner}') \
         AND payload.repo_name = '{repo}' AND payload.branch_name = '{branch}'",
        actor = escape_literal(&target.actor),
        owner = escape_literal(&target.owner),
        repo = escape_literal(&target.repo),
        branch = escape_literal(&target.branch),
    )
}

/// Stream of live-query notifications for queue records.
///
/// Dropping the stream ends the live query on the server, so holding it
/// only for the duration of one watch phase releases the subscription.
pub type BuildStream = QueryStream<Notification<BuildRecord>>;

/// Human-readable description of the completed-build filter, for the
/// "nothing found" explanation.
pub fn filter_description(target: &BuildTarget) -> String {
    serde_json::json!({
        "payload.repo_owner": { "any_of": [target.actor.as_str(), target.owner.as_str()] },
        "payload.repo_name": target.repo.as_str(),
        "payload.branch_name": target.branch.as_str(),
        "end_time": "!= NONE",
    })
    .to_string()
}

/// Configuration for a remote queue connection
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// WebSocket endpoint URL (e.g., "wss://xxx.aws-use1.surrealdb.cloud")
    pub endpoint: String,
    /// Database username
    pub username: String,
    /// Database password
    pub password: String,
    /// Namespace (default: "pool")
    pub namespace: String,
    /// Database name (default: "main")
    pub database: String,
    /// Whether this is a root user (true) or database user (false)
    pub is_root: bool,
}

impl QueueConfig {
    /// Create a new configuration for a database user
    pub fn new(
        endpoint: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            username: username.into(),
            password: password.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            is_root: false,
        }
    }

    /// Set custom namespace
    pub fn with_namespace(mut self, ns: impl Into<String>) -> Self {
        self.namespace = ns.into();
        self
    }

    /// Set custom database
    pub fn with_database(mut self, db: impl Into<String>) -> Self {
        self.database = db.into();
        self
    }

    /// Set whether this is a root user
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Create from environment variables
    ///
    /// Reads:
    /// - SURREALDB_ENDPOINT (required)
    /// - SURREALDB_USERNAME (required)
    /// - SURREALDB_PASSWORD (required)
    /// - SURREALDB_NAMESPACE (optional, default: "pool")
    /// - SURREALDB_DATABASE (optional, default: "main")
    /// - SURREALDB_ROOT (optional, default: "false") - set to "true" for root users
    pub fn from_env() -> std::result::Result<Self, String> {
        let endpoint =
            std::env::var("SURREALDB_ENDPOINT").map_err(|_| "SURREALDB_ENDPOINT not set")?;
        let username =
            std::env::var("SURREALDB_USERNAME").map_err(|_| "SURREALDB_USERNAME not set")?;
        let password =
            std::env::var("SURREALDB_PASSWORD").map_err(|_| "SURREALDB_PASSWORD not set")?;
        let namespace = std::env::var("SURREALDB_NAMESPACE")
            .unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
        let database =
            std::env::var("SURREALDB_DATABASE").unwrap_or_else(|_| DEFAULT_DATABASE.to_string());
        let is_root = std::env::var("SURREALDB_ROOT")
            .map(|v| v.to_lowercase() == "true")
            .unwrap_or(false);

        Ok(Self {
            endpoint,
            username,
            password,
            namespace,
            database,
            is_root,
        })
    }
}

/// Handle to the shared build queue
#[derive(Clone)]
pub struct BuildQueue {
    db: Surreal<Any>,
}

impl BuildQueue {
    /// Connect to an in-memory queue and set up the schema.
    ///
    /// Every call creates a fresh, empty queue; share one handle between
    /// the reader and any simulated worker.
    #[instrument(skip_all)]
    pub async fn in_memory() -> Result<Self> {
        info!("Connecting to build queue (in-memory)");

        let db = surrealdb::engine::any::connect("mem://")
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        db.use_ns(DEFAULT_NAMESPACE)
            .use_db(DEFAULT_DATABASE)
            .await
            .map_err(|e| StateError::Connection(e.to_string()))?;

        migrations::init_schema(&db).await?;

        info!("Build queue connected (in-memory)");
        Ok(Self { db })
    }

    /// Connect to a remote queue.
    ///
    /// # Example
    /// ```ignore
    /// let config = QueueConfig::new(
    ///     "wss://xxx.aws-use1.surrealdb.cloud",
    ///     "your_username",
    ///     "your_password",
    /// );
    /// let queue = BuildQueue::connect(config).await?;
    /// ```
    #[instrument(skip(config), fields(endpoint = %config.endpoint, namespace = %config.namespace, database = %config.database))]
    pub async fn connect(config: QueueConfig) -> Result<Self> {
        info!("Connecting to build queue (root={})", config.is_root);

        let db = surrealdb::engine::any::connect(&config.endpoint)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to connect to {}: {}", config.endpoint, e))
            })?;

        if config.is_root {
            db.signin(Root {
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| StateError::Connection(format!("Root authentication failed: {}", e)))?;
        } else {
            db.signin(Database {
                namespace: &config.namespace,
                database: &config.database,
                username: &config.username,
                password: &config.password,
            })
            .await
            .map_err(|e| {
                StateError::Connection(format!("Database authentication failed: {}", e))
            })?;
        }

        db.use_ns(&config.namespace)
            .use_db(&config.database)
            .await
            .map_err(|e| {
                StateError::Connection(format!("Failed to select namespace/database: {}", e))
            })?;

        migrations::init_schema(&db).await?;

        info!("Build queue connected");
        Ok(Self { db })
    }

    /// Connect using environment variables.
    ///
    /// If SURREALDB_ENDPOINT is set, connects with authentication.
    /// If SURREALDB_URL is set, connects to that URL without signin.
    /// Otherwise, falls back to in-memory (every check then resolves to
    /// the nothing-found outcome).
    #[instrument(skip_all)]
    pub async fn from_env() -> Result<Self> {
        if let Ok(config) = QueueConfig::from_env() {
            info!("Queue endpoint configured, connecting to remote queue");
            return Self::connect(config).await;
        }

        if let Ok(url) = std::env::var("SURREALDB_URL") {
            info!("SURREALDB_URL found, connecting to {}", url);
            let db = surrealdb::engine::any::connect(&url)
                .await
                .map_err(|e| StateError::Connection(e.to_string()))?;

            db.use_ns(DEFAULT_NAMESPACE)
                .use_db(DEFAULT_DATABASE)
                .await
                .map_err(|e| StateError::Connection(e.to_string()))?;

            migrations::init_schema(&db).await?;
            return Ok(Self { db });
        }

        info!("No queue endpoint configured, using in-memory queue");
        Self::in_memory().await
    }

    // ========== Checker reads ==========

    /// Subscribe to notifications for ongoing builds of `target`.
    ///
    /// Matches records whose `end_time` is still absent. The subscription
    /// stays open until the returned stream is dropped.
    #[instrument(skip(self), fields(target = %target))]
    pub async fn watch_ongoing(&self, target: &BuildTarget) -> Result<BuildStream> {
        debug!("Subscribing to ongoing-build notifications");

        let selector = inline_selector(target);
        let mut response = self
            .db
            .query(format!(
                "LIVE SELECT * FROM {QUEUE_TABLE} WHERE {selector} AND end_time = NONE"
            ))
            .await?;

        let stream = response.stream::<Notification<BuildRecord>>(0)?;
        Ok(stream)
    }

    /// Subscribe to notifications for completed builds of `target`.
    ///
    /// Matches records whose `end_time` has been set, whatever the status.
    #[instrument(skip(self), fields(target = %target))]
    pub async fn watch_completed(&self, target: &BuildTarget) -> Result<BuildStream> {
        debug!("Subscribing to completed-build notifications");

        let selector = inline_selector(target);
        let mut response = self
            .db
            .query(format!(
                "LIVE SELECT * FROM {QUEUE_TABLE} WHERE {selector} AND end_time != NONE"
            ))
            .await?;

        let stream = response.stream::<Notification<BuildRecord>>(0)?;
        Ok(stream)
    }

    /// Most recent completed build for `target`, by `end_time` descending.
    ///
    /// Historical records persist, so this picks the latest finished
    /// attempt and ignores any still-running one.
    #[instrument(skip(self), fields(target = %target))]
    pub async fn latest_completed(&self, target: &BuildTarget) -> Result<Option<BuildRecord>> {
        debug!("Looking up most recent completed build");

        let mut result = self
            .db
            .query(format!(
                "SELECT * FROM {QUEUE_TABLE} WHERE {SELECTOR} AND end_time != NONE \
                 ORDER BY end_time DESC LIMIT 1"
            ))
            .bind(("actor", target.actor.clone()))
            .bind(("owner", target.owner.clone()))
            .bind(("repo", target.repo.clone()))
            .bind(("branch", target.branch.clone()))
            .await?;

        let builds: Vec<BuildRecord> = result.take(0)?;
        Ok(builds.into_iter().next())
    }

    // ========== Worker-side writes ==========
    // The checker never calls these; they exist for the worker's half of
    // the contract and for tests that simulate it.

    /// Insert a new queue record.
    #[instrument(skip(self, record), fields(build_id = %record.build_id))]
    pub async fn enqueue(&self, record: &BuildRecord) -> Result<BuildRecord> {
        debug!("Enqueueing build");

        // Clone to owned value to satisfy SurrealDB lifetime requirements
        let record_owned = record.clone();

        let created: Option<BuildRecord> =
            self.db.create(QUEUE_TABLE).content(record_owned).await?;

        created.ok_or_else(|| StateError::Transaction("Failed to create queue record".to_string()))
    }

    /// Mark a queued build as picked up.
    #[instrument(skip(self))]
    pub async fn start(&self, build_id: &str) -> Result<()> {
        let row = self.fetch_build(build_id).await?;
        self.update_row(build_id, row.started()).await
    }

    /// Mark a build as completed with its captured log lines.
    #[instrument(skip(self, logs))]
    pub async fn complete(&self, build_id: &str, logs: Vec<String>) -> Result<()> {
        let row = self.fetch_build(build_id).await?;
        self.update_row(build_id, row.completed(logs)).await
    }

    /// Mark a build as failed with the worker's reason.
    #[instrument(skip(self))]
    pub async fn fail(&self, build_id: &str, reason: &str) -> Result<()> {
        let row = self.fetch_build(build_id).await?;
        self.update_row(build_id, row.failed(reason)).await
    }

    /// Get a record by its build ID.
    pub async fn fetch_build(&self, build_id: &str) -> Result<BuildRecord> {
        let bid = build_id.to_string();

        let mut result = self
            .db
            .query(format!("SELECT * FROM {QUEUE_TABLE} WHERE build_id = $bid"))
            .bind(("bid", bid))
            .await?;

        let builds: Vec<BuildRecord> = result.take(0)?;
        builds
            .into_iter()
            .next()
            .ok_or_else(|| StateError::BuildNotFound(build_id.to_string()))
    }

    async fn update_row(&self, build_id: &str, row: BuildRecord) -> Result<()> {
        let bid = build_id.to_string();

        self.db
            .query(format!(
                "UPDATE {QUEUE_TABLE} CONTENT $row WHERE build_id = $bid"
            ))
            .bind(("row", row))
            .bind(("bid", bid))
            .await?;

        Ok(())
    }
}
