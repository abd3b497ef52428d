//! SurrealDB schema initialization for the build queue.
//!
//! Sets up the `queue` table with the indexes the checker's filters rely
//! on. Safe to call multiple times (idempotent).

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StateError;
use crate::Result;

/// Initialize the build queue schema in SurrealDB.
///
/// Called once per connection before any read or write.
pub async fn init_schema(db: &Surreal<Any>) -> Result<()> {
    info!("Initializing build queue schema");

    init_queue_table(db).await?;

    info!("Build queue schema initialization complete");
    Ok(())
}

/// Initialize the `queue` table with constraints and indexes
///
/// Schema:
/// ```text
/// TABLE queue {
///   build_id:    STRING (unique)
///   payload:     OBJECT { repo_owner, repo_name, branch_name: STRING }
///   status:      STRING (enum: inQueue | inProgress | completed | failed)
///   logs:        ARRAY<STRING>? (uploaded when the build finishes)
///   error:       OBJECT { time: STRING, reason: STRING }? (failed builds)
///   created_at:  DATETIME
///   end_time:    DATETIME? (absent while the build runs)
/// }
/// ```
///
/// Constraints:
/// - `build_id` is unique (prevents duplicate queue entries)
/// - records are never deleted; historical builds stay queryable
/// - `end_time` transitions absent → set exactly once (enforced by the
///   worker, not the schema)
async fn init_queue_table(db: &Surreal<Any>) -> Result<()> {
    debug!("Initializing queue table");

    let sql = r#"
        DEFINE TABLE queue
            SCHEMALESS
            PERMISSIONS
                FOR create FULL
                FOR select FULL
                FOR update FULL
                FOR delete NONE;

        -- Ensure build_id is unique
        DEFINE INDEX idx_queue_build_id ON TABLE queue COLUMNS build_id UNIQUE;

        -- Index the selector fields the checker filters on
        DEFINE INDEX idx_queue_selector ON TABLE queue COLUMNS payload.repo_owner, payload.repo_name, payload.branch_name;

        -- Index end_time for most-recent-completed lookups
        DEFINE INDEX idx_queue_end_time ON TABLE queue COLUMNS end_time;
    "#;

    db.query(sql)
        .await
        .map_err(|e| StateError::SchemaSetup(e.to_string()))?;

    debug!("Queue table initialized");
    Ok(())
}
