use fxhash::FxHashMap;
use rollcall_domain::records::{AttendanceEvent, AttendanceStatus};
use rollcall_kernel::database::{Database, DatabaseError, DatabaseErrorExt};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct UserName {
    id: String,
    name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusCount {
    pub(crate) status: AttendanceStatus,
    pub(crate) count: u64,
}

pub(crate) async fn record(db: &Database, event: &AttendanceEvent) -> Result<(), DatabaseError> {
    db.query(
        "CREATE type::thing('attendance', $id)
        SET class_id = $class_id, user_id = $user_id, status = $status, ts = $ts",
    )
    .bind(("id", event.id.clone()))
    .bind(("class_id", event.class_id.clone()))
    .bind(("user_id", event.user_id.clone()))
    .bind(("status", event.status.as_str()))
    .bind(("ts", event.ts.clone()))
    .await
    .context("Recording attendance")?
    .check()
    .context("Recording attendance")?;

    Ok(())
}

/// Latest `limit` events of a class with user names resolved.
pub(crate) async fn list(db: &Database, class_id: &str, limit: i64) -> Result<Vec<AttendanceEvent>, DatabaseError> {
    let mut events: Vec<AttendanceEvent> = db
        .query(
            "SELECT record::id(id) AS id, class_id, user_id, status, ts FROM attendance
            WHERE class_id = $class_id ORDER BY ts DESC LIMIT $limit",
        )
        .bind(("class_id", class_id.to_owned()))
        .bind(("limit", limit))
        .await
        .context("Listing attendance")?
        .take(0)
        .context("Reading attendance")?;

    let keys: Vec<String> = events.iter().map(|e| e.user_id.clone()).collect();
    let names = user_names(db, keys).await?;
    for event in &mut events {
        event.user_name = names.get(&event.user_id).cloned();
    }

    Ok(events)
}

/// Names of the given users; unknown users are absent from the map.
pub(crate) async fn user_names(db: &Database, keys: Vec<String>) -> Result<FxHashMap<String, String>, DatabaseError> {
    if keys.is_empty() {
        return Ok(FxHashMap::default());
    }

    let rows: Vec<UserName> = db
        .query("SELECT record::id(id) AS id, name FROM user WHERE record::id(id) IN $keys")
        .bind(("keys", keys))
        .await
        .context("Resolving user names")?
        .take(0)
        .context("Reading user names")?;

    Ok(rows.into_iter().map(|row| (row.id, row.name)).collect())
}

pub(crate) async fn status_counts(db: &Database, user_id: &str) -> Result<Vec<StatusCount>, DatabaseError> {
    let counts = db
        .query("SELECT status, count() AS count FROM attendance WHERE user_id = $user_id GROUP BY status")
        .bind(("user_id", user_id.to_owned()))
        .await
        .context("Summarizing attendance")?
        .take(0)
        .context("Reading attendance summary")?;

    Ok(counts)
}
