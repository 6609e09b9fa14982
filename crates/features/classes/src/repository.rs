use rollcall_domain::records::{Class, Member, Membership};
use rollcall_kernel::database::{Database, DatabaseError, DatabaseErrorExt};

pub(crate) async fn list_for_teacher(db: &Database, teacher_id: &str) -> Result<Vec<Class>, DatabaseError> {
    let classes = db
        .query(
            "SELECT record::id(id) AS id, name, teacher_id, created_at FROM class
            WHERE teacher_id = $teacher_id ORDER BY created_at DESC",
        )
        .bind(("teacher_id", teacher_id.to_owned()))
        .await
        .context("Listing classes")?
        .take(0)
        .context("Reading classes")?;

    Ok(classes)
}

pub(crate) async fn create(db: &Database, class: &Class) -> Result<(), DatabaseError> {
    db.query("CREATE type::thing('class', $id) SET name = $name, teacher_id = $teacher_id, created_at = $created_at")
        .bind(("id", class.id.clone()))
        .bind(("name", class.name.clone()))
        .bind(("teacher_id", class.teacher_id.clone()))
        .bind(("created_at", class.created_at.clone()))
        .await
        .context("Creating class")?
        .check()
        .context("Creating class")?;

    Ok(())
}

/// Adds the membership unless it already exists.
///
/// The record key joins both ids with `:`, which guarded keys never contain.
pub(crate) async fn add_member(db: &Database, membership: &Membership) -> Result<(), DatabaseError> {
    db.query("UPSERT type::thing('class_member', $key) SET class_id = $class_id, user_id = $user_id")
        .bind(("key", format!("{}:{}", membership.class_id, membership.user_id)))
        .bind(("class_id", membership.class_id.clone()))
        .bind(("user_id", membership.user_id.clone()))
        .await
        .context("Adding class member")?
        .check()
        .context("Adding class member")?;

    Ok(())
}

/// Members with a user record, ordered by name.
pub(crate) async fn members(db: &Database, class_id: &str) -> Result<Vec<Member>, DatabaseError> {
    let members = db
        .query(
            "LET $keys = (SELECT VALUE user_id FROM class_member WHERE class_id = $class_id);
            SELECT record::id(id) AS user_id, name, email, role FROM user
            WHERE record::id(id) IN $keys ORDER BY name;",
        )
        .bind(("class_id", class_id.to_owned()))
        .await
        .context("Listing class members")?
        .take(1)
        .context("Reading class members")?;

    Ok(members)
}
