use rollcall_domain::auth::Role;
use rollcall_domain::records::User;
use rollcall_kernel::database::{Database, DatabaseError, DatabaseErrorExt};
use rollcall_kernel::safe_nanoid;

const SELECT_BY_EMAIL: &str =
    "SELECT record::id(id) AS id, email, name, role FROM user WHERE email = $email LIMIT 1";

/// Creates the user or refreshes its name and role, keyed by email.
pub(crate) async fn upsert(db: &Database, email: &str, name: &str, role: Role) -> Result<Option<User>, DatabaseError> {
    let query = format!(
        "LET $found = (SELECT VALUE id FROM user WHERE email = $email LIMIT 1);
        IF array::len($found) > 0 {{
            UPDATE $found SET name = $name, role = $role;
        }} ELSE {{
            CREATE type::thing('user', $key) SET email = $email, name = $name, role = $role;
        }};
        {SELECT_BY_EMAIL};"
    );

    let mut response = db
        .query(query)
        .bind(("email", email.to_owned()))
        .bind(("name", name.to_owned()))
        .bind(("role", role.as_str()))
        .bind(("key", safe_nanoid!()))
        .await
        .context("Upserting user")?
        .check()
        .context("Upserting user")?;

    let users: Vec<User> = response.take(2).context("Reading upserted user")?;
    Ok(users.into_iter().next())
}

pub(crate) async fn find_by_email(db: &Database, email: &str) -> Result<Option<User>, DatabaseError> {
    let users: Vec<User> = db
        .query(SELECT_BY_EMAIL)
        .bind(("email", email.to_owned()))
        .await
        .context("Loading user")?
        .take(0)
        .context("Reading user")?;

    Ok(users.into_iter().next())
}
