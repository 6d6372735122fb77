use anyhow::Result;
use rusqlite::{Connection, Row};
use skillhub_types::models::AppUser;

use super::OptionalExt;
use crate::Database;

pub(crate) const USER_COLUMNS: &str =
    "u.id, u.username, u.email, u.first_name, u.last_name, u.profile_image_url, u.created_at";

pub(crate) fn user_from_row(row: &Row, offset: usize) -> rusqlite::Result<AppUser> {
    Ok(AppUser {
        id: row.get(offset)?,
        username: row.get(offset + 1)?,
        email: row.get(offset + 2)?,
        first_name: row.get(offset + 3)?,
        last_name: row.get(offset + 4)?,
        profile_image_url: row.get(offset + 5)?,
        created_at: row.get(offset + 6)?,
    })
}

impl Database {
    pub fn insert_user(&self, user: &AppUser) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO app_users (id, username, email, first_name, last_name, profile_image_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.profile_image_url,
                    user.created_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_user(&self, user: &AppUser) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE app_users
                 SET username = ?2, email = ?3, first_name = ?4, last_name = ?5, profile_image_url = ?6
                 WHERE id = ?1",
                rusqlite::params![
                    user.id,
                    user.username,
                    user.email,
                    user.first_name,
                    user.last_name,
                    user.profile_image_url,
                ],
            )?;
            Ok(())
        })
    }

    /// Hard delete; owned documents go with it via ON DELETE CASCADE.
    pub fn delete_user(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM app_users WHERE id = ?1", [id])? > 0))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<AppUser>> {
        self.with_conn(|conn| query_user_where(conn, "u.id = ?1", id))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<AppUser>> {
        self.with_conn(|conn| query_user_where(conn, "u.username = ?1", username))
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<AppUser>> {
        self.with_conn(|conn| query_user_where(conn, "u.email = ?1", email))
    }

    pub fn user_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool =
                conn.query_row("SELECT EXISTS(SELECT 1 FROM app_users WHERE id = ?1)", [id], |row| {
                    row.get(0)
                })?;
            Ok(exists)
        })
    }

    pub fn list_users(&self) -> Result<Vec<AppUser>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {USER_COLUMNS} FROM app_users u ORDER BY u.username"))?;
            let rows = stmt
                .query_map([], |row| user_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_user_where(conn: &Connection, predicate: &str, value: &str) -> Result<Option<AppUser>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM app_users u WHERE {predicate}"))?;
    stmt.query_row([value], |row| user_from_row(row, 0)).optional()
}

#[cfg(test)]
mod tests {
    use crate::is_unique_violation;
    use crate::queries::test_support::{db, post, user};

    #[test]
    fn duplicate_username_is_a_unique_violation() {
        let db = db();
        let ada = user(&db, "ada");
        let mut clash = ada.clone();
        clash.id = "another".into();
        clash.email = "other@example.com".into();

        let err = db.insert_user(&clash).unwrap_err();
        assert!(is_unique_violation(&err));
    }

    #[test]
    fn deleting_a_user_cascades_to_their_posts() {
        let db = db();
        let ada = user(&db, "ada");
        let p = post(&db, &ada);

        assert!(db.delete_user(&ada.id).unwrap());
        assert!(db.get_post(&p.id).unwrap().is_none());
        assert!(!db.user_exists(&ada.id).unwrap());
        assert!(!db.delete_user(&ada.id).unwrap());
    }

    #[test]
    fn lookup_by_username_and_email() {
        let db = db();
        let ada = user(&db, "ada");
        assert_eq!(db.get_user_by_username("ada").unwrap(), Some(ada.clone()));
        assert_eq!(db.get_user_by_email("ada@example.com").unwrap().map(|u| u.id), Some(ada.id));
        assert!(db.get_user_by_username("grace").unwrap().is_none());
    }
}
