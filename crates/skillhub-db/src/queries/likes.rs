use anyhow::Result;
use rusqlite::Row;
use skillhub_types::models::Like;

use super::OptionalExt;
use super::users::{USER_COLUMNS, user_from_row};
use crate::Database;
use crate::models::Authored;

const LIKE_COLUMNS: &str = "l.id, l.user_id, l.post_id, l.created_at";

fn like_from_row(row: &Row) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn authored_like_from_row(row: &Row) -> rusqlite::Result<Authored<Like>> {
    Ok(Authored::new(like_from_row(row)?, user_from_row(row, 4)?))
}

impl Database {
    pub fn find_like(&self, user_id: &str, post_id: &str) -> Result<Option<Like>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {LIKE_COLUMNS} FROM likes l WHERE l.user_id = ?1 AND l.post_id = ?2"),
                [user_id, post_id],
                like_from_row,
            )
            .optional()
        })
    }

    /// Fails with a UNIQUE violation (see [`crate::is_unique_violation`]) when
    /// the user already likes the post.
    pub fn insert_like(&self, like: &Like) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO likes (id, user_id, post_id, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![like.id, like.user_id, like.post_id, like.created_at],
            )?;
            Ok(())
        })
    }

    pub fn delete_like(&self, user_id: &str, post_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM likes WHERE user_id = ?1 AND post_id = ?2",
                [user_id, post_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn count_likes_for_post(&self, post_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM likes WHERE post_id = ?1", [post_id], |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
    }

    pub fn has_liked(&self, user_id: &str, post_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM likes WHERE user_id = ?1 AND post_id = ?2)",
                [user_id, post_id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    /// Likes on a post together with the liking user, newest first.
    pub fn list_likes_for_post(&self, post_id: &str) -> Result<Vec<Authored<Like>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LIKE_COLUMNS}, {USER_COLUMNS}
                 FROM likes l JOIN app_users u ON u.id = l.user_id
                 WHERE l.post_id = ?1
                 ORDER BY l.created_at DESC, l.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([post_id], authored_like_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_likes_by_user(&self, user_id: &str) -> Result<Vec<Authored<Like>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {LIKE_COLUMNS}, {USER_COLUMNS}
                 FROM likes l JOIN app_users u ON u.id = l.user_id
                 WHERE l.user_id = ?1
                 ORDER BY l.created_at DESC, l.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], authored_like_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use skillhub_types::models::{Like, new_id};

    use crate::is_unique_violation;
    use crate::queries::test_support::{db, post, user};

    fn like(user_id: &str, post_id: &str) -> Like {
        Like {
            id: new_id(),
            user_id: user_id.to_string(),
            post_id: post_id.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn second_like_for_the_same_pair_is_rejected() {
        let db = db();
        let ada = user(&db, "ada");
        let p = post(&db, &ada);

        db.insert_like(&like(&ada.id, &p.id)).unwrap();
        let err = db.insert_like(&like(&ada.id, &p.id)).unwrap_err();
        assert!(is_unique_violation(&err));
        assert_eq!(db.count_likes_for_post(&p.id).unwrap(), 1);
    }

    #[test]
    fn missing_post_is_not_a_unique_violation() {
        let db = db();
        let ada = user(&db, "ada");
        let err = db.insert_like(&like(&ada.id, "nope")).unwrap_err();
        assert!(!is_unique_violation(&err));
    }

    #[test]
    fn likes_join_the_liking_user() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);
        db.insert_like(&like(&grace.id, &p.id)).unwrap();

        let likes = db.list_likes_for_post(&p.id).unwrap();
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].author.username, "grace");
        assert!(db.has_liked(&grace.id, &p.id).unwrap());
        assert!(!db.has_liked(&ada.id, &p.id).unwrap());
        assert_eq!(db.list_likes_by_user(&grace.id).unwrap().len(), 1);

        assert!(db.delete_like(&grace.id, &p.id).unwrap());
        assert!(db.find_like(&grace.id, &p.id).unwrap().is_none());
    }
}
