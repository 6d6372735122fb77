use anyhow::Result;
use rusqlite::Row;
use skillhub_types::models::Comment;

use super::OptionalExt;
use super::users::{USER_COLUMNS, user_from_row};
use crate::Database;
use crate::models::Authored;

const COMMENT_COLUMNS: &str = "c.id, c.user_id, c.post_id, c.content, c.created_at, c.updated_at";

fn comment_from_row(row: &Row) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn authored_comment_from_row(row: &Row) -> rusqlite::Result<Authored<Comment>> {
    Ok(Authored::new(comment_from_row(row)?, user_from_row(row, 6)?))
}

impl Database {
    pub fn insert_comment(&self, comment: &Comment) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (id, user_id, post_id, content, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    comment.id,
                    comment.user_id,
                    comment.post_id,
                    comment.content,
                    comment.created_at,
                    comment.updated_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn update_comment(&self, comment: &Comment) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE comments SET content = ?2, updated_at = ?3 WHERE id = ?1",
                rusqlite::params![comment.id, comment.content, comment.updated_at],
            )?;
            Ok(())
        })
    }

    pub fn delete_comment(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM comments WHERE id = ?1", [id])? > 0))
    }

    pub fn get_comment(&self, id: &str) -> Result<Option<Authored<Comment>>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {COMMENT_COLUMNS}, {USER_COLUMNS}
                     FROM comments c JOIN app_users u ON u.id = c.user_id
                     WHERE c.id = ?1"
                ),
                [id],
                authored_comment_from_row,
            )
            .optional()
        })
    }

    /// Newest first.
    pub fn list_comments_for_post(&self, post_id: &str) -> Result<Vec<Authored<Comment>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMMENT_COLUMNS}, {USER_COLUMNS}
                 FROM comments c JOIN app_users u ON u.id = c.user_id
                 WHERE c.post_id = ?1
                 ORDER BY c.created_at DESC, c.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([post_id], authored_comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_comments_by_user(&self, user_id: &str) -> Result<Vec<Authored<Comment>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {COMMENT_COLUMNS}, {USER_COLUMNS}
                 FROM comments c JOIN app_users u ON u.id = c.user_id
                 WHERE c.user_id = ?1
                 ORDER BY c.created_at DESC, c.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], authored_comment_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_comments_for_post(&self, post_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 =
                conn.query_row("SELECT COUNT(*) FROM comments WHERE post_id = ?1", [post_id], |row| {
                    row.get(0)
                })?;
            Ok(count as u64)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use skillhub_types::models::{Comment, new_id};

    use crate::queries::test_support::{db, post, user};

    #[test]
    fn comments_on_a_post_are_newest_first() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let p = post(&db, &ada);
        let now = Utc::now();

        for (i, author) in [&ada, &grace].into_iter().enumerate() {
            let at = now + Duration::seconds(i as i64);
            db.insert_comment(&Comment {
                id: new_id(),
                user_id: author.id.clone(),
                post_id: p.id.clone(),
                content: format!("comment {}", i),
                created_at: at,
                updated_at: at,
            })
            .unwrap();
        }

        let comments = db.list_comments_for_post(&p.id).unwrap();
        let contents: Vec<_> = comments.iter().map(|c| c.record.content.as_str()).collect();
        assert_eq!(contents, vec!["comment 1", "comment 0"]);
        assert_eq!(comments[0].author.username, "grace");
        assert_eq!(db.count_comments_for_post(&p.id).unwrap(), 2);
        assert_eq!(db.list_comments_by_user(&ada.id).unwrap().len(), 1);
    }

    #[test]
    fn update_rewrites_content_and_timestamp() {
        let db = db();
        let ada = user(&db, "ada");
        let p = post(&db, &ada);
        let now = Utc::now();
        let mut comment = Comment {
            id: new_id(),
            user_id: ada.id.clone(),
            post_id: p.id.clone(),
            content: "first".into(),
            created_at: now,
            updated_at: now,
        };
        db.insert_comment(&comment).unwrap();

        comment.content = "edited".into();
        comment.updated_at = now + Duration::minutes(1);
        db.update_comment(&comment).unwrap();

        let stored = db.get_comment(&comment.id).unwrap().unwrap().record;
        assert_eq!(stored, comment);
        assert!(db.delete_comment(&comment.id).unwrap());
        assert!(db.get_comment(&comment.id).unwrap().is_none());
    }
}
