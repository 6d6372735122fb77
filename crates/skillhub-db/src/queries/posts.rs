use anyhow::Result;
use rusqlite::Row;
use skillhub_types::models::UserPost;

use super::users::{USER_COLUMNS, user_from_row};
use super::{OptionalExt, json_column, to_json};
use crate::Database;
use crate::models::Authored;

const POST_COLUMNS: &str = "p.id, p.posted_by, p.posted_at, p.title, p.description, p.medias";
const POST_COLUMN_COUNT: usize = 6;

fn post_from_row(row: &Row) -> rusqlite::Result<UserPost> {
    Ok(UserPost {
        id: row.get(0)?,
        posted_by: row.get(1)?,
        posted_at: row.get(2)?,
        title: row.get(3)?,
        description: row.get(4)?,
        medias: json_column(row, 5)?,
    })
}

fn authored_post_from_row(row: &Row) -> rusqlite::Result<Authored<UserPost>> {
    Ok(Authored::new(post_from_row(row)?, user_from_row(row, POST_COLUMN_COUNT)?))
}

impl Database {
    pub fn insert_post(&self, post: &UserPost) -> Result<()> {
        let medias = to_json(&post.medias)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_posts (id, posted_by, posted_at, title, description, medias)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    post.id,
                    post.posted_by,
                    post.posted_at,
                    post.title,
                    post.description,
                    medias,
                ],
            )?;
            Ok(())
        })
    }

    /// Overwrites the editable fields; author and timestamp are fixed at creation.
    pub fn update_post(&self, post: &UserPost) -> Result<()> {
        let medias = to_json(&post.medias)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE user_posts SET title = ?2, description = ?3, medias = ?4 WHERE id = ?1",
                rusqlite::params![post.id, post.title, post.description, medias],
            )?;
            Ok(())
        })
    }

    pub fn delete_post(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| Ok(conn.execute("DELETE FROM user_posts WHERE id = ?1", [id])? > 0))
    }

    pub fn get_post(&self, id: &str) -> Result<Option<UserPost>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {POST_COLUMNS} FROM user_posts p WHERE p.id = ?1"),
                [id],
                post_from_row,
            )
            .optional()
        })
    }

    pub fn post_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM user_posts WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn get_post_with_author(&self, id: &str) -> Result<Option<Authored<UserPost>>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {POST_COLUMNS}, {USER_COLUMNS}
                     FROM user_posts p JOIN app_users u ON u.id = p.posted_by
                     WHERE p.id = ?1"
                ),
                [id],
                authored_post_from_row,
            )
            .optional()
        })
    }

    /// Newest first.
    pub fn list_posts(&self) -> Result<Vec<Authored<UserPost>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS}, {USER_COLUMNS}
                 FROM user_posts p JOIN app_users u ON u.id = p.posted_by
                 ORDER BY p.posted_at DESC, p.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([], authored_post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_posts_by_user(&self, user_id: &str) -> Result<Vec<Authored<UserPost>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {POST_COLUMNS}, {USER_COLUMNS}
                 FROM user_posts p JOIN app_users u ON u.id = p.posted_by
                 WHERE p.posted_by = ?1
                 ORDER BY p.posted_at DESC, p.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([user_id], authored_post_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
