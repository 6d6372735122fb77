use anyhow::Result;
use rusqlite::{Connection, Row};
use skillhub_types::models::ProgressUpdate;

use super::users::{USER_COLUMNS, user_from_row};
use super::{OptionalExt, enum_column, enum_to_text, json_column, to_json};
use crate::Database;
use crate::models::Authored;

const PROGRESS_COLUMNS: &str = "p.id, p.user_id, p.related_plan_id, p.learning_unit_id, p.title, \
     p.content, p.is_public, p.created_at, p.updated_at, p.hours_spent, p.progress_type, \
     p.rating, p.template_type, p.sentiment, p.challenges, p.achievements, p.attached_media, \
     p.like_count, p.comment_count, p.viewed_by";
const PROGRESS_COLUMN_COUNT: usize = 20;

const PROGRESS_FROM: &str = "FROM progress_updates p JOIN app_users u ON u.id = p.user_id";

fn progress_from_row(row: &Row) -> rusqlite::Result<ProgressUpdate> {
    Ok(ProgressUpdate {
        id: row.get(0)?,
        user_id: row.get(1)?,
        related_plan_id: row.get(2)?,
        learning_unit_id: row.get(3)?,
        title: row.get(4)?,
        content: row.get(5)?,
        is_public: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
        hours_spent: row.get(9)?,
        progress_type: enum_column(row, 10)?,
        rating: row.get(11)?,
        template_type: row.get(12)?,
        sentiment: enum_column(row, 13)?,
        challenges: json_column(row, 14)?,
        achievements: json_column(row, 15)?,
        attached_media: json_column(row, 16)?,
        like_count: row.get(17)?,
        comment_count: row.get(18)?,
        viewed_by: json_column(row, 19)?,
    })
}

fn authored_progress_from_row(row: &Row) -> rusqlite::Result<Authored<ProgressUpdate>> {
    Ok(Authored::new(progress_from_row(row)?, user_from_row(row, PROGRESS_COLUMN_COUNT)?))
}

/// The serialised columns shared by insert and save.
struct EncodedProgress {
    progress_type: Option<String>,
    sentiment: Option<String>,
    challenges: String,
    achievements: String,
    attached_media: String,
    viewed_by: String,
}

impl EncodedProgress {
    fn new(update: &ProgressUpdate) -> Result<Self> {
        Ok(Self {
            progress_type: enum_to_text(update.progress_type.as_ref())?,
            sentiment: enum_to_text(update.sentiment.as_ref())?,
            challenges: to_json(&update.challenges)?,
            achievements: to_json(&update.achievements)?,
            attached_media: to_json(&update.attached_media)?,
            viewed_by: to_json(&update.viewed_by)?,
        })
    }
}

impl Database {
    pub fn insert_progress(&self, update: &ProgressUpdate) -> Result<()> {
        let enc = EncodedProgress::new(update)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO progress_updates (
                    id, user_id, related_plan_id, learning_unit_id, title, content, is_public,
                    created_at, updated_at, hours_spent, progress_type, rating, template_type,
                    sentiment, challenges, achievements, attached_media, like_count,
                    comment_count, viewed_by
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20)",
                rusqlite::params![
                    update.id,
                    update.user_id,
                    update.related_plan_id,
                    update.learning_unit_id,
                    update.title,
                    update.content,
                    update.is_public,
                    update.created_at,
                    update.updated_at,
                    update.hours_spent,
                    enc.progress_type,
                    update.rating,
                    update.template_type,
                    enc.sentiment,
                    enc.challenges,
                    enc.achievements,
                    enc.attached_media,
                    update.like_count,
                    update.comment_count,
                    enc.viewed_by,
                ],
            )?;
            Ok(())
        })
    }

    /// Writes back every mutable field, counters and viewers included.
    pub fn save_progress(&self, update: &ProgressUpdate) -> Result<()> {
        let enc = EncodedProgress::new(update)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE progress_updates SET
                    learning_unit_id = ?2, title = ?3, content = ?4, is_public = ?5,
                    updated_at = ?6, hours_spent = ?7, progress_type = ?8, rating = ?9,
                    sentiment = ?10, challenges = ?11, achievements = ?12, attached_media = ?13,
                    like_count = ?14, comment_count = ?15, viewed_by = ?16
                 WHERE id = ?1",
                rusqlite::params![
                    update.id,
                    update.learning_unit_id,
                    update.title,
                    update.content,
                    update.is_public,
                    update.updated_at,
                    update.hours_spent,
                    enc.progress_type,
                    update.rating,
                    enc.sentiment,
                    enc.challenges,
                    enc.achievements,
                    enc.attached_media,
                    update.like_count,
                    update.comment_count,
                    enc.viewed_by,
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_progress(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM progress_updates WHERE id = ?1", [id])? > 0)
        })
    }

    pub fn get_progress(&self, id: &str) -> Result<Option<Authored<ProgressUpdate>>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {PROGRESS_COLUMNS}, {USER_COLUMNS} {PROGRESS_FROM} WHERE p.id = ?1"),
                [id],
                authored_progress_from_row,
            )
            .optional()
        })
    }

    pub fn list_progress(&self) -> Result<Vec<Authored<ProgressUpdate>>> {
        self.with_conn(|conn| query_progress_where(conn, "1 = 1", None))
    }

    pub fn list_public_progress(&self) -> Result<Vec<Authored<ProgressUpdate>>> {
        self.with_conn(|conn| query_progress_where(conn, "p.is_public = 1", None))
    }

    pub fn list_progress_by_user(&self, user_id: &str) -> Result<Vec<Authored<ProgressUpdate>>> {
        self.with_conn(|conn| query_progress_where(conn, "p.user_id = ?1", Some(user_id)))
    }

    pub fn list_progress_by_plan(&self, plan_id: &str) -> Result<Vec<Authored<ProgressUpdate>>> {
        self.with_conn(|conn| query_progress_where(conn, "p.related_plan_id = ?1", Some(plan_id)))
    }

    pub fn list_progress_by_unit(&self, unit_id: &str) -> Result<Vec<Authored<ProgressUpdate>>> {
        self.with_conn(|conn| query_progress_where(conn, "p.learning_unit_id = ?1", Some(unit_id)))
    }
}

/// Newest first.
fn query_progress_where(
    conn: &Connection,
    predicate: &str,
    value: Option<&str>,
) -> Result<Vec<Authored<ProgressUpdate>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PROGRESS_COLUMNS}, {USER_COLUMNS} {PROGRESS_FROM}
         WHERE {predicate}
         ORDER BY p.created_at DESC, p.rowid DESC"
    ))?;
    let rows = match value {
        Some(v) => stmt.query_map([v], authored_progress_from_row)?,
        None => stmt.query_map([], authored_progress_from_row)?,
    }
    .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}
