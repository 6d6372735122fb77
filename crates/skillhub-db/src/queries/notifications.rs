use anyhow::Result;
use chrono::{DateTime, Utc};
use rusqlite::Row;
use rusqlite::types::Type;
use skillhub_types::api::Page;
use skillhub_types::models::{Notification, NotificationKind, NotificationTarget};

use super::users::{USER_COLUMNS, user_from_row};
use super::{OptionalExt, page_bounds};
use crate::Database;
use crate::models::Authored;

const NOTIFICATION_COLUMNS: &str = "n.id, n.recipient_id, n.sender_id, n.kind, n.message, \
     n.target_type, n.target_id, n.is_read, n.created_at, n.read_at";

/// Joined on the sender, which is who the response shows.
const NOTIFICATION_FROM: &str = "FROM notifications n JOIN app_users u ON u.id = n.sender_id";

fn notification_from_row(row: &Row) -> rusqlite::Result<Notification> {
    let kind: String = row.get(3)?;
    let kind = kind
        .parse::<NotificationKind>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;

    let target_type: String = row.get(5)?;
    let target = NotificationTarget::from_parts(&target_type, row.get(6)?).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            Type::Text,
            format!("unknown target type '{}'", target_type).into(),
        )
    })?;

    Ok(Notification {
        id: row.get(0)?,
        recipient_id: row.get(1)?,
        sender_id: row.get(2)?,
        kind,
        message: row.get(4)?,
        target,
        read: row.get(7)?,
        created_at: row.get(8)?,
        read_at: row.get(9)?,
    })
}

fn authored_notification_from_row(row: &Row) -> rusqlite::Result<Authored<Notification>> {
    Ok(Authored::new(notification_from_row(row)?, user_from_row(row, 10)?))
}

impl Database {
    pub fn insert_notification(&self, n: &Notification) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO notifications (
                    id, recipient_id, sender_id, kind, message, target_type, target_id,
                    is_read, created_at, read_at
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                rusqlite::params![
                    n.id,
                    n.recipient_id,
                    n.sender_id,
                    n.kind.as_str(),
                    n.message,
                    n.target.target_type(),
                    n.target.target_id(),
                    n.read,
                    n.created_at,
                    n.read_at,
                ],
            )?;
            Ok(())
        })
    }

    pub fn get_notification(&self, id: &str) -> Result<Option<Authored<Notification>>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!(
                    "SELECT {NOTIFICATION_COLUMNS}, {USER_COLUMNS} {NOTIFICATION_FROM} WHERE n.id = ?1"
                ),
                [id],
                authored_notification_from_row,
            )
            .optional()
        })
    }

    /// Newest first.
    pub fn list_notifications(&self, recipient_id: &str) -> Result<Vec<Authored<Notification>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS}, {USER_COLUMNS} {NOTIFICATION_FROM}
                 WHERE n.recipient_id = ?1
                 ORDER BY n.created_at DESC, n.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([recipient_id], authored_notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn list_notifications_page(
        &self,
        recipient_id: &str,
        page: u32,
        size: u32,
    ) -> Result<Page<Authored<Notification>>> {
        let (limit, offset) = page_bounds(page, size);
        self.with_conn(|conn| {
            let total: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1",
                [recipient_id],
                |row| row.get(0),
            )?;
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS}, {USER_COLUMNS} {NOTIFICATION_FROM}
                 WHERE n.recipient_id = ?1
                 ORDER BY n.created_at DESC, n.rowid DESC
                 LIMIT ?2 OFFSET ?3"
            ))?;
            let rows = stmt
                .query_map(
                    rusqlite::params![recipient_id, limit, offset],
                    authored_notification_from_row,
                )?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(Page::new(rows, page, size, total as u64))
        })
    }

    pub fn list_unread_notifications(
        &self,
        recipient_id: &str,
    ) -> Result<Vec<Authored<Notification>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {NOTIFICATION_COLUMNS}, {USER_COLUMNS} {NOTIFICATION_FROM}
                 WHERE n.recipient_id = ?1 AND n.is_read = 0
                 ORDER BY n.created_at DESC, n.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([recipient_id], authored_notification_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_unread_notifications(&self, recipient_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM notifications WHERE recipient_id = ?1 AND is_read = 0",
                [recipient_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    /// Only touches unread rows, so an existing `read_at` is never overwritten.
    /// Returns whether the row changed.
    pub fn mark_notification_read(&self, id: &str, now: DateTime<Utc>) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1, read_at = ?2 WHERE id = ?1 AND is_read = 0",
                rusqlite::params![id, now],
            )?;
            Ok(changed > 0)
        })
    }

    pub fn mark_all_notifications_read(&self, recipient_id: &str, now: DateTime<Utc>) -> Result<u64> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE notifications SET is_read = 1, read_at = ?2
                 WHERE recipient_id = ?1 AND is_read = 0",
                rusqlite::params![recipient_id, now],
            )?;
            Ok(changed as u64)
        })
    }

    pub fn delete_notification(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM notifications WHERE id = ?1", [id])? > 0)
        })
    }

    pub fn delete_notifications_for(&self, recipient_id: &str) -> Result<u64> {
        self.with_conn_mut(|conn| {
            let removed =
                conn.execute("DELETE FROM notifications WHERE recipient_id = ?1", [recipient_id])?;
            Ok(removed as u64)
        })
    }
}
