use anyhow::Result;
use skillhub_types::models::{AppUser, UserRelationship};

use super::OptionalExt;
use super::users::{USER_COLUMNS, user_from_row};
use crate::Database;

impl Database {
    pub fn insert_relationship(&self, rel: &UserRelationship) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO user_relationships (id, follower_id, following_id, created_at)
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![rel.id, rel.follower_id, rel.following_id, rel.created_at],
            )?;
            Ok(())
        })
    }

    pub fn find_relationship(
        &self,
        follower_id: &str,
        following_id: &str,
    ) -> Result<Option<UserRelationship>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, follower_id, following_id, created_at FROM user_relationships
                 WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id, following_id],
                |row| {
                    Ok(UserRelationship {
                        id: row.get(0)?,
                        follower_id: row.get(1)?,
                        following_id: row.get(2)?,
                        created_at: row.get(3)?,
                    })
                },
            )
            .optional()
        })
    }

    pub fn delete_relationship(&self, follower_id: &str, following_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let removed = conn.execute(
                "DELETE FROM user_relationships WHERE follower_id = ?1 AND following_id = ?2",
                [follower_id, following_id],
            )?;
            Ok(removed > 0)
        })
    }

    /// Users that `user_id` follows.
    pub fn list_following(&self, user_id: &str) -> Result<Vec<AppUser>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS}
                 FROM user_relationships r JOIN app_users u ON u.id = r.following_id
                 WHERE r.follower_id = ?1
                 ORDER BY r.created_at, r.rowid"
            ))?;
            let rows = stmt
                .query_map([user_id], |row| user_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Users following `user_id`.
    pub fn list_followers(&self, user_id: &str) -> Result<Vec<AppUser>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS}
                 FROM user_relationships r JOIN app_users u ON u.id = r.follower_id
                 WHERE r.following_id = ?1
                 ORDER BY r.created_at, r.rowid"
            ))?;
            let rows = stmt
                .query_map([user_id], |row| user_from_row(row, 0))?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_following(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_relationships WHERE follower_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn count_followers(&self, user_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM user_relationships WHERE following_id = ?1",
                [user_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }
}
