use anyhow::Result;
use rusqlite::types::ToSql;
use rusqlite::{Connection, Row};
use skillhub_types::api::Page;
use skillhub_types::models::LearningPlan;

use super::users::{USER_COLUMNS, user_from_row};
use super::{OptionalExt, json_column, page_bounds, to_json};
use crate::Database;
use crate::models::Authored;

const PLAN_COLUMNS: &str = "p.id, p.owner_id, p.title, p.description, p.category, p.skill_level, \
     p.is_public, p.is_completed, p.target_completion_date, p.actual_completion_date, \
     p.created_at, p.updated_at, p.estimated_hours, p.completed_hours, \
     p.learning_units, p.resources, p.tags, p.view_count, p.fork_count";
const PLAN_COLUMN_COUNT: usize = 19;

const PLAN_FROM: &str = "FROM learning_plans p JOIN app_users u ON u.id = p.owner_id";

fn plan_from_row(row: &Row) -> rusqlite::Result<LearningPlan> {
    Ok(LearningPlan {
        id: row.get(0)?,
        owner_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        category: row.get(4)?,
        skill_level: row.get(5)?,
        is_public: row.get(6)?,
        is_completed: row.get(7)?,
        target_completion_date: row.get(8)?,
        actual_completion_date: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
        estimated_hours: row.get(12)?,
        completed_hours: row.get(13)?,
        learning_units: json_column(row, 14)?,
        resources: json_column(row, 15)?,
        tags: json_column(row, 16)?,
        view_count: row.get(17)?,
        fork_count: row.get(18)?,
    })
}

fn authored_plan_from_row(row: &Row) -> rusqlite::Result<Authored<LearningPlan>> {
    Ok(Authored::new(plan_from_row(row)?, user_from_row(row, PLAN_COLUMN_COUNT)?))
}

impl Database {
    pub fn insert_plan(&self, plan: &LearningPlan) -> Result<()> {
        let units = to_json(&plan.learning_units)?;
        let resources = to_json(&plan.resources)?;
        let tags = to_json(&plan.tags)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO learning_plans (
                    id, owner_id, title, description, category, skill_level,
                    is_public, is_completed, target_completion_date, actual_completion_date,
                    created_at, updated_at, estimated_hours, completed_hours,
                    learning_units, resources, tags, view_count, fork_count
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19)",
                rusqlite::params![
                    plan.id,
                    plan.owner_id,
                    plan.title,
                    plan.description,
                    plan.category,
                    plan.skill_level,
                    plan.is_public,
                    plan.is_completed,
                    plan.target_completion_date,
                    plan.actual_completion_date,
                    plan.created_at,
                    plan.updated_at,
                    plan.estimated_hours,
                    plan.completed_hours,
                    units,
                    resources,
                    tags,
                    plan.view_count,
                    plan.fork_count,
                ],
            )?;
            Ok(())
        })
    }

    /// Writes back the whole document. Counters are left alone; they only
    /// move through the dedicated increment queries.
    pub fn save_plan(&self, plan: &LearningPlan) -> Result<()> {
        let units = to_json(&plan.learning_units)?;
        let resources = to_json(&plan.resources)?;
        let tags = to_json(&plan.tags)?;
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE learning_plans SET
                    title = ?2, description = ?3, category = ?4, skill_level = ?5,
                    is_public = ?6, is_completed = ?7,
                    target_completion_date = ?8, actual_completion_date = ?9,
                    updated_at = ?10, estimated_hours = ?11, completed_hours = ?12,
                    learning_units = ?13, resources = ?14, tags = ?15
                 WHERE id = ?1",
                rusqlite::params![
                    plan.id,
                    plan.title,
                    plan.description,
                    plan.category,
                    plan.skill_level,
                    plan.is_public,
                    plan.is_completed,
                    plan.target_completion_date,
                    plan.actual_completion_date,
                    plan.updated_at,
                    plan.estimated_hours,
                    plan.completed_hours,
                    units,
                    resources,
                    tags,
                ],
            )?;
            Ok(())
        })
    }

    pub fn delete_plan(&self, id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            Ok(conn.execute("DELETE FROM learning_plans WHERE id = ?1", [id])? > 0)
        })
    }

    pub fn get_plan(&self, id: &str) -> Result<Option<Authored<LearningPlan>>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {PLAN_COLUMNS}, {USER_COLUMNS} {PLAN_FROM} WHERE p.id = ?1"),
                [id],
                authored_plan_from_row,
            )
            .optional()
        })
    }

    pub fn plan_exists(&self, id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM learning_plans WHERE id = ?1)",
                [id],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn increment_plan_views(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE learning_plans SET view_count = view_count + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn increment_plan_forks(&self, id: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE learning_plans SET fork_count = fork_count + 1 WHERE id = ?1",
                [id],
            )?;
            Ok(())
        })
    }

    pub fn list_plans_by_owner(&self, owner_id: &str) -> Result<Vec<Authored<LearningPlan>>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLAN_COLUMNS}, {USER_COLUMNS} {PLAN_FROM}
                 WHERE p.owner_id = ?1
                 ORDER BY p.created_at DESC, p.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([owner_id], authored_plan_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_plans_by_owner(&self, owner_id: &str) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row(
                "SELECT COUNT(*) FROM learning_plans WHERE owner_id = ?1",
                [owner_id],
                |row| row.get(0),
            )?;
            Ok(count as u64)
        })
    }

    pub fn list_public_plans(&self, page: u32, size: u32) -> Result<Page<Authored<LearningPlan>>> {
        self.with_conn(|conn| {
            query_plan_page(conn, "p.is_public = 1", "p.created_at DESC", &[], page, size)
        })
    }

    pub fn list_popular_plans(&self, page: u32, size: u32) -> Result<Page<Authored<LearningPlan>>> {
        self.with_conn(|conn| {
            query_plan_page(conn, "p.is_public = 1", "p.view_count DESC", &[], page, size)
        })
    }

    pub fn list_most_forked_plans(
        &self,
        page: u32,
        size: u32,
    ) -> Result<Page<Authored<LearningPlan>>> {
        self.with_conn(|conn| {
            query_plan_page(conn, "p.is_public = 1", "p.fork_count DESC", &[], page, size)
        })
    }

    /// Public plans whose title contains `query` (case-insensitive), narrowed
    /// by exact category and skill level when given.
    pub fn search_public_plans(
        &self,
        query: Option<&str>,
        category: Option<&str>,
        skill_level: Option<&str>,
        page: u32,
        size: u32,
    ) -> Result<Page<Authored<LearningPlan>>> {
        self.with_conn(|conn| {
            query_plan_page(
                conn,
                "p.is_public = 1
                 AND (?1 IS NULL OR instr(fold_case(p.title), fold_case(?1)) > 0)
                 AND (?2 IS NULL OR p.category = ?2)
                 AND (?3 IS NULL OR p.skill_level = ?3)",
                "p.created_at DESC",
                &[&query, &category, &skill_level],
                page,
                size,
            )
        })
    }

    /// Public plans carrying at least one of `tags`.
    pub fn list_public_plans_by_tags(&self, tags: &[String]) -> Result<Vec<Authored<LearningPlan>>> {
        let wanted = to_json(tags)?;
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {PLAN_COLUMNS}, {USER_COLUMNS} {PLAN_FROM}
                 WHERE p.is_public = 1
                   AND EXISTS (
                       SELECT 1 FROM json_each(p.tags) t
                       WHERE t.value IN (SELECT value FROM json_each(?1))
                   )
                 ORDER BY p.created_at DESC, p.rowid DESC"
            ))?;
            let rows = stmt
                .query_map([wanted], authored_plan_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}

fn query_plan_page(
    conn: &Connection,
    predicate: &str,
    order: &str,
    filters: &[&dyn ToSql],
    page: u32,
    size: u32,
) -> Result<Page<Authored<LearningPlan>>> {
    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM learning_plans p WHERE {predicate}"),
        filters,
        |row| row.get(0),
    )?;

    let (limit, offset) = page_bounds(page, size);
    let n = filters.len();
    let mut params: Vec<&dyn ToSql> = filters.to_vec();
    params.push(&limit);
    params.push(&offset);

    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAN_COLUMNS}, {USER_COLUMNS} {PLAN_FROM}
         WHERE {predicate}
         ORDER BY {order}, p.rowid DESC
         LIMIT ?{} OFFSET ?{}",
        n + 1,
        n + 2
    ))?;
    let rows = stmt
        .query_map(params.as_slice(), authored_plan_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(Page::new(rows, page, size, total as u64))
}
