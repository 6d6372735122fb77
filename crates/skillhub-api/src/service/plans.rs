use chrono::{DateTime, Utc};
use skillhub_db::Database;
use skillhub_db::models::Authored;
use skillhub_types::api::{
    CreateLearningPlanRequest, LearningPlanResponse, LearningUnitDto, Page,
    UpdateLearningPlanRequest,
};
use skillhub_types::models::{LearningPlan, new_id};
use tracing::{debug, info};

use super::require_user;
use crate::error::{ApiError, ApiResult};

fn to_response(p: &Authored<LearningPlan>) -> LearningPlanResponse {
    LearningPlanResponse::from_plan(&p.record, &p.author)
}

fn require_plan(db: &Database, id: &str) -> ApiResult<Authored<LearningPlan>> {
    db.get_plan(id)?
        .ok_or_else(|| ApiError::not_found("Learning plan", id))
}

pub fn create_plan(
    db: &Database,
    req: CreateLearningPlanRequest,
    now: DateTime<Utc>,
) -> ApiResult<LearningPlanResponse> {
    let owner = require_user(db, &req.owner_id)?;

    let plan = LearningPlan {
        id: new_id(),
        owner_id: owner.id.clone(),
        title: req.title,
        description: req.description,
        category: req.category,
        skill_level: req.skill_level,
        is_public: req.is_public,
        is_completed: false,
        target_completion_date: req.target_completion_date,
        actual_completion_date: None,
        created_at: now,
        updated_at: now,
        estimated_hours: req.estimated_hours,
        completed_hours: 0,
        learning_units: req
            .learning_units
            .into_iter()
            .map(LearningUnitDto::into_new_unit)
            .collect(),
        resources: req.resources,
        tags: req.tags,
        view_count: 0,
        fork_count: 0,
    };
    db.insert_plan(&plan)?;
    info!(
        "Learning plan {} created by {} with {} units",
        plan.id,
        owner.username,
        plan.learning_units.len()
    );
    Ok(LearningPlanResponse::from_plan(&plan, &owner))
}

/// Counts the read as a view.
pub fn view_plan(db: &Database, id: &str) -> ApiResult<LearningPlanResponse> {
    let mut plan = require_plan(db, id)?;
    db.increment_plan_views(id)?;
    plan.record.view_count += 1;
    Ok(to_response(&plan))
}

pub fn plans_by_owner(db: &Database, owner_id: &str) -> ApiResult<Vec<LearningPlanResponse>> {
    Ok(db.list_plans_by_owner(owner_id)?.iter().map(to_response).collect())
}

pub fn public_plans(db: &Database, page: u32, size: u32) -> ApiResult<Page<LearningPlanResponse>> {
    Ok(db.list_public_plans(page, size)?.map(|p| to_response(&p)))
}

pub fn search_plans(
    db: &Database,
    query: Option<&str>,
    category: Option<&str>,
    skill_level: Option<&str>,
    page: u32,
    size: u32,
) -> ApiResult<Page<LearningPlanResponse>> {
    let query = query.map(str::trim).filter(|q| !q.is_empty());
    Ok(db
        .search_public_plans(query, category, skill_level, page, size)?
        .map(|p| to_response(&p)))
}

pub fn plans_by_tags(db: &Database, tags: &[String]) -> ApiResult<Vec<LearningPlanResponse>> {
    if tags.is_empty() {
        return Ok(Vec::new());
    }
    Ok(db.list_public_plans_by_tags(tags)?.iter().map(to_response).collect())
}

pub fn popular_plans(db: &Database, page: u32, size: u32) -> ApiResult<Page<LearningPlanResponse>> {
    Ok(db.list_popular_plans(page, size)?.map(|p| to_response(&p)))
}

pub fn most_forked_plans(db: &Database, page: u32, size: u32) -> ApiResult<Page<LearningPlanResponse>> {
    Ok(db.list_most_forked_plans(page, size)?.map(|p| to_response(&p)))
}

pub fn count_by_owner(db: &Database, owner_id: &str) -> ApiResult<u64> {
    Ok(db.count_plans_by_owner(owner_id)?)
}

/// Only the supplied fields change. A supplied unit list replaces the old
/// one wholesale, keeping the ids and completion state it carries.
pub fn update_plan(
    db: &Database,
    id: &str,
    req: UpdateLearningPlanRequest,
    now: DateTime<Utc>,
) -> ApiResult<LearningPlanResponse> {
    let mut plan = require_plan(db, id)?;
    let p = &mut plan.record;

    if let Some(title) = req.title {
        p.title = title;
    }
    if req.description.is_some() {
        p.description = req.description;
    }
    if req.category.is_some() {
        p.category = req.category;
    }
    if req.skill_level.is_some() {
        p.skill_level = req.skill_level;
    }
    if let Some(is_public) = req.is_public {
        p.is_public = is_public;
    }
    if req.target_completion_date.is_some() {
        p.target_completion_date = req.target_completion_date;
    }
    if let Some(hours) = req.estimated_hours {
        p.estimated_hours = hours;
    }
    if let Some(resources) = req.resources {
        p.resources = resources;
    }
    if let Some(tags) = req.tags {
        p.tags = tags;
    }
    if let Some(units) = req.learning_units {
        p.learning_units = units.into_iter().map(LearningUnitDto::into_unit).collect();
    }
    p.updated_at = now;

    db.save_plan(&plan.record)?;
    Ok(to_response(&plan))
}

pub fn delete_plan(db: &Database, id: &str) -> ApiResult<()> {
    if !db.delete_plan(id)? {
        return Err(ApiError::not_found("Learning plan", id));
    }
    info!("Learning plan {} deleted", id);
    Ok(())
}

/// An unknown unit leaves the plan as it is and nothing is written.
pub fn complete_unit(
    db: &Database,
    plan_id: &str,
    unit_id: &str,
    now: DateTime<Utc>,
) -> ApiResult<LearningPlanResponse> {
    let mut plan = require_plan(db, plan_id)?;

    if plan.record.complete_unit(unit_id, now) {
        db.save_plan(&plan.record)?;
        info!(
            "Unit {} completed in plan {} ({:.0}%)",
            unit_id,
            plan_id,
            plan.record.completion_percentage()
        );
        if plan.record.is_completed {
            info!("Learning plan {} completed", plan_id);
        }
    } else {
        debug!("Unit {} not found in plan {}", unit_id, plan_id);
    }
    Ok(to_response(&plan))
}

/// Writes the copy first and bumps the source's fork count second; the two
/// writes are not atomic.
pub fn fork_plan(
    db: &Database,
    plan_id: &str,
    user_id: &str,
    reset_progress: bool,
    now: DateTime<Utc>,
) -> ApiResult<LearningPlanResponse> {
    let source = require_plan(db, plan_id)?;
    let new_owner = require_user(db, user_id)?;

    let fork = source.record.fork(&new_owner.id, reset_progress, now);
    db.insert_plan(&fork)?;
    db.increment_plan_forks(plan_id)?;
    info!("{} forked plan {} into {}", new_owner.username, plan_id, fork.id);

    Ok(LearningPlanResponse::from_plan(&fork, &new_owner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{db, user};

    fn unit(title: &str, hours: i32) -> LearningUnitDto {
        LearningUnitDto {
            unit_id: None,
            title: title.into(),
            description: None,
            order_index: 0,
            completed: false,
            completed_at: None,
            estimated_hours: hours,
            objectives: vec![],
        }
    }

    fn create(db: &Database, owner_id: &str, units: Vec<LearningUnitDto>) -> LearningPlanResponse {
        create_plan(
            db,
            CreateLearningPlanRequest {
                owner_id: owner_id.into(),
                title: "Rust".into(),
                description: None,
                category: Some("Programming".into()),
                skill_level: None,
                is_public: true,
                target_completion_date: None,
                estimated_hours: 10,
                learning_units: units,
                resources: vec![],
                tags: vec!["rust".into()],
            },
            Utc::now(),
        )
        .unwrap()
    }

    fn unit_ids(plan: &LearningPlanResponse) -> Vec<String> {
        plan.learning_units.iter().filter_map(|u| u.unit_id.clone()).collect()
    }

    #[test]
    fn completing_all_units_completes_the_plan() {
        let db = db();
        let ada = user(&db, "ada");
        let plan = create(&db, &ada.id, vec![unit("a", 2), unit("b", 3)]);
        let ids = unit_ids(&plan);

        let half = complete_unit(&db, &plan.id, &ids[0], Utc::now()).unwrap();
        assert_eq!(half.completion_percentage, 50.0);
        assert!(!half.is_completed);

        let done = complete_unit(&db, &plan.id, &ids[1], Utc::now()).unwrap();
        assert!(done.is_completed);
        assert!(done.actual_completion_date.is_some());
        assert_eq!(done.completed_hours, 5);

        let stored = db.get_plan(&plan.id).unwrap().unwrap().record;
        assert!(stored.is_completed);
    }

    #[test]
    fn completing_the_same_unit_twice_adds_its_hours_twice() {
        let db = db();
        let ada = user(&db, "ada");
        let plan = create(&db, &ada.id, vec![unit("a", 3), unit("b", 1)]);
        let id = &unit_ids(&plan)[0];

        complete_unit(&db, &plan.id, id, Utc::now()).unwrap();
        let later = Utc::now() + chrono::Duration::minutes(5);
        let again = complete_unit(&db, &plan.id, id, later).unwrap();
        assert_eq!(again.completed_hours, 6);
        assert_eq!(again.learning_units[0].completed_at, Some(later));
        assert!(!again.is_completed);

        let stored = db.get_plan(&plan.id).unwrap().unwrap().record;
        assert_eq!(stored.completed_hours, 6);
    }

    #[test]
    fn completing_an_unknown_unit_changes_nothing() {
        let db = db();
        let ada = user(&db, "ada");
        let plan = create(&db, &ada.id, vec![unit("a", 2)]);
        let before = db.get_plan(&plan.id).unwrap().unwrap().record;

        let resp = complete_unit(&db, &plan.id, "no-such-unit", Utc::now()).unwrap();
        assert_eq!(resp.completed_hours, 0);
        assert_eq!(db.get_plan(&plan.id).unwrap().unwrap().record, before);
    }

    #[test]
    fn fork_is_private_owned_by_the_forker_and_counted_once() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let plan = create(&db, &ada.id, vec![unit("a", 2)]);
        complete_unit(&db, &plan.id, &unit_ids(&plan)[0], Utc::now()).unwrap();

        let fork = fork_plan(&db, &plan.id, &grace.id, false, Utc::now()).unwrap();
        assert_eq!(fork.owner.id, grace.id);
        assert!(!fork.is_public);
        assert_eq!(fork.title, "Fork of: Rust");
        assert!(fork.learning_units[0].completed);
        assert_ne!(unit_ids(&fork), unit_ids(&plan));

        let source = db.get_plan(&plan.id).unwrap().unwrap().record;
        assert_eq!(source.fork_count, 1);
    }

    #[test]
    fn fork_with_reset_starts_from_scratch() {
        let db = db();
        let ada = user(&db, "ada");
        let plan = create(&db, &ada.id, vec![unit("a", 2)]);
        complete_unit(&db, &plan.id, &unit_ids(&plan)[0], Utc::now()).unwrap();

        let fork = fork_plan(&db, &plan.id, &ada.id, true, Utc::now()).unwrap();
        assert!(!fork.is_completed);
        assert_eq!(fork.completed_hours, 0);
        assert_eq!(fork.completion_percentage, 0.0);
    }

    #[test]
    fn viewing_counts_views() {
        let db = db();
        let ada = user(&db, "ada");
        let plan = create(&db, &ada.id, vec![]);
        view_plan(&db, &plan.id).unwrap();
        let second = view_plan(&db, &plan.id).unwrap();
        assert_eq!(second.view_count, 2);
        assert!(matches!(view_plan(&db, "ghost"), Err(ApiError::NotFound(_))));
    }

    #[test]
    fn update_replaces_units_keeping_supplied_ids() {
        let db = db();
        let ada = user(&db, "ada");
        let plan = create(&db, &ada.id, vec![unit("a", 2), unit("b", 1)]);
        let mut kept = plan.learning_units[1].clone();
        kept.completed = true;

        let updated = update_plan(
            &db,
            &plan.id,
            UpdateLearningPlanRequest {
                title: Some("Rust, again".into()),
                learning_units: Some(vec![kept.clone()]),
                ..Default::default()
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(updated.title, "Rust, again");
        assert_eq!(updated.category.as_deref(), Some("Programming"));
        assert_eq!(updated.learning_units.len(), 1);
        assert_eq!(updated.learning_units[0].unit_id, kept.unit_id);
        assert!(updated.learning_units[0].completed);
    }

    #[test]
    fn create_requires_an_existing_owner() {
        let db = db();
        let res = create_plan(
            &db,
            CreateLearningPlanRequest {
                owner_id: "ghost".into(),
                title: "x".into(),
                description: None,
                category: None,
                skill_level: None,
                is_public: false,
                target_completion_date: None,
                estimated_hours: 0,
                learning_units: vec![],
                resources: vec![],
                tags: vec![],
            },
            Utc::now(),
        );
        assert!(matches!(res, Err(ApiError::NotFound(_))));
    }
}
