//! Persisted entities. The store layer reads and writes these directly; the
//! transport shapes live in `api` and are built from these by explicit
//! conversion functions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// -- Users --

#[derive(Debug, Clone, PartialEq)]
pub struct AppUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserRelationship {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

// -- Posts --

/// Embedded in a post; stored as part of the post document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Media {
    pub url: String,
    #[serde(rename = "type")]
    pub media_type: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserPost {
    pub id: String,
    pub posted_by: String,
    pub posted_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub medias: Vec<Media>,
}

/// At most one per (user, post); the store enforces it with a unique index.
#[derive(Debug, Clone, PartialEq)]
pub struct Like {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Comment {
    pub id: String,
    pub user_id: String,
    pub post_id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// -- Learning plans --

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LearningUnit {
    pub unit_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: i32,
    #[serde(default)]
    pub objectives: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LearningPlan {
    pub id: String,
    pub owner_id: String,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub skill_level: Option<String>,
    pub is_public: bool,
    pub is_completed: bool,
    pub target_completion_date: Option<DateTime<Utc>>,
    pub actual_completion_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub estimated_hours: i32,
    pub completed_hours: i32,
    pub learning_units: Vec<LearningUnit>,
    pub resources: Vec<String>,
    pub tags: Vec<String>,
    pub view_count: i64,
    pub fork_count: i64,
}

impl LearningPlan {
    /// Marks the unit with `unit_id` completed and rolls its hours into the
    /// plan. The plan itself completes once every unit has.
    ///
    /// Completing a unit again re-stamps it and adds its hours once more.
    /// Returns `false` (and leaves the plan untouched) when no unit has that id.
    pub fn complete_unit(&mut self, unit_id: &str, now: DateTime<Utc>) -> bool {
        let Some(unit) = self.learning_units.iter_mut().find(|u| u.unit_id == unit_id) else {
            return false;
        };

        unit.completed = true;
        unit.completed_at = Some(now);
        self.completed_hours += unit.estimated_hours;
        self.updated_at = now;

        if self.learning_units.iter().all(|u| u.completed) {
            self.is_completed = true;
            self.actual_completion_date = Some(now);
        }
        true
    }

    /// Share of completed units in percent; 0 for a plan without units.
    pub fn completion_percentage(&self) -> f64 {
        if self.learning_units.is_empty() {
            return 0.0;
        }
        let completed = self.learning_units.iter().filter(|u| u.completed).count();
        completed as f64 / self.learning_units.len() as f64 * 100.0
    }

    /// Builds a private copy owned by `owner_id`. Units get fresh ids; their
    /// completion state is carried over unless `reset_progress` is set.
    /// The caller is responsible for bumping `fork_count` on `self`.
    pub fn fork(&self, owner_id: &str, reset_progress: bool, now: DateTime<Utc>) -> LearningPlan {
        let learning_units = self
            .learning_units
            .iter()
            .map(|unit| {
                let mut copy = unit.clone();
                copy.unit_id = new_id();
                if reset_progress {
                    copy.completed = false;
                    copy.completed_at = None;
                }
                copy
            })
            .collect();

        let (completed_hours, is_completed, actual_completion_date) = if reset_progress {
            (0, false, None)
        } else {
            (self.completed_hours, self.is_completed, self.actual_completion_date)
        };

        LearningPlan {
            id: new_id(),
            owner_id: owner_id.to_string(),
            title: format!("Fork of: {}", self.title),
            description: self.description.clone(),
            category: self.category.clone(),
            skill_level: self.skill_level.clone(),
            is_public: false,
            is_completed,
            target_completion_date: self.target_completion_date,
            actual_completion_date,
            created_at: now,
            updated_at: now,
            estimated_hours: self.estimated_hours,
            completed_hours,
            learning_units,
            resources: self.resources.clone(),
            tags: self.tags.clone(),
            view_count: 0,
            fork_count: 0,
        }
    }
}

// -- Progress updates --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressType {
    Milestone,
    DailyUpdate,
    Challenge,
    Reflection,
    Stuck,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Sentiment {
    Excited,
    Satisfied,
    Neutral,
    Frustrated,
    Overwhelmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProgressMediaType {
    Image,
    Video,
    Document,
    CodeSnippet,
    ExternalLink,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressMedia {
    pub media_id: String,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub media_type: Option<ProgressMediaType>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressUpdate {
    pub id: String,
    pub user_id: String,
    pub related_plan_id: Option<String>,
    pub learning_unit_id: Option<String>,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub hours_spent: i32,
    pub progress_type: Option<ProgressType>,
    pub rating: Option<i32>,
    pub template_type: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub challenges: Vec<String>,
    pub achievements: Vec<String>,
    pub attached_media: Vec<ProgressMedia>,
    pub like_count: i32,
    pub comment_count: i32,
    pub viewed_by: Vec<String>,
}

impl ProgressUpdate {
    /// An empty private update owned by `user_id`.
    pub fn new(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: new_id(),
            user_id: user_id.to_string(),
            related_plan_id: None,
            learning_unit_id: None,
            title: String::new(),
            content: String::new(),
            is_public: false,
            created_at: now,
            updated_at: now,
            hours_spent: 0,
            progress_type: None,
            rating: None,
            template_type: None,
            sentiment: None,
            challenges: Vec::new(),
            achievements: Vec::new(),
            attached_media: Vec::new(),
            like_count: 0,
            comment_count: 0,
            viewed_by: Vec::new(),
        }
    }

    /// Records `viewer_id` once. Returns whether the viewer was new.
    pub fn mark_viewed(&mut self, viewer_id: &str) -> bool {
        if self.viewed_by.iter().any(|v| v == viewer_id) {
            return false;
        }
        self.viewed_by.push(viewer_id.to_string());
        true
    }

    pub fn increment_likes(&mut self) {
        self.like_count += 1;
    }

    pub fn decrement_likes(&mut self) {
        if self.like_count > 0 {
            self.like_count -= 1;
        }
    }
}

/// Predefined progress update skeletons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressTemplate {
    Milestone,
    Daily,
    Challenge,
}

impl ProgressTemplate {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Milestone => "milestone",
            Self::Daily => "daily",
            Self::Challenge => "challenge",
        }
    }

    /// Fills in type, template name, title and body on a fresh update.
    pub fn build(&self, user_id: &str, plan_id: Option<&str>, now: DateTime<Utc>) -> ProgressUpdate {
        let mut update = ProgressUpdate::new(user_id, now);
        update.related_plan_id = plan_id.map(str::to_string);
        update.template_type = Some(self.as_str().to_string());

        let (progress_type, title, content) = match self {
            Self::Milestone => (
                ProgressType::Milestone,
                "I reached a milestone in my learning journey!",
                "I've achieved...\n\nThis is important because...\n\nNext steps include...",
            ),
            Self::Daily => (
                ProgressType::DailyUpdate,
                "My learning progress today",
                "Today I focused on...\n\nWhat went well...\n\nWhat I struggled with...\n\nTomorrow I plan to...",
            ),
            Self::Challenge => (
                ProgressType::Challenge,
                "I overcame a learning challenge!",
                "The challenge was...\n\nHow I solved it...\n\nWhat I learned from this experience...",
            ),
        };
        update.progress_type = Some(progress_type);
        update.title = title.to_string();
        update.content = content.to_string();
        update
    }
}

impl FromStr for ProgressTemplate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "milestone" => Ok(Self::Milestone),
            "daily" => Ok(Self::Daily),
            "challenge" => Ok(Self::Challenge),
            _ => Err(format!("Unknown template type: {}", s)),
        }
    }
}

// -- Notifications --

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Like,
    Comment,
    Follow,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Like => "LIKE",
            Self::Comment => "COMMENT",
            Self::Follow => "FOLLOW",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LIKE" => Ok(Self::Like),
            "COMMENT" => Ok(Self::Comment),
            "FOLLOW" => Ok(Self::Follow),
            other => Err(format!("unknown notification type '{}'", other)),
        }
    }
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a notification points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTarget {
    Post(String),
    Comment(String),
    User(String),
}

impl NotificationTarget {
    pub fn target_type(&self) -> &'static str {
        match self {
            Self::Post(_) => "POST",
            Self::Comment(_) => "COMMENT",
            Self::User(_) => "USER",
        }
    }

    pub fn target_id(&self) -> &str {
        match self {
            Self::Post(id) | Self::Comment(id) | Self::User(id) => id,
        }
    }

    pub fn from_parts(target_type: &str, target_id: String) -> Option<Self> {
        match target_type {
            "POST" => Some(Self::Post(target_id)),
            "COMMENT" => Some(Self::Comment(target_id)),
            "USER" => Some(Self::User(target_id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub sender_id: String,
    pub kind: NotificationKind,
    pub message: String,
    pub target: NotificationTarget,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    pub fn new(
        recipient_id: &str,
        sender_id: &str,
        kind: NotificationKind,
        target: NotificationTarget,
        message: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: new_id(),
            recipient_id: recipient_id.to_string(),
            sender_id: sender_id.to_string(),
            kind,
            message,
            target,
            read: false,
            created_at: now,
            read_at: None,
        }
    }

    /// unread -> read only. Returns `false` if it was already read, in which
    /// case `read_at` keeps its original value.
    pub fn mark_read(&mut self, now: DateTime<Utc>) -> bool {
        if self.read {
            return false;
        }
        self.read = true;
        self.read_at = Some(now);
        true
    }
}

// -- Chat --

#[derive(Debug, Clone, PartialEq)]
pub struct Conversation {
    pub id: String,
    pub participant1_id: String,
    pub participant2_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn has_participant(&self, user_id: &str) -> bool {
        self.participant1_id == user_id || self.participant2_id == user_id
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
    pub sent_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub read_at: Option<DateTime<Utc>>,
    pub edited: bool,
    pub deleted: bool,
}
