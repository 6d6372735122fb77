use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    AppUser, Comment, Conversation, LearningPlan, LearningUnit, Like, Media, Message,
    Notification, ProgressMedia, ProgressMediaType, ProgressType, ProgressUpdate, Sentiment,
    UserPost, UserRelationship, new_id,
};

// -- Users --

/// Minimal author info embedded in likes, comments, plans and notifications.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub profile_image_url: Option<String>,
}

impl UserSummary {
    pub fn from_user(user: &AppUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            profile_image_url: user.profile_image_url.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub username: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserProfile {
    pub fn from_user(user: &AppUser) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            profile_image_url: user.profile_image_url.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationshipResponse {
    pub id: String,
    pub follower_id: String,
    pub following_id: String,
    pub created_at: DateTime<Utc>,
}

impl RelationshipResponse {
    pub fn from_relationship(rel: &UserRelationship) -> Self {
        Self {
            id: rel.id.clone(),
            follower_id: rel.follower_id.clone(),
            following_id: rel.following_id.clone(),
            created_at: rel.created_at,
        }
    }
}

// -- Posts --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostedBy {
    pub id: String,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUpdatePostRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub medias: Vec<Media>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub posted_by: PostedBy,
    pub posted_at: DateTime<Utc>,
    pub title: String,
    pub description: String,
    pub medias: Vec<Media>,
}

impl PostResponse {
    pub fn from_post(post: &UserPost, author: &AppUser) -> Self {
        Self {
            id: post.id.clone(),
            posted_by: PostedBy {
                id: author.id.clone(),
                username: author.username.clone(),
                first_name: author.first_name.clone(),
                last_name: author.last_name.clone(),
                profile_image_url: author.profile_image_url.clone(),
            },
            posted_at: post.posted_at,
            title: post.title.clone(),
            description: post.description.clone(),
            medias: post.medias.clone(),
        }
    }
}

// -- Likes --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeRequest {
    pub post_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResponse {
    pub id: String,
    pub user: UserSummary,
    pub post_id: String,
    pub created_at: DateTime<Utc>,
}

impl LikeResponse {
    pub fn from_like(like: &Like, user: &AppUser) -> Self {
        Self {
            id: like.id.clone(),
            user: UserSummary::from_user(user),
            post_id: like.post_id.clone(),
            created_at: like.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSummary {
    pub count: u64,
    pub liked_by_user: bool,
}

// -- Comments --

/// Used for both create and update; `post_id` is only read on create.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentRequest {
    #[serde(default)]
    pub post_id: Option<String>,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentResponse {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub user: UserSummary,
    pub post_id: String,
}

impl CommentResponse {
    pub fn from_comment(comment: &Comment, author: &AppUser) -> Self {
        Self {
            id: comment.id.clone(),
            content: comment.content.clone(),
            created_at: comment.created_at,
            updated_at: comment.updated_at,
            user: UserSummary::from_user(author),
            post_id: comment.post_id.clone(),
        }
    }
}

// -- Learning plans --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUnitDto {
    #[serde(default)]
    pub unit_id: Option<String>,
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

impl LearningUnitDto {
    pub fn from_unit(unit: &LearningUnit) -> Self {
        Self {
            unit_id: Some(unit.unit_id.clone()),
            title: unit.title.clone(),
            description: unit.description.clone(),
            order_index: unit.order_index,
            completed: unit.completed,
            completed_at: unit.completed_at,
            estimated_hours: unit.estimated_hours,
            objectives: unit.objectives.clone(),
        }
    }

    /// A brand new unit: fresh id, not completed.
    pub fn into_new_unit(self) -> LearningUnit {
        LearningUnit {
            unit_id: new_id(),
            title: self.title,
            description: self.description,
            order_index: self.order_index,
            completed: false,
            completed_at: None,
            estimated_hours: self.estimated_hours,
            objectives: self.objectives,
        }
    }

    /// A replacement unit: keeps the supplied id and completion state.
    pub fn into_unit(self) -> LearningUnit {
        LearningUnit {
            unit_id: self.unit_id.unwrap_or_else(new_id),
            title: self.title,
            description: self.description,
            order_index: self.order_index,
            completed: self.completed,
            completed_at: self.completed_at,
            estimated_hours: self.estimated_hours,
            objectives: self.objectives,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateLearningPlanRequest {
    pub owner_id: String,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub skill_level: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub target_completion_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub estimated_hours: i32,
    #[serde(default)]
    pub learning_units: Vec<LearningUnitDto>,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateLearningPlanRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub skill_level: Option<String>,
    pub is_public: Option<bool>,
    pub target_completion_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<i32>,
    pub learning_units: Option<Vec<LearningUnitDto>>,
    pub resources: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningPlanResponse {
    pub id: String,
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
    pub owner: UserSummary,
    pub learning_units: Vec<LearningUnitDto>,
    pub resources: Vec<String>,
    pub tags: Vec<String>,
    pub view_count: i64,
    pub fork_count: i64,
    pub completion_percentage: f64,
}

impl LearningPlanResponse {
    pub fn from_plan(plan: &LearningPlan, owner: &AppUser) -> Self {
        Self {
            id: plan.id.clone(),
            title: plan.title.clone(),
            description: plan.description.clone(),
            category: plan.category.clone(),
            skill_level: plan.skill_level.clone(),
            is_public: plan.is_public,
            is_completed: plan.is_completed,
            target_completion_date: plan.target_completion_date,
            actual_completion_date: plan.actual_completion_date,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
            estimated_hours: plan.estimated_hours,
            completed_hours: plan.completed_hours,
            owner: UserSummary::from_user(owner),
            learning_units: plan.learning_units.iter().map(LearningUnitDto::from_unit).collect(),
            resources: plan.resources.clone(),
            tags: plan.tags.clone(),
            view_count: plan.view_count,
            fork_count: plan.fork_count,
            completion_percentage: plan.completion_percentage(),
        }
    }
}

// -- Progress updates --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMediaDto {
    #[serde(default)]
    pub media_id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(rename = "type", default)]
    pub media_type: Option<ProgressMediaType>,
}

impl ProgressMediaDto {
    pub fn from_media(media: &ProgressMedia) -> Self {
        Self {
            media_id: Some(media.media_id.clone()),
            url: media.url.clone(),
            caption: media.caption.clone(),
            media_type: media.media_type,
        }
    }

    /// Keeps a supplied id, otherwise assigns a new one.
    pub fn into_media(self) -> ProgressMedia {
        ProgressMedia {
            media_id: self.media_id.unwrap_or_else(new_id),
            url: self.url,
            caption: self.caption,
            media_type: self.media_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateProgressUpdateRequest {
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub hours_spent: i32,
    #[serde(rename = "type", default)]
    pub progress_type: Option<ProgressType>,
    #[serde(default)]
    pub rating: Option<i32>,
    #[serde(default)]
    pub template_type: Option<String>,
    #[serde(default)]
    pub sentiment: Option<Sentiment>,
    #[serde(default)]
    pub challenges: Vec<String>,
    #[serde(default)]
    pub achievements: Vec<String>,
    #[serde(default)]
    pub related_plan_id: Option<String>,
    #[serde(default)]
    pub learning_unit_id: Option<String>,
    #[serde(default)]
    pub attached_media: Vec<ProgressMediaDto>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProgressUpdateRequest {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_public: Option<bool>,
    pub hours_spent: Option<i32>,
    #[serde(rename = "type")]
    pub progress_type: Option<ProgressType>,
    pub rating: Option<i32>,
    pub sentiment: Option<Sentiment>,
    pub challenges: Option<Vec<String>>,
    pub achievements: Option<Vec<String>>,
    pub learning_unit_id: Option<String>,
    pub attached_media: Option<Vec<ProgressMediaDto>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdateResponse {
    pub id: String,
    pub title: String,
    pub content: String,
    pub is_public: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub hours_spent: i32,
    #[serde(rename = "type")]
    pub progress_type: Option<ProgressType>,
    pub rating: Option<i32>,
    pub template_type: Option<String>,
    pub sentiment: Option<Sentiment>,
    pub challenges: Vec<String>,
    pub achievements: Vec<String>,
    pub user: UserSummary,
    pub related_plan_id: Option<String>,
    pub learning_unit_id: Option<String>,
    pub attached_media: Vec<ProgressMediaDto>,
    pub like_count: i32,
    pub comment_count: i32,
    pub view_count: usize,
}

impl ProgressUpdateResponse {
    pub fn from_update(update: &ProgressUpdate, author: &AppUser) -> Self {
        Self {
            id: update.id.clone(),
            title: update.title.clone(),
            content: update.content.clone(),
            is_public: update.is_public,
            created_at: update.created_at,
            updated_at: update.updated_at,
            hours_spent: update.hours_spent,
            progress_type: update.progress_type,
            rating: update.rating,
            template_type: update.template_type.clone(),
            sentiment: update.sentiment,
            challenges: update.challenges.clone(),
            achievements: update.achievements.clone(),
            user: UserSummary::from_user(author),
            related_plan_id: update.related_plan_id.clone(),
            learning_unit_id: update.learning_unit_id.clone(),
            attached_media: update.attached_media.iter().map(ProgressMediaDto::from_media).collect(),
            like_count: update.like_count,
            comment_count: update.comment_count,
            view_count: update.viewed_by.len(),
        }
    }
}

// -- Notifications --

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    pub id: String,
    pub sender: UserSummary,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: String,
    pub target_type: String,
    pub target_id: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl NotificationResponse {
    pub fn from_notification(notification: &Notification, sender: &AppUser) -> Self {
        Self {
            id: notification.id.clone(),
            sender: UserSummary::from_user(sender),
            kind: notification.kind.to_string(),
            message: notification.message.clone(),
            target_type: notification.target.target_type().to_string(),
            target_id: notification.target.target_id().to_string(),
            read: notification.read,
            created_at: notification.created_at,
            read_at: notification.read_at,
        }
    }
}

// -- Chat --

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationRequest {
    pub participant1_id: String,
    pub participant2_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub id: String,
    pub participant1_id: String,
    pub participant2_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ConversationResponse {
    pub fn from_conversation(conversation: &Conversation) -> Self {
        Self {
            id: conversation.id.clone(),
            participant1_id: conversation.participant1_id.clone(),
            participant2_id: conversation.participant2_id.clone(),
            created_at: conversation.created_at,
            updated_at: conversation.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: String,
    pub sender_id: String,
    pub recipient_id: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
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

impl MessageResponse {
    /// Deleted messages keep their row but never expose their content.
    pub fn from_message(message: &Message) -> Self {
        Self {
            id: message.id.clone(),
            conversation_id: message.conversation_id.clone(),
            sender_id: message.sender_id.clone(),
            recipient_id: message.recipient_id.clone(),
            content: if message.deleted { String::new() } else { message.content.clone() },
            sent_at: message.sent_at,
            updated_at: message.updated_at,
            read_at: message.read_at,
            edited: message.edited,
            deleted: message.deleted,
        }
    }
}

// -- Shared --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikedResponse {
    pub liked: bool,
}

/// One page of a larger, already ordered result set. `page` is zero based.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, page: u32, size: u32, total_elements: u64) -> Self {
        let total_pages = if size == 0 {
            0
        } else {
            total_elements.div_ceil(size as u64) as u32
        };
        Self {
            content,
            page,
            size,
            total_elements,
            total_pages,
        }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            content: self.content.into_iter().map(f).collect(),
            page: self.page,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NotificationKind, NotificationTarget};

    fn user() -> AppUser {
        AppUser {
            id: "u1".into(),
            username: "ada".into(),
            email: "ada@example.com".into(),
            first_name: Some("Ada".into()),
            last_name: None,
            profile_image_url: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn page_counts_partial_last_page() {
        let page = Page::new(vec![1, 2, 3], 0, 3, 7);
        assert_eq!(page.total_pages, 3);
        let empty: Page<u8> = Page::new(vec![], 0, 10, 0);
        assert_eq!(empty.total_pages, 0);
        assert_eq!(page.map(|n| n * 2).content, vec![2, 4, 6]);
    }

    #[test]
    fn notification_response_flattens_target() {
        let n = Notification::new(
            "r1",
            "u1",
            NotificationKind::Comment,
            NotificationTarget::Post("p9".into()),
            "ada commented on your post".into(),
            Utc::now(),
        );
        let json = serde_json::to_value(NotificationResponse::from_notification(&n, &user())).unwrap();
        assert_eq!(json["type"], "COMMENT");
        assert_eq!(json["targetType"], "POST");
        assert_eq!(json["targetId"], "p9");
        assert_eq!(json["sender"]["username"], "ada");
        assert_eq!(json["read"], false);
    }

    #[test]
    fn deleted_message_hides_content() {
        let msg = Message {
            id: "m1".into(),
            conversation_id: "c1".into(),
            sender_id: "a".into(),
            recipient_id: "b".into(),
            content: "secret".into(),
            sent_at: Utc::now(),
            updated_at: None,
            read_at: None,
            edited: false,
            deleted: true,
        };
        assert_eq!(MessageResponse::from_message(&msg).content, "");
    }

    #[test]
    fn replacement_units_keep_ids_and_state() {
        let dto: LearningUnitDto = serde_json::from_value(serde_json::json!({
            "unitId": "keep-me",
            "title": "Ownership",
            "completed": true,
            "estimatedHours": 4
        }))
        .unwrap();
        let unit = dto.clone().into_unit();
        assert_eq!(unit.unit_id, "keep-me");
        assert!(unit.completed);

        let fresh = dto.into_new_unit();
        assert_ne!(fresh.unit_id, "keep-me");
        assert!(!fresh.completed);
    }
}
