use chrono::{DateTime, Utc};
use skillhub_db::Database;
use skillhub_types::api::{
    ConversationRequest, ConversationResponse, MessageResponse, SendMessageRequest,
    UpdateMessageRequest,
};
use skillhub_types::models::{Conversation, Message, new_id};
use tracing::{debug, info};

use super::ensure_user_exists;
use crate::error::{ApiError, ApiResult};

fn require_conversation(db: &Database, id: &str) -> ApiResult<Conversation> {
    db.get_conversation(id)?
        .ok_or_else(|| ApiError::not_found("Conversation", id))
}

fn require_message(db: &Database, id: &str) -> ApiResult<Message> {
    db.get_message(id)?
        .ok_or_else(|| ApiError::not_found("Message", id))
}

/// Returns the pair's existing conversation if there is one.
pub fn open_conversation(
    db: &Database,
    req: ConversationRequest,
    now: DateTime<Utc>,
) -> ApiResult<ConversationResponse> {
    ensure_user_exists(db, &req.participant1_id)?;
    ensure_user_exists(db, &req.participant2_id)?;
    if req.participant1_id == req.participant2_id {
        return Err(ApiError::BadRequest("A conversation needs two different users".into()));
    }

    if let Some(existing) = db.find_conversation_between(&req.participant1_id, &req.participant2_id)? {
        debug!("Reusing conversation {}", existing.id);
        return Ok(ConversationResponse::from_conversation(&existing));
    }

    let conversation = Conversation {
        id: new_id(),
        participant1_id: req.participant1_id,
        participant2_id: req.participant2_id,
        created_at: now,
        updated_at: now,
    };
    db.insert_conversation(&conversation)?;
    info!("Conversation {} opened", conversation.id);
    Ok(ConversationResponse::from_conversation(&conversation))
}

pub fn conversations_for(db: &Database, user_id: &str) -> ApiResult<Vec<ConversationResponse>> {
    Ok(db
        .list_conversations_for(user_id)?
        .iter()
        .map(ConversationResponse::from_conversation)
        .collect())
}

pub fn conversation_between(db: &Database, a: &str, b: &str) -> ApiResult<ConversationResponse> {
    db.find_conversation_between(a, b)?
        .map(|c| ConversationResponse::from_conversation(&c))
        .ok_or_else(|| ApiError::NotFound("No conversation between these users".into()))
}

pub fn send_message(
    db: &Database,
    req: SendMessageRequest,
    now: DateTime<Utc>,
) -> ApiResult<MessageResponse> {
    let conversation = require_conversation(db, &req.conversation_id)?;
    ensure_user_exists(db, &req.sender_id)?;
    ensure_user_exists(db, &req.recipient_id)?;
    if !conversation.has_participant(&req.sender_id) || !conversation.has_participant(&req.recipient_id) {
        return Err(ApiError::BadRequest(
            "Sender and recipient must both belong to the conversation".into(),
        ));
    }

    let message = Message {
        id: new_id(),
        conversation_id: conversation.id.clone(),
        sender_id: req.sender_id,
        recipient_id: req.recipient_id,
        content: req.content,
        sent_at: now,
        updated_at: None,
        read_at: None,
        edited: false,
        deleted: false,
    };
    db.insert_message(&message)?;
    db.touch_conversation(&conversation.id, now)?;
    Ok(MessageResponse::from_message(&message))
}

pub fn edit_message(
    db: &Database,
    message_id: &str,
    req: UpdateMessageRequest,
    now: DateTime<Utc>,
) -> ApiResult<MessageResponse> {
    let mut message = require_message(db, message_id)?;
    if message.deleted {
        return Err(ApiError::BadRequest("Deleted messages cannot be edited".into()));
    }
    message.content = req.content;
    message.edited = true;
    message.updated_at = Some(now);
    db.save_message(&message)?;
    let saved = require_message(db, message_id)?;
    Ok(MessageResponse::from_message(&saved))
}

/// Soft delete: the row stays, its content is no longer served.
pub fn delete_message(db: &Database, message_id: &str, now: DateTime<Utc>) -> ApiResult<()> {
    let mut message = require_message(db, message_id)?;
    if !message.deleted {
        message.deleted = true;
        message.updated_at = Some(now);
        db.save_message(&message)?;
    }
    Ok(())
}

/// Oldest first.
pub fn conversation_messages(db: &Database, conversation_id: &str) -> ApiResult<Vec<MessageResponse>> {
    require_conversation(db, conversation_id)?;
    Ok(db
        .list_messages(conversation_id)?
        .iter()
        .map(MessageResponse::from_message)
        .collect())
}

pub fn mark_read(db: &Database, message_ids: &[String], now: DateTime<Utc>) -> ApiResult<u64> {
    if message_ids.is_empty() {
        return Ok(0);
    }
    let changed = db.mark_messages_read(message_ids, now)?;
    debug!("Marked {} of {} messages read", changed, message_ids.len());
    Ok(changed)
}

pub fn unread_messages(db: &Database, user_id: &str) -> ApiResult<Vec<MessageResponse>> {
    Ok(db
        .list_unread_messages(user_id)?
        .iter()
        .map(MessageResponse::from_message)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::test_support::{db, user};

    fn pair(a: &str, b: &str) -> ConversationRequest {
        ConversationRequest {
            participant1_id: a.into(),
            participant2_id: b.into(),
        }
    }

    #[test]
    fn opening_twice_reuses_the_conversation() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let first = open_conversation(&db, pair(&ada.id, &grace.id), Utc::now()).unwrap();
        let second = open_conversation(&db, pair(&grace.id, &ada.id), Utc::now()).unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(conversation_between(&db, &grace.id, &ada.id).unwrap().id, first.id);
    }

    #[test]
    fn send_edit_delete_and_read() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let convo = open_conversation(&db, pair(&ada.id, &grace.id), Utc::now()).unwrap();

        let sent = send_message(
            &db,
            SendMessageRequest {
                conversation_id: convo.id.clone(),
                sender_id: ada.id.clone(),
                recipient_id: grace.id.clone(),
                content: "hi".into(),
            },
            Utc::now(),
        )
        .unwrap();
        assert_eq!(unread_messages(&db, &grace.id).unwrap().len(), 1);

        let edited = edit_message(&db, &sent.id, UpdateMessageRequest { content: "hello".into() }, Utc::now())
            .unwrap();
        assert!(edited.edited);
        assert!(edited.updated_at.is_some());

        assert_eq!(mark_read(&db, &[sent.id.clone()], Utc::now()).unwrap(), 1);
        assert!(unread_messages(&db, &grace.id).unwrap().is_empty());

        delete_message(&db, &sent.id, Utc::now()).unwrap();
        let thread = conversation_messages(&db, &convo.id).unwrap();
        assert!(thread[0].deleted);
        assert_eq!(thread[0].content, "");
        assert!(thread[0].read_at.is_some());
    }

    #[test]
    fn outsiders_cannot_post_into_a_conversation() {
        let db = db();
        let ada = user(&db, "ada");
        let grace = user(&db, "grace");
        let linus = user(&db, "linus");
        let convo = open_conversation(&db, pair(&ada.id, &grace.id), Utc::now()).unwrap();

        let res = send_message(
            &db,
            SendMessageRequest {
                conversation_id: convo.id,
                sender_id: linus.id.clone(),
                recipient_id: ada.id.clone(),
                content: "psst".into(),
            },
            Utc::now(),
        );
        assert!(matches!(res, Err(ApiError::BadRequest(_))));
        assert!(matches!(conversation_between(&db, &ada.id, &linus.id), Err(ApiError::NotFound(_))));
    }
}
