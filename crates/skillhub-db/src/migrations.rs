use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (initial schema)");
        conn.execute_batch(
            "
            CREATE TABLE app_users (
                id                  TEXT PRIMARY KEY,
                username            TEXT NOT NULL UNIQUE,
                email               TEXT NOT NULL UNIQUE,
                first_name          TEXT,
                last_name           TEXT,
                profile_image_url   TEXT,
                created_at          TEXT NOT NULL
            );

            CREATE TABLE user_posts (
                id          TEXT PRIMARY KEY,
                posted_by   TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                posted_at   TEXT NOT NULL,
                title       TEXT NOT NULL,
                description TEXT NOT NULL DEFAULT '',
                medias      TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX idx_posts_author ON user_posts(posted_by, posted_at);

            CREATE TABLE likes (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                post_id     TEXT NOT NULL REFERENCES user_posts(id) ON DELETE CASCADE,
                created_at  TEXT NOT NULL,
                UNIQUE(user_id, post_id)
            );

            CREATE INDEX idx_likes_post ON likes(post_id);

            CREATE TABLE comments (
                id          TEXT PRIMARY KEY,
                user_id     TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                post_id     TEXT NOT NULL REFERENCES user_posts(id) ON DELETE CASCADE,
                content     TEXT NOT NULL,
                created_at  TEXT NOT NULL,
                updated_at  TEXT NOT NULL
            );

            CREATE INDEX idx_comments_post ON comments(post_id, created_at);
            CREATE INDEX idx_comments_user ON comments(user_id);

            CREATE TABLE user_relationships (
                id              TEXT PRIMARY KEY,
                follower_id     TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                following_id    TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                created_at      TEXT NOT NULL,
                UNIQUE(follower_id, following_id),
                CHECK(follower_id <> following_id)
            );

            CREATE INDEX idx_relationships_following ON user_relationships(following_id);

            CREATE TABLE learning_plans (
                id                      TEXT PRIMARY KEY,
                owner_id                TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                title                   TEXT NOT NULL,
                description             TEXT,
                category                TEXT,
                skill_level             TEXT,
                is_public               INTEGER NOT NULL DEFAULT 0,
                is_completed            INTEGER NOT NULL DEFAULT 0,
                target_completion_date  TEXT,
                actual_completion_date  TEXT,
                created_at              TEXT NOT NULL,
                updated_at              TEXT NOT NULL,
                estimated_hours         INTEGER NOT NULL DEFAULT 0,
                completed_hours         INTEGER NOT NULL DEFAULT 0,
                learning_units          TEXT NOT NULL DEFAULT '[]',
                resources               TEXT NOT NULL DEFAULT '[]',
                tags                    TEXT NOT NULL DEFAULT '[]',
                view_count              INTEGER NOT NULL DEFAULT 0,
                fork_count              INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_plans_owner ON learning_plans(owner_id);
            CREATE INDEX idx_plans_public ON learning_plans(is_public);

            CREATE TABLE progress_updates (
                id                  TEXT PRIMARY KEY,
                user_id             TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                related_plan_id     TEXT REFERENCES learning_plans(id) ON DELETE SET NULL,
                learning_unit_id    TEXT,
                title               TEXT NOT NULL,
                content             TEXT NOT NULL DEFAULT '',
                is_public           INTEGER NOT NULL DEFAULT 0,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                hours_spent         INTEGER NOT NULL DEFAULT 0,
                progress_type       TEXT,
                rating              INTEGER,
                template_type       TEXT,
                sentiment           TEXT,
                challenges          TEXT NOT NULL DEFAULT '[]',
                achievements        TEXT NOT NULL DEFAULT '[]',
                attached_media      TEXT NOT NULL DEFAULT '[]',
                like_count          INTEGER NOT NULL DEFAULT 0,
                comment_count       INTEGER NOT NULL DEFAULT 0,
                viewed_by           TEXT NOT NULL DEFAULT '[]'
            );

            CREATE INDEX idx_progress_user ON progress_updates(user_id);
            CREATE INDEX idx_progress_plan ON progress_updates(related_plan_id);

            CREATE TABLE notifications (
                id              TEXT PRIMARY KEY,
                recipient_id    TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                sender_id       TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                kind            TEXT NOT NULL,
                message         TEXT NOT NULL,
                target_type     TEXT NOT NULL,
                target_id       TEXT NOT NULL,
                is_read         INTEGER NOT NULL DEFAULT 0,
                created_at      TEXT NOT NULL,
                read_at         TEXT
            );

            CREATE INDEX idx_notifications_recipient
                ON notifications(recipient_id, created_at);

            CREATE TABLE conversations (
                id                  TEXT PRIMARY KEY,
                participant1_id     TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                participant2_id     TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL
            );

            CREATE TABLE messages (
                id                  TEXT PRIMARY KEY,
                conversation_id     TEXT NOT NULL REFERENCES conversations(id) ON DELETE CASCADE,
                sender_id           TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                recipient_id        TEXT NOT NULL REFERENCES app_users(id) ON DELETE CASCADE,
                content             TEXT NOT NULL,
                sent_at             TEXT NOT NULL,
                updated_at          TEXT,
                read_at             TEXT,
                edited              INTEGER NOT NULL DEFAULT 0,
                deleted             INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX idx_messages_conversation ON messages(conversation_id, sent_at);
            CREATE INDEX idx_messages_recipient ON messages(recipient_id);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
