//! 会话数据访问层（DAO）

use crate::im::conversation::models::{Conversation, ConversationSummary};
use crate::im::error::Result;
use crate::im::friend::models::canonical_pair;
use crate::im::message::dao::MessageDao;
use crate::im::message::models::MessageStatus;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::debug;

/// 会话 DAO（基于 sqlx）
pub struct ConversationDao {
    db: Pool<Sqlite>,
}

impl ConversationDao {
    /// 创建新的会话 DAO
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// 按会话 ID 读取（含全部消息）
    pub async fn get_conversation(&self, conversation_id: &str) -> Result<Option<Conversation>> {
        let mut conn = self.db.acquire().await?;
        Self::load(&mut conn, conversation_id).await
    }

    /// 用户参与的全部会话，最近有消息的在前
    pub async fn get_summaries_for_user(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT
                c.conversation_id,
                c.participant_a,
                c.participant_b,
                c.updated_at,
                (SELECT m.content FROM messages m
                    WHERE m.conversation_id = c.conversation_id
                    ORDER BY m.seq DESC LIMIT 1) AS latest_msg,
                (SELECT COUNT(*) FROM messages m
                    WHERE m.conversation_id = c.conversation_id
                      AND m.receiver_id = ? AND m.status = ?) AS unread_count
            FROM conversations c
            WHERE c.participant_a = ? OR c.participant_b = ?
            ORDER BY c.updated_at DESC, c.conversation_id
            "#,
        )
        .bind(user_id)
        .bind(MessageStatus::Sent)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(&self.db)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let participant_a: String = row.try_get("participant_a")?;
            let participant_b: String = row.try_get("participant_b")?;
            let peer_id = if participant_a == user_id {
                participant_b
            } else {
                participant_a
            };
            summaries.push(ConversationSummary {
                conversation_id: row.try_get("conversation_id")?,
                peer_id,
                latest_msg: row
                    .try_get::<Option<String>, _>("latest_msg")?
                    .unwrap_or_default(),
                updated_at: row.try_get("updated_at")?,
                unread_count: row.try_get("unread_count")?,
            });
        }
        debug!(
            "[ConvDAO] 用户 {} 的会话列表，共 {} 个",
            user_id,
            summaries.len()
        );
        Ok(summaries)
    }

    pub(crate) async fn exists(conn: &mut SqliteConnection, conversation_id: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM conversations WHERE conversation_id = ?")
            .bind(conversation_id)
            .fetch_optional(&mut *conn)
            .await?;
        Ok(row.is_some())
    }

    /// 新建会话；会话 ID 已存在时返回唯一约束错误，由调用方决定如何处理
    pub(crate) async fn insert(
        conn: &mut SqliteConnection,
        conversation_id: &str,
        a: &str,
        b: &str,
        now: i64,
    ) -> Result<()> {
        let (participant_a, participant_b) = canonical_pair(a, b);
        sqlx::query(
            r#"
            INSERT INTO conversations (
                conversation_id, participant_a, participant_b, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(conversation_id)
        .bind(participant_a)
        .bind(participant_b)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    /// 更新会话的最近活动时间
    pub(crate) async fn touch(
        conn: &mut SqliteConnection,
        conversation_id: &str,
        now: i64,
    ) -> Result<()> {
        sqlx::query("UPDATE conversations SET updated_at = ? WHERE conversation_id = ?")
            .bind(now)
            .bind(conversation_id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }

    pub(crate) async fn load(
        conn: &mut SqliteConnection,
        conversation_id: &str,
    ) -> Result<Option<Conversation>> {
        let row = sqlx::query(
            r#"
            SELECT conversation_id, participant_a, participant_b, created_at, updated_at
            FROM conversations
            WHERE conversation_id = ?
            "#,
        )
        .bind(conversation_id)
        .fetch_optional(&mut *conn)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let messages = MessageDao::list_by_conversation(conn, conversation_id).await?;
        Ok(Some(Conversation {
            conversation_id: row.try_get("conversation_id")?,
            participants: (row.try_get("participant_a")?, row.try_get("participant_b")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
            messages,
        }))
    }
}
