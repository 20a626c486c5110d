//! 消息数据访问层（DAO）
//!
//! 所有消息存放在同一张 `messages` 表中，按 conversation_id 区分会话，
//! 自增 seq 作为会话内的顺序。

use crate::im::error::Result;
use crate::im::message::models::{Message, MessageStatus};
use crate::im::serialization::generate_id;
use sqlx::sqlite::SqliteRow;
use sqlx::{Pool, Row, Sqlite, SqliteConnection};
use tracing::debug;

const UPDATE_BATCH: usize = 500;

/// 消息 DAO（基于 sqlx）
pub struct MessageDao {
    db: Pool<Sqlite>,
}

impl MessageDao {
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self { db }
    }

    /// `user_id` 在会话中尚未读的消息数（对方发来、状态仍为 sent）
    pub async fn count_unread(&self, conversation_id: &str, user_id: &str) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) AS unread FROM messages
            WHERE conversation_id = ? AND receiver_id = ? AND status = ?
            "#,
        )
        .bind(conversation_id)
        .bind(user_id)
        .bind(MessageStatus::Sent)
        .fetch_one(&self.db)
        .await?;
        Ok(row.try_get::<i64, _>("unread")?)
    }

    /// 写入一条新消息（状态为 sent），返回带 seq 的完整记录
    pub(crate) async fn insert_message(
        conn: &mut SqliteConnection,
        conversation_id: &str,
        sender_id: &str,
        receiver_id: &str,
        content: &str,
        now: i64,
    ) -> Result<Message> {
        let message_id = generate_id();
        let res = sqlx::query(
            r#"
            INSERT INTO messages (
                message_id, conversation_id, sender_id, receiver_id, content, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message_id)
        .bind(conversation_id)
        .bind(sender_id)
        .bind(receiver_id)
        .bind(content)
        .bind(MessageStatus::Sent)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        Ok(Message {
            message_id,
            seq: res.last_insert_rowid(),
            conversation_id: conversation_id.to_string(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            content: content.to_string(),
            status: MessageStatus::Sent,
            created_at: now,
        })
    }

    /// 会话内全部消息，按发送顺序
    pub(crate) async fn list_by_conversation(
        conn: &mut SqliteConnection,
        conversation_id: &str,
    ) -> Result<Vec<Message>> {
        let rows = sqlx::query(
            r#"
            SELECT seq, message_id, conversation_id, sender_id, receiver_id, content, status, created_at
            FROM messages
            WHERE conversation_id = ?
            ORDER BY seq
            "#,
        )
        .bind(conversation_id)
        .fetch_all(&mut *conn)
        .await?;
        rows.iter().map(Self::row_to_message).collect()
    }

    /// 会话内由 `sender_id` 发出的消息 ID
    pub(crate) async fn select_ids_by_sender(
        conn: &mut SqliteConnection,
        conversation_id: &str,
        sender_id: &str,
    ) -> Result<Vec<String>> {
        let rows = sqlx::query(
            "SELECT message_id FROM messages WHERE conversation_id = ? AND sender_id = ? ORDER BY seq",
        )
        .bind(conversation_id)
        .bind(sender_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows
            .iter()
            .map(|r| r.try_get::<String, _>("message_id"))
            .collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// 批量标记为已读，返回受影响行数
    pub(crate) async fn mark_read_by_ids(
        conn: &mut SqliteConnection,
        message_ids: &[String],
    ) -> Result<u64> {
        let mut updated = 0;
        // SQLite 单条语句的绑定参数数量有限，分批更新
        for chunk in message_ids.chunks(UPDATE_BATCH) {
            let sql = format!(
                "UPDATE messages SET status = ? WHERE message_id IN ({})",
                Self::placeholders(chunk.len())
            );
            let mut query = sqlx::query(&sql).bind(MessageStatus::Read);
            for id in chunk {
                query = query.bind(id);
            }
            updated += query.execute(&mut *conn).await?.rows_affected();
        }
        debug!(
            "[MessageDAO] 标记已读 {} 条（请求 {} 条）",
            updated,
            message_ids.len()
        );
        Ok(updated)
    }

    fn placeholders(n: usize) -> String {
        vec!["?"; n].join(",")
    }

    fn row_to_message(row: &SqliteRow) -> Result<Message> {
        Ok(Message {
            message_id: row.try_get("message_id")?,
            seq: row.try_get("seq")?,
            conversation_id: row.try_get("conversation_id")?,
            sender_id: row.try_get("sender_id")?,
            receiver_id: row.try_get("receiver_id")?,
            content: row.try_get("content")?,
            status: row.try_get("status")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
