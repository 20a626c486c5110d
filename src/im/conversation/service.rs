//! 会话服务层
//!
//! 发送消息前校验好友关系；首次发消息时创建会话，之后追加。
//! 标记已读只处理对方发来的消息。

use crate::im::conversation::dao::ConversationDao;
use crate::im::conversation::listener::{ConversationListener, EmptyConversationListener};
use crate::im::conversation::models::{conversation_id, Conversation, ConversationSummary};
use crate::im::db;
use crate::im::error::{ChatError, Result};
use crate::im::friend::dao::FriendDao;
use crate::im::message::dao::MessageDao;
use crate::im::serialization::now_millis;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 会话引擎
pub struct ConversationEngine {
    db: Pool<Sqlite>,
    conversation_dao: ConversationDao,
    message_dao: MessageDao,
    listener: Arc<dyn ConversationListener>,
}

impl ConversationEngine {
    /// 创建会话引擎（使用默认空监听器）
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self::with_listener(db, Arc::new(EmptyConversationListener))
    }

    /// 创建会话引擎（带自定义监听器，使用共享连接池）
    pub fn with_listener(db: Pool<Sqlite>, listener: Arc<dyn ConversationListener>) -> Self {
        Self {
            conversation_dao: ConversationDao::new(db.clone()),
            message_dao: MessageDao::new(db.clone()),
            db,
            listener,
        }
    }

    /// 发送消息，返回发送后的完整会话（含全部消息）
    pub async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<Conversation> {
        let conv_id = conversation_id(sender_id, recipient_id);
        let mut tx = db::begin_write(&self.db).await?;

        if !FriendDao::friendship_exists(&mut tx, sender_id, recipient_id).await? {
            warn!(
                "[ConvService] {} 与 {} 不是好友，拒绝发送",
                sender_id, recipient_id
            );
            return Err(ChatError::NotFriends {
                user_id: sender_id.to_string(),
                other_id: recipient_id.to_string(),
            });
        }

        let now = now_millis();
        let created = if ConversationDao::exists(&mut tx, &conv_id).await? {
            false
        } else {
            match ConversationDao::insert(&mut tx, &conv_id, sender_id, recipient_id, now).await {
                Ok(()) => true,
                // 并发的首条消息已经建好了会话，改为追加
                Err(ChatError::StoreTransactionFailed(ref e)) if ChatError::is_unique_violation(e) => {
                    debug!("[ConvService] 会话 {} 已被并发创建，转为追加消息", conv_id);
                    false
                }
                Err(e) => return Err(e),
            }
        };
        if !created {
            ConversationDao::touch(&mut tx, &conv_id, now).await?;
        }

        let message =
            MessageDao::insert_message(&mut tx, &conv_id, sender_id, recipient_id, text, now)
                .await?;
        let conversation = ConversationDao::load(&mut tx, &conv_id)
            .await?
            .ok_or_else(|| ChatError::ConversationNotFound(conv_id.clone()))?;
        tx.commit().await?;

        info!(
            "[ConvService] 消息已发送: {} -> {}, 会话: {}, seq: {}",
            sender_id, recipient_id, conv_id, message.seq
        );
        if let Ok(json) = serde_json::to_string(&conversation) {
            if created {
                self.listener.on_new_conversation(json).await;
            } else {
                self.listener.on_conversation_changed(json).await;
            }
        }
        Ok(conversation)
    }

    /// `user_id` 确认已读 `peer_id` 在双方会话中发来的全部消息，返回更新条数
    ///
    /// 没有对方消息时返回 `NoMessagesFound`，不会写库。
    pub async fn mark_read(&self, user_id: &str, peer_id: &str) -> Result<u64> {
        let conv_id = conversation_id(user_id, peer_id);
        let mut tx = db::begin_write(&self.db).await?;

        if !ConversationDao::exists(&mut tx, &conv_id).await? {
            return Err(ChatError::ConversationNotFound(conv_id));
        }

        let ids = MessageDao::select_ids_by_sender(&mut tx, &conv_id, peer_id).await?;
        if ids.is_empty() {
            debug!("[ConvService] 会话 {} 中没有 {} 发来的消息", conv_id, peer_id);
            return Err(ChatError::NoMessagesFound(conv_id));
        }

        let updated = MessageDao::mark_read_by_ids(&mut tx, &ids).await?;
        tx.commit().await?;

        info!(
            "[ConvService] {} 已读会话 {} 中 {} 条消息",
            user_id, conv_id, updated
        );
        let receipt = serde_json::json!({
            "conversationID": conv_id,
            "readerID": user_id,
            "count": updated,
        });
        self.listener.on_messages_read(receipt.to_string()).await;
        Ok(updated)
    }

    /// 读取两人之间的会话
    pub async fn get_conversation(&self, a: &str, b: &str) -> Result<Conversation> {
        let conv_id = conversation_id(a, b);
        self.conversation_dao
            .get_conversation(&conv_id)
            .await?
            .ok_or(ChatError::ConversationNotFound(conv_id))
    }

    /// 用户的会话列表
    pub async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        self.conversation_dao.get_summaries_for_user(user_id).await
    }

    /// `user_id` 在与 `peer_id` 的会话中的未读数；会话不存在时为 0
    pub async fn unread_count(&self, user_id: &str, peer_id: &str) -> Result<i64> {
        let conv_id = conversation_id(user_id, peer_id);
        self.message_dao.count_unread(&conv_id, user_id).await
    }
}
