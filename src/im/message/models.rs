//! 消息本地模型定义

use serde::{Deserialize, Serialize};

/// 消息状态，只会从 sent 变为 read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum MessageStatus {
    Sent,
    Read,
}

/// 单聊消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "clientMsgID")]
    pub message_id: String,
    /// 存储分配的递增序号，决定发送顺序
    pub seq: i64,
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "sendID")]
    pub sender_id: String,
    #[serde(rename = "recvID")]
    pub receiver_id: String,
    pub content: String,
    pub status: MessageStatus,
    /// 创建时间（毫秒）
    #[serde(rename = "createTime")]
    pub created_at: i64,
}
