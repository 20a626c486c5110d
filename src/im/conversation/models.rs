//! 会话本地模型定义

use crate::im::friend::models::canonical_pair;
use crate::im::message::models::Message;
use serde::{Deserialize, Serialize};

/// 会话 ID 中两个 userID 之间的分隔符
pub const CONVERSATION_ID_SEPARATOR: char = '-';

/// 由两个 userID 计算会话 ID：较大的 ID 在前，与参数顺序无关
pub fn conversation_id(a: &str, b: &str) -> String {
    let (first, second) = canonical_pair(a, b);
    format!("{}{}{}", first, CONVERSATION_ID_SEPARATOR, second)
}

/// 单聊会话及其全部消息
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conversation {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    /// 两个参与者，较大的 ID 在前
    pub participants: (String, String),
    #[serde(rename = "createTime")]
    pub created_at: i64,
    #[serde(rename = "updateTime")]
    pub updated_at: i64,
    /// 按发送顺序排列
    pub messages: Vec<Message>,
}

#[cfg(test)]
impl Conversation {
    /// 会话中除 `user_id` 之外的另一方
    pub fn peer_of(&self, user_id: &str) -> &str {
        if self.participants.0 == user_id {
            &self.participants.1
        } else {
            &self.participants.0
        }
    }
}

/// 会话列表项（不含消息正文列表）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationSummary {
    #[serde(rename = "conversationID")]
    pub conversation_id: String,
    #[serde(rename = "userID")]
    pub peer_id: String,
    /// 最新一条消息内容
    pub latest_msg: String,
    #[serde(rename = "latestMsgSendTime")]
    pub updated_at: i64,
    /// 当前用户在该会话中的未读数
    pub unread_count: i64,
}
