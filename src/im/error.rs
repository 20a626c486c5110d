//! 统一错误类型
//!
//! 所有对外操作都返回 `Result<T>`，失败时按种类区分，调用方无需解析错误字符串。

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// 出错时涉及的是哪一方用户
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Party {
    /// 操作发起方
    Sender,
    /// 操作接收方
    Receiver,
    /// 按邮箱或 ID 直接查询的账号
    Account,
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Party::Sender => write!(f, "发送方"),
            Party::Receiver => write!(f, "接收方"),
            Party::Account => write!(f, "账号"),
        }
    }
}

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("用户不存在（{party}）: {key}")]
    UserNotFound { party: Party, key: String },

    #[error("邮箱已注册: {0}")]
    DuplicateEmail(String),

    /// 携带查找条件：`发送方 -> 接收方` 或申请 ID
    #[error("好友申请不存在: {0}")]
    RequestNotFound(String),

    #[error("对方不是你的好友: {user_id} / {other_id}")]
    NotFriends { user_id: String, other_id: String },

    #[error("会话不存在: {0}")]
    ConversationNotFound(String),

    #[error("会话中没有待确认的消息: {0}")]
    NoMessagesFound(String),

    #[error("参数不合法: {0}")]
    InvalidInput(String),

    #[error("存储事务失败: {0}")]
    StoreTransactionFailed(#[from] sqlx::Error),

    #[error("数据库迁移失败: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("序列化失败: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ChatError {
    /// 稳定的错误码，用于 JSON 响应中的 errCode
    pub fn code(&self) -> i32 {
        match self {
            ChatError::UserNotFound { .. } => 1001,
            ChatError::DuplicateEmail(_) => 1002,
            ChatError::RequestNotFound(_) => 1101,
            ChatError::NotFriends { .. } => 1201,
            ChatError::ConversationNotFound(_) => 1202,
            ChatError::NoMessagesFound(_) => 1203,
            ChatError::InvalidInput(_) => 1400,
            ChatError::StoreTransactionFailed(_) => 1500,
            ChatError::Migration(_) => 1501,
            ChatError::Serialization(_) => 1502,
        }
    }

    /// 是否为底层存储唯一约束冲突
    pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}

pub type Result<T> = std::result::Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_distinct_per_kind() {
        let errors = vec![
            ChatError::UserNotFound {
                party: Party::Sender,
                key: "u1".into(),
            },
            ChatError::DuplicateEmail("a@x.com".into()),
            ChatError::RequestNotFound("a -> b".into()),
            ChatError::NotFriends {
                user_id: "a".into(),
                other_id: "b".into(),
            },
            ChatError::ConversationNotFound("b-a".into()),
            ChatError::NoMessagesFound("b-a".into()),
            ChatError::InvalidInput("empty".into()),
            ChatError::StoreTransactionFailed(sqlx::Error::RowNotFound),
        ];
        let mut codes: Vec<i32> = errors.iter().map(|e| e.code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn user_not_found_names_the_party() {
        let err = ChatError::UserNotFound {
            party: Party::Receiver,
            key: "bob".into(),
        };
        assert!(err.to_string().contains("接收方"));
        assert!(err.to_string().contains("bob"));
    }
}
