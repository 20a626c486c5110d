//! 好友本地模型定义

use serde::{Deserialize, Serialize};

/// 好友申请状态，只允许 pending -> accepted 或 pending -> rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Rejected,
}

impl RequestStatus {
    /// 终态不可再变更
    pub fn is_terminal(self) -> bool {
        !matches!(self, RequestStatus::Pending)
    }
}

/// 好友申请
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FriendRequest {
    #[serde(rename = "requestID")]
    pub request_id: String,
    #[serde(rename = "fromUserID")]
    pub sender_id: String,
    #[serde(rename = "toUserID")]
    pub receiver_id: String,
    pub status: RequestStatus,
    /// 创建时间（毫秒）
    #[serde(rename = "createTime")]
    pub created_at: i64,
    /// 最近一次状态变更时间（毫秒）
    #[serde(rename = "handleTime")]
    pub updated_at: i64,
}

/// 一对用户的规范顺序：较大的 ID 在前
///
/// 好友关系表和会话 ID 都用这个顺序，保证与调用方传参顺序无关。
pub fn canonical_pair<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
    if a > b {
        (a, b)
    } else {
        (b, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_pair_is_order_independent() {
        assert_eq!(canonical_pair("a", "b"), canonical_pair("b", "a"));
        assert_eq!(canonical_pair("a", "b"), ("b", "a"));
    }

    #[test]
    fn only_pending_is_actionable() {
        assert!(!RequestStatus::Pending.is_terminal());
        assert!(RequestStatus::Accepted.is_terminal());
        assert!(RequestStatus::Rejected.is_terminal());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&RequestStatus::Accepted).unwrap();
        assert_eq!(json, "\"accepted\"");
    }
}
