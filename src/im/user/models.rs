//! 用户本地模型定义

use serde::{Deserialize, Serialize};

/// 用户记录
///
/// `friends`、`outgoing_requests`、`incoming_requests` 不单独存储，
/// 读取时由好友关系表和好友申请表派生，因此两侧视图不会出现不一致。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "userID")]
    pub id: String,
    pub email: String,
    /// 注册时间（毫秒）
    #[serde(rename = "createTime")]
    pub created_at: i64,
    /// 好友 userID 列表，按成为好友的先后排序
    pub friends: Vec<String>,
    /// 自己发出且未被拒绝的好友申请 ID
    pub outgoing_requests: Vec<String>,
    /// 收到且未被拒绝的好友申请 ID
    pub incoming_requests: Vec<String>,
}

#[cfg(test)]
impl User {
    pub fn is_friend_of(&self, other_id: &str) -> bool {
        self.friends.iter().any(|f| f == other_id)
    }
}
