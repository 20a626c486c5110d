//! 对外 JSON 请求 / 响应结构
//!
//! 传输层（HTTP、CLI 等）只需把请求反序列化为 `ApiRequest`，
//! 交给 `ChatClient::dispatch`，再把 `ApiResponse` 序列化回去。

use crate::im::error::ChatError;
use crate::im::serialization::deserialize_trimmed;
use serde::{Deserialize, Serialize};

/// 对外暴露的全部操作
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum ApiRequest {
    /// 注册
    CreateUser {
        #[serde(deserialize_with = "deserialize_trimmed")]
        email: String,
    },
    /// 按邮箱查询
    GetUser {
        #[serde(deserialize_with = "deserialize_trimmed")]
        email: String,
    },
    /// 按 userID 查询
    GetUserById {
        #[serde(rename = "userID")]
        user_id: String,
    },
    SendFriendRequest {
        #[serde(rename = "fromUserID")]
        sender_id: String,
        #[serde(rename = "toUserID")]
        receiver_id: String,
    },
    AcceptFriendRequest {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "friendUserID")]
        friend_id: String,
    },
    RejectFriendRequest {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "friendUserID")]
        friend_id: String,
    },
    /// 按申请 ID 同意
    AcceptFriendRequestById {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "requestID")]
        request_id: String,
    },
    /// 按申请 ID 拒绝
    RejectFriendRequestById {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "requestID")]
        request_id: String,
    },
    /// 收到的待处理申请
    GetFriendRequests {
        #[serde(rename = "userID")]
        user_id: String,
    },
    /// 发出的待处理申请
    GetSentFriendRequests {
        #[serde(rename = "userID")]
        user_id: String,
    },
    SendMessage {
        #[serde(rename = "sendID")]
        sender_id: String,
        #[serde(rename = "recvID")]
        recipient_id: String,
        text: String,
    },
    MarkRead {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "peerUserID")]
        peer_id: String,
    },
    GetConversation {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "peerUserID")]
        peer_id: String,
    },
    GetConversations {
        #[serde(rename = "userID")]
        user_id: String,
    },
    GetUnreadCount {
        #[serde(rename = "userID")]
        user_id: String,
        #[serde(rename = "peerUserID")]
        peer_id: String,
    },
}

/// 统一的 API 响应包装结构体（包含 errCode、errMsg、data）
///
/// errCode 为 0 表示成功；否则为 `ChatError::code()`，data 为 None。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(rename = "errCode")]
    pub err_code: i32,
    #[serde(rename = "errMsg")]
    pub err_msg: String,
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            err_code: 0,
            err_msg: String::new(),
            data: Some(data),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.err_code == 0
    }
}

impl<T> From<&ChatError> for ApiResponse<T> {
    fn from(err: &ChatError) -> Self {
        Self {
            err_code: err.code(),
            err_msg: err.to_string(),
            data: None,
        }
    }
}

impl<T> From<crate::im::error::Result<T>> for ApiResponse<T> {
    fn from(res: crate::im::error::Result<T>) -> Self {
        match res {
            Ok(data) => Self::ok(data),
            Err(e) => Self::from(&e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_is_tagged_by_op() {
        let req: ApiRequest = serde_json::from_str(
            r#"{"op":"sendMessage","sendID":"a","recvID":"b","text":"hi"}"#,
        )
        .unwrap();
        assert!(matches!(
            req,
            ApiRequest::SendMessage { ref sender_id, ref text, .. } if sender_id == "a" && text == "hi"
        ));
    }

    #[test]
    fn accept_by_id_uses_request_id_field() {
        let req: ApiRequest = serde_json::from_str(
            r#"{"op":"acceptFriendRequestById","userID":"b","requestID":"r1"}"#,
        )
        .unwrap();
        assert!(matches!(
            req,
            ApiRequest::AcceptFriendRequestById { ref user_id, ref request_id }
                if user_id == "b" && request_id == "r1"
        ));
    }

    #[test]
    fn create_user_email_is_trimmed() {
        let req: ApiRequest =
            serde_json::from_str(r#"{"op":"createUser","email":" a@x.com "}"#).unwrap();
        assert!(matches!(req, ApiRequest::CreateUser { ref email } if email == "a@x.com"));
    }

    #[test]
    fn error_response_carries_code_and_no_data() {
        let res: crate::im::error::Result<()> = Err(ChatError::NotFriends {
            user_id: "a".into(),
            other_id: "b".into(),
        });
        let resp: ApiResponse<()> = res.into();
        assert_eq!(resp.err_code, 1201);
        assert!(resp.data.is_none());
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["errCode"], 1201);
        assert!(json["data"].is_null());
    }
}
