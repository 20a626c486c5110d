//! 客户端门面
//!
//! 持有显式创建的连接池，组装用户存储、好友申请引擎与会话引擎，
//! 并提供基于 `ApiRequest` 的统一分发入口。

use crate::im::conversation::{
    Conversation, ConversationEngine, ConversationListener, ConversationSummary,
    EmptyConversationListener,
};
use crate::im::db;
use crate::im::error::{ChatError, Party, Result};
use crate::im::friend::{EmptyFriendListener, FriendListener, FriendRequest, FriendRequestEngine};
use crate::im::types::{ApiRequest, ApiResponse};
use crate::im::user::{User, UserDao};
use serde::Serialize;
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info};

/// 客户端配置
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// SQLite 数据库 URL，例如 `sqlite://chat.db?mode=rwc`
    pub db_url: String,
    /// 连接池最大连接数
    pub max_connections: u32,
}

impl ClientConfig {
    /// 创建默认配置
    pub fn new(db_url: impl Into<String>) -> Self {
        Self {
            db_url: db_url.into(),
            max_connections: 5,
        }
    }

    /// 内存数据库（进程退出即丢失），只能使用单连接
    pub fn in_memory() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            max_connections: 1,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("sqlite://chat.db?mode=rwc")
    }
}

/// 社交聊天客户端
pub struct ChatClient {
    db: Pool<Sqlite>,
    users: UserDao,
    friends: FriendRequestEngine,
    conversations: ConversationEngine,
}

impl ChatClient {
    /// 打开数据库并执行迁移（使用默认空监听器）
    pub async fn open(config: ClientConfig) -> Result<Self> {
        Self::open_with_listeners(
            config,
            Arc::new(EmptyFriendListener),
            Arc::new(EmptyConversationListener),
        )
        .await
    }

    /// 打开数据库并执行迁移（带自定义监听器）
    pub async fn open_with_listeners(
        config: ClientConfig,
        friend_listener: Arc<dyn FriendListener>,
        conversation_listener: Arc<dyn ConversationListener>,
    ) -> Result<Self> {
        info!("[Client] 打开数据库: {}", config.db_url);
        let db =
            db::create_sqlite_pool_with_migration(&config.db_url, config.max_connections).await?;
        Ok(Self {
            users: UserDao::new(db.clone()),
            friends: FriendRequestEngine::with_listener(db.clone(), friend_listener),
            conversations: ConversationEngine::with_listener(db.clone(), conversation_listener),
            db,
        })
    }

    /// 关闭连接池
    pub async fn close(self) {
        db::close(&self.db).await;
    }

    /// 注册用户
    pub async fn create_user(&self, email: &str) -> Result<User> {
        self.users.create(email).await
    }

    /// 按邮箱查询用户
    pub async fn get_user(&self, email: &str) -> Result<User> {
        self.users
            .get_by_email(email)
            .await?
            .ok_or_else(|| ChatError::UserNotFound {
                party: Party::Account,
                key: email.trim().to_string(),
            })
    }

    /// 按 userID 查询用户
    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or_else(|| ChatError::UserNotFound {
                party: Party::Account,
                key: user_id.to_string(),
            })
    }

    pub async fn send_friend_request(
        &self,
        sender_id: &str,
        receiver_id: &str,
    ) -> Result<FriendRequest> {
        self.friends.send_request(sender_id, receiver_id).await
    }

    pub async fn accept_friend_request(&self, user_id: &str, friend_id: &str) -> Result<User> {
        self.friends.accept_request(user_id, friend_id).await
    }

    pub async fn reject_friend_request(&self, user_id: &str, friend_id: &str) -> Result<User> {
        self.friends.reject_request(user_id, friend_id).await
    }

    pub async fn accept_friend_request_by_id(
        &self,
        user_id: &str,
        request_id: &str,
    ) -> Result<User> {
        self.friends.accept_request_by_id(user_id, request_id).await
    }

    pub async fn reject_friend_request_by_id(
        &self,
        user_id: &str,
        request_id: &str,
    ) -> Result<User> {
        self.friends.reject_request_by_id(user_id, request_id).await
    }

    /// 收到的待处理好友申请
    pub async fn get_friend_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        self.friends.list_incoming_requests(user_id).await
    }

    /// 发出的待处理好友申请
    pub async fn get_sent_friend_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        self.friends.list_outgoing_requests(user_id).await
    }

    pub async fn send_message(
        &self,
        sender_id: &str,
        recipient_id: &str,
        text: &str,
    ) -> Result<Conversation> {
        self.conversations
            .send_message(sender_id, recipient_id, text)
            .await
    }

    pub async fn mark_read(&self, user_id: &str, peer_id: &str) -> Result<u64> {
        self.conversations.mark_read(user_id, peer_id).await
    }

    pub async fn get_conversation(&self, user_id: &str, peer_id: &str) -> Result<Conversation> {
        self.conversations.get_conversation(user_id, peer_id).await
    }

    pub async fn get_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        self.conversations.list_conversations(user_id).await
    }

    pub async fn get_unread_count(&self, user_id: &str, peer_id: &str) -> Result<i64> {
        self.conversations.unread_count(user_id, peer_id).await
    }

    /// 按请求类型分发，结果统一包装为 `ApiResponse`
    pub async fn dispatch(&self, req: ApiRequest) -> ApiResponse<serde_json::Value> {
        debug!("[Client] 分发请求: {:?}", req);
        let res = match req {
            ApiRequest::CreateUser { email } => to_value(self.create_user(&email).await),
            ApiRequest::GetUser { email } => to_value(self.get_user(&email).await),
            ApiRequest::GetUserById { user_id } => to_value(self.get_user_by_id(&user_id).await),
            ApiRequest::SendFriendRequest {
                sender_id,
                receiver_id,
            } => to_value(self.send_friend_request(&sender_id, &receiver_id).await),
            ApiRequest::AcceptFriendRequest { user_id, friend_id } => {
                to_value(self.accept_friend_request(&user_id, &friend_id).await)
            }
            ApiRequest::RejectFriendRequest { user_id, friend_id } => {
                to_value(self.reject_friend_request(&user_id, &friend_id).await)
            }
            ApiRequest::AcceptFriendRequestById {
                user_id,
                request_id,
            } => to_value(self.accept_friend_request_by_id(&user_id, &request_id).await),
            ApiRequest::RejectFriendRequestById {
                user_id,
                request_id,
            } => to_value(self.reject_friend_request_by_id(&user_id, &request_id).await),
            ApiRequest::GetFriendRequests { user_id } => {
                to_value(self.get_friend_requests(&user_id).await)
            }
            ApiRequest::GetSentFriendRequests { user_id } => {
                to_value(self.get_sent_friend_requests(&user_id).await)
            }
            ApiRequest::SendMessage {
                sender_id,
                recipient_id,
                text,
            } => to_value(self.send_message(&sender_id, &recipient_id, &text).await),
            ApiRequest::MarkRead { user_id, peer_id } => {
                to_value(self.mark_read(&user_id, &peer_id).await)
            }
            ApiRequest::GetConversation { user_id, peer_id } => {
                to_value(self.get_conversation(&user_id, &peer_id).await)
            }
            ApiRequest::GetConversations { user_id } => {
                to_value(self.get_conversations(&user_id).await)
            }
            ApiRequest::GetUnreadCount { user_id, peer_id } => {
                to_value(self.get_unread_count(&user_id, &peer_id).await)
            }
        };
        res.into()
    }
}

fn to_value<T: Serialize>(res: Result<T>) -> Result<serde_json::Value> {
    Ok(serde_json::to_value(res?)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::im::conversation::conversation_id;
    use crate::im::db::test_support::init_test_logger;
    use crate::im::message::MessageStatus;

    async fn open_memory() -> ChatClient {
        init_test_logger();
        ChatClient::open(ClientConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn alice_and_bob_end_to_end() {
        let client = open_memory().await;
        let alice = client.create_user("alice@x.com").await.unwrap();
        let bob = client.create_user("bob@x.com").await.unwrap();

        client.send_friend_request(&alice.id, &bob.id).await.unwrap();
        let bob = client.accept_friend_request(&bob.id, &alice.id).await.unwrap();
        let alice = client.get_user("alice@x.com").await.unwrap();
        assert!(alice.is_friend_of(&bob.id));
        assert!(bob.is_friend_of(&alice.id));

        let conv = client.send_message(&alice.id, &bob.id, "hi").await.unwrap();
        assert_eq!(conv.conversation_id, conversation_id(&alice.id, &bob.id));
        assert_eq!(conv.messages.len(), 1);
        assert_eq!(conv.messages[0].status, MessageStatus::Sent);

        assert_eq!(client.mark_read(&bob.id, &alice.id).await.unwrap(), 1);
        let conv = client.get_conversation(&bob.id, &alice.id).await.unwrap();
        assert_eq!(conv.messages[0].status, MessageStatus::Read);

        client.close().await;
    }

    #[tokio::test]
    async fn unknown_email_is_user_not_found() {
        let client = open_memory().await;
        let err = client.get_user("nobody@x.com").await.unwrap_err();
        assert!(matches!(
            err,
            ChatError::UserNotFound {
                party: Party::Account,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn dispatch_wraps_results_and_errors() {
        let client = open_memory().await;
        let resp = client
            .dispatch(ApiRequest::CreateUser {
                email: "alice@x.com".into(),
            })
            .await;
        assert!(resp.is_ok());
        let alice_id = resp.data.unwrap()["userID"].as_str().unwrap().to_string();

        let resp = client
            .dispatch(ApiRequest::CreateUser {
                email: "alice@x.com".into(),
            })
            .await;
        assert_eq!(resp.err_code, ChatError::DuplicateEmail(String::new()).code());

        let bob = client.create_user("bob@x.com").await.unwrap();
        let resp = client
            .dispatch(ApiRequest::SendMessage {
                sender_id: alice_id,
                recipient_id: bob.id,
                text: "hi".into(),
            })
            .await;
        assert!(!resp.is_ok());
        assert_eq!(resp.err_code, 1201);
    }

    async fn call(client: &ChatClient, req: serde_json::Value) -> ApiResponse<serde_json::Value> {
        let req: ApiRequest = serde_json::from_value(req).unwrap();
        client.dispatch(req).await
    }

    #[tokio::test]
    async fn dispatch_covers_every_operation() {
        use serde_json::json;

        let client = open_memory().await;
        let alice = client.create_user("alice@x.com").await.unwrap().id;
        let bob = client.create_user("bob@x.com").await.unwrap().id;
        let carol = client.create_user("carol@x.com").await.unwrap().id;

        let resp = call(
            &client,
            json!({"op": "sendFriendRequest", "fromUserID": alice, "toUserID": bob}),
        )
        .await;
        assert!(resp.is_ok(), "{}", resp.err_msg);
        let request_id = resp.data.unwrap()["requestID"].as_str().unwrap().to_string();

        let cases = vec![
            (json!({"op": "getUser", "email": "alice@x.com"}), 0),
            (json!({"op": "getUserById", "userID": "ghost"}), 1001),
            (json!({"op": "getFriendRequests", "userID": bob}), 0),
            (json!({"op": "getSentFriendRequests", "userID": alice}), 0),
            // 方向相反，alice 没有收到申请
            (json!({"op": "acceptFriendRequest", "userID": alice, "friendUserID": bob}), 1101),
            (json!({"op": "acceptFriendRequestById", "userID": bob, "requestID": request_id}), 0),
            (json!({"op": "acceptFriendRequestById", "userID": bob, "requestID": request_id}), 1101),
            (json!({"op": "sendFriendRequest", "fromUserID": carol, "toUserID": bob}), 0),
            (json!({"op": "rejectFriendRequest", "userID": bob, "friendUserID": carol}), 0),
            (json!({"op": "rejectFriendRequestById", "userID": bob, "requestID": "missing"}), 1101),
            (json!({"op": "markRead", "userID": bob, "peerUserID": alice}), 1202),
            (json!({"op": "sendMessage", "sendID": alice, "recvID": bob, "text": "hi"}), 0),
            (json!({"op": "sendMessage", "sendID": carol, "recvID": bob, "text": "hi"}), 1201),
            (json!({"op": "markRead", "userID": alice, "peerUserID": bob}), 1203),
            (json!({"op": "getUnreadCount", "userID": bob, "peerUserID": alice}), 0),
            (json!({"op": "markRead", "userID": bob, "peerUserID": alice}), 0),
            (json!({"op": "getConversation", "userID": bob, "peerUserID": alice}), 0),
            (json!({"op": "getConversation", "userID": carol, "peerUserID": alice}), 1202),
            (json!({"op": "getConversations", "userID": alice}), 0),
            (json!({"op": "createUser", "email": "alice@x.com"}), 1002),
        ];
        for (req, code) in cases {
            let resp = call(&client, req.clone()).await;
            assert_eq!(resp.err_code, code, "{req} -> {}", resp.err_msg);
            assert_eq!(resp.data.is_some(), code == 0, "{req}");
        }

        let bob_user = call(&client, json!({"op": "getUserById", "userID": bob})).await;
        assert_eq!(bob_user.data.unwrap()["friends"], json!([alice]));
        let sent = call(&client, json!({"op": "getSentFriendRequests", "userID": carol})).await;
        assert_eq!(sent.data.unwrap(), json!([]));
        let unread = call(
            &client,
            json!({"op": "getUnreadCount", "userID": bob, "peerUserID": alice}),
        )
        .await;
        assert_eq!(unread.data.unwrap(), json!(0));
        let list = call(&client, json!({"op": "getConversations", "userID": bob})).await;
        assert_eq!(list.data.unwrap()[0]["userID"], json!(alice));
    }

    #[tokio::test]
    async fn file_database_survives_reopen() {
        init_test_logger();
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("chat.db").display());

        let client = ChatClient::open(ClientConfig::new(url.clone())).await.unwrap();
        let alice = client.create_user("alice@x.com").await.unwrap();
        client.close().await;

        let client = ChatClient::open(ClientConfig::new(url)).await.unwrap();
        let again = client.get_user_by_id(&alice.id).await.unwrap();
        assert_eq!(again.email, "alice@x.com");
        client.close().await;
    }
}
