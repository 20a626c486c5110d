//! 好友申请服务层
//!
//! 申请的发送、同意、拒绝各自在一个事务内完成；事务提交后才通知监听器。

use crate::im::db;
use crate::im::error::{ChatError, Party, Result};
use crate::im::friend::dao::FriendDao;
use crate::im::friend::listener::{EmptyFriendListener, FriendListener};
use crate::im::friend::models::{FriendRequest, RequestStatus};
use crate::im::serialization::{generate_id, now_millis};
use crate::im::user::{User, UserDao};
use sqlx::{Pool, Sqlite};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 要处理的是哪一条申请
enum RequestTarget<'a> {
    /// `friend_id` 发给当前用户的最新一条待处理申请
    LatestFrom(&'a str),
    /// 明确指定申请 ID
    Id(&'a str),
}

/// 好友申请引擎
pub struct FriendRequestEngine {
    db: Pool<Sqlite>,
    friend_dao: FriendDao,
    listener: Arc<dyn FriendListener>,
}

impl FriendRequestEngine {
    /// 创建好友申请引擎（使用默认空监听器）
    pub fn new(db: Pool<Sqlite>) -> Self {
        Self::with_listener(db, Arc::new(EmptyFriendListener))
    }

    /// 创建好友申请引擎（带自定义监听器，使用共享连接池）
    pub fn with_listener(db: Pool<Sqlite>, listener: Arc<dyn FriendListener>) -> Self {
        Self {
            friend_dao: FriendDao::new(db.clone()),
            db,
            listener,
        }
    }

    /// 发送好友申请
    ///
    /// 同一方向上已有待处理申请时仍会再创建一条，处理时取最新的一条。
    pub async fn send_request(&self, sender_id: &str, receiver_id: &str) -> Result<FriendRequest> {
        if sender_id == receiver_id {
            return Err(ChatError::InvalidInput(
                "不能向自己发送好友申请".to_string(),
            ));
        }

        let mut tx = db::begin_write(&self.db).await?;

        if !UserDao::exists(&mut tx, sender_id).await? {
            return Err(ChatError::UserNotFound {
                party: Party::Sender,
                key: sender_id.to_string(),
            });
        }
        if !UserDao::exists(&mut tx, receiver_id).await? {
            return Err(ChatError::UserNotFound {
                party: Party::Receiver,
                key: receiver_id.to_string(),
            });
        }

        let now = now_millis();
        let request = FriendRequest {
            request_id: generate_id(),
            sender_id: sender_id.to_string(),
            receiver_id: receiver_id.to_string(),
            status: RequestStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        FriendDao::insert_request(&mut tx, &request).await?;
        tx.commit().await?;

        info!(
            "[FriendService] 好友申请已创建: {} -> {} ({})",
            sender_id, receiver_id, request.request_id
        );
        if let Ok(json) = serde_json::to_string(&request) {
            self.listener.on_friend_request_received(json).await;
        }
        Ok(request)
    }

    /// 同意 `friend_id` 发给 `user_id` 的最新待处理申请，返回更新后的用户
    pub async fn accept_request(&self, user_id: &str, friend_id: &str) -> Result<User> {
        self.settle(user_id, RequestTarget::LatestFrom(friend_id), RequestStatus::Accepted)
            .await
    }

    /// 拒绝 `friend_id` 发给 `user_id` 的最新待处理申请，返回更新后的用户
    pub async fn reject_request(&self, user_id: &str, friend_id: &str) -> Result<User> {
        self.settle(user_id, RequestTarget::LatestFrom(friend_id), RequestStatus::Rejected)
            .await
    }

    /// 按申请 ID 同意
    pub async fn accept_request_by_id(&self, user_id: &str, request_id: &str) -> Result<User> {
        self.settle(user_id, RequestTarget::Id(request_id), RequestStatus::Accepted)
            .await
    }

    /// 按申请 ID 拒绝
    pub async fn reject_request_by_id(&self, user_id: &str, request_id: &str) -> Result<User> {
        self.settle(user_id, RequestTarget::Id(request_id), RequestStatus::Rejected)
            .await
    }

    /// 收到的待处理申请（最新在前）
    pub async fn list_incoming_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        self.friend_dao.get_incoming_pending(user_id).await
    }

    /// 发出的待处理申请（最新在前）
    pub async fn list_outgoing_requests(&self, user_id: &str) -> Result<Vec<FriendRequest>> {
        self.friend_dao.get_outgoing_pending(user_id).await
    }

    pub async fn are_friends(&self, a: &str, b: &str) -> Result<bool> {
        self.friend_dao.are_friends(a, b).await
    }

    async fn settle(
        &self,
        user_id: &str,
        target: RequestTarget<'_>,
        decision: RequestStatus,
    ) -> Result<User> {
        let mut tx = db::begin_write(&self.db).await?;

        let (found, lookup) = match target {
            RequestTarget::LatestFrom(friend_id) => (
                FriendDao::find_latest_pending(&mut tx, friend_id, user_id).await?,
                format!("{} -> {}", friend_id, user_id),
            ),
            RequestTarget::Id(request_id) => (
                FriendDao::find_by_id(&mut tx, request_id)
                    .await?
                    .filter(|r| r.receiver_id == user_id && !r.status.is_terminal()),
                request_id.to_string(),
            ),
        };
        let Some(mut request) = found else {
            warn!("[FriendService] 找不到待处理的好友申请: {}", lookup);
            return Err(ChatError::RequestNotFound(lookup));
        };

        let now = now_millis();
        if !FriendDao::settle_request(&mut tx, &request.request_id, decision, now).await? {
            // 读取之后被并发处理掉了
            warn!(
                "[FriendService] 好友申请已被处理: {}",
                request.request_id
            );
            return Err(ChatError::RequestNotFound(lookup));
        }
        request.status = decision;
        request.updated_at = now;

        if decision == RequestStatus::Accepted {
            FriendDao::insert_friendship(&mut tx, &request.sender_id, &request.receiver_id, now)
                .await?;
        }

        let user = UserDao::find_by_id(&mut tx, user_id)
            .await?
            .ok_or_else(|| ChatError::UserNotFound {
                party: Party::Receiver,
                key: user_id.to_string(),
            })?;
        tx.commit().await?;

        debug!(
            "[FriendService] 好友申请 {} 状态: pending -> {:?}",
            request.request_id, decision
        );
        if let Ok(json) = serde_json::to_string(&request) {
            match decision {
                RequestStatus::Accepted => {
                    info!(
                        "[FriendService] {} 与 {} 成为好友",
                        request.receiver_id, request.sender_id
                    );
                    self.listener.on_friend_request_accepted(json).await;
                }
                _ => {
                    info!(
                        "[FriendService] {} 拒绝了 {} 的好友申请",
                        request.receiver_id, request.sender_id
                    );
                    self.listener.on_friend_request_rejected(json).await;
                }
            }
        }
        Ok(user)
    }
}
