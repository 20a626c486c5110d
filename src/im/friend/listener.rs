//! 好友监听器回调接口

use async_trait::async_trait;

/// 好友监听器回调接口，均在事务提交之后触发，参数为 JSON 字符串
#[async_trait]
pub trait FriendListener: Send + Sync {
    /// 新的好友申请已创建
    async fn on_friend_request_received(&self, request_json: String);

    /// 好友申请已同意，双方已成为好友
    async fn on_friend_request_accepted(&self, request_json: String);

    /// 好友申请已拒绝
    async fn on_friend_request_rejected(&self, request_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyFriendListener;

#[async_trait]
impl FriendListener for EmptyFriendListener {
    async fn on_friend_request_received(&self, _request_json: String) {}

    async fn on_friend_request_accepted(&self, _request_json: String) {}

    async fn on_friend_request_rejected(&self, _request_json: String) {}
}
