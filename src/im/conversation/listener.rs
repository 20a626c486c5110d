//! 会话监听器回调接口

use async_trait::async_trait;

/// 会话监听器回调接口，均在事务提交之后触发
#[async_trait]
pub trait ConversationListener: Send + Sync {
    /// 两人之间的第一条消息创建了会话，参数为会话 JSON
    async fn on_new_conversation(&self, conversation_json: String);

    /// 已有会话追加了消息，参数为会话 JSON
    async fn on_conversation_changed(&self, conversation_json: String);

    /// 一批消息被标记为已读，参数为 `{conversationID, readerID, count}` JSON
    async fn on_messages_read(&self, receipt_json: String);
}

/// 默认空实现（无操作）
pub struct EmptyConversationListener;

#[async_trait]
impl ConversationListener for EmptyConversationListener {
    async fn on_new_conversation(&self, _conversation_json: String) {}

    async fn on_conversation_changed(&self, _conversation_json: String) {}

    async fn on_messages_read(&self, _receipt_json: String) {}
}
