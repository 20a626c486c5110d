pub mod im;

// 重新导出常用类型和函数，方便外部使用
pub use im::{
    client::{ChatClient, ClientConfig},
    conversation::{conversation_id, Conversation, ConversationSummary},
    error::{ChatError, Party, Result},
    friend::{FriendRequest, RequestStatus},
    message::{Message, MessageStatus},
    types::{ApiRequest, ApiResponse},
    user::User,
};
