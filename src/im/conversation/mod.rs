//! 会话模块
//!
//! 两个好友之间的单聊会话：发消息、标记已读、会话列表

pub mod dao;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use dao::ConversationDao;
pub use listener::{ConversationListener, EmptyConversationListener};
pub use models::{conversation_id, Conversation, ConversationSummary};
pub use service::ConversationEngine;
