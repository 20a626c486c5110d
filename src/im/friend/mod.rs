//! 好友模块
//!
//! 好友申请的发送、同意、拒绝，以及由此建立的好友关系

pub mod dao;
pub mod listener;
pub mod models;
pub mod service;

// 重新导出主要类型和函数
pub use dao::FriendDao;
pub use listener::{EmptyFriendListener, FriendListener};
pub use models::{canonical_pair, FriendRequest, RequestStatus};
pub use service::FriendRequestEngine;
