//! 社交聊天 CLI
//!
//! 每条子命令对应一次 `ChatClient::dispatch` 调用，结果以 JSON 打印到标准输出。

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use social_chat_core::im::conversation::ConversationListener;
use social_chat_core::im::friend::FriendListener;
use social_chat_core::{ApiRequest, ApiResponse, ChatClient, ChatError, ClientConfig};
use std::sync::Arc;
use tracing::info;

/// 社交聊天 CLI
#[derive(Parser, Debug)]
#[command(name = "chat-cli")]
#[command(about = "好友申请与单聊的命令行客户端", long_about = None)]
struct Args {
    /// SQLite 数据库 URL
    #[arg(long, default_value = "sqlite://chat.db?mode=rwc")]
    db: String,

    /// 日志级别（默认: warn,social_chat_core=info）
    #[arg(long, default_value = "warn,social_chat_core=info")]
    log_level: String,

    /// 日志文件（追加写入）
    #[arg(long, default_value = "debug.log")]
    log_file: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// 注册用户
    Register { email: String },
    /// 按邮箱查询用户
    User { email: String },
    /// 按 userID 查询用户
    UserById { user: String },
    /// 发送好友申请
    SendRequest { from: String, to: String },
    /// 同意 friend 发来的好友申请
    Accept { user: String, friend: String },
    /// 拒绝 friend 发来的好友申请
    Reject { user: String, friend: String },
    /// 按申请 ID 同意
    AcceptId { user: String, request: String },
    /// 按申请 ID 拒绝
    RejectId { user: String, request: String },
    /// 待处理的好友申请
    Requests { user: String },
    /// 发出且待对方处理的好友申请
    SentRequests { user: String },
    /// 发送消息
    Send { from: String, to: String, text: String },
    /// 将 peer 发来的消息标记为已读
    Read { user: String, peer: String },
    /// 查看两人之间的会话
    Conversation { user: String, peer: String },
    /// 会话列表
    Conversations { user: String },
    /// 与 peer 会话中的未读数
    Unread { user: String, peer: String },
}

impl From<Command> for ApiRequest {
    fn from(cmd: Command) -> Self {
        match cmd {
            Command::Register { email } => ApiRequest::CreateUser { email },
            Command::User { email } => ApiRequest::GetUser { email },
            Command::UserById { user } => ApiRequest::GetUserById { user_id: user },
            Command::SendRequest { from, to } => ApiRequest::SendFriendRequest {
                sender_id: from,
                receiver_id: to,
            },
            Command::Accept { user, friend } => ApiRequest::AcceptFriendRequest {
                user_id: user,
                friend_id: friend,
            },
            Command::Reject { user, friend } => ApiRequest::RejectFriendRequest {
                user_id: user,
                friend_id: friend,
            },
            Command::AcceptId { user, request } => ApiRequest::AcceptFriendRequestById {
                user_id: user,
                request_id: request,
            },
            Command::RejectId { user, request } => ApiRequest::RejectFriendRequestById {
                user_id: user,
                request_id: request,
            },
            Command::Requests { user } => ApiRequest::GetFriendRequests { user_id: user },
            Command::SentRequests { user } => ApiRequest::GetSentFriendRequests { user_id: user },
            Command::Send { from, to, text } => ApiRequest::SendMessage {
                sender_id: from,
                recipient_id: to,
                text,
            },
            Command::Read { user, peer } => ApiRequest::MarkRead {
                user_id: user,
                peer_id: peer,
            },
            Command::Conversation { user, peer } => ApiRequest::GetConversation {
                user_id: user,
                peer_id: peer,
            },
            Command::Conversations { user } => ApiRequest::GetConversations { user_id: user },
            Command::Unread { user, peer } => ApiRequest::GetUnreadCount {
                user_id: user,
                peer_id: peer,
            },
        }
    }
}

/// 初始化日志（同时输出到 stderr 和文件）
fn init_logger(log_level: &str, log_file: &str) -> Result<()> {
    use std::fs::OpenOptions;
    use std::io;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    // 优先使用环境变量 RUST_LOG（如果设置了），否则使用命令行参数
    let filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_file)
        .with_context(|| format!("无法创建日志文件 {}", log_file))?;

    // stdout 留给 JSON 结果，日志走 stderr
    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(true);

    // 输出到文件，禁用 ANSI 颜色代码
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(file)
        .with_file(true)
        .with_line_number(true)
        .with_target(false)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("初始化日志失败")?;
    Ok(())
}

/// 把回调事件打到日志里
struct CliListener;

#[async_trait::async_trait]
impl FriendListener for CliListener {
    async fn on_friend_request_received(&self, request_json: String) {
        info!("[CLI/Friend] 新的好友申请: {}", request_json);
    }

    async fn on_friend_request_accepted(&self, request_json: String) {
        info!("[CLI/Friend] 好友申请已同意: {}", request_json);
    }

    async fn on_friend_request_rejected(&self, request_json: String) {
        info!("[CLI/Friend] 好友申请已拒绝: {}", request_json);
    }
}

#[async_trait::async_trait]
impl ConversationListener for CliListener {
    async fn on_new_conversation(&self, conversation_json: String) {
        info!("[CLI/Conversation] 新会话: {}", conversation_json);
    }

    async fn on_conversation_changed(&self, conversation_json: String) {
        info!("[CLI/Conversation] 会话变更: {}", conversation_json);
    }

    async fn on_messages_read(&self, receipt_json: String) {
        info!("[CLI/Conversation] 已读回执: {}", receipt_json);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(&args.log_level, &args.log_file)?;

    let listener = Arc::new(CliListener);
    let client = ChatClient::open_with_listeners(
        ClientConfig::new(args.db.clone()),
        listener.clone(),
        listener,
    )
    .await
    .with_context(|| format!("打开数据库失败: {}", args.db))?;

    let resp = client.dispatch(args.command.into()).await;
    println!("{}", serde_json::to_string_pretty(&resp)?);

    client.close().await;
    if !exits_cleanly(&resp) {
        std::process::exit(1);
    }
    Ok(())
}

/// 成功，或者只是没有可标记已读的消息
fn exits_cleanly<T>(resp: &ApiResponse<T>) -> bool {
    resp.is_ok() || resp.err_code == ChatError::NoMessagesFound(String::new()).code()
}

#[cfg(test)]
mod tests {
    use super::*;
    use social_chat_core::Party;

    #[test]
    fn nothing_to_mark_read_is_not_a_failure() {
        let empty: ApiResponse<()> = (&ChatError::NoMessagesFound("b-a".into())).into();
        assert!(exits_cleanly(&empty));

        let missing: ApiResponse<()> = (&ChatError::ConversationNotFound("b-a".into())).into();
        assert!(!exits_cleanly(&missing));
        let unknown: ApiResponse<()> = (&ChatError::UserNotFound {
            party: Party::Account,
            key: "x".into(),
        })
            .into();
        assert!(!exits_cleanly(&unknown));
        assert!(exits_cleanly(&ApiResponse::ok(())));
    }

    #[test]
    fn subcommands_map_to_requests() {
        let args = Args::try_parse_from(["chat-cli", "accept-id", "bob", "r1"]).unwrap();
        let req: ApiRequest = args.command.into();
        assert!(matches!(
            req,
            ApiRequest::AcceptFriendRequestById { ref user_id, ref request_id }
                if user_id == "bob" && request_id == "r1"
        ));

        let args = Args::try_parse_from(["chat-cli", "unread", "bob", "alice"]).unwrap();
        assert!(matches!(
            ApiRequest::from(args.command),
            ApiRequest::GetUnreadCount { .. }
        ));
    }
}
