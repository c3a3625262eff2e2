//! Direct messaging command and query handlers.

mod access;
mod delete_message;
mod get_messages;
mod get_or_create_conversation;
mod get_unread_count;
mod list_conversations;
mod mark_conversation_read;
mod mark_message_read;
mod retry;
mod send_message;

pub use delete_message::{DeleteMessageCommand, DeleteMessageHandler};
pub use get_messages::{GetMessagesHandler, GetMessagesQuery, MessageHistory};
pub use get_or_create_conversation::{
    GetOrCreateConversationCommand, GetOrCreateConversationHandler, GetOrCreateConversationResult,
};
pub use get_unread_count::{GetUnreadCountHandler, GetUnreadCountQuery};
pub use list_conversations::{ConversationSummary, ListConversationsHandler, ListConversationsQuery};
pub use mark_conversation_read::{MarkConversationReadCommand, MarkConversationReadHandler};
pub use mark_message_read::{MarkMessageReadCommand, MarkMessageReadHandler};
pub use send_message::{SendMessageCommand, SendMessageHandler, SendMessageResult};
