pub mod telegram;

/// A message received from the chat platform
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub user_id: u64,
    /// Display name of the user
    pub user_name: String,
    pub chat_id: i64,
    /// "private", "group", "supergroup" or "channel"
    pub chat_type: String,
    /// The message text, absent for stickers, photos and the like
    pub text: Option<String>,
    /// Author of the message this one replies to
    pub reply_to_user_id: Option<u64>,
}

impl IncomingMessage {
    pub fn is_reply_to(&self, user_id: u64) -> bool {
        self.reply_to_user_id == Some(user_id)
    }
}

/// What the router does with a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Start,
    Ping,
    Text,
}

/// Classify message text. Commands may carry an `@username` suffix, which
/// must name this bot; anything after the command is ignored.
pub fn route(text: &str, bot_username: &str) -> Route {
    let Some(token) = text.split_whitespace().next() else {
        return Route::Text;
    };
    let Some(command) = token.strip_prefix('/') else {
        return Route::Text;
    };

    let name = match command.split_once('@') {
        Some((name, target)) if target.eq_ignore_ascii_case(bot_username) => name,
        Some(_) => return Route::Text,
        None => command,
    };

    match name {
        "start" => Route::Start,
        "ping" => Route::Ping,
        _ => Route::Text,
    }
}
