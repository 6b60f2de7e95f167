use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use teloxide::prelude::*;
use teloxide::types::{
    BotCommand, ChatAction, InlineKeyboardButton, InlineKeyboardMarkup, InputFile,
    LinkPreviewOptions, Me, ParseMode, ReplyParameters,
};
use tracing::{error, info, warn};

use crate::config::LinksConfig;
use crate::platform::{route, IncomingMessage, Route};
use crate::responder::{self, failure_notice, Delivery, Notice, Responder};

const WELCOME: &str = "<b>😎 Oh, look who showed up.</b>\n\n\
                       Try not to embarrass urself, champ.\n\
                       This place ain't for softies.\n\
                       Speak smart or stay silent 🐶";

const PING_INITIAL: &str = "🛰️ Pinging...";

/// Shared state handed to every message handler
pub struct BotState {
    pub responder: Responder,
    pub links: LinksConfig,
    /// Pause between the "recording voice" action and the upload
    pub record_delay: Duration,
}

/// Register the command menu shown by Telegram clients.
pub async fn set_commands(bot: &Bot) -> Result<()> {
    bot.set_my_commands(vec![BotCommand::new(
        "start",
        "Get started and see what I do",
    )])
    .await
    .context("Failed to set bot commands")?;
    Ok(())
}

/// Run the Telegram dispatcher until Ctrl-C
pub async fn run(state: Arc<BotState>, bot: Bot) -> Result<()> {
    info!("Starting Telegram platform...");

    let handler = Update::filter_message().endpoint(handle_message);

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|upd| async move {
            warn!("Unhandled update: {:?}", upd.id);
        })
        .error_handler(LoggingErrorHandler::with_custom_text("telegram"))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

fn chat_type(msg: &Message) -> &'static str {
    if msg.chat.is_private() {
        "private"
    } else if msg.chat.is_group() {
        "group"
    } else if msg.chat.is_supergroup() {
        "supergroup"
    } else {
        "channel"
    }
}

fn incoming_from(msg: &Message) -> Option<IncomingMessage> {
    let user = msg.from.as_ref()?;
    Some(IncomingMessage {
        user_id: user.id.0,
        user_name: user.first_name.clone(),
        chat_id: msg.chat.id.0,
        chat_type: chat_type(msg).to_string(),
        text: msg.text().map(str::to_string),
        reply_to_user_id: msg
            .reply_to_message()
            .and_then(|reply| reply.from.as_ref())
            .map(|author| author.id.0),
    })
}

async fn handle_message(
    bot: Bot,
    msg: Message,
    me: Me,
    state: Arc<BotState>,
) -> ResponseResult<()> {
    let incoming = match incoming_from(&msg) {
        Some(incoming) => incoming,
        None => return Ok(()),
    };

    info!(
        "Telegram message from {} ({}) in {} chat {}: {:?}",
        incoming.user_name,
        incoming.user_id,
        incoming.chat_type,
        incoming.chat_id,
        incoming.text
    );

    let text = incoming.text.as_deref().unwrap_or("");

    let route = route(text, me.username());
    let result = match route {
        Route::Start => send_welcome(&bot, &msg, &me, &state.links).await,
        Route::Ping => send_ping(&bot, &msg, &state.links).await,
        Route::Text => reply_with_voice(&bot, &msg, &me, &incoming, &state).await,
    };

    // Fail open: every route answers a failure with a notice
    if let Err(e) = result {
        error!("Error handling {:?}: {:#}", route, e);
        reply_notice(&bot, &msg, &failure_notice(&e)).await?;
    }

    Ok(())
}

/// Build the /start navigation menu
pub fn start_keyboard(links: &LinksConfig, bot_username: &str) -> Result<InlineKeyboardMarkup> {
    let updates = reqwest::Url::parse(&links.updates_url)
        .with_context(|| format!("Invalid updates url: {}", links.updates_url))?;
    let support = reqwest::Url::parse(&links.support_url)
        .with_context(|| format!("Invalid support url: {}", links.support_url))?;
    let add_to_group =
        reqwest::Url::parse(&format!("https://t.me/{}?startgroup=true", bot_username))
            .context("Invalid bot username")?;

    Ok(InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::url("Updates", updates),
            InlineKeyboardButton::url("Support", support),
        ],
        vec![InlineKeyboardButton::url("Add Me To Your Group", add_to_group)],
    ]))
}

async fn send_welcome(bot: &Bot, msg: &Message, me: &Me, links: &LinksConfig) -> Result<()> {
    let keyboard = start_keyboard(links, me.username())?;
    bot.send_message(msg.chat.id, WELCOME)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

/// Milliseconds rounded to two decimals
pub fn latency_ms(elapsed: Duration) -> f64 {
    (elapsed.as_secs_f64() * 1000.0 * 100.0).round() / 100.0
}

/// Final ping text; "Pong!" links to the support chat. Whole latencies keep
/// their trailing ".0".
pub fn ping_response(latency: f64, support_url: &str) -> String {
    format!("🏓 <a href=\"{}\">Pong!</a> {:?}ms", support_url, latency)
}

async fn send_ping(bot: &Bot, msg: &Message, links: &LinksConfig) -> Result<()> {
    let started = Instant::now();
    let placeholder = bot
        .send_message(msg.chat.id, PING_INITIAL)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    let latency = latency_ms(started.elapsed());

    let text = ping_response(latency, &links.support_url);
    bot.edit_message_text(msg.chat.id, placeholder.id, text)
        .parse_mode(ParseMode::Html)
        .link_preview_options(LinkPreviewOptions {
            is_disabled: true,
            url: None,
            prefer_small_media: false,
            prefer_large_media: false,
            show_above_text: false,
        })
        .await?;
    Ok(())
}

async fn reply_with_voice(
    bot: &Bot,
    msg: &Message,
    me: &Me,
    incoming: &IncomingMessage,
    state: &BotState,
) -> Result<()> {
    let outcome = state.responder.respond(incoming, me.id.0).await;

    match responder::delivery(outcome).await {
        Delivery::Nothing => Ok(()),
        Delivery::Notice(notice) => {
            reply_notice(bot, msg, &notice).await?;
            Ok(())
        }
        Delivery::Voice(path) => send_voice(bot, msg, &path, state.record_delay).await,
    }
}

async fn send_voice(bot: &Bot, msg: &Message, path: &Path, delay: Duration) -> Result<()> {
    bot.send_chat_action(msg.chat.id, ChatAction::RecordVoice)
        .await
        .ok();
    tokio::time::sleep(delay).await;

    bot.send_voice(msg.chat.id, InputFile::file(path.to_path_buf()))
        .reply_parameters(ReplyParameters::new(msg.id))
        .await
        .with_context(|| format!("Failed to send voice {}", path.display()))?;

    info!("Sent voice {} to chat {}", path.display(), msg.chat.id);
    Ok(())
}

async fn reply_notice(bot: &Bot, msg: &Message, notice: &Notice) -> ResponseResult<()> {
    bot.send_message(msg.chat.id, notice.text())
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}
