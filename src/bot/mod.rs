//! Telegram bot module - thin adapter between chat updates and the coach

use teloxide::{
    prelude::*,
    types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup},
    utils::command::BotCommands,
};
use tracing::{debug, info};

use crate::coach::Coach;
use crate::event::{self, SetEvent};
use crate::plan::DayPlan;
use crate::progression::Marker;

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Команды бота:")]
pub enum Command {
    #[command(description = "Начать работу")]
    Start,
    #[command(description = "Показать помощь")]
    Help,
    #[command(description = "План на сегодня")]
    Today,
    #[command(description = "Шаг прибавки, например /n 2.5")]
    N(String),
    #[command(description = "Перейти к следующему дню")]
    Swap,
}

/// Private chats only, so the chat id identifies the user
fn user_key(chat: ChatId) -> i64 {
    chat.0
}

/// Inline keyboard with ✅/🟡/❌ buttons for every exercise of the day
fn make_plan_keyboard(plan: &DayPlan) -> InlineKeyboardMarkup {
    let buttons: Vec<Vec<InlineKeyboardButton>> = plan
        .entries
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            Marker::all()
                .iter()
                .map(|&marker| {
                    let label = if marker == Marker::Success {
                        format!("{} {}", marker.emoji(), entry.spec.name)
                    } else {
                        marker.emoji().to_string()
                    };
                    let data = event::callback_data(marker, plan.day, index, entry.weight);
                    InlineKeyboardButton::callback(label, data)
                })
                .collect()
        })
        .collect();

    InlineKeyboardMarkup::new(buttons)
}

/// Start the Telegram bot
pub async fn run_bot(token: String, coach: Coach) -> anyhow::Result<()> {
    let bot = Bot::new(token);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(Update::filter_message().endpoint(handle_message))
        .branch(Update::filter_callback_query().endpoint(handle_callback));

    info!("Bot dispatcher started");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![coach])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn handle_command(bot: Bot, msg: Message, cmd: Command, coach: Coach) -> HandlerResult {
    let user = user_key(msg.chat.id);

    match cmd {
        Command::Start => {
            let text = coach.start(user).await?;
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }

        Command::Today => {
            let plan = coach.today(user).await?;
            bot.send_message(msg.chat.id, plan.render())
                .reply_markup(make_plan_keyboard(&plan))
                .await?;
        }

        Command::N(arg) => {
            let text = coach.set_step(user, &arg).await?;
            bot.send_message(msg.chat.id, text).await?;
        }

        Command::Swap => {
            let day = coach.swap(user).await?;
            bot.send_message(msg.chat.id, format!("Следующий день: {}", day))
                .await?;
        }
    }

    Ok(())
}

/// Log the set carried by callback data; `None` when the data is not a set
async fn log_callback(coach: &Coach, data: &str, chat_id: ChatId) -> Option<anyhow::Result<String>> {
    match SetEvent::parse_callback(data) {
        Ok(ev) => Some(coach.log_set(user_key(chat_id), &ev).await),
        Err(e) => {
            debug!("Dropped callback: {}", e);
            None
        }
    }
}

async fn handle_callback(bot: Bot, q: CallbackQuery, coach: Coach) -> HandlerResult {
    let mut reply = None;
    if let (Some(data), Some(msg)) = (&q.data, &q.message) {
        let chat_id = msg.chat().id;
        reply = log_callback(&coach, data, chat_id).await.map(|r| (chat_id, r));
    }

    // Stop the button spinner even when logging failed
    bot.answer_callback_query(q.id).await?;

    if let Some((chat_id, text)) = reply {
        bot.send_message(chat_id, text?).await?;
    }
    Ok(())
}

async fn handle_message(bot: Bot, msg: Message, coach: Coach) -> HandlerResult {
    let Some(text) = msg.text() else {
        return Ok(());
    };

    // Anything that is not a well-formed set is ignored without a reply
    match SetEvent::parse_text(text) {
        Ok(ev) => {
            let reply = coach.log_set(user_key(msg.chat.id), &ev).await?;
            bot.send_message(msg.chat.id, reply).await?;
        }
        Err(e) => debug!("Dropped message from {}: {}", msg.chat.id, e),
    }

    Ok(())
}
