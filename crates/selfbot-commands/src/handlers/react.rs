use async_trait::async_trait;
use tracing::{debug, warn};

use crate::context::BotContext;
use crate::error::CommandError;
use crate::history::MessageCursor;
use crate::router::{Command, Invocation};

/// Spells text out as reactions on the latest message in the channel.
pub struct ReactCommand;

/// Emoji that can stand in for `c`, preferred first. Case-insensitive.
pub fn emoji_candidates(c: char) -> &'static [&'static str] {
    match c.to_ascii_lowercase() {
        'a' => &["🇦", "🅰️"],
        'b' => &["🇧", "🅱️"],
        'c' => &["🇨", "©️"],
        'd' => &["🇩"],
        'e' => &["🇪", "📧"],
        'f' => &["🇫"],
        'g' => &["🇬"],
        'h' => &["🇭", "♓"],
        'i' => &["🇮", "ℹ️", "1️⃣"],
        'j' => &["🇯"],
        'k' => &["🇰"],
        'l' => &["🇱"],
        'm' => &["🇲", "Ⓜ️", "♏"],
        'n' => &["🇳", "♑"],
        'o' => &["🇴", "🅾️", "⭕", "0️⃣"],
        'p' => &["🇵", "🅿️"],
        'q' => &["🇶"],
        'r' => &["🇷", "®️"],
        's' => &["🇸", "💲"],
        't' => &["🇹", "✝️"],
        'u' => &["🇺"],
        'v' => &["🇻", "♈"],
        'w' => &["🇼"],
        'x' => &["🇽", "❌", "✖️"],
        'y' => &["🇾"],
        'z' => &["🇿", "💤"],
        '0' => &["0️⃣", "⭕"],
        '1' => &["1️⃣"],
        '2' => &["2️⃣"],
        '3' => &["3️⃣"],
        '4' => &["4️⃣"],
        '5' => &["5️⃣"],
        '6' => &["6️⃣"],
        '7' => &["7️⃣"],
        '8' => &["8️⃣", "🎱"],
        '9' => &["9️⃣"],
        '!' => &["❗", "❕"],
        '?' => &["❓", "❔"],
        '+' => &["➕"],
        '-' => &["➖"],
        '#' => &["#️⃣"],
        '*' => &["*️⃣"],
        _ => &[],
    }
}

/// One emoji per character of `text`, never the same emoji twice.
///
/// Each character takes the first of its candidates not already picked;
/// characters without a free candidate are dropped.
pub fn pick_reactions<'e>(text: &str, candidates: impl Fn(char) -> &'e [&'e str]) -> Vec<&'e str> {
    let mut picked: Vec<&'e str> = Vec::new();
    for c in text.chars() {
        if let Some(emoji) = candidates(c).iter().copied().find(|e| !picked.contains(e)) {
            picked.push(emoji);
        }
    }
    picked
}

#[async_trait]
impl Command for ReactCommand {
    fn name(&self) -> &'static str {
        "react"
    }

    fn usage(&self) -> &'static str {
        "react <text>"
    }

    fn description(&self) -> &'static str {
        "spell text in reactions on the last message"
    }

    async fn run(&self, bot: &BotContext, inv: &Invocation<'_>) -> Result<(), CommandError> {
        let text = inv.args.join(" ");
        if text.trim().is_empty() {
            return Err(CommandError::user("usage: react <text>"));
        }

        let mut cursor = MessageCursor::history(bot.service.as_ref(), inv.message.channel_id);
        let Some(target) = cursor.next().await? else {
            return Err(CommandError::user("no messages found"));
        };

        let emoji = pick_reactions(&text, emoji_candidates);
        debug!(message_id = %target.id, count = emoji.len(), "reacting");

        for e in emoji {
            if let Err(err) = bot
                .service
                .add_reaction(target.channel_id, target.id, e)
                .await
            {
                warn!(message_id = %target.id, emoji = e, error = %err, "failed to add reaction");
            }
        }
        Ok(())
    }
}
