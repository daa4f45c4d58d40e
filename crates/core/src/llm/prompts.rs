use crate::domain::analysis::Platform;
use crate::llm::{Message, Role};

/// Number of daily points requested for the sentiment timeline.
pub const TIMELINE_DAYS: u32 = 14;

fn chat_system_prompt() -> String {
    [
        "You are FinoakAI, a professional financial analyst covering the Indian stock market.",
        "Write plain text only. Do not use markdown of any kind.",
        "",
        "Formatting rules:",
        "1. Never use the symbols *, #, -, _, [], () or any other markdown syntax.",
        "2. Never use bold or italic text.",
        "3. Never add disclaimers or warnings.",
        "4. Format only with emojis and the bullet character •.",
        "",
        "Answer using exactly this layout:",
        "",
        "📈 Company Name Overview",
        "One line describing the company, without special characters",
        "",
        "📊 Current Market Status",
        "• Status: plain text",
        "• Market Share: plain text",
        "• Key Numbers: plain text",
        "",
        "💰 Financial Details",
        "• Revenue: plain text",
        "• Growth: plain text",
        "• Outlook: plain text",
        "",
        "🎯 Trading Plan",
        "• Buy Price: ₹number",
        "• Target: ₹number",
        "• Stop Loss: ₹number",
        "",
        "💡 Quick Points",
        "• first point in plain text",
        "• second point in plain text",
        "• third point in plain text",
        "",
        "Keep it clean and simple: plain text, emojis and • bullets only.",
    ]
    .join("\n")
}

/// Conversation sent for an open chat turn. A caller-supplied leading system message wins over
/// the built-in persona so the request never carries two.
pub fn chat_messages(history: &[Message]) -> Vec<Message> {
    if history.first().is_some_and(|m| m.role == Role::System) {
        return history.to_vec();
    }

    let mut out = Vec::with_capacity(history.len() + 1);
    out.push(Message::system(chat_system_prompt()));
    out.extend_from_slice(history);
    out
}

pub fn sentiment_score_messages(symbol: &str, name: &str) -> Vec<Message> {
    vec![
        Message::system(format!(
            "You are a professional market analyst. For {name} ({symbol}), provide a sentiment \
             score from 0.0 (bearish) to 1.0 (bullish). Return only the number without any \
             additional text or formatting."
        )),
        Message::user(format!("Sentiment score for {name}?")),
    ]
}

pub fn price_prediction_messages(symbol: &str, name: &str, current_price: f64) -> Vec<Message> {
    vec![
        Message::system(format!(
            "You are a professional market analyst. For {name} ({symbol}) at ₹{current_price}, \
             provide a price prediction as clean JSON without any additional text: \
             {{\"prediction\": \"bullish\" or \"bearish\", \"priceTarget\": number}}"
        )),
        Message::user(format!("Price target for {name}?")),
    ]
}

/// Messages for the multi-platform social sentiment report. The schema only names the platforms
/// in `platforms`.
pub fn social_sentiment_messages(query: &str, platforms: &[Platform]) -> Vec<Message> {
    let platform_list = platform_list(platforms);
    let system = [
        "You are an expert sentiment analyzer for financial and stock market content on social \
         media."
            .to_string(),
        String::new(),
        format!("Analyze sentiment for \"{query}\" across these platforms: {platform_list}."),
        String::new(),
        "Return a JSON object with this exact structure:".to_string(),
        social_schema(platforms),
        String::new(),
        format!(
            "The timeline must contain exactly {TIMELINE_DAYS} entries, one per day, oldest \
             first, ending today."
        ),
        "Every sentiment score must be between 0 (very negative) and 1 (very positive)."
            .to_string(),
        "Distribution values must add up to 1.0.".to_string(),
    ]
    .join("\n");

    vec![
        Message::system(system),
        Message::user(format!(
            "Analyze social media sentiment for \"{query}\" on {platform_list}. Return only the \
             JSON data structure."
        )),
    ]
}

fn platform_list(platforms: &[Platform]) -> String {
    platforms
        .iter()
        .map(Platform::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

fn social_schema(platforms: &[Platform]) -> String {
    let platform_blocks = platforms
        .iter()
        .map(|p| {
            [
                format!("    \"{p}\": {{"),
                "      \"score\": 0-1 sentiment score,".to_string(),
                "      \"distribution\": {".to_string(),
                "        \"positive\": 0-1 ratio,".to_string(),
                "        \"neutral\": 0-1 ratio,".to_string(),
                "        \"negative\": 0-1 ratio".to_string(),
                "      },".to_string(),
                "      \"topics\": array of 3-5 key topics".to_string(),
                "    }".to_string(),
            ]
            .join("\n")
        })
        .collect::<Vec<_>>()
        .join(",\n");

    let timeline_fields = std::iter::once("      \"date\": \"YYYY-MM-DD\"".to_string())
        .chain(
            platforms
                .iter()
                .map(|p| format!("      \"{p}\": 0-1 score")),
        )
        .collect::<Vec<_>>()
        .join(",\n");

    [
        "{".to_string(),
        "  \"overall\": 0-1 sentiment score,".to_string(),
        "  \"platforms\": {".to_string(),
        platform_blocks,
        "  },".to_string(),
        "  \"timeline\": [".to_string(),
        "    {".to_string(),
        timeline_fields,
        "    },".to_string(),
        format!("    ...{TIMELINE_DAYS} days of data"),
        "  ]".to_string(),
        "}".to_string(),
    ]
    .join("\n")
}
