//! Participant-facing message texts.

use surveybot_types::answer::Rating;
use surveybot_types::event::{Keyboard, OutboundMessage};

pub const AGE_PROMPT: &str = "Please enter your age:";
pub const AGE_REPROMPT: &str = "Invalid input. Please enter a valid age:";
pub const SEX_PROMPT: &str = "Please select your sex:";
pub const TEST_INTRO: &str = "Thank you! Now let's start the test.";
pub const THANK_YOU: &str = "Thank you for completing the test! Your responses have been saved.";
pub const SAVE_FAILED: &str =
    "Sorry, your responses could not be saved. Please try again later with /start.";
pub const EXPIRED: &str = "Your session has expired. Please restart with /start.";

pub fn age_prompt() -> OutboundMessage {
    OutboundMessage::text(AGE_PROMPT)
}

pub fn age_reprompt() -> OutboundMessage {
    OutboundMessage::text(AGE_REPROMPT)
}

pub fn sex_prompt() -> OutboundMessage {
    OutboundMessage::text(SEX_PROMPT).with_keyboard(Keyboard::sex())
}

pub fn test_intro() -> OutboundMessage {
    OutboundMessage::text(TEST_INTRO)
}

pub fn thank_you() -> OutboundMessage {
    OutboundMessage::text(THANK_YOU)
}

pub fn save_failed() -> OutboundMessage {
    OutboundMessage::text(SAVE_FAILED)
}

pub fn expired_notice() -> OutboundMessage {
    OutboundMessage::text(EXPIRED)
}

/// The `/help` reply. Static, rendered as Markdown.
pub fn help() -> OutboundMessage {
    let scale = Rating::descending()
        .map(|rating| format!("  {}  {}", keycap(rating), rating.label()))
        .collect::<Vec<_>>()
        .join("\n");

    let text = format!(
        "🤖 **Welcome to the Test Anxiety Bot!**\n\n\
         This bot will ask you a series of questions about test anxiety. \
         Please rate how true each statement is for you using the following **5-point scale**:\n\n\
         ```\n{scale}\n```\n\
         **📌 Commands:**\n\
         🔹 `/start` - Begin the survey\n\
         🔹 `/help` - Show this help message\n\n\
         **📋 How it works:**\n\
         1️⃣ The bot will ask a series of statements about test anxiety.\n\
         2️⃣ You will rate each statement based on the 5-point scale above.\n\
         3️⃣ Your responses are completely **anonymous** and stored securely.\n\n\
         Thank you for participating! 😊\n\
         👉 **Start the survey now:** /start"
    );

    OutboundMessage::text(text).markdown()
}

fn keycap(rating: Rating) -> &'static str {
    match rating.value() {
        5 => "5️⃣",
        4 => "4️⃣",
        3 => "3️⃣",
        2 => "2️⃣",
        _ => "1️⃣",
    }
}
