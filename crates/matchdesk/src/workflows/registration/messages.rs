use crate::config::PaymentDetails;

use super::categories::CategoryRegistry;
use super::intake::NextPrompt;

/// Fixed reply templates for the conversational front end. The bank
/// transfer block is the only configurable part.
pub struct MessageCatalog {
    payment: PaymentDetails,
}

impl MessageCatalog {
    pub fn new(payment: PaymentDetails) -> Self {
        Self { payment }
    }

    pub fn welcome(&self, registry: &CategoryRegistry) -> String {
        let mut text = String::from("Welcome to the tournament!\n\nPick a category to enter:\n");
        for name in registry.names() {
            text.push_str("- ");
            text.push_str(name);
            text.push('\n');
        }
        text
    }

    pub fn prompt(&self, prompt: NextPrompt, registry: &CategoryRegistry) -> String {
        match prompt {
            NextPrompt::Category => self.welcome(registry),
            NextPrompt::Name => "What is your name? (player 1 full name)".to_string(),
            NextPrompt::Partner => "What is your partner's name?".to_string(),
            NextPrompt::Phone => "What phone number can we reach you at?".to_string(),
            NextPrompt::Handle => "What is your messaging handle? (@username)".to_string(),
        }
    }

    pub fn unknown_category(&self, text: &str, registry: &CategoryRegistry) -> String {
        let mut reply = format!("'{text}' is not one of the categories. Please pick one of:\n");
        for name in registry.names() {
            reply.push_str("- ");
            reply.push_str(name);
            reply.push('\n');
        }
        reply
    }

    pub fn missing_partner(&self) -> String {
        "This category enters as a pair. What is your partner's name?".to_string()
    }

    pub fn main_slot_instructions(&self) -> String {
        format!(
            "You are registered in the main bracket.\n\n\
             To complete your registration, transfer {} to:\n\n\
             Account: {}\n\
             Recipient: {}\n\n\
             After the transfer, send a photo or screenshot of the receipt here.",
            self.payment.amount, self.payment.account, self.payment.recipient
        )
    }

    pub fn waitlist_notice(&self) -> String {
        "You have been added to the waitlist. We will let you know if a spot opens up."
            .to_string()
    }

    pub fn receipt_received(&self) -> String {
        "Receipt received. Hold tight while we confirm the transfer.".to_string()
    }

    pub fn receipt_not_found(&self) -> String {
        "We could not locate your application, or the receipt was already received.".to_string()
    }

    pub fn start_over(&self) -> String {
        "Please send 'start' to begin a registration.".to_string()
    }

    pub fn try_again_later(&self) -> String {
        "Something went wrong on our side. Please try again in a few minutes.".to_string()
    }
}
