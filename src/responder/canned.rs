use async_trait::async_trait;
use rand::seq::SliceRandom;
use super::{ Responder, ResponderError, ThinkingDelay };

/// Keyword-matched replies with a handful of fallback templates.
pub struct CannedResponder {
    delay: ThinkingDelay,
}

impl CannedResponder {
    pub fn new(delay: ThinkingDelay) -> Self {
        Self { delay }
    }

    pub fn reply_for(message: &str) -> String {
        let lower = message.to_lowercase();

        if lower.contains("hello") || lower.contains("hi") {
            return "Hello! How can I help you today?".to_string();
        }
        if lower.contains("how are you") {
            return "I'm doing well, thank you for asking! How are you doing?".to_string();
        }
        if lower.contains("bye") || lower.contains("goodbye") {
            return "Goodbye! It was nice chatting with you. Have a great day!".to_string();
        }

        let templates = Self::templates(message);
        templates
            .choose(&mut rand::thread_rng())
            .cloned()
            .unwrap_or_default()
    }

    fn templates(message: &str) -> [String; 5] {
        [
            format!("I understand you said: \"{}\". That's interesting!", message),
            format!("Thanks for sharing that with me. Can you tell me more about \"{}\"?", message),
            format!("I see you mentioned \"{}\". Here's what I think about that...", message),
            format!("That's a great point about \"{}\". Let me elaborate on that.", message),
            format!("Regarding \"{}\", I have some thoughts to share with you.", message),
        ]
    }
}

#[async_trait]
impl Responder for CannedResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        self.delay.wait().await;
        Ok(Self::reply_for(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn keywords_take_priority() {
        assert_eq!(CannedResponder::reply_for("Hi there"), "Hello! How can I help you today?");
        assert_eq!(
            CannedResponder::reply_for("HOW ARE YOU"),
            "I'm doing well, thank you for asking! How are you doing?"
        );
        assert_eq!(
            CannedResponder::reply_for("ok, bye"),
            "Goodbye! It was nice chatting with you. Have a great day!"
        );
    }

    #[test]
    fn fallback_quotes_the_message() {
        let reply = CannedResponder::reply_for("rust lifetimes");
        assert!(reply.contains("\"rust lifetimes\""), "{}", reply);
    }

    #[tokio::test]
    async fn responds_without_delay_when_configured() {
        let responder = CannedResponder::new(ThinkingDelay::new(Duration::ZERO, Duration::ZERO));
        assert_eq!(responder.respond("hello").await.unwrap(), "Hello! How can I help you today?");
    }
}
