use async_trait::async_trait;
use super::{ Responder, ResponderError, ThinkingDelay };

pub struct EchoResponder {
    delay: ThinkingDelay,
}

impl EchoResponder {
    pub fn new(delay: ThinkingDelay) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, text: &str) -> Result<String, ResponderError> {
        self.delay.wait().await;
        Ok(format!("You said: \"{}\". This is a simulated AI response.", text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn echoes_the_message() {
        let responder = EchoResponder::new(ThinkingDelay::new(Duration::ZERO, Duration::ZERO));
        assert_eq!(
            responder.respond("ping").await.unwrap(),
            "You said: \"ping\". This is a simulated AI response."
        );
    }
}
