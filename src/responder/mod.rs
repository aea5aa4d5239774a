pub mod canned;
pub mod echo;

use async_trait::async_trait;
use rand::Rng;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use self::canned::CannedResponder;
use self::echo::EchoResponder;

#[derive(Debug, Error)]
pub enum ResponderError {
    #[error("Responder failed: {0}")]
    Failed(String),
}

#[async_trait]
pub trait Responder: Send + Sync {
    /// Produces the model's reply to `text`, after simulated thinking time.
    async fn respond(&self, text: &str) -> Result<String, ResponderError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponderType {
    Canned,
    Echo,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ParseResponderTypeError {
    message: String,
}

impl fmt::Display for ParseResponderTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ParseResponderTypeError {}

impl FromStr for ResponderType {
    type Err = ParseResponderTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "canned" => Ok(ResponderType::Canned),
            "echo" => Ok(ResponderType::Echo),
            _ =>
                Err(ParseResponderTypeError {
                    message: format!("Invalid responder type: '{}'", s),
                }),
        }
    }
}

/// Uniformly random wait within `[min, max]`.
#[derive(Debug, Clone, Copy)]
pub struct ThinkingDelay {
    min: Duration,
    max: Duration,
}

impl ThinkingDelay {
    pub fn new(min: Duration, max: Duration) -> Self {
        if max < min { Self { min: max, max: min } } else { Self { min, max } }
    }

    pub fn sample(&self) -> Duration {
        if self.min == self.max {
            return self.min;
        }
        rand::thread_rng().gen_range(self.min..=self.max)
    }

    pub async fn wait(&self) {
        tokio::time::sleep(self.sample()).await;
    }
}

pub fn new_responder(kind: ResponderType, delay: ThinkingDelay) -> Arc<dyn Responder> {
    match kind {
        ResponderType::Canned => Arc::new(CannedResponder::new(delay)),
        ResponderType::Echo => Arc::new(EchoResponder::new(delay)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_responder_types() {
        assert_eq!("Canned".parse::<ResponderType>(), Ok(ResponderType::Canned));
        assert_eq!("echo".parse::<ResponderType>(), Ok(ResponderType::Echo));
        assert!("gemini".parse::<ResponderType>().is_err());
    }

    #[test]
    fn delay_stays_in_range() {
        let delay = ThinkingDelay::new(Duration::from_millis(900), Duration::from_millis(100));
        for _ in 0..50 {
            let d = delay.sample();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(900));
        }
        assert_eq!(ThinkingDelay::new(Duration::ZERO, Duration::ZERO).sample(), Duration::ZERO);
    }
}
