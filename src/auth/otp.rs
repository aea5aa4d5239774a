use log::info;
use std::time::Duration;

/// Stand-in for an SMS gateway. Nothing is sent; only one code is ever accepted.
#[derive(Clone, Debug)]
pub struct OtpSimulator {
    code: String,
    send_delay: Duration,
    verify_delay: Duration,
}

impl OtpSimulator {
    pub fn new(code: impl Into<String>, send_delay: Duration, verify_delay: Duration) -> Self {
        Self {
            code: code.into(),
            send_delay,
            verify_delay,
        }
    }

    pub async fn send_otp(&self, phone: &str) -> bool {
        info!("Sending OTP to {}", phone);
        tokio::time::sleep(self.send_delay).await;
        true
    }

    pub async fn verify_otp(&self, otp: &str) -> bool {
        tokio::time::sleep(self.verify_delay).await;
        otp == self.code
    }
}
