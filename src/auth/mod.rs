pub mod guard;
pub mod otp;
pub mod validation;

pub use otp::OtpSimulator;
