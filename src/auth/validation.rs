use serde::Deserialize;
use thiserror::Error;

const OTP_LEN: usize = 6;
const MAX_PROMPT_IMAGES: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{0}")]
    Field(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneForm {
    pub country_code: String,
    pub phone: String,
}

impl PhoneForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.country_code.is_empty() {
            return Err(ValidationError::Field("Select a country code"));
        }
        let len = self.phone.chars().count();
        if len < 7 {
            return Err(ValidationError::Field("Phone number is too short"));
        }
        if len > 15 {
            return Err(ValidationError::Field("Phone number is too long"));
        }
        Ok(())
    }

    pub fn full_phone(&self) -> String {
        format!("{}{}", self.country_code, self.phone)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub name: String,
    pub country_code: String,
    pub phone: String,
}

impl SignupForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.chars().count() < 3 {
            return Err(ValidationError::Field("Name must be at least 3 characters"));
        }
        if self.country_code.is_empty() {
            return Err(ValidationError::Field("Select a country code"));
        }
        if self.phone.chars().count() < 5 {
            return Err(ValidationError::Field("Phone number is too short"));
        }
        Ok(())
    }

    pub fn full_phone(&self) -> String {
        format!("{}{}", self.country_code, self.phone)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OtpForm {
    pub otp: String,
}

impl OtpForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.otp.chars().count() != OTP_LEN {
            return Err(ValidationError::Field("OTP must be 6 digits"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PromptInput {
    pub message: String,
    #[serde(default)]
    pub images: Vec<String>,
}

impl PromptInput {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.message.is_empty() {
            return Err(ValidationError::Field("Message is required"));
        }
        if self.images.len() > MAX_PROMPT_IMAGES {
            return Err(ValidationError::Field("You can upload max 5 images"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn phone(code: &str, phone: &str) -> PhoneForm {
        PhoneForm { country_code: code.into(), phone: phone.into() }
    }

    #[test]
    fn phone_length_bounds() {
        assert!(phone("+91", "1234567").validate().is_ok());
        assert!(phone("+91", "123456789012345").validate().is_ok());
        assert!(phone("+91", "123456").validate().is_err());
        assert!(phone("+91", "1234567890123456").validate().is_err());
        assert_eq!(
            phone("", "1234567").validate(),
            Err(ValidationError::Field("Select a country code"))
        );
        assert_eq!(phone("+91", "9876543210").full_phone(), "+919876543210");
    }

    #[test]
    fn signup_rules() {
        let form = SignupForm { name: "Al".into(), country_code: "+1".into(), phone: "55501".into() };
        assert_eq!(form.validate().unwrap_err().to_string(), "Name must be at least 3 characters");
        let form = SignupForm { name: "Ada".into(), ..form };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn otp_must_be_six_characters() {
        assert!(OtpForm { otp: "123456".into() }.validate().is_ok());
        assert!(OtpForm { otp: "12345".into() }.validate().is_err());
        assert!(OtpForm { otp: "1234567".into() }.validate().is_err());
    }

    #[test]
    fn prompt_limits() {
        let ok = PromptInput { message: "hi".into(), images: vec![] };
        assert!(ok.validate().is_ok());
        let empty = PromptInput { message: String::new(), images: vec![] };
        assert_eq!(empty.validate(), Err(ValidationError::Field("Message is required")));
        let many = PromptInput { message: "hi".into(), images: vec!["a.png".into(); 6] };
        assert!(many.validate().is_err());
    }
}
