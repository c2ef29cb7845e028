//! Phone number normalization to E.164

use async_trait::async_trait;
use phonenumber::{country, Mode};
use tracing::warn;

/// Converts a dialed number to E.164 for a default country.
///
/// Implementations never fail: an invalid number is reported with a warning
/// and a best-effort value is returned.
#[async_trait]
pub trait PhoneNormalizer: Send + Sync {
    async fn normalize(&self, number: &str, country: &str) -> String;
}

/// Normalizer backed by the libphonenumber metadata of the `phonenumber` crate
#[derive(Debug, Clone, Default)]
pub struct LibPhoneNormalizer;

impl LibPhoneNormalizer {
    pub fn new() -> Self {
        Self
    }

    fn format_e164(number: &str, country: &str) -> String {
        let region = country.trim().to_ascii_uppercase().parse::<country::Id>().ok();
        if region.is_none() {
            warn!("{} is not a known country code, parsing {} as international", country, number);
        }

        match phonenumber::parse(region, number) {
            Ok(parsed) => {
                if !phonenumber::is_valid(&parsed) {
                    warn!("to: {} is not a valid phone number in {}", number, country);
                }
                parsed.format().mode(Mode::E164).to_string()
            }
            Err(e) => {
                warn!("to: {} is not a valid phone number in {}: {}", number, country, e);
                number.to_string()
            }
        }
    }
}

#[async_trait]
impl PhoneNormalizer for LibPhoneNormalizer {
    async fn normalize(&self, number: &str, country: &str) -> String {
        Self::format_e164(number, country)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_national_number_gets_country_prefix() {
        let normalizer = LibPhoneNormalizer::new();
        assert_eq!(normalizer.normalize("5551230000", "US").await, "+15551230000");
        assert_eq!(normalizer.normalize("020 7946 0000", "GB").await, "+442079460000");
    }

    #[tokio::test]
    async fn test_normalization_is_idempotent() {
        let normalizer = LibPhoneNormalizer::new();
        let once = normalizer.normalize("5551230000", "US").await;
        let twice = normalizer.normalize(&once, "US").await;
        assert_eq!(once, twice);

        let uk = normalizer.normalize("+442079460000", "GB").await;
        assert_eq!(uk, "+442079460000");
    }

    #[tokio::test]
    async fn test_invalid_input_returns_a_value() {
        let normalizer = LibPhoneNormalizer::new();
        assert_eq!(normalizer.normalize("not-a-number", "US").await, "not-a-number");
        assert!(!normalizer.normalize("12", "US").await.is_empty());
        assert!(!normalizer.normalize("5551230000", "ZZZ").await.is_empty());
    }
}
