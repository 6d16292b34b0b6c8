use std::str::FromStr;

use serde::{de, Deserialize, Deserializer};
use validator::ValidationError;

use crate::entities::amount::Amount;

pub fn trim_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Ok(s.trim().to_string())
}

/// Decimal string such as `"0.05"`, parsed without going through floats.
pub fn deserialize_amount<'de, D>(deserializer: D) -> Result<Amount, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    Amount::from_str(&s).map_err(de::Error::custom)
}

pub fn deserialize_option_amount<'de, D>(deserializer: D) -> Result<Option<Amount>, D::Error>
where
    D: Deserializer<'de>,
{
    let s: Option<String> = Deserialize::deserialize(deserializer)?;
    s.map(|value| Amount::from_str(&value).map_err(de::Error::custom))
        .transpose()
}

pub fn validate_not_blank(value: &String) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank").with_message("Must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Input {
        #[serde(deserialize_with = "deserialize_amount")]
        price: Amount,
        #[serde(default, deserialize_with = "deserialize_option_amount")]
        threshold: Option<Amount>,
    }

    #[test]
    fn parses_decimal_amounts() {
        let input: Input = serde_json::from_str(r#"{"price":"0.30"}"#).unwrap();
        assert_eq!(input.price, Amount::from_micros(300_000));
        assert_eq!(input.threshold, None);

        let input: Input =
            serde_json::from_str(r#"{"price":"1","threshold":"25.00"}"#).unwrap();
        assert_eq!(input.threshold, Some(Amount::from_units(25)));

        assert!(serde_json::from_str::<Input>(r#"{"price":"0.0000001"}"#).is_err());
    }

    #[test]
    fn blank_is_rejected() {
        assert!(validate_not_blank(&"  ".to_string()).is_err());
        assert!(validate_not_blank(&"ok".to_string()).is_ok());
    }
}
