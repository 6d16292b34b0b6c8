use chrono::{TimeDelta, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CallerRole {
    Reviewer,
    Supplier,
    Admin,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Reviewer or supplier record key, or the admin's name.
    pub sub: String,
    pub role: CallerRole,
    pub exp: usize,
    pub iat: usize,
}

pub struct JWT {
    key_enc: EncodingKey,
    key_dec: DecodingKey,
    duration: TimeDelta,
}

impl JWT {
    pub fn new(secret: String, duration: TimeDelta) -> Self {
        Self {
            duration,
            key_enc: EncodingKey::from_secret(secret.as_ref()),
            key_dec: DecodingKey::from_secret(secret.as_ref()),
        }
    }

    pub fn create(&self, subject: &str, role: CallerRole) -> Result<String, String> {
        let claims = Claims {
            sub: subject.to_string(),
            role,
            exp: (Utc::now() + self.duration).timestamp() as usize,
            iat: Utc::now().timestamp() as usize,
        };

        encode(&Header::default(), &claims, &self.key_enc).map_err(|err| err.to_string())
    }

    pub fn decode(&self, token: &str) -> Result<Claims, String> {
        decode::<Claims>(token, &self.key_dec, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|err| err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn token_round_trips_role() {
        let jwt = JWT::new("some-secret".to_string(), Duration::hours(1));
        let token = jwt.create("01HZREVIEWER", CallerRole::Reviewer).unwrap();
        let claims = jwt.decode(&token).unwrap();
        assert_eq!(claims.sub, "01HZREVIEWER");
        assert_eq!(claims.role, CallerRole::Reviewer);
    }

    #[test]
    fn expired_token_is_rejected() {
        let jwt = JWT::new("some-secret".to_string(), Duration::hours(-2));
        let token = jwt.create("someone", CallerRole::Admin).unwrap();
        assert!(jwt.decode(&token).is_err());
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let issuer = JWT::new("issuer".to_string(), Duration::hours(1));
        let verifier = JWT::new("verifier".to_string(), Duration::hours(1));
        let token = issuer.create("someone", CallerRole::Supplier).unwrap();
        assert!(verifier.decode(&token).is_err());
    }
}
