use axum::extract::FromRef;
use jsonwebtoken::{decode, DecodingKey, Validation};
use tracing::debug;

use super::claims::Claims;
use crate::{config::SessionConfig, state::AppState};

/// Verification half of the identity provider's HS256 signing setup.
#[derive(Clone)]
pub struct JwtKeys {
    pub decoding: DecodingKey,
    pub audience: String,
    pub issuer: Option<String>,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        JwtKeys::new(&state.config.session)
    }
}

impl JwtKeys {
    pub fn new(cfg: &SessionConfig) -> Self {
        Self {
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            audience: cfg.audience.clone(),
            issuer: cfg.issuer.clone(),
        }
    }

    pub fn verify(&self, token: &str) -> anyhow::Result<Claims> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        if let Some(issuer) = &self.issuer {
            // `iss` is only compared when present unless it is also required.
            validation.set_issuer(std::slice::from_ref(issuer));
            validation.set_required_spec_claims(&["exp", "aud", "iss"]);
        }
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        debug!(user_id = %data.claims.sub, "session token verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::auth::claims::UserMetadata;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use time::OffsetDateTime;
    use uuid::Uuid;

    pub(crate) fn session_config() -> SessionConfig {
        SessionConfig {
            secret: "test-secret".into(),
            audience: "authenticated".into(),
            issuer: None,
        }
    }

    pub(crate) fn claims_for(owner: Uuid, full_name: Option<&str>) -> Claims {
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        Claims {
            sub: owner,
            exp: now + 3600,
            iat: now,
            iss: None,
            aud: "authenticated".into(),
            email: Some("diner@example.com".into()),
            user_metadata: UserMetadata {
                full_name: full_name.map(Into::into),
                avatar_url: Some("https://example.com/a.png".into()),
                ..UserMetadata::default()
            },
        }
    }

    pub(crate) fn sign(claims: &Claims, secret: &str) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("sign token")
    }

    #[test]
    fn verifies_provider_token() {
        let owner = Uuid::new_v4();
        let token = sign(&claims_for(owner, Some("Asha Rao")), "test-secret");
        let claims = JwtKeys::new(&session_config()).verify(&token).expect("verify");
        assert_eq!(claims.sub, owner);
        assert_eq!(claims.user_metadata.full_name.as_deref(), Some("Asha Rao"));
    }

    #[test]
    fn rejects_wrong_secret() {
        let token = sign(&claims_for(Uuid::new_v4(), None), "other-secret");
        assert!(JwtKeys::new(&session_config()).verify(&token).is_err());
    }

    #[test]
    fn rejects_wrong_audience() {
        let mut claims = claims_for(Uuid::new_v4(), None);
        claims.aud = "anon".into();
        let token = sign(&claims, "test-secret");
        assert!(JwtKeys::new(&session_config()).verify(&token).is_err());
    }

    #[test]
    fn enforces_issuer_when_configured() {
        let mut cfg = session_config();
        cfg.issuer = Some("https://auth.example.com".into());
        let keys = JwtKeys::new(&cfg);

        let token = sign(&claims_for(Uuid::new_v4(), None), "test-secret");
        assert!(keys.verify(&token).is_err());

        let mut claims = claims_for(Uuid::new_v4(), None);
        claims.iss = Some("https://auth.example.com".into());
        let token = sign(&claims, "test-secret");
        assert!(keys.verify(&token).is_ok());
    }

    #[test]
    fn configured_issuer_rejects_other_issuers() {
        let mut cfg = session_config();
        cfg.issuer = Some("https://auth.example.com".into());
        let mut claims = claims_for(Uuid::new_v4(), None);
        claims.iss = Some("https://elsewhere.example.com".into());
        let token = sign(&claims, "test-secret");
        assert!(JwtKeys::new(&cfg).verify(&token).is_err());
    }

    #[test]
    fn issuer_is_optional_when_not_configured() {
        let token = sign(&claims_for(Uuid::new_v4(), None), "test-secret");
        assert!(JwtKeys::new(&session_config()).verify(&token).is_ok());
    }

    #[test]
    fn rejects_expired_token() {
        let mut claims = claims_for(Uuid::new_v4(), None);
        claims.exp = 1_000;
        let token = sign(&claims, "test-secret");
        assert!(JwtKeys::new(&session_config()).verify(&token).is_err());
    }
}
