//! JWT 토큰 발급 및 검증.
//!
//! HS256으로 서명된 compact 토큰을 다룹니다. 페이로드는 `uid`, `role`, `exp`
//! 세 필드를 기본으로 하는 열린 맵이며, 서명 키는 프로세스 수명 동안 불변입니다.

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Access Token 유효 기간 (시간)
pub const TOKEN_TTL_HOURS: i64 = 24;

const ROLE_CLAIM: &str = "role";

/// JWT Access Token 페이로드.
///
/// `uid`와 `exp` 외의 모든 필드(`role` 포함)는 `extra`에 그대로 보존되므로
/// 발급 → 검증 과정에서 손실되지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 ID
    pub uid: String,
    /// Expiration - 토큰 만료 시간 (Unix timestamp, 초)
    pub exp: i64,
    /// 나머지 클레임
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Claims {
    /// 지금부터 [`TOKEN_TTL_HOURS`] 동안 유효한 Claims 생성.
    ///
    /// # Arguments
    ///
    /// * `user_id` - 사용자 ID
    /// * `role` - 발급 시점의 사용자 역할
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        let exp = (Utc::now() + Duration::hours(TOKEN_TTL_HOURS)).timestamp();
        Self::expiring_at(user_id, role, exp)
    }

    /// 만료 시각을 직접 지정하여 Claims 생성.
    pub fn expiring_at(user_id: impl Into<String>, role: impl Into<String>, exp: i64) -> Self {
        let mut extra = Map::new();
        extra.insert(ROLE_CLAIM.to_string(), Value::String(role.into()));
        Self {
            uid: user_id.into(),
            exp,
            extra,
        }
    }

    /// 임의의 클레임 추가.
    #[must_use]
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// `role` 클레임 조회.
    ///
    /// 필드가 없거나 문자열이 아니면 `None`을 반환합니다.
    pub fn role(&self) -> Option<&str> {
        self.extra.get(ROLE_CLAIM).and_then(Value::as_str)
    }

    /// 토큰이 만료되었는지 확인.
    ///
    /// 현재 시각이 `exp`보다 엄격하게 이전일 때만 유효합니다.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// JWT 처리 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("token encoding failed: {0}")]
    Encoding(#[source] jsonwebtoken::errors::Error),
    #[error("malformed token")]
    Malformed,
    #[error("token signature does not verify")]
    BadSignature,
    #[error("token expired")]
    Expired,
}

/// 토큰 발급기.
///
/// 서명과 검증에 같은 대칭 키를 사용합니다. 키 자료는 `Debug` 출력에 포함되지 않습니다.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenIssuer {
    /// 설정에서 주입된 비밀 키로 발급기 생성.
    pub fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;
        // aud는 열린 클레임 맵의 일부로만 다룬다
        validation.validate_aud = false;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
        }
    }

    /// Claims를 서명하여 토큰 문자열로 만듭니다.
    pub fn issue(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding).map_err(JwtError::Encoding)
    }

    /// 사용자에게 새 Access Token 발급.
    pub fn issue_for(&self, user_id: &str, role: &str) -> Result<String, JwtError> {
        self.issue(&Claims::new(user_id, role))
    }

    /// 토큰 검증 및 디코딩.
    ///
    /// 서명을 먼저 검증한 뒤 만료 시각을 확인합니다. 서명은 맞지만 만료된 토큰은
    /// `BadSignature`가 아니라 `Expired`입니다.
    pub fn verify(&self, token: &str) -> Result<Claims, JwtError> {
        let data =
            decode::<Claims>(token, &self.decoding, &self.validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::InvalidSignature => JwtError::BadSignature,
                    ErrorKind::ExpiredSignature => JwtError::Expired,
                    _ => JwtError::Malformed,
                }
            })?;

        // leeway 0이어도 exp == now는 라이브러리에서 통과하므로 여기서 한 번 더 막는다
        if data.claims.is_expired() {
            return Err(JwtError::Expired);
        }

        Ok(data.claims)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &Algorithm::HS256)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&SecretString::from(TEST_SECRET))
    }

    #[test]
    fn test_issue_and_verify_round_trip() {
        let issuer = issuer();
        let claims = Claims::new("8d1f6c3e-0000-4000-8000-000000000001", "user");

        let token = issuer.issue(&claims).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let decoded = issuer.verify(&token).unwrap();
        assert_eq!(decoded, claims);
        assert_eq!(decoded.role(), Some("user"));
    }

    #[test]
    fn test_extra_claims_are_preserved() {
        let issuer = issuer();
        let claims = Claims::new("u1", "admin").with_claim("scope", Value::from("files"));

        let decoded = issuer.verify(&issuer.issue(&claims).unwrap()).unwrap();
        assert_eq!(decoded.extra.get("scope"), Some(&Value::from("files")));
        assert_eq!(decoded, claims);

        let with_audience = claims.with_claim("aud", Value::from("vaultx-files"));
        let decoded = issuer.verify(&issuer.issue(&with_audience).unwrap()).unwrap();
        assert_eq!(decoded.extra.get("aud"), Some(&Value::from("vaultx-files")));
        assert_eq!(decoded, with_audience);
    }

    #[test]
    fn test_registered_claim_names_round_trip() {
        let issuer = issuer();

        for name in ["aud", "iss", "sub", "nbf", "jti"] {
            let value = if name == "nbf" {
                Value::from(Utc::now().timestamp() - 60)
            } else {
                Value::from("vaultx")
            };
            let claims = Claims::new("u1", "user").with_claim(name, value);

            let decoded = issuer.verify(&issuer.issue(&claims).unwrap());
            assert_eq!(decoded.ok(), Some(claims), "claim: {}", name);
        }

        let audience_list = Claims::new("u1", "user").with_claim("aud", serde_json::json!(["a", "b"]));
        let decoded = issuer.verify(&issuer.issue(&audience_list).unwrap()).unwrap();
        assert_eq!(decoded, audience_list);
    }

    #[test]
    fn test_expiry_window_is_24_hours() {
        let claims = Claims::new("u1", "user");
        let expected = Utc::now().timestamp() + TOKEN_TTL_HOURS * 3600;
        assert!((claims.exp - expected).abs() <= 1);
    }

    #[test]
    fn test_expired_token() {
        let issuer = issuer();
        let claims = Claims::expiring_at("u1", "user", Utc::now().timestamp() - 10);
        let token = issuer.issue(&claims).unwrap();

        assert!(matches!(issuer.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_expiring_now_is_rejected() {
        let issuer = issuer();
        let claims = Claims::expiring_at("u1", "user", Utc::now().timestamp());
        let token = issuer.issue(&claims).unwrap();

        assert!(matches!(issuer.verify(&token), Err(JwtError::Expired)));
    }

    #[test]
    fn test_wrong_secret() {
        let token = issuer().issue(&Claims::new("u1", "user")).unwrap();
        let other = TokenIssuer::new(&SecretString::from(
            "wrong-secret-key-for-testing-minimum-32-chars",
        ));

        assert!(matches!(other.verify(&token), Err(JwtError::BadSignature)));
    }

    #[test]
    fn test_bad_signature_wins_over_expiry() {
        let claims = Claims::expiring_at("u1", "user", Utc::now().timestamp() - 10);
        let token = issuer().issue(&claims).unwrap();
        let other = TokenIssuer::new(&SecretString::from(
            "wrong-secret-key-for-testing-minimum-32-chars",
        ));

        assert!(matches!(other.verify(&token), Err(JwtError::BadSignature)));
    }

    #[test]
    fn test_tampered_payload() {
        let issuer = issuer();
        let user_token = issuer.issue(&Claims::new("u1", "user")).unwrap();
        let admin_token = issuer.issue(&Claims::new("u1", "admin")).unwrap();

        // admin 페이로드에 user 서명을 붙인다
        let user_parts: Vec<&str> = user_token.split('.').collect();
        let admin_parts: Vec<&str> = admin_token.split('.').collect();
        let forged = format!("{}.{}.{}", admin_parts[0], admin_parts[1], user_parts[2]);

        assert!(matches!(issuer.verify(&forged), Err(JwtError::BadSignature)));
    }

    #[test]
    fn test_malformed_token() {
        let issuer = issuer();
        assert!(matches!(issuer.verify("invalid.token.here"), Err(JwtError::Malformed)));
        assert!(matches!(issuer.verify(""), Err(JwtError::Malformed)));
    }

    #[test]
    fn test_missing_or_non_string_role() {
        let issuer = issuer();
        let exp = Utc::now().timestamp() + 60;

        let mut no_role = Claims::expiring_at("u1", "user", exp);
        no_role.extra.remove("role");
        let decoded = issuer.verify(&issuer.issue(&no_role).unwrap()).unwrap();
        assert_eq!(decoded.role(), None);

        let numeric_role = Claims::expiring_at("u1", "user", exp).with_claim("role", Value::from(7));
        let decoded = issuer.verify(&issuer.issue(&numeric_role).unwrap()).unwrap();
        assert_eq!(decoded.role(), None);
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", issuer());
        assert!(!debug.contains(TEST_SECRET));
        assert!(debug.contains("TokenIssuer"));
    }
}
