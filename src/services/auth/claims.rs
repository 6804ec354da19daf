use serde::Deserialize;

/// Decoded payload of a verified bearer token.
///
/// - `sub` is required; a token without it does not decode.
/// - `aud` is kept as a single optional string. Tokens carrying an audience
///   array do not decode and are therefore rejected.
/// - a missing `exp` decodes as 0, which is always in the past.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub exp: i64,
}

impl TokenClaims {
    /// All three must hold: not expired (strictly), audience present,
    /// audience equal to the caller's client id.
    pub fn accepts(&self, now: i64, client_id: Option<&str>) -> bool {
        if self.exp <= now {
            return false;
        }
        match (self.aud.as_deref(), client_id) {
            (Some(aud), Some(client_id)) => aud == client_id,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn claims(aud: Option<&str>, exp: i64) -> TokenClaims {
        TokenClaims {
            sub: "u1".to_string(),
            aud: aud.map(str::to_string),
            exp,
        }
    }

    #[test]
    fn accepts_live_token_for_matching_client() {
        assert!(claims(Some("app1"), NOW + 3600).accepts(NOW, Some("app1")));
    }

    #[test]
    fn exp_equal_to_now_is_expired() {
        assert!(!claims(Some("app1"), NOW).accepts(NOW, Some("app1")));
        assert!(!claims(Some("app1"), NOW - 1).accepts(NOW, Some("app1")));
    }

    #[test]
    fn audience_must_be_present_and_match() {
        assert!(!claims(None, NOW + 60).accepts(NOW, Some("app1")));
        assert!(!claims(Some("app1"), NOW + 60).accepts(NOW, Some("app2")));
        assert!(!claims(Some("app1"), NOW + 60).accepts(NOW, None));
    }

    #[test]
    fn missing_exp_defaults_to_expired() {
        let c: TokenClaims = serde_json::from_str(r#"{"sub":"u1","aud":"app1"}"#).unwrap();
        assert_eq!(c.exp, 0);
        assert!(!c.accepts(NOW, Some("app1")));
    }

    #[test]
    fn fractional_exp_does_not_decode() {
        let res = serde_json::from_str::<TokenClaims>(
            r#"{"sub":"u1","aud":"app1","exp":4000000000.5}"#,
        );
        assert!(res.is_err());
    }

    #[test]
    fn missing_sub_does_not_decode() {
        let res = serde_json::from_str::<TokenClaims>(r#"{"aud":"app1","exp":1}"#);
        assert!(res.is_err());
    }
}
