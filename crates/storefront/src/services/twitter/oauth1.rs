//! OAuth 1.0a request signing (HMAC-SHA1).
//!
//! Builds the `Authorization: OAuth ...` header for a fixed account whose
//! consumer and access keys come from the environment. Follows RFC 5849
//! section 3.4: parameters are percent-encoded, sorted, joined into the
//! signature base string and signed with `consumer_secret&token_secret`.

use base64::{Engine, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use rand::Rng;
use secrecy::{ExposeSecret, SecretString};
use sha1::Sha1;

use super::TwitterError;

type HmacSha1 = Hmac<Sha1>;

const SIGNATURE_METHOD: &str = "HMAC-SHA1";
const VERSION: &str = "1.0";
const NONCE_LENGTH: usize = 32;

/// Keys for the fixed posting account.
#[derive(Clone)]
pub struct OAuth1Credentials {
    pub consumer_key: String,
    pub consumer_secret: SecretString,
    pub access_token: String,
    pub access_token_secret: SecretString,
}

impl std::fmt::Debug for OAuth1Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuth1Credentials")
            .field("consumer_key", &self.consumer_key)
            .field("consumer_secret", &"[REDACTED]")
            .field("access_token", &self.access_token)
            .field("access_token_secret", &"[REDACTED]")
            .finish()
    }
}

/// Per-request values that must be unique or fresh.
#[derive(Debug, Clone)]
pub struct OAuth1Nonce {
    pub nonce: String,
    pub timestamp: i64,
}

impl OAuth1Nonce {
    /// A random nonce stamped with the current time.
    #[must_use]
    pub fn generate() -> Self {
        let nonce = rand::rng()
            .sample_iter(&rand::distr::Alphanumeric)
            .take(NONCE_LENGTH)
            .map(char::from)
            .collect();
        Self {
            nonce,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// RFC 3986 percent-encoding (unreserved characters pass through).
fn encode(value: &str) -> String {
    urlencoding::encode(value).into_owned()
}

impl OAuth1Credentials {
    /// The `oauth_*` protocol parameters, without the signature.
    fn protocol_params(&self, nonce: &OAuth1Nonce) -> Vec<(&'static str, String)> {
        vec![
            ("oauth_consumer_key", self.consumer_key.clone()),
            ("oauth_nonce", nonce.nonce.clone()),
            ("oauth_signature_method", SIGNATURE_METHOD.to_string()),
            ("oauth_timestamp", nonce.timestamp.to_string()),
            ("oauth_token", self.access_token.clone()),
            ("oauth_version", VERSION.to_string()),
        ]
    }

    /// Compute the base64 HMAC-SHA1 signature for a request.
    ///
    /// `params` are the query or form parameters that take part in the
    /// signature. A JSON body does not, so requests with JSON bodies pass an
    /// empty slice.
    ///
    /// # Errors
    ///
    /// Returns `TwitterError::Signing` if the HMAC key is rejected.
    pub fn signature(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &OAuth1Nonce,
    ) -> Result<String, TwitterError> {
        let mut encoded: Vec<(String, String)> = self
            .protocol_params(nonce)
            .into_iter()
            .map(|(k, v)| (encode(k), encode(&v)))
            .chain(params.iter().map(|(k, v)| (encode(k), encode(v))))
            .collect();
        encoded.sort();

        let param_string = encoded
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let base_string = format!(
            "{}&{}&{}",
            method.to_ascii_uppercase(),
            encode(url),
            encode(&param_string)
        );
        let signing_key = format!(
            "{}&{}",
            encode(self.consumer_secret.expose_secret()),
            encode(self.access_token_secret.expose_secret())
        );

        let mut mac = HmacSha1::new_from_slice(signing_key.as_bytes())
            .map_err(|e| TwitterError::Signing(e.to_string()))?;
        mac.update(base_string.as_bytes());

        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }

    /// Build the full `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns `TwitterError::Signing` if signing fails.
    pub fn authorization_header(
        &self,
        method: &str,
        url: &str,
        params: &[(&str, &str)],
        nonce: &OAuth1Nonce,
    ) -> Result<String, TwitterError> {
        let signature = self.signature(method, url, params, nonce)?;

        let mut fields = self.protocol_params(nonce);
        fields.push(("oauth_signature", signature));
        fields.sort();

        let header = fields
            .iter()
            .map(|(k, v)| format!("{}=\"{}\"", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join(", ");

        Ok(format!("OAuth {header}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    /// Worked example from Twitter's "Creating a signature" guide.
    fn example_credentials() -> OAuth1Credentials {
        OAuth1Credentials {
            consumer_key: "xvz1evFS4wEEPTGEFPHBog".to_string(),
            consumer_secret: SecretString::from("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"),
            access_token: "370773112-GmHxMAgYyLbNEtIKZeRNFsMKPR9EyMZeS9weJAEb".to_string(),
            access_token_secret: SecretString::from("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"),
        }
    }

    fn example_nonce() -> OAuth1Nonce {
        OAuth1Nonce {
            nonce: "kYjzVBB8Y0ZFabxSWbWovY3uYSQ2pTgmZeNu2VS4cg".to_string(),
            timestamp: 1_318_622_958,
        }
    }

    const EXAMPLE_URL: &str = "https://api.twitter.com/1.1/statuses/update.json";
    const EXAMPLE_PARAMS: &[(&str, &str)] = &[
        ("include_entities", "true"),
        ("status", "Hello Ladies + Gentlemen, a signed OAuth request!"),
    ];

    #[test]
    fn test_signature_matches_published_example() {
        let signature = example_credentials()
            .signature("POST", EXAMPLE_URL, EXAMPLE_PARAMS, &example_nonce())
            .unwrap();
        assert_eq!(signature, "hCtSmYh+iHYCEqBWrE7C7hYmtUk=");
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let creds = example_credentials();
        let nonce = example_nonce();
        assert_eq!(
            creds.signature("post", EXAMPLE_URL, EXAMPLE_PARAMS, &nonce).unwrap(),
            creds.signature("POST", EXAMPLE_URL, EXAMPLE_PARAMS, &nonce).unwrap()
        );
    }

    #[test]
    fn test_authorization_header_shape() {
        let header = example_credentials()
            .authorization_header("POST", EXAMPLE_URL, EXAMPLE_PARAMS, &example_nonce())
            .unwrap();

        assert!(header.starts_with("OAuth oauth_consumer_key=\"xvz1evFS4wEEPTGEFPHBog\""));
        assert!(header.contains("oauth_signature=\"hCtSmYh%2BiHYCEqBWrE7C7hYmtUk%3D\""));
        assert!(header.contains("oauth_signature_method=\"HMAC-SHA1\""));
        assert!(header.contains("oauth_version=\"1.0\""));
        // Request parameters are signed but not sent in the header.
        assert!(!header.contains("include_entities"));
    }

    #[test]
    fn test_generated_nonce_is_alphanumeric() {
        let nonce = OAuth1Nonce::generate();
        assert_eq!(nonce.nonce.len(), NONCE_LENGTH);
        assert!(nonce.nonce.chars().all(|c| c.is_ascii_alphanumeric()));
        assert!(nonce.timestamp > 1_600_000_000);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let debug_output = format!("{:?}", example_credentials());
        assert!(!debug_output.contains("kAcSOqF21Fu85e7zjz7ZN2U4ZRhfV3WpwPAoE3Z7kBw"));
        assert!(!debug_output.contains("LswwdoUaIvS8ltyTt5jkRh4J50vUPVVHtR2YPi5kE"));
    }
}
