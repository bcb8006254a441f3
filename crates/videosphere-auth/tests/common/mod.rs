//! Shared fixtures for token verification tests
//!
//! RSA key generation is slow in debug builds, so each key pair is generated
//! once per test binary and shared.

#![allow(dead_code)]

use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::pkcs1::{EncodeRsaPrivateKey, EncodeRsaPublicKey, LineEnding};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use serde_json::{Value, json};
use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const AUDIENCE: &str = "pk_test_videosphere";

/// An RSA signing key with its published JWK
pub struct TestKey {
    pub kid: &'static str,
    pub private_pem: Vec<u8>,
    pub public_pem: Vec<u8>,
    pub jwk: Value,
}

impl TestKey {
    fn generate(kid: &'static str) -> Self {
        let mut rng = rand::thread_rng();
        let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
        let public_key = private_key.to_public_key();

        let private_pem = private_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("Failed to encode private key")
            .as_bytes()
            .to_vec();
        let public_pem = public_key
            .to_pkcs1_pem(LineEnding::LF)
            .expect("Failed to encode public key")
            .into_bytes();

        let jwk = json!({
            "kty": "RSA",
            "kid": kid,
            "use": "sig",
            "alg": "RS256",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        });

        Self {
            kid,
            private_pem,
            public_pem,
            jwk,
        }
    }

    /// Sign `claims` with RS256 and this key's `kid`
    pub fn sign(&self, claims: &Value) -> String {
        self.sign_with(Algorithm::RS256, claims)
    }

    /// Sign `claims` with another RSA algorithm but the same key and `kid`
    pub fn sign_with(&self, algorithm: Algorithm, claims: &Value) -> String {
        let mut header = Header::new(algorithm);
        header.kid = Some(self.kid.to_string());
        let key = EncodingKey::from_rsa_pem(&self.private_pem).expect("Invalid RSA key");
        encode(&header, claims, &key).expect("Failed to encode test JWT")
    }
}

pub static PRIMARY_KEY: LazyLock<TestKey> = LazyLock::new(|| TestKey::generate("ins_primary"));
pub static ROTATED_KEY: LazyLock<TestKey> = LazyLock::new(|| TestKey::generate("ins_rotated"));

/// Sign with HMAC, tagging the header with `kid` as an attacker would
pub fn sign_hs256(kid: &str, secret: &[u8], claims: &Value) -> String {
    let mut header = Header::new(Algorithm::HS256);
    header.kid = Some(kid.to_string());
    encode(&header, claims, &EncodingKey::from_secret(secret)).expect("Failed to encode HS256 JWT")
}

pub fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as i64
}

/// Claims as issued for a signed-in user, valid for an hour
pub fn session_claims(sub: &str) -> Value {
    let now = now();
    json!({
        "sub": sub,
        "aud": AUDIENCE,
        "iss": "https://clerk.videosphere.dev",
        "iat": now,
        "nbf": now,
        "exp": now + 3600,
        "sid": "sess_2b3c",
        "email": format!("{sub}@example.com"),
    })
}

/// JWKS document publishing `keys`
pub fn jwks_body(keys: &[&TestKey]) -> Value {
    json!({ "keys": keys.iter().map(|k| k.jwk.clone()).collect::<Vec<_>>() })
}

/// Start a mock identity provider serving `keys` at `/v1/jwks`
pub async fn mock_provider(keys: &[&TestKey]) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/jwks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(jwks_body(keys)))
        .mount(&server)
        .await;
    server
}
