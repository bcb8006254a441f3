//! Shared fixtures for API tests
//!
//! The verifier is backed by a static key set holding one generated RSA key,
//! so no network is involved.

#![allow(dead_code)]

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, Response, header};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use rsa::RsaPrivateKey;
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::traits::PublicKeyParts;
use serde_json::{Value, json};
use std::sync::{Arc, LazyLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tower::ServiceExt;
use videosphere_auth::{JwkSet, KeySetCache, StaticKeySetSource, TokenVerifier};
use videosphere_server::{AppState, CorsConfig, InMemoryVideoStore, Video, router};

pub const AUDIENCE: &str = "pk_test_videosphere";
pub const KID: &str = "ins_test";

struct SigningKey {
    encoding: EncodingKey,
    jwk: Value,
}

static SIGNING_KEY: LazyLock<SigningKey> = LazyLock::new(|| {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 2048).expect("Failed to generate RSA key");
    let public_key = private_key.to_public_key();

    let pem = private_key
        .to_pkcs1_pem(LineEnding::LF)
        .expect("Failed to encode private key");

    SigningKey {
        encoding: EncodingKey::from_rsa_pem(pem.as_bytes()).expect("Invalid RSA key"),
        jwk: json!({
            "kty": "RSA",
            "kid": KID,
            "use": "sig",
            "alg": "RS256",
            "n": URL_SAFE_NO_PAD.encode(public_key.n().to_bytes_be()),
            "e": URL_SAFE_NO_PAD.encode(public_key.e().to_bytes_be()),
        }),
    }
});

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("Time went backwards")
        .as_secs() as i64
}

/// Claims for a signed-in user, valid for an hour
pub fn claims_for(sub: &str) -> Value {
    let now = now();
    json!({
        "sub": sub,
        "aud": AUDIENCE,
        "iss": "https://clerk.videosphere.dev",
        "iat": now,
        "nbf": now,
        "exp": now + 3600,
    })
}

/// Sign arbitrary claims with the published key
pub fn sign(claims: &Value) -> String {
    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(KID.to_string());
    encode(&header, claims, &SIGNING_KEY.encoding).expect("Failed to encode test JWT")
}

/// A valid session token for `sub`
pub fn token_for(sub: &str) -> String {
    sign(&claims_for(sub))
}

pub fn verifier() -> TokenVerifier {
    let keys: JwkSet =
        serde_json::from_value(json!({ "keys": [SIGNING_KEY.jwk.clone()] })).expect("JWKS");
    let cache = KeySetCache::new(Arc::new(StaticKeySetSource::new(keys)));
    TokenVerifier::new(AUDIENCE, Arc::new(cache))
}

/// Test harness around the router and its store
pub struct TestApp {
    pub router: Router,
    pub store: Arc<InMemoryVideoStore>,
}

impl TestApp {
    pub fn with_videos(videos: Vec<Video>) -> Self {
        Self::build(InMemoryVideoStore::with_videos(videos))
    }

    pub fn sample() -> Self {
        Self::build(InMemoryVideoStore::sample())
    }

    fn build(store: InMemoryVideoStore) -> Self {
        let store = Arc::new(store);
        let state = AppState::new(store.clone(), Arc::new(verifier()));
        Self {
            router: router(state, &CorsConfig::default()),
            store,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(Method::GET, uri, token, None)).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> Response<Body> {
        self.send(request(Method::POST, uri, token, Some(body))).await
    }

    pub async fn delete(&self, uri: &str, token: Option<&str>) -> Response<Body> {
        self.send(request(Method::DELETE, uri, token, None)).await
    }
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

pub fn video(id: i64, owner: Option<&str>) -> Video {
    Video {
        id,
        title: format!("Video {id}"),
        description: None,
        url: format!("https://example.com/{id}"),
        user_id: owner.map(str::to_string),
    }
}
