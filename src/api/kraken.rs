use super::ExchangeApi;
use crate::models::{ExchangeResponse, OrderPayload, PriceSource, TradingPair};
use anyhow::{Context, Result};
use base64::prelude::{Engine, BASE64_STANDARD};
use chrono::Utc;
use governor::{Quota, RateLimiter};
use hmac::{Hmac, Mac};
use reqwest::Client;
use sha2::{Digest, Sha256, Sha512};
use std::fmt;
use std::num::NonZeroU32;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

pub const KRAKEN_API_BASE: &str = "https://api.kraken.com";
const API_VERSION: &str = "0";

type HmacSha512 = Hmac<Sha512>;

// Type alias for the rate limiter to simplify signatures
type KrakenRateLimiter = RateLimiter<
    governor::state::direct::NotKeyed,
    governor::state::InMemoryState,
    governor::clock::DefaultClock,
>;

/// Kraken API key pair. The secret is kept base64-decoded.
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    secret: Vec<u8>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, secret: &str) -> Result<Self> {
        let secret = BASE64_STANDARD
            .decode(secret.trim())
            .context("API secret is not valid base64")?;

        Ok(Self {
            api_key: api_key.into().trim().to_string(),
            secret,
        })
    }

    /// Read a key file: API key on the first line, secret on the second
    pub fn from_key_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read key file {}", path.display()))?;

        let mut lines = content.lines().map(str::trim).filter(|l| !l.is_empty());
        let api_key = lines
            .next()
            .with_context(|| format!("Key file {} has no API key", path.display()))?;
        let secret = lines
            .next()
            .with_context(|| format!("Key file {} has no API secret", path.display()))?;

        Self::new(api_key, secret)
    }

    /// `KRAKEN_API_KEY` / `KRAKEN_API_SECRET`, if both are set
    pub fn from_env() -> Result<Option<Self>> {
        match (
            std::env::var("KRAKEN_API_KEY"),
            std::env::var("KRAKEN_API_SECRET"),
        ) {
            (Ok(key), Ok(secret)) => Self::new(key, &secret).map(Some),
            _ => Ok(None),
        }
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Compute `API-Sign` for a private request.
///
/// `base64(HMAC-SHA512(path + SHA256(nonce + body), secret))`
pub fn sign_request(path: &str, nonce: u64, body: &str, secret: &[u8]) -> Result<String> {
    let mut sha = Sha256::new();
    sha.update(nonce.to_string().as_bytes());
    sha.update(body.as_bytes());
    let digest = sha.finalize();

    let mut mac = HmacSha512::new_from_slice(secret).context("Invalid API secret")?;
    mac.update(path.as_bytes());
    mac.update(&digest);

    Ok(BASE64_STANDARD.encode(mac.finalize().into_bytes()))
}

/// Kraken REST client with client-side rate limiting
///
/// Does not retry: a failed request is reported to the caller as is.
pub struct KrakenClient {
    client: Client,
    base_url: String,
    credentials: Option<Credentials>,
    rate_limiter: Arc<KrakenRateLimiter>,
    last_nonce: AtomicU64,
}

impl KrakenClient {
    pub fn new(base_url: &str, timeout: Duration, requests_per_minute: u32) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("kraken-dca/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        let quota =
            Quota::per_minute(NonZeroU32::new(requests_per_minute).unwrap_or(NonZeroU32::MIN));

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials: None,
            rate_limiter: Arc::new(RateLimiter::direct(quota)),
            last_nonce: AtomicU64::new(0),
        })
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Call a public endpoint, e.g. `Ticker`
    pub async fn query_public(
        &self,
        method: &str,
        params: &[(&str, &str)],
    ) -> Result<ExchangeResponse> {
        let url = format!("{}/{}/public/{}", self.base_url, API_VERSION, method);

        self.rate_limiter.until_ready().await;
        tracing::debug!(method, ?params, "Kraken public request");

        let response = self
            .client
            .get(&url)
            .query(params)
            .send()
            .await
            .with_context(|| format!("Request to Kraken {} failed", method))?;

        Self::parse_response(method, response).await
    }

    /// Call an authenticated endpoint, e.g. `AddOrder`
    pub async fn query_private(
        &self,
        method: &str,
        params: Vec<(&'static str, String)>,
    ) -> Result<ExchangeResponse> {
        let credentials = self.credentials.as_ref().with_context(|| {
            format!("API credentials are required for private endpoint {}", method)
        })?;

        let path = format!("/{}/private/{}", API_VERSION, method);
        let nonce = self.next_nonce();

        let mut fields = vec![("nonce", nonce.to_string())];
        fields.extend(params);
        let body = serde_urlencoded::to_string(&fields).context("Failed to encode request")?;
        let signature = sign_request(&path, nonce, &body, &credentials.secret)?;

        self.rate_limiter.until_ready().await;
        tracing::debug!(method, nonce, "Kraken private request");

        let response = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .header("API-Key", credentials.api_key())
            .header("API-Sign", signature)
            .header(
                reqwest::header::CONTENT_TYPE,
                "application/x-www-form-urlencoded; charset=utf-8",
            )
            .body(body)
            .send()
            .await
            .with_context(|| format!("Request to Kraken {} failed", method))?;

        Self::parse_response(method, response).await
    }

    async fn parse_response(method: &str, response: reqwest::Response) -> Result<ExchangeResponse> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            anyhow::bail!("Kraken API error on {} ({}): {}", method, status, error_text);
        }

        response
            .json()
            .await
            .with_context(|| format!("Failed to parse Kraken {} response", method))
    }

    /// Millisecond timestamp, bumped so that it strictly increases per client
    fn next_nonce(&self) -> u64 {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        let mut last = self.last_nonce.load(Ordering::SeqCst);
        loop {
            let next = now.max(last + 1);
            match self
                .last_nonce
                .compare_exchange(last, next, Ordering::SeqCst, Ordering::SeqCst)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}

impl ExchangeApi for KrakenClient {
    async fn query_market_data(
        &self,
        pair: &TradingPair,
        source: PriceSource,
    ) -> Result<ExchangeResponse> {
        let method = match source {
            PriceSource::Ticker => "Ticker",
            PriceSource::Ohlc => "OHLC",
        };
        self.query_public(method, &[("pair", pair.as_str())]).await
    }

    async fn submit_order(&self, payload: &OrderPayload) -> Result<ExchangeResponse> {
        self.query_private("AddOrder", payload.form_fields()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC_SECRET: &str =
        "kQH5HW/8p1uGOVjbgWA7FunAmGO8lsSUXNsu3eow76sz84Q18fWxnyRzBHCd3pd5nE9qa99HAZtuZuj6F1huXg==";

    #[test]
    fn test_sign_request_matches_kraken_example() {
        let secret = BASE64_STANDARD.decode(DOC_SECRET).unwrap();
        let body = "nonce=1616492376594&ordertype=limit&pair=XBTUSD&price=37500&type=buy&volume=1.25";

        let signature = sign_request("/0/private/AddOrder", 1616492376594, body, &secret).unwrap();

        assert_eq!(
            signature,
            "4/dpxb3iT4tp/ZCVEwSnEsLxx0bqyhLpdfOpc6fn7OR8+UClSV5n9E6aSS8MPtnRfp32bAb0nmbRn6H8ndwLUQ=="
        );
    }

    #[test]
    fn test_credentials_reject_invalid_secret() {
        let result = Credentials::new("key", "not base64 !!");
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("base64"));
    }

    #[test]
    fn test_credentials_debug_hides_secret() {
        let credentials = Credentials::new("my-key", DOC_SECRET).unwrap();
        let debug = format!("{:?}", credentials);
        assert!(debug.contains("my-key"));
        assert!(!debug.contains("kQH5HW"));
    }

    #[test]
    fn test_credentials_from_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kraken.key");
        std::fs::write(&path, format!("my-key\n{}\n", DOC_SECRET)).unwrap();

        let credentials = Credentials::from_key_file(&path).unwrap();
        assert_eq!(credentials.api_key(), "my-key");
    }

    #[test]
    fn test_key_file_missing_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kraken.key");
        std::fs::write(&path, "only-a-key\n").unwrap();

        let result = Credentials::from_key_file(&path);
        assert!(result.unwrap_err().to_string().contains("no API secret"));
    }

    #[test]
    fn test_nonce_strictly_increases() {
        let client = KrakenClient::new(KRAKEN_API_BASE, Duration::from_secs(5), 60).unwrap();
        let mut previous = client.next_nonce();
        for _ in 0..100 {
            let nonce = client.next_nonce();
            assert!(nonce > previous);
            previous = nonce;
        }
    }

    #[tokio::test]
    async fn test_private_call_requires_credentials() {
        let client = KrakenClient::new(KRAKEN_API_BASE, Duration::from_secs(5), 60).unwrap();

        let result = client.query_private("AddOrder", vec![]).await;
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("credentials are required"));
    }
}
