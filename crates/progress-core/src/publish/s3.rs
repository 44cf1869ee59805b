//! S3-compatible object storage over HTTPS, signed with AWS Signature V4.
//!
//! Only the three calls the publisher needs are implemented: PutObject,
//! DeleteObject and ListObjectsV2. Without a custom endpoint requests go to
//! the virtual-hosted bucket URL; with one they use path-style addressing.

use std::fmt::Display;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use regex::Regex;
use reqwest::blocking::Client;
use reqwest::Url;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{ProgressError, Result};

use super::ContentStore;

type HmacSha256 = Hmac<Sha256>;

const SERVICE: &str = "s3";
const ALGORITHM: &str = "AWS4-HMAC-SHA256";

fn content_err(e: impl Display) -> ProgressError {
    ProgressError::Content(e.to_string())
}

// ---------------------------------------------------------------------------
// Credentials
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl S3Credentials {
    /// Read `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` and the optional
    /// `AWS_SESSION_TOKEN`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build credentials from `lookup`; empty values count as unset.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let access_key_id = var("AWS_ACCESS_KEY_ID").ok_or_else(|| {
            ProgressError::Config("AWS_ACCESS_KEY_ID is not set".to_string())
        })?;
        let secret_access_key = var("AWS_SECRET_ACCESS_KEY").ok_or_else(|| {
            ProgressError::Config("AWS_SECRET_ACCESS_KEY is not set".to_string())
        })?;
        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token: var("AWS_SESSION_TOKEN"),
        })
    }
}

impl std::fmt::Debug for S3Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Signing helpers
// ---------------------------------------------------------------------------

/// Percent-encode per the SigV4 rules: unreserved characters pass through,
/// `/` passes through only when `keep_slash` is set.
pub fn uri_encode(raw: &str, keep_slash: bool) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            b'/' if keep_slash => out.push('/'),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(content_err)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derive the SigV4 signing key for one day, region and service.
pub fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Result<Vec<u8>> {
    let k_date = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac_sha256(&k_date, region.as_bytes())?;
    let k_service = hmac_sha256(&k_region, service.as_bytes())?;
    hmac_sha256(&k_service, b"aws4_request")
}

/// Sorted, encoded query string as it appears in both the canonical request
/// and the request URL.
pub fn canonical_query(params: &[(&str, String)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(k, v)| (uri_encode(k, false), uri_encode(v, false)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

// ---------------------------------------------------------------------------
// ListObjectsV2 response parsing
// ---------------------------------------------------------------------------

static KEY_RE: OnceLock<Regex> = OnceLock::new();
static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn xml_unescape(raw: &str) -> String {
    raw.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Keys on one ListObjectsV2 page plus the continuation token when truncated.
pub fn parse_list_page(xml: &str) -> (Vec<String>, Option<String>) {
    let key_re = KEY_RE.get_or_init(|| Regex::new(r"<Key>([^<]*)</Key>").unwrap());
    let token_re = TOKEN_RE.get_or_init(|| {
        Regex::new(r"<NextContinuationToken>([^<]*)</NextContinuationToken>").unwrap()
    });
    let keys = key_re
        .captures_iter(xml)
        .map(|c| xml_unescape(&c[1]))
        .collect();
    let token = if xml.contains("<IsTruncated>true</IsTruncated>") {
        token_re.captures(xml).map(|c| xml_unescape(&c[1]))
    } else {
        None
    };
    (keys, token)
}

// ---------------------------------------------------------------------------
// S3ContentStore
// ---------------------------------------------------------------------------

pub struct S3ContentStore {
    client: Client,
    region: String,
    creds: S3Credentials,
    /// `scheme://host[:port]`
    origin: String,
    /// Value of the Host header.
    host: String,
    /// Path prefix of the bucket: empty for virtual-hosted, `/{bucket}` for path-style.
    bucket_path: String,
    base_url: String,
}

impl S3ContentStore {
    pub fn new(
        bucket: &str,
        region: &str,
        endpoint: Option<&str>,
        public_base_url: Option<String>,
        creds: S3Credentials,
    ) -> Result<Self> {
        let (origin, host, bucket_path) = match endpoint {
            Some(ep) => {
                let url = Url::parse(ep).map_err(|e| {
                    ProgressError::Config(format!("invalid publish.endpoint '{ep}': {e}"))
                })?;
                let host_name = url.host_str().ok_or_else(|| {
                    ProgressError::Config(format!("publish.endpoint has no host: {ep}"))
                })?;
                let host = match url.port() {
                    Some(port) => format!("{host_name}:{port}"),
                    None => host_name.to_string(),
                };
                (
                    format!("{}://{host}", url.scheme()),
                    host,
                    format!("/{}", uri_encode(bucket, false)),
                )
            }
            None => {
                let host = format!("{bucket}.s3.{region}.amazonaws.com");
                (format!("https://{host}"), host, String::new())
            }
        };
        let base_url =
            public_base_url.unwrap_or_else(|| format!("https://{bucket}.s3.amazonaws.com"));
        Ok(Self {
            client: Client::new(),
            region: region.to_string(),
            creds,
            origin,
            host,
            bucket_path,
            base_url,
        })
    }

    fn canonical_uri(&self, key: &str) -> String {
        format!("{}/{}", self.bucket_path, uri_encode(key, true))
    }

    /// Headers (including `authorization`) for one signed request. The Host
    /// header is signed but left for the HTTP client to send.
    fn sign(
        &self,
        method: &str,
        canonical_uri: &str,
        query: &str,
        content_type: Option<&str>,
        payload: &[u8],
        now: DateTime<Utc>,
    ) -> Result<Vec<(String, String)>> {
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = sha256_hex(payload);

        let mut headers: Vec<(String, String)> = vec![
            ("host".to_string(), self.host.clone()),
            ("x-amz-content-sha256".to_string(), payload_hash.clone()),
            ("x-amz-date".to_string(), amz_date.clone()),
        ];
        if let Some(ct) = content_type {
            headers.push(("content-type".to_string(), ct.to_string()));
        }
        if let Some(token) = &self.creds.session_token {
            headers.push(("x-amz-security-token".to_string(), token.clone()));
        }
        headers.sort();

        let canonical_headers: String = headers
            .iter()
            .map(|(k, v)| format!("{k}:{}\n", v.trim()))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(k, _)| k.as_str())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{method}\n{canonical_uri}\n{query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}"
        );
        let scope = format!("{date}/{}/{SERVICE}/aws4_request", self.region);
        let string_to_sign = format!(
            "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );
        let key = signing_key(&self.creds.secret_access_key, &date, &self.region, SERVICE)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        headers.retain(|(k, _)| k != "host");
        headers.push((
            "authorization".to_string(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
                self.creds.access_key_id
            ),
        ));
        Ok(headers)
    }

    fn send(
        &self,
        method: reqwest::Method,
        canonical_uri: &str,
        query: &str,
        content_type: Option<&str>,
        payload: Vec<u8>,
    ) -> Result<String> {
        let headers = self.sign(
            method.as_str(),
            canonical_uri,
            query,
            content_type,
            &payload,
            Utc::now(),
        )?;
        let url = if query.is_empty() {
            format!("{}{canonical_uri}", self.origin)
        } else {
            format!("{}{canonical_uri}?{query}", self.origin)
        };

        let mut req = self.client.request(method.clone(), &url);
        for (k, v) in &headers {
            req = req.header(k.as_str(), v.as_str());
        }
        let resp = req.body(payload).send()?;
        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(ProgressError::Content(format!(
                "{method} {canonical_uri}: HTTP {status}: {}",
                body.trim()
            )));
        }
        debug!(%method, uri = canonical_uri, %status, "s3 request");
        Ok(body)
    }
}

impl ContentStore for S3ContentStore {
    fn put(&self, key: &str, body: &[u8], content_type: &str) -> Result<()> {
        self.send(
            reqwest::Method::PUT,
            &self.canonical_uri(key),
            "",
            Some(content_type),
            body.to_vec(),
        )?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        self.send(
            reqwest::Method::DELETE,
            &self.canonical_uri(key),
            "",
            None,
            Vec::new(),
        )?;
        Ok(())
    }

    fn list(&self, prefix: &str) -> Result<Vec<String>> {
        let uri = if self.bucket_path.is_empty() {
            "/".to_string()
        } else {
            self.bucket_path.clone()
        };
        let mut keys = Vec::new();
        let mut token: Option<String> = None;
        loop {
            let mut params = vec![("list-type", "2".to_string()), ("prefix", prefix.to_string())];
            if let Some(t) = &token {
                params.push(("continuation-token", t.clone()));
            }
            let xml = self.send(
                reqwest::Method::GET,
                &uri,
                &canonical_query(&params),
                None,
                Vec::new(),
            )?;
            let (page, next) = parse_list_page(&xml);
            keys.extend(page);
            match next {
                Some(t) => token = Some(t),
                None => break,
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}
