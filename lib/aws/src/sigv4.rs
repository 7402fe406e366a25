//! AWS Signature Version 4 request signing.
//!
//! Only the header-based form is implemented: the caller supplies the
//! request parts and receives the headers to attach (`x-amz-date`,
//! `x-amz-security-token` for temporary credentials, and `authorization`).

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// The signing algorithm identifier.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Access key credentials.
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

/// The parts of a request that go into its signature.
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    /// Host header value, including a non-default port.
    pub host: &'a str,
    /// URI-encoded absolute path.
    pub path: &'a str,
    /// URI-encoded query string without the leading `?`.
    pub query: &'a str,
    /// Additional headers to sign.
    pub headers: &'a [(&'a str, &'a str)],
    pub payload: &'a [u8],
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct Signer {
    credentials: Credentials,
    region: String,
    service: String,
}

impl Signer {
    /// Creates a signer.
    pub fn new(
        credentials: Credentials,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            credentials,
            region: region.into(),
            service: service.into(),
        }
    }

    /// Returns the headers that authenticate `request` at time `at`.
    #[must_use]
    pub fn sign(&self, request: &SignableRequest<'_>, at: DateTime<Utc>) -> Vec<(String, String)> {
        let amz_date = at.format("%Y%m%dT%H%M%SZ").to_string();
        let date = at.format("%Y%m%d").to_string();

        let mut added = vec![("x-amz-date".to_string(), amz_date.clone())];
        if let Some(token) = &self.credentials.session_token {
            added.push(("x-amz-security-token".to_string(), token.clone()));
        }

        let mut headers: Vec<(String, String)> = request
            .headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .chain(std::iter::once(("host".to_string(), request.host.to_string())))
            .chain(added.iter().cloned())
            .collect();
        let (canonical_headers, signed_headers) = canonical_headers(&mut headers);

        let canonical = canonical_request(
            request.method,
            request.path,
            request.query,
            &canonical_headers,
            &signed_headers,
            &hex_sha256(request.payload),
        );

        let scope = format!("{date}/{}/{}/aws4_request", self.region, self.service);
        let to_sign = string_to_sign(&amz_date, &scope, &canonical);
        let key = signing_key(
            &self.credentials.secret_access_key,
            &date,
            &self.region,
            &self.service,
        );
        let signature = hex::encode(hmac_sha256(&key, to_sign.as_bytes()));

        added.push((
            "authorization".to_string(),
            format!(
                "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
                self.credentials.access_key_id
            ),
        ));
        added
    }
}

/// Derives the signing key for a date, region and service.
#[must_use]
pub fn signing_key(secret_access_key: &str, date: &str, region: &str, service: &str) -> [u8; 32] {
    let k_date = hmac_sha256(format!("AWS4{secret_access_key}").as_bytes(), date.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Builds the canonical request string.
#[must_use]
pub fn canonical_request(
    method: &str,
    path: &str,
    query: &str,
    canonical_headers: &str,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let path = if path.is_empty() { "/" } else { path };
    format!(
        "{method}\n{path}\n{}\n{canonical_headers}\n{signed_headers}\n{payload_hash}",
        canonical_query(query)
    )
}

/// Builds the string to sign from the canonical request.
#[must_use]
pub fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    format!(
        "{ALGORITHM}\n{amz_date}\n{scope}\n{}",
        hex_sha256(canonical_request.as_bytes())
    )
}

/// Lowercases, trims and sorts headers, returning the canonical header
/// block and the signed header list.
fn canonical_headers(headers: &mut [(String, String)]) -> (String, String) {
    for (name, value) in headers.iter_mut() {
        *name = name.to_ascii_lowercase();
        *value = value.split_whitespace().collect::<Vec<_>>().join(" ");
    }
    headers.sort_by(|a, b| a.0.cmp(&b.0));

    let block = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect::<String>();
    let signed = headers
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(";");
    (block, signed)
}

fn canonical_query(query: &str) -> String {
    if query.is_empty() {
        return String::new();
    }
    let mut pairs: Vec<&str> = query.split('&').collect();
    pairs.sort_unstable();
    pairs.join("&")
}

/// Hex-encoded SHA-256 of `data`.
#[must_use]
pub fn hex_sha256(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

pub(crate) fn hmac_sha256(key: &[u8], data: &[u8]) -> [u8; 32] {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        unreachable!("HMAC accepts keys of any length");
    };
    mac.update(data);
    let mut out = [0u8; 32];
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    #[test]
    fn derives_documented_signing_key() {
        let key = signing_key(SECRET, "20120215", "us-east-1", "iam");
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn empty_payload_hash() {
        assert_eq!(
            hex_sha256(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn signs_documented_iam_request() {
        let signer = Signer::new(
            Credentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: SECRET.to_string(),
                session_token: None,
            },
            "us-east-1",
            "iam",
        );
        let at = Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap();

        let headers = signer.sign(
            &SignableRequest {
                method: "GET",
                host: "iam.amazonaws.com",
                path: "/",
                query: "Version=2010-05-08&Action=ListUsers",
                headers: &[(
                    "Content-Type",
                    "application/x-www-form-urlencoded; charset=utf-8",
                )],
                payload: b"",
            },
            at,
        );

        assert_eq!(headers[0], ("x-amz-date".to_string(), "20150830T123600Z".to_string()));
        let (name, authorization) = headers.last().unwrap();
        assert_eq!(name, "authorization");
        assert_eq!(
            authorization,
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/iam/aws4_request, \
             SignedHeaders=content-type;host;x-amz-date, \
             Signature=5d672d79c15b13162d9279b0855cfba6789a8edb4c82c400e06b5924a6f2b5d7"
        );
    }

    #[test]
    fn session_token_is_signed() {
        let signer = Signer::new(
            Credentials {
                access_key_id: "AKIDEXAMPLE".to_string(),
                secret_access_key: SECRET.to_string(),
                session_token: Some("session".to_string()),
            },
            "us-east-1",
            "cognito-idp",
        );
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let headers = signer.sign(
            &SignableRequest {
                method: "POST",
                host: "cognito-idp.us-east-1.amazonaws.com",
                path: "/",
                query: "",
                headers: &[],
                payload: b"{}",
            },
            at,
        );

        assert!(headers.contains(&("x-amz-security-token".to_string(), "session".to_string())));
        let authorization = &headers.last().unwrap().1;
        assert!(authorization.contains("SignedHeaders=host;x-amz-date;x-amz-security-token"));
        assert!(authorization.contains("/20240102/us-east-1/cognito-idp/aws4_request"));
    }

    #[test]
    fn header_values_are_trimmed_and_names_lowercased() {
        let mut headers = vec![
            ("X-Amz-Target".to_string(), "  a   b ".to_string()),
            ("Host".to_string(), "example.com".to_string()),
        ];
        let (block, signed) = canonical_headers(&mut headers);
        assert_eq!(block, "host:example.com\nx-amz-target:a b\n");
        assert_eq!(signed, "host;x-amz-target");
    }
}
