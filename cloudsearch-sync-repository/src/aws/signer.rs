//! SigV4 request signing.
//!
//! Builds the canonical request for an outbound call and derives its signature
//! through the `date → region → service → aws4_request` HMAC-SHA256 key chain.
//! Signing is pure: the timestamp is passed in, so identical inputs always
//! produce byte-identical headers.

use std::fmt;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use md5::Md5;
use sha2::{Digest, Sha256};

use crate::aws::payload::FormPayload;

type HmacSha256 = Hmac<Sha256>;

/// Signature algorithm name.
pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

/// Timestamp format of the `X-Amz-Date` header.
pub const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Content type of configuration API requests.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded; charset=utf-8";

/// Access key pair used to sign requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
}

impl Credentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
        }
    }

    /// Whether both halves of the key pair are present.
    pub fn is_complete(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .finish()
    }
}

/// The parts of an HTTP request that take part in the signature.
#[derive(Debug, Clone)]
pub struct RequestParts {
    pub method: String,
    pub path: String,
    /// Canonical (already sorted and encoded) query string; empty for none.
    pub query: String,
    /// Headers to sign. `X-Amz-Date` is added by the signer.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

/// A request after signing.
#[derive(Debug, Clone)]
pub struct SignedRequest {
    /// Every signed header plus `Authorization`, in canonical order.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
    pub canonical_request: String,
    pub string_to_sign: String,
}

impl SignedRequest {
    /// Value of a header, matched case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Signs requests for one region and service.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    region: String,
    service: String,
}

impl RequestSigner {
    pub fn new(region: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            service: service.into(),
        }
    }

    /// Sign a configuration API action.
    ///
    /// `Action` and `Version` are injected into the payload, which is then
    /// canonicalized and sent as the form-encoded body of a `POST /`.
    ///
    /// # Arguments
    ///
    /// * `credentials` - The key pair to sign with
    /// * `host` - Target host; lowercased for the `Host` header
    /// * `action` - Operation name (e.g. `DescribeDomains`)
    /// * `version` - API version
    /// * `payload` - Flat action parameters
    /// * `now` - Signing time
    ///
    /// # Returns
    ///
    /// The signed request, whose body is the canonical query string.
    pub fn sign_action(
        &self,
        credentials: &Credentials,
        host: &str,
        action: &str,
        version: &str,
        payload: &FormPayload,
        now: DateTime<Utc>,
    ) -> SignedRequest {
        let payload = payload.clone().with("Action", action).with("Version", version);
        let body = payload.canonical_query_string();

        let headers = vec![
            ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
            ("Content-Length".to_string(), body.len().to_string()),
            ("Content-MD5".to_string(), content_md5(body.as_bytes())),
            ("Host".to_string(), host.to_lowercase()),
            ("Accept".to_string(), "application/json".to_string()),
        ];

        self.sign(
            credentials,
            RequestParts {
                method: "POST".to_string(),
                path: "/".to_string(),
                query: String::new(),
                headers,
                body: body.into_bytes(),
            },
            now,
        )
    }

    /// Sign an arbitrary request.
    pub fn sign(
        &self,
        credentials: &Credentials,
        request: RequestParts,
        now: DateTime<Utc>,
    ) -> SignedRequest {
        let timestamp = now.format(AMZ_DATE_FORMAT).to_string();
        let date = &timestamp[..8];

        let mut headers: Vec<(String, String)> = request
            .headers
            .into_iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case("x-amz-date"))
            .map(|(name, value)| (name, collapse_whitespace(&value)))
            .collect();
        headers.push(("X-Amz-Date".to_string(), timestamp.clone()));
        headers.sort_by_key(|(name, _)| name.to_lowercase());

        let canonical_headers: String = headers
            .iter()
            .map(|(name, value)| format!("{}:{}\n", name.to_lowercase(), value))
            .collect();
        let signed_headers = headers
            .iter()
            .map(|(name, _)| name.to_lowercase())
            .collect::<Vec<_>>()
            .join(";");

        let canonical_request = format!(
            "{}\n{}\n{}\n{}\n{}\n{}",
            request.method,
            request.path,
            request.query,
            canonical_headers,
            signed_headers,
            hex::encode(Sha256::digest(&request.body)),
        );

        let scope = self.credential_scope(date);
        let string_to_sign = format!(
            "{}\n{}\n{}\n{}",
            ALGORITHM,
            timestamp,
            scope,
            hex::encode(Sha256::digest(canonical_request.as_bytes())),
        );

        let signing_key = self.signing_key(&credentials.secret_access_key, date);
        let signature = hex::encode(hmac(&signing_key, string_to_sign.as_bytes()));

        headers.push((
            "Authorization".to_string(),
            format!(
                "{} Credential={}/{},SignedHeaders={},Signature={}",
                ALGORITHM, credentials.access_key_id, scope, signed_headers, signature
            ),
        ));

        SignedRequest {
            headers,
            body: request.body,
            canonical_request,
            string_to_sign,
        }
    }

    /// `date/region/service/aws4_request`.
    pub fn credential_scope(&self, date: &str) -> String {
        format!("{}/{}/{}/aws4_request", date, self.region, self.service)
    }

    fn signing_key(&self, secret: &str, date: &str) -> Vec<u8> {
        let k_date = hmac(format!("AWS4{}", secret).as_bytes(), date.as_bytes());
        let k_region = hmac(&k_date, self.region.as_bytes());
        let k_service = hmac(&k_region, self.service.as_bytes());
        hmac(&k_service, b"aws4_request")
    }
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("HMAC-SHA256 accepts keys of any length"),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Base64 of the raw MD5 digest.
pub fn content_md5(body: &[u8]) -> String {
    BASE64.encode(Md5::digest(body))
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 5, 1, 12, 30, 45).unwrap()
    }

    fn signer() -> RequestSigner {
        RequestSigner::new("us-east-1", "cloudsearch")
    }

    fn credentials() -> Credentials {
        Credentials::new("AKIDEXAMPLE", "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY")
    }

    fn sign_describe() -> SignedRequest {
        signer().sign_action(
            &credentials(),
            "CloudSearch.US-East-1.amazonaws.com",
            "DescribeDomains",
            "2011-02-01",
            &FormPayload::new().with("DomainNames.member.1", "lift"),
            fixed_time(),
        )
    }

    #[test]
    fn test_body_is_sorted_canonical_query() {
        let signed = sign_describe();
        assert_eq!(
            String::from_utf8(signed.body.clone()).unwrap(),
            "Action=DescribeDomains&DomainNames.member.1=lift&Version=2011-02-01"
        );
        assert_eq!(signed.header("content-length"), Some("67"));
        assert_eq!(signed.header("host"), Some("cloudsearch.us-east-1.amazonaws.com"));
        assert_eq!(signed.header("x-amz-date"), Some("20130501T123045Z"));
    }

    #[test]
    fn test_canonical_request_layout() {
        let signed = sign_describe();
        let expected_prefix = "POST\n/\n\n\
            accept:application/json\n\
            content-length:67\n";
        assert!(signed.canonical_request.starts_with(expected_prefix));
        assert!(signed.canonical_request.contains(
            "x-amz-date:20130501T123045Z\n\n\
             accept;content-length;content-md5;content-type;host;x-amz-date\n"
        ));
        let body_hash = hex::encode(Sha256::digest(&signed.body));
        assert!(signed.canonical_request.ends_with(&body_hash));
    }

    #[test]
    fn test_string_to_sign_and_authorization() {
        let signed = sign_describe();
        let lines: Vec<&str> = signed.string_to_sign.lines().collect();
        assert_eq!(lines[0], "AWS4-HMAC-SHA256");
        assert_eq!(lines[1], "20130501T123045Z");
        assert_eq!(lines[2], "20130501/us-east-1/cloudsearch/aws4_request");
        assert_eq!(lines[3].len(), 64);

        let authorization = signed.header("authorization").unwrap();
        assert!(authorization.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20130501/us-east-1/cloudsearch/aws4_request,\
             SignedHeaders=accept;content-length;content-md5;content-type;host;x-amz-date,Signature="
        ));
        let signature = authorization.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
        assert!(signature.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let first = sign_describe();
        let second = sign_describe();
        assert_eq!(first.header("authorization"), second.header("authorization"));
        assert!(first.header("authorization").unwrap().ends_with(
            "Signature=4197efd35a9bdc4b6d335107212be0f2f0d1816e88e860a1ac6d1143ae5c17c3"
        ));

        let later = signer().sign_action(
            &credentials(),
            "cloudsearch.us-east-1.amazonaws.com",
            "DescribeDomains",
            "2011-02-01",
            &FormPayload::new().with("DomainNames.member.1", "lift"),
            fixed_time() + chrono::Duration::seconds(1),
        );
        assert_ne!(first.header("authorization"), later.header("authorization"));
    }

    #[test]
    fn test_headers_are_collapsed_and_sorted() {
        let signed = signer().sign(
            &credentials(),
            RequestParts {
                method: "GET".to_string(),
                path: "/2013-01-01/search".to_string(),
                query: "q=test".to_string(),
                headers: vec![
                    ("Host".to_string(), "search.example.com".to_string()),
                    ("Accept".to_string(), "  application/json \n ".to_string()),
                ],
                body: Vec::new(),
            },
            fixed_time(),
        );

        let names: Vec<&str> = signed.headers.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Accept", "Host", "X-Amz-Date", "Authorization"]);
        assert_eq!(signed.header("accept"), Some("application/json"));
        assert!(signed
            .canonical_request
            .starts_with("GET\n/2013-01-01/search\nq=test\naccept:application/json\n"));
    }

    #[test]
    fn test_content_md5() {
        assert_eq!(content_md5(b""), "1B2M2Y8AsgTpgAmY7PhCfg==");
    }

    #[test]
    fn test_debug_redacts_secret() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("wJalrXUtnFEMI"));
    }
}
