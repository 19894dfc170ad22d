//! JDCLOUD2-HMAC-SHA256 request signing

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::cloudprovider::{CloudError, Result};

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "JDCLOUD2-HMAC-SHA256";
pub const HEADER_DATE: &str = "x-jdcloud-date";
pub const HEADER_NONCE: &str = "x-jdcloud-nonce";

const SIGNED_HEADERS: &str = "content-type;host;x-jdcloud-date;x-jdcloud-nonce";
const SCOPE_TERMINATOR: &str = "jdcloud2_request";

#[derive(Debug, Clone)]
pub struct Credential {
    pub access_key_id: String,
    pub access_key_secret: String,
}

/// The parts of a request covered by the signature
pub struct SignInput<'a> {
    pub method: &'a str,
    pub host: &'a str,
    /// Already percent-encoded path
    pub path: &'a str,
    /// Canonical (sorted, encoded) query string
    pub query: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
    pub region: &'a str,
    pub service: &'a str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub date: String,
    pub nonce: String,
    pub authorization: String,
}

pub fn sign(
    credential: &Credential,
    input: &SignInput<'_>,
    now: DateTime<Utc>,
    nonce: &str,
) -> Result<Signature> {
    let date = now.format("%Y%m%dT%H%M%SZ").to_string();
    let short_date = now.format("%Y%m%d").to_string();

    let canonical_request = format!(
        "{}\n{}\n{}\ncontent-type:{}\nhost:{}\n{}:{}\n{}:{}\n\n{}\n{}",
        input.method,
        input.path,
        input.query,
        input.content_type,
        input.host,
        HEADER_DATE,
        date,
        HEADER_NONCE,
        nonce,
        SIGNED_HEADERS,
        sha256_hex(input.body),
    );

    let scope = format!(
        "{}/{}/{}/{}",
        short_date, input.region, input.service, SCOPE_TERMINATOR
    );
    let string_to_sign = format!(
        "{}\n{}\n{}\n{}",
        ALGORITHM,
        date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let key = hmac_sha256(
        format!("JDCLOUD2{}", credential.access_key_secret).as_bytes(),
        short_date.as_bytes(),
    )?;
    let key = hmac_sha256(&key, input.region.as_bytes())?;
    let key = hmac_sha256(&key, input.service.as_bytes())?;
    let key = hmac_sha256(&key, SCOPE_TERMINATOR.as_bytes())?;
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

    Ok(Signature {
        date,
        nonce: nonce.to_string(),
        authorization: format!(
            "{} Credential={}/{}, SignedHeaders={}, Signature={}",
            ALGORITHM, credential.access_key_id, scope, SIGNED_HEADERS, signature
        ),
    })
}

fn hmac_sha256(key: &[u8], payload: &[u8]) -> Result<Vec<u8>> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|e| CloudError::Config(format!("invalid signing key: {}", e)))?;
    mac.update(payload);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(payload: &[u8]) -> String {
    hex::encode(Sha256::digest(payload))
}

/// RFC 3986 percent-encoding; `/` is kept when `keep_slash` is set
pub fn uri_encode(input: &str, keep_slash: bool) -> String {
    if keep_slash {
        input
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    } else {
        urlencoding::encode(input).into_owned()
    }
}

/// Encoded query pairs sorted by key then value, joined with `&`
pub fn canonical_query(pairs: &[(String, String)]) -> String {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (uri_encode(k, false), uri_encode(v, false)))
        .collect();
    encoded.sort();
    encoded
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect::<Vec<_>>()
        .join("&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input<'a>() -> SignInput<'a> {
        SignInput {
            method: "GET",
            host: "vm.jdcloud-api.com",
            path: "/v1/regions/cn-north-1/instances",
            query: "pageNumber=1&pageSize=100",
            content_type: "application/json",
            body: b"",
            region: "cn-north-1",
            service: "vm",
        }
    }

    fn credential(secret: &str) -> Credential {
        Credential {
            access_key_id: "AK".into(),
            access_key_secret: secret.into(),
        }
    }

    #[test]
    fn hmac_matches_known_vector() {
        let mac = hmac_sha256(b"key", b"The quick brown fox jumps over the lazy dog").unwrap();
        assert_eq!(
            hex::encode(mac),
            "f7bc83f430538424b13298e6aa6fb143ef4d59a14946175997479dbc2d1a3cd8"
        );
    }

    #[test]
    fn authorization_header_layout() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let sig = sign(&credential("SK"), &input(), now, "nonce-1").unwrap();
        assert_eq!(sig.date, "20260304T050607Z");
        assert_eq!(sig.nonce, "nonce-1");

        let prefix = "JDCLOUD2-HMAC-SHA256 Credential=AK/20260304/cn-north-1/vm/jdcloud2_request, \
                      SignedHeaders=content-type;host;x-jdcloud-date;x-jdcloud-nonce, Signature=";
        assert!(sig.authorization.starts_with(prefix), "{}", sig.authorization);
        let hex_sig = &sig.authorization[prefix.len()..];
        assert_eq!(hex_sig.len(), 64);
        assert!(hex_sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_depends_on_secret_and_nonce() {
        let now = Utc.with_ymd_and_hms(2026, 3, 4, 5, 6, 7).unwrap();
        let a = sign(&credential("SK"), &input(), now, "n").unwrap();
        let b = sign(&credential("SK"), &input(), now, "n").unwrap();
        let c = sign(&credential("SK2"), &input(), now, "n").unwrap();
        let d = sign(&credential("SK"), &input(), now, "m").unwrap();
        assert_eq!(a, b);
        assert_ne!(a.authorization, c.authorization);
        assert_ne!(a.authorization, d.authorization);
    }

    #[test]
    fn encoding() {
        assert_eq!(uri_encode("a b/c~", false), "a%20b%2Fc~");
        assert_eq!(uri_encode("/v1/regions/x", true), "/v1/regions/x");
        assert_eq!(uri_encode("中", false), "%E4%B8%AD");
    }

    #[test]
    fn query_is_sorted() {
        let pairs = vec![
            ("pageSize".to_string(), "100".to_string()),
            ("filters.1.name".to_string(), "az".to_string()),
            ("pageNumber".to_string(), "1".to_string()),
        ];
        assert_eq!(
            canonical_query(&pairs),
            "filters.1.name=az&pageNumber=1&pageSize=100"
        );
    }

    #[test]
    fn reserved_characters_in_query() {
        let pairs = vec![
            ("filters.1.values.1".to_string(), "web server/a~b*".to_string()),
            ("filters.1.name".to_string(), "instanceName".to_string()),
        ];
        let query = canonical_query(&pairs);
        assert_eq!(
            query,
            "filters.1.name=instanceName&filters.1.values.1=web%20server%2Fa~b%2A"
        );

        let now = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let mut signed = input();
        signed.query = &query;
        let a = sign(&credential("SK"), &signed, now, "n").unwrap();
        let b = sign(&credential("SK"), &input(), now, "n").unwrap();
        assert_ne!(a.authorization, b.authorization);
    }
}
