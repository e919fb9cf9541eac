// noskem/src/services/webhook_signature.rs

//! Paystack webhook authentication.
//!
//! Paystack signs every webhook with `hex(HMAC-SHA512(secret_key, raw_body))`
//! and sends it in `x-paystack-signature`. The check runs over the exact
//! bytes received, before anything parses them.

use hmac::{Hmac, Mac};
use sha2::Sha512;
use thiserror::Error;

type HmacSha512 = Hmac<Sha512>;

pub const SIGNATURE_HEADER: &str = "x-paystack-signature";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
  #[error("missing webhook signature")]
  Missing,
  #[error("webhook signature is not hex")]
  Malformed,
  #[error("webhook signature mismatch")]
  Mismatch,
}

fn mac_for(secret: &str, body: &[u8]) -> HmacSha512 {
  // HMAC takes keys of any length, so `new_from_slice` cannot fail here.
  let mut mac = <HmacSha512 as Mac>::new_from_slice(secret.as_bytes())
    .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
  mac.update(body);
  mac
}

/// Lowercase hex signature Paystack would send for `body`.
pub fn sign(secret: &str, body: &[u8]) -> String {
  hex::encode(mac_for(secret, body).finalize().into_bytes())
}

/// Accepts iff `provided` is the hex HMAC-SHA512 of `body` under `secret`.
/// The comparison is constant-time.
pub fn verify(secret: &str, body: &[u8], provided: Option<&str>) -> Result<(), SignatureError> {
  let provided = provided.map(str::trim).filter(|s| !s.is_empty()).ok_or(SignatureError::Missing)?;
  let expected = hex::decode(provided).map_err(|_| SignatureError::Malformed)?;
  mac_for(secret, body)
    .verify_slice(&expected)
    .map_err(|_| SignatureError::Mismatch)
}

#[cfg(test)]
mod tests {
  use super::*;

  const SECRET: &str = "sk_test_webhook";

  #[test]
  fn accepts_exactly_the_matching_signature() {
    let bodies: [&[u8]; 3] = [b"", b"{\"event\":\"charge.success\"}", &[0xff, 0x00, 0x7f]];
    for body in bodies {
      let good = sign(SECRET, body);
      assert_eq!(verify(SECRET, body, Some(&good)), Ok(()));
      assert_eq!(verify(SECRET, body, Some(&good.to_uppercase())), Ok(()));
      assert_eq!(verify("sk_other", body, Some(&good)), Err(SignatureError::Mismatch));

      let mut tampered = body.to_vec();
      tampered.push(b' ');
      assert_eq!(verify(SECRET, &tampered, Some(&good)), Err(SignatureError::Mismatch));
    }
  }

  #[test]
  fn missing_and_malformed_headers_are_distinguished() {
    assert_eq!(verify(SECRET, b"{}", None), Err(SignatureError::Missing));
    assert_eq!(verify(SECRET, b"{}", Some("  ")), Err(SignatureError::Missing));
    assert_eq!(verify(SECRET, b"{}", Some("not-hex")), Err(SignatureError::Malformed));
    assert_eq!(verify(SECRET, b"{}", Some("abcd")), Err(SignatureError::Mismatch));
  }

  #[test]
  fn signature_is_128_hex_chars() {
    let sig = sign(SECRET, b"payload");
    assert_eq!(sig.len(), 128);
    assert!(sig.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
  }
}
