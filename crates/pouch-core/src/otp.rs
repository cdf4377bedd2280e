//! One-time password and payment signature derivation
//!
//! Both derivations are HMAC-SHA1 with the digest rendered as base64 where
//! `+` and `/` are substituted by `-` and `_` (padding is kept, matching the
//! server's expectations exactly).

use base64::{engine::general_purpose::STANDARD, Engine};
use hmac::{Hmac, Mac};
use sha1::Sha1;

use crate::error::{Error, Result};

type HmacSha1 = Hmac<Sha1>;

/// Derive a one-time password from the activation secret and counter.
///
/// The key is the raw base64-decoded secret; the message is the 8-byte
/// big-endian encoding of `counter`. Pure and deterministic — the caller
/// owns the nonce discipline: a counter value must never be reused for the
/// same secret (see [`AuthState::next_otp`](crate::state::AuthState::next_otp)).
pub fn derive_otp(activation_secret: &str, counter: u64) -> Result<String> {
    let key = STANDARD.decode(activation_secret)?;
    let mut mac =
        HmacSha1::new_from_slice(&key).map_err(|e| Error::Crypto(e.to_string()))?;
    mac.update(&counter.to_be_bytes());
    Ok(url_safe(&mac.finalize().into_bytes()))
}

/// Derive the `print` signature confirming a reload.
///
/// Keyed by the ASCII bytes of `otp` over the comma-joined message
/// `identity,session_id,card_id,amount,otp`. The `amount` string must be the
/// exact text sent on the wire; any mismatch invalidates the signature
/// server-side.
pub fn payment_signature(
    identity: &str,
    session_id: &str,
    card_id: &str,
    amount: &str,
    otp: &str,
) -> Result<String> {
    let message = [identity, session_id, card_id, amount, otp].join(",");
    let mut mac =
        HmacSha1::new_from_slice(otp.as_bytes()).map_err(|e| Error::Crypto(e.to_string()))?;
    mac.update(message.as_bytes());
    Ok(url_safe(&mac.finalize().into_bytes()))
}

fn url_safe(digest: &[u8]) -> String {
    STANDARD.encode(digest).replace('+', "-").replace('/', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    // base64 of 12 zero bytes
    const ZERO_SECRET: &str = "AAAAAAAAAAAAAAAA";

    #[test]
    fn test_otp_reference_vector() {
        // HMAC-SHA1(key = 12 zero bytes, msg = 0x0000000000000000)
        let otp = derive_otp(ZERO_SECRET, 0).unwrap();
        assert_eq!(otp, "2raa2Y4odk-XfuJIfk8_aHOyopc=");
    }

    #[test]
    fn test_otp_counter_changes_output() {
        let otp1 = derive_otp(ZERO_SECRET, 1).unwrap();
        assert_eq!(otp1, "7rALC8yGRnn_LY3TC-xJXLXy7p4=");
        assert_ne!(derive_otp(ZERO_SECRET, 0).unwrap(), otp1);
    }

    #[test]
    fn test_otp_deterministic() {
        let a = derive_otp("AAECAwQFBgcICQoLDA0ODw==", 7).unwrap();
        let b = derive_otp("AAECAwQFBgcICQoLDA0ODw==", 7).unwrap();
        assert_eq!(a, b);
        assert_eq!(a, "GYwdqb8tejzx3exEi6-_IiyBceI=");
    }

    #[test]
    fn test_otp_url_safe_alphabet() {
        for counter in 0..64 {
            let otp = derive_otp(ZERO_SECRET, counter).unwrap();
            assert!(!otp.contains('+'), "otp {} contains +", otp);
            assert!(!otp.contains('/'), "otp {} contains /", otp);
        }
    }

    #[test]
    fn test_invalid_secret_is_decode_error() {
        let err = derive_otp("not valid base64!!", 0).unwrap_err();
        assert!(matches!(err, Error::SecretDecode(_)));
    }

    #[test]
    fn test_payment_signature_reference_vector() {
        let sig = payment_signature("0600000000", "S1", "42", "10.00", "OTP123").unwrap();
        assert_eq!(sig, "JOxeC94cL3OB5ImKkqxfye_qxYs=");
    }

    #[test]
    fn test_payment_signature_url_safe() {
        for i in 0..32 {
            let sig =
                payment_signature("0600000000", "S1", &i.to_string(), "1.00", "otp").unwrap();
            assert!(!sig.contains('+') && !sig.contains('/'));
        }
    }
}
