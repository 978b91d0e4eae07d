use hmac::{Hmac, Mac};
use sha2::Sha256;

const PREFIX: &str = "sha256=";

/// Value of the `X-Hub-Signature-256` header.
pub struct Signature<'a>(pub &'a str);

impl<'a> Signature<'a> {
    /// Check if the signature matches the HMAC-SHA256 of `body` keyed with `secret`.
    pub fn is_valid(&self, body: &[u8], secret: &str) -> anyhow::Result<bool> {
        let Some(hex_digest) = self.0.strip_prefix(PREFIX) else {
            anyhow::bail!("Signature is missing the {PREFIX} prefix");
        };
        let Ok(decoded) = hex::decode(hex_digest) else {
            anyhow::bail!("Invalid signature format: {}", self.0);
        };

        let mut hmac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("Invalid webhook secret: {e}"))?;
        hmac.update(body);
        Ok(hmac.verify_slice(&decoded).is_ok())
    }
}
