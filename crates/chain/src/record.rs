use std::fmt;

use serde::{Deserialize, Serialize};

use crate::GatewayError;

/// Width of one ABI-encoded clear value.
const WORD: usize = 32;

/// A record as returned by `getBusinessData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessData {
    pub name: String,
    pub description: String,
    /// Confidence score, 1 to 10.
    pub public_value1: u32,
    /// Reserved, always zero when written by this client.
    pub public_value2: u32,
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub creator: String,
    pub is_verified: bool,
    /// Only meaningful when `is_verified` is true.
    pub decrypted_value: u64,
}

/// Opaque handle to an encrypted value stored by the contract.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Handle(String);

impl Handle {
    /// Build a handle from its raw bytes, rendered as `0x`-prefixed hex.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Handle(format!("0x{}", hex::encode(bytes)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode the hex form back into bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, GatewayError> {
        let digits = self.0.strip_prefix("0x").unwrap_or(&self.0);
        hex::decode(digits).map_err(|e| GatewayError::Transport(format!("bad handle: {e}")))
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Confirmation of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: String,
    pub block: u64,
}

/// Encode clear values as consecutive 32-byte big-endian words.
pub fn encode_clear_values(values: &[u64]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * WORD);
    for value in values {
        let mut word = [0u8; WORD];
        word[WORD - 8..].copy_from_slice(&value.to_be_bytes());
        out.extend_from_slice(&word);
    }
    out
}

/// Decode the output of [`encode_clear_values`].
///
/// Fails if the input is not a whole number of words or a word does not
/// fit in 64 bits.
pub fn decode_clear_values(encoded: &[u8]) -> Result<Vec<u64>, GatewayError> {
    if encoded.len() % WORD != 0 {
        return Err(GatewayError::Reverted(format!(
            "clear values length {} is not a multiple of {WORD}",
            encoded.len()
        )));
    }
    encoded
        .chunks(WORD)
        .map(|word| {
            let (high, low) = word.split_at(WORD - 8);
            if high.iter().any(|b| *b != 0) {
                return Err(GatewayError::Reverted(
                    "clear value exceeds 64 bits".to_string(),
                ));
            }
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(low);
            Ok(u64::from_be_bytes(bytes))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_renders_prefixed_hex() {
        let handle = Handle::from_bytes(&[0xab, 0x01]);
        assert_eq!(handle.as_str(), "0xab01");
        assert_eq!(handle.to_bytes().unwrap(), vec![0xab, 0x01]);
    }

    #[test]
    fn clear_values_use_full_words() {
        let encoded = encode_clear_values(&[42, u64::MAX]);
        assert_eq!(encoded.len(), 64);
        assert_eq!(encoded[31], 42);
        assert!(encoded[..24].iter().all(|b| *b == 0));
        assert_eq!(decode_clear_values(&encoded).unwrap(), vec![42, u64::MAX]);
    }

    #[test]
    fn decode_rejects_ragged_input() {
        assert!(decode_clear_values(&[0u8; 31]).is_err());
    }

    #[test]
    fn decode_rejects_oversized_word() {
        let mut word = [0u8; 32];
        word[0] = 1;
        assert!(decode_clear_values(&word).is_err());
    }
}
