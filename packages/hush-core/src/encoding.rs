//! Base64 helpers for the store boundary.
//!
//! The core works on raw bytes. Profile and message stores keep byte
//! fields as standard (padded) base64 strings, so every serializable type
//! in this crate goes through these helpers.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};

use crate::error::{Error, Result};

/// Encode bytes as standard base64
pub fn encode(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Decode standard base64 into a byte vector
pub fn decode(s: &str) -> Result<Vec<u8>> {
    Ok(BASE64.decode(s.trim())?)
}

/// Decode standard base64 into a fixed-size array
///
/// Fails with `Encoding` when the decoded length is not exactly `N`.
pub fn decode_array<const N: usize>(s: &str) -> Result<[u8; N]> {
    let bytes = decode(s)?;
    let len = bytes.len();
    bytes
        .try_into()
        .map_err(|_| Error::Encoding(format!("expected {} bytes, got {}", N, len)))
}

/// Serde helper for `Vec<u8>` fields stored as base64
pub(crate) mod base64_vec {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&super::encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        super::decode(&s).map_err(serde::de::Error::custom)
    }
}

/// Implement base64 string serde for a fixed-size byte newtype
macro_rules! impl_base64_serde {
    ($ty:ident, $len:expr) => {
        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&$crate::encoding::encode(&self.0))
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = <String as serde::Deserialize>::deserialize(deserializer)?;
                $crate::encoding::decode_array::<$len>(&s)
                    .map($ty)
                    .map_err(serde::de::Error::custom)
            }
        }
    };
}

pub(crate) use impl_base64_serde;
