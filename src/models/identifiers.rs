use crate::{
    constants::{ADDRESS_HEX_LEN, SPEC_ID_HEX_LEN},
    error::{AppError, Result},
    utils::format_contract_address,
};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};

// Internal helper that strips an optional `0x` / `0X` prefix.
fn strip_hex_prefix(value: &str) -> &str {
    value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value)
}

fn is_hex(value: &str) -> bool {
    !value.is_empty() && value.bytes().all(|b| b.is_ascii_hexdigit())
}

/// 32-byte KaiSign spec identifier.
///
/// Rendered as `0x` followed by 64 lowercase hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpecId([u8; 32]);

impl SpecId {
    /// Validates and canonicalizes caller input.
    ///
    /// Short identifiers are left-padded with zeros. Identifiers longer than
    /// 64 hex digits are truncated to their first 64 digits rather than
    /// rejected.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "Invalid spec ID format: Spec ID cannot be empty".to_string(),
            ));
        }

        let digits = strip_hex_prefix(trimmed);
        if !is_hex(digits) {
            return Err(AppError::Validation(
                "Invalid spec ID format: Spec ID must contain only hexadecimal characters"
                    .to_string(),
            ));
        }

        // ASCII-only at this point, so byte slicing is safe.
        let digits = &digits[..digits.len().min(SPEC_ID_HEX_LEN)];
        let padded = format!("{:0>width$}", digits, width = SPEC_ID_HEX_LEN);

        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| AppError::Internal(format!("Spec ID decode failed: {}", e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for SpecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = format!("0x{}", hex::encode(self.0));
        debug_assert_eq!(rendered.len(), SPEC_ID_HEX_LEN + 2);
        f.write_str(&rendered)
    }
}

impl FromStr for SpecId {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for SpecId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SpecId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        SpecId::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// 20-byte contract address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContractAddress([u8; 20]);

impl ContractAddress {
    /// Accepts canonical addresses as well as short unprefixed forms that
    /// `format_contract_address` pads out (e.g. `7b24ed5`).
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AppError::Validation(
                "Contract address cannot be empty".to_string(),
            ));
        }
        let prefixed = match trimmed.strip_prefix("0X") {
            Some(rest) => format!("0x{}", rest),
            None => trimmed.to_string(),
        };
        let formatted = format_contract_address(&prefixed);
        let digits = strip_hex_prefix(&formatted);
        if digits.len() != ADDRESS_HEX_LEN || !is_hex(digits) {
            return Err(AppError::Validation(format!(
                "Invalid contract address: {}",
                trimmed
            )));
        }

        let mut bytes = [0u8; 20];
        hex::decode_to_slice(digits, &mut bytes)
            .map_err(|e| AppError::Validation(format!("Invalid contract address: {}", e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for ContractAddress {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for ContractAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A lookup against the metadata backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetadataQuery {
    BySpecId(SpecId),
    ByContract {
        address: ContractAddress,
        chain_id: u64,
    },
}

impl MetadataQuery {
    /// JSON body the backend expects for this lookup.
    pub fn request_body(&self) -> serde_json::Value {
        match self {
            MetadataQuery::BySpecId(spec_id) => serde_json::json!({
                "spec_id": spec_id.to_string(),
            }),
            MetadataQuery::ByContract { address, chain_id } => serde_json::json!({
                "contract_address": address.to_string(),
                "chain_id": chain_id,
            }),
        }
    }
}

/// One `(address, chainId)` pair as supplied by API callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractQuery {
    pub address: String,
    #[serde(rename = "chainId")]
    pub chain_id: u64,
}
