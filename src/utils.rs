// Presentation helpers

use crate::constants::{ADDRESS_HEX_LEN, CHAIN_NAMES};

/// Pads a short or unprefixed address into `0x` + 40 hex digits for display.
///
/// Already canonical and other `0x`-prefixed strings are returned as-is.
pub fn format_contract_address(address: &str) -> String {
    if address.is_empty() {
        return String::new();
    }
    if address.starts_with("0x") && address.len() == ADDRESS_HEX_LEN + 2 {
        return address.to_string();
    }
    if !address.starts_with("0x") {
        return format!("0x{:0>width$}", address, width = ADDRESS_HEX_LEN);
    }
    address.to_string()
}

/// Human-readable chain name, falling back to `"Chain <id>"`.
pub fn get_chain_name(chain_id: u64) -> String {
    CHAIN_NAMES
        .iter()
        .find(|(id, _)| *id == chain_id)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| format!("Chain {}", chain_id))
}

/// Truthy values accepted for boolean environment flags.
pub fn parse_flag(value: &str) -> bool {
    let normalized = value.trim().to_ascii_lowercase();
    normalized == "1" || normalized == "true" || normalized == "yes" || normalized == "on"
}
