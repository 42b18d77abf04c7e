//! Canonical payload codecs for category registration and deposit claims.
//!
//! Each category decodes payloads against its own schema. Encoding uses
//! bincode with the standard config so that `decode(encode(x)) == x` and,
//! for canonical input, `encode(decode(b)) == b` byte-for-byte — the codec
//! is the wire contract between off-host tooling and the categories.

use serde::{Deserialize, Serialize};

use crate::error::CategoryError;
use crate::types::Address;

fn encode<T: bincode::Encode>(value: &T) -> Vec<u8> {
    // Standard config over plain structs cannot fail to encode.
    bincode::encode_to_vec(value, bincode::config::standard())
        .unwrap_or_default()
}

fn decode<T: bincode::Decode<()>>(bytes: &[u8]) -> Result<T, CategoryError> {
    let (value, consumed) = bincode::decode_from_slice(bytes, bincode::config::standard())
        .map_err(|e| CategoryError::MalformedPayload(e.to_string()))?;
    if consumed != bytes.len() {
        return Err(CategoryError::MalformedPayload(format!(
            "{} trailing bytes",
            bytes.len() - consumed
        )));
    }
    Ok(value)
}

/// Payload of a deposit claim: which pre-funded slot to sweep.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct DepositPayload {
    /// Off-host claim counter; each value may be used at most once.
    pub counter: u64,
    /// Amount the payer declared at deposit time.
    pub amount: u128,
    /// Token the deposit is denominated in.
    pub resource_token: Address,
    /// Resource name the swept amount enters the routing flow as.
    pub resource_name: String,
}

/// Payload of a claims-registry registration: who owns the project and
/// where payouts go.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct ClaimPayload {
    /// Package URL identifying the project.
    pub purl: String,
    /// Account name at the authentication provider.
    pub username: String,
    /// Authentication provider host.
    pub auth_provider: String,
    /// Payout address; [`Address::ZERO`] until assigned.
    pub withdrawer: Address,
}

/// Payload of a fan-out registration: the counted list of share names the
/// category splits paychecks across.
#[derive(
    Serialize, Deserialize, Clone, Debug, PartialEq, Eq,
    bincode::Encode, bincode::Decode,
)]
pub struct SharesPayload {
    /// Share identifiers (e.g. package URLs); the encoding carries the
    /// count ahead of the list.
    pub names: Vec<String>,
}

impl DepositPayload {
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CategoryError> {
        decode(bytes)
    }
}

impl ClaimPayload {
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CategoryError> {
        decode(bytes)
    }
}

impl SharesPayload {
    pub fn encode(&self) -> Vec<u8> {
        encode(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, CategoryError> {
        decode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_claim() -> ClaimPayload {
        ClaimPayload {
            purl: "pkg:git@github.com/acme/project.git".into(),
            username: "acme".into(),
            auth_provider: "github.com".into(),
            withdrawer: Address::ZERO,
        }
    }

    #[test]
    fn deposit_payload_round_trip() {
        let payload = DepositPayload {
            counter: 1,
            amount: 50_000_000_000_000_000_000, // 50 tokens
            resource_token: Address([0x11; 32]),
            resource_name: "customer".into(),
        };
        let bytes = payload.encode();
        assert_eq!(DepositPayload::decode(&bytes).unwrap(), payload);
        // Canonical bytes re-encode identically.
        assert_eq!(DepositPayload::decode(&bytes).unwrap().encode(), bytes);
    }

    #[test]
    fn claim_payload_round_trip() {
        let payload = sample_claim();
        let bytes = payload.encode();
        assert_eq!(ClaimPayload::decode(&bytes).unwrap(), payload);
        assert_eq!(ClaimPayload::decode(&bytes).unwrap().encode(), bytes);
    }

    #[test]
    fn shares_payload_round_trip() {
        let payload = SharesPayload {
            names: vec![
                "pkg:npm/left-pad@latest".into(),
                "pkg:npm/is-even@latest".into(),
            ],
        };
        let bytes = payload.encode();
        assert_eq!(SharesPayload::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = ClaimPayload::decode(&[0xFF; 3]).unwrap_err();
        assert!(matches!(err, CategoryError::MalformedPayload(_)));
    }

    #[test]
    fn decode_rejects_trailing_bytes() {
        let mut bytes = sample_claim().encode();
        bytes.push(0x00);
        let err = ClaimPayload::decode(&bytes).unwrap_err();
        assert!(matches!(err, CategoryError::MalformedPayload(_)));
    }

    #[test]
    fn decode_rejects_wrong_schema() {
        // A shares payload does not parse as a deposit payload.
        let bytes = SharesPayload { names: vec!["a".into()] }.encode();
        assert!(DepositPayload::decode(&bytes).is_err());
    }

    #[test]
    fn empty_shares_list_round_trips() {
        let payload = SharesPayload { names: vec![] };
        assert_eq!(
            SharesPayload::decode(&payload.encode()).unwrap().names.len(),
            0
        );
    }
}
