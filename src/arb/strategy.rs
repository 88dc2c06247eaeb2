//! Sell strategies and their wire format.
//!
//! A sell payload is `abi.encode(discriminator, params...)`: a `uint256` naming
//! the venue family followed by that venue's parameters. The vault flash loan
//! carries `abi.encode(lst) ++ sellPayload` as its user data.

use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::SolValue;
use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::swap::Direction;
use crate::chain::Revert;

/// Size of one ABI word
const WORD: usize = 32;

/// Venue family of a sell strategy, as carried by the payload discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum StrategyKind {
    /// Ordered pool with a swap callback, discriminator 0
    OrderedPool,
    /// Vault pool addressed by id, discriminator 1
    VaultPool,
    /// Pool addressing coins by index, discriminator 2
    IndexedPool,
}

impl StrategyKind {
    /// Wire value of this kind.
    #[must_use]
    pub const fn discriminator(self) -> u8 {
        match self {
            Self::OrderedPool => 0,
            Self::VaultPool => 1,
            Self::IndexedPool => 2,
        }
    }
}

impl TryFrom<U256> for StrategyKind {
    type Error = Revert;

    fn try_from(discriminator: U256) -> Result<Self, Self::Error> {
        match u8::try_from(discriminator) {
            Ok(0) => Ok(Self::OrderedPool),
            Ok(1) => Ok(Self::VaultPool),
            Ok(2) => Ok(Self::IndexedPool),
            _ => Err(Revert::UnsupportedStrategy(discriminator)),
        }
    }
}

/// Where and how to sell the LST received from the deposit step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SellStrategy {
    /// Sell through an ordered pool in the given direction
    OrderedPool {
        /// Pool address
        pool: Address,
        /// Which of the pool's tokens is sold
        direction: Direction,
    },
    /// Sell through a pool held by the vault
    VaultPool {
        /// Vault pool id
        pool_id: B256,
        /// Token sold
        token_in: Address,
        /// Token bought
        token_out: Address,
    },
    /// Sell through a pool that addresses its coins by index
    IndexedPool {
        /// Pool address
        pool: Address,
        /// Index of the coin sold
        index_in: U256,
        /// Index of the coin bought
        index_out: U256,
    },
}

impl SellStrategy {
    /// Venue family of this strategy.
    #[must_use]
    pub const fn kind(&self) -> StrategyKind {
        match self {
            Self::OrderedPool { .. } => StrategyKind::OrderedPool,
            Self::VaultPool { .. } => StrategyKind::VaultPool,
            Self::IndexedPool { .. } => StrategyKind::IndexedPool,
        }
    }

    /// Encodes the sell payload: discriminator word followed by the venue fields.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let discriminator = U256::from(self.kind().discriminator());
        match *self {
            Self::OrderedPool { pool, direction } => {
                (discriminator, pool, direction.zero_for_one()).abi_encode_params()
            }
            Self::VaultPool {
                pool_id,
                token_in,
                token_out,
            } => (discriminator, pool_id, token_in, token_out).abi_encode_params(),
            Self::IndexedPool {
                pool,
                index_in,
                index_out,
            } => (discriminator, pool, index_in, index_out).abi_encode_params(),
        }
        .into()
    }

    /// Decodes a sell payload. The discriminator is checked before any venue
    /// field is looked at.
    ///
    /// # Errors
    ///
    /// [`Revert::UnsupportedStrategy`] for an unknown discriminator,
    /// [`Revert::Decode`] for a truncated or malformed payload.
    pub fn decode(data: &[u8]) -> Result<Self, Revert> {
        let word = data
            .get(..WORD)
            .ok_or_else(|| Revert::Decode(format!("sell payload of {} bytes", data.len())))?;
        let kind = StrategyKind::try_from(U256::from_be_slice(word))?;

        let strategy = match kind {
            StrategyKind::OrderedPool => {
                let (_, pool, zero_for_one) = <(U256, Address, bool)>::abi_decode_params(data, true)?;
                Self::OrderedPool {
                    pool,
                    direction: Direction::from_zero_for_one(zero_for_one),
                }
            }
            StrategyKind::VaultPool => {
                let (_, pool_id, token_in, token_out) =
                    <(U256, B256, Address, Address)>::abi_decode_params(data, true)?;
                Self::VaultPool {
                    pool_id,
                    token_in,
                    token_out,
                }
            }
            StrategyKind::IndexedPool => {
                let (_, pool, index_in, index_out) =
                    <(U256, Address, U256, U256)>::abi_decode_params(data, true)?;
                Self::IndexedPool {
                    pool,
                    index_in,
                    index_out,
                }
            }
        };
        Ok(strategy)
    }
}

/// User data of the vault flash loan: the LST to mint and how to sell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArbitragePayload {
    /// ERC-4626 LST the borrowed base asset is deposited into
    pub lst: Address,
    /// Venue the minted shares are sold on
    pub strategy: SellStrategy,
}

impl ArbitragePayload {
    /// `abi.encode(lst) ++ sellPayload`.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        Self::encode_raw(self.lst, &self.strategy.encode())
    }

    /// Prefixes an already encoded sell payload with the LST word.
    #[must_use]
    pub fn encode_raw(lst: Address, sell_payload: &[u8]) -> Bytes {
        let mut data = lst.abi_encode();
        data.extend_from_slice(sell_payload);
        data.into()
    }

    /// Reads `(lst, discriminator)` and then the venue fields.
    ///
    /// # Errors
    ///
    /// Same as [`SellStrategy::decode`].
    pub fn decode(data: &[u8]) -> Result<Self, Revert> {
        if data.len() < WORD {
            return Err(Revert::Decode(format!("loan payload of {} bytes", data.len())));
        }
        let (head, sell_payload) = data.split_at(WORD);
        let lst = Address::abi_decode(head, true)?;
        Ok(Self {
            lst,
            strategy: SellStrategy::decode(sell_payload)?,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use alloy::primitives::b256;

    use super::*;

    fn strategies() -> [SellStrategy; 3] {
        [
            SellStrategy::OrderedPool {
                pool: Address::repeat_byte(0x10),
                direction: Direction::OneForZero,
            },
            SellStrategy::VaultPool {
                pool_id: b256!("0x32296969ef14eb0c6d29669c550d4a0449130230000200000000000000000080"),
                token_in: Address::repeat_byte(0x02),
                token_out: Address::repeat_byte(0x01),
            },
            SellStrategy::IndexedPool {
                pool: Address::repeat_byte(0x50),
                index_in: U256::from(1),
                index_out: U256::ZERO,
            },
        ]
    }

    #[test]
    fn test_discriminator_leads_payload() {
        for (strategy, discriminator) in strategies().iter().zip(0_u8..) {
            let encoded = strategy.encode();
            assert_eq!(encoded[31], discriminator);
            assert!(encoded[..31].iter().all(|byte| *byte == 0));
            assert_eq!(SellStrategy::decode(&encoded).unwrap(), *strategy);
        }
    }

    #[test]
    fn test_ordered_pool_layout() {
        let encoded = strategies()[0].encode();
        assert_eq!(encoded.len(), 3 * WORD);
        assert_eq!(&encoded[44..64], Address::repeat_byte(0x10).as_slice());
        // zeroForOne = false
        assert_eq!(encoded[95], 0);
    }

    #[test]
    fn test_unsupported_discriminator() {
        let mut encoded = strategies()[2].encode().to_vec();
        encoded[31] = 3;
        assert_eq!(
            SellStrategy::decode(&encoded).unwrap_err(),
            Revert::UnsupportedStrategy(U256::from(3))
        );

        // only the discriminator is needed to reject
        let mut lone = [0_u8; WORD];
        lone[0] = 0xff;
        assert!(matches!(
            SellStrategy::decode(&lone).unwrap_err(),
            Revert::UnsupportedStrategy(_)
        ));
    }

    #[test]
    fn test_truncated_payload() {
        let encoded = strategies()[1].encode();
        assert!(matches!(
            SellStrategy::decode(&encoded[..70]).unwrap_err(),
            Revert::Decode(_)
        ));
        assert!(matches!(
            SellStrategy::decode(&[]).unwrap_err(),
            Revert::Decode(_)
        ));
    }

    #[test]
    fn test_arbitrage_payload_prefix() {
        let lst = Address::repeat_byte(0x02);
        let payload = ArbitragePayload {
            lst,
            strategy: strategies()[0],
        };
        let encoded = payload.encode();
        assert_eq!(encoded.len(), 4 * WORD);
        assert_eq!(&encoded[WORD..], strategies()[0].encode().as_ref());
        assert_eq!(ArbitragePayload::decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::json!({
            "kind": "indexed_pool",
            "pool": "0x5050505050505050505050505050505050505050",
            "index_in": "1",
            "index_out": "0"
        });
        let strategy: SellStrategy = serde_json::from_value(json).unwrap();
        assert_eq!(strategy, strategies()[2]);
    }
}
