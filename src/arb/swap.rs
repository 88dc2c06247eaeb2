//! Ordered-pool swap plumbing: the direction of a swap and the data the executor
//! hands to the pool so that its own swap callback knows how to settle.
use std::fmt::{self, Debug, Display};

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::SolValue;
use serde::{Deserialize, Serialize};

use crate::chain::Revert;

/// The direction of a swap in an ordered pool.
///
/// An ordered pool holds two tokens (token0 and token1), and a swap can go in
/// either direction: from token0 to token1 or from token1 to token0. On the wire
/// it is the `zeroForOne` flag.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Swap from token0 to token1 in the pool
    ZeroForOne,
    /// Swap from token1 to token0 in the pool
    OneForZero,
}

impl Direction {
    /// Builds a direction from the `zeroForOne` flag.
    #[must_use]
    pub const fn from_zero_for_one(zero_for_one: bool) -> Self {
        if zero_for_one {
            Self::ZeroForOne
        } else {
            Self::OneForZero
        }
    }

    /// The `zeroForOne` flag for this direction.
    #[must_use]
    pub const fn zero_for_one(self) -> bool {
        matches!(self, Self::ZeroForOne)
    }
}

impl Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

impl Debug for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroForOne => write!(f, "0>1"),
            Self::OneForZero => write!(f, "1>0"),
        }
    }
}

/// How the swap callback settles what the pool is owed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepayPlan {
    /// Pay the owed input straight from the executor's balance
    DirectRepay,
    /// Redeem the whole balance of the received LST shares first, then pay
    RedeemThenRepay {
        /// The ERC-4626 LST received from the pool
        lst: Address,
    },
}

/// The `data` argument of an ordered-pool `swap`, read back in the callback.
///
/// The repayment plan is carried by the payload length:
/// `abi.encode(pool, tokenIn)` (64 bytes) repays directly and
/// `abi.encode(pool, tokenIn, tokenOut)` (96 bytes) redeems `tokenOut` first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapCallbackData {
    /// The pool expected to call back
    pub pool: Address,
    /// The token the pool must be paid in
    pub token_in: Address,
    /// What to do before paying
    pub plan: RepayPlan,
}

impl SwapCallbackData {
    /// Length of a direct-repay payload
    const DIRECT_LEN: usize = 64;
    /// Length of a redeem-then-repay payload
    const REDEEM_LEN: usize = 96;

    /// ABI encoding expected by [`SwapCallbackData::decode`].
    #[must_use]
    pub fn encode(&self) -> Bytes {
        match self.plan {
            RepayPlan::DirectRepay => (self.pool, self.token_in).abi_encode_params(),
            RepayPlan::RedeemThenRepay { lst } => (self.pool, self.token_in, lst).abi_encode_params(),
        }
        .into()
    }

    /// Decodes callback data and selects the repayment plan from its length.
    ///
    /// # Errors
    ///
    /// [`Revert::Decode`] for any length other than 64 or 96 bytes, or for words
    /// that are not valid addresses.
    pub fn decode(data: &[u8]) -> Result<Self, Revert> {
        match data.len() {
            Self::DIRECT_LEN => {
                let (pool, token_in) = <(Address, Address)>::abi_decode_params(data, true)?;
                Ok(Self {
                    pool,
                    token_in,
                    plan: RepayPlan::DirectRepay,
                })
            }
            Self::REDEEM_LEN => {
                let (pool, token_in, lst) =
                    <(Address, Address, Address)>::abi_decode_params(data, true)?;
                Ok(Self {
                    pool,
                    token_in,
                    plan: RepayPlan::RedeemThenRepay { lst },
                })
            }
            len => Err(Revert::Decode(format!(
                "swap callback data of {len} bytes"
            ))),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_flag() {
        assert!(Direction::ZeroForOne.zero_for_one());
        assert_eq!(Direction::from_zero_for_one(false), Direction::OneForZero);
        assert_eq!(Direction::OneForZero.to_string(), "1>0");
    }

    #[test]
    fn test_plan_follows_length() {
        let pool = Address::repeat_byte(0x10);
        let weth = Address::repeat_byte(0x01);
        let lst = Address::repeat_byte(0x02);

        let direct = SwapCallbackData {
            pool,
            token_in: weth,
            plan: RepayPlan::DirectRepay,
        };
        assert_eq!(direct.encode().len(), 64);

        let redeem = SwapCallbackData {
            pool,
            token_in: weth,
            plan: RepayPlan::RedeemThenRepay { lst },
        };
        let encoded = redeem.encode();
        assert_eq!(encoded.len(), 96);
        assert_eq!(SwapCallbackData::decode(&encoded).unwrap(), redeem);
    }

    #[test]
    fn test_bad_length() {
        let err = SwapCallbackData::decode(&[0_u8; 65]).unwrap_err();
        assert_eq!(err, Revert::Decode("swap callback data of 65 bytes".into()));
        assert!(SwapCallbackData::decode(&[]).is_err());
    }
}
