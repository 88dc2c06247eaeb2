use alloy::primitives::{address, aliases::U160, uint, Address, U256};

/// WETH address on mainnet, the base asset in the bundled scenario
pub const WETH: Address = address!("0xC02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2");

/// Lowest sqrt price an ordered pool accepts, `getSqrtRatioAtTick(MIN_TICK)`
pub const MIN_SQRT_RATIO: U160 = uint!(4295128739_U160);

/// Highest sqrt price an ordered pool accepts, `getSqrtRatioAtTick(MAX_TICK)`
pub const MAX_SQRT_RATIO: U160 =
    uint!(1461446703485210103287273052203988822378723970342_U160);

/// Price limit for a `zeroForOne` swap that never binds
pub const ZERO_FOR_ONE_PRICE_LIMIT: U160 = uint!(4295128740_U160);

/// Price limit for a `oneForZero` swap that never binds
pub const ONE_FOR_ZERO_PRICE_LIMIT: U160 =
    uint!(1461446703485210103287273052203988822378723970341_U160);

/// Vault swap deadline meaning "no deadline"
pub const NO_DEADLINE: U256 = U256::MAX;

/// Vault `SwapKind.GIVEN_IN`
pub const SWAP_KIND_GIVEN_IN: u8 = 0;

/// Fee denominator used by the simulated venues (basis points)
pub const BPS: u64 = 10_000;
