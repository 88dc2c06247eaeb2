use alloy::primitives::{aliases::U24, Address, Bytes, I256, U256};
use alloy::sol_types::{SolCall, SolInterface};
use log::debug;

use super::amm;
use crate::abi::IUniswapV3Pool::{self, IUniswapV3PoolCalls};
use crate::abi::IUniswapV3SwapCallback;
use crate::chain::{erc20, CallContext, Contract, Host, Revert};
use crate::utils::constants::{MAX_SQRT_RATIO, MIN_SQRT_RATIO};

/// Two-token pool with the Uniswap V3 swap interface and flash-swap semantics.
///
/// The output leg is paid before the input is collected: `swap` transfers the
/// output to the recipient, hands control to `msg.sender` through
/// `uniswapV3SwapCallback`, and only then checks it was paid. Reserves are the
/// pool's own token balances.
#[derive(Debug, Clone)]
pub struct OrderedPool {
    /// First token of the pair
    pub token0: Address,
    /// Second token of the pair
    pub token1: Address,
    /// Swap fee in basis points
    pub fee_bps: u32,
}

impl OrderedPool {
    /// Creates a pool over `token0`/`token1`.
    #[must_use]
    pub const fn new(token0: Address, token1: Address, fee_bps: u32) -> Self {
        Self {
            token0,
            token1,
            fee_bps,
        }
    }

    /// Output for an exact-input swap against the current reserves.
    #[must_use]
    pub fn quote(&self, host: &Host, pool: Address, zero_for_one: bool, amount_in: U256) -> U256 {
        let (token_in, token_out) = self.tokens(zero_for_one);
        amm::amount_out(
            host.balance_of(token_in, pool),
            host.balance_of(token_out, pool),
            amount_in,
            self.fee_bps,
        )
    }

    /// `(token_in, token_out)` for a direction.
    const fn tokens(&self, zero_for_one: bool) -> (Address, Address) {
        if zero_for_one {
            (self.token0, self.token1)
        } else {
            (self.token1, self.token0)
        }
    }

    /// Executes `swap`, returning the `(amount0, amount1)` deltas from the pool's
    /// point of view: positive was received, negative was paid out.
    fn swap(
        &self,
        host: &mut Host,
        ctx: CallContext,
        call: IUniswapV3Pool::swapCall,
    ) -> Result<(I256, I256), Revert> {
        let pool = ctx.address;
        let IUniswapV3Pool::swapCall {
            recipient,
            zeroForOne: zero_for_one,
            amountSpecified: amount_specified,
            sqrtPriceLimitX96: price_limit,
            data,
        } = call;

        if !amount_specified.is_positive() {
            return Err(Revert::venue(pool, "exact output unsupported"));
        }
        if price_limit <= MIN_SQRT_RATIO || price_limit >= MAX_SQRT_RATIO {
            return Err(Revert::venue(pool, "SPL"));
        }

        let amount_in = amount_specified.unsigned_abs();
        let amount_out = self.quote(host, pool, zero_for_one, amount_in);
        if amount_out.is_zero() {
            return Err(Revert::venue(pool, "IIA"));
        }
        let signed_in = I256::try_from(amount_in).map_err(|_| Revert::venue(pool, "overflow"))?;
        let signed_out =
            I256::try_from(amount_out).map_err(|_| Revert::venue(pool, "overflow"))?;

        let (token_in, token_out) = self.tokens(zero_for_one);
        let deltas = if zero_for_one {
            (signed_in, -signed_out)
        } else {
            (-signed_out, signed_in)
        };

        erc20::transfer(host, pool, token_out, recipient, amount_out)?;

        let balance_before = host.balance_of(token_in, pool);
        host.call_sol(
            pool,
            ctx.caller,
            &IUniswapV3SwapCallback::uniswapV3SwapCallbackCall {
                amount0Delta: deltas.0,
                amount1Delta: deltas.1,
                data,
            },
        )?;
        if host.balance_of(token_in, pool) < balance_before + amount_in {
            return Err(Revert::venue(pool, "IIA"));
        }

        debug!("pool::swap: {pool} {amount_in} {token_in} -> {amount_out} {token_out}");
        Ok(deltas)
    }
}

impl Contract for OrderedPool {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        let output = match IUniswapV3PoolCalls::abi_decode(input, true)? {
            IUniswapV3PoolCalls::token0(_) => {
                IUniswapV3Pool::token0Call::abi_encode_returns(&(self.token0,))
            }
            IUniswapV3PoolCalls::token1(_) => {
                IUniswapV3Pool::token1Call::abi_encode_returns(&(self.token1,))
            }
            IUniswapV3PoolCalls::fee(_) => {
                IUniswapV3Pool::feeCall::abi_encode_returns(&(U24::from(self.fee_bps),))
            }
            IUniswapV3PoolCalls::swap(call) => {
                let deltas = self.swap(host, ctx, call)?;
                IUniswapV3Pool::swapCall::abi_encode_returns(&deltas)
            }
        };
        Ok(output.into())
    }
}
