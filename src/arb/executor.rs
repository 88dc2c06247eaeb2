//! The executor contract: ABI entry point for the operator's arbitrage calls,
//! the direct single-leg calls, and the lender and pool callbacks.
//!
//! Everything here is decoding and dispatch. The flows live in `orchestrator`,
//! the borrow bookkeeping in `coordinator`, and the venue calls in `adapters`.

use alloy::primitives::{Address, Bytes};
use alloy::sol_types::{SolCall, SolInterface};
use log::warn;

use super::coordinator::{self, SwapCallbackPolicy};
use super::{adapters, deposit, orchestrator};
use super::swap::Direction;
use crate::abi::ILstArbitrage::{self, ILstArbitrageCalls};
use crate::chain::{CallContext, Contract, Host, Revert};

/// The arbitrage executor contract.
///
/// It trusts exactly one lender, fixed at deployment, and otherwise holds no
/// state outside the borrow records its coordinators keep in storage for the
/// length of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LstArbitrageur {
    /// Vault lender, also the host of vault pools
    pub vault: Address,
    /// Caller verification for `uniswapV3SwapCallback`
    pub swap_callback_policy: SwapCallbackPolicy,
}

impl LstArbitrageur {
    /// Executor borrowing from `vault` with the default callback policy.
    #[must_use]
    pub fn new(vault: Address) -> Self {
        Self {
            vault,
            swap_callback_policy: SwapCallbackPolicy::default(),
        }
    }

    /// Overrides the swap callback policy.
    #[must_use]
    pub const fn with_swap_callback_policy(mut self, policy: SwapCallbackPolicy) -> Self {
        self.swap_callback_policy = policy;
        self
    }

    /// Dispatches one decoded call.
    fn dispatch(&self, host: &mut Host, ctx: CallContext, call: ILstArbitrageCalls) -> Result<Vec<u8>, Revert> {
        let executor = ctx.address;
        let output = match call {
            ILstArbitrageCalls::runVaultArbitrage(ILstArbitrage::runVaultArbitrageCall {
                lst,
                baseAsset: base_asset,
                amountIn: amount_in,
                sellPayload: sell_payload,
            }) => {
                let profit = orchestrator::run_vault_arbitrage(
                    host,
                    executor,
                    self.vault,
                    lst,
                    base_asset,
                    amount_in,
                    &sell_payload,
                )?;
                ILstArbitrage::runVaultArbitrageCall::abi_encode_returns(&(profit,))
            }
            ILstArbitrageCalls::runFlashSwapArbitrage(ILstArbitrage::runFlashSwapArbitrageCall {
                pool,
                zeroForOne: zero_for_one,
                amountIn: amount_in,
            }) => {
                let profit = orchestrator::run_flash_swap_arbitrage(
                    host,
                    executor,
                    pool,
                    Direction::from_zero_for_one(zero_for_one),
                    amount_in,
                )?;
                ILstArbitrage::runFlashSwapArbitrageCall::abi_encode_returns(&(profit,))
            }
            ILstArbitrageCalls::depositIntoLst(ILstArbitrage::depositIntoLstCall {
                lst,
                baseAsset: base_asset,
                amount,
            }) => {
                let shares = deposit::deposit_into_lst(host, executor, lst, base_asset, amount)?;
                ILstArbitrage::depositIntoLstCall::abi_encode_returns(&(shares,))
            }
            ILstArbitrageCalls::sellOrderedPool(ILstArbitrage::sellOrderedPoolCall {
                pool,
                zeroForOne: zero_for_one,
                amountIn: amount_in,
            }) => {
                adapters::sell_ordered_pool(
                    host,
                    executor,
                    pool,
                    Direction::from_zero_for_one(zero_for_one),
                    amount_in,
                )?;
                ILstArbitrage::sellOrderedPoolCall::abi_encode_returns(&())
            }
            ILstArbitrageCalls::sellVaultPool(ILstArbitrage::sellVaultPoolCall {
                poolId: pool_id,
                tokenIn: token_in,
                tokenOut: token_out,
                amountIn: amount_in,
            }) => {
                adapters::sell_vault_pool(
                    host, executor, self.vault, pool_id, token_in, token_out, amount_in,
                )?;
                ILstArbitrage::sellVaultPoolCall::abi_encode_returns(&())
            }
            ILstArbitrageCalls::sellIndexedPool(ILstArbitrage::sellIndexedPoolCall {
                pool,
                indexIn: index_in,
                indexOut: index_out,
                amountIn: amount_in,
            }) => {
                adapters::sell_indexed_pool(host, executor, pool, index_in, index_out, amount_in)?;
                ILstArbitrage::sellIndexedPoolCall::abi_encode_returns(&())
            }
            ILstArbitrageCalls::receiveFlashLoan(ILstArbitrage::receiveFlashLoanCall {
                tokens,
                amounts,
                feeAmounts: _,
                userData: user_data,
            }) => {
                coordinator::on_flash_loan(host, ctx, self.vault, &tokens, &amounts, &user_data)?;
                ILstArbitrage::receiveFlashLoanCall::abi_encode_returns(&())
            }
            ILstArbitrageCalls::uniswapV3SwapCallback(ILstArbitrage::uniswapV3SwapCallbackCall {
                amount0Delta: amount0_delta,
                amount1Delta: amount1_delta,
                data,
            }) => {
                coordinator::on_swap_callback(
                    host,
                    ctx,
                    self.swap_callback_policy,
                    amount0_delta,
                    amount1_delta,
                    &data,
                )?;
                ILstArbitrage::uniswapV3SwapCallbackCall::abi_encode_returns(&())
            }
        };
        Ok(output)
    }
}

impl Contract for LstArbitrageur {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        let call = ILstArbitrageCalls::abi_decode(input, true)?;
        self.dispatch(host, ctx, call)
            .map(Bytes::from)
            .inspect_err(|err| warn!("executor::call: {} from {} failed: {err}", ctx.address, ctx.caller))
    }
}
