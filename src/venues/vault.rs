//! Flash-loan vault that also hosts two-token pools.
//!
//! Loans are fee-free and paid out of the vault's whole token balance. After
//! the recipient's callback the vault must hold at least what it held before,
//! net of any pool credits the recipient moved by swapping here in the
//! meantime; otherwise the loan fails with `BAL#602`. Swaps are GIVEN_IN only
//! and honour the deadline against the block timestamp (`BAL#508`).

use std::collections::HashMap;

use alloy::primitives::{keccak256, Address, Bytes, B256, U256};
use alloy::sol_types::{SolCall, SolInterface, SolValue};
use log::debug;

use super::amm;
use crate::abi::IBalancerVault::{self, IBalancerVaultCalls};
use crate::abi::IFlashLoanRecipient;
use crate::chain::{erc20, CallContext, Contract, Host, Revert};
use crate::utils::constants::SWAP_KIND_GIVEN_IN;

/// Two-token pool registered inside a [`FlashVault`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VaultPool {
    /// First token
    pub token_a: Address,
    /// Second token
    pub token_b: Address,
    /// Swap fee in basis points
    pub fee_bps: u32,
}

/// Balancer-style vault: one contract holding every pool's tokens, offering
/// fee-free flash loans out of its total balances and single swaps addressed by
/// pool id.
///
/// Per-pool balances are kept in the vault's storage so that a flash loan and a
/// swap against the same token do not see each other's accounting.
#[derive(Debug, Clone, Default)]
pub struct FlashVault {
    /// Registered pools by id
    pools: HashMap<B256, VaultPool>,
}

impl FlashVault {
    /// Creates a vault without pools.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a pool under `pool_id`.
    #[must_use]
    pub fn with_pool(mut self, pool_id: B256, pool: VaultPool) -> Self {
        self.pools.insert(pool_id, pool);
        self
    }

    /// Pool registered under `pool_id`, if any.
    #[must_use]
    pub fn pool(&self, pool_id: &B256) -> Option<&VaultPool> {
        self.pools.get(pool_id)
    }

    /// Storage slot holding the balance of `token` in `pool_id`.
    fn balance_slot(pool_id: B256, token: Address) -> B256 {
        keccak256((pool_id, token).abi_encode())
    }

    /// Balance of `token` credited to `pool_id`.
    #[must_use]
    pub fn pool_balance(host: &Host, vault: Address, pool_id: B256, token: Address) -> U256 {
        let word = host.ledger().sload(vault, Self::balance_slot(pool_id, token));
        U256::from_be_bytes(word.0)
    }

    /// Writes the balance of `token` credited to `pool_id`.
    fn set_pool_balance(host: &mut Host, vault: Address, pool_id: B256, token: Address, amount: U256) {
        host.ledger_mut().sstore(
            vault,
            Self::balance_slot(pool_id, token),
            B256::from(amount.to_be_bytes()),
        );
    }

    /// Seeds a registered pool with liquidity: mints the tokens to the vault and
    /// credits them to the pool. Scenario setup only.
    ///
    /// # Errors
    ///
    /// [`Revert::Venue`] if `token` is not part of the pool.
    pub fn fund_pool(
        &self,
        host: &mut Host,
        vault: Address,
        pool_id: B256,
        token: Address,
        amount: U256,
    ) -> Result<(), Revert> {
        let pool = self
            .pools
            .get(&pool_id)
            .ok_or_else(|| Revert::venue(vault, "BAL#500"))?;
        if token != pool.token_a && token != pool.token_b {
            return Err(Revert::venue(vault, "BAL#521"));
        }
        let balance = Self::pool_balance(host, vault, pool_id, token);
        Self::set_pool_balance(host, vault, pool_id, token, balance + amount);
        host.deal(token, vault, amount);
        Ok(())
    }

    /// Output for a GIVEN_IN swap in `pool_id`.
    #[must_use]
    pub fn quote(
        &self,
        host: &Host,
        vault: Address,
        pool_id: B256,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> U256 {
        self.pools.get(&pool_id).map_or(U256::ZERO, |pool| {
            amm::amount_out(
                Self::pool_balance(host, vault, pool_id, token_in),
                Self::pool_balance(host, vault, pool_id, token_out),
                amount_in,
                pool.fee_bps,
            )
        })
    }

    /// `token` credited to pools, summed over every pool holding it.
    fn pooled(&self, host: &Host, vault: Address, token: Address) -> U256 {
        self.pools
            .iter()
            .filter(|(_, pool)| pool.token_a == token || pool.token_b == token)
            .fold(U256::ZERO, |sum, (pool_id, _)| {
                sum + Self::pool_balance(host, vault, *pool_id, token)
            })
    }

    /// Lends `amounts` of `tokens`, calls the recipient back, and checks every
    /// balance was restored.
    fn flash_loan(
        &self,
        host: &mut Host,
        ctx: CallContext,
        call: IBalancerVault::flashLoanCall,
    ) -> Result<(), Revert> {
        let vault = ctx.address;
        let IBalancerVault::flashLoanCall {
            recipient,
            tokens,
            amounts,
            userData: user_data,
        } = call;
        if tokens.len() != amounts.len() {
            return Err(Revert::venue(vault, "BAL#103"));
        }

        let mut pre_balances = Vec::with_capacity(tokens.len());
        for (token, amount) in tokens.iter().zip(&amounts) {
            if host.balance_of(*token, vault) < *amount {
                return Err(Revert::venue(vault, "BAL#528"));
            }
            pre_balances.push((host.balance_of(*token, vault), self.pooled(host, vault, *token)));
            erc20::transfer(host, vault, *token, recipient, *amount)?;
        }

        host.call_sol(
            vault,
            recipient,
            &IFlashLoanRecipient::receiveFlashLoanCall {
                tokens: tokens.clone(),
                amounts: amounts.clone(),
                feeAmounts: vec![U256::ZERO; tokens.len()],
                userData: user_data,
            },
        )?;

        // swaps during the loan move pool credits along with the tokens
        for (token, (pre_balance, pre_pooled)) in tokens.iter().zip(pre_balances) {
            let (balance, pooled) = (host.balance_of(*token, vault), self.pooled(host, vault, *token));
            if balance + pre_pooled < pre_balance + pooled {
                return Err(Revert::venue(vault, "BAL#602"));
            }
        }
        debug!("vault::flash_loan: {recipient} repaid {amounts:?} of {tokens:?}");
        Ok(())
    }

    /// Executes a GIVEN_IN single swap and returns the amount paid out.
    fn swap(
        &self,
        host: &mut Host,
        ctx: CallContext,
        call: IBalancerVault::swapCall,
    ) -> Result<U256, Revert> {
        let vault = ctx.address;
        let IBalancerVault::swapCall {
            singleSwap: single_swap,
            funds,
            limit,
            deadline,
        } = call;

        if U256::from(host.block().timestamp) > deadline {
            return Err(Revert::venue(vault, "BAL#508"));
        }
        if single_swap.kind != SWAP_KIND_GIVEN_IN {
            return Err(Revert::venue(vault, "GIVEN_OUT unsupported"));
        }
        if funds.sender != ctx.caller || funds.fromInternalBalance || funds.toInternalBalance {
            return Err(Revert::venue(vault, "BAL#401"));
        }
        let pool_id = single_swap.poolId;
        let pool = self
            .pools
            .get(&pool_id)
            .ok_or_else(|| Revert::venue(vault, "BAL#500"))?;
        let (token_in, token_out) = (single_swap.assetIn, single_swap.assetOut);
        let pair_ok = (token_in == pool.token_a && token_out == pool.token_b)
            || (token_in == pool.token_b && token_out == pool.token_a);
        if !pair_ok {
            return Err(Revert::venue(vault, "BAL#521"));
        }

        let amount_in = single_swap.amount;
        let amount_out = self.quote(host, vault, pool_id, token_in, token_out, amount_in);
        if amount_out.is_zero() {
            return Err(Revert::venue(vault, "BAL#510"));
        }
        if amount_out < limit {
            return Err(Revert::venue(vault, "BAL#507"));
        }

        erc20::transfer_from(host, vault, token_in, funds.sender, vault, amount_in)?;
        erc20::transfer(host, vault, token_out, funds.recipient, amount_out)?;

        let balance_in = Self::pool_balance(host, vault, pool_id, token_in);
        let balance_out = Self::pool_balance(host, vault, pool_id, token_out);
        Self::set_pool_balance(host, vault, pool_id, token_in, balance_in + amount_in);
        Self::set_pool_balance(host, vault, pool_id, token_out, balance_out - amount_out);

        debug!("vault::swap: {pool_id} {amount_in} {token_in} -> {amount_out} {token_out}");
        Ok(amount_out)
    }
}

impl Contract for FlashVault {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        let output = match IBalancerVaultCalls::abi_decode(input, true)? {
            IBalancerVaultCalls::flashLoan(call) => {
                self.flash_loan(host, ctx, call)?;
                IBalancerVault::flashLoanCall::abi_encode_returns(&())
            }
            IBalancerVaultCalls::swap(call) => {
                let amount_out = self.swap(host, ctx, call)?;
                IBalancerVault::swapCall::abi_encode_returns(&(amount_out,))
            }
        };
        Ok(output.into())
    }
}
