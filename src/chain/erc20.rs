use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::{SolCall, SolInterface};

use super::host::{CallContext, Contract, Host};
use super::revert::Revert;
use crate::abi::IERC20::{self, IERC20Calls};

/// Plain fungible token whose balances live in the host ledger.
#[derive(Debug, Clone)]
pub struct Erc20Token {
    /// Ticker, for logs only
    pub symbol: String,
    /// Display decimals, for logs only
    pub decimals: u8,
}

impl Erc20Token {
    /// Creates a token description.
    pub fn new(symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            symbol: symbol.into(),
            decimals,
        }
    }
}

impl Contract for Erc20Token {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        let call = IERC20Calls::abi_decode(input, true)?;
        dispatch(host, ctx, call)
    }
}

/// Whether `input` targets one of the ERC-20 functions. Share tokens use this to
/// route calls before trying their own interface.
#[must_use]
pub fn is_erc20_call(input: &[u8]) -> bool {
    input
        .get(..4)
        .and_then(|selector| <[u8; 4]>::try_from(selector).ok())
        .is_some_and(IERC20Calls::valid_selector)
}

/// Executes an ERC-20 call against the ledger entry of token `ctx.address`.
///
/// # Errors
///
/// [`Revert::InsufficientBalance`] or [`Revert::InsufficientAllowance`] when a
/// transfer cannot be covered.
pub fn dispatch(host: &mut Host, ctx: CallContext, call: IERC20Calls) -> Result<Bytes, Revert> {
    let token = ctx.address;
    let ledger = host.ledger_mut();
    let output = match call {
        IERC20Calls::totalSupply(_) => {
            IERC20::totalSupplyCall::abi_encode_returns(&(ledger.total_supply(token),))
        }
        IERC20Calls::balanceOf(IERC20::balanceOfCall { account }) => {
            IERC20::balanceOfCall::abi_encode_returns(&(ledger.balance_of(token, account),))
        }
        IERC20Calls::allowance(IERC20::allowanceCall { owner, spender }) => {
            IERC20::allowanceCall::abi_encode_returns(&(ledger.allowance(token, owner, spender),))
        }
        IERC20Calls::transfer(IERC20::transferCall { to, amount }) => {
            ledger.transfer(token, ctx.caller, to, amount)?;
            IERC20::transferCall::abi_encode_returns(&(true,))
        }
        IERC20Calls::approve(IERC20::approveCall { spender, amount }) => {
            ledger.approve(token, ctx.caller, spender, amount);
            IERC20::approveCall::abi_encode_returns(&(true,))
        }
        IERC20Calls::transferFrom(IERC20::transferFromCall { from, to, amount }) => {
            ledger.spend_allowance(token, from, ctx.caller, amount)?;
            ledger.transfer(token, from, to, amount)?;
            IERC20::transferFromCall::abi_encode_returns(&(true,))
        }
    };
    Ok(output.into())
}

/// Calls `token.transfer(to, amount)` as `from`.
///
/// # Errors
///
/// Whatever the token reverts with.
pub fn transfer(
    host: &mut Host,
    from: Address,
    token: Address,
    to: Address,
    amount: U256,
) -> Result<(), Revert> {
    host.call_sol(from, token, &IERC20::transferCall { to, amount })?;
    Ok(())
}

/// Calls `token.transferFrom(from, to, amount)` as `spender`.
///
/// # Errors
///
/// Whatever the token reverts with.
pub fn transfer_from(
    host: &mut Host,
    spender: Address,
    token: Address,
    from: Address,
    to: Address,
    amount: U256,
) -> Result<(), Revert> {
    host.call_sol(spender, token, &IERC20::transferFromCall { from, to, amount })?;
    Ok(())
}

/// Calls `token.approve(spender, amount)` as `owner`.
///
/// # Errors
///
/// Whatever the token reverts with.
pub fn approve(
    host: &mut Host,
    owner: Address,
    token: Address,
    spender: Address,
    amount: U256,
) -> Result<(), Revert> {
    host.call_sol(owner, token, &IERC20::approveCall { spender, amount })?;
    Ok(())
}

/// Calls `token.balanceOf(account)` as `caller`.
///
/// # Errors
///
/// Whatever the token reverts with.
pub fn balance_of(
    host: &mut Host,
    caller: Address,
    token: Address,
    account: Address,
) -> Result<U256, Revert> {
    Ok(host
        .call_sol(caller, token, &IERC20::balanceOfCall { account })?
        ._0)
}
