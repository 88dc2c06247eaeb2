//! Borrow coordinators.
//!
//! Both ways of borrowing hand control back to the executor through a callback
//! in the middle of the lender's own call. The coordinators keep what the
//! callback needs to know (who it expects to hear from, what the balance was
//! before the loan, whether repayment happened) in the executor's storage, so it
//! is journaled and unwinds with the rest of the transaction.

use std::fmt::{self, Display};

use alloy::primitives::{keccak256, Address, Bytes, B256, I256, U256};
use log::{debug, warn};

use super::deposit::deposit_into_lst;
use super::orchestrator::require_profit;
use super::router::route;
use super::strategy::ArbitragePayload;
use super::swap::{RepayPlan, SwapCallbackData};
use crate::abi::{IBalancerVault, IERC4626, IUniswapV3Pool};
use crate::chain::{erc20, CallContext, Host, Revert};

/// Progress of one borrow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowState {
    /// Nothing outstanding
    Idle,
    /// The loan was requested and its callback has not arrived yet
    Borrowing,
    /// The callback is running
    InCallback,
    /// The callback paid the counterparty back
    Repaid,
}

impl BorrowState {
    /// Storage encoding.
    const fn to_word(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Borrowing => 1,
            Self::InCallback => 2,
            Self::Repaid => 3,
        }
    }

    /// Storage decoding. Unknown words read as `Idle`.
    const fn from_word(word: u8) -> Self {
        match word {
            1 => Self::Borrowing,
            2 => Self::InCallback,
            3 => Self::Repaid,
            _ => Self::Idle,
        }
    }
}

/// Which coordinator a record belongs to. The flash swap can run inside the
/// vault loan callback, so each keeps its own record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinator {
    /// Vault flash loan
    VaultLoan,
    /// Ordered-pool flash swap
    FlashSwap,
}

impl Display for Coordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::VaultLoan => write!(f, "vault-loan"),
            Self::FlashSwap => write!(f, "flash-swap"),
        }
    }
}

/// A coordinator's record in executor storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Borrow {
    /// Where the borrow is
    pub state: BorrowState,
    /// The lender or pool expected to call back
    pub counterparty: Address,
    /// Executor's base balance when the loan was requested. Zero for flash
    /// swaps, which are measured by their caller
    pub pre_loan_balance: U256,
    /// Profit over `pre_loan_balance`, set on repayment
    pub profit: U256,
}

impl Borrow {
    /// An empty record.
    pub const IDLE: Self = Self {
        state: BorrowState::Idle,
        counterparty: Address::ZERO,
        pre_loan_balance: U256::ZERO,
        profit: U256::ZERO,
    };

    /// Storage slot of `field` for `coordinator`.
    fn slot(coordinator: Coordinator, field: &str) -> B256 {
        keccak256(format!("lst-arb.{coordinator}.{field}"))
    }

    /// Reads the record of `coordinator` from `executor` storage.
    #[must_use]
    pub fn load(host: &Host, executor: Address, coordinator: Coordinator) -> Self {
        let ledger = host.ledger();
        let state = ledger.sload(executor, Self::slot(coordinator, "state"));
        let counterparty = ledger.sload(executor, Self::slot(coordinator, "counterparty"));
        let pre_loan_balance = ledger.sload(executor, Self::slot(coordinator, "pre-loan-balance"));
        let profit = ledger.sload(executor, Self::slot(coordinator, "profit"));
        Self {
            state: BorrowState::from_word(state[31]),
            counterparty: Address::from_word(counterparty),
            pre_loan_balance: U256::from_be_bytes(pre_loan_balance.0),
            profit: U256::from_be_bytes(profit.0),
        }
    }

    /// Writes the record of `coordinator` to `executor` storage.
    fn store(self, host: &mut Host, executor: Address, coordinator: Coordinator) {
        let ledger = host.ledger_mut();
        ledger.sstore(
            executor,
            Self::slot(coordinator, "state"),
            B256::with_last_byte(self.state.to_word()),
        );
        ledger.sstore(
            executor,
            Self::slot(coordinator, "counterparty"),
            self.counterparty.into_word(),
        );
        ledger.sstore(
            executor,
            Self::slot(coordinator, "pre-loan-balance"),
            B256::from(self.pre_loan_balance.to_be_bytes()),
        );
        ledger.sstore(
            executor,
            Self::slot(coordinator, "profit"),
            B256::from(self.profit.to_be_bytes()),
        );
    }

    /// Moves `coordinator` to `state`, keeping the rest of the record.
    fn advance(host: &mut Host, executor: Address, coordinator: Coordinator, state: BorrowState) {
        let mut borrow = Self::load(host, executor, coordinator);
        borrow.state = state;
        borrow.store(host, executor, coordinator);
    }

    /// Marks `coordinator` repaid with `profit`.
    fn repaid(host: &mut Host, executor: Address, coordinator: Coordinator, profit: U256) {
        let mut borrow = Self::load(host, executor, coordinator);
        borrow.state = BorrowState::Repaid;
        borrow.profit = profit;
        borrow.store(host, executor, coordinator);
    }

    /// Checks the borrow was repaid, resets the record and returns its profit.
    fn settle(host: &mut Host, executor: Address, coordinator: Coordinator) -> Result<U256, Revert> {
        let borrow = Self::load(host, executor, coordinator);
        if borrow.state != BorrowState::Repaid {
            warn!("coordinator::settle: {coordinator} ended {:?}", borrow.state);
            return Err(Revert::UnexpectedCallback {
                caller: borrow.counterparty,
            });
        }
        Self::IDLE.store(host, executor, coordinator);
        Ok(borrow.profit)
    }
}

/// Whether the swap callback checks who is calling it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SwapCallbackPolicy {
    /// The caller must be the pool the executor is currently swapping against,
    /// and the pool named in the callback data
    #[default]
    RequirePendingPool,
    /// Anyone may trigger the callback. Only safe in simulation
    Unchecked,
}

/// Borrows `amount` of `base` from `lender`, runs the round trip inside the
/// callback and returns the profit.
///
/// # Errors
///
/// Whatever the lender or the callback revert with.
pub fn flash_loan(
    host: &mut Host,
    executor: Address,
    lender: Address,
    base: Address,
    amount: U256,
    payload: &ArbitragePayload,
) -> Result<U256, Revert> {
    let pre_loan_balance = erc20::balance_of(host, executor, base, executor)?;
    Borrow {
        state: BorrowState::Borrowing,
        counterparty: lender,
        pre_loan_balance,
        profit: U256::ZERO,
    }
    .store(host, executor, Coordinator::VaultLoan);

    debug!("coordinator::flash_loan: borrowing {amount} {base} from {lender}");
    host.call_sol(
        executor,
        lender,
        &IBalancerVault::flashLoanCall {
            recipient: executor,
            tokens: vec![base],
            amounts: vec![amount],
            userData: payload.encode(),
        },
    )?;

    Borrow::settle(host, executor, Coordinator::VaultLoan)
}

/// `receiveFlashLoan`: deposit, sell, check profit, repay the principal.
///
/// Reported fees are ignored; a lender charging one finds its balance short and
/// reverts.
///
/// # Errors
///
/// - [`Revert::UnauthorizedCaller`] if `msg.sender` is not `lender`
/// - [`Revert::UnexpectedCallback`] if no loan is outstanding
/// - [`Revert::Unprofitable`] if the round trip cannot cover the principal
/// - any revert from the deposit, the sale or the repayment
pub fn on_flash_loan(
    host: &mut Host,
    ctx: CallContext,
    lender: Address,
    tokens: &[Address],
    amounts: &[U256],
    user_data: &Bytes,
) -> Result<(), Revert> {
    let executor = ctx.address;
    if ctx.caller != lender {
        return Err(Revert::UnauthorizedCaller {
            caller: ctx.caller,
            expected: lender,
        });
    }
    let borrow = Borrow::load(host, executor, Coordinator::VaultLoan);
    if borrow.state != BorrowState::Borrowing || borrow.counterparty != ctx.caller {
        return Err(Revert::UnexpectedCallback { caller: ctx.caller });
    }
    let pre_loan_balance = borrow.pre_loan_balance;
    Borrow::advance(host, executor, Coordinator::VaultLoan, BorrowState::InCallback);

    let (base, principal) = match (tokens, amounts) {
        ([base], [principal]) => (*base, *principal),
        _ => {
            return Err(Revert::Decode(format!(
                "expected one loan, got {} tokens and {} amounts",
                tokens.len(),
                amounts.len()
            )))
        }
    };
    let ArbitragePayload { lst, strategy } = ArbitragePayload::decode(user_data)?;

    deposit_into_lst(host, executor, lst, base, principal)?;
    let lst_balance = erc20::balance_of(host, executor, lst, executor)?;
    route(host, executor, lender, &strategy, lst_balance)?;

    let balance = erc20::balance_of(host, executor, base, executor)?;
    let profit = require_profit(base, balance, principal + pre_loan_balance)?;
    debug!("coordinator::on_flash_loan: profit {profit} {base}, repaying {principal}");

    erc20::transfer(host, executor, base, lender, principal)?;
    Borrow::repaid(host, executor, Coordinator::VaultLoan, profit);
    Ok(())
}

/// Calls `pool.swap` with the flash-swap record open for the duration.
///
/// # Errors
///
/// Whatever the pool or the callback revert with, or
/// [`Revert::UnexpectedCallback`] if the pool returned without calling back.
pub fn flash_swap(
    host: &mut Host,
    executor: Address,
    pool: Address,
    call: &IUniswapV3Pool::swapCall,
) -> Result<(I256, I256), Revert> {
    Borrow {
        state: BorrowState::Borrowing,
        counterparty: pool,
        ..Borrow::IDLE
    }
    .store(host, executor, Coordinator::FlashSwap);

    let deltas = host.call_sol(executor, pool, call)?;
    Borrow::settle(host, executor, Coordinator::FlashSwap)?;
    Ok((deltas._0, deltas._1))
}

/// `uniswapV3SwapCallback`: settle what the pool is owed, redeeming first when
/// the callback data asks for it.
///
/// # Errors
///
/// - [`Revert::UnexpectedCallback`] or [`Revert::UnauthorizedCaller`] when the
///   policy requires a pending pool and the caller is not it
/// - [`Revert::Decode`] for callback data that is neither 64 nor 96 bytes
/// - any revert from the redemption or the repayment
pub fn on_swap_callback(
    host: &mut Host,
    ctx: CallContext,
    policy: SwapCallbackPolicy,
    amount0_delta: I256,
    amount1_delta: I256,
    data: &[u8],
) -> Result<(), Revert> {
    let executor = ctx.address;
    let borrow = Borrow::load(host, executor, Coordinator::FlashSwap);
    let pending = borrow.state == BorrowState::Borrowing;

    if policy == SwapCallbackPolicy::RequirePendingPool {
        if !pending {
            return Err(Revert::UnexpectedCallback { caller: ctx.caller });
        }
        if ctx.caller != borrow.counterparty {
            return Err(Revert::UnauthorizedCaller {
                caller: ctx.caller,
                expected: borrow.counterparty,
            });
        }
    }
    let callback = SwapCallbackData::decode(data)?;
    if policy == SwapCallbackPolicy::RequirePendingPool && callback.pool != ctx.caller {
        return Err(Revert::UnauthorizedCaller {
            caller: ctx.caller,
            expected: callback.pool,
        });
    }
    if pending {
        Borrow::advance(host, executor, Coordinator::FlashSwap, BorrowState::InCallback);
    }

    let owed = if amount0_delta.is_positive() {
        amount0_delta.unsigned_abs()
    } else if amount1_delta.is_positive() {
        amount1_delta.unsigned_abs()
    } else {
        return Err(Revert::venue(ctx.caller, "nothing owed"));
    };

    if let RepayPlan::RedeemThenRepay { lst } = callback.plan {
        let shares = erc20::balance_of(host, executor, lst, executor)?;
        let assets = host
            .call_sol(
                executor,
                lst,
                &IERC4626::redeemCall {
                    shares,
                    receiver: executor,
                    owner: executor,
                },
            )?
            ._0;
        debug!("coordinator::on_swap_callback: redeemed {shares} {lst} for {assets}");
    }

    debug!(
        "coordinator::on_swap_callback: {:?} repaying {owed} {} to {}",
        callback.plan, callback.token_in, ctx.caller
    );
    erc20::transfer(host, executor, callback.token_in, ctx.caller, owed)?;

    if pending {
        Borrow::repaid(host, executor, Coordinator::FlashSwap, U256::ZERO);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::arb::strategy::SellStrategy;
    use crate::arb::swap::Direction;
    use crate::arb::test_helpers::{fixture, Fixture};

    #[test]
    fn test_record_round_trips_through_storage() {
        let Fixture { mut host, executor, vault, .. } = fixture();
        assert_eq!(Borrow::load(&host, executor, Coordinator::VaultLoan), Borrow::IDLE);

        let borrow = Borrow {
            state: BorrowState::Borrowing,
            counterparty: vault,
            pre_loan_balance: U256::from(42),
            profit: U256::ZERO,
        };
        borrow.store(&mut host, executor, Coordinator::VaultLoan);
        assert_eq!(Borrow::load(&host, executor, Coordinator::VaultLoan), borrow);
        // the other coordinator is untouched
        assert_eq!(Borrow::load(&host, executor, Coordinator::FlashSwap), Borrow::IDLE);
    }

    #[test]
    fn test_settle_requires_repayment() {
        let Fixture { mut host, executor, vault, .. } = fixture();
        Borrow {
            state: BorrowState::Borrowing,
            counterparty: vault,
            ..Borrow::IDLE
        }
        .store(&mut host, executor, Coordinator::VaultLoan);
        assert_eq!(
            Borrow::settle(&mut host, executor, Coordinator::VaultLoan).unwrap_err(),
            Revert::UnexpectedCallback { caller: vault }
        );
    }

    #[test]
    fn test_repayment_keeps_the_pre_loan_balance() {
        let Fixture { mut host, executor, vault, .. } = fixture();
        Borrow {
            state: BorrowState::Borrowing,
            counterparty: vault,
            pre_loan_balance: U256::from(7),
            profit: U256::ZERO,
        }
        .store(&mut host, executor, Coordinator::VaultLoan);

        Borrow::advance(&mut host, executor, Coordinator::VaultLoan, BorrowState::InCallback);
        Borrow::repaid(&mut host, executor, Coordinator::VaultLoan, U256::from(3));
        assert_eq!(
            Borrow::load(&host, executor, Coordinator::VaultLoan),
            Borrow {
                state: BorrowState::Repaid,
                counterparty: vault,
                pre_loan_balance: U256::from(7),
                profit: U256::from(3),
            }
        );

        assert_eq!(
            Borrow::settle(&mut host, executor, Coordinator::VaultLoan).unwrap(),
            U256::from(3)
        );
        assert_eq!(Borrow::load(&host, executor, Coordinator::VaultLoan), Borrow::IDLE);
    }

    #[test]
    fn test_flash_loan_callback_rejects_strangers() {
        let Fixture {
            mut host,
            executor,
            weth,
            lst,
            vault,
            ordered_pool,
            ..
        } = fixture();
        let stranger = Address::repeat_byte(0x99);
        let payload = ArbitragePayload {
            lst,
            strategy: SellStrategy::OrderedPool {
                pool: ordered_pool,
                direction: Direction::ZeroForOne,
            },
        };
        let err = on_flash_loan(
            &mut host,
            CallContext {
                caller: stranger,
                address: executor,
            },
            vault,
            &[weth],
            &[U256::from(1)],
            &payload.encode(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            Revert::UnauthorizedCaller {
                caller: stranger,
                expected: vault,
            }
        );

        // the lender itself, with no loan outstanding
        let err = on_flash_loan(
            &mut host,
            CallContext {
                caller: vault,
                address: executor,
            },
            vault,
            &[weth],
            &[U256::from(1)],
            &payload.encode(),
        )
        .unwrap_err();
        assert_eq!(err, Revert::UnexpectedCallback { caller: vault });
    }

    #[test]
    fn test_swap_callback_policy() {
        let Fixture {
            mut host,
            executor,
            weth,
            ordered_pool,
            ..
        } = fixture();
        host.deal(weth, executor, U256::from(5));
        let data = SwapCallbackData {
            pool: ordered_pool,
            token_in: weth,
            plan: RepayPlan::DirectRepay,
        }
        .encode();
        let ctx = CallContext {
            caller: ordered_pool,
            address: executor,
        };

        let err = on_swap_callback(
            &mut host,
            ctx,
            SwapCallbackPolicy::RequirePendingPool,
            I256::ZERO,
            I256::try_from(5).unwrap(),
            &data,
        )
        .unwrap_err();
        assert_eq!(err, Revert::UnexpectedCallback { caller: ordered_pool });

        on_swap_callback(
            &mut host,
            ctx,
            SwapCallbackPolicy::Unchecked,
            I256::ZERO,
            I256::try_from(5).unwrap(),
            &data,
        )
        .unwrap();
        assert_eq!(host.balance_of(weth, executor), U256::ZERO);
    }

    #[test]
    fn test_swap_callback_checks_named_pool() {
        let Fixture {
            mut host,
            executor,
            weth,
            ordered_pool,
            ..
        } = fixture();
        Borrow {
            state: BorrowState::Borrowing,
            counterparty: ordered_pool,
            ..Borrow::IDLE
        }
        .store(&mut host, executor, Coordinator::FlashSwap);
        let other = Address::repeat_byte(0x98);
        let data = SwapCallbackData {
            pool: other,
            token_in: weth,
            plan: RepayPlan::DirectRepay,
        }
        .encode();
        let err = on_swap_callback(
            &mut host,
            CallContext {
                caller: ordered_pool,
                address: executor,
            },
            SwapCallbackPolicy::RequirePendingPool,
            I256::ZERO,
            I256::try_from(5).unwrap(),
            &data,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Revert::UnauthorizedCaller {
                caller: ordered_pool,
                expected: other,
            }
        );
    }
}
