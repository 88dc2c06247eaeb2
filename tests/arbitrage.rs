#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, I256, U256};
use alloy::sol_types::SolCall;
use lst_arb::abi::{IERC20, IERC4626, ILstArbitrage, IUniswapV3Pool, IUniswapV3SwapCallback};
use lst_arb::arb::coordinator::{Borrow, Coordinator};
use lst_arb::arb::optimizer::{optimize_amount_in, SearchParams, Sender, Target};
use lst_arb::arb::orchestrator::{flash_swap_arbitrage_call, vault_arbitrage_call};
use lst_arb::arb::strategy::{ArbitragePayload, SellStrategy};
use lst_arb::arb::swap::{Direction, RepayPlan, SwapCallbackData};
use lst_arb::arb::test_helpers::{
    ether, fixture, fixture_from, scenario, Fixture, CHEAP_POOL, EXECUTOR, LST, WETH,
};
use lst_arb::bootstrap::types::FundingSpec;
use lst_arb::chain::{CallContext, Contract, FailureKind, Host, Revert};
use lst_arb::utils::constants::ZERO_FOR_ONE_PRICE_LIMIT;

fn tenth() -> U256 {
    ether(1) / U256::from(10)
}

/// Swaps on `pool` with `executor` as the recipient and hands the pool's
/// callback to `executor`, claiming the input is `token_in`.
#[derive(Debug)]
struct Relay {
    pool: Address,
    executor: Address,
    token_in: Address,
}

impl Contract for Relay {
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert> {
        if input.starts_with(&IUniswapV3SwapCallback::uniswapV3SwapCallbackCall::SELECTOR) {
            return host.call(ctx.address, self.executor, input);
        }
        host.call_sol(
            ctx.address,
            self.pool,
            &IUniswapV3Pool::swapCall {
                recipient: self.executor,
                zeroForOne: true,
                amountSpecified: I256::try_from(ether(1)).unwrap(),
                sqrtPriceLimitX96: ZERO_FOR_ONE_PRICE_LIMIT,
                data: SwapCallbackData {
                    pool: self.pool,
                    token_in: self.token_in,
                    plan: RepayPlan::DirectRepay,
                }
                .encode(),
            },
        )?;
        Ok(Bytes::new())
    }
}

#[test]
fn vault_arbitrage_is_profitable_on_every_route() {
    let Fixture {
        host,
        executor,
        operator,
        weth,
        lst,
        vault,
        routes,
        ..
    } = fixture();
    let vault_weth = host.balance_of(weth, vault);

    for (name, route) in &routes {
        let mut host = host.clone();
        let call = vault_arbitrage_call(route.lst, route.base_asset, tenth(), &route.strategy);
        let profit = host.transact_sol(operator, executor, &call).unwrap()._0;

        assert!(profit > U256::ZERO, "{name} made no profit");
        assert_eq!(host.balance_of(weth, executor), profit, "{name}");
        assert_eq!(host.balance_of(lst, executor), U256::ZERO, "{name}");
        assert_eq!(host.ledger().allowance(weth, executor, lst), U256::ZERO, "{name}");
        assert_eq!(
            Borrow::load(&host, executor, Coordinator::VaultLoan),
            Borrow::IDLE,
            "{name}"
        );
        // the lender got its principal back; only the vault pool route trades
        // against its balance
        if !matches!(route.strategy, SellStrategy::VaultPool { .. }) {
            assert_eq!(host.balance_of(weth, vault), vault_weth, "{name}");
        }
    }
}

#[test]
fn vault_arbitrage_counts_profit_on_top_of_existing_balance() {
    let mut scenario = scenario();
    scenario.funding.push(FundingSpec {
        token: WETH,
        holder: EXECUTOR,
        amount: ether(2),
    });
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        routes,
        ..
    } = fixture_from(&scenario);
    let route = routes["ordered"];

    let call = vault_arbitrage_call(route.lst, route.base_asset, tenth(), &route.strategy);
    let profit = host.transact_sol(operator, executor, &call).unwrap()._0;
    assert!(profit > U256::ZERO);
    assert_eq!(host.balance_of(weth, executor), ether(2) + profit);
}

#[test]
fn unprofitable_vault_arbitrage_leaves_no_trace() {
    let mut scenario = scenario();
    // LST now trades below its redemption value in the ordered pool
    scenario.ordered_pools[0].reserve1 = ether(1_050);
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        routes,
        ..
    } = fixture_from(&scenario);
    let route = routes["ordered"];
    let before = host.ledger().state().clone();

    let call = vault_arbitrage_call(route.lst, route.base_asset, tenth(), &route.strategy);
    let err = host.transact_sol(operator, executor, &call).unwrap_err();

    assert_eq!(err.kind(), FailureKind::Unprofitable);
    match err {
        Revert::Unprofitable { token, profit } => {
            assert_eq!(token, weth);
            assert!(profit.is_negative());
        }
        other => panic!("unexpected revert {other}"),
    }
    assert_eq!(host.ledger().state(), &before);
    assert_eq!(
        Borrow::load(&host, executor, Coordinator::VaultLoan),
        Borrow::IDLE
    );
}

#[test]
fn vault_arbitrage_rejects_an_lst_backed_by_another_asset() {
    let Fixture {
        mut host,
        executor,
        operator,
        lst,
        vault,
        routes,
        ..
    } = fixture();
    let route = routes["ordered"];
    let before = host.ledger().state().clone();

    // borrow the LST itself and try to mint LST with it
    let mut lending = host.clone();
    lending.deal(lst, vault, ether(10));
    let call = vault_arbitrage_call(lst, lst, tenth(), &route.strategy);
    let err = lending.transact_sol(operator, executor, &call).unwrap_err();
    assert_eq!(err.kind(), FailureKind::AssetMismatch);

    // and the direct leg on an untouched host
    let err = host
        .transact_sol(
            operator,
            executor,
            &ILstArbitrage::depositIntoLstCall {
                lst,
                baseAsset: lst,
                amount: U256::ZERO,
            },
        )
        .unwrap_err();
    assert_eq!(err.kind(), FailureKind::AssetMismatch);
    assert_eq!(host.ledger().state(), &before);
}

#[test]
fn unsupported_strategy_borrows_nothing() {
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        lst,
        ..
    } = fixture();
    let mut sell_payload = vec![0_u8; 128];
    sell_payload[31] = 0xff;

    let err = host
        .transact_sol(
            operator,
            executor,
            &ILstArbitrage::runVaultArbitrageCall {
                lst,
                baseAsset: weth,
                amountIn: tenth(),
                sellPayload: sell_payload.into(),
            },
        )
        .unwrap_err();
    assert_eq!(err, Revert::UnsupportedStrategy(U256::from(0xff)));
    // only the call into the executor itself
    assert_eq!(host.trace().len(), 1);
}

#[test]
fn flash_swap_arbitrage_is_profitable() {
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        lst,
        cheap_pool,
        ..
    } = fixture();
    let pool_weth = host.balance_of(weth, cheap_pool);

    let call = flash_swap_arbitrage_call(cheap_pool, Direction::ZeroForOne, ether(1));
    let profit = host.transact_sol(operator, executor, &call).unwrap()._0;

    assert!(profit > U256::ZERO);
    assert_eq!(host.balance_of(weth, executor), profit);
    assert_eq!(host.balance_of(lst, executor), U256::ZERO);
    assert_eq!(host.balance_of(weth, cheap_pool), pool_weth + ether(1));
    assert_eq!(
        Borrow::load(&host, executor, Coordinator::FlashSwap),
        Borrow::IDLE
    );
}

#[test]
fn flash_swap_arbitrage_one_for_zero_is_profitable() {
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        lst,
        cheap_inverted_pool,
        ..
    } = fixture();
    let pool_weth = host.balance_of(weth, cheap_inverted_pool);
    let pool_lst = host.balance_of(lst, cheap_inverted_pool);

    // WETH is token1 here, so buying LST runs one for zero
    let call = flash_swap_arbitrage_call(cheap_inverted_pool, Direction::OneForZero, ether(1));
    let profit = host.transact_sol(operator, executor, &call).unwrap()._0;

    assert!(profit > U256::ZERO);
    assert_eq!(host.balance_of(weth, executor), profit);
    assert_eq!(host.balance_of(lst, executor), U256::ZERO);
    assert_eq!(host.balance_of(weth, cheap_inverted_pool), pool_weth + ether(1));
    assert!(host.balance_of(lst, cheap_inverted_pool) < pool_lst);
    assert_eq!(
        Borrow::load(&host, executor, Coordinator::FlashSwap),
        Borrow::IDLE
    );
}

#[test]
fn unfunded_unprofitable_flash_swap_fails_at_repayment() {
    let mut scenario = scenario();
    scenario.ordered_pools[1].reserve0 = ether(1_200);
    let Fixture {
        mut host,
        executor,
        operator,
        cheap_pool,
        ..
    } = fixture_from(&scenario);
    let before = host.ledger().state().clone();

    let call = flash_swap_arbitrage_call(cheap_pool, Direction::ZeroForOne, ether(1));
    let err = host.transact_sol(operator, executor, &call).unwrap_err();

    assert!(matches!(err, Revert::InsufficientBalance { .. }));
    assert_eq!(err.kind(), FailureKind::VenueFailure);
    assert_eq!(host.ledger().state(), &before);
}

#[test]
fn funded_unprofitable_flash_swap_fails_the_profit_gate() {
    let mut scenario = scenario();
    scenario.ordered_pools[1].reserve0 = ether(1_200);
    scenario.funding.push(FundingSpec {
        token: WETH,
        holder: EXECUTOR,
        amount: ether(1),
    });
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        cheap_pool,
        ..
    } = fixture_from(&scenario);

    let call = flash_swap_arbitrage_call(cheap_pool, Direction::ZeroForOne, ether(1));
    let err = host.transact_sol(operator, executor, &call).unwrap_err();

    assert_eq!(err.kind(), FailureKind::Unprofitable);
    assert_eq!(host.balance_of(weth, executor), ether(1));
}

#[test]
fn swap_callback_from_stranger_is_rejected() {
    let Fixture {
        mut host,
        executor,
        weth,
        lst,
        cheap_pool,
        ..
    } = fixture();
    host.deal(weth, executor, ether(1));
    let stranger = Address::repeat_byte(0x99);
    let call = IUniswapV3SwapCallback::uniswapV3SwapCallbackCall {
        amount0Delta: I256::try_from(ether(1)).unwrap(),
        amount1Delta: I256::ZERO,
        data: SwapCallbackData {
            pool: cheap_pool,
            token_in: weth,
            plan: RepayPlan::DirectRepay,
        }
        .encode(),
    };

    // nobody is swapping
    let err = host.transact_sol(stranger, executor, &call).unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnexpectedCallback);

    // a pool impersonating the one named in the data, while nothing is pending
    let err = host.transact_sol(CHEAP_POOL, executor, &call).unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnexpectedCallback);

    assert_eq!(host.balance_of(weth, executor), ether(1));
    assert_eq!(host.balance_of(lst, executor), U256::ZERO);
}

#[test]
fn pool_paid_in_the_wrong_token_reverts_the_swap() {
    let mut scenario = scenario();
    scenario.executor.unchecked_swap_callback = true;
    scenario.funding.push(FundingSpec {
        token: LST,
        holder: EXECUTOR,
        amount: ether(1),
    });
    let Fixture {
        mut host,
        executor,
        operator,
        lst,
        cheap_pool,
        ..
    } = fixture_from(&scenario);
    // the pool takes WETH for LST, the callback data says LST
    let relay = Address::repeat_byte(0x77);
    host.deploy(
        relay,
        Arc::new(Relay {
            pool: cheap_pool,
            executor,
            token_in: lst,
        }),
    );
    let before = host.ledger().state().clone();

    let err = host.transact(operator, relay, &[]).unwrap_err();

    assert_eq!(err, Revert::venue(cheap_pool, "IIA"));
    assert_eq!(err.kind(), FailureKind::VenueFailure);
    // the executor did pay, just not the pool
    assert!(host.trace().iter().any(|record| record.caller == executor
        && record.target == lst
        && record.selector.0 == IERC20::transferCall::SELECTOR));
    assert_eq!(host.ledger().state(), &before);
}

#[test]
fn flash_loan_callback_from_stranger_is_rejected() {
    let Fixture {
        mut host,
        executor,
        weth,
        lst,
        routes,
        ..
    } = fixture();
    host.deal(weth, executor, ether(1));
    let stranger = Address::repeat_byte(0x99);
    let payload = ArbitragePayload {
        lst,
        strategy: routes["ordered"].strategy,
    };
    let call = ILstArbitrage::receiveFlashLoanCall {
        tokens: vec![weth],
        amounts: vec![ether(1)],
        feeAmounts: vec![U256::ZERO],
        userData: payload.encode(),
    };

    let err = host.transact_sol(stranger, executor, &call).unwrap_err();
    assert_eq!(err.kind(), FailureKind::UnauthorizedCaller);
    assert_eq!(host.trace().len(), 1);
    assert_eq!(host.balance_of(weth, executor), ether(1));
}

#[test]
fn direct_legs_compose_into_the_vault_round_trip() {
    let Fixture {
        mut host,
        executor,
        operator,
        weth,
        lst,
        ordered_pool,
        ..
    } = fixture();
    host.deal(weth, executor, ether(11));

    let shares = host
        .transact_sol(
            operator,
            executor,
            &ILstArbitrage::depositIntoLstCall {
                lst,
                baseAsset: weth,
                amount: ether(11),
            },
        )
        .unwrap()
        ._0;
    assert_eq!(shares, ether(10));

    host.transact_sol(
        operator,
        executor,
        &ILstArbitrage::sellOrderedPoolCall {
            pool: ordered_pool,
            zeroForOne: true,
            amountIn: shares,
        },
    )
    .unwrap();
    assert_eq!(host.balance_of(lst, executor), U256::ZERO);
    assert!(host.balance_of(weth, executor) > ether(11));
}

#[test]
fn redemption_rate_is_what_the_lst_reports() {
    let Fixture {
        mut host,
        operator,
        lst,
        ..
    } = fixture();
    let assets = host
        .simulate_sol(
            operator,
            lst,
            &IERC4626::convertToAssetsCall { shares: ether(10) },
        )
        .unwrap()
        ._0;
    assert_eq!(assets, ether(11));
    // simulate leaves a trace but no writes
    assert_eq!(host.trace().len(), 1);
    assert_eq!(
        host.trace()[0].selector.as_slice(),
        &IERC4626::convertToAssetsCall::SELECTOR
    );
}

#[tokio::test]
async fn optimizer_finds_a_profitable_vault_borrow() {
    let Fixture {
        host,
        executor,
        operator,
        routes,
        ..
    } = fixture();
    let route = routes["ordered"];
    let sender = Sender {
        caller: operator,
        executor,
    };
    let target = Target::Vault {
        lst: route.lst,
        base_asset: route.base_asset,
        strategy: route.strategy,
    };
    let params = SearchParams {
        intervals: 8,
        tolerance: ether(1) / U256::from(100),
        ceiling: ether(100),
    };

    let optimized = optimize_amount_in(&host, sender, target, params).await.unwrap();
    assert!(optimized.profit > U256::ZERO);
    assert!(optimized.amount_in > U256::ZERO);
    assert!(optimized.amount_in <= ether(100));

    // the result replays to the same profit
    let mut host = host.clone();
    let call = vault_arbitrage_call(route.lst, route.base_asset, optimized.amount_in, &route.strategy);
    let profit = host.transact_sol(operator, executor, &call).unwrap()._0;
    assert_eq!(profit, optimized.profit);
}

#[tokio::test]
async fn optimizer_finds_a_profitable_flash_swap() {
    let Fixture {
        host,
        executor,
        operator,
        cheap_pool,
        ..
    } = fixture();
    let sender = Sender {
        caller: operator,
        executor,
    };
    let target = Target::FlashSwap {
        pool: cheap_pool,
        direction: Direction::ZeroForOne,
    };
    let params = SearchParams {
        intervals: 8,
        tolerance: ether(1) / U256::from(100),
        ceiling: ether(100),
    };

    let optimized = optimize_amount_in(&host, sender, target, params).await.unwrap();
    assert!(optimized.profit > U256::ZERO);
    // a larger trade pays more than the 1 WETH one
    let mut host = host.clone();
    let one = host
        .transact_sol(
            operator,
            executor,
            &flash_swap_arbitrage_call(cheap_pool, Direction::ZeroForOne, ether(1)),
        )
        .unwrap()
        ._0;
    assert!(optimized.profit >= one);
}
