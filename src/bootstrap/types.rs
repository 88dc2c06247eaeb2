use std::collections::BTreeMap;

use alloy::primitives::{address, Address, B256, U256};
use serde::{Deserialize, Serialize};

use crate::arb::strategy::SellStrategy;
use crate::chain::BlockEnv;

/// Everything needed to stand up a host: tokens, venues, lender, executor and
/// the balances they start with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scenario {
    /// Block the host starts at
    #[serde(default)]
    pub block: BlockSpec,
    /// Plain ERC-20 tokens
    pub tokens: Vec<TokenSpec>,
    /// ERC-4626 LST vaults
    #[serde(default)]
    pub lst_vaults: Vec<LstVaultSpec>,
    /// Ordered pools with flash-swap callbacks
    #[serde(default)]
    pub ordered_pools: Vec<OrderedPoolSpec>,
    /// Flash-loan vault and the pools it hosts
    pub flash_vault: FlashVaultSpec,
    /// Pools addressing coins by index
    #[serde(default)]
    pub indexed_pools: Vec<IndexedPoolSpec>,
    /// The arbitrage executor
    pub executor: ExecutorSpec,
    /// Extra balances handed out at start
    #[serde(default)]
    pub funding: Vec<FundingSpec>,
    /// Vault arbitrage routes by name
    #[serde(default)]
    pub routes: BTreeMap<String, RouteSpec>,
}

/// Block number and timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlockSpec {
    /// Block height
    pub number: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

impl From<BlockSpec> for BlockEnv {
    fn from(block: BlockSpec) -> Self {
        Self {
            number: block.number,
            timestamp: block.timestamp,
        }
    }
}

/// ERC-20 token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSpec {
    /// Deployment address
    pub address: Address,
    /// Ticker
    pub symbol: String,
    /// Display decimals
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

/// 18, like ether.
const fn default_decimals() -> u8 {
    18
}

/// ERC-4626 LST vault, backed by `assets` of `asset` against `shares` already
/// in circulation. Shares seeded into venues are part of `shares`; the rest go
/// to `share_holder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LstVaultSpec {
    /// Deployment address, also the share token
    pub address: Address,
    /// Share ticker
    pub symbol: String,
    /// Underlying asset
    pub asset: Address,
    /// Underlying held by the vault
    pub assets: U256,
    /// Total shares outstanding
    pub shares: U256,
    /// Who holds the shares no venue was seeded with
    #[serde(default = "default_share_holder")]
    pub share_holder: Address,
}

/// The conventional burn address.
const fn default_share_holder() -> Address {
    address!("0x000000000000000000000000000000000000dead")
}

/// Ordered pool and its reserves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderedPoolSpec {
    /// Deployment address
    pub address: Address,
    /// First token
    pub token0: Address,
    /// Second token
    pub token1: Address,
    /// Swap fee in basis points
    pub fee_bps: u32,
    /// Reserve of `token0`
    pub reserve0: U256,
    /// Reserve of `token1`
    pub reserve1: U256,
}

/// The flash-loan vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashVaultSpec {
    /// Deployment address
    pub address: Address,
    /// Pools held inside the vault
    #[serde(default)]
    pub pools: Vec<VaultPoolSpec>,
    /// Lendable balances outside of any pool
    #[serde(default)]
    pub liquidity: Vec<LiquiditySpec>,
}

/// Two-token pool inside the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultPoolSpec {
    /// Pool id
    pub pool_id: B256,
    /// First token
    pub token_a: Address,
    /// Second token
    pub token_b: Address,
    /// Swap fee in basis points
    pub fee_bps: u32,
    /// Balance of `token_a`
    pub balance_a: U256,
    /// Balance of `token_b`
    pub balance_b: U256,
}

/// Amount of one token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquiditySpec {
    /// Token
    pub token: Address,
    /// Amount
    pub amount: U256,
}

/// Indexed pool and its balances, in coin order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedPoolSpec {
    /// Deployment address
    pub address: Address,
    /// Coins by index
    pub coins: Vec<Address>,
    /// Swap fee in basis points
    pub fee_bps: u32,
    /// Balance of each coin
    pub balances: Vec<U256>,
}

/// The arbitrage executor and who operates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutorSpec {
    /// Deployment address
    pub address: Address,
    /// Account sending transactions to the executor
    pub operator: Address,
    /// Accept swap callbacks from anyone
    #[serde(default)]
    pub unchecked_swap_callback: bool,
}

/// Balance handed to `holder` at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FundingSpec {
    /// Token
    pub token: Address,
    /// Recipient
    pub holder: Address,
    /// Amount
    pub amount: U256,
}

/// A vault arbitrage route: which LST to mint and where to sell it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteSpec {
    /// LST minted with the loan
    pub lst: Address,
    /// Asset borrowed
    pub base_asset: Address,
    /// Where the LST is sold
    pub strategy: SellStrategy,
}
