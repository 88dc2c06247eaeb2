//! In-process execution host.
//!
//! Contracts are immutable Rust objects registered at an address; all of their
//! mutable state is kept in the host's [`Ledger`]. A call is a strictly nested
//! synchronous invocation: the callee may call further contracts (including the
//! caller, which is how flash-loan and flash-swap callbacks work) and the outer
//! frame only resumes once the inner one has returned or reverted.

use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::sync::Arc;

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy::sol_types::SolCall;
use log::{debug, warn};

use super::ledger::{Checkpoint, Ledger};
use super::revert::Revert;

/// Maximum nesting of calls, as on mainnet.
pub const MAX_CALL_DEPTH: usize = 1024;

/// Who is calling and who is being called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallContext {
    /// `msg.sender`
    pub caller: Address,
    /// `address(this)`
    pub address: Address,
}

/// Anything that can be deployed in the host.
pub trait Contract: Send + Sync + Debug {
    /// Handles ABI-encoded `input` sent by `ctx.caller` to `ctx.address`.
    ///
    /// # Errors
    ///
    /// Returns a [`Revert`] to abort the frame; the host rolls back whatever the
    /// contract wrote before failing.
    fn call(&self, host: &mut Host, ctx: CallContext, input: &[u8]) -> Result<Bytes, Revert>;
}

/// Block-level environment visible to contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BlockEnv {
    /// Block height
    pub number: u64,
    /// Unix timestamp in seconds
    pub timestamp: u64,
}

/// One call observed during the current transaction.
#[derive(Clone, PartialEq, Eq)]
pub struct CallRecord {
    /// Nesting level, 0 for the top-level call
    pub depth: usize,
    /// `msg.sender`
    pub caller: Address,
    /// Callee
    pub target: Address,
    /// First four bytes of calldata
    pub selector: FixedBytes<4>,
}

impl Debug for CallRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{} -> {} [{}]",
            "  ".repeat(self.depth),
            self.caller,
            self.target,
            self.selector
        )
    }
}

/// The simulated chain: deployed contracts, the ledger and the current call stack.
#[derive(Clone, Default)]
pub struct Host {
    /// Journaled state
    ledger: Ledger,
    /// Deployed code
    contracts: HashMap<Address, Arc<dyn Contract>>,
    /// Current block
    block: BlockEnv,
    /// Current nesting level
    depth: usize,
    /// Calls seen since the last top-level transaction began
    trace: Vec<CallRecord>,
}

impl Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("contracts", &self.contracts.len())
            .field("block", &self.block)
            .field("depth", &self.depth)
            .finish_non_exhaustive()
    }
}

impl Host {
    /// Creates an empty host at the given block.
    #[must_use]
    pub fn new(block: BlockEnv) -> Self {
        Self {
            block,
            ..Self::default()
        }
    }

    /// Current block environment.
    #[must_use]
    pub const fn block(&self) -> BlockEnv {
        self.block
    }

    /// Moves the host to another block.
    pub fn set_block(&mut self, block: BlockEnv) {
        self.block = block;
    }

    /// Read access to the ledger.
    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Write access to the ledger for contracts acting on their own state.
    pub fn ledger_mut(&mut self) -> &mut Ledger {
        &mut self.ledger
    }

    /// Calls recorded since the last top-level transaction started.
    #[must_use]
    pub fn trace(&self) -> &[CallRecord] {
        &self.trace
    }

    /// Registers `contract` at `address`, replacing whatever was there.
    pub fn deploy(&mut self, address: Address, contract: Arc<dyn Contract>) {
        debug!("host::deploy: {address} {contract:?}");
        self.contracts.insert(address, contract);
    }

    /// Whether anything is deployed at `address`.
    #[must_use]
    pub fn has_code(&self, address: Address) -> bool {
        self.contracts.contains_key(&address)
    }

    /// Mints `amount` of `token` straight to `holder` and commits it.
    /// This is test and scenario funding, not something a contract can do.
    pub fn deal(&mut self, token: Address, holder: Address, amount: U256) {
        self.ledger.mint(token, holder, amount);
        self.ledger.commit();
    }

    /// Balance of `holder` in `token`, read directly from the ledger.
    #[must_use]
    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.ledger.balance_of(token, holder)
    }

    /// Performs a nested call from `caller` to `target`.
    ///
    /// On failure every ledger write made inside the call is undone before the
    /// revert is handed back to the caller.
    ///
    /// # Errors
    ///
    /// Whatever the callee reverted with, [`Revert::NoCode`] if nothing is deployed
    /// at `target`, or [`Revert::CallDepth`] past [`MAX_CALL_DEPTH`].
    pub fn call(&mut self, caller: Address, target: Address, input: &[u8]) -> Result<Bytes, Revert> {
        let contract = self
            .contracts
            .get(&target)
            .cloned()
            .ok_or(Revert::NoCode(target))?;
        if self.depth >= MAX_CALL_DEPTH {
            return Err(Revert::CallDepth(MAX_CALL_DEPTH));
        }

        self.trace.push(CallRecord {
            depth: self.depth,
            caller,
            target,
            selector: selector(input),
        });

        let checkpoint = self.ledger.checkpoint();
        self.depth += 1;
        let result = contract.call(
            self,
            CallContext {
                caller,
                address: target,
            },
            input,
        );
        self.depth -= 1;

        if let Err(err) = &result {
            debug!("host::call: {caller} -> {target} reverted: {err}");
            self.ledger.revert_to(checkpoint);
        }
        result
    }

    /// Typed variant of [`Host::call`].
    ///
    /// # Errors
    ///
    /// Same as [`Host::call`], plus [`Revert::Decode`] if the return data does not
    /// match `C`'s return type.
    pub fn call_sol<C: SolCall>(
        &mut self,
        caller: Address,
        target: Address,
        call: &C,
    ) -> Result<C::Return, Revert> {
        let output = self.call(caller, target, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Runs a top-level transaction: commits on success, rolls everything back on
    /// failure.
    ///
    /// # Errors
    ///
    /// The revert that aborted the transaction.
    pub fn transact(&mut self, caller: Address, target: Address, input: &[u8]) -> Result<Bytes, Revert> {
        let (checkpoint, result) = self.begin(caller, target, input);
        match &result {
            Ok(_) => self.ledger.commit(),
            Err(err) => {
                warn!("host::transact: {caller} -> {target} reverted: {err}");
                self.ledger.revert_to(checkpoint);
            }
        }
        result
    }

    /// Typed variant of [`Host::transact`].
    ///
    /// # Errors
    ///
    /// Same as [`Host::transact`].
    pub fn transact_sol<C: SolCall>(
        &mut self,
        caller: Address,
        target: Address,
        call: &C,
    ) -> Result<C::Return, Revert> {
        let output = self.transact(caller, target, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Runs a top-level call and discards its effects whatever the outcome. The
    /// trace is kept so callers can inspect what would have happened.
    ///
    /// # Errors
    ///
    /// The revert that aborted the call.
    pub fn simulate(&mut self, caller: Address, target: Address, input: &[u8]) -> Result<Bytes, Revert> {
        let (checkpoint, result) = self.begin(caller, target, input);
        self.ledger.revert_to(checkpoint);
        result
    }

    /// Typed variant of [`Host::simulate`], handy for views.
    ///
    /// # Errors
    ///
    /// Same as [`Host::simulate`].
    pub fn simulate_sol<C: SolCall>(
        &mut self,
        caller: Address,
        target: Address,
        call: &C,
    ) -> Result<C::Return, Revert> {
        let output = self.simulate(caller, target, &call.abi_encode())?;
        Ok(C::abi_decode_returns(&output, true)?)
    }

    /// Starts a top-level call with a fresh trace and returns the checkpoint to
    /// rewind to.
    fn begin(
        &mut self,
        caller: Address,
        target: Address,
        input: &[u8],
    ) -> (Checkpoint, Result<Bytes, Revert>) {
        self.trace.clear();
        self.depth = 0;
        let checkpoint = self.ledger.checkpoint();
        let result = self.call(caller, target, input);
        (checkpoint, result)
    }
}

/// Leading four bytes of calldata, zero-padded when shorter.
fn selector(input: &[u8]) -> FixedBytes<4> {
    let mut selector = [0_u8; 4];
    let len = input.len().min(4);
    selector[..len].copy_from_slice(&input[..len]);
    FixedBytes(selector)
}
