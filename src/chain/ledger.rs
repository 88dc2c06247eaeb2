//! Journaled asset ledger backing every contract in the host.
//!
//! All mutable state of the simulated chain lives here: token balances, allowances,
//! total supplies and raw contract storage. Each mutation records the value it
//! replaced so the host can rewind to any checkpoint, which is how a reverted call
//! frame leaves no trace.

use std::collections::HashMap;

use alloy::primitives::{Address, B256, U256};

use super::revert::Revert;

/// Journal-free view of the ledger, comparable across snapshots.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct State {
    /// `(token, holder) -> balance`
    balances: HashMap<(Address, Address), U256>,
    /// `(token, owner, spender) -> allowance`
    allowances: HashMap<(Address, Address, Address), U256>,
    /// `token -> total supply`
    supplies: HashMap<Address, U256>,
    /// `(contract, slot) -> word`
    storage: HashMap<(Address, B256), B256>,
}

/// One undo record. `None` means the key did not exist before the write.
#[derive(Debug, Clone)]
enum Entry {
    /// Previous balance of `(token, holder)`
    Balance((Address, Address), Option<U256>),
    /// Previous allowance of `(token, owner, spender)`
    Allowance((Address, Address, Address), Option<U256>),
    /// Previous total supply of a token
    Supply(Address, Option<U256>),
    /// Previous storage word of `(contract, slot)`
    Storage((Address, B256), Option<B256>),
}

/// Position in the journal that [`Ledger::revert_to`] can rewind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Checkpoint(usize);

/// Balances, allowances, supplies and storage with undo support.
#[derive(Debug, Clone, Default)]
pub struct Ledger {
    /// Current values
    state: State,
    /// Undo log since the last commit
    journal: Vec<Entry>,
}

impl Ledger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state without the journal.
    #[must_use]
    pub const fn state(&self) -> &State {
        &self.state
    }

    /// Marks the current journal position.
    #[must_use]
    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint(self.journal.len())
    }

    /// Undoes every mutation recorded after `checkpoint`, newest first.
    pub fn revert_to(&mut self, checkpoint: Checkpoint) {
        while self.journal.len() > checkpoint.0 {
            let Some(entry) = self.journal.pop() else {
                break;
            };
            match entry {
                Entry::Balance(key, prev) => restore(&mut self.state.balances, key, prev),
                Entry::Allowance(key, prev) => restore(&mut self.state.allowances, key, prev),
                Entry::Supply(key, prev) => restore(&mut self.state.supplies, key, prev),
                Entry::Storage(key, prev) => restore(&mut self.state.storage, key, prev),
            }
        }
    }

    /// Makes everything written so far permanent.
    pub fn commit(&mut self) {
        self.journal.clear();
    }

    /// Number of undo records held.
    #[must_use]
    pub fn journal_len(&self) -> usize {
        self.journal.len()
    }

    /// Balance of `holder` in `token`.
    #[must_use]
    pub fn balance_of(&self, token: Address, holder: Address) -> U256 {
        self.state
            .balances
            .get(&(token, holder))
            .copied()
            .unwrap_or_default()
    }

    /// Allowance `owner` granted `spender` in `token`.
    #[must_use]
    pub fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
        self.state
            .allowances
            .get(&(token, owner, spender))
            .copied()
            .unwrap_or_default()
    }

    /// Total supply of `token`.
    #[must_use]
    pub fn total_supply(&self, token: Address) -> U256 {
        self.state.supplies.get(&token).copied().unwrap_or_default()
    }

    /// Raw storage word of `contract` at `slot`.
    #[must_use]
    pub fn sload(&self, contract: Address, slot: B256) -> B256 {
        self.state
            .storage
            .get(&(contract, slot))
            .copied()
            .unwrap_or_default()
    }

    /// Writes a raw storage word.
    pub fn sstore(&mut self, contract: Address, slot: B256, value: B256) {
        let prev = self.state.storage.insert((contract, slot), value);
        self.journal.push(Entry::Storage((contract, slot), prev));
    }

    /// Moves `amount` of `token` from `from` to `to`.
    ///
    /// # Errors
    ///
    /// [`Revert::InsufficientBalance`] if `from` holds less than `amount`.
    pub fn transfer(
        &mut self,
        token: Address,
        from: Address,
        to: Address,
        amount: U256,
    ) -> Result<(), Revert> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(Revert::InsufficientBalance {
                token,
                holder: from,
                needed: amount,
                available,
            });
        }
        self.set_balance(token, from, available - amount);
        let to_balance = self.balance_of(token, to);
        self.set_balance(token, to, to_balance + amount);
        Ok(())
    }

    /// Sets the allowance `owner` grants `spender`.
    pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
        let prev = self
            .state
            .allowances
            .insert((token, owner, spender), amount);
        self.journal
            .push(Entry::Allowance((token, owner, spender), prev));
    }

    /// Consumes `amount` of the allowance `owner` granted `spender`.
    /// An allowance of `U256::MAX` is unlimited and is left untouched.
    ///
    /// # Errors
    ///
    /// [`Revert::InsufficientAllowance`] if the allowance is below `amount`.
    pub fn spend_allowance(
        &mut self,
        token: Address,
        owner: Address,
        spender: Address,
        amount: U256,
    ) -> Result<(), Revert> {
        let available = self.allowance(token, owner, spender);
        if available == U256::MAX {
            return Ok(());
        }
        if available < amount {
            return Err(Revert::InsufficientAllowance {
                token,
                owner,
                spender,
                needed: amount,
                available,
            });
        }
        self.approve(token, owner, spender, available - amount);
        Ok(())
    }

    /// Creates `amount` of `token` for `to`.
    pub fn mint(&mut self, token: Address, to: Address, amount: U256) {
        let supply = self.total_supply(token);
        self.set_supply(token, supply.saturating_add(amount));
        let balance = self.balance_of(token, to);
        self.set_balance(token, to, balance.saturating_add(amount));
    }

    /// Destroys `amount` of `token` held by `from`.
    ///
    /// # Errors
    ///
    /// [`Revert::InsufficientBalance`] if `from` holds less than `amount`.
    pub fn burn(&mut self, token: Address, from: Address, amount: U256) -> Result<(), Revert> {
        let available = self.balance_of(token, from);
        if available < amount {
            return Err(Revert::InsufficientBalance {
                token,
                holder: from,
                needed: amount,
                available,
            });
        }
        self.set_balance(token, from, available - amount);
        let supply = self.total_supply(token);
        self.set_supply(token, supply.saturating_sub(amount));
        Ok(())
    }

    /// Overwrites a balance without touching the supply. Used for test funding.
    pub fn set_balance(&mut self, token: Address, holder: Address, amount: U256) {
        let prev = self.state.balances.insert((token, holder), amount);
        self.journal.push(Entry::Balance((token, holder), prev));
    }

    /// Overwrites a total supply.
    fn set_supply(&mut self, token: Address, amount: U256) {
        let prev = self.state.supplies.insert(token, amount);
        self.journal.push(Entry::Supply(token, prev));
    }
}

/// Puts back the value a journal entry replaced.
fn restore<K, V>(map: &mut HashMap<K, V>, key: K, prev: Option<V>)
where
    K: std::hash::Hash + Eq,
{
    match prev {
        Some(value) => {
            map.insert(key, value);
        }
        None => {
            map.remove(&key);
        }
    }
}
