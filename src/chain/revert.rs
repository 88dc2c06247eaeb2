use alloy::primitives::{Address, I256, U256};
use derive_more::Display;
use thiserror::Error;

/// Why a call frame aborted.
///
/// Any `Revert` returned from a nested call unwinds every ledger mutation made since
/// that frame was entered, and a revert reaching the top level unwinds the whole
/// transaction. Nothing in the executor catches or downgrades these.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Revert {
    /// A callback was invoked by someone other than the counterparty it trusts
    #[error("unauthorized caller {caller}, expected {expected}")]
    UnauthorizedCaller {
        /// The `msg.sender` of the rejected call
        caller: Address,
        /// The only address allowed to make this call
        expected: Address,
    },

    /// A callback arrived while no borrow of ours was waiting for it
    #[error("unexpected callback from {caller}")]
    UnexpectedCallback {
        /// The `msg.sender` of the rejected call
        caller: Address,
    },

    /// The sell payload's discriminator names no known venue
    #[error("unsupported sell strategy {0}")]
    UnsupportedStrategy(U256),

    /// The LST vault is not backed by the asset being deposited
    #[error("lst {lst} is backed by {actual}, not {expected}")]
    AssetMismatch {
        /// The LST vault that was asked to mint
        lst: Address,
        /// The asset we tried to deposit
        expected: Address,
        /// The asset the vault declares
        actual: Address,
    },

    /// The round trip ended below the repayment threshold
    #[error("unprofitable: profit {profit} on {token}")]
    Unprofitable {
        /// The asset profit is measured in
        token: Address,
        /// Net result of the round trip, negative by construction
        profit: I256,
    },

    /// A holder tried to move more than it owns
    #[error("insufficient balance of {token} for {holder}: needed {needed}, available {available}")]
    InsufficientBalance {
        /// Token being moved
        token: Address,
        /// Account being debited
        holder: Address,
        /// Amount requested
        needed: U256,
        /// Amount held
        available: U256,
    },

    /// A spender tried to pull more than it was approved for
    #[error("insufficient allowance of {token} from {owner} to {spender}: needed {needed}, available {available}")]
    InsufficientAllowance {
        /// Token being pulled
        token: Address,
        /// Account that granted the approval
        owner: Address,
        /// Account using the approval
        spender: Address,
        /// Amount requested
        needed: U256,
        /// Amount approved
        available: U256,
    },

    /// A venue rejected the call with its own reason string
    #[error("{venue} reverted: {reason}")]
    Venue {
        /// The contract that reverted
        venue: Address,
        /// Venue-specific reason, e.g. `IIA` or `SPL`
        reason: String,
    },

    /// Call to an address with nothing deployed
    #[error("no contract at {0}")]
    NoCode(Address),

    /// Calldata or return data did not decode
    #[error("abi decoding failed: {0}")]
    Decode(String),

    /// Nested calls went deeper than the host allows
    #[error("call depth limit of {0} exceeded")]
    CallDepth(usize),
}

/// The condition a caller sees when an execution fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum FailureKind {
    /// See [`Revert::UnauthorizedCaller`]
    UnauthorizedCaller,
    /// See [`Revert::UnexpectedCallback`]
    UnexpectedCallback,
    /// See [`Revert::UnsupportedStrategy`]
    UnsupportedStrategy,
    /// See [`Revert::AssetMismatch`]
    AssetMismatch,
    /// See [`Revert::Unprofitable`]
    Unprofitable,
    /// Any external venue, token or lender call that reverted on its own terms
    VenueFailure,
}

impl Revert {
    /// Shorthand for a venue reason-string revert.
    pub fn venue(venue: Address, reason: impl Into<String>) -> Self {
        Self::Venue {
            venue,
            reason: reason.into(),
        }
    }

    /// Classifies this revert into the taxonomy reported to callers.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        match self {
            Self::UnauthorizedCaller { .. } => FailureKind::UnauthorizedCaller,
            Self::UnexpectedCallback { .. } => FailureKind::UnexpectedCallback,
            Self::UnsupportedStrategy(_) => FailureKind::UnsupportedStrategy,
            Self::AssetMismatch { .. } => FailureKind::AssetMismatch,
            Self::Unprofitable { .. } => FailureKind::Unprofitable,
            Self::InsufficientBalance { .. }
            | Self::InsufficientAllowance { .. }
            | Self::Venue { .. }
            | Self::NoCode(_)
            | Self::Decode(_)
            | Self::CallDepth(_) => FailureKind::VenueFailure,
        }
    }
}

impl From<alloy::sol_types::Error> for Revert {
    fn from(err: alloy::sol_types::Error) -> Self {
        Self::Decode(err.to_string())
    }
}
