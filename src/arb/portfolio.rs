use std::collections::HashMap;
use std::fmt::{self, Display};

use alloy::primitives::{Address, I256, U256};

use crate::chain::Host;

/// Represents a portfolio of token holdings.
///
/// A portfolio is a snapshot of one account's balances in a fixed set of tokens,
/// taken straight from the ledger. Two snapshots around a transaction show what
/// it did to the account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Portfolio {
    /// Account the balances belong to
    pub holder: Address,
    /// Map of tokens to their respective balances
    pub holdings: HashMap<Address, U256>,
}

impl Portfolio {
    /// Creates a new portfolio with the given token holdings.
    ///
    /// # Arguments
    ///
    /// * `holder` - The account holding the tokens
    /// * `holdings` - A map of tokens to their respective balances
    ///
    /// # Returns
    ///
    /// A new Portfolio instance
    #[must_use]
    pub const fn new(holder: Address, holdings: HashMap<Address, U256>) -> Self {
        Self { holder, holdings }
    }

    /// Reads `holder`'s current balance of each of `tokens`.
    #[must_use]
    pub fn snapshot(host: &Host, holder: Address, tokens: &[Address]) -> Self {
        let holdings = tokens
            .iter()
            .map(|token| (*token, host.balance_of(*token, holder)))
            .collect();
        Self::new(holder, holdings)
    }

    /// Returns the balance of a specific token in the portfolio.
    ///
    /// # Arguments
    ///
    /// * `token` - The token to query
    ///
    /// # Returns
    ///
    /// The token balance if the token is in the portfolio, or None otherwise
    #[must_use]
    pub fn balance(&self, token: &Address) -> Option<U256> {
        self.holdings.get(token).copied()
    }

    /// Signed balance change of each token from `earlier` to `self`. Tokens
    /// missing on either side count as zero.
    #[must_use]
    pub fn diff(&self, earlier: &Self) -> HashMap<Address, I256> {
        self.holdings
            .keys()
            .chain(earlier.holdings.keys())
            .map(|token| {
                let now = self.balance(token).unwrap_or_default();
                let then = earlier.balance(token).unwrap_or_default();
                let change = if now >= then {
                    I256::try_from(now - then).unwrap_or(I256::MAX)
                } else {
                    -I256::try_from(then - now).unwrap_or(I256::MAX)
                };
                (*token, change)
            })
            .collect()
    }
}

impl Display for Portfolio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut holdings: Vec<_> = self.holdings.iter().collect();
        holdings.sort();
        write!(f, "{}:", self.holder)?;
        for (token, balance) in holdings {
            write!(f, " {balance} {token}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::chain::BlockEnv;

    #[test]
    fn test_snapshot_and_diff() {
        let (weth, lst) = (Address::repeat_byte(0x01), Address::repeat_byte(0x02));
        let holder = Address::repeat_byte(0x03);
        let mut host = Host::new(BlockEnv::default());
        host.deal(weth, holder, U256::from(10));
        host.deal(lst, holder, U256::from(4));

        let before = Portfolio::snapshot(&host, holder, &[weth, lst]);
        host.ledger_mut().burn(lst, holder, U256::from(4)).unwrap();
        host.deal(weth, holder, U256::from(3));
        let after = Portfolio::snapshot(&host, holder, &[weth, lst]);

        assert_eq!(after.balance(&weth), Some(U256::from(13)));
        let diff = after.diff(&before);
        assert_eq!(diff[&weth], I256::try_from(3).unwrap());
        assert_eq!(diff[&lst], I256::try_from(-4).unwrap());
    }
}
