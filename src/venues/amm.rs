use alloy::primitives::U256;

use crate::utils::constants::BPS;

/// Constant-product output for `amount_in`, after a fee in basis points.
///
/// Every simulated venue prices with this curve; real venues are opaque to the
/// executor, which only observes the resulting balance change.
#[must_use]
pub fn amount_out(reserve_in: U256, reserve_out: U256, amount_in: U256, fee_bps: u32) -> U256 {
    if amount_in.is_zero() || reserve_in.is_zero() || reserve_out.is_zero() {
        return U256::ZERO;
    }
    let fee_factor = U256::from(BPS.saturating_sub(u64::from(fee_bps)));
    let amount_in_with_fee = amount_in * fee_factor;
    let numerator = amount_in_with_fee * reserve_out;
    let denominator = reserve_in * U256::from(BPS) + amount_in_with_fee;
    numerator / denominator
}
