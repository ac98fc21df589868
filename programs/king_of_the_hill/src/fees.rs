use anchor_lang::prelude::*;

use crate::{KingError, PERCENT_BASE};

/// Split a claim payment into (platform_cut, pot_share).
/// Done in u128 so `amount * pct` can never overflow; the cut is always
/// <= amount, so narrowing back to u64 is lossless.
pub fn split_payment(amount: u64, platform_fee_percentage: u8) -> (u64, u64) {
    let cut = (amount as u128 * platform_fee_percentage as u128 / PERCENT_BASE as u128) as u64;
    (cut, amount - cut)
}

/// Next required claim fee: `fee + fee * pct / 100`.
///
/// A non-zero percentage always raises the fee by at least one lamport, so
/// growth stays strict even when integer division rounds the increment away.
/// Overflow rejects the claim instead of wrapping.
pub fn next_claim_fee(current_fee: u64, fee_increase_percentage: u8) -> Result<u64> {
    let raw = current_fee
        .checked_mul(fee_increase_percentage as u64)
        .ok_or(KingError::FeeOverflow)?;
    let mut increment = raw / PERCENT_BASE;
    if increment == 0 && fee_increase_percentage > 0 {
        increment = 1;
    }
    let next = current_fee.checked_add(increment).ok_or(KingError::FeeOverflow)?;
    Ok(next)
}

pub fn validate_percentage(pct: u8) -> Result<()> {
    require!(pct as u64 <= PERCENT_BASE, KingError::InvalidPercentage);
    Ok(())
}
