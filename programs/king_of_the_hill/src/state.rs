use anchor_lang::prelude::*;

use crate::fees::{next_claim_fee, split_payment, validate_percentage};
use crate::{KingError, MAX_GRACE_PERIOD};

// ══════════════════════════════════════════════════════════════════════════
//  CONFIG
// ══════════════════════════════════════════════════════════════════════════

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameConfig {
    pub initial_claim_fee:       u64, // 8
    pub fee_increase_percentage: u8,  // 1
    pub platform_fee_percentage: u8,  // 1
    pub grace_period:            i64, // 8 (seconds)
}

impl GameConfig {
    pub const LEN: usize = 8 + 1 + 1 + 8;

    pub fn validate(&self) -> Result<()> {
        require!(self.initial_claim_fee > 0, KingError::InvalidFee);
        validate_percentage(self.fee_increase_percentage)?;
        validate_percentage(self.platform_fee_percentage)?;
        validate_grace_period(self.grace_period)
    }
}

/// Upper bound keeps `last_claim_time + grace_period` far away from i64::MAX
/// for any timestamp the cluster can produce.
pub fn validate_grace_period(grace_period: i64) -> Result<()> {
    require!(
        grace_period > 0 && grace_period <= MAX_GRACE_PERIOD,
        KingError::InvalidGracePeriod
    );
    Ok(())
}

// ══════════════════════════════════════════════════════════════════════════
//  ACCOUNTS
// ══════════════════════════════════════════════════════════════════════════

/// The game vault. Its lamports (minus rent) back every balance tracked here.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct GameState {
    pub authority:              Pubkey,         // 32
    pub config:                 GameConfig,     // 18
    // ── Round ──
    pub current_king:           Option<Pubkey>, // 1 + 32 = 33
    pub last_claim_time:        i64,            // 8
    pub claim_fee:              u64,            // 8
    pub pot:                    u64,            // 8
    pub game_ended:             bool,           // 1
    pub game_round:             u64,            // 8
    pub total_claims:           u64,            // 8
    // ── Payout ledger ──
    pub platform_fees_balance:  u64,            // 8
    pub total_pending_winnings: u64,            // 8
    // ── Transparency counters ──
    pub total_wagered:          u64,            // 8
    pub total_paid_out:         u64,            // 8
    pub biggest_pot:            u64,            // 8
    pub bump:                   u8,             // 1
}

impl GameState {
    pub const LEN: usize = 32 + GameConfig::LEN + 33 + 8 + 8 + 8 + 1 + 8 + 8 + 8 + 8 + 8 + 8 + 8 + 1;

    pub fn new(authority: Pubkey, config: GameConfig, bump: u8) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            authority,
            config,
            current_king: None,
            last_claim_time: 0,
            claim_fee: config.initial_claim_fee,
            pot: 0,
            game_ended: false,
            game_round: 1,
            total_claims: 0,
            platform_fees_balance: 0,
            total_pending_winnings: 0,
            total_wagered: 0,
            total_paid_out: 0,
            biggest_pot: 0,
            bump,
        })
    }

    pub fn admin(&self) -> Pubkey {
        self.authority
    }

    /// Lamports the vault owes: pot + platform fees + every pending payout.
    pub fn total_held(&self) -> Result<u64> {
        self.pot
            .checked_add(self.platform_fees_balance)
            .and_then(|v| v.checked_add(self.total_pending_winnings))
            .ok_or_else(|| KingError::MathOverflow.into())
    }

    /// Seconds until the current king can be declared winner. Zero once the
    /// round is over, before the first claim, and after the deadline passed.
    pub fn remaining_time(&self, now: i64) -> u64 {
        if self.game_ended || self.current_king.is_none() {
            return 0;
        }
        let deadline = self.last_claim_time.saturating_add(self.config.grace_period);
        deadline.saturating_sub(now).max(0) as u64
    }

    /// Admit `caller` as the new king. Every check runs before the first write
    /// so a rejected claim leaves the game untouched. Returns the new fee.
    pub fn claim_throne(
        &mut self,
        player: &mut PlayerAccount,
        caller: Pubkey,
        amount: u64,
        now: i64,
    ) -> Result<u64> {
        require!(!self.game_ended, KingError::GameEnded);
        require!(self.current_king != Some(caller), KingError::AlreadyKing);
        require!(amount >= self.claim_fee, KingError::InsufficientFee);
        require_keys_eq!(player.player, caller, KingError::PlayerMismatch);
        require!(now > 0, KingError::InvalidClock);

        let new_fee = next_claim_fee(self.claim_fee, self.config.fee_increase_percentage)?;
        let (platform_cut, pot_share) = split_payment(amount, self.config.platform_fee_percentage);

        let pot = self.pot.checked_add(pot_share).ok_or(KingError::MathOverflow)?;
        let platform_fees = self
            .platform_fees_balance
            .checked_add(platform_cut)
            .ok_or(KingError::MathOverflow)?;
        let total_claims = self.total_claims.checked_add(1).ok_or(KingError::MathOverflow)?;
        let claim_count = player.claim_count.checked_add(1).ok_or(KingError::MathOverflow)?;

        self.pot = pot;
        self.platform_fees_balance = platform_fees;
        self.current_king = Some(caller);
        self.last_claim_time = now;
        self.claim_fee = new_fee;
        self.total_claims = total_claims;
        self.total_wagered = self.total_wagered.saturating_add(amount);
        player.claim_count = claim_count;

        Ok(new_fee)
    }

    /// End the round and move the whole pot into the king's pending balance.
    /// `king` must be the ledger entry of the current king; it may be absent
    /// while nobody holds the throne, so `NoKing` is reported before it is needed.
    pub fn declare_winner(&mut self, king: Option<&mut PlayerAccount>, now: i64) -> Result<u64> {
        require!(!self.game_ended, KingError::GameEnded);
        let current = self.current_king.ok_or(KingError::NoKing)?;
        let king = king.ok_or(KingError::PlayerMismatch)?;
        require_keys_eq!(king.player, current, KingError::PlayerMismatch);

        let deadline = self.last_claim_time.saturating_add(self.config.grace_period);
        require!(now > deadline, KingError::GracePeriodActive);

        let payout = self.pot;
        let pending = king.pending_winnings.checked_add(payout).ok_or(KingError::MathOverflow)?;
        let total_pending = self
            .total_pending_winnings
            .checked_add(payout)
            .ok_or(KingError::MathOverflow)?;

        king.pending_winnings = pending;
        self.total_pending_winnings = total_pending;
        self.pot = 0;
        self.game_ended = true;
        if payout > self.biggest_pot {
            self.biggest_pot = payout;
        }

        Ok(payout)
    }

    /// Zero the caller's pending balance and hand back the amount to transfer.
    /// The ledger is settled here, before any lamports move.
    pub fn take_winnings(&mut self, player: &mut PlayerAccount, caller: Pubkey) -> Result<u64> {
        require_keys_eq!(player.player, caller, KingError::PlayerMismatch);
        let amount = player.pending_winnings;
        require!(amount > 0, KingError::NothingToWithdraw);

        let total_pending = self
            .total_pending_winnings
            .checked_sub(amount)
            .ok_or(KingError::AccountingBroken)?;

        player.pending_winnings = 0;
        self.total_pending_winnings = total_pending;
        self.total_paid_out = self.total_paid_out.saturating_add(amount);

        Ok(amount)
    }

    pub fn take_platform_fees(&mut self, caller: Pubkey) -> Result<u64> {
        require_keys_eq!(caller, self.authority, KingError::Unauthorized);
        let amount = self.platform_fees_balance;
        require!(amount > 0, KingError::NothingToWithdraw);

        self.platform_fees_balance = 0;
        Ok(amount)
    }

    /// Start the next round. Pending payouts, platform fees and player stats
    /// carry over untouched. Returns the new round number.
    pub fn reset_game(&mut self) -> Result<u64> {
        require!(self.game_ended, KingError::GameNotEnded);
        let round = self.game_round.checked_add(1).ok_or(KingError::MathOverflow)?;

        self.claim_fee = self.config.initial_claim_fee;
        self.current_king = None;
        self.last_claim_time = 0;
        self.pot = 0;
        self.total_claims = 0;
        self.game_ended = false;
        self.game_round = round;

        Ok(round)
    }

    // ── Admin parameter updates ──────────────────────────────────────────

    /// The new initial fee only applies from the next reset; the increase
    /// percentage applies to the next claim.
    pub fn update_claim_fee_parameters(
        &mut self,
        caller: Pubkey,
        new_initial_fee: u64,
        new_increase_percentage: u8,
    ) -> Result<()> {
        require_keys_eq!(caller, self.authority, KingError::Unauthorized);
        require!(new_initial_fee > 0, KingError::InvalidFee);
        validate_percentage(new_increase_percentage)?;

        self.config.initial_claim_fee = new_initial_fee;
        self.config.fee_increase_percentage = new_increase_percentage;
        Ok(())
    }

    /// Returns the previous grace period.
    pub fn update_grace_period(&mut self, caller: Pubkey, new_period: i64) -> Result<i64> {
        require_keys_eq!(caller, self.authority, KingError::Unauthorized);
        validate_grace_period(new_period)?;

        let old = self.config.grace_period;
        self.config.grace_period = new_period;
        Ok(old)
    }

    /// Returns the previous percentage.
    pub fn update_platform_fee_percentage(&mut self, caller: Pubkey, new_pct: u8) -> Result<u8> {
        require_keys_eq!(caller, self.authority, KingError::Unauthorized);
        validate_percentage(new_pct)?;

        let old = self.config.platform_fee_percentage;
        self.config.platform_fee_percentage = new_pct;
        Ok(old)
    }
}

/// Per-wallet ledger entry: lifetime claim count and withdrawable winnings.
#[account]
#[derive(Debug, PartialEq, Eq)]
pub struct PlayerAccount {
    pub player:           Pubkey, // 32
    pub claim_count:      u64,    // 8
    pub pending_winnings: u64,    // 8
    pub bump:             u8,     // 1
}

impl PlayerAccount {
    pub const LEN: usize = 32 + 8 + 8 + 1;

    pub fn new(player: Pubkey, bump: u8) -> Self {
        Self { player, claim_count: 0, pending_winnings: 0, bump }
    }
}
