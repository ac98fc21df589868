use anchor_lang::prelude::*;
use anchor_lang::solana_program::system_instruction;
use anchor_lang::solana_program::program::invoke;

pub mod fees;
pub mod state;


pub use state::*;

declare_id!("Fg6PaFpoGXkYsidMpWTK6W2BeZ7FEfcYkg476zPFsLnS");

#[cfg(not(feature = "no-entrypoint"))]
use solana_security_txt::security_txt;

#[cfg(not(feature = "no-entrypoint"))]
security_txt! {
    name: "King of the Hill",
    project_url: "https://example.com/king-of-the-hill",
    contacts: "email:security@example.com",
    policy: "https://example.com/king-of-the-hill/security",
    preferred_languages: "en",
    auditors: "Unaudited"
}

// ── Constants ─────────────────────────────────────────────────────────────
pub const PERCENT_BASE:      u64 = 100;
pub const MAX_GRACE_PERIOD:  i64 = 31_536_000;  // 365 days

pub const GAME_SEED:   &[u8] = b"game_state";
pub const PLAYER_SEED: &[u8] = b"player";

// ── Default parameters (client-side bootstrap) ───────────────────────────
pub const DEFAULT_INITIAL_CLAIM_FEE:       u64 = 10_000_000; // 0.01 SOL
pub const DEFAULT_FEE_INCREASE_PERCENTAGE: u8  = 10;
pub const DEFAULT_PLATFORM_FEE_PERCENTAGE: u8  = 5;
pub const DEFAULT_GRACE_PERIOD:            i64 = 3_600;      // 1h

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_claim_fee:       DEFAULT_INITIAL_CLAIM_FEE,
            fee_increase_percentage: DEFAULT_FEE_INCREASE_PERCENTAGE,
            platform_fee_percentage: DEFAULT_PLATFORM_FEE_PERCENTAGE,
            grace_period:            DEFAULT_GRACE_PERIOD,
        }
    }
}

// Round flow:
//   claim_throne   → new king, fee escalates, payment split pot / platform
//   declare_winner → grace period elapsed, pot credited to king's ledger entry
//   reset_game     → next round, fee back to initial
//
// Payouts are pull-only: balances are zeroed in the ledger before lamports
// leave the vault, and every outflow ends with a solvency check.

#[program]
pub mod king_of_the_hill {
    use super::*;

    // ── Initialize ────────────────────────────────────────────────
    pub fn initialize(ctx: Context<Initialize>, config: GameConfig) -> Result<()> {
        let authority = ctx.accounts.authority.key();
        let game = GameState::new(authority, config, ctx.bumps.game_state)?;
        ctx.accounts.game_state.set_inner(game);

        emit!(GameInitialized { authority, round: 1 });
        Ok(())
    }

    // ── Claim the throne ──────────────────────────────────────────
    pub fn claim_throne(ctx: Context<ClaimThrone>, amount: u64) -> Result<()> {
        let clock = Clock::get()?;

        // Cache keys before mutable borrow
        let claimant_key = ctx.accounts.claimant.key();
        let claimant_ai = ctx.accounts.claimant.to_account_info();
        let game_key = ctx.accounts.game_state.key();
        let game_ai = ctx.accounts.game_state.to_account_info();

        let ledger = &mut ctx.accounts.player_account;
        if ledger.player == Pubkey::default() {
            // Freshly created by init_if_needed
            ledger.set_inner(PlayerAccount::new(claimant_key, ctx.bumps.player_account));
        }

        let game = &mut ctx.accounts.game_state;
        let new_fee = game.claim_throne(ledger, claimant_key, amount, clock.unix_timestamp)?;

        // ── Transfer SOL claimant → vault ────────────────────────
        let ix = system_instruction::transfer(&claimant_key, &game_key, amount);
        invoke(&ix, &[claimant_ai, game_ai])?;

        let game_ai = game.to_account_info();
        ensure_solvent(game, &game_ai)?;

        msg!("Round {}: {} is king, next fee {}", game.game_round, claimant_key, new_fee);
        emit!(ThroneClaimed {
            claimant: claimant_key, amount, new_fee,
            round: game.game_round,
        });
        Ok(())
    }

    // ── Declare winner (permissionless once grace period elapsed) ─
    pub fn declare_winner(ctx: Context<DeclareWinner>) -> Result<()> {
        let now = Clock::get()?.unix_timestamp;
        let game = &mut ctx.accounts.game_state;
        let king = ctx.accounts.king_account.as_deref_mut();

        let payout = game.declare_winner(king, now)?;
        let winner = game.current_king.ok_or(KingError::NoKing)?;

        msg!("Round {} won by {}: {} lamports", game.game_round, winner, payout);
        emit!(WinnerDeclared { winner, payout, round: game.game_round });
        Ok(())
    }

    // ── Withdraw winnings (pull payment) ──────────────────────────
    pub fn withdraw_winnings(ctx: Context<WithdrawWinnings>) -> Result<()> {
        let player_key = ctx.accounts.player.key();
        let game = &mut ctx.accounts.game_state;

        // Ledger settled first; lamports move after
        let amount = game.take_winnings(&mut ctx.accounts.player_account, player_key)?;
        pay_out(game, &ctx.accounts.player.to_account_info(), amount)?;

        emit!(WinningsWithdrawn { player: player_key, amount });
        Ok(())
    }

    // ── Admin: Withdraw platform fees ─────────────────────────────
    pub fn withdraw_platform_fees(ctx: Context<AdminOnly>) -> Result<()> {
        let authority_key = ctx.accounts.authority.key();
        let game = &mut ctx.accounts.game_state;

        let amount = game.take_platform_fees(authority_key)?;
        pay_out(game, &ctx.accounts.authority.to_account_info(), amount)?;

        emit!(PlatformFeesWithdrawn { authority: authority_key, amount });
        Ok(())
    }

    // ── Reset (anyone, once the round has ended) ──────────────────
    pub fn reset_game(ctx: Context<ResetGame>) -> Result<()> {
        let new_round = ctx.accounts.game_state.reset_game()?;
        msg!("Round {} started", new_round);
        emit!(GameReset { new_round });
        Ok(())
    }

    // ── Admin: Parameter updates ──────────────────────────────────
    pub fn update_claim_fee_parameters(
        ctx: Context<AdminOnly>,
        new_initial_fee:         u64,
        new_increase_percentage: u8,
    ) -> Result<()> {
        let game = &mut ctx.accounts.game_state;
        let old = game.config;
        game.update_claim_fee_parameters(
            ctx.accounts.authority.key(), new_initial_fee, new_increase_percentage,
        )?;

        emit!(ParameterUpdated {
            parameter: GameParameter::InitialClaimFee,
            old_value: old.initial_claim_fee, new_value: new_initial_fee,
        });
        emit!(ParameterUpdated {
            parameter: GameParameter::FeeIncreasePercentage,
            old_value: old.fee_increase_percentage as u64,
            new_value: new_increase_percentage as u64,
        });
        Ok(())
    }

    pub fn update_grace_period(ctx: Context<AdminOnly>, new_period: i64) -> Result<()> {
        let old = ctx.accounts.game_state.update_grace_period(ctx.accounts.authority.key(), new_period)?;
        emit!(ParameterUpdated {
            parameter: GameParameter::GracePeriod,
            old_value: old as u64, new_value: new_period as u64,
        });
        Ok(())
    }

    pub fn update_platform_fee_percentage(ctx: Context<AdminOnly>, new_pct: u8) -> Result<()> {
        let old = ctx.accounts.game_state.update_platform_fee_percentage(ctx.accounts.authority.key(), new_pct)?;
        emit!(ParameterUpdated {
            parameter: GameParameter::PlatformFeePercentage,
            old_value: old as u64, new_value: new_pct as u64,
        });
        Ok(())
    }

    // ── Query: seconds left in the grace period (return data) ─────
    pub fn get_remaining_time(ctx: Context<ReadGame>) -> Result<u64> {
        let now = Clock::get()?.unix_timestamp;
        Ok(ctx.accounts.game_state.remaining_time(now))
    }
}

// ══════════════════════════════════════════════════════════════════════════
//  HELPERS
// ══════════════════════════════════════════════════════════════════════════

/// Lamports the vault holds beyond rent and every tracked balance.
/// Physical lamports (minus rent) must cover tracked; direct donations to the
/// PDA can only push physical above it.
pub fn vault_surplus(lamports: u64, rent_minimum: u64, tracked: u64) -> Result<u64> {
    lamports
        .saturating_sub(rent_minimum)
        .checked_sub(tracked)
        .ok_or_else(|| KingError::AccountingBroken.into())
}

fn ensure_solvent(game: &Account<GameState>, game_ai: &AccountInfo) -> Result<()> {
    let rent = Rent::get()?.minimum_balance(game_ai.data_len());
    vault_surplus(game_ai.lamports(), rent, game.total_held()?)?;
    Ok(())
}

/// Move `amount` lamports out of the vault. Callers must have already
/// debited the ledger, so `amount` has to come out of the surplus.
fn pay_out(game: &Account<GameState>, recipient: &AccountInfo, amount: u64) -> Result<()> {
    let game_ai = game.to_account_info();
    let rent = Rent::get()?.minimum_balance(game_ai.data_len());
    let surplus = vault_surplus(game_ai.lamports(), rent, game.total_held()?)?;
    require!(surplus >= amount, KingError::AccountingBroken);

    **game_ai.try_borrow_mut_lamports()? -= amount;
    **recipient.try_borrow_mut_lamports()? += amount;

    ensure_solvent(game, &game_ai)
}

// ══════════════════════════════════════════════════════════════════════════
//  ACCOUNTS
// ══════════════════════════════════════════════════════════════════════════

#[derive(Accounts)]
pub struct Initialize<'info> {
    #[account(init, payer = authority, space = 8 + GameState::LEN,
              seeds = [GAME_SEED], bump)]
    pub game_state: Account<'info, GameState>,
    #[account(mut)] pub authority: Signer<'info>,
    pub system_program: Program<'info, System>,
}

#[derive(Accounts)]
pub struct ClaimThrone<'info> {
    #[account(mut)] pub claimant: Signer<'info>,
    #[account(mut, seeds = [GAME_SEED], bump = game_state.bump)]
    pub game_state: Account<'info, GameState>,
    #[account(init_if_needed, payer = claimant, space = 8 + PlayerAccount::LEN,
              seeds = [PLAYER_SEED, claimant.key().as_ref()], bump)]
    pub player_account: Account<'info, PlayerAccount>,
    pub system_program: Program<'info, System>,
}

/// Permissionless: anyone can close out a round whose grace period expired.
#[derive(Accounts)]
pub struct DeclareWinner<'info> {
    #[account(mut, seeds = [GAME_SEED], bump = game_state.bump)]
    pub game_state: Account<'info, GameState>,
    /// Ledger entry of the current king; may be omitted while nobody holds
    /// the throne. Only this program creates PlayerAccounts, each at its
    /// wallet's PDA, so matching `player` against current_king pins it.
    #[account(mut)]
    pub king_account: Option<Account<'info, PlayerAccount>>,
    pub caller: Signer<'info>,
}

#[derive(Accounts)]
pub struct WithdrawWinnings<'info> {
    #[account(mut, seeds = [GAME_SEED], bump = game_state.bump)]
    pub game_state: Account<'info, GameState>,
    #[account(mut, seeds = [PLAYER_SEED, player.key().as_ref()],
              bump = player_account.bump)]
    pub player_account: Account<'info, PlayerAccount>,
    #[account(mut)] pub player: Signer<'info>,
}

#[derive(Accounts)]
pub struct ResetGame<'info> {
    #[account(mut, seeds = [GAME_SEED], bump = game_state.bump)]
    pub game_state: Account<'info, GameState>,
    pub caller: Signer<'info>,
}

#[derive(Accounts)]
pub struct AdminOnly<'info> {
    #[account(mut, seeds = [GAME_SEED], bump = game_state.bump,
              has_one = authority @ KingError::Unauthorized)]
    pub game_state: Account<'info, GameState>,
    #[account(mut)] pub authority: Signer<'info>,
}

#[derive(Accounts)]
pub struct ReadGame<'info> {
    #[account(seeds = [GAME_SEED], bump = game_state.bump)]
    pub game_state: Account<'info, GameState>,
}

// ══════════════════════════════════════════════════════════════════════════
//  ERRORS & EVENTS
// ══════════════════════════════════════════════════════════════════════════

#[error_code]
pub enum KingError {
    #[msg("Caller is already the king")]
    AlreadyKing,
    #[msg("Payment below the current claim fee")]
    InsufficientFee,
    #[msg("Round has ended, reset the game first")]
    GameEnded,
    #[msg("No king has claimed the throne this round")]
    NoKing,
    #[msg("Grace period has not expired yet")]
    GracePeriodActive,
    #[msg("Nothing to withdraw")]
    NothingToWithdraw,
    #[msg("Caller is not the game authority")]
    Unauthorized,
    #[msg("Round has not ended yet")]
    GameNotEnded,
    #[msg("Claim fee must be greater than zero")]
    InvalidFee,
    #[msg("Percentage must be between 0 and 100")]
    InvalidPercentage,
    #[msg("Grace period must be between 1s and 365 days")]
    InvalidGracePeriod,
    #[msg("Claim fee escalation overflow")]
    FeeOverflow,
    #[msg("Arithmetic overflow")]
    MathOverflow,
    #[msg("Player account does not belong to this wallet")]
    PlayerMismatch,
    #[msg("Clock timestamp must be positive")]
    InvalidClock,
    #[msg("Accounting invariant violated")]
    AccountingBroken,
}

#[derive(AnchorSerialize, AnchorDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameParameter {
    InitialClaimFee,
    FeeIncreasePercentage,
    PlatformFeePercentage,
    GracePeriod,
}

#[event] pub struct GameInitialized       { pub authority: Pubkey, pub round: u64 }
/// `new_fee` is the fee the engine stored. A non-zero increase always adds at
/// least one lamport, so clients must read it here instead of recomputing
/// `fee + fee * pct / 100`.
#[event] pub struct ThroneClaimed         { pub claimant: Pubkey, pub amount: u64, pub new_fee: u64, pub round: u64 }
#[event] pub struct WinnerDeclared        { pub winner: Pubkey, pub payout: u64, pub round: u64 }
#[event] pub struct WinningsWithdrawn     { pub player: Pubkey, pub amount: u64 }
#[event] pub struct PlatformFeesWithdrawn { pub authority: Pubkey, pub amount: u64 }
#[event] pub struct GameReset             { pub new_round: u64 }
#[event] pub struct ParameterUpdated      { pub parameter: GameParameter, pub old_value: u64, pub new_value: u64 }
