//! Program state types.
//!
//! Every account is located by address derivation alone:
//!
//! ```text
//!
//! pool config     "config"      + mint + pool_name
//! token vault     "token_vault" + mint + pool_config
//! fee vault       "fee_vault"   + pool_config
//! proof account   "proof_acc"   + user + mint
//! mint            "mint"        + token_name      (pools that mint their token)
//! ```
//!
//! A pool pays `reward_amount` tokens out of its token vault for every
//! attention proof and collects `pool_fee` lamports into its fee vault. The
//! fee vault's balance is its lamports; it carries no balance field.
//!
//! Each user has a single proof account per mint, which gates how often that
//! user can be rewarded. Proof accounts hold cumulative counters only, so
//! that after every successful proof:
//!
//! ```text
//! total_rewards == reward_amount * total_proofs
//! ```

use {
    crate::{
        authorization::CoSignerPolicy,
        constants::{MAX_NAME_LENGTH, MAX_SYMBOL_LENGTH, MAX_URI_LENGTH},
        error::AttentionPoolError,
    },
    bytemuck::{Pod, Zeroable},
    shank::ShankAccount,
    solana_program::{
        clock::UnixTimestamp, entrypoint::ProgramResult, program_error::ProgramError,
        pubkey::Pubkey,
    },
};

/// The seed prefix (`"config"`) in bytes used to derive the address of a
/// pool config account.
/// Seeds: `"config" + mint_address + pool_name`.
pub const SEED_PREFIX_POOL_CONFIG: &[u8] = b"config";
/// The seed prefix (`"token_vault"`) in bytes used to derive the address of
/// a pool's token vault.
/// Seeds: `"token_vault" + mint_address + pool_config_address`.
pub const SEED_PREFIX_TOKEN_VAULT: &[u8] = b"token_vault";
/// The seed prefix (`"fee_vault"`) in bytes used to derive the address of a
/// pool's fee vault.
/// Seeds: `"fee_vault" + pool_config_address`.
pub const SEED_PREFIX_FEE_VAULT: &[u8] = b"fee_vault";
/// The seed prefix (`"proof_acc"`) in bytes used to derive the address of a
/// user's proof account.
/// Seeds: `"proof_acc" + user_address + mint_address`.
pub const SEED_PREFIX_PROOF: &[u8] = b"proof_acc";
/// The seed prefix (`"mint"`) in bytes used to derive the address of a mint
/// created by the program.
/// Seeds: `"mint" + token_name`.
pub const SEED_PREFIX_MINT: &[u8] = b"mint";

/// Derive the address of a pool config account.
pub fn get_pool_config_address(mint_address: &Pubkey, pool_name: &str, program_id: &Pubkey) -> Pubkey {
    get_pool_config_address_and_bump_seed(mint_address, pool_name.as_bytes(), program_id).0
}

/// Derive the address of a pool config account, with bump seed.
pub fn get_pool_config_address_and_bump_seed(
    mint_address: &Pubkey,
    pool_name: &[u8],
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &collect_pool_config_seeds(mint_address, pool_name),
        program_id,
    )
}

pub(crate) fn collect_pool_config_seeds<'a>(
    mint_address: &'a Pubkey,
    pool_name: &'a [u8],
) -> [&'a [u8]; 3] {
    [SEED_PREFIX_POOL_CONFIG, mint_address.as_ref(), pool_name]
}

pub(crate) fn collect_pool_config_signer_seeds<'a>(
    mint_address: &'a Pubkey,
    pool_name: &'a [u8],
    bump_seed: &'a [u8],
) -> [&'a [u8]; 4] {
    [
        SEED_PREFIX_POOL_CONFIG,
        mint_address.as_ref(),
        pool_name,
        bump_seed,
    ]
}

/// Derive the address of a pool's token vault.
pub fn get_token_vault_address(
    mint_address: &Pubkey,
    pool_config_address: &Pubkey,
    program_id: &Pubkey,
) -> Pubkey {
    get_token_vault_address_and_bump_seed(mint_address, pool_config_address, program_id).0
}

/// Derive the address of a pool's token vault, with bump seed.
pub fn get_token_vault_address_and_bump_seed(
    mint_address: &Pubkey,
    pool_config_address: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &collect_token_vault_seeds(mint_address, pool_config_address),
        program_id,
    )
}

pub(crate) fn collect_token_vault_seeds<'a>(
    mint_address: &'a Pubkey,
    pool_config_address: &'a Pubkey,
) -> [&'a [u8]; 3] {
    [
        SEED_PREFIX_TOKEN_VAULT,
        mint_address.as_ref(),
        pool_config_address.as_ref(),
    ]
}

pub(crate) fn collect_token_vault_signer_seeds<'a>(
    mint_address: &'a Pubkey,
    pool_config_address: &'a Pubkey,
    bump_seed: &'a [u8],
) -> [&'a [u8]; 4] {
    [
        SEED_PREFIX_TOKEN_VAULT,
        mint_address.as_ref(),
        pool_config_address.as_ref(),
        bump_seed,
    ]
}

/// Derive the address of a pool's fee vault.
pub fn get_fee_vault_address(pool_config_address: &Pubkey, program_id: &Pubkey) -> Pubkey {
    get_fee_vault_address_and_bump_seed(pool_config_address, program_id).0
}

/// Derive the address of a pool's fee vault, with bump seed.
pub fn get_fee_vault_address_and_bump_seed(
    pool_config_address: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(&collect_fee_vault_seeds(pool_config_address), program_id)
}

pub(crate) fn collect_fee_vault_seeds(pool_config_address: &Pubkey) -> [&[u8]; 2] {
    [SEED_PREFIX_FEE_VAULT, pool_config_address.as_ref()]
}

pub(crate) fn collect_fee_vault_signer_seeds<'a>(
    pool_config_address: &'a Pubkey,
    bump_seed: &'a [u8],
) -> [&'a [u8]; 3] {
    [SEED_PREFIX_FEE_VAULT, pool_config_address.as_ref(), bump_seed]
}

/// Derive the address of a user's proof account.
pub fn get_proof_address(user_address: &Pubkey, mint_address: &Pubkey, program_id: &Pubkey) -> Pubkey {
    get_proof_address_and_bump_seed(user_address, mint_address, program_id).0
}

/// Derive the address of a user's proof account, with bump seed.
pub fn get_proof_address_and_bump_seed(
    user_address: &Pubkey,
    mint_address: &Pubkey,
    program_id: &Pubkey,
) -> (Pubkey, u8) {
    Pubkey::find_program_address(
        &collect_proof_seeds(user_address, mint_address),
        program_id,
    )
}

pub(crate) fn collect_proof_seeds<'a>(
    user_address: &'a Pubkey,
    mint_address: &'a Pubkey,
) -> [&'a [u8]; 3] {
    [SEED_PREFIX_PROOF, user_address.as_ref(), mint_address.as_ref()]
}

pub(crate) fn collect_proof_signer_seeds<'a>(
    user_address: &'a Pubkey,
    mint_address: &'a Pubkey,
    bump_seed: &'a [u8],
) -> [&'a [u8]; 4] {
    [
        SEED_PREFIX_PROOF,
        user_address.as_ref(),
        mint_address.as_ref(),
        bump_seed,
    ]
}

/// Derive the address of a mint created by the program.
pub fn get_mint_address(token_name: &str, program_id: &Pubkey) -> Pubkey {
    get_mint_address_and_bump_seed(token_name.as_bytes(), program_id).0
}

/// Derive the address of a mint created by the program, with bump seed.
pub fn get_mint_address_and_bump_seed(token_name: &[u8], program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&collect_mint_seeds(token_name), program_id)
}

pub(crate) fn collect_mint_seeds(token_name: &[u8]) -> [&[u8]; 2] {
    [SEED_PREFIX_MINT, token_name]
}

pub(crate) fn collect_mint_signer_seeds<'a>(
    token_name: &'a [u8],
    bump_seed: &'a [u8],
) -> [&'a [u8]; 3] {
    [SEED_PREFIX_MINT, token_name, bump_seed]
}

/// The addresses of every account a pool owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolAddresses {
    pub mint: Pubkey,
    pub pool_config: Pubkey,
    pub token_vault: Pubkey,
    pub fee_vault: Pubkey,
}

impl PoolAddresses {
    /// Derives the addresses of the pool named `pool_name` for a mint.
    pub fn derive(mint_address: &Pubkey, pool_name: &str, program_id: &Pubkey) -> Self {
        let pool_config = get_pool_config_address(mint_address, pool_name, program_id);
        Self {
            mint: *mint_address,
            pool_config,
            token_vault: get_token_vault_address(mint_address, &pool_config, program_id),
            fee_vault: get_fee_vault_address(&pool_config, program_id),
        }
    }
}

/// A pool or token name that fits the fixed on-chain name buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoundedName {
    bytes: [u8; MAX_NAME_LENGTH],
    len: u8,
}

impl BoundedName {
    /// Validates `name`, rejecting anything longer than `MAX_NAME_LENGTH`
    /// bytes.
    pub fn new(name: &str) -> Result<Self, ProgramError> {
        let len = name.len();
        if len > MAX_NAME_LENGTH {
            return Err(AttentionPoolError::StringTooLong.into());
        }
        let mut bytes = [0; MAX_NAME_LENGTH];
        bytes[..len].copy_from_slice(name.as_bytes());
        Ok(Self {
            bytes,
            len: len as u8,
        })
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }
}

/// Checks the symbol and URI of a freshly minted token against their length
/// limits.
pub fn check_token_metadata(symbol: &str, uri: &str) -> ProgramResult {
    if symbol.len() > MAX_SYMBOL_LENGTH || uri.len() > MAX_URI_LENGTH {
        return Err(AttentionPoolError::StringTooLong.into());
    }
    Ok(())
}

/// The reward terms of a pool, fixed when the pool is created.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolTerms {
    /// Tokens paid out per attention proof.
    pub reward_amount: u64,
    /// Lamports collected into the fee vault per attention proof.
    pub pool_fee: u64,
    /// Minimum number of seconds between two proofs by the same user.
    pub timeout_seconds: u32,
    /// Tokens seeded into the token vault.
    pub total_supply: u64,
    /// Whether the pool authority must co-sign interactions.
    pub co_signer_policy: CoSignerPolicy,
}

impl PoolTerms {
    /// Ensures the pool can pay at least one reward out of its supply.
    pub fn validate(&self) -> ProgramResult {
        if self.reward_amount == 0
            || self.total_supply == 0
            || self.reward_amount > self.total_supply
        {
            return Err(AttentionPoolError::InvalidAmount.into());
        }
        Ok(())
    }
}

/// The configuration of one reward pool.
///
/// Everything but the pool-wide counters is fixed at creation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, ShankAccount, Zeroable)]
#[repr(C)]
pub struct PoolConfig {
    /// May withdraw collected fees and, depending on the co-signer policy,
    /// must co-sign every interaction.
    pub authority: Pubkey,
    /// The reward token mint.
    pub mint: Pubkey,
    /// The token account holding the undistributed reward supply.
    pub token_vault: Pubkey,
    /// The account collecting pool fees.
    pub fee_vault: Pubkey,
    /// Tokens paid out per attention proof.
    pub reward_amount: u64,
    /// Lamports collected into the fee vault per attention proof.
    pub pool_fee: u64,
    /// Tokens seeded into the token vault at creation.
    pub total_supply: u64,
    /// Number of proofs the pool has rewarded.
    pub total_proofs: u64,
    /// Tokens the pool has paid out.
    pub total_rewards_paid: u64,
    pool_name: [u8; 32],
    /// Minimum number of seconds between two proofs by the same user.
    pub timeout_seconds: u32,
    co_signer_policy: u8,
    pool_name_len: u8,
    /// Bump seed of the pool config address.
    pub bump_seed: u8,
    _padding: u8,
}

impl PoolConfig {
    /// Creates a new [PoolConfig](struct.PoolConfig.html) instance.
    pub fn new(
        authority: &Pubkey,
        mint: &Pubkey,
        token_vault: &Pubkey,
        fee_vault: &Pubkey,
        pool_name: &BoundedName,
        terms: &PoolTerms,
        bump_seed: u8,
    ) -> Self {
        Self {
            authority: *authority,
            mint: *mint,
            token_vault: *token_vault,
            fee_vault: *fee_vault,
            reward_amount: terms.reward_amount,
            pool_fee: terms.pool_fee,
            total_supply: terms.total_supply,
            total_proofs: 0,
            total_rewards_paid: 0,
            pool_name: pool_name.bytes,
            timeout_seconds: terms.timeout_seconds,
            co_signer_policy: terms.co_signer_policy as u8,
            pool_name_len: pool_name.len,
            bump_seed,
            _padding: 0,
        }
    }

    pub fn pool_name(&self) -> &[u8] {
        let len = (self.pool_name_len as usize).min(MAX_NAME_LENGTH);
        &self.pool_name[..len]
    }

    pub fn co_signer_policy(&self) -> Result<CoSignerPolicy, ProgramError> {
        CoSignerPolicy::try_from(self.co_signer_policy)
    }

    /// Records one reward payout in the pool-wide counters.
    pub fn record_payout(&mut self) -> ProgramResult {
        let total_proofs = self
            .total_proofs
            .checked_add(1)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        let total_rewards_paid = self
            .total_rewards_paid
            .checked_add(self.reward_amount)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        self.total_proofs = total_proofs;
        self.total_rewards_paid = total_rewards_paid;
        Ok(())
    }
}

/// Back-reference from a fee vault to its pool.
///
/// Collected fees are the vault's lamports in excess of its rent-exempt
/// minimum.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, ShankAccount, Zeroable)]
#[repr(C)]
pub struct FeeVault {
    /// The pool config this vault collects fees for.
    pub pool_config: Pubkey,
}

impl FeeVault {
    /// Creates a new [FeeVault](struct.FeeVault.html) instance.
    pub fn new(pool_config: &Pubkey) -> Self {
        Self {
            pool_config: *pool_config,
        }
    }

    /// Returns the vault's balance after withdrawing `amount` lamports.
    ///
    /// The balance can never drop below the rent-exempt minimum.
    pub fn checked_withdrawal(
        balance: u64,
        rent_exempt_lamports: u64,
        amount: u64,
    ) -> Result<u64, ProgramError> {
        if amount == 0 {
            return Err(AttentionPoolError::InvalidAmount.into());
        }
        let withdrawable = balance.saturating_sub(rent_exempt_lamports);
        if amount > withdrawable {
            return Err(AttentionPoolError::InsufficientFeeVaultBalance.into());
        }
        balance
            .checked_sub(amount)
            .ok_or(ProgramError::ArithmeticOverflow)
    }
}

/// A user's attention history for one mint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, ShankAccount, Zeroable)]
#[repr(C)]
pub struct ProofAccount {
    /// The user this record belongs to.
    pub authority: Pubkey,
    /// The reward token mint.
    pub mint: Pubkey,
    /// The user's token account receiving rewards.
    pub reward_vault: Pubkey,
    /// Number of rewarded proofs.
    pub total_proofs: u64,
    /// Tokens received across all proofs.
    pub total_rewards: u64,
    /// Ledger timestamp of the last rewarded proof, zero before the first.
    pub last_proof_at: UnixTimestamp,
}

impl ProofAccount {
    /// Creates a new [ProofAccount](struct.ProofAccount.html) instance with
    /// no proofs.
    pub fn new(authority: &Pubkey, mint: &Pubkey, reward_vault: &Pubkey) -> Self {
        Self {
            authority: *authority,
            mint: *mint,
            reward_vault: *reward_vault,
            total_proofs: 0,
            total_rewards: 0,
            last_proof_at: 0,
        }
    }

    /// Fails with `CooldownNotMet` unless at least `timeout_seconds` have
    /// passed since the last proof.
    pub fn check_cooldown(&self, now: UnixTimestamp, timeout_seconds: u32) -> ProgramResult {
        if self.total_proofs == 0 {
            return Ok(());
        }
        let elapsed = now.checked_sub(self.last_proof_at);
        match elapsed {
            Some(elapsed) if elapsed >= i64::from(timeout_seconds) => Ok(()),
            _ => Err(AttentionPoolError::CooldownNotMet.into()),
        }
    }

    /// Records a rewarded proof at `now`.
    ///
    /// Leaves the record untouched on error.
    pub fn prove(
        &mut self,
        now: UnixTimestamp,
        timeout_seconds: u32,
        reward_amount: u64,
    ) -> ProgramResult {
        self.check_cooldown(now, timeout_seconds)?;

        let total_proofs = self
            .total_proofs
            .checked_add(1)
            .ok_or(ProgramError::ArithmeticOverflow)?;
        let total_rewards = self
            .total_rewards
            .checked_add(reward_amount)
            .ok_or(ProgramError::ArithmeticOverflow)?;

        self.total_proofs = total_proofs;
        self.total_rewards = total_rewards;
        self.last_proof_at = now;
        Ok(())
    }
}

/// A proof account slot, resolved once per instruction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ProofRecord {
    /// No proof account exists at the derived address yet.
    Uninitialized,
    /// An existing proof account.
    Active(ProofAccount),
}
