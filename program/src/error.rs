#![allow(non_local_definitions)]
//! Program error types.
use {
    num_derive::FromPrimitive,
    solana_program::{
        decode_error::DecodeError,
        msg,
        program_error::{PrintProgramError, ProgramError},
    },
    thiserror::Error,
};

/// Errors that can be returned by the Attention Pool program.
#[derive(Error, Clone, Debug, Eq, PartialEq, FromPrimitive)]
pub enum AttentionPoolError {
    /// 0 - A pool-owned account does not belong to the provided pool.
    #[error("Invalid pool token account")]
    InvalidTokenPoolAccount,
    /// 1 - Incorrect pool config address.
    #[error("Invalid pool address")]
    InvalidPoolAddress,
    /// 2 - The pool cooldown has not elapsed since the last proof.
    #[error("Cooldown not met")]
    CooldownNotMet,
    /// 3 - Reserved for challenge/response proofs.
    #[error("Invalid hash provided")]
    InvalidHash,
    /// 4 - Incorrect protocol fee collector account.
    #[error("Invalid protocol fee account")]
    InvalidProtocolFeeAccount,
    /// 5 - Signer is not the pool authority.
    #[error("Withdraw not approved")]
    WithdrawNotApproved,
    /// 6 - Withdraw amount exceeds the withdrawable fee vault balance.
    #[error("Insufficient fee vault balance")]
    InsufficientFeeVaultBalance,
    /// 7 - Name does not fit the fixed on-chain buffer.
    #[error("Input string too long")]
    StringTooLong,
    /// 8 - Zero or out-of-range amount.
    #[error("Invalid amount")]
    InvalidAmount,
    /// 9 - Zero decimals, or decimals not matching the mint.
    #[error("Invalid token decimals")]
    InvalidDecimals,
    /// 10 - Funding token account holds less than the total supply.
    #[error("Insufficient funding account balance")]
    InsufficientFundingBalance,
    /// 11 - Token vault holds less than one reward.
    #[error("Pool token supply exhausted")]
    PoolSupplyExhausted,
    /// 12 - Incorrect proof account address.
    #[error("Incorrect proof account address")]
    IncorrectProofAccountAddress,
    /// 13 - Reward vault is not the user's recorded reward vault.
    #[error("Incorrect reward vault")]
    IncorrectRewardVault,
    /// 14 - Incorrect mint address.
    #[error("Incorrect mint address")]
    IncorrectMintAddress,
    /// 15 - The pool requires a co-signature that was not provided.
    #[error("Missing required co-signature")]
    MissingCoSignature,
    /// 16 - Token account mint mismatch.
    #[error("Token account mint mismatch")]
    TokenAccountMintMismatch,
    /// 17 - Token account owner mismatch.
    #[error("Token account owner mismatch")]
    TokenAccountOwnerMismatch,
    /// 18 - Unknown co-signer policy.
    #[error("Invalid co-signer policy")]
    InvalidCoSignerPolicy,
}

impl PrintProgramError for AttentionPoolError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}

impl From<AttentionPoolError> for ProgramError {
    fn from(e: AttentionPoolError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl<T> DecodeError<T> for AttentionPoolError {
    fn type_of() -> &'static str {
        "AttentionPoolError"
    }
}
