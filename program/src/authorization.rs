//! Co-signature requirements for pool interactions.

use {
    crate::error::AttentionPoolError,
    num_derive::FromPrimitive,
    num_traits::FromPrimitive,
    solana_program::{entrypoint::ProgramResult, program_error::ProgramError, pubkey::Pubkey},
};

/// Who, besides the interacting user, must sign an interaction with a pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, FromPrimitive)]
#[repr(u8)]
pub enum CoSignerPolicy {
    /// The user's signature alone is enough.
    Disabled = 0,
    /// The pool authority must co-sign.
    PoolAuthority = 1,
}

impl TryFrom<u8> for CoSignerPolicy {
    type Error = ProgramError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::from_u8(value).ok_or_else(|| AttentionPoolError::InvalidCoSignerPolicy.into())
    }
}

impl CoSignerPolicy {
    /// The signatures this policy requires from a pool's designated signers.
    pub fn requirement<'a>(&self, pool_authority: &'a Pubkey) -> SignerRequirement<'a> {
        match self {
            Self::Disabled => SignerRequirement::new(0, &[]),
            Self::PoolAuthority => SignerRequirement::new(1, std::slice::from_ref(pool_authority)),
        }
    }

    /// Whether the pool authority's account must be marked as a signer.
    pub fn requires_pool_authority(&self) -> bool {
        matches!(self, Self::PoolAuthority)
    }
}

/// An m-of-n signature threshold over a set of designated keys.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SignerRequirement<'a> {
    threshold: usize,
    designated: &'a [Pubkey],
}

impl<'a> SignerRequirement<'a> {
    pub fn new(threshold: usize, designated: &'a [Pubkey]) -> Self {
        Self {
            threshold,
            designated,
        }
    }

    /// Counts the designated keys present in `signers`, once each, and fails
    /// with `MissingCoSignature` below the threshold.
    pub fn verify(&self, signers: &[&Pubkey]) -> ProgramResult {
        let signed = self
            .designated
            .iter()
            .enumerate()
            .filter(|&(i, key)| !self.designated[..i].contains(key))
            .filter(|&(_, key)| signers.contains(&key))
            .count();
        if signed < self.threshold {
            return Err(AttentionPoolError::MissingCoSignature.into());
        }
        Ok(())
    }
}
