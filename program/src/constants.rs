//! Program constants and protocol fee configuration.

use solana_program::pubkey::Pubkey;

/// Maximum length, in bytes, of pool and token names.
///
/// Names are used as address seeds, so this is also the runtime's seed
/// length limit.
pub const MAX_NAME_LENGTH: usize = 32;

/// Maximum length, in bytes, of a minted token's symbol.
pub const MAX_SYMBOL_LENGTH: usize = 10;

/// Maximum length, in bytes, of a minted token's metadata URI.
pub const MAX_URI_LENGTH: usize = 1000;

/// Lamports charged by the protocol whenever a pool or a proof account is
/// created.
pub const ACCOUNT_CREATION_FEE: u64 = 1_500_000;

/// Lamports charged by the protocol on every successful interaction, on top
/// of the pool's own fee.
pub const INTERACTION_FEE: u64 = 150_000;

/// The protocol fee collector.
pub mod protocol_fee_collector {
    solana_program::declare_id!("CLiCKaKS3DZUCr9WazTnXSM1Tky7kgrKy6tDQ2tSeZ9P");
}

/// Protocol-level fees, distinct from the per-pool fee collected into each
/// pool's fee vault.
///
/// Passed explicitly into the processor rather than read from globals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolFees {
    /// Account receiving all protocol fees.
    pub collector: Pubkey,
    /// Charged when a pool or a proof account is created.
    pub account_creation_fee: u64,
    /// Charged on every interaction.
    pub interaction_fee: u64,
}

impl ProtocolFees {
    /// The fees charged by the deployed program.
    pub const CANONICAL: Self = Self {
        collector: protocol_fee_collector::ID,
        account_creation_fee: ACCOUNT_CREATION_FEE,
        interaction_fee: INTERACTION_FEE,
    };
}
