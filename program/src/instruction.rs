//! Program instruction types.

use {
    crate::{
        authorization::CoSignerPolicy,
        constants::protocol_fee_collector,
        state::{get_proof_address, PoolAddresses, PoolTerms},
    },
    shank::ShankInstruction,
    solana_program::{
        instruction::{AccountMeta, Instruction},
        program_error::ProgramError,
        pubkey::Pubkey,
        system_program,
    },
    spl_associated_token_account::get_associated_token_address_with_program_id,
};

/// Arguments shared by both pool initializers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPoolArgs {
    /// Name of the pool, unique per mint. At most 32 bytes.
    pub pool_name: String,
    /// Decimals of the reward token. Must be nonzero.
    pub token_decimals: u8,
    /// Reward terms of the pool.
    pub terms: PoolTerms,
}

/// Arguments for pools that create their own mint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MintedTokenPoolArgs {
    /// Name the mint address is derived from, also written as the token's
    /// metadata name. At most 32 bytes.
    pub token_name: String,
    /// Token symbol. At most 10 bytes.
    pub symbol: String,
    /// URI of the token's off-chain metadata. At most 1000 bytes.
    pub uri: String,
    pub pool: TokenPoolArgs,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawFeesArgs {
    pub pool_name: String,
    /// Lamports to withdraw.
    pub amount: u64,
}

/// Instructions supported by the Attention Pool program.
#[rustfmt::skip]
#[derive(Clone, Debug, PartialEq, ShankInstruction)]
pub enum AttentionPoolInstruction {
    /// Creates a reward pool for an existing Token-2022 mint and seeds its
    /// token vault from the authority's token account.
    ///
    /// This instruction will:
    ///
    /// - Initialize the pool config account.
    /// - Initialize the pool's token vault and fee vault.
    /// - Transfer `total_supply` tokens into the token vault.
    /// - Pay the protocol account creation fee.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w, s]` Pool authority.
    /// 1. `[w]` Authority token account funding the pool.
    /// 2. `[ ]` Token mint.
    /// 3. `[w]` Pool config account.
    /// 4. `[w]` Token vault.
    /// 5. `[w]` Fee vault.
    /// 6. `[w]` Protocol fee collector.
    /// 7. `[ ]` Token program.
    /// 8. `[ ]` System program.
    #[account(
        0,
        writable,
        signer,
        name = "authority",
        desc = "Pool authority.",
    )]
    #[account(
        1,
        writable,
        name = "funding_token_account",
        desc = "Authority token account funding the pool.",
    )]
    #[account(
        2,
        name = "mint",
        desc = "Token mint.",
    )]
    #[account(
        3,
        writable,
        name = "pool_config",
        desc = "Pool config account.",
    )]
    #[account(
        4,
        writable,
        name = "token_vault",
        desc = "Token vault.",
    )]
    #[account(
        5,
        writable,
        name = "fee_vault",
        desc = "Fee vault.",
    )]
    #[account(
        6,
        writable,
        name = "protocol_fee_collector",
        desc = "Protocol fee collector.",
    )]
    #[account(
        7,
        name = "token_program",
        desc = "Token program.",
    )]
    #[account(
        8,
        name = "system_program",
        desc = "System program.",
    )]
    InitializeTokenPool(TokenPoolArgs),
    /// Creates a reward pool together with a fresh mint, and mints
    /// `total_supply` tokens straight into its token vault.
    ///
    /// The mint's address is derived from the token name and the mint is
    /// its own mint authority. Its name, symbol and URI are stored on the
    /// mint through the Token-2022 metadata extensions.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w, s]` Pool authority.
    /// 1. `[w]` Token mint.
    /// 2. `[w]` Pool config account.
    /// 3. `[w]` Token vault.
    /// 4. `[w]` Fee vault.
    /// 5. `[w]` Protocol fee collector.
    /// 6. `[ ]` Token program.
    /// 7. `[ ]` System program.
    #[account(
        0,
        writable,
        signer,
        name = "authority",
        desc = "Pool authority.",
    )]
    #[account(
        1,
        writable,
        name = "mint",
        desc = "Token mint.",
    )]
    #[account(
        2,
        writable,
        name = "pool_config",
        desc = "Pool config account.",
    )]
    #[account(
        3,
        writable,
        name = "token_vault",
        desc = "Token vault.",
    )]
    #[account(
        4,
        writable,
        name = "fee_vault",
        desc = "Fee vault.",
    )]
    #[account(
        5,
        writable,
        name = "protocol_fee_collector",
        desc = "Protocol fee collector.",
    )]
    #[account(
        6,
        name = "token_program",
        desc = "Token program.",
    )]
    #[account(
        7,
        name = "system_program",
        desc = "System program.",
    )]
    InitializeMintedTokenPool(MintedTokenPoolArgs),
    /// Creates a user's proof account for a mint, and the user's associated
    /// token account if it does not exist yet.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w, s]` User.
    /// 1. `[w]` Proof account.
    /// 2. `[ ]` Token mint.
    /// 3. `[w]` Reward vault (the user's associated token account).
    /// 4. `[w]` Protocol fee collector.
    /// 5. `[ ]` Token program.
    /// 6. `[ ]` Associated token program.
    /// 7. `[ ]` System program.
    #[account(
        0,
        writable,
        signer,
        name = "user",
        desc = "User.",
    )]
    #[account(
        1,
        writable,
        name = "proof",
        desc = "Proof account.",
    )]
    #[account(
        2,
        name = "mint",
        desc = "Token mint.",
    )]
    #[account(
        3,
        writable,
        name = "reward_vault",
        desc = "Reward vault.",
    )]
    #[account(
        4,
        writable,
        name = "protocol_fee_collector",
        desc = "Protocol fee collector.",
    )]
    #[account(
        5,
        name = "token_program",
        desc = "Token program.",
    )]
    #[account(
        6,
        name = "associated_token_program",
        desc = "Associated token program.",
    )]
    #[account(
        7,
        name = "system_program",
        desc = "System program.",
    )]
    InitializeProof,
    /// Records an attention proof against an existing proof account and pays
    /// the pool's reward.
    ///
    /// This instruction will:
    ///
    /// - Enforce the pool's cooldown.
    /// - Transfer the pool fee to the fee vault and the interaction fee to
    ///   the protocol fee collector.
    /// - Transfer `reward_amount` tokens from the token vault to the reward
    ///   vault.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w, s]` User.
    /// 1. `[s?]` Pool authority, signer if the pool requires a co-signature.
    /// 2. `[w]` Proof account.
    /// 3. `[ ]` Token mint.
    /// 4. `[w]` Pool config account.
    /// 5. `[w]` Token vault.
    /// 6. `[w]` Fee vault.
    /// 7. `[w]` Reward vault.
    /// 8. `[w]` Protocol fee collector.
    /// 9. `[ ]` Token program.
    /// 10. `[ ]` System program.
    #[account(
        0,
        writable,
        signer,
        name = "user",
        desc = "User.",
    )]
    #[account(
        1,
        name = "pool_authority",
        desc = "Pool authority, signer if the pool requires a co-signature.",
    )]
    #[account(
        2,
        writable,
        name = "proof",
        desc = "Proof account.",
    )]
    #[account(
        3,
        name = "mint",
        desc = "Token mint.",
    )]
    #[account(
        4,
        writable,
        name = "pool_config",
        desc = "Pool config account.",
    )]
    #[account(
        5,
        writable,
        name = "token_vault",
        desc = "Token vault.",
    )]
    #[account(
        6,
        writable,
        name = "fee_vault",
        desc = "Fee vault.",
    )]
    #[account(
        7,
        writable,
        name = "reward_vault",
        desc = "Reward vault.",
    )]
    #[account(
        8,
        writable,
        name = "protocol_fee_collector",
        desc = "Protocol fee collector.",
    )]
    #[account(
        9,
        name = "token_program",
        desc = "Token program.",
    )]
    #[account(
        10,
        name = "system_program",
        desc = "System program.",
    )]
    Prove,
    /// Records an attention proof for the named pool, creating the user's
    /// proof account on first use.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0-10. Same as `Prove`.
    /// 11. `[ ]` Associated token program.
    #[account(
        0,
        writable,
        signer,
        name = "user",
        desc = "User.",
    )]
    #[account(
        1,
        name = "pool_authority",
        desc = "Pool authority, signer if the pool requires a co-signature.",
    )]
    #[account(
        2,
        writable,
        name = "proof",
        desc = "Proof account.",
    )]
    #[account(
        3,
        name = "mint",
        desc = "Token mint.",
    )]
    #[account(
        4,
        writable,
        name = "pool_config",
        desc = "Pool config account.",
    )]
    #[account(
        5,
        writable,
        name = "token_vault",
        desc = "Token vault.",
    )]
    #[account(
        6,
        writable,
        name = "fee_vault",
        desc = "Fee vault.",
    )]
    #[account(
        7,
        writable,
        name = "reward_vault",
        desc = "Reward vault.",
    )]
    #[account(
        8,
        writable,
        name = "protocol_fee_collector",
        desc = "Protocol fee collector.",
    )]
    #[account(
        9,
        name = "token_program",
        desc = "Token program.",
    )]
    #[account(
        10,
        name = "system_program",
        desc = "System program.",
    )]
    #[account(
        11,
        name = "associated_token_program",
        desc = "Associated token program.",
    )]
    Interact(String),
    /// Moves collected fees from a pool's fee vault to the pool authority.
    ///
    /// Accounts expected by this instruction:
    ///
    /// 0. `[w, s]` Pool authority.
    /// 1. `[ ]` Token mint.
    /// 2. `[ ]` Pool config account.
    /// 3. `[w]` Fee vault.
    #[account(
        0,
        writable,
        signer,
        name = "authority",
        desc = "Pool authority.",
    )]
    #[account(
        1,
        name = "mint",
        desc = "Token mint.",
    )]
    #[account(
        2,
        name = "pool_config",
        desc = "Pool config account.",
    )]
    #[account(
        3,
        writable,
        name = "fee_vault",
        desc = "Fee vault.",
    )]
    WithdrawFees(WithdrawFeesArgs),
}

impl AttentionPoolInstruction {
    /// Packs a
    /// [AttentionPoolInstruction](enum.AttentionPoolInstruction.html)
    /// into a byte buffer.
    pub fn pack(&self) -> Vec<u8> {
        let mut data = Vec::new();
        match self {
            AttentionPoolInstruction::InitializeTokenPool(args) => {
                data.push(0);
                pack_token_pool_args(&mut data, args);
            }
            AttentionPoolInstruction::InitializeMintedTokenPool(args) => {
                data.push(1);
                pack_string(&mut data, &args.token_name);
                pack_string(&mut data, &args.symbol);
                pack_string(&mut data, &args.uri);
                pack_token_pool_args(&mut data, &args.pool);
            }
            AttentionPoolInstruction::InitializeProof => data.push(2),
            AttentionPoolInstruction::Prove => data.push(3),
            AttentionPoolInstruction::Interact(pool_name) => {
                data.push(4);
                pack_string(&mut data, pool_name);
            }
            AttentionPoolInstruction::WithdrawFees(args) => {
                data.push(5);
                pack_string(&mut data, &args.pool_name);
                data.extend_from_slice(&args.amount.to_le_bytes());
            }
        }
        data
    }

    /// Unpacks a byte buffer into a
    /// [AttentionPoolInstruction](enum.AttentionPoolInstruction.html).
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        match input.split_first() {
            Some((&0, rest)) => {
                let (args, _) = unpack_token_pool_args(rest)?;
                Ok(AttentionPoolInstruction::InitializeTokenPool(args))
            }
            Some((&1, rest)) => {
                let (token_name, rest) = unpack_string(rest)?;
                let (symbol, rest) = unpack_string(rest)?;
                let (uri, rest) = unpack_string(rest)?;
                let (pool, _) = unpack_token_pool_args(rest)?;
                Ok(AttentionPoolInstruction::InitializeMintedTokenPool(
                    MintedTokenPoolArgs {
                        token_name,
                        symbol,
                        uri,
                        pool,
                    },
                ))
            }
            Some((&2, _)) => Ok(AttentionPoolInstruction::InitializeProof),
            Some((&3, _)) => Ok(AttentionPoolInstruction::Prove),
            Some((&4, rest)) => {
                let (pool_name, _) = unpack_string(rest)?;
                Ok(AttentionPoolInstruction::Interact(pool_name))
            }
            Some((&5, rest)) => {
                let (pool_name, rest) = unpack_string(rest)?;
                let (amount, _) = unpack_u64(rest)?;
                Ok(AttentionPoolInstruction::WithdrawFees(WithdrawFeesArgs {
                    pool_name,
                    amount,
                }))
            }
            _ => Err(ProgramError::InvalidInstructionData),
        }
    }
}

fn pack_string(data: &mut Vec<u8>, value: &str) {
    data.extend_from_slice(&(value.len() as u32).to_le_bytes());
    data.extend_from_slice(value.as_bytes());
}

fn pack_token_pool_args(data: &mut Vec<u8>, args: &TokenPoolArgs) {
    pack_string(data, &args.pool_name);
    data.extend_from_slice(&args.terms.reward_amount.to_le_bytes());
    data.extend_from_slice(&args.terms.pool_fee.to_le_bytes());
    data.extend_from_slice(&args.terms.timeout_seconds.to_le_bytes());
    data.push(args.token_decimals);
    data.extend_from_slice(&args.terms.total_supply.to_le_bytes());
    data.push(args.terms.co_signer_policy as u8);
}

fn unpack_u8(input: &[u8]) -> Result<(u8, &[u8]), ProgramError> {
    input
        .split_first()
        .map(|(value, rest)| (*value, rest))
        .ok_or(ProgramError::InvalidInstructionData)
}

fn unpack_u32(input: &[u8]) -> Result<(u32, &[u8]), ProgramError> {
    let value = input
        .get(..4)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)?;
    Ok((value, &input[4..]))
}

fn unpack_u64(input: &[u8]) -> Result<(u64, &[u8]), ProgramError> {
    let value = input
        .get(..8)
        .and_then(|bytes| bytes.try_into().ok())
        .map(u64::from_le_bytes)
        .ok_or(ProgramError::InvalidInstructionData)?;
    Ok((value, &input[8..]))
}

fn unpack_string(input: &[u8]) -> Result<(String, &[u8]), ProgramError> {
    let (len, rest) = unpack_u32(input)?;
    let len = len as usize;
    let value = rest
        .get(..len)
        .and_then(|bytes| std::str::from_utf8(bytes).ok())
        .ok_or(ProgramError::InvalidInstructionData)?;
    Ok((value.to_owned(), &rest[len..]))
}

fn unpack_token_pool_args(input: &[u8]) -> Result<(TokenPoolArgs, &[u8]), ProgramError> {
    let (pool_name, rest) = unpack_string(input)?;
    let (reward_amount, rest) = unpack_u64(rest)?;
    let (pool_fee, rest) = unpack_u64(rest)?;
    let (timeout_seconds, rest) = unpack_u32(rest)?;
    let (token_decimals, rest) = unpack_u8(rest)?;
    let (total_supply, rest) = unpack_u64(rest)?;
    let (co_signer_policy, rest) = unpack_u8(rest)?;
    let args = TokenPoolArgs {
        pool_name,
        token_decimals,
        terms: PoolTerms {
            reward_amount,
            pool_fee,
            timeout_seconds,
            total_supply,
            co_signer_policy: CoSignerPolicy::try_from(co_signer_policy)?,
        },
    };
    Ok((args, rest))
}

/// Creates an [InitializeTokenPool](enum.AttentionPoolInstruction.html)
/// instruction.
pub fn initialize_token_pool(
    authority_address: &Pubkey,
    funding_token_account_address: &Pubkey,
    pool: &PoolAddresses,
    args: TokenPoolArgs,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*authority_address, true),
        AccountMeta::new(*funding_token_account_address, false),
        AccountMeta::new_readonly(pool.mint, false),
        AccountMeta::new(pool.pool_config, false),
        AccountMeta::new(pool.token_vault, false),
        AccountMeta::new(pool.fee_vault, false),
        AccountMeta::new(protocol_fee_collector::id(), false),
        AccountMeta::new_readonly(spl_token_2022::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    let data = AttentionPoolInstruction::InitializeTokenPool(args).pack();
    Instruction::new_with_bytes(crate::id(), &data, accounts)
}

/// Creates an
/// [InitializeMintedTokenPool](enum.AttentionPoolInstruction.html)
/// instruction.
pub fn initialize_minted_token_pool(
    authority_address: &Pubkey,
    pool: &PoolAddresses,
    args: MintedTokenPoolArgs,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*authority_address, true),
        AccountMeta::new(pool.mint, false),
        AccountMeta::new(pool.pool_config, false),
        AccountMeta::new(pool.token_vault, false),
        AccountMeta::new(pool.fee_vault, false),
        AccountMeta::new(protocol_fee_collector::id(), false),
        AccountMeta::new_readonly(spl_token_2022::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    let data = AttentionPoolInstruction::InitializeMintedTokenPool(args).pack();
    Instruction::new_with_bytes(crate::id(), &data, accounts)
}

fn get_reward_vault_address(user_address: &Pubkey, mint_address: &Pubkey) -> Pubkey {
    get_associated_token_address_with_program_id(
        user_address,
        mint_address,
        &spl_token_2022::id(),
    )
}

/// Creates an [InitializeProof](enum.AttentionPoolInstruction.html)
/// instruction.
pub fn initialize_proof(user_address: &Pubkey, mint_address: &Pubkey) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*user_address, true),
        AccountMeta::new(
            get_proof_address(user_address, mint_address, &crate::id()),
            false,
        ),
        AccountMeta::new_readonly(*mint_address, false),
        AccountMeta::new(get_reward_vault_address(user_address, mint_address), false),
        AccountMeta::new(protocol_fee_collector::id(), false),
        AccountMeta::new_readonly(spl_token_2022::id(), false),
        AccountMeta::new_readonly(spl_associated_token_account::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];
    let data = AttentionPoolInstruction::InitializeProof.pack();
    Instruction::new_with_bytes(crate::id(), &data, accounts)
}

fn interaction_accounts(
    user_address: &Pubkey,
    pool_authority_address: &Pubkey,
    co_signer_policy: CoSignerPolicy,
    pool: &PoolAddresses,
) -> Vec<AccountMeta> {
    vec![
        AccountMeta::new(*user_address, true),
        AccountMeta::new_readonly(
            *pool_authority_address,
            co_signer_policy.requires_pool_authority(),
        ),
        AccountMeta::new(
            get_proof_address(user_address, &pool.mint, &crate::id()),
            false,
        ),
        AccountMeta::new_readonly(pool.mint, false),
        AccountMeta::new(pool.pool_config, false),
        AccountMeta::new(pool.token_vault, false),
        AccountMeta::new(pool.fee_vault, false),
        AccountMeta::new(get_reward_vault_address(user_address, &pool.mint), false),
        AccountMeta::new(protocol_fee_collector::id(), false),
        AccountMeta::new_readonly(spl_token_2022::id(), false),
        AccountMeta::new_readonly(system_program::id(), false),
    ]
}

/// Creates a [Prove](enum.AttentionPoolInstruction.html) instruction.
///
/// The pool authority is marked as a signer when `co_signer_policy`
/// requires it.
pub fn prove(
    user_address: &Pubkey,
    pool_authority_address: &Pubkey,
    co_signer_policy: CoSignerPolicy,
    pool: &PoolAddresses,
) -> Instruction {
    let accounts = interaction_accounts(
        user_address,
        pool_authority_address,
        co_signer_policy,
        pool,
    );
    let data = AttentionPoolInstruction::Prove.pack();
    Instruction::new_with_bytes(crate::id(), &data, accounts)
}

/// Creates an [Interact](enum.AttentionPoolInstruction.html) instruction.
///
/// The pool authority is marked as a signer when `co_signer_policy`
/// requires it.
pub fn interact(
    user_address: &Pubkey,
    pool_authority_address: &Pubkey,
    co_signer_policy: CoSignerPolicy,
    pool: &PoolAddresses,
    pool_name: &str,
) -> Instruction {
    let mut accounts = interaction_accounts(
        user_address,
        pool_authority_address,
        co_signer_policy,
        pool,
    );
    accounts.push(AccountMeta::new_readonly(
        spl_associated_token_account::id(),
        false,
    ));
    let data = AttentionPoolInstruction::Interact(pool_name.to_owned()).pack();
    Instruction::new_with_bytes(crate::id(), &data, accounts)
}

/// Creates a [WithdrawFees](enum.AttentionPoolInstruction.html) instruction.
pub fn withdraw_fees(
    authority_address: &Pubkey,
    pool: &PoolAddresses,
    pool_name: &str,
    amount: u64,
) -> Instruction {
    let accounts = vec![
        AccountMeta::new(*authority_address, true),
        AccountMeta::new_readonly(pool.mint, false),
        AccountMeta::new_readonly(pool.pool_config, false),
        AccountMeta::new(pool.fee_vault, false),
    ];
    let data = AttentionPoolInstruction::WithdrawFees(WithdrawFeesArgs {
        pool_name: pool_name.to_owned(),
        amount,
    })
    .pack();
    Instruction::new_with_bytes(crate::id(), &data, accounts)
}
