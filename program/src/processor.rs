//! Program processor.

use {
    crate::{
        authorization::CoSignerPolicy,
        constants::ProtocolFees,
        error::AttentionPoolError,
        instruction::{
            AttentionPoolInstruction, MintedTokenPoolArgs, TokenPoolArgs, WithdrawFeesArgs,
        },
        state::{
            check_token_metadata, collect_fee_vault_signer_seeds, collect_mint_signer_seeds,
            collect_pool_config_signer_seeds, collect_proof_signer_seeds,
            collect_token_vault_signer_seeds, get_fee_vault_address_and_bump_seed,
            get_mint_address_and_bump_seed, get_pool_config_address_and_bump_seed,
            get_proof_address, get_proof_address_and_bump_seed,
            get_token_vault_address_and_bump_seed, BoundedName, FeeVault, PoolConfig, PoolTerms,
            ProofAccount, ProofRecord,
        },
    },
    bytemuck::Pod,
    solana_program::{
        account_info::{next_account_info, AccountInfo},
        clock::Clock,
        entrypoint::ProgramResult,
        msg,
        program::{invoke, invoke_signed},
        program_error::ProgramError,
        pubkey::Pubkey,
        rent::Rent,
        system_instruction, system_program,
        sysvar::Sysvar,
    },
    spl_associated_token_account::{
        get_associated_token_address_with_program_id,
        instruction::create_associated_token_account_idempotent,
    },
    spl_token_2022::{
        extension::{
            metadata_pointer, BaseStateWithExtensions, ExtensionType, StateWithExtensions,
        },
        state::{Account, Mint},
    },
    spl_token_metadata_interface::state::TokenMetadata,
};

fn check_token_program(token_program_info: &AccountInfo) -> ProgramResult {
    if !token_program_info.key.eq(&spl_token_2022::id()) {
        return Err(ProgramError::IncorrectProgramId);
    }
    Ok(())
}

fn check_fee_collector(fees: &ProtocolFees, fee_collector_info: &AccountInfo) -> ProgramResult {
    if !fee_collector_info.key.eq(&fees.collector) {
        return Err(AttentionPoolError::InvalidProtocolFeeAccount.into());
    }
    Ok(())
}

fn get_mint_decimals(mint_info: &AccountInfo) -> Result<u8, ProgramError> {
    // Ensure the mint is a Token-2022 mint.
    if !mint_info.owner.eq(&spl_token_2022::id()) {
        return Err(ProgramError::InvalidAccountOwner);
    }
    let mint_data = mint_info.try_borrow_data()?;
    let mint = StateWithExtensions::<Mint>::unpack(&mint_data)?;
    Ok(mint.base.decimals)
}

fn get_token_account_checked(
    mint: &Pubkey,
    token_account_info: &AccountInfo,
) -> Result<Account, ProgramError> {
    if !token_account_info.owner.eq(&spl_token_2022::id()) {
        return Err(ProgramError::InvalidAccountOwner);
    }
    let token_account_data = token_account_info.try_borrow_data()?;
    let token_account = StateWithExtensions::<Account>::unpack(&token_account_data)?;

    // Ensure the provided token account is for the mint.
    if !token_account.base.mint.eq(mint) {
        return Err(AttentionPoolError::TokenAccountMintMismatch.into());
    }

    Ok(token_account.base)
}

fn get_token_vault_space(mint_info: &AccountInfo) -> Result<usize, ProgramError> {
    let mint_data = mint_info.try_borrow_data()?;
    let mint = StateWithExtensions::<Mint>::unpack(&mint_data)?;
    let mint_extensions = mint.get_extension_types()?;
    let required_extensions = ExtensionType::get_required_init_account_extensions(&mint_extensions);
    ExtensionType::try_calculate_account_len::<Account>(&required_extensions)
}

fn read_state<T: Pod>(account_info: &AccountInfo) -> Result<T, ProgramError> {
    let data = account_info.try_borrow_data()?;
    bytemuck::try_pod_read_unaligned(&data).map_err(|_| ProgramError::InvalidAccountData)
}

fn write_state<T: Pod>(account_info: &AccountInfo, state: &T) -> ProgramResult {
    let mut data = account_info.try_borrow_mut_data()?;
    let bytes = bytemuck::bytes_of(state);
    if data.len() != bytes.len() {
        return Err(ProgramError::InvalidAccountData);
    }
    data.copy_from_slice(bytes);
    Ok(())
}

fn transfer_lamports<'a>(
    from_info: &AccountInfo<'a>,
    to_info: &AccountInfo<'a>,
    lamports: u64,
) -> ProgramResult {
    if lamports == 0 {
        return Ok(());
    }
    invoke(
        &system_instruction::transfer(from_info.key, to_info.key, lamports),
        &[from_info.clone(), to_info.clone()],
    )
}

/// Funds, allocates and assigns an account at a program-derived address.
fn create_pda_account<'a>(
    payer_info: &AccountInfo<'a>,
    new_account_info: &AccountInfo<'a>,
    space: usize,
    owner: &Pubkey,
    signer_seeds: &[&[u8]],
) -> ProgramResult {
    let rent = <Rent as Sysvar>::get()?;
    let required_lamports = rent
        .minimum_balance(space)
        .saturating_sub(new_account_info.lamports());

    // Top up.
    transfer_lamports(payer_info, new_account_info, required_lamports)?;

    // Allocate & assign.
    invoke_signed(
        &system_instruction::allocate(new_account_info.key, space as u64),
        &[new_account_info.clone()],
        &[signer_seeds],
    )?;
    invoke_signed(
        &system_instruction::assign(new_account_info.key, owner),
        &[new_account_info.clone()],
        &[signer_seeds],
    )
}

fn check_pool(
    program_id: &Pubkey,
    mint: &Pubkey,
    pool_config_info: &AccountInfo,
) -> Result<PoolConfig, ProgramError> {
    // A pool config not owned by the program is not a pool.
    if !pool_config_info.owner.eq(program_id) {
        return Err(AttentionPoolError::InvalidPoolAddress.into());
    }

    let pool_config = read_state::<PoolConfig>(pool_config_info)?;

    // Ensure the provided pool config address is the address derived from
    // the mint and the stored pool name.
    let bump_seed = [pool_config.bump_seed];
    let expected_address = Pubkey::create_program_address(
        &collect_pool_config_signer_seeds(mint, pool_config.pool_name(), &bump_seed),
        program_id,
    )
    .map_err(|_| AttentionPoolError::InvalidPoolAddress)?;
    if !pool_config_info.key.eq(&expected_address) {
        return Err(AttentionPoolError::InvalidPoolAddress.into());
    }

    Ok(pool_config)
}

struct PoolAccounts<'a, 'info> {
    authority_info: &'a AccountInfo<'info>,
    mint_info: &'a AccountInfo<'info>,
    pool_config_info: &'a AccountInfo<'info>,
    token_vault_info: &'a AccountInfo<'info>,
    fee_vault_info: &'a AccountInfo<'info>,
    fee_collector_info: &'a AccountInfo<'info>,
    token_program_info: &'a AccountInfo<'info>,
}

/// Creates the pool config, token vault and fee vault of a new pool.
///
/// The mint must already be initialized. The token vault is left empty.
fn create_pool_accounts(
    program_id: &Pubkey,
    accounts: &PoolAccounts,
    pool_name: &BoundedName,
    terms: &PoolTerms,
    fees: &ProtocolFees,
) -> ProgramResult {
    let PoolAccounts {
        authority_info,
        mint_info,
        pool_config_info,
        token_vault_info,
        fee_vault_info,
        fee_collector_info,
        token_program_info,
    } = accounts;

    check_fee_collector(fees, fee_collector_info)?;

    let (pool_config_address, pool_config_bump) =
        get_pool_config_address_and_bump_seed(mint_info.key, pool_name.as_bytes(), program_id);
    let pool_config_bump = [pool_config_bump];
    let pool_config_signer_seeds =
        collect_pool_config_signer_seeds(mint_info.key, pool_name.as_bytes(), &pool_config_bump);

    // Ensure the provided pool config address is the correct address derived
    // from the mint and the pool name.
    if !pool_config_info.key.eq(&pool_config_address) {
        return Err(AttentionPoolError::InvalidPoolAddress.into());
    }

    // Ensure the pool has not already been initialized.
    if pool_config_info.data_len() != 0 {
        return Err(ProgramError::AccountAlreadyInitialized);
    }

    let (token_vault_address, token_vault_bump) =
        get_token_vault_address_and_bump_seed(mint_info.key, &pool_config_address, program_id);
    if !token_vault_info.key.eq(&token_vault_address) {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }

    let (fee_vault_address, fee_vault_bump) =
        get_fee_vault_address_and_bump_seed(&pool_config_address, program_id);
    if !fee_vault_info.key.eq(&fee_vault_address) {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }

    let pool_config = PoolConfig::new(
        authority_info.key,
        mint_info.key,
        &token_vault_address,
        &fee_vault_address,
        pool_name,
        terms,
        pool_config_bump[0],
    );

    // Initialize the pool config account.
    create_pda_account(
        authority_info,
        pool_config_info,
        std::mem::size_of::<PoolConfig>(),
        program_id,
        &pool_config_signer_seeds,
    )?;
    write_state(pool_config_info, &pool_config)?;

    // Initialize the token vault, owned by the pool config.
    {
        if token_vault_info.data_len() != 0 {
            return Err(ProgramError::AccountAlreadyInitialized);
        }
        let token_vault_bump = [token_vault_bump];
        let token_vault_signer_seeds = collect_token_vault_signer_seeds(
            mint_info.key,
            &pool_config_address,
            &token_vault_bump,
        );

        let space = get_token_vault_space(mint_info)?;
        create_pda_account(
            authority_info,
            token_vault_info,
            space,
            &spl_token_2022::id(),
            &token_vault_signer_seeds,
        )?;
        invoke(
            &spl_token_2022::instruction::initialize_account3(
                &spl_token_2022::id(),
                &token_vault_address,
                mint_info.key,
                &pool_config_address,
            )?,
            &[
                (*token_vault_info).clone(),
                (*mint_info).clone(),
                (*token_program_info).clone(),
            ],
        )?;
    }

    // Initialize the fee vault.
    {
        if fee_vault_info.data_len() != 0 {
            return Err(ProgramError::AccountAlreadyInitialized);
        }
        let fee_vault_bump = [fee_vault_bump];
        let fee_vault_signer_seeds =
            collect_fee_vault_signer_seeds(&pool_config_address, &fee_vault_bump);

        create_pda_account(
            authority_info,
            fee_vault_info,
            std::mem::size_of::<FeeVault>(),
            program_id,
            &fee_vault_signer_seeds,
        )?;
        write_state(fee_vault_info, &FeeVault::new(&pool_config_address))?;
    }

    transfer_lamports(
        authority_info,
        fee_collector_info,
        fees.account_creation_fee,
    )?;

    msg!(
        "Pool {} created for mint {}",
        pool_config_address,
        mint_info.key
    );

    Ok(())
}

/// Processes an [InitializeTokenPool](enum.AttentionPoolInstruction.html)
/// instruction.
fn process_initialize_token_pool(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: TokenPoolArgs,
    fees: &ProtocolFees,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let authority_info = next_account_info(accounts_iter)?;
    let funding_token_account_info = next_account_info(accounts_iter)?;
    let mint_info = next_account_info(accounts_iter)?;
    let pool_config_info = next_account_info(accounts_iter)?;
    let token_vault_info = next_account_info(accounts_iter)?;
    let fee_vault_info = next_account_info(accounts_iter)?;
    let fee_collector_info = next_account_info(accounts_iter)?;
    let token_program_info = next_account_info(accounts_iter)?;
    let _system_program_info = next_account_info(accounts_iter)?;

    // Ensure the authority is a signer.
    if !authority_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let pool_name = BoundedName::new(&args.pool_name)?;
    args.terms.validate()?;
    check_token_program(token_program_info)?;

    // Run checks on the mint.
    let decimals = get_mint_decimals(mint_info)?;
    if args.token_decimals == 0 || args.token_decimals != decimals {
        return Err(AttentionPoolError::InvalidDecimals.into());
    }

    // Run checks on the funding token account.
    {
        let funding_account = get_token_account_checked(mint_info.key, funding_token_account_info)?;

        // Ensure the funding token account belongs to the authority.
        if !funding_account.owner.eq(authority_info.key) {
            return Err(AttentionPoolError::TokenAccountOwnerMismatch.into());
        }

        if funding_account.amount < args.terms.total_supply {
            return Err(AttentionPoolError::InsufficientFundingBalance.into());
        }
    }

    create_pool_accounts(
        program_id,
        &PoolAccounts {
            authority_info,
            mint_info,
            pool_config_info,
            token_vault_info,
            fee_vault_info,
            fee_collector_info,
            token_program_info,
        },
        &pool_name,
        &args.terms,
        fees,
    )?;

    // Seed the token vault.
    invoke(
        &spl_token_2022::instruction::transfer_checked(
            &spl_token_2022::id(),
            funding_token_account_info.key,
            mint_info.key,
            token_vault_info.key,
            authority_info.key,
            &[],
            args.terms.total_supply,
            decimals,
        )?,
        &[
            funding_token_account_info.clone(),
            mint_info.clone(),
            token_vault_info.clone(),
            authority_info.clone(),
            token_program_info.clone(),
        ],
    )
}

/// Processes an
/// [InitializeMintedTokenPool](enum.AttentionPoolInstruction.html)
/// instruction.
fn process_initialize_minted_token_pool(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: MintedTokenPoolArgs,
    fees: &ProtocolFees,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let authority_info = next_account_info(accounts_iter)?;
    let mint_info = next_account_info(accounts_iter)?;
    let pool_config_info = next_account_info(accounts_iter)?;
    let token_vault_info = next_account_info(accounts_iter)?;
    let fee_vault_info = next_account_info(accounts_iter)?;
    let fee_collector_info = next_account_info(accounts_iter)?;
    let token_program_info = next_account_info(accounts_iter)?;
    let _system_program_info = next_account_info(accounts_iter)?;

    // Ensure the authority is a signer.
    if !authority_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    let token_name = BoundedName::new(&args.token_name)?;
    check_token_metadata(&args.symbol, &args.uri)?;
    let pool_name = BoundedName::new(&args.pool.pool_name)?;
    args.pool.terms.validate()?;
    if args.pool.token_decimals == 0 {
        return Err(AttentionPoolError::InvalidDecimals.into());
    }
    check_token_program(token_program_info)?;

    let (mint_address, mint_bump) =
        get_mint_address_and_bump_seed(token_name.as_bytes(), program_id);
    let mint_bump = [mint_bump];
    let mint_signer_seeds = collect_mint_signer_seeds(token_name.as_bytes(), &mint_bump);

    // Initialize the mint, with itself as mint authority.
    {
        // Ensure the provided mint address is the correct address derived
        // from the token name.
        if !mint_info.key.eq(&mint_address) {
            return Err(AttentionPoolError::IncorrectMintAddress.into());
        }

        // Ensure the mint has not already been initialized.
        if mint_info.data_len() != 0 {
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let token_metadata = TokenMetadata {
            name: args.token_name,
            symbol: args.symbol,
            uri: args.uri,
            mint: mint_address,
            ..Default::default()
        };

        // The metadata is reallocated into the mint by the token program, so
        // the rent for it is paid up front.
        let space =
            ExtensionType::try_calculate_account_len::<Mint>(&[ExtensionType::MetadataPointer])?;
        let rent = <Rent as Sysvar>::get()?;
        let metadata_lamports = rent
            .minimum_balance(space.saturating_add(token_metadata.tlv_size_of()?))
            .saturating_sub(rent.minimum_balance(space));
        create_pda_account(
            authority_info,
            mint_info,
            space,
            &spl_token_2022::id(),
            &mint_signer_seeds,
        )?;
        transfer_lamports(authority_info, mint_info, metadata_lamports)?;

        invoke(
            &metadata_pointer::instruction::initialize(
                &spl_token_2022::id(),
                &mint_address,
                Some(mint_address),
                Some(mint_address),
            )?,
            &[mint_info.clone(), token_program_info.clone()],
        )?;
        invoke(
            &spl_token_2022::instruction::initialize_mint2(
                &spl_token_2022::id(),
                &mint_address,
                &mint_address,
                None,
                args.pool.token_decimals,
            )?,
            &[mint_info.clone(), token_program_info.clone()],
        )?;
        invoke_signed(
            &spl_token_metadata_interface::instruction::initialize(
                &spl_token_2022::id(),
                &mint_address,
                &mint_address,
                &mint_address,
                &mint_address,
                token_metadata.name,
                token_metadata.symbol,
                token_metadata.uri,
            ),
            &[mint_info.clone(), token_program_info.clone()],
            &[&mint_signer_seeds],
        )?;
    }

    create_pool_accounts(
        program_id,
        &PoolAccounts {
            authority_info,
            mint_info,
            pool_config_info,
            token_vault_info,
            fee_vault_info,
            fee_collector_info,
            token_program_info,
        },
        &pool_name,
        &args.pool.terms,
        fees,
    )?;

    // Seed the token vault.
    invoke_signed(
        &spl_token_2022::instruction::mint_to(
            &spl_token_2022::id(),
            &mint_address,
            token_vault_info.key,
            &mint_address,
            &[],
            args.pool.terms.total_supply,
        )?,
        &[
            mint_info.clone(),
            token_vault_info.clone(),
            token_program_info.clone(),
        ],
        &[&mint_signer_seeds],
    )
}

fn resolve_proof_record(
    program_id: &Pubkey,
    proof_info: &AccountInfo,
) -> Result<ProofRecord, ProgramError> {
    if proof_info.data_is_empty() && proof_info.owner.eq(&system_program::id()) {
        return Ok(ProofRecord::Uninitialized);
    }

    // Ensure the proof account is owned by the Attention Pool program.
    if !proof_info.owner.eq(program_id) {
        return Err(ProgramError::InvalidAccountOwner);
    }

    read_state::<ProofAccount>(proof_info).map(ProofRecord::Active)
}

struct ProofCreationAccounts<'a, 'info> {
    user_info: &'a AccountInfo<'info>,
    proof_info: &'a AccountInfo<'info>,
    mint_info: &'a AccountInfo<'info>,
    reward_vault_info: &'a AccountInfo<'info>,
    fee_collector_info: &'a AccountInfo<'info>,
    token_program_info: &'a AccountInfo<'info>,
    associated_token_program_info: &'a AccountInfo<'info>,
    system_program_info: &'a AccountInfo<'info>,
}

/// Creates the user's associated token account for the mint unless it
/// already exists, and returns its address.
fn create_reward_vault<'a>(
    user_info: &AccountInfo<'a>,
    mint_info: &AccountInfo<'a>,
    reward_vault_info: &AccountInfo<'a>,
    token_program_info: &AccountInfo<'a>,
    associated_token_program_info: &AccountInfo<'a>,
    system_program_info: &AccountInfo<'a>,
) -> Result<Pubkey, ProgramError> {
    // Ensure the reward vault is the user's associated token account.
    let reward_vault_address = get_associated_token_address_with_program_id(
        user_info.key,
        mint_info.key,
        &spl_token_2022::id(),
    );
    if !reward_vault_info.key.eq(&reward_vault_address) {
        return Err(AttentionPoolError::IncorrectRewardVault.into());
    }

    if !associated_token_program_info
        .key
        .eq(&spl_associated_token_account::id())
    {
        return Err(ProgramError::IncorrectProgramId);
    }

    invoke(
        &create_associated_token_account_idempotent(
            user_info.key,
            user_info.key,
            mint_info.key,
            &spl_token_2022::id(),
        ),
        &[
            user_info.clone(),
            reward_vault_info.clone(),
            mint_info.clone(),
            system_program_info.clone(),
            token_program_info.clone(),
            associated_token_program_info.clone(),
        ],
    )?;

    Ok(reward_vault_address)
}

/// Creates a user's proof account and, if missing, their associated token
/// account for the mint.
fn create_proof_account(
    program_id: &Pubkey,
    accounts: &ProofCreationAccounts,
    fees: &ProtocolFees,
) -> Result<ProofAccount, ProgramError> {
    let ProofCreationAccounts {
        user_info,
        proof_info,
        mint_info,
        reward_vault_info,
        fee_collector_info,
        token_program_info,
        associated_token_program_info,
        system_program_info,
    } = accounts;

    let (proof_address, proof_bump) =
        get_proof_address_and_bump_seed(user_info.key, mint_info.key, program_id);
    let proof_bump = [proof_bump];
    let proof_signer_seeds = collect_proof_signer_seeds(user_info.key, mint_info.key, &proof_bump);

    // Ensure the provided proof account address is the correct address
    // derived from the user and the mint.
    if !proof_info.key.eq(&proof_address) {
        return Err(AttentionPoolError::IncorrectProofAccountAddress.into());
    }

    let reward_vault_address = create_reward_vault(
        user_info,
        mint_info,
        reward_vault_info,
        token_program_info,
        associated_token_program_info,
        system_program_info,
    )?;

    create_pda_account(
        user_info,
        proof_info,
        std::mem::size_of::<ProofAccount>(),
        program_id,
        &proof_signer_seeds,
    )?;
    let proof = ProofAccount::new(user_info.key, mint_info.key, &reward_vault_address);
    write_state(proof_info, &proof)?;

    transfer_lamports(user_info, fee_collector_info, fees.account_creation_fee)?;

    msg!("Proof account {} created", proof_address);

    Ok(proof)
}

/// Processes an [InitializeProof](enum.AttentionPoolInstruction.html)
/// instruction.
fn process_initialize_proof(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    fees: &ProtocolFees,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let user_info = next_account_info(accounts_iter)?;
    let proof_info = next_account_info(accounts_iter)?;
    let mint_info = next_account_info(accounts_iter)?;
    let reward_vault_info = next_account_info(accounts_iter)?;
    let fee_collector_info = next_account_info(accounts_iter)?;
    let token_program_info = next_account_info(accounts_iter)?;
    let associated_token_program_info = next_account_info(accounts_iter)?;
    let system_program_info = next_account_info(accounts_iter)?;

    // Ensure the user is a signer.
    if !user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    check_token_program(token_program_info)?;
    check_fee_collector(fees, fee_collector_info)?;
    get_mint_decimals(mint_info)?;

    if let ProofRecord::Active(_) = resolve_proof_record(program_id, proof_info)? {
        return Err(ProgramError::AccountAlreadyInitialized);
    }

    create_proof_account(
        program_id,
        &ProofCreationAccounts {
            user_info,
            proof_info,
            mint_info,
            reward_vault_info,
            fee_collector_info,
            token_program_info,
            associated_token_program_info,
            system_program_info,
        },
        fees,
    )?;

    Ok(())
}

struct InteractionAccounts<'a, 'info> {
    user_info: &'a AccountInfo<'info>,
    pool_authority_info: &'a AccountInfo<'info>,
    proof_info: &'a AccountInfo<'info>,
    mint_info: &'a AccountInfo<'info>,
    pool_config_info: &'a AccountInfo<'info>,
    token_vault_info: &'a AccountInfo<'info>,
    fee_vault_info: &'a AccountInfo<'info>,
    reward_vault_info: &'a AccountInfo<'info>,
    fee_collector_info: &'a AccountInfo<'info>,
    token_program_info: &'a AccountInfo<'info>,
    system_program_info: &'a AccountInfo<'info>,
}

impl<'a, 'info> InteractionAccounts<'a, 'info> {
    fn next(accounts_iter: &mut std::slice::Iter<'a, AccountInfo<'info>>) -> Result<Self, ProgramError> {
        Ok(Self {
            user_info: next_account_info(accounts_iter)?,
            pool_authority_info: next_account_info(accounts_iter)?,
            proof_info: next_account_info(accounts_iter)?,
            mint_info: next_account_info(accounts_iter)?,
            pool_config_info: next_account_info(accounts_iter)?,
            token_vault_info: next_account_info(accounts_iter)?,
            fee_vault_info: next_account_info(accounts_iter)?,
            reward_vault_info: next_account_info(accounts_iter)?,
            fee_collector_info: next_account_info(accounts_iter)?,
            token_program_info: next_account_info(accounts_iter)?,
            system_program_info: next_account_info(accounts_iter)?,
        })
    }
}

/// Validates every pool account of an interaction and returns the pool
/// config.
fn check_interaction(
    program_id: &Pubkey,
    accounts: &InteractionAccounts,
    fees: &ProtocolFees,
) -> Result<PoolConfig, ProgramError> {
    // Ensure the user is a signer.
    if !accounts.user_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    check_token_program(accounts.token_program_info)?;

    let pool_config = check_pool(program_id, accounts.mint_info.key, accounts.pool_config_info)?;

    // Ensure the pool's co-signature requirement is met.
    let co_signer_policy = pool_config.co_signer_policy()?;
    if co_signer_policy != CoSignerPolicy::Disabled
        && !accounts.pool_authority_info.key.eq(&pool_config.authority)
    {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }
    let signers: Vec<&Pubkey> = [accounts.user_info, accounts.pool_authority_info]
        .iter()
        .filter(|info| info.is_signer)
        .map(|info| info.key)
        .collect();
    co_signer_policy
        .requirement(&pool_config.authority)
        .verify(&signers)?;

    // Ensure the vaults are the pool's vaults.
    if !accounts.token_vault_info.key.eq(&pool_config.token_vault) {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }
    if !accounts.fee_vault_info.key.eq(&pool_config.fee_vault)
        || !accounts.fee_vault_info.owner.eq(program_id)
    {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }

    check_fee_collector(fees, accounts.fee_collector_info)?;

    // Ensure the provided proof account address is the correct address
    // derived from the user and the mint.
    if !accounts.proof_info.key.eq(&get_proof_address(
        accounts.user_info.key,
        accounts.mint_info.key,
        program_id,
    )) {
        return Err(AttentionPoolError::IncorrectProofAccountAddress.into());
    }

    Ok(pool_config)
}

/// Records one attention proof and pays the pool's reward.
fn prove_attention(
    accounts: &InteractionAccounts,
    pool_config: &PoolConfig,
    proof: &ProofAccount,
    fees: &ProtocolFees,
) -> ProgramResult {
    let InteractionAccounts {
        user_info,
        proof_info,
        mint_info,
        pool_config_info,
        token_vault_info,
        fee_vault_info,
        reward_vault_info,
        fee_collector_info,
        token_program_info,
        ..
    } = accounts;

    // Ensure the reward vault is the one recorded on the proof account.
    if !reward_vault_info.key.eq(&proof.reward_vault) {
        return Err(AttentionPoolError::IncorrectRewardVault.into());
    }

    let clock = <Clock as Sysvar>::get()?;

    let mut new_proof = *proof;
    new_proof.prove(
        clock.unix_timestamp,
        pool_config.timeout_seconds,
        pool_config.reward_amount,
    )?;
    let mut new_pool_config = *pool_config;
    new_pool_config.record_payout()?;

    // Ensure the vault can cover the reward.
    let decimals = get_mint_decimals(mint_info)?;
    let token_vault = get_token_account_checked(mint_info.key, token_vault_info)?;
    if token_vault.amount < pool_config.reward_amount {
        return Err(AttentionPoolError::PoolSupplyExhausted.into());
    }

    transfer_lamports(user_info, fee_vault_info, pool_config.pool_fee)?;
    transfer_lamports(user_info, fee_collector_info, fees.interaction_fee)?;

    // Pay the reward, signed by the pool config.
    let bump_seed = [pool_config.bump_seed];
    let pool_config_signer_seeds =
        collect_pool_config_signer_seeds(mint_info.key, pool_config.pool_name(), &bump_seed);
    invoke_signed(
        &spl_token_2022::instruction::transfer_checked(
            &spl_token_2022::id(),
            token_vault_info.key,
            mint_info.key,
            reward_vault_info.key,
            pool_config_info.key,
            &[],
            pool_config.reward_amount,
            decimals,
        )?,
        &[
            (*token_vault_info).clone(),
            (*mint_info).clone(),
            (*reward_vault_info).clone(),
            (*pool_config_info).clone(),
            (*token_program_info).clone(),
        ],
        &[&pool_config_signer_seeds],
    )?;

    write_state(proof_info, &new_proof)?;
    write_state(pool_config_info, &new_pool_config)?;

    msg!(
        "Proof {} recorded for {}",
        new_proof.total_proofs,
        user_info.key
    );

    Ok(())
}

/// Processes a [Prove](enum.AttentionPoolInstruction.html) instruction.
fn process_prove(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    fees: &ProtocolFees,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();
    let accounts = InteractionAccounts::next(accounts_iter)?;

    let pool_config = check_interaction(program_id, &accounts, fees)?;

    let proof = match resolve_proof_record(program_id, accounts.proof_info)? {
        ProofRecord::Active(proof) => proof,
        ProofRecord::Uninitialized => return Err(ProgramError::UninitializedAccount),
    };

    prove_attention(&accounts, &pool_config, &proof, fees)
}

/// Processes an [Interact](enum.AttentionPoolInstruction.html) instruction.
fn process_interact(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    pool_name: String,
    fees: &ProtocolFees,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();
    let accounts = InteractionAccounts::next(accounts_iter)?;
    let associated_token_program_info = next_account_info(accounts_iter)?;

    let pool_name = BoundedName::new(&pool_name)?;
    let pool_config = check_interaction(program_id, &accounts, fees)?;

    // Ensure the pool name matches the pool config.
    if pool_config.pool_name() != pool_name.as_bytes() {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }

    let proof = match resolve_proof_record(program_id, accounts.proof_info)? {
        ProofRecord::Active(proof) => {
            // The user may have closed the reward vault since the last proof.
            create_reward_vault(
                accounts.user_info,
                accounts.mint_info,
                accounts.reward_vault_info,
                accounts.token_program_info,
                associated_token_program_info,
                accounts.system_program_info,
            )?;
            proof
        }
        ProofRecord::Uninitialized => create_proof_account(
            program_id,
            &ProofCreationAccounts {
                user_info: accounts.user_info,
                proof_info: accounts.proof_info,
                mint_info: accounts.mint_info,
                reward_vault_info: accounts.reward_vault_info,
                fee_collector_info: accounts.fee_collector_info,
                token_program_info: accounts.token_program_info,
                associated_token_program_info,
                system_program_info: accounts.system_program_info,
            },
            fees,
        )?,
    };

    prove_attention(&accounts, &pool_config, &proof, fees)
}

/// Processes a [WithdrawFees](enum.AttentionPoolInstruction.html)
/// instruction.
fn process_withdraw_fees(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    args: WithdrawFeesArgs,
) -> ProgramResult {
    let accounts_iter = &mut accounts.iter();

    let authority_info = next_account_info(accounts_iter)?;
    let mint_info = next_account_info(accounts_iter)?;
    let pool_config_info = next_account_info(accounts_iter)?;
    let fee_vault_info = next_account_info(accounts_iter)?;

    let pool_name = BoundedName::new(&args.pool_name)?;
    let pool_config = check_pool(program_id, mint_info.key, pool_config_info)?;

    // Ensure the pool name matches the pool config.
    if pool_config.pool_name() != pool_name.as_bytes() {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }

    // Ensure the caller is the pool authority.
    if !authority_info.key.eq(&pool_config.authority) {
        return Err(AttentionPoolError::WithdrawNotApproved.into());
    }
    if !authority_info.is_signer {
        return Err(ProgramError::MissingRequiredSignature);
    }

    // Ensure the fee vault belongs to the pool.
    if !fee_vault_info.key.eq(&pool_config.fee_vault) || !fee_vault_info.owner.eq(program_id) {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }
    let fee_vault = read_state::<FeeVault>(fee_vault_info)?;
    if !fee_vault.pool_config.eq(pool_config_info.key) {
        return Err(AttentionPoolError::InvalidTokenPoolAccount.into());
    }

    let rent = <Rent as Sysvar>::get()?;
    let new_fee_vault_lamports = FeeVault::checked_withdrawal(
        fee_vault_info.lamports(),
        rent.minimum_balance(fee_vault_info.data_len()),
        args.amount,
    )?;
    let new_authority_lamports = authority_info
        .lamports()
        .checked_add(args.amount)
        .ok_or(ProgramError::ArithmeticOverflow)?;

    **fee_vault_info.try_borrow_mut_lamports()? = new_fee_vault_lamports;
    **authority_info.try_borrow_mut_lamports()? = new_authority_lamports;

    msg!(
        "Withdrew {} lamports from fee vault {}",
        args.amount,
        fee_vault_info.key
    );

    Ok(())
}

/// Processes an
/// [AttentionPoolInstruction](enum.AttentionPoolInstruction.html) with the
/// canonical protocol fees.
pub fn process(program_id: &Pubkey, accounts: &[AccountInfo], input: &[u8]) -> ProgramResult {
    process_with_fees(program_id, accounts, input, &ProtocolFees::CANONICAL)
}

/// Processes an
/// [AttentionPoolInstruction](enum.AttentionPoolInstruction.html).
pub fn process_with_fees(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    input: &[u8],
    fees: &ProtocolFees,
) -> ProgramResult {
    let instruction = AttentionPoolInstruction::unpack(input)?;
    match instruction {
        AttentionPoolInstruction::InitializeTokenPool(args) => {
            msg!("Instruction: InitializeTokenPool");
            process_initialize_token_pool(program_id, accounts, args, fees)
        }
        AttentionPoolInstruction::InitializeMintedTokenPool(args) => {
            msg!("Instruction: InitializeMintedTokenPool");
            process_initialize_minted_token_pool(program_id, accounts, args, fees)
        }
        AttentionPoolInstruction::InitializeProof => {
            msg!("Instruction: InitializeProof");
            process_initialize_proof(program_id, accounts, fees)
        }
        AttentionPoolInstruction::Prove => {
            msg!("Instruction: Prove");
            process_prove(program_id, accounts, fees)
        }
        AttentionPoolInstruction::Interact(pool_name) => {
            msg!("Instruction: Interact");
            process_interact(program_id, accounts, pool_name, fees)
        }
        AttentionPoolInstruction::WithdrawFees(args) => {
            msg!("Instruction: WithdrawFees");
            process_withdraw_fees(program_id, accounts, args)
        }
    }
}
