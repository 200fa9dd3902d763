#![cfg(feature = "test-sbf")]


use {
    crate::{
        execute_utils::{execute_with_signers, execute_with_signers_err},
        setup::{
            get_lamports, get_state, get_token_balance, pool_terms, setup, setup_fee_collector,
            setup_system_account, token_pool_args, AUTHORITY_LAMPORTS, DECIMALS, POOL_NAME,
            TOTAL_SUPPLY,
        },
    },
    attention_pool_program::{
        authorization::CoSignerPolicy,
        constants::{protocol_fee_collector, ACCOUNT_CREATION_FEE},
        error::AttentionPoolError,
        instruction::{initialize_minted_token_pool, MintedTokenPoolArgs},
        state::{get_mint_address, PoolAddresses, PoolConfig},
    },
    solana_program_test::*,
    solana_sdk::{
        instruction::InstructionError, program_option::COption, pubkey::Pubkey,
        signature::Keypair, signer::Signer, transaction::TransactionError,
    },
    spl_token_2022::{
        extension::{metadata_pointer::MetadataPointer, BaseStateWithExtensions, StateWithExtensions},
        state::Mint,
    },
    spl_token_metadata_interface::state::TokenMetadata,
};

const TOKEN_NAME: &str = "ATTN";
const SYMBOL: &str = "ATTN";
const URI: &str = "https://example.com/attn.json";

async fn setup_context(authority: &Keypair) -> ProgramTestContext {
    let mut context = setup().start_with_context().await;
    setup_system_account(&mut context, &authority.pubkey(), AUTHORITY_LAMPORTS).await;
    setup_fee_collector(&mut context).await;
    context
}

fn minted_pool_args(token_name: &str, pool_name: &str) -> MintedTokenPoolArgs {
    MintedTokenPoolArgs {
        token_name: token_name.to_owned(),
        symbol: SYMBOL.to_owned(),
        uri: URI.to_owned(),
        pool: token_pool_args(pool_name, pool_terms(CoSignerPolicy::PoolAuthority)),
    }
}

#[tokio::test]
async fn success() {
    let authority = Keypair::new();
    let mut context = setup_context(&authority).await;

    let mint = get_mint_address(TOKEN_NAME, &attention_pool_program::id());
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());
    let collector_lamports = get_lamports(&mut context, &protocol_fee_collector::id()).await;

    let instruction = initialize_minted_token_pool(
        &authority.pubkey(),
        &pool,
        minted_pool_args(TOKEN_NAME, POOL_NAME),
    );
    execute_with_signers(&mut context, &[instruction], &[&authority]).await;

    // Check the mint.
    let mint_account = context
        .banks_client
        .get_account(mint)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mint_account.owner, spl_token_2022::id());
    let mint_state = StateWithExtensions::<Mint>::unpack(&mint_account.data).unwrap();
    assert_eq!(mint_state.base.decimals, DECIMALS);
    assert_eq!(mint_state.base.supply, TOTAL_SUPPLY);
    assert_eq!(mint_state.base.mint_authority, COption::Some(mint));
    assert_eq!(mint_state.base.freeze_authority, COption::None);

    // Check the metadata, stored on the mint itself.
    let metadata_pointer = mint_state.get_extension::<MetadataPointer>().unwrap();
    assert_eq!(
        Option::<Pubkey>::from(metadata_pointer.metadata_address),
        Some(mint)
    );
    let metadata = mint_state
        .get_variable_len_extension::<TokenMetadata>()
        .unwrap();
    assert_eq!(metadata.mint, mint);
    assert_eq!(metadata.name, TOKEN_NAME);
    assert_eq!(metadata.symbol, SYMBOL);
    assert_eq!(metadata.uri, URI);
    assert_eq!(
        Option::<Pubkey>::from(metadata.update_authority),
        Some(mint)
    );

    // Check the pool.
    let pool_config = get_state::<PoolConfig>(&mut context, &pool.pool_config).await;
    assert_eq!(pool_config.authority, authority.pubkey());
    assert_eq!(pool_config.mint, mint);
    assert_eq!(pool_config.total_supply, TOTAL_SUPPLY);
    assert_eq!(
        get_token_balance(&mut context, &pool.token_vault).await,
        TOTAL_SUPPLY
    );

    assert_eq!(
        get_lamports(&mut context, &protocol_fee_collector::id()).await,
        collector_lamports + ACCOUNT_CREATION_FEE
    );
}

#[tokio::test]
async fn fail_incorrect_mint_address() {
    let authority = Keypair::new();
    let mut context = setup_context(&authority).await;

    let mint = get_mint_address("OTHER", &attention_pool_program::id());
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let instruction = initialize_minted_token_pool(
        &authority.pubkey(),
        &pool,
        minted_pool_args(TOKEN_NAME, POOL_NAME),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(
            0,
            InstructionError::Custom(AttentionPoolError::IncorrectMintAddress as u32)
        )
    );
}

#[tokio::test]
async fn fail_token_name_too_long() {
    let authority = Keypair::new();
    let mut context = setup_context(&authority).await;

    let pool = PoolAddresses {
        mint: Pubkey::new_unique(),
        pool_config: Pubkey::new_unique(),
        token_vault: Pubkey::new_unique(),
        fee_vault: Pubkey::new_unique(),
    };
    let instruction = initialize_minted_token_pool(
        &authority.pubkey(),
        &pool,
        minted_pool_args(&"T".repeat(33), POOL_NAME),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(
            0,
            InstructionError::Custom(AttentionPoolError::StringTooLong as u32)
        )
    );
}

#[tokio::test]
async fn fail_zero_decimals() {
    let authority = Keypair::new();
    let mut context = setup_context(&authority).await;

    let mint = get_mint_address(TOKEN_NAME, &attention_pool_program::id());
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let mut args = minted_pool_args(TOKEN_NAME, POOL_NAME);
    args.pool.token_decimals = 0;
    let instruction = initialize_minted_token_pool(&authority.pubkey(), &pool, args);
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(
            0,
            InstructionError::Custom(AttentionPoolError::InvalidDecimals as u32)
        )
    );
}

#[tokio::test]
async fn fail_mint_already_initialized() {
    let authority = Keypair::new();
    let mut context = setup_context(&authority).await;

    let mint = get_mint_address(TOKEN_NAME, &attention_pool_program::id());
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());
    let instruction = initialize_minted_token_pool(
        &authority.pubkey(),
        &pool,
        minted_pool_args(TOKEN_NAME, POOL_NAME),
    );
    execute_with_signers(&mut context, &[instruction], &[&authority]).await;

    // The same token name cannot mint a second time, even for a new pool.
    let second_pool = PoolAddresses::derive(&mint, "second", &attention_pool_program::id());
    let instruction = initialize_minted_token_pool(
        &authority.pubkey(),
        &second_pool,
        minted_pool_args(TOKEN_NAME, "second"),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(0, InstructionError::AccountAlreadyInitialized)
    );
    assert!(context
        .banks_client
        .get_account(second_pool.pool_config)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn fail_symbol_too_long() {
    let authority = Keypair::new();
    let mut context = setup_context(&authority).await;

    let mint = get_mint_address(TOKEN_NAME, &attention_pool_program::id());
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let mut args = minted_pool_args(TOKEN_NAME, POOL_NAME);
    args.symbol = "S".repeat(11);
    let instruction = initialize_minted_token_pool(&authority.pubkey(), &pool, args);
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(
            0,
            InstructionError::Custom(AttentionPoolError::StringTooLong as u32)
        )
    );
    assert!(context
        .banks_client
        .get_account(mint)
        .await
        .unwrap()
        .is_none());
}
