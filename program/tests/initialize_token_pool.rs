#![cfg(feature = "test-sbf")]


use {
    crate::{
        execute_utils::{execute_with_signers, execute_with_signers_err},
        setup::{
            get_lamports, get_reward_vault_address, get_state, get_token_balance, pool_terms,
            setup, setup_fee_collector, setup_mint, setup_system_account, setup_token_account,
            token_pool_args, AUTHORITY_LAMPORTS, DECIMALS, POOL_FEE, POOL_NAME, REWARD_AMOUNT,
            TIMEOUT_SECONDS, TOTAL_SUPPLY,
        },
    },
    attention_pool_program::{
        authorization::CoSignerPolicy,
        constants::{protocol_fee_collector, ACCOUNT_CREATION_FEE},
        error::AttentionPoolError,
        instruction::initialize_token_pool,
        state::{FeeVault, PoolAddresses, PoolConfig},
    },
    solana_program_test::*,
    solana_sdk::{
        instruction::InstructionError, pubkey::Pubkey, signature::Keypair, signer::Signer,
        transaction::TransactionError,
    },
    test_case::test_case,
};

struct Fixture {
    context: ProgramTestContext,
    authority: Keypair,
    mint: Pubkey,
    funding_token_account: Pubkey,
}

async fn fixture(mint_decimals: u8, funding_amount: u64) -> Fixture {
    let authority = Keypair::new();
    let mint = Pubkey::new_unique();
    let funding_token_account = get_reward_vault_address(&authority.pubkey(), &mint);

    let mut context = setup().start_with_context().await;
    setup_system_account(&mut context, &authority.pubkey(), AUTHORITY_LAMPORTS).await;
    setup_fee_collector(&mut context).await;
    setup_mint(
        &mut context,
        &mint,
        &authority.pubkey(),
        mint_decimals,
        funding_amount,
    )
    .await;
    setup_token_account(
        &mut context,
        &funding_token_account,
        &authority.pubkey(),
        &mint,
        funding_amount,
    )
    .await;

    Fixture {
        context,
        authority,
        mint,
        funding_token_account,
    }
}

fn custom_error(error: AttentionPoolError) -> TransactionError {
    TransactionError::InstructionError(0, InstructionError::Custom(error as u32))
}

#[tokio::test]
async fn success() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());
    let collector_lamports = get_lamports(&mut context, &protocol_fee_collector::id()).await;

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    execute_with_signers(&mut context, &[instruction], &[&authority]).await;

    // Check the pool config.
    let pool_config = get_state::<PoolConfig>(&mut context, &pool.pool_config).await;
    assert_eq!(pool_config.authority, authority.pubkey());
    assert_eq!(pool_config.mint, mint);
    assert_eq!(pool_config.token_vault, pool.token_vault);
    assert_eq!(pool_config.fee_vault, pool.fee_vault);
    assert_eq!(pool_config.pool_name(), POOL_NAME.as_bytes());
    assert_eq!(pool_config.reward_amount, REWARD_AMOUNT);
    assert_eq!(pool_config.pool_fee, POOL_FEE);
    assert_eq!(pool_config.timeout_seconds, TIMEOUT_SECONDS);
    assert_eq!(pool_config.total_supply, TOTAL_SUPPLY);
    assert_eq!(pool_config.total_proofs, 0);
    assert_eq!(pool_config.total_rewards_paid, 0);
    assert_eq!(
        pool_config.co_signer_policy(),
        Ok(CoSignerPolicy::PoolAuthority)
    );

    // Check the fee vault.
    let fee_vault = get_state::<FeeVault>(&mut context, &pool.fee_vault).await;
    assert_eq!(fee_vault.pool_config, pool.pool_config);
    let rent = context.banks_client.get_rent().await.unwrap();
    assert_eq!(
        get_lamports(&mut context, &pool.fee_vault).await,
        rent.minimum_balance(std::mem::size_of::<FeeVault>())
    );

    // Check the token balances.
    assert_eq!(
        get_token_balance(&mut context, &pool.token_vault).await,
        TOTAL_SUPPLY
    );
    assert_eq!(
        get_token_balance(&mut context, &funding_token_account).await,
        0
    );

    // Check the protocol fee.
    assert_eq!(
        get_lamports(&mut context, &protocol_fee_collector::id()).await,
        collector_lamports + ACCOUNT_CREATION_FEE
    );
}

#[tokio::test]
async fn fail_pool_already_initialized() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY * 2).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    execute_with_signers(&mut context, &[instruction.clone()], &[&authority]).await;
    let first_pool_config = get_state::<PoolConfig>(&mut context, &pool.pool_config).await;

    let mut terms = pool_terms(CoSignerPolicy::Disabled);
    terms.reward_amount = 1;
    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, terms),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(0, InstructionError::AccountAlreadyInitialized)
    );

    // The first pool is untouched.
    assert_eq!(
        get_state::<PoolConfig>(&mut context, &pool.pool_config).await,
        first_pool_config
    );
    assert_eq!(
        get_token_balance(&mut context, &pool.token_vault).await,
        TOTAL_SUPPLY
    );
}

#[tokio::test]
async fn success_second_pool_for_same_mint() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY * 2).await;

    for pool_name in [POOL_NAME, "second"] {
        let pool = PoolAddresses::derive(&mint, pool_name, &attention_pool_program::id());
        let instruction = initialize_token_pool(
            &authority.pubkey(),
            &funding_token_account,
            &pool,
            token_pool_args(pool_name, pool_terms(CoSignerPolicy::PoolAuthority)),
        );
        execute_with_signers(&mut context, &[instruction], &[&authority]).await;

        let pool_config = get_state::<PoolConfig>(&mut context, &pool.pool_config).await;
        assert_eq!(pool_config.pool_name(), pool_name.as_bytes());
        assert_eq!(
            get_token_balance(&mut context, &pool.token_vault).await,
            TOTAL_SUPPLY
        );
    }
}

#[tokio::test]
async fn fail_pool_name_too_long() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;

    // A 33-byte name has no derivable address.
    let pool = PoolAddresses {
        mint,
        pool_config: Pubkey::new_unique(),
        token_vault: Pubkey::new_unique(),
        fee_vault: Pubkey::new_unique(),
    };
    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(&"a".repeat(33), pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::StringTooLong));
}

#[test_case(0, 0; "zero decimals")]
#[test_case(DECIMALS, DECIMALS + 1; "decimals mismatch")]
#[tokio::test]
async fn fail_invalid_decimals(mint_decimals: u8, token_decimals: u8) {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(mint_decimals, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let mut args = token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority));
    args.token_decimals = token_decimals;
    let instruction =
        initialize_token_pool(&authority.pubkey(), &funding_token_account, &pool, args);
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::InvalidDecimals));
}

#[test_case(0, TOTAL_SUPPLY; "zero reward")]
#[test_case(REWARD_AMOUNT, 0; "zero supply")]
#[test_case(TOTAL_SUPPLY + 1, TOTAL_SUPPLY; "reward exceeds supply")]
#[tokio::test]
async fn fail_invalid_amount(reward_amount: u64, total_supply: u64) {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let mut terms = pool_terms(CoSignerPolicy::PoolAuthority);
    terms.reward_amount = reward_amount;
    terms.total_supply = total_supply;
    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, terms),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::InvalidAmount));
}

#[tokio::test]
async fn fail_insufficient_funding_balance() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY - 1).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::InsufficientFundingBalance));
}

#[tokio::test]
async fn fail_funding_account_owner_mismatch() {
    let Fixture {
        mut context,
        authority,
        mint,
        ..
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let someone_else = Pubkey::new_unique();
    let funding_token_account = Pubkey::new_unique();
    setup_token_account(
        &mut context,
        &funding_token_account,
        &someone_else,
        &mint,
        TOTAL_SUPPLY,
    )
    .await;

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::TokenAccountOwnerMismatch));
}

#[tokio::test]
async fn fail_funding_account_mint_mismatch() {
    let Fixture {
        mut context,
        authority,
        mint,
        ..
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let other_mint = Pubkey::new_unique();
    let funding_token_account = Pubkey::new_unique();
    setup_token_account(
        &mut context,
        &funding_token_account,
        &authority.pubkey(),
        &other_mint,
        TOTAL_SUPPLY,
    )
    .await;

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::TokenAccountMintMismatch));
}

#[tokio::test]
async fn fail_incorrect_pool_config_address() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let mut pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());
    pool.pool_config = Pubkey::new_unique();

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::InvalidPoolAddress));
}

#[test_case(true; "token vault")]
#[test_case(false; "fee vault")]
#[tokio::test]
async fn fail_incorrect_vault_address(swap_token_vault: bool) {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let mut pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());
    if swap_token_vault {
        pool.token_vault = Pubkey::new_unique();
    } else {
        pool.fee_vault = Pubkey::new_unique();
    }

    let instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::InvalidTokenPoolAccount));
}

#[tokio::test]
async fn fail_incorrect_protocol_fee_collector() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let mut instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    instruction.accounts[6].pubkey = Pubkey::new_unique();
    let err = execute_with_signers_err(&mut context, &[instruction], &[&authority]).await;

    assert_eq!(err, custom_error(AttentionPoolError::InvalidProtocolFeeAccount));
}

#[tokio::test]
async fn fail_authority_not_signer() {
    let Fixture {
        mut context,
        authority,
        mint,
        funding_token_account,
    } = fixture(DECIMALS, TOTAL_SUPPLY).await;
    let pool = PoolAddresses::derive(&mint, POOL_NAME, &attention_pool_program::id());

    let mut instruction = initialize_token_pool(
        &authority.pubkey(),
        &funding_token_account,
        &pool,
        token_pool_args(POOL_NAME, pool_terms(CoSignerPolicy::PoolAuthority)),
    );
    instruction.accounts[0].is_signer = false;
    let err = execute_with_signers_err(&mut context, &[instruction], &[]).await;

    assert_eq!(
        err,
        TransactionError::InstructionError(0, InstructionError::MissingRequiredSignature)
    );
}
