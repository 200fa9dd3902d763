//! The Attention Pool program.
//!
//! Pays a fixed token reward to users who prove attention, at most once per
//! pool cooldown window, while collecting a native-currency fee for the pool
//! into a fee vault that only the pool authority can withdraw from.

pub mod authorization;
pub mod constants;
#[cfg(all(target_os = "solana", feature = "bpf-entrypoint"))]
mod entrypoint;
pub mod error;
pub mod instruction;
pub mod processor;
pub mod state;

solana_program::declare_id!("attn9Nw2iXDoW2guYwdtmh4xagadhhXqYcnbHTyfK5r");
