//! Demo harness: walks a three-token pool through every operation the
//! engine supports and prints the pool status after each step.

use anyhow::{Context, Result};
use clap::Parser;
use pool_engine::{DepositIntent, Pool, Token, WithdrawIntent};
use std::collections::BTreeMap;

#[derive(Debug, Parser)]
struct Arguments {
    /// Token symbols making up the pool.
    #[clap(long, env, use_value_delimiter = true, default_value = "X,Y,Z")]
    tokens: Vec<String>,

    /// Per-token amounts of the initializing deposit, in token order.
    #[clap(long, env, use_value_delimiter = true, default_value = "200,300,150")]
    amounts: Vec<f64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,pool_engine=debug")),
        )
        .init();

    let args = Arguments::parse();
    anyhow::ensure!(
        args.amounts.len() == args.tokens.len(),
        "need one amount per token"
    );

    let tokens = args
        .tokens
        .iter()
        .cloned()
        .map(Token::new)
        .collect::<Vec<_>>();
    let mut pool = Pool::new(tokens.clone()).context("construct pool")?;
    print_status("constructed", &pool)?;

    let amounts = tokens
        .iter()
        .cloned()
        .zip(args.amounts.iter().copied())
        .collect::<BTreeMap<_, _>>();
    let shares = pool.deposit_all(&amounts).context("all-asset deposit")?;
    tracing::info!(shares, "all-asset deposit");
    print_status("initialized", &pool)?;

    let single = BTreeMap::from([(tokens[0].clone(), 100.)]);
    let shares = pool.deposit_one(&single).context("single-asset deposit")?;
    tracing::info!(shares, "single-asset deposit");

    let amount_out = pool.swap(&tokens[0], &tokens[1], 50.).context("swap")?;
    tracing::info!(amount_out, "swap");

    let amount_out = pool
        .withdraw_one(&tokens[0], shares / 2.)
        .context("single-asset withdrawal")?;
    tracing::info!(amount_out, "single-asset withdrawal");
    print_status("after trading", &pool)?;

    let (tokens_out, shares_out) = pool
        .equalize(
            &DepositIntent {
                amounts: BTreeMap::from([(tokens[1].clone(), 10.)]),
                shares: 0.,
            },
            &WithdrawIntent {
                ratios: tokens.iter().map(|token| (token.clone(), 1.)).collect(),
                share_ratio: 1.,
            },
        )
        .context("equalize")?;
    tracing::info!(?tokens_out, shares_out, "equalize");
    print_status("after equalize", &pool)?;

    Ok(())
}

fn print_status(step: &str, pool: &Pool) -> Result<()> {
    let status = serde_json::to_string_pretty(&pool.status())?;
    println!("{step}:\n{status}");
    Ok(())
}
