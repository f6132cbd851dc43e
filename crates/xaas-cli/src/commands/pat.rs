//! `xaas pat`: generate personal access tokens offline.

use clap::Args;
use xaas_common::constants;
use xaas_functions::pats;

/// Arguments for the `pat` command.
#[derive(Args, Debug)]
pub struct PatArgs {
    /// Token prefix.
    #[arg(long, env = constants::ACRONYM_ENV, default_value = constants::ACRONYM_DEFAULT)]
    pub acronym: String,

    /// Number of tokens to print.
    #[arg(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}

/// Executes the `pat` command.
///
/// # Errors
///
/// Returns an error if the acronym is empty.
pub fn execute(args: &PatArgs) -> anyhow::Result<()> {
    if args.acronym.is_empty() {
        anyhow::bail!("acronym must not be empty");
    }
    let mut rng = rand::thread_rng();
    for _ in 0..args.count {
        println!("{}", pats::generate_token(&args.acronym, &mut rng));
    }
    Ok(())
}
