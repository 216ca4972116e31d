//! `folio fingerprint`: the rate-limit identifier of this client.

use anyhow::Result;
use clap::Args;
use folio_core::fingerprint::ClientTraits;

use super::print_json;

/// Arguments for `folio fingerprint`.
#[derive(Debug, Args)]
pub struct FingerprintArgs {
    /// Print the traits and fingerprint as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &FingerprintArgs) -> Result<()> {
    let traits = ClientTraits::default();
    if args.json {
        return print_json(&serde_json::json!({
            "traits": traits,
            "fingerprint": traits.fingerprint(),
        }));
    }
    println!("{}", traits.fingerprint());
    println!("  from: {}", traits.components());
    Ok(())
}
