//! Minimal example: issuing, sharing, restricting and revoking keys.
//!
//! Run with: `RUST_LOG=capkey=debug cargo run --example issue_and_restrict`
//!
//! - The issuer mints an unrestricted key for a project
//! - A holder derives a read-only, single-bucket key offline
//! - The issuer checks both, then revokes the derived key by its tail

use capkey::{generate_secret, Action, ApiKey, Caveat, Operation, RevocationSet};
use chrono::{Duration, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // 1. Issuer side
    let project_secret = generate_secret()?;
    let root = ApiKey::new(&project_secret);
    println!("root key:    {}", root);

    // 2. Holder side: attenuate without talking to the issuer
    let shared = ApiKey::parse(&root.serialize())?
        .restrict(
            &Caveat::disallow(Operation::Write)
                .with_buckets(["photos"])
                .not_after(Utc::now() + Duration::hours(1))
                .with_nonce()?,
        )?;
    println!("shared key:  {}", shared);
    println!("caveats:     {:?}", shared.caveats()?);

    // 3. Issuer checks requests made with the shared key
    let mut revoked = RevocationSet::new();
    let read = Action::now(Operation::Read).with_bucket("photos");
    let write = Action::now(Operation::Write).with_bucket("photos");

    println!("read:        {:?}", shared.check(&project_secret, &read, &revoked));
    println!("write:       {:?}", shared.check(&project_secret, &write, &revoked).map_err(|e| e.to_string()));

    // 4. Revoke the shared key; the root key keeps working
    revoked.insert(shared.tail());
    println!("after revoke: {:?}", shared.check(&project_secret, &read, &revoked).map_err(|e| e.to_string()));
    println!("root still:  {:?}", root.check(&project_secret, &read, &revoked));

    Ok(())
}
