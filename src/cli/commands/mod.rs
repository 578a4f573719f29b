use crate::config::{config, SESSION_ENV_VAR};
use crate::portal::{DocumentService, PortalClient};
use anyhow::Result;
use std::io::Write;
use std::sync::Arc;

pub mod lock;
pub mod remind;
pub mod status;
pub mod upload;

pub async fn with_portal<F, Fut, R>(f: F) -> Result<R>
where
    F: FnOnce(Arc<dyn DocumentService>) -> Fut + Send,
    Fut: std::future::Future<Output = Result<R>> + Send,
    R: Send,
{
    let cfg = config()?;
    print!("🔄 Connecting to {}... ", cfg.api.base_url);
    std::io::stdout().flush()?;

    match PortalClient::new(&cfg.api) {
        Ok(client) => {
            println!("✅");
            f(Arc::new(client)).await
        }
        Err(e) => {
            println!("❌ Failed to set up the portal client");
            Err(e.into())
        }
    }
}

pub async fn show_how_to_get_started() -> Result<()> {
    println!("📒 Ledger Portal - Monthly document submission");
    println!();
    println!("To get started:");
    println!("  📊 ledger-portal status --year 2026 --month 3   # See where a month stands");
    println!("  📤 ledger-portal upload --year 2026 --month 3 --sales sales.pdf");
    println!("  🔒 ledger-portal lock --year 2026 --month 3     # Hand the month to your bookkeeper");
    println!("  🔔 ledger-portal remind --year 2026 --month 3 --set paid");
    println!();
    println!("💡 Set {SESSION_ENV_VAR} to your session token before connecting.");
    Ok(())
}
