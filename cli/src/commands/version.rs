//! `termdock version` — print the version.

use anyhow::Result;

/// Run `termdock version`.
///
/// # Errors
///
/// Infallible; `Result` keeps the handler signature uniform.
pub fn run(json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::json!({ "version": env!("CARGO_PKG_VERSION") })
        );
    } else {
        println!("termdock {}", env!("CARGO_PKG_VERSION"));
    }
    Ok(())
}
