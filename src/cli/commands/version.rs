//! `jm version`.

use crate::error::Result;
use crate::output::OutputContext;
use serde::Serialize;

#[derive(Serialize)]
struct VersionOutput<'a> {
    name: &'a str,
    version: &'a str,
    build: &'a str,
}

/// Print the package version and build flavor.
///
/// # Errors
///
/// Does not fail.
pub fn execute(out: &OutputContext) -> Result<()> {
    let output = VersionOutput {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        build: if cfg!(debug_assertions) { "dev" } else { "release" },
    };

    if out.is_json() {
        out.json(&output);
    } else {
        println!("jm version {} ({})", output.version, output.build);
    }
    Ok(())
}
