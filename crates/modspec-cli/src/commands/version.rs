use miette::{IntoDiagnostic, Result};
use modspec_core::version::{version_info, version_string};

pub fn run(json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string(&version_info()).into_diagnostic()?
        );
    } else {
        println!("{}", version_string());
    }
    Ok(())
}
