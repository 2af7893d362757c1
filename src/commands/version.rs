use anyhow::Result;

pub fn execute() -> Result<()> {
    println!("gamer-reminder version {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
