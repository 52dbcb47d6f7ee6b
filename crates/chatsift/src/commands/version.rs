pub fn run() -> anyhow::Result<()> {
    println!("chatsift {}", env!("CARGO_PKG_VERSION"));
    println!("Incremental insight extraction and reporting for chat exports");
    Ok(())
}
