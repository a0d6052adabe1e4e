use promptchain_config::Config;

/// Strategy for initializing the configuration.
///
/// Writes the default configuration to `~/promptchain/config.json`.
#[derive(Debug, Clone, Copy)]
pub struct InitStrategy;

impl super::CommandStrategy for InitStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let path = Config::create_config()?;

        println!("✅ Created config file at: {}", path.display());
        println!();
        println!("📝 Next steps:");
        println!("   1. Export OPENAI_API_KEY, or set provider.api_key in the file");
        println!("   2. Run 'promptchain demo' to walk through a chained conversation");
        println!();
        Ok(())
    }
}
