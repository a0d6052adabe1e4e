//! Static strategy pattern for CLI commands.
//!
//! Each command is a separate strategy type with its own input, dispatched
//! statically from `main`.

use promptchain_chain::ConversationChain;
use promptchain_config::Config;
use promptchain_providers::OpenAiProvider;
use tracing::info;

mod demo;
mod info;
mod init;
mod stream;
mod version;

pub use demo::{DemoInput, DemoStrategy};
pub use info::InfoStrategy;
pub use init::InitStrategy;
pub use stream::{StreamInput, StreamStrategy};
pub use version::VersionStrategy;

/// Contract shared by all command strategies.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}

/// Load the config file, applying a command-line model override.
fn load_config(model: Option<String>) -> anyhow::Result<Config> {
    let mut config = Config::load()?;
    if let Some(model) = model {
        config.model = model;
    }
    info!("Using model {}", config.model);
    Ok(config)
}

fn build_chain(config: &Config) -> anyhow::Result<ConversationChain<OpenAiProvider>> {
    Ok(ConversationChain::from_config(config)?)
}
