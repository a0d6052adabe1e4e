use std::io::Write;

use futures::StreamExt;
use promptchain_chain::StreamOptions;

use super::{build_chain, load_config};

/// Input parameters for the Stream command strategy.
#[derive(Debug, Clone)]
pub struct StreamInput {
    pub prompt: String,
    pub model: Option<String>,
    /// Print raw provider events instead of text
    pub raw: bool,
}

/// Strategy that streams one reply to stdout as it arrives.
#[derive(Debug, Clone, Copy)]
pub struct StreamStrategy;

impl super::CommandStrategy for StreamStrategy {
    type Input = StreamInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_config(input.model)?;
        let mut chain = build_chain(&config)?;
        chain.link(input.prompt)?;

        let options = StreamOptions {
            plain_text: !input.raw,
            ..StreamOptions::default()
        };
        let mut stream = chain.stream(options).await?;

        let mut stdout = std::io::stdout();
        while let Some(item) = stream.next().await {
            let item = item?;
            if input.raw {
                writeln!(stdout, "{item:?}")?;
            } else if let Some(text) = item.text() {
                write!(stdout, "{text}")?;
                stdout.flush()?;
            }
        }
        writeln!(stdout)?;
        Ok(())
    }
}
