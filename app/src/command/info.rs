use promptchain_config::Config;

/// Strategy for displaying the effective configuration.
///
/// The API key is masked. A missing key is reported, not returned as an error.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== promptchain Configuration ===\n");

        println!("Provider:");
        println!("  Base URL: {}", config.provider.base_url);
        println!("  Key variable: {}", config.provider.environ_key);
        match config.provider.resolve_api_key() {
            Ok(key) => println!("  API Key: {}", mask_key(&key)),
            Err(e) => println!("  API Key: missing ({e})"),
        }
        println!();

        println!("Models:");
        println!("  Default: {}", config.model);
        println!("  JSON mode: {}", config.json_model);
        println!();

        println!("Pull Defaults:");
        println!("  Retries: {}", config.pull.retry_count);
        match config.pull.timeout_ms {
            Some(ms) => println!("  Timeout: {ms} ms"),
            None => println!("  Timeout: none"),
        }

        Ok(())
    }
}

fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "***".to_string()
    }
}
