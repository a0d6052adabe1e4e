//! Walk-through of a chained conversation.
//!
//! Each step feeds the previous reply into the next prompt: ask a question,
//! extract a city as JSON, outline a story about it, elaborate the first act,
//! then summarize that act.

use promptchain_chain::{Prompt, PullOptions};
use promptchain_core::CallParameters;
use serde_json::json;

use super::{build_chain, load_config};

/// Input parameters for the Demo command strategy.
#[derive(Debug, Clone)]
pub struct DemoInput {
    /// Optional default model override
    pub model: Option<String>,
}

#[derive(Debug, Clone, Copy)]
pub struct DemoStrategy;

impl super::CommandStrategy for DemoStrategy {
    type Input = DemoInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = load_config(input.model)?;
        let base = PullOptions::from_config(&config);
        let mut chain = build_chain(&config)?;

        chain
            .anchor("You are a historian.")
            .link("What is the capital of France?")?
            .pull(base.clone())
            .await?;
        chain.log();
        chain.unhook();

        chain
            .link(Prompt::reply(|desc| {
                format!("Extract the city in this statement: {desc}")
            }))?
            .pull(base.clone().with_json_schema(json!({ "city": "string" })))
            .await?;
        chain.transform(|reply| reply.pick("city"));
        chain.log();
        chain.unhook();

        chain
            .anchor("You are an expert storyteller.")
            .link(Prompt::reply(|city| {
                format!("Design a basic three-act point-form short story about {city}.")
            }))?
            .link_as_assistant("How long should it be?")?
            .link("Around 100 words.")?
            .pull(base.clone().with_params(CallParameters::default().with_max_tokens(512)))
            .await?;
        chain.log();
        chain.unhook();

        chain
            .anchor(
                "You are a novelist. Your job is to write a novel about a story that you have heard.",
            )
            .link(Prompt::reply(|storyline| {
                format!("Briefly elaborate on the first act of the storyline: {storyline}")
            }))?
            .pull(base.clone().with_params(
                CallParameters::default()
                    .with_max_tokens(256)
                    .with_model(config.json_model.clone()),
            ))
            .await?;
        chain.log();
        chain.unhook();

        chain
            .link(Prompt::reply(|act| {
                format!("Summarize this act in around three words:\n{act}")
            }))?
            .pull(base.with_params(CallParameters::default().with_model(config.json_model.clone())))
            .await?;

        chain.log_tokens();

        if let Some(result) = chain.last() {
            println!("Result: {result}");
        }
        Ok(())
    }
}
