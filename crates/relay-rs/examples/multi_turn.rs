//! Minimal multi-turn chat example — one node, history carried by the caller.
//!
//! Dispatches two `turbo` envelopes through the same node, re-supplying the
//! history from the first reply so the second turn continues the
//! conversation.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example multi_turn
//! ```

use relay_rs::prelude::*;

#[tokio::main]
async fn main() -> Result<(), String> {
    // 1. Create the node. The client is built once and reused.
    let api_key = std::env::var("OPENAI_API_KEY")
        .map_err(|_| "Set OPENAI_API_KEY env var to your OpenAI API key")?;
    let node = Node::new(NodeConfig::new(api_key))
        .map_err(|e| e.to_string())?
        .with_reporter(LoggingReporter);

    // 2. First turn.
    let (reply, status) = node
        .handle(Envelope::new("turbo", "Name three uses for a brick. Be terse."))
        .await;
    if status.is_error() {
        return Err(status.text);
    }
    println!("assistant: {}", reply.payload.clone().unwrap_or_default());

    // 3. Second turn — hand the accumulated history back.
    let mut followup = Envelope::new("turbo", "Now the strangest one you can think of.");
    followup.history = reply.history;
    let (reply, status) = node.handle(followup).await;
    if status.is_error() {
        return Err(status.text);
    }
    println!("assistant: {}", reply.payload.clone().unwrap_or_default());

    println!(
        "--- {} turns of history accumulated ---",
        reply.history_len()
    );
    Ok(())
}
