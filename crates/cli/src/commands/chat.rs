//! Interactive chat — the session surface.
//!
//! One free-text message per turn in, one final answer out. While a turn
//! is in flight the surface also services clarification requests from the
//! `ask_user` tool: the question is printed and the next stdin line is
//! sent back as the reply.

use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;

use cipher_agent::{AgentLoop, AgentSession};
use cipher_core::event::EventBus;
use cipher_tools::ClarificationRequest;

use super::wiring::{self, CliError};

pub async fn run(config_path: &Path, message: Option<String>) -> Result<(), CliError> {
    let config = wiring::load_config(config_path)?;

    let memory = wiring::open_memory_store(&config).await?;
    let provider = wiring::build_provider(&config)?;

    let (clar_tx, mut clar_rx) = mpsc::channel::<ClarificationRequest>(8);
    let executor = wiring::build_executor(&config, memory.clone(), Some(clar_tx))?;

    let mut agent = AgentLoop::new(
        provider,
        config.provider.model.clone(),
        config.provider.temperature,
        executor,
        Arc::new(EventBus::default()),
    )
    .with_max_iterations(config.agent.max_iterations)
    .with_max_tokens(config.provider.max_tokens)
    .with_memory(memory)
    .with_auto_save(config.agent.auto_save)
    .with_recall_limit(config.agent.recall_limit);

    if let Some(prompt) = &config.agent.system_prompt {
        agent = agent.with_system_prompt(prompt.clone());
    }

    let mut session = AgentSession::new(Arc::new(agent), config.agent.window_turns);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    // Single-message mode
    if let Some(text) = message {
        let answer = run_turn(&mut session, &text, &mut clar_rx, &mut lines).await;
        println!("{answer}");
        return Ok(());
    }

    // Interactive REPL
    println!("Cipher ready. Type a message, or 'exit' to quit.");
    loop {
        let Some(line) = lines.next_line().await? else {
            break; // EOF (Ctrl+D)
        };
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if matches!(line.as_str(), "exit" | "quit" | "/exit" | "/quit" | ":q") {
            break;
        }

        let answer = run_turn(&mut session, &line, &mut clar_rx, &mut lines).await;
        println!("{answer}");
    }

    println!("Goodbye.");
    Ok(())
}

/// Drive one turn to completion while answering clarification requests
/// from stdin.
async fn run_turn(
    session: &mut AgentSession,
    text: &str,
    clar_rx: &mut mpsc::Receiver<ClarificationRequest>,
    lines: &mut Lines<BufReader<Stdin>>,
) -> String {
    let turn = session.handle_message(text);
    tokio::pin!(turn);

    loop {
        tokio::select! {
            answer = &mut turn => return answer,
            request = clar_rx.recv() => {
                // The sender lives inside the tool registry, so the
                // channel cannot close mid-turn; finish the turn if it
                // somehow does.
                let Some(request) = request else {
                    return (&mut turn).await;
                };
                println!("[Cipher asks] {}", request.question);
                match lines.next_line().await {
                    Ok(Some(reply)) => {
                        let _ = request.reply.send(reply.trim().to_string());
                    }
                    // EOF or a read error counts as "no response"; the
                    // tool's timeout produces the sentinel observation.
                    _ => drop(request.reply),
                }
            }
        }
    }
}
