//! End-to-end chat sessions driven through the REPL with a scripted provider

use std::sync::Arc;

use aiagent::llm::{LLMProvider, MockProvider};
use aiagent::{Config, ConversationLoop, Repl};

fn chatbot(provider: &Arc<MockProvider>) -> Repl<ConversationLoop> {
    let llm = Arc::clone(provider) as Arc<dyn LLMProvider>;
    let mut chatbot = ConversationLoop::new(llm, &Config::default());
    chatbot.set_streaming(true);
    Repl::new(chatbot)
}

async fn session(repl: &mut Repl<ConversationLoop>, script: &str) -> String {
    let mut out = Vec::new();
    repl.run_with(script.as_bytes(), &mut out, std::future::pending())
        .await
        .unwrap();
    String::from_utf8(out).unwrap()
}

#[tokio::test]
async fn test_hello_then_exit() {
    let provider = Arc::new(MockProvider::new().reply("Hi there!"));
    let mut repl = chatbot(&provider);

    let out = session(&mut repl, "Hello\nexit\n").await;

    assert_eq!(
        out,
        "Chat with the AI agent! Type 'exit' or 'quit' to end.\n\
         You: AI: Hi there!\n\
         You: Goodbye!\n"
    );
    let history = repl.handler().conversation().messages();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].content, "Hello");
    assert_eq!(history[1].content, "Hi there!");
}

#[tokio::test]
async fn test_streamed_reply_is_printed_once() {
    let provider = Arc::new(MockProvider::new().streamed(&["Hi", " there", "!"]));
    let mut repl = chatbot(&provider);

    let out = session(&mut repl, "Hello\nquit\n").await;

    assert!(out.contains("You: AI: Hi there!\nYou: Goodbye!\n"));
    assert_eq!(out.matches("Hi there!").count(), 1);
}

#[tokio::test]
async fn test_failed_turn_does_not_end_session() {
    let provider = Arc::new(
        MockProvider::new()
            .reply("one")
            .fail("upstream timeout")
            .reply("three"),
    );
    let mut repl = chatbot(&provider);

    let out = session(&mut repl, "first\nsecond\nthird\nexit\n").await;

    assert!(out.contains("An error occurred: Provider error: upstream timeout\nPlease try again.\n"));
    assert!(out.contains("AI: three"));
    assert!(out.ends_with("Goodbye!\n"));

    // The failed turn keeps its user message but gets no reply
    let roles: Vec<String> = repl
        .handler()
        .conversation()
        .messages()
        .iter()
        .map(|m| format!("{}:{}", m.role, m.content))
        .collect();
    assert_eq!(
        roles,
        vec![
            "user:first",
            "assistant:one",
            "user:second",
            "user:third",
            "assistant:three"
        ]
    );

    // The third request carried the whole history
    assert_eq!(provider.calls()[2].len(), 4);
}

#[tokio::test]
async fn test_empty_reply_prints_apology() {
    let provider = Arc::new(MockProvider::new().empty());
    let mut repl = chatbot(&provider);

    let out = session(&mut repl, "Hello\nexit\n").await;

    assert!(out.contains("AI: Sorry, I couldn't generate a response.\n"));
    assert_eq!(repl.handler().conversation().len(), 1);
}

#[tokio::test]
async fn test_blank_lines_never_reach_the_model() {
    let provider = Arc::new(MockProvider::new());
    let mut repl = chatbot(&provider);

    let out = session(&mut repl, "\n   \n\t\nEXIT\n").await;

    assert!(out.ends_with("Goodbye!\n"));
    assert_eq!(provider.call_count(), 0);
    assert!(repl.handler().conversation().is_empty());
}
