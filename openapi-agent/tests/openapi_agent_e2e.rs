//! The Pet Store assistant driven by a scripted model against a live server.

mod common;

use std::sync::Arc;

use common::spawn_server;
use openapi_agent::agent::Session;
use openapi_agent::models::Thread;
use openapi_agent::petstore;
use openapi_agent::test_support::FakeLlm;
use openapi_agent::tools::{OpenApiToolSet, ToolResult};
use petstore_server::ApiVariant;
use petstore_types::PetStatus;
use serde_json::json;

async fn live_toolset(base_url: &str) -> Arc<OpenApiToolSet> {
    Arc::new(
        OpenApiToolSet::from_url("petstore".into(), &format!("{base_url}/openapi.json"), None)
            .await
            .expect("document loads"),
    )
}

fn tool_results(thread: &Thread) -> Vec<ToolResult> {
    thread
        .tool_responses()
        .map(|response| response.result().clone())
        .collect()
}

#[tokio::test]
async fn adds_then_reads_back_a_pet() {
    let server = spawn_server(ApiVariant::Basic).await;
    let llm = FakeLlm::with_responses(
        "fake-gemini",
        vec![
            FakeLlm::tool_call_response(
                "addPet",
                json!({"body": {"id": 7, "name": "Rex", "status": "available"}}),
            ),
            FakeLlm::tool_call_response("getPetById", json!({"petId": 7})),
            FakeLlm::text_response("Rex (id 7) is now in the store and available."),
        ],
    );
    let agent = petstore::assistant(Arc::new(llm.clone()), live_toolset(&server.base_url).await);

    let mut session = Session::new();
    let answer = agent
        .run(&mut session, "Add a dog named Rex with id 7, then confirm it.")
        .await
        .unwrap();

    assert_eq!(answer, "Rex (id 7) is now in the store and available.");
    assert_eq!(llm.call_count(), 3);
    assert_eq!(server.store.get(7).unwrap().status, PetStatus::Available);

    let mut advertised = llm.advertised_tools()[0].clone();
    advertised.sort_unstable();
    assert_eq!(advertised, vec!["addPet", "getInventory", "getPetById", "updatePet"]);

    // The model sees the tool output unchanged by the logging callback.
    let last_prompt = llm.calls().pop().unwrap();
    assert_eq!(last_prompt.system(), Some(petstore::INSTRUCTION));
    let results = tool_results(&last_prompt);
    assert_eq!(results.len(), 2);
    assert!(results.iter().all(ToolResult::is_success));
    assert_eq!(results[1].data()["status"], 200);
    assert_eq!(results[1].data()["body"]["name"], "Rex");
    assert_eq!(tool_results(session.thread()), results);
}

#[tokio::test]
async fn api_errors_reach_the_model_as_tool_errors() {
    let server = spawn_server(ApiVariant::Basic).await;
    let llm = FakeLlm::with_responses(
        "fake-gemini",
        vec![
            FakeLlm::tool_call_response(
                "addPet",
                json!({"body": {"id": 0, "name": "doggie", "status": "available"}}),
            ),
            FakeLlm::text_response("A pet with id 0 already exists."),
        ],
    );
    let agent = petstore::assistant(Arc::new(llm.clone()), live_toolset(&server.base_url).await);

    let mut session = Session::new();
    let answer = agent.run(&mut session, "Add doggie again").await.unwrap();

    assert_eq!(answer, "A pet with id 0 already exists.");
    let results = tool_results(&llm.calls().pop().unwrap());
    let message = results[0].error_message().unwrap();
    assert!(message.starts_with("HTTP 400"), "{message}");
    assert_eq!(server.store.len(), 2);
}

#[tokio::test]
async fn session_keeps_history_between_turns() {
    let server = spawn_server(ApiVariant::Basic).await;
    let llm = FakeLlm::with_responses(
        "fake-gemini",
        vec![
            FakeLlm::tool_call_response("getInventory", json!({})),
            FakeLlm::text_response("One available, one pending."),
            FakeLlm::text_response("You asked about the inventory."),
        ],
    );
    let agent = petstore::assistant(Arc::new(llm.clone()), live_toolset(&server.base_url).await);

    let mut session = Session::new();
    agent.run(&mut session, "What is in stock?").await.unwrap();
    let answer = agent.run(&mut session, "What did I ask?").await.unwrap();

    assert_eq!(answer, "You asked about the inventory.");
    let transcript = llm.calls().pop().unwrap().transcript();
    assert!(transcript.starts_with("user: What is in stock?\ncall getInventory: {}"));
    assert!(transcript.contains("model: One available, one pending.\nuser: What did I ask?"));
    assert_eq!(tool_results(session.thread())[0].data()["body"]["available"], 1);
    assert!(session.thread().unanswered_calls().is_empty());
    agent.close().await;
}
