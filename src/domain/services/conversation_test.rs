use std::time::Duration;

use anyhow::Result;

use super::ConversationDriver;
use crate::domain::models::Author;
use crate::domain::models::ChatError;
use crate::domain::models::Content;
use crate::domain::models::PollPolicy;
use crate::domain::models::Role;
use crate::domain::models::RunStatus;
use crate::domain::models::SessionContext;
use crate::infrastructure::assistants::scripted::assistant_message;
use crate::infrastructure::assistants::scripted::user_message;
use crate::infrastructure::assistants::scripted::ScriptedAssistant;

fn fast_poll() -> PollPolicy {
    return PollPolicy {
        interval: Duration::from_millis(1),
        max_interval: Duration::from_millis(2),
        timeout: Duration::from_secs(5),
    };
}

fn driver(assistant: ScriptedAssistant) -> ConversationDriver {
    return ConversationDriver::new(Box::new(assistant), "asst_123", fast_poll());
}

fn logged_in_session() -> SessionContext {
    let mut session = SessionContext::new("Hi! How can I help?");
    session.logged_in = true;
    session.username = Some("alice".to_string());
    return session;
}

fn format_transcript(session: &SessionContext) -> String {
    return session
        .transcript
        .iter()
        .map(|message| {
            let role = match message.author {
                Author::User => "user",
                Author::Assistant => "assistant",
                Author::Muesli => "muesli",
            };
            return format!("{role}: {}", message.text);
        })
        .collect::<Vec<String>>()
        .join("\n");
}

#[tokio::test]
async fn it_runs_a_fresh_session_turn() -> Result<()> {
    let assistant = ScriptedAssistant::default()
        .with_statuses(vec![RunStatus::Queued, RunStatus::InProgress, RunStatus::Completed])
        .with_reply("Hello! What can I do for you?");
    let calls = assistant.calls();
    let driver = driver(assistant);
    let mut session = logged_in_session();

    let reply = driver.send(&mut session, "Hello").await?;

    assert_eq!(reply, "Hello! What can I do for you?");
    assert_eq!(session.conversation_id, Some("thread_1".to_string()));
    insta::assert_snapshot!(format_transcript(&session), @r###"
    assistant: Hi! How can I help?
    user: Hello
    assistant: Hello! What can I do for you?
    "###);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.create_thread, 1);
    assert_eq!(
        calls.add_message,
        vec![("thread_1".to_string(), Role::User, "Hello".to_string())]
    );
    assert_eq!(
        calls.create_run,
        vec![("thread_1".to_string(), "asst_123".to_string())]
    );
    assert_eq!(calls.get_run, 3);
    assert_eq!(calls.list_messages, 1);
    assert_eq!(calls.cancel_run, 0);

    return Ok(());
}

#[tokio::test]
async fn it_checks_status_exactly_until_completed() -> Result<()> {
    for k in 1..=5 {
        let mut statuses = vec![RunStatus::InProgress; k - 1];
        statuses.push(RunStatus::Completed);

        let assistant = ScriptedAssistant::default()
            .with_statuses(statuses)
            .with_reply("Done");
        let calls = assistant.calls();
        let driver = driver(assistant);

        let run = driver.run_and_await("thread_1").await?;

        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(calls.lock().unwrap().get_run, k);
    }

    return Ok(());
}

#[tokio::test]
async fn it_reuses_the_conversation() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_reply("Sure.");
    let calls = assistant.calls();
    let driver = driver(assistant);
    let mut session = logged_in_session();

    driver.send(&mut session, "First").await?;
    let first_id = session.conversation_id.clone();
    driver.send(&mut session, "Second").await?;

    assert_eq!(session.conversation_id, first_id);
    assert_eq!(session.transcript.len(), 5);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.create_thread, 1);
    assert_eq!(
        calls
            .add_message
            .iter()
            .map(|(thread_id, _, _)| return thread_id.as_str())
            .collect::<Vec<&str>>(),
        vec!["thread_1", "thread_1"]
    );

    return Ok(());
}

#[tokio::test]
async fn it_starts_a_new_conversation_after_reset() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_reply("Sure.");
    let calls = assistant.calls();
    let driver = driver(assistant);
    let mut session = logged_in_session();

    driver.send(&mut session, "First").await?;
    session.reset();
    driver.send(&mut session, "Second").await?;

    assert_eq!(session.conversation_id, Some("thread_2".to_string()));
    assert_eq!(session.transcript.len(), 3);
    assert_eq!(calls.lock().unwrap().create_thread, 2);

    return Ok(());
}

#[tokio::test]
async fn it_picks_the_first_assistant_message_and_text_block() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_messages(vec![
        user_message("msg_4", "Are you there?"),
        assistant_message(
            "msg_3",
            vec![
                Content::Other("image_file".to_string()),
                Content::Text("Newest".to_string()),
                Content::Text("Newest, second block".to_string()),
            ],
        ),
        user_message("msg_2", "Hello"),
        assistant_message("msg_1", vec![Content::Text("Oldest".to_string())]),
    ]);
    let driver = driver(assistant);

    let reply = driver.extract_reply("thread_1").await?;
    assert_eq!(reply, "Newest");

    return Ok(());
}

#[tokio::test]
async fn it_skips_assistant_messages_without_text() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_messages(vec![
        assistant_message("msg_3", vec![Content::Other("image_file".to_string())]),
        assistant_message("msg_2", vec![Content::Text("".to_string())]),
        assistant_message("msg_1", vec![Content::Text("Older text".to_string())]),
    ]);
    let driver = driver(assistant);

    let reply = driver.extract_reply("thread_1").await?;
    assert_eq!(reply, "Older text");

    return Ok(());
}

#[tokio::test]
async fn it_fails_without_an_assistant_reply() {
    let assistant =
        ScriptedAssistant::default().with_messages(vec![user_message("msg_1", "Hello")]);
    let driver = driver(assistant);

    let res = driver.extract_reply("thread_1").await;
    assert!(matches!(res, Err(ChatError::EmptyReply)));
}

#[tokio::test]
async fn it_maps_failed_runs() {
    let assistant = ScriptedAssistant::default()
        .with_statuses(vec![RunStatus::InProgress, RunStatus::Failed])
        .with_last_error("rate_limit_exceeded", "Slow down.");
    let calls = assistant.calls();
    let driver = driver(assistant);

    let res = driver.run_and_await("thread_1").await;
    match res {
        Err(ChatError::RunFailed { code, message }) => {
            assert_eq!(code, "rate_limit_exceeded");
            assert_eq!(message, "Slow down.");
        }
        _ => panic!("expected a failed run"),
    }
    assert_eq!(calls.lock().unwrap().get_run, 2);
}

#[tokio::test]
async fn it_maps_every_other_terminal_status() {
    let cases = vec![
        RunStatus::Cancelled,
        RunStatus::Expired,
        RunStatus::Incomplete,
        RunStatus::RequiresAction,
    ];

    for status in cases {
        let assistant = ScriptedAssistant::default().with_statuses(vec![status]);
        let calls = assistant.calls();
        let driver = driver(assistant);

        let res = driver.run_and_await("thread_1").await;
        let err = res.expect_err("terminal status must end the poll");
        match status {
            RunStatus::Cancelled => assert!(matches!(err, ChatError::RunCancelled)),
            RunStatus::Expired => assert!(matches!(err, ChatError::RunExpired)),
            RunStatus::Incomplete => assert!(matches!(err, ChatError::RunIncomplete)),
            RunStatus::RequiresAction => {
                assert!(matches!(err, ChatError::RunRequiresAction));
                assert_eq!(calls.lock().unwrap().cancel_run, 1);
            }
            _ => unreachable!(),
        }
        assert_eq!(calls.lock().unwrap().get_run, 1);
    }
}

#[tokio::test]
async fn it_keeps_polling_unknown_statuses() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_statuses(vec![
        RunStatus::Unknown,
        RunStatus::Cancelling,
        RunStatus::Completed,
    ]);
    let calls = assistant.calls();
    let driver = driver(assistant);

    driver.run_and_await("thread_1").await?;
    assert_eq!(calls.lock().unwrap().get_run, 3);

    return Ok(());
}

#[tokio::test]
async fn it_times_out_and_cancels_the_run() {
    let assistant = ScriptedAssistant::default().with_statuses(vec![RunStatus::InProgress]);
    let calls = assistant.calls();
    let driver = ConversationDriver::new(
        Box::new(assistant),
        "asst_123",
        PollPolicy {
            interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(5),
            timeout: Duration::from_millis(30),
        },
    );

    let res = driver.run_and_await("thread_1").await;
    match res {
        Err(ChatError::RunTimedOut { waited }) => {
            assert!(waited >= Duration::from_millis(30));
        }
        _ => panic!("expected a timeout"),
    }

    let calls = calls.lock().unwrap();
    assert!(calls.get_run >= 2);
    assert_eq!(calls.cancel_run, 1);
}

#[tokio::test]
async fn it_times_out_even_when_cancel_fails() {
    let assistant = ScriptedAssistant::default()
        .with_statuses(vec![RunStatus::Queued])
        .failing("cancel_run");
    let driver = ConversationDriver::new(
        Box::new(assistant),
        "asst_123",
        PollPolicy {
            interval: Duration::from_millis(1),
            max_interval: Duration::from_millis(1),
            timeout: Duration::from_millis(5),
        },
    );

    let res = driver.run_and_await("thread_1").await;
    assert!(matches!(res, Err(ChatError::RunTimedOut { .. })));
}

#[tokio::test]
async fn it_refuses_logged_out_sessions() {
    let assistant = ScriptedAssistant::default().with_reply("Hi");
    let calls = assistant.calls();
    let driver = driver(assistant);
    let mut session = SessionContext::new("Hi! How can I help?");

    let res = driver.send(&mut session, "Hello").await;

    assert!(matches!(res, Err(ChatError::NotAuthenticated)));
    assert_eq!(session.transcript.len(), 1);
    assert_eq!(session.conversation_id, None);

    let calls = calls.lock().unwrap();
    assert_eq!(calls.create_thread, 0);
    assert!(calls.add_message.is_empty());
}

#[tokio::test]
async fn it_keeps_the_user_turn_when_the_turn_fails() {
    let assistant = ScriptedAssistant::default()
        .with_reply("Hi")
        .failing("create_run");
    let driver = driver(assistant);
    let mut session = logged_in_session();

    let res = driver.send(&mut session, "Hello").await;

    let err = res.expect_err("create_run is down");
    assert!(err.is_transport());
    assert_eq!(session.conversation_id, Some("thread_1".to_string()));
    assert_eq!(session.transcript.len(), 2);
    assert_eq!(session.transcript[1].author, Author::User);
    assert_eq!(session.transcript[1].text, "Hello");
}

#[tokio::test]
async fn it_leaves_a_fresh_session_without_conversation_when_creation_fails() {
    let assistant = ScriptedAssistant::default().failing("create_thread");
    let calls = assistant.calls();
    let driver = driver(assistant);
    let mut session = logged_in_session();

    let res = driver.send(&mut session, "Hello").await;

    assert!(matches!(res, Err(ChatError::Transport(_))));
    assert_eq!(session.conversation_id, None);
    assert!(calls.lock().unwrap().add_message.is_empty());
}

#[tokio::test]
async fn it_cancels_the_run_of_a_dropped_turn_once() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_statuses(vec![RunStatus::InProgress]);
    let calls = assistant.calls();
    let driver = driver(assistant);

    let res = tokio::time::timeout(
        Duration::from_millis(20),
        driver.run_and_await("thread_1"),
    )
    .await;
    assert!(res.is_err());
    assert_eq!(calls.lock().unwrap().cancel_run, 0);

    driver.cancel_active_run().await;
    driver.cancel_active_run().await;
    assert_eq!(calls.lock().unwrap().cancel_run, 1);

    return Ok(());
}

#[tokio::test]
async fn it_forgets_runs_once_they_finish() -> Result<()> {
    let assistant = ScriptedAssistant::default().with_reply("Hello!");
    let calls = assistant.calls();
    let driver = driver(assistant);
    let mut session = logged_in_session();

    driver.send(&mut session, "Hello").await?;
    driver.cancel_active_run().await;

    assert_eq!(calls.lock().unwrap().cancel_run, 0);

    return Ok(());
}
