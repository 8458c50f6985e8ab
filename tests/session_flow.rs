//! End-to-end session tests against an in-process fake IRC server.

mod common;

use common::FakeServer;
use slirc_logbot::BotError;
use slirc_logbot::log::format::file_name;
use std::path::Path;

fn today_log(dir: &Path, stem: &str) -> Vec<String> {
    let path = dir.join(file_name(stem, chrono::Utc::now().date_naive()));
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .map(str::to_string)
        .collect()
}

#[tokio::test]
async fn test_full_session() {
    let logs = tempfile::tempdir().unwrap();
    let (mut server, bot) = FakeServer::start(logs.path(), &["#rust", "#go-nuts"]).await;

    // Registration, with the preferred nick taken.
    server.expect("NICK goyal").await;
    server.expect_prefix("USER goyal ").await;
    server
        .send(":irc.test 433 * goyal :Nickname is already in use")
        .await;
    server.expect("NICK goyal_").await;
    server.send(":irc.test 001 goyal_ :Welcome").await;
    server.expect("JOIN #rust").await;
    server.expect("JOIN #go-nuts").await;

    // Keepalive.
    server.send("PING :irc.test").await;
    server.expect("PONG irc.test").await;

    // Our own join.
    server.send(":goyal_!goyal@bot.host JOIN #rust").await;
    server
        .expect("PRIVMSG #rust :Hello, I'm yet another logbot written in Rust.")
        .await;

    // Leave a message for alice.
    server
        .send(":bob!bob@host PRIVMSG #rust :,tell alice see you at 5")
        .await;
    server
        .expect("PRIVMSG #rust :bob: I'll pass that on when alice is around.")
        .await;

    // Direct messages are refused, and commands in them are not run.
    server.send(":bob!bob@host PRIVMSG goyal_ :,tell carol hi").await;
    server
        .expect("PRIVMSG bob :Sorry, I don't accept direct messages!")
        .await;

    // alice shows up and gets her message.
    server.send(":alice!alice@host JOIN #rust").await;
    server
        .expect("PRIVMSG #rust :Hello alice, Welcome to #rust!")
        .await;
    let delivered = server.expect_prefix("PRIVMSG alice :bob left you a message on ").await;
    assert!(delivered.ends_with("UTC: see you at 5"));

    server.send(":alice!alice@host PRIVMSG #rust :\x01ACTION waves\x01").await;
    server.send(":alice!alice@host PART #rust :later").await;
    server.send(":bob!bob@host QUIT :Client quit").await;

    // A PING round-trip proves the lines above were processed.
    server.send("PING :sync").await;
    server.expect("PONG sync").await;

    assert_eq!(bot.bot.mailbox.pending("carol"), 0);
    assert_eq!(bot.bot.mailbox.recipients(), 0);

    bot.shutdown().await.unwrap();
    server.expect("QUIT :Logbot shutting down").await;

    let rust = today_log(logs.path(), "rust");
    let bodies: Vec<&str> = rust
        .iter()
        .map(|l| l.split_once("> ").map(|(_, body)| body).unwrap_or(""))
        .collect();
    assert_eq!(
        bodies,
        vec![
            "goyal_ entered #rust",
            "bob: ,tell alice see you at 5",
            "alice entered #rust",
            "***alice waves",
            "alice left #rust",
            "bob quit IRC.",
        ]
    );
    assert_eq!(today_log(logs.path(), "go-nuts").len(), 1);
}

#[tokio::test]
async fn test_rename_triggers_delivery() {
    let logs = tempfile::tempdir().unwrap();
    let (mut server, bot) = FakeServer::start(logs.path(), &["#rust"]).await;
    server.register("goyal").await;
    server.expect("JOIN #rust").await;

    server
        .send(":bob!bob@host PRIVMSG #rust :,tell Alice lunch?")
        .await;
    server.expect_prefix("PRIVMSG #rust :bob: ").await;

    server.send(":alice_away!alice@host NICK :alice").await;
    let delivered = server.expect_prefix("PRIVMSG alice :bob left you").await;
    assert!(delivered.ends_with("UTC: lunch?"));

    bot.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_server_hang_up_ends_session() {
    let logs = tempfile::tempdir().unwrap();
    let (mut server, bot) = FakeServer::start(logs.path(), &["#rust"]).await;
    server.register("goyal").await;
    server.expect("JOIN #rust").await;

    server.hang_up().await;

    bot.join().await.unwrap();
}

#[tokio::test]
async fn test_unwritable_log_is_fatal() {
    let logs = tempfile::tempdir().unwrap();
    let (mut server, bot) = FakeServer::start(logs.path(), &["#rust"]).await;
    let state = std::sync::Arc::clone(&bot.bot);

    // Squat on today's file name with a directory.
    let blocked = logs
        .path()
        .join(file_name("rust", chrono::Utc::now().date_naive()));
    std::fs::create_dir(&blocked).unwrap();

    server.register("goyal").await;
    server.expect("JOIN #rust").await;
    server.send(":bob!bob@host PART #rust").await;

    let err = bot.join().await.unwrap_err();
    assert!(matches!(err, BotError::Log(_)));

    state.logs.close_all();
    assert!(state.logs.is_closed());
}
