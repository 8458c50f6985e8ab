//! In-process fake IRC server and bot launcher.

use slirc_logbot::config::Config;
use slirc_logbot::{BotError, BotState, client, irc};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpListener;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Server side of one bot connection.
pub struct FakeServer {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

/// A bot running against a [`FakeServer`].
pub struct BotHandle {
    pub bot: Arc<BotState>,
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<Result<(), BotError>>,
}

impl BotHandle {
    /// Ask the bot to quit and wait for its session to end.
    pub async fn shutdown(mut self) -> Result<(), BotError> {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.join().await
    }

    /// Wait for the session to end on its own.
    pub async fn join(self) -> Result<(), BotError> {
        timeout(Duration::from_secs(5), self.task)
            .await
            .expect("bot did not stop in time")
            .expect("bot task panicked")
    }
}

/// Bot configuration pointing at `address`, logging into `log_dir`.
pub fn test_config(address: &str, log_dir: &Path, channels: &[&str]) -> Config {
    let channels = channels
        .iter()
        .map(|c| format!("\"{}\"", c))
        .collect::<Vec<_>>()
        .join(", ");
    let mut config: Config = toml::from_str(&format!(
        r##"
[bot]
nick = "goyal"
username = "goyal"

[server]
address = "{}"
tls = false
channels = [{}]
"##,
        address, channels
    ))
    .expect("test config parses");
    config.log.dir = log_dir.to_path_buf();
    config
}

impl FakeServer {
    /// Start a bot against a fresh fake server and accept its connection.
    pub async fn start(log_dir: &Path, channels: &[&str]) -> (FakeServer, BotHandle) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let address = listener.local_addr().expect("local addr").to_string();
        let config = Arc::new(test_config(&address, log_dir, channels));

        let (bot, outbound) = BotState::new(Arc::clone(&config)).expect("bot state");
        let stream = irc::connect(&config.server).await.expect("connect");
        let (accepted, _) = listener.accept().await.expect("accept");

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(client::run(stream, Arc::clone(&bot), outbound, async move {
            let _ = shutdown_rx.await;
        }));

        let (read_half, write_half) = accepted.into_split();
        let server = FakeServer {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        };
        let handle = BotHandle {
            bot,
            shutdown: Some(shutdown_tx),
            task,
        };
        (server, handle)
    }

    /// Send a raw line to the bot.
    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.expect("write");
        self.writer.write_all(b"\r\n").await.expect("write");
        self.writer.flush().await.expect("flush");
    }

    /// Next line from the bot, without the line ending.
    pub async fn recv(&mut self) -> String {
        let mut line = String::new();
        let read = timeout(Duration::from_secs(5), self.reader.read_line(&mut line))
            .await
            .expect("timed out waiting for the bot")
            .expect("read");
        assert!(read > 0, "bot closed the connection");
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    /// Assert the bot's next line is exactly `expected`.
    pub async fn expect(&mut self, expected: &str) {
        let line = self.recv().await;
        assert_eq!(line, expected);
    }

    /// Assert the bot's next line starts with `prefix`, returning it.
    pub async fn expect_prefix(&mut self, prefix: &str) -> String {
        let line = self.recv().await;
        assert!(
            line.starts_with(prefix),
            "expected line starting with {:?}, got {:?}",
            prefix,
            line
        );
        line
    }

    /// Drive registration up to the channel joins.
    pub async fn register(&mut self, nick: &str) {
        self.expect("NICK goyal").await;
        self.expect_prefix("USER goyal ").await;
        self.send(&format!(":irc.test 001 {} :Welcome to the test network", nick))
            .await;
    }

    /// Close the connection from the server side.
    pub async fn hang_up(mut self) {
        let _ = self.writer.shutdown().await;
    }
}
