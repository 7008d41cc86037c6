//! Audio output through an external player process

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use std::process::Stdio;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::task::JoinHandle;
use tracing::debug;
use triagestream_core::{Error, Result};

/// Encoded audio delivered incrementally
pub type AudioStream = BoxStream<'static, Result<Bytes>>;

/// Plays one message to completion
#[async_trait]
pub trait AudioSink: Send + Sync {
    /// Play a fully buffered clip; resolves when playback ends
    async fn play(&self, audio: Bytes) -> Result<()>;

    /// Play a clip as it arrives; resolves when playback ends
    async fn play_stream(&self, audio: AudioStream) -> Result<()>;
}

/// Pipes audio into the stdin of a player command (e.g. `ffplay -`)
#[derive(Debug, Clone)]
pub struct ProcessAudioSink {
    program: String,
    args: Vec<String>,
}

impl ProcessAudioSink {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `ffplay` reading MP3 from stdin without a window
    pub fn ffplay() -> Self {
        Self::new(
            "ffplay",
            ["-nodisp", "-autoexit", "-loglevel", "quiet", "-"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        )
    }

    fn spawn(&self) -> Result<Player> {
        debug!(program = %self.program, "Starting audio player");

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::playback(format!("Failed to start {}: {}", self.program, e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::playback("player stdin unavailable"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| Error::playback("player stderr unavailable"))?;

        // Read concurrently with the stdin writes
        let stderr = tokio::spawn(async move {
            let mut captured = Vec::new();
            stderr.read_to_end(&mut captured).await.ok();
            captured
        });

        Ok(Player {
            child,
            stdin,
            stderr,
        })
    }

    /// Close stdin and wait for the player to exit
    async fn finish(&self, player: Player) -> Result<()> {
        let Player {
            mut child,
            stdin,
            stderr,
        } = player;
        drop(stdin);

        let status = child
            .wait()
            .await
            .map_err(|e| Error::playback(format!("Failed to wait for {}: {}", self.program, e)))?;
        let stderr = stderr.await.unwrap_or_default();

        if status.success() {
            Ok(())
        } else {
            Err(Error::playback(format!(
                "{} exited with {}. Error: {}",
                self.program,
                status,
                String::from_utf8_lossy(&stderr).trim()
            )))
        }
    }
}

/// A running player process
struct Player {
    child: Child,
    stdin: ChildStdin,
    stderr: JoinHandle<Vec<u8>>,
}

impl Default for ProcessAudioSink {
    fn default() -> Self {
        Self::ffplay()
    }
}

#[async_trait]
impl AudioSink for ProcessAudioSink {
    async fn play(&self, audio: Bytes) -> Result<()> {
        let mut player = self.spawn()?;

        // A write failure usually means the player died; its exit status says why
        let written = player.stdin.write_all(&audio).await;
        self.finish(player).await?;
        written.map_err(|e| Error::playback(format!("Failed to write audio: {}", e)))
    }

    async fn play_stream(&self, mut audio: AudioStream) -> Result<()> {
        let mut player = self.spawn()?;

        while let Some(chunk) = audio.next().await {
            let written = match chunk {
                Ok(bytes) => player.stdin.write_all(&bytes).await,
                Err(e) => {
                    player.child.kill().await.ok();
                    return Err(e);
                }
            };
            if let Err(e) = written {
                self.finish(player).await?;
                return Err(Error::playback(format!("Failed to write audio: {}", e)));
            }
        }

        self.finish(player).await
    }
}
