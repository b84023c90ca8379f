//! Client connections: accept loop, name handshake, read loop and departure.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use mudline::{Input, LineReader};

use crate::commands::{self, Flow};
use crate::players::Outbox;
use crate::world::{RegisterError, World};

const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);
const SESSION_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);
const ACCEPT_BACKOFF: Duration = Duration::from_millis(100);

pub const SHUTDOWN_NOTICE: &str = "The server is shutting down. Goodbye!";

#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub max_line_len: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_line_len: mudline::DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// Accept connections until `shutdown` is set, then wait for every session to wind down.
pub async fn serve(
    listener: TcpListener,
    world: Arc<World>,
    opts: SessionOptions,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let mut sessions = JoinSet::new();

    loop {
        tokio::select! {
            res = listener.accept() => {
                let (stream, peer) = match res {
                    Ok(v) => v,
                    Err(e) => {
                        warn!(err = %e, "accept failed");
                        tokio::time::sleep(ACCEPT_BACKOFF).await;
                        continue;
                    }
                };
                let _ = stream.set_nodelay(true);
                info!(peer = %peer, "connection accepted");

                let world = world.clone();
                let shutdown = shutdown.clone();
                sessions.spawn(async move {
                    if let Err(e) = handle_conn(stream, peer.to_string(), world, opts, shutdown).await {
                        warn!(peer = %peer, err = %format!("{e:#}"), "connection ended with error");
                    }
                });
            }
            Some(res) = sessions.join_next(), if !sessions.is_empty() => {
                if let Err(e) = res {
                    warn!(err = %e, "session task failed");
                }
            }
            _ = stopped(&mut shutdown) => break,
        }
    }

    drop(listener);
    info!(sessions = sessions.len(), "listener closed; draining sessions");
    let drained = tokio::time::timeout(SESSION_DRAIN_TIMEOUT, async {
        while sessions.join_next().await.is_some() {}
    })
    .await;
    if drained.is_err() {
        warn!(remaining = sessions.len(), "sessions did not finish; aborting");
        sessions.abort_all();
    }
    Ok(())
}

/// Removes the player from the world when the session ends, however it ends.
struct Departure<'a> {
    world: &'a World,
    name: String,
}

impl Drop for Departure<'_> {
    fn drop(&mut self) {
        self.world.disconnect(&self.name);
    }
}

enum Event {
    Line(String),
    Closed,
    /// The client stopped reading and its outbox filled up.
    Stalled,
    Failed(std::io::Error),
    Shutdown,
}

/// Run one client from greeting to goodbye.
pub async fn handle_conn<S>(
    stream: S,
    peer: String,
    world: Arc<World>,
    opts: SessionOptions,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (rd, mut wr) = tokio::io::split(stream);

    let (outbox, mut out_rx) = Outbox::channel();
    let (dead_tx, mut dead_rx) = watch::channel(false);
    let mut stalled = outbox.stalled();
    let writer = tokio::spawn(async move {
        while let Some(b) = out_rx.recv().await {
            if wr.write_all(&b[..]).await.is_err() {
                let _ = dead_tx.send(true);
                return;
            }
        }
        let _ = wr.shutdown().await;
    });

    let mut lines = LineReader::new(rd)
        .max_line_len(opts.max_line_len)
        .telnet(true);

    outbox.send("Welcome to the MUD Server!");
    outbox.send("Enter your character name: ");

    let name = match next_event(&mut lines, &outbox, &mut shutdown, &mut dead_rx, &mut stalled).await {
        Event::Line(name) => name,
        Event::Closed => {
            // A close before any name counts as a blank name.
            debug!(peer = %peer, "closed before naming");
            outbox.send(RegisterError::EmptyName.reply());
            drop(outbox);
            return finish(writer).await;
        }
        Event::Shutdown => {
            outbox.send(SHUTDOWN_NOTICE);
            drop(outbox);
            return finish(writer).await;
        }
        Event::Stalled => {
            drop(outbox);
            finish(writer).await?;
            return Err(stalled_error()).context("read name");
        }
        Event::Failed(e) => {
            drop(outbox);
            finish(writer).await?;
            return Err(e).context("read name");
        }
    };

    let player = match world.register(&name, outbox.clone()) {
        Ok(h) => h,
        Err(e) => {
            info!(peer = %peer, err = %e, "handshake rejected");
            outbox.send(e.reply());
            drop(outbox);
            return finish(writer).await;
        }
    };
    let departure = Departure {
        world: &world,
        name: player.lock().name.clone(),
    };

    {
        let mut p = player.lock();
        p.send(&format!("Welcome, {}!", p.name));
        commands::dispatch(&world, &mut p, "look");
        commands::dispatch(&world, &mut p, "help");
    }

    let res = loop {
        match next_event(&mut lines, &outbox, &mut shutdown, &mut dead_rx, &mut stalled).await {
            Event::Line(line) => {
                if commands::dispatch(&world, &mut player.lock(), &line) == Flow::Quit {
                    break Ok(());
                }
            }
            Event::Closed => break Ok(()),
            Event::Failed(e) => break Err(e),
            Event::Stalled => break Err(stalled_error()),
            Event::Shutdown => {
                outbox.send(SHUTDOWN_NOTICE);
                break Ok(());
            }
        }
    };

    drop(departure);
    drop(player);
    drop(outbox);
    finish(writer).await?;
    res.with_context(|| format!("session for {name}"))
}

async fn next_event<R>(
    lines: &mut LineReader<R>,
    outbox: &Outbox,
    shutdown: &mut watch::Receiver<bool>,
    dead: &mut watch::Receiver<bool>,
    stalled: &mut watch::Receiver<bool>,
) -> Event
where
    R: AsyncRead + Unpin,
{
    loop {
        if *shutdown.borrow() {
            return Event::Shutdown;
        }
        tokio::select! {
            res = lines.next_input() => match res {
                Ok(Input::Line(line)) => return Event::Line(line),
                Ok(Input::Replies(replies)) => {
                    outbox.send_raw(replies);
                }
                Ok(Input::Eof) => return Event::Closed,
                Err(e) => return Event::Failed(e),
            },
            _ = stopped(shutdown) => return Event::Shutdown,
            _ = stopped(dead) => return Event::Closed,
            _ = stopped(stalled) => return Event::Stalled,
        }
    }
}

fn stalled_error() -> std::io::Error {
    std::io::Error::other("client stopped reading; outbox full")
}

/// Resolves once the flag is set. A dropped sender counts as set.
async fn stopped(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|v| *v).await;
}

/// Let the writer flush what is queued, then give up on it.
async fn finish(writer: tokio::task::JoinHandle<()>) -> anyhow::Result<()> {
    let abort = writer.abort_handle();
    match tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await {
        Ok(res) => res.context("writer task"),
        Err(_) => {
            abort.abort();
            Ok(())
        }
    }
}
