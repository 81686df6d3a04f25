// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One client connection: a read loop feeding the dispatcher and a write
//! loop draining replies and signals.
//!
//! The writer outlives the reader: once the peer stops sending, replies to
//! calls it already made are still delivered, bounded by the IPC timeout.

use std::time::Duration;

use subman_wire::{self as wire, Message, ProtocolError};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, warn};

use crate::bus::{Call, Dispatcher};

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

pub(crate) fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => debug!("Client disconnected"),
        ConnectionError::Protocol(ProtocolError::Timeout) => warn!("Connection timeout"),
        _ => error!("Connection error: {}", e),
    }
}

/// Serve calls until the peer hangs up or `cancel` fires.
pub(crate) async fn serve_connection<R, W>(
    mut reader: R,
    writer: W,
    dispatcher: Dispatcher,
    signals: broadcast::Receiver<Message>,
    cancel: CancellationToken,
    timeout: Duration,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let write_cancel = cancel.child_token();
    let write_loop = tokio::spawn(write_messages(writer, rx, signals, write_cancel.clone(), timeout));

    let result = loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => break Ok(()),
            msg = wire::receive(&mut reader) => msg,
        };
        match msg {
            Ok(msg) => match Call::from_message(msg) {
                Some(call) => dispatcher.schedule(call, tx.clone()),
                None => warn!("ignoring non-call message from client"),
            },
            Err(ProtocolError::ConnectionClosed) => break Ok(()),
            Err(e) => break Err(e.into()),
        }
    };

    // A half-closed peer may still be reading. Let calls already in flight
    // answer before tearing down the writer.
    drop(tx);
    let mut write_loop = write_loop;
    let joined = match tokio::time::timeout(timeout, &mut write_loop).await {
        Ok(joined) => joined,
        Err(_) => {
            debug!("replies still pending at disconnect, dropping them");
            write_cancel.cancel();
            write_loop.await
        }
    };
    if let Err(e) = joined {
        warn!(error = %e, "connection writer failed");
    }
    result
}

async fn write_messages<W>(
    mut writer: W,
    mut replies: mpsc::UnboundedReceiver<Message>,
    mut signals: broadcast::Receiver<Message>,
    cancel: CancellationToken,
    timeout: Duration,
) where
    W: AsyncWrite + Unpin,
{
    let mut signals_open = true;
    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => return,
            reply = replies.recv() => match reply {
                Some(reply) => reply,
                None => return,
            },
            signal = signals.recv(), if signals_open => match signal {
                Ok(signal) => signal,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "slow client missed signals");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    signals_open = false;
                    continue;
                }
            },
        };
        if let Err(e) = wire::send(&mut writer, &msg, timeout).await {
            log_connection_error(e.into());
            return;
        }
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
