// src/pipeline/service.rs

//! Long-running composition of the monitor loop and the command listener.
//!
//! Only `shutdown` ends the service. The listener runs under `supervise`;
//! once it gives up, commands stop being answered while polling continues.

use std::future::{self, Future};

use crate::pipeline::commands::CommandListener;
use crate::pipeline::monitor::Monitor;
use crate::pipeline::supervisor::{RetryPolicy, supervise};

pub async fn serve<S>(
    monitor: &mut Monitor,
    listener: &CommandListener,
    policy: &RetryPolicy,
    shutdown: S,
) where
    S: Future<Output = ()>,
{
    let polling = async {
        monitor.initialize().await;
        monitor.run().await
    };

    let commands = async {
        if let Err(e) = supervise("Command listener", policy, || listener.run()).await {
            log::error!("Command listener stopped, monitor keeps polling: {}", e);
        }
        future::pending::<()>().await
    };

    tokio::select! {
        _ = polling => {}
        _ = commands => {}
        _ = shutdown => log::info!("Shutdown requested"),
    }
}
