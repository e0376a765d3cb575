//! stagehand - host simulator
//!
//! 複数の network thread から redemption / command を発生させ、main thread の
//! tick で bridge を drain し、sink に届いた通知を表示します。

mod descriptors;
mod handlers;
mod logging;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::Parser;
use serde_json::json;
use stagehand_core::app::{CoreConfig, Dispatcher};
use stagehand_core::bridge;
use stagehand_core::domain::{Notification, ReplyContext, ReplyToken, Viewer};
use stagehand_core::impls::ChannelSink;
use stagehand_core::ports::{Clock, IdGenerator, SystemClock, UlidGenerator};
use stagehand_core::typed::{GlobalConfigStore, GlobalSettings};

use crate::descriptors::{Descriptor, DescriptorKind};

#[derive(Debug, Parser)]
#[command(name = "stagehand", about = "Simulate a streaming host dispatching viewer actions")]
struct Cli {
    /// JSON file with a `CoreConfig`.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Events produced per network thread.
    #[arg(long, default_value_t = 20)]
    events: usize,

    /// Number of simulated network threads.
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Host frame interval in milliseconds.
    #[arg(long, default_value_t = 16)]
    tick_ms: u64,

    /// Give up after this many seconds.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,
}

#[derive(Default)]
struct Progress {
    rewards_dispatched: AtomicUsize,
    producers_done: AtomicUsize,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => CoreConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => CoreConfig::default(),
    };
    logging::init(&config.log_level);

    // current_thread runtime: this thread drives the tick loop and is the main thread
    let bridge = bridge::install(config.bridge.drain_budget())?;

    let registry = handlers::registry()?;
    for record in registry.records() {
        tracing::info!(
            name = %record.name,
            capability = ?record.capability,
            config = record.config_type.unwrap_or("-"),
            "handler available"
        );
    }

    // stale entry from an older build, and a broken economy entry
    let mut globals: GlobalSettings = [
        ("retired", json!({ "volume": 3 })),
        (handlers::ECONOMY, json!({ "currency": "doubloons", "max_per_redemption": "lots" })),
    ]
    .into_iter()
    .collect();
    registry.ensure_global_settings(&mut globals);
    handlers::install_globals(GlobalConfigStore::new(&registry, globals));

    let (sink, mut notifications) = ChannelSink::new();
    let dispatcher = Arc::new(Dispatcher::new(registry, Arc::new(sink), config.dispatch.clone()));
    let descriptors = Arc::new(descriptors::defaults()?);
    let progress = Arc::new(Progress::default());

    for worker in 0..cli.threads {
        let dispatcher = dispatcher.clone();
        let descriptors = descriptors.clone();
        let progress = progress.clone();
        let events = cli.events;
        tokio::task::spawn_blocking(move || {
            produce(worker, events, &dispatcher, &descriptors, &progress);
            progress.producers_done.fetch_add(1, Ordering::Release);
        });
    }

    let mut tick = tokio::time::interval(Duration::from_millis(cli.tick_ms));
    let deadline = tokio::time::sleep(Duration::from_secs(cli.timeout_secs));
    tokio::pin!(deadline);
    let mut settled = 0usize;
    let mut replies = 0usize;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                let report = bridge.drain_queued()?;
                if report.ran > 0 {
                    tracing::debug!(ran = report.ran, remaining = report.remaining, "tick");
                }
            }
            Some(notification) = notifications.recv() => {
                print_notification(&notification);
                if notification.is_terminal() {
                    settled += 1;
                } else {
                    replies += 1;
                }
            }
            _ = &mut deadline => {
                tracing::warn!(settled, pending = bridge.pending(), "timed out before every redemption settled");
                break;
            }
        }

        let producers_done = progress.producers_done.load(Ordering::Acquire) == cli.threads;
        if producers_done
            && bridge.pending() == 0
            && settled >= progress.rewards_dispatched.load(Ordering::Acquire)
        {
            break;
        }
    }

    let (gold, hydrated) = handlers::world_summary();
    println!("settled={settled} replies={replies} gold={gold} hydrated={hydrated}");
    Ok(())
}

fn produce(
    worker: usize,
    events: usize,
    dispatcher: &Dispatcher,
    descriptors: &[Descriptor],
    progress: &Progress,
) {
    let ids = UlidGenerator::new(SystemClock);
    let clock = SystemClock;
    let viewer = Viewer::new(format!("{}", 1000 + worker), format!("viewer{worker}"));
    let token = ReplyToken::new(format!("chat-{worker}"));

    for n in 0..events {
        let Some(descriptor) = descriptors.get((worker + n) % descriptors.len()) else {
            break;
        };
        match descriptor.kind {
            DescriptorKind::Reward => {
                let context = ReplyContext::redemption(
                    ids.generate_redemption_id(),
                    viewer.clone(),
                    descriptor.arguments.as_str(),
                    token.clone(),
                    clock.now(),
                );
                // count before dispatch so the host never stops early
                progress.rewards_dispatched.fetch_add(1, Ordering::AcqRel);
                let outcome = dispatcher.handle_reward(&descriptor.handler, context, &descriptor.config);
                if !outcome.was_dispatched() {
                    progress.rewards_dispatched.fetch_sub(1, Ordering::AcqRel);
                    tracing::warn!(title = %descriptor.title, "reward not dispatched");
                }
            }
            DescriptorKind::Command => {
                let context = ReplyContext::command(
                    ids.generate_command_id(),
                    viewer.clone(),
                    descriptor.arguments.as_str(),
                    token.clone(),
                    clock.now(),
                );
                dispatcher.handle_command(&descriptor.handler, context, &descriptor.config);
            }
        }
        std::thread::sleep(Duration::from_millis(2));
    }
}

fn print_notification(notification: &Notification) {
    let who = &notification.context().viewer().display_name;
    match notification {
        Notification::Completed { status, .. } => {
            println!("[done]   {who}: {}", status.as_deref().unwrap_or("ok"));
        }
        Notification::Cancelled { reason, .. } => {
            println!("[refund] {who}: {}", reason.as_deref().unwrap_or("refunded"));
        }
        Notification::Reply { message, .. } => println!("[chat]   {message}"),
    }
}
