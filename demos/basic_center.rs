//! # Example: sharing one control center between tasks
//!
//! Workers here are plain `sleep` processes and the control API answers every
//! ping, so no broker is needed. Shutdown requests are ignored by `sleep`,
//! which shows the join-timeout then kill escalation.
//!
//! ```text
//! cargo run --example basic_center
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use workvisor::{
    App, CenterConfig, CenterHandle, ControlApi, ControlCenter, ControlError, Controller,
    ControllerConfig, Event, Inspection, Nodes, Replies, RunConfig, Subscribe,
};

struct AlwaysUp;

#[async_trait]
impl ControlApi for AlwaysUp {
    async fn ping(&self, hostnames: &[String]) -> Result<Replies, ControlError> {
        Ok(hostnames.iter().map(|h| (h.clone(), json!({"ok": "pong"}))).collect())
    }

    async fn shutdown(&self, hostnames: &[String]) -> Result<(), ControlError> {
        println!("[control] shutdown requested for {hostnames:?}");
        Ok(())
    }

    async fn inspect(&self, hostnames: &[String], query: Inspection) -> Result<Replies, ControlError> {
        let reply = match query {
            Inspection::ActiveQueues => json!([{"name": "default"}]),
            _ => json!({}),
        };
        Ok(hostnames.iter().map(|h| (h.clone(), reply.clone())).collect())
    }
}

struct Printer;

#[async_trait]
impl Subscribe for Printer {
    async fn on_event(&self, ev: &Event) {
        match &ev.worker {
            Some(w) => println!("[event #{}] {} {w}", ev.seq, ev.kind.as_label()),
            None => println!("[event #{}] {}", ev.seq, ev.kind.as_label()),
        }
    }

    fn name(&self) -> &'static str {
        "printer"
    }
}

async fn start_pair(handle: CenterHandle, prefix: &'static str) -> anyhow::Result<()> {
    for i in 1..=2 {
        let node = format!("{prefix}{i}");
        let cfg = RunConfig::default().with_queues(["default"]).with_concurrency(2);
        match handle.start_worker(node.as_str(), cfg, true).await? {
            Some(hostname) => println!("[{prefix}] started {hostname}"),
            None => println!("[{prefix}] {node} not started"),
        }
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let app = App::new("demo", Arc::new(AlwaysUp))
        .with_entrypoint(["sh", "-c", "exec sleep 30", "demo-worker"]);
    let cfg = CenterConfig {
        ready_poll: Duration::from_millis(50),
        ready_timeout: Duration::from_secs(5),
        ..CenterConfig::default()
    };
    let center = ControlCenter::builder(app, cfg)
        .with_subscribers(vec![Arc::new(Printer)])
        .build()?;

    let (handle, actor) = Controller::spawn(center, ControllerConfig::default());

    // Two producers; the actor serializes their registry mutations.
    let a = tokio::spawn(start_pair(handle.clone(), "alpha"));
    let b = tokio::spawn(start_pair(handle.clone(), "beta"));
    a.await??;
    b.await??;

    println!("hostnames: {:?}", handle.hostnames().await?);
    println!("queues: {:?}", handle.active_queue_names().await?);

    let report = handle
        .stop_workers(Nodes::All, true, Some(Duration::from_millis(300)))
        .await?;
    println!("still running after join: {:?}", report.still_running);

    let killed = handle.kill(report.still_running).await?;
    println!("killed: {:?}", killed.removed);

    handle.close();
    let center = actor.await?;
    println!("registered at exit: {}", center.len());
    Ok(())
}
