//! Scheduler behaviour: single active poller, cooperative cancellation,
//! per-transport cadence and teardown

use std::time::Duration;

use hostpulse_core::monitoring::commands::{
    BASTION_STATS_COMMAND, CPU_COMMAND, DIRECT_STATS_COMMAND, IDENTITY_COMMAND,
};
use hostpulse_core::monitoring::{ConnectionTarget, ExecError, LoopState, TransportKind};

use super::common::{CPU_SECOND, Harness, ScriptedExecutor, advance};

fn direct(id: &str) -> ConnectionTarget {
    ConnectionTarget::new(id, TransportKind::Direct, format!("{id}.example"))
}

fn bastion(id: &str) -> ConnectionTarget {
    ConnectionTarget::new(id, TransportKind::Bastion, "10.20.30.40")
}

#[tokio::test(start_paused = true)]
async fn direct_loop_publishes_and_computes_rates() {
    let mut h = Harness::new(ScriptedExecutor::direct_host());
    assert!(h.scheduler.activate(direct("a")));

    let first = h.events.recv().await.unwrap();
    assert_eq!(first.channel, "stats-update:a");
    assert_eq!(first.connection_id, "a");
    assert_eq!(first.snapshot.cpu_load_percent, "0.00");
    assert_eq!(first.snapshot.hostname, "web-01");
    assert_eq!(first.snapshot.distro_id, "ubuntu");
    assert_eq!(first.snapshot.distro_version_id, "24.04");
    assert_eq!(first.snapshot.ip, "10.0.0.5");
    assert_eq!(first.snapshot.uptime, "3 days");
    assert_eq!(first.snapshot.memory.used, 2_000_000_000);
    assert_eq!(first.snapshot.disks.len(), 1);
    assert_eq!(first.snapshot.network.rx_bytes_per_sec, 0.0);

    h.executor.respond(CPU_COMMAND, Ok(CPU_SECOND.to_string()));
    let second = h.events.recv().await.unwrap();
    assert_eq!(second.snapshot.cpu_load_percent, "75.00");

    // identity is probed once per context
    assert_eq!(h.executor.count(IDENTITY_COMMAND), 1);
    assert_eq!(h.executor.count(CPU_COMMAND), 2);
    assert!(h.executor.calls().iter().all(|c| c.connection_id == "a"));
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn direct_ticks_follow_configured_interval() {
    let h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.config().set_polling_interval_ms(1_000);
    h.scheduler.activate(direct("a"));

    advance(4_500).await;
    let starts: Vec<_> = h
        .executor
        .calls()
        .into_iter()
        .filter(|c| c.command == CPU_COMMAND)
        .map(|c| c.at)
        .collect();
    assert_eq!(starts.len(), 5);
    for pair in starts.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(1_000));
    }
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn interval_change_applies_on_next_reschedule() {
    let h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.activate(direct("a"));
    advance(10).await;

    // out-of-range request is clamped to the maximum
    assert_eq!(h.scheduler.config().set_polling_interval_ms(60_000), 20_000);

    // the pending 3 s timer is kept, the following one uses 20 s
    advance(3_000).await;
    assert_eq!(h.executor.count(CPU_COMMAND), 2);
    advance(19_000).await;
    assert_eq!(h.executor.count(CPU_COMMAND), 2);
    advance(1_500).await;
    assert_eq!(h.executor.count(CPU_COMMAND), 3);
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn inactive_connection_does_not_execute() {
    let mut h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.config().set_active_connection("other");
    assert!(h.scheduler.start_monitoring(direct("a")));

    advance(10_000).await;
    assert!(h.executor.calls().is_empty());
    assert!(h.drain().is_empty());
    assert_eq!(h.scheduler.loop_state("a"), Some(LoopState::Idle));
}

#[tokio::test(start_paused = true)]
async fn deactivated_loop_finishes_in_flight_tick_then_stops() {
    let mut h = Harness::new(ScriptedExecutor::direct_host().with_delay(Duration::from_secs(1)));
    h.scheduler.activate(direct("a"));
    advance(10).await;
    assert!(h.scheduler.is_executing("a"));
    assert_eq!(h.scheduler.loop_state("a"), Some(LoopState::Executing));

    // switching the active id does not cancel the running tick
    h.scheduler.config().set_active_connection("b");
    advance(30_000).await;

    let events = h.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].connection_id, "a");
    assert_eq!(h.scheduler.loop_state("a"), Some(LoopState::Idle));

    // identity + cpu + stats of the single tick
    assert_eq!(h.executor.calls().len(), 3);
}

#[tokio::test(start_paused = true)]
async fn reactivation_restarts_idle_loop() {
    let mut h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.activate(direct("a"));
    advance(10).await;
    h.scheduler.config().set_active_connection("b");
    advance(5_000).await;
    assert_eq!(h.scheduler.loop_state("a"), Some(LoopState::Idle));
    assert_eq!(h.drain().len(), 1);

    h.executor.respond(CPU_COMMAND, Ok(CPU_SECOND.to_string()));
    h.scheduler.activate(direct("a"));
    let event = h.events.recv().await.unwrap();
    // the rate baseline survived the pause
    assert_eq!(event.snapshot.cpu_load_percent, "75.00");
    assert_eq!(h.executor.count(IDENTITY_COMMAND), 1);
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn direct_restart_supersedes_running_loop() {
    let h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.activate(direct("a"));
    advance(10).await;
    assert_eq!(h.scheduler.loop_state("a"), Some(LoopState::Scheduled));

    assert!(h.scheduler.activate(direct("a")));
    advance(9_490).await;

    // old loop: t=0; new loop: t=0.01, 3.01, 6.01, 9.01
    assert_eq!(h.executor.count(CPU_COMMAND), 5);
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn direct_exec_failure_publishes_nothing_and_retries() {
    let mut h = Harness::new(ScriptedExecutor::direct_host());
    h.executor.respond(
        DIRECT_STATS_COMMAND,
        Err(ExecError::Failed("exit 255".into())),
    );
    h.scheduler.activate(direct("a"));

    advance(6_500).await;
    assert!(h.drain().is_empty());
    assert_eq!(h.executor.count(DIRECT_STATS_COMMAND), 3);
    assert_eq!(h.scheduler.loop_state("a"), Some(LoopState::Scheduled));

    h.executor.respond(DIRECT_STATS_COMMAND, Ok(super::common::DIRECT_STATS.to_string()));
    let event = h.events.recv().await.unwrap();
    assert_eq!(event.snapshot.ip, "10.0.0.5");
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn bastion_success_cadence_is_two_seconds() {
    let mut h = Harness::new(ScriptedExecutor::new());
    h.executor.respond_default(Ok(
        "cpu  1 2 3 4 5 6 7 8\nbastion-01\n10.20.30.40\nID=ubuntu\nVERSION_ID=\"22.04\"\n".into(),
    ));
    h.scheduler.activate(bastion("b"));

    for _ in 0..3 {
        let event = h.events.recv().await.unwrap();
        assert_eq!(event.snapshot.hostname, "bastion-01");
        assert_eq!(event.snapshot.distro_id, "ubuntu");
    }

    let starts: Vec<_> = h.executor.calls().into_iter().map(|c| c.at).collect();
    assert!(h
        .executor
        .calls()
        .iter()
        .all(|c| c.command == BASTION_STATS_COMMAND));
    for pair in starts.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(2_000));
    }
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn bastion_failure_publishes_fallback_and_backs_off() {
    let mut h = Harness::new(ScriptedExecutor::new());
    h.scheduler.activate(bastion("b"));

    for _ in 0..3 {
        let event = h.events.recv().await.unwrap();
        assert_eq!(event.snapshot.uptime, "Error");
        assert_eq!(event.snapshot.cpu_load_percent, "0.00");
        assert_eq!(event.snapshot.hostname, "Bastión");
        assert_eq!(event.snapshot.ip, "10.20.30.40");
        assert!(event.snapshot.disks.is_empty());
    }

    let starts: Vec<_> = h.executor.calls().into_iter().map(|c| c.at).collect();
    for pair in starts.windows(2) {
        assert_eq!(pair[1] - pair[0], Duration::from_millis(5_000));
    }
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn bastion_fallback_keeps_last_confirmed_distro() {
    let mut h = Harness::new(ScriptedExecutor::new());
    h.executor
        .respond_default(Ok("cpu  1 2 3 4 5 6 7 8\nID=redhat\nVERSION_ID=\"9.3\"\n".into()));
    h.scheduler.activate(bastion("b"));
    let ok = h.events.recv().await.unwrap();
    assert_eq!(ok.snapshot.distro_id, "rhel");

    h.executor.respond_default(Err(ExecError::EmptyOutput));
    let failed = h.events.recv().await.unwrap();
    assert_eq!(failed.snapshot.uptime, "Error");
    assert_eq!(failed.snapshot.distro_id, "rhel");
    assert_eq!(failed.snapshot.distro_version_id, "9.3");
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn bastion_start_skipped_while_tick_in_flight() {
    let h = Harness::new(ScriptedExecutor::new().with_delay(Duration::from_secs(1)));
    assert!(h.scheduler.activate(bastion("b")));
    advance(10).await;

    assert!(h.scheduler.is_executing("b"));
    assert!(!h.scheduler.start_monitoring(bastion("b")));

    advance(2_000).await;
    // the fallback tick finished, a new start is accepted again
    assert!(!h.scheduler.is_executing("b"));
    assert!(h.scheduler.start_monitoring(bastion("b")));
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn closed_transport_ends_loop_without_snapshot() {
    let mut h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.activate(direct("a"));
    h.events.recv().await.unwrap();

    h.executor.close();
    advance(10_000).await;

    assert!(h.drain().is_empty());
    assert_eq!(h.executor.count(CPU_COMMAND), 1);
    assert!(h.scheduler.connection_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transport_closed_error_is_not_reported() {
    let mut h = Harness::new(ScriptedExecutor::new());
    h.executor
        .respond_default(Err(ExecError::TransportClosed("b".into())));
    h.scheduler.activate(bastion("b"));

    advance(10_000).await;
    assert!(h.drain().is_empty());
    assert_eq!(h.executor.calls().len(), 1);
    assert_eq!(h.scheduler.loop_state("b"), None);
}

#[tokio::test(start_paused = true)]
async fn stop_loop_drops_in_flight_result() {
    let mut h = Harness::new(ScriptedExecutor::direct_host().with_delay(Duration::from_secs(1)));
    h.scheduler.activate(direct("a"));
    advance(10).await;

    assert!(h.scheduler.stop_loop("a"));
    advance(10_000).await;

    assert!(h.drain().is_empty());
    assert_eq!(h.scheduler.loop_state("a"), None);
}

#[tokio::test(start_paused = true)]
async fn tick_of_stopped_loop_does_not_touch_restarted_context() {
    let mut h = Harness::new(ScriptedExecutor::new().with_delay(Duration::from_secs(1)));
    assert!(h.scheduler.activate(bastion("b")));
    advance(500).await;

    assert!(h.scheduler.stop_loop("b"));
    assert!(h.scheduler.activate(bastion("b")));

    // the stopped tick completes at 1000 ms, the restarted one at 1500 ms
    advance(600).await;
    assert!(h.drain().is_empty());
    assert!(h.scheduler.is_executing("b"));
    assert!(!h.scheduler.start_monitoring(bastion("b")));

    advance(500).await;
    let events = h.drain();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].snapshot.uptime, "Error");
    assert!(!h.scheduler.is_executing("b"));
    h.scheduler.shutdown();
}

#[tokio::test(start_paused = true)]
async fn activate_stops_all_other_loops() {
    let h = Harness::new(ScriptedExecutor::direct_host());
    h.scheduler.activate(direct("a"));
    h.scheduler.start_monitoring(direct("b"));
    advance(10).await;
    assert_eq!(h.scheduler.connection_ids(), vec!["a", "b"]);

    h.scheduler.activate(direct("c"));
    advance(10).await;
    assert_eq!(h.scheduler.connection_ids(), vec!["c"]);
    assert_eq!(h.scheduler.config().active_connection().as_deref(), Some("c"));

    let before = h.executor.count(CPU_COMMAND);
    advance(10_000).await;
    let after: Vec<_> = h
        .executor
        .calls()
        .into_iter()
        .skip(before)
        .filter(|c| c.command == CPU_COMMAND)
        .map(|c| c.connection_id)
        .collect();
    assert!(after.iter().all(|id| id == "c"));
    h.scheduler.shutdown();
}
