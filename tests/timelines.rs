//! Integration tests for the scheduling engine
//!
//! Drives complete runs through the public API and checks the exact tick of
//! every lifecycle event, queue ordering, memory deferral, and the single
//! running process invariant.

use buddy_sched::config::{PolicyKind, SimConfig};
use buddy_sched::loaders::ArrivalFeed;
use buddy_sched::memory::BuddyAllocator;
use buddy_sched::runner::ProcessTable;
use buddy_sched::scheduler::{
    EventRecorder, Priority, ProcessId, ProcessSpec, SchedEventKind, SchedulingEngine, Tee,
    TickOutcome, policies,
};
use buddy_sched::simulation::Simulation;

fn spec(id: usize, arrival: u64, service: u64, priority: i32, mem: usize) -> ProcessSpec {
    ProcessSpec {
        id: ProcessId(id),
        arrival,
        service,
        priority: Priority(priority),
        mem_demand: mem,
    }
}

fn run(config: SimConfig, specs: Vec<ProcessSpec>) -> (EventRecorder, buddy_sched::RunStats) {
    let feed = ArrivalFeed::new(specs).unwrap();
    let mut simulation = Simulation::new(config, feed).unwrap();
    let mut ctx = Tee(EventRecorder::default(), ProcessTable::new());
    let stats = simulation.run(&mut ctx).unwrap();

    let Tee(recorder, runner) = ctx;
    assert_eq!(runner.live(), 0);
    (recorder, stats)
}

fn timeline(recorder: &EventRecorder) -> Vec<(u64, usize, &'static str, u64)> {
    recorder
        .sched
        .iter()
        .map(|event| (event.tick, event.pid.0, event.name(), event.remaining))
        .collect()
}

#[test]
fn test_round_robin_quantum_two() {
    let config = SimConfig::new(PolicyKind::RoundRobin).with_quantum(2);
    let (recorder, stats) = run(config, vec![spec(1, 0, 5, 0, 8), spec(2, 1, 3, 0, 8)]);

    assert_eq!(
        timeline(&recorder),
        vec![
            (0, 1, "started", 5),
            (2, 1, "stopped", 3),
            (2, 2, "started", 3),
            (4, 2, "stopped", 1),
            (4, 1, "resumed", 3),
            (6, 1, "stopped", 1),
            (6, 2, "resumed", 1),
            (7, 2, "finished", 0),
            (7, 1, "resumed", 1),
            (8, 1, "finished", 0),
        ]
    );

    assert_eq!(stats.total_ticks, 8);
    assert_eq!(stats.wasted_ticks, 0);
    let waiting: Vec<_> = stats.completions.iter().map(|c| (c.id.0, c.waiting)).collect();
    assert_eq!(waiting, vec![(1, 3), (2, 3)]);
}

#[test]
fn test_round_robin_runs_on_when_alone() {
    // P2 arrives long after P1's first quantum expired
    let config = SimConfig::new(PolicyKind::RoundRobin).with_quantum(2);
    let (recorder, _) = run(config, vec![spec(1, 0, 6, 0, 8), spec(2, 3, 1, 0, 8)]);

    assert_eq!(
        timeline(&recorder),
        vec![
            (0, 1, "started", 6),
            (3, 1, "stopped", 3),
            (3, 2, "started", 1),
            (4, 2, "finished", 0),
            (4, 1, "resumed", 3),
            (7, 1, "finished", 0),
        ]
    );
}

#[test]
fn test_srtn_preempts_on_shorter_arrival() {
    let (recorder, stats) = run(
        SimConfig::new(PolicyKind::Srtn),
        vec![spec(1, 0, 8, 0, 8), spec(2, 3, 2, 0, 8)],
    );

    assert_eq!(
        timeline(&recorder),
        vec![
            (0, 1, "started", 8),
            (3, 1, "stopped", 5),
            (3, 2, "started", 2),
            (5, 2, "finished", 0),
            (5, 1, "resumed", 5),
            (10, 1, "finished", 0),
        ]
    );

    let finished = recorder
        .sched
        .iter()
        .find(|event| event.kind == SchedEventKind::Finished && event.pid == ProcessId(1))
        .unwrap();
    assert_eq!(finished.waiting, 2);
    assert_eq!(finished.turnaround(), 10);
    assert_eq!(stats.total_ticks, 10);
}

#[test]
fn test_hpf_orders_by_priority_and_keeps_ties_stable() {
    let (recorder, _) = run(
        SimConfig::new(PolicyKind::Hpf),
        vec![
            spec(1, 0, 2, 4, 8),
            spec(2, 1, 1, 3, 8),
            spec(3, 1, 1, 1, 8),
            spec(4, 1, 1, 3, 8),
            spec(5, 1, 1, 0, 8),
        ],
    );

    let order: Vec<_> = recorder
        .sched
        .iter()
        .filter(|event| event.kind == SchedEventKind::Started)
        .map(|event| event.pid.0)
        .collect();
    assert_eq!(order, vec![1, 5, 3, 2, 4]);
    assert!(recorder.sched.iter().all(|event| event.kind != SchedEventKind::Stopped));
}

#[test]
fn test_ready_queue_order_invariant_holds_every_tick() {
    let specs = vec![
        spec(1, 0, 6, 5, 64),
        spec(2, 1, 4, 2, 64),
        spec(3, 1, 2, 7, 64),
        spec(4, 2, 3, 2, 64),
        spec(5, 4, 1, 1, 64),
    ];

    for policy in [PolicyKind::Hpf, PolicyKind::Srtn] {
        let memory = BuddyAllocator::new(1024, 8).unwrap();
        let mut engine = SchedulingEngine::new(policies::build(policy, None), memory, specs.len());
        let mut ctx = EventRecorder::default();
        let mut pending = specs.iter().peekable();

        for now in 0.. {
            while let Some(spec) = pending.next_if(|spec| spec.arrival <= now) {
                engine.admit(*spec);
            }
            let outcome = engine.tick(now, &mut ctx).unwrap();
            assert!(engine.running_count() <= 1);

            let keys: Vec<_> = engine
                .ready_queue()
                .iter()
                .map(|handle| {
                    let record = engine.record(handle).unwrap();
                    match policy {
                        PolicyKind::Hpf => i64::from(record.priority.0),
                        _ => record.remaining() as i64,
                    }
                })
                .collect();
            assert!(keys.windows(2).all(|pair| pair[0] <= pair[1]), "{:?} at {}", keys, now);

            if outcome == TickOutcome::Complete {
                break;
            }
        }
        assert_eq!(engine.finished_count(), specs.len());
    }
}

#[test]
fn test_memory_pressure_defers_without_deadlock() {
    // 256-byte pool: three 128-byte processes cannot all be resident
    let mut config = SimConfig::new(PolicyKind::RoundRobin).with_quantum(1);
    config.pool_size = 256;
    let (recorder, stats) = run(
        config,
        vec![spec(1, 0, 3, 0, 100), spec(2, 0, 3, 0, 100), spec(3, 0, 2, 0, 100)],
    );

    // P3 cannot be placed until P1 or P2 has finished and freed its block
    let p3_alloc = recorder
        .memory
        .iter()
        .find(|event| event.pid == ProcessId(3))
        .unwrap();
    let first_free = recorder
        .memory
        .iter()
        .find(|event| event.name() == "freed")
        .unwrap();
    assert!(p3_alloc.tick >= first_free.tick);

    assert_eq!(stats.completions.len(), 3);
    assert_eq!(stats.wasted_ticks, 0);

    // Each process is allocated once and freed once
    for pid in 1..=3 {
        let count = recorder.memory.iter().filter(|event| event.pid == ProcessId(pid)).count();
        assert_eq!(count, 2);
    }
}

#[test]
fn test_idle_ticks_lower_utilization() {
    let (_, stats) = run(
        SimConfig::new(PolicyKind::Srtn),
        vec![spec(1, 2, 3, 0, 8), spec(2, 9, 1, 0, 8)],
    );

    let summary = buddy_sched::PerfSummary::from_run(&stats);
    assert_eq!(stats.total_ticks, 10);
    assert_eq!(stats.wasted_ticks, 6);
    assert!((summary.utilization - 40.0).abs() < 1e-9);
}
