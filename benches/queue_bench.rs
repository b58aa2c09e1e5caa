//! Benchmarks for the task queues and the scheduler drain loop.
//!
//! Benchmarks cover:
//! - Heap push/pop with random keys
//! - Draining a full ready queue through the manual host
//! - Promoting delayed tasks as their timers fire

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;
use std::hint::black_box;

use prometheus_task_scheduler::config::SchedulerConfig;
use prometheus_task_scheduler::core::{PriorityLevel, ScheduleOptions, Scheduler, TaskOutcome};
use prometheus_task_scheduler::infra::PriorityQueue;
use prometheus_task_scheduler::runtime::{ManualClock, ManualHost};

const LEVELS: [PriorityLevel; 5] = [
    PriorityLevel::Immediate,
    PriorityLevel::UserBlocking,
    PriorityLevel::Normal,
    PriorityLevel::Low,
    PriorityLevel::Idle,
];

fn manual_scheduler() -> (Scheduler, ManualHost) {
    let clock = ManualClock::new();
    let host = ManualHost::new(clock.clone());
    let scheduler = Scheduler::new(SchedulerConfig::default(), clock, host.clone());
    (scheduler, host)
}

fn bench_queue_push_pop(c: &mut Criterion) {
    let mut group = c.benchmark_group("priority_queue");

    for size in [100_u64, 1_000, 10_000] {
        let mut rng = rand::rng();
        let keys: Vec<f64> = (0..size).map(|_| rng.random_range(0.0..10_000.0)).collect();

        group.throughput(Throughput::Elements(size));
        group.bench_with_input(BenchmarkId::new("push_pop", size), &keys, |b, keys| {
            b.iter(|| {
                let mut queue = PriorityQueue::with_capacity(keys.len());
                for (id, key) in (0_u64..).zip(keys) {
                    queue.push(*key, id, id);
                }
                while let Some(entry) = queue.pop() {
                    black_box(entry.item);
                }
            });
        });
    }

    group.finish();
}

fn bench_scheduler_drain(c: &mut Criterion) {
    let mut group = c.benchmark_group("scheduler");

    for size in [100_usize, 1_000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("drain_ready", size), &size, |b, &size| {
            b.iter(|| {
                let (scheduler, host) = manual_scheduler();
                for i in 0..size {
                    scheduler.schedule(LEVELS[i % LEVELS.len()], |did_timeout| {
                        black_box(did_timeout);
                        TaskOutcome::Done
                    });
                }
                host.flush_callbacks();
                black_box(scheduler.stats().completed_tasks)
            });
        });
    }

    group.finish();
}

fn bench_delayed_promotion(c: &mut Criterion) {
    c.bench_function("scheduler/delayed_promotion_500", |b| {
        b.iter(|| {
            let (scheduler, host) = manual_scheduler();
            for i in 0..500_u32 {
                scheduler.schedule_with_options(
                    PriorityLevel::Normal,
                    |_| TaskOutcome::Done,
                    ScheduleOptions::delayed(f64::from(i % 50 + 1)),
                );
            }
            host.run_until_idle();
            black_box(scheduler.stats().completed_tasks)
        });
    });
}

criterion_group!(
    benches,
    bench_queue_push_pop,
    bench_scheduler_drain,
    bench_delayed_promotion
);
criterion_main!(benches);
