/*!
 * Admission Benchmarks
 *
 * Cost of the bookkeeping performed under the scheduler lock: batch play,
 * completion churn, and capacity resizing.
 */

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sim_scheduler::process::scheduler::state::{Effects, SchedulerState, SegmentOutcome};
use sim_scheduler::{HandleStatus, ProcessHandle, Step};
use std::sync::Arc;

struct Inert;

impl ProcessHandle for Inert {
    fn begin_stepping(&self) -> anyhow::Result<()> {
        Ok(())
    }
    fn pause(&self) {}
    fn pause_at(&self, _step: Step) {}
    fn stop(&self) {}
    fn stop_at(&self, _step: Step) {}
    fn current_status(&self) -> HandleStatus {
        HandleStatus::Ready
    }
}

fn populated(capacity: usize, processes: usize) -> (SchedulerState, Vec<u64>) {
    let mut state = SchedulerState::new(capacity);
    let ids = state.register_batch((0..processes).map(|_| Arc::new(Inert) as Arc<dyn ProcessHandle>));
    (state, ids)
}

fn bench_play_batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("play_batch");

    for processes in [64usize, 512, 4096] {
        group.bench_with_input(
            BenchmarkId::from_parameter(processes),
            &processes,
            |b, &processes| {
                b.iter(|| {
                    let (mut state, ids) = populated(8, processes);
                    let mut fx = Effects::new();
                    state.play_all(black_box(&ids), &mut fx).unwrap();
                    black_box(fx.launches.len())
                });
            },
        );
    }

    group.finish();
}

fn bench_completion_churn(c: &mut Criterion) {
    c.bench_function("completion_churn_1024", |b| {
        b.iter(|| {
            let (mut state, ids) = populated(8, 1024);
            state.play_all(&ids, &mut Effects::new()).unwrap();

            while let Some(&front) = state.snapshot().running.first() {
                let mut fx = Effects::new();
                state.finish_segment(front, SegmentOutcome::Returned, &mut fx);
                black_box(&fx.launches);
            }
        });
    });
}

fn bench_capacity_swing(c: &mut Criterion) {
    c.bench_function("capacity_swing_64", |b| {
        let (mut state, ids) = populated(64, 256);
        state.play_all(&ids, &mut Effects::new()).unwrap();

        b.iter(|| {
            state.set_capacity(black_box(8), &mut Effects::new());
            state.set_capacity(black_box(64), &mut Effects::new());
        });
    });
}

criterion_group!(
    benches,
    bench_play_batch,
    bench_completion_churn,
    bench_capacity_swing
);
criterion_main!(benches);
