use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use harmoniq_automation::{
    samples_to_superclock, superclock_to_samples, thin, AutoState, AutomationList, ConstantTempo,
    ControlEvent, ParameterDescriptor, ParameterId, TimePos,
};

fn lane() -> AutomationList {
    AutomationList::new(
        ParameterId::new(0, 0, 0),
        ParameterDescriptor::default(),
        Arc::new(ConstantTempo::default()),
    )
}

fn sine_pass(len: usize) -> Vec<ControlEvent> {
    (0..len)
        .map(|index| {
            let when = samples_to_superclock(index as i64 * 64, 48_000);
            ControlEvent::new(when, 0.5 + 0.5 * (index as f64 * 0.01).sin())
        })
        .collect()
}

fn superclock(c: &mut Criterion) {
    c.bench_function("superclock_round_trip_96k", |b| {
        b.iter(|| {
            let mut acc = 0i64;
            for samples in 0..1_024i64 {
                let ticks = samples_to_superclock(black_box(samples * 333), 96_000);
                acc += superclock_to_samples(ticks, 96_000);
            }
            acc
        });
    });
}

fn thinning(c: &mut Criterion) {
    let pass = sine_pass(16_384);
    c.bench_function("thin_16k_samples", |b| {
        b.iter(|| thin(black_box(&pass), 0.001));
    });
}

fn record_and_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("automation");
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("touch_pass_2048_blocks", |b| {
        let list = lane();
        let mut writer = list.take_writer().expect("writer");
        let pass = sine_pass(2_048);
        list.set_automation_state(AutoState::Touch);

        b.iter(|| {
            list.start_touch(TimePos::Audio(0));
            for event in &pass {
                writer.write(event.when, event.value);
            }
            let end = pass.last().map_or(0, |event| event.when);
            list.stop_touch(TimePos::Audio(end));
        });
    });

    group.bench_function("rt_eval_block", |b| {
        let list = lane();
        list.edit_curve(|curve| {
            for event in sine_pass(4_096) {
                curve.add(event.when, event.value);
            }
        });
        b.iter(|| {
            let mut sum = 0.0;
            for block in 0..256i64 {
                let when = samples_to_superclock(block * 64, 48_000);
                sum += list.rt_eval(black_box(when)).unwrap_or(0.0);
            }
            sum
        });
    });

    group.finish();
}

criterion_group!(benches, superclock, thinning, record_and_merge);
criterion_main!(benches);
