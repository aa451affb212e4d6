use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use kiln_evm::{Machine, NoopHandler};

/// PUSH1 1, then `n` rounds of PUSH1 1, ADD
fn add_chain(n: usize) -> Vec<u8> {
    let mut code = vec![0x60, 0x01];
    for _ in 0..n {
        code.extend_from_slice(&[0x60, 0x01, 0x01]);
    }
    code
}

/// Countdown loop: JUMPDEST, PUSH1 1, SWAP1, SUB, DUP1, PUSH1 0x02, JUMPI
fn countdown(iterations: u8) -> Vec<u8> {
    vec![0x60, iterations, 0x5B, 0x60, 0x01, 0x90, 0x03, 0x80, 0x60, 0x02, 0x57]
}

fn bench_eval_loop(c: &mut Criterion) {
    let chain = Bytes::from(add_chain(500));
    c.bench_function("add_chain_500", |b| {
        b.iter(|| {
            let mut machine = Machine::from_bytes(chain.clone(), Bytes::new(), u64::MAX, NoopHandler);
            black_box(machine.run())
        })
    });

    let looping = Bytes::from(countdown(255));
    c.bench_function("countdown_255", |b| {
        b.iter(|| {
            let mut machine = Machine::from_bytes(looping.clone(), Bytes::new(), u64::MAX, NoopHandler);
            black_box(machine.run())
        })
    });
}

criterion_group!(benches, bench_eval_loop);
criterion_main!(benches);
