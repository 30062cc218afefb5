use std::time::Duration;

use boardbot::delivery::{BlockNumber, ClientQueue, JobAssembler};
use boardbot::protocol::{
    BoardGeometry, CommandTransport, HardwareTransport, Instruction, SimulatorTransport, program,
};
use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};

fn instruction_stream(count: usize) -> Vec<u8> {
    (0..count)
        .flat_map(|n| *Instruction::coordinate((n % 3580) as u16, (n % 1200) as u16).as_bytes())
        .collect()
}

fn bench_assemble(c: &mut Criterion) {
    let mut group = c.benchmark_group("assembler");
    let assembler = JobAssembler::default();

    // Single block
    let small = instruction_stream(100);
    group.throughput(Throughput::Bytes(small.len() as u64));
    group.bench_function("assemble_300b", |b| {
        b.iter(|| {
            black_box(assembler.assemble(&small).unwrap());
        });
    });

    // Typical drawing, a few dozen blocks
    let medium = instruction_stream(10_000);
    group.throughput(Throughput::Bytes(medium.len() as u64));
    group.bench_function("assemble_30kb", |b| {
        b.iter(|| {
            let job = assembler.assemble(&medium).unwrap();
            black_box(job.blocks(BlockNumber::new(1)).count());
        });
    });

    group.finish();
}

fn bench_queue(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue");
    let job = JobAssembler::default()
        .assemble(&instruction_stream(10_000))
        .unwrap();

    group.throughput(Throughput::Elements(job.block_count() as u64));
    group.bench_function("enqueue_drain", |b| {
        b.iter(|| {
            let queue = ClientQueue::new();
            let receipt = queue.enqueue_job(&job);
            while let Ok(block) = queue.peek_next(Duration::ZERO) {
                queue.acknowledge_up_to(block.number());
            }
            black_box(receipt);
        });
    });

    group.finish();
}

fn bench_programs(c: &mut Criterion) {
    let mut group = c.benchmark_group("programs");
    let geometry = BoardGeometry::default();

    group.bench_function("encode_erase_all", |b| {
        b.iter(|| {
            let mut transport = HardwareTransport::new(geometry);
            black_box(program::encode_program(&mut transport, program::erase_all(geometry)));
        });
    });

    let raw = program::encode_program(
        &mut HardwareTransport::new(geometry),
        program::mock_drawing(10),
    );
    group.bench_function("simulate_mock_10", |b| {
        b.iter(|| {
            let mut simulator = SimulatorTransport::new(geometry);
            simulator.replay(&raw);
            black_box(simulator.render());
        });
    });

    group.finish();
}

criterion_group!(benches, bench_assemble, bench_queue, bench_programs);
criterion_main!(benches);
