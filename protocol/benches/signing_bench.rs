// Encoding and signing benchmarks for the Lisk wallet.
//
// Covers passphrase key derivation, canonical encoding, transaction ids,
// local signing, verification, and vote encoding at various list sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lisk_wallet_protocol::config::FeeSchedule;
use lisk_wallet_protocol::crypto::LiskKeypair;
use lisk_wallet_protocol::transaction::{
    concat_vote_lists, sign_transaction, verify_transaction, Transaction,
};

const PASSPHRASE: &str =
    "wagon stock borrow episode laundry kitten salute link globe zero feed marble";
const TIMESTAMP: u32 = 38_350_076;

fn send_tx(keypair: &LiskKeypair) -> Transaction {
    Transaction::send(
        keypair.public_key(),
        "1859190791819301L".parse().expect("valid address"),
        100_000_000,
        &FeeSchedule::default(),
        TIMESTAMP,
    )
    .expect("valid send")
}

fn bench_key_derivation(c: &mut Criterion) {
    c.bench_function("keys/from_passphrase", |b| {
        b.iter(|| LiskKeypair::from_passphrase(black_box(PASSPHRASE)));
    });
}

fn bench_encode_send(c: &mut Criterion) {
    let tx = send_tx(&LiskKeypair::from_passphrase(PASSPHRASE));
    c.bench_function("encoding/send_unsigned", |b| {
        b.iter(|| tx.signable_bytes().expect("encodes"));
    });
}

fn bench_sign_send(c: &mut Criterion) {
    let keypair = LiskKeypair::from_passphrase(PASSPHRASE);
    let tx = send_tx(&keypair);
    c.bench_function("signing/send_sign_and_id", |b| {
        b.iter(|| {
            let mut tx = tx.clone();
            sign_transaction(&mut tx, &keypair).expect("signs");
        });
    });
}

fn bench_verify_send(c: &mut Criterion) {
    let keypair = LiskKeypair::from_passphrase(PASSPHRASE);
    let mut tx = send_tx(&keypair);
    sign_transaction(&mut tx, &keypair).expect("signs");
    c.bench_function("verification/send", |b| {
        b.iter(|| verify_transaction(black_box(&tx), None).expect("valid"));
    });
}

fn bench_vote_encoding(c: &mut Criterion) {
    let keypair = LiskKeypair::from_passphrase(PASSPHRASE);
    let mut group = c.benchmark_group("encoding/vote");

    for count in [1usize, 11, 33] {
        let delegates: Vec<_> = (0..count)
            .map(|i| LiskKeypair::from_passphrase(&format!("delegate {i}")).public_key())
            .collect();
        let tx = Transaction::vote(
            keypair.public_key(),
            concat_vote_lists(&delegates, &[]),
            &FeeSchedule::default(),
            TIMESTAMP,
        )
        .expect("valid vote");

        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &tx, |b, tx| {
            b.iter(|| tx.signable_bytes().expect("encodes"));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_key_derivation,
    bench_encode_send,
    bench_sign_send,
    bench_verify_send,
    bench_vote_encoding,
);
criterion_main!(benches);
