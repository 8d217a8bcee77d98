//! # Oracle-Coordinator Benchmarks
//!
//! | Area | Operation |
//! |------|-----------|
//! | oc-01 | agreement signature batch verification |
//! | oc-03 | mean over n reports |
//! | oc-05 | order-weighted payment split |
//! | oc-06 | report → fulfil → settle on the in-memory stack |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use oc_01_signature_verification::test_helpers::TestNode;
use oc_01_signature_verification::{
    batch_verify_ecdsa, eth_signed_message_hash, VerificationRequest,
};
use oc_03_aggregation::{AggregationStrategy, AggregatorKind};
use oc_05_settlement_ledger::split_payment;
use oc_06_coordinator::OracleCoordinatorApi;
use oc_tests::fixtures::Scenario;
use rand::Rng;
use shared_types::{Report, RequestId, U256};
use std::time::Duration;

fn bench_signature_batches(c: &mut Criterion) {
    let mut group = c.benchmark_group("oc-01-signature-verification");
    group.measurement_time(Duration::from_secs(10));

    for size in [1usize, 8, 32, 64] {
        let digest = eth_signed_message_hash(&[0x11; 32]);
        let requests: Vec<VerificationRequest> = (0..size)
            .map(|i| {
                let node = TestNode::from_seed(i as u8 + 1);
                VerificationRequest {
                    message_hash: digest,
                    signature: node.sign_payload(&[0x11; 32]),
                    expected_signer: Some(node.address),
                }
            })
            .collect();

        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::new("batch_verify", size), &requests, |b, reqs| {
            b.iter(|| black_box(batch_verify_ecdsa(reqs)))
        });
    }
    group.finish();
}

fn bench_mean(c: &mut Criterion) {
    let mut group = c.benchmark_group("oc-03-aggregation");
    let mut rng = rand::thread_rng();

    for n in [3usize, 16, 64] {
        let reports: Vec<Report> = (0..n)
            .map(|i| Report {
                request_id: RequestId([0; 32]),
                node: [i as u8; 20],
                value: U256::from(rng.gen::<u128>()),
                received_order: i as u32 + 1,
            })
            .collect();

        group.bench_with_input(BenchmarkId::new("mean_finalize", n), &reports, |b, reports| {
            b.iter(|| black_box(AggregatorKind::Mean.finalize(reports, n)))
        });
    }
    group.finish();
}

fn bench_payment_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("oc-05-settlement");

    for n in [1usize, 3, 16, 64] {
        group.bench_with_input(BenchmarkId::new("split_payment", n), &n, |b, &n| {
            b.iter(|| black_box(split_payment(U256::MAX, n)))
        });
    }
    group.finish();
}

fn bench_fulfillment(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("runtime");
    let mut group = c.benchmark_group("oc-06-coordinator");
    group.sample_size(20);

    for nodes in [1u8, 3] {
        group.bench_function(BenchmarkId::new("request_to_settlement", nodes), |b| {
            b.iter(|| {
                runtime.block_on(async {
                    let scenario = Scenario::new(nodes, 900).await;
                    let request_id = scenario.fund_request().await;
                    for node in &scenario.nodes {
                        scenario
                            .coordinator()
                            .fulfill_oracle_request(node.address, request_id, U256::from(7))
                            .await
                            .expect("report accepted");
                    }
                })
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_signature_batches,
    bench_mean,
    bench_payment_split,
    bench_fulfillment
);
criterion_main!(benches);
