use std::sync::Arc;

use biller::prelude::*;
use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use tokio::runtime::Runtime;

/// Store with `customers` customers holding `invoices_each` pending invoices
fn seeded_store(customers: usize, invoices_each: usize) -> Arc<ConcurrentBillingStore> {
    let store = Arc::new(ConcurrentBillingStore::new());
    for i in 0..customers {
        let currency = Currency::ALL[i % Currency::ALL.len()];
        let customer = store.create_customer(currency);
        for _ in 0..invoices_each {
            let amount = Money::parse("49.99", currency).unwrap();
            store.create_invoice(customer.id, amount, InvoiceStatus::Pending);
        }
    }
    store
}

fn orchestrator(
    store: Arc<ConcurrentBillingStore>,
    config: &BillingConfig,
) -> BillingOrchestrator<
    ConcurrentBillingStore,
    SimulatedPaymentProvider<Arc<ConcurrentBillingStore>>,
    RecordingEventSink,
> {
    let provider = SimulatedPaymentProvider::new(store.clone())
        .with_decline_every(7)
        .with_flaky_every(11);
    BillingOrchestrator::from_shared(
        store,
        Arc::new(provider),
        Arc::new(RecordingEventSink::new()),
        config,
    )
}

/// Full runs over growing customer bases
fn bench_run_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("billing_run_sizes");
    let runtime = Runtime::new().unwrap();
    let config = BillingConfig::new().with_retry_backoff(Default::default(), Default::default());

    for (name, customers) in [("small_100", 100), ("medium_1k", 1_000), ("large_10k", 10_000)] {
        group.bench_with_input(BenchmarkId::from_parameter(name), &customers, |b, &customers| {
            b.to_async(&runtime).iter_batched(
                || orchestrator(seeded_store(customers, 3), &config),
                |orchestrator| async move {
                    black_box(orchestrator.run().await.unwrap());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Same workload under different worker limits
fn bench_in_flight_limits(c: &mut Criterion) {
    let mut group = c.benchmark_group("billing_run_in_flight");
    let runtime = Runtime::new().unwrap();

    for limit in [1usize, 8, 50, 200] {
        let config = BillingConfig::new()
            .with_max_in_flight(limit)
            .with_retry_backoff(Default::default(), Default::default());

        group.bench_with_input(BenchmarkId::from_parameter(limit), &config, |b, config| {
            b.to_async(&runtime).iter_batched(
                || orchestrator(seeded_store(1_000, 3), config),
                |orchestrator| async move {
                    black_box(orchestrator.run().await.unwrap());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

/// Page size trade-off for the customer walk
fn bench_page_sizes(c: &mut Criterion) {
    let mut group = c.benchmark_group("billing_run_page_size");
    let runtime = Runtime::new().unwrap();

    for page_size in [10usize, 50, 500] {
        let config = BillingConfig::new()
            .with_page_size(page_size)
            .with_retry_backoff(Default::default(), Default::default());

        group.bench_with_input(BenchmarkId::from_parameter(page_size), &config, |b, config| {
            b.to_async(&runtime).iter_batched(
                || orchestrator(seeded_store(1_000, 1), config),
                |orchestrator| async move {
                    black_box(orchestrator.run().await.unwrap());
                },
                BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_run_sizes, bench_in_flight_limits, bench_page_sizes);
criterion_main!(benches);
