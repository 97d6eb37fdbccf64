use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use gridplot::{Record, SeriesAggregator, Store};
use std::sync::Arc;

fn records(policies: i64, ticks: i64) -> Vec<Record> {
    let columns: Arc<[String]> = ["demand".to_owned(), "appliancesOn".to_owned()]
        .into_iter()
        .collect();

    (0..ticks)
        .flat_map(|tick| {
            let columns = columns.clone();
            (0..policies).map(move |policy| {
                #[allow(clippy::cast_precision_loss)]
                let value = ((tick * 7 + policy * 13) % 100) as f64;
                Record::new(tick * 1_000, columns.clone(), vec![Some(value), Some(value / 10.0)])
                    .with_key(policy)
            })
        })
        .collect()
}

fn aggregate_unkeyed(c: &mut Criterion) {
    let rows = records(1, 100_000);

    c.bench_function("aggregate unkeyed (100k rows, 2 fields)", |b| {
        b.iter_batched(
            || rows.clone(),
            |rows| {
                SeriesAggregator::unkeyed()
                    .column("demand")
                    .column("appliancesOn")
                    .run(rows.into_iter().map(Ok))
                    .unwrap()
            },
            BatchSize::LargeInput,
        );
    });
}

fn aggregate_keyed(c: &mut Criterion) {
    let rows = records(10, 10_000);

    c.bench_function("aggregate keyed (10 keys, 100k rows, 2 fields)", |b| {
        b.iter_batched(
            || rows.clone(),
            |rows| {
                SeriesAggregator::new(Record::require_key)
                    .column("demand")
                    .column("appliancesOn")
                    .run(rows.into_iter().map(Ok))
                    .unwrap()
            },
            BatchSize::LargeInput,
        );
    });
}

fn store_scan(c: &mut Criterion) {
    let store = Store::builder()
        .create_schema(true)
        .open_in_memory()
        .unwrap();

    store
        .batch(|store| {
            store.insert_run(1, 0)?;
            store.insert_policy(1, "greedy", "1")?;

            for household in 0..20 {
                store.assign_household(1, household, 1)?;

                for tick in 0..1_000 {
                    #[allow(clippy::cast_precision_loss)]
                    let demand = (tick % 17) as f64;
                    store.log_household(1, household, tick * 1_000, demand, 2)?;
                }
            }

            Ok(())
        })
        .unwrap();

    c.bench_function("scan + aggregate policy average (20 households, 1k ticks)", |b| {
        b.iter(|| {
            store
                .scan_policy_average(1, 1, |rows| {
                    SeriesAggregator::unkeyed()
                        .column("demand")
                        .column("appliancesOn")
                        .run(rows)
                })
                .unwrap()
        });
    });
}

criterion_group!(benches, aggregate_unkeyed, aggregate_keyed, store_scan);
criterion_main!(benches);
