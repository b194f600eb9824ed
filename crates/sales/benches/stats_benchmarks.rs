use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};

use chrono::{Duration, TimeZone, Utc};
use vapers_core::{Money, ProductId, SaleId};
use vapers_products::{CreateProduct, Product, ProductCatalog};
use vapers_sales::{
    SaleRecord, SalesView, SortDirection, SortKey, compute_summary, filter_and_sort, summarize,
};

const CUSTOMERS: [&str; 6] = ["Ana", "Bob", "Carla", "Dani", "Eva", "Fran"];

fn catalog(size: usize) -> Vec<Product> {
    let created = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (0..size)
        .map(|i| {
            Product::create(CreateProduct {
                product_id: ProductId::new(),
                name: format!("Vaper {i}"),
                image: None,
                stock: 100,
                unit_price: Money::from_cents(500 + i as u64),
                occurred_at: created,
            })
            .unwrap()
        })
        .collect()
}

fn sales(products: &[Product], count: usize) -> Vec<SaleRecord> {
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    (0..count)
        .map(|i| {
            let product = &products[i % products.len()];
            let quantity = (i % 5) as u32 + 1;
            let unit_price = product.unit_price();
            SaleRecord {
                id: SaleId::new(),
                product_id: product.id_typed(),
                quantity,
                unit_price,
                total: unit_price.checked_mul(quantity).unwrap(),
                customer: CUSTOMERS[i % CUSTOMERS.len()].to_string(),
                sold_at: start + Duration::minutes(i as i64),
            }
        })
        .collect()
}

fn bench_compute_summary(c: &mut Criterion) {
    let mut group = c.benchmark_group("compute_summary");
    let products = catalog(50);

    for count in [100usize, 1_000, 10_000].iter() {
        let records = sales(&products, *count);
        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &records, |b, records| {
            b.iter(|| compute_summary(black_box(records), black_box(&products)).unwrap());
        });
    }

    group.finish();
}

fn bench_filter_and_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_and_sort");
    let products = catalog(50);
    let records = sales(&products, 10_000);
    let names = ProductCatalog::new(&products);

    group.bench_function("customer_filter_sort_by_total", |b| {
        b.iter(|| {
            filter_and_sort(
                black_box(&records),
                |id| names.name_of(id).into_owned(),
                "an",
                SortKey::Total,
                SortDirection::Desc,
            )
        });
    });

    group.bench_function("no_filter_sort_by_product", |b| {
        b.iter(|| {
            filter_and_sort(
                black_box(&records),
                |id| names.name_of(id).into_owned(),
                "",
                SortKey::Product,
                SortDirection::Asc,
            )
        });
    });

    group.finish();
}

fn bench_summarize(c: &mut Criterion) {
    let products = catalog(50);
    let records = sales(&products, 10_000);
    let view = SalesView {
        filter_text: "vaper 1".to_string(),
        ..SalesView::default()
    };

    c.bench_function("summarize_default_view", |b| {
        b.iter(|| summarize(black_box(&records), black_box(&products), &view).unwrap());
    });
}

criterion_group!(
    benches,
    bench_compute_summary,
    bench_filter_and_sort,
    bench_summarize
);
criterion_main!(benches);
