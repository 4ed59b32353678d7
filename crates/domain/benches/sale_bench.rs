use common::{CustomerId, Money, ProductId};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::sale::{ValidationContext, validate_cart};
use domain::{CreateSale, LineItemRequest, SaleService};
use store::{InMemoryStore, NewCategory, NewCustomer, NewProduct, Store};

const PLENTY: i64 = 1_000_000_000;

/// Seeds a store with one customer and `products` well-stocked products.
fn seeded_store(
    rt: &tokio::runtime::Runtime,
    products: usize,
) -> (InMemoryStore, CustomerId, Vec<ProductId>) {
    rt.block_on(async {
        let store = InMemoryStore::new();
        let customer = store
            .insert_customer(NewCustomer {
                name: "Bench Customer".into(),
                email: "bench@example.com".into(),
            })
            .await
            .unwrap();
        let category = store
            .insert_category(NewCategory {
                name: "Bench".into(),
                description: None,
            })
            .await
            .unwrap();

        let mut ids = Vec::with_capacity(products);
        for i in 0..products {
            let product = store
                .insert_product(NewProduct::new(
                    format!("Product {i}"),
                    Money::from_cents(100 + i as i64),
                    PLENTY,
                    category.id,
                ))
                .await
                .unwrap();
            ids.push(product.product.id);
        }
        (store, customer.id, ids)
    })
}

fn bench_create_sale(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("domain/create_sale");

    for lines in [1usize, 10, 50] {
        let (store, customer_id, products) = seeded_store(&rt, lines);
        let service = SaleService::new(store);
        let items: Vec<_> = products
            .iter()
            .map(|id| LineItemRequest::new(*id, 1))
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(lines), &items, |b, items| {
            b.iter(|| {
                rt.block_on(async {
                    service
                        .create_sale(CreateSale::new(customer_id, "PAYPAL", items.clone()))
                        .await
                        .unwrap();
                });
            });
        });
    }
    group.finish();
}

fn bench_validate_cart(c: &mut Criterion) {
    let products: Vec<ProductId> = (1..=50).map(ProductId::new).collect();
    let ctx = ValidationContext::new(true, products.iter().copied());
    let cmd = CreateSale::new(
        1,
        "STRIPE",
        products.iter().map(|id| LineItemRequest::new(*id, 2)).collect(),
    );

    c.bench_function("domain/validate_cart_50_lines", |b| {
        b.iter(|| validate_cart(&cmd, &ctx).unwrap());
    });
}

criterion_group!(benches, bench_create_sale, bench_validate_cart);
criterion_main!(benches);
