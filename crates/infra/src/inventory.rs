//! Inventory service: products, purchases and sales kept consistent with stock.

use std::sync::Mutex;

use vapers_core::{DomainError, DomainResult, Money, ProductId, PurchaseId, SaleId};
use vapers_products::{CreateProduct, Product};
use vapers_purchasing::{Purchase, RecordPurchase};
use vapers_sales::{AggregationResult, RecordSale, SaleRecord, SalesView, summarize};

use crate::store::{InMemoryRepository, Repository};

pub type InMemoryInventory = Inventory<
    InMemoryRepository<ProductId, Product>,
    InMemoryRepository<SaleId, SaleRecord>,
    InMemoryRepository<PurchaseId, Purchase>,
>;

/// Coordinates the product, sale and purchase repositories.
///
/// Every write that touches stock runs under one service-wide lock, so a
/// sale's stock check, its record and the stock decrement are observed
/// together or not at all.
#[derive(Debug)]
pub struct Inventory<P, S, U>
where
    P: Repository<ProductId, Product>,
    S: Repository<SaleId, SaleRecord>,
    U: Repository<PurchaseId, Purchase>,
{
    products: P,
    sales: S,
    purchases: U,
    writes: Mutex<()>,
}

impl InMemoryInventory {
    pub fn in_memory() -> Self {
        Self::new(
            InMemoryRepository::new(),
            InMemoryRepository::new(),
            InMemoryRepository::new(),
        )
    }
}

impl<P, S, U> Inventory<P, S, U>
where
    P: Repository<ProductId, Product>,
    S: Repository<SaleId, SaleRecord>,
    U: Repository<PurchaseId, Purchase>,
{
    pub fn new(products: P, sales: S, purchases: U) -> Self {
        Self {
            products,
            sales,
            purchases,
            writes: Mutex::new(()),
        }
    }

    pub fn products(&self) -> DomainResult<Vec<Product>> {
        self.products.list()
    }

    pub fn product(&self, id: &ProductId) -> DomainResult<Product> {
        self.products.get(id)?.ok_or_else(DomainError::not_found)
    }

    pub fn sales(&self) -> DomainResult<Vec<SaleRecord>> {
        self.sales.list()
    }

    pub fn purchases(&self) -> DomainResult<Vec<Purchase>> {
        self.purchases.list()
    }

    pub fn create_product(&self, cmd: CreateProduct) -> DomainResult<Product> {
        let product = Product::create(cmd)?;
        let _guard = self.writes.lock().map_err(|_| lock_poisoned())?;
        self.products.add(product.clone())?;

        tracing::info!(product_id = %product.id_typed(), name = product.name(), "product created");
        Ok(product)
    }

    /// Overwrite the stock count of a product.
    pub fn set_stock(&self, id: &ProductId, stock: u32) -> DomainResult<Product> {
        let _guard = self.writes.lock().map_err(|_| lock_poisoned())?;
        let product = self.products.update(id, &mut |p| {
            p.set_stock(stock);
            Ok(())
        })?;

        tracing::info!(product_id = %id, stock, "stock set");
        Ok(product)
    }

    /// Record a purchase and add its units to the product's stock.
    pub fn record_purchase(&self, cmd: RecordPurchase) -> DomainResult<Purchase> {
        let purchase = Purchase::record(cmd)?;
        let product_id = purchase.product_id();
        let quantity = purchase.quantity();

        let _guard = self.writes.lock().map_err(|_| lock_poisoned())?;
        let product = self.products.update(&product_id, &mut |p| p.restock(quantity))?;
        if let Err(err) = self.purchases.add(purchase.clone()) {
            self.undo_stock_change(&product_id, &mut |p| p.withdraw(quantity));
            return Err(err);
        }

        tracing::info!(
            purchase_id = %purchase.id_typed(),
            product_id = %product_id,
            quantity,
            stock = product.stock(),
            "purchase recorded"
        );
        Ok(purchase)
    }

    /// Record a sale and take its units out of the product's stock.
    ///
    /// Fails with `InsufficientStock` (and records nothing) when the product
    /// does not have enough units. If the sale cannot be stored the stock is
    /// put back before the error is returned.
    pub fn record_sale(&self, cmd: RecordSale) -> DomainResult<SaleRecord> {
        let sale = SaleRecord::record(cmd)?;
        let quantity = sale.quantity;

        let _guard = self.writes.lock().map_err(|_| lock_poisoned())?;
        let product = self.products.update(&sale.product_id, &mut |p| p.withdraw(quantity))?;
        if let Err(err) = self.sales.add(sale.clone()) {
            self.undo_stock_change(&sale.product_id, &mut |p| p.restock(quantity));
            return Err(err);
        }

        tracing::info!(
            sale_id = %sale.id,
            product_id = %sale.product_id,
            quantity,
            total = %sale.total,
            stock = product.stock(),
            "sale recorded"
        );
        Ok(sale)
    }

    /// Statistics over one consistent snapshot of sales and stock.
    pub fn sales_statistics(&self, view: &SalesView) -> DomainResult<AggregationResult> {
        let (sales, products) = {
            let _guard = self.writes.lock().map_err(|_| lock_poisoned())?;
            (self.sales.list()?, self.products.list()?)
        };
        summarize(&sales, &products, view)
    }

    /// Sum of all recorded sale totals.
    pub fn sales_revenue(&self) -> DomainResult<Money> {
        Money::checked_sum(self.sales.list()?.iter().map(|s| s.total))
            .ok_or_else(|| DomainError::invariant("sales revenue overflows"))
    }

    fn undo_stock_change(
        &self,
        id: &ProductId,
        undo: &mut dyn FnMut(&mut Product) -> DomainResult<()>,
    ) {
        if let Err(err) = self.products.update(id, undo) {
            tracing::error!(product_id = %id, error = %err, "failed to undo stock change");
        }
    }
}

fn lock_poisoned() -> DomainError {
    DomainError::invariant("inventory write lock poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn inventory_with(stock: u32, price_cents: u64) -> (InMemoryInventory, ProductId) {
        let inventory = InMemoryInventory::in_memory();
        let product = inventory
            .create_product(CreateProduct {
                product_id: ProductId::new(),
                name: "Elf Bar".to_string(),
                image: None,
                stock,
                unit_price: Money::from_cents(price_cents),
                occurred_at: Utc::now(),
            })
            .unwrap();
        (inventory, product.id_typed())
    }

    fn sale(product_id: ProductId, quantity: u32) -> RecordSale {
        RecordSale {
            sale_id: SaleId::new(),
            product_id,
            quantity,
            unit_price: Money::from_cents(500),
            customer: Some("Ana".to_string()),
            occurred_at: Utc::now(),
        }
    }

    #[test]
    fn sale_decrements_stock_and_is_listed() {
        let (inventory, id) = inventory_with(5, 500);

        let recorded = inventory.record_sale(sale(id, 2)).unwrap();

        assert_eq!(inventory.product(&id).unwrap().stock(), 3);
        assert_eq!(inventory.sales().unwrap(), vec![recorded]);
        assert_eq!(inventory.sales_revenue().unwrap(), Money::from_cents(1000));
    }

    #[test]
    fn oversell_is_rejected_without_side_effects() {
        let (inventory, id) = inventory_with(1, 500);

        let err = inventory.record_sale(sale(id, 2)).unwrap_err();

        assert_eq!(err, DomainError::insufficient_stock(2, 1));
        assert_eq!(inventory.product(&id).unwrap().stock(), 1);
        assert!(inventory.sales().unwrap().is_empty());
    }

    #[test]
    fn sale_of_unknown_product_is_not_found() {
        let inventory = InMemoryInventory::in_memory();
        assert_eq!(
            inventory.record_sale(sale(ProductId::new(), 1)).unwrap_err(),
            DomainError::NotFound
        );
    }

    #[test]
    fn purchase_restocks_product() {
        let (inventory, id) = inventory_with(1, 500);

        let purchase = inventory
            .record_purchase(RecordPurchase {
                purchase_id: PurchaseId::new(),
                product_id: id,
                quantity: 10,
                unit_price: Money::from_cents(300),
                occurred_at: Utc::now(),
            })
            .unwrap();

        assert_eq!(purchase.total(), Money::from_cents(3000));
        assert_eq!(inventory.product(&id).unwrap().stock(), 11);
        assert_eq!(inventory.purchases().unwrap().len(), 1);
    }

    #[test]
    fn set_stock_overwrites_count() {
        let (inventory, id) = inventory_with(4, 500);
        assert_eq!(inventory.set_stock(&id, 40).unwrap().stock(), 40);
        assert_eq!(
            inventory.set_stock(&ProductId::new(), 1).unwrap_err(),
            DomainError::NotFound
        );
    }

    #[test]
    fn statistics_reflect_recorded_sales() {
        let (inventory, id) = inventory_with(10, 500);
        inventory.record_sale(sale(id, 3)).unwrap();
        inventory.record_sale(sale(id, 1)).unwrap();

        let stats = inventory.sales_statistics(&SalesView::default()).unwrap();

        assert_eq!(stats.summary.total_units_sold, 4);
        assert_eq!(stats.summary.top_product_by_units, "Elf Bar");
        assert_eq!(stats.summary.stock_remaining_total, 6);
        assert_eq!(stats.filtered_sorted_rows.len(), 2);
    }

    #[test]
    fn concurrent_sales_never_oversell() {
        use std::sync::Arc;

        let (inventory, id) = inventory_with(10, 500);
        let inventory = Arc::new(inventory);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let inventory = Arc::clone(&inventory);
                std::thread::spawn(move || {
                    (0..5).filter(|_| inventory.record_sale(sale(id, 1)).is_ok()).count()
                })
            })
            .collect();
        let sold: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(sold, 10);
        assert_eq!(inventory.product(&id).unwrap().stock(), 0);
        assert_eq!(inventory.sales().unwrap().len(), 10);
    }

    /// Sales store that refuses every write.
    struct RejectingSales;

    impl Repository<SaleId, SaleRecord> for RejectingSales {
        fn get(&self, _key: &SaleId) -> DomainResult<Option<SaleRecord>> {
            Ok(None)
        }

        fn insert(&self, _key: SaleId, _value: SaleRecord) -> DomainResult<()> {
            Err(DomainError::invariant("sales store unavailable"))
        }

        fn upsert(&self, _key: SaleId, _value: SaleRecord) -> DomainResult<()> {
            Err(DomainError::invariant("sales store unavailable"))
        }

        fn list(&self) -> DomainResult<Vec<SaleRecord>> {
            Ok(Vec::new())
        }

        fn update(
            &self,
            _key: &SaleId,
            _apply: &mut dyn FnMut(&mut SaleRecord) -> DomainResult<()>,
        ) -> DomainResult<SaleRecord> {
            Err(DomainError::NotFound)
        }

        fn len(&self) -> DomainResult<usize> {
            Ok(0)
        }
    }

    #[test]
    fn failed_sale_write_restores_stock() {
        let inventory = Inventory::new(
            InMemoryRepository::<ProductId, Product>::new(),
            RejectingSales,
            InMemoryRepository::<PurchaseId, Purchase>::new(),
        );
        let id = inventory
            .create_product(CreateProduct {
                product_id: ProductId::new(),
                name: "Elf Bar".to_string(),
                image: None,
                stock: 4,
                unit_price: Money::from_cents(500),
                occurred_at: Utc::now(),
            })
            .unwrap()
            .id_typed();

        let err = inventory.record_sale(sale(id, 3)).unwrap_err();

        assert_eq!(err, DomainError::invariant("sales store unavailable"));
        assert_eq!(inventory.product(&id).unwrap().stock(), 4);
    }

    #[test]
    fn statistics_see_stock_and_sales_from_the_same_moment() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicBool, Ordering};

        let (inventory, id) = inventory_with(200, 500);
        let inventory = Arc::new(inventory);
        let done = Arc::new(AtomicBool::new(false));

        let sellers: Vec<_> = (0..4)
            .map(|_| {
                let inventory = Arc::clone(&inventory);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        inventory.record_sale(sale(id, 1)).unwrap();
                    }
                })
            })
            .collect();

        let reader = {
            let inventory = Arc::clone(&inventory);
            let done = Arc::clone(&done);
            std::thread::spawn(move || {
                while !done.load(Ordering::Acquire) {
                    let stats = inventory.sales_statistics(&SalesView::default()).unwrap();
                    let s = stats.summary;
                    assert_eq!(s.stock_remaining_total + s.total_units_sold, 200);
                }
            })
        };

        for seller in sellers {
            seller.join().unwrap();
        }
        done.store(true, Ordering::Release);
        reader.join().unwrap();

        assert_eq!(inventory.product(&id).unwrap().stock(), 0);
    }
}
