use axum::{
    Router,
    routing::{get, patch, post},
};

pub mod chat;
pub mod finance;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod system;

/// Router for every endpoint the storefront calls.
pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/", get(products::list_products))
        .nest("/vapers", products::router())
        // The storefront's stock screen patches `/{id}` directly.
        .route("/:id", patch(products::update_stock))
        .route("/compras", post(purchases::record_purchase))
        .route("/api/compras", get(purchases::list_purchases))
        .route("/ventas", post(sales::record_sale))
        .nest("/api/ventas", sales::router())
        .nest("/finanzas", finance::router())
        .route(
            "/api/chat-ventas",
            get(chat::chat_ventas_get).post(chat::chat_ventas),
        )
        .route("/api/resumen-7dias-email", post(chat::summary_email))
}
