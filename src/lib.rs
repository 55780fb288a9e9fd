pub mod config;
pub mod domain {
    pub mod bill;
    pub mod notification;
    pub mod product;
    pub mod review;
    pub mod user;
}
pub mod error;
pub mod gateways;
pub mod http {
    pub mod extract;
    pub mod handlers {
        pub mod bills;
        pub mod ops;
        pub mod products;
        pub mod reviews;
        pub mod users;
    }
    pub mod middleware {
        pub mod admin_auth;
        pub mod rate_limit;
    }
    pub mod routes;
}
pub mod repo {
    pub mod bills_repo;
    pub mod memory;
    pub mod products_repo;
    pub mod reviews_repo;
    pub mod users_repo;
}
pub mod service {
    pub mod bill_service;
    pub mod product_filter;
    pub mod product_service;
    pub mod review_service;
    pub mod user_service;
}

use gateways::PaymentGateway;
use repo::bills_repo::BillStore;
use repo::products_repo::ProductStore;
use repo::reviews_repo::ReviewStore;
use repo::users_repo::UserStore;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub bill_service: service::bill_service::BillService,
    pub product_service: service::product_service::ProductService,
    pub review_service: service::review_service::ReviewService,
    pub user_service: service::user_service::UserService,
    pub pool: Option<sqlx::PgPool>,
    pub redis_client: Option<redis::Client>,
}

/// The storage half of the application, one store per aggregate.
#[derive(Clone)]
pub struct Stores {
    pub bills: Arc<dyn BillStore>,
    pub products: Arc<dyn ProductStore>,
    pub reviews: Arc<dyn ReviewStore>,
    pub users: Arc<dyn UserStore>,
}

impl Stores {
    pub fn postgres(pool: &sqlx::PgPool) -> Self {
        Self {
            bills: Arc::new(repo::bills_repo::BillsRepo { pool: pool.clone() }),
            products: Arc::new(repo::products_repo::ProductsRepo { pool: pool.clone() }),
            reviews: Arc::new(repo::reviews_repo::ReviewsRepo { pool: pool.clone() }),
            users: Arc::new(repo::users_repo::UsersRepo { pool: pool.clone() }),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            bills: Arc::new(repo::memory::InMemoryBillStore::new()),
            products: Arc::new(repo::memory::InMemoryProductStore::new()),
            reviews: Arc::new(repo::memory::InMemoryReviewStore::new()),
            users: Arc::new(repo::memory::InMemoryUserStore::new()),
        }
    }
}

impl AppState {
    pub fn new(
        stores: Stores,
        gateway: Arc<dyn PaymentGateway>,
        default_notification_url: String,
    ) -> Self {
        Self {
            bill_service: service::bill_service::BillService {
                store: stores.bills,
                gateway,
                default_notification_url,
            },
            product_service: service::product_service::ProductService {
                store: stores.products,
            },
            review_service: service::review_service::ReviewService {
                store: stores.reviews,
            },
            user_service: service::user_service::UserService {
                store: stores.users,
            },
            pool: None,
            redis_client: None,
        }
    }
}
