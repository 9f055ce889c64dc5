use std::collections::HashMap;

use cucumber::World;
use log::*;
use mini_order_engine::{
    db_types::{MenuItem, OrderDetail, Store, User},
    events::EventProducers,
    test_utils::prepare_env::{create_database, random_db_path, run_migrations},
    EngineError,
    OrderFlowApi,
    SqliteDatabase,
    StoreApi,
};

#[derive(Default, Debug, World)]
pub struct OrderWorld {
    pub system: Option<OrderSystem>,
    pub users: HashMap<String, (User, Store)>,
    pub menu: HashMap<String, MenuItem>,
    pub last_order: Option<OrderDetail>,
    pub last_error: Option<EngineError>,
}

#[derive(Debug)]
pub struct OrderSystem {
    pub db_path: String,
    pub db: SqliteDatabase,
    pub orders: OrderFlowApi<SqliteDatabase>,
    pub stores: StoreApi<SqliteDatabase>,
}

impl OrderWorld {
    pub fn system(&self) -> &OrderSystem {
        self.system.as_ref().expect("System not initialised. Start the scenario with 'Given a fresh install'")
    }

    pub fn db(&self) -> &SqliteDatabase {
        &self.system().db
    }

    pub fn user(&self, name: &str) -> &User {
        &self.users.get(name).unwrap_or_else(|| panic!("No user called {name}")).0
    }

    pub fn store_of(&self, name: &str) -> &Store {
        &self.users.get(name).unwrap_or_else(|| panic!("No user called {name}")).1
    }

    pub fn item(&self, name: &str) -> &MenuItem {
        self.menu.get(name).unwrap_or_else(|| panic!("No menu item called {name}"))
    }

    /// Stores the outcome of an API call so that later steps can check it.
    pub fn record<T>(&mut self, result: Result<T, EngineError>) -> Option<T> {
        match result {
            Ok(v) => {
                self.last_error = None;
                Some(v)
            },
            Err(e) => {
                debug!("🚀️ Step failed with {e}");
                self.last_error = Some(e);
                None
            },
        }
    }
}

impl OrderSystem {
    pub async fn new() -> Self {
        let db_path = random_db_path();
        create_database(&db_path).await;
        run_migrations(&db_path).await;
        let db = SqliteDatabase::new_with_url(&db_path, 5).await.expect("Error creating connection to database");
        debug!("🚀️ Created database: {db_path}");
        let orders = OrderFlowApi::new(db.clone(), EventProducers::default());
        let stores = StoreApi::new(db.clone(), EventProducers::default());
        Self { db_path, db, orders, stores }
    }
}
