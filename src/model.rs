//! The Northwind entities and their table descriptors.
//!
//! Wire field names are PascalCase (`SupplierId`), column names are snake_case (`supplier_id`).
//! Integer keys default to 0 when omitted so create requests need not carry them.

use crate::entity::Entity;
use crate::table::{Column, PgType, Table};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

pub static CATEGORIES: Table = Table {
    name: "categories",
    path: "Categories",
    key: Column::new("category_id", PgType::Integer),
    columns: &[
        Column::varchar("category_name", 15).required(),
        Column::new("description", PgType::Text),
    ],
};

pub static CUSTOMERS: Table = Table {
    name: "customers",
    path: "Customers",
    key: Column::varchar("customer_id", 5).required(),
    columns: &[
        Column::varchar("company_name", 40).required(),
        Column::varchar("contact_name", 30),
        Column::varchar("contact_title", 30),
        Column::varchar("address", 60),
        Column::varchar("city", 15),
        Column::varchar("region", 15),
        Column::varchar("postal_code", 10),
        Column::varchar("country", 15),
        Column::varchar("phone", 24),
        Column::varchar("fax", 24),
    ],
};

pub static SHIPPERS: Table = Table {
    name: "shippers",
    path: "Shippers",
    key: Column::new("shipper_id", PgType::Integer),
    columns: &[
        Column::varchar("company_name", 40).required(),
        Column::varchar("phone", 24),
    ],
};

pub static SUPPLIERS: Table = Table {
    name: "suppliers",
    path: "Suppliers",
    key: Column::new("supplier_id", PgType::Integer),
    columns: &[
        Column::varchar("company_name", 40).required(),
        Column::varchar("contact_name", 30),
        Column::varchar("contact_title", 30),
        Column::varchar("address", 60),
        Column::varchar("city", 15),
        Column::varchar("region", 15),
        Column::varchar("postal_code", 10),
        Column::varchar("country", 15),
        Column::varchar("phone", 24),
        Column::varchar("fax", 24),
        Column::new("home_page", PgType::Text),
    ],
};

pub static ORDERS: Table = Table {
    name: "orders",
    path: "Orders",
    key: Column::new("order_id", PgType::Integer),
    columns: &[
        Column::varchar("customer_id", 5).references("customers"),
        Column::new("employee_id", PgType::Integer),
        Column::new("order_date", PgType::Timestamp),
        Column::new("required_date", PgType::Timestamp),
        Column::new("shipped_date", PgType::Timestamp),
        Column::new("ship_via", PgType::Integer).references("shippers"),
        Column::new("freight", PgType::Double),
        Column::varchar("ship_name", 40),
        Column::varchar("ship_address", 60),
        Column::varchar("ship_city", 15),
        Column::varchar("ship_region", 15),
        Column::varchar("ship_postal_code", 10),
        Column::varchar("ship_country", 15),
    ],
};

pub static ORDER_DETAILS: Table = Table {
    name: "order_details",
    path: "OrderDetails",
    key: Column::new("order_detail_id", PgType::Integer),
    columns: &[
        Column::new("order_id", PgType::Integer).required().references("orders"),
        Column::new("product_id", PgType::Integer).required(),
        Column::new("unit_price", PgType::Double).required(),
        Column::new("quantity", PgType::SmallInt).required(),
        Column::new("discount", PgType::Double).required(),
    ],
};

/// All tables, ordered so that every table comes after the tables it references.
pub fn all_tables() -> [&'static Table; 6] {
    [
        &CATEGORIES,
        &CUSTOMERS,
        &SHIPPERS,
        &SUPPLIERS,
        &ORDERS,
        &ORDER_DETAILS,
    ]
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Category {
    #[serde(default)]
    pub category_id: i32,
    pub category_name: String,
    pub description: Option<String>,
}

impl Entity for Category {
    type Key = i32;
    const NAME: &'static str = "category";

    fn table() -> &'static Table {
        &CATEGORIES
    }

    fn key(&self) -> i32 {
        self.category_id
    }

    fn set_key(&mut self, key: i32) {
        self.category_id = key;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    pub customer_id: String,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
}

impl Entity for Customer {
    type Key = String;
    const NAME: &'static str = "customer";

    fn table() -> &'static Table {
        &CUSTOMERS
    }

    fn key(&self) -> String {
        self.customer_id.clone()
    }

    fn set_key(&mut self, key: String) {
        self.customer_id = key;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Shipper {
    #[serde(default)]
    pub shipper_id: i32,
    pub company_name: String,
    pub phone: Option<String>,
}

impl Entity for Shipper {
    type Key = i32;
    const NAME: &'static str = "shipper";

    fn table() -> &'static Table {
        &SHIPPERS
    }

    fn key(&self) -> i32 {
        self.shipper_id
    }

    fn set_key(&mut self, key: i32) {
        self.shipper_id = key;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Supplier {
    #[serde(default)]
    pub supplier_id: i32,
    pub company_name: String,
    pub contact_name: Option<String>,
    pub contact_title: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    pub home_page: Option<String>,
}

impl Entity for Supplier {
    type Key = i32;
    const NAME: &'static str = "supplier";

    fn table() -> &'static Table {
        &SUPPLIERS
    }

    fn key(&self) -> i32 {
        self.supplier_id
    }

    fn set_key(&mut self, key: i32) {
        self.supplier_id = key;
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Order {
    #[serde(default)]
    pub order_id: i32,
    pub customer_id: Option<String>,
    pub employee_id: Option<i32>,
    pub order_date: Option<NaiveDateTime>,
    pub required_date: Option<NaiveDateTime>,
    pub shipped_date: Option<NaiveDateTime>,
    pub ship_via: Option<i32>,
    pub freight: Option<f64>,
    pub ship_name: Option<String>,
    pub ship_address: Option<String>,
    pub ship_city: Option<String>,
    pub ship_region: Option<String>,
    pub ship_postal_code: Option<String>,
    pub ship_country: Option<String>,
}

impl Entity for Order {
    type Key = i32;
    const NAME: &'static str = "order";

    fn table() -> &'static Table {
        &ORDERS
    }

    fn key(&self) -> i32 {
        self.order_id
    }

    fn set_key(&mut self, key: i32) {
        self.order_id = key;
    }
}

/// One line item of an order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OrderDetail {
    #[serde(default)]
    pub order_detail_id: i32,
    pub order_id: i32,
    pub product_id: i32,
    pub unit_price: f64,
    pub quantity: i16,
    pub discount: f64,
}

impl Entity for OrderDetail {
    type Key = i32;
    const NAME: &'static str = "order detail";

    fn table() -> &'static Table {
        &ORDER_DETAILS
    }

    fn key(&self) -> i32 {
        self.order_detail_id
    }

    fn set_key(&mut self, key: i32) {
        self.order_detail_id = key;
    }
}
