//! Search, filter and sort pipelines behind the list views.
//!
//! Lists are small enough to load whole, so each query runs over the
//! in-memory rows after the database read.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::models::{
    CustomerSegment, CustomerSummary, OrderStatus, OrderType, OrderWithItems, PaymentStatus, Product,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }
}

/// Case-insensitive substring match against any of the fields.
pub fn matches_search<'a>(fields: impl IntoIterator<Item = Option<&'a str>>, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields
        .into_iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&needle))
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

fn created_on(timestamp: &str) -> Option<NaiveDate> {
    timestamp.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

// ===== Orders =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderSortField {
    #[default]
    CreatedAt,
    Total,
    CustomerName,
    Status,
    OrderNumber,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OrderQuery {
    pub search: Option<String>,
    pub statuses: Vec<OrderStatus>,
    pub order_type: Option<OrderType>,
    pub payment_status: Option<PaymentStatus>,
    pub customer_id: Option<i64>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
    pub sort_by: OrderSortField,
    pub direction: SortDirection,
}

impl OrderQuery {
    fn matches(&self, entry: &OrderWithItems) -> bool {
        let order = &entry.order;

        if !self.statuses.is_empty() && !self.statuses.contains(&order.status) {
            return false;
        }
        if self.order_type.is_some_and(|t| t != order.order_type) {
            return false;
        }
        if self.payment_status.is_some_and(|p| p != order.payment_status) {
            return false;
        }
        if self.customer_id.is_some() && self.customer_id != order.customer_id {
            return false;
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            let Some(day) = created_on(&order.created_at) else {
                return false;
            };
            if self.date_from.is_some_and(|from| day < from) || self.date_to.is_some_and(|to| day > to) {
                return false;
            }
        }

        match self.search.as_deref() {
            Some(needle) => {
                let fields = [
                    Some(order.order_number.as_str()),
                    order.customer_name.as_deref(),
                    order.notes.as_deref(),
                    order.delivery_address.as_deref(),
                ]
                .into_iter()
                .chain(entry.items.iter().map(|i| Some(i.product_name.as_str())));
                matches_search(fields, needle)
            }
            None => true,
        }
    }

    fn compare(&self, a: &OrderWithItems, b: &OrderWithItems) -> Ordering {
        let (a, b) = (&a.order, &b.order);
        let ordering = match self.sort_by {
            OrderSortField::CreatedAt => a.created_at.cmp(&b.created_at),
            OrderSortField::Total => cmp_f64(a.total, b.total),
            OrderSortField::CustomerName => a
                .customer_name
                .as_deref()
                .map(str::to_lowercase)
                .cmp(&b.customer_name.as_deref().map(str::to_lowercase)),
            OrderSortField::Status => status_rank(a.status).cmp(&status_rank(b.status)),
            OrderSortField::OrderNumber => a.order_number.cmp(&b.order_number),
        };
        self.direction.apply(ordering)
    }

    pub fn apply(&self, orders: Vec<OrderWithItems>) -> Vec<OrderWithItems> {
        let mut filtered: Vec<_> = orders.into_iter().filter(|o| self.matches(o)).collect();
        filtered.sort_by(|a, b| self.compare(a, b));
        filtered
    }
}

fn status_rank(status: OrderStatus) -> usize {
    OrderStatus::board_order()
        .iter()
        .position(|s| *s == status)
        .unwrap_or(usize::MAX)
}

// ===== Customers =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerSortField {
    #[default]
    Name,
    TotalSpent,
    TotalOrders,
    LastOrder,
    CreatedAt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CustomerQuery {
    pub search: Option<String>,
    pub segment: Option<CustomerSegment>,
    pub sort_by: CustomerSortField,
    pub direction: SortDirection,
}

impl Default for CustomerQuery {
    fn default() -> Self {
        CustomerQuery {
            search: None,
            segment: None,
            sort_by: CustomerSortField::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl CustomerQuery {
    fn matches(&self, summary: &CustomerSummary) -> bool {
        if self.segment.is_some_and(|s| s != summary.segment) {
            return false;
        }
        let c = &summary.customer;
        match self.search.as_deref() {
            Some(needle) => matches_search(
                [Some(c.name.as_str()), c.email.as_deref(), c.phone.as_deref()],
                needle,
            ),
            None => true,
        }
    }

    fn compare(&self, a: &CustomerSummary, b: &CustomerSummary) -> Ordering {
        let ordering = match self.sort_by {
            CustomerSortField::Name => a
                .customer
                .name
                .to_lowercase()
                .cmp(&b.customer.name.to_lowercase()),
            CustomerSortField::TotalSpent => cmp_f64(a.total_spent, b.total_spent),
            CustomerSortField::TotalOrders => a.total_orders.cmp(&b.total_orders),
            CustomerSortField::LastOrder => a.last_order_at.cmp(&b.last_order_at),
            CustomerSortField::CreatedAt => a.customer.created_at.cmp(&b.customer.created_at),
        };
        self.direction.apply(ordering)
    }

    pub fn apply(&self, customers: Vec<CustomerSummary>) -> Vec<CustomerSummary> {
        let mut filtered: Vec<_> = customers.into_iter().filter(|c| self.matches(c)).collect();
        filtered.sort_by(|a, b| self.compare(a, b));
        filtered
    }
}

// ===== Products =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductSortField {
    #[default]
    Name,
    Price,
    Category,
    CreatedAt,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductQuery {
    pub search: Option<String>,
    pub category_id: Option<i64>,
    pub available_only: bool,
    pub sort_by: ProductSortField,
    pub direction: SortDirection,
}

impl Default for ProductQuery {
    fn default() -> Self {
        ProductQuery {
            search: None,
            category_id: None,
            available_only: false,
            sort_by: ProductSortField::Name,
            direction: SortDirection::Asc,
        }
    }
}

impl ProductQuery {
    fn matches(&self, product: &Product) -> bool {
        if self.available_only && !product.is_available {
            return false;
        }
        if self.category_id.is_some() && self.category_id != product.category_id {
            return false;
        }
        match self.search.as_deref() {
            Some(needle) => matches_search(
                [
                    Some(product.name.as_str()),
                    product.description.as_deref(),
                    product.category_name.as_deref(),
                ],
                needle,
            ),
            None => true,
        }
    }

    fn compare(&self, a: &Product, b: &Product) -> Ordering {
        let ordering = match self.sort_by {
            ProductSortField::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            ProductSortField::Price => cmp_f64(a.price, b.price),
            ProductSortField::Category => a.category_name.cmp(&b.category_name),
            ProductSortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        self.direction.apply(ordering)
    }

    pub fn apply(&self, products: Vec<Product>) -> Vec<Product> {
        let mut filtered: Vec<_> = products.into_iter().filter(|p| self.matches(p)).collect();
        filtered.sort_by(|a, b| self.compare(a, b));
        filtered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Customer, Order};

    fn product(id: i64, name: &str, price: f64, category: Option<(i64, &str)>, available: bool) -> Product {
        Product {
            id,
            name: name.to_string(),
            description: None,
            price,
            category_id: category.map(|(id, _)| id),
            category_name: category.map(|(_, name)| name.to_string()),
            is_available: available,
            stock_quantity: None,
            low_stock_threshold: 5,
            image_url: None,
            created_at: format!("2026-01-0{} 10:00:00", id),
            updated_at: format!("2026-01-0{} 10:00:00", id),
        }
    }

    fn menu() -> Vec<Product> {
        vec![
            product(1, "Tiramisu", 6.0, Some((2, "Desserts")), true),
            product(2, "Margherita", 9.5, Some((1, "Pizza")), true),
            product(3, "Panna Cotta", 6.0, Some((2, "Desserts")), false),
            product(4, "Bread Basket", 3.0, None, true),
        ]
    }

    fn ids(products: Vec<Product>) -> Vec<i64> {
        products.iter().map(|p| p.id).collect()
    }

    fn order(id: i64, status: OrderStatus, total: f64, customer: Option<&str>, created_at: &str) -> OrderWithItems {
        OrderWithItems {
            order: Order {
                id,
                order_number: format!("ORD-20260101-{:04}", id),
                customer_id: customer.map(|_| id),
                customer_name: customer.map(str::to_string),
                staff_id: None,
                staff_name: None,
                order_type: OrderType::DineIn,
                status,
                payment_status: PaymentStatus::Unpaid,
                table_number: Some(1),
                delivery_address: None,
                notes: None,
                offer_id: None,
                subtotal: total,
                discount: 0.0,
                total,
                board_position: 0,
                created_at: created_at.to_string(),
                updated_at: created_at.to_string(),
            },
            items: Vec::new(),
        }
    }

    fn customer(id: i64, name: &str, spent: f64, segment: CustomerSegment) -> CustomerSummary {
        CustomerSummary {
            customer: Customer {
                id,
                name: name.to_string(),
                email: Some(format!("{}@example.com", name.to_lowercase())),
                phone: None,
                address: None,
                notes: None,
                loyalty_points: 0,
                created_at: "2026-01-01 10:00:00".to_string(),
                updated_at: "2026-01-01 10:00:00".to_string(),
            },
            total_orders: 1,
            total_spent: spent,
            last_order_at: None,
            segment,
        }
    }

    #[test]
    fn empty_search_matches_everything() {
        assert!(matches_search([Some("Margherita")], "  "));
        assert!(matches_search([None, Some("Margherita")], "GHER"));
        assert!(!matches_search([None], "pizza"));
    }

    #[test]
    fn order_query_filters_by_status_and_search() {
        let orders = vec![
            order(1, OrderStatus::Pending, 20.0, Some("Alice"), "2026-01-01 10:00:00"),
            order(2, OrderStatus::Ready, 35.0, Some("Bob"), "2026-01-02 10:00:00"),
            order(3, OrderStatus::Pending, 12.5, Some("alicia"), "2026-01-03 10:00:00"),
        ];

        let query = OrderQuery {
            search: Some("ali".to_string()),
            statuses: vec![OrderStatus::Pending],
            ..Default::default()
        };
        let ids: Vec<i64> = query.apply(orders).iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn order_query_date_range_is_inclusive() {
        let orders = vec![
            order(1, OrderStatus::Pending, 20.0, None, "2026-01-01 23:59:59"),
            order(2, OrderStatus::Pending, 20.0, None, "2026-01-02 00:00:00"),
            order(3, OrderStatus::Pending, 20.0, None, "2026-01-04 09:00:00"),
        ];
        let query = OrderQuery {
            date_from: NaiveDate::from_ymd_opt(2026, 1, 2),
            date_to: NaiveDate::from_ymd_opt(2026, 1, 3),
            ..Default::default()
        };
        let ids: Vec<i64> = query.apply(orders).iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![2]);
    }

    #[test]
    fn order_query_sorts_by_total_and_status() {
        let orders = vec![
            order(1, OrderStatus::Ready, 20.0, None, "2026-01-01 10:00:00"),
            order(2, OrderStatus::Pending, 35.0, None, "2026-01-02 10:00:00"),
            order(3, OrderStatus::Preparing, 12.5, None, "2026-01-03 10:00:00"),
        ];

        let by_total = OrderQuery {
            sort_by: OrderSortField::Total,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let ids: Vec<i64> = by_total.apply(orders.clone()).iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![3, 1, 2]);

        let by_status = OrderQuery {
            sort_by: OrderSortField::Status,
            direction: SortDirection::Asc,
            ..Default::default()
        };
        let ids: Vec<i64> = by_status.apply(orders).iter().map(|o| o.order.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn customer_query_segment_and_sort() {
        let customers = vec![
            customer(1, "Zoe", 900.0, CustomerSegment::Vip),
            customer(2, "adam", 20.0, CustomerSegment::New),
            customer(3, "Mia", 600.0, CustomerSegment::Vip),
        ];

        let names: Vec<String> = CustomerQuery::default()
            .apply(customers.clone())
            .into_iter()
            .map(|c| c.customer.name)
            .collect();
        assert_eq!(names, vec!["adam", "Mia", "Zoe"]);

        let vip_by_spend = CustomerQuery {
            segment: Some(CustomerSegment::Vip),
            sort_by: CustomerSortField::TotalSpent,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        let ids: Vec<i64> = vip_by_spend.apply(customers).iter().map(|c| c.customer.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn customer_search_covers_email() {
        let customers = vec![customer(1, "Zoe", 1.0, CustomerSegment::New)];
        let query = CustomerQuery {
            search: Some("ZOE@EXAMPLE".to_string()),
            ..Default::default()
        };
        assert_eq!(query.apply(customers).len(), 1);
    }

    #[test]
    fn product_query_defaults_to_name_order() {
        assert_eq!(ids(ProductQuery::default().apply(menu())), vec![4, 2, 3, 1]);
    }

    #[test]
    fn product_search_covers_category_name() {
        let query = ProductQuery {
            search: Some("dessert".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(query.apply(menu())), vec![3, 1]);

        let query = ProductQuery {
            search: Some("MARGH".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(query.apply(menu())), vec![2]);
    }

    #[test]
    fn product_query_filters_by_availability_and_category() {
        let available = ProductQuery {
            available_only: true,
            ..Default::default()
        };
        assert_eq!(ids(available.apply(menu())), vec![4, 2, 1]);

        let desserts = ProductQuery {
            category_id: Some(2),
            ..Default::default()
        };
        assert_eq!(ids(desserts.apply(menu())), vec![3, 1]);

        let both = ProductQuery {
            category_id: Some(2),
            available_only: true,
            ..Default::default()
        };
        assert_eq!(ids(both.apply(menu())), vec![1]);
    }

    #[test]
    fn product_price_ties_keep_input_order() {
        let cheapest_first = ProductQuery {
            sort_by: ProductSortField::Price,
            ..Default::default()
        };
        assert_eq!(ids(cheapest_first.apply(menu())), vec![4, 1, 3, 2]);

        let dearest_first = ProductQuery {
            sort_by: ProductSortField::Price,
            direction: SortDirection::Desc,
            ..Default::default()
        };
        assert_eq!(ids(dearest_first.apply(menu())), vec![2, 1, 3, 4]);
    }

    #[test]
    fn product_category_sort_puts_uncategorised_first() {
        let query = ProductQuery {
            sort_by: ProductSortField::Category,
            ..Default::default()
        };
        assert_eq!(ids(query.apply(menu())), vec![4, 1, 3, 2]);
    }
}
