use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

/// Stores a strum-backed enum as its snake_case text form.
macro_rules! text_column {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                    Ok(ToSqlOutput::from(self.to_string()))
                }
            }

            impl FromSql for $ty {
                fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                    value
                        .as_str()?
                        .parse()
                        .map_err(|e: strum::ParseError| FromSqlError::Other(Box::new(e)))
                }
            }
        )+
    };
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderType {
    #[default]
    DineIn,
    Takeaway,
    Delivery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Unpaid,
    Paid,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DiscountType {
    Percentage,
    FixedAmount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BillingCycle {
    Weekly,
    #[default]
    Monthly,
    Yearly,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter, Default,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SubscriptionStatus {
    #[default]
    Active,
    Paused,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StaffRole {
    Owner,
    Manager,
    #[default]
    Server,
    Kitchen,
    Driver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CustomerSegment {
    New,
    Regular,
    Vip,
    AtRisk,
}

/// What the mock assistant decided a customer message was about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, EnumIter)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ChatIntent {
    Greeting,
    Menu,
    Hours,
    OrderStatus,
    Delivery,
    Pricing,
    Recommendation,
    Complaint,
    Fallback,
}

text_column!(
    OrderStatus,
    OrderType,
    PaymentStatus,
    DiscountType,
    BillingCycle,
    SubscriptionStatus,
    StaffRole,
    ChatIntent,
);

// ===== Company & people =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: String,
    pub timezone: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCompany {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub currency: Option<String>,
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UserProfile {
    pub id: i64,
    pub company_id: Option<i64>,
    pub full_name: String,
    pub email: String,
    pub role: StaffRole,
    pub avatar_url: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpsertUserProfile {
    pub full_name: String,
    pub email: String,
    pub role: Option<StaffRole>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Staff {
    pub id: i64,
    pub company_id: Option<i64>,
    pub name: String,
    pub email: Option<String>,
    pub role: StaffRole,
    #[serde(skip_serializing)]
    pub pin: Option<String>,
    pub has_pin: bool,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStaff {
    pub name: String,
    pub email: Option<String>,
    pub role: Option<StaffRole>,
    pub pin: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStaff {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub role: StaffRole,
    /// `None` keeps the current PIN, `Some("")` clears it.
    pub pin: Option<String>,
}

// ===== Customers =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub loyalty_points: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCustomer {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCustomer {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
}

/// A customer row enriched with order aggregates for the CRM table.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CustomerSummary {
    #[serde(flatten)]
    pub customer: Customer,
    pub total_orders: i64,
    pub total_spent: f64,
    pub last_order_at: Option<String>,
    pub segment: CustomerSegment,
}

// ===== Catalog =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub sort_order: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateCategory {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<i64>,
    pub category_name: Option<String>,
    pub is_available: bool,
    pub stock_quantity: Option<i64>,
    pub low_stock_threshold: i64,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<i64>,
    pub is_available: Option<bool>,
    pub stock_quantity: Option<i64>,
    pub low_stock_threshold: Option<i64>,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: f64,
    pub category_id: Option<i64>,
    pub is_available: bool,
    pub stock_quantity: Option<i64>,
    pub low_stock_threshold: i64,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Offer {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_order_amount: f64,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOffer {
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_order_amount: Option<f64>,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOffer {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub code: Option<String>,
    pub discount_type: DiscountType,
    pub discount_value: f64,
    pub min_order_amount: f64,
    pub starts_at: Option<String>,
    pub ends_at: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Subscription {
    pub id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub plan_name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub meals_per_cycle: i64,
    pub status: SubscriptionStatus,
    pub start_date: String,
    pub next_billing_date: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub customer_id: i64,
    pub plan_name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub meals_per_cycle: Option<i64>,
    pub start_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateSubscription {
    pub id: i64,
    pub plan_name: String,
    pub price: f64,
    pub billing_cycle: BillingCycle,
    pub meals_per_cycle: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SubscriptionStats {
    pub active: i64,
    pub paused: i64,
    pub cancelled: i64,
    pub monthly_recurring_revenue: f64,
    pub due_within_week: i64,
}

// ===== Orders =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Order {
    pub id: i64,
    pub order_number: String,
    pub customer_id: Option<i64>,
    pub customer_name: Option<String>,
    pub staff_id: Option<i64>,
    pub staff_name: Option<String>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub table_number: Option<i64>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub offer_id: Option<i64>,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub board_position: i64,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: f64,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrderItem {
    pub product_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateOrder {
    pub customer_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub order_type: OrderType,
    pub table_number: Option<i64>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
    pub offer_code: Option<String>,
    pub items: Vec<CreateOrderItem>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateOrderDetails {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub staff_id: Option<i64>,
    pub order_type: OrderType,
    pub table_number: Option<i64>,
    pub delivery_address: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BoardColumn {
    pub status: OrderStatus,
    pub allowed_targets: Vec<OrderStatus>,
    pub orders: Vec<OrderWithItems>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MoveOrderCard {
    pub order_id: i64,
    pub to_status: OrderStatus,
    pub to_index: usize,
}

// ===== Reports =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ProductDailyAnalysis {
    pub product_id: i64,
    pub product_name: Option<String>,
    pub date: String,
    pub units_sold: i64,
    pub revenue: f64,
    pub order_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct TopProduct {
    pub product_id: i64,
    pub name: String,
    pub units_sold: i64,
    pub revenue: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DaySummary {
    pub date: String,
    pub total_revenue: f64,
    pub total_orders: i64,
    pub orders: Vec<OrderWithItems>,
}

// ===== Dashboard =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DashboardPeriod {
    #[default]
    Today,
    Week,
    Month,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct StatCard {
    pub value: f64,
    pub previous: f64,
    pub change_percent: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardStats {
    pub period: DashboardPeriod,
    pub from: String,
    pub to: String,
    pub revenue: StatCard,
    pub orders: StatCard,
    pub average_order_value: StatCard,
    pub new_customers: StatCard,
    pub orders_by_status: Vec<StatusCount>,
    pub recent_orders: Vec<OrderWithItems>,
    pub top_products: Vec<TopProduct>,
}

// ===== Assistant conversations =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Conversation {
    pub id: i64,
    pub session_id: String,
    pub customer_message: String,
    pub assistant_reply: String,
    pub intent: ChatIntent,
    pub confidence: f64,
    pub latency_ms: i64,
    pub resolved: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct IntentCount {
    pub intent: ChatIntent,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyCount {
    pub date: String,
    pub count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ConversationAnalytics {
    pub total_conversations: i64,
    pub total_sessions: i64,
    pub average_confidence: f64,
    pub average_latency_ms: f64,
    pub resolution_rate: f64,
    pub intents: Vec<IntentCount>,
    pub per_day: Vec<DailyCount>,
}
