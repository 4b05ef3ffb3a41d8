//! Session, cart and order types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use storefront_util::{OrderId, ProductId, SessionToken};

/// Placeholder email recorded on orders placed without a session
pub const GUEST_EMAIL: &str = "guest";

/// A purchasable line: the four product fields captured at add-time.
///
/// `price` is a snapshot and is never re-fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub id: ProductId,
    pub title: String,
    pub price: f64,
    pub image: String,
}

/// Entry in the cart
pub type CartItem = LineItem;

/// Entry in a placed order
pub type OrderItem = LineItem;

impl LineItem {
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: f64,
        image: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            image: image.into(),
        }
    }
}

/// Sum of `price` over a slice of line items
pub fn total_price(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.price).sum()
}

/// The authenticated user record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSession {
    pub email: String,
    pub name: String,
    pub token: SessionToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl UserSession {
    /// Apply a partial profile update, returning the merged record.
    ///
    /// An omitted field keeps its value. An empty `name` is ignored, while
    /// an empty `address` is applied (clearing the address).
    pub fn merged(&self, update: &ProfileUpdate) -> Self {
        let mut next = self.clone();
        if let Some(name) = update.name.as_deref().filter(|n| !n.is_empty()) {
            next.name = name.to_string();
        }
        if let Some(address) = &update.address {
            next.address = Some(address.clone());
        }
        next
    }
}

/// Partial profile mutation; `None` means "field omitted"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.address.is_none()
    }
}

/// Session store lifecycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Store created, rehydration not started
    Uninitialized,
    /// Reading the durable record
    Loading,
    /// No user signed in
    Anonymous,
    /// A user is signed in
    Authenticated(UserSession),
}

impl SessionState {
    pub fn user(&self) -> Option<&UserSession> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Whether rehydration has finished
    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            SessionState::Anonymous | SessionState::Authenticated(_)
        )
    }
}

/// Order status. Orders are created `Pending`; nothing in the store moves
/// them along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Processing => "processing",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placed order: an immutable snapshot of the cart at placement time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub date: DateTime<Utc>,
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub status: OrderStatus,
    pub user_email: String,
}

impl Order {
    pub fn item_count(&self) -> usize {
        self.items.len()
    }
}

/// Caller-assembled input to order placement
#[derive(Debug, Clone, PartialEq)]
pub struct OrderDraft {
    pub items: Vec<OrderItem>,
    pub total_price: f64,
    pub user_email: String,
}

impl OrderDraft {
    /// Snapshot the given cart contents into a draft
    pub fn from_cart(items: &[CartItem], user_email: impl Into<String>) -> Self {
        Self {
            items: items.to_vec(),
            total_price: total_price(items),
            user_email: user_email.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> UserSession {
        UserSession {
            email: "test@zignuts.com".into(),
            name: "Test User".into(),
            token: SessionToken::generate(Utc::now()),
            profile_image: Some("https://i.pravatar.cc/150".into()),
            address: Some("1 Main St".into()),
        }
    }

    #[test]
    fn session_json_is_camel_case() {
        let json = serde_json::to_value(user()).unwrap();
        assert!(json.get("profileImage").is_some());
        assert!(json.get("profile_image").is_none());
    }

    #[test]
    fn session_parses_without_optional_fields() {
        let json = r#"{"email":"a@b.c","name":"A","token":"token-1"}"#;
        let parsed: UserSession = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.profile_image, None);
        assert_eq!(parsed.address, None);
    }

    #[test]
    fn merge_keeps_omitted_fields() {
        let original = user();
        let merged = original.merged(&ProfileUpdate::new().name("New Name"));
        assert_eq!(merged.name, "New Name");
        assert_eq!(merged.address, original.address);
        assert_eq!(merged.token, original.token);
    }

    #[test]
    fn merge_applies_empty_address() {
        let merged = user().merged(&ProfileUpdate::new().address(""));
        assert_eq!(merged.address.as_deref(), Some(""));
    }

    #[test]
    fn merge_ignores_empty_name() {
        let merged = user().merged(&ProfileUpdate::new().name(""));
        assert_eq!(merged.name, "Test User");
    }

    #[test]
    fn order_status_wire_format() {
        let json = serde_json::to_string(&OrderStatus::Pending).unwrap();
        assert_eq!(json, "\"pending\"");
        let parsed: OrderStatus = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(parsed, OrderStatus::Cancelled);
    }

    #[test]
    fn order_parses_legacy_record() {
        let json = r#"{
            "id": "ORD-1700000000000-k3j2h1g0f",
            "date": "2023-11-14T22:13:20.000Z",
            "items": [{"id": 1, "title": "A", "price": 10, "image": "i"}],
            "totalPrice": 10,
            "status": "pending",
            "userEmail": "test@zignuts.com"
        }"#;
        let order: Order = serde_json::from_str(json).unwrap();
        assert_eq!(order.items[0].id, ProductId::new(1));
        assert_eq!(order.total_price, 10.0);
        assert_eq!(order.date.timestamp(), 1_700_000_000);
    }

    #[test]
    fn draft_from_cart_computes_total() {
        let items = vec![
            LineItem::new(1u64, "A", 10.0, "i"),
            LineItem::new(2u64, "B", 20.0, "j"),
        ];
        let draft = OrderDraft::from_cart(&items, "t@x.com");
        assert_eq!(draft.total_price, 30.0);
        assert_eq!(draft.items, items);
    }
}
