use super::OrderStatus;
use crate::storage::schema::FieldKind;
use chrono::{DateTime, Utc};
use validator::Validate;

entity! {
    /// A purchase of one offer package by a buyer profile.
    pub struct Order {
        table: "market_order",
        entity: "order",
        resource: "orders",
        fields: {
            status: OrderStatus => ("status", "status", FieldKind::Enum(OrderStatus::VALUES)),
            total_amount: f64 => ("totalAmount", "total_amount", FieldKind::Double),
            #[validate(length(max = 3))]
            currency: String => ("currency", "currency", FieldKind::Text),
            #[serde(default)]
            buyer_id: Option<i64> => ("buyerId", "buyer_id", FieldKind::Long),
            #[serde(default)]
            seller_id: Option<i64> => ("sellerId", "seller_id", FieldKind::Long),
            #[serde(default)]
            offer_package_id: Option<i64> => ("offerPackageId", "offer_package_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct Requirement {
        table: "requirement",
        entity: "requirement",
        resource: "requirements",
        fields: {
            #[validate(length(max = 512))]
            prompt: String => ("prompt", "prompt", FieldKind::Text),
            #[serde(default)]
            #[validate(length(max = 2048))]
            answer: Option<String> => ("answer", "answer", FieldKind::Text),
            #[serde(default)]
            order_id: Option<i64> => ("orderId", "order_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct Delivery {
        table: "delivery",
        entity: "delivery",
        resource: "deliveries",
        fields: {
            #[serde(default)]
            #[validate(length(max = 1024))]
            note: Option<String> => ("note", "note", FieldKind::Text),
            delivered_at: DateTime<Utc> => ("deliveredAt", "delivered_at", FieldKind::Instant),
            #[serde(default)]
            order_id: Option<i64> => ("orderId", "order_id", FieldKind::Long),
            #[serde(default)]
            file_id: Option<i64> => ("fileId", "file_id", FieldKind::Long),
        },
        links: {},
    }
}

entity! {
    pub struct Dispute {
        table: "dispute",
        entity: "dispute",
        resource: "disputes",
        fields: {
            #[validate(length(max = 512))]
            reason: String => ("reason", "reason", FieldKind::Text),
            opened_at: DateTime<Utc> => ("openedAt", "opened_at", FieldKind::Instant),
            #[serde(default)]
            closed_at: Option<DateTime<Utc>> => ("closedAt", "closed_at", FieldKind::Instant),
            #[serde(default)]
            order_id: Option<i64> => ("orderId", "order_id", FieldKind::Long),
        },
        links: {},
    }
}
