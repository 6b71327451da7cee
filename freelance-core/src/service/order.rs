use super::{Actor, Market};
use crate::common::error::{MarketError, Result};
use crate::domain::{Audit, Offer, OfferPackage, Order, OrderStatus};
use tracing::info;

pub struct OrderService<'a> {
    market: &'a Market,
}

impl<'a> OrderService<'a> {
    pub fn new(market: &'a Market) -> Self {
        Self { market }
    }

    /// Places a PENDING order for the package, priced from the package.
    pub async fn create(&self, actor: &Actor, offer_package_id: i64) -> Result<Order> {
        let buyer = self.market.profiles().current(actor).await?;
        let package = self
            .market
            .db()
            .repo::<OfferPackage>()
            .find_by_id(offer_package_id)
            .await?
            .ok_or_else(|| {
                MarketError::not_found(
                    "order",
                    "offerPackageNotFound",
                    format!("Offer package {offer_package_id} not found"),
                )
            })?;
        let seller_id = match package.offer_id {
            Some(offer_id) => self
                .market
                .db()
                .repo::<Offer>()
                .find_by_id(offer_id)
                .await?
                .and_then(|offer| offer.owner_id),
            None => None,
        };

        let order = Order {
            id: None,
            status: OrderStatus::Pending,
            total_amount: package.price,
            currency: package.currency,
            buyer_id: buyer.id,
            seller_id,
            offer_package_id: package.id,
            audit: Audit::default(),
        };
        let saved = self.market.crud::<Order>().create(actor, order).await?;
        info!(id = ?saved.id, buyer = ?buyer.id, seller = ?seller_id, "order placed");
        Ok(saved)
    }

    /// Only the seller moves an order between states.
    pub async fn update_status(&self, actor: &Actor, order_id: i64, status: OrderStatus) -> Result<Order> {
        let seller = self.market.profiles().current(actor).await?;
        let mut order = self
            .market
            .db()
            .repo::<Order>()
            .find_by_id(order_id)
            .await?
            .ok_or_else(|| MarketError::not_found("order", "orderNotFound", format!("Order {order_id} not found")))?;
        if order.seller_id.is_none() || order.seller_id != seller.id {
            return Err(MarketError::forbidden(
                "order",
                "orderNotBelongingToProfile",
                "Order does not belong to the current profile",
            ));
        }

        let previous = order.status;
        order.status = status;
        info!(order_id, from = %previous, to = %status, "order status changed");
        self.market.crud::<Order>().update(actor, order_id, order).await
    }
}
