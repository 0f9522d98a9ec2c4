use std::fmt::Debug;

use log::*;

use crate::{
    api::{cart_objects::{CartLine, CartView}, errors::CheckoutError},
    db_types::{Cart, CartItem},
    traits::{ShopDatabase, ShopDatabaseError},
};

/// `CartApi` exposes all pre-checkout cart manipulation. Every operation takes the acting customer id explicitly;
/// resolving the caller's identity is the server's job, not the engine's.
pub struct CartApi<B> {
    db: B,
}

impl<B> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi")
    }
}

impl<B> CartApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }
}

impl<B> CartApi<B>
where B: ShopDatabase
{
    /// Add `quantity` of the product to the customer's cart, creating the cart lazily and incrementing the line if
    /// the product is already present. Stock is checked against the live ledger but not reserved.
    pub async fn add_item(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartItem, CheckoutError> {
        let item = self.db.add_cart_item(customer_id, product_id, quantity).await?;
        Ok(item)
    }

    /// Set the quantity of a cart line. A quantity of zero or less removes the line and returns `None`.
    pub async fn update_quantity(
        &self,
        customer_id: i64,
        product_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CheckoutError> {
        let cart = self.cart_for(customer_id).await?;
        let item = self.db.set_cart_item_quantity(cart.id, product_id, quantity).await?;
        Ok(item)
    }

    pub async fn remove_item(&self, customer_id: i64, product_id: i64) -> Result<(), CheckoutError> {
        let cart = self.cart_for(customer_id).await?;
        self.db.remove_cart_item(cart.id, product_id).await?;
        Ok(())
    }

    pub async fn set_selected(
        &self,
        customer_id: i64,
        product_id: i64,
        selected: bool,
    ) -> Result<CartItem, CheckoutError> {
        let cart = self.cart_for(customer_id).await?;
        let item = self.db.set_cart_item_selected(cart.id, product_id, selected).await?;
        Ok(item)
    }

    /// Select or deselect every line in the cart. Returns the number of lines touched.
    pub async fn select_all(&self, customer_id: i64, selected: bool) -> Result<u64, CheckoutError> {
        let cart = self.cart_for(customer_id).await?;
        let n = self.db.set_all_cart_items_selected(cart.id, selected).await?;
        Ok(n)
    }

    /// Remove every line from the cart. Returns the number of lines removed.
    pub async fn clear(&self, customer_id: i64) -> Result<u64, CheckoutError> {
        let cart = self.cart_for(customer_id).await?;
        let n = self.db.clear_cart(cart.id).await?;
        Ok(n)
    }

    /// Render the customer's cart with current product names and prices. The cart is created lazily, so a brand-new
    /// customer sees an empty view rather than an error.
    pub async fn view(&self, customer_id: i64) -> Result<CartView, CheckoutError> {
        let cart = self.db.fetch_or_create_cart(customer_id).await?;
        let items = self.db.fetch_cart_items(cart.id).await?;
        let mut lines = Vec::with_capacity(items.len());
        for item in &items {
            let product = self
                .db
                .fetch_product(item.product_id)
                .await?
                .ok_or(ShopDatabaseError::ProductNotFound(item.product_id))?;
            lines.push(CartLine::new(item, &product));
        }
        trace!("🛒️ Cart {} for customer {customer_id} rendered with {} lines", cart.id, lines.len());
        Ok(CartView::new(cart.id, customer_id, lines))
    }

    async fn cart_for(&self, customer_id: i64) -> Result<Cart, CheckoutError> {
        let cart = self
            .db
            .fetch_cart_for_customer(customer_id)
            .await?
            .ok_or(ShopDatabaseError::CartNotFound(customer_id))?;
        Ok(cart)
    }
}
