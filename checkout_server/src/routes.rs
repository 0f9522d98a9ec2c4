//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
use actix_web::{get, web, HttpResponse, Responder};
use checkout_engine::{
    db_types::{NewOrder, PaymentProvider},
    traits::{PaymentGateway, PaymentQueryFilter, ShopDatabase},
    CartApi,
    OrderFlowApi,
};
use log::*;

use crate::{
    data_objects::{AddItemParams, CancelPaymentParams, NewOrderParams, QuantityParams, SelectedParams},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Carts  ------------------------------------------------------

route!(cart_view => Get "/cart/{customer_id}" impl ShopDatabase);
pub async fn cart_view<B: ShopDatabase>(
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ GET cart for customer {customer_id}");
    let view = api.view(customer_id).await?;
    Ok(HttpResponse::Ok().json(view))
}

route!(add_cart_item => Post "/cart/{customer_id}/items" impl ShopDatabase);
pub async fn add_cart_item<B: ShopDatabase>(
    path: web::Path<i64>,
    body: web::Json<AddItemParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let params = body.into_inner();
    debug!("💻️ POST add {} x product {} for customer {customer_id}", params.quantity, params.product_id);
    let item = api.add_item(customer_id, params.product_id, params.quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(update_cart_item => Put "/cart/{customer_id}/items/{product_id}" impl ShopDatabase);
pub async fn update_cart_item<B: ShopDatabase>(
    path: web::Path<(i64, i64)>,
    body: web::Json<QuantityParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (customer_id, product_id) = path.into_inner();
    let quantity = body.into_inner().quantity;
    debug!("💻️ PUT quantity {quantity} for product {product_id} in customer {customer_id}'s cart");
    match api.update_quantity(customer_id, product_id, quantity).await? {
        Some(item) => Ok(HttpResponse::Ok().json(item)),
        None => Ok(HttpResponse::NoContent().finish()),
    }
}

route!(remove_cart_item => Delete "/cart/{customer_id}/items/{product_id}" impl ShopDatabase);
pub async fn remove_cart_item<B: ShopDatabase>(
    path: web::Path<(i64, i64)>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (customer_id, product_id) = path.into_inner();
    debug!("💻️ DELETE product {product_id} from customer {customer_id}'s cart");
    api.remove_item(customer_id, product_id).await?;
    Ok(HttpResponse::NoContent().finish())
}

route!(select_cart_item => Put "/cart/{customer_id}/items/{product_id}/selected" impl ShopDatabase);
pub async fn select_cart_item<B: ShopDatabase>(
    path: web::Path<(i64, i64)>,
    body: web::Json<SelectedParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (customer_id, product_id) = path.into_inner();
    let selected = body.into_inner().selected;
    let item = api.set_selected(customer_id, product_id, selected).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(select_all_cart_items => Put "/cart/{customer_id}/selected" impl ShopDatabase);
pub async fn select_all_cart_items<B: ShopDatabase>(
    path: web::Path<i64>,
    body: web::Json<SelectedParams>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    let selected = body.into_inner().selected;
    let n = api.select_all(customer_id, selected).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "updated": n })))
}

route!(clear_cart => Delete "/cart/{customer_id}" impl ShopDatabase);
pub async fn clear_cart<B: ShopDatabase>(
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let customer_id = path.into_inner();
    debug!("💻️ DELETE all items from customer {customer_id}'s cart");
    let n = api.clear(customer_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "removed": n })))
}

//----------------------------------------------   Orders  -----------------------------------------------------

route!(create_order => Post "/orders" impl ShopDatabase, PaymentGateway);
pub async fn create_order<B: ShopDatabase, G: PaymentGateway>(
    body: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST create order for customer {}", params.customer_id);
    let new_order = NewOrder::new(params.ship_address, PaymentProvider::PayOs);
    let result = api.create_order_from_cart(params.customer_id, new_order).await?;
    Ok(HttpResponse::Ok().json(result))
}

/// The one-shot convenience: order creation and payment initiation in a single call. The order commits even when
/// link creation subsequently fails, so a 502 from this endpoint does not mean "nothing happened".
route!(checkout => Post "/checkout" impl ShopDatabase, PaymentGateway);
pub async fn checkout<B: ShopDatabase, G: PaymentGateway>(
    body: web::Json<NewOrderParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let params = body.into_inner();
    debug!("💻️ POST checkout for customer {}", params.customer_id);
    let new_order = NewOrder::new(params.ship_address, PaymentProvider::PayOs);
    let result = api.checkout_from_cart(params.customer_id, new_order).await?;
    Ok(HttpResponse::Ok().json(result))
}

route!(order_by_id => Get "/orders/{order_id}" impl ShopDatabase, PaymentGateway);
pub async fn order_by_id<B: ShopDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order {order_id}");
    let result = api.order_with_details(order_id).await?;
    Ok(HttpResponse::Ok().json(result))
}

//----------------------------------------------   Payments  ---------------------------------------------------

route!(create_payment => Post "/orders/{order_id}/payments" impl ShopDatabase, PaymentGateway);
pub async fn create_payment<B: ShopDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ POST create payment link for order {order_id}");
    let payment = api.create_payment_link(order_id).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(order_payments => Get "/orders/{order_id}/payments" impl ShopDatabase, PaymentGateway);
pub async fn order_payments<B: ShopDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    let payments = api.payments_for_order(order_id).await?;
    Ok(HttpResponse::Ok().json(payments))
}

route!(payment_local => Get "/payments/{payment_id}" impl ShopDatabase, PaymentGateway);
pub async fn payment_local<B: ShopDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let status = api.payment_status_local(payment_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "payment_id": payment_id, "status": status })))
}

/// The synced variant: a pending payment triggers an opportunistic poll against the gateway before answering.
route!(payment_status => Get "/payments/{payment_id}/status" impl ShopDatabase, PaymentGateway);
pub async fn payment_status<B: ShopDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    debug!("💻️ GET synced status for payment {payment_id}");
    let status = api.payment_status(payment_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "payment_id": payment_id, "status": status })))
}

route!(cancel_payment => Post "/payments/{payment_id}/cancel" impl ShopDatabase, PaymentGateway);
pub async fn cancel_payment<B: ShopDatabase, G: PaymentGateway>(
    path: web::Path<i64>,
    body: web::Json<CancelPaymentParams>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let payment_id = path.into_inner();
    let reason = body.into_inner().reason.unwrap_or_else(|| "Cancelled by customer".to_string());
    debug!("💻️ POST cancel payment {payment_id} ({reason})");
    let payment = api.cancel_payment(payment_id, &reason).await?;
    Ok(HttpResponse::Ok().json(payment))
}

route!(search_payments => Get "/payments" impl ShopDatabase, PaymentGateway);
pub async fn search_payments<B: ShopDatabase, G: PaymentGateway>(
    query: web::Query<PaymentQueryFilter>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError> {
    let filter = query.into_inner();
    debug!("💻️ GET payments with filter {filter:?}");
    let payments = api.search_payments(filter).await?;
    Ok(HttpResponse::Ok().json(payments))
}
