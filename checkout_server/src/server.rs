use std::time::Duration;

use actix_web::{http::KeepAlive, middleware::Logger, web, App, HttpServer};
use checkout_engine::{traits::RedirectUrls, CartApi, OrderFlowApi, SqliteDatabase};
use log::*;

use crate::{
    config::ServerConfig,
    errors::ServerError,
    integrations::payos::PayOsGateway,
    payos_routes::{PayosCallbackRoute, PayosWebhookRoute},
    routes::{
        health,
        AddCartItemRoute,
        CancelPaymentRoute,
        CartViewRoute,
        CheckoutRoute,
        ClearCartRoute,
        CreateOrderRoute,
        CreatePaymentRoute,
        OrderByIdRoute,
        OrderPaymentsRoute,
        PaymentLocalRoute,
        PaymentStatusRoute,
        RemoveCartItemRoute,
        SearchPaymentsRoute,
        SelectAllCartItemsRoute,
        SelectCartItemRoute,
        UpdateCartItemRoute,
    },
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        PayOsGateway::new(config.payos.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    info!("💻️ Database connection established ({})", config.database_url);
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: PayOsGateway,
) -> Result<actix_web::dev::Server, ServerError> {
    let host = config.host.clone();
    let port = config.port;
    let srv = HttpServer::new(move || {
        let redirects = RedirectUrls::new(config.success_url.clone(), config.cancel_url.clone());
        let cart_api = CartApi::new(db.clone());
        let order_api = OrderFlowApi::new(db.clone(), gateway.clone(), redirects);
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mps::access_log"))
            .app_data(web::Data::new(cart_api))
            .app_data(web::Data::new(order_api))
            .service(health)
            .service(CartViewRoute::<SqliteDatabase>::new())
            .service(AddCartItemRoute::<SqliteDatabase>::new())
            .service(UpdateCartItemRoute::<SqliteDatabase>::new())
            .service(RemoveCartItemRoute::<SqliteDatabase>::new())
            .service(SelectCartItemRoute::<SqliteDatabase>::new())
            .service(SelectAllCartItemsRoute::<SqliteDatabase>::new())
            .service(ClearCartRoute::<SqliteDatabase>::new())
            .service(CreateOrderRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(CheckoutRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(OrderByIdRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(CreatePaymentRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(OrderPaymentsRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(PaymentLocalRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(PaymentStatusRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(CancelPaymentRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(SearchPaymentsRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(PayosWebhookRoute::<SqliteDatabase, PayOsGateway>::new())
            .service(PayosCallbackRoute::<SqliteDatabase, PayOsGateway>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((host.as_str(), port))?
    .run();
    Ok(srv)
}
