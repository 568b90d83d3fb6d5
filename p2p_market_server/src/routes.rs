//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Every call into the offer lifecycle controller is async (database
//! and BTCPay Server calls alike), so handlers must `.await` them and never block.
//!
//! Every marketplace route identifies the acting user with the `X-Requester-Id` header (see [`Requester`]).
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use p2p_market_engine::{MarketplaceDatabase, OfferFlowApi, PaymentBackend};

use crate::{
    commands::execute_command,
    config::MarketplaceLimit,
    data_objects::{ChatCommandRequest, MarketplaceParams, NewOfferRequest, OfferListResponse, RegisterRequest, Requester},
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

/// Registers every marketplace route for the given database and payment backend.
///
/// JSON bodies that fail to parse are rejected with [`ServerError::InvalidRequestBody`].
pub fn configure_routes<B, P>(cfg: &mut web::ServiceConfig)
where
    B: MarketplaceDatabase + 'static,
    P: PaymentBackend + 'static,
{
    let json_config = web::JsonConfig::default().error_handler(|err, _req| {
        debug!("💻️ Rejecting request body. {err}");
        ServerError::InvalidRequestBody(err.to_string()).into()
    });
    cfg.app_data(json_config)
        .service(health)
        .service(RegisterRoute::<B, P>::new())
        .service(CreateOfferRoute::<B, P>::new())
        .service(MyOffersRoute::<B, P>::new())
        .service(MarketplaceRoute::<B, P>::new())
        .service(OfferByIdRoute::<B, P>::new())
        .service(ConfirmPaymentRoute::<B, P>::new())
        .service(CancelOfferRoute::<B, P>::new())
        .service(CommandRoute::<B, P>::new());
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Users  ----------------------------------------------------
route!(register => Post "/register" impl MarketplaceDatabase, PaymentBackend);
/// Registers the requester, or updates their handle. Calling it again is harmless.
pub async fn register<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    body: Option<web::Json<RegisterRequest>>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let body = body.map(|b| b.into_inner()).unwrap_or_default();
    debug!("💻️ POST register for user #{}", requester.id());
    let user = api.register_user(requester.id(), body.handle.as_deref()).await?;
    Ok(HttpResponse::Ok().json(user))
}

//----------------------------------------------   Offers  ----------------------------------------------------
route!(create_offer => Post "/offers" impl MarketplaceDatabase, PaymentBackend);
/// Creates a sell offer for the requester and returns it, invoice link included.
pub async fn create_offer<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    body: web::Json<NewOfferRequest>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST create_offer for user #{}: {:?}", requester.id(), body);
    let (amount, price) = body.terms()?;
    let offer = api.create_offer(requester.id(), amount, price).await?;
    Ok(HttpResponse::Created().json(offer))
}

route!(my_offers => Get "/offers" impl MarketplaceDatabase, PaymentBackend);
/// All of the requester's offers, most recent first. Pending offers are checked for payment before they are returned.
pub async fn my_offers<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET my_offers for user #{}", requester.id());
    let offers = api.refresh_owner_offers(requester.id()).await?;
    Ok(HttpResponse::Ok().json(OfferListResponse { offers }))
}

route!(marketplace => Get "/marketplace" impl MarketplaceDatabase, PaymentBackend);
pub async fn marketplace<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    params: web::Query<MarketplaceParams>,
    default_limit: web::Data<MarketplaceLimit>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let limit = params.limit.filter(|l| *l > 0).unwrap_or(default_limit.0);
    debug!("💻️ GET marketplace for user #{} (limit {limit})", requester.id());
    let offers = api.list_marketplace(limit).await?;
    Ok(HttpResponse::Ok().json(OfferListResponse { offers }))
}

route!(offer_by_id => Get "/offers/{id}" impl MarketplaceDatabase, PaymentBackend);
/// A single offer, brought up to date with the payment backend. Any user may look at any offer.
pub async fn offer_by_id<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    path: web::Path<i64>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let offer_id = path.into_inner();
    debug!("💻️ GET offer #{offer_id} for user #{}", requester.id());
    let offer = api.refresh_status(offer_id).await?;
    Ok(HttpResponse::Ok().json(offer))
}

route!(confirm_payment => Post "/offers/{id}/confirm" impl MarketplaceDatabase, PaymentBackend);
pub async fn confirm_payment<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    path: web::Path<i64>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let offer_id = path.into_inner();
    debug!("💻️ POST confirm_payment on offer #{offer_id} for user #{}", requester.id());
    let offer = api.confirm_payment(offer_id, requester.id()).await?;
    Ok(HttpResponse::Ok().json(offer))
}

route!(cancel_offer => Post "/offers/{id}/cancel" impl MarketplaceDatabase, PaymentBackend);
pub async fn cancel_offer<B: MarketplaceDatabase, P: PaymentBackend>(
    requester: Requester,
    path: web::Path<i64>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    let offer_id = path.into_inner();
    debug!("💻️ POST cancel_offer on offer #{offer_id} for user #{}", requester.id());
    let offer = api.cancel_offer(offer_id, requester.id()).await?;
    Ok(HttpResponse::Ok().json(offer))
}

//----------------------------------------------   Chat  ----------------------------------------------------
route!(command => Post "/command" impl MarketplaceDatabase, PaymentBackend);
/// Runs a chat command and returns the rendered reply. Failed commands still get a 200, with the failure explained in
/// the reply text, since the reply is meant for the chat user.
pub async fn command<B: MarketplaceDatabase, P: PaymentBackend>(
    body: web::Json<ChatCommandRequest>,
    limit: web::Data<MarketplaceLimit>,
    api: web::Data<OfferFlowApi<B, P>>,
) -> Result<HttpResponse, ServerError> {
    trace!("💻️ POST command from user #{}: {}", body.user_id, body.text);
    let reply = execute_command(api.as_ref(), limit.0, &body).await;
    Ok(HttpResponse::Ok().json(reply))
}
