use cucumber::given;

use crate::cucumber::{market_world::MarketSystem, MarketWorld};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketWorld) {
    let system = MarketSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "user {int} is registered as {word}")]
async fn register_with_handle(world: &mut MarketWorld, user_id: i64, handle: String) {
    world.api().register_user(user_id, Some(&handle)).await.expect("Error registering user");
}

#[given(expr = "user {int} is registered without a handle")]
async fn register_without_handle(world: &mut MarketWorld, user_id: i64) {
    world.api().register_user(user_id, None).await.expect("Error registering user");
}

#[given("the payment backend refuses to issue invoices")]
async fn backend_refuses(world: &mut MarketWorld) {
    world.backend().set_issuance_failure(true);
}

#[given("the payment backend is offline")]
async fn backend_offline(world: &mut MarketWorld) {
    world.backend().set_offline(true);
}

#[given("the payment backend is back online")]
async fn backend_online(world: &mut MarketWorld) {
    world.backend().set_offline(false);
}
