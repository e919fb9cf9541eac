// noskem/src/web/routes.rs

use actix_web::web;

use crate::web::handlers::{
  account_handlers as account, agent_handlers as agent, catalog_handlers as catalog,
  engagement_handlers as engagement, listing_handlers as listing, offer_handlers as offer,
  order_handlers as order, provider_handlers as provider, webhook_handlers as webhook,
};

pub fn configure_app_routes(cfg: &mut web::ServiceConfig) {
  cfg.service(
    web::scope("/api/v1")
      .route("/health", web::get().to(catalog::health_check_handler))
      .route("/categories", web::get().to(catalog::list_categories_handler))
      // Catalog and listings
      .service(
        web::scope("/items")
          .route("", web::get().to(catalog::list_items_handler))
          .route("", web::post().to(listing::create_listing_handler))
          .route("/{item_id}", web::get().to(catalog::get_item_handler))
          .route("/{item_id}", web::put().to(listing::update_listing_handler))
          .route("/{item_id}", web::delete().to(listing::archive_listing_handler))
          .route("/{item_id}/like", web::post().to(engagement::like_item_handler))
          .route("/{item_id}/like", web::delete().to(engagement::unlike_item_handler))
          .route("/{item_id}/offers", web::post().to(offer::make_offer_handler)),
      )
      .route("/offers/{offer_id}/respond", web::post().to(offer::respond_offer_handler))
      .service(
        web::scope("/guest/likes")
          .route("", web::get().to(engagement::list_guest_likes_handler))
          .route("/{item_id}", web::post().to(engagement::add_guest_like_handler))
          .route("/{item_id}", web::delete().to(engagement::remove_guest_like_handler)),
      )
      // The signed-in user's own pages
      .service(
        web::scope("/me")
          .route("/items", web::get().to(account::my_items_handler))
          .route("/orders", web::get().to(account::my_orders_handler))
          .route("/offers", web::get().to(account::my_offers_handler))
          .route("/transactions", web::get().to(account::my_transactions_handler))
          .route("/profile", web::put().to(account::update_profile_handler))
          .route("/notifications", web::get().to(account::my_notifications_handler))
          .route(
            "/notifications/read-all",
            web::post().to(account::mark_all_notifications_read_handler),
          )
          .route(
            "/notifications/{notification_id}/read",
            web::post().to(account::mark_notification_read_handler),
          )
          .route("/saved-searches", web::get().to(account::list_saved_searches_handler))
          .route("/saved-searches", web::post().to(account::save_search_handler))
          .route(
            "/saved-searches/{search_id}",
            web::delete().to(account::delete_saved_search_handler),
          ),
      )
      // Orders
      .service(
        web::scope("/orders")
          .route("", web::post().to(order::checkout_handler))
          .route("/{order_id}", web::get().to(order::get_order_handler))
          .route(
            "/{order_id}/payment/callback",
            web::get().to(order::payment_callback_handler),
          )
          .route(
            "/{order_id}/confirm-delivery",
            web::post().to(order::confirm_delivery_handler),
          )
          .route("/{order_id}/review", web::post().to(order::leave_review_handler))
          .route("/{order_id}/disputes", web::get().to(order::dispute_thread_handler))
          .route("/{order_id}/disputes", web::post().to(order::open_dispute_handler))
          .route(
            "/{order_id}/disputes/messages",
            web::post().to(order::post_dispute_message_handler),
          )
          .route("/{order_id}/inspection", web::post().to(agent::submit_inspection_handler))
          .route("/{order_id}/status", web::post().to(agent::update_order_status_handler)),
      )
      .route("/agent/orders", web::get().to(agent::agent_orders_handler))
      .service(
        web::scope("/providers")
          .route("", web::get().to(provider::list_providers_handler))
          .route("", web::post().to(provider::register_provider_handler)),
      )
      .route("/webhooks/paystack", web::post().to(webhook::paystack_webhook_handler)),
  );
}
