//! Ticket lifecycle scenarios against the in-memory stores.

#![allow(clippy::unwrap_used)] // Tests can unwrap
#![allow(clippy::expect_used)] // Tests can expect
#![allow(clippy::panic)] // Tests can panic on unexpected variants

use rifa_core::content::ContentKey;
use rifa_core::environment::Clock;
use rifa_core::{BuyerInfo, ServiceError, StatusSummary, TicketNumber, TicketQuery, TicketStatus};
use rifa_testing::{Harness, fixtures};
use serde_json::json;

fn numbers(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

fn ana() -> BuyerInfo {
    BuyerInfo {
        name: "Ana".to_string(),
        email: Some("ana@example.com".to_string()),
        phone: Some("5512345678".to_string()),
        transaction_id: Some("TX-1".to_string()),
    }
}

#[tokio::test]
async fn test_initialized_pool_of_three_is_all_available() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;

    let available = harness.tickets().available_numbers(raffle.id).await.unwrap();
    assert_eq!(available, vec![TicketNumber::from("000"), "001".into(), "002".into()]);

    let summary = harness.tickets().summary(raffle.id).await.unwrap();
    assert_eq!(summary, StatusSummary { available: 3, reserved: 0, sold: 0, total: 3 });
}

#[tokio::test]
async fn test_reinitialization_replaces_only_that_raffle() {
    let harness = Harness::new();
    let moto = harness.initialized_raffle("Moto", 3).await;
    let car = harness.initialized_raffle("Car", 5).await;

    harness.tickets().sell(moto.id, &numbers(&["000"]), ana()).await.unwrap();
    let result = harness.tickets().initialize_pool(moto.id).await.unwrap();
    assert_eq!(result.deleted, 3);
    assert_eq!(result.created, 3);

    let summary = harness.tickets().summary(moto.id).await.unwrap();
    assert_eq!(summary.available, 3);
    assert_eq!(harness.db.ticket_count(car.id), 5);
}

#[tokio::test]
async fn test_initialize_unknown_raffle_is_not_found() {
    let harness = Harness::new();
    let err = harness
        .tickets()
        .initialize_pool(rifa_core::RaffleId::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { resource: "raffle", .. }));
}

#[tokio::test]
async fn test_initialize_retries_transient_duplicates() {
    let harness = Harness::new();
    let raffle = harness.raffles().create(fixtures::new_raffle("Moto", 4)).await.unwrap();

    harness.db.fail_pool_replacements(2);
    let result = harness.tickets().initialize_pool(raffle.id).await.unwrap();
    assert_eq!(result.created, 4);
}

#[tokio::test]
async fn test_initialize_reports_persistent_duplicates_as_integrity_error() {
    let harness = Harness::new();
    let raffle = harness.raffles().create(fixtures::new_raffle("Moto", 4)).await.unwrap();

    harness.db.fail_pool_replacements(3);
    let err = harness.tickets().initialize_pool(raffle.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::DataIntegrity(_)));
    assert_eq!(harness.db.ticket_count(raffle.id), 0);
}

#[tokio::test]
async fn test_reserve_two_on_fresh_pool() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;

    let reservation = harness
        .tickets()
        .reserve(raffle.id, &numbers(&["000", "001"]))
        .await
        .unwrap();
    assert_eq!(reservation.numbers, vec![TicketNumber::from("000"), "001".into()]);
    assert_eq!(reservation.quote.total, fixtures::TICKET_PRICE.saturating_multiply(2));
    assert_eq!(reservation.whatsapp_link, None);

    let summary = harness.tickets().summary(raffle.id).await.unwrap();
    assert_eq!(summary, StatusSummary { available: 1, reserved: 2, sold: 0, total: 3 });

    let ticket = harness.tickets().get(raffle.id, "0").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Reserved);
    assert_eq!(ticket.reserved_at, Some(rifa_testing::test_clock().now()));
}

#[tokio::test]
async fn test_reserve_with_sold_ticket_reserves_nothing() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;
    harness.tickets().sell(raffle.id, &numbers(&["002"]), ana()).await.unwrap();

    let err = harness
        .tickets()
        .reserve(raffle.id, &numbers(&["001", "002"]))
        .await
        .unwrap_err();
    match err {
        ServiceError::TicketsUnavailable { tickets } => {
            assert_eq!(tickets.len(), 1);
            assert_eq!(tickets[0].number.as_str(), "002");
            assert_eq!(tickets[0].status, TicketStatus::Sold);
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let ticket = harness.tickets().get(raffle.id, "001").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Available);
}

#[tokio::test]
async fn test_reserve_reports_race_lost_after_precheck() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;

    harness
        .db
        .interfere_before_next_update(raffle.id, "001".into(), TicketStatus::Reserved);
    let err = harness
        .tickets()
        .reserve(raffle.id, &numbers(&["000", "001"]))
        .await
        .unwrap_err();

    match err {
        ServiceError::TicketsUnavailable { tickets } => {
            assert_eq!(tickets.len(), 1);
            assert_eq!(tickets[0].number.as_str(), "001");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    let ticket = harness.tickets().get(raffle.id, "000").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Available);
}

#[tokio::test]
async fn test_pricing_failure_leaves_tickets_untouched() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;
    harness.db.set_promotions_unavailable(true);

    let reserve = harness.tickets().reserve(raffle.id, &numbers(&["000"])).await;
    assert!(matches!(reserve, Err(ServiceError::Store(_))), "{reserve:?}");
    let sell = harness.tickets().sell(raffle.id, &numbers(&["001"]), ana()).await;
    assert!(matches!(sell, Err(ServiceError::Store(_))), "{sell:?}");

    let summary = harness.tickets().summary(raffle.id).await.unwrap();
    assert_eq!(summary, StatusSummary { available: 3, reserved: 0, sold: 0, total: 3 });
    let ticket = harness.tickets().get(raffle.id, "001").await.unwrap();
    assert!(!ticket.has_buyer());

    harness.db.set_promotions_unavailable(false);
    let reservation = harness.tickets().reserve(raffle.id, &numbers(&["000"])).await.unwrap();
    assert_eq!(reservation.quote.quantity, 1);
}

#[tokio::test]
async fn test_reserve_unknown_numbers_is_not_found() {
    let harness = Harness::new();
    let raffle = harness.raffles().create(fixtures::new_raffle("Moto", 3)).await.unwrap();

    let err = harness
        .tickets()
        .reserve(raffle.id, &numbers(&["000"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::UnknownTickets { .. }));
}

#[tokio::test]
async fn test_reserve_out_of_range_is_validation_error() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;

    let err = harness
        .tickets()
        .reserve(raffle.id, &numbers(&["003"]))
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_reservation_quote_uses_promotions_and_link_uses_settings() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 10).await;
    harness
        .promotions()
        .create(raffle.id, fixtures::new_promotion(3, 1200))
        .await
        .unwrap();
    harness
        .content()
        .put(ContentKey::Settings, json!({ "whatsapp_number": "+52 55 1234 5678" }))
        .await
        .unwrap();

    let reservation = harness
        .tickets()
        .reserve(raffle.id, &numbers(&["1", "2", "3", "4"]))
        .await
        .unwrap();
    assert_eq!(reservation.quote.total.cents(), 1200 + 500);

    let link = reservation.whatsapp_link.unwrap();
    assert!(link.starts_with("https://wa.me/525512345678?text="));
    assert!(link.contains("001%2C%20002%2C%20003%2C%20004"));
}

#[tokio::test]
async fn test_sell_attaches_buyer() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;

    let receipt = harness.tickets().sell(raffle.id, &numbers(&["000"]), ana()).await.unwrap();
    assert_eq!(receipt.numbers, vec![TicketNumber::from("000")]);

    let ticket = harness.tickets().get(raffle.id, "000").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Sold);
    assert_eq!(ticket.buyer_name.as_deref(), Some("Ana"));
    assert_eq!(ticket.transaction_id.as_deref(), Some("TX-1"));
}

#[tokio::test]
async fn test_sell_reserved_ticket_succeeds() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;
    harness.tickets().reserve(raffle.id, &numbers(&["001"])).await.unwrap();

    harness.tickets().sell(raffle.id, &numbers(&["001"]), ana()).await.unwrap();
    let summary = harness.tickets().summary(raffle.id).await.unwrap();
    assert_eq!(summary.sold, 1);
    assert_eq!(summary.reserved, 0);
}

#[tokio::test]
async fn test_sell_batch_with_sold_ticket_sells_nothing() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;
    harness.tickets().sell(raffle.id, &numbers(&["000"]), ana()).await.unwrap();

    let err = harness
        .tickets()
        .sell(raffle.id, &numbers(&["000", "001"]), ana())
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::TicketsUnavailable { .. }));

    let ticket = harness.tickets().get(raffle.id, "001").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Available);
}

#[tokio::test]
async fn test_sell_requires_buyer_name() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;

    let buyer = BuyerInfo { name: "  ".to_string(), ..ana() };
    let err = harness.tickets().sell(raffle.id, &numbers(&["000"]), buyer).await.unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn test_admin_reset_clears_buyer_fields() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;
    harness.tickets().sell(raffle.id, &numbers(&["000"]), ana()).await.unwrap();

    let update = harness
        .tickets()
        .set_status(raffle.id, &numbers(&["000"]), TicketStatus::Available, Some("refunded".to_string()))
        .await
        .unwrap();
    assert_eq!(update.updated, 1);

    let ticket = harness.tickets().get(raffle.id, "000").await.unwrap();
    assert_eq!(ticket.status, TicketStatus::Available);
    assert!(!ticket.has_buyer());
    assert_eq!(ticket.sold_at, None);
    assert_eq!(ticket.notes.as_deref(), Some("refunded"));
}

#[tokio::test]
async fn test_admin_override_ignores_current_status() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 3).await;
    harness.tickets().sell(raffle.id, &numbers(&["000"]), ana()).await.unwrap();

    let update = harness
        .tickets()
        .set_status(raffle.id, &numbers(&["000", "001"]), TicketStatus::Reserved, None)
        .await
        .unwrap();
    assert_eq!(update.updated, 2);
    let summary = harness.tickets().summary(raffle.id).await.unwrap();
    assert_eq!(summary.reserved, 2);
}

#[tokio::test]
async fn test_list_pages_and_filters() {
    let harness = Harness::new();
    let raffle = harness.initialized_raffle("Moto", 25).await;
    harness.tickets().reserve(raffle.id, &numbers(&["3", "4"])).await.unwrap();

    let page = harness
        .tickets()
        .list(raffle.id, TicketQuery { status: None, page: 2, page_size: 10 })
        .await
        .unwrap();
    assert_eq!(page.total, 25);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.items[0].number.as_str(), "020");

    let reserved = harness
        .tickets()
        .list(raffle.id, TicketQuery { status: Some(TicketStatus::Reserved), ..TicketQuery::default() })
        .await
        .unwrap();
    assert_eq!(reserved.total, 2);

    let err = harness
        .tickets()
        .list(raffle.id, TicketQuery { page_size: 1001, ..TicketQuery::default() })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));
}

mod properties {
    use super::*;
    use proptest::prelude::*;
    use rifa_testing::properties::ticket_inputs;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(48))]

        #[test]
        fn reservations_are_all_or_nothing(
            batches in prop::collection::vec(ticket_inputs(30, 6), 1..12)
        ) {
            let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
            runtime.block_on(async {
                let harness = Harness::new();
                let raffle = harness.initialized_raffle("Moto", 30).await;

                for batch in batches {
                    let before = harness.tickets().summary(raffle.id).await.unwrap();
                    let result = harness.tickets().reserve(raffle.id, &batch).await;
                    let after = harness.tickets().summary(raffle.id).await.unwrap();
                    match result {
                        Ok(reservation) => assert_eq!(
                            after.reserved,
                            before.reserved + reservation.numbers.len() as u64
                        ),
                        Err(_) => assert_eq!(after, before),
                    }
                    assert_eq!(after.total, 30);
                }
            });
        }
    }
}
