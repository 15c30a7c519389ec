//! End-to-end checkout: entry redirects, Buy Now, placement, the
//! cancellation window and order tracking.

use harbour::{addresses::AddressLabel, orders::TrackingStep, prelude::*};
use jiff::{SignedDuration, Timestamp};
use rusty_money::{Money, iso::INR};
use testresult::TestResult;

fn placed_at() -> TestResult<Timestamp> {
    Ok("2026-03-01T10:00:00Z".parse()?)
}

fn signed_in() -> TestResult<Store> {
    let mut store = Store::sample()?;
    store.set_user(Some(User::new("meena@example.com", "Meena")));

    Ok(store)
}

fn home() -> Address {
    Address {
        label: AddressLabel::Home,
        name: "Meena Iyer".to_string(),
        phone: "9123456780".to_string(),
        line1: "4 Harbour View".to_string(),
        line2: None,
        landmark: Some("Opposite the fish market".to_string()),
        city: "Kochi".to_string(),
        state: "Kerala".to_string(),
        postcode: "682001".to_string(),
    }
}

fn place(store: &mut Store, at: Timestamp) -> TestResult<PlacedOrder> {
    let mut checkout = Checkout::start(store, false)?;
    let pending = checkout.begin_placement(store)?;

    Ok(checkout.complete(pending, store, at)?)
}

#[test]
fn empty_cart_redirects_to_cart_without_an_order() -> TestResult {
    let mut store = signed_in()?;

    assert_eq!(
        Checkout::start(&store, false).err(),
        Some(CheckoutError::Redirect(Route::Cart))
    );

    store.add_to_cart("2", None)?;

    let mut checkout = Checkout::start(&store, false)?;
    let pending = checkout.begin_placement(&store)?;

    store.clear_cart();

    let result = checkout.complete(pending, &mut store, placed_at()?);

    assert_eq!(result, Err(CheckoutError::Redirect(Route::Cart)));
    assert_eq!(
        Route::parse("/cart")?,
        Route::Cart,
        "redirect target should be the cart page"
    );
    assert!(store.orders().is_empty());

    Ok(())
}

#[test]
fn signed_out_shopper_is_sent_to_login() -> TestResult {
    let mut store = Store::sample()?;
    store.add_to_cart("2", None)?;

    assert_eq!(
        Checkout::start(&store, false).err(),
        Some(CheckoutError::Redirect(Route::Login))
    );

    Ok(())
}

#[test]
fn buy_now_checks_out_a_single_item() -> TestResult {
    let mut store = signed_in()?;

    store.add_to_cart("2", None)?;
    store.add_to_cart("6", None)?;
    store.buy_now("3", Some("Whole"))?;

    let mut checkout = Checkout::start(&store, true)?;

    assert!(checkout.is_direct());
    assert_eq!(checkout.route().to_string(), "/checkout?direct=true");

    let pending = checkout.begin_placement(&store)?;
    let placed = checkout.complete(pending, &mut store, placed_at()?)?;

    let order = store
        .order(placed.order_id.as_str())
        .ok_or("order should exist")?;

    assert_eq!(order.lines().len(), 1);
    assert_eq!(order.pricing().total(), Money::from_minor(54_900, INR));

    Ok(())
}

#[test]
fn full_checkout_records_every_choice() -> TestResult {
    let mut store = signed_in()?;
    let address = store.add_address(home(), true)?;
    let at = placed_at()?;

    store.add_to_cart("1", Some("Steaks"))?;
    store.add_to_cart("1", Some("Steaks"))?;
    store.add_to_cart("2", None)?;

    let mut checkout = Checkout::start(&store, false)?;

    checkout.set_delivery_mode(DeliveryMode::PerItem);
    checkout.set_item_slot(&store, &LineKey::new("1", Some("Steaks")), DeliverySlot::Morning)?;
    checkout.set_item_slot(&store, &LineKey::from("2"), DeliverySlot::Evening)?;
    checkout.advance();

    checkout.select_address(&store, address)?;
    checkout.advance();

    checkout.set_payment(PaymentMethod::Card);
    checkout.apply_coupon(&store, "fresh20")?;
    checkout.set_use_wallet(true);

    let preview = checkout.quote(&store)?;
    let pending = checkout.begin_placement(&store)?;
    let placed = checkout.complete(pending, &mut store, at)?;

    assert_eq!(checkout.stage(), CheckoutStage::OrderPlaced);
    assert_eq!(
        placed.redirect,
        Route::OrderSuccess {
            order_id: Some(placed.order_id.to_string())
        }
    );
    assert_eq!(placed.order_id, OrderId::from_timestamp(at));

    let order = store
        .order(placed.order_id.as_str())
        .ok_or("order should exist")?;

    assert_eq!(*order.pricing(), preview);
    assert_eq!(order.pricing().total(), Money::from_minor(149_840, INR));
    assert_eq!(order.coupon_code(), Some("FRESH20"));
    assert_eq!(order.payment(), PaymentMethod::Card);
    assert_eq!(order.address().map(|a| a.city.as_str()), Some("Kochi"));
    assert_eq!(order.delivery().shipment_count(), 2);
    assert_eq!(order.status(), OrderStatus::Processing);

    assert!(store.cart().is_empty());
    assert_eq!(
        store.session().wallet().balance(),
        Money::from_minor(15_000, INR)
    );

    Ok(())
}

#[test]
fn orders_placed_in_the_same_millisecond_get_distinct_ids() -> TestResult {
    let mut store = signed_in()?;
    let at = placed_at()?;

    store.add_to_cart("2", None)?;
    let first = place(&mut store, at)?;

    store.add_to_cart("6", None)?;
    let second = place(&mut store, at)?;

    assert_ne!(first.order_id, second.order_id);
    assert_eq!(store.orders().len(), 2);

    let newest: Vec<_> = store.orders().newest_first().map(Order::id).collect();

    assert_eq!(newest, vec![&second.order_id, &first.order_id]);

    Ok(())
}

#[test]
fn cancellation_window_counts_down_and_closes() -> TestResult {
    let mut store = signed_in()?;
    let at = placed_at()?;

    store.add_to_cart("2", None)?;
    let placed = place(&mut store, at)?;

    let window = store.config().cancellation_window;
    let order = store
        .order(placed.order_id.as_str())
        .ok_or("order should exist")?;
    let countdown = order.cancellation_window(window);

    assert_eq!(countdown.clock(at), "15:00");
    assert_eq!(countdown.clock(at + SignedDuration::from_secs(125)), "12:55");
    assert!(order.can_cancel(at + SignedDuration::from_mins(14), window));
    assert!(!order.can_cancel(at + SignedDuration::from_mins(15), window));

    let late = store.cancel_order(placed.order_id.as_str(), at + SignedDuration::from_mins(16));

    assert_eq!(
        late.err(),
        Some(OrderError::CancellationWindowClosed(placed.order_id.clone()))
    );

    Ok(())
}

#[test]
fn cancelling_marks_the_stored_order() -> TestResult {
    let mut store = signed_in()?;
    let at = placed_at()?;

    store.add_to_cart("2", None)?;
    let placed = place(&mut store, at)?;
    let id = placed.order_id.as_str();
    let when = at + SignedDuration::from_mins(5);

    let cancelled = store.cancel_order(id, when)?;

    assert_eq!(cancelled.status(), OrderStatus::Cancelled { at: when });
    assert_eq!(cancelled.pricing().total(), Money::from_minor(60_000, INR));

    assert_eq!(
        store.cancel_order(id, when).err(),
        Some(OrderError::AlreadyCancelled(placed.order_id.clone()))
    );

    let steps = store.order(id).map(|order| order.tracking(when + SignedDuration::from_hours(4)));

    assert_eq!(
        steps.as_deref().map(<[TrackingStep]>::len),
        Some(1),
        "cancelled orders show a single tracking stage"
    );

    Ok(())
}

#[test]
fn cancelling_refunds_the_wallet_deduction() -> TestResult {
    let mut store = signed_in()?;
    let at = placed_at()?;

    store.add_to_cart("2", None)?;

    let mut checkout = Checkout::start(&store, false)?;
    checkout.set_use_wallet(true);

    let pending = checkout.begin_placement(&store)?;
    let placed = checkout.complete(pending, &mut store, at)?;

    assert_eq!(
        store.session().wallet().balance(),
        Money::from_minor(19_000, INR)
    );

    store.cancel_order(placed.order_id.as_str(), at + SignedDuration::from_mins(1))?;

    assert_eq!(
        store.session().wallet().balance(),
        Money::from_minor(25_000, INR)
    );

    let again = store.cancel_order(placed.order_id.as_str(), at + SignedDuration::from_mins(2));

    assert!(matches!(again, Err(OrderError::AlreadyCancelled(_))));
    assert_eq!(
        store.session().wallet().balance(),
        Money::from_minor(25_000, INR),
        "a rejected cancel must not refund twice"
    );

    Ok(())
}

#[test]
fn tracking_timeline_advances_with_time() -> TestResult {
    let mut store = signed_in()?;
    let at = placed_at()?;

    store.add_to_cart("2", None)?;
    let placed = place(&mut store, at)?;

    let route = Route::parse(&format!("/track-order?id={}", placed.order_id))?;
    let Route::TrackOrder { id: Some(id) } = route else {
        return Err("expected a track-order route with an id".into());
    };

    let order = store.order(&id).ok_or("order should exist")?;

    let reached = |minutes: i64| -> Vec<TrackingStage> {
        order
            .tracking(at + SignedDuration::from_mins(minutes))
            .iter()
            .filter(|step| step.reached)
            .map(|step| step.stage)
            .collect()
    };

    assert_eq!(reached(0), vec![TrackingStage::Placed]);
    assert_eq!(
        reached(61),
        vec![
            TrackingStage::Placed,
            TrackingStage::Packed,
            TrackingStage::OutForDelivery
        ]
    );
    assert_eq!(reached(240).last(), Some(&TrackingStage::Delivered));

    Ok(())
}

#[test]
fn order_receipt_renders() -> TestResult {
    let mut store = signed_in()?;

    store.add_to_cart("8", None)?;
    let placed = place(&mut store, placed_at()?)?;

    let order = store
        .order(placed.order_id.as_str())
        .ok_or("order should exist")?;

    let mut out = Vec::new();
    Receipt::for_order(order).write_to(&mut out)?;

    let output = String::from_utf8(out)?;

    assert!(output.contains(placed.order_id.as_str()));
    assert!(output.contains("Anchovy"));
    assert!(output.contains("Delivery:"));

    Ok(())
}
