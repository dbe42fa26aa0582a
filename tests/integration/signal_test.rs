//! Split deployment over the file signal channel

use rust_decimal_macros::dec;
use std::sync::Arc;
use tickfit::config::Config;
use tickfit::engine::{SignalFollower, TickOutcome, Trader};
use tickfit::execution::{OrderRequest, OrderVenue, PaperVenue, SignalVenue};
use tickfit::feed::Tick;
use tickfit::position::{CloseReason, PositionBook};
use tickfit::risk::LotSizer;
use tickfit::signal::{ArtifactKind, FileChannel, Side, SignalArtifact, SignalChannel};
use tokio_test::assert_ok;

async fn channel(dir: &std::path::Path) -> Arc<FileChannel> {
    Arc::new(
        FileChannel::new(dir, chrono::Duration::seconds(10))
            .await
            .unwrap(),
    )
}

fn follower(channel: Arc<FileChannel>, venue: PaperVenue) -> SignalFollower {
    let config = Config::default();
    let trader = Trader::new(
        PositionBook::new(None),
        LotSizer::from_config(&config.sizing),
        Arc::new(venue),
        config.instrument.price_scale,
    );
    SignalFollower::new(channel, trader, config.signal.min_loss_cut)
}

fn request(side: Side) -> OrderRequest {
    OrderRequest {
        side,
        lots: dec!(1),
        price: 150_000,
        stop_loss: 149_950,
        loss_cut: 50,
        tick_time: 1000,
        provenance: "knn:60000:0.98:6:-2".into(),
    }
}

#[tokio::test]
async fn test_publisher_and_follower_share_directory() {
    let dir = tempfile::tempdir().unwrap();
    let publisher = SignalVenue::new(channel(dir.path()).await, dec!(1000000));
    let venue = PaperVenue::new(dec!(1000000), 1000, dec!(1000));
    let mut follower = follower(channel(dir.path()).await, venue.clone());

    // two legs publish a single open artifact
    let first = publisher.submit_order(request(Side::Buy)).await.unwrap();
    let second = publisher.submit_order(request(Side::Buy)).await.unwrap();

    let outcome = follower.on_tick(Tick::new(1000, 150_000, 149_995)).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Opened(_)));
    assert!(venue.open_legs().await > 0);

    // closing one leg is not enough
    assert_ok!(publisher.close_order(first, dec!(1), 150_020).await);
    let outcome = follower.on_tick(Tick::new(1100, 150_020, 150_015)).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Holding));

    assert_ok!(publisher.close_order(second, dec!(1), 150_020).await);
    let outcome = follower.on_tick(Tick::new(1200, 150_020, 150_015)).await.unwrap();
    let TickOutcome::Closed(closed) = outcome else {
        panic!("expected close, got {:?}", outcome);
    };
    assert_eq!(closed.reason, CloseReason::External);
    assert_eq!(venue.open_legs().await, 0);
    // bought at 150000, sold at bid 150015
    assert!(venue.account_balance().await.unwrap() > dec!(1000000));
}

#[tokio::test]
async fn test_new_open_clears_stale_close() {
    let dir = tempfile::tempdir().unwrap();
    let shared = channel(dir.path()).await;
    let publisher = SignalVenue::new(shared.clone(), dec!(1000000));

    let handle = publisher.submit_order(request(Side::Sell)).await.unwrap();
    assert_ok!(publisher.close_order(handle, dec!(1), 150_000).await);
    assert!(shared.path_for(ArtifactKind::Close).exists());

    // nobody consumed the close; the next open discards it
    publisher.submit_order(request(Side::Buy)).await.unwrap();
    assert!(!shared.path_for(ArtifactKind::Close).exists());
    let open = shared
        .take(ArtifactKind::Open, chrono::Utc::now())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(open.action.side(), Some(Side::Buy));
}

#[tokio::test]
async fn test_follower_ignores_close_while_idle() {
    let dir = tempfile::tempdir().unwrap();
    let shared = channel(dir.path()).await;
    let venue = PaperVenue::new(dec!(1000000), 1000, dec!(1000));
    let mut follower = follower(shared.clone(), venue);

    assert_ok!(shared.publish(SignalArtifact::close(0, "position closed")).await);
    let outcome = follower.on_tick(Tick::new(0, 150_000, 149_995)).await.unwrap();
    assert!(matches!(outcome, TickOutcome::Flat));
    // left for whoever opens next to clear
    assert!(shared.path_for(ArtifactKind::Close).exists());
}
