use super::*;
use std::sync::Arc;

use futures::StreamExt;
use serde_json::json;

use crate::interaction::test_helpers::{MockOracle, legal};
use crate::net::connection::test_helpers::{MockConnector, Peer, test_config};

type Session = MatchSession<Arc<MockOracle>>;

async fn mounted(oracle: MockOracle, player_code: Option<i64>) -> (Session, Peer, Arc<MockOracle>) {
    let oracle = Arc::new(oracle);
    let (connector, mut peers) = MockConnector::new(0);
    let session = MatchSession::open("m1", &test_config(), Arc::clone(&oracle), connector);
    let peer = peers.recv().await.expect("peer");

    if let Some(code) = player_code {
        let mut changes = session.subscribe();
        let frame = json!({ "messageType": "sendPlayerCode", "body": code }).to_string();
        peer.to_client.unbounded_send(Ok(frame)).expect("push");
        changes.changed().await.expect("change");
    }
    (session, peer, oracle)
}

async fn next_sent(peer: &mut Peer) -> serde_json::Value {
    let text = peer.from_client.next().await.expect("outbound frame");
    serde_json::from_str(&text).expect("json")
}

#[tokio::test]
async fn click_select_then_destination_sends_the_move() {
    let (session, mut peer, _) = mounted(MockOracle::with(52, legal(&[44, 36], &[], false)), Some(0)).await;

    let outcome = session.click(52).await.expect("click");
    assert!(matches!(outcome, InputOutcome::Selected { square: 52, .. }));

    let outcome = session.click(36).await.expect("click");
    assert!(matches!(outcome, InputOutcome::Submit(_)));
    assert_eq!(
        next_sent(&mut peer).await,
        json!({ "messageType": "postMove", "body": { "piece": 52, "move": 36, "promotionString": "" } })
    );
    session.leave().await;
}

#[tokio::test]
async fn click_point_uses_board_geometry() {
    let (session, _peer, oracle) = mounted(MockOracle::with(52, legal(&[44], &[], false)), Some(0)).await;
    let geometry = BoardGeometry::new(Point::new(100.0, 100.0), 50.0);

    // e2 for white: row 6, column 4.
    let outcome = session.click_point(Point::new(325.0, 410.0), &geometry).await.expect("click");
    assert!(matches!(outcome, InputOutcome::Selected { square: 52, .. }));
    assert_eq!(oracle.call_count(), 1);
    session.leave().await;
}

#[tokio::test]
async fn spectator_clicks_never_reach_the_oracle() {
    let (session, _peer, oracle) = mounted(MockOracle::with(52, legal(&[44], &[], false)), Some(2)).await;
    assert_eq!(session.click(52).await.expect("click"), InputOutcome::Cleared);
    assert_eq!(oracle.call_count(), 0);
    session.leave().await;
}

#[tokio::test]
async fn declining_a_proposal_sends_the_decline_and_clears_it() {
    let (session, mut peer, _) = mounted(MockOracle::default(), Some(1)).await;

    let mut changes = session.subscribe();
    let frame = json!({ "messageType": "opponentEvent", "body": { "eventType": "draw" } }).to_string();
    peer.to_client.unbounded_send(Ok(frame)).expect("push");
    changes.changed().await.expect("change");
    assert_eq!(session.store().lock().await.opponent_event(), Some(OpponentEventKind::Draw));

    let resolved = session.resolve_event(false).await.expect("resolve");
    assert_eq!(resolved, Some(OpponentEventKind::Draw));
    assert_eq!(next_sent(&mut peer).await, json!({ "messageType": "playerEvent", "body": { "eventType": "declineDraw" } }));
    assert_eq!(session.store().lock().await.opponent_event(), None);

    assert_eq!(session.resolve_event(true).await.expect("resolve"), None);
    session.leave().await;
}

#[tokio::test]
async fn accepting_a_takeback_echoes_the_event() {
    let (session, mut peer, _) = mounted(MockOracle::default(), Some(0)).await;

    let mut changes = session.subscribe();
    let frame = json!({ "messageType": "opponentEvent", "body": { "eventType": "takeback" } }).to_string();
    peer.to_client.unbounded_send(Ok(frame)).expect("push");
    changes.changed().await.expect("change");

    session.resolve_event(true).await.expect("resolve");
    assert_eq!(next_sent(&mut peer).await, json!({ "messageType": "playerEvent", "body": { "eventType": "takeback" } }));
    session.leave().await;
}

#[tokio::test]
async fn leave_closes_the_socket_for_good() {
    let oracle = Arc::new(MockOracle::default());
    let (connector, mut peers) = MockConnector::new(0);
    let session = MatchSession::open("m1", &test_config(), oracle, connector);
    let mut peer = peers.recv().await.expect("peer");

    session.send_event(PlayerEventKind::Resign).expect("send");
    assert_eq!(next_sent(&mut peer).await, json!({ "messageType": "playerEvent", "body": { "eventType": "resign" } }));

    session.leave().await;
    assert!(peers.recv().await.is_none());
}
