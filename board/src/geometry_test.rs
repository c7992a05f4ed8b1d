use super::*;

fn geometry() -> BoardGeometry {
    BoardGeometry::new(Point::new(100.0, 50.0), 10.0)
}

// =============================================================
// square_at
// =============================================================

#[test]
fn square_at_top_left_cell_is_zero() {
    assert_eq!(geometry().square_at(Point::new(100.0, 50.0), false), Some(0));
    assert_eq!(geometry().square_at(Point::new(109.9, 59.9), false), Some(0));
}

#[test]
fn square_at_maps_row_and_column() {
    // Column 4, row 6 → 52.
    assert_eq!(geometry().square_at(Point::new(145.0, 115.0), false), Some(52));
}

#[test]
fn square_at_flipped_mirrors_index() {
    assert_eq!(geometry().square_at(Point::new(100.0, 50.0), true), Some(63));
    assert_eq!(geometry().square_at(Point::new(145.0, 115.0), true), Some(11));
}

#[test]
fn square_at_off_board_is_none() {
    let g = geometry();
    assert_eq!(g.square_at(Point::new(99.0, 60.0), false), None);
    assert_eq!(g.square_at(Point::new(120.0, 49.0), false), None);
    assert_eq!(g.square_at(Point::new(180.0, 60.0), false), None);
    assert_eq!(g.square_at(Point::new(120.0, 130.0), false), None);
}

#[test]
fn square_at_zero_size_board_is_none() {
    let g = BoardGeometry::new(Point::new(0.0, 0.0), 0.0);
    assert_eq!(g.square_at(Point::new(0.0, 0.0), false), None);
}

#[test]
fn square_origin_inverts_square_at() {
    let g = geometry();
    for flipped in [false, true] {
        for square in [0_u8, 7, 12, 36, 63] {
            let corner = g.square_origin(square, flipped);
            let inside = Point::new(corner.x + 1.0, corner.y + 1.0);
            assert_eq!(g.square_at(inside, flipped), Some(square));
        }
    }
}

// =============================================================
// Indices and names
// =============================================================

#[test]
fn display_index_is_an_involution() {
    for square in 0..64_u8 {
        assert_eq!(display_index(display_index(square, true), true), square);
        assert_eq!(display_index(square, false), square);
    }
}

#[test]
fn square_name_uses_top_row_as_rank_eight() {
    assert_eq!(square_name(0).as_deref(), Some("a8"));
    assert_eq!(square_name(52).as_deref(), Some("e2"));
    assert_eq!(square_name(63).as_deref(), Some("h1"));
    assert_eq!(square_name(64), None);
}

#[test]
fn parse_square_inverts_square_name() {
    for square in 0..64_u8 {
        let name = square_name(square).unwrap();
        assert_eq!(parse_square(&name), Some(square));
    }
}

#[test]
fn parse_square_rejects_garbage() {
    assert_eq!(parse_square("i1"), None);
    assert_eq!(parse_square("a9"), None);
    assert_eq!(parse_square("a0"), None);
    assert_eq!(parse_square("e22"), None);
    assert_eq!(parse_square(""), None);
}

// =============================================================
// Promotion picker
// =============================================================

#[test]
fn promotion_offer_squares_extend_down_for_white() {
    assert_eq!(promotion_offer_squares(4, false), [4, 12, 20, 28]);
}

#[test]
fn promotion_offer_squares_extend_down_the_flipped_board_for_black() {
    // Black promotes on row 7; flipped, that row is drawn at the top.
    assert_eq!(promotion_offer_squares(60, true), [60, 52, 44, 36]);
}

#[test]
fn promotion_offer_near_the_bottom_edge_extends_upward() {
    // e3 (44) is drawn on row 5 for white; there is no room below it.
    let offer = promotion_offer_squares(44, false);
    assert_eq!(offer, [44, 36, 28, 20]);
    assert_eq!(promotion_choice(44, 20, false), Some(PromotionPiece::Bishop));

    // h1 (63) unflipped sits in the bottom-right corner.
    assert_eq!(promotion_offer_squares(63, false), [63, 55, 47, 39]);
}

#[test]
fn promotion_offer_squares_are_always_distinct() {
    for trigger in 0..64_u8 {
        for flipped in [false, true] {
            let offer = promotion_offer_squares(trigger, flipped);
            assert_eq!(offer[0], trigger);
            for (i, a) in offer.iter().enumerate() {
                assert!(*a < 64, "{trigger} {flipped}: {offer:?}");
                assert!(offer[i + 1..].iter().all(|b| b != a), "{trigger} {flipped}: {offer:?}");
            }
        }
    }
}

#[test]
fn promotion_choice_follows_offer_order() {
    assert_eq!(promotion_choice(4, 4, false), Some(PromotionPiece::Queen));
    assert_eq!(promotion_choice(4, 12, false), Some(PromotionPiece::Knight));
    assert_eq!(promotion_choice(4, 20, false), Some(PromotionPiece::Rook));
    assert_eq!(promotion_choice(4, 28, false), Some(PromotionPiece::Bishop));
    assert_eq!(promotion_choice(4, 36, false), None);
}
