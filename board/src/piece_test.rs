use super::*;

// =============================================================
// Color
// =============================================================

#[test]
fn color_default_is_white() {
    assert_eq!(Color::default(), Color::White);
}

#[test]
fn color_opposite_flips() {
    assert_eq!(Color::White.opposite(), Color::Black);
    assert_eq!(Color::Black.opposite(), Color::White);
}

#[test]
fn color_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&Color::Black).unwrap(), "\"black\"");
    let parsed: Color = serde_json::from_str("\"white\"").unwrap();
    assert_eq!(parsed, Color::White);
}

// =============================================================
// Piece letters
// =============================================================

#[test]
fn piece_from_char_accepts_all_twelve_letters() {
    for ch in "PNBRQKpnbrqk".chars() {
        let piece = Piece::from_char(ch).expect("known letter");
        assert_eq!(piece.to_char(), ch);
    }
}

#[test]
fn piece_from_char_uses_case_for_colour() {
    assert_eq!(Piece::from_char('Q'), Some(Piece::new(Color::White, PieceKind::Queen)));
    assert_eq!(Piece::from_char('q'), Some(Piece::new(Color::Black, PieceKind::Queen)));
}

#[test]
fn piece_from_char_rejects_unknown_letters() {
    assert_eq!(Piece::from_char('x'), None);
    assert_eq!(Piece::from_char('1'), None);
    assert_eq!(Piece::from_char('/'), None);
}

// =============================================================
// PromotionPiece
// =============================================================

#[test]
fn promotion_offer_order_is_queen_knight_rook_bishop() {
    let letters: String = PromotionPiece::OFFER_ORDER.iter().map(|p| p.letter()).collect();
    assert_eq!(letters, "qnrb");
}

#[test]
fn promotion_from_letter_is_case_insensitive() {
    assert_eq!(PromotionPiece::from_letter('N'), Some(PromotionPiece::Knight));
    assert_eq!(PromotionPiece::from_letter('k'), None);
}
