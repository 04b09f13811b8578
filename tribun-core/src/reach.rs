//! Movement and attack reachability per height class
//!
//! Every function here reads board occupancy only to decide sliding,
//! blocking and jump legality. Results are sorted by cell id and contain
//! both empty and occupied cells; callers filter by occupancy and color.

use crate::board::{Board, Cid, CELLS, DIAGONALS, DIRECTIONS, KNIGHT_JUMPS};
use crate::unit::Color;

/// Forward step of a plain height-1 unit
fn pawn_move(color: Color) -> (i8, i8) {
    match color {
        Color::Black => (1, 1),
        Color::White => (-1, -1),
    }
}

/// The two capture steps of a plain height-1 unit
fn pawn_attacks(color: Color) -> [(i8, i8); 2] {
    match color {
        Color::Black => [(1, 0), (0, 1)],
        Color::White => [(-1, 0), (0, -1)],
    }
}

/// Cells a sub-unit of `height` can move to from `origin`
pub fn reachable_for_move(
    origin: Cid,
    height: u8,
    color: Color,
    tribun: bool,
    board: &Board,
) -> Vec<Cid> {
    let mut cells = match height {
        1 if tribun => offsets(origin, &DIRECTIONS),
        1 => offsets(origin, &[pawn_move(color)]),
        2 => offsets(origin, &DIAGONALS),
        3 => offsets(origin, &KNIGHT_JUMPS),
        4 | 6 => slide(origin, board),
        8 => adjacent_and_jumps(origin, color, board),
        _ => Vec::new(),
    };
    finish(&mut cells);
    cells
}

/// Cells a sub-unit of `height` can attack from `origin`
pub fn reachable_for_attack(
    origin: Cid,
    height: u8,
    color: Color,
    tribun: bool,
    board: &Board,
) -> Vec<Cid> {
    let mut cells = match height {
        1 if tribun => offsets(origin, &DIRECTIONS),
        1 => offsets(origin, &pawn_attacks(color)),
        2 => offsets(origin, &DIAGONALS),
        3 => offsets(origin, &KNIGHT_JUMPS),
        4 => first_hits(origin, board),
        6 => nearest_occupied(origin, board),
        8 => {
            let mut cells = adjacent_and_jumps(origin, color, board);
            cells.extend(offsets(origin, &DIAGONALS));
            cells
        }
        _ => Vec::new(),
    };
    finish(&mut cells);
    cells
}

fn finish(cells: &mut Vec<Cid>) {
    cells.sort_unstable();
    cells.dedup();
}

fn offsets(origin: Cid, vectors: &[(i8, i8)]) -> Vec<Cid> {
    vectors.iter().filter_map(|&v| origin.step(v)).collect()
}

/// Empty cells along each diagonal ray, stopping before the first unit
fn slide(origin: Cid, board: &Board) -> Vec<Cid> {
    let mut cells = Vec::new();
    for &dir in &DIAGONALS {
        let mut current = origin;
        while let Some(next) = current.step(dir) {
            if !board.is_empty(next) {
                break; // Blocked
            }
            cells.push(next);
            current = next;
        }
    }
    cells
}

/// First occupied cell along each diagonal ray
fn first_hits(origin: Cid, board: &Board) -> Vec<Cid> {
    let mut cells = Vec::new();
    for &dir in &DIAGONALS {
        let mut current = origin;
        while let Some(next) = current.step(dir) {
            if !board.is_empty(next) {
                cells.push(next);
                break;
            }
            current = next;
        }
    }
    cells
}

/// Breadth-first search over the neighbor graph; returns every occupied
/// cell at the smallest distance where any occupied cell appears.
fn nearest_occupied(origin: Cid, board: &Board) -> Vec<Cid> {
    let mut visited = [false; CELLS];
    visited[origin.index()] = true;

    let mut frontier: Vec<Cid> = Vec::new();
    for &dir in &DIRECTIONS {
        if let Some(cell) = origin.step(dir) {
            visited[cell.index()] = true;
            frontier.push(cell);
        }
    }

    while !frontier.is_empty() {
        let hits: Vec<Cid> = frontier
            .iter()
            .copied()
            .filter(|&cell| !board.is_empty(cell))
            .collect();
        if !hits.is_empty() {
            return hits;
        }

        let mut next = Vec::new();
        for &cell in &frontier {
            for &dir in &DIRECTIONS {
                if let Some(n) = cell.step(dir) {
                    if !visited[n.index()] {
                        visited[n.index()] = true;
                        next.push(n);
                    }
                }
            }
        }
        frontier = next;
    }

    Vec::new()
}

/// The six neighbors plus a two-step jump in each direction whose middle
/// cell is empty or holds a unit of `color`
fn adjacent_and_jumps(origin: Cid, color: Color, board: &Board) -> Vec<Cid> {
    let mut cells = Vec::new();
    for &(dx, dy) in &DIRECTIONS {
        let Some(middle) = origin.step((dx, dy)) else {
            continue;
        };
        cells.push(middle);

        let passable = board.get(middle).map_or(true, |unit| unit.color == color);
        if passable {
            if let Some(landing) = origin.step((2 * dx, 2 * dy)) {
                cells.push(landing);
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::Unit;

    fn cid(x: i8, y: i8) -> Cid {
        Cid::encode(x, y).unwrap()
    }

    fn cids(coords: &[(i8, i8)]) -> Vec<Cid> {
        let mut cells: Vec<Cid> = coords.iter().map(|&(x, y)| cid(x, y)).collect();
        cells.sort_unstable();
        cells
    }

    fn all_neighbors(x: i8, y: i8) -> Vec<Cid> {
        cids(&DIRECTIONS.map(|(dx, dy)| (x + dx, y + dy)))
    }

    #[test]
    fn test_pawn_asymmetry() {
        let board = Board::empty();
        let origin = cid(0, 0);
        assert_eq!(
            reachable_for_move(origin, 1, Color::Black, false, &board),
            cids(&[(1, 1)])
        );
        assert_eq!(
            reachable_for_attack(origin, 1, Color::Black, false, &board),
            cids(&[(1, 0), (0, 1)])
        );
        assert_eq!(
            reachable_for_move(origin, 1, Color::White, false, &board),
            cids(&[(-1, -1)])
        );
        assert_eq!(
            reachable_for_attack(origin, 1, Color::White, false, &board),
            cids(&[(-1, 0), (0, -1)])
        );
    }

    #[test]
    fn test_tribun_reaches_neighbors() {
        let board = Board::empty();
        let origin = cid(0, 0);
        assert_eq!(reachable_for_move(origin, 1, Color::Black, true, &board), all_neighbors(0, 0));
        assert_eq!(reachable_for_attack(origin, 1, Color::Black, true, &board), all_neighbors(0, 0));
    }

    #[test]
    fn test_fixed_offsets_clip_at_edge() {
        let board = Board::empty();
        assert_eq!(reachable_for_move(cid(0, 0), 2, Color::White, false, &board).len(), 6);
        assert_eq!(reachable_for_move(cid(0, 0), 3, Color::White, false, &board).len(), 12);
        // corner: only the inward diagonals stay on the board
        assert_eq!(
            reachable_for_move(cid(5, 5), 2, Color::White, false, &board),
            cids(&[(4, 3), (3, 4)])
        );
    }

    #[test]
    fn test_slide_stops_before_unit() {
        let mut board = Board::empty();
        board.set(cid(4, 2), Some(Unit::new(Color::Black, 1)));
        let moves = reachable_for_move(cid(0, 0), 4, Color::White, false, &board);
        assert!(moves.contains(&cid(2, 1)));
        assert!(!moves.contains(&cid(4, 2)));
        // ray (2,1) is blocked after one step; (1,2) runs to the edge
        assert!(moves.contains(&cid(2, 4)));
        assert_eq!(moves, reachable_for_move(cid(0, 0), 6, Color::White, false, &board));
    }

    #[test]
    fn test_height4_attack_first_hit_any_color() {
        let mut board = Board::empty();
        board.set(cid(2, 1), Some(Unit::new(Color::White, 1)));
        board.set(cid(4, 2), Some(Unit::new(Color::Black, 1)));
        board.set(cid(-2, -4), Some(Unit::new(Color::Black, 2)));
        let hits = reachable_for_attack(cid(0, 0), 4, Color::White, false, &board);
        assert_eq!(hits, cids(&[(2, 1), (-2, -4)]));
    }

    #[test]
    fn test_height6_attack_nearest_ring() {
        let mut board = Board::empty();
        board.set(cid(2, 0), Some(Unit::new(Color::Black, 1)));
        board.set(cid(0, -2), Some(Unit::new(Color::Black, 1)));
        board.set(cid(3, 0), Some(Unit::new(Color::Black, 1)));
        let hits = reachable_for_attack(cid(0, 0), 6, Color::White, false, &board);
        assert_eq!(hits, cids(&[(2, 0), (0, -2)]));

        assert!(reachable_for_attack(cid(0, 0), 6, Color::White, false, &Board::empty()).is_empty());
    }

    #[test]
    fn test_height8_jumps() {
        let mut board = Board::empty();
        board.set(cid(1, 0), Some(Unit::new(Color::White, 1)));
        board.set(cid(0, 1), Some(Unit::new(Color::Black, 1)));
        let moves = reachable_for_move(cid(0, 0), 8, Color::White, false, &board);
        // own unit may be jumped, enemy may not
        assert!(moves.contains(&cid(2, 0)));
        assert!(!moves.contains(&cid(0, 2)));
        assert_eq!(moves.len(), 11);

        let attacks = reachable_for_attack(cid(0, 0), 8, Color::White, false, &board);
        assert_eq!(attacks.len(), 17);
        assert!(attacks.contains(&cid(2, 1)));
    }

    #[test]
    fn test_illegal_height_reaches_nothing() {
        let board = Board::empty();
        for height in [0, 5, 7, 9] {
            assert!(reachable_for_move(cid(0, 0), height, Color::White, false, &board).is_empty());
            assert!(reachable_for_attack(cid(0, 0), height, Color::White, false, &board).is_empty());
        }
    }
}
