//! Segment direction classification.
//!
//! Every skeleton segment is classed by the signs of its displacement into
//! one of eight directions, written as numpad-style code characters
//! (`'2'` is straight down in screen coordinates, `'8'` straight up). A
//! zero displacement has no direction; the loader rejects it before any
//! downstream stage sees one. In direction strings, `'*'` marks the
//! positions before the first and after the last segment of a stroke.

use kaishu_graphics::{RelPath, Vec2};

/// The eight segment directions, y-down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dir {
    /// `dx < 0, dy > 0` (code `'1'`).
    DownLeft,
    /// `dx = 0, dy > 0` (code `'2'`).
    Down,
    /// `dx > 0, dy > 0` (code `'3'`).
    DownRight,
    /// `dx < 0, dy = 0` (code `'4'`).
    Left,
    /// `dx > 0, dy = 0` (code `'6'`).
    Right,
    /// `dx < 0, dy < 0` (code `'7'`).
    UpLeft,
    /// `dx = 0, dy < 0` (code `'8'`).
    Up,
    /// `dx > 0, dy < 0` (code `'9'`).
    UpRight,
}

impl Dir {
    /// Direction of a displacement; `None` for the zero vector.
    #[must_use]
    pub fn classify(v: Vec2) -> Option<Self> {
        if v.x < 0.0 {
            if v.y > 0.0 {
                Some(Self::DownLeft)
            } else if v.y == 0.0 {
                Some(Self::Left)
            } else {
                Some(Self::UpLeft)
            }
        } else if v.x == 0.0 {
            if v.y > 0.0 {
                Some(Self::Down)
            } else if v.y == 0.0 {
                None
            } else {
                Some(Self::Up)
            }
        } else if v.y > 0.0 {
            Some(Self::DownRight)
        } else if v.y == 0.0 {
            Some(Self::Right)
        } else {
            Some(Self::UpRight)
        }
    }

    /// Numpad-style code character.
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::DownLeft => '1',
            Self::Down => '2',
            Self::DownRight => '3',
            Self::Left => '4',
            Self::Right => '6',
            Self::UpLeft => '7',
            Self::Up => '8',
            Self::UpRight => '9',
        }
    }
}

/// Code character for a boundary-or-direction slot; `None` (the stroke
/// boundary) prints as `'*'`.
#[must_use]
pub const fn code_or_star(d: Option<Dir>) -> char {
    match d {
        Some(d) => d.code(),
        None => '*',
    }
}

/// Direction of every segment of a stroke, in order. `None` when some
/// segment has zero displacement.
#[must_use]
pub fn classify_path(path: &RelPath) -> Option<Vec<Dir>> {
    path.segments().iter().map(|s| Dir::classify(s.end)).collect()
}

/// Direction-code string of a stroke, used for compound-pattern matching.
#[must_use]
pub fn dir_string(dirs: &[Dir]) -> String {
    dirs.iter().map(|d| d.code()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_covers_all_sign_combinations() {
        let cases = [
            (-1.0, 1.0, Some(Dir::DownLeft)),
            (0.0, 1.0, Some(Dir::Down)),
            (1.0, 1.0, Some(Dir::DownRight)),
            (-1.0, 0.0, Some(Dir::Left)),
            (0.0, 0.0, None),
            (1.0, 0.0, Some(Dir::Right)),
            (-1.0, -1.0, Some(Dir::UpLeft)),
            (0.0, -1.0, Some(Dir::Up)),
            (1.0, -1.0, Some(Dir::UpRight)),
        ];
        for (x, y, expect) in cases {
            assert_eq!(Dir::classify(Vec2::new(x, y)), expect, "({x}, {y})");
        }
    }

    #[test]
    fn codes_match_numpad_layout() {
        let dirs = [
            Dir::DownLeft,
            Dir::Down,
            Dir::DownRight,
            Dir::Left,
            Dir::Right,
            Dir::UpLeft,
            Dir::Up,
            Dir::UpRight,
        ];
        let codes: String = dirs.iter().map(|d| d.code()).collect();
        assert_eq!(codes, "12346789");
        assert_eq!(code_or_star(None), '*');
    }

    #[test]
    fn dir_string_of_hook_path() {
        use kaishu_graphics::Point;
        let mut p = RelPath::new(Point::ZERO);
        p.line(Vec2::new(0.0, 100.0));
        p.line(Vec2::new(80.0, 0.0));
        p.line(Vec2::new(0.0, -40.0));
        let dirs = classify_path(&p).expect("no degenerate segments");
        assert_eq!(dir_string(&dirs), "268");
    }
}
