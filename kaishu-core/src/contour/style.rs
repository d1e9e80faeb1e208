//! Brush style tables.
//!
//! Each table holds the fixed offsets of one serif or terminal shape, in
//! font units, tuned for a 32-unit brush. `length` values are the span
//! the full-size shape needs along the stroke; shorter strokes scale the
//! shape down by the ratio of available to needed span. `h` and `v`
//! arrays are the horizontal and vertical offsets of the shape's corner
//! points, consumed in order by the outline handlers.

use kaishu_graphics::Scalar;

/// Rightward bar (horizontal stroke).
pub struct Horizontal {
    pub length: Scalar,
    pub v: [Scalar; 1],
    pub end: HorizontalEnd,
    pub end2: HorizontalEnd2,
}

/// Free tail of a horizontal bar.
pub struct HorizontalEnd {
    pub length: Scalar,
    pub h: [Scalar; 1],
    pub v: [Scalar; 2],
}

/// Tail of a horizontal bar flowing into a downward stroke.
pub struct HorizontalEnd2 {
    pub length: Scalar,
    pub h: [Scalar; 2],
    pub v: [Scalar; 3],
}

pub const HORIZONTAL: Horizontal = Horizontal {
    length: 32.0,
    v: [12.0],
    end: HorizontalEnd {
        length: 64.0,
        h: [24.0],
        v: [18.0, 12.0],
    },
    end2: HorizontalEnd2 {
        length: 64.0,
        h: [18.0, 14.0],
        v: [18.0, 34.0, 16.0],
    },
};

/// Downward bar (vertical stroke).
pub struct Vertical {
    pub length: Scalar,
    pub h: [Scalar; 3],
    pub v: [Scalar; 2],
    pub end: VerticalEnd,
}

/// Free tail of a vertical bar.
pub struct VerticalEnd {
    pub length: Scalar,
    pub h: [Scalar; 1],
    pub v: [Scalar; 1],
}

pub const VERTICAL: Vertical = Vertical {
    length: 64.0,
    h: [16.0, 8.0, 8.0],
    v: [12.0, 12.0],
    end: VerticalEnd {
        length: 48.0,
        h: [24.0],
        v: [12.0],
    },
};

/// Down-left sweep.
pub struct Sweep {
    pub length: Scalar,
    pub h: [Scalar; 1],
    pub v: [Scalar; 2],
    pub end: SweepEnd,
}

/// Tail shape where a sweep hands over to a horizontal run.
pub struct SweepEnd {
    pub h: [Scalar; 3],
    pub v: [Scalar; 2],
}

pub const SWEEP: Sweep = Sweep {
    length: 42.0,
    h: [18.0],
    v: [24.0, 32.0],
    end: SweepEnd {
        h: [20.0, 16.0, 8.0],
        v: [6.0, 28.0],
    },
};

/// Vertical-horizontal-up hook, in two parts: the rounded corner and the
/// upward barb.
pub struct HookCorner {
    pub h: [Scalar; 2],
    pub v: [Scalar; 3],
}

pub struct HookBarb {
    pub h: [Scalar; 3],
    pub v: [Scalar; 1],
}

pub const HOOK_CORNER: HookCorner = HookCorner {
    h: [28.0, 4.0],
    v: [30.0, 24.0, 10.0],
};

pub const HOOK_BARB: HookBarb = HookBarb {
    h: [6.0, 42.0, 12.0],
    v: [10.0],
};

/// Down-right press running out into a horizontal tail.
pub struct Press {
    pub length: Scalar,
}

pub const PRESS: Press = Press { length: 54.0 };

/// Plain down-right descent.
pub struct Falling {
    pub length: Scalar,
    pub v: [Scalar; 1],
    pub start1: FallingStart1,
}

/// Head shape where a descent takes over from a sweep.
pub struct FallingStart1 {
    pub h: [Scalar; 2],
    pub v: [Scalar; 3],
}

pub const FALLING: Falling = Falling {
    length: 48.0,
    v: [14.0],
    start1: FallingStart1 {
        h: [20.0, 8.0],
        v: [12.0, 16.0, 4.0],
    },
};

/// Leftward run closing a hooked vertical.
pub struct Leftward {
    pub length: Scalar,
    pub h: [Scalar; 1],
    pub v: [Scalar; 3],
}

pub const LEFTWARD: Leftward = Leftward {
    length: 120.0,
    h: [4.0],
    v: [18.0, 10.0, 10.0],
};

/// Up-right rising stroke.
pub struct Rising {
    pub start: RisingStart,
    pub end: RisingEnd,
}

pub struct RisingStart {
    pub length: Scalar,
    pub h: [Scalar; 1],
    pub v: [Scalar; 2],
}

pub struct RisingEnd {
    pub length: Scalar,
    pub h: [Scalar; 1],
    pub v: [Scalar; 2],
}

pub const RISING: Rising = Rising {
    start: RisingStart {
        length: 64.0,
        h: [36.0],
        v: [8.0, 40.0],
    },
    end: RisingEnd {
        length: 64.0,
        h: [18.0],
        v: [34.0, 18.0],
    },
};
