//! Embedded Runge-Kutta Butcher tableaus (component 4.D)
//!
//! Fixed, problem-independent coefficient tables for the four
//! supported embedded pairs. Reference: Tamayo, Rein & Shi, "Moving
//! Planets Around", Ch. 6, pp. 100-101.

/// Stage coefficients, advance weights, and companion weights for one
/// embedded Runge-Kutta pair. `STAGES` is the number of rows (`c`)
/// and the length of `b`/`b_hat`.
pub struct Tableau {
    pub power: u32,
    pub power_hat: u32,
    pub stages: usize,
    /// `c[m-1][j]` for stage `m = 1..stages`, row `m-1` has `m` entries
    /// (rows are ragged in the source; here they're stored padded with
    /// trailing zeros to `stages - 1` columns).
    pub c: &'static [&'static [f64]],
    pub b: &'static [f64],
    pub b_hat: &'static [f64],
    /// The classical RK nodes, i.e. the row sums of `c`; not used by
    /// the step loop (which never evaluates `f(t, ...)` explicitly
    /// since the system is autonomous) but retained for the tableau
    /// consistency check in `§8.6`.
    pub nodes: &'static [f64],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddedKind {
    Rkf45,
    Dopri54,
    Dverk65,
    Rkf78,
}

impl EmbeddedKind {
    pub fn tableau(self) -> &'static Tableau {
        match self {
            EmbeddedKind::Rkf45 => &RKF45,
            EmbeddedKind::Dopri54 => &DOPRI54,
            EmbeddedKind::Dverk65 => &DVERK65,
            EmbeddedKind::Rkf78 => &RKF78,
        }
    }
}

pub static RKF45: Tableau = Tableau {
    power: 4,
    power_hat: 5,
    stages: 6,
    c: &[
        &[1.0 / 4.0],
        &[3.0 / 32.0, 9.0 / 32.0],
        &[1932.0 / 2197.0, -7200.0 / 2197.0, 7296.0 / 2197.0],
        &[439.0 / 216.0, -8.0, 3680.0 / 513.0, -845.0 / 4104.0],
        &[
            -8.0 / 27.0,
            2.0,
            -3544.0 / 2565.0,
            1859.0 / 4104.0,
            -11.0 / 40.0,
        ],
    ],
    b: &[25.0 / 216.0, 0.0, 1408.0 / 2565.0, 2197.0 / 4104.0, -1.0 / 5.0, 0.0],
    b_hat: &[
        16.0 / 135.0,
        0.0,
        6656.0 / 12825.0,
        28561.0 / 56430.0,
        -9.0 / 50.0,
        2.0 / 55.0,
    ],
    nodes: &[1.0 / 4.0, 3.0 / 8.0, 12.0 / 13.0, 1.0, 0.5],
};

pub static DOPRI54: Tableau = Tableau {
    power: 5,
    power_hat: 4,
    stages: 7,
    c: &[
        &[1.0 / 5.0],
        &[3.0 / 40.0, 9.0 / 40.0],
        &[44.0 / 45.0, -56.0 / 15.0, 32.0 / 9.0],
        &[
            19372.0 / 6561.0,
            -25360.0 / 2187.0,
            64448.0 / 6561.0,
            -212.0 / 729.0,
        ],
        &[
            9017.0 / 3168.0,
            -355.0 / 33.0,
            46732.0 / 5247.0,
            49.0 / 176.0,
            -5103.0 / 18656.0,
        ],
        &[
            35.0 / 384.0,
            0.0,
            500.0 / 1113.0,
            125.0 / 192.0,
            -2187.0 / 6784.0,
            11.0 / 84.0,
        ],
    ],
    b: &[
        35.0 / 384.0,
        0.0,
        500.0 / 1113.0,
        125.0 / 192.0,
        -2187.0 / 6784.0,
        11.0 / 84.0,
        0.0,
    ],
    b_hat: &[
        5179.0 / 57600.0,
        0.0,
        7571.0 / 16695.0,
        393.0 / 640.0,
        -92097.0 / 339200.0,
        187.0 / 2100.0,
        1.0 / 40.0,
    ],
    nodes: &[1.0 / 5.0, 3.0 / 10.0, 4.0 / 5.0, 8.0 / 9.0, 1.0, 1.0],
};

pub static DVERK65: Tableau = Tableau {
    power: 6,
    power_hat: 7,
    stages: 8,
    c: &[
        &[1.0 / 6.0],
        &[4.0 / 75.0, 16.0 / 75.0],
        &[5.0 / 6.0, -8.0 / 3.0, 5.0 / 2.0],
        &[-165.0 / 64.0, 55.0 / 6.0, -425.0 / 64.0, 85.0 / 96.0],
        &[
            12.0 / 5.0,
            -8.0,
            4015.0 / 612.0,
            -11.0 / 36.0,
            88.0 / 255.0,
        ],
        &[
            -8263.0 / 15000.0,
            124.0 / 75.0,
            -643.0 / 680.0,
            -81.0 / 250.0,
            2484.0 / 10625.0,
        ],
        &[
            3501.0 / 1720.0,
            -300.0 / 43.0,
            297275.0 / 52632.0,
            -319.0 / 2322.0,
            24068.0 / 84065.0,
            0.0,
            3850.0 / 26703.0,
        ],
    ],
    b: &[
        3.0 / 40.0,
        0.0,
        875.0 / 2244.0,
        23.0 / 72.0,
        264.0 / 1955.0,
        0.0,
        125.0 / 11592.0,
        43.0 / 616.0,
    ],
    b_hat: &[
        13.0 / 160.0,
        0.0,
        2375.0 / 5984.0,
        5.0 / 16.0,
        12.0 / 85.0,
        3.0 / 44.0,
        0.0,
        0.0,
    ],
    nodes: &[
        1.0 / 6.0,
        4.0 / 15.0,
        2.0 / 3.0,
        5.0 / 6.0,
        1.0,
        1.0 / 15.0,
        1.0,
    ],
};

pub static RKF78: Tableau = Tableau {
    power: 7,
    power_hat: 8,
    stages: 13,
    c: &[
        &[2.0 / 27.0],
        &[1.0 / 36.0, 1.0 / 12.0],
        &[1.0 / 24.0, 0.0, 1.0 / 8.0],
        &[5.0 / 12.0, 0.0, -25.0 / 16.0, 25.0 / 16.0],
        &[1.0 / 20.0, 0.0, 0.0, 1.0 / 4.0, 1.0 / 5.0],
        &[
            -25.0 / 108.0,
            0.0,
            0.0,
            125.0 / 108.0,
            -65.0 / 27.0,
            125.0 / 54.0,
        ],
        &[
            31.0 / 300.0,
            0.0,
            0.0,
            0.0,
            61.0 / 225.0,
            -2.0 / 9.0,
            13.0 / 900.0,
        ],
        &[
            2.0,
            0.0,
            0.0,
            -53.0 / 6.0,
            704.0 / 45.0,
            -107.0 / 9.0,
            67.0 / 90.0,
            3.0,
        ],
        &[
            -91.0 / 108.0,
            0.0,
            0.0,
            23.0 / 108.0,
            -976.0 / 135.0,
            311.0 / 54.0,
            -19.0 / 60.0,
            17.0 / 6.0,
            -1.0 / 12.0,
        ],
        &[
            2383.0 / 4100.0,
            0.0,
            0.0,
            -341.0 / 164.0,
            4496.0 / 1025.0,
            -301.0 / 82.0,
            2133.0 / 4100.0,
            45.0 / 82.0,
            45.0 / 164.0,
            18.0 / 41.0,
        ],
        &[
            3.0 / 205.0,
            0.0,
            0.0,
            0.0,
            0.0,
            -6.0 / 41.0,
            -3.0 / 205.0,
            -3.0 / 41.0,
            3.0 / 41.0,
            6.0 / 41.0,
        ],
        &[
            -1777.0 / 4100.0,
            0.0,
            0.0,
            -341.0 / 164.0,
            4496.0 / 1025.0,
            -289.0 / 82.0,
            2193.0 / 4100.0,
            51.0 / 82.0,
            33.0 / 164.0,
            19.0 / 41.0,
            0.0,
            1.0,
        ],
    ],
    b: &[
        41.0 / 840.0,
        0.0,
        0.0,
        0.0,
        0.0,
        34.0 / 105.0,
        9.0 / 35.0,
        9.0 / 35.0,
        9.0 / 280.0,
        9.0 / 280.0,
        41.0 / 840.0,
        0.0,
        0.0,
    ],
    b_hat: &[
        0.0,
        0.0,
        0.0,
        0.0,
        0.0,
        34.0 / 105.0,
        9.0 / 35.0,
        9.0 / 35.0,
        9.0 / 280.0,
        9.0 / 280.0,
        0.0,
        41.0 / 840.0,
        41.0 / 840.0,
    ],
    nodes: &[
        2.0 / 27.0,
        1.0 / 9.0,
        1.0 / 6.0,
        5.0 / 12.0,
        1.0 / 2.0,
        5.0 / 6.0,
        1.0 / 6.0,
        2.0 / 3.0,
        1.0 / 3.0,
        1.0,
        0.0,
        1.0,
    ],
};
