//! System catalog: preset initial conditions (component 4.H)
//!
//! Preset systems are literal (m, x, v) constructors; everything is
//! barycenter-centered at t=0. Solar-system bodies use JPL DE440 GM
//! values and Horizons state vectors for 2024-01-01 00:00 TDB, scaled
//! to AU^3 * M_sun^-1 * day^-2.

use crate::body::State;
use crate::constants::G;
use crate::error::SimError;
use crate::vector::Vec3;

/// km^3 s^-2 -> AU^3 d^-2.
const CONVERSION_FACTOR: f64 = 86400.0 * 86400.0 / (149_597_870.7 * 149_597_870.7 * 149_597_870.7);

const GM_SUN_SI: f64 = 132_712_440_041.279419;
const GM_MERCURY_SI: f64 = 22_031.868551;
const GM_VENUS_SI: f64 = 324_858.592000;
const GM_EARTH_SI: f64 = 398_600.435507;
const GM_MARS_SI: f64 = 42_828.375816;
const GM_JUPITER_SI: f64 = 126_712_764.100000;
const GM_SATURN_SI: f64 = 37_940_584.841800;
const GM_URANUS_SI: f64 = 5_794_556.400000;
const GM_NEPTUNE_SI: f64 = 6_836_527.100580;
const GM_MOON_SI: f64 = 4_902.800118;
const GM_PLUTO_SI: f64 = 975.500000;
const GM_CERES_SI: f64 = 62.62890;
const GM_VESTA_SI: f64 = 17.288245;

fn mass_ratio(gm_si: f64) -> f64 {
    gm_si / GM_SUN_SI
}

/// Horizons state vector for one solar-system body, 2024-01-01 TDB.
struct Ephemeris {
    mass: f64,
    pos: Vec3,
    vel: Vec3,
}

fn sun() -> Ephemeris {
    Ephemeris {
        mass: 1.0,
        pos: [-7.967955691533730e-03, -2.906227441573178e-03, 2.103054301547123e-04],
        vel: [4.875094764261564e-06, -7.057133213976680e-06, -4.573453713094512e-08],
    }
}
fn mercury() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_MERCURY_SI),
        pos: [-2.825983269538632e-01, 1.974559795958082e-01, 4.177433558063677e-02],
        vel: [-2.232165900189702e-02, -2.157207103176252e-02, 2.855193410495743e-04],
    }
}
fn venus() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_VENUS_SI),
        pos: [-7.232103701666379e-01, -7.948302026312400e-02, 4.042871428174315e-02],
        vel: [2.034068201002341e-03, -2.020828626592994e-02, -3.945639843855159e-04],
    }
}
fn earth() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_EARTH_SI),
        pos: [-1.738192017257054e-01, 9.663245550235138e-01, 1.553901854897183e-04],
        vel: [-1.723001232538228e-02, -2.967721342618870e-03, 6.382125383116755e-07],
    }
}
fn mars() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_MARS_SI),
        pos: [-3.013262392582653e-01, -1.454029331393295, -2.300531433991428e-02],
        vel: [1.424832259345280e-02, -1.579236181580905e-03, -3.823722796161561e-04],
    }
}
fn jupiter() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_JUPITER_SI),
        pos: [3.485202469657674, 3.552136904413157, -9.271035442798399e-02],
        vel: [-5.470970658852281e-03, 5.642487338479145e-03, 9.896190602066252e-05],
    }
}
fn saturn() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_SATURN_SI),
        pos: [8.988104223143450, -3.719064854634689, -2.931937777323593e-01],
        vel: [1.822013845554067e-03, 5.143470425888054e-03, -1.617235904887937e-04],
    }
}
fn uranus() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_URANUS_SI),
        pos: [1.226302417897505e01, 1.529738792480545e01, -1.020549026883563e-01],
        vel: [-3.097615358317413e-03, 2.276781932345769e-03, 4.860433222241686e-05],
    }
}
fn neptune() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_NEPTUNE_SI),
        pos: [2.983501460984741e01, -1.793812957956852, -6.506401132254588e-01],
        vel: [1.676536611817232e-04, 3.152098732861913e-03, -6.877501095688201e-05],
    }
}
fn moon() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_MOON_SI),
        pos: [-1.762788124769829e-01, 9.674377513177153e-01, 3.236901585768862e-04],
        vel: [-1.746667306153906e-02, -3.473438277358121e-03, -3.359028758606074e-05],
    }
}
fn pluto() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_PLUTO_SI),
        pos: [1.720200478843485e01, -3.034155683573043e01, -1.729127607100611],
        vel: [2.802810313667557e-03, 8.492056438614633e-04, -9.060790113327894e-04],
    }
}
fn ceres() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_CERES_SI),
        pos: [-1.103880510367569, -2.533340440444230, 1.220283937721780e-01],
        vel: [8.978653480111301e-03, -4.873256528198994e-03, -1.807162046049230e-03],
    }
}
fn vesta() -> Ephemeris {
    Ephemeris {
        mass: mass_ratio(GM_VESTA_SI),
        pos: [-8.092549658731499e-02, 2.558381434460076, -6.695836142398572e-02],
        vel: [-1.017876585480054e-02, -5.452367109338154e-04, 1.255870551153315e-03],
    }
}

fn from_ephemeris(bodies: Vec<Ephemeris>, dt: f64) -> Result<State, SimError> {
    let m = bodies.iter().map(|b| b.mass).collect();
    let x = bodies.iter().map(|b| b.pos).collect();
    let v = bodies.iter().map(|b| b.vel).collect();
    let mut state = State::new(m, x, v, dt)?;
    state.recenter_barycenter();
    Ok(state)
}

/// All preset systems known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    CircularBinaryOrbit,
    EccentricBinaryOrbit,
    Helix3d,
    SunEarthMoon,
    SolarSystem,
    SolarSystemPlus,
    Figure8,
    Pyth3Body,
}

impl Preset {
    pub fn from_name(name: &str) -> Result<Self, SimError> {
        match name {
            "circular_binary_orbit" => Ok(Preset::CircularBinaryOrbit),
            "eccentric_binary_orbit" => Ok(Preset::EccentricBinaryOrbit),
            "3d_helix" => Ok(Preset::Helix3d),
            "sun_earth_moon" => Ok(Preset::SunEarthMoon),
            "solar_system" => Ok(Preset::SolarSystem),
            "solar_system_plus" => Ok(Preset::SolarSystemPlus),
            "figure-8" => Ok(Preset::Figure8),
            "pyth-3-body" => Ok(Preset::Pyth3Body),
            other => Err(SimError::InvalidInput(format!("unknown system '{other}'"))),
        }
    }

    pub fn build(self, dt: f64) -> Result<State, SimError> {
        match self {
            Preset::CircularBinaryOrbit => from_ephemeris(
                vec![
                    Ephemeris {
                        mass: 1.0 / G,
                        pos: [1.0, 0.0, 0.0],
                        vel: [0.0, 0.5, 0.0],
                    },
                    Ephemeris {
                        mass: 1.0 / G,
                        pos: [-1.0, 0.0, 0.0],
                        vel: [0.0, -0.5, 0.0],
                    },
                ],
                dt,
            ),
            Preset::EccentricBinaryOrbit => from_ephemeris(
                vec![
                    Ephemeris {
                        mass: 1.0 / G,
                        pos: [1.0, 0.0, 0.0],
                        vel: [0.0, 0.5, 0.0],
                    },
                    Ephemeris {
                        mass: 0.8 / G,
                        pos: [-1.25, 0.0, 0.0],
                        vel: [0.0, -0.625, 0.0],
                    },
                ],
                dt,
            ),
            Preset::Helix3d => {
                let v0 = (1.0 / 3.0_f64.sqrt()).sqrt();
                let sqrt3_2 = 3.0_f64.sqrt() / 2.0;
                from_ephemeris(
                    vec![
                        Ephemeris {
                            mass: 1.0 / G,
                            pos: [0.0, 0.0, -1.0],
                            vel: [-v0, 0.5, 0.0],
                        },
                        Ephemeris {
                            mass: 1.0 / G,
                            pos: [-sqrt3_2, 0.0, 0.5],
                            vel: [0.5 * v0, 0.5, sqrt3_2 * v0],
                        },
                        Ephemeris {
                            mass: 1.0 / G,
                            pos: [sqrt3_2, 0.0, 0.5],
                            vel: [0.5 * v0, 0.5, -sqrt3_2 * v0],
                        },
                    ],
                    dt,
                )
            }
            Preset::SunEarthMoon => from_ephemeris(vec![sun(), earth(), moon()], dt),
            Preset::SolarSystem => from_ephemeris(
                vec![
                    sun(),
                    mercury(),
                    venus(),
                    earth(),
                    mars(),
                    jupiter(),
                    saturn(),
                    uranus(),
                    neptune(),
                ],
                dt,
            ),
            Preset::SolarSystemPlus => from_ephemeris(
                vec![
                    sun(),
                    mercury(),
                    venus(),
                    earth(),
                    mars(),
                    jupiter(),
                    saturn(),
                    uranus(),
                    neptune(),
                    pluto(),
                    ceres(),
                    vesta(),
                ],
                dt,
            ),
            Preset::Figure8 => from_ephemeris(
                vec![
                    Ephemeris {
                        mass: 1.0 / G,
                        pos: [0.970043, -0.24308753, 0.0],
                        vel: [0.466203685, 0.43236573, 0.0],
                    },
                    Ephemeris {
                        mass: 1.0 / G,
                        pos: [-0.970043, 0.24308753, 0.0],
                        vel: [0.466203685, 0.43236573, 0.0],
                    },
                    Ephemeris {
                        mass: 1.0 / G,
                        pos: [0.0, 0.0, 0.0],
                        vel: [-0.93240737, -0.86473146, 0.0],
                    },
                ],
                dt,
            ),
            Preset::Pyth3Body => from_ephemeris(
                vec![
                    Ephemeris {
                        mass: 3.0 / G,
                        pos: [1.0, 3.0, 0.0],
                        vel: [0.0, 0.0, 0.0],
                    },
                    Ephemeris {
                        mass: 4.0 / G,
                        pos: [-2.0, -1.0, 0.0],
                        vel: [0.0, 0.0, 0.0],
                    },
                    Ephemeris {
                        mass: 5.0 / G,
                        pos: [1.0, -1.0, 0.0],
                        vel: [0.0, 0.0, 0.0],
                    },
                ],
                dt,
            ),
        }
    }
}

/// Build a `State` from a fully-specified custom system (component 4.I
/// feeds this after CSV validation).
pub fn custom(m: Vec<f64>, x: Vec<Vec3>, v: Vec<Vec3>, dt: f64) -> Result<State, SimError> {
    State::new(m, x, v, dt)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circular_binary_orbit_is_already_barycentered() {
        let state = Preset::CircularBinaryOrbit.build(0.01).unwrap();
        assert_eq!(state.n(), 2);
        assert!((state.x[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn solar_system_has_nine_bodies_and_zero_barycenter() {
        let state = Preset::SolarSystem.build(1.0).unwrap();
        assert_eq!(state.n(), 9);
        let mut r_cm = [0.0; 3];
        for i in 0..state.n() {
            for k in 0..3 {
                r_cm[k] += state.m[i] * state.x[i][k];
            }
        }
        for k in 0..3 {
            assert!(r_cm[k].abs() < 1e-10);
        }
    }

    #[test]
    fn unknown_system_name_is_rejected() {
        assert!(Preset::from_name("not-a-system").is_err());
    }

    #[test]
    fn pyth_3_body_masses_match_burraus_problem() {
        let state = Preset::Pyth3Body.build(0.001).unwrap();
        assert!((state.m[0] * G - 3.0).abs() < 1e-9);
        assert!((state.m[1] * G - 4.0).abs() < 1e-9);
        assert!((state.m[2] * G - 5.0).abs() < 1e-9);
    }
}
