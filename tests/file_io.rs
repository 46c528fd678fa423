//! File-system-backed round trips for the custom-system catalog and
//! result file formats (component 4.I), using real temp files rather
//! than in-memory buffers to exercise the same `File::open`/`File::create`
//! path the CLI driver uses.

use std::fs::File;
use std::io::{Read, Write};

use nbody_sim::result_file::{self, CustomSystem, ResultData, ResultMetadata};

#[test]
fn custom_system_catalog_round_trips_through_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("systems.csv");

    let systems = vec![
        CustomSystem {
            name: "binary".into(),
            m: vec![1.0, 1.0],
            x: vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]],
            v: vec![[0.0, 0.5, 0.0], [0.0, -0.5, 0.0]],
        },
        CustomSystem {
            name: "triple".into(),
            m: vec![1.0, 2.0, 3.0],
            x: vec![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
            v: vec![[0.0, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
        },
    ];

    let file = File::create(&path).unwrap();
    result_file::write_custom_catalog(file, &systems).unwrap();

    let mut contents = String::new();
    File::open(&path).unwrap().read_to_string(&mut contents).unwrap();
    assert!(contents.contains("binary"));
    assert!(contents.contains("triple"));

    let read_back = result_file::read_custom_catalog(File::open(&path).unwrap()).unwrap();
    assert_eq!(read_back, systems);
}

#[test]
fn result_file_round_trips_through_a_real_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("result.txt");

    let meta = ResultMetadata {
        save_date: "2026-07-30".into(),
        system_name: "circular_binary_orbit".into(),
        integrator: "Ias15".into(),
        n: 2,
        tf_days: 50.0,
        dt: 0.01,
        tolerance: 1e-9,
        data_size: 2,
        store_every_n: 1,
        run_time_seconds: 0.02,
        masses: vec![1.0, 1.0],
    };
    let data = ResultData {
        t: vec![0.0, 1.0],
        dt: vec![0.01, 0.01],
        energy: vec![-0.5, -0.5],
        state: vec![
            vec![1.0, 0.0, 0.0, -1.0, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, -0.5, 0.0],
            vec![0.9, 0.1, 0.0, -0.9, -0.1, 0.0, -0.1, 0.4, 0.0, 0.1, -0.4, 0.0],
        ],
    };

    {
        let mut file = File::create(&path).unwrap();
        result_file::write_result_file(&mut file, &meta, &data).unwrap();
        file.flush().unwrap();
    }

    let (meta2, data2) = result_file::read_result_file(File::open(&path).unwrap()).unwrap();
    assert_eq!(meta2, meta);
    assert_eq!(data2.t, data.t);
    assert_eq!(data2.dt, data.dt);
    assert_eq!(data2.energy, data.energy);
    assert_eq!(data2.state, data.state);
}
