//! Result & custom-system I/O (component 4.I)
//!
//! Two line-oriented CSV formats, both built on the `csv` crate
//! already pulled in for trajectory data:
//!
//! - the custom-system catalog: `name,N,m1..mN,x1..zN,vx1..vzN`, one
//!   system per row, strictly validated against its declared N.
//! - the result file: `#`-prefixed metadata lines followed by CSV
//!   data rows `t,dt,E,x1..zN,vx1..vzN`.

use std::io::{BufRead, BufReader, Read, Write};

use crate::error::SimError;
use crate::vector::Vec3;

/// One row of the custom-system catalog after validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomSystem {
    pub name: String,
    pub m: Vec<f64>,
    pub x: Vec<Vec3>,
    pub v: Vec<Vec3>,
}

fn parse_f64(field: &str) -> Result<f64, SimError> {
    field
        .trim()
        .parse()
        .map_err(|_| SimError::InvalidInput(format!("not a number: '{field}'")))
}

/// Parse one custom-system catalog row, rejecting any row whose field
/// count disagrees with its declared N (§9: strict, not silently
/// tolerant).
fn parse_custom_row(record: &csv::StringRecord) -> Result<CustomSystem, SimError> {
    if record.len() < 2 {
        return Err(SimError::InvalidInput("custom-system row missing name/N".into()));
    }
    let name = record[0].to_string();
    if name.contains(',') {
        return Err(SimError::InvalidInput(format!("name '{name}' contains a comma")));
    }
    let n: usize = record[1]
        .trim()
        .parse()
        .map_err(|_| SimError::InvalidInput(format!("invalid N for system '{name}'")))?;
    if n == 0 {
        return Err(SimError::InvalidInput(format!("N must be >= 1 for system '{name}'")));
    }
    let expected_fields = 2 + n + 3 * n + 3 * n;
    if record.len() != expected_fields {
        return Err(SimError::InvalidInput(format!(
            "system '{name}' declares N={n} (expects {expected_fields} fields) but row has {} fields",
            record.len()
        )));
    }

    let mut m = Vec::with_capacity(n);
    for i in 0..n {
        m.push(parse_f64(&record[2 + i])?);
    }

    let pos_start = 2 + n;
    let mut x = Vec::with_capacity(n);
    for i in 0..n {
        let base = pos_start + 3 * i;
        x.push([
            parse_f64(&record[base])?,
            parse_f64(&record[base + 1])?,
            parse_f64(&record[base + 2])?,
        ]);
    }

    let vel_start = pos_start + 3 * n;
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let base = vel_start + 3 * i;
        v.push([
            parse_f64(&record[base])?,
            parse_f64(&record[base + 1])?,
            parse_f64(&record[base + 2])?,
        ]);
    }

    Ok(CustomSystem { name, m, x, v })
}

/// Read every row of a custom-system catalog CSV.
pub fn read_custom_catalog<R: Read>(reader: R) -> Result<Vec<CustomSystem>, SimError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);
    let mut systems = Vec::new();
    let mut seen_names = std::collections::HashSet::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| SimError::InvalidInput(e.to_string()))?;
        let system = parse_custom_row(&record)?;
        if !seen_names.insert(system.name.clone()) {
            return Err(SimError::InvalidInput(format!("duplicate system name '{}'", system.name)));
        }
        systems.push(system);
    }
    Ok(systems)
}

/// Write a custom-system catalog back out in the same format.
pub fn write_custom_catalog<W: Write>(writer: W, systems: &[CustomSystem]) -> Result<(), SimError> {
    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).flexible(true).from_writer(writer);
    for system in systems {
        let mut record = vec![system.name.clone(), system.m.len().to_string()];
        record.extend(system.m.iter().map(f64::to_string));
        for p in &system.x {
            record.extend(p.iter().map(f64::to_string));
        }
        for v in &system.v {
            record.extend(v.iter().map(f64::to_string));
        }
        csv_writer
            .write_record(&record)
            .map_err(|e| SimError::IoFailure(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    }
    csv_writer
        .flush()
        .map_err(SimError::IoFailure)
}

/// Metadata header of a result file.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMetadata {
    pub save_date: String,
    pub system_name: String,
    pub integrator: String,
    pub n: usize,
    pub tf_days: f64,
    pub dt: f64,
    pub tolerance: f64,
    pub data_size: usize,
    pub store_every_n: u64,
    pub run_time_seconds: f64,
    pub masses: Vec<f64>,
}

/// One recorded data row: (t, dt, E, flattened [x1..xn, v1..vn]).
pub struct ResultData {
    pub t: Vec<f64>,
    pub dt: Vec<f64>,
    pub energy: Vec<f64>,
    pub state: Vec<Vec<f64>>,
}

fn write_meta_line<W: Write>(w: &mut W, key: &str, value: &str) -> std::io::Result<()> {
    writeln!(w, "# {key}: {value}")
}

pub fn write_result_file<W: Write>(
    mut writer: W,
    meta: &ResultMetadata,
    data: &ResultData,
) -> Result<(), SimError> {
    write_meta_line(&mut writer, "save_date", &meta.save_date).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "system_name", &meta.system_name).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "integrator", &meta.integrator).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "n", &meta.n.to_string()).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "tf_days", &meta.tf_days.to_string()).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "dt", &meta.dt.to_string()).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "tolerance", &meta.tolerance.to_string()).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "data_size", &meta.data_size.to_string()).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "store_every_n", &meta.store_every_n.to_string()).map_err(SimError::IoFailure)?;
    write_meta_line(&mut writer, "run_time_seconds", &meta.run_time_seconds.to_string()).map_err(SimError::IoFailure)?;
    let masses_str = meta.masses.iter().map(f64::to_string).collect::<Vec<_>>().join(" ");
    write_meta_line(&mut writer, "masses", &masses_str).map_err(SimError::IoFailure)?;

    let mut csv_writer = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    for k in 0..data.t.len() {
        let mut record = vec![data.t[k].to_string(), data.dt[k].to_string(), data.energy[k].to_string()];
        record.extend(data.state[k].iter().map(f64::to_string));
        csv_writer
            .write_record(&record)
            .map_err(|e| SimError::IoFailure(std::io::Error::new(std::io::ErrorKind::Other, e.to_string())))?;
    }
    csv_writer.flush().map_err(SimError::IoFailure)
}

pub fn read_result_file<R: Read>(reader: R) -> Result<(ResultMetadata, ResultData), SimError> {
    let buffered = BufReader::new(reader);
    let mut meta_map = std::collections::HashMap::new();
    let mut data_lines = String::new();
    for line in buffered.lines() {
        let line = line.map_err(SimError::IoFailure)?;
        if let Some(rest) = line.strip_prefix('#') {
            let rest = rest.trim();
            if let Some((key, value)) = rest.split_once(':') {
                meta_map.insert(key.trim().to_string(), value.trim().to_string());
            }
        } else if !line.trim().is_empty() {
            data_lines.push_str(&line);
            data_lines.push('\n');
        }
    }

    let get = |key: &str| -> Result<String, SimError> {
        meta_map
            .get(key)
            .cloned()
            .ok_or_else(|| SimError::InvalidInput(format!("result file missing metadata key '{key}'")))
    };
    let parse = |key: &str| -> Result<f64, SimError> { parse_f64(&get(key)?) };

    let meta = ResultMetadata {
        save_date: get("save_date")?,
        system_name: get("system_name")?,
        integrator: get("integrator")?,
        n: get("n")?.parse().map_err(|_| SimError::InvalidInput("bad n".into()))?,
        tf_days: parse("tf_days")?,
        dt: parse("dt")?,
        tolerance: parse("tolerance")?,
        data_size: get("data_size")?
            .parse()
            .map_err(|_| SimError::InvalidInput("bad data_size".into()))?,
        store_every_n: get("store_every_n")?
            .parse()
            .map_err(|_| SimError::InvalidInput("bad store_every_n".into()))?,
        run_time_seconds: parse("run_time_seconds")?,
        masses: get("masses")?
            .split_whitespace()
            .map(parse_f64)
            .collect::<Result<Vec<_>, _>>()?,
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .from_reader(data_lines.as_bytes());
    let mut t = Vec::new();
    let mut dt = Vec::new();
    let mut energy = Vec::new();
    let mut state = Vec::new();
    for result in csv_reader.records() {
        let record = result.map_err(|e| SimError::InvalidInput(e.to_string()))?;
        t.push(parse_f64(&record[0])?);
        dt.push(parse_f64(&record[1])?);
        energy.push(parse_f64(&record[2])?);
        let mut row = Vec::with_capacity(record.len() - 3);
        for field in record.iter().skip(3) {
            row.push(parse_f64(field)?);
        }
        state.push(row);
    }

    Ok((meta, ResultData { t, dt, energy, state }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn custom_catalog_round_trips() {
        let csv_text = "binary,2,1.0,1.0,1.0,0.0,0.0,-1.0,0.0,0.0,0.0,0.5,0.0,0.0,-0.5,0.0\n";
        let systems = read_custom_catalog(csv_text.as_bytes()).unwrap();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].name, "binary");
        assert_eq!(systems[0].m, vec![1.0, 1.0]);
        assert_eq!(systems[0].x, vec![[1.0, 0.0, 0.0], [-1.0, 0.0, 0.0]]);

        let mut out = Vec::new();
        write_custom_catalog(&mut out, &systems).unwrap();
        let round_tripped = read_custom_catalog(out.as_slice()).unwrap();
        assert_eq!(round_tripped, systems);
    }

    #[test]
    fn mismatched_field_count_is_rejected() {
        let csv_text = "bad,2,1.0,1.0,1.0,0.0,0.0\n";
        assert!(read_custom_catalog(csv_text.as_bytes()).is_err());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let csv_text = "\
a,1,1.0,0.0,0.0,0.0,0.0,0.0,0.0
a,1,1.0,1.0,0.0,0.0,0.0,0.0,0.0
";
        assert!(read_custom_catalog(csv_text.as_bytes()).is_err());
    }

    #[test]
    fn result_file_round_trips_metadata_and_data() {
        let meta = ResultMetadata {
            save_date: "2026-07-30".into(),
            system_name: "circular_binary_orbit".into(),
            integrator: "ias15".into(),
            n: 2,
            tf_days: 50.0,
            dt: 0.01,
            tolerance: 1e-9,
            data_size: 2,
            store_every_n: 1,
            run_time_seconds: 0.01,
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
        let mut buf = Vec::new();
        write_result_file(&mut buf, &meta, &data).unwrap();
        let (meta2, data2) = read_result_file(buf.as_slice()).unwrap();
        assert_eq!(meta2, meta);
        assert_eq!(data2.t, data.t);
        assert_eq!(data2.state, data.state);
    }
}
