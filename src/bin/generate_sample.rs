use std::path::{Path, PathBuf};
use std::sync::Arc;

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parquet::arrow::ArrowWriter;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next_u64() % n.max(1)
    }
}

struct Row {
    revision_id: i64,
    page_id: i64,
    page_title: String,
    contributor_id: Option<i64>,
    contributor_name: String,
    timestamp: String,
}

/// Simulated wiki: activity grows then decays over `months` months.
struct WikiProfile {
    name: &'static str,
    start: DateTime<Utc>,
    months: u32,
    peak_edits: f64,
    editors: u64,
}

fn simulate(profile: &WikiProfile, rng: &mut SimpleRng) -> Vec<Row> {
    let mut rows = Vec::new();
    let mut next_page: i64 = 1;
    let mut revision_id: i64 = 1;

    for month in 0..profile.months {
        // Skip the odd month entirely so some histories have gaps.
        if month > 0 && rng.next_f64() < 0.08 {
            continue;
        }
        let phase = month as f64 / profile.months as f64;
        let activity = (std::f64::consts::PI * phase).sin().max(0.05);
        let edits = (profile.peak_edits * activity * (0.7 + 0.6 * rng.next_f64())) as u64 + 1;

        let month_start = profile.start + Duration::days(30 * month as i64);
        for _ in 0..edits {
            let page_id = if next_page == 1 || rng.next_f64() < 0.25 {
                next_page += 1;
                next_page - 1
            } else {
                1 + rng.below((next_page - 1) as u64) as i64
            };
            let anonymous = rng.next_f64() < 0.1;
            let contributor = 1 + rng.below(profile.editors) as i64;
            let ts = month_start + Duration::seconds(rng.below(30 * 24 * 3600) as i64);

            rows.push(Row {
                revision_id,
                page_id,
                page_title: format!("Page {page_id}; draft"),
                contributor_id: (!anonymous).then_some(contributor),
                contributor_name: if anonymous {
                    "anonymous".to_string()
                } else {
                    format!("User{contributor}")
                },
                timestamp: ts.format(TIMESTAMP_FORMAT).to_string(),
            });
            revision_id += 1;
        }
    }
    rows
}

fn write_csv(path: &Path, rows: &[Row]) {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(b';')
        .quote(b'|')
        .from_path(path)
        .expect("Failed to create CSV file");
    writer
        .write_record([
            "revision_id",
            "page_id",
            "page_title",
            "contributor_id",
            "contributor_name",
            "timestamp",
        ])
        .expect("Failed to write header");
    for r in rows {
        writer
            .write_record([
                r.revision_id.to_string(),
                r.page_id.to_string(),
                r.page_title.clone(),
                r.contributor_id.map(|c| c.to_string()).unwrap_or_default(),
                r.contributor_name.clone(),
                r.timestamp.clone(),
            ])
            .expect("Failed to write row");
    }
    writer.flush().expect("Failed to flush CSV");
}

fn write_parquet(path: &Path, rows: &[Row]) {
    let schema = Arc::new(Schema::new(vec![
        Field::new("revision_id", DataType::Int64, false),
        Field::new("page_id", DataType::Int64, false),
        Field::new("page_title", DataType::Utf8, false),
        Field::new("contributor_id", DataType::Int64, true),
        Field::new("contributor_name", DataType::Utf8, false),
        Field::new("timestamp", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.revision_id))),
            Arc::new(Int64Array::from_iter_values(rows.iter().map(|r| r.page_id))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.page_title.as_str()))),
            Arc::new(Int64Array::from_iter(rows.iter().map(|r| r.contributor_id))),
            Arc::new(StringArray::from_iter_values(
                rows.iter().map(|r| r.contributor_name.as_str()),
            )),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.timestamp.as_str()))),
        ],
    )
    .expect("Failed to create RecordBatch");

    let file = std::fs::File::create(path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");
}

fn main() {
    let out_dir = PathBuf::from(std::env::args().nth(1).unwrap_or_else(|| "data".to_string()));
    std::fs::create_dir_all(&out_dir).expect("Failed to create output directory");

    let mut rng = SimpleRng::new(42);

    let profiles = [
        WikiProfile {
            name: "eslagunanegra_pages_full",
            start: Utc.with_ymd_and_hms(2008, 3, 1, 0, 0, 0).unwrap(),
            months: 90,
            peak_edits: 400.0,
            editors: 120,
        },
        WikiProfile {
            name: "cocktails",
            start: Utc.with_ymd_and_hms(2011, 9, 1, 0, 0, 0).unwrap(),
            months: 60,
            peak_edits: 150.0,
            editors: 40,
        },
        WikiProfile {
            name: "minecraft_mods",
            start: Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap(),
            months: 48,
            peak_edits: 900.0,
            editors: 600,
        },
    ];

    for (i, profile) in profiles.iter().enumerate() {
        let rows = simulate(profile, &mut rng);
        // Last wiki goes to Parquet so both loaders get exercised.
        let path = if i + 1 == profiles.len() {
            let path = out_dir.join(format!("{}.parquet", profile.name));
            write_parquet(&path, &rows);
            path
        } else {
            let path = out_dir.join(format!("{}.csv", profile.name));
            write_csv(&path, &rows);
            path
        };
        println!("Wrote {} revisions to {}", rows.len(), path.display());
    }
}
