//! Writes `barlog_sample.csv`: a demo assay sheet in the two-row header
//! layout, three replicates per condition, four timepoints.
//!
//! Run `barlog --input barlog_sample.csv` on the result.

/// splitmix64 – small deterministic generator, good enough for demo data.
struct SplitMix {
    state: u64,
}

impl SplitMix {
    fn new(seed: u64) -> Self {
        SplitMix { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Multiplicative scatter of ±`spread` in log10 space.
    fn log_jitter(&mut self, spread: f64) -> f64 {
        10f64.powf((self.next_f64() * 2.0 - 1.0) * spread)
    }
}

const REPLICATES: usize = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut rng = SplitMix::new(42);

    // Typical CFU/ml per condition at days 1, 7, 14, 21.
    let conditions: [(&str, [f64; 4]); 4] = [
        ("Input", [2.0e6, 1.8e6, 1.5e6, 1.2e6]),
        ("Pre-exposure", [8.0e5, 6.0e5, 4.0e5, 3.0e5]),
        ("Post-exposure", [5.0e3, 1.5e3, 4.0e2, 5.0e1]),
        ("Post-exposure-Liquid", [2.0e4, 6.0e3, 1.8e3, 3.0e2]),
    ];

    let output_path = "barlog_sample.csv";
    let mut writer = csv::Writer::from_path(output_path)?;

    // Outer header: condition name over its first replicate, blanks after
    // (what a merged cell exports as).
    let outer: Vec<String> = conditions
        .iter()
        .flat_map(|(name, _)| {
            std::iter::once(name.to_string()).chain(std::iter::repeat(String::new()).take(REPLICATES - 1))
        })
        .collect();
    writer.write_record(&outer)?;

    let inner: Vec<String> = conditions
        .iter()
        .flat_map(|_| (1..=REPLICATES).map(|r| r.to_string()))
        .collect();
    writer.write_record(&inner)?;

    for day in 0..4 {
        let row: Vec<String> = conditions
            .iter()
            .flat_map(|(_, typical)| {
                (0..REPLICATES)
                    .map(|_| format!("{:.0}", typical[day] * rng.log_jitter(0.15)))
                    .collect::<Vec<_>>()
            })
            .collect();
        writer.write_record(&row)?;
    }
    writer.flush()?;

    println!(
        "Wrote {} conditions x {REPLICATES} replicates x 4 timepoints to {output_path}",
        conditions.len()
    );
    Ok(())
}
