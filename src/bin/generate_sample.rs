//! Write a deterministic sample inventory file for local testing.
//!
//! ```bash
//! generate_sample              # 500 rows into LE.txt
//! generate_sample parts.csv --rows 20 --delimiter ';'
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
#[command(about = "Write a sample spare-parts inventory file")]
struct Args {
    /// Output path
    #[arg(default_value = "LE.txt")]
    output: PathBuf,

    /// Number of data rows
    #[arg(short, long, default_value_t = 500)]
    rows: usize,

    /// Field delimiter
    #[arg(short, long, default_value = ",")]
    delimiter: String,

    /// Seed for the generator
    #[arg(long, default_value_t = 42)]
    seed: u64,
}

const KINDS: [&str; 8] = [
    "Hex Bolt", "Washer", "Bearing", "O-Ring", "Gasket", "Drive Belt", "Fuse", "Filter",
];
const SIZES: [&str; 5] = ["M6", "M8", "M10", "12mm", "3/4\""];
const VENDORS: [&str; 4] = ["Acme", "Nordic Supply", "Baltic Parts", "Hansen & Co"];

/// Minimal deterministic PRNG (splitmix64).
struct SampleRng(u64);

impl SampleRng {
    fn next_u64(&mut self) -> u64 {
        self.0 = self.0.wrapping_add(0x9E37_79B9_7F4A_7C15);
        let mut z = self.0;
        z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        z ^ (z >> 31)
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

/// Prices come in the messy shapes real exports have: currency symbols,
/// thousands separators, blanks and free text.
fn price(rng: &mut SampleRng) -> String {
    let cents = rng.below(250_000) + 5;
    let amount = format!("{}.{:02}", cents / 100, cents % 100);
    match rng.below(10) {
        0 => String::new(),
        1 => "on request".to_string(),
        2 => format!("${amount}"),
        3 if cents >= 100_000 => format!("{},{:03}.{:02}", cents / 100_000, (cents / 100) % 1000, cents % 100),
        4 => format!("{amount} EUR"),
        _ => amount,
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let delimiter = match args.delimiter.as_bytes() {
        [byte] => *byte,
        _ => bail!("delimiter must be a single byte, got {:?}", args.delimiter),
    };

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_path(&args.output)
        .with_context(|| format!("creating {}", args.output.display()))?;
    writer.write_record(["serial_number", "name", "price", "vendor", "stock"])?;

    let mut rng = SampleRng(args.seed);
    for i in 0..args.rows {
        let serial = format!("SN-{:05}-{}", 10_000 + i, (b'A' + rng.below(26) as u8) as char);
        let name = format!("{} {}", rng.pick(&KINDS), rng.pick(&SIZES));
        let stock = rng.below(400).to_string();
        writer.write_record([
            serial.as_str(),
            name.as_str(),
            price(&mut rng).as_str(),
            rng.pick(&VENDORS),
            stock.as_str(),
        ])?;
    }
    writer.flush()?;

    println!("Wrote {} rows to {}", args.rows, args.output.display());
    Ok(())
}
