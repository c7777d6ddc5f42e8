//! Sample Contract Generator
//!
//! Writes a random procurement contract dataset for trying out the pipeline.

use rand::Rng;
use serde::Serialize;
use tracing::info;

/// Row layout expected by the pipeline
#[derive(Debug, Clone, Serialize)]
struct ContractRow {
    nama_vendor: String,
    jenis_pengadaan: String,
    nilai_kontrak: String,
    durasi_kontrak: String,
    delay_perpanjangan_kontrak: String,
}

const VENDORS: [&str; 8] = [
    "PT Alpha Konstruksi",
    "PT Beta Teknologi",
    "CV Citra Mandiri",
    "PT Delta Energi",
    "CV Eka Sarana",
    "PT Fajar Logistik",
    "PT Gita Medika",
    "Koperasi Harapan",
];

const PROCUREMENT_TYPES: [&str; 4] = [
    "Tender",
    "Penunjukan Langsung",
    "Pengadaan Langsung",
    "E-Purchasing",
];

struct ContractGenerator {
    rng: rand::rngs::ThreadRng,
    blank_rate: f64,
}

impl ContractGenerator {
    fn new(blank_rate: f64) -> Self {
        Self {
            rng: rand::thread_rng(),
            blank_rate,
        }
    }

    /// Contract well inside the Low/Medium bands
    fn generate_normal(&mut self) -> ContractRow {
        let value = self.rng.gen_range(50_000_000.0..8_000_000_000.0_f64);
        let duration = self.rng.gen_range(30..250);
        let delay = self.rng.gen_range(0..20);
        self.row(value, duration, delay)
    }

    /// Contract above every High threshold
    fn generate_high_risk(&mut self) -> ContractRow {
        let value = self.rng.gen_range(10_500_000_000.0..50_000_000_000.0_f64);
        let duration = self.rng.gen_range(301..720);
        let delay = self.rng.gen_range(31..120);
        self.row(value, duration, delay)
    }

    fn row(&mut self, value: f64, duration: u32, delay: u32) -> ContractRow {
        ContractRow {
            nama_vendor: self.random_choice(&VENDORS).to_string(),
            jenis_pengadaan: self.random_choice(&PROCUREMENT_TYPES).to_string(),
            nilai_kontrak: format!("{:.0}", value),
            durasi_kontrak: self.maybe_blank(duration.to_string()),
            delay_perpanjangan_kontrak: self.maybe_blank(delay.to_string()),
        }
    }

    /// Leave some cells empty so the fill policy has work to do
    fn maybe_blank(&mut self, cell: String) -> String {
        if self.rng.gen_bool(self.blank_rate) {
            String::new()
        } else {
            cell
        }
    }

    fn random_choice<'a>(&mut self, choices: &[&'a str]) -> &'a str {
        choices[self.rng.gen_range(0..choices.len())]
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("sample_contracts=info".parse()?),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let output = args.get(1).map(|s| s.as_str()).unwrap_or("sample_contracts.csv");
    let count: u64 = args.get(2).and_then(|s| s.parse().ok()).unwrap_or(100);
    let high_risk_rate: f64 = args
        .get(3)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.1_f64)
        .clamp(0.0, 1.0);
    let blank_rate: f64 = args
        .get(4)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.02_f64)
        .clamp(0.0, 1.0);

    info!(
        output = %output,
        count = count,
        high_risk_rate = high_risk_rate,
        blank_rate = blank_rate,
        "Generating sample contracts"
    );

    let mut generator = ContractGenerator::new(blank_rate);
    let mut rng = rand::thread_rng();
    let mut writer = csv::Writer::from_path(output)?;

    let mut normal_count = 0;
    let mut high_risk_count = 0;
    for _ in 0..count {
        let row = if rng.gen_bool(high_risk_rate) {
            high_risk_count += 1;
            generator.generate_high_risk()
        } else {
            normal_count += 1;
            generator.generate_normal()
        };
        writer.serialize(row)?;
    }
    writer.flush()?;

    info!(
        "Completed! Wrote {} contracts to {} ({} normal, {} high risk)",
        count, output, normal_count, high_risk_count
    );
    Ok(())
}
