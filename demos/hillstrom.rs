//! Campaign analysis of the Hillstrom e-mail dataset.
//!
//! cargo run --release --example hillstrom -- path/to/hillstrom.csv
use std::env;
use std::error::Error;
use uplift_roi::constants::{MENS_EMAIL, NO_EMAIL, SEGMENT_COL, WOMENS_EMAIL};
use uplift_roi::eda::check_randomization;
use uplift_roi::{run_ab_tests, run_uplift_and_roi, Dataset, RoiConfig, UpliftConfig};

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = env::args().collect();
    let path = args.get(1).map(String::as_str).unwrap_or("resources/hillstrom.csv");
    let df = Dataset::from_csv(path)?;

    let baseline: Vec<&str> = ["history", "recency"]
        .into_iter()
        .filter(|c| df.has_column(c))
        .collect();
    if !baseline.is_empty() {
        println!("Randomization check:");
        for row in check_randomization(&df, SEGMENT_COL, &baseline)? {
            println!("{}", row);
        }
    }

    let ab = run_ab_tests(&df)?;
    for cmp in &ab.conversion {
        println!("\nConversion: {} vs {}", cmp.treatment, cmp.control);
        println!("{:?}", cmp.result);
    }
    for cmp in &ab.spend {
        println!("\nSpend: {} vs {} (Welch + bootstrap CI)", cmp.treatment, cmp.control);
        println!("{:?}", cmp.result);
    }

    let uplift_cfg = UpliftConfig::default();
    let roi_cfg = RoiConfig::default();
    for treat in [MENS_EMAIL, WOMENS_EMAIL] {
        let report = run_uplift_and_roi(&df, treat, NO_EMAIL, None, &uplift_cfg, &roi_cfg)?;
        println!("\nQini AUC ({} vs {}): {:.5}", treat, NO_EMAIL, report.qini_auc);
        println!("\nROI (send top-k%):");
        print!("{}", report.roi);
    }

    println!("\nColumns: {:?}", df.column_names());
    Ok(())
}
