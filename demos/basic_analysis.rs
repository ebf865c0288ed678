//! Basic analysis example: open a database, resolve the most recent
//! evaluation, and report area, trees-per-acre, volume, and biomass for
//! forest land.
//!
//! Run from the project root:
//!   cargo run --example basic_analysis

#[path = "support.rs"]
mod support;

use fia_estimation_engine::estimator::{Estimator, RequestBase};
use fia_estimation_engine::eval::Selector;
use fia_estimation_engine::filter::LandType;
use fia_estimation_engine::value::VolType;
use fia_estimation_engine::output::ResultFrame;

fn print_frame(label: &str, frame: &ResultFrame) {
    println!("\n=== {label} ===");
    for row in &frame.rows {
        println!(
            "  estimate={:.2} se={:.2} cv={} n_plots={}",
            row.estimate,
            row.se,
            row.cv.map(|c| format!("{c:.1}%")).unwrap_or_else(|| "n/a".into()),
            row.n_plots
        );
    }
    for warning in &frame.warnings {
        println!("  warning: {warning}");
    }
}

fn main() {
    let db = support::sample_database();
    let est = Estimator::new(&db);

    let mut req = RequestBase::new(vec![41], Selector::MostRecent);
    req.land_type = LandType::Forest;

    let area = est.area(&req).expect("area estimate");
    print_frame("forest area (acres)", &area);

    let tpa = est.tpa(&req, false).expect("tpa estimate");
    print_frame("trees per acre", &tpa);

    let baa = est.tpa(&req, true).expect("basal area per acre estimate");
    print_frame("basal area per acre (sq ft)", &baa);

    let volume = est.volume(&req, VolType::Net).expect("volume estimate");
    print_frame("net cubic-foot volume per acre", &volume);
}
