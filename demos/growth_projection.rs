//! Growth/removal/mortality example: annualized GRM accounting and the
//! forest-land area-change estimate over one remeasurement cycle.
//!
//! Run from the project root:
//!   cargo run --example growth_projection

#[path = "support.rs"]
mod support;

use fia_estimation_engine::estimator::{AreaChangeMethod, Estimator, RequestBase};
use fia_estimation_engine::eval::Selector;
use fia_estimation_engine::grm::area_change::ChangeType;
use fia_estimation_engine::grm::Measure;
use fia_estimation_engine::output::ResultFrame;

const REMPER_YEARS: f64 = 2.0;

fn print_frame(label: &str, frame: &ResultFrame) {
    println!("\n=== {label} ===");
    for row in &frame.rows {
        println!("  estimate={:.3} se={:.3} n_plots={}", row.estimate, row.se, row.n_plots);
    }
    for warning in &frame.warnings {
        println!("  warning: {warning}");
    }
}

fn main() {
    let db = support::sample_database();
    let est = Estimator::new(&db);
    let req = RequestBase::new(vec![41], Selector::MostRecent);

    let growth = est
        .growth(&req, Measure::VolumeNet, REMPER_YEARS)
        .expect("annual net volume growth");
    print_frame("annual net cubic-foot volume growth", &growth);

    let mortality = est
        .mortality(&req, Measure::VolumeNet, REMPER_YEARS)
        .expect("annual net volume mortality");
    print_frame("annual net cubic-foot volume mortality", &mortality);

    let removals = est
        .removals(&req, Measure::VolumeNet, REMPER_YEARS)
        .expect("annual net volume removals");
    print_frame("annual net cubic-foot volume removals", &removals);

    let net_change = est
        .area_change(&req, ChangeType::Net, AreaChangeMethod::TransitionMatrix, REMPER_YEARS)
        .expect("net forest area change");
    print_frame("net forest area change (acres/year)", &net_change);
}
