use itertools::Itertools;

use crate::pipeline::RunReport;

pub fn print_report(report: &RunReport) {
    println!("Trained on {} windows (close range {:.4} .. {:.4})", report.windows_trained, report.scale.min, report.scale.max);
    println!("Last input window: [{}]", report.last_window.iter().map(|v| format!("{v:.4}")).join(", "));
    print_compare_table(report);
    if !report.forecast.is_empty() {
        println!("Forecast:");
        for (step, (value, price)) in report.forecast.iter().zip(report.forecast_prices()).enumerate() {
            println!("  t+{:<4} {:>10.4} {:>12.4}", step + 1, value, price);
        }
    }
}

pub fn print_compare_table(report: &RunReport) {
    println!("{:<10} {:>10} {:>12}", "", "normalized", "price");
    println!("{:<10} {:>10.4} {:>12.4}", "actual", report.target, report.target_price());
    println!("{:<10} {:>10.4} {:>12.4}", "predicted", report.predicted, report.predicted_price());
    println!("{:<10} {:>10.4} {:>12.4}", "error", report.predicted - report.target, report.predicted_price() - report.target_price());
}
