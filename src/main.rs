use std::process::ExitCode;

use gridsir::runner::run_with_args;
use gridsir::InfectionStatus;
use strum::IntoEnumIterator;

fn main() -> ExitCode {
    match run_with_args() {
        Ok(model) => {
            let last = model.current_counts();
            let by_status: Vec<String> = InfectionStatus::iter()
                .map(|status| format!("{status}={}", last.get(status)))
                .collect();
            println!("step={} {} D={}", last.step, by_status.join(" "), last.dead);
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("gridsir: {error}");
            ExitCode::FAILURE
        }
    }
}
