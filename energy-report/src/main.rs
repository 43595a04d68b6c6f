fn main() {
    if let Err(err) = energy_plan_report::app::run() {
        eprintln!("energy report failed: {err}");
        std::process::exit(1);
    }
}
