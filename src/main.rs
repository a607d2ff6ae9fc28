fn main() {
    if let Err(err) = devtally::run_cli() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
