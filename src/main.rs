fn main() {
    if let Err(err) = roundwatch_lib::run() {
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}
