fn main() {
    if let Err(err) = csv_shrink::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
