fn main() {
    if let Err(err) = fertilizer_audit::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
