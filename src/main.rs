fn main() {
    if let Err(err) = fortytwo_widgets::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
