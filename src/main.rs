fn main() {
    if let Err(e) = artpick::app::run_cli() {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
