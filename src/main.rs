fn main() {
    if let Err(err) = labelplace::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
