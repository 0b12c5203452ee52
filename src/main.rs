fn main() {
    if let Err(err) = data_studio::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
