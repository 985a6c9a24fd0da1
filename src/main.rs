fn main() {
    if let Err(err) = progress_tree::run() {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
