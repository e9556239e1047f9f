fn main() {
    if let Err(e) = ielts_scoring::run() {
        eprintln!("ielts-scoring fatal: {e:#}");
        std::process::exit(1);
    }
}
