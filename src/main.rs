fn main() {
    if let Err(e) = ocular::cli::main() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
