fn main() {
    if let Err(e) = claimwise_lib::run() {
        eprintln!("claimwise: {e}");
        std::process::exit(1);
    }
}
