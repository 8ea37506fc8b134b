fn main() {
    trial::cli::run();
}
