fn main() {
    std::process::exit(updater_lib::run());
}
