fn main() {
    std::process::exit(mcskin_lib::run());
}
