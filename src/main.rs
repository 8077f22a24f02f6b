fn main() {
    notaria::run();
}
