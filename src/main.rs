use std::io;

fn main() -> io::Result<()> {
    env_logger::init();

    zxmap::cli::main()
}
