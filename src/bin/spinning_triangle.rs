use gfx_triangle::DemoConfig;
use log::error;
use std::process;

fn main() {
    env_logger::init();
    if let Err(err) = gfx_triangle::run(DemoConfig::spinning()) {
        error!("{}", err);
        process::exit(1);
    }
}
