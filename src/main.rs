fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    log::info!("roomcat starting up");

    if let Err(e) = roomcat::app::run() {
        log::error!("Fatal error: {e}");
        std::process::exit(1);
    }
}
