use flat_builder::{AppConfig, run};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut config = AppConfig::default();
    if let Some(path) = std::env::args_os().nth(1) {
        config = config.font(path);
    }

    run(config)
}
