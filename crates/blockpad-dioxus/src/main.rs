use blockpad_config::{Config, ConfigError};
use blockpad_engine::{BlockId, BlockRecord, BlockType};
use dioxus::prelude::*;

mod platform;
mod ui;

use ui::App;

const DEFAULT_CONFIG: &str = include_str!("assets/default_config.toml");

/// The user's config file when there is one, else the embedded defaults.
/// The browser build has no filesystem and always uses the defaults.
fn load_config() -> Result<Config, ConfigError> {
    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    {
        if let Some(config) = Config::load()? {
            return Ok(config);
        }
    }
    Config::from_toml_str(DEFAULT_CONFIG)
}

fn init_logging(level: Option<&str>) {
    #[cfg(all(target_arch = "wasm32", target_os = "unknown"))]
    {
        let _ = level;
        dioxus::logger::initialize_default();
    }

    #[cfg(not(all(target_arch = "wasm32", target_os = "unknown")))]
    {
        let mut builder = env_logger::Builder::new();
        builder.filter_level(log::LevelFilter::Info);
        if let Some(level) = level {
            builder.parse_filters(level);
        }
        builder.parse_default_env().init();
    }
}

fn main() {
    let config = load_config();
    init_logging(
        config
            .as_ref()
            .ok()
            .and_then(|config| config.log_level.as_deref()),
    );

    log::info!("blockpad starting up!");
    log::info!("Config path: {}", Config::config_path().display());
    if let Err(e) = &config {
        log::warn!("Using default editor settings: {e}");
    }

    dioxus::launch(app_root);
}

fn app_root() -> Element {
    let config = use_hook(|| load_config().unwrap_or_default());

    rsx! {
        App {
            config: config.editor.clone(),
            initial: welcome_document(),
        }
    }
}

fn welcome_document() -> Vec<BlockRecord> {
    vec![
        BlockRecord::new(BlockId(1), BlockType::Heading, "Welcome to blockpad"),
        BlockRecord::new(
            BlockId(2),
            BlockType::Text,
            "Type / at the start of a block to change its type or add a form question.",
        ),
        BlockRecord::new(
            BlockId(3),
            BlockType::Text,
            "Enter splits a block, Backspace at the start joins it to the one above, and the arrow keys move between blocks.",
        ),
        BlockRecord::new(BlockId(4), BlockType::ShortAnswer, "What should we call you?")
            .with_property("description", "First name is fine"),
        BlockRecord::new(BlockId(5), BlockType::MultipleChoice, "Favourite season")
            .with_property("options", "Spring\nSummer\nAutumn\nWinter"),
        BlockRecord::new(BlockId(6), BlockType::Text, ""),
    ]
}
